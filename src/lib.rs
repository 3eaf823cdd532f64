//! A crate for assembling, debugging and emulating programs for an imaginary
//! one-instruction computer: a machine whose entire instruction set is a
//! single copy-bit-and-branch-if-set operation.
//!
//! Currently this crate provides the functionality to:
//! - Assemble source scripts (labels, relative and absolute addressing,
//!   comments, `#capture` directives) into address-resolved programs.
//! - Execute programs on a background worker with breakpoints,
//!   single-stepping and interactive pause/resume.
//! - Capture per-instruction samples of named signals into ASCII timing
//!   waveforms.
//!
//! # The machine
//!
//! Every instruction has the shape `<bit> <copy> <jump>`: copy the bit
//! literal over the bit literal of the instruction at address `copy`, then
//! branch to `jump` if the bit was `1`, else fall through. There is no other
//! state than the program itself, so programs compute by rewriting their own
//! bit column.
//!
//! # Example
//! ```
//! use oisc::program::Program;
//!
//! let source = r#"
//! ; Bounce between the two instructions forever.
//!  #capture gate loop
//!
//! start: 1 loop loop
//! loop:  0 loop start
//! "#;
//!
//! let program = Program::assemble(source).unwrap();
//!
//! assert_eq!(program.labels["loop"], 1);
//! assert_eq!(program.dump(), "1 1 1\n0 1 0");
//! ```
//!
//! Running a program happens through an [Engine](engine::Engine), which
//! pushes [events](event::Event) out of its worker thread:
//!
//! ```no_run
//! use oisc::{engine::Engine, event::Event};
//!
//! let mut engine = Engine::new();
//! engine.set_script("#capture clk start\nstart: 1 start start\n").unwrap();
//! engine.add_listener(|event: &Event| {
//!     if let Event::CaptureUpdate { signals } = event {
//!         println!("{}", signals["clk"]);
//!     }
//! });
//!
//! engine.run().unwrap();
//! // ... pause(), step(), resume() as the user debugs ...
//! engine.interrupt().unwrap();
//! ```
pub mod assembler;
pub mod capture;
pub mod engine;
pub mod error;
pub mod event;
pub mod lookup;
pub mod program;
pub mod source_map;
