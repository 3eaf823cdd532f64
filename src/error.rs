//! Error types for assembly, execution and engine control.

use std::fmt;
use std::io;

/// A fatal assembly failure.
///
/// All variants abort the attempted run before any program is installed.
/// Line numbers are 0-based and refer to the raw source, matching the
/// numbering a controller uses for breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The same label name was declared twice.
    DuplicateLabel { label: String, line: usize },

    /// An operand or directive referenced a label that was never declared.
    UnknownLabel {
        label: String,
        line: usize,
        /// Closest declared label, when one is plausibly a typo away.
        suggestion: Option<String>,
    },

    /// An instruction line did not consist of exactly three tokens.
    MalformedInstruction { line: usize, text: String },

    /// An address operand was neither a label, `#absolute` nor a `+`/`-`
    /// relative offset, or resolved to a negative address.
    InvalidOperand { line: usize, token: String },

    /// A `#capture` directive did not consist of exactly three tokens.
    CaptureArity { line: usize },

    /// Two `#capture` directives reused a signal name or an address.
    DuplicateCaptureBinding { signal: String, address: usize },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::DuplicateLabel { label, line } => {
                write!(f, "line {}: duplicate label '{}'", line, label)
            }
            CompileError::UnknownLabel {
                label,
                line,
                suggestion,
            } => {
                write!(f, "line {}: unknown label '{}'", line, label)?;

                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean '{}'?)", suggestion)?;
                }

                Ok(())
            }
            CompileError::MalformedInstruction { line, text } => {
                write!(f, "line {}: invalid instruction: {}", line, text)
            }
            CompileError::InvalidOperand { line, token } => {
                write!(f, "line {}: invalid address operand '{}'", line, token)
            }
            CompileError::CaptureArity { line } => {
                write!(f, "line {}: #capture takes two arguments", line)
            }
            CompileError::DuplicateCaptureBinding { signal, address } => {
                write!(
                    f,
                    "signal '{}' and address {} cannot be bound twice",
                    signal, address
                )
            }
        }
    }
}

/// A fatal fault raised by the execution worker.
///
/// The worker halts at the faulting instruction; the error is published as an
/// [event](crate::event::Event::Halted) and returned again from
/// [Engine::interrupt](crate::engine::Engine::interrupt).
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// The bit token of the fetched instruction was neither `0` nor `1`.
    InvalidBit { address: usize, token: String },

    /// The program counter left the program.
    OutOfRange { address: usize },

    /// The copy target of the instruction at `address` does not exist.
    CopyOutOfRange { address: usize, target: usize },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::InvalidBit { address, token } => {
                write!(f, "address {}: invalid bit literal '{}'", address, token)
            }
            RuntimeError::OutOfRange { address } => {
                write!(f, "address {} is outside the program", address)
            }
            RuntimeError::CopyOutOfRange { address, target } => {
                write!(
                    f,
                    "address {}: copy target {} is outside the program",
                    address, target
                )
            }
        }
    }
}

/// Errors reported by the [Engine](crate::engine::Engine) control surface.
#[derive(Debug)]
pub enum EngineError {
    /// A run is active; the requested operation needs an idle engine.
    AlreadyRunning,

    /// The script failed to assemble; no program was installed.
    Compile(CompileError),

    /// The worker halted on an execution fault.
    Runtime(RuntimeError),

    /// The worker thread could not be spawned.
    Thread(io::Error),

    /// The worker thread panicked.
    WorkerPanicked,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::AlreadyRunning => write!(f, "a script is already running"),
            EngineError::Compile(err) => write!(f, "compile error: {}", err),
            EngineError::Runtime(err) => write!(f, "runtime error: {}", err),
            EngineError::Thread(err) => write!(f, "could not spawn worker thread: {}", err),
            EngineError::WorkerPanicked => write!(f, "worker thread panicked"),
        }
    }
}

impl From<CompileError> for EngineError {
    fn from(err: CompileError) -> EngineError {
        EngineError::Compile(err)
    }
}

impl From<RuntimeError> for EngineError {
    fn from(err: RuntimeError) -> EngineError {
        EngineError::Runtime(err)
    }
}
