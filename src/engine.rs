//! The execution engine.
//!
//! [Engine] assembles the configured script on [run](Engine::run) and
//! interprets it on a dedicated worker thread, leaving the controller free to
//! pause, step, resume and interrupt the run while it observes execution
//! through [events](crate::event::Event).
//!
//! One `Engine` owns at most one worker at a time. Controller and worker
//! share nothing but a set of atomic control flags and the mutex-guarded
//! listener list; the compiled program is moved into the worker wholesale and
//! never touched by the controller while a run is active.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slog::{error, o, trace, Discard, Logger};

use crate::assembler;
use crate::capture::CaptureBuffer;
use crate::error::{EngineError, RuntimeError};
use crate::event::{Event, EventDispatcher, EventListener};
use crate::program::Program;

/// Delay between instructions while free-running. Slow enough that captured
/// waveforms are watchable as they grow.
const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// Delay between checks of the step flag while paused.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Control flags shared between the controller and the worker.
#[derive(Debug, Default)]
struct ControlFlags {
    /// Stop the run. Observed at the top of every cycle and inside the
    /// pause poll.
    interrupt: AtomicBool,

    /// Pause before the next instruction and stay paused until cleared.
    brk: AtomicBool,

    /// Release exactly one instruction while paused.
    step: AtomicBool,

    /// True while the worker thread is alive; cleared by the worker on its
    /// way out.
    running: AtomicBool,
}

struct Worker {
    flags: Arc<ControlFlags>,
    handle: JoinHandle<Result<(), RuntimeError>>,
}

/// A controllable interpreter for one script at a time.
pub struct Engine {
    script: String,
    breakpoints: HashSet<usize>,
    pacing: Duration,
    poll_interval: Duration,
    logger: Logger,
    dispatcher: Arc<Mutex<EventDispatcher>>,
    worker: Option<Worker>,
}

impl Engine {
    pub fn new() -> Engine {
        Engine::with_logger(None)
    }

    /// Creates an engine that traces assembly and execution to `logger`.
    pub fn with_logger<L>(logger: L) -> Engine
    where
        L: Into<Option<Logger>>,
    {
        Engine {
            script: String::new(),
            breakpoints: HashSet::new(),
            pacing: DEFAULT_PACING,
            poll_interval: DEFAULT_POLL_INTERVAL,
            logger: logger.into().unwrap_or(Logger::root(Discard, o!())),
            dispatcher: Arc::new(Mutex::new(EventDispatcher::new())),
            worker: None,
        }
    }

    /// Replaces the script used by the next [run](Engine::run).
    ///
    /// # Errors
    /// Fails with [EngineError::AlreadyRunning] while a run is active.
    pub fn set_script(&mut self, source: &str) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.script = source.to_string();
        Ok(())
    }

    /// Replaces the breakpoint set used by the next [run](Engine::run).
    ///
    /// Breakpoints are 0-based line numbers in the raw source. Lines that
    /// hold no instruction (comments, blanks, directives) never match and
    /// are simply inert.
    ///
    /// # Errors
    /// Fails with [EngineError::AlreadyRunning] while a run is active.
    pub fn set_breakpoints<I>(&mut self, lines: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = usize>,
    {
        self.ensure_idle()?;
        self.breakpoints = lines.into_iter().collect();
        Ok(())
    }

    /// Changes the free-running delay between instructions (default 500 ms).
    ///
    /// # Errors
    /// Fails with [EngineError::AlreadyRunning] while a run is active.
    pub fn set_pacing(&mut self, pacing: Duration) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.pacing = pacing;
        Ok(())
    }

    /// Changes the poll delay used while paused (default 100 ms).
    ///
    /// # Errors
    /// Fails with [EngineError::AlreadyRunning] while a run is active.
    pub fn set_poll_interval(&mut self, poll_interval: Duration) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.poll_interval = poll_interval;
        Ok(())
    }

    /// Registers a listener for execution events.
    ///
    /// Listeners are invoked on the worker thread, in execution order.
    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        if let Ok(mut dispatcher) = self.dispatcher.lock() {
            dispatcher.add_listener(listener);
        }
    }

    /// True while a worker thread is executing the script.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| worker.flags.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }

        Ok(())
    }

    /// Assembles the configured script and starts executing it on a worker
    /// thread.
    ///
    /// The program counter starts at 0 and the capture buffer starts empty.
    ///
    /// # Errors
    /// Fails with [EngineError::AlreadyRunning] if a run is active, or with
    /// [EngineError::Compile] if the script does not assemble; the engine
    /// stays idle and no program is installed in either case.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.ensure_idle()?;

        // A worker that halted on a fault still holds a handle; collect it.
        if let Some(worker) = self.worker.take() {
            let _ = worker.handle.join();
        }

        let program = assembler::assemble_with_logger(&self.script, self.logger.clone())?;

        let flags = Arc::new(ControlFlags::default());
        flags.running.store(true, Ordering::SeqCst);

        let execution = Execution {
            pc: 0,
            program,
            breakpoints: self.breakpoints.clone(),
            buffer: CaptureBuffer::new(),
            flags: Arc::clone(&flags),
            dispatcher: Arc::clone(&self.dispatcher),
            pacing: self.pacing,
            poll_interval: self.poll_interval,
            logger: self.logger.new(o!("stage" => "execution")),
        };

        let exit_flags = Arc::clone(&flags);
        let exit_dispatcher = Arc::clone(&self.dispatcher);
        let exit_logger = self.logger.clone();

        let handle = thread::Builder::new()
            .name("oisc-worker".to_string())
            .spawn(move || {
                let result = execution.run();

                // Clear the flag before publishing the halt, so a listener
                // reacting to the event already observes an idle engine.
                exit_flags.running.store(false, Ordering::SeqCst);

                if let Err(ref err) = result {
                    error!(exit_logger, "execution halted"; "error" => %err);

                    if let Ok(mut dispatcher) = exit_dispatcher.lock() {
                        dispatcher.dispatch(Event::Halted { error: err.clone() });
                    }
                }

                result
            })
            .map_err(EngineError::Thread)?;

        self.worker = Some(Worker { flags, handle });

        Ok(())
    }

    /// Pauses execution before the next instruction.
    ///
    /// No-op while idle.
    pub fn pause(&self) {
        if let Some(worker) = &self.worker {
            worker.flags.brk.store(true, Ordering::SeqCst);
        }
    }

    /// Releases exactly one instruction while paused.
    ///
    /// No-op while idle or free-running.
    pub fn step(&self) {
        if let Some(worker) = &self.worker {
            worker.flags.step.store(true, Ordering::SeqCst);
        }
    }

    /// Resumes free-running execution from a pause.
    ///
    /// No-op while idle.
    pub fn resume(&self) {
        if let Some(worker) = &self.worker {
            worker.flags.brk.store(false, Ordering::SeqCst);
            worker.flags.step.store(true, Ordering::SeqCst);
        }
    }

    /// Stops the run and waits for the worker to exit.
    ///
    /// Idle interrupts are no-ops. An interrupt observed while paused
    /// terminates the run without requiring a step or resume first.
    ///
    /// # Errors
    /// Returns [EngineError::Runtime] if the worker halted on an execution
    /// fault before the interrupt was observed.
    pub fn interrupt(&mut self) -> Result<(), EngineError> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return Ok(()),
        };

        worker.flags.interrupt.store(true, Ordering::SeqCst);

        match worker.handle.join() {
            Ok(result) => result.map_err(EngineError::Runtime),
            Err(_) => Err(EngineError::WorkerPanicked),
        }
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.interrupt();
    }
}

/// One run of one program, owned entirely by the worker thread.
struct Execution {
    program: Program,
    breakpoints: HashSet<usize>,
    buffer: CaptureBuffer,
    flags: Arc<ControlFlags>,
    dispatcher: Arc<Mutex<EventDispatcher>>,
    pacing: Duration,
    poll_interval: Duration,
    pc: usize,
    logger: Logger,
}

impl Execution {
    fn run(mut self) -> Result<(), RuntimeError> {
        while !self.flags.interrupt.load(Ordering::SeqCst) {
            let line = self
                .program
                .source_map
                .get_source_line(self.pc)
                .ok_or(RuntimeError::OutOfRange { address: self.pc })?;

            if self.breakpoints.contains(&line) {
                self.flags.brk.store(true, Ordering::SeqCst);
                self.flags.step.store(false, Ordering::SeqCst);
            }

            if !self.flags.brk.load(Ordering::SeqCst) {
                thread::sleep(self.pacing);
            } else {
                trace!(self.logger, "paused"; "line" => line, "pc" => self.pc);
                self.dispatch(Event::BreakpointHit { line });

                while self.flags.brk.load(Ordering::SeqCst)
                    && !self.flags.step.load(Ordering::SeqCst)
                {
                    if self.flags.interrupt.load(Ordering::SeqCst) {
                        return Ok(());
                    }

                    thread::sleep(self.poll_interval);
                }

                self.flags.step.store(false, Ordering::SeqCst);
                self.dispatch(Event::Resumed);
            }

            self.execute()?;

            self.buffer
                .sample(&self.program.captures, &self.program.instructions);
            self.dispatch(Event::CaptureUpdate {
                signals: self.buffer.snapshot(),
            });
        }

        Ok(())
    }

    /// Executes the instruction at the program counter.
    fn execute(&mut self) -> Result<(), RuntimeError> {
        let instruction = self
            .program
            .instructions
            .get(self.pc)
            .cloned()
            .ok_or(RuntimeError::OutOfRange { address: self.pc })?;

        let high = match instruction.bit.as_str() {
            "0" => false,
            "1" => true,
            _ => {
                return Err(RuntimeError::InvalidBit {
                    address: self.pc,
                    token: instruction.bit,
                })
            }
        };

        // The machine's only data-mutating effect: the bit literal of the
        // instruction at the copy target is overwritten in place.
        match self.program.instructions.get_mut(instruction.copy) {
            Some(target) => target.bit = instruction.bit.clone(),
            None => {
                return Err(RuntimeError::CopyOutOfRange {
                    address: self.pc,
                    target: instruction.copy,
                })
            }
        }

        trace!(
            self.logger, "executed";
            "pc" => self.pc, "bit" => high,
            "copy" => instruction.copy, "jump" => instruction.jump
        );

        if high {
            self.pc = instruction.jump;
        } else {
            self.pc += 1;
        }

        Ok(())
    }

    fn dispatch(&self, event: Event) {
        if let Ok(mut dispatcher) = self.dispatcher.lock() {
            dispatcher.dispatch(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_engine_is_idle() {
        let engine = Engine::new();
        assert!(!engine.is_running());
    }

    #[test]
    fn idle_control_operations_are_inert() {
        let mut engine = Engine::new();

        engine.pause();
        engine.step();
        engine.resume();
        engine.interrupt().unwrap();

        assert!(!engine.is_running());
    }

    #[test]
    fn configuration_is_accepted_while_idle() {
        let mut engine = Engine::new();

        engine.set_script("start: 1 start start\n").unwrap();
        engine.set_breakpoints(vec![0]).unwrap();
        engine.set_pacing(Duration::from_millis(1)).unwrap();
        engine.set_poll_interval(Duration::from_millis(1)).unwrap();
    }

    #[test]
    fn a_compile_failure_leaves_the_engine_idle() {
        let mut engine = Engine::new();
        engine.set_script("start: 1 nowhere start\n").unwrap();

        let err = engine.run().unwrap_err();

        assert!(matches!(err, EngineError::Compile(_)));
        assert!(!engine.is_running());
    }
}
