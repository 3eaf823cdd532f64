//! Event handling.
//!
//! The engine exposes an event-based interface for reacting to execution in
//! real time. [EventListeners](EventListener) are registered on the
//! [Engine](crate::engine::Engine) with the
//! [add_listener](crate::engine::Engine::add_listener) method and are invoked
//! on the worker thread, in the order the instructions execute. Listeners
//! that feed a UI must marshal the events onto their own thread.
//!
//! A blanket implementation of [EventListener] for all `FnMut(&Event) + Send`
//! is provided.

use std::collections::HashMap;

use crate::error::RuntimeError;

/// An observable change in the state of a running program.
#[derive(Debug, Clone)]
pub enum Event {
    /// Execution paused before the instruction at the given original source
    /// line. Fired again with the new current line after every released step
    /// while the break flag stays set.
    BreakpointHit {
        /// 0-based line number in the raw source.
        line: usize,
    },

    /// Execution resumed from a pause.
    Resumed,

    /// A new sample was appended to every bound signal.
    CaptureUpdate {
        /// Snapshot of all accumulated waveforms, keyed by signal name.
        signals: HashMap<String, String>,
    },

    /// The worker halted on an execution fault.
    Halted { error: RuntimeError },
}

/// Trait for consuming events.
pub trait EventListener: Send {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Event) + Send,
{
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}
