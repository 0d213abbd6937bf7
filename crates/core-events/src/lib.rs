//! Core event types, async event sources and the per-widget tick timer.
//!
//! Every widget timer is an async task pushing `Event::Tick(id, generation)` into one
//! bounded channel. A single consumer applies the ticks, so a tick never
//! interleaves with another tick or with initialization.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Timer tasks await `send`, so a slow consumer
// delays ticks rather than dropping or coalescing them. A closed channel ends the producing task.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// Telemetry: relaxed atomic counters, inspected by tests and logged at shutdown.
pub static TICKS_SENT: AtomicU64 = AtomicU64::new(0);
pub static TIMER_STARTS: AtomicU64 = AtomicU64::new(0);
pub static TIMER_CANCELS: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One timer firing for the widget bound to this element. The second
    /// field is the timer generation; a restart bumps it, so ticks still
    /// queued from an earlier timer can be told apart and dropped.
    Tick(ElementId, u64),
    Input(InputEvent),
    Shutdown,
}

/// Normalized input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Quit request (`q`, `Esc`).
    Quit,
    /// Synthetic interrupt (Ctrl-C) surfaced distinctly from a plain quit key.
    CtrlC,
    /// Terminal resize (columns, rows). Slides are not re-measured.
    Resize(u16, u16),
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any async event producer. Implementors hold their configuration and spawn
/// one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when `tx.send(..).await`
    /// returns Err (channel closed) or on their own stop condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Periodic tick source for one widget. The first tick fires one full `period` after spawn;
/// late firings are delivered late and never batched.
#[derive(Debug, Clone, Copy)]
pub struct TickEventSource {
    element: ElementId,
    period: Duration,
    generation: u64,
}

impl TickEventSource {
    pub fn new(element: ElementId, period: Duration, generation: u64) -> Self {
        Self {
            element,
            period,
            generation,
        }
    }

    /// Spawn the timer and wrap it in a cancellable handle.
    pub fn start(self, tx: Sender<Event>) -> TimerHandle {
        let element = self.element;
        TimerHandle {
            element,
            task: Some(Box::new(self).spawn(tx)),
        }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let element = self.element;
        let period = self.period;
        let generation = self.generation;
        let first = Instant::now() + period;
        TIMER_STARTS.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "runtime.events", source = self.name(), %element, generation, ?period, "timer_spawned");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick(element, generation)).await.is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(target: "runtime.events", %element, "tick_channel_closed");
                    break;
                }
                TICKS_SENT.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}

/// Owned handle to a running widget timer. Cancelling is idempotent; dropping cancels.
#[derive(Debug)]
pub struct TimerHandle {
    element: ElementId,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the timer. Returns `true` only for the call that actually cancelled it.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                TIMER_CANCELS.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(target: "runtime.events", element = %self.element, "timer_cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
