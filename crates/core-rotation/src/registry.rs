//! Instance registry and the public operation surface.
//!
//! The registry maps each element to the one widget bound to it. Binding a
//! second time is a no-op, and every element stays registered (passthrough
//! ones included) until `dispose` hands the host back.
//!
//! Named operations go through a closed allow-list ([`Operation`]); unknown
//! names and unknown elements resolve to [`Dispatch::Ignored`] rather than an
//! error.

use crate::controller::{Phase, Rotator};
use crate::host::SlideHost;
use core_config::{Config, OptionOverrides};
use core_events::{ElementId, Event};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tracing::debug;

/// Operations callable on an existing widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Advance the role window once, outside the timer.
    Tick,
    /// Start (or resume) the periodic tick.
    Start,
    /// Cancel the periodic tick.
    Stop,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Tick, Operation::Start, Operation::Stop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Tick => "tick",
            Operation::Start => "start",
            Operation::Stop => "stop",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown operation `{0}`")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new widget was bound; carries the phase it reached.
    Initialized(Phase),
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    Ignored,
}

#[derive(Debug)]
pub struct WidgetRegistry<H: SlideHost> {
    widgets: BTreeMap<ElementId, Rotator<H>>,
    config: Config,
    tx: Sender<Event>,
}

impl<H: SlideHost> WidgetRegistry<H> {
    /// `tx` receives the tick events of every widget started by this registry.
    pub fn new(config: Config, tx: Sender<Event>) -> Self {
        Self {
            widgets: BTreeMap::new(),
            config,
            tx,
        }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.widgets.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Rotator<H>> {
        self.widgets.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Rotator<H>> {
        self.widgets.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rotator<H>> {
        self.widgets.values()
    }

    /// Bind a widget to `id` unless one exists. A widget that reaches
    /// `Activated` starts its timer immediately. Must be called within a
    /// tokio runtime.
    ///
    /// When `id` is already bound, `host` is dropped and nothing else happens.
    pub fn init_if_absent(
        &mut self,
        id: ElementId,
        host: H,
        overrides: &OptionOverrides,
    ) -> InitOutcome {
        if self.widgets.contains_key(&id) {
            debug!(target: "rotation", element = %id, "already_initialized");
            return InitOutcome::AlreadyInitialized;
        }
        let mut widget = Rotator::new(id, host, &self.config, overrides);
        let mut phase = widget.init();
        if phase == Phase::Activated && widget.start_animation(&self.tx) {
            phase = widget.phase();
        }
        self.widgets.insert(id, widget);
        InitOutcome::Initialized(phase)
    }

    pub fn invoke(&mut self, id: ElementId, op: Operation) -> Dispatch {
        let Some(widget) = self.widgets.get_mut(&id) else {
            debug!(target: "rotation", element = %id, op = op.as_str(), "invoke_unknown_element");
            return Dispatch::Ignored;
        };
        let applied = match op {
            Operation::Tick => widget.tick().is_some(),
            Operation::Start => widget.start_animation(&self.tx),
            Operation::Stop => widget.stop(),
        };
        if applied {
            Dispatch::Applied
        } else {
            Dispatch::Ignored
        }
    }

    /// Invoke by name. Names outside the allow-list are ignored.
    pub fn invoke_named(&mut self, id: ElementId, name: &str) -> Dispatch {
        match name.parse::<Operation>() {
            Ok(op) => self.invoke(id, op),
            Err(e) => {
                debug!(target: "rotation", element = %id, error = %e, "invoke_rejected");
                Dispatch::Ignored
            }
        }
    }

    /// Apply one timer firing. Ticks for stopped, disposed or unknown
    /// elements are dropped, as are ticks from a timer that a restart
    /// replaced.
    pub fn handle_tick(&mut self, id: ElementId, generation: u64) -> Dispatch {
        match self.widgets.get_mut(&id) {
            Some(widget) if widget.accepts_tick(generation) => {
                widget.tick();
                Dispatch::Applied
            }
            _ => {
                debug!(target: "rotation.tick", element = %id, generation, "stale_tick_dropped");
                Dispatch::Ignored
            }
        }
    }

    /// Route an event; only ticks concern the registry.
    pub fn handle_event(&mut self, event: &Event) -> Dispatch {
        match event {
            Event::Tick(id, generation) => self.handle_tick(*id, *generation),
            _ => Dispatch::Ignored,
        }
    }

    /// Stop the widget bound to `id`, unbind it and return its host.
    pub fn dispose(&mut self, id: ElementId) -> Option<H> {
        let widget = self.widgets.remove(&id)?;
        debug!(target: "rotation", element = %id, "disposed");
        Some(widget.into_host())
    }

    /// Stop every running timer; returns how many were cancelled.
    pub fn stop_all(&mut self) -> usize {
        self.widgets.values_mut().map(|w| w.stop()).filter(|&c| c).count()
    }
}
