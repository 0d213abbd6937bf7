//! Rotation controller.
//!
//! Lifecycle:
//! `Uninitialized -> Passthrough` (fewer than two phrases, terminal), or
//! `Uninitialized -> Sized -> Activated -> Rotating`, with `tick` looping on
//! `Rotating`. `stop` moves `Rotating -> Stopped`; `start` resumes.
//!
//! Invariants once the first tick has run (N = slide count, N >= 2):
//! * exactly one slide carries `ACTIVE`, one `NEXT`, one `PREV`;
//! * `PREV` is the slide that was active before the tick;
//! * `NEXT` is two steps ahead of the old active slide.
//!
//! Host failures never escape: they are logged and the in-memory roles stay
//! authoritative, so the next commit brings the host back in line.

use crate::host::{HostError, LayoutMode, SlideHost};
use crate::role::Roles;
use core_config::{Config, OptionOverrides, RotateOptions};
use core_events::{ElementId, Event, TickEventSource, TimerHandle};
use core_text::{Extent, Phrase, segment};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, trace, warn};

/// Successor index with wraparound. The only "next index" rule in the crate.
///
/// Precondition: `len > 0`.
#[inline]
pub fn advance(index: usize, len: usize) -> usize {
    (index + 1) % len
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Text did not segment; element left untouched, nothing scheduled.
    Passthrough,
    Sized,
    Activated,
    Rotating,
    Stopped,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Passthrough => "passthrough",
            Phase::Sized => "sized",
            Phase::Activated => "activated",
            Phase::Rotating => "rotating",
            Phase::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub phrase: Phrase,
    pub roles: Roles,
}

/// Indices touched by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub prev: usize,
    pub active: usize,
    pub next: usize,
}

#[derive(Debug)]
pub struct Rotator<H: SlideHost> {
    id: ElementId,
    host: H,
    options: RotateOptions,
    slides: Vec<Slide>,
    active: usize,
    dimensions: Option<Extent>,
    phase: Phase,
    timer: Option<TimerHandle>,
    /// Bumped on every start; ticks carrying another value are stale.
    generation: u64,
}

fn logged<T>(id: ElementId, op: &'static str, result: Result<T, HostError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(target: "rotation", element = %id, op, error = %e, "host_op_failed");
            None
        }
    }
}

impl<H: SlideHost> Rotator<H> {
    /// Bind to `host`, resolving options once from call overrides, the
    /// element's attributes and `config`.
    pub fn new(id: ElementId, host: H, config: &Config, overrides: &OptionOverrides) -> Self {
        let resolved = config.resolve(&host, overrides);
        Self::with_options(id, host, resolved.options)
    }

    pub fn with_options(id: ElementId, host: H, options: RotateOptions) -> Self {
        Self {
            id,
            host,
            options,
            slides: Vec::new(),
            active: 0,
            dimensions: None,
            phase: Phase::Uninitialized,
            timer: None,
            generation: 0,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(mut self) -> H {
        self.stop();
        let Rotator { host, .. } = self;
        host
    }

    pub fn options(&self) -> &RotateOptions {
        &self.options
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn dimensions(&self) -> Option<Extent> {
        self.dimensions
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_rotating(&self) -> bool {
        self.phase == Phase::Rotating
    }

    /// Generation of the current (or last) timer; 0 before the first start.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick from timer `generation` should be applied now.
    pub fn accepts_tick(&self, generation: u64) -> bool {
        self.is_rotating() && generation == self.generation
    }

    /// Segment, size and activate. Runs once; later calls return the current
    /// phase unchanged.
    pub fn init(&mut self) -> Phase {
        if self.phase != Phase::Uninitialized {
            return self.phase;
        }
        if !self.split_text() {
            self.phase = Phase::Passthrough;
            debug!(target: "rotation", element = %self.id, "passthrough");
            return self.phase;
        }
        let dims = self.measure_and_size();
        self.phase = Phase::Sized;
        self.initial_activate();
        self.phase = Phase::Activated;
        info!(
            target: "rotation",
            element = %self.id,
            slides = self.slides.len(),
            width = dims.width,
            height = dims.height,
            interval_ms = self.options.interval().as_millis() as u64,
            "rotation_ready"
        );
        self.phase
    }

    /// Segment the host text and mount one slide per phrase. Returns `false`
    /// (host untouched) when rotation does not apply.
    fn split_text(&mut self) -> bool {
        let text = self.host.text();
        let Some(phrases) = segment(&text, self.options.delim()).into_phrases() else {
            return false;
        };
        if logged(self.id, "mount_slides", self.host.mount_slides(&phrases)).is_none() {
            return false;
        }
        self.slides = phrases
            .into_iter()
            .map(|phrase| Slide {
                phrase,
                roles: Roles::empty(),
            })
            .collect();
        true
    }

    /// Measure each slide's natural size in measurement layout, restore flow
    /// layout, then fix the container at the componentwise maximum.
    fn measure_and_size(&mut self) -> Extent {
        let mut max = Extent::ZERO;
        for i in 0..self.slides.len() {
            logged(self.id, "set_layout", self.host.set_layout(i, LayoutMode::Measure));
            let natural = logged(self.id, "slide_extent", self.host.slide_extent(i));
            logged(self.id, "set_layout", self.host.set_layout(i, LayoutMode::Flow));
            max = max.max(natural.unwrap_or(Extent::ZERO));
        }
        logged(self.id, "set_container_extent", self.host.set_container_extent(max));
        self.dimensions = Some(max);
        max
    }

    fn initial_activate(&mut self) {
        self.active = 0;
        self.slides[0].roles = Roles::ACTIVE;
        logged(self.id, "set_roles", self.host.set_roles(0, Roles::ACTIVE));
        logged(self.id, "commit", self.host.commit());
    }

    /// Advance the role window by one slide. Returns `None` when there are no
    /// slides to rotate (uninitialized or passthrough).
    pub fn tick(&mut self) -> Option<TickReport> {
        let len = self.slides.len();
        if len < 2 {
            return None;
        }
        let before: Vec<Roles> = self.slides.iter().map(|s| s.roles).collect();

        let prev = self.active;
        let active = advance(prev, len);
        self.slides[prev].roles.remove(Roles::ACTIVE);
        self.slides[active].roles.insert(Roles::ACTIVE);

        let next = advance(active, len);
        for slide in &mut self.slides {
            slide.roles.remove(Roles::NEXT | Roles::PREV);
        }
        self.slides[next].roles.insert(Roles::NEXT);
        self.slides[prev].roles.insert(Roles::PREV);
        self.active = active;

        for (i, slide) in self.slides.iter().enumerate() {
            if slide.roles != before[i] {
                logged(self.id, "set_roles", self.host.set_roles(i, slide.roles));
            }
        }
        logged(self.id, "commit", self.host.commit());

        trace!(target: "rotation.tick", element = %self.id, prev, active, next, "tick");
        Some(TickReport { prev, active, next })
    }

    /// Start the periodic tick; the first tick fires one interval from now.
    /// Must be called within a tokio runtime. Returns `false` when the widget
    /// cannot rotate or already has a running timer.
    pub fn start_animation(&mut self, tx: &Sender<Event>) -> bool {
        if !matches!(self.phase, Phase::Activated | Phase::Stopped) {
            return false;
        }
        self.generation += 1;
        let source = TickEventSource::new(self.id, self.options.interval(), self.generation);
        self.timer = Some(source.start(tx.clone()));
        self.phase = Phase::Rotating;
        debug!(target: "rotation", element = %self.id, generation = self.generation, "animation_started");
        true
    }

    /// Cancel the timer. Idempotent: returns `true` only when a running timer
    /// was stopped by this call.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.timer.take().is_some_and(|mut t| t.cancel());
        if self.phase == Phase::Rotating {
            self.phase = Phase::Stopped;
            debug!(target: "rotation", element = %self.id, "animation_stopped");
        }
        cancelled
    }
}
