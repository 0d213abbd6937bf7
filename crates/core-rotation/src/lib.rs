//! Rotation state machine for delimiter-separated phrases.
//!
//! A [`Rotator`] binds to one host element. At initialization it segments the
//! element text; fewer than two phrases leaves the element untouched. Otherwise
//! it mounts one slide per phrase, measures every slide once to fix the
//! container size, marks slide 0 `active` and, once started, advances a
//! three-role window (`prev`, `active`, `next`) by one slide per tick.
//!
//! The host (anything implementing [`SlideHost`]) owns rendering; this crate
//! only decides which roles each slide carries and when.

pub mod controller;
pub mod host;
pub mod memory;
pub mod registry;
pub mod role;

pub use controller::{Phase, Rotator, Slide, TickReport, advance};
pub use host::{HostError, LayoutMode, SlideHost};
pub use memory::MemoryHost;
pub use registry::{Dispatch, InitOutcome, Operation, UnknownOperation, WidgetRegistry};
pub use role::Roles;
