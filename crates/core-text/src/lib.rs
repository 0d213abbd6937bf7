//! Phrase segmentation and terminal-cell measurement.
//!
//! Two concerns live here because both operate on raw phrase text before any
//! slide exists:
//! * [`segment`](segment::segment) turns delimited text into trimmed
//!   [`Phrase`]s, or reports that rotation does not apply.
//! * [`measure`](extent::measure) reports the natural, non-wrapping extent of
//!   a phrase in terminal cells. Widths flow through [`egc_width`].

pub mod extent;
pub mod segment;
pub mod width;

pub use extent::{Extent, measure};
pub use segment::{Phrase, Segmentation, segment};
pub use width::egc_width;
