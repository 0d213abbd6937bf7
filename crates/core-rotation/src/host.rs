//! Render host abstraction.
//!
//! A host is the element a rotator is bound to: it supplies the initial text
//! and attributes, renders slides, reports their size and applies role
//! classes. Slides are addressed by index in phrase order.

use crate::Roles;
use core_config::AttributeSource;
use core_text::{Extent, Phrase};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("slide {0} does not exist")]
    NoSuchSlide(usize),
    #[error("host output failed")]
    Io(#[from] std::io::Error),
}

/// Layout applied to a single slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Normal document flow inside the container.
    Flow,
    /// Absolutely positioned, non-wrapping block: reports natural size
    /// without pushing sibling slides around.
    Measure,
}

pub trait SlideHost: AttributeSource {
    /// Current text content of the element.
    fn text(&self) -> String;

    /// Replace the element content with one slide per phrase, in order, each
    /// carrying no roles.
    fn mount_slides(&mut self, phrases: &[Phrase]) -> Result<(), HostError>;

    fn set_layout(&mut self, slide: usize, mode: LayoutMode) -> Result<(), HostError>;

    /// Rendered size of a slide under its current layout.
    fn slide_extent(&self, slide: usize) -> Result<Extent, HostError>;

    /// Fix the container size.
    fn set_container_extent(&mut self, extent: Extent) -> Result<(), HostError>;

    fn set_roles(&mut self, slide: usize, roles: Roles) -> Result<(), HostError>;

    /// Make every role change since the previous commit observable at once.
    fn commit(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}
