//! Headless host keeping slides in memory.
//!
//! Role changes are staged per slide and only become visible through
//! [`MemoryHost::committed_roles`] after `commit`, which models an external
//! reader that observes each tick as one atomic change.

use crate::host::{HostError, LayoutMode, SlideHost};
use crate::role::Roles;
use core_config::AttributeSource;
use core_text::{Extent, Phrase, measure};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemorySlide {
    text: String,
    layout: LayoutMode,
    staged: Roles,
    committed: Roles,
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    text: String,
    attributes: BTreeMap<String, String>,
    slides: Vec<MemorySlide>,
    container: Option<Extent>,
    metrics: fn(&str) -> Extent,
    commits: usize,
}

impl MemoryHost {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
            slides: Vec::new(),
            container: None,
            metrics: measure,
            commits: 0,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Start with a container already sized, as a host styled by an outer
    /// layout would be. Flow-layout slides are clipped to it.
    pub fn with_container(mut self, extent: Extent) -> Self {
        self.container = Some(extent);
        self
    }

    /// Replace the natural-size function (default: terminal cell measurement).
    pub fn with_metrics(mut self, metrics: fn(&str) -> Extent) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slide_text(&self, slide: usize) -> Option<&str> {
        self.slides.get(slide).map(|s| s.text.as_str())
    }

    pub fn layout(&self, slide: usize) -> Option<LayoutMode> {
        self.slides.get(slide).map(|s| s.layout)
    }

    pub fn container(&self) -> Option<Extent> {
        self.container
    }

    /// Roles as last committed, in slide order.
    pub fn committed_roles(&self) -> Vec<Roles> {
        self.slides.iter().map(|s| s.committed).collect()
    }

    /// Committed class attribute of every slide, in slide order.
    pub fn class_list(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.committed.class_attr()).collect()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    fn slide_mut(&mut self, slide: usize) -> Result<&mut MemorySlide, HostError> {
        self.slides.get_mut(slide).ok_or(HostError::NoSuchSlide(slide))
    }
}

impl AttributeSource for MemoryHost {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}

impl SlideHost for MemoryHost {
    fn text(&self) -> String {
        if self.slides.is_empty() {
            return self.text.clone();
        }
        self.slides.iter().map(|s| s.text.as_str()).collect()
    }

    fn mount_slides(&mut self, phrases: &[Phrase]) -> Result<(), HostError> {
        self.slides = phrases
            .iter()
            .map(|p| MemorySlide {
                text: p.as_str().to_string(),
                layout: LayoutMode::Flow,
                staged: Roles::empty(),
                committed: Roles::empty(),
            })
            .collect();
        Ok(())
    }

    fn set_layout(&mut self, slide: usize, mode: LayoutMode) -> Result<(), HostError> {
        self.slide_mut(slide)?.layout = mode;
        Ok(())
    }

    fn slide_extent(&self, slide: usize) -> Result<Extent, HostError> {
        let s = self.slides.get(slide).ok_or(HostError::NoSuchSlide(slide))?;
        let natural = (self.metrics)(&s.text);
        match (s.layout, self.container) {
            (LayoutMode::Flow, Some(container)) => Ok(natural.min(container)),
            _ => Ok(natural),
        }
    }

    fn set_container_extent(&mut self, extent: Extent) -> Result<(), HostError> {
        self.container = Some(extent);
        Ok(())
    }

    fn set_roles(&mut self, slide: usize, roles: Roles) -> Result<(), HostError> {
        self.slide_mut(slide)?.staged = roles;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HostError> {
        for s in &mut self.slides {
            s.committed = s.staged;
        }
        self.commits += 1;
        Ok(())
    }
}
