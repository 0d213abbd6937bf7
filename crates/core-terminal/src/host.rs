//! Terminal region acting as a rotation host element.
//!
//! The element is a rectangle anchored at `origin` (column, row). Slides are
//! measured in terminal cells. Only the `active` slide is painted; every
//! commit repaints the whole container, padding each row to the container
//! width so a shorter phrase fully covers a longer predecessor. Bold is the
//! terminal rendering of the `active` role; `next` and `prev` slides are
//! never on screen.

use core_config::AttributeSource;
use core_rotation::{HostError, LayoutMode, Roles, SlideHost};
use core_text::extent::line_width;
use core_text::{Extent, Phrase, measure};
use std::collections::BTreeMap;
use std::io::Write;

use crate::writer::Writer;

#[derive(Debug, Clone)]
struct TermSlide {
    text: String,
    layout: LayoutMode,
    roles: Roles,
}

#[derive(Debug)]
pub struct TerminalHost<W: Write> {
    origin: (u16, u16),
    text: String,
    attributes: BTreeMap<String, String>,
    slides: Vec<TermSlide>,
    container: Option<Extent>,
    /// Slide most recently given the `active` role.
    active: Option<usize>,
    writer: Writer,
    out: W,
    painted: Vec<String>,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(origin: (u16, u16), text: impl Into<String>, out: W) -> Self {
        Self {
            origin,
            text: text.into(),
            attributes: BTreeMap::new(),
            slides: Vec::new(),
            container: None,
            active: None,
            writer: Writer::new(),
            out,
            painted: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attrs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.attributes.extend(attrs);
        self
    }

    pub fn origin(&self) -> (u16, u16) {
        self.origin
    }

    pub fn container(&self) -> Option<Extent> {
        self.container
    }

    /// Rows this element occupies on screen.
    pub fn footprint(&self) -> Extent {
        self.container.unwrap_or_else(|| measure(&self.text))
    }

    /// Rows painted by the last commit (or passthrough paint), padded.
    pub fn painted(&self) -> &[String] {
        &self.painted
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Paint the element text as-is. Used for elements that do not rotate.
    pub fn paint_passthrough(&mut self) -> Result<(), HostError> {
        let (col, row) = self.origin;
        self.painted.clear();
        for (i, line) in self.text.split('\n').enumerate() {
            self.writer.move_to(col, row.saturating_add(i as u16));
            self.writer.print(line);
            self.painted.push(line.to_string());
        }
        self.writer.flush_to(&mut self.out)?;
        Ok(())
    }

    fn slide(&self, slide: usize) -> Result<&TermSlide, HostError> {
        self.slides.get(slide).ok_or(HostError::NoSuchSlide(slide))
    }

    fn slide_mut(&mut self, slide: usize) -> Result<&mut TermSlide, HostError> {
        self.slides.get_mut(slide).ok_or(HostError::NoSuchSlide(slide))
    }

    fn pad(line: &str, width: u16) -> String {
        let fill = width.saturating_sub(line_width(line)) as usize;
        let mut s = String::with_capacity(line.len() + fill);
        s.push_str(line);
        s.extend(std::iter::repeat_n(' ', fill));
        s
    }
}

impl<W: Write> AttributeSource for TerminalHost<W> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}

impl<W: Write> SlideHost for TerminalHost<W> {
    fn text(&self) -> String {
        if self.slides.is_empty() {
            return self.text.clone();
        }
        self.slides.iter().map(|s| s.text.as_str()).collect()
    }

    fn mount_slides(&mut self, phrases: &[Phrase]) -> Result<(), HostError> {
        let (col, row) = self.origin;
        for i in 0..measure(&self.text).height {
            self.writer.move_to(col, row.saturating_add(i));
            self.writer.clear_line();
        }
        self.slides = phrases
            .iter()
            .map(|p| TermSlide {
                text: p.as_str().to_string(),
                layout: LayoutMode::Flow,
                roles: Roles::empty(),
            })
            .collect();
        self.active = None;
        tracing::trace!(target: "terminal", slides = self.slides.len(), "mounted");
        Ok(())
    }

    fn set_layout(&mut self, slide: usize, mode: LayoutMode) -> Result<(), HostError> {
        self.slide_mut(slide)?.layout = mode;
        Ok(())
    }

    fn slide_extent(&self, slide: usize) -> Result<Extent, HostError> {
        let s = self.slide(slide)?;
        let natural = measure(&s.text);
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
        self.slide_mut(slide)?.roles = roles;
        if roles.contains(Roles::ACTIVE) {
            self.active = Some(slide);
        } else if self.active == Some(slide) {
            self.active = None;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HostError> {
        let Some(container) = self.container else {
            return Ok(());
        };
        let (col, row) = self.origin;
        let active = self
            .active
            .and_then(|i| self.slides.get(i))
            .map(|s| s.text.clone())
            .unwrap_or_default();
        let mut lines = active.split('\n');

        self.painted.clear();
        for r in 0..container.height {
            let line = lines.next().unwrap_or("");
            let line = line.strip_suffix('\r').unwrap_or(line);
            let padded = Self::pad(line, container.width);
            self.writer.move_to(col, row.saturating_add(r));
            self.writer.emphasis(true);
            self.writer.print(padded.clone());
            self.writer.emphasis(false);
            self.painted.push(padded);
        }
        self.writer.flush_to(&mut self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Command;
    use core_config::{ATTR_DELIM, Config, OptionOverrides};
    use core_events::ElementId;
    use core_rotation::{Phase, Rotator};
    use pretty_assertions::assert_eq;

    fn host(text: &str) -> TerminalHost<Vec<u8>> {
        TerminalHost::new((2, 5), text, Vec::new())
    }

    #[test]
    fn active_phrase_is_padded_to_container_width() {
        let mut r = Rotator::new(
            ElementId(1),
            host("Go, Rusty, Ok"),
            &Config::default(),
            &OptionOverrides::new(),
        );
        assert_eq!(r.init(), Phase::Activated);
        assert_eq!(r.host().container(), Some(Extent::new(5, 1)));
        assert_eq!(r.host().painted(), &["Go   ".to_string()]);

        r.tick();
        assert_eq!(r.host().painted(), &["Rusty".to_string()]);
        r.tick();
        assert_eq!(r.host().painted(), &["Ok   ".to_string()]);

        let out = String::from_utf8(r.host().output().clone()).unwrap();
        assert!(out.contains("\x1b[6;3H"), "painted at origin row 5, col 2");
    }

    #[test]
    fn only_the_active_slide_is_painted_bold() {
        let mut h = host("a,bb");
        h.mount_slides(&[Phrase::new("a"), Phrase::new("bb")]).unwrap();
        h.set_container_extent(Extent::new(2, 1)).unwrap();
        h.set_roles(0, Roles::PREV | Roles::NEXT).unwrap();
        h.set_roles(1, Roles::ACTIVE).unwrap();
        h.commit().unwrap();
        assert_eq!(h.painted(), &["bb".to_string()]);

        // Clearing the role leaves nothing to paint but blank padding.
        h.set_roles(1, Roles::empty()).unwrap();
        h.commit().unwrap();
        assert_eq!(h.painted(), &["  ".to_string()]);

        let out = String::from_utf8(h.output().clone()).unwrap();
        let bold = out.find("\x1b[1m").expect("bold on");
        let text = out.find("bb").expect("active text");
        let normal = out.find("\x1b[22m").expect("bold off");
        assert!(bold < text && text < normal);
    }

    #[test]
    fn wide_glyphs_pad_by_cells() {
        let mut r = Rotator::new(
            ElementId(1),
            host("界界|abcd").with_attributes([(ATTR_DELIM.to_string(), "|".to_string())]),
            &Config::default(),
            &OptionOverrides::new(),
        );
        r.init();
        assert_eq!(r.host().container(), Some(Extent::new(4, 1)));
        assert_eq!(r.host().painted(), &["界界".to_string()]);
    }

    #[test]
    fn multi_line_phrases_fill_container_height() {
        let mut r = Rotator::new(
            ElementId(1),
            host("one\ntwo;three"),
            &Config::default(),
            &OptionOverrides::new().with_delim(";"),
        );
        r.init();
        assert_eq!(r.host().container(), Some(Extent::new(5, 2)));
        r.tick();
        assert_eq!(
            r.host().painted(),
            &["three".to_string(), "     ".to_string()]
        );
    }

    #[test]
    fn passthrough_paints_original_text() {
        let mut h = host("OnlyOnePhrase");
        let mut r = Rotator::new(ElementId(1), h, &Config::default(), &OptionOverrides::new());
        assert_eq!(r.init(), Phase::Passthrough);
        h = r.into_host();
        assert!(h.painted().is_empty());
        h.paint_passthrough().unwrap();
        assert_eq!(h.painted(), &["OnlyOnePhrase".to_string()]);
        assert_eq!(h.footprint(), Extent::new(13, 1));
    }

    #[test]
    fn mount_clears_original_rows() {
        let mut h = host("a\nb");
        h.mount_slides(&[Phrase::new("a"), Phrase::new("b")]).unwrap();
        assert_eq!(
            h.writer.pending(),
            &[
                Command::MoveTo(2, 5),
                Command::ClearLine,
                Command::MoveTo(2, 6),
                Command::ClearLine,
            ]
        );
    }
}
