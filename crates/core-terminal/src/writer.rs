//! Batched terminal commands.
//!
//! A host queues primitive operations while a tick is being applied and emits
//! them in one flush, so the terminal never shows half a tick.
//!
//! Design invariants:
//! * Commands preserve ordering; no flushing mid-batch.
//! * All positions are absolute (0,0) origin; caller ensures bounds.
//! * Emphasis is scoped: every `Emphasis(true)` is closed by the caller.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    /// Clear the line under the cursor (caller issues a preceding `MoveTo`).
    ClearLine,
    Print(String),
    Emphasis(bool),
}

#[derive(Debug, Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_line(&mut self) {
        self.cmds.push(Command::ClearLine);
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn emphasis(&mut self, on: bool) {
        self.cmds.push(Command::Emphasis(on));
    }

    pub fn pending(&self) -> &[Command] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Emit and drain all queued commands into `out`, then flush it.
    pub fn flush_to<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for c in self.cmds.drain(..) {
            match c {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::ClearLine => queue!(out, Clear(ClearType::CurrentLine))?,
                Command::Print(s) => queue!(out, Print(s))?,
                Command::Emphasis(true) => queue!(out, SetAttribute(Attribute::Bold))?,
                Command::Emphasis(false) => queue!(out, SetAttribute(Attribute::NormalIntensity))?,
            }
        }
        out.flush()
    }
}
