//! Async terminal input service.
//!
//! Only a handful of inputs matter to a rotating display: quit keys, Ctrl-C
//! and resizes. Everything else is dropped at the mapping layer.

mod async_service;
pub use async_service::AsyncInputShutdown;

use async_service::spawn_async_event_task;

use core_events::{Event, InputEvent};
use crossterm::event::{Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use tokio::task::JoinHandle;

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// Returns the `JoinHandle` for the background task alongside a shutdown handle
/// that can be used to request immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender)
}

/// Translate a raw terminal event; `None` means "not interesting".
pub fn map_event(ev: &CEvent) -> Option<InputEvent> {
    match ev {
        CEvent::Key(key) => {
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                return None;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(InputEvent::CtrlC)
                }
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Quit),
                _ => None,
            }
        }
        CEvent::Resize(w, h) => Some(InputEvent::Resize(*w, *h)),
        _ => None,
    }
}
