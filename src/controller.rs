use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crate::domain::{Message, TVConfig, TVError};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(self.map_event(event::read()?));
        }
        Ok(None)
    }

    fn map_event(&self, event: Event) -> Option<Message> {
        match event {
            // crossterm also emits key release and repeat events on Windows
            Event::Key(key) if key.kind == event::KeyEventKind::Press => self.handle_key(key),
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            Event::FocusGained => Some(Message::FocusGained),
            _ => None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::MoveBeginning),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::MoveEnd),
            (KeyCode::Enter, _) => Some(Message::Select),
            (KeyCode::Backspace, _) => Some(Message::ClearSelection),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Tab, _) => Some(Message::NextSortColumn),
            (KeyCode::Char('s'), _) => Some(Message::SortAscending),
            (KeyCode::Char('S'), _) => Some(Message::SortDescending),
            (KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::Char('p'), _) => Some(Message::PreviousPage),
            (KeyCode::Char('r'), _) => Some(Message::Refetch),
            (KeyCode::Char('c'), _) => Some(Message::CopySelection),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
