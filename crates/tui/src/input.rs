//! Key bindings.

use bitsmuggler_core::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press means to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// A session command that does not need the input line.
    Session(Command),
    /// Submit the current input line.
    Submit,
    Insert(char),
    Backspace,
    Quit,
    Ignore,
}

pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyAction::Quit,
            KeyCode::Char('n') => KeyAction::Session(Command::NextPage),
            KeyCode::Char('p') => KeyAction::Session(Command::PrevPage),
            KeyCode::Char('s') => KeyAction::Session(Command::ToggleSubtitles),
            KeyCode::Char('d') => KeyAction::Session(Command::RequestDownload),
            KeyCode::Char('r') => KeyAction::Session(Command::CancelDownload),
            _ => KeyAction::Ignore,
        };
    }

    match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Up => KeyAction::Session(Command::SelectPrevious),
        KeyCode::Down => KeyAction::Session(Command::SelectNext),
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => KeyAction::Insert(c),
        _ => KeyAction::Ignore,
    }
}
