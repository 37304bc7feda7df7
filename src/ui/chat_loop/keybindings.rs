//! Map terminal key events to [`AppAction`]s.
//!
//! Global shortcuts work from anywhere; everything else depends on which
//! panel currently has focus.

use crate::core::app::{AppAction, Focus};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Rows scrolled by PageUp/PageDown.
const PAGE_ROWS: u16 = 10;

/// Key bindings listed in the help overlay.
pub const HELP_ENTRIES: &[(&str, &str)] = &[
    ("Enter", "Send the prompt"),
    ("Ctrl+B", "Open or close the menu"),
    ("Ctrl+N", "Start a new chat"),
    ("Ctrl+O", "Restore the saved conversation"),
    ("Ctrl+R", "Retry the last prompt"),
    ("Ctrl+T", "Switch between light and dark"),
    ("Ctrl+S", "Settings"),
    ("Ctrl+L", "Clear the prompt"),
    ("Up/Down", "Pick a suggestion, or scroll the chat"),
    ("Tab", "Use the selected suggestion"),
    ("PgUp/PgDn", "Scroll the chat by a page"),
    ("Esc", "Close the top panel"),
    ("F1", "Show or hide this help"),
    ("Ctrl+C", "Quit"),
];

pub fn map_key_event(focus: Focus, key: KeyEvent, has_conversation: bool) -> Option<AppAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if let Some(action) = map_global(&key) {
        return Some(action);
    }

    match focus {
        Focus::Notice => match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(AppAction::DismissNotice),
            _ => None,
        },
        Focus::ConfirmClear => match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                Some(AppAction::ConfirmClearHistory(true))
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                Some(AppAction::ConfirmClearHistory(false))
            }
            _ => None,
        },
        Focus::Help => match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Some(AppAction::CloseOverlay),
            _ => None,
        },
        Focus::Sidebar | Focus::Settings => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(AppAction::MoveSelection(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(AppAction::MoveSelection(1)),
            KeyCode::Enter => Some(AppAction::ActivateSelection),
            KeyCode::Esc => Some(AppAction::CloseOverlay),
            _ => None,
        },
        Focus::Composer => map_composer(&key, has_conversation),
    }
}

/// Pasted text goes to the composer.
pub fn map_paste(focus: Focus, text: String) -> Option<AppAction> {
    (focus == Focus::Composer).then_some(AppAction::InsertText(text))
}

fn map_global(key: &KeyEvent) -> Option<AppAction> {
    if key.code == KeyCode::F(1) {
        return Some(AppAction::ToggleHelp);
    }
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('c') => Some(AppAction::Quit),
        KeyCode::Char('b') => Some(AppAction::ToggleSidebar),
        KeyCode::Char('n') => Some(AppAction::NewChat),
        KeyCode::Char('o') => Some(AppAction::RestoreHistory),
        KeyCode::Char('r') => Some(AppAction::Retry),
        KeyCode::Char('t') => Some(AppAction::ToggleTheme),
        KeyCode::Char('s') => Some(AppAction::OpenSettings),
        KeyCode::Char('l') => Some(AppAction::ClearInput),
        _ => None,
    }
}

fn map_composer(key: &KeyEvent, has_conversation: bool) -> Option<AppAction> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(AppAction::InsertChar(c))
        }
        KeyCode::Enter => Some(AppAction::Submit),
        KeyCode::Backspace => Some(AppAction::Backspace),
        KeyCode::Delete => Some(AppAction::Delete),
        KeyCode::Left => Some(AppAction::CursorLeft),
        KeyCode::Right => Some(AppAction::CursorRight),
        KeyCode::Home => Some(AppAction::CursorHome),
        KeyCode::End => Some(AppAction::CursorEnd),
        KeyCode::Up if has_conversation => Some(AppAction::ScrollUp(1)),
        KeyCode::Down if has_conversation => Some(AppAction::ScrollDown(1)),
        KeyCode::Up => Some(AppAction::MoveSelection(-1)),
        KeyCode::Down => Some(AppAction::MoveSelection(1)),
        KeyCode::Tab if !has_conversation => Some(AppAction::UseSuggestion),
        KeyCode::PageUp => Some(AppAction::ScrollUp(PAGE_ROWS)),
        KeyCode::PageDown => Some(AppAction::ScrollDown(PAGE_ROWS)),
        KeyCode::Esc => Some(AppAction::ScrollToBottom),
        _ => None,
    }
}
