//! State transitions driven by key presses and background task results.
//!
//! Every input to the app is an [`AppAction`]. Applying an action mutates
//! the [`App`] synchronously and may yield an [`AppCommand`] that the event
//! loop carries out asynchronously (network calls, timers).

use super::ui_state::{step_selection, SettingsItem, SETTINGS_ITEMS, SUGGESTIONS};
use super::{App, SidebarEntry};
use crate::api::client::ApiError;
use crate::core::conversation::{HistoryOutcome, PendingRequest, RevealPlan, NO_HISTORY_NOTICE};

#[derive(Debug)]
pub enum AppAction {
    InsertChar(char),
    InsertText(String),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    ClearInput,
    Submit,
    SendPrompt(String),
    Retry,
    RequestCompleted {
        request: PendingRequest,
        result: Result<String, ApiError>,
    },
    RevealWord {
        message_id: String,
        word: String,
    },
    RevealFinished {
        message_id: String,
    },
    NewChat,
    RestoreHistory,
    ToggleTheme,
    ToggleSidebar,
    ToggleHelp,
    OpenSettings,
    CloseOverlay,
    MoveSelection(isize),
    ActivateSelection,
    ConfirmClearHistory(bool),
    UseSuggestion,
    ScrollUp(u16),
    ScrollDown(u16),
    ScrollToBottom,
    DismissNotice,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AppCommand {
    SendRequest(PendingRequest),
    StartReveal(RevealPlan),
    CancelReveals,
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        commands.extend(apply_action(app, action));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::InsertChar(ch) => {
            insert_text(app, &ch.to_string());
            vec![]
        }
        AppAction::InsertText(text) => {
            // The composer is single-line.
            let flattened = text.replace(['\r', '\n'], " ");
            insert_text(app, &flattened);
            vec![]
        }
        AppAction::Backspace => {
            if app.ui.cursor > 0 {
                app.ui.cursor -= 1;
                let at = char_to_byte_index(app.store.input(), app.ui.cursor);
                app.store.input_mut().remove(at);
            }
            vec![]
        }
        AppAction::Delete => {
            if app.ui.cursor < app.store.input().chars().count() {
                let at = char_to_byte_index(app.store.input(), app.ui.cursor);
                app.store.input_mut().remove(at);
            }
            vec![]
        }
        AppAction::CursorLeft => {
            app.ui.cursor = app.ui.cursor.saturating_sub(1);
            vec![]
        }
        AppAction::CursorRight => {
            let len = app.store.input().chars().count();
            app.ui.cursor = (app.ui.cursor + 1).min(len);
            vec![]
        }
        AppAction::CursorHome => {
            app.ui.cursor = 0;
            vec![]
        }
        AppAction::CursorEnd => {
            app.ui.cursor = app.store.input().chars().count();
            vec![]
        }
        AppAction::ClearInput => {
            app.store.input_mut().clear();
            app.ui.cursor = 0;
            vec![]
        }
        AppAction::Submit => {
            if !app.can_submit() {
                return vec![];
            }
            send(app, None)
        }
        AppAction::SendPrompt(prompt) => {
            let prompt = prompt.trim().to_string();
            if prompt.is_empty() {
                return vec![];
            }
            app.ui.sidebar_open = false;
            send(app, Some(prompt))
        }
        AppAction::Retry => {
            let commands: Vec<AppCommand> = app
                .store
                .retry()
                .map(AppCommand::SendRequest)
                .into_iter()
                .collect();
            if !commands.is_empty() {
                app.ui.scroll_from_bottom = 0;
            }
            commands
        }
        AppAction::RequestCompleted { request, result } => {
            let plan = app.store.complete_request(&request, result);
            app.ui.cursor = app.ui.cursor.min(app.store.input().chars().count());
            plan.map(AppCommand::StartReveal).into_iter().collect()
        }
        AppAction::RevealWord { message_id, word } => {
            app.store.append_reveal(&message_id, &word);
            vec![]
        }
        AppAction::RevealFinished { message_id } => {
            tracing::debug!(%message_id, "reveal finished");
            app.store.flush_reveal();
            vec![]
        }
        AppAction::NewChat => {
            app.store.new_chat();
            app.ui.cursor = 0;
            app.ui.scroll_from_bottom = 0;
            app.ui.sidebar_selected = 0;
            vec![AppCommand::CancelReveals]
        }
        AppAction::RestoreHistory => {
            restore_history(app);
            vec![]
        }
        AppAction::ToggleTheme => {
            app.store.toggle_theme();
            vec![]
        }
        AppAction::ToggleSidebar => {
            app.ui.sidebar_open = !app.ui.sidebar_open;
            app.ui.sidebar_selected = 0;
            vec![]
        }
        AppAction::ToggleHelp => {
            app.ui.help_open = !app.ui.help_open;
            vec![]
        }
        AppAction::OpenSettings => {
            app.ui.settings_open = true;
            app.ui.settings_selected = 0;
            vec![]
        }
        AppAction::CloseOverlay => {
            close_top_overlay(app);
            vec![]
        }
        AppAction::MoveSelection(delta) => {
            move_selection(app, delta);
            vec![]
        }
        AppAction::ActivateSelection => activate_selection(app),
        AppAction::ConfirmClearHistory(confirmed) => {
            app.ui.confirm_clear = false;
            if confirmed {
                app.store.clear_history();
                app.ui.scroll_from_bottom = 0;
                return vec![AppCommand::CancelReveals];
            }
            vec![]
        }
        AppAction::UseSuggestion => {
            let index = app.ui.card_selected.min(SUGGESTIONS.len() - 1);
            app.store.set_input(SUGGESTIONS[index]);
            app.ui.cursor = SUGGESTIONS[index].chars().count();
            vec![]
        }
        AppAction::ScrollUp(rows) => {
            app.ui.scroll_up(rows);
            vec![]
        }
        AppAction::ScrollDown(rows) => {
            app.ui.scroll_down(rows);
            vec![]
        }
        AppAction::ScrollToBottom => {
            app.ui.scroll_from_bottom = 0;
            vec![]
        }
        AppAction::DismissNotice => {
            app.ui.notice = None;
            vec![]
        }
        AppAction::Quit => {
            app.ui.should_quit = true;
            vec![]
        }
    }
}

fn send(app: &mut App, prompt: Option<String>) -> Vec<AppCommand> {
    let request = app.store.on_sent(prompt);
    app.ui.scroll_from_bottom = 0;
    request.map(AppCommand::SendRequest).into_iter().collect()
}

fn insert_text(app: &mut App, text: &str) {
    let at = char_to_byte_index(app.store.input(), app.ui.cursor);
    app.store.input_mut().insert_str(at, text);
    app.ui.cursor += text.chars().count();
}

fn restore_history(app: &mut App) {
    match app.store.restore_history() {
        HistoryOutcome::Missing | HistoryOutcome::Unchanged(_) => {
            app.ui.notice = Some(NO_HISTORY_NOTICE.to_string());
        }
        HistoryOutcome::Restored(_) => {
            app.ui.sidebar_open = false;
            app.ui.scroll_from_bottom = 0;
        }
        HistoryOutcome::Invalid(reason) => {
            app.ui.notice = Some(format!("Failed to parse saved chat: {reason}"));
        }
    }
}

fn close_top_overlay(app: &mut App) {
    let ui = &mut app.ui;
    if ui.notice.is_some() {
        ui.notice = None;
    } else if ui.confirm_clear {
        ui.confirm_clear = false;
    } else if ui.settings_open {
        ui.settings_open = false;
    } else if ui.help_open {
        ui.help_open = false;
    } else if ui.sidebar_open {
        ui.sidebar_open = false;
    }
}

fn move_selection(app: &mut App, delta: isize) {
    use super::Focus;
    match app.ui.focus() {
        Focus::Sidebar => {
            let len = app.sidebar_entries().len();
            app.ui.sidebar_selected = step_selection(app.ui.sidebar_selected, delta, len);
        }
        Focus::Settings => {
            app.ui.settings_selected =
                step_selection(app.ui.settings_selected, delta, SETTINGS_ITEMS.len());
        }
        Focus::Composer if app.shows_welcome() => {
            app.ui.card_selected = step_selection(app.ui.card_selected, delta, SUGGESTIONS.len());
        }
        _ => {}
    }
}

fn activate_selection(app: &mut App) -> Vec<AppCommand> {
    use super::Focus;
    match app.ui.focus() {
        Focus::Sidebar => {
            let entries = app.sidebar_entries();
            let Some(entry) = entries.get(app.ui.sidebar_selected).cloned() else {
                return vec![];
            };
            match entry {
                SidebarEntry::NewChat => apply_action(app, AppAction::NewChat),
                SidebarEntry::Recent(prompt) => apply_action(app, AppAction::SendPrompt(prompt)),
                SidebarEntry::Help => {
                    app.ui.help_open = true;
                    vec![]
                }
                SidebarEntry::Activity => {
                    restore_history(app);
                    vec![]
                }
                SidebarEntry::Settings => apply_action(app, AppAction::OpenSettings),
            }
        }
        Focus::Settings => match app.ui.selected_settings_item() {
            SettingsItem::ToggleTheme => {
                app.store.toggle_theme();
                vec![]
            }
            SettingsItem::ClearHistory => {
                app.ui.confirm_clear = true;
                vec![]
            }
            SettingsItem::Close => {
                app.ui.settings_open = false;
                vec![]
            }
        },
        Focus::Notice => {
            app.ui.notice = None;
            vec![]
        }
        Focus::ConfirmClear => apply_action(app, AppAction::ConfirmClearHistory(true)),
        Focus::Help => {
            app.ui.help_open = false;
            vec![]
        }
        Focus::Composer => apply_action(app, AppAction::Submit),
    }
}

/// Convert a character index to a byte index for UTF-8 safe string edits.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
