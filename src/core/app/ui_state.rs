//! Presentation state that is not part of the conversation itself:
//! which panels are open, what is selected, the composer cursor and the
//! scroll position.

use ratatui::text::Line;

use crate::core::appearance::ThemeMode;
use crate::core::message::Message;

/// Prompts offered on the welcome screen.
pub const SUGGESTIONS: [&str; 4] = [
    "Provide a list of questions to help me prepare for a social media manager job interview.",
    "Generate four unit tests for the following C# function",
    "Give me 10 tips for room organization.",
    "Write a beginner's guide to kitesurfing, including an overview of what is needed to get started.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    ToggleTheme,
    ClearHistory,
    Close,
}

pub const SETTINGS_ITEMS: [SettingsItem; 3] = [
    SettingsItem::ToggleTheme,
    SettingsItem::ClearHistory,
    SettingsItem::Close,
];

/// Which part of the screen receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    Sidebar,
    Settings,
    ConfirmClear,
    Help,
    Notice,
}

#[derive(Debug, Default)]
pub struct UiState {
    pub sidebar_open: bool,
    pub sidebar_selected: usize,
    pub settings_open: bool,
    pub settings_selected: usize,
    pub confirm_clear: bool,
    pub help_open: bool,
    pub notice: Option<String>,
    /// Composer cursor, in characters.
    pub cursor: usize,
    /// Rows scrolled up from the bottom of the conversation; 0 follows new output.
    pub scroll_from_bottom: u16,
    pub card_selected: usize,
    pub should_quit: bool,
    pub prewrap_cache: PrewrapCache,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays take focus in stacking order: notice, confirm, settings, help, sidebar.
    pub fn focus(&self) -> Focus {
        if self.notice.is_some() {
            Focus::Notice
        } else if self.confirm_clear {
            Focus::ConfirmClear
        } else if self.settings_open {
            Focus::Settings
        } else if self.help_open {
            Focus::Help
        } else if self.sidebar_open {
            Focus::Sidebar
        } else {
            Focus::Composer
        }
    }

    pub fn selected_settings_item(&self) -> SettingsItem {
        SETTINGS_ITEMS[self.settings_selected.min(SETTINGS_ITEMS.len() - 1)]
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(rows);
    }

    /// Resolve the top row to display given the content and viewport heights,
    /// clamping the stored offset so it never scrolls past the first row.
    pub fn clamp_scroll(&mut self, total_rows: u16, viewport_rows: u16) -> u16 {
        let max_offset = total_rows.saturating_sub(viewport_rows);
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_offset);
        max_offset - self.scroll_from_bottom
    }
}

#[derive(Debug)]
struct CachedMessage {
    id: String,
    content_len: usize,
    rows: Vec<Line<'static>>,
}

/// Wrapped conversation rows, kept per message.
///
/// An entry is reused while the message id and content length are unchanged;
/// a width or theme change drops everything. Replies only ever grow during a
/// reveal, so only the message being revealed is rebuilt on each frame.
#[derive(Debug, Default)]
pub struct PrewrapCache {
    width: usize,
    theme: Option<ThemeMode>,
    entries: Vec<CachedMessage>,
}

impl PrewrapCache {
    /// Bring the cache in line with `messages`, calling `build` for each
    /// message whose rows are missing or stale.
    pub fn sync<F>(&mut self, messages: &[Message], width: usize, theme: ThemeMode, mut build: F)
    where
        F: FnMut(&Message) -> Vec<Line<'static>>,
    {
        if self.width != width || self.theme != Some(theme) {
            self.entries.clear();
            self.width = width;
            self.theme = Some(theme);
        }
        self.entries.truncate(messages.len());

        for (index, message) in messages.iter().enumerate() {
            let fresh = self.entries.get(index).is_some_and(|entry| {
                entry.id == message.id && entry.content_len == message.content.len()
            });
            if fresh {
                continue;
            }
            let entry = CachedMessage {
                id: message.id.clone(),
                content_len: message.content.len(),
                rows: build(message),
            };
            if index < self.entries.len() {
                self.entries[index] = entry;
            } else {
                self.entries.push(entry);
            }
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &Line<'static>> {
        self.entries.iter().flat_map(|entry| entry.rows.iter())
    }
}

/// Move a selection index by `delta`, wrapping around `len` entries.
pub fn step_selection(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    let next = (current.min(len as usize - 1) as isize + delta).rem_euclid(len);
    next as usize
}
