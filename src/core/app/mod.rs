//! Application state shared by the event loop and the renderer.

pub mod actions;
pub mod ui_state;

pub use actions::{apply_action, apply_actions, AppAction, AppCommand};
pub use ui_state::{Focus, SettingsItem, UiState, SETTINGS_ITEMS, SUGGESTIONS};

use crate::core::conversation::ConversationStore;

/// One row of the sidebar, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEntry {
    NewChat,
    Recent(String),
    Help,
    Activity,
    Settings,
}

impl SidebarEntry {
    pub fn label(&self) -> &str {
        match self {
            SidebarEntry::NewChat => "New chat",
            SidebarEntry::Recent(prompt) => prompt,
            SidebarEntry::Help => "Help",
            SidebarEntry::Activity => "Activity",
            SidebarEntry::Settings => "Settings",
        }
    }
}

pub struct App {
    pub store: ConversationStore,
    pub ui: UiState,
    pub model: String,
}

impl App {
    pub fn new(store: ConversationStore, model: String) -> Self {
        Self {
            store,
            ui: UiState::new(),
            model,
        }
    }

    pub fn sidebar_entries(&self) -> Vec<SidebarEntry> {
        let mut entries = vec![SidebarEntry::NewChat];
        entries.extend(
            self.store
                .recent_prompts()
                .into_iter()
                .map(SidebarEntry::Recent),
        );
        entries.extend([
            SidebarEntry::Help,
            SidebarEntry::Activity,
            SidebarEntry::Settings,
        ]);
        entries
    }

    /// Whether the welcome screen (greeting and suggestion cards) is shown
    /// instead of the conversation.
    pub fn shows_welcome(&self) -> bool {
        !self.store.show_result()
    }

    /// Whether Enter in the composer would send anything.
    pub fn can_submit(&self) -> bool {
        !self.store.is_loading() && !self.store.input().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;

    #[test]
    fn sidebar_lists_recent_prompts_between_fixed_entries() {
        let mut app = create_test_app();
        let _ = app.store.on_sent(Some("first".into()));
        let _ = app.store.on_sent(Some("second".into()));

        assert_eq!(
            app.sidebar_entries(),
            vec![
                SidebarEntry::NewChat,
                SidebarEntry::Recent("second".into()),
                SidebarEntry::Recent("first".into()),
                SidebarEntry::Help,
                SidebarEntry::Activity,
                SidebarEntry::Settings,
            ]
        );
    }

    #[test]
    fn welcome_shows_until_something_is_sent() {
        let mut app = create_test_app();
        assert!(app.shows_welcome());
        let _ = app.store.on_sent(Some("hi".into()));
        assert!(!app.shows_welcome());
        app.store.new_chat();
        assert!(app.shows_welcome());
    }

    #[test]
    fn clearing_history_keeps_the_conversation_view() {
        let mut app = create_test_app();
        let _ = app.store.on_sent(Some("hi".into()));
        app.store.clear_history();
        assert!(app.store.messages().is_empty());
        assert!(!app.shows_welcome());
    }

    #[test]
    fn submit_requires_text_and_idle_store() {
        let mut app = create_test_app();
        assert!(!app.can_submit());
        app.store.set_input("hello");
        assert!(app.can_submit());
        let _ = app.store.on_sent(None);
        assert!(!app.can_submit());
    }
}
