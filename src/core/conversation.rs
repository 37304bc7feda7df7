//! The conversation store: message history, composer text, request and
//! error flags, and the theme preference.
//!
//! The store is synchronous. Actions that need the network hand back a
//! [`PendingRequest`] which the event loop runs; the outcome is fed back
//! through [`ConversationStore::complete_request`]. Replies are revealed a
//! word at a time according to the returned [`RevealPlan`].

use std::collections::HashSet;
use std::time::Duration;

use crate::api::client::ApiError;
use crate::core::appearance::{resolve_initial_theme, ThemeMode};
use crate::core::markup::{format_markdown_to_html, stitch_transcript};
use crate::core::message::{Message, Role};
use crate::core::storage::{LocalStorage, MESSAGES_KEY, THEME_KEY};

/// Assistant bubble appended when a request fails.
pub const SERVER_ERROR_MARKUP: &str = "<div role=\"alert\"><b>Server error:</b> Sorry\u{2014}something went wrong on the server. Please try again.</div>";
/// Banner text used when an error carries no message of its own.
pub const FALLBACK_ERROR: &str =
    "Sorry\u{2014}something went wrong on the server. Please try again in a moment.";
pub const NO_HISTORY_NOTICE: &str =
    "There is no prior history available for the given conversation.";
pub const RECENT_PROMPT_LIMIT: usize = 20;

/// A request the event loop should send to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    /// Bumped by [`ConversationStore::new_chat`]; stale results are dropped.
    pub generation: u64,
    pub transcript: String,
}

/// Words to append, in order, to one assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    pub message_id: String,
    pub words: Vec<String>,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Nothing saved on this device.
    Missing,
    /// The saved list is the same length as what is already shown.
    Unchanged(usize),
    Restored(usize),
    /// The saved value could not be decoded; state is untouched.
    Invalid(String),
}

#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    input: String,
    show_result: bool,
    loading: bool,
    error: Option<String>,
    theme: ThemeMode,
    storage: LocalStorage,
    word_delay: Duration,
    next_request_id: u64,
    generation: u64,
    reveal_dirty: bool,
}

impl ConversationStore {
    pub fn new(storage: LocalStorage, system_theme: Option<ThemeMode>, word_delay: Duration) -> Self {
        let theme = resolve_initial_theme(storage.get_item(THEME_KEY), system_theme);
        let mut store = Self {
            messages: Vec::new(),
            input: String::new(),
            show_result: false,
            loading: false,
            error: None,
            theme,
            storage,
            word_delay,
            next_request_id: 1,
            generation: 0,
            reveal_dirty: false,
        };
        store.persist_theme();
        store
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the conversation view (rather than the welcome screen) is shown.
    ///
    /// Set by sending or restoring, cleared only by a new chat; clearing the
    /// saved history keeps the (now empty) conversation view.
    pub fn show_result(&self) -> bool {
        self.show_result
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Submit `prompt`, or the trimmed composer text when `prompt` is `None`.
    ///
    /// Returns `None` (and clears the loading flag) when there is nothing to send.
    pub fn on_sent(&mut self, prompt: Option<String>) -> Option<PendingRequest> {
        self.loading = true;
        self.show_result = true;
        self.error = None;

        let text = match prompt {
            Some(prompt) => prompt,
            None => self.input.trim().to_string(),
        };
        if text.is_empty() {
            self.loading = false;
            return None;
        }

        self.messages.push(Message::user(text));
        self.persist_messages();

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        tracing::info!(request_id, turns = self.messages.len(), "prompt submitted");
        Some(PendingRequest {
            request_id,
            generation: self.generation,
            transcript: stitch_transcript(&self.messages),
        })
    }

    /// Apply the outcome of a request started by [`Self::on_sent`].
    pub fn complete_request(
        &mut self,
        request: &PendingRequest,
        result: Result<String, ApiError>,
    ) -> Option<RevealPlan> {
        if request.generation != self.generation {
            tracing::debug!(request_id = request.request_id, "dropping result for a cleared chat");
            return None;
        }

        let plan = match result {
            Ok(text) => {
                let formatted = format_markdown_to_html(&text);
                let reply = Message::assistant(String::new());
                let message_id = reply.id.clone();
                self.messages.push(reply);

                let words = formatted.split(' ').map(|w| format!("{w} ")).collect();
                Some(RevealPlan {
                    message_id,
                    words,
                    delay: self.word_delay,
                })
            }
            Err(err) => {
                tracing::warn!(request_id = request.request_id, "request failed: {err}");
                let readable = err.to_string();
                self.error = Some(if readable.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    readable
                });
                self.messages.push(Message::assistant(SERVER_ERROR_MARKUP));
                None
            }
        };

        self.loading = false;
        self.input.clear();
        self.persist_messages();
        plan
    }

    /// Append one revealed word to the assistant message `message_id`.
    ///
    /// Returns `false` when that message no longer exists.
    pub fn append_reveal(&mut self, message_id: &str, word: &str) -> bool {
        match self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id == message_id && m.role.is_assistant())
        {
            Some(message) => {
                message.content.push_str(word);
                self.reveal_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Persist words appended since the last save.
    pub fn flush_reveal(&mut self) {
        if self.reveal_dirty {
            self.reveal_dirty = false;
            self.persist_messages();
        }
    }

    pub fn new_chat(&mut self) {
        self.loading = false;
        self.show_result = false;
        self.error = None;
        self.input.clear();
        self.messages.clear();
        self.reveal_dirty = false;
        self.generation += 1;
        if let Err(e) = self.storage.remove_item(MESSAGES_KEY) {
            tracing::warn!("failed to remove saved conversation: {e}");
        }
        tracing::info!("started a new chat");
    }

    /// Replace the conversation with the one saved on this device.
    pub fn restore_history(&mut self) -> HistoryOutcome {
        let Some(saved) = self.storage.get_item(MESSAGES_KEY) else {
            return HistoryOutcome::Missing;
        };

        let parsed: Vec<Message> = match serde_json::from_str(saved) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("failed to parse saved chat: {e}");
                return HistoryOutcome::Invalid(e.to_string());
            }
        };

        let count = parsed.len();
        let unchanged = count == self.messages.len();
        self.messages = parsed;
        if count > 0 {
            self.show_result = true;
        }
        tracing::info!(count, "restored saved conversation");

        if unchanged {
            HistoryOutcome::Unchanged(count)
        } else {
            HistoryOutcome::Restored(count)
        }
    }

    /// Delete the saved conversation and empty the current one.
    pub fn clear_history(&mut self) {
        if let Err(e) = self.storage.remove_item(MESSAGES_KEY) {
            tracing::warn!("failed to remove saved conversation: {e}");
        }
        self.messages.clear();
        self.reveal_dirty = false;
    }

    /// Re-send the most recent user prompt.
    pub fn retry(&mut self) -> Option<PendingRequest> {
        let last_prompt = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role.is_user())
            .map(|m| m.content.clone())?;
        self.on_sent(Some(last_prompt))
    }

    /// Distinct user prompts, newest first, capped at [`RECENT_PROMPT_LIMIT`].
    pub fn recent_prompts(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut recent = Vec::new();
        for message in self.messages.iter().rev() {
            if message.role != Role::User {
                continue;
            }
            let text = message.content.trim();
            if text.is_empty() || !seen.insert(text.to_string()) {
                continue;
            }
            recent.push(text.to_string());
            if recent.len() >= RECENT_PROMPT_LIMIT {
                break;
            }
        }
        recent
    }

    pub fn toggle_theme(&mut self) {
        self.set_theme(self.theme.toggled());
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
        self.persist_theme();
    }

    fn persist_theme(&mut self) {
        // Theme persistence is best effort.
        if let Err(e) = self.storage.set_item(THEME_KEY, self.theme.as_str()) {
            tracing::debug!("could not store theme: {e}");
        }
    }

    fn persist_messages(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        match serde_json::to_string(&self.messages) {
            Ok(json) => {
                if let Err(e) = self.storage.set_item(MESSAGES_KEY, json) {
                    tracing::warn!("failed to save conversation: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to encode conversation: {e}"),
        }
    }
}

/// Shorten a prompt for the sidebar list.
pub fn truncate_prompt(prompt: &str, max_chars: usize) -> String {
    if prompt.chars().count() > max_chars {
        let head: String = prompt.chars().take(max_chars).collect();
        format!("{head}\u{2026}")
    } else {
        prompt.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_store, create_test_store_at};
    use tempfile::TempDir;

    fn send(store: &mut ConversationStore, text: &str) -> PendingRequest {
        store.set_input(text);
        store.on_sent(None).expect("request should be produced")
    }

    fn reveal_all(store: &mut ConversationStore, plan: &RevealPlan) {
        for word in &plan.words {
            assert!(store.append_reveal(&plan.message_id, word));
        }
        store.flush_reveal();
    }

    #[test]
    fn on_sent_appends_user_message_and_stitches_transcript() {
        let mut store = create_test_store();
        let request = send(&mut store, "  Hello there  ");

        assert!(store.is_loading());
        assert!(store.show_result());
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].role, Role::User);
        assert_eq!(store.messages()[0].content, "Hello there");
        assert_eq!(request.transcript, "User: Hello there");
    }

    #[test]
    fn on_sent_with_blank_input_does_nothing() {
        let mut store = create_test_store();
        store.set_input("   ");
        assert!(store.on_sent(None).is_none());
        assert!(!store.is_loading());
        assert!(store.messages().is_empty());
    }

    #[test]
    fn explicit_prompt_is_sent_untrimmed() {
        let mut store = create_test_store();
        let request = store.on_sent(Some("   ".into())).expect("request");
        assert_eq!(store.messages()[0].content, "   ");
        assert_eq!(request.transcript, "User:    ");

        assert!(store.on_sent(Some(String::new())).is_none());
        assert!(!store.is_loading());
    }

    #[test]
    fn explicit_prompt_overrides_input() {
        let mut store = create_test_store();
        store.set_input("draft");
        let request = store
            .on_sent(Some("Give me 10 tips".into()))
            .expect("request");
        assert_eq!(request.transcript, "User: Give me 10 tips");
        assert_eq!(store.input(), "draft");
    }

    #[test]
    fn success_formats_and_plans_word_reveal() {
        let mut store = create_test_store();
        let request = send(&mut store, "hi");

        let plan = store
            .complete_request(&request, Ok("Hello **big** world*".into()))
            .expect("plan");

        assert!(!store.is_loading());
        assert_eq!(store.input(), "");
        assert_eq!(
            plan.words,
            vec!["Hello ", "<b>big</b> ", "world</br> "]
        );
        assert_eq!(plan.delay, Duration::from_millis(75));

        let last = store.messages().last().expect("assistant message");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "");
        assert_eq!(last.id, plan.message_id);

        reveal_all(&mut store, &plan);
        assert_eq!(
            store.messages().last().map(|m| m.content.as_str()),
            Some("Hello <b>big</b> world</br> ")
        );
    }

    #[test]
    fn failure_sets_error_and_appends_alert() {
        let mut store = create_test_store();
        let request = send(&mut store, "hi");

        let plan = store.complete_request(&request, Err(ApiError::UnexpectedResponse));
        assert!(plan.is_none());
        assert!(!store.is_loading());
        assert_eq!(
            store.error(),
            Some("Received an unexpected response from the server.")
        );
        let last = store.messages().last().expect("error bubble");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, SERVER_ERROR_MARKUP);
    }

    #[test]
    fn transcript_includes_prior_turns() {
        let mut store = create_test_store();
        let first = send(&mut store, "one");
        let plan = store
            .complete_request(&first, Ok("uno".into()))
            .expect("plan");
        reveal_all(&mut store, &plan);

        let second = send(&mut store, "two");
        assert_eq!(
            second.transcript,
            "User: one\n\nAssistant: uno \n\nUser: two"
        );
        assert!(second.request_id > first.request_id);
    }

    #[test]
    fn reveal_targets_its_own_message_when_requests_overlap() {
        let mut store = create_test_store();
        let first = send(&mut store, "first");
        let first_plan = store
            .complete_request(&first, Ok("alpha beta".into()))
            .expect("plan");

        // A second prompt while the first reply is still being revealed.
        let second = send(&mut store, "second");
        store.append_reveal(&first_plan.message_id, "alpha ");
        let second_plan = store
            .complete_request(&second, Ok("gamma".into()))
            .expect("plan");
        store.append_reveal(&first_plan.message_id, "beta ");
        store.append_reveal(&second_plan.message_id, "gamma ");

        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "alpha beta ", "second", "gamma "]);
    }

    #[test]
    fn new_chat_resets_state_and_drops_stale_results() {
        let mut store = create_test_store();
        let request = send(&mut store, "hi");
        store.new_chat();

        assert!(!store.is_loading());
        assert!(!store.show_result());
        assert!(store.messages().is_empty());
        assert_eq!(store.storage().get_item(MESSAGES_KEY), None);

        assert!(store.complete_request(&request, Ok("late".into())).is_none());
        assert!(store.messages().is_empty());
        assert!(!store.append_reveal("missing", "word "));
    }

    #[test]
    fn messages_persist_and_restore() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("storage.json");

        let mut store = create_test_store_at(&path);
        let request = send(&mut store, "remember me");
        let plan = store
            .complete_request(&request, Ok("ok".into()))
            .expect("plan");
        reveal_all(&mut store, &plan);
        let saved = store.messages().to_vec();

        let mut fresh = create_test_store_at(&path);
        assert!(fresh.messages().is_empty());
        assert_eq!(fresh.restore_history(), HistoryOutcome::Restored(2));
        assert_eq!(fresh.messages(), saved.as_slice());
        assert!(fresh.show_result());

        // Restoring again finds nothing new.
        assert_eq!(fresh.restore_history(), HistoryOutcome::Unchanged(2));
    }

    #[test]
    fn restore_with_equal_length_still_replaces_contents() {
        let mut store = create_test_store();
        let _ = store.on_sent(Some("live one".into()));
        let saved = vec![Message::user("saved one")];
        store
            .storage
            .set_item(MESSAGES_KEY, serde_json::to_string(&saved).expect("json"))
            .expect("seed");

        assert_eq!(store.restore_history(), HistoryOutcome::Unchanged(1));
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].content, "saved one");
    }

    #[test]
    fn restore_without_saved_history_reports_missing() {
        let mut store = create_test_store();
        assert_eq!(store.restore_history(), HistoryOutcome::Missing);
    }

    #[test]
    fn restore_with_invalid_json_leaves_state_alone() {
        let mut storage = LocalStorage::in_memory();
        storage
            .set_item(MESSAGES_KEY, r#"{"not":"an array"}"#)
            .expect("set");
        let mut store = ConversationStore::new(storage, None, Duration::from_millis(75));
        let _ = send(&mut store, "keep");

        // The send above overwrote the key, so corrupt it again.
        store
            .storage
            .set_item(MESSAGES_KEY, "nonsense")
            .expect("set");
        assert!(matches!(store.restore_history(), HistoryOutcome::Invalid(_)));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn clear_history_removes_saved_messages() {
        let mut store = create_test_store();
        let _ = send(&mut store, "secret");
        assert!(store.storage().get_item(MESSAGES_KEY).is_some());

        store.clear_history();
        assert!(store.messages().is_empty());
        assert_eq!(store.storage().get_item(MESSAGES_KEY), None);
    }

    #[test]
    fn retry_resends_last_user_prompt() {
        let mut store = create_test_store();
        let request = send(&mut store, "try this");
        store.complete_request(&request, Err(ApiError::Transport("refused".into())));
        assert!(store.error().is_some());

        let retry = store.retry().expect("retry request");
        assert!(store.error().is_none());
        assert!(retry.transcript.ends_with("User: try this"));
        assert_eq!(
            store.messages().iter().filter(|m| m.role.is_user()).count(),
            2
        );
    }

    #[test]
    fn retry_without_prompts_is_noop() {
        let mut store = create_test_store();
        assert!(store.retry().is_none());
    }

    #[test]
    fn recent_prompts_are_unique_newest_first_and_capped() {
        let mut store = create_test_store();
        for prompt in ["a", "b", " a ", "c"] {
            let _ = store.on_sent(Some(prompt.to_string()));
        }
        assert_eq!(store.recent_prompts(), vec!["c", "a", "b"]);

        let mut store = create_test_store();
        for i in 0..30 {
            let _ = store.on_sent(Some(format!("prompt {i}")));
        }
        let recent = store.recent_prompts();
        assert_eq!(recent.len(), RECENT_PROMPT_LIMIT);
        assert_eq!(recent[0], "prompt 29");
    }

    #[test]
    fn theme_is_loaded_and_persisted() {
        let mut storage = LocalStorage::in_memory();
        storage.set_item(THEME_KEY, "dark").expect("set");
        let mut store = ConversationStore::new(storage, Some(ThemeMode::Light), Duration::ZERO);
        assert_eq!(store.theme(), ThemeMode::Dark);

        store.toggle_theme();
        assert_eq!(store.theme(), ThemeMode::Light);
        assert_eq!(store.storage().get_item(THEME_KEY), Some("light"));
    }

    #[test]
    fn system_theme_used_when_nothing_stored() {
        let store = ConversationStore::new(
            LocalStorage::in_memory(),
            Some(ThemeMode::Dark),
            Duration::ZERO,
        );
        assert_eq!(store.theme(), ThemeMode::Dark);
        assert_eq!(store.storage().get_item(THEME_KEY), Some("dark"));
    }

    #[test]
    fn truncate_prompt_adds_ellipsis() {
        assert_eq!(truncate_prompt("short", 40), "short");
        let long = "x".repeat(45);
        assert_eq!(truncate_prompt(&long, 40), format!("{}\u{2026}", "x".repeat(40)));
    }
}
