//! Main chat event loop.
//!
//! Terminal input is read on a background task and forwarded as
//! [`UiEvent`]s. Key presses become [`AppAction`]s, which are applied to the
//! [`App`]; any resulting [`AppCommand`](crate::core::app::AppCommand)s are
//! handed to the [`TaskDispatcher`], whose tasks report back with further
//! actions. The screen is redrawn after every batch.

pub mod keybindings;
pub mod lifecycle;
pub mod stream;

use std::{error::Error, sync::Arc, time::Duration};

use ratatui::crossterm::event::{self, Event};
use tokio::sync::mpsc;

use crate::api::client::CompletionClient;
use crate::core::app::{apply_action, App, AppAction};
use crate::core::appearance::ThemeMode;
use crate::core::conversation::ConversationStore;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

use self::keybindings::{map_key_event, map_paste};
use self::lifecycle::{restore_terminal, setup_terminal};
use self::stream::TaskDispatcher;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// App state plus the machinery that runs its commands.
pub struct ChatSession {
    pub app: App,
    tasks: TaskDispatcher,
    action_rx: mpsc::UnboundedReceiver<AppAction>,
}

impl ChatSession {
    pub fn new(app: App, client: Arc<dyn CompletionClient>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            app,
            tasks: TaskDispatcher::new(client, action_tx),
            action_rx,
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        let focus = self.app.ui.focus();
        let action = match event {
            Event::Key(key) => map_key_event(focus, key, !self.app.shows_welcome()),
            Event::Paste(text) => map_paste(focus, text),
            _ => None,
        };
        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    pub fn handle_action(&mut self, action: AppAction) {
        for command in apply_action(&mut self.app, action) {
            self.tasks.execute(command);
        }
    }

    /// Wait for the next action reported by a background task.
    pub async fn next_task_action(&mut self) -> Option<AppAction> {
        self.action_rx.recv().await
    }

    /// Apply every task action that is already queued.
    pub fn drain_task_actions(&mut self) -> bool {
        let mut applied = false;
        while let Ok(action) = self.action_rx.try_recv() {
            self.handle_action(action);
            applied = true;
        }
        applied
    }

    /// Persist anything still pending before the session ends.
    pub fn shutdown(&mut self) {
        self.app.store.flush_reveal();
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(
    store: ConversationStore,
    model: String,
    client: Arc<dyn CompletionClient>,
) -> Result<(), Box<dyn Error>> {
    let mut session = ChatSession::new(App::new(store, model), client);

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let mut theme_mode: ThemeMode = session.app.store.theme();
    let mut theme = Theme::for_mode(theme_mode);
    tracing::info!(model = %session.app.model, theme = %theme_mode, "chat session started");

    let result: Result<(), Box<dyn Error>> = loop {
        if session.app.ui.should_quit {
            break Ok(());
        }

        let current_mode = session.app.store.theme();
        if current_mode != theme_mode {
            theme_mode = current_mode;
            theme = Theme::for_mode(theme_mode);
        }

        if let Err(e) = terminal.draw(|f| ui(f, &mut session.app, &theme)) {
            break Err(e.into());
        }

        tokio::select! {
            event = event_rx.recv() => match event {
                Some(UiEvent::Crossterm(event)) => session.handle_event(event),
                None => break Ok(()),
            },
            Some(action) = session.next_task_action() => session.handle_action(action),
        }

        // Batch anything else that is already waiting before redrawing.
        while let Ok(UiEvent::Crossterm(event)) = event_rx.try_recv() {
            session.handle_event(event);
        }
        session.drain_task_actions();
    };

    event_reader_handle.abort();
    session.shutdown();
    restore_terminal(&mut terminal)?;
    tracing::info!("chat session ended");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{ApiError, HistoryTurn};
    use crate::core::storage::MESSAGES_KEY;
    use crate::utils::test_utils::create_test_app;
    use async_trait::async_trait;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    struct FixedClient(Result<String, ApiError>);

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, _prompt: &str, _history: &[HistoryTurn]) -> Result<String, ApiError> {
            self.0.clone()
        }
    }

    fn session(reply: Result<String, ApiError>) -> ChatSession {
        ChatSession::new(create_test_app(), Arc::new(FixedClient(reply)))
    }

    fn press(session: &mut ChatSession, code: KeyCode) {
        session.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(session: &mut ChatSession, text: &str) {
        for ch in text.chars() {
            press(session, KeyCode::Char(ch));
        }
    }

    /// Apply task actions until a reply has been revealed or has failed.
    async fn run_until_idle(session: &mut ChatSession) {
        while let Some(action) = session.next_task_action().await {
            let finished = matches!(action, AppAction::RevealFinished { .. });
            session.handle_action(action);
            let failed = !session.app.store.is_loading() && session.app.store.error().is_some();
            if finished || failed {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typed_prompt_is_answered_and_revealed() {
        let mut session = session(Ok("Hi **there** friend".into()));
        type_text(&mut session, "Hello");
        press(&mut session, KeyCode::Enter);
        assert!(session.app.store.is_loading());

        run_until_idle(&mut session).await;

        let messages = session.app.store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].content, "Hi <b>there</b> friend ");
        assert_eq!(session.app.store.input(), "");
        assert!(session
            .app
            .store
            .storage()
            .get_item(MESSAGES_KEY)
            .is_some_and(|saved| saved.contains("friend ")));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_request_sets_error_banner() {
        let mut session = session(Err(ApiError::Status {
            status: 503,
            summary: Some("overloaded".into()),
        }));
        type_text(&mut session, "Hello");
        press(&mut session, KeyCode::Enter);

        run_until_idle(&mut session).await;

        assert_eq!(session.app.store.error(), Some("API Error 503: overloaded"));
        assert!(!session.app.store.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn new_chat_during_reveal_discards_the_reply() {
        let mut session = session(Ok("one two three four".into()));
        type_text(&mut session, "Hello");
        press(&mut session, KeyCode::Enter);

        // Apply the completion and the first revealed word.
        for _ in 0..2 {
            let action = session.next_task_action().await.expect("action");
            session.handle_action(action);
        }
        session.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('n'),
            KeyModifiers::CONTROL,
        )));

        tokio::time::sleep(Duration::from_secs(1)).await;
        session.drain_task_actions();
        assert!(session.app.store.messages().is_empty());
        assert_eq!(session.app.store.storage().get_item(MESSAGES_KEY), None);
    }

    #[tokio::test]
    async fn paste_and_quit_keys() {
        let mut session = session(Ok(String::new()));
        session.handle_event(Event::Paste("pasted\ntext".into()));
        assert_eq!(session.app.store.input(), "pasted text");

        session.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(session.app.ui.should_quit);
    }
}
