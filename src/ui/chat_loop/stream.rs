use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::api::client::CompletionClient;
use crate::core::app::{AppAction, AppCommand};
use crate::core::conversation::{PendingRequest, RevealPlan};

/// Runs [`AppCommand`]s in background tasks and reports back as [`AppAction`]s.
pub struct TaskDispatcher {
    client: Arc<dyn CompletionClient>,
    tx: mpsc::UnboundedSender<AppAction>,
    reveal_token: CancellationToken,
}

impl TaskDispatcher {
    pub fn new(client: Arc<dyn CompletionClient>, tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self {
            client,
            tx,
            reveal_token: CancellationToken::new(),
        }
    }

    pub fn execute(&mut self, command: AppCommand) {
        match command {
            AppCommand::SendRequest(request) => self.spawn_request(request),
            AppCommand::StartReveal(plan) => self.spawn_reveal(plan),
            AppCommand::CancelReveals => {
                self.reveal_token.cancel();
                self.reveal_token = CancellationToken::new();
            }
        }
    }

    fn spawn_request(&self, request: PendingRequest) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The stitched transcript already carries every prior turn.
            let result = client.complete(&request.transcript, &[]).await;
            let _ = tx.send(AppAction::RequestCompleted { request, result });
        });
    }

    fn spawn_reveal(&self, plan: RevealPlan) {
        let tx = self.tx.clone();
        let cancel_token = self.reveal_token.clone();
        tokio::spawn(async move {
            let RevealPlan {
                message_id,
                words,
                delay,
            } = plan;
            let start = Instant::now();

            for (index, word) in words.into_iter().enumerate() {
                let deadline = start + delay.saturating_mul(index as u32);
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    _ = cancel_token.cancelled() => return,
                }
                let action = AppAction::RevealWord {
                    message_id: message_id.clone(),
                    word,
                };
                if tx.send(action).is_err() {
                    return;
                }
            }

            let _ = tx.send(AppAction::RevealFinished { message_id });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{ApiError, HistoryTurn};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingClient {
        reply: Result<String, ApiError>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, prompt: &str, _history: &[HistoryTurn]) -> Result<String, ApiError> {
            self.prompts.lock().expect("lock").push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn dispatcher(
        reply: Result<String, ApiError>,
    ) -> (
        TaskDispatcher,
        Arc<RecordingClient>,
        mpsc::UnboundedReceiver<AppAction>,
    ) {
        let client = Arc::new(RecordingClient {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        (TaskDispatcher::new(client.clone(), tx), client, rx)
    }

    fn plan(words: &[&str]) -> RevealPlan {
        RevealPlan {
            message_id: "m1".into(),
            words: words.iter().map(|w| w.to_string()).collect(),
            delay: Duration::from_millis(75),
        }
    }

    #[tokio::test]
    async fn request_result_is_reported_back() {
        let (mut tasks, client, mut rx) = dispatcher(Ok("hello".into()));
        let request = PendingRequest {
            request_id: 7,
            generation: 0,
            transcript: "User: hi".into(),
        };
        tasks.execute(AppCommand::SendRequest(request.clone()));

        match rx.recv().await {
            Some(AppAction::RequestCompleted {
                request: returned,
                result,
            }) => {
                assert_eq!(returned, request);
                assert_eq!(result.expect("ok"), "hello");
            }
            other => panic!("unexpected action: {other:?}"),
        }
        assert_eq!(*client.prompts.lock().expect("lock"), vec!["User: hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_emits_words_on_schedule() {
        let (mut tasks, _client, mut rx) = dispatcher(Ok(String::new()));
        let start = Instant::now();
        tasks.execute(AppCommand::StartReveal(plan(&["a ", "b ", "c "])));

        let mut arrivals = Vec::new();
        while let Some(action) = rx.recv().await {
            match action {
                AppAction::RevealWord { word, .. } => {
                    arrivals.push((word, start.elapsed().as_millis()));
                }
                AppAction::RevealFinished { message_id } => {
                    assert_eq!(message_id, "m1");
                    break;
                }
                other => panic!("unexpected action: {other:?}"),
            }
        }

        assert_eq!(
            arrivals,
            vec![
                ("a ".to_string(), 0),
                ("b ".to_string(), 75),
                ("c ".to_string(), 150)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reveal_stops_emitting() {
        let (mut tasks, _client, mut rx) = dispatcher(Ok(String::new()));
        tasks.execute(AppCommand::StartReveal(plan(&["a ", "b ", "c "])));

        assert!(matches!(rx.recv().await, Some(AppAction::RevealWord { .. })));
        tasks.execute(AppCommand::CancelReveals);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());

        // New reveals still run after a cancel.
        tasks.execute(AppCommand::StartReveal(plan(&["z "])));
        assert!(matches!(
            rx.recv().await,
            Some(AppAction::RevealWord { word, .. }) if word == "z "
        ));
    }
}
