use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::backend::BackendClient;

/// Shown in place of the assistant's reply whenever the exchange fails,
/// whatever the failure was. The user can simply resubmit.
pub const FALLBACK_MESSAGE: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Pending,
}

/// Owns the transcript and the single in-flight exchange.
///
/// The transcript is append-only: a submitted utterance is recorded before
/// the request goes out and is never rolled back. At most one exchange is
/// outstanding at a time; `submit` refuses while one is pending.
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    task: Option<JoinHandle<Result<String>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            task: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> RequestStatus {
        if self.task.is_some() {
            RequestStatus::Pending
        } else {
            RequestStatus::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == RequestStatus::Pending
    }

    /// Submit one utterance together with the capability list captured at
    /// call time. Returns whether the submission was accepted.
    ///
    /// Rejected without any effect when the trimmed utterance is empty or
    /// an exchange is already in flight.
    pub fn submit(
        &mut self,
        utterance: &str,
        active_capabilities: Vec<String>,
        client: &BackendClient,
    ) -> bool {
        let utterance = utterance.trim();
        if utterance.is_empty() || self.task.is_some() {
            return false;
        }

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: utterance.to_string(),
        });

        let client = client.clone();
        let message = utterance.to_string();
        self.task = Some(tokio::spawn(async move {
            client.exchange(active_capabilities, &message).await
        }));

        true
    }

    /// Reap the in-flight exchange if it has completed. Called from the
    /// event loop on every tick; does nothing while the task is running.
    pub async fn poll(&mut self) {
        let finished = self.task.as_ref().map(|t| t.is_finished()).unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(anyhow!("exchange task failed: {}", e)),
            };
            self.resolve(result);
        }
    }

    /// Fold the outcome of one exchange into the transcript. Failures are
    /// swallowed here: they appear only as the fallback message.
    fn resolve(&mut self, result: Result<String>) {
        let content = match result {
            Ok(response) => response,
            Err(_) => FALLBACK_MESSAGE.to_string(),
        };
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::selector::CapabilitySelector;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// One-connection HTTP server. Waits for `gate` (if given) before
    /// answering, so tests can hold an exchange open. Echoes the raw
    /// request back through the returned receiver.
    async fn serve_once(
        body: &'static str,
        gate: Option<oneshot::Receiver<()>>,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (raw_tx, raw_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
            let _ = raw_tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
        });

        (format!("http://{}", addr), raw_rx)
    }

    /// A base URL nothing is listening on.
    async fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn wait_idle(store: &mut ConversationStore) {
        for _ in 0..500 {
            store.poll().await;
            if !store.is_pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("exchange never completed");
    }

    #[tokio::test]
    async fn test_empty_utterance_is_noop() {
        let mut store = ConversationStore::new();
        let client = BackendClient::new(&dead_url().await);

        assert!(!store.submit("", Vec::new(), &client));
        assert!(!store.submit("   \t\n", Vec::new(), &client));
        assert_eq!(store.messages().len(), 0);
        assert_eq!(store.status(), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_rejected() {
        let (gate_tx, gate_rx) = oneshot::channel();
        let (url, _raw) = serve_once(r#"{"response":"done"}"#, Some(gate_rx)).await;
        let client = BackendClient::new(&url);
        let mut store = ConversationStore::new();

        assert!(store.submit("first", Vec::new(), &client));
        assert_eq!(store.status(), RequestStatus::Pending);

        // Second submit must not touch the transcript or issue a request.
        assert!(!store.submit("second", Vec::new(), &client));
        assert_eq!(store.messages().len(), 1);

        gate_tx.send(()).unwrap();
        wait_idle(&mut store).await;

        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[1].content, "done");
    }

    #[tokio::test]
    async fn test_in_flight_request_keeps_capabilities_captured_at_submit() {
        let (gate_tx, gate_rx) = oneshot::channel();
        let (url, raw_rx) = serve_once(r#"{"response":"done"}"#, Some(gate_rx)).await;
        let client = BackendClient::new(&url);

        let mut selector = CapabilitySelector::new(Catalog::builtin());
        selector.toggle(1);

        let mut store = ConversationStore::new();
        assert!(store.submit("hello", selector.active_internal_names(), &client));

        // Toggling while the exchange is held open must not reach the wire.
        selector.toggle(1);
        selector.toggle(2);
        assert_eq!(
            selector.active_internal_names(),
            vec!["get_website_url_content".to_string()]
        );

        gate_tx.send(()).unwrap();
        wait_idle(&mut store).await;

        let raw = raw_rx.await.unwrap();
        assert!(raw.contains(r#""tools":["google_search"]"#));
        assert!(!raw.contains("get_website_url_content"));
    }

    #[tokio::test]
    async fn test_successful_exchange_appends_assistant_reply() {
        let (url, _raw) = serve_once(r#"{"response":"hi there"}"#, None).await;
        let client = BackendClient::new(&url);

        let mut selector = CapabilitySelector::new(Catalog::builtin());
        selector.toggle(1);
        assert_eq!(selector.active_internal_names(), vec!["google_search".to_string()]);

        let mut store = ConversationStore::new();
        assert!(store.submit("hello", selector.active_internal_names(), &client));
        assert_eq!(store.status(), RequestStatus::Pending);

        wait_idle(&mut store).await;

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].content, "hi there");
        assert_eq!(store.status(), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_exchange_appends_fallback() {
        let client = BackendClient::new(&dead_url().await);
        let mut store = ConversationStore::new();

        assert!(store.submit("hello", vec!["google_search".to_string()], &client));
        wait_idle(&mut store).await;

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].content, FALLBACK_MESSAGE);
        assert_eq!(store.status(), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn test_user_message_survives_failure() {
        let client = BackendClient::new(&dead_url().await);
        let mut store = ConversationStore::new();

        store.submit("keep me", Vec::new(), &client);
        // Recorded before the request resolves.
        assert_eq!(store.messages()[0].content, "keep me");
        wait_idle(&mut store).await;
        assert_eq!(store.messages()[0].content, "keep me");
    }

    #[tokio::test]
    async fn test_store_accepts_resubmission_after_failure() {
        let client = BackendClient::new(&dead_url().await);
        let mut store = ConversationStore::new();

        store.submit("first", Vec::new(), &client);
        wait_idle(&mut store).await;
        assert_eq!(store.status(), RequestStatus::Idle);

        let (url, _raw) = serve_once(r#"{"response":"recovered"}"#, None).await;
        let client = BackendClient::new(&url);
        assert!(store.submit("second", Vec::new(), &client));
        wait_idle(&mut store).await;

        assert_eq!(store.messages().len(), 4);
        assert_eq!(store.messages()[3].content, "recovered");
    }

    #[tokio::test]
    async fn test_submit_trims_utterance() {
        let (url, _raw) = serve_once(r#"{"response":"ok"}"#, None).await;
        let client = BackendClient::new(&url);
        let mut store = ConversationStore::new();

        store.submit("  hello  ", Vec::new(), &client);
        assert_eq!(store.messages()[0].content, "hello");
        wait_idle(&mut store).await;
    }
}
