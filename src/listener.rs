//! Background drain of a node's inbound message feed.
//!
//! The daemon pushes each received message over a WebSocket, usually as a
//! comma-separated list of byte values (`72,105`), sometimes as plain text.
//! [`decode_frame`] turns either shape into a printable string and the
//! listener task appends it to the node's [`Inbox`].

use futures::StreamExt;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Ordered, append-only buffer of received messages.
#[derive(Debug, Default)]
pub struct Inbox {
    messages: RwLock<Vec<String>>,
    arrivals: Notify,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn push(&self, message: String) {
        self.messages.write().await.push(message);
        self.arrivals.notify_waiters();
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn last(&self) -> Option<String> {
        self.messages.read().await.last().cloned()
    }

    /// Waits until a message containing `needle` is present, or `timeout`
    /// elapses. Messages already in the inbox count.
    pub async fn wait_for(&self, needle: &str, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register before checking so an arrival in between is not missed.
            let notified = self.arrivals.notified();

            if let Some(found) = self
                .messages
                .read()
                .await
                .iter()
                .rev()
                .find(|m| m.contains(needle))
            {
                return Some(found.clone());
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }
}

/// Decodes one feed frame.
///
/// A frame made entirely of comma-separated byte values is decoded as UTF-8,
/// with invalid sequences rendered as ASCII escapes. Any other frame is kept
/// verbatim.
pub fn decode_frame(frame: &str) -> String {
    let bytes: Result<Vec<u8>, _> = frame.split(',').map(|b| b.trim().parse::<u8>()).collect();
    match bytes {
        Ok(bytes) => decode_bytes(bytes),
        Err(_) => frame.to_string(),
    }
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.as_bytes().escape_ascii().to_string(),
    }
}

/// Handle to a spawned feed listener. Dropping it aborts the task.
#[derive(Debug)]
pub struct MessageListener {
    task: JoinHandle<()>,
}

impl MessageListener {
    /// Spawns the listener on the current tokio runtime.
    pub fn spawn(url: Url, inbox: Arc<Inbox>) -> Self {
        let task = tokio::spawn(run_listener(url, inbox));
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_listener(url: Url, inbox: Arc<Inbox>) {
    // Only host and port are logged; the query carries the token.
    let feed = format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port().unwrap_or_default()
    );

    let (mut stream, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!(feed = %feed, error = %e, "Failed to connect to message feed");
            return;
        }
    };
    info!(feed = %feed, "Listening for inbound messages");

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(Message::Text(text)) => decode_frame(&text),
            Ok(Message::Binary(bytes)) => decode_bytes(bytes),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(feed = %feed, error = %e, "Message feed failed");
                return;
            }
        };
        debug!(feed = %feed, message = %message, "Received message");
        inbox.push(message).await;
    }

    info!(feed = %feed, "Message feed closed");
}
