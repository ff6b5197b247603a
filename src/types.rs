use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier the daemon uses for a peer (libp2p peer id string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        PeerId(value.to_string())
    }
}

/// How a peer came to be listed by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerKind {
    Connected,
    Announced,
}

/// Response body of `GET /node/info`. Only the announced addresses are used.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "announcedAddress", default)]
    pub announced_address: Vec<String>,
}

/// One element of the `connected` or `announced` lists in `GET /node/peers`.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerEntry {
    #[serde(rename = "peerId")]
    pub peer_id: PeerId,
    #[serde(rename = "multiAddr")]
    pub multi_addr: String,
}

/// Response body of `GET /node/peers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeersListing {
    #[serde(default)]
    pub connected: Vec<PeerEntry>,
    #[serde(default)]
    pub announced: Vec<PeerEntry>,
}

/// JSON body of `POST /messages/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBody {
    pub body: String,
    pub recipient: PeerId,
    pub hops: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PeerId>>,
}

/// Status and text of a daemon response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum HoprError {
    #[error("cluster configuration error: {0}")]
    Config(String),

    #[error("Something went wrong getting {operation}! Got status code {status} and {body}")]
    Protocol {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error(
        "There is no matching peer announced or connected matching this node address! {announced:?}"
    )]
    Resolution { announced: Vec<String> },

    #[error("Unable to send message! Got {status} with error {body}")]
    Send { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message listener error: {0}")]
    Listener(String),
}

pub type HoprResult<T> = Result<T, HoprError>;
