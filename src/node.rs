use crate::config::NodeEndpoint;
use crate::listener::{Inbox, MessageListener};
use crate::network::ApiClient;
use crate::peers::PeerDirectory;
use crate::types::{HoprError, HoprResult, MessageBody, PeerId, RawResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A fully constructed `POST /messages/` request.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub url: String,
    pub api_token: String,
    pub body: MessageBody,
}

impl SendRequest {
    /// The body as loose JSON, for callers that want to tamper with fields
    /// before posting it with [`HoprNode::post_raw`].
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.body).unwrap_or_default()
    }
}

/// Handle to one HOPR node's management API.
///
/// Peer information is fetched on first use and cached until
/// [`HoprNode::invalidate_caches`] is called. Inbound messages are collected by
/// a listener task that starts in the constructor and is aborted on drop.
pub struct HoprNode {
    endpoint: NodeEndpoint,
    api: ApiClient,
    quality: Option<f64>,

    /// Addresses the node announces to the network
    announced_address: RwLock<Option<Vec<String>>>,

    /// Peers this node knows about
    peers: RwLock<Option<PeerDirectory>>,

    inbox: Arc<Inbox>,
    listener: Option<MessageListener>,
}

impl std::fmt::Debug for HoprNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoprNode")
            .field("host", &self.endpoint.host)
            .field("api_port", &self.endpoint.api_port)
            .field("quality", &self.quality)
            .finish()
    }
}

impl HoprNode {
    /// Creates the handle and starts listening. Must be called from within a
    /// tokio runtime.
    pub fn new(endpoint: NodeEndpoint) -> HoprResult<Self> {
        let api = ApiClient::new(&endpoint)?;
        let mut node = HoprNode {
            endpoint,
            api,
            quality: None,
            announced_address: RwLock::new(None),
            peers: RwLock::new(None),
            inbox: Arc::new(Inbox::new()),
            listener: None,
        };
        node.start_listening()?;
        Ok(node)
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.set_quality(Some(quality));
        self
    }

    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    /// Sets the peer quality filter. The cached directory is dropped so the
    /// next lookup uses the new filter.
    pub fn set_quality(&mut self, quality: Option<f64>) {
        self.quality = quality;
        *self.peers.get_mut() = None;
    }

    /// Spawns the feed listener, replacing (and aborting) any previous one.
    pub fn start_listening(&mut self) -> HoprResult<()> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| HoprError::Listener(e.to_string()))?;
        let url = self.endpoint.websocket_url()?;
        self.listener = Some(MessageListener::spawn(url, Arc::clone(&self.inbox)));
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    pub async fn announced_address(&self) -> HoprResult<Vec<String>> {
        if let Some(cached) = self.announced_address.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let info = self.api.node_info().await?;
        debug!(
            api_port = self.endpoint.api_port,
            addresses = ?info.announced_address,
            "Fetched announced address"
        );
        *self.announced_address.write().await = Some(info.announced_address.clone());
        Ok(info.announced_address)
    }

    /// Pre-populates the announced address cache without asking the daemon.
    pub async fn seed_announced_address(&self, addresses: Vec<String>) {
        *self.announced_address.write().await = Some(addresses);
    }

    pub async fn peer_directory(&self) -> HoprResult<PeerDirectory> {
        if let Some(cached) = self.peers.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let listing = self.api.peers(self.quality).await?;
        let directory = PeerDirectory::from_listing(listing);
        debug!(
            api_port = self.endpoint.api_port,
            peers = directory.len(),
            "Fetched peer directory"
        );
        *self.peers.write().await = Some(directory.clone());
        Ok(directory)
    }

    /// Forgets the cached announced address and peer directory.
    pub async fn invalidate_caches(&self) {
        *self.announced_address.write().await = None;
        *self.peers.write().await = None;
    }

    /// Finds the peer id under which this node knows `other`.
    pub async fn resolve_peer(&self, other: &HoprNode) -> HoprResult<PeerId> {
        let directory = self.peer_directory().await?;
        let announced = other.announced_address().await?;

        match directory.find_by_address(&announced) {
            Some(peer_id) => Ok(peer_id.clone()),
            None => Err(HoprError::Resolution { announced }),
        }
    }

    /// Builds the request for sending `message` to `other`. A non-empty `path`
    /// forces the relay hops; otherwise the daemon picks one intermediate hop.
    pub async fn build_send_request(
        &self,
        message: &str,
        other: &HoprNode,
        path: Option<&[PeerId]>,
    ) -> HoprResult<SendRequest> {
        let recipient = self.resolve_peer(other).await?;

        let mut body = MessageBody {
            body: message.to_string(),
            recipient,
            hops: 1,
            path: None,
        };
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            body.hops = path.len();
            body.path = Some(path.to_vec());
        }

        Ok(SendRequest {
            url: self.api.messages_url(),
            api_token: self.api.api_token().to_string(),
            body,
        })
    }

    /// Sends `message` to `other`. Succeeds only when the daemon accepts it.
    pub async fn send(
        &self,
        message: &str,
        other: &HoprNode,
        path: Option<&[PeerId]>,
    ) -> HoprResult<String> {
        let request = self.build_send_request(message, other, path).await?;
        let accepted = self.api.send_message(&request.body).await?;
        info!(
            from = self.endpoint.api_port,
            to = %request.body.recipient,
            hops = request.body.hops,
            "Message sent"
        );
        Ok(accepted)
    }

    /// Posts an arbitrary body to the messages endpoint without interpreting
    /// the response.
    pub async fn post_raw(
        &self,
        api_token: &str,
        body: &serde_json::Value,
    ) -> HoprResult<RawResponse> {
        self.api
            .post_json(&self.api.messages_url(), api_token, body)
            .await
    }

    pub fn inbox(&self) -> &Arc<Inbox> {
        &self.inbox
    }

    pub async fn received_messages(&self) -> Vec<String> {
        self.inbox.snapshot().await
    }

    pub async fn last_message(&self) -> Option<String> {
        self.inbox.last().await
    }

    pub async fn wait_for_message(&self, needle: &str, timeout: Duration) -> Option<String> {
        self.inbox.wait_for(needle, timeout).await
    }
}
