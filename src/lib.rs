pub mod cluster;
pub mod config;
pub mod listener;
pub mod network;
pub mod node;
pub mod peers;
pub mod types;

// Re-export only what's needed by external users
pub use cluster::HoprCluster;
pub use config::{ClusterConfig, NodeEndpoint};
pub use node::{HoprNode, SendRequest};
pub use peers::{PeerDirectory, PeerRecord};
pub use types::{HoprError, HoprResult, PeerId, PeerKind};
