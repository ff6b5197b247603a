//! Declarative cluster description loaded from YAML.
//!
//! ```yaml
//! api_token: "%th1s-IS-a-S3CR3T-ap1-PUSHING-b1ts-TO-you%"
//! nodes_list:
//!   node1:
//!     api_port: 13301
//!   node2:
//!     api_port: 13302
//!     host: 10.0.0.2
//!     api_token: other-token
//! ```

use crate::types::{HoprError, HoprResult};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Token used by nodes when neither the cluster nor the node overrides it.
pub const DEFAULT_API_TOKEN: &str = "%th1s-IS-a-S3CR3T-ap1-PUSHING-b1ts-TO-you%";

pub const DEFAULT_API_HOST: &str = "127.0.0.1";

pub const DEFAULT_CONFIG_FILE: &str = "hopr_cluster_config.yaml";

/// Connection details of one daemon's management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    pub host: String,
    pub api_port: u16,
    pub api_token: String,
}

impl NodeEndpoint {
    pub fn new(host: impl Into<String>, api_port: u16, api_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_port,
            api_token: api_token.into(),
        }
    }

    /// Endpoint on the default host using the default token.
    pub fn local(api_port: u16) -> Self {
        Self::new(DEFAULT_API_HOST, api_port, DEFAULT_API_TOKEN)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api/v2", self.host, self.api_port)
    }

    /// Checks that both the API and feed URLs can be formed from this endpoint.
    pub fn validate(&self) -> HoprResult<()> {
        let base = self.base_url();
        Url::parse(&base)
            .map_err(|e| HoprError::Config(format!("invalid api url {}: {}", base, e)))?;
        self.websocket_url()?;
        Ok(())
    }

    /// URL of the inbound message feed, with the token percent-encoded.
    pub fn websocket_url(&self) -> HoprResult<Url> {
        let raw = format!(
            "ws://{}:{}/api/v2/messages/websocket/",
            self.host, self.api_port
        );
        Url::parse_with_params(&raw, &[("apiToken", self.api_token.as_str())])
            .map_err(|e| HoprError::Config(format!("invalid websocket url {}: {}", raw, e)))
    }
}

#[derive(Debug, Deserialize)]
struct RawClusterConfig {
    api_token: Option<String>,
    nodes_list: Option<BTreeMap<String, RawNodeEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawNodeEntry {
    api_port: Option<u16>,
    host: Option<String>,
    api_token: Option<String>,
}

/// Validated cluster description: every node has a port and a resolved token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub api_token: String,
    pub nodes: BTreeMap<String, NodeEndpoint>,
}

impl ClusterConfig {
    pub fn load(path: impl AsRef<Path>) -> HoprResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoprError::Config(format!("Unable to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parses and validates a YAML document. `source` names the document in
    /// error messages.
    pub fn from_yaml_str(content: &str, source: &str) -> HoprResult<Self> {
        let missing_nodes = || {
            HoprError::Config(format!(
                "Missing node list information for cluster! Check {}",
                source
            ))
        };

        if content.trim().is_empty() {
            return Err(missing_nodes());
        }

        let raw: RawClusterConfig = serde_yaml::from_str(content)
            .map_err(|e| HoprError::Config(format!("Unable to parse {}: {}", source, e)))?;

        let api_token = raw
            .api_token
            .unwrap_or_else(|| DEFAULT_API_TOKEN.to_string());
        let nodes_list = raw.nodes_list.ok_or_else(missing_nodes)?;

        let mut nodes = BTreeMap::new();
        for (name, entry) in nodes_list {
            let api_port = entry.api_port.ok_or_else(|| {
                HoprError::Config(format!(
                    "Missing api port for node {} in {}",
                    name, source
                ))
            })?;
            let endpoint = NodeEndpoint::new(
                entry.host.unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
                api_port,
                entry.api_token.unwrap_or_else(|| api_token.clone()),
            );
            endpoint.validate().map_err(|e| match e {
                HoprError::Config(reason) => HoprError::Config(format!(
                    "Invalid address for node {} in {}: {}",
                    name, source, reason
                )),
                other => other,
            })?;
            nodes.insert(name, endpoint);
        }

        Ok(Self { api_token, nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cluster_with_token_override() {
        let yaml = r#"
api_token: cluster-token
nodes_list:
  node1:
    api_port: 13301
  node2:
    api_port: 13302
    host: 10.0.0.2
    api_token: node2-token
"#;
        let config = ClusterConfig::from_yaml_str(yaml, "test.yaml").unwrap();

        assert_eq!(config.api_token, "cluster-token");
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(
            config.nodes["node1"],
            NodeEndpoint::new(DEFAULT_API_HOST, 13301, "cluster-token")
        );
        assert_eq!(
            config.nodes["node2"],
            NodeEndpoint::new("10.0.0.2", 13302, "node2-token")
        );
    }

    #[test]
    fn test_default_token_when_absent() {
        let yaml = "nodes_list:\n  node1:\n    api_port: 13301\n";
        let config = ClusterConfig::from_yaml_str(yaml, "test.yaml").unwrap();
        assert_eq!(config.api_token, DEFAULT_API_TOKEN);
        assert_eq!(config.nodes["node1"].api_token, DEFAULT_API_TOKEN);
    }

    #[test]
    fn test_missing_nodes_list() {
        let err = ClusterConfig::from_yaml_str("api_token: abc\n", "cluster.yaml").unwrap_err();
        assert!(matches!(err, HoprError::Config(_)));
        assert!(err
            .to_string()
            .contains("Missing node list information for cluster! Check cluster.yaml"));
    }

    #[test]
    fn test_empty_document() {
        let err = ClusterConfig::from_yaml_str("  \n", "cluster.yaml").unwrap_err();
        assert!(matches!(err, HoprError::Config(_)));
    }

    #[test]
    fn test_missing_api_port() {
        let yaml = "nodes_list:\n  node1:\n    api_port: 13301\n  node2:\n    host: 10.0.0.2\n";
        let err = ClusterConfig::from_yaml_str(yaml, "cluster.yaml").unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing api port for node node2 in cluster.yaml"));
    }

    #[test]
    fn test_unusable_host() {
        let yaml = "nodes_list:\n  a:\n    api_port: 1\n  b:\n    api_port: 2\n    host: \"bad host\"\n";
        let err = ClusterConfig::from_yaml_str(yaml, "cluster.yaml").unwrap_err();
        assert!(matches!(err, HoprError::Config(_)));
        assert!(err.to_string().contains("Invalid address for node b in cluster.yaml"));
    }

    #[test]
    fn test_malformed_port() {
        let yaml = "nodes_list:\n  node1:\n    api_port: not-a-port\n";
        let err = ClusterConfig::from_yaml_str(yaml, "cluster.yaml").unwrap_err();
        assert!(matches!(err, HoprError::Config(_)));
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoint = NodeEndpoint::local(13301);
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:13301/api/v2");

        let ws = endpoint.websocket_url().unwrap();
        assert_eq!(ws.scheme(), "ws");
        assert_eq!(ws.path(), "/api/v2/messages/websocket/");
        let (key, value) = ws.query_pairs().next().unwrap();
        assert_eq!(key, "apiToken");
        assert_eq!(value, DEFAULT_API_TOKEN);
    }
}
