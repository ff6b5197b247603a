use crate::config::{ClusterConfig, DEFAULT_CONFIG_FILE};
use crate::node::HoprNode;
use crate::types::{HoprError, HoprResult, PeerId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Named collection of node handles.
#[derive(Debug, Default)]
pub struct HoprCluster {
    nodes: BTreeMap<String, HoprNode>,
}

impl HoprCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` (or [`DEFAULT_CONFIG_FILE`]) and builds every node in it.
    pub fn from_config_file(path: Option<&Path>) -> HoprResult<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config = ClusterConfig::load(path)?;
        let mut cluster = Self::new();
        cluster.populate_cluster_information(&config)?;
        Ok(cluster)
    }

    /// Creates one handle per configured node, each with its resolved token.
    /// Handles start listening immediately.
    ///
    /// The new handles replace the whole cluster, and only once every one of
    /// them was built. On error the cluster is left as it was.
    pub fn populate_cluster_information(&mut self, config: &ClusterConfig) -> HoprResult<()> {
        let mut nodes = BTreeMap::new();
        for (name, endpoint) in &config.nodes {
            let node = HoprNode::new(endpoint.clone())?;
            info!(
                node = %name,
                host = %endpoint.host,
                api_port = endpoint.api_port,
                "Added node to cluster"
            );
            nodes.insert(name.clone(), node);
        }
        self.nodes = nodes;
        Ok(())
    }

    pub fn is_populated(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node(&self, name: &str) -> Option<&HoprNode> {
        self.nodes.get(name)
    }

    /// Adds or replaces a handle under `name`, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, node: HoprNode) -> Option<HoprNode> {
        self.nodes.insert(name.into(), node)
    }

    fn pair(&self, source: &str, dest: &str) -> HoprResult<(&HoprNode, &HoprNode)> {
        match (self.nodes.get(source), self.nodes.get(dest)) {
            (Some(source), Some(dest)) => Ok((source, dest)),
            _ => Err(HoprError::Config(
                "Incomplete node information! Please check config and try again!".to_string(),
            )),
        }
    }

    /// Peer id under which `source` knows `target`.
    pub async fn resolve_peer(&self, source: &str, target: &str) -> HoprResult<PeerId> {
        let (source, target) = self.pair(source, target)?;
        source.resolve_peer(target).await
    }

    /// Sends `message` from the node named `source` to the node named `dest`.
    pub async fn send(
        &self,
        source: &str,
        dest: &str,
        message: &str,
        path: Option<&[PeerId]>,
    ) -> HoprResult<String> {
        let (source_node, dest_node) = self.pair(source, dest)?;
        let accepted = source_node.send(message, dest_node, path).await?;
        info!(source, dest, "Message sent successfully! Got {}", accepted);
        Ok(accepted)
    }
}
