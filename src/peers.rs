use crate::types::{PeerId, PeerKind, PeersListing};
use std::collections::BTreeMap;

/// Where a peer can be reached and how the daemon learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub address: String,
    pub kind: PeerKind,
}

/// Peers known to one node, keyed by peer id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDirectory {
    peers: BTreeMap<PeerId, PeerRecord>,
}

impl PeerDirectory {
    /// Merges a `/node/peers` listing. Connected entries are inserted first and
    /// an announced entry never replaces a peer that is already present.
    pub fn from_listing(listing: PeersListing) -> Self {
        let mut peers = BTreeMap::new();

        for entry in listing.connected {
            peers.insert(
                entry.peer_id,
                PeerRecord {
                    address: entry.multi_addr,
                    kind: PeerKind::Connected,
                },
            );
        }

        for entry in listing.announced {
            peers.entry(entry.peer_id).or_insert(PeerRecord {
                address: entry.multi_addr,
                kind: PeerKind::Announced,
            });
        }

        Self { peers }
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&PeerRecord> {
        self.peers.get(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeerId, &PeerRecord)> {
        self.peers.iter()
    }

    /// Returns the first peer whose address is one of `addresses`.
    pub fn find_by_address(&self, addresses: &[String]) -> Option<&PeerId> {
        self.peers
            .iter()
            .find(|(_, record)| addresses.iter().any(|a| *a == record.address))
            .map(|(peer_id, _)| peer_id)
    }
}
