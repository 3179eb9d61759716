//! Telemetry snapshots reported by the networking engine.
//!
//! Payloads arrive loosely typed, so every field tolerates absence and
//! falls back to its default on deserialisation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StunInfo {
    pub udp_nat_type: i32,
    pub tcp_nat_type: i32,
    pub last_update_time: i64,
}

/// Identity and addresses of the local node inside one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub virtual_ipv4: String,
    pub listeners: Vec<String>,
    pub stun_info: Option<StunInfo>,
    pub vpn_portal_cfg: Option<String>,
}

/// Path-cost record to a destination peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub peer_id: u32,
    pub ipv4_addr: String,
    pub next_hop_peer_id: u32,
    pub cost: i32,
    pub proxy_cidrs: Vec<String>,
    pub hostname: String,
    pub stun_info: Option<StunInfo>,
    pub inst_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelInfo {
    pub tunnel_type: String,
    pub local_addr: String,
    pub remote_addr: String,
}

/// Counters for one connection. Any counter may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConnStats {
    pub rx_bytes: Option<u64>,
    pub tx_bytes: Option<u64>,
    pub rx_packets: Option<u64>,
    pub tx_packets: Option<u64>,
    pub latency_us: Option<u64>,
}

/// One live connection to a peer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConnInfo {
    pub conn_id: String,
    pub my_peer_id: u32,
    pub peer_id: u32,
    pub features: Vec<String>,
    pub tunnel: Option<TunnelInfo>,
    pub stats: Option<PeerConnStats>,
    pub loss_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerInfo {
    pub peer_id: u32,
    pub conns: Vec<PeerConnInfo>,
}

/// A route together with the peer currently serving it, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerRoutePair {
    pub route: Route,
    pub peer: Option<PeerInfo>,
}

impl PeerRoutePair {
    /// Pair every route with the peer whose id matches `route.peer_id`,
    /// preserving route order.
    pub fn pair(routes: &[Route], peers: &[PeerInfo]) -> Vec<PeerRoutePair> {
        routes
            .iter()
            .map(|route| PeerRoutePair {
                route: route.clone(),
                peer: peers.iter().find(|p| p.peer_id == route.peer_id).cloned(),
            })
            .collect()
    }
}

/// One poll's snapshot of a running instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInstanceInfo {
    pub id: String,
    pub node: NodeInfo,
    pub routes: Vec<Route>,
    pub peers: Vec<PeerInfo>,
    pub peer_route_pairs: Vec<PeerRoutePair>,
    pub running: bool,
    pub error: Option<String>,
}

impl NetworkInstanceInfo {
    /// Engine ids are correlated with network ids case-insensitively.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(peer_id: u32, hostname: &str) -> Route {
        Route {
            peer_id,
            hostname: hostname.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pair_matches_by_peer_id() {
        let routes = vec![route(1, "alpha"), route(2, "beta")];
        let peers = vec![PeerInfo {
            peer_id: 2,
            conns: vec![PeerConnInfo::default()],
        }];
        let pairs = PeerRoutePair::pair(&routes, &peers);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].route.hostname, "alpha");
        assert!(pairs[0].peer.is_none());
        assert_eq!(pairs[1].peer.as_ref().unwrap().peer_id, 2);
    }

    #[test]
    fn test_matches_id_ignores_case() {
        let info = NetworkInstanceInfo {
            id: "5f0b2d52-5a4c-4a43-9d7b-0b8f4f3f4a11".to_string(),
            ..Default::default()
        };
        assert!(info.matches_id("5F0B2D52-5A4C-4A43-9D7B-0B8F4F3F4A11"));
        assert!(!info.matches_id("5f0b2d52"));
    }

    #[test]
    fn test_partial_payload_deserializes() {
        let json = r#"{
            "id": "abc",
            "running": true,
            "peer_route_pairs": [
                { "route": { "peer_id": 7, "hostname": "gw", "cost": 2 } },
                { "route": { "peer_id": 8 },
                  "peer": { "peer_id": 8, "conns": [ { "conn_id": "c1" }, { "stats": { "tx_bytes": 10 } } ] } }
            ]
        }"#;
        let info: NetworkInstanceInfo = serde_json::from_str(json).unwrap();
        assert!(info.running);
        assert_eq!(info.peer_route_pairs.len(), 2);
        assert_eq!(info.peer_route_pairs[0].route.cost, 2);
        let conns = &info.peer_route_pairs[1].peer.as_ref().unwrap().conns;
        assert!(conns[0].stats.is_none());
        assert_eq!(conns[1].stats.as_ref().unwrap().tx_bytes, Some(10));
        assert_eq!(conns[1].stats.as_ref().unwrap().latency_us, None);
    }
}
