//! Reduce per-connection telemetry into flat per-route metrics.
//!
//! Each metric has its own accessor. A missing `peer` makes the metric
//! unknown (`None`); a connection missing the field (or its `stats`)
//! contributes nothing to the sum. Counter sums saturate at `u64::MAX`.

use serde::{Deserialize, Serialize};

use crate::telemetry::{PeerConnInfo, PeerRoutePair};

/// Flattened metrics for one route/peer pair. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataInfo {
    pub name: String,
    pub ip: String,
    pub cost: Option<i32>,
    /// Average latency across the peer's connections, in milliseconds.
    pub latency_ms: Option<f64>,
    pub tx_bytes: Option<u64>,
    pub rx_bytes: Option<u64>,
    pub loss_rate: Option<f64>,
}

fn fold_conns<T, F, A>(pair: &PeerRoutePair, field: F, add: A) -> Option<T>
where
    T: Default,
    F: Fn(&PeerConnInfo) -> Option<T>,
    A: Fn(T, T) -> T,
{
    let peer = pair.peer.as_ref()?;
    Some(peer.conns.iter().filter_map(field).fold(T::default(), add))
}

fn counter_sum<F>(pair: &PeerRoutePair, field: F) -> Option<u64>
where
    F: Fn(&PeerConnInfo) -> Option<u64>,
{
    fold_conns(pair, field, u64::saturating_add)
}

/// Sum of `stats.latency_us` across the pair's connections.
pub fn latency_us_sum(pair: &PeerRoutePair) -> Option<u64> {
    counter_sum(pair, |c| c.stats.as_ref()?.latency_us)
}

/// Sum of `stats.tx_bytes` across the pair's connections.
pub fn tx_bytes_sum(pair: &PeerRoutePair) -> Option<u64> {
    counter_sum(pair, |c| c.stats.as_ref()?.tx_bytes)
}

/// Sum of `stats.rx_bytes` across the pair's connections.
pub fn rx_bytes_sum(pair: &PeerRoutePair) -> Option<u64> {
    counter_sum(pair, |c| c.stats.as_ref()?.rx_bytes)
}

/// Sum of `loss_rate` across the pair's connections.
pub fn loss_rate_sum(pair: &PeerRoutePair) -> Option<f64> {
    fold_conns(pair, |c| c.loss_rate, |a, b| a + b)
}

/// Average latency in milliseconds.
///
/// A zero or unknown latency sum yields `None` so "no data" never reads
/// as "zero latency".
pub fn average_latency_ms(pair: &PeerRoutePair) -> Option<f64> {
    let sum = latency_us_sum(pair).filter(|s| *s != 0)?;
    let conns = pair
        .peer
        .as_ref()
        .map(|p| p.conns.len())
        .filter(|n| *n != 0)
        .unwrap_or(1);
    Some(sum as f64 / 1000.0 / conns as f64)
}

pub fn reduce_pair(pair: &PeerRoutePair) -> DataInfo {
    DataInfo {
        name: pair.route.hostname.clone(),
        ip: pair.route.ipv4_addr.clone(),
        cost: Some(pair.route.cost),
        latency_ms: average_latency_ms(pair),
        tx_bytes: tx_bytes_sum(pair),
        rx_bytes: rx_bytes_sum(pair),
        loss_rate: loss_rate_sum(pair),
    }
}

pub fn reduce_pairs(pairs: &[PeerRoutePair]) -> Vec<DataInfo> {
    pairs.iter().map(reduce_pair).collect()
}
