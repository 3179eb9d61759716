use serde::Serialize;
use tabled::Tabled;

use meshdeck_core::format::{human_file_size, or_dash};
use meshdeck_core::history::HistoryEntry;
use meshdeck_core::network::Network;
use meshdeck_core::stats::DataInfo;

fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn address(network: &Network) -> String {
    match network.config.ipv4.as_deref() {
        _ if network.config.dhcp => "dhcp".to_string(),
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => "-".to_string(),
    }
}

/// Display row for `list`.
#[derive(Debug, Serialize, Tabled)]
pub struct NetworkRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "STATUS")]
    pub status: String,
    #[tabled(rename = "AUTH")]
    pub auth: String,
    #[tabled(rename = "IPV4")]
    pub ipv4: String,
    #[tabled(rename = "PEERS")]
    pub peers: usize,
}

impl NetworkRow {
    pub fn from_network(network: &Network) -> Self {
        Self {
            id: network.id().to_string(),
            name: network.name.clone().unwrap_or_else(|| "-".to_string()),
            status: network.status.to_string(),
            auth: network.other_config.auth_mode().to_string(),
            ipv4: address(network),
            peers: network
                .config
                .peer_urls
                .iter()
                .filter(|p| !p.is_empty())
                .count(),
        }
    }
}

/// Display row for `show`.
#[derive(Debug, Serialize, Tabled)]
pub struct NetworkInfo {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "AUTH")]
    pub auth: String,
    #[tabled(rename = "IPV4")]
    pub ipv4: String,
    #[tabled(rename = "HOSTNAME")]
    pub hostname: String,
    #[tabled(rename = "PEERS")]
    pub peers: String,
    #[tabled(rename = "LISTENERS")]
    pub listeners: String,
    #[tabled(rename = "PROXY CIDRS")]
    pub proxy_cidrs: String,
    #[tabled(rename = "VPN PORTAL")]
    pub vpn_portal: String,
}

impl NetworkInfo {
    pub fn from_network(network: &Network) -> Self {
        let cfg = &network.config;
        Self {
            id: network.id().to_string(),
            name: network.name.clone().unwrap_or_else(|| "-".to_string()),
            auth: network.other_config.auth_mode().to_string(),
            ipv4: address(network),
            hostname: dash_if_empty(cfg.device_name.as_deref().unwrap_or_default()),
            peers: dash_if_empty(&cfg.peer_urls.join("\n")),
            listeners: dash_if_empty(&cfg.listener_urls.join("\n")),
            proxy_cidrs: dash_if_empty(&cfg.proxy_cidrs.clone().unwrap_or_default().join("\n")),
            vpn_portal: match &cfg.vpn_portal_addr {
                Some(addr) => format!(
                    "{}/24 :{}",
                    addr,
                    cfg.vpn_portal_port
                        .unwrap_or(meshdeck_engine::render::DEFAULT_VPN_PORTAL_PORT)
                ),
                None => "-".to_string(),
            },
        }
    }
}

/// Display row for the per-peer metrics printed by `run`.
#[derive(Debug, Serialize, Tabled)]
pub struct MetricsRow {
    #[tabled(rename = "PEER")]
    pub name: String,
    #[tabled(rename = "IP")]
    pub ip: String,
    #[tabled(rename = "COST")]
    pub cost: String,
    #[tabled(rename = "LATENCY")]
    pub latency: String,
    #[tabled(rename = "TX")]
    pub tx: String,
    #[tabled(rename = "RX")]
    pub rx: String,
    #[tabled(rename = "LOSS")]
    pub loss: String,
}

impl MetricsRow {
    pub fn from_data(data: &DataInfo) -> Self {
        Self {
            name: dash_if_empty(&data.name),
            ip: dash_if_empty(&data.ip),
            cost: or_dash(data.cost),
            latency: or_dash(data.latency_ms.map(|ms| format!("{:.2} ms", ms))),
            tx: or_dash(data.tx_bytes.map(|b| human_file_size(b, true, 1))),
            rx: or_dash(data.rx_bytes.map(|b| human_file_size(b, true, 1))),
            loss: or_dash(data.loss_rate.map(|r| format!("{:.1}%", r * 100.0))),
        }
    }
}

/// Display row for the history summary printed when `run` exits.
#[derive(Debug, Serialize, Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "TIME")]
    pub time: String,
    #[tabled(rename = "PEERS")]
    pub peers: usize,
    #[tabled(rename = "TX")]
    pub tx: String,
    #[tabled(rename = "RX")]
    pub rx: String,
}

impl HistoryRow {
    /// Totals over the peers of one snapshot. Unknown when no peer
    /// reported the metric.
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        let total = |f: fn(&DataInfo) -> Option<u64>| {
            entry
                .data
                .iter()
                .filter_map(f)
                .reduce(u64::saturating_add)
                .map(|b| human_file_size(b, true, 1))
        };
        Self {
            time: entry.time.clone(),
            peers: entry.data.len(),
            tx: or_dash(total(|d| d.tx_bytes)),
            rx: or_dash(total(|d| d.rx_bytes)),
        }
    }
}

/// Display row for `autostart show`.
#[derive(Debug, Serialize, Tabled)]
pub struct AutostartRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "NAME")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_row() {
        let mut net = Network::generate();
        let row = NetworkRow::from_network(&net);
        assert_eq!(row.status, "off");
        assert_eq!(row.auth, "token");
        assert_eq!(row.ipv4, "dhcp");
        assert_eq!(row.peers, 1);

        net.config.dhcp = false;
        net.config.ipv4 = Some("10.0.0.2".to_string());
        net.other_config.token = false;
        let row = NetworkRow::from_network(&net);
        assert_eq!(row.ipv4, "10.0.0.2");
        assert_eq!(row.auth, "shared-secret");
    }

    #[test]
    fn test_network_info_vpn_portal() {
        let mut net = Network::generate();
        assert_eq!(NetworkInfo::from_network(&net).vpn_portal, "-");
        net.config.vpn_portal_addr = Some("10.14.14.0".to_string());
        assert_eq!(
            NetworkInfo::from_network(&net).vpn_portal,
            "10.14.14.0/24 :22022"
        );
    }

    #[test]
    fn test_metrics_row_unknown_is_dash() {
        let row = MetricsRow::from_data(&DataInfo {
            name: "gw".to_string(),
            ..Default::default()
        });
        assert_eq!(row.name, "gw");
        assert_eq!(row.ip, "-");
        assert_eq!(row.latency, "-");
        assert_eq!(row.tx, "-");
        assert_eq!(row.loss, "-");
    }

    #[test]
    fn test_metrics_row_formats_values() {
        let row = MetricsRow::from_data(&DataInfo {
            name: "gw".to_string(),
            ip: "10.0.0.1".to_string(),
            cost: Some(1),
            latency_ms: Some(2.0),
            tx_bytes: Some(1500),
            rx_bytes: Some(0),
            loss_rate: Some(0.25),
        });
        assert_eq!(row.cost, "1");
        assert_eq!(row.latency, "2.00 ms");
        assert_eq!(row.tx, "1.5 kB");
        assert_eq!(row.rx, "0 B");
        assert_eq!(row.loss, "25.0%");
    }

    #[test]
    fn test_history_row_totals() {
        let entry = HistoryEntry {
            time: "9:5:3".to_string(),
            data: vec![
                DataInfo {
                    tx_bytes: Some(100),
                    ..Default::default()
                },
                DataInfo {
                    tx_bytes: Some(250),
                    ..Default::default()
                },
            ],
        };
        let row = HistoryRow::from_entry(&entry);
        assert_eq!(row.peers, 2);
        assert_eq!(row.tx, "350 B");
        assert_eq!(row.rx, "-");
    }

    #[test]
    fn test_history_row_totals_saturate() {
        let big = DataInfo {
            rx_bytes: Some(u64::MAX),
            ..Default::default()
        };
        let entry = HistoryEntry {
            time: "0:0:0".to_string(),
            data: vec![big.clone(), big],
        };
        assert_eq!(
            HistoryRow::from_entry(&entry).rx,
            human_file_size(u64::MAX, true, 1)
        );
    }
}
