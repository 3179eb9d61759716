//! Validate an [`EngineConfig`] and render the engine's TOML form.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

use meshdeck_core::error::ConfigError;
use meshdeck_core::naming;

use crate::wire::{EngineAuth, EngineConfig};

/// WireGuard port used by the VPN portal when none is configured.
pub const DEFAULT_VPN_PORTAL_PORT: u16 = 22022;

#[derive(Debug, Serialize)]
struct RenderedConfig {
    instance_name: String,
    instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    dhcp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipv4: Option<String>,
    listeners: Vec<String>,
    rpc_portal: String,
    network_identity: NetworkIdentity,
    peer: Vec<PeerEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    proxy_network: Vec<ProxyNetwork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vpn_portal_config: Option<VpnPortal>,
}

#[derive(Debug, Serialize)]
struct NetworkIdentity {
    network_name: String,
    network_secret: String,
}

#[derive(Debug, Serialize)]
struct PeerEntry {
    uri: String,
}

#[derive(Debug, Serialize)]
struct ProxyNetwork {
    cidr: String,
}

#[derive(Debug, Serialize)]
struct VpnPortal {
    client_cidr: String,
    wireguard_listen: String,
}

/// Network name and secret derived from a bare token: the SHA-256 hex
/// digest split after 8 characters.
pub fn identity_from_token(token: &str) -> (String, String) {
    let digest = format!("{:x}", Sha256::digest(token.as_bytes()));
    let (name, secret) = digest.split_at(8);
    (name.to_string(), secret.to_string())
}

/// Parse a peer or listener url. The port is optional; the engine picks
/// the protocol default when it is missing.
fn check_url(kind: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        kind,
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Non-empty entries of a url list, each checked.
fn collect_urls(kind: &'static str, urls: &[String]) -> Result<Vec<String>, ConfigError> {
    urls.iter()
        .filter(|u| !u.is_empty())
        .map(|u| check_url(kind, u).map(|_| u.clone()))
        .collect()
}

fn check_cidr(value: &str) -> Result<Ipv4Net, ConfigError> {
    value
        .parse::<Ipv4Net>()
        .map_err(|_| ConfigError::InvalidProxyCidr(value.to_string()))
}

/// Validate a wire config and render it as the engine's TOML document.
pub fn render_engine_config(cfg: &EngineConfig) -> Result<String, ConfigError> {
    let instance_id = naming::validate_network_id(&cfg.id)?;

    let (network_name, network_secret) = match &cfg.auth {
        EngineAuth::Token { token } if token.is_empty() => {
            return Err(ConfigError::MissingCredential("token"));
        }
        EngineAuth::Token { token } => identity_from_token(token),
        EngineAuth::SharedSecret { network_name, .. } if network_name.is_empty() => {
            return Err(ConfigError::MissingCredential("network name"));
        }
        EngineAuth::SharedSecret {
            network_name,
            network_secret,
        } => (network_name.clone(), network_secret.clone()),
    };

    let ipv4 = match cfg.ipv4.as_deref() {
        Some(addr) if !cfg.dhcp && !addr.is_empty() => {
            addr.parse::<Ipv4Addr>()
                .map_err(|_| ConfigError::InvalidIpv4(addr.to_string()))?;
            Some(addr.to_string())
        }
        _ => None,
    };

    let peers = collect_urls("peer", &cfg.peer_urls)?;
    if peers.is_empty() {
        return Err(ConfigError::NoPeers);
    }
    let listeners = collect_urls("listener", &cfg.listener_urls)?;

    let mut proxy_network = Vec::new();
    for cidr in cfg.proxy_cidrs.iter().flatten() {
        check_cidr(cidr)?;
        proxy_network.push(ProxyNetwork { cidr: cidr.clone() });
    }

    let vpn_portal_config = match cfg.vpn_portal_addr.as_deref() {
        Some(addr) => {
            let cidr = format!("{}/24", addr);
            let client = cidr
                .parse::<Ipv4Net>()
                .map_err(|_| ConfigError::InvalidVpnPortal(cidr.clone()))?;
            Some(VpnPortal {
                client_cidr: client.to_string(),
                wireguard_listen: format!(
                    "0.0.0.0:{}",
                    cfg.vpn_portal_port.unwrap_or(DEFAULT_VPN_PORTAL_PORT)
                ),
            })
        }
        None => None,
    };

    let rendered = RenderedConfig {
        instance_name: network_name.clone(),
        instance_id: instance_id.to_string(),
        hostname: cfg.device_name.clone().filter(|d| !d.is_empty()),
        dhcp: cfg.dhcp,
        ipv4,
        listeners,
        rpc_portal: format!("127.0.0.1:{}", cfg.rpc_port.unwrap_or_default()),
        network_identity: NetworkIdentity {
            network_name,
            network_secret,
        },
        peer: peers.into_iter().map(|uri| PeerEntry { uri }).collect(),
        proxy_network,
        vpn_portal_config,
    };

    toml::to_string(&rendered).map_err(|e| ConfigError::Render(e.to_string()))
}
