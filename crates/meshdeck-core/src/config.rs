use serde::{Deserialize, Serialize};

use crate::naming;

/// Public peer every new network connects to unless edited.
pub const DEFAULT_PEER_URL: &str = "tcp://easytier.public.kkrainbow.top:11010";

/// Listeners for a new network: TCP, UDP, and a WireGuard fallback.
pub const DEFAULT_LISTENER_URLS: [&str; 3] = [
    "tcp://0.0.0.0:11010",
    "udp://0.0.0.0:11010",
    "wg://0.0.0.0:11011",
];

/// Identity and connection parameters for one network instance.
///
/// Both credential sets (`token` and `network_name`/`network_secret`) are
/// kept here so the user can switch modes without losing input. Which one
/// is sent to the engine is decided by [`OtherConfig::token`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub id: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_secret: Option<String>,
    #[serde(default)]
    pub peer_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_cidrs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_portal_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_portal_port: Option<u16>,
    #[serde(default)]
    pub listener_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<u16>,
}

impl NetworkConfig {
    /// Default configuration for a new network: fresh id and token, DHCP,
    /// the public peer, and the three default listeners.
    pub fn generate() -> Self {
        Self {
            id: naming::generate_network_id(),
            dhcp: true,
            ipv4: None,
            device_name: None,
            token: Some(naming::generate_token()),
            network_name: None,
            network_secret: None,
            peer_urls: vec![DEFAULT_PEER_URL.to_string()],
            proxy_cidrs: None,
            vpn_portal_addr: None,
            vpn_portal_port: None,
            listener_urls: DEFAULT_LISTENER_URLS.iter().map(|s| s.to_string()).collect(),
            rpc_port: None,
        }
    }
}

/// Which credential set is active when the network is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Token,
    SharedSecret,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::SharedSecret => write!(f, "shared-secret"),
        }
    }
}

/// Per-network settings that are not part of the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherConfig {
    /// `true` sends the bare token, `false` sends name + secret.
    pub token: bool,
}

impl Default for OtherConfig {
    fn default() -> Self {
        Self { token: true }
    }
}

impl OtherConfig {
    pub fn auth_mode(&self) -> AuthMode {
        if self.token {
            AuthMode::Token
        } else {
            AuthMode::SharedSecret
        }
    }

    pub fn set_auth_mode(&mut self, mode: AuthMode) {
        self.token = mode == AuthMode::Token;
    }
}
