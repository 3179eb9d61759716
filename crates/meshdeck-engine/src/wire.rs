use serde::{Deserialize, Serialize};

use meshdeck_core::config::AuthMode;
use meshdeck_core::error::ConfigError;
use meshdeck_core::network::Network;

/// Credentials sent to the engine. Exactly one mode is ever present, and
/// its keys are flattened into the surrounding config object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineAuth {
    #[serde(rename_all = "camelCase")]
    SharedSecret {
        network_name: String,
        network_secret: String,
    },
    Token { token: String },
}

impl EngineAuth {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Token { .. } => AuthMode::Token,
            Self::SharedSecret { .. } => AuthMode::SharedSecret,
        }
    }
}

/// Configuration as sent across the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub id: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(flatten)]
    pub auth: EngineAuth,
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

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl EngineConfig {
    /// Build the wire config from a stored network, keeping only the
    /// credentials of the selected authentication mode.
    ///
    /// Works on a copy; the stored network is never touched.
    pub fn from_network(network: &Network) -> Result<Self, ConfigError> {
        let cfg = network.config.clone();
        let auth = match network.other_config.auth_mode() {
            AuthMode::Token => EngineAuth::Token {
                token: non_empty(cfg.token).ok_or(ConfigError::MissingCredential("token"))?,
            },
            AuthMode::SharedSecret => EngineAuth::SharedSecret {
                network_name: non_empty(cfg.network_name)
                    .ok_or(ConfigError::MissingCredential("network name"))?,
                network_secret: cfg.network_secret.unwrap_or_default(),
            },
        };

        Ok(Self {
            id: cfg.id,
            dhcp: cfg.dhcp,
            ipv4: cfg.ipv4,
            device_name: cfg.device_name,
            auth,
            peer_urls: cfg.peer_urls,
            proxy_cidrs: cfg.proxy_cidrs,
            vpn_portal_addr: cfg.vpn_portal_addr,
            vpn_portal_port: cfg.vpn_portal_port,
            listener_urls: cfg.listener_urls,
            rpc_port: cfg.rpc_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_with_both_credentials(token_mode: bool) -> Network {
        let mut net = Network::generate();
        net.config.token = Some("a1b2c3".to_string());
        net.config.network_name = Some("office".to_string());
        net.config.network_secret = Some("hunter2".to_string());
        net.other_config.token = token_mode;
        net
    }

    #[test]
    fn test_token_mode_strips_name_and_secret() {
        let net = network_with_both_credentials(true);
        let cfg = EngineConfig::from_network(&net).unwrap();
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["token"], "a1b2c3");
        assert!(value.get("networkName").is_none());
        assert!(value.get("networkSecret").is_none());
        assert_eq!(cfg.auth.mode(), AuthMode::Token);
    }

    #[test]
    fn test_secret_mode_strips_token() {
        let net = network_with_both_credentials(false);
        let cfg = EngineConfig::from_network(&net).unwrap();
        let value = serde_json::to_value(&cfg).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["networkName"], "office");
        assert_eq!(value["networkSecret"], "hunter2");
        assert_eq!(cfg.auth.mode(), AuthMode::SharedSecret);
    }

    #[test]
    fn test_source_network_is_untouched() {
        let net = network_with_both_credentials(true);
        let before = net.clone();
        let _ = EngineConfig::from_network(&net).unwrap();
        assert_eq!(net, before);
        assert_eq!(net.config.network_secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let mut net = Network::generate();
        net.config.token = Some(String::new());
        let err = EngineConfig::from_network(&net).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("token"));
    }

    #[test]
    fn test_missing_network_name_is_an_error() {
        let mut net = Network::generate();
        net.other_config.token = false;
        let err = EngineConfig::from_network(&net).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("network name"));
    }

    #[test]
    fn test_missing_secret_defaults_to_empty() {
        let mut net = Network::generate();
        net.other_config.token = false;
        net.config.network_name = Some("office".to_string());
        let cfg = EngineConfig::from_network(&net).unwrap();
        assert_eq!(
            cfg.auth,
            EngineAuth::SharedSecret {
                network_name: "office".to_string(),
                network_secret: String::new(),
            }
        );
    }

    #[test]
    fn test_wire_json_roundtrip_keeps_mode() {
        let net = network_with_both_credentials(false);
        let cfg = EngineConfig::from_network(&net).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cfg);
    }
}
