use serde::{Deserialize, Serialize};

use crate::config::{NetworkConfig, OtherConfig};
use crate::naming;

/// Network lifecycle status.
///
/// Runtime-only: derived from telemetry polls and never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    #[default]
    Off,
    Starting,
    Running,
    Stopped,
    Error,
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A configured, possibly-not-running network instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub config: NetworkConfig,
    #[serde(skip)]
    pub status: NetworkStatus,
    #[serde(default)]
    pub other_config: OtherConfig,
}

impl Network {
    /// A new network with a generated name, default config, `Off` status,
    /// and token-mode authentication.
    pub fn generate() -> Self {
        Self {
            name: Some(naming::generate_display_name()),
            config: NetworkConfig::generate(),
            status: NetworkStatus::Off,
            other_config: OtherConfig::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.config.id)
    }

    /// Case-insensitive match against the display name or id.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        if filter.is_empty() {
            return true;
        }
        self.config.id.to_lowercase().contains(&filter)
            || self
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_network() {
        let net = Network::generate();
        assert_eq!(net.status, NetworkStatus::Off);
        assert!(net.other_config.token);
        assert!(net.name.as_deref().unwrap().starts_with("mesh-"));
        assert_eq!(net.id(), net.config.id);
    }

    #[test]
    fn test_status_is_not_persisted() {
        let mut net = Network::generate();
        net.status = NetworkStatus::Running;
        let json = serde_json::to_string(&net).unwrap();
        assert!(!json.contains("status"));
        let parsed: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, NetworkStatus::Off);
        assert_eq!(parsed.config, net.config);
    }

    #[test]
    fn test_missing_other_config_defaults_to_token() {
        let json = r#"{ "config": { "id": "abc" } }"#;
        let parsed: Network = serde_json::from_str(json).unwrap();
        assert!(parsed.other_config.token);
        assert_eq!(parsed.label(), "abc");
    }

    #[test]
    fn test_matches_filter() {
        let mut net = Network::generate();
        net.name = Some("Office-VPN".to_string());
        assert!(net.matches_filter(""));
        assert!(net.matches_filter("office"));
        assert!(net.matches_filter(&net.config.id[..8].to_uppercase()));
        assert!(!net.matches_filter("home"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(NetworkStatus::Running.to_string(), "running");
        assert_eq!(NetworkStatus::Off.to_string(), "off");
        assert_eq!(NetworkStatus::Error.to_string(), "error");
    }
}
