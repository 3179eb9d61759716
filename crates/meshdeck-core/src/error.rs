use thiserror::Error;

/// Reasons a network configuration cannot be handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to parse instance id: {0}")]
    InvalidId(String),

    #[error("no {0} provided for the selected authentication mode")]
    MissingCredential(&'static str),

    #[error("failed to parse ipv4 address: {0:?}")]
    InvalidIpv4(String),

    #[error("failed to parse {kind} uri: {value}")]
    InvalidUrl { kind: &'static str, value: String },

    #[error("no peer urls provided")]
    NoPeers,

    #[error("failed to parse proxy network: {0}")]
    InvalidProxyCidr(String),

    #[error("failed to parse vpn portal client cidr: {0}")]
    InvalidVpnPortal(String),

    #[error("failed to render engine config: {0}")]
    Render(String),
}
