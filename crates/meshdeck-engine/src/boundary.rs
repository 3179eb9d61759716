use async_trait::async_trait;
use thiserror::Error;

use meshdeck_core::error::ConfigError;
use meshdeck_core::telemetry::NetworkInstanceInfo;

use crate::wire::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine rejected the request: {0}")]
    Rejected(String),

    #[error("instance already exists: {0}")]
    AlreadyRunning(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// Named operations exposed by the networking engine.
///
/// Every call is remote in spirit: latency is unknown and any call may
/// fail. Timeouts are the implementation's concern, reported as errors.
#[async_trait]
pub trait EngineBoundary: Send + Sync {
    /// Validate a configuration without side effects, returning the
    /// engine's rendered form of it.
    async fn parse_network_config(&self, config: &EngineConfig) -> Result<String, EngineError>;

    /// Begin running an instance identified by `config.id`.
    async fn start_network_instance(&self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Halt a running instance.
    async fn stop_network_instance(&self, id: &str) -> Result<(), EngineError>;

    /// Telemetry for every running instance. Empty when nothing runs.
    async fn collect_network_infos(&self) -> Result<Vec<NetworkInstanceInfo>, EngineError>;

    /// Diagnostic dry run: echoes the configuration as the engine sees it.
    async fn test_config(&self, config: &EngineConfig) -> Result<EngineConfig, EngineError>;
}
