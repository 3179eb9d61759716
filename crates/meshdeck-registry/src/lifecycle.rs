use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use meshdeck_core::error::ConfigError;
use meshdeck_core::network::Network;
use meshdeck_engine::{EngineBoundary, EngineConfig, EngineError};

use crate::registry::InstanceRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Outcome of a start/stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The engine accepted every call.
    Sent,
    /// No network resolved; nothing was sent.
    NotFound,
    /// A call failed and the error callback ran.
    Failed,
}

/// Drives start/stop of registry entries against the engine.
///
/// Status is never written here. The next poll reconciles it from what the
/// engine reports.
pub struct LifecycleController {
    registry: Arc<InstanceRegistry>,
    engine: Arc<dyn EngineBoundary>,
}

impl LifecycleController {
    pub fn new(registry: Arc<InstanceRegistry>, engine: Arc<dyn EngineBoundary>) -> Self {
        Self { registry, engine }
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Explicit id, else the current selection.
    async fn resolve(&self, id: Option<&str>) -> Option<Network> {
        match id {
            Some(id) => self.registry.network(id).await,
            None => self.registry.current_network().await,
        }
    }

    /// Validate then start a network. Failures go to `on_error`.
    pub async fn start_network<F>(&self, id: Option<&str>, on_error: F) -> Dispatch
    where
        F: FnOnce(LifecycleError) + Send,
    {
        let Some(network) = self.resolve(id).await else {
            return Dispatch::NotFound;
        };
        match self.try_start(&network).await {
            Ok(()) => {
                info!(instance = %network.id(), "Start dispatched");
                Dispatch::Sent
            }
            Err(e) => {
                warn!(instance = %network.id(), error = %e, "Start failed");
                on_error(e);
                Dispatch::Failed
            }
        }
    }

    async fn try_start(&self, network: &Network) -> Result<(), LifecycleError> {
        let config = EngineConfig::from_network(network)?;
        self.engine.parse_network_config(&config).await?;
        self.engine.start_network_instance(&config).await?;
        Ok(())
    }

    /// Stop a network by config id. Failures go to `on_error`.
    pub async fn stop_network<F>(&self, id: Option<&str>, on_error: F) -> Dispatch
    where
        F: FnOnce(LifecycleError) + Send,
    {
        let Some(network) = self.resolve(id).await else {
            return Dispatch::NotFound;
        };
        match self.engine.stop_network_instance(network.id()).await {
            Ok(()) => {
                info!(instance = %network.id(), "Stop dispatched");
                Dispatch::Sent
            }
            Err(e) => {
                warn!(instance = %network.id(), error = %e, "Stop failed");
                on_error(e.into());
                Dispatch::Failed
            }
        }
    }

    /// The engine's rendered config for a network. `Ok(None)` if the id
    /// does not resolve.
    pub async fn render_network(&self, id: Option<&str>) -> Result<Option<String>, LifecycleError> {
        let Some(network) = self.resolve(id).await else {
            return Ok(None);
        };
        let config = EngineConfig::from_network(&network)?;
        Ok(Some(self.engine.parse_network_config(&config).await?))
    }

    /// Dry run through the engine's diagnostic path.
    pub async fn test_network(
        &self,
        id: Option<&str>,
    ) -> Result<Option<EngineConfig>, LifecycleError> {
        let Some(network) = self.resolve(id).await else {
            return Ok(None);
        };
        let config = EngineConfig::from_network(&network)?;
        Ok(Some(self.engine.test_config(&config).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use meshdeck_core::network::NetworkStatus;
    use meshdeck_core::telemetry::NetworkInstanceInfo;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Parse(serde_json::Value),
        Start(serde_json::Value),
        Stop(String),
    }

    /// Records every call and fails the ones it is told to.
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<Call>>,
        fail_parse: bool,
        fail_start: bool,
        fail_stop: bool,
    }

    impl RecordingEngine {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl EngineBoundary for RecordingEngine {
        async fn parse_network_config(&self, config: &EngineConfig) -> Result<String, EngineError> {
            self.record(Call::Parse(serde_json::to_value(config).unwrap()));
            if self.fail_parse {
                return Err(EngineError::Rejected("bad config".to_string()));
            }
            Ok("rendered".to_string())
        }

        async fn start_network_instance(&self, config: &EngineConfig) -> Result<(), EngineError> {
            self.record(Call::Start(serde_json::to_value(config).unwrap()));
            if self.fail_start {
                return Err(EngineError::AlreadyRunning(config.id.clone()));
            }
            Ok(())
        }

        async fn stop_network_instance(&self, id: &str) -> Result<(), EngineError> {
            self.record(Call::Stop(id.to_string()));
            if self.fail_stop {
                return Err(EngineError::Unavailable("gone".to_string()));
            }
            Ok(())
        }

        async fn collect_network_infos(&self) -> Result<Vec<NetworkInstanceInfo>, EngineError> {
            Ok(Vec::new())
        }

        async fn test_config(&self, config: &EngineConfig) -> Result<EngineConfig, EngineError> {
            Ok(config.clone())
        }
    }

    async fn setup(engine: RecordingEngine) -> (LifecycleController, Arc<RecordingEngine>, String) {
        let registry = Arc::new(
            InstanceRegistry::load(Arc::new(MemoryStore::new()))
                .await
                .unwrap(),
        );
        let net = registry.add_network().await.unwrap();
        registry
            .update_network(net.id(), |n| {
                n.config.network_name = Some("office".to_string());
                n.config.network_secret = Some("hunter2".to_string());
            })
            .await
            .unwrap();
        registry.select(net.id()).await;
        let engine = Arc::new(engine);
        let controller = LifecycleController::new(registry, engine.clone());
        (controller, engine, net.id().to_string())
    }

    fn never(_: LifecycleError) {
        panic!("error callback should not run");
    }

    #[tokio::test]
    async fn test_start_token_mode_payload() {
        let (ctl, engine, id) = setup(RecordingEngine::default()).await;
        assert_eq!(ctl.start_network(Some(&id), never).await, Dispatch::Sent);

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            let (Call::Parse(value) | Call::Start(value)) = call else {
                panic!("unexpected call {:?}", call);
            };
            assert!(value.get("token").is_some());
            assert!(value.get("networkName").is_none());
            assert!(value.get("networkSecret").is_none());
        }
        assert!(matches!(calls[0], Call::Parse(_)));
        assert!(matches!(calls[1], Call::Start(_)));
    }

    #[tokio::test]
    async fn test_start_secret_mode_payload() {
        let (ctl, engine, id) = setup(RecordingEngine::default()).await;
        ctl.registry()
            .update_network(&id, |n| n.other_config.token = false)
            .await
            .unwrap();

        assert_eq!(ctl.start_network(None, never).await, Dispatch::Sent);
        let Call::Start(value) = &engine.calls()[1] else {
            panic!("expected start");
        };
        assert!(value.get("token").is_none());
        assert_eq!(value["networkName"], "office");
        assert_eq!(value["networkSecret"], "hunter2");

        // stored config keeps both credentials
        let stored = ctl.registry().network(&id).await.unwrap();
        assert!(stored.config.token.is_some());
        assert_eq!(stored.config.network_secret.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_start_does_not_touch_status() {
        let (ctl, _engine, id) = setup(RecordingEngine::default()).await;
        ctl.start_network(Some(&id), never).await;
        assert_eq!(
            ctl.registry().network(&id).await.unwrap().status,
            NetworkStatus::Off
        );
    }

    #[tokio::test]
    async fn test_parse_failure_skips_start() {
        let engine = RecordingEngine {
            fail_parse: true,
            ..Default::default()
        };
        let (ctl, engine, id) = setup(engine).await;
        let mut seen = None;
        let outcome = ctl.start_network(Some(&id), |e| seen = Some(e)).await;

        assert_eq!(outcome, Dispatch::Failed);
        assert_eq!(
            seen,
            Some(LifecycleError::Engine(EngineError::Rejected(
                "bad config".to_string()
            )))
        );
        assert_eq!(engine.calls().len(), 1);
        let stored = ctl.registry().network(&id).await.unwrap();
        assert_eq!(stored.status, NetworkStatus::Off);
    }

    #[tokio::test]
    async fn test_start_failure_reported() {
        let engine = RecordingEngine {
            fail_start: true,
            ..Default::default()
        };
        let (ctl, _engine, id) = setup(engine).await;
        let mut seen = None;
        assert_eq!(
            ctl.start_network(Some(&id), |e| seen = Some(e)).await,
            Dispatch::Failed
        );
        assert!(matches!(
            seen,
            Some(LifecycleError::Engine(EngineError::AlreadyRunning(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_never_reaches_engine() {
        let (ctl, engine, id) = setup(RecordingEngine::default()).await;
        ctl.registry()
            .update_network(&id, |n| n.config.token = None)
            .await
            .unwrap();
        let mut seen = None;
        ctl.start_network(Some(&id), |e| seen = Some(e)).await;
        assert_eq!(
            seen,
            Some(LifecycleError::Config(ConfigError::MissingCredential("token")))
        );
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_id_is_a_noop() {
        let (ctl, engine, id) = setup(RecordingEngine::default()).await;
        assert_eq!(ctl.start_network(Some("missing"), never).await, Dispatch::NotFound);
        assert_eq!(ctl.stop_network(Some("missing"), never).await, Dispatch::NotFound);

        ctl.registry().remove_network(&id).await.unwrap();
        assert_eq!(ctl.start_network(None, never).await, Dispatch::NotFound);
        assert_eq!(ctl.render_network(None).await, Ok(None));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_by_config_id() {
        let (ctl, engine, id) = setup(RecordingEngine::default()).await;
        assert_eq!(ctl.stop_network(None, never).await, Dispatch::Sent);
        assert_eq!(engine.calls(), vec![Call::Stop(id)]);
    }

    #[tokio::test]
    async fn test_stop_failure_reported() {
        let engine = RecordingEngine {
            fail_stop: true,
            ..Default::default()
        };
        let (ctl, _engine, id) = setup(engine).await;
        let mut seen = None;
        assert_eq!(
            ctl.stop_network(Some(&id), |e| seen = Some(e)).await,
            Dispatch::Failed
        );
        assert_eq!(
            seen,
            Some(LifecycleError::Engine(EngineError::Unavailable(
                "gone".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_render_and_test_network() {
        let (ctl, _engine, id) = setup(RecordingEngine::default()).await;
        assert_eq!(
            ctl.render_network(Some(&id)).await,
            Ok(Some("rendered".to_string()))
        );
        let echoed = ctl.test_network(Some(&id)).await.unwrap().unwrap();
        assert_eq!(echoed.id, id);
    }
}
