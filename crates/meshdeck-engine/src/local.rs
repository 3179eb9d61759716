use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use meshdeck_core::telemetry::{NetworkInstanceInfo, NodeInfo, PeerInfo, PeerRoutePair, Route};

use crate::boundary::{EngineBoundary, EngineError};
use crate::render::render_engine_config;
use crate::wire::EngineConfig;

struct LocalInstance {
    config: EngineConfig,
    routes: Vec<Route>,
    peers: Vec<PeerInfo>,
    error: Option<String>,
}

impl LocalInstance {
    fn snapshot(&self, id: &str) -> NetworkInstanceInfo {
        let virtual_ipv4 = match (&self.config.ipv4, self.config.dhcp) {
            (Some(addr), false) => addr.clone(),
            _ => String::new(),
        };
        NetworkInstanceInfo {
            id: id.to_lowercase(),
            node: NodeInfo {
                virtual_ipv4,
                listeners: self
                    .config
                    .listener_urls
                    .iter()
                    .filter(|l| !l.is_empty())
                    .cloned()
                    .collect(),
                ..Default::default()
            },
            routes: self.routes.clone(),
            peers: self.peers.clone(),
            peer_route_pairs: PeerRoutePair::pair(&self.routes, &self.peers),
            running: true,
            error: self.error.clone(),
        }
    }
}

/// Telemetry for one instance supplied from outside the engine, such as a
/// capture file replayed by `meshdeck run --telemetry`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstanceFeed {
    pub routes: Vec<Route>,
    pub peers: Vec<PeerInfo>,
    pub error: Option<String>,
}

/// In-process engine that tracks running instances in memory.
///
/// No packets are routed; route and peer telemetry is whatever was last
/// handed to [`LocalEngine::publish_telemetry`] or [`LocalEngine::apply_feed`].
#[derive(Default)]
pub struct LocalEngine {
    instances: Mutex<BTreeMap<String, LocalInstance>>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the route/peer telemetry of a running instance. Returns
    /// false if the instance is not running.
    pub async fn publish_telemetry(&self, id: &str, routes: Vec<Route>, peers: Vec<PeerInfo>) -> bool {
        let mut instances = self.instances.lock().await;
        match instances.get_mut(id) {
            Some(instance) => {
                instance.routes = routes;
                instance.peers = peers;
                true
            }
            None => false,
        }
    }

    /// Record a runtime error for a running instance.
    pub async fn report_error(&self, id: &str, message: &str) -> bool {
        let mut instances = self.instances.lock().await;
        match instances.get_mut(id) {
            Some(instance) => {
                instance.error = Some(message.to_string());
                true
            }
            None => false,
        }
    }

    /// Publish a feed's routes and peers, and its error if it has one.
    /// Returns false if the instance is not running.
    pub async fn apply_feed(&self, id: &str, feed: InstanceFeed) -> bool {
        let InstanceFeed {
            routes,
            peers,
            error,
        } = feed;
        if !self.publish_telemetry(id, routes, peers).await {
            return false;
        }
        if let Some(message) = error {
            self.report_error(id, &message).await;
        }
        debug!(instance = %id, "Feed applied");
        true
    }

    pub async fn running_ids(&self) -> Vec<String> {
        self.instances.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl EngineBoundary for LocalEngine {
    async fn parse_network_config(&self, config: &EngineConfig) -> Result<String, EngineError> {
        Ok(render_engine_config(config)?)
    }

    async fn start_network_instance(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let mut instances = self.instances.lock().await;
        if instances.contains_key(&config.id) {
            return Err(EngineError::AlreadyRunning(config.id.clone()));
        }
        render_engine_config(config)?;
        instances.insert(
            config.id.clone(),
            LocalInstance {
                config: config.clone(),
                routes: Vec::new(),
                peers: Vec::new(),
                error: None,
            },
        );
        info!(instance = %config.id, "Instance started");
        Ok(())
    }

    async fn stop_network_instance(&self, id: &str) -> Result<(), EngineError> {
        let removed = self.instances.lock().await.remove(id).is_some();
        info!(instance = %id, removed, "Instance stopped");
        Ok(())
    }

    async fn collect_network_infos(&self) -> Result<Vec<NetworkInstanceInfo>, EngineError> {
        let instances = self.instances.lock().await;
        let infos: Vec<_> = instances
            .iter()
            .map(|(id, instance)| instance.snapshot(id))
            .collect();
        debug!(count = infos.len(), "Collected instance info");
        Ok(infos)
    }

    async fn test_config(&self, config: &EngineConfig) -> Result<EngineConfig, EngineError> {
        render_engine_config(config)?;
        Ok(config.clone())
    }
}
