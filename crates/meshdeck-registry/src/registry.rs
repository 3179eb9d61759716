use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use meshdeck_core::app::AppConfig;
use meshdeck_core::history::{HISTORY_CAPACITY, HistoryEntry, TelemetryHistory};
use meshdeck_core::network::{Network, NetworkStatus};
use meshdeck_core::stats::{self, DataInfo};
use meshdeck_core::telemetry::NetworkInstanceInfo;

use crate::store::{self, KvStore, StoreError};

/// Storage key of the durable network list.
pub const NETWORK_LIST_KEY: &str = "networkList";
/// Storage key of the application config (autostart).
pub const APP_CONFIG_KEY: &str = "config";

/// A status change observed while applying a telemetry poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: String,
    pub from: NetworkStatus,
    pub to: NetworkStatus,
}

/// Status implied by one poll for a network currently in `current`.
///
/// Presence in the snapshot means the engine runs the instance; absence
/// means it does not. `Off` and `Stopped` are left alone when absent so a
/// never-started network stays `Off`.
pub fn reconcile_status(
    current: NetworkStatus,
    seen: Option<&NetworkInstanceInfo>,
) -> NetworkStatus {
    match seen {
        Some(info) if info.error.is_some() => NetworkStatus::Error,
        Some(info) if info.running => NetworkStatus::Running,
        Some(_) => NetworkStatus::Stopped,
        None => match current {
            NetworkStatus::Running | NetworkStatus::Error | NetworkStatus::Starting => {
                NetworkStatus::Stopped
            }
            other => other,
        },
    }
}

/// Catalog of configured networks plus the latest engine telemetry.
///
/// Constructed once at startup and shared by reference. The durable list
/// is persisted through the [`KvStore`] after every mutation; telemetry
/// and selection live only in memory.
pub struct InstanceRegistry {
    store: Arc<dyn KvStore>,
    networks: RwLock<Vec<Network>>,
    /// Replaced wholesale on every poll; readers clone the `Arc`.
    infos: RwLock<Arc<Vec<NetworkInstanceInfo>>>,
    filter: RwLock<String>,
    current_id: RwLock<String>,
    history: TelemetryHistory,
}

impl InstanceRegistry {
    /// Load the durable network list from `store`.
    pub async fn load(store: Arc<dyn KvStore>) -> Result<Self, StoreError> {
        Self::load_with_capacity(store, HISTORY_CAPACITY).await
    }

    /// Load with a custom per-instance history capacity.
    pub async fn load_with_capacity(
        store: Arc<dyn KvStore>,
        history_capacity: usize,
    ) -> Result<Self, StoreError> {
        let networks: Vec<Network> = store::load_json(store.as_ref(), NETWORK_LIST_KEY)
            .await?
            .unwrap_or_default();
        let current_id = networks
            .first()
            .map(|n| n.id().to_string())
            .unwrap_or_default();
        info!(networks = networks.len(), "Instance registry loaded");

        Ok(Self {
            store,
            networks: RwLock::new(networks),
            infos: RwLock::new(Arc::new(Vec::new())),
            filter: RwLock::new(String::new()),
            current_id: RwLock::new(current_id),
            history: TelemetryHistory::with_capacity(history_capacity),
        })
    }

    // ---- Durable list ----

    pub async fn networks(&self) -> Vec<Network> {
        self.networks.read().await.clone()
    }

    pub async fn network(&self, id: &str) -> Option<Network> {
        self.networks
            .read()
            .await
            .iter()
            .find(|n| n.id() == id)
            .cloned()
    }

    /// Networks matching the free-text filter.
    pub async fn filtered_networks(&self) -> Vec<Network> {
        let filter = self.filter.read().await.clone();
        self.networks
            .read()
            .await
            .iter()
            .filter(|n| n.matches_filter(&filter))
            .cloned()
            .collect()
    }

    /// Append a new network with generated id and default config.
    pub async fn add_network(&self) -> Result<Network, StoreError> {
        let network = Network::generate();
        let mut networks = self.networks.write().await;
        let mut next = networks.clone();
        next.push(network.clone());
        store::save_json(self.store.as_ref(), NETWORK_LIST_KEY, &next).await?;
        *networks = next;
        info!(instance = %network.id(), "Network added");
        Ok(network)
    }

    /// Remove a network by id. Selection and history are left as they
    /// are; see [`InstanceRegistry::prune_history`].
    pub async fn remove_network(&self, id: &str) -> Result<bool, StoreError> {
        let mut networks = self.networks.write().await;
        let next: Vec<Network> = networks.iter().filter(|n| n.id() != id).cloned().collect();
        if next.len() == networks.len() {
            return Ok(false);
        }
        store::save_json(self.store.as_ref(), NETWORK_LIST_KEY, &next).await?;
        *networks = next;
        info!(instance = %id, "Network removed");
        Ok(true)
    }

    /// Apply a user edit to one network and persist. A miss is a no-op.
    ///
    /// The id is restored after the edit; it is the network's identity.
    pub async fn update_network<F>(&self, id: &str, edit: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Network),
    {
        let mut networks = self.networks.write().await;
        let mut next = networks.clone();
        let Some(network) = next.iter_mut().find(|n| n.id() == id) else {
            return Ok(false);
        };
        edit(network);
        network.config.id = id.to_string();
        store::save_json(self.store.as_ref(), NETWORK_LIST_KEY, &next).await?;
        *networks = next;
        debug!(instance = %id, "Network updated");
        Ok(true)
    }

    // ---- Filter & selection ----

    pub async fn filter(&self) -> String {
        self.filter.read().await.clone()
    }

    pub async fn set_filter(&self, filter: &str) {
        *self.filter.write().await = filter.to_string();
    }

    pub async fn current_id(&self) -> String {
        self.current_id.read().await.clone()
    }

    /// Select a network. The id is not checked against the list.
    pub async fn select(&self, id: &str) {
        *self.current_id.write().await = id.to_string();
    }

    pub async fn current_network(&self) -> Option<Network> {
        let id = self.current_id().await;
        self.network(&id).await
    }

    // ---- Telemetry ----

    /// The latest telemetry snapshot list. Consistent for the caller's
    /// whole read even if a poll lands meanwhile.
    pub async fn snapshot(&self) -> Arc<Vec<NetworkInstanceInfo>> {
        Arc::clone(&*self.infos.read().await)
    }

    /// Telemetry for one instance, matched case-insensitively.
    pub async fn network_info(&self, id: &str) -> Option<NetworkInstanceInfo> {
        self.snapshot()
            .await
            .iter()
            .find(|info| info.matches_id(id))
            .cloned()
    }

    pub async fn current_network_info(&self) -> Option<NetworkInstanceInfo> {
        let id = self.current_id().await;
        self.network_info(&id).await
    }

    /// Reduced metrics for the current instance; empty without telemetry.
    pub async fn current_data(&self) -> Vec<DataInfo> {
        self.current_network_info()
            .await
            .map(|info| stats::reduce_pairs(&info.peer_route_pairs))
            .unwrap_or_default()
    }

    pub async fn is_current_running(&self) -> bool {
        let id = self.current_id().await;
        self.snapshot().await.iter().any(|info| info.matches_id(&id))
    }

    pub async fn current_history(&self) -> Vec<HistoryEntry> {
        let id = self.current_id().await;
        self.history.get(&id).await
    }

    pub async fn history(&self, id: &str) -> Vec<HistoryEntry> {
        self.history.get(id).await
    }

    /// Reduce one snapshot and append it to the instance's history.
    pub async fn push_info_stack(&self, id: &str, info: &NetworkInstanceInfo) {
        self.history
            .push(id, stats::reduce_pairs(&info.peer_route_pairs))
            .await;
    }

    /// Install the result of one engine poll.
    ///
    /// The snapshot list is swapped in as a whole, statuses are
    /// reconciled against it, and every snapshot is appended to history
    /// under the id of the network it belongs to.
    pub async fn apply_poll(&self, infos: Vec<NetworkInstanceInfo>) -> Vec<StatusChange> {
        let infos = Arc::new(infos);
        *self.infos.write().await = Arc::clone(&infos);

        let mut changes = Vec::new();
        let mut history_keys = Vec::with_capacity(infos.len());
        {
            let mut networks = self.networks.write().await;
            for network in networks.iter_mut() {
                let seen = infos.iter().find(|info| info.matches_id(network.id()));
                let next = reconcile_status(network.status, seen);
                if next != network.status {
                    changes.push(StatusChange {
                        id: network.id().to_string(),
                        from: network.status,
                        to: next,
                    });
                    network.status = next;
                }
            }
            for info in infos.iter() {
                let key = networks
                    .iter()
                    .find(|n| info.matches_id(n.id()))
                    .map(|n| n.id().to_string())
                    .unwrap_or_else(|| info.id.clone());
                history_keys.push(key);
            }
        }

        for (key, info) in history_keys.iter().zip(infos.iter()) {
            self.push_info_stack(key, info).await;
        }

        for change in &changes {
            info!(
                instance = %change.id,
                from = %change.from,
                to = %change.to,
                "Network status changed"
            );
        }
        changes
    }

    /// Drop history for ids no longer in the durable list.
    pub async fn prune_history(&self) -> usize {
        let ids: Vec<String> = self
            .networks
            .read()
            .await
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        self.history.retain(|id| ids.iter().any(|n| n == id)).await
    }

    // ---- App config ----

    pub async fn app_config(&self) -> Result<AppConfig, StoreError> {
        Ok(store::load_json(self.store.as_ref(), APP_CONFIG_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_app_config(&self, config: &AppConfig) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), APP_CONFIG_KEY, config).await
    }
}
