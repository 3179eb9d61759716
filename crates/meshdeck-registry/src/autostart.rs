use tracing::{info, warn};

use meshdeck_core::app::AppConfig;

use crate::lifecycle::{Dispatch, LifecycleController};

/// Start every network listed for autostart, in order.
///
/// Failures are logged and do not stop the remaining starts. Returns the
/// number of networks whose start was dispatched.
pub async fn run(controller: &LifecycleController, config: &AppConfig) -> usize {
    if !config.autostart.enable {
        return 0;
    }

    let mut started = 0;
    for id in &config.autostart.network {
        let outcome = controller
            .start_network(Some(id), |e| {
                warn!(instance = %id, error = %e, "Autostart failed");
            })
            .await;
        match outcome {
            Dispatch::Sent => started += 1,
            Dispatch::NotFound => warn!(instance = %id, "Autostart id not in network list"),
            Dispatch::Failed => {}
        }
    }
    info!(started, listed = config.autostart.network.len(), "Autostart complete");
    started
}
