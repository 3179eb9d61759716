//! Periodic telemetry poll against the engine.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use meshdeck_engine::{EngineBoundary, EngineError};

use crate::registry::{InstanceRegistry, StatusChange};

/// Collect once and install the result. On failure the registry is left
/// exactly as it was.
pub async fn poll_once(
    registry: &InstanceRegistry,
    engine: &dyn EngineBoundary,
) -> Result<Vec<StatusChange>, EngineError> {
    let infos = engine.collect_network_infos().await?;
    debug!(instances = infos.len(), "Poll collected");
    Ok(registry.apply_poll(infos).await)
}

/// Poll every `interval` until `shutdown` flips to true, its sender is
/// dropped, or `on_tick` breaks. `on_tick` sees every poll outcome,
/// failures included. Returns the number of completed polls.
pub async fn run<F, Fut>(
    registry: &InstanceRegistry,
    engine: &dyn EngineBoundary,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_tick: F,
) -> u64
where
    F: FnMut(Result<Vec<StatusChange>, EngineError>) -> Fut,
    Fut: Future<Output = ControlFlow<()>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls = 0u64;

    info!(interval_ms = interval.as_millis() as u64, "Poller started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = poll_once(registry, engine).await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "Telemetry poll failed");
                }
                polls += 1;
                if on_tick(outcome).await.is_break() {
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    info!(polls, "Poller stopped");
    polls
}
