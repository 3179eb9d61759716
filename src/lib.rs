//! # meshdeck: control surface for mesh overlay network instances
//!
//! Facade crate that re-exports the meshdeck workspace crates so consumers
//! can depend on a single `meshdeck` library.
//!
//! ## Crate breakdown
//!
//! | Module | Crate | Purpose |
//! |--------|-------|---------|
//! | [`core`] | meshdeck-core | Network model, stats reducer, telemetry history |
//! | [`engine`] | meshdeck-engine | Engine boundary, wire config, in-process engine |
//! | [`registry`] | meshdeck-registry | Instance registry, lifecycle controller, poller |
//! | [`cli`] | meshdeck-cli | Clap commands, settings, table output |

pub use meshdeck_cli as cli;
pub use meshdeck_core as core;
pub use meshdeck_engine as engine;
pub use meshdeck_registry as registry;
