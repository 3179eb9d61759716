// meshdeck-core: Pure types, stats reduction, telemetry history
// No internal meshdeck dependencies; this is the foundation crate.

pub mod app;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod naming;
pub mod network;
pub mod stats;
pub mod telemetry;
pub mod time;
