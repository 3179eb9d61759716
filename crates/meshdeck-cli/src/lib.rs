// meshdeck-cli: Clap commands, UI, settings
// Depends on meshdeck-core, meshdeck-engine, meshdeck-registry

pub mod commands;
pub mod display;
pub mod logging;
pub mod output;
pub mod settings;
pub mod ui;

pub use commands::run;
