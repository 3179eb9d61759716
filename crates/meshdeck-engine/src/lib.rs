// meshdeck-engine: Engine boundary trait, wire config, config rendering
// Depends on meshdeck-core (types)

pub mod boundary;
pub mod local;
pub mod render;
pub mod wire;

pub use boundary::{EngineBoundary, EngineError};
pub use local::{InstanceFeed, LocalEngine};
pub use wire::{EngineAuth, EngineConfig};
