// meshdeck-registry: Instance registry, lifecycle controller, poller
// Depends on meshdeck-core (types) and meshdeck-engine (engine boundary)

pub mod autostart;
pub mod lifecycle;
pub mod poller;
pub mod registry;
pub mod store;

pub use lifecycle::{Dispatch, LifecycleController, LifecycleError};
pub use registry::{InstanceRegistry, StatusChange};
pub use store::{FileStore, KvStore, MemoryStore, StoreError};
