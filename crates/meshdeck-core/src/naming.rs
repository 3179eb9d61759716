use uuid::Uuid;

use crate::error::ConfigError;

/// Generate a fresh network instance id (hyphenated UUID v4).
///
/// Ids are never reused; collision avoidance relies entirely on the
/// randomness of v4 UUIDs.
pub fn generate_network_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a short random token for token-mode authentication.
pub fn generate_token() -> String {
    random_hex(6)
}

/// Generate a display name for a freshly added network: "mesh-xxx".
pub fn generate_display_name() -> String {
    format!("mesh-{}", random_hex(3))
}

/// Validate that an instance id is a UUID, as the engine requires.
pub fn validate_network_id(id: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(id).map_err(|_| ConfigError::InvalidId(id.to_string()))
}

/// `len` lowercase hex chars drawn from a v4 UUID.
fn random_hex(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}
