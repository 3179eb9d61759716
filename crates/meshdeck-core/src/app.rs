use serde::{Deserialize, Serialize};

/// Application-level settings persisted next to the network list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub autostart: Autostart,
}

/// Networks started automatically when the application launches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autostart {
    #[serde(default)]
    pub enable: bool,
    /// Network ids, started in order.
    #[serde(default)]
    pub network: Vec<String>,
}

impl AppConfig {
    /// Add an id to the autostart list. Returns false if already present.
    pub fn add_autostart(&mut self, id: &str) -> bool {
        if self.autostart.network.iter().any(|n| n == id) {
            return false;
        }
        self.autostart.network.push(id.to_string());
        true
    }

    /// Remove an id from the autostart list. Returns false if absent.
    pub fn remove_autostart(&mut self, id: &str) -> bool {
        let before = self.autostart.network.len();
        self.autostart.network.retain(|n| n != id);
        self.autostart.network.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let cfg = AppConfig::default();
        assert!(!cfg.autostart.enable);
        assert!(cfg.autostart.network.is_empty());
    }

    #[test]
    fn test_add_and_remove_autostart() {
        let mut cfg = AppConfig::default();
        assert!(cfg.add_autostart("a"));
        assert!(!cfg.add_autostart("a"));
        assert!(cfg.add_autostart("b"));
        assert_eq!(cfg.autostart.network, vec!["a", "b"]);
        assert!(cfg.remove_autostart("a"));
        assert!(!cfg.remove_autostart("a"));
        assert_eq!(cfg.autostart.network, vec!["b"]);
    }

    #[test]
    fn test_deserialize_persisted_shape() {
        let json = r#"{ "autostart": { "enable": true, "network": ["x"] } }"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.autostart.enable);
        assert_eq!(cfg.autostart.network, vec!["x"]);
    }
}
