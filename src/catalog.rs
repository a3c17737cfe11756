//! Static asset metadata (ip, location, type), loaded from configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub location: String,
    /// Asset type, e.g. "Database Cluster".
    #[serde(default)]
    pub kind: String,
}

/// Immutable lookup from asset name to its metadata.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    by_name: HashMap<String, AssetMetadata>,
}

impl AssetCatalog {
    /// Later rows win when a name repeats.
    pub fn new(assets: impl IntoIterator<Item = AssetMetadata>) -> Self {
        let by_name = assets.into_iter().map(|a| (a.name.clone(), a)).collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&AssetMetadata> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, ip: &str) -> AssetMetadata {
        AssetMetadata {
            name: name.to_string(),
            ip: ip.to_string(),
            location: "London".to_string(),
            kind: "Server".to_string(),
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = AssetCatalog::new(vec![asset("db-01", "10.0.0.1"), asset("gw-01", "10.0.0.2")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("gw-01").map(|a| a.ip.as_str()), Some("10.0.0.2"));
        assert!(catalog.get("GW-01").is_none());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let catalog = AssetCatalog::new(vec![asset("db-01", "10.0.0.1"), asset("db-01", "10.9.9.9")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("db-01").unwrap().ip, "10.9.9.9");
    }
}
