//! Configuration management for catalog services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`GTD__` prefix, `__` separator)
//! 2. Config file (`gtd.toml`, or the prefix passed on the command line)
//! 3. Defaults

use serde::Deserialize;

use crate::error::GtdError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub neo4j: Neo4jSettings,
    pub seed: SeedSettings,
    pub resource: ResourceSettings,
}

/// Connection settings for the graph database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

/// First-boot seeding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    /// Whether seeding runs at all.
    pub enabled: bool,

    /// JSON file with the bulk-seed rows.
    pub data_file: String,

    /// Account registered before the rows are loaded.
    pub user_name: String,
    pub user_password: String,
    pub user_email: String,
}

/// Tunables for the generic resource engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Relationship hops materialized before a patch is applied.
    pub patch_fetch_depth: usize,

    pub default_page_size: u64,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "gtd-dev".to_string(),
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            data_file: "data/gtd-mini.json".to_string(),
            user_name: "testuser".to_string(),
            user_password: "Password123!".to_string(),
            user_email: "testuser123@email.com".to_string(),
        }
    }
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            patch_fetch_depth: 5,
            default_page_size: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and `GTD__` variables.
    pub fn load(file_prefix: &str) -> Result<Self, GtdError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GTD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = cfg.try_deserialize()?;
        tracing::debug!(
            neo4j_uri = %app.neo4j.uri,
            seed_enabled = app.seed.enabled,
            "Configuration loaded"
        );
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.max_connections, 16);
        assert!(config.seed.enabled);
        assert_eq!(config.seed.user_name, "testuser");
        assert_eq!(config.resource.patch_fetch_depth, 5);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtd.toml");
        std::fs::write(
            &path,
            r#"
[neo4j]
uri = "bolt://graph:7687"

[seed]
enabled = false
data_file = "rows.json"
"#,
        )
        .unwrap();

        let prefix = dir.path().join("gtd");
        let config = AppConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.neo4j.uri, "bolt://graph:7687");
        assert_eq!(config.neo4j.user, "neo4j");
        assert!(!config.seed.enabled);
        assert_eq!(config.seed.data_file, "rows.json");
        assert_eq!(config.resource.default_page_size, 20);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = AppConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.seed.data_file, "data/gtd-mini.json");
    }
}
