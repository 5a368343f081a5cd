//! devgraph
//!
//! A repository knowledge graph for developer questions:
//! - Extractors for schemas, packages, API routes, TypeScript code and docs
//! - Neo4j storage behind the `GraphStore` trait
//! - Tree-sitter for precise code parsing
//! - A bilingual (Chinese/English) intent classifier
//! - A query resolver and a development-context synthesizer

pub mod context;
pub mod extractor;
pub mod identity;
pub mod intent;
pub mod neo4j;
pub mod orchestrator;
pub mod query;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{anyhow, Result};
use extractor::ExtractionConfig;
use identity::IdScheme;
use query::QueryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YamlConfig {
    /// Repository to sync when no path is given
    pub root: String,
    pub neo4j: Neo4jYamlConfig,
    pub extraction: ExtractionConfig,
    pub query: QueryConfig,
    pub identity: IdentityYamlConfig,
}

impl Default for YamlConfig {
    fn default() -> Self {
        Self {
            root: ".".into(),
            neo4j: Neo4jYamlConfig::default(),
            extraction: ExtractionConfig::default(),
            query: QueryConfig::default(),
            identity: IdentityYamlConfig::default(),
        }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "devgraph".into(),
        }
    }
}

/// Identity configuration section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityYamlConfig {
    pub scheme: IdScheme,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub repository_root: PathBuf,
    pub extraction: ExtractionConfig,
    pub query: QueryConfig,
    pub id_scheme: IdScheme,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load `config.yaml` (or `yaml_path`), then apply environment overrides
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_yaml(Self::load_yaml(yaml_path));

        if let Ok(uri) = std::env::var("NEO4J_URI") {
            config.neo4j_uri = uri;
        }
        if let Ok(user) = std::env::var("NEO4J_USER") {
            config.neo4j_user = user;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            config.neo4j_password = password;
        }
        if let Ok(root) = std::env::var("DEVGRAPH_ROOT") {
            config.repository_root = PathBuf::from(root);
        }
        if let Some(ms) = env_u64("DEVGRAPH_QUERY_TIMEOUT_MS") {
            config.query.timeout_ms = ms;
        }
        if let Some(ms) = env_u64("DEVGRAPH_DEBUG_TIMEOUT_MS") {
            config.query.debug_timeout_ms = ms;
        }
        if let Ok(scheme) = std::env::var("DEVGRAPH_ID_SCHEME") {
            config.id_scheme = scheme
                .parse()
                .map_err(|e| anyhow!("DEVGRAPH_ID_SCHEME: {}", e))?;
        }
        Ok(config)
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        Self {
            neo4j_uri: yaml.neo4j.uri,
            neo4j_user: yaml.neo4j.user,
            neo4j_password: yaml.neo4j.password,
            repository_root: PathBuf::from(yaml.root),
            extraction: yaml.extraction,
            query: yaml.query,
            id_scheme: yaml.identity.scheme,
        }
    }

    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Numeric env var; unparsable values are ignored
fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn neo4j::GraphStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by Neo4j. The connection is opened lazily per operation.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(neo4j::client::Neo4jClient::new(
            &config.neo4j_uri,
            &config.neo4j_user,
            &config.neo4j_password,
        ));
        Self::with_store(store, config)
    }

    pub fn with_store(store: Arc<dyn neo4j::GraphStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
root: /srv/acme
neo4j:
  uri: bolt://db:7687
  user: admin
  password: secret
extraction:
  scan_dirs: [apps, packages]
  internal_namespaces: ["@acme/"]
query:
  timeout_ms: 2500
identity:
  scheme: legacy
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.root, "/srv/acme");
        assert_eq!(config.neo4j.uri, "bolt://db:7687");
        assert_eq!(config.extraction.scan_dirs, vec!["apps", "packages"]);
        assert_eq!(config.extraction.internal_namespaces, vec!["@acme/"]);
        // Unset keys keep their defaults
        assert_eq!(config.extraction.max_file_size, 1024 * 1024);
        assert_eq!(config.query.timeout_ms, 2500);
        assert_eq!(config.query.debug_timeout_ms, 10_000);
        assert_eq!(config.identity.scheme, IdScheme::Legacy);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = Config::default();
        assert_eq!(config.neo4j_uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j_user, "neo4j");
        assert_eq!(config.repository_root, PathBuf::from("."));
        assert_eq!(config.query.timeout_ms, 5_000);
        assert_eq!(config.query.entity_limit, 10);
        assert_eq!(config.id_scheme, IdScheme::Xxhash64);
    }

    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "NEO4J_URI",
                "NEO4J_USER",
                "NEO4J_PASSWORD",
                "DEVGRAPH_ROOT",
                "DEVGRAPH_QUERY_TIMEOUT_MS",
                "DEVGRAPH_DEBUG_TIMEOUT_MS",
                "DEVGRAPH_ID_SCHEME",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
root: /srv/yaml-repo
neo4j:
  uri: bolt://yaml-host:7687
  user: yaml-user
  password: yaml-pass
query:
  timeout_ms: 1234
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.neo4j_uri, "bolt://yaml-host:7687");
        assert_eq!(config.neo4j_user, "yaml-user");
        assert_eq!(config.repository_root, PathBuf::from("/srv/yaml-repo"));
        assert_eq!(config.query.timeout_ms, 1234);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("NEO4J_URI", "bolt://env-host:7687");
        std::env::set_var("DEVGRAPH_ROOT", "/srv/env-repo");
        std::env::set_var("DEVGRAPH_QUERY_TIMEOUT_MS", "900");
        std::env::set_var("DEVGRAPH_DEBUG_TIMEOUT_MS", "soon");
        std::env::set_var("DEVGRAPH_ID_SCHEME", "legacy");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.neo4j_uri, "bolt://env-host:7687");
        assert_eq!(config.repository_root, PathBuf::from("/srv/env-repo"));
        assert_eq!(config.query.timeout_ms, 900);
        // Unparsable override is ignored
        assert_eq!(config.query.debug_timeout_ms, 10_000);
        assert_eq!(config.id_scheme, IdScheme::Legacy);
        // YAML value still used where no env override
        assert_eq!(config.neo4j_user, "yaml-user");

        // --- Phase 3: Unknown id scheme is an error ---
        std::env::set_var("DEVGRAPH_ID_SCHEME", "md5");
        let err = Config::from_yaml_and_env(Some(&file_path)).unwrap_err();
        assert!(err.to_string().contains("unknown id scheme"));

        clear_env();

        // --- Phase 4: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-devgraph-config-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.neo4j_uri, "bolt://localhost:7687");
        assert_eq!(config.query.timeout_ms, 5_000);
    }

    #[test]
    fn test_malformed_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        std::fs::write(&file_path, "neo4j: [not, a, map").unwrap();

        let yaml = Config::load_yaml(Some(&file_path));
        assert_eq!(yaml.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(yaml.root, ".");
    }
}
