//! Lineage capture settings.
//!
//! The host engine exposes these as flat dotted keys (`lineage.enable`,
//! `lineage.store.classes`, `sql.id`, ...). The same structure is used when
//! loading from a config file, where the dotted keys become nested tables.

use serde::Deserialize;

use crate::error::LineageError;

/// Top-level lineage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LineageConfig {
    /// Whether lineage is captured at all.
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub runsql: RunSqlSettings,

    /// Query id attached to every edge.
    #[serde(default)]
    pub sql_id: String,

    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub jsonl: JsonLinesSettings,
}

/// Which sinks receive the edges.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Comma-separated sink identifiers.
    #[serde(default)]
    pub classes: String,
}

impl StoreSettings {
    /// Trimmed, non-empty sink identifiers in configured order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.classes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSqlSettings {
    /// When false the hook aborts the query after recording lineage.
    #[serde(default = "default_true")]
    pub enable: bool,
}

impl Default for RunSqlSettings {
    fn default() -> Self {
        Self {
            enable: default_true(),
        }
    }
}

/// Connection settings for the graph database HTTP endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_neo4j_url")]
    pub url: String,

    #[serde(default = "default_neo4j_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            url: default_neo4j_url(),
            username: default_neo4j_username(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonLinesSettings {
    /// File that receives one JSON record per dispatched query.
    #[serde(default = "default_jsonl_path")]
    pub path: String,
}

impl Default for JsonLinesSettings {
    fn default() -> Self {
        Self {
            path: default_jsonl_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_neo4j_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_neo4j_username() -> String {
    "neo4j".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_jsonl_path() -> String {
    "./lineage.jsonl".to_string()
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            enable: false,
            store: StoreSettings::default(),
            runsql: RunSqlSettings::default(),
            sql_id: String::new(),
            neo4j: Neo4jSettings::default(),
            jsonl: JsonLinesSettings::default(),
        }
    }
}

impl LineageConfig {
    /// Build from the host engine's flat session settings.
    ///
    /// Keys may carry a `hive.` prefix. Unknown keys are ignored; string
    /// values are trimmed.
    pub fn from_settings<'a, I>(settings: I) -> Result<Self, LineageError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();

        for (key, value) in settings {
            let key = key.strip_prefix("hive.").unwrap_or(key);
            let value = value.trim();
            match key {
                "lineage.enable" => config.enable = parse_bool(key, value)?,
                "lineage.runsql.enable" => config.runsql.enable = parse_bool(key, value)?,
                "lineage.store.classes" => config.store.classes = value.to_string(),
                "sql.id" => config.sql_id = value.to_string(),
                "lineage.neo4j.url" => config.neo4j.url = value.to_string(),
                "lineage.neo4j.username" => config.neo4j.username = value.to_string(),
                "lineage.neo4j.password" => config.neo4j.password = value.to_string(),
                "lineage.neo4j.timeout_secs" => {
                    config.neo4j.timeout_secs = value.parse().map_err(|_| {
                        LineageError::Config(format!("{key}: expected seconds, got {value:?}"))
                    })?
                }
                "lineage.jsonl.path" => config.jsonl.path = value.to_string(),
                _ => {}
            }
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, LineageError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LineageError::Config(format!(
            "{key}: expected true or false, got {value:?}"
        ))),
    }
}
