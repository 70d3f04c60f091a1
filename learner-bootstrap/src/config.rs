use anyhow::{Context, Result};
use learner_core::{keys, LearnerError, LearnerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default location of the connection properties file
pub const DEFAULT_CONFIG_PATH: &str = "config/dbconfig.yaml";

/// Contact point of the in-process Cassandra used in embedded mode
pub const DEFAULT_EMBEDDED_CONTACT_POINT: &str = "127.0.0.1:9142";

/// How the services reach Cassandra
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Local Cassandra at a fixed contact point, no endpoints configured
    Embedded,
    /// Remote Cassandra at explicitly configured endpoints
    Standalone,
}

impl ConnectionMode {
    /// Parse the mode property. Blank or missing means embedded.
    pub fn from_property(value: Option<&str>) -> LearnerResult<Self> {
        let value = value.map(str::trim).unwrap_or("");
        if value.is_empty() || value.eq_ignore_ascii_case(keys::EMBEDDED_MODE) {
            Ok(ConnectionMode::Embedded)
        } else if value.eq_ignore_ascii_case(keys::STANDALONE_MODE) {
            Ok(ConnectionMode::Standalone)
        } else {
            Err(LearnerError::configuration(format!(
                "Invalid {}: {}. Valid options: {}, {}",
                keys::SUNBIRD_CASSANDRA_MODE,
                value,
                keys::EMBEDDED_MODE,
                keys::STANDALONE_MODE
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Embedded => keys::EMBEDDED_MODE,
            ConnectionMode::Standalone => keys::STANDALONE_MODE,
        }
    }
}

/// Flat key/value properties loaded once at startup and read-only afterwards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesCache {
    values: BTreeMap<String, String>,
}

impl PropertiesCache {
    /// Parse a flat YAML mapping.
    ///
    /// Scalars are kept as strings and sequences of scalars are joined with
    /// commas, so `db.ip: [a, b]` and `db.ip: "a,b"` are equivalent.
    pub fn from_yaml_str(contents: &str) -> LearnerResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(contents)?;
        let mut values = BTreeMap::new();
        for (key, value) in raw {
            match scalar_to_string(&value) {
                Some(text) => {
                    values.insert(key, text);
                }
                None => match value {
                    serde_yaml::Value::Null => debug!("Property '{}' is empty", key),
                    serde_yaml::Value::Sequence(items) => {
                        let joined: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                        values.insert(key, joined.join(","));
                    }
                    _ => warn!("Ignoring property '{}': nested mappings are not supported", key),
                },
            }
        }
        Ok(Self { values })
    }

    /// Read and parse a properties file
    pub fn from_file(path: impl AsRef<Path>) -> LearnerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of `key` when present and not blank
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Cassandra connection settings shared by every connection manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CassandraSettings {
    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,

    /// Contact point used in embedded mode
    pub embedded_contact_point: String,
}

impl Default for CassandraSettings {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 5000,
            embedded_contact_point: DEFAULT_EMBEDDED_CONTACT_POINT.to_string(),
        }
    }
}

impl CassandraSettings {
    /// Read settings from the properties, falling back to defaults
    pub fn from_properties(properties: &PropertiesCache) -> LearnerResult<Self> {
        let mut settings = Self::default();

        if let Some(timeout) = properties.get_non_blank(keys::DB_CONNECTION_TIMEOUT_MS) {
            settings.connection_timeout_ms = timeout.trim().parse().map_err(|e| {
                LearnerError::configuration(format!(
                    "Invalid {}: {} ({})",
                    keys::DB_CONNECTION_TIMEOUT_MS,
                    timeout,
                    e
                ))
            })?;
        }

        if let Some(contact_point) = properties.get_non_blank(keys::DB_EMBEDDED_CONTACT_POINT) {
            settings.embedded_contact_point = contact_point.trim().to_string();
        }

        Ok(settings)
    }

    /// Get the connection timeout as a Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

/// Configuration for the connection bootstrap
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BootstrapConfig {
    /// Raw connection properties
    pub properties: PropertiesCache,

    /// Typed Cassandra settings derived from the properties
    pub cassandra: CassandraSettings,
}

impl BootstrapConfig {
    /// Load configuration from `CONFIG_PATH`, the default file, or defaults
    pub fn load() -> Result<Self> {
        let config = if let Ok(config_path) = env::var("CONFIG_PATH") {
            Self::load_from_file(&config_path)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            debug!("No properties file found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML properties file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let properties = PropertiesCache::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;

        Self::from_properties(properties)
            .with_context(|| format!("Invalid settings in config file: {}", path.display()))
    }

    pub fn from_properties(properties: PropertiesCache) -> LearnerResult<Self> {
        let cassandra = CassandraSettings::from_properties(&properties)?;
        Ok(Self {
            properties,
            cassandra,
        })
    }

    /// Connection mode named by the properties
    pub fn connection_mode(&self) -> LearnerResult<ConnectionMode> {
        ConnectionMode::from_property(self.properties.get(keys::SUNBIRD_CASSANDRA_MODE))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.connection_mode()?;

        if self.cassandra.connection_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Connection timeout must be greater than 0"));
        }

        if self.cassandra.embedded_contact_point.trim().is_empty() {
            return Err(anyhow::anyhow!("Embedded contact point cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(ConnectionMode::from_property(None).unwrap(), ConnectionMode::Embedded);
        assert_eq!(ConnectionMode::from_property(Some("  ")).unwrap(), ConnectionMode::Embedded);
        assert_eq!(
            ConnectionMode::from_property(Some("EMBEDDED")).unwrap(),
            ConnectionMode::Embedded
        );
        assert_eq!(
            ConnectionMode::from_property(Some("Standalone")).unwrap(),
            ConnectionMode::Standalone
        );
        assert!(ConnectionMode::from_property(Some("cluster")).is_err());
    }

    #[test]
    fn test_properties_from_yaml() {
        let yaml = r#"
sunbird_cassandra_mode: standalone
db.ip: 10.0.0.1,10.0.0.2
db.port: 9042
db.username: [cassandra]
db.password: ~
"#;
        let properties = PropertiesCache::from_yaml_str(yaml).unwrap();
        assert_eq!(properties.get(keys::SUNBIRD_CASSANDRA_MODE), Some("standalone"));
        assert_eq!(properties.get(keys::DB_IP), Some("10.0.0.1,10.0.0.2"));
        assert_eq!(properties.get(keys::DB_PORT), Some("9042"));
        assert_eq!(properties.get(keys::DB_USERNAME), Some("cassandra"));
        assert_eq!(properties.get(keys::DB_PASSWORD), None);
    }

    #[test]
    fn test_sequences_join_with_commas() {
        let properties = PropertiesCache::from_yaml_str("db.ip: [a, b, c]\n").unwrap();
        assert_eq!(properties.get(keys::DB_IP), Some("a,b,c"));
    }

    #[test]
    fn test_missing_properties_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PropertiesCache::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, LearnerError::Io(_)));
        assert!(err.is_retriable());
    }

    #[test]
    fn test_malformed_properties_file_is_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbconfig.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();
        let err = PropertiesCache::from_file(&path).unwrap_err();
        assert!(matches!(err, LearnerError::Yaml(_)));
        assert_eq!(err.category(), "yaml");
    }

    #[test]
    fn test_empty_yaml_is_empty_cache() {
        assert!(PropertiesCache::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let defaults = CassandraSettings::from_properties(&PropertiesCache::default()).unwrap();
        assert_eq!(defaults, CassandraSettings::default());
        assert_eq!(defaults.connection_timeout(), Duration::from_millis(5000));

        let properties = PropertiesCache::from_pairs([
            (keys::DB_CONNECTION_TIMEOUT_MS, "1500"),
            (keys::DB_EMBEDDED_CONTACT_POINT, "localhost:19142"),
        ]);
        let settings = CassandraSettings::from_properties(&properties).unwrap();
        assert_eq!(settings.connection_timeout_ms, 1500);
        assert_eq!(settings.embedded_contact_point, "localhost:19142");
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let properties = PropertiesCache::from_pairs([(keys::DB_CONNECTION_TIMEOUT_MS, "soon")]);
        assert!(CassandraSettings::from_properties(&properties).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_mode() {
        let config = BootstrapConfig::from_properties(PropertiesCache::from_pairs([(
            keys::SUNBIRD_CASSANDRA_MODE,
            "replicated",
        )]))
        .unwrap();
        assert!(config.validate().is_err());
        assert!(BootstrapConfig::default().validate().is_ok());
    }
}
