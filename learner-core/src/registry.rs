//! Registry of logical datasets and the Cassandra tables backing them

use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::keys;

/// Keyspace holding platform-wide tables
pub const KEY_SPACE_NAME: &str = "sunbird";

/// Keyspace holding course enrolment and consumption tables
pub const COURSE_KEY_SPACE_NAME: &str = "sunbird_courses";

/// Keyspace holding dial code assets
pub const DIALCODE_KEY_SPACE_NAME: &str = "dialcodes";

/// Where a logical dataset lives in Cassandra.
///
/// Two locations are equal when host, port and keyspace match. Table and
/// credentials do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetLocation {
    keyspace: String,
    table: String,
    username: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<String>,
}

impl DatasetLocation {
    /// Create a location with no endpoint or credentials attached
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            username: None,
            password: None,
            host: None,
            port: None,
        }
    }

    /// Attach a specific endpoint
    pub fn with_endpoint(mut self, host: impl Into<String>, port: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self.port = Some(port.into());
        self
    }

    /// Attach credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Fully qualified `keyspace.table` name for CQL statements
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }
}

impl PartialEq for DatasetLocation {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port && self.keyspace == other.keyspace
    }
}

impl Eq for DatasetLocation {}

impl Hash for DatasetLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
        self.keyspace.hash(state);
    }
}

/// Immutable mapping from dataset name to [`DatasetLocation`]
#[derive(Debug, Clone, Default)]
pub struct DbRegistry {
    entries: HashMap<String, DatasetLocation>,
}

impl DbRegistry {
    /// Start building a custom registry
    pub fn builder() -> DbRegistryBuilder {
        DbRegistryBuilder::default()
    }

    /// Registry with every dataset used by the learner services
    pub fn standard() -> Self {
        Self::builder()
            .register(keys::LEARNER_COURSE_DB, COURSE_KEY_SPACE_NAME, "user_courses")
            .register(keys::LEARNER_CONTENT_DB, COURSE_KEY_SPACE_NAME, "content_consumption")
            .register(keys::COURSE_MANAGEMENT_DB, KEY_SPACE_NAME, "course_management")
            .register(keys::PAGE_MGMT_DB, KEY_SPACE_NAME, "page_management")
            .register(keys::PAGE_SECTION_DB, KEY_SPACE_NAME, "page_section")
            .register(keys::SECTION_MGMT_DB, KEY_SPACE_NAME, "page_section")
            .register(keys::ASSESSMENT_EVAL_DB, KEY_SPACE_NAME, "assessment_eval")
            .register(keys::ASSESSMENT_ITEM_DB, KEY_SPACE_NAME, "assessment_item")
            .register(keys::BULK_OP_DB, COURSE_KEY_SPACE_NAME, "bulk_upload_process")
            .register(keys::COURSE_BATCH_DB, COURSE_KEY_SPACE_NAME, "course_batch")
            .register(keys::CLIENT_INFO_DB, KEY_SPACE_NAME, "client_info")
            .register(keys::USER_AUTH_DB, KEY_SPACE_NAME, "user_auth")
            .register(
                keys::CONTENT_BADGE_ASSOCIATION_DB,
                KEY_SPACE_NAME,
                "content_badge_association",
            )
            .register(keys::COURSE_DIALCODES_DB, DIALCODE_KEY_SPACE_NAME, "dialcode_images")
            .build()
    }

    /// Look up a dataset by name
    pub fn get(&self, name: &str) -> Option<&DatasetLocation> {
        self.entries.get(name)
    }

    /// Distinct keyspaces referenced by the registry, sorted
    pub fn keyspaces(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|location| location.keyspace().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetLocation)> {
        self.entries.iter().map(|(name, loc)| (name.as_str(), loc))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`DbRegistry`]; the first registration of a name wins
#[derive(Debug, Default)]
pub struct DbRegistryBuilder {
    entries: HashMap<String, DatasetLocation>,
}

impl DbRegistryBuilder {
    pub fn register(self, name: &str, keyspace: &str, table: &str) -> Self {
        self.register_location(name, DatasetLocation::new(keyspace, table))
    }

    pub fn register_location(mut self, name: &str, location: DatasetLocation) -> Self {
        self.entries.entry(name.to_string()).or_insert(location);
        self
    }

    pub fn build(self) -> DbRegistry {
        DbRegistry {
            entries: self.entries,
        }
    }
}
