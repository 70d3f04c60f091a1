//! Connection manager interface and factory
//!
//! A connection manager opens and caches Cassandra sessions per keyspace.
//! The bootstrap picks the embedded or standalone variant from the
//! configured [`ConnectionMode`].

use async_trait::async_trait;
use learner_core::LearnerResult;
use std::sync::Arc;

use crate::cassandra_client::{EmbeddedConnectionManager, StandaloneConnectionManager};
use crate::config::{CassandraSettings, ConnectionMode};

/// Parameters of a single connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keyspace: String,
}

impl ConnectionRequest {
    /// Request with no endpoint, the manager supplies its own
    pub fn embedded(keyspace: impl Into<String>) -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            keyspace: keyspace.into(),
        }
    }

    /// Request for an explicit `host:port` endpoint
    pub fn endpoint(
        host: impl Into<String>,
        port: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
        keyspace: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port.into()),
            username,
            password,
            keyspace: keyspace.into(),
        }
    }

    /// `host:port` when both are set
    pub fn contact_point(&self) -> Option<String> {
        match (&self.host, &self.port) {
            (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
            _ => None,
        }
    }
}

/// Statistics for connection manager operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub open_sessions: usize,
}

/// Trait defining the interface for connection managers
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Mode this manager serves
    fn mode(&self) -> ConnectionMode;

    /// Open (or reuse) a session for the request's keyspace.
    ///
    /// `Ok(false)` means the endpoint answered but the keyspace could not be
    /// used; `Err` means the endpoint could not be reached at all.
    async fn create_connection(&self, request: &ConnectionRequest) -> LearnerResult<bool>;

    /// Whether a session for `keyspace` is already open
    fn is_connected(&self, keyspace: &str) -> bool;

    /// Get manager statistics
    fn get_stats(&self) -> ConnectionStats;
}

/// Type alias for boxed manager trait object
pub type BoxedConnectionManager = Arc<dyn ConnectionManager>;

/// Create the connection manager serving `mode`
pub fn connection_manager_for(
    mode: ConnectionMode,
    settings: &CassandraSettings,
) -> BoxedConnectionManager {
    match mode {
        ConnectionMode::Embedded => Arc::new(EmbeddedConnectionManager::new(settings.clone())),
        ConnectionMode::Standalone => Arc::new(StandaloneConnectionManager::new(settings.clone())),
    }
}
