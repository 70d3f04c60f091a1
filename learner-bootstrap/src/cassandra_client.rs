//! Cassandra connection managers using the ScyllaDB Rust driver
//!
//! Both managers keep one session per keyspace. A keyspace that is already
//! connected is reported as connected without opening another session.

use async_trait::async_trait;
use learner_core::{LearnerError, LearnerResult};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};

// ScyllaDB Rust driver imports
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;

use crate::cassandra::{ConnectionManager, ConnectionRequest, ConnectionStats};
use crate::config::{CassandraSettings, ConnectionMode};

/// Internal statistics tracking
#[derive(Default)]
struct PoolStats {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Sessions keyed by keyspace
struct SessionPool {
    settings: Arc<CassandraSettings>,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    stats: PoolStats,
}

impl SessionPool {
    fn new(settings: CassandraSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            sessions: RwLock::new(HashMap::new()),
            stats: PoolStats::default(),
        }
    }

    async fn connect(
        &self,
        contact_point: &str,
        username: Option<&str>,
        password: Option<&str>,
        keyspace: &str,
    ) -> LearnerResult<bool> {
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        if self.sessions.read().contains_key(keyspace) {
            debug!("Reusing open session for keyspace {}", keyspace);
            self.stats.successes.fetch_add(1, Ordering::Relaxed);
            return Ok(true);
        }

        debug!(
            "Opening ScyllaDB session to {} for keyspace {}",
            contact_point, keyspace
        );

        let mut session_builder = SessionBuilder::new()
            .known_node(contact_point)
            .connection_timeout(self.settings.connection_timeout());

        // Add authentication if configured
        if let (Some(username), Some(password)) = (username, password) {
            session_builder = session_builder.user(username, password);
        }

        let session = session_builder.build().await.map_err(|e| {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            LearnerError::connection(format!(
                "Failed to create ScyllaDB session to {}: {}",
                contact_point, e
            ))
        })?;

        if let Err(e) = session.use_keyspace(keyspace, false).await {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Connected to {} but keyspace {} is unusable: {}",
                contact_point, keyspace, e
            );
            return Ok(false);
        }

        self.sessions
            .write()
            .entry(keyspace.to_string())
            .or_insert_with(|| Arc::new(session));
        self.stats.successes.fetch_add(1, Ordering::Relaxed);

        info!("ScyllaDB session established to {} for keyspace {}", contact_point, keyspace);
        Ok(true)
    }

    fn session(&self, keyspace: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(keyspace).cloned()
    }

    fn is_connected(&self, keyspace: &str) -> bool {
        self.sessions.read().contains_key(keyspace)
    }

    fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            attempts: self.stats.attempts.load(Ordering::Relaxed),
            successes: self.stats.successes.load(Ordering::Relaxed),
            failures: self.stats.failures.load(Ordering::Relaxed),
            open_sessions: self.sessions.read().len(),
        }
    }
}

/// Manager for remote clusters reached at explicit endpoints
pub struct StandaloneConnectionManager {
    pool: SessionPool,
}

impl StandaloneConnectionManager {
    pub fn new(settings: CassandraSettings) -> Self {
        Self {
            pool: SessionPool::new(settings),
        }
    }

    /// Open session for `keyspace`, if any
    pub fn session(&self, keyspace: &str) -> Option<Arc<Session>> {
        self.pool.session(keyspace)
    }
}

#[async_trait]
impl ConnectionManager for StandaloneConnectionManager {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Standalone
    }

    async fn create_connection(&self, request: &ConnectionRequest) -> LearnerResult<bool> {
        let contact_point = request.contact_point().ok_or_else(|| {
            LearnerError::configuration("Standalone connections need both host and port")
        })?;

        self.pool
            .connect(
                &contact_point,
                request.username.as_deref(),
                request.password.as_deref(),
                &request.keyspace,
            )
            .await
    }

    fn is_connected(&self, keyspace: &str) -> bool {
        self.pool.is_connected(keyspace)
    }

    fn get_stats(&self) -> ConnectionStats {
        self.pool.stats()
    }
}

/// Manager for the local Cassandra instance used in development
pub struct EmbeddedConnectionManager {
    pool: SessionPool,
}

impl EmbeddedConnectionManager {
    pub fn new(settings: CassandraSettings) -> Self {
        Self {
            pool: SessionPool::new(settings),
        }
    }

    pub fn contact_point(&self) -> &str {
        &self.pool.settings.embedded_contact_point
    }

    /// Open session for `keyspace`, if any
    pub fn session(&self, keyspace: &str) -> Option<Arc<Session>> {
        self.pool.session(keyspace)
    }
}

#[async_trait]
impl ConnectionManager for EmbeddedConnectionManager {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Embedded
    }

    async fn create_connection(&self, request: &ConnectionRequest) -> LearnerResult<bool> {
        if request.host.is_some() {
            debug!("Embedded mode ignores the requested endpoint");
        }
        let contact_point = self.contact_point().to_string();
        self.pool
            .connect(&contact_point, None, None, &request.keyspace)
            .await
    }

    fn is_connected(&self, keyspace: &str) -> bool {
        self.pool.is_connected(keyspace)
    }

    fn get_stats(&self) -> ConnectionStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_standalone_requires_endpoint() {
        let manager = StandaloneConnectionManager::new(CassandraSettings::default());
        let result = manager
            .create_connection(&ConnectionRequest::embedded("sunbird"))
            .await;
        assert!(matches!(result, Err(LearnerError::Configuration(_))));
        assert_eq!(manager.get_stats().attempts, 0);
    }

    #[test]
    fn test_embedded_uses_configured_contact_point() {
        let settings = CassandraSettings {
            embedded_contact_point: "localhost:19142".to_string(),
            ..CassandraSettings::default()
        };
        let manager = EmbeddedConnectionManager::new(settings);
        assert_eq!(manager.contact_point(), "localhost:19142");
        assert!(manager.session("sunbird").is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Cassandra
    async fn test_standalone_connects_to_local_node() {
        let manager = StandaloneConnectionManager::new(CassandraSettings::default());
        let request = ConnectionRequest::endpoint("127.0.0.1", "9042", None, None, "system");
        assert!(manager.create_connection(&request).await.unwrap());
        assert!(manager.is_connected("system"));
        assert!(manager.create_connection(&request).await.unwrap());
        assert_eq!(manager.get_stats().open_sessions, 1);
    }
}
