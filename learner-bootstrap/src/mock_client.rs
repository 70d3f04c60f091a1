//! Mock connection manager for unit testing
//!
//! Endpoints are scripted up front: reachable endpoints connect, erroring
//! endpoints raise a connection error and everything else is refused.

use async_trait::async_trait;
use learner_core::{LearnerError, LearnerResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::cassandra::{ConnectionManager, ConnectionRequest, ConnectionStats};
use crate::config::ConnectionMode;

/// Endpoint key used for requests that carry no host/port
pub const EMBEDDED_ENDPOINT: &str = "<embedded>";

#[derive(Debug, Default)]
struct MockState {
    attempts: Vec<ConnectionRequest>,
    sessions: HashMap<String, String>,
    stats: ConnectionStats,
}

/// Mock connection manager for unit testing
pub struct MockConnectionManager {
    mode: ConnectionMode,
    accept_all: bool,
    reachable: HashSet<String>,
    erroring: HashSet<String>,
    state: Mutex<MockState>,
}

impl MockConnectionManager {
    /// Create a mock that refuses every endpoint
    pub fn new(mode: ConnectionMode) -> Self {
        Self {
            mode,
            accept_all: false,
            reachable: HashSet::new(),
            erroring: HashSet::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Accept every endpoint not scripted to error
    pub fn accepting_all(mut self) -> Self {
        self.accept_all = true;
        self
    }

    /// Accept the `host:port` endpoint
    pub fn with_reachable(mut self, endpoint: &str) -> Self {
        self.reachable.insert(endpoint.to_string());
        self
    }

    /// Raise a connection error for the `host:port` endpoint
    pub fn with_erroring(mut self, endpoint: &str) -> Self {
        self.erroring.insert(endpoint.to_string());
        self
    }

    /// Every request seen so far, in order
    pub fn attempts(&self) -> Vec<ConnectionRequest> {
        self.state.lock().attempts.clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.state.lock().attempts.len()
    }

    /// Endpoint that opened the session for `keyspace`
    pub fn connected_endpoint(&self, keyspace: &str) -> Option<String> {
        self.state.lock().sessions.get(keyspace).cloned()
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    fn mode(&self) -> ConnectionMode {
        self.mode
    }

    async fn create_connection(&self, request: &ConnectionRequest) -> LearnerResult<bool> {
        let endpoint = request
            .contact_point()
            .unwrap_or_else(|| EMBEDDED_ENDPOINT.to_string());
        trace!("Mock: connection attempt to {} for {}", endpoint, request.keyspace);

        let mut state = self.state.lock();
        state.attempts.push(request.clone());
        state.stats.attempts += 1;

        if self.erroring.contains(&endpoint) {
            state.stats.failures += 1;
            return Err(LearnerError::connection(format!(
                "Simulated connection error for {}",
                endpoint
            )));
        }

        if self.accept_all || self.reachable.contains(&endpoint) {
            state
                .sessions
                .entry(request.keyspace.clone())
                .or_insert(endpoint);
            state.stats.successes += 1;
            state.stats.open_sessions = state.sessions.len();
            Ok(true)
        } else {
            state.stats.failures += 1;
            Ok(false)
        }
    }

    fn is_connected(&self, keyspace: &str) -> bool {
        self.state.lock().sessions.contains_key(keyspace)
    }

    fn get_stats(&self) -> ConnectionStats {
        self.state.lock().stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes() {
        let manager = MockConnectionManager::new(ConnectionMode::Standalone)
            .with_reachable("10.0.0.1:9042")
            .with_erroring("10.0.0.2:9042");

        let ok = ConnectionRequest::endpoint("10.0.0.1", "9042", None, None, "sunbird");
        let err = ConnectionRequest::endpoint("10.0.0.2", "9042", None, None, "sunbird");
        let refused = ConnectionRequest::endpoint("10.0.0.3", "9042", None, None, "sunbird");

        assert!(manager.create_connection(&ok).await.unwrap());
        assert!(manager.create_connection(&err).await.is_err());
        assert!(!manager.create_connection(&refused).await.unwrap());

        let stats = manager.get_stats();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 2);
        assert_eq!(manager.connected_endpoint("sunbird").as_deref(), Some("10.0.0.1:9042"));
    }

    #[tokio::test]
    async fn test_embedded_requests_use_placeholder_endpoint() {
        let manager =
            MockConnectionManager::new(ConnectionMode::Embedded).with_reachable(EMBEDDED_ENDPOINT);
        assert!(manager
            .create_connection(&ConnectionRequest::embedded("sunbird"))
            .await
            .unwrap());
        assert!(manager.is_connected("sunbird"));
    }
}
