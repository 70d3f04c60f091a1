//! Connection bootstrap
//!
//! Resolves Cassandra endpoints for a keyspace and asks the connection
//! manager for the configured mode to connect to each of them.
//!
//! In standalone mode, endpoints declared through environment variables take
//! precedence over the properties file. Declared environment endpoints must
//! work: if none of them connects the check fails with
//! [`LearnerError::InvalidConfiguration`] and the file is not consulted. The
//! file is a best-effort fallback used only when the environment declares
//! no endpoints.

use learner_core::{keys, LearnerError, LearnerResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cassandra::{connection_manager_for, BoxedConnectionManager, ConnectionRequest};
use crate::config::{BootstrapConfig, ConnectionMode, PropertiesCache};

/// Source of environment variables
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Endpoints and credentials resolved from one configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub hosts: Vec<String>,
    pub ports: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EndpointConfig {
    /// Resolve from environment variables; `None` when hosts or ports are blank
    pub fn from_env(env: &dyn EnvSource) -> Option<Self> {
        Self::resolve(
            env.var(keys::SUNBIRD_CASSANDRA_HOST).as_deref(),
            env.var(keys::SUNBIRD_CASSANDRA_PORT).as_deref(),
            env.var(keys::SUNBIRD_CASSANDRA_USERNAME),
            env.var(keys::SUNBIRD_CASSANDRA_PASSWORD),
        )
    }

    /// Resolve from the properties file; `None` when hosts or ports are blank
    pub fn from_properties(properties: &PropertiesCache) -> Option<Self> {
        Self::resolve(
            properties.get(keys::DB_IP),
            properties.get(keys::DB_PORT),
            properties.get(keys::DB_USERNAME).map(str::to_string),
            properties.get(keys::DB_PASSWORD).map(str::to_string),
        )
    }

    fn resolve(
        hosts: Option<&str>,
        ports: Option<&str>,
        username: Option<String>,
        password: Option<String>,
    ) -> Option<Self> {
        let hosts = split_list(hosts?);
        let ports = split_list(ports?);
        if hosts.is_empty() || ports.is_empty() {
            return None;
        }
        Some(Self {
            hosts,
            ports,
            username: username.filter(|v| !v.trim().is_empty()),
            password: password.filter(|v| !v.trim().is_empty()),
        })
    }

    /// Index-aligned `(host, port)` pairs, up to the shorter of the two lists
    pub fn endpoints(&self) -> Vec<(&str, &str)> {
        if self.hosts.len() != self.ports.len() {
            warn!(
                "Host list has {} entries but port list has {}; extra entries are ignored",
                self.hosts.len(),
                self.ports.len()
            );
        }
        self.hosts
            .iter()
            .zip(&self.ports)
            .map(|(h, p)| (h.as_str(), p.as_str()))
            .collect()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Where the endpoints of a connection check came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    Embedded,
    Environment,
    PropertiesFile,
    /// No connection was attempted
    Skipped,
}

/// Result of one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Connected,
    Refused,
    /// The manager raised an error; `category` is [`LearnerError::category`]
    Failed {
        category: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAttempt {
    /// `host:port`, or `None` in embedded mode
    pub contact_point: Option<String>,
    pub outcome: AttemptOutcome,
}

/// Summary of a connection check for one keyspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub keyspace: String,
    pub source: ConnectionSource,
    pub attempts: Vec<EndpointAttempt>,
}

impl ConnectionReport {
    fn skipped(keyspace: &str) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            source: ConnectionSource::Skipped,
            attempts: Vec::new(),
        }
    }

    pub fn successes(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == AttemptOutcome::Connected)
            .count()
    }

    pub fn succeeded(&self) -> bool {
        self.successes() > 0
    }
}

/// Resolves endpoints and establishes Cassandra connections per keyspace
pub struct ConnectionBootstrap {
    config: Arc<BootstrapConfig>,
    embedded: BoxedConnectionManager,
    standalone: BoxedConnectionManager,
    env: Arc<dyn EnvSource>,
}

impl ConnectionBootstrap {
    /// Bootstrap using the driver-backed managers and the process environment
    pub fn new(config: Arc<BootstrapConfig>) -> Self {
        let embedded = connection_manager_for(ConnectionMode::Embedded, &config.cassandra);
        let standalone = connection_manager_for(ConnectionMode::Standalone, &config.cassandra);
        Self::with_managers(config, embedded, standalone)
    }

    pub fn with_managers(
        config: Arc<BootstrapConfig>,
        embedded: BoxedConnectionManager,
        standalone: BoxedConnectionManager,
    ) -> Self {
        Self {
            config,
            embedded,
            standalone,
            env: Arc::new(SystemEnv),
        }
    }

    /// Replace the environment lookup
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Manager serving `mode`
    pub fn manager(&self, mode: ConnectionMode) -> &BoxedConnectionManager {
        match mode {
            ConnectionMode::Embedded => &self.embedded,
            ConnectionMode::Standalone => &self.standalone,
        }
    }

    /// Check (and open) the connection for `keyspace`.
    ///
    /// Fails only when environment endpoints are declared and none connects.
    pub async fn ensure_connection(&self, keyspace: &str) -> LearnerResult<ConnectionReport> {
        let mode = match self.config.connection_mode() {
            Ok(mode) => mode,
            Err(e) => {
                warn!("Skipping connection check for keyspace {}: {}", keyspace, e);
                return Ok(ConnectionReport::skipped(keyspace));
            }
        };

        match mode {
            ConnectionMode::Embedded => Ok(self.connect_embedded(keyspace).await),
            ConnectionMode::Standalone => {
                if let Some(report) = self.connect_from_env(keyspace).await? {
                    info!("Database connection for keyspace {} created from environment", keyspace);
                    return Ok(report);
                }
                Ok(self.connect_from_properties(keyspace).await)
            }
        }
    }

    /// Run [`ensure_connection`](Self::ensure_connection) for each keyspace,
    /// stopping at the first fatal error
    pub async fn ensure_all<S: AsRef<str>>(
        &self,
        keyspaces: &[S],
    ) -> LearnerResult<Vec<ConnectionReport>> {
        let mut reports = Vec::with_capacity(keyspaces.len());
        for keyspace in keyspaces {
            reports.push(self.ensure_connection(keyspace.as_ref()).await?);
        }
        Ok(reports)
    }

    async fn connect_embedded(&self, keyspace: &str) -> ConnectionReport {
        let request = ConnectionRequest::embedded(keyspace);
        let outcome = attempt(&self.embedded, &request).await;
        ConnectionReport {
            keyspace: keyspace.to_string(),
            source: ConnectionSource::Embedded,
            attempts: vec![EndpointAttempt {
                contact_point: None,
                outcome,
            }],
        }
    }

    async fn connect_from_env(&self, keyspace: &str) -> LearnerResult<Option<ConnectionReport>> {
        let Some(endpoints) = EndpointConfig::from_env(self.env.as_ref()) else {
            info!("Cassandra endpoints are not set in the environment, using properties file");
            return Ok(None);
        };

        let report = self
            .connect_endpoints(keyspace, &endpoints, ConnectionSource::Environment)
            .await;
        if !report.succeeded() {
            error!(
                "None of the {} environment endpoints connected for keyspace {}",
                report.attempts.len(),
                keyspace
            );
            return Err(LearnerError::invalid_configuration(format!(
                "no Cassandra endpoint from {} / {} could be connected for keyspace {}",
                keys::SUNBIRD_CASSANDRA_HOST,
                keys::SUNBIRD_CASSANDRA_PORT,
                keyspace
            )));
        }
        Ok(Some(report))
    }

    async fn connect_from_properties(&self, keyspace: &str) -> ConnectionReport {
        match EndpointConfig::from_properties(&self.config.properties) {
            Some(endpoints) => {
                self.connect_endpoints(keyspace, &endpoints, ConnectionSource::PropertiesFile)
                    .await
            }
            None => {
                warn!(
                    "No Cassandra endpoints in properties ({} / {}), keyspace {} not connected",
                    keys::DB_IP,
                    keys::DB_PORT,
                    keyspace
                );
                ConnectionReport {
                    keyspace: keyspace.to_string(),
                    source: ConnectionSource::PropertiesFile,
                    attempts: Vec::new(),
                }
            }
        }
    }

    async fn connect_endpoints(
        &self,
        keyspace: &str,
        endpoints: &EndpointConfig,
        source: ConnectionSource,
    ) -> ConnectionReport {
        let mut attempts = Vec::new();
        for (host, port) in endpoints.endpoints() {
            let request = ConnectionRequest::endpoint(
                host,
                port,
                endpoints.username.clone(),
                endpoints.password.clone(),
                keyspace,
            );
            let outcome = attempt(&self.standalone, &request).await;
            attempts.push(EndpointAttempt {
                contact_point: request.contact_point(),
                outcome,
            });
        }
        ConnectionReport {
            keyspace: keyspace.to_string(),
            source,
            attempts,
        }
    }
}

/// One connection attempt; errors are logged, never propagated
async fn attempt(manager: &BoxedConnectionManager, request: &ConnectionRequest) -> AttemptOutcome {
    let endpoint = request
        .contact_point()
        .unwrap_or_else(|| "embedded".to_string());

    match manager.create_connection(request).await {
        Ok(true) => {
            info!(
                "Connection created successfully for {} : keyspace {}",
                endpoint, request.keyspace
            );
            AttemptOutcome::Connected
        }
        Ok(false) => {
            warn!(
                "Connection creation failed for {} : keyspace {}",
                endpoint, request.keyspace
            );
            AttemptOutcome::Refused
        }
        Err(e) => {
            warn!(
                category = e.category(),
                retriable = e.is_retriable(),
                "Connection attempt to {} for keyspace {} failed: {}",
                endpoint,
                request.keyspace,
                e
            );
            AttemptOutcome::Failed {
                category: e.category(),
                message: e.to_string(),
            }
        }
    }
}
