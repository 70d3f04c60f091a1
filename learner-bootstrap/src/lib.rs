//! Learner Bootstrap Library
//!
//! Loads connection properties, selects a connection manager for the
//! configured mode and establishes Cassandra connections per keyspace.

pub mod bootstrap;
pub mod cassandra;
pub mod cassandra_client;
pub mod config;
pub mod mock_client;

// Re-export commonly used types
pub use bootstrap::{
    ConnectionBootstrap, ConnectionReport, ConnectionSource, EndpointConfig, EnvSource,
};
pub use cassandra::{BoxedConnectionManager, ConnectionManager, ConnectionRequest};
pub use config::{BootstrapConfig, CassandraSettings, ConnectionMode, PropertiesCache};
