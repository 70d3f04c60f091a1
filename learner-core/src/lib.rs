//! # Learner Core Library
//!
//! Shared types for the learner services' storage and request layers.
//!
//! ## Features
//!
//! - **Registry**: logical dataset names mapped to Cassandra keyspaces and tables
//! - **Search**: normalisation of untyped search payloads into [`SearchQuery`]
//! - **Context**: request-scoped telemetry context for the processing pipeline
//! - **Errors**: the error taxonomy shared by every learner crate

pub mod context;
pub mod error;
pub mod keys;
pub mod registry;
pub mod search;

// Re-export commonly used types
pub use context::{ActorRequest, BoxedUserDirectory, TelemetryContext, UserDirectory};
pub use error::{LearnerError, LearnerResult};
pub use registry::{DatasetLocation, DbRegistry};
pub use search::{normalize, SearchQuery, SearchRequest, WideInt, DEFAULT_LIMIT, MAX_LIMIT};

/// Version information for learner-core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
