//! # Error Types
//!
//! Defines `LinkSeedError`, the unified error enum for the failure modes that
//! abort a LinkSeed run. Everything else (unresolvable relationship endpoints,
//! cycle-forming edges, missing columns, exhausted unique allocation) degrades
//! gracefully and is reported through [`crate::diagnostics::Diagnostic`]
//! instead of an error.

use thiserror::Error;

/// All errors that can occur in LinkSeed operations.
#[derive(Error, Debug)]
pub enum LinkSeedError {
    #[error("Circular dependency detected involving entities: {entities}\n  No safe generation order exists. Remove one of the relationships between these entities\n  or declare it through a multi-hop path so it is not ordered.")]
    CircularDependency { entities: String },

    #[error("Unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}: {source}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LinkSeedError>;
