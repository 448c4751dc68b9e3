pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod graph;
pub mod resolve;
pub mod schema;
pub mod validate;

// Re-export key types for convenience
pub use diagnostics::Diagnostic;
pub use error::{LinkSeedError, Result};
pub use generate::engine::{GeneratedData, GenerationOptions, GenerationSession};
pub use schema::types::{Attribute, Entity, EntityTable, Relationship, Schema};
pub use validate::{validate_dataset, ValidationReport};
