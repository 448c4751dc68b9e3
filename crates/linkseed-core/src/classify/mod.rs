//! # Relationship Classification
//!
//! Column-name conventions (`names`) and the cardinality decision built on
//! top of them (`cardinality`).

pub mod cardinality;
pub mod names;
