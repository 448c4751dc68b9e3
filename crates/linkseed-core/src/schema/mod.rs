//! # Schema Model
//!
//! The in-memory entity/relationship model handed to LinkSeed by a schema
//! loader, plus the per-entity row table the generator fills in.

pub mod types;
