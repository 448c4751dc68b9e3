//! # Row Generation
//!
//! A [`engine::GenerationSession`] walks the planned entity order, fills each
//! table through a [`providers::ValueSource`], runs unique cells through the
//! [`unique::UniqueAllocator`] and hands every link to the consistency
//! enforcer once both of its entities exist.

pub mod consistency;
pub mod engine;
pub mod plan;
pub mod providers;
pub mod unique;
