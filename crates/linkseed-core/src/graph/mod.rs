//! # Dependency Graph
//!
//! Entity ordering: `dag` builds the acyclic "must-generate-before" graph
//! from resolved relationship links, `topo` linearizes it deterministically.

pub mod dag;
pub mod topo;
