//! # Diagnostics
//!
//! Degradations that do not abort a run. Each stage pushes them into the
//! session's list so callers and tests can assert on them directly; every
//! diagnostic is also logged with `tracing::warn` at the point it is raised.

use std::fmt;

use serde::Serialize;

/// Which end of a relationship a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endpoint {
    From,
    To,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::From => write!(f, "from"),
            Endpoint::To => write!(f, "to"),
        }
    }
}

/// Why a graph edge was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuppressionReason {
    /// Both endpoints live on the same entity.
    SelfReference,
    /// The edge would close a cycle, usually the reverse of an existing edge.
    Cycle,
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressionReason::SelfReference => write!(f, "self reference"),
            SuppressionReason::Cycle => write!(f, "would create a cycle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// A relationship endpoint matched neither an alias nor a qualified name.
    UnresolvedEndpoint {
        relationship: String,
        endpoint: Endpoint,
        reference: String,
    },
    /// Multi-hop relationships are neither ordered nor enforced.
    MultiHopSkipped { relationship: String },
    /// A link kept its column-level record but contributed no graph edge.
    EdgeSuppressed {
        relationship: String,
        from_entity: String,
        to_entity: String,
        reason: SuppressionReason,
    },
    /// Enforcement for a link was a no-op because data or a column was missing.
    EnforcementSkipped { relationship: String, reason: String },
    /// A unique dependent column had more rows than distinct target values.
    TargetsExhausted {
        relationship: String,
        targets: usize,
        rows: usize,
    },
    /// The unique allocator hit its attempt ceiling and reused a value.
    UniqueExhausted {
        entity: String,
        attribute: String,
        value: String,
        attempts: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedEndpoint {
                relationship,
                endpoint,
                reference,
            } => write!(
                f,
                "relationship '{}': {} endpoint '{}' does not resolve to an attribute",
                relationship, endpoint, reference
            ),
            Diagnostic::MultiHopSkipped { relationship } => {
                write!(f, "relationship '{}': multi-hop path skipped", relationship)
            }
            Diagnostic::EdgeSuppressed {
                relationship,
                from_entity,
                to_entity,
                reason,
            } => write!(
                f,
                "relationship '{}': edge {} -> {} not ordered ({})",
                relationship, to_entity, from_entity, reason
            ),
            Diagnostic::EnforcementSkipped {
                relationship,
                reason,
            } => write!(f, "relationship '{}': not enforced, {}", relationship, reason),
            Diagnostic::TargetsExhausted {
                relationship,
                targets,
                rows,
            } => write!(
                f,
                "relationship '{}': {} rows but only {} distinct targets, extra rows got fresh values",
                relationship, rows, targets
            ),
            Diagnostic::UniqueExhausted {
                entity,
                attribute,
                value,
                attempts,
            } => write!(
                f,
                "{}.{}: no unused value after {} attempts, reusing '{}'",
                entity, attribute, attempts, value
            ),
        }
    }
}
