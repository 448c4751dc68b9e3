use std::fmt;

use serde::Serialize;

use crate::classify::names::NamePatterns;
use crate::resolve::RelationshipLink;

/// Multiplicity of a resolved link, read from the "from" side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    OneToOne,
    /// One "from" value is referenced by many "to" rows.
    OneToMany,
    /// Many "from" rows share one "to" value.
    ManyToOne,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "1:1"),
            Cardinality::OneToMany => write!(f, "1:N"),
            Cardinality::ManyToOne => write!(f, "N:1"),
        }
    }
}

/// Classify a link.
///
/// Declared uniqueness decides whenever exactly one side is unique. Only when
/// both or neither side is unique do attribute names get a say: a collection-
/// style "from" name means 1:N, a collection-style "to" name means N:1.
pub fn classify_link(link: &RelationshipLink, patterns: &NamePatterns) -> Cardinality {
    classify(
        link.from.is_unique,
        &link.from.attribute,
        link.to.is_unique,
        &link.to.attribute,
        patterns,
    )
}

pub fn classify(
    from_unique: bool,
    from_name: &str,
    to_unique: bool,
    to_name: &str,
    patterns: &NamePatterns,
) -> Cardinality {
    match (from_unique, to_unique) {
        (true, false) => Cardinality::OneToMany,
        (false, true) => Cardinality::ManyToOne,
        _ => {
            if patterns.is_collection_name(from_name) {
                Cardinality::OneToMany
            } else if patterns.is_collection_name(to_name) {
                Cardinality::ManyToOne
            } else {
                Cardinality::OneToOne
            }
        }
    }
}
