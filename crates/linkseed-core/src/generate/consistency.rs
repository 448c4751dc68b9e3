//! # Consistency Enforcement
//!
//! After both ends of a link have rows, rewrites the reference column so that
//! every reference resolves under the link's cardinality:
//!
//! - **1:1**: each dependent row gets its own target value (or a random one
//!   when the dependent column is not unique).
//! - **N:1**: dependent rows are split into contiguous clusters that share
//!   one target value each.
//! - **1:N**: the "to" rows are spread evenly over the "from" values, after
//!   optionally replicating the "from" rows.
//!
//! Missing tables or columns make the call a no-op; the reason comes back as
//! a [`Diagnostic`] and the data is left untouched.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::classify::cardinality::Cardinality;
use crate::diagnostics::Diagnostic;
use crate::generate::unique::UniqueAllocator;
use crate::resolve::{AttributeRef, RelationshipLink};
use crate::schema::types::{EntityTable, Schema};

/// Knobs that change how links are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnforcementOptions {
    /// Use 2–3 clusters for N:1 links so grouping is visibly skewed.
    pub auto_cardinality: bool,
    /// Replicate each "one" row 1–3 times before spreading 1:N references.
    pub expand_one_to_many: bool,
}

/// Rewrites reference columns for one generation session.
pub struct ConsistencyEnforcer<'a> {
    pub schema: &'a Schema,
    pub allocator: &'a mut UniqueAllocator,
    pub rng: &'a mut StdRng,
    /// Entities whose rows were already replicated in this session.
    pub expanded: &'a mut HashSet<String>,
    pub options: EnforcementOptions,
}

/// Column positions of a link, looked up by exact header.
struct LinkColumns {
    from_col: usize,
    to_col: usize,
}

impl ConsistencyEnforcer<'_> {
    /// Enforce one link. Returns the degradations it ran into, if any.
    pub fn enforce(
        &mut self,
        tables: &mut IndexMap<String, EntityTable>,
        link: &RelationshipLink,
        cardinality: Cardinality,
    ) -> Vec<Diagnostic> {
        let columns = match locate_columns(tables, link) {
            Ok(columns) => columns,
            Err(reason) => return vec![skipped(link, reason)],
        };

        debug!(
            "Enforcing {} link '{}': {}.{} -> {}.{}",
            cardinality,
            link.relationship,
            link.from.entity,
            link.from.attribute,
            link.to.entity,
            link.to.attribute
        );

        match cardinality {
            Cardinality::OneToOne => self.one_to_one(tables, link, &columns),
            Cardinality::ManyToOne => self.many_to_one(tables, link, &columns),
            Cardinality::OneToMany => self.one_to_many(tables, link, &columns),
        }
    }

    fn one_to_one(
        &mut self,
        tables: &mut IndexMap<String, EntityTable>,
        link: &RelationshipLink,
        columns: &LinkColumns,
    ) -> Vec<Diagnostic> {
        let targets = distinct_values(&tables[link.to.entity.as_str()], columns.to_col);
        if targets.is_empty() {
            return vec![skipped(link, no_values(&link.to))];
        }

        let Some(from_table) = tables.get_mut(&link.from.entity) else {
            return Vec::new();
        };

        if link.from.is_unique {
            return self.assign_distinct(link, &link.from, from_table, columns.from_col, &targets);
        }

        for row in &mut from_table.rows {
            let pick = self.rng.random_range(0..targets.len());
            set_cell(row, columns.from_col, &targets[pick]);
        }
        Vec::new()
    }

    fn many_to_one(
        &mut self,
        tables: &mut IndexMap<String, EntityTable>,
        link: &RelationshipLink,
        columns: &LinkColumns,
    ) -> Vec<Diagnostic> {
        let mut targets = distinct_values(&tables[link.to.entity.as_str()], columns.to_col);
        if targets.is_empty() {
            return vec![skipped(link, no_values(&link.to))];
        }

        let Some(from_table) = tables.get_mut(&link.from.entity) else {
            return Vec::new();
        };

        // Shared values would collide in a unique column; fall back to one each.
        if link.from.is_unique {
            return self.assign_distinct(link, &link.from, from_table, columns.from_col, &targets);
        }

        let rows = from_table.rows.len();
        if rows == 0 {
            return Vec::new();
        }

        let mut clusters = targets.len().min(rows);
        if self.options.auto_cardinality {
            clusters = clusters.min(self.rng.random_range(2..=3));
        }
        targets.shuffle(self.rng);
        let cluster_size = rows / clusters;

        for (i, row) in from_table.rows.iter_mut().enumerate() {
            // The last cluster absorbs the remainder.
            let cluster = (i / cluster_size).min(clusters - 1);
            set_cell(row, columns.from_col, &targets[cluster]);
        }
        Vec::new()
    }

    fn one_to_many(
        &mut self,
        tables: &mut IndexMap<String, EntityTable>,
        link: &RelationshipLink,
        columns: &LinkColumns,
    ) -> Vec<Diagnostic> {
        // Each entity is expanded at most once, however many 1:N links it drives.
        if self.options.expand_one_to_many && !self.expanded.contains(&link.from.entity) {
            if let Some(from_table) = tables.get_mut(&link.from.entity) {
                self.expand_rows(&link.from.entity, from_table);
                self.expanded.insert(link.from.entity.clone());
            }
        }

        let sources = distinct_values(&tables[link.from.entity.as_str()], columns.from_col);
        if sources.is_empty() {
            return vec![skipped(link, no_values(&link.from))];
        }

        let Some(to_table) = tables.get_mut(&link.to.entity) else {
            return Vec::new();
        };

        if link.to.is_unique {
            return self.assign_distinct(link, &link.to, to_table, columns.to_col, &sources);
        }

        for (j, row) in to_table.rows.iter_mut().enumerate() {
            set_cell(row, columns.to_col, &sources[j % sources.len()]);
        }
        Vec::new()
    }

    /// Clone every row 1–3 times. Clones get fresh values in every unique
    /// column so they never collide with the original.
    fn expand_rows(&mut self, entity_id: &str, table: &mut EntityTable) {
        let Some(entity) = self.schema.entities.get(entity_id) else {
            return;
        };
        let unique: Vec<(usize, String)> = entity
            .unique_columns()
            .map(|(col, attr)| (col, attr.external_id.clone()))
            .collect();

        let originals = table.rows.clone();
        for row in &originals {
            for (col, attribute) in &unique {
                if let Some(value) = row.get(*col) {
                    self.allocator.claim(entity_id, attribute, value);
                }
            }
        }

        for row in &originals {
            let copies = self.rng.random_range(1..=3);
            for _ in 0..copies {
                let mut clone = row.clone();
                for (col, attribute) in &unique {
                    let candidate = row.get(*col).map(String::as_str).unwrap_or_default();
                    let fresh = self
                        .allocator
                        .allocate(entity_id, attribute, candidate, self.rng);
                    set_cell(&mut clone, *col, &fresh);
                }
                table.rows.push(clone);
            }
        }

        debug!(
            "Expanded {} from {} to {} rows",
            entity_id,
            originals.len(),
            table.rows.len()
        );
    }

    /// Row `i` gets `values[i]`; rows beyond the available values get fresh
    /// unique values derived from the wrapped-around candidate.
    fn assign_distinct(
        &mut self,
        link: &RelationshipLink,
        column_owner: &AttributeRef,
        table: &mut EntityTable,
        col: usize,
        values: &[String],
    ) -> Vec<Diagnostic> {
        let rows = table.rows.len();

        for (i, row) in table.rows.iter_mut().enumerate() {
            let value = if i < values.len() {
                self.allocator
                    .claim(&column_owner.entity, &column_owner.attribute, &values[i]);
                values[i].clone()
            } else {
                self.allocator.allocate(
                    &column_owner.entity,
                    &column_owner.attribute,
                    &values[i % values.len()],
                    self.rng,
                )
            };
            set_cell(row, col, &value);
        }

        if rows > values.len() {
            warn!(
                "Relationship '{}': {} rows but {} distinct targets",
                link.relationship,
                rows,
                values.len()
            );
            return vec![Diagnostic::TargetsExhausted {
                relationship: link.relationship.clone(),
                targets: values.len(),
                rows,
            }];
        }
        Vec::new()
    }
}

fn locate_columns(
    tables: &IndexMap<String, EntityTable>,
    link: &RelationshipLink,
) -> std::result::Result<LinkColumns, String> {
    let from_table = tables
        .get(&link.from.entity)
        .ok_or_else(|| format!("entity '{}' has no generated rows", link.from.entity))?;
    let to_table = tables
        .get(&link.to.entity)
        .ok_or_else(|| format!("entity '{}' has no generated rows", link.to.entity))?;

    let from_col = from_table.column(&link.from.attribute).ok_or_else(|| {
        format!(
            "column '{}' not found in '{}'",
            link.from.attribute, link.from.entity
        )
    })?;
    let to_col = to_table.column(&link.to.attribute).ok_or_else(|| {
        format!(
            "column '{}' not found in '{}'",
            link.to.attribute, link.to.entity
        )
    })?;

    Ok(LinkColumns { from_col, to_col })
}

fn skipped(link: &RelationshipLink, reason: String) -> Diagnostic {
    warn!("Skipping relationship '{}': {}", link.relationship, reason);
    Diagnostic::EnforcementSkipped {
        relationship: link.relationship.clone(),
        reason,
    }
}

fn no_values(side: &AttributeRef) -> String {
    format!("'{}.{}' has no values", side.entity, side.attribute)
}

/// Non-empty values of a column, first occurrence order, duplicates removed.
fn distinct_values(table: &EntityTable, col: usize) -> Vec<String> {
    table
        .non_empty_values(col)
        .into_iter()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn set_cell(row: &mut [String], col: usize, value: &str) {
    if let Some(cell) = row.get_mut(col) {
        value.clone_into(cell);
    }
}
