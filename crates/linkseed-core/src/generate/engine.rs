use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::classify::names::NamePatterns;
use crate::diagnostics::Diagnostic;
use crate::error::{LinkSeedError, Result};
use crate::generate::consistency::{ConsistencyEnforcer, EnforcementOptions};
use crate::generate::plan::GenerationPlan;
use crate::generate::providers::{FakeValueSource, ValueSource};
use crate::generate::unique::{UniqueAllocator, DEFAULT_MAX_ATTEMPTS};
use crate::graph::topo::GenerationOrder;
use crate::schema::types::{Entity, EntityTable, Schema};

/// Rows per entity when neither the options nor an override say otherwise.
pub const DEFAULT_ROW_COUNT: usize = 10;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Knobs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Default number of rows per entity.
    pub rows: usize,
    /// Per-entity row counts, keyed by entity id.
    pub entity_rows: BTreeMap<String, usize>,
    pub seed: u64,
    pub auto_cardinality: bool,
    pub expand_one_to_many: bool,
    pub patterns: NamePatterns,
    pub max_attempts: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROW_COUNT,
            entity_rows: BTreeMap::new(),
            seed: DEFAULT_SEED,
            auto_cardinality: false,
            expand_one_to_many: false,
            patterns: NamePatterns::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GenerationOptions {
    pub fn row_count(&self, entity_id: &str) -> usize {
        self.entity_rows
            .get(entity_id)
            .copied()
            .unwrap_or(self.rows)
    }
}

/// The result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedData {
    pub order: GenerationOrder,
    /// Entity id to rows, in generation order.
    pub tables: IndexMap<String, EntityTable>,
    /// Every degradation hit while planning and generating.
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedData {
    pub fn table(&self, entity_id: &str) -> Option<&EntityTable> {
        self.tables.get(entity_id)
    }

    /// Like [`GeneratedData::table`], but a missing entity is an error.
    pub fn require_table(&self, entity_id: &str) -> Result<&EntityTable> {
        self.tables
            .get(entity_id)
            .ok_or_else(|| LinkSeedError::UnknownEntity {
                entity: entity_id.to_string(),
            })
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(|t| t.row_count()).sum()
    }
}

/// One generation run over a schema.
///
/// The session owns all mutable state of the run: the seeded RNG, the
/// used-value sets of the unique allocator, the tables built so far and the
/// diagnostics list. Nothing is shared between sessions.
pub struct GenerationSession<'a> {
    schema: &'a Schema,
    options: GenerationOptions,
    rng: StdRng,
    allocator: UniqueAllocator,
    source: Box<dyn ValueSource + 'a>,
}

impl<'a> GenerationSession<'a> {
    pub fn new(schema: &'a Schema, options: GenerationOptions) -> Self {
        Self {
            schema,
            rng: StdRng::seed_from_u64(options.seed),
            allocator: UniqueAllocator::with_max_attempts(options.max_attempts),
            source: Box::new(FakeValueSource::default()),
            options,
        }
    }

    /// Replace the default `fake`-backed value source.
    pub fn with_value_source(mut self, source: impl ValueSource + 'a) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Generate rows for every entity in dependency order.
    ///
    /// Links are enforced right after their "from" entity is generated. A
    /// link whose "to" entity comes later (the reverse half of a suppressed
    /// cycle) is skipped with a diagnostic, so key columns that dependents
    /// already reference are never rewritten. Only a residual dependency
    /// cycle fails the run.
    pub fn generate(mut self) -> Result<GeneratedData> {
        let schema = self.schema;
        let plan = GenerationPlan::build(schema, &self.options.patterns)?;
        let mut diagnostics = plan.diagnostics.clone();
        let mut tables: IndexMap<String, EntityTable> = IndexMap::new();
        let mut expanded: HashSet<String> = HashSet::new();

        let enforcement = EnforcementOptions {
            auto_cardinality: self.options.auto_cardinality,
            expand_one_to_many: self.options.expand_one_to_many,
        };

        for entity_id in &plan.order.entities {
            let Some(entity) = schema.entities.get(entity_id) else {
                continue;
            };
            let table = self.synthesize(entity);
            debug!("Generated {} rows for {}", table.row_count(), entity_id);
            tables.insert(entity_id.clone(), table);

            for planned in plan.links_from(entity_id) {
                let mut enforcer = ConsistencyEnforcer {
                    schema,
                    allocator: &mut self.allocator,
                    rng: &mut self.rng,
                    expanded: &mut expanded,
                    options: enforcement,
                };
                let link_diagnostics =
                    enforcer.enforce(&mut tables, &planned.link, planned.cardinality);
                diagnostics.extend(link_diagnostics);
            }
        }

        diagnostics.extend(self.allocator.take_diagnostics());

        Ok(GeneratedData {
            order: plan.order,
            tables,
            diagnostics,
        })
    }

    /// Initial rows for one entity. Unique cells go through the allocator.
    fn synthesize(&mut self, entity: &Entity) -> EntityTable {
        let count = self.options.row_count(&entity.id);
        let mut table = EntityTable::new(entity.headers());
        table.rows.reserve(count);

        for row_index in 0..count {
            let mut row = Vec::with_capacity(entity.attributes.len());
            for attribute in &entity.attributes {
                let candidate = self
                    .source
                    .value(entity, attribute, row_index, &mut self.rng);
                let value = if attribute.is_unique {
                    self.allocator.allocate(
                        &entity.id,
                        &attribute.external_id,
                        &candidate,
                        &mut self.rng,
                    )
                } else {
                    candidate
                };
                row.push(value);
            }
            table.rows.push(row);
        }

        table
    }
}
