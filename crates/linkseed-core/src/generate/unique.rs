use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use rand::Rng;
use tracing::warn;

use crate::classify::names::is_identifier_like;
use crate::diagnostics::Diagnostic;
use crate::schema::types::{EntityTable, Schema};

/// Default ceiling on `_N` suffix attempts per allocation.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Issues collision-free values for unique attributes.
///
/// Every value handed out (or claimed) is remembered per `(entity, attribute)`
/// for the lifetime of the allocator, so one allocator is one session.
pub struct UniqueAllocator {
    /// Map from `entity:attribute` to the set of issued values.
    used: HashMap<String, HashSet<String>>,
    /// Maximum suffix attempts before giving up.
    pub max_attempts: usize,
    exhausted: Vec<Diagnostic>,
}

impl UniqueAllocator {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            used: HashMap::new(),
            max_attempts,
            exhausted: Vec::new(),
        }
    }

    /// Rebuild the used-value sets from materialized tables, e.g. rows loaded
    /// back from storage, so further allocation cannot collide with them.
    pub fn from_tables(schema: &Schema, tables: &IndexMap<String, EntityTable>) -> Self {
        let mut allocator = Self::new();
        for (entity_id, table) in tables {
            let Some(entity) = schema.entities.get(entity_id) else {
                continue;
            };
            for (_, attribute) in entity.unique_columns() {
                let Some(col) = table.column(&attribute.external_id) else {
                    continue;
                };
                for value in table.non_empty_values(col) {
                    allocator.claim(entity_id, &attribute.external_id, &value);
                }
            }
        }
        allocator
    }

    /// Return a value never issued before for `(entity, attribute)` and record it.
    ///
    /// Identifier-like attribute names get a fresh opaque token. Otherwise the
    /// candidate is returned as-is when unused, or with a `_N` suffix (replacing
    /// any existing numeric suffix) counting up from 0. After `max_attempts`
    /// suffixes the last attempt is returned anyway and a
    /// [`Diagnostic::UniqueExhausted`] is recorded.
    pub fn allocate(
        &mut self,
        entity: &str,
        attribute: &str,
        candidate: &str,
        rng: &mut impl Rng,
    ) -> String {
        let seen = self.used.entry(used_key(entity, attribute)).or_default();

        if is_identifier_like(attribute) {
            loop {
                let token = opaque_token(rng);
                if seen.insert(token.clone()) {
                    return token;
                }
            }
        }

        if seen.insert(candidate.to_string()) {
            return candidate.to_string();
        }

        let base = strip_numeric_suffix(candidate);
        let mut attempt = candidate.to_string();
        for n in 0..self.max_attempts {
            attempt = format!("{}_{}", base, n);
            if seen.insert(attempt.clone()) {
                return attempt;
            }
        }

        warn!(
            "Unique values exhausted for {}.{} after {} attempts, reusing '{}'",
            entity, attribute, self.max_attempts, attempt
        );
        self.exhausted.push(Diagnostic::UniqueExhausted {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
            value: attempt.clone(),
            attempts: self.max_attempts,
        });
        attempt
    }

    /// Record an externally chosen value. Returns false if it was already used.
    pub fn claim(&mut self, entity: &str, attribute: &str, value: &str) -> bool {
        self.used
            .entry(used_key(entity, attribute))
            .or_default()
            .insert(value.to_string())
    }

    pub fn is_used(&self, entity: &str, attribute: &str, value: &str) -> bool {
        self.used
            .get(&used_key(entity, attribute))
            .is_some_and(|s| s.contains(value))
    }

    /// Number of values issued for an attribute.
    pub fn count(&self, entity: &str, attribute: &str) -> usize {
        self.used
            .get(&used_key(entity, attribute))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Drain the exhaustion diagnostics recorded so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.exhausted)
    }
}

impl Default for UniqueAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A random UUID drawn from the session RNG, so seeded runs repeat.
pub fn opaque_token(rng: &mut impl Rng) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

fn used_key(entity: &str, attribute: &str) -> String {
    format!("{}:{}", entity, attribute)
}

/// `"name_12"` → `"name"`; anything without a trailing `_<digits>` is unchanged.
fn strip_numeric_suffix(value: &str) -> &str {
    match value.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Attribute, Entity};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_repeated_candidate_gets_suffix() {
        let mut allocator = UniqueAllocator::new();
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(allocator.allocate("user", "email", "a@x.com", &mut rng), "a@x.com");
        assert_eq!(allocator.allocate("user", "email", "a@x.com", &mut rng), "a@x.com_0");
        assert_eq!(allocator.allocate("user", "email", "a@x.com", &mut rng), "a@x.com_1");
        assert_eq!(allocator.count("user", "email"), 3);
    }

    #[test]
    fn test_existing_numeric_suffix_is_replaced() {
        let mut allocator = UniqueAllocator::new();
        let mut rng = StdRng::seed_from_u64(42);

        allocator.claim("tag", "slug", "promo_7");
        assert_eq!(allocator.allocate("tag", "slug", "promo_7", &mut rng), "promo_0");
        // A non-numeric tail is kept.
        allocator.claim("tag", "slug", "big_sale");
        assert_eq!(allocator.allocate("tag", "slug", "big_sale", &mut rng), "big_sale_0");
    }

    #[test]
    fn test_sets_are_scoped_per_entity_attribute() {
        let mut allocator = UniqueAllocator::new();
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(allocator.allocate("user", "email", "a@x.com", &mut rng), "a@x.com");
        assert_eq!(allocator.allocate("admin", "email", "a@x.com", &mut rng), "a@x.com");
        assert_eq!(allocator.allocate("user", "login", "a@x.com", &mut rng), "a@x.com");
    }

    #[test]
    fn test_identifier_names_get_opaque_tokens() {
        let mut allocator = UniqueAllocator::new();
        let mut rng = StdRng::seed_from_u64(7);

        let first = allocator.allocate("user", "id", "1", &mut rng);
        let second = allocator.allocate("user", "id", "1", &mut rng);
        assert_ne!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        assert!(allocator.allocate("user", "externalUuid", "x", &mut rng).len() == 36);
    }

    #[test]
    fn test_opaque_tokens_are_seed_deterministic() {
        let a = opaque_token(&mut StdRng::seed_from_u64(99));
        let b = opaque_token(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_exhaustion_returns_last_attempt_and_records_diagnostic() {
        let mut allocator = UniqueAllocator::with_max_attempts(2);
        let mut rng = StdRng::seed_from_u64(42);

        allocator.allocate("user", "email", "a", &mut rng);
        allocator.allocate("user", "email", "a", &mut rng);
        allocator.allocate("user", "email", "a", &mut rng);
        let degraded = allocator.allocate("user", "email", "a", &mut rng);

        assert_eq!(degraded, "a_1");
        let diagnostics = allocator.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::UniqueExhausted { attempts: 2, .. }
        ));
        assert!(allocator.take_diagnostics().is_empty());
    }

    #[test]
    fn test_from_tables_reconstructs_used_values() {
        let mut schema = Schema::new("test");
        schema.add_entity(
            Entity::new("user", "User")
                .with_attribute(Attribute::new("email").unique())
                .with_attribute(Attribute::new("name")),
        );
        let mut table = EntityTable::new(vec!["email".to_string(), "name".to_string()]);
        table.rows.push(vec!["a@x.com".to_string(), "Ann".to_string()]);
        table.rows.push(vec![String::new(), "Bob".to_string()]);
        let mut tables = IndexMap::new();
        tables.insert("user".to_string(), table);

        let mut allocator = UniqueAllocator::from_tables(&schema, &tables);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(allocator.is_used("user", "email", "a@x.com"));
        assert!(!allocator.is_used("user", "name", "Ann"));
        assert_eq!(allocator.count("user", "email"), 1);
        assert_eq!(allocator.allocate("user", "email", "a@x.com", &mut rng), "a@x.com_0");
    }
}
