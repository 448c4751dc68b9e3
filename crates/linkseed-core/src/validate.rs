//! # Dataset Validation
//!
//! Checks a materialized dataset (generated or loaded back from files)
//! against the schema's relationships and unique attributes. Findings are
//! returned as data; nothing here fails.
//!
//! Columns are matched loosely (case-insensitive, or the attribute name plus
//! `Id`) because loaded files do not always keep the schema's exact headers.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::classify::names::{is_key_name, is_reference_name};
use crate::error::{LinkSeedError, Result};
use crate::resolve::{resolve_links, AttributeRef, RelationshipLink};
use crate::schema::types::{EntityTable, Schema};

/// Referential check of one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipValidationResult {
    pub relationship: String,
    pub from_entity: String,
    pub to_entity: String,
    pub from_entity_file: String,
    pub to_entity_file: String,
    pub errors: Vec<String>,
    /// Rows of the checked side.
    pub total_rows: usize,
    pub invalid_rows: usize,
}

impl RelationshipValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Uniqueness findings for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValueError {
    pub entity_id: String,
    pub entity_file: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub relationships: Vec<RelationshipValidationResult>,
    pub unique_errors: Vec<UniqueValueError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.relationships.iter().all(|r| r.is_valid()) && self.unique_errors.is_empty()
    }

    /// One line per failing relationship or entity, after a count header.
    pub fn summary(&self) -> String {
        let failing: Vec<&RelationshipValidationResult> =
            self.relationships.iter().filter(|r| !r.is_valid()).collect();

        let mut lines = vec![format!(
            "{} relationships checked, {} with errors; {} entities with unique violations",
            self.relationships.len(),
            failing.len(),
            self.unique_errors.len()
        )];
        for r in failing {
            lines.push(format!(
                "  {} ({} -> {}): {}/{} invalid rows",
                r.relationship, r.from_entity_file, r.to_entity_file, r.invalid_rows, r.total_rows
            ));
        }
        for u in &self.unique_errors {
            lines.push(format!("  {}: {} unique violations", u.entity_file, u.messages.len()));
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LinkSeedError::Serialization {
            message: "Failed to serialize validation report".to_string(),
            source: e,
        })
    }
}

/// Run every relationship and uniqueness check.
pub fn validate_dataset(schema: &Schema, tables: &IndexMap<String, EntityTable>) -> ValidationReport {
    ValidationReport {
        relationships: validate_relationships(schema, tables),
        unique_errors: validate_unique_values(schema, tables),
    }
}

/// Check every resolvable, single-hop relationship.
pub fn validate_relationships(
    schema: &Schema,
    tables: &IndexMap<String, EntityTable>,
) -> Vec<RelationshipValidationResult> {
    resolve_links(schema)
        .links
        .iter()
        .map(|link| validate_relationship(schema, tables, link))
        .collect()
}

/// Check one link.
///
/// When the "from" attribute is a bare key (`id`, `uuid`, `guid`) and the
/// "to" attribute reads as a reference (`userId`), every "to" row must
/// point at an existing "from" value. Otherwise every "from" row must point
/// at an existing "to" value. Row numbers in messages are 1-based.
pub fn validate_relationship(
    schema: &Schema,
    tables: &IndexMap<String, EntityTable>,
    link: &RelationshipLink,
) -> RelationshipValidationResult {
    let mut result = RelationshipValidationResult {
        relationship: link.relationship.clone(),
        from_entity: display_name(schema, &link.from.entity),
        to_entity: display_name(schema, &link.to.entity),
        from_entity_file: file_name(schema, &link.from.entity),
        to_entity_file: file_name(schema, &link.to.entity),
        errors: Vec::new(),
        total_rows: 0,
        invalid_rows: 0,
    };

    let from = match locate(schema, tables, &link.from) {
        Ok(found) => found,
        Err(message) => {
            result.errors.push(message);
            return result;
        }
    };
    let to = match locate(schema, tables, &link.to) {
        Ok(found) => found,
        Err(message) => {
            result.errors.push(message);
            return result;
        }
    };

    let pk_to_fk = is_key_name(&link.from.attribute) && is_reference_name(&link.to.attribute);
    let (checked, referenced) = if pk_to_fk { (to, from) } else { (from, to) };

    let known: HashSet<String> = referenced
        .table
        .non_empty_values(referenced.col)
        .into_iter()
        .collect();

    result.total_rows = checked.table.row_count();
    for (i, row) in checked.table.rows.iter().enumerate() {
        let value = row.get(checked.col).map(String::as_str).unwrap_or_default();
        let row_number = i + 1;

        if value.is_empty() {
            result.errors.push(format!(
                "{} row {}: empty value in '{}'",
                checked.file, row_number, checked.attribute
            ));
            result.invalid_rows += 1;
        } else if !known.contains(value) {
            result.errors.push(format!(
                "{} row {}: '{}' value '{}' not found in {}.{}",
                checked.file, row_number, checked.attribute, value, referenced.file, referenced.attribute
            ));
            result.invalid_rows += 1;
        }
    }

    debug!(
        "Relationship '{}': {}/{} invalid rows",
        link.relationship, result.invalid_rows, result.total_rows
    );
    result
}

/// Check every unique attribute of every entity that has data.
///
/// Empty values are always errors. A repeated value is reported once with
/// all the rows it appears in.
pub fn validate_unique_values(
    schema: &Schema,
    tables: &IndexMap<String, EntityTable>,
) -> Vec<UniqueValueError> {
    let mut errors = Vec::new();

    for entity in schema.entities.values() {
        let Some(table) = tables.get(&entity.id) else {
            continue;
        };

        let mut messages = Vec::new();
        for (_, attribute) in entity.unique_columns() {
            let Some(col) = table.column_loose(&attribute.external_id) else {
                messages.push(format!(
                    "Unique attribute '{}' has no column",
                    attribute.external_id
                ));
                continue;
            };

            let mut seen: IndexMap<&str, Vec<usize>> = IndexMap::new();
            for (i, row) in table.rows.iter().enumerate() {
                let value = row.get(col).map(String::as_str).unwrap_or_default();
                if value.is_empty() {
                    messages.push(format!(
                        "Row {}: empty value for unique attribute '{}'",
                        i + 1,
                        attribute.external_id
                    ));
                    continue;
                }
                seen.entry(value).or_default().push(i + 1);
            }

            for (value, rows) in seen.iter().filter(|(_, rows)| rows.len() > 1) {
                let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                messages.push(format!(
                    "Duplicate value '{}' for unique attribute '{}' in rows {}",
                    value,
                    attribute.external_id,
                    rows.join(", ")
                ));
            }
        }

        if !messages.is_empty() {
            errors.push(UniqueValueError {
                entity_id: entity.id.clone(),
                entity_file: entity.file_name(),
                messages,
            });
        }
    }

    errors
}

/// One side of a link located in the dataset.
struct Located<'a> {
    table: &'a EntityTable,
    col: usize,
    file: String,
    attribute: &'a str,
}

fn locate<'a>(
    schema: &Schema,
    tables: &'a IndexMap<String, EntityTable>,
    side: &'a AttributeRef,
) -> std::result::Result<Located<'a>, String> {
    let file = file_name(schema, &side.entity);
    let table = tables
        .get(&side.entity)
        .ok_or_else(|| format!("No data for entity file {}", file))?;
    let col = table
        .column_loose(&side.attribute)
        .ok_or_else(|| format!("Column '{}' not found in {}", side.attribute, file))?;
    Ok(Located {
        table,
        col,
        file,
        attribute: &side.attribute,
    })
}

fn display_name(schema: &Schema, entity_id: &str) -> String {
    schema
        .entities
        .get(entity_id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| entity_id.to_string())
}

fn file_name(schema: &Schema, entity_id: &str) -> String {
    schema
        .entities
        .get(entity_id)
        .map(|e| e.file_name())
        .unwrap_or_else(|| format!("{}.csv", entity_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Attribute, Entity, Relationship};

    fn schema() -> Schema {
        let mut schema = Schema::new("shop");
        schema.add_entity(
            Entity::new("user", "crm/User")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("email").unique()),
        );
        schema.add_entity(
            Entity::new("order", "Order")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("userId")),
        );
        schema
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> EntityTable {
        EntityTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn tables(order_rows: &[&[&str]]) -> IndexMap<String, EntityTable> {
        let mut tables = IndexMap::new();
        tables.insert(
            "user".to_string(),
            table(&["id", "email"], &[&["u1", "a@x.com"], &["u2", "b@x.com"]]),
        );
        tables.insert("order".to_string(), table(&["id", "userId"], order_rows));
        tables
    }

    #[test]
    fn test_fk_to_pk_direction() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "Order.userId", "crm/User.id"));
        let tables = tables(&[&["o1", "u1"], &["o2", "u9"], &["o3", ""]]);

        let results = validate_relationships(&schema, &tables);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.from_entity_file, "Order.csv");
        assert_eq!(r.to_entity_file, "User.csv");
        assert_eq!(r.total_rows, 3);
        assert_eq!(r.invalid_rows, 2);
        assert!(r.errors[0].contains("row 2"));
        assert!(r.errors[0].contains("u9"));
        assert!(r.errors[1].contains("empty"));
    }

    #[test]
    fn test_pk_to_fk_direction_checks_the_to_side() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "crm/User.id", "Order.userId"));
        let tables = tables(&[&["o1", "u1"], &["o2", "u2"], &["o3", "u7"]]);

        let r = validate_relationship(&schema, &tables, &resolve_links(&schema).links[0]);

        assert_eq!(r.total_rows, 3);
        assert_eq!(r.invalid_rows, 1);
        assert!(r.errors[0].contains("Order.csv row 3"));
    }

    #[test]
    fn test_loose_column_match() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "Order.userId", "crm/User.id"));
        let mut tables = tables(&[]);
        tables.insert(
            "order".to_string(),
            table(&["ID", "USERID"], &[&["o1", "u2"]]),
        );

        let report = validate_dataset(&schema, &tables);

        assert!(report.is_clean(), "{}", report.summary());
    }

    #[test]
    fn test_missing_column_is_structural_error() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "Order.userId", "crm/User.id"));
        let mut tables = tables(&[]);
        tables.insert("order".to_string(), table(&["id", "owner"], &[&["o1", "u1"]]));

        let results = validate_relationships(&schema, &tables);

        assert_eq!(results[0].errors, vec!["Column 'userId' not found in Order.csv"]);
        assert_eq!(results[0].total_rows, 0);
    }

    #[test]
    fn test_missing_table_is_structural_error() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "Order.userId", "crm/User.id"));
        let mut tables = tables(&[]);
        tables.shift_remove("order");

        let results = validate_relationships(&schema, &tables);

        assert!(!results[0].is_valid());
        assert!(results[0].errors[0].contains("Order.csv"));
    }

    #[test]
    fn test_unique_duplicates_and_empties() {
        let schema = schema();
        let mut tables = tables(&[&["o1", "u1"]]);
        tables.insert(
            "user".to_string(),
            table(
                &["id", "email"],
                &[&["u1", "a@x.com"], &["u2", "a@x.com"], &["", "c@x.com"], &["u4", "a@x.com"]],
            ),
        );

        let errors = validate_unique_values(&schema, &tables);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity_id, "user");
        assert_eq!(errors[0].entity_file, "User.csv");
        assert_eq!(
            errors[0].messages,
            vec![
                "Row 3: empty value for unique attribute 'id'",
                "Duplicate value 'a@x.com' for unique attribute 'email' in rows 1, 2, 4",
            ]
        );
    }

    #[test]
    fn test_report_summary_and_json() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r", "Order.userId", "crm/User.id"));
        let tables = tables(&[&["o1", "nope"]]);

        let report = validate_dataset(&schema, &tables);

        assert!(!report.is_clean());
        let summary = report.summary();
        assert!(summary.starts_with("1 relationships checked, 1 with errors"));
        assert!(summary.contains("1/1 invalid rows"));

        let json = report.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["relationships"][0]["invalidRows"], 1);
        assert_eq!(parsed["relationships"][0]["fromEntityFile"], "Order.csv");
    }
}
