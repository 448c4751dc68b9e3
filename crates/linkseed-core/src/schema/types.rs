use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level representation of an entity schema.
///
/// Entities and relationships are keyed by their internal identifiers.
/// `IndexMap` keeps declaration order, which the resolver uses to decide which
/// direction of a bidirectional relationship pair is "first".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schema {
    pub name: String,
    pub entities: IndexMap<String, Entity>,
    pub relationships: IndexMap<String, Relationship>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: IndexMap::new(),
            relationships: IndexMap::new(),
        }
    }

    /// Insert an entity under its internal id.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Insert a relationship under its internal id.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships
            .insert(relationship.id.clone(), relationship);
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn unique_attribute_count(&self) -> usize {
        self.entities
            .values()
            .map(|e| e.attributes.iter().filter(|a| a.is_unique).count())
            .sum()
    }
}

/// A record type that generates into one tabular output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Internal identifier, the key used by the dependency graph.
    pub id: String,
    /// External identifier, used for qualified references and file naming.
    pub external_id: String,
    /// Human-readable display name.
    #[serde(default)]
    pub name: String,
    /// Ordered attributes. This order is the column order of every row.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(id: impl Into<String>, external_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            external_id: external_id.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute, returning `self` for chaining in fixtures.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Column headers in fixed attribute order.
    pub fn headers(&self) -> Vec<String> {
        self.attributes
            .iter()
            .map(|a| a.external_id.clone())
            .collect()
    }

    /// Attributes declared unique, with their column positions.
    pub fn unique_columns(&self) -> impl Iterator<Item = (usize, &Attribute)> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_unique)
    }

    /// Output file name for this entity. See [`entity_file_name`].
    pub fn file_name(&self) -> String {
        entity_file_name(&self.external_id)
    }
}

/// Map an entity external id to its tabular file name.
///
/// `"crm/User"` becomes `"User.csv"`, `"User"` becomes `"User.csv"`.
pub fn entity_file_name(external_id: &str) -> String {
    let base = match external_id.rsplit_once('/') {
        Some((_, tail)) => tail,
        None => external_id,
    };
    format!("{}.csv", base)
}

/// A single attribute (column) of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub external_id: String,
    /// Declared type. Advisory only: every generated cell is a string.
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub is_unique: bool,
    /// Short token relationships may use instead of `Entity.attribute`.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Attribute {
    pub fn new(external_id: impl Into<String>) -> Self {
        let external_id = external_id.into();
        Self {
            name: external_id.clone(),
            external_id,
            data_type: DataType::default(),
            is_unique: false,
            alias: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// A declared reference from one attribute to another.
///
/// Endpoints are either an alias token or an `"EntityExternalId.AttributeExternalId"`
/// string. A non-empty `path` marks a multi-hop relationship, which the
/// generator does not order or enforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub from_attribute: String,
    pub to_attribute: String,
    #[serde(default)]
    pub path: Vec<String>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        from_attribute: impl Into<String>,
        to_attribute: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from_attribute: from_attribute.into(),
            to_attribute: to_attribute.into(),
            path: Vec::new(),
        }
    }

    pub fn is_multi_hop(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Normalized attribute type. Only used as a hint for value synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Unknown(String),
}

impl DataType {
    /// Parse a declared type string into a normalized DataType.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();

        match normalized.as_str() {
            "" | "string" | "str" | "text" | "varchar" => DataType::String,
            "int" | "integer" | "long" | "number" | "bigint" | "smallint" => DataType::Integer,
            "float" | "double" | "decimal" | "numeric" | "real" => DataType::Decimal,
            "bool" | "boolean" => DataType::Boolean,
            "date" => DataType::Date,
            "datetime" | "timestamp" | "timestamptz" => DataType::DateTime,
            "uuid" | "guid" => DataType::Uuid,
            other => DataType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "string"),
            DataType::Integer => write!(f, "integer"),
            DataType::Decimal => write!(f, "decimal"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Date => write!(f, "date"),
            DataType::DateTime => write!(f, "datetime"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Generated rows for one entity: headers plus string cells in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EntityTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Column position by exact header match.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Column position by case-insensitive match, also accepting `<header>Id`.
    pub fn column_loose(&self, attribute: &str) -> Option<usize> {
        let wanted = attribute.to_lowercase();
        let wanted_id = format!("{}id", wanted);
        self.headers
            .iter()
            .position(|h| h.to_lowercase() == wanted)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|h| h.to_lowercase() == wanted_id)
            })
    }

    /// Non-empty values of a column, in row order.
    pub fn non_empty_values(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_empty())
            .cloned()
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
