use serde::Deserialize;

/// Suffix table used to spot attributes that hold many references.
///
/// Injectable through `[patterns]` in `linkseed.toml`. All entries are
/// matched against the normalized (snake_case, lowercase) attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NamePatterns {
    /// Suffixes that always mark a collection (`member_ids`, `tag_uuids`).
    pub collection_suffixes: Vec<String>,
    /// Endings that look plural but are not (`status`, `address`, `analysis`).
    pub singular_exceptions: Vec<String>,
}

impl Default for NamePatterns {
    fn default() -> Self {
        Self {
            collection_suffixes: ["ids", "uuids", "guids", "keys", "_list"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            singular_exceptions: ["ss", "us", "is", "status", "news", "series"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NamePatterns {
    /// True if the attribute name reads as plural or as a list of ids.
    pub fn is_collection_name(&self, name: &str) -> bool {
        let normalized = normalize_attribute_name(name);

        if self
            .collection_suffixes
            .iter()
            .any(|suffix| normalized.ends_with(suffix.as_str()))
        {
            return true;
        }

        normalized.len() > 2
            && normalized.ends_with('s')
            && !self
                .singular_exceptions
                .iter()
                .any(|ending| normalized.ends_with(ending.as_str()))
    }
}

/// Names that get an opaque generated token instead of a disambiguated value.
pub fn is_identifier_like(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("uuid") || lower.ends_with("id")
}

/// Bare key names: `id`, `uuid`, `guid`.
pub fn is_key_name(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "id" | "uuid" | "guid")
}

/// Names that look like a reference to some other entity's key (`userId`).
pub fn is_reference_name(name: &str) -> bool {
    !is_key_name(name) && name.to_lowercase().contains("id")
}

/// Normalize an attribute name for pattern matching:
/// - CamelCase to snake_case (e.g., memberIds → member_ids)
/// - lowercase (Unicode-safe)
/// - replace hyphens with underscores
pub fn normalize_attribute_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_char: Option<char> = None;

    for ch in name.chars() {
        if ch.is_uppercase() {
            if let Some(p) = prev_char {
                if p.is_lowercase() {
                    result.push('_');
                }
            }
        }
        // ch.to_lowercase() can yield multiple chars for some Unicode.
        for lower_ch in ch.to_lowercase() {
            result.push(lower_ch);
        }
        prev_char = Some(ch);
    }
    result.replace('-', "_")
}
