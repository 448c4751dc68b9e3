//! # Value Providers
//!
//! Synthesizes the cell value for a non-reference column. The generator only
//! relies on the [`ValueSource`] contract (one string per cell); the default
//! [`FakeValueSource`] picks a plausible shape from the attribute name using a
//! pre-compiled rule table, then from the declared type.

use std::sync::LazyLock;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::lorem::en::{Sentences, Word, Words};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;

use crate::classify::names::normalize_attribute_name;
use crate::generate::unique::opaque_token;
use crate::schema::types::{Attribute, DataType, Entity};

/// Produces the initial value of one cell.
pub trait ValueSource {
    fn value(
        &mut self,
        entity: &Entity,
        attribute: &Attribute,
        row_index: usize,
        rng: &mut StdRng,
    ) -> String;
}

/// Shape of a generated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Identifier,
    Email,
    FirstName,
    LastName,
    FullName,
    Username,
    Phone,
    Street,
    City,
    Country,
    ZipCode,
    Company,
    Url,
    Title,
    Description,
    Date,
    DateTime,
    Boolean,
    Count,
    Amount,
    Status,
    Word,
}

/// A name rule: regex over the normalized attribute name.
struct KindRule {
    pattern: &'static str,
    kind: ValueKind,
}

/// Compiled rules, built once on first access. Order matters: first match wins.
static COMPILED_RULES: LazyLock<Vec<(Regex, ValueKind)>> = LazyLock::new(|| {
    KIND_RULES
        .iter()
        .filter_map(|r| Regex::new(r.pattern).ok().map(|re| (re, r.kind)))
        .collect()
});

static KIND_RULES: &[KindRule] = &[
    KindRule {
        pattern: r"(uuid|guid|^id$|_id$)",
        kind: ValueKind::Identifier,
    },
    KindRule {
        pattern: r"e_?mail",
        kind: ValueKind::Email,
    },
    KindRule {
        pattern: r"^(first_?name|given_?name|fname)$",
        kind: ValueKind::FirstName,
    },
    KindRule {
        pattern: r"^(last_?name|family_?name|surname|lname)$",
        kind: ValueKind::LastName,
    },
    KindRule {
        pattern: r"(company|organi[sz]ation|employer)",
        kind: ValueKind::Company,
    },
    KindRule {
        pattern: r"(user_?name|login|handle)",
        kind: ValueKind::Username,
    },
    KindRule {
        pattern: r"(^|_)(full_?|display_?)?name$",
        kind: ValueKind::FullName,
    },
    KindRule {
        pattern: r"(phone|mobile|fax)",
        kind: ValueKind::Phone,
    },
    KindRule {
        pattern: r"(street|address)",
        kind: ValueKind::Street,
    },
    KindRule {
        pattern: r"city",
        kind: ValueKind::City,
    },
    KindRule {
        pattern: r"country",
        kind: ValueKind::Country,
    },
    KindRule {
        pattern: r"(zip|postal)",
        kind: ValueKind::ZipCode,
    },
    KindRule {
        pattern: r"(url|website|link)",
        kind: ValueKind::Url,
    },
    KindRule {
        pattern: r"(title|subject|headline)",
        kind: ValueKind::Title,
    },
    KindRule {
        pattern: r"(description|summary|notes?$|comment|bio$)",
        kind: ValueKind::Description,
    },
    KindRule {
        pattern: r"(_at$|timestamp|datetime)",
        kind: ValueKind::DateTime,
    },
    KindRule {
        pattern: r"(date|_on$|birthday|dob)",
        kind: ValueKind::Date,
    },
    KindRule {
        pattern: r"(^(is|has|can)_|active$|enabled$|flag$)",
        kind: ValueKind::Boolean,
    },
    KindRule {
        pattern: r"(price|amount|total|cost|balance|salary)",
        kind: ValueKind::Amount,
    },
    KindRule {
        pattern: r"(count|quantity|qty|^age$|number$|^num_)",
        kind: ValueKind::Count,
    },
    KindRule {
        pattern: r"(status|state)$",
        kind: ValueKind::Status,
    },
];

/// Classify an attribute by name, falling back to its declared type.
pub fn classify_attribute(name: &str, data_type: &DataType) -> ValueKind {
    let normalized = normalize_attribute_name(name);

    for (pattern, kind) in COMPILED_RULES.iter() {
        if pattern.is_match(&normalized) {
            return *kind;
        }
    }

    type_based_fallback(data_type)
}

/// Fallback classification based purely on data type.
fn type_based_fallback(data_type: &DataType) -> ValueKind {
    match data_type {
        DataType::Uuid => ValueKind::Identifier,
        DataType::Boolean => ValueKind::Boolean,
        DataType::Integer => ValueKind::Count,
        DataType::Decimal => ValueKind::Amount,
        DataType::Date => ValueKind::Date,
        DataType::DateTime => ValueKind::DateTime,
        DataType::String | DataType::Unknown(_) => ValueKind::Word,
    }
}

/// Default value source backed by the `fake` crate.
///
/// Temporal values are anchored to `base_time` rather than the wall clock so
/// that a seeded run produces identical output whenever it runs.
pub struct FakeValueSource {
    pub base_time: NaiveDateTime,
}

impl FakeValueSource {
    pub fn new(base_time: NaiveDateTime) -> Self {
        Self { base_time }
    }
}

impl Default for FakeValueSource {
    fn default() -> Self {
        let base_time = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self::new(base_time)
    }
}

impl ValueSource for FakeValueSource {
    fn value(
        &mut self,
        _entity: &Entity,
        attribute: &Attribute,
        row_index: usize,
        rng: &mut StdRng,
    ) -> String {
        let kind = classify_attribute(&attribute.external_id, &attribute.data_type);
        generate_value(kind, rng, row_index, self.base_time)
    }
}

/// Generate a value of the given kind.
pub fn generate_value(
    kind: ValueKind,
    rng: &mut StdRng,
    row_index: usize,
    base_time: NaiveDateTime,
) -> String {
    match kind {
        ValueKind::Identifier => opaque_token(rng),
        ValueKind::Email => {
            let email: String = SafeEmail().fake_with_rng(rng);
            match email.split_once('@') {
                Some((user, domain)) => format!("{}.{}@{}", user, row_index, domain),
                None => format!("user{}@example.com", row_index),
            }
        }
        ValueKind::FirstName => FirstName().fake_with_rng(rng),
        ValueKind::LastName => LastName().fake_with_rng(rng),
        ValueKind::FullName => Name().fake_with_rng(rng),
        ValueKind::Username => {
            let user: String = Username().fake_with_rng(rng);
            format!("{}{}", user, row_index)
        }
        ValueKind::Phone => PhoneNumber().fake_with_rng(rng),
        ValueKind::Street => StreetName().fake_with_rng(rng),
        ValueKind::City => CityName().fake_with_rng(rng),
        ValueKind::Country => CountryName().fake_with_rng(rng),
        ValueKind::ZipCode => ZipCode().fake_with_rng(rng),
        ValueKind::Company => CompanyName().fake_with_rng(rng),
        ValueKind::Url => {
            let suffix: String = DomainSuffix().fake_with_rng(rng);
            format!("https://example-{}.{}", row_index, suffix)
        }
        ValueKind::Title => {
            let words: Vec<String> = Words(2..5).fake_with_rng(rng);
            let title = words.join(" ");
            let mut chars = title.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().to_string() + chars.as_str(),
            }
        }
        ValueKind::Description => {
            let sentences: Vec<String> = Sentences(1..3).fake_with_rng(rng);
            sentences.join(" ")
        }
        ValueKind::Date => {
            let days_offset = rng.random_range(-365..365);
            let date = base_time.date() + ChronoDuration::days(days_offset);
            date.format("%Y-%m-%d").to_string()
        }
        ValueKind::DateTime => {
            let days_ago = rng.random_range(1..365);
            let minutes = rng.random_range(0..24 * 60);
            let ts = base_time - ChronoDuration::days(days_ago) + ChronoDuration::minutes(minutes);
            ts.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
        ValueKind::Boolean => rng.random_bool(0.5).to_string(),
        ValueKind::Count => rng.random_range(0..1000_u32).to_string(),
        ValueKind::Amount => {
            let val: f64 = rng.random_range(0.01..1000.0);
            format!("{:.2}", val)
        }
        ValueKind::Status => {
            let statuses = ["active", "pending", "inactive", "archived"];
            statuses[rng.random_range(0..statuses.len())].to_string()
        }
        ValueKind::Word => Word().fake_with_rng(rng),
    }
}
