//! The service record and how it maps onto the remote collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the service catalogue after normalization.
///
/// All text fields are trimmed strings (never null). `id` is the persistence
/// key: one output file per identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub description: String,
    pub short_description: String,
    pub keywords: String,
    pub categories: String,
    pub life_events: String,
    pub provider_names: String,
    pub popularity: u64,
    pub combined_name: String,
    pub enriched_description: String,
}

impl Record {
    /// `trim(short_name + " " + long_name + " " + provider_names)`
    #[must_use]
    pub fn combine_names(short_name: &str, long_name: &str, provider_names: &str) -> String {
        format!("{short_name} {long_name} {provider_names}")
            .trim()
            .to_string()
    }

    /// Output file name for this record.
    #[must_use]
    pub fn file_name(&self) -> String {
        Self::file_name_for(&self.id)
    }

    /// Deterministic, injective file name for an identifier. Bytes outside
    /// `[A-Za-z0-9._-]` are percent-encoded, so `a/b` and `a_b` never collide.
    #[must_use]
    pub fn file_name_for(id: &str) -> String {
        let mut name = String::with_capacity(id.len() + 5);
        for byte in id.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        // "." and ".." are not usable file stems
        if name.chars().all(|c| c == '.') {
            name = name.replace('.', "%2E");
        }
        name.push_str(".json");
        name
    }

    /// Properties payload for one create-record request.
    #[must_use]
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("serviceId".into(), Value::from(self.id.as_str()));
        props.insert("shortName".into(), Value::from(self.short_name.as_str()));
        props.insert("longName".into(), Value::from(self.long_name.as_str()));
        props.insert("description".into(), Value::from(self.description.as_str()));
        props.insert(
            "shortDescription".into(),
            Value::from(self.short_description.as_str()),
        );
        props.insert("keywords".into(), Value::from(self.keywords.as_str()));
        props.insert("categories".into(), Value::from(self.categories.as_str()));
        props.insert("lifeEvents".into(), Value::from(self.life_events.as_str()));
        props.insert(
            "providerNames".into(),
            Value::from(self.provider_names.as_str()),
        );
        props.insert("popularity".into(), Value::from(self.popularity));
        props.insert(
            "combinedName".into(),
            Value::from(self.combined_name.as_str()),
        );
        props.insert(
            "enrichedDescription".into(),
            Value::from(self.enriched_description.as_str()),
        );
        props
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Text,
    Int,
}

impl PropertyKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Int => "int",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
}

/// Remote collection layout matching [`Record::to_properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub properties: Vec<PropertySpec>,
}

impl CollectionSchema {
    #[must_use]
    pub fn for_records(name: impl Into<String>) -> Self {
        let text = |name: &'static str| PropertySpec {
            name,
            kind: PropertyKind::Text,
        };
        Self {
            name: name.into(),
            properties: vec![
                PropertySpec {
                    name: "serviceId",
                    kind: PropertyKind::String,
                },
                text("shortName"),
                text("longName"),
                text("description"),
                text("shortDescription"),
                text("keywords"),
                text("categories"),
                text("lifeEvents"),
                text("providerNames"),
                PropertySpec {
                    name: "popularity",
                    kind: PropertyKind::Int,
                },
                text("combinedName"),
                text("enrichedDescription"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            id: "42".into(),
            short_name: String::new(),
            long_name: "Vilnius City Clinic".into(),
            description: "Clinic".into(),
            short_description: String::new(),
            keywords: "health".into(),
            categories: "Health".into(),
            life_events: String::new(),
            provider_names: "VCC".into(),
            popularity: 7,
            combined_name: "Vilnius City Clinic VCC".into(),
            enriched_description: "Clinic".into(),
        }
    }

    #[test]
    fn test_combine_names_trims_empty_parts() {
        assert_eq!(
            Record::combine_names("", "Vilnius City Clinic", "VCC"),
            "Vilnius City Clinic VCC"
        );
        assert_eq!(Record::combine_names("", "", ""), "");
        assert_eq!(Record::combine_names("A", "B", ""), "A B");
    }

    #[test]
    fn test_file_name_is_derived_from_id() {
        assert_eq!(sample().file_name(), "42.json");
        assert_eq!(Record::file_name_for("a/b"), "a%2Fb.json");
        assert_eq!(Record::file_name_for("a_b"), "a_b.json");
        assert_eq!(Record::file_name_for(".."), "%2E%2E.json");
    }

    #[test]
    fn test_properties_cover_schema() {
        let props = sample().to_properties();
        let schema = CollectionSchema::for_records("Service");
        assert_eq!(props.len(), schema.properties.len());
        for spec in &schema.properties {
            assert!(props.contains_key(spec.name), "missing {}", spec.name);
        }
        assert_eq!(props["popularity"], Value::from(7_u64));
        assert_eq!(props["serviceId"], Value::from("42"));
    }
}
