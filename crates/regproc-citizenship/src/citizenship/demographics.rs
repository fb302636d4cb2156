use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{fields, IdentityDocument};

/// Decode the first `value` of a JSON list such as `[{"language":"eng","value":"Acholi"}]`.
///
/// Only the first entry is read, so later entries may be malformed. Numeric and boolean
/// values are rendered as text. Blank or malformed input, an empty list, and a first entry
/// that is not an object or has a null or structured `value` all yield `None`.
pub fn decode_first_value(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let entries: Vec<Value> = serde_json::from_str(raw).ok()?;
    match entries.first()?.get("value")? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Tribe/clan pair for one person, used only for pairwise comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDemographic {
    pub label: String,
    pub tribe: Option<String>,
    pub clan: Option<String>,
}

/// Lineage attribute that failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageMismatch {
    Tribe,
    Clan,
}

impl PersonDemographic {
    /// Compare tribe first, then clan. Absent values on either side never match.
    pub fn concordance_with(&self, other: &PersonDemographic) -> Result<(), LineageMismatch> {
        if !same_value(self.tribe.as_deref(), other.tribe.as_deref()) {
            return Err(LineageMismatch::Tribe);
        }
        if !same_value(self.clan.as_deref(), other.clan.as_deref()) {
            return Err(LineageMismatch::Clan);
        }
        Ok(())
    }
}

fn same_value(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left.to_lowercase() == right.to_lowercase(),
        _ => false,
    }
}

/// Single decoding point for encoded tribe/clan fields.
pub struct DemographicExtractor;

impl DemographicExtractor {
    pub fn extract(
        label: impl Into<String>,
        tribe_field: Option<&str>,
        clan_field: Option<&str>,
    ) -> PersonDemographic {
        PersonDemographic {
            label: label.into(),
            tribe: tribe_field.and_then(decode_first_value),
            clan: clan_field.and_then(decode_first_value),
        }
    }

    /// Demographics recorded in the registry for the holder of a NIN.
    pub fn from_registry(
        label: impl Into<String>,
        document: &IdentityDocument,
    ) -> PersonDemographic {
        let tribe = document.field_text(fields::REGISTRY_TRIBE);
        let clan = document.field_text(fields::REGISTRY_CLAN);
        Self::extract(label, tribe.as_deref(), clan.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_first_entry_value() {
        let raw = r#"[{"language":"eng","value":"Acholi"},{"language":"lug","value":"Other"}]"#;
        assert_eq!(decode_first_value(raw).as_deref(), Some("Acholi"));
    }

    #[test]
    fn malformed_or_empty_encodings_are_absent() {
        assert_eq!(decode_first_value(""), None);
        assert_eq!(decode_first_value("Acholi"), None);
        assert_eq!(decode_first_value("[]"), None);
        assert_eq!(decode_first_value(r#"[{"language":"eng"}]"#), None);
        assert_eq!(decode_first_value(r#"[{"value":null}]"#), None);
        assert_eq!(decode_first_value(r#"["Acholi"]"#), None);
    }

    #[test]
    fn later_entries_do_not_affect_the_first_value() {
        assert_eq!(
            decode_first_value(r#"[{"value":"Acholi"},{"value":7}]"#).as_deref(),
            Some("Acholi")
        );
        assert_eq!(
            decode_first_value(r#"[{"value":"Acholi"},"stray",{"value":{"nested":true}}]"#)
                .as_deref(),
            Some("Acholi")
        );
    }

    #[test]
    fn scalar_values_are_rendered_as_text() {
        assert_eq!(decode_first_value(r#"[{"value":7}]"#).as_deref(), Some("7"));
        assert_eq!(decode_first_value(r#"[{"value":true}]"#).as_deref(), Some("true"));
    }

    #[test]
    fn extractor_omits_unparseable_fields() {
        let person = DemographicExtractor::extract(
            "Applicant",
            Some(r#"[{"value":"Langi"}]"#),
            Some("{not json"),
        );

        assert_eq!(person.tribe.as_deref(), Some("Langi"));
        assert_eq!(person.clan, None);
    }

    #[test]
    fn registry_document_fields_may_be_structured_or_encoded() {
        let document = IdentityDocument::from(json!({
            "tribe": [{ "value": "Acholi" }],
            "clan": r#"[{"value":"Payira"}]"#,
        }));

        let person = DemographicExtractor::from_registry("FATHER in registry", &document);

        assert_eq!(person.tribe.as_deref(), Some("Acholi"));
        assert_eq!(person.clan.as_deref(), Some("Payira"));
    }

    #[test]
    fn concordance_checks_tribe_before_clan() {
        let registry = PersonDemographic {
            label: "registry".to_string(),
            tribe: Some("Acholi".to_string()),
            clan: None,
        };
        let form = PersonDemographic {
            label: "form".to_string(),
            tribe: Some("Iteso".to_string()),
            clan: None,
        };
        assert_eq!(registry.concordance_with(&form), Err(LineageMismatch::Tribe));

        let form = PersonDemographic {
            tribe: Some("ACHOLI".to_string()),
            ..form
        };
        assert_eq!(registry.concordance_with(&form), Err(LineageMismatch::Clan));
    }
}
