use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::demographics::decode_first_value;

/// Field names requested from the packet store and read from registry documents.
pub mod fields {
    pub const APPLICANT_TRIBE: &str = "applicantTribe";
    pub const APPLICANT_CITIZENSHIP_TYPE: &str = "applicantCitizenshipType";
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    pub const APPLICANT_CLAN: &str = "applicantClan";
    pub const FATHER_NIN: &str = "fatherNIN";
    pub const FATHER_TRIBE: &str = "fatherTribe";
    pub const FATHER_CLAN: &str = "fatherClan";
    pub const MOTHER_NIN: &str = "motherNIN";
    pub const MOTHER_TRIBE: &str = "motherTribe";
    pub const MOTHER_CLAN: &str = "motherClan";
    pub const GUARDIAN_NIN: &str = "guardianNIN";
    pub const GUARDIAN_RELATION_TO_APPLICANT: &str = "guardianRelationToApplicant";
    pub const GUARDIAN_TRIBE_FORM: &str = "guardianTribeForm";
    pub const GUARDIAN_CLAN_FORM: &str = "guardianClanForm";

    /// Tribe and clan keys on a registry identity document.
    pub const REGISTRY_TRIBE: &str = "tribe";
    pub const REGISTRY_CLAN: &str = "clan";

    /// The fixed field set fetched in one batch per evaluation.
    pub const APPLICANT_FIELDS: [&str; 14] = [
        APPLICANT_TRIBE,
        APPLICANT_CITIZENSHIP_TYPE,
        DATE_OF_BIRTH,
        APPLICANT_CLAN,
        FATHER_NIN,
        FATHER_TRIBE,
        FATHER_CLAN,
        MOTHER_NIN,
        MOTHER_TRIBE,
        MOTHER_CLAN,
        GUARDIAN_NIN,
        GUARDIAN_RELATION_TO_APPLICANT,
        GUARDIAN_TRIBE_FORM,
        GUARDIAN_CLAN_FORM,
    ];
}

/// Identifier wrapper for registration packets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub String);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// National identification number used as a registry handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nin(pub String);

impl Nin {
    /// Returns `None` for missing or blank values.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Nin(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering that keeps only the last four characters.
    pub fn masked(&self) -> String {
        let visible: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{visible}")
    }
}

/// Citizenship basis declared on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CitizenshipClaim {
    ByBirth,
    Other,
}

impl CitizenshipClaim {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(normalize_label).as_deref() {
            Some("birth") | Some("by birth") | Some("by_birth") => Self::ByBirth,
            _ => Self::Other,
        }
    }
}

/// Family relationship cited between the applicant and a reference person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipClass {
    Father,
    Mother,
    GrandfatherPaternal,
    GrandfatherMaternal,
    GrandmotherPaternal,
    GrandmotherMaternal,
    Sibling,
    MaternalUncleAunt,
    PaternalUncleAunt,
    FirstCousin,
}

impl RelationshipClass {
    pub const ALL: [RelationshipClass; 10] = [
        Self::Father,
        Self::Mother,
        Self::GrandfatherPaternal,
        Self::GrandfatherMaternal,
        Self::GrandmotherPaternal,
        Self::GrandmotherMaternal,
        Self::Sibling,
        Self::MaternalUncleAunt,
        Self::PaternalUncleAunt,
        Self::FirstCousin,
    ];

    /// Label as captured by the registration client.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Father => "Father",
            Self::Mother => "Mother",
            Self::GrandfatherPaternal => "Grand Father on Father's side",
            Self::GrandfatherMaternal => "Grand Father on Mother's side",
            Self::GrandmotherPaternal => "Grand Mother on Father's side",
            Self::GrandmotherMaternal => "Grand Mother on Mother's side",
            Self::Sibling => "Brother or Sister",
            Self::MaternalUncleAunt => "Maternal Uncle or Aunt",
            Self::PaternalUncleAunt => "Paternal Uncle or Aunt",
            Self::FirstCousin => "First Cousin",
        }
    }

    /// Case-insensitive lookup; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_label(label);
        Self::ALL
            .into_iter()
            .find(|class| normalize_label(class.label()) == wanted)
    }
}

impl fmt::Display for RelationshipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Applicant snapshot materialised from one batched field fetch.
///
/// Tribe, clan, and relationship values keep their encoded form (a JSON list of
/// `{ "value": ... }` entries) and are decoded lazily by the components that use them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub registration_id: RegistrationId,
    pub citizenship: CitizenshipClaim,
    pub date_of_birth: Option<String>,
    pub tribe: Option<String>,
    pub clan: Option<String>,
    pub father_nin: Option<Nin>,
    pub mother_nin: Option<Nin>,
    pub guardian_nin: Option<Nin>,
    pub guardian_relationship: Option<String>,
    pub guardian_tribe_on_form: Option<String>,
    pub guardian_clan_on_form: Option<String>,
}

impl ApplicantRecord {
    pub fn from_fields(registration_id: RegistrationId, values: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| values.get(key).cloned();
        let citizenship_label = values
            .get(fields::APPLICANT_CITIZENSHIP_TYPE)
            .and_then(|raw| decode_first_value(raw));

        Self {
            registration_id,
            citizenship: CitizenshipClaim::from_label(citizenship_label.as_deref()),
            date_of_birth: get(fields::DATE_OF_BIRTH),
            tribe: get(fields::APPLICANT_TRIBE),
            clan: get(fields::APPLICANT_CLAN),
            father_nin: Nin::parse(values.get(fields::FATHER_NIN).map(String::as_str)),
            mother_nin: Nin::parse(values.get(fields::MOTHER_NIN).map(String::as_str)),
            guardian_nin: Nin::parse(values.get(fields::GUARDIAN_NIN).map(String::as_str)),
            guardian_relationship: get(fields::GUARDIAN_RELATION_TO_APPLICANT),
            guardian_tribe_on_form: get(fields::GUARDIAN_TRIBE_FORM),
            guardian_clan_on_form: get(fields::GUARDIAN_CLAN_FORM),
        }
    }

    pub fn has_parent_nin(&self) -> bool {
        self.father_nin.is_some() || self.mother_nin.is_some()
    }
}

/// Authoritative registry record held for a NIN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityDocument(pub Map<String, Value>);

impl IdentityDocument {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Textual form of a field: strings verbatim, other JSON values re-encoded.
    pub fn field_text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<Value> for IdentityDocument {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relationship_labels_match_case_insensitively() {
        assert_eq!(
            RelationshipClass::from_label("brother   or SISTER"),
            Some(RelationshipClass::Sibling)
        );
        assert_eq!(
            RelationshipClass::from_label("Grand Mother on Mother's side"),
            Some(RelationshipClass::GrandmotherMaternal)
        );
        assert_eq!(RelationshipClass::from_label("Neighbour"), None);
    }

    #[test]
    fn citizenship_claim_accepts_birth_labels() {
        assert_eq!(
            CitizenshipClaim::from_label(Some("By Birth")),
            CitizenshipClaim::ByBirth
        );
        assert_eq!(
            CitizenshipClaim::from_label(Some("Naturalisation")),
            CitizenshipClaim::Other
        );
        assert_eq!(CitizenshipClaim::from_label(None), CitizenshipClaim::Other);
    }

    #[test]
    fn blank_nins_are_treated_as_absent() {
        let mut values = BTreeMap::new();
        values.insert(fields::FATHER_NIN.to_string(), "   ".to_string());
        values.insert(fields::MOTHER_NIN.to_string(), "CM900".to_string());
        values.insert(
            fields::APPLICANT_CITIZENSHIP_TYPE.to_string(),
            r#"[{"language":"eng","value":"Birth"}]"#.to_string(),
        );

        let record = ApplicantRecord::from_fields(RegistrationId("10001".to_string()), &values);

        assert_eq!(record.father_nin, None);
        assert_eq!(record.mother_nin, Some(Nin("CM900".to_string())));
        assert_eq!(record.citizenship, CitizenshipClaim::ByBirth);
        assert!(record.has_parent_nin());
    }

    #[test]
    fn masked_nin_keeps_last_four_characters() {
        assert_eq!(Nin("CM12345678ABCD".to_string()).masked(), "****ABCD");
        assert_eq!(Nin("AB".to_string()).masked(), "****AB");
    }

    #[test]
    fn identity_document_reencodes_structured_fields() {
        let document = IdentityDocument::from(json!({
            "dateOfBirth": "1975/06/01",
            "tribe": [{ "value": "Acholi" }],
            "clan": null,
        }));

        assert_eq!(document.field_text("dateOfBirth").as_deref(), Some("1975/06/01"));
        assert_eq!(
            document.field_text("tribe").as_deref(),
            Some(r#"[{"value":"Acholi"}]"#)
        );
        assert_eq!(document.field_text("clan"), None);
    }
}
