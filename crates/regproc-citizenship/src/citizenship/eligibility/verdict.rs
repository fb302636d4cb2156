use std::fmt;

use serde::{Deserialize, Serialize};

use crate::citizenship::demographics::LineageMismatch;

/// Structured reason attached to every verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Success,
    NotCitizenByBirth,
    InvalidDob,
    NinUsageExceeded,
    UinNotFound,
    AgeDifferenceFailed,
    TribeMismatch,
    ClanMismatch,
    GuardianNinMissing,
    GuardianRelationParseError,
    GuardianValidationFailed,
    ProcessingError,
}

impl ReasonCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::Success => "SUCCESS",
            ReasonCode::NotCitizenByBirth => "NOT_CITIZEN_BY_BIRTH",
            ReasonCode::InvalidDob => "INVALID_DOB",
            ReasonCode::NinUsageExceeded => "NIN_USAGE_EXCEEDED",
            ReasonCode::UinNotFound => "UIN_NOT_FOUND",
            ReasonCode::AgeDifferenceFailed => "AGE_DIFFERENCE_FAILED",
            ReasonCode::TribeMismatch => "TRIBE_MISMATCH",
            ReasonCode::ClanMismatch => "CLAN_MISMATCH",
            ReasonCode::GuardianNinMissing => "GUARDIAN_NIN_MISSING",
            ReasonCode::GuardianRelationParseError => "GUARDIAN_RELATION_PARSE_ERROR",
            ReasonCode::GuardianValidationFailed => "GUARDIAN_VALIDATION_FAILED",
            ReasonCode::ProcessingError => "PROCESSING_ERROR",
        }
    }

    /// Human readable status comment used for audit trails.
    pub fn summary(&self) -> &'static str {
        match self {
            ReasonCode::Success => "citizenship verification succeeded",
            ReasonCode::NotCitizenByBirth => "applicant is not claiming citizenship by birth",
            ReasonCode::InvalidDob => "applicant date of birth is invalid",
            ReasonCode::NinUsageExceeded => "reference NIN cited more often than allowed",
            ReasonCode::UinNotFound => "reference NIN not found in registry",
            ReasonCode::AgeDifferenceFailed => "age difference with reference person too small",
            ReasonCode::TribeMismatch => "tribe mismatch with reference person",
            ReasonCode::ClanMismatch => "clan mismatch with reference person",
            ReasonCode::GuardianNinMissing => "guardian NIN missing",
            ReasonCode::GuardianRelationParseError => "guardian relationship could not be parsed",
            ReasonCode::GuardianValidationFailed => "guardian validation failed",
            ReasonCode::ProcessingError => "error while processing reference person",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<LineageMismatch> for ReasonCode {
    fn from(value: LineageMismatch) -> Self {
        match value {
            LineageMismatch::Tribe => ReasonCode::TribeMismatch,
            LineageMismatch::Clan => ReasonCode::ClanMismatch,
        }
    }
}

/// Terminal outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub eligible: bool,
    pub reason: ReasonCode,
    pub detail: String,
}

impl EligibilityVerdict {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            eligible: true,
            reason: ReasonCode::Success,
            detail: detail.into(),
        }
    }

    pub fn fail(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason,
            detail: detail.into(),
        }
    }

    pub fn summary(&self) -> String {
        if self.detail.is_empty() {
            self.reason.summary().to_string()
        } else {
            format!("{}: {}", self.reason.summary(), self.detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_serialize_as_screaming_snake_case() {
        let encoded = serde_json::to_string(&ReasonCode::GuardianRelationParseError)
            .expect("serializes");
        assert_eq!(encoded, format!("\"{}\"", ReasonCode::GuardianRelationParseError.code()));
    }

    #[test]
    fn failing_verdicts_are_never_eligible() {
        let verdict = EligibilityVerdict::fail(ReasonCode::ClanMismatch, "Atyak vs Payira");
        assert!(!verdict.eligible);
        assert!(verdict.summary().starts_with("clan mismatch"));
        assert!(verdict.summary().contains("Atyak"));
    }
}
