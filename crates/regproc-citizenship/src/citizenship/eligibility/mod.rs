//! Citizenship-by-birth eligibility rules.
//!
//! The engine fetches the applicant's packet fields once, then walks either the parent
//! path (father first, mother as fallback) or the guardian path, calling the NIN usage
//! guard and the registry only when a branch needs them. Each evaluation works on a fresh
//! [`ApplicantRecord`]; callers must not evaluate the same registration concurrently.

mod config;
mod guardian;
mod parent;
mod relationship;
mod verdict;

pub use config::{
    EligibilityConfig, DEFAULT_DATE_FORMAT, DEFAULT_GRANDPARENT_MIN_AGE_GAP,
    DEFAULT_PARENT_MIN_AGE_GAP,
};
pub use parent::ParentRole;
pub use relationship::{GuardianValidator, RelationshipResolver};
pub use verdict::{EligibilityVerdict, ReasonCode};

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use super::collaborators::{
    FieldFetchError, FieldStore, IdentityLookupError, NinUsageGuard, UsageCheckError,
};
use super::demographics::decode_first_value;
use super::domain::{
    fields, ApplicantRecord, CitizenshipClaim, IdentityDocument, Nin, RegistrationId,
};

/// Failure raised while evaluating a registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    FieldFetch(#[from] FieldFetchError),
    #[error(transparent)]
    IdentityLookup(#[from] IdentityLookupError),
    #[error(transparent)]
    UsageCheck(#[from] UsageCheckError),
    #[error("registry document field `{field}` is malformed: {reason}")]
    MalformedDocument { field: &'static str, reason: String },
}

impl EvaluationError {
    /// Collaborator outages that the pipeline should retry. Everything else is contained
    /// inside the sub-check that raised it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EvaluationError::FieldFetch(_) | EvaluationError::IdentityLookup(_)
        )
    }
}

/// Stateless rule engine over the packet store and NIN usage collaborators.
pub struct CitizenshipEligibilityEngine<S, G> {
    store: Arc<S>,
    usage: Arc<G>,
    config: EligibilityConfig,
}

impl<S, G> CitizenshipEligibilityEngine<S, G>
where
    S: FieldStore,
    G: NinUsageGuard,
{
    pub fn new(store: Arc<S>, usage: Arc<G>, config: EligibilityConfig) -> Self {
        Self {
            store,
            usage,
            config,
        }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Fetch the applicant's fields and produce a verdict.
    pub fn evaluate(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let record = self.applicant_record(registration_id)?;
        self.evaluate_record(&record)
    }

    /// Materialise the applicant snapshot with one batched field fetch.
    pub fn applicant_record(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<ApplicantRecord, EvaluationError> {
        info!(%registration_id, "starting citizenship eligibility evaluation");
        let values = self
            .store
            .get_fields(registration_id, &fields::APPLICANT_FIELDS)?;
        Ok(ApplicantRecord::from_fields(registration_id.clone(), &values))
    }

    /// Evaluate an already materialised record.
    pub fn evaluate_record(
        &self,
        record: &ApplicantRecord,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let registration_id = &record.registration_id;

        if record.citizenship != CitizenshipClaim::ByBirth {
            info!(%registration_id, "applicant is not claiming citizenship by birth");
            return Ok(EligibilityVerdict::fail(
                ReasonCode::NotCitizenByBirth,
                "citizenship type is not by birth",
            ));
        }

        let Some(applicant_dob) = record
            .date_of_birth
            .as_deref()
            .and_then(|raw| self.parse_date(raw))
        else {
            warn!(%registration_id, "applicant date of birth missing or unparseable");
            return Ok(EligibilityVerdict::fail(
                ReasonCode::InvalidDob,
                format!(
                    "expected applicant date of birth in format {}",
                    self.config.date_format
                ),
            ));
        };

        let verdict = if record.has_parent_nin() {
            info!(%registration_id, "at least one parent NIN supplied, validating parents");
            self.evaluate_parent(record, applicant_dob)?
        } else {
            info!(%registration_id, "no parent NIN supplied, validating guardian");
            self.evaluate_guardian(record, applicant_dob)?
        };

        info!(
            %registration_id,
            eligible = verdict.eligible,
            reason = %verdict.reason,
            "citizenship eligibility evaluated"
        );
        Ok(verdict)
    }

    pub(crate) fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), &self.config.date_format).ok()
    }

    /// Date of birth on a registry document. Absent or unparseable text yields `None`;
    /// a non-textual value is a malformed document.
    pub(crate) fn registry_date_of_birth(
        &self,
        document: &IdentityDocument,
    ) -> Result<Option<NaiveDate>, EvaluationError> {
        match document.get(fields::DATE_OF_BIRTH) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => Ok(self.parse_date(raw)),
            Some(other) => Err(EvaluationError::MalformedDocument {
                field: fields::DATE_OF_BIRTH,
                reason: format!("expected a date string, found {other}"),
            }),
        }
    }

    /// Sub-check boundary: retryable outages propagate, anything else becomes a
    /// `PROCESSING_ERROR` verdict for this branch only.
    pub(crate) fn contain(
        &self,
        record: &ApplicantRecord,
        branch: &str,
        outcome: Result<EligibilityVerdict, EvaluationError>,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        match outcome {
            Ok(verdict) => Ok(verdict),
            Err(error) if error.is_retryable() => Err(error),
            Err(error) => {
                warn!(
                    registration_id = %record.registration_id,
                    branch,
                    %error,
                    "error while processing reference person"
                );
                Ok(EligibilityVerdict::fail(
                    ReasonCode::ProcessingError,
                    format!("{branch}: {error}"),
                ))
            }
        }
    }
}

/// References the application cites on the path the engine takes, each with the role
/// passed to the usage guard: every supplied parent NIN, otherwise the guardian NIN under
/// its decoded relationship.
pub fn cited_references(record: &ApplicantRecord) -> Vec<(Nin, String)> {
    if record.has_parent_nin() {
        return [
            (ParentRole::Father, record.father_nin.as_ref()),
            (ParentRole::Mother, record.mother_nin.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, nin)| nin.map(|nin| (nin.clone(), role.label().to_string())))
        .collect();
    }

    let relationship = record
        .guardian_relationship
        .as_deref()
        .and_then(decode_first_value);
    match (record.guardian_nin.as_ref(), relationship) {
        (Some(nin), Some(relationship)) => vec![(nin.clone(), relationship)],
        _ => Vec::new(),
    }
}
