use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CitizenshipEligibilityEngine, EligibilityVerdict, EvaluationError, ReasonCode};
use crate::citizenship::age::{gap_at_least, AgeGap};
use crate::citizenship::collaborators::{FieldStore, NinUsageGuard};
use crate::citizenship::demographics::DemographicExtractor;
use crate::citizenship::domain::{ApplicantRecord, Nin};

/// Parent cited on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParentRole {
    Father,
    Mother,
}

impl ParentRole {
    /// Role name passed to the usage guard.
    pub fn label(&self) -> &'static str {
        match self {
            ParentRole::Father => "FATHER",
            ParentRole::Mother => "MOTHER",
        }
    }
}

impl<S, G> CitizenshipEligibilityEngine<S, G>
where
    S: FieldStore,
    G: NinUsageGuard,
{
    /// Father first; the mother is tried only when the father is absent or fails.
    pub fn evaluate_parent(
        &self,
        record: &ApplicantRecord,
        applicant_dob: NaiveDate,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let mut last_failure = None;

        for (role, nin) in [
            (ParentRole::Father, record.father_nin.as_ref()),
            (ParentRole::Mother, record.mother_nin.as_ref()),
        ] {
            let Some(nin) = nin else {
                continue;
            };

            let outcome = self.check_parent(record, applicant_dob, role, nin);
            let verdict = self.contain(record, role.label(), outcome)?;
            if verdict.eligible {
                return Ok(verdict);
            }

            info!(
                registration_id = %record.registration_id,
                role = role.label(),
                reason = %verdict.reason,
                "parent validation failed"
            );
            last_failure = Some(verdict);
        }

        Ok(last_failure.unwrap_or_else(|| {
            EligibilityVerdict::fail(ReasonCode::ProcessingError, "no parent NIN supplied")
        }))
    }

    fn check_parent(
        &self,
        record: &ApplicantRecord,
        applicant_dob: NaiveDate,
        role: ParentRole,
        nin: &Nin,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let registration_id = &record.registration_id;

        if self.usage.is_overused(nin, role.label())? {
            warn!(
                %registration_id,
                role = role.label(),
                nin = %nin.masked(),
                "parent NIN usage exceeded"
            );
            return Ok(EligibilityVerdict::fail(
                ReasonCode::NinUsageExceeded,
                format!("{} NIN cited more often than allowed", role.label()),
            ));
        }

        let Some(document) = self.store.get_identity_document(nin)? else {
            warn!(
                %registration_id,
                role = role.label(),
                nin = %nin.masked(),
                "parent NIN not in registry"
            );
            return Ok(EligibilityVerdict::fail(
                ReasonCode::UinNotFound,
                format!("{} NIN not found in registry", role.label()),
            ));
        };

        let minimum = self.config.parent_min_age_gap;
        let parent_dob = self.registry_date_of_birth(&document)?;
        let Some(parent_dob) = parent_dob.filter(|dob| gap_at_least(*dob, applicant_dob, minimum))
        else {
            let gap = parent_dob.map(|dob| AgeGap::between(dob, applicant_dob));
            warn!(
                %registration_id,
                role = role.label(),
                ?gap,
                minimum,
                "parent age difference check failed"
            );
            return Ok(EligibilityVerdict::fail(
                ReasonCode::AgeDifferenceFailed,
                format!(
                    "{} must be at least {minimum} years older than the applicant",
                    role.label()
                ),
            ));
        };

        let gap = AgeGap::between(parent_dob, applicant_dob);
        debug!(
            %registration_id,
            role = role.label(),
            years = gap.years,
            months = gap.months,
            days = gap.days,
            "parent age difference accepted"
        );

        let parent = DemographicExtractor::from_registry(
            format!("{} in registry", role.label()),
            &document,
        );
        let applicant = DemographicExtractor::extract(
            "Applicant",
            record.tribe.as_deref(),
            record.clan.as_deref(),
        );
        debug!(%registration_id, ?parent, ?applicant, "extracted parent demographics");

        match parent.concordance_with(&applicant) {
            Ok(()) => Ok(EligibilityVerdict::pass(format!(
                "{} tribe and clan match the applicant",
                role.label()
            ))),
            Err(mismatch) => {
                let reason = ReasonCode::from(mismatch);
                warn!(%registration_id, role = role.label(), %reason, "parent lineage mismatch");
                Ok(EligibilityVerdict::fail(
                    reason,
                    format!("mismatch between {} and {}", parent.label, applicant.label),
                ))
            }
        }
    }
}
