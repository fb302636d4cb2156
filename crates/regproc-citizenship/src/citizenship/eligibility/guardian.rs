use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::relationship::{GuardianValidator, RelationshipResolver};
use super::{CitizenshipEligibilityEngine, EligibilityVerdict, EvaluationError, ReasonCode};
use crate::citizenship::age::{gap_at_least, AgeGap};
use crate::citizenship::collaborators::{FieldStore, NinUsageGuard};
use crate::citizenship::demographics::{
    decode_first_value, DemographicExtractor, LineageMismatch, PersonDemographic,
};
use crate::citizenship::domain::{ApplicantRecord, IdentityDocument, Nin};

impl<S, G> CitizenshipEligibilityEngine<S, G>
where
    S: FieldStore,
    G: NinUsageGuard,
{
    /// Guardian path, used when neither parent NIN is supplied.
    pub fn evaluate_guardian(
        &self,
        record: &ApplicantRecord,
        applicant_dob: NaiveDate,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let registration_id = &record.registration_id;

        let Some(nin) = record.guardian_nin.as_ref() else {
            warn!(%registration_id, "guardian NIN missing");
            return Ok(EligibilityVerdict::fail(
                ReasonCode::GuardianNinMissing,
                "neither parent nor guardian NIN supplied",
            ));
        };

        let Some(relationship) = record
            .guardian_relationship
            .as_deref()
            .and_then(decode_first_value)
        else {
            warn!(%registration_id, "guardian relationship missing or unparseable");
            return Ok(EligibilityVerdict::fail(
                ReasonCode::GuardianRelationParseError,
                "guardian relationship to applicant could not be decoded",
            ));
        };

        info!(%registration_id, nin = %nin.masked(), %relationship, "validating guardian");
        let outcome = self.check_guardian(record, applicant_dob, nin, &relationship);
        self.contain(record, "GUARDIAN", outcome)
    }

    fn check_guardian(
        &self,
        record: &ApplicantRecord,
        applicant_dob: NaiveDate,
        nin: &Nin,
        relationship: &str,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let registration_id = &record.registration_id;

        if self.usage.is_overused(nin, relationship)? {
            warn!(
                %registration_id,
                nin = %nin.masked(),
                relationship,
                "guardian NIN usage exceeded"
            );
            return Ok(EligibilityVerdict::fail(
                ReasonCode::NinUsageExceeded,
                format!("guardian NIN cited more often than allowed as {relationship}"),
            ));
        }

        let validator = RelationshipResolver::resolve_label(relationship);
        if validator == Some(GuardianValidator::FirstCousin) {
            return Ok(first_cousin());
        }

        let Some(document) = self.store.get_identity_document(nin)? else {
            warn!(%registration_id, nin = %nin.masked(), "guardian NIN not in registry");
            return Ok(EligibilityVerdict::fail(
                ReasonCode::UinNotFound,
                "guardian NIN not found in registry",
            ));
        };

        match validator {
            Some(GuardianValidator::Grandparent) => {
                self.validate_grandparent(record, applicant_dob, relationship, &document)
            }
            Some(GuardianValidator::Sibling) => {
                Ok(self.validate_sibling(record, relationship, &document))
            }
            Some(GuardianValidator::UncleAunt) => {
                Ok(self.validate_uncle_aunt(record, relationship, &document))
            }
            Some(GuardianValidator::FirstCousin) => Ok(first_cousin()),
            None => {
                warn!(%registration_id, relationship, "no guardian validator for relationship");
                Ok(EligibilityVerdict::fail(
                    ReasonCode::GuardianValidationFailed,
                    format!("relationship '{relationship}' is not accepted for guardians"),
                ))
            }
        }
    }

    fn validate_grandparent(
        &self,
        record: &ApplicantRecord,
        applicant_dob: NaiveDate,
        relationship: &str,
        document: &IdentityDocument,
    ) -> Result<EligibilityVerdict, EvaluationError> {
        let minimum = self.config.grandparent_min_age_gap;
        let guardian_dob = self.registry_date_of_birth(document)?;

        let age_ok = guardian_dob
            .map(|dob| gap_at_least(dob, applicant_dob, minimum))
            .unwrap_or(false);
        if !age_ok {
            let gap = guardian_dob.map(|dob| AgeGap::between(dob, applicant_dob));
            warn!(
                registration_id = %record.registration_id,
                relationship,
                ?gap,
                minimum,
                "grandparent age difference check failed"
            );
            return Ok(EligibilityVerdict::fail(
                ReasonCode::AgeDifferenceFailed,
                format!("{relationship} must be at least {minimum} years older than the applicant"),
            ));
        }

        let (registry, form) = guardian_demographics(record, relationship, document);
        Ok(match registry.concordance_with(&form) {
            Ok(()) => EligibilityVerdict::pass(format!(
                "{relationship} meets age and lineage requirements"
            )),
            Err(mismatch) => lineage_failure(record, mismatch, &registry, &form),
        })
    }

    fn validate_sibling(
        &self,
        record: &ApplicantRecord,
        relationship: &str,
        document: &IdentityDocument,
    ) -> EligibilityVerdict {
        self.validate_collateral(record, relationship, document)
    }

    fn validate_uncle_aunt(
        &self,
        record: &ApplicantRecord,
        relationship: &str,
        document: &IdentityDocument,
    ) -> EligibilityVerdict {
        self.validate_collateral(record, relationship, document)
    }

    /// Siblings, uncles, and aunts: the lineage comparison is run and reported, but only
    /// gates the verdict when `enforce_collateral_concordance` is set.
    fn validate_collateral(
        &self,
        record: &ApplicantRecord,
        relationship: &str,
        document: &IdentityDocument,
    ) -> EligibilityVerdict {
        let (registry, form) = guardian_demographics(record, relationship, document);

        match registry.concordance_with(&form) {
            Ok(()) => EligibilityVerdict::pass(format!("{relationship} lineage matches the form")),
            Err(mismatch) if self.config.enforce_collateral_concordance => {
                lineage_failure(record, mismatch, &registry, &form)
            }
            Err(mismatch) => {
                let ignored = ReasonCode::from(mismatch);
                warn!(
                    registration_id = %record.registration_id,
                    relationship,
                    %ignored,
                    "lineage comparison does not gate this relationship"
                );
                EligibilityVerdict::pass(format!(
                    "{relationship} accepted; lineage comparison reported {ignored}"
                ))
            }
        }
    }
}

fn first_cousin() -> EligibilityVerdict {
    EligibilityVerdict::pass("first cousin guardian accepted after NIN usage check")
}

fn guardian_demographics(
    record: &ApplicantRecord,
    relationship: &str,
    document: &IdentityDocument,
) -> (PersonDemographic, PersonDemographic) {
    let registry =
        DemographicExtractor::from_registry(format!("{relationship} in registry"), document);
    let form = DemographicExtractor::extract(
        "Guardian on form",
        record.guardian_tribe_on_form.as_deref(),
        record.guardian_clan_on_form.as_deref(),
    );
    debug!(
        registration_id = %record.registration_id,
        ?registry,
        ?form,
        "extracted guardian demographics"
    );
    (registry, form)
}

fn lineage_failure(
    record: &ApplicantRecord,
    mismatch: LineageMismatch,
    registry: &PersonDemographic,
    form: &PersonDemographic,
) -> EligibilityVerdict {
    let reason = ReasonCode::from(mismatch);
    warn!(registration_id = %record.registration_id, %reason, "guardian lineage mismatch");
    EligibilityVerdict::fail(
        reason,
        format!("mismatch between {} and {}", registry.label, form.label),
    )
}
