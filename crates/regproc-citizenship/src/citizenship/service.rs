use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use super::collaborators::{FieldStore, NinUsageGuard, UsageCheckError};
use super::domain::{ApplicantRecord, RegistrationId};
use super::eligibility::{
    cited_references, CitizenshipEligibilityEngine, EligibilityConfig, EligibilityVerdict,
    EvaluationError,
};
use super::repository::{
    AuditError, AuditEvent, AuditSink, RecordError, StageStatus, VerificationRecord,
    VerificationRepository,
};

/// Stage facade composing the eligibility engine, status repository, and audit sink.
pub struct CitizenshipVerificationService<S, G, R, A> {
    engine: Arc<CitizenshipEligibilityEngine<S, G>>,
    usage: Arc<G>,
    repository: Arc<R>,
    audit: Arc<A>,
}

impl<S, G, R, A> CitizenshipVerificationService<S, G, R, A>
where
    S: FieldStore + 'static,
    G: NinUsageGuard + 'static,
    R: VerificationRepository + 'static,
    A: AuditSink + 'static,
{
    pub fn new(
        store: Arc<S>,
        usage: Arc<G>,
        repository: Arc<R>,
        audit: Arc<A>,
        config: EligibilityConfig,
    ) -> Self {
        let engine = Arc::new(CitizenshipEligibilityEngine::new(
            store,
            Arc::clone(&usage),
            config,
        ));
        Self {
            engine,
            usage,
            repository,
            audit,
        }
    }

    pub fn engine(&self) -> &CitizenshipEligibilityEngine<S, G> {
        &self.engine
    }

    /// Evaluate a registration, store the stage outcome, and emit an audit event.
    ///
    /// Ineligible registrations are routed to manual review and reported as `Ok`. Only
    /// collaborator outages come back as errors, after the failed attempt is recorded.
    /// A passing registration counts one citation of each NIN it cites, the first time
    /// it passes.
    pub fn process(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let outcome = self.engine.applicant_record(registration_id).and_then(|applicant| {
            let verdict = self.engine.evaluate_record(&applicant)?;
            Ok((applicant, verdict))
        });
        match outcome {
            Ok((applicant, verdict)) => {
                self.record_citations(&applicant, &verdict)?;
                let status = if verdict.eligible {
                    StageStatus::Passed
                } else {
                    StageStatus::ManualReview
                };
                let record = VerificationRecord {
                    registration_id: registration_id.clone(),
                    status,
                    verdict: Some(verdict),
                    internal_error: false,
                    error: None,
                    processed_at: Utc::now(),
                };
                self.persist(&record)?;
                info!(
                    %registration_id,
                    status = status.label(),
                    "citizenship verification stage completed"
                );
                Ok(record)
            }
            Err(failure) => {
                error!(%registration_id, error = %failure, "citizenship verification failed");
                let record = VerificationRecord {
                    registration_id: registration_id.clone(),
                    status: StageStatus::Failed,
                    verdict: None,
                    internal_error: true,
                    error: Some(failure.to_string()),
                    processed_at: Utc::now(),
                };
                self.persist(&record)?;
                Err(failure.into())
            }
        }
    }

    /// Fetch the last stored outcome for a registration.
    pub fn get(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<VerificationRecord, VerificationServiceError> {
        let record = self
            .repository
            .fetch(registration_id)?
            .ok_or(RecordError::NotFound)?;
        Ok(record)
    }

    fn record_citations(
        &self,
        applicant: &ApplicantRecord,
        verdict: &EligibilityVerdict,
    ) -> Result<(), VerificationServiceError> {
        if !verdict.eligible {
            return Ok(());
        }
        let already_passed = self
            .repository
            .fetch(&applicant.registration_id)?
            .is_some_and(|previous| previous.status == StageStatus::Passed);
        if already_passed {
            return Ok(());
        }
        for (nin, role) in cited_references(applicant) {
            self.usage.record_citation(&nin, &role)?;
            info!(
                registration_id = %applicant.registration_id,
                nin = %nin.masked(),
                role = %role,
                "recorded NIN citation"
            );
        }
        Ok(())
    }

    fn persist(&self, record: &VerificationRecord) -> Result<(), VerificationServiceError> {
        self.repository.upsert(record.clone())?;
        self.audit.publish(AuditEvent::for_record(record))?;
        Ok(())
    }
}

/// Error raised by the verification service.
#[derive(Debug, thiserror::Error)]
pub enum VerificationServiceError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Usage(#[from] UsageCheckError),
}
