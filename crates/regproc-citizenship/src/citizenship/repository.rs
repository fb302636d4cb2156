use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::RegistrationId;
use super::eligibility::{EligibilityVerdict, ReasonCode};

/// Where the stage routes a processed registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// Forwarded to the next stage.
    Passed,
    /// Not eligible; routed to manual verification.
    ManualReview,
    /// Collaborator outage; left for the pipeline to retry.
    Failed,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Passed => "passed",
            StageStatus::ManualReview => "manual_review",
            StageStatus::Failed => "failed",
        }
    }
}

/// Outcome stored for a registration after the stage has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub registration_id: RegistrationId,
    pub status: StageStatus,
    pub verdict: Option<EligibilityVerdict>,
    pub internal_error: bool,
    pub error: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn is_valid(&self) -> bool {
        self.status == StageStatus::Passed
    }

    pub fn decision_rationale(&self) -> String {
        match (&self.verdict, &self.error) {
            (Some(verdict), _) => verdict.summary(),
            (None, Some(error)) => format!("evaluation failed: {error}"),
            (None, None) => "pending evaluation".to_string(),
        }
    }

    pub fn status_view(&self) -> VerificationStatusView {
        VerificationStatusView {
            registration_id: self.registration_id.clone(),
            status: self.status.label(),
            is_valid: self.is_valid(),
            reason: self.verdict.as_ref().map(|verdict| verdict.reason),
            decision_rationale: self.decision_rationale(),
            processed_at: self.processed_at,
        }
    }
}

/// Storage for stage outcomes, provided by the surrounding pipeline.
pub trait VerificationRepository: Send + Sync {
    fn upsert(&self, record: VerificationRecord) -> Result<(), RecordError>;
    fn fetch(&self, id: &RegistrationId) -> Result<Option<VerificationRecord>, RecordError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("verification record not found")]
    NotFound,
    #[error("status repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound audit hook.
pub trait AuditSink: Send + Sync {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Audit payload for one stage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub event_name: String,
    pub event_type: String,
    pub module_id: String,
    pub module_name: String,
    pub registration_id: RegistrationId,
    pub description: String,
}

pub const MODULE_NAME: &str = "CITIZENSHIP_VERIFICATION";

impl AuditEvent {
    pub fn for_record(record: &VerificationRecord) -> Self {
        let (event_id, event_name, event_type) = if record.is_valid() {
            ("RPR_402", "UPDATE", "BUSINESS")
        } else {
            ("RPR_405", "EXCEPTION", "SYSTEM")
        };
        let module_id = record
            .verdict
            .as_ref()
            .map(|verdict| verdict.reason.code())
            .unwrap_or(ReasonCode::ProcessingError.code());

        Self {
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
            event_type: event_type.to_string(),
            module_id: module_id.to_string(),
            module_name: MODULE_NAME.to_string(),
            registration_id: record.registration_id.clone(),
            description: format!(
                "{} -- {}",
                record.decision_rationale(),
                record.registration_id
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a registration's verification status.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationStatusView {
    pub registration_id: RegistrationId,
    pub status: &'static str,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    pub decision_rationale: String,
    pub processed_at: DateTime<Utc>,
}
