//! Citizenship verification: eligibility rules, collaborator seams, and the stage facade.

pub mod age;
pub mod collaborators;
pub mod demographics;
pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod service;
pub mod usage;

#[cfg(test)]
mod tests;

pub use collaborators::{
    FieldFetchError, FieldStore, IdentityLookupError, NinUsageGuard, UsageCheckError,
};
pub use demographics::{DemographicExtractor, PersonDemographic};
pub use domain::{
    ApplicantRecord, CitizenshipClaim, IdentityDocument, Nin, RegistrationId, RelationshipClass,
};
pub use eligibility::{
    cited_references, CitizenshipEligibilityEngine, EligibilityConfig, EligibilityVerdict,
    EvaluationError, ReasonCode,
};
pub use repository::{
    AuditError, AuditEvent, AuditSink, RecordError, StageStatus, VerificationRecord,
    VerificationRepository, VerificationStatusView,
};
pub use router::verification_router;
pub use service::{CitizenshipVerificationService, VerificationServiceError};
pub use usage::NinUsageLedger;
