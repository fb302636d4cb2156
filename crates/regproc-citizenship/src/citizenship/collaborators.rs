use std::collections::BTreeMap;

use super::domain::{IdentityDocument, Nin, RegistrationId};

/// Packet field retrieval and registry lookup, provided by the surrounding pipeline.
///
/// Calls are blocking from the engine's point of view; timeout and retry policy belong to
/// the implementing client.
pub trait FieldStore: Send + Sync {
    /// Batched retrieval of packet fields. Fields without a value are simply omitted.
    fn get_fields(
        &self,
        registration_id: &RegistrationId,
        field_names: &[&str],
    ) -> Result<BTreeMap<String, String>, FieldFetchError>;

    /// Registry lookup by NIN. `Ok(None)` means the NIN is not registered.
    fn get_identity_document(
        &self,
        nin: &Nin,
    ) -> Result<Option<IdentityDocument>, IdentityLookupError>;
}

/// Tracks how often a NIN has been cited as a parent or guardian reference.
pub trait NinUsageGuard: Send + Sync {
    fn is_overused(&self, nin: &Nin, role: &str) -> Result<bool, UsageCheckError>;

    /// Count one citation of `nin` by a processed registration. Guards backed by an
    /// external service that tracks citations itself keep the no-op default.
    fn record_citation(&self, _nin: &Nin, _role: &str) -> Result<(), UsageCheckError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldFetchError {
    #[error("packet store unavailable: {0}")]
    Unavailable(String),
    #[error("packet store request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityLookupError {
    #[error("identity repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageCheckError {
    #[error("nin usage service unavailable: {0}")]
    Unavailable(String),
}
