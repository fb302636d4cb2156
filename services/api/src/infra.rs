use metrics_exporter_prometheus::PrometheusHandle;
use regproc_citizenship::citizenship::{
    AuditError, AuditEvent, AuditSink, FieldFetchError, FieldStore, IdentityDocument,
    IdentityLookupError, Nin, NinUsageLedger, RecordError, RegistrationId, VerificationRecord,
    VerificationRepository,
};
use regproc_citizenship::error::AppError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seed data for the in-memory collaborators.
///
/// ```json
/// {
///   "registrations": { "10001": { "fatherNIN": "CM75...", "dateOfBirth": "2005/06/01" } },
///   "identities": { "CM75...": { "dateOfBirth": "1975/06/01", "tribe": "[...]" } },
///   "nin_usage": { "CM75...": 2 }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Fixture {
    #[serde(default)]
    pub(crate) registrations: HashMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub(crate) identities: HashMap<String, IdentityDocument>,
    #[serde(default)]
    pub(crate) nin_usage: HashMap<String, u32>,
}

impl Fixture {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let fixture = Self::parse(&raw)?;
        info!(
            path = %path.display(),
            registrations = fixture.registrations.len(),
            identities = fixture.identities.len(),
            "loaded verification fixture"
        );
        Ok(fixture)
    }

    pub(crate) fn parse(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Split into the packet store and a usage ledger capped at `usage_limit`.
    pub(crate) fn into_collaborators(
        self,
        usage_limit: u32,
    ) -> (FixtureFieldStore, NinUsageLedger) {
        let ledger = NinUsageLedger::with_counts(
            usage_limit,
            self.nin_usage
                .into_iter()
                .map(|(nin, count)| (Nin(nin), count)),
        );
        let store = FixtureFieldStore {
            registrations: self
                .registrations
                .into_iter()
                .map(|(id, fields)| (RegistrationId(id), fields))
                .collect(),
            identities: self
                .identities
                .into_iter()
                .map(|(nin, document)| (Nin(nin), document))
                .collect(),
        };
        (store, ledger)
    }
}

/// Packet store and identity registry backed by fixture data.
#[derive(Debug, Default)]
pub(crate) struct FixtureFieldStore {
    registrations: HashMap<RegistrationId, BTreeMap<String, String>>,
    identities: HashMap<Nin, IdentityDocument>,
}

impl FieldStore for FixtureFieldStore {
    fn get_fields(
        &self,
        registration_id: &RegistrationId,
        field_names: &[&str],
    ) -> Result<BTreeMap<String, String>, FieldFetchError> {
        let Some(stored) = self.registrations.get(registration_id) else {
            return Ok(BTreeMap::new());
        };
        Ok(field_names
            .iter()
            .filter_map(|name| {
                stored
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect())
    }

    fn get_identity_document(
        &self,
        nin: &Nin,
    ) -> Result<Option<IdentityDocument>, IdentityLookupError> {
        Ok(self.identities.get(nin).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryVerificationRepository {
    records: Arc<Mutex<HashMap<RegistrationId, VerificationRecord>>>,
}

impl VerificationRepository for InMemoryVerificationRepository {
    fn upsert(&self, record: VerificationRecord) -> Result<(), RecordError> {
        let mut guard = self.records.lock().map_err(|_| poisoned())?;
        guard.insert(record.registration_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<VerificationRecord>, RecordError> {
        let guard = self.records.lock().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }
}

fn poisoned() -> RecordError {
    RecordError::Unavailable("repository mutex poisoned".to_string())
}

/// Audit sink that logs each event and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl AuditSink for InMemoryAuditSink {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError> {
        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            module_id = %event.module_id,
            registration_id = %event.registration_id,
            "audit event published"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AuditError::Transport("audit mutex poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}

impl InMemoryAuditSink {
    pub(crate) fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regproc_citizenship::citizenship::NinUsageGuard;

    const FIXTURE: &str = r#"{
        "registrations": {
            "10001": {
                "applicantCitizenshipType": "[{\"value\":\"Birth\"}]",
                "dateOfBirth": "2005/06/01",
                "fatherNIN": "CM75000000FATH",
                "unrelatedField": "ignored"
            }
        },
        "identities": {
            "CM75000000FATH": { "dateOfBirth": "1975/06/01", "tribe": [{ "value": "Acholi" }] }
        },
        "nin_usage": { "CM75000000FATH": 6 }
    }"#;

    #[test]
    fn fixture_seeds_store_and_ledger() {
        let (store, ledger) = Fixture::parse(FIXTURE)
            .expect("fixture parses")
            .into_collaborators(5);
        let father = Nin("CM75000000FATH".to_string());

        let fields = store
            .get_fields(
                &RegistrationId("10001".to_string()),
                &["dateOfBirth", "fatherNIN", "motherNIN"],
            )
            .expect("fields fetched");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("dateOfBirth").map(String::as_str), Some("2005/06/01"));

        assert!(store
            .get_identity_document(&father)
            .expect("lookup succeeds")
            .is_some());
        assert!(ledger.is_overused(&father, "FATHER").expect("usage check"));
    }

    #[test]
    fn unknown_registrations_have_no_fields() {
        let store = FixtureFieldStore::default();
        let fields = store
            .get_fields(&RegistrationId("missing".to_string()), &["dateOfBirth"])
            .expect("fields fetched");
        assert!(fields.is_empty());
    }

    #[test]
    fn malformed_fixtures_are_rejected() {
        match Fixture::parse(r#"{ "registrations": [] }"#) {
            Err(AppError::Fixture(_)) => {}
            other => panic!("expected fixture error, got {other:?}"),
        }
    }

    #[test]
    fn audit_sink_keeps_published_events() {
        let sink = InMemoryAuditSink::default();
        let record = VerificationRecord {
            registration_id: RegistrationId("10001".to_string()),
            status: regproc_citizenship::citizenship::StageStatus::Passed,
            verdict: None,
            internal_error: false,
            error: None,
            processed_at: chrono::Utc::now(),
        };

        sink.publish(AuditEvent::for_record(&record))
            .expect("publish succeeds");

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].event_id, "RPR_402");
    }
}
