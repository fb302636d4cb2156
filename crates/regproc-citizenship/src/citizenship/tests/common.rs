use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::citizenship::collaborators::{
    FieldFetchError, FieldStore, IdentityLookupError, NinUsageGuard, UsageCheckError,
};
use crate::citizenship::domain::{fields, IdentityDocument, Nin, RegistrationId};
use crate::citizenship::eligibility::{CitizenshipEligibilityEngine, EligibilityConfig};
use crate::citizenship::repository::{
    AuditError, AuditEvent, AuditSink, RecordError, VerificationRecord, VerificationRepository,
};
use crate::citizenship::router::verification_router;
use crate::citizenship::service::CitizenshipVerificationService;

pub(super) const APPLICANT_DOB: &str = "2005/06/01";
pub(super) const FATHER_NIN: &str = "CM75000000FATH";
pub(super) const MOTHER_NIN: &str = "CF78000000MOTH";
pub(super) const GUARDIAN_NIN: &str = "CM60000000GUAR";

pub(super) fn rid(value: &str) -> RegistrationId {
    RegistrationId(value.to_string())
}

pub(super) fn nin(value: &str) -> Nin {
    Nin(value.to_string())
}

/// Encode a value the way the registration client stores multi-language fields.
pub(super) fn encoded(value: &str) -> String {
    format!(r#"[{{"language":"eng","value":"{value}"}}]"#)
}

/// Packet fields for a by-birth applicant of the Acholi tribe, Payira clan.
pub(super) struct ApplicantFields(BTreeMap<String, String>);

impl ApplicantFields {
    pub(super) fn by_birth() -> Self {
        Self(BTreeMap::new())
            .encoded(fields::APPLICANT_CITIZENSHIP_TYPE, "Birth")
            .raw(fields::DATE_OF_BIRTH, APPLICANT_DOB)
            .encoded(fields::APPLICANT_TRIBE, "Acholi")
            .encoded(fields::APPLICANT_CLAN, "Payira")
    }

    pub(super) fn raw(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub(super) fn encoded(self, key: &str, value: &str) -> Self {
        let value = encoded(value);
        self.raw(key, &value)
    }

    pub(super) fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub(super) fn father(self) -> Self {
        self.raw(fields::FATHER_NIN, FATHER_NIN)
    }

    pub(super) fn mother(self) -> Self {
        self.raw(fields::MOTHER_NIN, MOTHER_NIN)
    }

    /// Guardian cited with the given relationship, declared on the form as Acholi/Payira.
    pub(super) fn guardian(self, relationship: &str) -> Self {
        self.raw(fields::GUARDIAN_NIN, GUARDIAN_NIN)
            .encoded(fields::GUARDIAN_RELATION_TO_APPLICANT, relationship)
            .encoded(fields::GUARDIAN_TRIBE_FORM, "Acholi")
            .encoded(fields::GUARDIAN_CLAN_FORM, "Payira")
    }

    pub(super) fn build(self) -> BTreeMap<String, String> {
        self.0
    }
}

pub(super) fn registry_document(
    date_of_birth: &str,
    tribe: Option<&str>,
    clan: Option<&str>,
) -> IdentityDocument {
    let mut document = Map::new();
    document.insert(fields::DATE_OF_BIRTH.to_string(), json!(date_of_birth));
    if let Some(tribe) = tribe {
        document.insert(fields::REGISTRY_TRIBE.to_string(), json!(encoded(tribe)));
    }
    if let Some(clan) = clan {
        document.insert(fields::REGISTRY_CLAN.to_string(), json!(encoded(clan)));
    }
    IdentityDocument(document)
}

/// Packet store fake that records every registry lookup.
#[derive(Default)]
pub(super) struct MemoryFieldStore {
    registrations: HashMap<RegistrationId, BTreeMap<String, String>>,
    identities: HashMap<Nin, IdentityDocument>,
    lookups: Mutex<Vec<Nin>>,
    unreachable_registry: bool,
}

impl MemoryFieldStore {
    pub(super) fn with_registration(
        mut self,
        registration_id: &str,
        values: BTreeMap<String, String>,
    ) -> Self {
        self.registrations.insert(rid(registration_id), values);
        self
    }

    pub(super) fn with_identity(mut self, holder: &str, document: IdentityDocument) -> Self {
        self.identities.insert(nin(holder), document);
        self
    }

    pub(super) fn with_unreachable_registry(mut self) -> Self {
        self.unreachable_registry = true;
        self
    }

    pub(super) fn lookups(&self) -> Vec<Nin> {
        self.lookups.lock().expect("lookup mutex poisoned").clone()
    }
}

impl FieldStore for MemoryFieldStore {
    fn get_fields(
        &self,
        registration_id: &RegistrationId,
        field_names: &[&str],
    ) -> Result<BTreeMap<String, String>, FieldFetchError> {
        let stored = self
            .registrations
            .get(registration_id)
            .cloned()
            .unwrap_or_default();
        Ok(stored
            .into_iter()
            .filter(|(key, _)| field_names.iter().any(|name| *name == key.as_str()))
            .collect())
    }

    fn get_identity_document(
        &self,
        nin: &Nin,
    ) -> Result<Option<IdentityDocument>, IdentityLookupError> {
        self.lookups
            .lock()
            .expect("lookup mutex poisoned")
            .push(nin.clone());
        if self.unreachable_registry {
            return Err(IdentityLookupError::Unavailable("idrepo offline".to_string()));
        }
        Ok(self.identities.get(nin).cloned())
    }
}

pub(super) struct UnavailableFieldStore;

impl FieldStore for UnavailableFieldStore {
    fn get_fields(
        &self,
        _registration_id: &RegistrationId,
        _field_names: &[&str],
    ) -> Result<BTreeMap<String, String>, FieldFetchError> {
        Err(FieldFetchError::Unavailable("packet manager offline".to_string()))
    }

    fn get_identity_document(
        &self,
        _nin: &Nin,
    ) -> Result<Option<IdentityDocument>, IdentityLookupError> {
        Ok(None)
    }
}

/// Usage guard fake with scripted answers per NIN.
#[derive(Default)]
pub(super) struct ScriptedUsage {
    overused: HashSet<Nin>,
    failing: HashSet<Nin>,
    calls: Mutex<Vec<(Nin, String)>>,
}

impl ScriptedUsage {
    pub(super) fn overused(mut self, holder: &str) -> Self {
        self.overused.insert(nin(holder));
        self
    }

    pub(super) fn failing(mut self, holder: &str) -> Self {
        self.failing.insert(nin(holder));
        self
    }

    pub(super) fn calls(&self) -> Vec<(Nin, String)> {
        self.calls.lock().expect("usage mutex poisoned").clone()
    }
}

impl NinUsageGuard for ScriptedUsage {
    fn is_overused(&self, nin: &Nin, role: &str) -> Result<bool, UsageCheckError> {
        self.calls
            .lock()
            .expect("usage mutex poisoned")
            .push((nin.clone(), role.to_string()));
        if self.failing.contains(nin) {
            return Err(UsageCheckError::Unavailable("usage service timeout".to_string()));
        }
        Ok(self.overused.contains(nin))
    }
}

pub(super) fn engine(
    store: MemoryFieldStore,
    usage: ScriptedUsage,
) -> (
    CitizenshipEligibilityEngine<MemoryFieldStore, ScriptedUsage>,
    Arc<MemoryFieldStore>,
    Arc<ScriptedUsage>,
) {
    engine_with_config(store, usage, EligibilityConfig::default())
}

pub(super) fn engine_with_config(
    store: MemoryFieldStore,
    usage: ScriptedUsage,
    config: EligibilityConfig,
) -> (
    CitizenshipEligibilityEngine<MemoryFieldStore, ScriptedUsage>,
    Arc<MemoryFieldStore>,
    Arc<ScriptedUsage>,
) {
    let store = Arc::new(store);
    let usage = Arc::new(usage);
    let engine = CitizenshipEligibilityEngine::new(store.clone(), usage.clone(), config);
    (engine, store, usage)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<RegistrationId, VerificationRecord>>>,
}

impl VerificationRepository for MemoryRepository {
    fn upsert(&self, record: VerificationRecord) -> Result<(), RecordError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.registration_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<VerificationRecord>, RecordError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl VerificationRepository for UnavailableRepository {
    fn upsert(&self, _record: VerificationRecord) -> Result<(), RecordError> {
        Err(RecordError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RegistrationId) -> Result<Option<VerificationRecord>, RecordError> {
        Err(RecordError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAudit {
    pub(super) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) type TestService =
    CitizenshipVerificationService<MemoryFieldStore, ScriptedUsage, MemoryRepository, MemoryAudit>;

/// Store holding one passing registration ("10001") and one failing on clan ("10002").
pub(super) fn seeded_store() -> MemoryFieldStore {
    MemoryFieldStore::default()
        .with_registration("10001", ApplicantFields::by_birth().father().build())
        .with_registration(
            "10002",
            ApplicantFields::by_birth()
                .father()
                .encoded(fields::APPLICANT_CLAN, "Atyak")
                .build(),
        )
        .with_identity(
            FATHER_NIN,
            registry_document("1975/06/01", Some("Acholi"), Some("Payira")),
        )
}

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryAudit>) {
    let repository = Arc::new(MemoryRepository::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = CitizenshipVerificationService::new(
        Arc::new(seeded_store()),
        Arc::new(ScriptedUsage::default()),
        repository.clone(),
        audit.clone(),
        EligibilityConfig::default(),
    );
    (service, repository, audit)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    verification_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
