use crate::infra::{Fixture, InMemoryAuditSink, InMemoryVerificationRepository};
use clap::Args;
use regproc_citizenship::citizenship::{
    CitizenshipVerificationService, RegistrationId, VerificationRecord,
};
use regproc_citizenship::config::AppConfig;
use regproc_citizenship::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// JSON fixture with registrations, registry identities, and NIN usage counts
    #[arg(long)]
    pub(crate) fixtures: PathBuf,
    /// Registration to evaluate
    #[arg(long)]
    pub(crate) registration_id: String,
    /// Print the public status payload as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fixture = Fixture::load(&args.fixtures)?;
    let registration_id = RegistrationId(args.registration_id);

    let (record, audit) = verify_registration(fixture, &config, &registration_id)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record.status_view())?);
    } else {
        print!("{}", render_summary(&record));
    }
    for event in audit.events() {
        println!(
            "  Audit: {} {} ({}) {}",
            event.event_id, event.event_name, event.module_id, event.description
        );
    }
    Ok(())
}

pub(crate) fn verify_registration(
    fixture: Fixture,
    config: &AppConfig,
    registration_id: &RegistrationId,
) -> Result<(VerificationRecord, InMemoryAuditSink), AppError> {
    let (store, ledger) = fixture.into_collaborators(config.nin_usage_limit);
    let audit = InMemoryAuditSink::default();
    let service = CitizenshipVerificationService::new(
        Arc::new(store),
        Arc::new(ledger),
        Arc::new(InMemoryVerificationRepository::default()),
        Arc::new(audit.clone()),
        config.eligibility.clone(),
    );

    let record = service.process(registration_id)?;
    Ok((record, audit))
}

fn render_summary(record: &VerificationRecord) -> String {
    let view = record.status_view();
    let mut out = String::new();
    out.push_str(&format!("Citizenship verification for {}\n", view.registration_id));
    out.push_str(&format!("  Status: {}\n", view.status));
    out.push_str(&format!("  Eligible: {}\n", view.is_valid));
    if let Some(reason) = view.reason {
        out.push_str(&format!("  Reason: {reason}\n"));
    }
    out.push_str(&format!("  Rationale: {}\n", view.decision_rationale));
    out.push_str(&format!(
        "  Processed at: {}\n",
        view.processed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}
