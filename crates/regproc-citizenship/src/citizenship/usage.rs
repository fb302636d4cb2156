use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use super::collaborators::{NinUsageGuard, UsageCheckError};
use super::domain::Nin;

/// In-memory usage tracker enforcing "cited more than `limit` times".
#[derive(Debug)]
pub struct NinUsageLedger {
    limit: u32,
    counts: Mutex<HashMap<Nin, u32>>,
}

impl NinUsageLedger {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_counts(limit: u32, counts: impl IntoIterator<Item = (Nin, u32)>) -> Self {
        Self {
            limit,
            counts: Mutex::new(counts.into_iter().collect()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Record one more citation of `nin` and return the new count.
    pub fn record(&self, nin: &Nin, role: &str) -> Result<u32, UsageCheckError> {
        let mut counts = self.counts.lock().map_err(poisoned)?;
        let entry = counts.entry(nin.clone()).or_insert(0);
        *entry = entry.saturating_add(1);
        debug!(nin = %nin.masked(), role, count = *entry, "recorded nin citation");
        Ok(*entry)
    }

    pub fn count(&self, nin: &Nin) -> Result<u32, UsageCheckError> {
        let counts = self.counts.lock().map_err(poisoned)?;
        Ok(counts.get(nin).copied().unwrap_or(0))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> UsageCheckError {
    UsageCheckError::Unavailable("usage ledger lock poisoned".to_string())
}

impl NinUsageGuard for NinUsageLedger {
    fn is_overused(&self, nin: &Nin, _role: &str) -> Result<bool, UsageCheckError> {
        Ok(self.count(nin)? > self.limit)
    }

    fn record_citation(&self, nin: &Nin, role: &str) -> Result<(), UsageCheckError> {
        self.record(nin, role).map(|_| ())
    }
}
