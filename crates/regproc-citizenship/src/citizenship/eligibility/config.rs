use serde::{Deserialize, Serialize};

pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";
pub const DEFAULT_PARENT_MIN_AGE_GAP: u32 = 15;
pub const DEFAULT_GRANDPARENT_MIN_AGE_GAP: u32 = 20;

/// Rule parameters applied by the eligibility engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// chrono format string for dates of birth on forms and registry documents.
    pub date_format: String,
    pub parent_min_age_gap: u32,
    pub grandparent_min_age_gap: u32,
    /// When set, sibling and uncle/aunt guardians must also pass the tribe/clan comparison.
    pub enforce_collateral_concordance: bool,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            parent_min_age_gap: DEFAULT_PARENT_MIN_AGE_GAP,
            grandparent_min_age_gap: DEFAULT_GRANDPARENT_MIN_AGE_GAP,
            enforce_collateral_concordance: false,
        }
    }
}
