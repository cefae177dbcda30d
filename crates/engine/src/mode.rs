//! RAW vs ENRICHED input detection.

use crate::table::RawTable;

/// Column names that only appear in pre-enriched risk datasets.
const ENRICHED_INDICATORS: [&str; 4] =
    ["risk_score", "likelihood", "business_impact", "severity_score"];

/// How a table's likelihood and impact are derived, decided once per
/// table and threaded into the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Unprocessed logs: likelihood from event frequency, impact from
    /// field completeness.
    Raw,
    /// Pre-enriched risk dataset: likelihood and impact resolved from
    /// the input columns.
    Enriched,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "RAW"),
            Self::Enriched => write!(f, "ENRICHED"),
        }
    }
}

/// Pure function of the column-name set; cell values are never inspected.
pub fn detect_mode(table: &RawTable) -> InputMode {
    let enriched = table
        .columns()
        .iter()
        .any(|c| ENRICHED_INDICATORS.contains(&c.as_str()));
    if enriched {
        InputMode::Enriched
    } else {
        InputMode::Raw
    }
}
