//! Canonical output schema.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Output-facing default for unresolved asset ids and owners.
pub const UNKNOWN: &str = "UNKNOWN";
/// Output-facing default for an unresolved asset type.
pub const GENERIC_EVENT: &str = "generic_event";
/// Output-facing default for an unresolved vulnerability id.
pub const NO_VULN_ID: &str = "N/A";

/// The ten serialized canonical columns, in fixed order.
///
/// `raw_risk` is engine-internal (it feeds the min-max rescale) and is
/// deliberately absent from the serialized schema.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "asset_id",
    "asset_type",
    "vulnerability_id",
    "severity",
    "threat_likelihood",
    "business_impact",
    "last_detected",
    "owner",
    "normalized_risk",
    "confidence",
];

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRecord {
    pub asset_id: String,
    pub asset_type: String,
    pub vulnerability_id: String,
    /// Clamped to [1,10].
    pub severity: i64,
    /// Clamped to [1,5].
    pub threat_likelihood: i64,
    /// Clamped to [1,5].
    pub business_impact: i64,
    /// `None` when the source value was absent or unparseable. Never
    /// substituted with "now".
    pub last_detected: Option<DateTime<Utc>>,
    pub owner: String,
    /// severity × threat_likelihood × business_impact, in [1,250].
    #[serde(skip)]
    pub raw_risk: i64,
    /// Min-max rescaled raw risk over the whole table, in [0,1].
    pub normalized_risk: f64,
    /// Fraction of {asset_id, owner, last_detected} that resolved.
    pub confidence: f64,
}

/// Normalized output table. Row order matches the input; the table is
/// rebuilt from scratch on every engine call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanonicalTable {
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean `normalized_risk`; 0.0 for an empty table.
    pub fn mean_normalized_risk(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.records.iter().map(|r| r.normalized_risk).sum();
        sum / self.records.len() as f64
    }

    /// Largest `normalized_risk`; 0.0 for an empty table.
    pub fn max_normalized_risk(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.normalized_risk)
            .fold(0.0, f64::max)
    }
}
