//! Legacy alias-based ingest path.
//!
//! Predates the keyword resolver and keeps its own contract: an explicit
//! superset of required columns resolved by exact alias renaming, missing
//! timestamps substituted with the current time, and a flat additive
//! severity + exploit-bonus score capped at 10. Not the canonical risk
//! model — the two paths are deliberately not unified.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::fields::parse_timestamp;
use crate::table::RawTable;

/// Canonical columns this path requires. `exploit_available` is
/// synthesized as false when absent rather than reported missing.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "asset_id",
    "asset_type",
    "severity",
    "source",
    "timestamp",
    "vuln_id",
    "exploit_available",
];

/// Built-in raw-name → canonical-name aliases.
const BUILTIN_ALIASES: [(&str, &str); 24] = [
    ("AssetID", "asset_id"),
    ("Host", "asset_id"),
    ("Hostname", "asset_id"),
    ("Device", "asset_id"),
    ("IP", "asset_id"),
    ("Type", "asset_type"),
    ("AssetType", "asset_type"),
    ("Asset_Type", "asset_type"),
    ("Category", "asset_type"),
    ("Severity", "severity"),
    ("SeverityLevel", "severity"),
    ("Risk", "severity"),
    ("Scanner", "source"),
    ("Tool", "source"),
    ("Source", "source"),
    ("Time", "timestamp"),
    ("Timestamp", "timestamp"),
    ("Date", "timestamp"),
    ("VulnID", "vuln_id"),
    ("CVE", "vuln_id"),
    ("PluginID", "vuln_id"),
    ("Vulnerability", "vuln_id"),
    ("Exploit", "exploit_available"),
    ("ExploitAvailable", "exploit_available"),
];

/// Severity words for the additive score.
const SEVERITY_SCORES: [(&str, i64); 5] = [
    ("critical", 10),
    ("high", 8),
    ("medium", 5),
    ("low", 2),
    ("info", 1),
];

const EXPLOIT_BONUS: i64 = 2;
const MAX_RISK_SCORE: i64 = 10;

/// Extra aliases merged over the built-ins. Loaded from a TOML
/// `[aliases]` table of raw-name → canonical-name entries.
#[derive(Debug, Default, Deserialize)]
pub struct AliasMap {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn from_toml(content: &str) -> Result<Self, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::MappingParse(e.to_string()))
    }

    /// Canonical name for a raw column, if any. User entries shadow the
    /// built-ins.
    fn canonical(&self, raw: &str) -> Option<&str> {
        if let Some(canonical) = self.aliases.get(raw) {
            return Some(canonical.as_str());
        }
        BUILTIN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == raw)
            .map(|(_, canonical)| *canonical)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyRecord {
    pub asset_id: String,
    pub asset_type: String,
    /// Lowercased and trimmed before scoring.
    pub severity: String,
    pub source: String,
    /// Unparseable input timestamps become the ingest time — this path
    /// substitutes "now", unlike the canonical normalizer.
    pub timestamp: DateTime<Utc>,
    pub vuln_id: String,
    pub exploit_available: String,
    /// Additive severity + exploit-bonus score, capped at 10.
    pub risk_score: i64,
    /// Non-canonical input columns, passed through untouched.
    #[serde(skip)]
    pub extra: BTreeMap<String, String>,
}

/// Ingest output. Fixed canonical columns, then pass-through columns in
/// sorted order.
#[derive(Debug, Clone, Default)]
pub struct LegacyTable {
    pub records: Vec<LegacyRecord>,
}

impl LegacyTable {
    /// Union of pass-through column names across all records, sorted.
    pub fn extra_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.extra.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Run the legacy path: alias renaming, required-column validation,
/// value normalization, additive risk scoring.
pub fn ingest(table: &RawTable, aliases: &AliasMap) -> Result<LegacyTable, EngineError> {
    let mut resolved: BTreeMap<&str, usize> = BTreeMap::new();
    for canonical in REQUIRED_COLUMNS {
        let found = table.columns().iter().position(|column| {
            column == canonical || aliases.canonical(column) == Some(canonical)
        });
        if let Some(idx) = found {
            resolved.insert(canonical, idx);
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| **c != "exploit_available" && !resolved.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::MissingColumns(missing));
    }

    let canonical_indices: Vec<usize> = resolved.values().copied().collect();
    let now = Utc::now();

    let mut records = Vec::with_capacity(table.row_count());
    for row in table.rows() {
        let cell = |canonical: &str| resolved.get(canonical).map(|&i| &row[i]);

        let severity = cell("severity")
            .map(|v| v.as_text().trim().to_lowercase())
            .unwrap_or_default();
        let exploit_available = cell("exploit_available")
            .map(|v| v.as_text())
            .unwrap_or_else(|| "false".to_string());
        let timestamp = cell("timestamp").and_then(parse_timestamp).unwrap_or(now);
        let risk_score = risk_score(&severity, &exploit_available);

        let mut extra = BTreeMap::new();
        for (idx, column) in table.columns().iter().enumerate() {
            if !canonical_indices.contains(&idx) {
                extra.insert(column.clone(), row[idx].as_text());
            }
        }

        records.push(LegacyRecord {
            asset_id: cell("asset_id").map(|v| v.as_text()).unwrap_or_default(),
            asset_type: cell("asset_type")
                .map(|v| v.as_text().trim().to_string())
                .unwrap_or_default(),
            severity,
            source: cell("source")
                .map(|v| v.as_text().trim().to_string())
                .unwrap_or_default(),
            timestamp,
            vuln_id: cell("vuln_id").map(|v| v.as_text()).unwrap_or_default(),
            exploit_available,
            risk_score,
            extra,
        });
    }

    Ok(LegacyTable { records })
}

fn risk_score(severity: &str, exploit_available: &str) -> i64 {
    let base = SEVERITY_SCORES
        .iter()
        .find(|(word, _)| *word == severity)
        .map(|(_, score)| *score)
        .unwrap_or(1);
    let exploited = matches!(
        exploit_available.to_lowercase().as_str(),
        "true" | "1" | "yes"
    );
    let bonus = if exploited { EXPLOIT_BONUS } else { 0 };
    (base + bonus).min(MAX_RISK_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(
                row.iter()
                    .map(|v| if v.is_empty() { Value::Empty } else { Value::Text(v.to_string()) })
                    .collect(),
            );
        }
        t
    }

    #[test]
    fn aliases_rename_and_score() {
        let t = table(
            &["Hostname", "Type", "Severity", "Scanner", "Time", "CVE", "Exploit"],
            &[&["srv01", "server", "Critical", "nessus", "2024-05-01", "CVE-2024-1", "yes"]],
        );
        let out = ingest(&t, &AliasMap::default()).unwrap();
        let r = &out.records[0];
        assert_eq!(r.asset_id, "srv01");
        assert_eq!(r.severity, "critical");
        assert_eq!(r.vuln_id, "CVE-2024-1");
        // critical (10) + exploit bonus (2), capped at 10.
        assert_eq!(r.risk_score, 10);
    }

    #[test]
    fn exploit_bonus_applies_below_cap() {
        assert_eq!(risk_score("medium", "true"), 7);
        assert_eq!(risk_score("medium", "no"), 5);
        assert_eq!(risk_score("high", "1"), 10);
        assert_eq!(risk_score("unheard-of", "false"), 1);
    }

    #[test]
    fn missing_columns_are_all_reported() {
        let t = table(&["Hostname", "Severity"], &[&["srv01", "low"]]);
        let err = ingest(&t, &AliasMap::default()).unwrap_err();
        match err {
            EngineError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["asset_type", "source", "timestamp", "vuln_id"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn exploit_available_is_synthesized_not_required() {
        let t = table(
            &["Hostname", "Type", "Severity", "Source", "Time", "CVE"],
            &[&["srv01", "server", "low", "scan", "2024-05-01", "CVE-1"]],
        );
        let out = ingest(&t, &AliasMap::default()).unwrap();
        assert_eq!(out.records[0].exploit_available, "false");
        assert_eq!(out.records[0].risk_score, 2);
    }

    #[test]
    fn unparseable_timestamp_becomes_now() {
        let t = table(
            &["Hostname", "Type", "Severity", "Source", "Time", "CVE"],
            &[&["srv01", "server", "low", "scan", "not a time", "CVE-1"]],
        );
        let before = Utc::now();
        let out = ingest(&t, &AliasMap::default()).unwrap();
        assert!(out.records[0].timestamp >= before);
    }

    #[test]
    fn user_aliases_extend_builtins() {
        let map = AliasMap::from_toml(
            r#"
[aliases]
Equipment = "asset_id"
"#,
        )
        .unwrap();
        let t = table(
            &["Equipment", "Type", "Severity", "Source", "Time", "CVE"],
            &[&["fw-3", "firewall", "high", "scan", "2024-05-01", "CVE-1"]],
        );
        let out = ingest(&t, &map).unwrap();
        assert_eq!(out.records[0].asset_id, "fw-3");
    }

    #[test]
    fn non_canonical_columns_pass_through() {
        let t = table(
            &["Hostname", "Type", "Severity", "Source", "Time", "CVE", "SiteCode"],
            &[&["srv01", "server", "low", "scan", "2024-05-01", "CVE-1", "EU-2"]],
        );
        let out = ingest(&t, &AliasMap::default()).unwrap();
        assert_eq!(out.extra_columns(), vec!["SiteCode".to_string()]);
        assert_eq!(out.records[0].extra["SiteCode"], "EU-2");
    }
}
