//! Phase 1: row-local canonical fields.
//!
//! Everything here is a function of one row plus the resolver output.
//! Dataset-wide fields (RAW-mode likelihood, normalized risk) live in
//! `score` and must run after this phase completes for every row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::model::{GENERIC_EVENT, NO_VULN_ID, UNKNOWN};
use crate::resolve::resolve_column;
use crate::table::{RawTable, Value};

/// Severity words used when a severity column has no numeric values at
/// all. Matched case-insensitively; unmapped words degrade to 1.
const SEVERITY_WORDS: [(&str, f64); 6] = [
    ("info", 1.0),
    ("information", 1.0),
    ("warning", 3.0),
    ("error", 6.0),
    ("critical", 9.0),
    ("fatal", 9.0),
];

/// Timestamp shapes accepted beyond RFC 3339. Naive values are taken as
/// UTC.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

fn text_column(
    table: &RawTable,
    canonical: &str,
    keywords: &[&'static str],
    default: &str,
) -> Vec<String> {
    resolve_column(table, canonical, keywords, &Value::Text(default.to_string()))
        .values
        .iter()
        .map(|v| if v.is_empty() { default.to_string() } else { v.as_text() })
        .collect()
}

pub(crate) fn asset_id_column(table: &RawTable) -> Vec<String> {
    text_column(table, "asset_id", &["asset", "host", "computer", "machine"], UNKNOWN)
}

/// Asset type passes matched cells through untouched (an empty cell in a
/// matched column stays empty); only an unmatched column defaults.
pub(crate) fn asset_type_column(table: &RawTable) -> Vec<String> {
    resolve_column(
        table,
        "asset_type",
        &["asset_type", "source", "platform"],
        &Value::Text(GENERIC_EVENT.to_string()),
    )
    .values
    .iter()
    .map(Value::as_text)
    .collect()
}

pub(crate) fn vulnerability_id_column(table: &RawTable) -> Vec<String> {
    text_column(
        table,
        "vuln_id",
        &["vuln", "cve", "event", "rule", "signature"],
        NO_VULN_ID,
    )
}

pub(crate) fn owner_column(table: &RawTable) -> Vec<String> {
    text_column(table, "owner", &["user", "account", "subject", "login"], UNKNOWN)
}

/// Clamp to `[lo, hi]` and truncate toward zero. Absent or non-finite
/// input takes the default first, so parse failure degrades before the
/// range policy applies.
pub(crate) fn clamp_int(value: Option<f64>, default: f64, lo: f64, hi: f64) -> i64 {
    let v = value.filter(|n| n.is_finite()).unwrap_or(default);
    v.clamp(lo, hi) as i64
}

/// Severity: numeric parse across the whole column; if every value fails
/// the word map takes over. Clamped to [1,10].
pub(crate) fn severity_column(table: &RawTable) -> Vec<i64> {
    let resolved = resolve_column(
        table,
        "severity",
        &["severity", "risk", "priority", "level"],
        &Value::Number(1.0),
    );
    let parsed: Vec<Option<f64>> = resolved.values.iter().map(Value::as_number).collect();

    let numeric: Vec<Option<f64>> = if !parsed.is_empty() && parsed.iter().all(Option::is_none) {
        resolved
            .values
            .iter()
            .map(|v| {
                let word = v.as_text().to_lowercase();
                SEVERITY_WORDS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
            })
            .collect()
    } else {
        parsed
    };

    numeric
        .into_iter()
        .map(|v| clamp_int(v, 1.0, 1.0, 10.0))
        .collect()
}

pub(crate) fn last_detected_column(table: &RawTable) -> Vec<Option<DateTime<Utc>>> {
    resolve_column(table, "timestamp", &["time", "date", "utc", "created"], &Value::Empty)
        .values
        .iter()
        .map(parse_timestamp)
        .collect()
}

/// Best-effort timestamp parse, normalized to UTC.
///
/// Bare numbers are Unix epoch seconds. Failure is `None` — this
/// normalizer never substitutes "now" (the legacy ingest path does, by
/// its own contract).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Empty => None,
        Value::Number(n) => epoch_seconds(*n),
        Value::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Utc.from_utc_datetime(&dt));
                }
            }
            for fmt in DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                    return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
                }
            }
            s.parse::<f64>().ok().and_then(epoch_seconds)
        }
    }
}

fn epoch_seconds(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    Utc.timestamp_opt(n as i64, 0).single()
}
