//! Phase 2: likelihood, impact, and dataset-wide risk scoring.
//!
//! RAW-mode likelihood and the min-max rescale depend on every row, so
//! this phase consumes the full phase-1 output; it must never run
//! row-by-row interleaved with phase 1.

use std::collections::HashMap;

use crate::fields::clamp_int;
use crate::model::UNKNOWN;
use crate::resolve::resolve_column;
use crate::table::{RawTable, Value};

/// ENRICHED likelihood: resolved from the input, clamped to [1,5].
pub(crate) fn enriched_likelihood(table: &RawTable) -> Vec<i64> {
    resolve_column(table, "likelihood", &["likelihood", "probability"], &Value::Number(1.0))
        .values
        .iter()
        .map(|v| clamp_int(v.as_number(), 1.0, 1.0, 5.0))
        .collect()
}

/// ENRICHED impact: resolved from the input, clamped to [1,5].
pub(crate) fn enriched_impact(table: &RawTable) -> Vec<i64> {
    resolve_column(table, "business_impact", &["impact", "criticality"], &Value::Number(1.0))
        .values
        .iter()
        .map(|v| clamp_int(v.as_number(), 1.0, 1.0, 5.0))
        .collect()
}

/// RAW likelihood: rows whose `vulnerability_id` occurs more often land
/// in higher bins.
///
/// Rows are ranked by occurrence count, ascending, with first-appearance
/// tie-break, then the ranks are cut into five equal-population quantile
/// bins labeled 1..=5.
pub(crate) fn frequency_likelihood(vulnerability_ids: &[String]) -> Vec<i64> {
    let n = vulnerability_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in vulnerability_ids {
        *counts.entry(id.as_str()).or_insert(0) += 1;
    }

    // Stable sort keeps appearance order for equal counts.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| counts[vulnerability_ids[i].as_str()]);

    let mut bins = vec![1i64; n];
    for (pos, &row) in order.iter().enumerate() {
        bins[row] = quantile_bin(pos + 1, n);
    }
    bins
}

/// Quantile bin (1..=5) for 1-based rank `r` of `n` distinct ranks:
/// ceil(5·(r−1)/(n−1)), floored at 1.
fn quantile_bin(r: usize, n: usize) -> i64 {
    if n <= 1 {
        return 1;
    }
    let num = 5 * (r - 1);
    let den = n - 1;
    (((num + den - 1) / den) as i64).max(1)
}

/// RAW impact: completeness heuristic. 1 plus 2 per resolved key field,
/// clamped to [1,5] even though construction already bounds it.
pub(crate) fn completeness_impact(asset_ids: &[String], owners: &[String]) -> Vec<i64> {
    asset_ids
        .iter()
        .zip(owners)
        .map(|(asset_id, owner)| {
            let mut impact = 1i64;
            if asset_id != UNKNOWN {
                impact += 2;
            }
            if owner != UNKNOWN {
                impact += 2;
            }
            impact.clamp(1, 5)
        })
        .collect()
}

/// Min-max rescale of raw risk to [0,1], rounded to 4 decimal places.
/// When every row ties (min == max) the whole column is 0.0 rather than
/// a division by zero.
pub(crate) fn min_max_normalize(raw_risks: &[i64]) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (raw_risks.iter().min(), raw_risks.iter().max()) else {
        return Vec::new();
    };
    if max <= min {
        return vec![0.0; raw_risks.len()];
    }
    raw_risks
        .iter()
        .map(|&r| {
            let scaled = (r - min) as f64 / (max - min) as f64;
            (scaled * 10_000.0).round() / 10_000.0
        })
        .collect()
}

/// Fraction of the key identifying fields that resolved to real values.
/// Reflects input completeness, not risk magnitude.
pub(crate) fn confidence(asset_id: &str, owner: &str, has_last_detected: bool) -> f64 {
    let hits = u32::from(asset_id != UNKNOWN)
        + u32::from(owner != UNKNOWN)
        + u32::from(has_last_detected);
    f64::from(hits) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn frequency_bins_favor_repeated_ids() {
        // 10 rows sharing one id, 10 unique ids.
        let mut input = vec!["CVE-X"; 10];
        let unique = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        input.extend(unique);
        let bins = frequency_likelihood(&ids(&input));

        let shared = &bins[..10];
        let uniques = &bins[10..];
        assert_eq!(*shared.iter().max().unwrap(), 5);
        assert!(shared.iter().all(|&b| b >= 3), "shared bins: {shared:?}");
        assert_eq!(*uniques.iter().min().unwrap(), 1);
        assert!(uniques.iter().all(|&b| b <= 3), "unique bins: {uniques:?}");
        // Bin 5 only lands on repeated ids.
        assert!(bins.iter().enumerate().filter(|(_, &b)| b == 5).all(|(i, _)| i < 10));
    }

    #[test]
    fn frequency_single_row_is_bin_one() {
        assert_eq!(frequency_likelihood(&ids(&["only"])), vec![1]);
    }

    #[test]
    fn frequency_ties_break_by_appearance() {
        // All counts equal: ranks follow row order, bins ascend.
        let bins = frequency_likelihood(&ids(&["a", "b", "c", "d", "e"]));
        assert_eq!(bins, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn completeness_impact_steps() {
        let impacts = completeness_impact(
            &ids(&["srv01", "UNKNOWN", "srv02", "UNKNOWN"]),
            &ids(&["alice", "bob", "UNKNOWN", "UNKNOWN"]),
        );
        assert_eq!(impacts, vec![5, 3, 3, 1]);
    }

    #[test]
    fn min_max_endpoints() {
        assert_eq!(min_max_normalize(&[10, 100]), vec![0.0, 1.0]);
        assert_eq!(min_max_normalize(&[10, 55, 100]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn min_max_all_tied_is_zero() {
        assert_eq!(min_max_normalize(&[27, 27, 27]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_normalize(&[42]), vec![0.0]);
    }

    #[test]
    fn min_max_rounds_to_four_places() {
        // 1/3 of the way between 0 and 3.
        assert_eq!(min_max_normalize(&[0, 1, 3]), vec![0.0, 0.3333, 1.0]);
    }

    #[test]
    fn confidence_counts_resolved_fields() {
        assert_eq!(confidence("srv01", "alice", true), 1.0);
        assert_eq!(confidence("srv01", "UNKNOWN", false), 1.0 / 3.0);
        assert_eq!(confidence("UNKNOWN", "UNKNOWN", false), 0.0);
    }
}
