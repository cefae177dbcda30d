//! Smart column resolution: exact name, then keyword substring, then default.
//!
//! Priority order:
//! 1. a column literally named `canonical` (case-sensitive)
//! 2. the first column, in table order, whose lowercased name contains
//!    any keyword as a substring
//! 3. the default value repeated for every row
//!
//! The keyword scan is greedy on purpose: exactly one source column (or
//! the default) backs each canonical field, and a column like
//! `subject_area` will satisfy owner's `subject` keyword. The inputs this
//! tool targets are unlabeled enough that a stricter matcher rejects more
//! than it fixes, so the first-match behavior must not be tightened.

use crate::table::{RawTable, Value};

/// Where a resolved column came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// A column with the exact canonical name existed.
    Exact(String),
    /// First keyword-substring hit, in column order.
    Keyword { column: String, keyword: &'static str },
    /// No match; the default value backs every row.
    Default,
}

/// One value per input row, plus provenance for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub values: Vec<Value>,
    pub source: ColumnSource,
}

pub fn resolve_column(
    table: &RawTable,
    canonical: &str,
    keywords: &[&'static str],
    default: &Value,
) -> ResolvedColumn {
    if let Some(idx) = table.column_index(canonical) {
        log::debug!("resolve {canonical}: exact column match");
        return ResolvedColumn {
            values: table.column_values(idx),
            source: ColumnSource::Exact(canonical.to_string()),
        };
    }

    for (idx, column) in table.columns().iter().enumerate() {
        let lowered = column.to_lowercase();
        for &keyword in keywords {
            if lowered.contains(keyword) {
                log::debug!("resolve {canonical}: column '{column}' via keyword '{keyword}'");
                return ResolvedColumn {
                    values: table.column_values(idx),
                    source: ColumnSource::Keyword { column: column.clone(), keyword },
                };
            }
        }
    }

    log::debug!("resolve {canonical}: no match, using default");
    ResolvedColumn {
        values: vec![default.clone(); table.row_count()],
        source: ColumnSource::Default,
    }
}
