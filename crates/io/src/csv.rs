// CSV import/export
//
// Import tolerates arbitrary column sets: the first row is the header,
// duplicates are preserved in order, and cells are typed per value.
// Export always writes the full canonical header, even for zero rows.

use std::io::Read;
use std::path::Path;

use risktab_engine::legacy::LegacyTable;
use risktab_engine::{CanonicalTable, RawTable, Value, CANONICAL_COLUMNS};

pub fn import(path: &Path) -> Result<RawTable, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across
/// the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per
/// line. The delimiter that produces the most consistent field count
/// (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by field count so wider
        // splits win ties.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252 exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn import_from_string(content: &str, delimiter: u8) -> Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let headers = match records.next() {
        Some(result) => result.map_err(|e| e.to_string())?,
        None => return Ok(RawTable::default()),
    };
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut table = RawTable::new(columns);
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        table.push_row(record.iter().map(parse_cell).collect());
    }

    Ok(table)
}

/// Blank → Empty, numeric-looking → Number, everything else → Text.
fn parse_cell(field: &str) -> Value {
    if field.is_empty() {
        return Value::Empty;
    }
    match field.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(field.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Canonical export
// ---------------------------------------------------------------------------

/// Render the canonical table as UTF-8 CSV, header row included.
pub fn export_string(table: &CanonicalTable) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CANONICAL_COLUMNS).map_err(|e| e.to_string())?;

    for r in &table.records {
        let record = [
            r.asset_id.clone(),
            r.asset_type.clone(),
            r.vulnerability_id.clone(),
            r.severity.to_string(),
            r.threat_likelihood.to_string(),
            r.business_impact.to_string(),
            r.last_detected.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
            r.owner.clone(),
            r.normalized_risk.to_string(),
            r.confidence.to_string(),
        ];
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

pub fn export(table: &CanonicalTable, path: &Path) -> Result<(), String> {
    let content = export_string(table)?;
    std::fs::write(path, content).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Legacy export
// ---------------------------------------------------------------------------

/// Render a legacy ingest table: fixed canonical columns plus the
/// pass-through columns in sorted order.
pub fn export_legacy_string(table: &LegacyTable) -> Result<String, String> {
    let extra_columns = table.extra_columns();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "asset_id",
        "asset_type",
        "severity",
        "source",
        "timestamp",
        "vuln_id",
        "exploit_available",
        "risk_score",
    ];
    header.extend(extra_columns.iter().map(String::as_str));
    writer.write_record(&header).map_err(|e| e.to_string())?;

    for r in &table.records {
        let mut record = vec![
            r.asset_id.clone(),
            r.asset_type.clone(),
            r.severity.clone(),
            r.source.clone(),
            r.timestamp.to_rfc3339(),
            r.vuln_id.clone(),
            r.exploit_available.clone(),
            r.risk_score.to_string(),
        ];
        for column in &extra_columns {
            record.push(r.extra.get(column).cloned().unwrap_or_default());
        }
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

pub fn export_legacy(table: &LegacyTable, path: &Path) -> Result<(), String> {
    let content = export_legacy_string(table)?;
    std::fs::write(path, content).map_err(|e| e.to_string())
}
