//! `rtab normalize` — canonical normalization + risk scoring.

use std::path::PathBuf;

use crate::{load_table, CliError};

pub fn cmd_normalize(
    input: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    preview: Option<usize>,
) -> Result<(), CliError> {
    if json && preview.is_some() {
        return Err(CliError::args("--preview renders CSV rows and cannot combine with --json")
            .with_hint("drop --preview, or use CSV output"));
    }

    let table = load_table(&input)?;
    let result = risktab_engine::normalize(&table);

    let rendered = if json {
        let mut s = serde_json::to_string_pretty(&result.records)
            .map_err(|e| CliError::other(format!("JSON serialization error: {e}")))?;
        s.push('\n');
        s
    } else {
        risktab_io::csv::export_string(&result).map_err(CliError::other)?
    };

    if let Some(ref path) = output {
        std::fs::write(path, &rendered)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    } else {
        print!("{rendered}");
    }

    if let Some(n) = preview {
        // Header plus the first N data rows.
        for line in rendered.lines().take(n + 1) {
            eprintln!("{line}");
        }
    }

    // Summary metrics to stderr, like the rest of the human-facing output.
    eprintln!(
        "{} rows normalized — mean risk {:.3}, max risk {:.3}",
        result.len(),
        result.mean_normalized_risk(),
        result.max_normalized_risk(),
    );

    Ok(())
}
