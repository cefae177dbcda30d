//! `rtab ingest` — legacy alias-based ingest path.

use std::path::PathBuf;

use risktab_engine::legacy::{self, AliasMap};
use risktab_engine::EngineError;

use crate::exit_codes::{EXIT_INGEST_MAPPING, EXIT_INGEST_MISSING_COLUMNS};
use crate::{load_table, CliError};

pub fn cmd_ingest(
    input: PathBuf,
    output: Option<PathBuf>,
    mapping: Option<PathBuf>,
) -> Result<(), CliError> {
    let aliases = match mapping {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            AliasMap::from_toml(&content).map_err(|e| CliError {
                code: EXIT_INGEST_MAPPING,
                message: e.to_string(),
                hint: None,
            })?
        }
        None => AliasMap::default(),
    };

    let table = load_table(&input)?;

    let result = legacy::ingest(&table, &aliases).map_err(|e| {
        let code = match e {
            EngineError::MissingColumns(_) => EXIT_INGEST_MISSING_COLUMNS,
            EngineError::MappingParse(_) => EXIT_INGEST_MAPPING,
        };
        CliError { code, message: e.to_string(), hint: None }
            .with_hint("rename the input columns or supply --mapping aliases.toml")
    })?;

    let rendered = risktab_io::csv::export_legacy_string(&result).map_err(CliError::other)?;

    if let Some(ref path) = output {
        std::fs::write(path, &rendered)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    } else {
        print!("{rendered}");
    }

    eprintln!("{} rows ingested", result.records.len());

    Ok(())
}
