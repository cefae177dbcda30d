use std::fmt;

/// Engine-boundary failures.
///
/// Per-value parse failures never appear here; they degrade to field
/// defaults inside the normalizer. Only the legacy ingest path can fail
/// hard, when required columns cannot be resolved by any alias.
#[derive(Debug)]
pub enum EngineError {
    /// Required canonical columns that no alias produced, in canonical
    /// order.
    MissingColumns(Vec<String>),
    /// An alias-mapping TOML could not be parsed.
    MappingParse(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns(columns) => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Self::MappingParse(msg) => write!(f, "alias mapping parse error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
