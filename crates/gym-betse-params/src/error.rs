use std::io;
use std::path::PathBuf;

/// Errors raised while parsing, resolving or rewriting configuration paths.
#[derive(thiserror::Error, Debug)]
pub enum ParamError {
    #[error("Malformed path expression '{0}'")]
    MalformedPath(String),
    #[error("Cannot traverse a {node} node at segment '{segment}'")]
    TraversalType { segment: String, node: &'static str },
    #[error("Got {keys} keys but {values} values")]
    ArityMismatch { keys: usize, values: usize },
    #[error("No list element matching '{discriminant}' found for segment '{segment}'")]
    NoMatchingElement {
        segment: String,
        discriminant: String,
    },
    #[error("Key '{0}' not found in the configuration")]
    KeyNotFound(String),
    #[error("Ambiguous key '{key}': it resolves to {candidates:?}")]
    AmbiguousKey { key: String, candidates: Vec<String> },
    #[error("Unexpected {node} node at segment '{segment}'")]
    UnexpectedNodeType { segment: String, node: &'static str },
    #[error("Failed to write configuration '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to load configuration '{path}': {source}")]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ParamError {
    pub(crate) fn load(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ParamError::DocumentLoad {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ParamError::Persist {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while reading or writing parameter tables.
#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Column '{0}' not found in the parameter table")]
    MissingColumn(String),
    #[error("Parameter table '{0}' has no rows")]
    EmptyTable(PathBuf),
    #[error("Cannot render cell value: {0}")]
    Cell(#[from] serde_json::Error),
}

pub(crate) fn invalid_data<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}
