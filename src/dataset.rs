use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read dataset {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("dataset {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The store's business facts: company identity, catalog links, policies.
///
/// Read once at startup and never mutated. The chat responder is only allowed
/// to answer from what is in here.
#[derive(Debug, Clone)]
pub struct Dataset {
    document: Value,
}

impl Dataset {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// `company_info.name`, if the document has one.
    pub fn company_name(&self) -> Option<&str> {
        self.document
            .get("company_info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
    }

    /// Pretty-printed JSON with non-ASCII characters kept as-is.
    pub fn to_pretty_json(&self) -> String {
        // Serializing a Value cannot fail: all map keys are strings.
        serde_json::to_string_pretty(&self.document).unwrap_or_default()
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DatasetError::NotFound(path.to_path_buf())
        } else {
            DatasetError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let document = serde_json::from_str(&content).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Dataset loaded from {}", path.display());
    Ok(Dataset::new(document))
}
