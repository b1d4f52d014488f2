//! Chart artifacts and their persistence.
//!
//! Builders produce every artifact in memory first, so a failing chart never
//! leaves a partial set of files behind.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One output file, fully rendered
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    pub fn text(file_name: &str, text: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            contents: text.into_bytes(),
        }
    }

    /// Pretty-printed JSON, non-ASCII kept as is
    pub fn json<T: Serialize + ?Sized>(file_name: &str, value: &T) -> Result<Self> {
        let text = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", file_name))?;
        Ok(Self::text(file_name, text))
    }

    /// CSV prefixed with a UTF-8 BOM so spreadsheet tools detect the encoding
    pub fn csv_with_bom(file_name: &str, csv: Vec<u8>) -> Self {
        let mut contents = "\u{feff}".as_bytes().to_vec();
        contents.extend(csv);
        Self {
            file_name: file_name.to_string(),
            contents,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

/// Write every artifact under `dir`, creating it if needed
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        debug!(path = %path.display(), bytes = artifact.contents.len(), "Writing artifact");
        std::fs::write(&path, &artifact.contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote artifact");
        written.push(path);
    }
    Ok(written)
}
