//! Flat-file persistence of run artifacts.
//!
//! Layout of the output directory:
//!
//! ```text
//! out/
//! ├── response.json           # verbatim property API body
//! ├── metadata_{estateID}.json
//! ├── estate_index.json       # estateID -> CID
//! ├── properties.json         # indexed properties with their CIDs
//! └── payload.hex             # aggregate ABI payload, 0x-prefixed
//! ```
//!
//! Every file is overwritten wholesale on each run. Files left by the
//! previous run are removed once a new page has been fetched, so the
//! directory never mixes two runs.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::core::payload;
use crate::domain::{PipelineError, PublishedProperty};

pub const SNAPSHOT_FILE: &str = "response.json";
pub const INDEX_FILE: &str = "estate_index.json";
pub const PROPERTIES_FILE: &str = "properties.json";
pub const PAYLOAD_FILE: &str = "payload.hex";

const METADATA_PREFIX: &str = "metadata_";

/// Writes run artifacts under a single output directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    /// Create the output directory if needed
    pub async fn open(output_dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| PipelineError::artifact(&output_dir, e))?;

        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(SNAPSHOT_FILE)
    }

    pub fn metadata_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE)
    }

    pub fn properties_path(&self) -> PathBuf {
        self.output_dir.join(PROPERTIES_FILE)
    }

    pub fn payload_path(&self) -> PathBuf {
        self.output_dir.join(PAYLOAD_FILE)
    }

    async fn write(&self, path: PathBuf, contents: &[u8]) -> Result<PathBuf, PipelineError> {
        fs::write(&path, contents)
            .await
            .map_err(|e| PipelineError::artifact(&path, e))?;
        Ok(path)
    }

    /// Remove every artifact a previous run may have left behind.
    ///
    /// Unrelated files in the output directory are kept.
    pub async fn clear_run_artifacts(&self) -> Result<usize, PipelineError> {
        let mut removed = 0;

        for path in [
            self.snapshot_path(),
            self.index_path(),
            self.properties_path(),
            self.payload_path(),
        ] {
            if remove_if_present(&path).await? {
                removed += 1;
            }
        }

        let mut entries = fs::read_dir(&self.output_dir)
            .await
            .map_err(|e| PipelineError::artifact(&self.output_dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::artifact(&self.output_dir, e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(METADATA_PREFIX)
                && name.ends_with(".json")
                && remove_if_present(&entry.path()).await?
            {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Store the response body exactly as received
    pub async fn write_snapshot(&self, raw: &str) -> Result<PathBuf, PipelineError> {
        self.write(self.snapshot_path(), raw.as_bytes()).await
    }

    /// Store one serialized metadata object
    pub async fn write_metadata(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        self.write(self.metadata_path(file_name), bytes).await
    }

    /// Store the flushed index
    pub async fn write_index(&self, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        self.write(self.index_path(), bytes).await
    }

    /// Store the list of indexed properties
    pub async fn write_properties(&self, properties: &[&PublishedProperty]) -> Result<PathBuf, PipelineError> {
        let bytes = serde_json::to_vec_pretty(properties)?;
        self.write(self.properties_path(), &bytes).await
    }

    /// Store the aggregate payload as a hex string
    pub async fn write_payload(&self, payload_bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        let text = payload::to_hex(payload_bytes);
        self.write(self.payload_path(), text.as_bytes()).await
    }
}

async fn remove_if_present(path: &Path) -> Result<bool, PipelineError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PipelineError::artifact(path, e)),
    }
}
