//! Per-generation record written next to the downloaded assets

use kiln_core::{ContentHash, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the record inside a generation's output folder
pub const RECORD_FILE: &str = "generation.toml";

/// One saved file and its digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFile {
    /// `model`, `thumbnail` or `texture`
    pub role: String,
    /// Path relative to the output folder
    pub file: String,
    /// Content hash (sha256:...)
    pub hash: String,
}

/// What produced a folder of assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub raw_prompt: String,
    pub object_prompt: String,
    pub style_prompt: String,
    pub shape_task_id: String,
    pub texture_task_id: String,
    #[serde(default)]
    pub files: Vec<RecordedFile>,
}

impl GenerationRecord {
    /// Hash `path` and add it under `role`
    pub fn add_file(&mut self, role: &str, path: &Path) -> Result<()> {
        let hash = ContentHash::from_file(path)?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        self.files.push(RecordedFile {
            role: role.to_string(),
            file,
            hash: hash.to_prefixed_hex(),
        });
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct RecordFile {
    generation: GenerationRecord,
}

/// Write `record` as `folder/generation.toml`
pub fn write_record(record: &GenerationRecord, folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(folder)?;
    let path = folder.join(RECORD_FILE);
    let content = toml::to_string_pretty(&RecordFile {
        generation: record.clone(),
    })?;
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Read a record written by `write_record`
pub fn read_record(path: &Path) -> Result<GenerationRecord> {
    let content = std::fs::read_to_string(path)?;
    let file: RecordFile = toml::from_str(&content)?;
    Ok(file.generation)
}
