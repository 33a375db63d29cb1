//! Write-only hand-off artefacts for an external renderer.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

mod json;
mod parquet;

pub use self::json::write_json;
pub use self::parquet::{record_schema, write_parquet};

pub const JSON_FILE: &str = "dataset.json";
pub const PARQUET_FILE: &str = "dataset.parquet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub parquet: PathBuf,
}

/// Write every artefact for `dataset` into `dir`, creating it if needed.
pub fn export_all(dataset: &Dataset, dir: &Path) -> Result<ExportPaths> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::export(dir, e))?;
    let paths = ExportPaths {
        json: dir.join(JSON_FILE),
        parquet: dir.join(PARQUET_FILE),
    };
    write_json(dataset, &paths.json)?;
    write_parquet(dataset, &paths.parquet)?;
    info!(
        records = dataset.records.len(),
        json = %paths.json.display(),
        parquet = %paths.parquet.display(),
        "exported dataset"
    );
    Ok(paths)
}

/// Sibling temp path used for write-then-rename.
fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write through a sibling temp file, then move it over `path`. A failed
/// write removes the temp file.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path, File) -> Result<()>,
{
    let tmp = tmp_path(path);
    let file = File::create(&tmp).map_err(|e| PipelineError::export(&tmp, e))?;
    if let Err(e) = write(&tmp, file) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    commit(&tmp, path)
}

/// Move a finished temp file over `path`.
fn commit(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        PipelineError::export(path, e)
    })
}
