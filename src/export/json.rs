use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::write_atomic;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

/// Pretty-print `dataset` to `path`, atomically.
pub fn write_json(dataset: &Dataset, path: &Path) -> Result<()> {
    write_atomic(path, |tmp, file| {
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, dataset).map_err(|e| PipelineError::export(tmp, e))?;
        out.write_all(b"\n")
            .and_then(|_| out.flush())
            .map_err(|e| PipelineError::export(tmp, e))
    })?;
    debug!(path = %path.display(), records = dataset.records.len(), "wrote json");
    Ok(())
}
