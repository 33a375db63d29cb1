use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use ::parquet::arrow::ArrowWriter;
use ::parquet::basic::Compression;
use ::parquet::file::properties::WriterProperties;
use tracing::debug;

use super::write_atomic;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

/// Column layout of the Parquet artefact: one row per unified record.
pub fn record_schema() -> Schema {
    Schema::new(vec![
        Field::new("week_end", DataType::Date32, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("virus", DataType::Utf8, false),
        Field::new("percent_positive", DataType::Float64, true),
        Field::new("cases_detected", DataType::Float64, true),
    ])
}

fn to_batch(dataset: &Dataset, schema: Arc<Schema>) -> Result<RecordBatch> {
    let records = &dataset.records;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            records
                .iter()
                .map(|r| Date32Type::from_naive_date(r.week_end))
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records.iter().map(|r| r.region.code()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            records.iter().map(|r| r.virus.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.percent_positive).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.cases_detected).collect::<Vec<_>>(),
        )),
    ];
    RecordBatch::try_new(schema, columns).map_err(|e| PipelineError::export("<record batch>", e))
}

/// Write `dataset` as a single SNAPPY-compressed Parquet file, atomically.
pub fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let schema = Arc::new(record_schema());
    let batch = to_batch(dataset, schema.clone())?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    write_atomic(path, |tmp, file| {
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
            .map_err(|e| PipelineError::export(tmp, e))?;
        writer.write(&batch).map_err(|e| PipelineError::export(tmp, e))?;
        writer.close().map_err(|e| PipelineError::export(tmp, e))?;
        Ok(())
    })?;
    debug!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}
