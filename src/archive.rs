//! Model record persistence
//!
//! A record is stored as a single zip archive with exactly two entries:
//! `record.json` (metadata document) and `record.model` (bincode blob of the
//! fitted state). Assembly goes through in-memory buffers, so no temporary
//! files exist at any point; a failed save removes the half-written archive.

use crate::error::{AutoFitError, Result};
use crate::grid::GridPoint;
use crate::models::Estimator;
use crate::record::ModelRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Fixed name of the metadata entry
pub const METADATA_ENTRY: &str = "record.json";
/// Fixed name of the fitted-model entry
pub const MODEL_ENTRY: &str = "record.model";

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveMetadata {
    family: String,
    parameters: GridPoint,
    metrics: BTreeMap<String, f64>,
    search_duration_secs: f64,
    refit_duration_secs: f64,
}

/// Serialize `record` into a new archive at `path`.
///
/// The archive name is caller-chosen; concurrent saves to the same path are
/// not serialized here.
pub fn save(record: &ModelRecord, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_archive(record, path).map_err(|e| {
        // Never leave a half-written archive behind
        let _ = std::fs::remove_file(path);
        e
    })
}

fn write_archive(record: &ModelRecord, path: &Path) -> Result<()> {
    let metadata = ArchiveMetadata {
        family: record.family().to_string(),
        parameters: record.params().clone(),
        metrics: record.metrics().clone(),
        search_duration_secs: record.search_duration().as_secs_f64(),
        refit_duration_secs: record.refit_duration().as_secs_f64(),
    };
    let metadata_bytes = serde_json::to_vec_pretty(&metadata)?;
    let model_bytes = bincode::serialize(&record.estimator())?;

    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    writer.start_file(METADATA_ENTRY, options)?;
    writer.write_all(&metadata_bytes)?;
    writer.start_file(MODEL_ENTRY, options)?;
    writer.write_all(&model_bytes)?;
    writer.finish()?;

    Ok(())
}

/// Reload a record from an archive written by [`save`].
///
/// Fails with [`AutoFitError::ArchiveFormat`] when either expected entry is
/// missing or undecodable. Entries are read into memory, never extracted to
/// disk, so a failed load leaves no partial files behind.
pub fn load(path: impl AsRef<Path>) -> Result<ModelRecord> {
    let file = File::open(path.as_ref())?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| AutoFitError::ArchiveFormat(format!("not a readable archive: {}", e)))?;

    let metadata_bytes = read_entry(&mut archive, METADATA_ENTRY)?;
    let metadata: ArchiveMetadata = serde_json::from_slice(&metadata_bytes).map_err(|e| {
        AutoFitError::ArchiveFormat(format!("invalid metadata document: {}", e))
    })?;

    let model_bytes = read_entry(&mut archive, MODEL_ENTRY)?;
    let estimator: Option<Estimator> = bincode::deserialize(&model_bytes).map_err(|e| {
        AutoFitError::ArchiveFormat(format!("invalid model blob: {}", e))
    })?;

    if metadata.search_duration_secs < 0.0 || metadata.refit_duration_secs < 0.0 {
        return Err(AutoFitError::ArchiveFormat(
            "negative duration in metadata".to_string(),
        ));
    }

    Ok(ModelRecord::new(
        metadata.family,
        estimator,
        metadata.parameters,
        metadata.metrics,
        Duration::from_secs_f64(metadata.search_duration_secs),
        Duration::from_secs_f64(metadata.refit_duration_secs),
    ))
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => {
            AutoFitError::ArchiveFormat(format!("missing entry {:?}", name))
        }
        other => AutoFitError::ArchiveFormat(other.to_string()),
    })?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}
