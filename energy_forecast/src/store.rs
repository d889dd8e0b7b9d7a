//! Persistence of the trained model artifact
//!
//! There is one artifact per model type and it is only ever replaced
//! wholesale: the new model is written to a temporary file in the same
//! directory, synced, and renamed over the old one. Readers therefore see
//! either the previous or the new model, never a partial write.

use crate::error::{ForecastError, Result};
use crate::measurement::Measurement;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;

/// On-disk envelope around a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredModel<M> {
    /// When the artifact was written
    pub saved_at: DateTime<Utc>,
    /// The model itself
    pub model: M,
}

/// Load/save access to the latest model of one type
#[derive(Debug)]
pub struct ModelStore<M> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _model: PhantomData<fn() -> M>,
}

impl<M> ModelStore<M>
where
    M: Serialize + DeserializeOwned,
{
    /// Store backed by the artifact at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _model: PhantomData,
        }
    }

    /// Store for a measurement's model inside `dir`
    pub fn for_measurement<P: AsRef<Path>>(dir: P, measurement: Measurement) -> Self {
        Self::new(dir.as_ref().join(measurement.model_file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an artifact currently exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the latest saved model
    pub fn load(&self) -> Result<M> {
        Ok(self.load_stored()?.model)
    }

    /// Load the latest saved model with its metadata
    pub fn load_stored(&self) -> Result<StoredModel<M>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ForecastError::ModelNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredModel<M> = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(path = %self.path.display(), saved_at = %stored.saved_at, "Model loaded");
        Ok(stored)
    }

    /// Atomically replace the artifact with `model`
    pub fn save(&self, model: &M) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let stored = StoredModel {
            saved_at: Utc::now(),
            model,
        };

        let mut staging = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(staging.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &stored)?;
            writer.flush()?;
        }
        staging.as_file().sync_all()?;
        staging
            .persist(&self.path)
            .map_err(|e| ForecastError::IoError(e.error))?;

        tracing::info!(path = %self.path.display(), "Model saved");
        Ok(())
    }
}
