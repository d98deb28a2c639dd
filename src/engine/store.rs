use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::SpeedTestError;
use super::quality::QualityAssessment;
use super::types::{ConnectionMetadata, ResultSet, SessionReport};

/// What gets persisted for a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub timestamp: DateTime<Utc>,
    pub results: ResultSet,
    pub connection_info: Option<ConnectionMetadata>,
    pub quality: QualityAssessment,
}

impl From<&SessionReport> for SavedResult {
    fn from(report: &SessionReport) -> Self {
        Self {
            timestamp: report.timestamp,
            results: report.results,
            connection_info: report.connection_info.clone(),
            quality: report.quality.clone(),
        }
    }
}

/// Keeps the most recent session result.
pub trait ResultStore: Send + Sync {
    fn save(&self, record: &SavedResult) -> Result<(), SpeedTestError>;
    fn load_last(&self) -> Result<Option<SavedResult>, SpeedTestError>;
}

/// Stores the last result as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonFileStore {
    fn save(&self, record: &SavedResult) -> Result<(), SpeedTestError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(record)?)?;
        Ok(())
    }

    fn load_last(&self) -> Result<Option<SavedResult>, SpeedTestError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    last: Mutex<Option<SavedResult>>,
}

impl ResultStore for MemoryStore {
    fn save(&self, record: &SavedResult) -> Result<(), SpeedTestError> {
        let mut last = self
            .last
            .lock()
            .map_err(|_| SpeedTestError::Other("result store lock poisoned".to_string()))?;
        *last = Some(record.clone());
        Ok(())
    }

    fn load_last(&self) -> Result<Option<SavedResult>, SpeedTestError> {
        let last = self
            .last
            .lock()
            .map_err(|_| SpeedTestError::Other("result store lock poisoned".to_string()))?;
        Ok(last.clone())
    }
}
