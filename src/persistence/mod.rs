use crate::ledger::{LedgerError, OccupancyLedger};
use crate::record::OccupancyRecord;
use crate::record_validation;
use serde_json::Error as SerdeJsonError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<LedgerError> for PersistenceError {
    fn from(value: LedgerError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait OccupancyStore {
    fn save_ledger(&self, ledger: &OccupancyLedger) -> PersistenceResult<()>;
    fn load_ledger(&self) -> PersistenceResult<Option<OccupancyLedger>>;
}

/// Supplier of raw occupancy rows for the aggregator.
pub trait OccupancySource {
    fn fetch_records(&self) -> PersistenceResult<Vec<OccupancyRecord>>;

    /// Fetch, degrading any failure to an empty result set.
    fn fetch_or_empty(&self) -> Vec<OccupancyRecord> {
        match self.fetch_records() {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "occupancy fetch failed, using empty result set");
                Vec::new()
            }
        }
    }
}

pub fn validate_records(records: &[OccupancyRecord]) -> PersistenceResult<()> {
    record_validation::validate_record_collection(records)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    CsvRecordsFile, JsonRecordsFile, load_ledger_from_json, load_records_from_csv,
    load_records_from_json, save_ledger_to_json, save_records_to_csv,
};
