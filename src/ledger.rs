use crate::aggregate::OccupancyAggregator;
use crate::calendar::WorkingDaysCalendar;
use crate::metadata::LedgerMetadata;
use crate::month::Month;
use crate::record::{Employee, OccupancyRecord, Project};
use crate::record_validation::{self, RecordValidationError};
use crate::report::OccupancyReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] RecordValidationError),
    #[error("occupancy record {0} not found")]
    RecordNotFound(i32),
    #[error("reporting year {0} is out of range")]
    InvalidYear(i32),
    #[error("no occupancy record id left after {0}")]
    IdSpaceExhausted(i32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportSummary {
    pub fn to_cli_summary(&self) -> String {
        format!("inserted={}, updated={}", self.inserted, self.updated)
    }
}

/// Current snapshot of occupancy rows plus the identity lookup used by reports.
///
/// Rows are kept sorted by id. Derived figures are never stored here; they are
/// recomputed through [`OccupancyLedger::aggregator`] on every read.
#[derive(Debug, Clone, Default)]
pub struct OccupancyLedger {
    metadata: LedgerMetadata,
    calendar: WorkingDaysCalendar,
    employees: Vec<Employee>,
    projects: Vec<Project>,
    records: Vec<OccupancyRecord>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_metadata(metadata: LedgerMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn with_calendar(mut self, calendar: WorkingDaysCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn metadata(&self) -> &LedgerMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: LedgerMetadata) -> Result<(), LedgerError> {
        if !(1..=9999).contains(&metadata.reporting_year) {
            return Err(LedgerError::InvalidYear(metadata.reporting_year));
        }
        self.metadata = metadata;
        Ok(())
    }

    pub fn calendar(&self) -> &WorkingDaysCalendar {
        &self.calendar
    }

    pub fn set_calendar(&mut self, calendar: WorkingDaysCalendar) {
        tracing::debug!(
            total_working_days = calendar.total_working_days(),
            "working-days calendar replaced"
        );
        self.calendar = calendar;
    }

    pub fn records(&self) -> &[OccupancyRecord] {
        &self.records
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn employee(&self, id: i32) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn project(&self, id: i32) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn find_record(&self, id: i32) -> Option<&OccupancyRecord> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn next_record_id(&self) -> Result<i32, LedgerError> {
        match self.records.last() {
            Some(last) => last
                .id
                .checked_add(1)
                .ok_or(LedgerError::IdSpaceExhausted(last.id)),
            None => Ok(1),
        }
    }

    /// Insert or replace a row by id. Returns `true` when the id was new.
    pub fn upsert_record(&mut self, record: OccupancyRecord) -> Result<bool, LedgerError> {
        record_validation::validate_record(&record)?;
        let inserted = match self.records.binary_search_by_key(&record.id, |r| r.id) {
            Ok(idx) => {
                self.records[idx] = record;
                false
            }
            Err(idx) => {
                tracing::debug!(record_id = record.id, "occupancy record inserted");
                self.records.insert(idx, record);
                true
            }
        };
        Ok(inserted)
    }

    pub fn delete_record(&mut self, id: i32) -> bool {
        match self.records.binary_search_by_key(&id, |r| r.id) {
            Ok(idx) => {
                self.records.remove(idx);
                tracing::debug!(record_id = id, "occupancy record deleted");
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_month_days(&mut self, id: i32, month: Month, days: u32) -> Result<(), LedgerError> {
        let idx = self
            .records
            .binary_search_by_key(&id, |r| r.id)
            .map_err(|_| LedgerError::RecordNotFound(id))?;
        self.records[idx].days.set(month, days);
        Ok(())
    }

    /// Bulk upsert; the whole batch is validated before anything is written.
    pub fn import_records<I>(&mut self, records: I) -> Result<ImportSummary, LedgerError>
    where
        I: IntoIterator<Item = OccupancyRecord>,
    {
        let batch: Vec<OccupancyRecord> = records.into_iter().collect();
        record_validation::validate_record_collection(&batch)?;
        let mut summary = ImportSummary::default();
        for record in batch {
            if self.upsert_record(record)? {
                summary.inserted += 1;
            } else {
                summary.updated += 1;
            }
        }
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "occupancy records imported"
        );
        Ok(summary)
    }

    pub fn upsert_employee(&mut self, employee: Employee) -> Result<(), LedgerError> {
        record_validation::validate_employee(&employee)?;
        match self.employees.binary_search_by_key(&employee.id, |e| e.id) {
            Ok(idx) => self.employees[idx] = employee,
            Err(idx) => self.employees.insert(idx, employee),
        }
        Ok(())
    }

    pub fn upsert_project(&mut self, project: Project) -> Result<(), LedgerError> {
        record_validation::validate_project(&project)?;
        match self.projects.binary_search_by_key(&project.id, |p| p.id) {
            Ok(idx) => self.projects[idx] = project,
            Err(idx) => self.projects.insert(idx, project),
        }
        Ok(())
    }

    pub fn aggregator(&self) -> OccupancyAggregator<'_> {
        OccupancyAggregator::new(&self.records, &self.calendar)
    }

    pub fn report(&self) -> OccupancyReport {
        OccupancyReport::build(self)
    }
}
