use super::{OccupancySource, PersistenceError, PersistenceResult};
use crate::{
    calendar::WorkingDaysCalendar,
    ledger::OccupancyLedger,
    metadata::LedgerMetadata,
    month::Month,
    record::{Employee, MonthlyDays, OccupancyRecord, Project, parse_date_lenient, parse_days},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
pub(crate) struct LedgerSnapshot {
    metadata: LedgerMetadata,
    #[serde(default)]
    calendar: WorkingDaysCalendar,
    #[serde(default)]
    employees: Vec<Employee>,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    records: Vec<OccupancyRecord>,
}

impl LedgerSnapshot {
    pub(crate) fn from_ledger(ledger: &OccupancyLedger) -> PersistenceResult<Self> {
        super::validate_records(ledger.records())?;
        Ok(Self {
            metadata: ledger.metadata().clone(),
            calendar: *ledger.calendar(),
            employees: ledger.employees().to_vec(),
            projects: ledger.projects().to_vec(),
            records: ledger.records().to_vec(),
        })
    }

    pub(crate) fn into_ledger(self) -> PersistenceResult<OccupancyLedger> {
        super::validate_records(&self.records)?;
        let mut ledger =
            OccupancyLedger::new_with_metadata(self.metadata).with_calendar(self.calendar);
        for employee in self.employees {
            ledger.upsert_employee(employee)?;
        }
        for project in self.projects {
            ledger.upsert_project(project)?;
        }
        for record in self.records {
            ledger.upsert_record(record)?;
        }
        Ok(ledger)
    }
}

pub fn save_ledger_to_json<P: AsRef<Path>>(
    ledger: &OccupancyLedger,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = LedgerSnapshot::from_ledger(ledger)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_ledger_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<OccupancyLedger> {
    let file = File::open(path)?;
    let snapshot: LedgerSnapshot = serde_json::from_reader(file)?;
    snapshot.into_ledger()
}

/// Read a bare JSON array of occupancy rows, as returned by the REST backend.
pub fn load_records_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<OccupancyRecord>> {
    let file = File::open(path)?;
    let records: Vec<OccupancyRecord> = serde_json::from_reader(file)?;
    Ok(records)
}

#[derive(Default, Serialize, Deserialize)]
struct OccupancyCsvRecord {
    #[serde(default)]
    id: String,
    employee_id: String,
    project_id: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    january: String,
    #[serde(default)]
    february: String,
    #[serde(default)]
    march: String,
    #[serde(default)]
    april: String,
    #[serde(default)]
    may: String,
    #[serde(default)]
    june: String,
    #[serde(default)]
    july: String,
    #[serde(default)]
    august: String,
    #[serde(default)]
    september: String,
    #[serde(default)]
    october: String,
    #[serde(default)]
    november: String,
    #[serde(default)]
    december: String,
}

impl From<&OccupancyRecord> for OccupancyCsvRecord {
    fn from(record: &OccupancyRecord) -> Self {
        let d = |month| record.days(month).to_string();
        Self {
            id: record.id.to_string(),
            employee_id: record.employee_id.to_string(),
            project_id: record.project_id.to_string(),
            start_date: format_date(record.start_date),
            end_date: format_date(record.end_date),
            january: d(Month::January),
            february: d(Month::February),
            march: d(Month::March),
            april: d(Month::April),
            may: d(Month::May),
            june: d(Month::June),
            july: d(Month::July),
            august: d(Month::August),
            september: d(Month::September),
            october: d(Month::October),
            november: d(Month::November),
            december: d(Month::December),
        }
    }
}

impl OccupancyCsvRecord {
    fn month_values(&self) -> [&str; 12] {
        [
            self.january.as_str(),
            self.february.as_str(),
            self.march.as_str(),
            self.april.as_str(),
            self.may.as_str(),
            self.june.as_str(),
            self.july.as_str(),
            self.august.as_str(),
            self.september.as_str(),
            self.october.as_str(),
            self.november.as_str(),
            self.december.as_str(),
        ]
    }

    /// `fallback_id` is used when the id column is blank.
    fn into_record(self, fallback_id: i32) -> PersistenceResult<OccupancyRecord> {
        let id = parse_i32(&self.id)?.unwrap_or(fallback_id);
        let employee_id = parse_i32(&self.employee_id)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("row {id} is missing employee_id"))
        })?;
        let project_id = parse_i32(&self.project_id)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("row {id} is missing project_id"))
        })?;
        let days = MonthlyDays::from_array(self.month_values().map(parse_days));
        Ok(OccupancyRecord {
            id,
            employee_id,
            project_id,
            start_date: parse_date_lenient(&self.start_date),
            end_date: parse_date_lenient(&self.end_date),
            days,
        })
    }
}

pub fn save_records_to_csv<P: AsRef<Path>>(
    records: &[OccupancyRecord],
    path: P,
) -> PersistenceResult<()> {
    super::validate_records(records)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(OccupancyCsvRecord::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Month and date cells are read leniently; identity columns are not.
pub fn load_records_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<OccupancyRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut records = Vec::new();
    for (row_idx, row) in reader.deserialize::<OccupancyCsvRecord>().enumerate() {
        records.push(row?.into_record(row_idx as i32 + 1)?);
    }
    super::validate_records(&records)?;
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct JsonRecordsFile {
    path: PathBuf,
}

impl JsonRecordsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OccupancySource for JsonRecordsFile {
    fn fetch_records(&self) -> PersistenceResult<Vec<OccupancyRecord>> {
        load_records_from_json(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct CsvRecordsFile {
    path: PathBuf,
}

impl CsvRecordsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OccupancySource for CsvRecordsFile {
    fn fetch_records(&self) -> PersistenceResult<Vec<OccupancyRecord>> {
        load_records_from_csv(&self.path)
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_i32(input: &str) -> PersistenceResult<Option<i32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}
