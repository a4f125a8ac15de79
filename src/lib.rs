pub mod aggregate;
pub mod calendar;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ledger;
pub mod metadata;
pub mod month;
pub mod persistence;
pub mod record;
pub mod record_validation;
pub mod report;

pub use aggregate::{
    EmployeeAggregate, EmployeeMonthlyUtilization, OccupancyAggregator, ProjectAllocation,
    population_average_occupancy,
};
pub use calendar::{CalendarError, WorkCalendar, WorkCalendarConfig, WorkingDaysCalendar};
pub use config::{AppConfig, ConfigError};
pub use ledger::{ImportSummary, LedgerError, OccupancyLedger};
pub use metadata::LedgerMetadata;
pub use month::Month;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteOccupancyStore;
pub use persistence::{
    CsvRecordsFile, JsonRecordsFile, OccupancySource, OccupancyStore, PersistenceError,
    load_ledger_from_json, load_records_from_csv, load_records_from_json, save_ledger_to_json,
    save_records_to_csv,
};
pub use record::{Employee, MonthlyDays, OccupancyRecord, Project};
pub use report::{OccupancyReport, render_text_table};
