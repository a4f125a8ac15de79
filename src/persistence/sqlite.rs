use super::{OccupancySource, OccupancyStore, PersistenceError, PersistenceResult};
use crate::calendar::WorkingDaysCalendar;
use crate::ledger::OccupancyLedger;
use crate::metadata::LedgerMetadata;
use crate::record::{Employee, OccupancyRecord, Project};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;

pub struct SqliteOccupancyStore {
    connection: Mutex<Connection>,
}

impl SqliteOccupancyStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS ledger_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL,
                calendar_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY,
                employee_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                project_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS occupancy_records (
                id INTEGER PRIMARY KEY,
                employee_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                record_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection mutex poisoned".into()))
    }

    fn replace_rows<T: Serialize>(
        tx: &rusqlite::Transaction,
        table: &str,
        json_column: &str,
        rows: &[T],
        id_of: impl Fn(&T) -> i32,
    ) -> PersistenceResult<()> {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (id, {json_column}) VALUES (?1, ?2)"
        ))?;
        for row in rows {
            stmt.execute(params![id_of(row), serde_json::to_string(row)?])?;
        }
        Ok(())
    }

    fn save_records(
        tx: &rusqlite::Transaction,
        records: &[OccupancyRecord],
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM occupancy_records", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO occupancy_records (id, employee_id, project_id, record_json)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            let json = serde_json::to_string(record)?;
            stmt.execute(params![record.id, record.employee_id, record.project_id, json])?;
        }
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(conn: &Connection, sql: &str) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for json in rows {
            out.push(serde_json::from_str(&json?)?);
        }
        Ok(out)
    }

    fn load_all_records(conn: &Connection) -> PersistenceResult<Vec<OccupancyRecord>> {
        Self::load_rows(conn, "SELECT record_json FROM occupancy_records ORDER BY id ASC")
    }
}

impl OccupancyStore for SqliteOccupancyStore {
    fn save_ledger(&self, ledger: &OccupancyLedger) -> PersistenceResult<()> {
        super::validate_records(ledger.records())?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM ledger_metadata", [])?;
        tx.execute(
            "INSERT INTO ledger_metadata (id, metadata_json, calendar_json) VALUES (1, ?1, ?2)",
            params![
                serde_json::to_string(ledger.metadata())?,
                serde_json::to_string(ledger.calendar())?
            ],
        )?;
        Self::replace_rows(&tx, "employees", "employee_json", ledger.employees(), |e| e.id)?;
        Self::replace_rows(&tx, "projects", "project_json", ledger.projects(), |p| p.id)?;
        Self::save_records(&tx, ledger.records())?;
        tx.commit()?;
        tracing::debug!(records = ledger.records().len(), "ledger saved to sqlite");
        Ok(())
    }

    fn load_ledger(&self) -> PersistenceResult<Option<OccupancyLedger>> {
        let conn = self.lock()?;

        let header: Option<(String, String)> = conn
            .query_row(
                "SELECT metadata_json, calendar_json FROM ledger_metadata WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((metadata_json, calendar_json)) = header else {
            return Ok(None);
        };

        let metadata: LedgerMetadata = serde_json::from_str(&metadata_json)?;
        let calendar: WorkingDaysCalendar = serde_json::from_str(&calendar_json)?;
        let employees: Vec<Employee> =
            Self::load_rows(&conn, "SELECT employee_json FROM employees ORDER BY id ASC")?;
        let projects: Vec<Project> =
            Self::load_rows(&conn, "SELECT project_json FROM projects ORDER BY id ASC")?;
        let records = Self::load_all_records(&conn)?;
        super::validate_records(&records)?;

        let mut ledger = OccupancyLedger::new_with_metadata(metadata).with_calendar(calendar);
        for employee in employees {
            ledger.upsert_employee(employee)?;
        }
        for project in projects {
            ledger.upsert_project(project)?;
        }
        for record in records {
            ledger.upsert_record(record)?;
        }
        Ok(Some(ledger))
    }
}

impl OccupancySource for SqliteOccupancyStore {
    fn fetch_records(&self) -> PersistenceResult<Vec<OccupancyRecord>> {
        let conn = self.lock()?;
        Self::load_all_records(&conn)
    }
}
