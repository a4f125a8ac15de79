use occupancy_tool::{
    CsvRecordsFile, Employee, JsonRecordsFile, LedgerMetadata, Month, OccupancyLedger,
    OccupancyRecord, OccupancySource, PersistenceError, Project, WorkCalendar,
    WorkingDaysCalendar, load_ledger_from_json, load_records_from_csv, render_text_table,
    save_ledger_to_json, save_records_to_csv,
};
use polars::prelude::*;
use std::fs;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn parse_days_list(s: &str) -> Option<[u32; 12]> {
    let values: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;
    values.try_into().ok()
}

fn records_table(ledger: &OccupancyLedger) -> String {
    let records = ledger.records();
    let mut columns: Vec<Column> = Vec::with_capacity(15);
    columns.push(
        Series::new("id".into(), records.iter().map(|r| r.id).collect::<Vec<_>>()).into_column(),
    );
    columns.push(
        Series::new(
            "employee_id".into(),
            records.iter().map(|r| r.employee_id).collect::<Vec<_>>(),
        )
        .into_column(),
    );
    columns.push(
        Series::new(
            "project_id".into(),
            records.iter().map(|r| r.project_id).collect::<Vec<_>>(),
        )
        .into_column(),
    );
    for month in Month::ALL {
        columns.push(
            Series::new(
                month.short_name().into(),
                records.iter().map(|r| r.days(month)).collect::<Vec<_>>(),
            )
            .into_column(),
        );
    }
    match DataFrame::new(columns) {
        Ok(df) => render_text_table(&df),
        Err(e) => format!("Error building table: {e}"),
    }
}

fn report_table(ledger: &OccupancyLedger) -> String {
    let report = ledger.report();
    match report.to_dataframe() {
        Ok(df) => format!("{}\n{}", render_text_table(&df), report.to_cli_summary()),
        Err(e) => format!("Error building report: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show occupancy records\n  report                             Show utilization report\n  employee <id> <name...>            Upsert an employee\n  project  <id> <name...>            Upsert a project\n  add <id> <employee_id> <project_id> [12 comma-separated days]\n                                     Upsert an occupancy record\n  set <id> <month> <days>            Set allocated days for one month\n  delete <id>                        Delete an occupancy record\n  month <employee_id> <month>        Monthly total and utilization\n  rate  <employee_id>                Yearly occupancy rate\n  share <employee_id> <project_id>   Project share for an employee\n  average                            Population average occupancy\n  meta show                          Show ledger metadata\n  meta year <YYYY>                   Set reporting year\n  calendar show                      Show working days per month\n  calendar set <json_path>           Load working-days table from JSON file\n  calendar save <json_path>          Save working-days table to JSON file\n  calendar derive <year> [us]        Derive table from weekdays (and US holidays)\n  save <json|csv> <path>             Persist ledger (json) or records (csv)\n  load <json|csv> <path>             Load ledger (json) or import records (csv)\n  load rows <path>                   Import rows (JSON array, .csv or .db), empty on failure\n  quit|exit                          Exit"
    );
}

fn print_calendar(calendar: &WorkingDaysCalendar) {
    for month in Month::ALL {
        println!("  {:<10} {:>3}", month.as_str(), calendar.days(month));
    }
    println!("  {:<10} {:>3}", "total", calendar.total_working_days());
}

fn print_metadata(ledger: &OccupancyLedger) {
    let metadata = ledger.metadata();
    println!("Ledger name        : {}", metadata.name);
    println!("Description        : {}", metadata.description);
    println!("Reporting year     : {}", metadata.reporting_year);
}

/// Row source for `load rows`, picked by file extension.
fn rows_source(path: &str) -> Result<Box<dyn OccupancySource>, PersistenceError> {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        return Ok(Box::new(CsvRecordsFile::new(path)));
    }
    if lower.ends_with(".db") || lower.ends_with(".sqlite") {
        return sqlite_source(path);
    }
    Ok(Box::new(JsonRecordsFile::new(path)))
}

#[cfg(feature = "sqlite")]
fn sqlite_source(path: &str) -> Result<Box<dyn OccupancySource>, PersistenceError> {
    Ok(Box::new(occupancy_tool::SqliteOccupancyStore::new(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_source(path: &str) -> Result<Box<dyn OccupancySource>, PersistenceError> {
    Err(PersistenceError::InvalidData(format!(
        "{path}: built without the `sqlite` feature"
    )))
}

/// Rows from `path`; an unreadable source yields no rows.
fn fetch_rows(path: &str) -> Vec<OccupancyRecord> {
    match rows_source(path) {
        Ok(source) => source.fetch_or_empty(),
        Err(err) => {
            tracing::warn!(error = %err, path, "row source unavailable, using empty result set");
            Vec::new()
        }
    }
}

fn rest_of_line(parts: std::str::SplitWhitespace<'_>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("occupancy_tool=info")),
        )
        .init();

    let mut ledger = OccupancyLedger::new();

    println!("Occupancy Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", records_table(&ledger)),
            "report" => println!("{}", report_table(&ledger)),
            "employee" | "project" => {
                let id = match parts.next().map(str::parse::<i32>) {
                    Some(Ok(v)) => v,
                    _ => {
                        println!("Usage: {cmd} <id> <name...>");
                        continue;
                    }
                };
                let name = rest_of_line(parts);
                let res = if cmd == "employee" {
                    ledger.upsert_employee(Employee::new(id, name))
                } else {
                    ledger.upsert_project(Project::new(id, name))
                };
                match res {
                    Ok(()) => println!("{cmd} {id} saved."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "add" => {
                let ids: Vec<Option<i32>> = (0..3)
                    .map(|_| parts.next().and_then(|s| s.parse().ok()))
                    .collect();
                let (id, employee_id, project_id) = match ids.as_slice() {
                    [Some(id), Some(e), Some(p)] => (*id, *e, *p),
                    _ => {
                        println!(
                            "Usage: add <id> <employee_id> <project_id> [12 comma-separated days]"
                        );
                        continue;
                    }
                };
                let mut record = OccupancyRecord::new(id, employee_id, project_id);
                if let Some(days_s) = parts.next() {
                    match parse_days_list(days_s) {
                        Some(days) => record.days = occupancy_tool::MonthlyDays::from_array(days),
                        None => {
                            println!("Expected 12 comma-separated non-negative integers");
                            continue;
                        }
                    }
                }
                match ledger.upsert_record(record) {
                    Ok(_) => {
                        println!("Record upserted.");
                        println!("{}", records_table(&ledger));
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "set" => {
                let (id_s, month_s, days_s) = (parts.next(), parts.next(), parts.next());
                match (id_s, month_s, days_s) {
                    (Some(id_s), Some(month_s), Some(days_s)) => {
                        let Ok(id) = id_s.parse::<i32>() else {
                            println!("Invalid id");
                            continue;
                        };
                        let Ok(month) = month_s.parse::<Month>() else {
                            println!("Invalid month");
                            continue;
                        };
                        let Ok(days) = days_s.parse::<u32>() else {
                            println!("Invalid days");
                            continue;
                        };
                        match ledger.set_month_days(id, month, days) {
                            Ok(()) => println!("{month} set.\n{}", records_table(&ledger)),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: set <id> <month> <days>"),
                }
            }
            "delete" => match parts.next().map(str::parse::<i32>) {
                Some(Ok(id)) => {
                    if ledger.delete_record(id) {
                        println!("Deleted record {id}.");
                    } else {
                        println!("Record {id} not found.");
                    }
                }
                Some(Err(_)) => println!("Invalid id"),
                None => println!("Usage: delete <id>"),
            },
            "month" => {
                let employee = parts.next().and_then(|s| s.parse::<i32>().ok());
                let month = parts.next().and_then(|s| s.parse::<Month>().ok());
                match (employee, month) {
                    (Some(employee_id), Some(month)) => {
                        let u = ledger
                            .aggregator()
                            .employee_monthly_utilization(employee_id, month);
                        let flag = if u.is_over_allocated() {
                            " (over-allocated)"
                        } else {
                            ""
                        };
                        println!(
                            "Employee {employee_id} {month}: {} of {} days, {}%{flag}",
                            u.allocated_days, u.working_days, u.utilization_percent
                        );
                    }
                    _ => println!("Usage: month <employee_id> <month>"),
                }
            }
            "rate" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(employee_id) => {
                    let agg = ledger.aggregator().employee_aggregate(employee_id);
                    println!(
                        "Employee {employee_id}: {} days, occupancy {}%",
                        agg.total_allocated_days, agg.occupancy_rate
                    );
                }
                None => println!("Usage: rate <employee_id>"),
            },
            "share" => {
                let employee = parts.next().and_then(|s| s.parse::<i32>().ok());
                let project = parts.next().and_then(|s| s.parse::<i32>().ok());
                match (employee, project) {
                    (Some(employee_id), Some(project_id)) => {
                        let share = ledger.aggregator().project_share(employee_id, project_id);
                        println!(
                            "Employee {employee_id} on project {project_id}: {} days, {}%",
                            share.total_days, share.percentage
                        );
                    }
                    _ => println!("Usage: share <employee_id> <project_id>"),
                }
            }
            "average" => {
                let report = ledger.report();
                println!("Average occupancy: {:.1}%", report.average_occupancy);
            }
            "meta" => match parts.next() {
                Some("show") => print_metadata(&ledger),
                Some("year") => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                    Some(year) => {
                        let metadata = LedgerMetadata {
                            reporting_year: year,
                            ..ledger.metadata().clone()
                        };
                        match ledger.set_metadata(metadata) {
                            Ok(()) => println!("Reporting year set to {year}."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    None => println!("Usage: meta year <YYYY>"),
                },
                _ => println!("Usage: meta <show|year>"),
            },
            "calendar" => match parts.next() {
                Some("show") => print_calendar(ledger.calendar()),
                Some("set") => match parts.next() {
                    Some(path) => match fs::read_to_string(path)
                        .map_err(|e| e.to_string())
                        .and_then(|s| {
                            serde_json::from_str::<WorkingDaysCalendar>(&s)
                                .map_err(|e| e.to_string())
                        }) {
                        Ok(calendar) => {
                            ledger.set_calendar(calendar);
                            println!("Calendar loaded from {path}.");
                        }
                        Err(e) => println!("Error loading calendar: {e}"),
                    },
                    None => println!("Usage: calendar set <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match serde_json::to_string_pretty(ledger.calendar())
                        .map_err(|e| e.to_string())
                        .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()))
                    {
                        Ok(()) => println!("Calendar saved to {path}."),
                        Err(e) => println!("Error saving calendar: {e}"),
                    },
                    None => println!("Usage: calendar save <json_path>"),
                },
                Some("derive") => {
                    let Some(year) = parts.next().and_then(|s| s.parse::<i32>().ok()) else {
                        println!("Usage: calendar derive <year> [us]");
                        continue;
                    };
                    let work_calendar = if parts.next() == Some("us") {
                        WorkCalendar::us_federal(year)
                    } else {
                        Ok(WorkCalendar::default())
                    };
                    match work_calendar
                        .and_then(|wc| WorkingDaysCalendar::from_work_calendar(&wc, year))
                    {
                        Ok(calendar) => {
                            ledger.set_calendar(calendar);
                            println!("Calendar derived for {year}.");
                            print_calendar(ledger.calendar());
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: calendar <show|set|save|derive>"),
            },
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match save_ledger_to_json(&ledger, path) {
                    Ok(()) => println!("Ledger saved to {path}."),
                    Err(e) => println!("Error saving ledger: {e}"),
                },
                (Some("csv"), Some(path)) => match save_records_to_csv(ledger.records(), path) {
                    Ok(()) => println!("Records saved to {path}."),
                    Err(e) => println!("Error saving records: {e}"),
                },
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match load_ledger_from_json(path) {
                    Ok(loaded) => {
                        ledger = loaded;
                        println!("Ledger loaded from {path}.");
                    }
                    Err(e) => println!("Error loading ledger: {e}"),
                },
                (Some("csv"), Some(path)) => {
                    match load_records_from_csv(path)
                        .map_err(|e| e.to_string())
                        .and_then(|records| {
                            ledger.import_records(records).map_err(|e| e.to_string())
                        }) {
                        Ok(summary) => {
                            println!("Records imported from {path} ({}).", summary.to_cli_summary())
                        }
                        Err(e) => println!("Error importing records: {e}"),
                    }
                }
                (Some("rows"), Some(path)) => {
                    let records = fetch_rows(path);
                    let fetched = records.len();
                    match ledger.import_records(records) {
                        Ok(summary) => println!(
                            "Rows fetched from {path}: {fetched} ({}).",
                            summary.to_cli_summary()
                        ),
                        Err(e) => println!("Error importing rows: {e}"),
                    }
                }
                _ => println!("Usage: load <json|csv|rows> <path>"),
            },
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }
}
