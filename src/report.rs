use crate::aggregate::{
    EmployeeAggregate, EmployeeMonthlyUtilization, ProjectAllocation,
    population_average_occupancy,
};
use crate::ledger::OccupancyLedger;
use crate::month::Month;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAllocationRow {
    pub project_name: String,
    #[serde(flatten)]
    pub allocation: ProjectAllocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeOccupancyRow {
    pub employee_id: i32,
    pub employee_name: String,
    pub months: Vec<EmployeeMonthlyUtilization>,
    pub aggregate: EmployeeAggregate,
    pub projects: Vec<ProjectAllocationRow>,
    pub over_allocated_months: Vec<Month>,
}

impl EmployeeOccupancyRow {
    pub fn is_over_allocated(&self) -> bool {
        !self.over_allocated_months.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyReport {
    pub reporting_year: i32,
    pub total_working_days: u64,
    pub average_occupancy: f64,
    pub over_allocated_employees: Vec<i32>,
    pub rows: Vec<EmployeeOccupancyRow>,
}

impl OccupancyReport {
    /// One row per employee in the directory or referenced by any record.
    /// Employees without records get zero rows rather than being skipped.
    pub fn build(ledger: &OccupancyLedger) -> Self {
        let aggregator = ledger.aggregator();
        let mut ids: BTreeSet<i32> = ledger.employees().iter().map(|e| e.id).collect();
        ids.extend(aggregator.employee_ids());
        let ids: Vec<i32> = ids.into_iter().collect();

        let rows: Vec<EmployeeOccupancyRow> = ids
            .par_iter()
            .map(|&employee_id| {
                let months = aggregator.monthly_breakdown(employee_id);
                let over_allocated_months = months
                    .iter()
                    .filter(|m| m.is_over_allocated())
                    .map(|m| m.month)
                    .collect();
                let projects = aggregator
                    .project_allocations(employee_id)
                    .into_iter()
                    .map(|allocation| ProjectAllocationRow {
                        project_name: ledger
                            .project(allocation.project_id)
                            .map(|p| p.name.clone())
                            .unwrap_or_default(),
                        allocation,
                    })
                    .collect();
                EmployeeOccupancyRow {
                    employee_id,
                    employee_name: ledger
                        .employee(employee_id)
                        .map(|e| e.name.clone())
                        .unwrap_or_default(),
                    months,
                    aggregate: aggregator.employee_aggregate(employee_id),
                    projects,
                    over_allocated_months,
                }
            })
            .collect();

        let rates: Vec<u32> = rows.iter().map(|r| r.aggregate.occupancy_rate).collect();
        let over_allocated_employees = rows
            .iter()
            .filter(|r| r.is_over_allocated())
            .map(|r| r.employee_id)
            .collect();

        Self {
            reporting_year: ledger.metadata().reporting_year,
            total_working_days: ledger.calendar().total_working_days(),
            average_occupancy: population_average_occupancy(&rates),
            over_allocated_employees,
            rows,
        }
    }

    pub fn row(&self, employee_id: i32) -> Option<&EmployeeOccupancyRow> {
        self.rows.iter().find(|r| r.employee_id == employee_id)
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("employees={}", self.rows.len()),
            format!("working_days={}", self.total_working_days),
            format!("avg_occupancy={:.1}%", self.average_occupancy),
        ];
        if !self.over_allocated_employees.is_empty() {
            let ids = self
                .over_allocated_employees
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("over_allocated={ids}"));
        }
        parts.join(", ")
    }

    /// Employee by month utilization matrix plus yearly totals.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(16);

        let ids: Vec<i32> = self.rows.iter().map(|r| r.employee_id).collect();
        columns.push(Series::new(PlSmallStr::from_static("employee_id"), ids).into_column());

        let names: Vec<&str> = self.rows.iter().map(|r| r.employee_name.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("employee"), names).into_column());

        for month in Month::ALL {
            let values: Vec<u32> = self
                .rows
                .iter()
                .map(|r| r.months[month.index()].utilization_percent)
                .collect();
            let name = PlSmallStr::from_static(month.short_name());
            columns.push(Series::new(name, values).into_column());
        }

        let totals: Vec<u64> = self
            .rows
            .iter()
            .map(|r| r.aggregate.total_allocated_days)
            .collect();
        columns.push(Series::new(PlSmallStr::from_static("total_days"), totals).into_column());

        let rates: Vec<u32> = self
            .rows
            .iter()
            .map(|r| r.aggregate.occupancy_rate)
            .collect();
        columns.push(Series::new(PlSmallStr::from_static("occupancy_rate"), rates).into_column());

        DataFrame::new(columns)
    }
}

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

/// Render a frame as a bordered text table for terminal output.
pub fn render_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let format_line = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format_line(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&format_line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}
