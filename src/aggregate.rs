//! Occupancy and utilization rollups over a snapshot of occupancy rows.
//!
//! Every function here is pure: it borrows the rows and the working-days table,
//! never mutates either, and never fails. Month values were normalized at decode
//! time, so the only guard needed is against a zero denominator.

use crate::calendar::WorkingDaysCalendar;
use crate::month::Month;
use crate::record::OccupancyRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeMonthlyUtilization {
    pub employee_id: i32,
    pub month: Month,
    pub allocated_days: u64,
    pub working_days: u32,
    pub utilization_percent: u32,
}

impl EmployeeMonthlyUtilization {
    /// More days recorded than the month has working days.
    pub fn is_over_allocated(&self) -> bool {
        self.utilization_percent > 100
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAggregate {
    pub employee_id: i32,
    pub total_allocated_days: u64,
    pub occupancy_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAllocation {
    pub employee_id: i32,
    pub project_id: i32,
    pub total_days: u64,
    pub percentage: u32,
}

/// `round(numerator / denominator * 100)` with half-up rounding, `0` when the
/// denominator is zero.
pub fn percent_half_up(numerator: u64, denominator: u64) -> u32 {
    scaled_half_up(numerator, denominator, 100)
}

fn scaled_half_up(numerator: u64, denominator: u64, scale: u64) -> u32 {
    if denominator == 0 || numerator == 0 {
        return 0;
    }
    let n = u128::from(numerator) * u128::from(scale);
    let d = u128::from(denominator);
    let rounded = (2 * n + d) / (2 * d);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Mean of already-rounded occupancy rates, kept to one decimal place.
/// An empty sequence averages to `0.0`.
pub fn population_average_occupancy(rates: &[u32]) -> f64 {
    if rates.is_empty() {
        return 0.0;
    }
    let sum: u64 = rates.iter().map(|&r| u64::from(r)).sum();
    let tenths = scaled_half_up(sum, rates.len() as u64, 10);
    f64::from(tenths) / 10.0
}

pub struct OccupancyAggregator<'a> {
    records: &'a [OccupancyRecord],
    calendar: &'a WorkingDaysCalendar,
}

impl<'a> OccupancyAggregator<'a> {
    pub fn new(records: &'a [OccupancyRecord], calendar: &'a WorkingDaysCalendar) -> Self {
        Self { records, calendar }
    }

    pub fn calendar(&self) -> &WorkingDaysCalendar {
        self.calendar
    }

    fn employee_records(&self, employee_id: i32) -> impl Iterator<Item = &'a OccupancyRecord> {
        self.records
            .iter()
            .filter(move |r| r.employee_id == employee_id)
    }

    pub fn monthly_total_for_employee(&self, employee_id: i32, month: Month) -> u64 {
        self.employee_records(employee_id)
            .map(|r| u64::from(r.days(month)))
            .sum()
    }

    /// Not clamped: values above 100 signal over-allocation.
    pub fn utilization_for_employee_month(&self, employee_id: i32, month: Month) -> u32 {
        percent_half_up(
            self.monthly_total_for_employee(employee_id, month),
            u64::from(self.calendar.days(month)),
        )
    }

    pub fn yearly_occupancy_rate(&self, employee_id: i32) -> u32 {
        percent_half_up(
            self.total_allocated_days(employee_id),
            self.calendar.total_working_days(),
        )
    }

    pub fn project_share(&self, employee_id: i32, project_id: i32) -> ProjectAllocation {
        let total_days = self
            .employee_records(employee_id)
            .filter(|r| r.project_id == project_id)
            .map(|r| r.days.total())
            .sum();
        ProjectAllocation {
            employee_id,
            project_id,
            total_days,
            percentage: percent_half_up(total_days, self.calendar.total_working_days()),
        }
    }

    pub fn total_allocated_days(&self, employee_id: i32) -> u64 {
        Month::ALL
            .into_iter()
            .map(|m| self.monthly_total_for_employee(employee_id, m))
            .sum()
    }

    pub fn employee_monthly_utilization(
        &self,
        employee_id: i32,
        month: Month,
    ) -> EmployeeMonthlyUtilization {
        let allocated_days = self.monthly_total_for_employee(employee_id, month);
        let working_days = self.calendar.days(month);
        EmployeeMonthlyUtilization {
            employee_id,
            month,
            allocated_days,
            working_days,
            utilization_percent: percent_half_up(allocated_days, u64::from(working_days)),
        }
    }

    pub fn monthly_breakdown(&self, employee_id: i32) -> Vec<EmployeeMonthlyUtilization> {
        Month::ALL
            .into_iter()
            .map(|m| self.employee_monthly_utilization(employee_id, m))
            .collect()
    }

    pub fn employee_aggregate(&self, employee_id: i32) -> EmployeeAggregate {
        let total_allocated_days = self.total_allocated_days(employee_id);
        EmployeeAggregate {
            employee_id,
            total_allocated_days,
            occupancy_rate: percent_half_up(
                total_allocated_days,
                self.calendar.total_working_days(),
            ),
        }
    }

    /// One allocation per distinct project of the employee, ascending by project id.
    pub fn project_allocations(&self, employee_id: i32) -> Vec<ProjectAllocation> {
        let projects: BTreeSet<i32> = self
            .employee_records(employee_id)
            .map(|r| r.project_id)
            .collect();
        projects
            .into_iter()
            .map(|project_id| self.project_share(employee_id, project_id))
            .collect()
    }

    pub fn over_allocated_months(&self, employee_id: i32) -> Vec<Month> {
        Month::ALL
            .into_iter()
            .filter(|&m| self.utilization_for_employee_month(employee_id, m) > 100)
            .collect()
    }

    /// Distinct employee ids referenced by the records, ascending.
    pub fn employee_ids(&self) -> Vec<i32> {
        let ids: BTreeSet<i32> = self.records.iter().map(|r| r.employee_id).collect();
        ids.into_iter().collect()
    }
}
