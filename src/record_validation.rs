use crate::record::{Employee, OccupancyRecord, Project};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RecordValidationError {
    message: String,
}

impl RecordValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_record(record: &OccupancyRecord) -> Result<(), RecordValidationError> {
    if record.id <= 0 {
        return Err(RecordValidationError::new(format!(
            "occupancy record id must be positive (got {})",
            record.id
        )));
    }
    if record.employee_id <= 0 {
        return Err(RecordValidationError::new(format!(
            "occupancy record {} has invalid employee_id {}",
            record.id, record.employee_id
        )));
    }
    if record.project_id <= 0 {
        return Err(RecordValidationError::new(format!(
            "occupancy record {} has invalid project_id {}",
            record.id, record.project_id
        )));
    }
    if let (Some(start), Some(end)) = (record.start_date, record.end_date) {
        if start > end {
            return Err(RecordValidationError::new(format!(
                "occupancy record {} start_date {start} is after end_date {end}",
                record.id
            )));
        }
    }
    Ok(())
}

pub fn validate_record_collection(
    records: &[OccupancyRecord],
) -> Result<(), RecordValidationError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        validate_record(record)?;
        if !seen.insert(record.id) {
            return Err(RecordValidationError::new(format!(
                "duplicate occupancy record id {}",
                record.id
            )));
        }
    }
    Ok(())
}

pub fn validate_employee(employee: &Employee) -> Result<(), RecordValidationError> {
    if employee.id <= 0 {
        return Err(RecordValidationError::new(format!(
            "employee id must be positive (got {})",
            employee.id
        )));
    }
    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), RecordValidationError> {
    if project.id <= 0 {
        return Err(RecordValidationError::new(format!(
            "project id must be positive (got {})",
            project.id
        )));
    }
    Ok(())
}
