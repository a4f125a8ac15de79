use crate::month::Month;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Allocated working days per calendar month for one occupancy row.
///
/// Decoding is lenient: a missing, null, negative or non-numeric month value is
/// read as `0`, numeric text is parsed, and fractional days are rounded half-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDays {
    #[serde(default, deserialize_with = "lenient_days")]
    pub january: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub february: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub march: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub april: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub may: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub june: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub july: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub august: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub september: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub october: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub november: u32,
    #[serde(default, deserialize_with = "lenient_days")]
    pub december: u32,
}

impl MonthlyDays {
    pub fn from_array(days: [u32; 12]) -> Self {
        let mut out = Self::default();
        for month in Month::ALL {
            out.set(month, days[month.index()]);
        }
        out
    }

    pub fn get(&self, month: Month) -> u32 {
        match month {
            Month::January => self.january,
            Month::February => self.february,
            Month::March => self.march,
            Month::April => self.april,
            Month::May => self.may,
            Month::June => self.june,
            Month::July => self.july,
            Month::August => self.august,
            Month::September => self.september,
            Month::October => self.october,
            Month::November => self.november,
            Month::December => self.december,
        }
    }

    pub fn set(&mut self, month: Month, days: u32) {
        let slot = match month {
            Month::January => &mut self.january,
            Month::February => &mut self.february,
            Month::March => &mut self.march,
            Month::April => &mut self.april,
            Month::May => &mut self.may,
            Month::June => &mut self.june,
            Month::July => &mut self.july,
            Month::August => &mut self.august,
            Month::September => &mut self.september,
            Month::October => &mut self.october,
            Month::November => &mut self.november,
            Month::December => &mut self.december,
        };
        *slot = days;
    }

    pub fn total(&self) -> u64 {
        Month::ALL.into_iter().map(|m| u64::from(self.get(m))).sum()
    }
}

/// One allocation of an employee to a project for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    #[serde(default)]
    pub id: i32,
    #[serde(alias = "employeeId")]
    pub employee_id: i32,
    #[serde(alias = "projectId")]
    pub project_id: i32,
    /// Informational only; month rollups do not consult the window.
    #[serde(
        default,
        alias = "startDate",
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        alias = "endDate",
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub days: MonthlyDays,
}

impl OccupancyRecord {
    pub fn new(id: i32, employee_id: i32, project_id: i32) -> Self {
        Self {
            id,
            employee_id,
            project_id,
            start_date: None,
            end_date: None,
            days: MonthlyDays::default(),
        }
    }

    pub fn with_days(mut self, month: Month, days: u32) -> Self {
        self.days.set(month, days);
        self
    }

    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn days(&self, month: Month) -> u32 {
        self.days.get(month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Employee {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            department: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl Project {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            client: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp; anything else is `None`.
pub fn parse_date_lenient(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(input) {
        return Some(stamp.date_naive());
    }
    input
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawDate::deserialize(deserializer)? {
        RawDate::Text(s) => parse_date_lenient(&s),
        RawDate::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDays {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Normalize a textual day count; anything unparseable becomes `0`.
pub fn parse_days(input: &str) -> u32 {
    input.trim().parse::<f64>().map(days_from_f64).unwrap_or(0)
}

fn days_from_f64(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // half-up for positive values
    let rounded = (value + 0.5).floor();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

fn lenient_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let days = match RawDays::deserialize(deserializer)? {
        RawDays::Int(v) => u32::try_from(v.max(0)).unwrap_or(u32::MAX),
        RawDays::Float(v) => days_from_f64(v),
        RawDays::Text(s) => parse_days(&s),
        RawDays::Other(_) => 0,
    };
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_malformed_months_read_as_zero() {
        let record: OccupancyRecord = serde_json::from_value(json!({
            "employee_id": 1,
            "project_id": 10,
            "january": 11,
            "february": null,
            "march": "abc",
            "april": -3,
            "may": true,
            "june": {"nested": 1},
        }))
        .unwrap();
        assert_eq!(record.days(Month::January), 11);
        for month in &Month::ALL[1..] {
            assert_eq!(record.days(*month), 0, "{month} should normalize to 0");
        }
    }

    #[test]
    fn numeric_text_and_fractions_are_normalized() {
        let record: OccupancyRecord = serde_json::from_value(json!({
            "employeeId": 4,
            "projectId": 7,
            "startDate": "2025-01-01",
            "january": "11",
            "february": 2.5,
            "march": " 3.4 ",
        }))
        .unwrap();
        assert_eq!(record.employee_id, 4);
        assert_eq!(record.project_id, 7);
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(record.days(Month::January), 11);
        assert_eq!(record.days(Month::February), 3);
        assert_eq!(record.days(Month::March), 3);
    }

    #[test]
    fn window_dates_decode_leniently() {
        let record: OccupancyRecord = serde_json::from_value(json!({
            "employee_id": 1,
            "project_id": 2,
            "start_date": "2025-01-01T00:00:00Z",
            "end_date": "",
        }))
        .unwrap();
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(record.end_date, None);

        let record: OccupancyRecord = serde_json::from_value(json!({
            "employee_id": 1,
            "project_id": 2,
            "startDate": "2025-03-04 09:30:00",
            "endDate": 20250101,
        }))
        .unwrap();
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 3, 4));
        assert_eq!(record.end_date, None);
    }

    #[test]
    fn serializes_flat_month_fields() {
        let record = OccupancyRecord::new(1, 2, 3).with_days(Month::March, 5);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["march"], 5);
        assert_eq!(value["employee_id"], 2);
        assert!(value.get("start_date").is_none());
    }
}
