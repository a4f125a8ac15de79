use crate::month::Month;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

/// Business days per calendar month for one reporting year.
///
/// Every rate in the aggregator divides by this table, so a single instance is
/// shared by every computation over the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WorkingDaysTable", into = "WorkingDaysTable")]
pub struct WorkingDaysCalendar {
    days: [u32; 12],
}

/// Named-field form used on the wire and in config files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct WorkingDaysTable {
    january: u32,
    february: u32,
    march: u32,
    april: u32,
    may: u32,
    june: u32,
    july: u32,
    august: u32,
    september: u32,
    october: u32,
    november: u32,
    december: u32,
}

impl From<WorkingDaysTable> for WorkingDaysCalendar {
    fn from(t: WorkingDaysTable) -> Self {
        Self {
            days: [
                t.january,
                t.february,
                t.march,
                t.april,
                t.may,
                t.june,
                t.july,
                t.august,
                t.september,
                t.october,
                t.november,
                t.december,
            ],
        }
    }
}

impl From<WorkingDaysCalendar> for WorkingDaysTable {
    fn from(c: WorkingDaysCalendar) -> Self {
        let [
            january,
            february,
            march,
            april,
            may,
            june,
            july,
            august,
            september,
            october,
            november,
            december,
        ] = c.days;
        Self {
            january,
            february,
            march,
            april,
            may,
            june,
            july,
            august,
            september,
            october,
            november,
            december,
        }
    }
}

impl Default for WorkingDaysCalendar {
    /// Standard reporting table, 250 working days in total.
    fn default() -> Self {
        Self {
            days: [22, 20, 21, 21, 21, 20, 23, 21, 21, 23, 19, 18],
        }
    }
}

impl WorkingDaysCalendar {
    pub fn new(days: [u32; 12]) -> Self {
        Self { days }
    }

    /// Table with every month set to zero, to be filled with [`Self::with_days`].
    pub fn empty() -> Self {
        Self { days: [0; 12] }
    }

    pub fn with_days(mut self, month: Month, days: u32) -> Self {
        self.days[month.index()] = days;
        self
    }

    pub fn set_days(&mut self, month: Month, days: u32) {
        self.days[month.index()] = days;
    }

    pub fn days(&self, month: Month) -> u32 {
        self.days[month.index()]
    }

    pub fn as_array(&self) -> [u32; 12] {
        self.days
    }

    pub fn total_working_days(&self) -> u64 {
        self.days.iter().map(|&d| u64::from(d)).sum()
    }

    /// Count the available days of every month of `year` in `calendar`.
    pub fn from_work_calendar(calendar: &WorkCalendar, year: i32) -> Result<Self, CalendarError> {
        let mut days = [0u32; 12];
        for month in Month::ALL {
            let (first, last) = month_bounds(year, month)?;
            days[month.index()] = calendar.count_available_days(first, last);
        }
        Ok(Self { days })
    }
}

fn month_bounds(year: i32, month: Month) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let first =
        NaiveDate::from_ymd_opt(year, month.number(), 1).ok_or(CalendarError::InvalidYear(year))?;
    let next_first = if month == Month::December {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month.number() + 1, 1)
    }
    .ok_or(CalendarError::InvalidYear(year))?;
    Ok((first, next_first - Duration::days(1)))
}

/// Weekday mask plus holiday dates, used to derive a [`WorkingDaysCalendar`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

/// `[work_calendar]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkCalendarConfig {
    pub working_days: Vec<Weekday>,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub us_federal_holidays: bool,
}

impl Default for WorkCalendar {
    /// Monday to Friday, no holidays.
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Weekday calendar with US federal holidays for `year`.
    pub fn us_federal(year: i32) -> Result<Self, CalendarError> {
        let mut calendar = Self::default();
        calendar.add_us_holidays(year)?;
        Ok(calendar)
    }

    /// Build the calendar `config` describes for `year`.
    pub fn from_config(config: &WorkCalendarConfig, year: i32) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        let mut calendar = Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        };
        if config.us_federal_holidays {
            calendar.add_us_holidays(year)?;
        }
        Ok(calendar)
    }

    fn add_us_holidays(&mut self, year: i32) -> Result<(), CalendarError> {
        let fixed = |month, day| {
            NaiveDate::from_ymd_opt(year, month, day).ok_or(CalendarError::InvalidYear(year))
        };
        let dates = [
            // New Year's Day
            fixed(1, 1)?,
            // Martin Luther King Jr. Day
            Self::nth_weekday(year, 1, Weekday::Mon, 3)?,
            // Presidents' Day
            Self::nth_weekday(year, 2, Weekday::Mon, 3)?,
            // Memorial Day
            Self::last_weekday(year, 5, Weekday::Mon)?,
            // Independence Day
            fixed(7, 4)?,
            // Labor Day
            Self::nth_weekday(year, 9, Weekday::Mon, 1)?,
            // Columbus Day
            Self::nth_weekday(year, 10, Weekday::Mon, 2)?,
            // Veterans Day
            fixed(11, 11)?,
            // Thanksgiving
            Self::nth_weekday(year, 11, Weekday::Thu, 4)?,
            // Christmas
            fixed(12, 25)?,
        ];
        self.holidays.extend(dates);
        Ok(())
    }

    /// `n`-th `weekday` of `month`, 1-based.
    fn nth_weekday(
        year: i32,
        month: u32,
        weekday: Weekday,
        n: u32,
    ) -> Result<NaiveDate, CalendarError> {
        let mut date =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidYear(year))?;
        let mut count = 0;

        while date.month() == month {
            if date.weekday() == weekday {
                count += 1;
                if count == n {
                    return Ok(date);
                }
            }
            date += Duration::days(1);
        }
        Err(CalendarError::InvalidYear(year))
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Result<NaiveDate, CalendarError> {
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let mut date = next_first.ok_or(CalendarError::InvalidYear(year))? - Duration::days(1);

        while date.weekday() != weekday {
            date -= Duration::days(1);
        }
        Ok(date)
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Available days in the inclusive range.
    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let count = start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_available(*day))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
