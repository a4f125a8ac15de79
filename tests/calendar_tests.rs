use chrono::{NaiveDate, Weekday};
use occupancy_tool::{CalendarError, Month, WorkCalendar, WorkCalendarConfig, WorkingDaysCalendar};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config(working_days: Vec<Weekday>, holidays: Vec<NaiveDate>) -> WorkCalendarConfig {
    WorkCalendarConfig {
        working_days,
        holidays,
        us_federal_holidays: false,
    }
}

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.is_available(d(2025, 1, 1)));
}

#[test]
fn us_federal_blocks_new_year_and_thanksgiving() {
    let cal = WorkCalendar::us_federal(2025).unwrap();
    assert!(!cal.is_available(d(2025, 1, 1)));
    assert!(!cal.is_available(d(2025, 11, 27)));
    assert!(cal.is_available(d(2025, 1, 2)));
}

#[test]
fn count_available_days_is_inclusive() {
    let cal = WorkCalendar::default();
    assert_eq!(cal.count_available_days(d(2025, 1, 6), d(2025, 1, 12)), 5);
    assert_eq!(cal.count_available_days(d(2025, 1, 6), d(2025, 1, 6)), 1);
    assert_eq!(cal.count_available_days(d(2025, 1, 12), d(2025, 1, 6)), 0);
}

#[test]
fn config_calendar_uses_weekday_mask_and_holidays() {
    let cal = WorkCalendar::from_config(
        &config(
            vec![Weekday::Sat, Weekday::Mon, Weekday::Tue, Weekday::Mon],
            vec![d(2025, 6, 23)],
        ),
        2025,
    )
    .unwrap();
    assert!(cal.is_available(d(2025, 6, 21)));
    assert!(!cal.is_available(d(2025, 6, 20)));
    assert!(!cal.is_available(d(2025, 6, 23)));
    assert!(cal.is_available(d(2025, 6, 24)));
}

#[test]
fn config_calendar_can_add_us_holidays() {
    let mut cfg = config(vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu], vec![]);
    cfg.us_federal_holidays = true;
    let cal = WorkCalendar::from_config(&cfg, 2025).unwrap();
    assert!(!cal.is_available(d(2025, 11, 27)));
    assert!(!cal.is_available(d(2025, 1, 3)));
}

#[test]
fn empty_working_week_is_rejected() {
    assert_eq!(
        WorkCalendar::from_config(&config(Vec::new(), Vec::new()), 2025),
        Err(CalendarError::NoWorkingDays)
    );
}

#[test]
fn working_days_table_derived_from_weekday_calendar() {
    let table = WorkingDaysCalendar::from_work_calendar(&WorkCalendar::default(), 2025).unwrap();
    assert_eq!(table.days(Month::January), 23);
    assert_eq!(table.days(Month::February), 20);
    assert_eq!(table.total_working_days(), 261);

    let us = WorkingDaysCalendar::from_work_calendar(&WorkCalendar::us_federal(2025).unwrap(), 2025)
        .unwrap();
    // New Year's Day and MLK Day
    assert_eq!(us.days(Month::January), 21);
    assert_eq!(us.total_working_days(), 251);
}

#[test]
fn out_of_range_year_is_rejected() {
    assert_eq!(
        WorkingDaysCalendar::from_work_calendar(&WorkCalendar::default(), 300_000),
        Err(CalendarError::InvalidYear(300_000))
    );
}
