use occupancy_tool::{
    Month, OccupancyAggregator, OccupancyRecord, WorkingDaysCalendar,
    population_average_occupancy,
};

fn jan_feb_calendar() -> WorkingDaysCalendar {
    WorkingDaysCalendar::empty()
        .with_days(Month::January, 22)
        .with_days(Month::February, 20)
}

fn sample_records() -> Vec<OccupancyRecord> {
    vec![
        OccupancyRecord::new(1, 1, 10)
            .with_days(Month::January, 11)
            .with_days(Month::February, 10),
        OccupancyRecord::new(2, 2, 10)
            .with_days(Month::January, 10)
            .with_days(Month::February, 5),
        OccupancyRecord::new(3, 2, 20)
            .with_days(Month::January, 5)
            .with_days(Month::February, 5),
    ]
}

#[test]
fn single_record_half_time_in_both_months() {
    let calendar = jan_feb_calendar();
    let records = sample_records();
    let agg = OccupancyAggregator::new(&records, &calendar);

    assert_eq!(agg.monthly_total_for_employee(1, Month::January), 11);
    assert_eq!(agg.utilization_for_employee_month(1, Month::January), 50);
    assert_eq!(agg.utilization_for_employee_month(1, Month::February), 50);
}

#[test]
fn two_projects_sum_per_month_and_share_per_project() {
    let calendar = jan_feb_calendar();
    let records = sample_records();
    let agg = OccupancyAggregator::new(&records, &calendar);

    assert_eq!(agg.monthly_total_for_employee(2, Month::January), 15);
    let share = agg.project_share(2, 10);
    assert_eq!(share.total_days, 15);
    assert_eq!(share.percentage, 36);

    let other = agg.project_share(2, 20);
    assert_eq!(other.total_days, 10);
    assert_eq!(other.percentage, 24);
}

#[test]
fn unmatched_employee_yields_zero_everywhere() {
    let calendar = WorkingDaysCalendar::default();
    assert_eq!(calendar.total_working_days(), 250);
    let records = sample_records();
    let agg = OccupancyAggregator::new(&records, &calendar);

    for month in Month::ALL {
        assert_eq!(agg.monthly_total_for_employee(99, month), 0);
        assert_eq!(agg.utilization_for_employee_month(99, month), 0);
    }
    assert_eq!(agg.yearly_occupancy_rate(99), 0);
    assert_eq!(agg.project_share(99, 10).percentage, 0);
}

#[test]
fn empty_record_set_is_not_an_error() {
    let calendar = WorkingDaysCalendar::default();
    let agg = OccupancyAggregator::new(&[], &calendar);
    assert_eq!(agg.yearly_occupancy_rate(1), 0);
    assert_eq!(agg.monthly_total_for_employee(1, Month::June), 0);
    assert!(agg.employee_ids().is_empty());
}

#[test]
fn zero_calendar_never_divides() {
    let calendar = WorkingDaysCalendar::empty();
    let records = vec![OccupancyRecord::new(1, 1, 1).with_days(Month::April, 8)];
    let agg = OccupancyAggregator::new(&records, &calendar);
    assert_eq!(agg.utilization_for_employee_month(1, Month::April), 0);
    assert_eq!(agg.yearly_occupancy_rate(1), 0);
    assert_eq!(agg.project_share(1, 1).percentage, 0);
    assert_eq!(agg.project_share(1, 1).total_days, 8);
}

#[test]
fn over_allocation_is_preserved() {
    let calendar = WorkingDaysCalendar::empty().with_days(Month::March, 20);
    let records = vec![OccupancyRecord::new(1, 7, 1).with_days(Month::March, 25)];
    let agg = OccupancyAggregator::new(&records, &calendar);

    assert_eq!(agg.utilization_for_employee_month(7, Month::March), 125);
    let monthly = agg.employee_monthly_utilization(7, Month::March);
    assert!(monthly.is_over_allocated());
    assert_eq!(agg.over_allocated_months(7), vec![Month::March]);
}

#[test]
fn utilization_is_monotonic_in_allocated_days() {
    let calendar = WorkingDaysCalendar::default();
    let mut previous = 0;
    for days in 0..=60 {
        let records = vec![OccupancyRecord::new(1, 1, 1).with_days(Month::November, days)];
        let agg = OccupancyAggregator::new(&records, &calendar);
        let current = agg.utilization_for_employee_month(1, Month::November);
        assert!(current >= previous, "{days} days: {current} < {previous}");
        previous = current;
    }
}

#[test]
fn monthly_totals_sum_to_yearly_numerator() {
    let calendar = WorkingDaysCalendar::default();
    let records = vec![
        OccupancyRecord::new(1, 5, 1)
            .with_days(Month::January, 20)
            .with_days(Month::July, 12),
        OccupancyRecord::new(2, 5, 2)
            .with_days(Month::July, 9)
            .with_days(Month::December, 18),
    ];
    let agg = OccupancyAggregator::new(&records, &calendar);

    let monthly_sum: u64 = Month::ALL
        .into_iter()
        .map(|m| agg.monthly_total_for_employee(5, m))
        .sum();
    let aggregate = agg.employee_aggregate(5);
    assert_eq!(monthly_sum, aggregate.total_allocated_days);
    assert_eq!(monthly_sum, 59);
    // 59 / 250 = 23.6%
    assert_eq!(aggregate.occupancy_rate, 24);
    assert_eq!(agg.yearly_occupancy_rate(5), aggregate.occupancy_rate);
}

#[test]
fn date_window_does_not_filter_month_rollups() {
    let calendar = WorkingDaysCalendar::default();
    let start = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let records = vec![
        OccupancyRecord::new(1, 1, 1)
            .with_window(start, end)
            .with_days(Month::January, 4),
    ];
    let agg = OccupancyAggregator::new(&records, &calendar);
    assert_eq!(agg.monthly_total_for_employee(1, Month::January), 4);
}

#[test]
fn repeated_calls_are_idempotent() {
    let calendar = jan_feb_calendar();
    let records = sample_records();
    let before = records.clone();
    let agg = OccupancyAggregator::new(&records, &calendar);

    assert_eq!(agg.project_allocations(2), agg.project_allocations(2));
    assert_eq!(agg.employee_aggregate(2), agg.employee_aggregate(2));
    assert_eq!(agg.monthly_breakdown(1), agg.monthly_breakdown(1));
    assert_eq!(records, before);
}

#[test]
fn population_average_handles_empty_and_decimals() {
    assert_eq!(population_average_occupancy(&[]), 0.0);
    assert!(!population_average_occupancy(&[]).is_nan());
    assert_eq!(population_average_occupancy(&[33, 34]), 33.5);
    assert_eq!(population_average_occupancy(&[0, 0, 1]), 0.3);
    assert_eq!(population_average_occupancy(&[125, 75]), 100.0);
}
