// File: tests/occurrence_preview.rs
use chrono::{NaiveDate, Weekday};
use tasktide::model::rule::interval;
use tasktide::model::{MonthDay, RecurrenceRule, WeekdaySet};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dates(list: &[&str]) -> Vec<NaiveDate> {
    list.iter().map(|s| date(s)).collect()
}

#[test]
fn test_start_counts_as_first_occurrence() {
    let rule = RecurrenceRule::daily(interval(1).unwrap()).end_after(3);
    let got: Vec<_> = rule.occurrences(date("2024-01-01")).collect();
    assert_eq!(got, dates(&["2024-01-02", "2024-01-03"]));
}

#[test]
fn test_stops_before_end_date() {
    let rule = RecurrenceRule::daily(interval(1).unwrap()).until(date("2024-01-05"));
    let got: Vec<_> = rule.occurrences(date("2024-01-01")).collect();
    assert_eq!(got, dates(&["2024-01-02", "2024-01-03", "2024-01-04"]));
}

#[test]
fn test_earliest_terminator_wins() {
    let rule = RecurrenceRule::daily(interval(1).unwrap())
        .until(date("2024-01-04"))
        .end_after(10);
    assert_eq!(rule.occurrences(date("2024-01-01")).count(), 2);
}

#[test]
fn test_weekly_series() {
    let days = WeekdaySet::new([Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    let rule = RecurrenceRule::weekly(interval(2).unwrap(), days);
    let got: Vec<_> = rule.occurrences(date("2024-01-01")).take(5).collect();
    assert_eq!(
        got,
        dates(&[
            "2024-01-03",
            "2024-01-05",
            "2024-01-15",
            "2024-01-17",
            "2024-01-19",
        ])
    );
}

#[test]
fn test_monthly_series_clamps_each_month() {
    let rule = RecurrenceRule::monthly(interval(1).unwrap(), MonthDay::new(31));
    let got: Vec<_> = rule.occurrences(date("2024-01-31")).take(4).collect();
    assert_eq!(
        got,
        dates(&["2024-02-29", "2024-03-31", "2024-04-30", "2024-05-31"])
    );
}

#[test]
fn test_exhausted_iterator_stays_empty() {
    let rule = RecurrenceRule::daily(interval(1).unwrap()).end_after(2);
    let mut it = rule.occurrences(date("2024-01-01"));
    assert_eq!(it.next(), Some(date("2024-01-02")));
    assert_eq!(it.next(), None);
    assert_eq!(it.next(), None);
}
