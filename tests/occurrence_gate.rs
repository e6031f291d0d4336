// File: tests/occurrence_gate.rs
use chrono::{Local, NaiveDate};
use tasktide::model::rule::interval;
use tasktide::model::{OccurrenceGate, RecurrenceRule};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn daily() -> RecurrenceRule {
    RecurrenceRule::daily(interval(1).unwrap())
}

#[test]
fn test_occurrence_cap() {
    let rule = daily().end_after(3);
    assert!(rule.should_continue(2));
    assert!(!rule.should_continue(3));
    assert!(!rule.should_continue(4));
}

#[test]
fn test_open_ended_rule_always_continues() {
    let rule = daily();
    assert!(rule.termination.is_open_ended());
    assert!(rule.should_continue(0));
    assert!(rule.should_continue(u32::MAX));
}

#[test]
fn test_end_date_against_today() {
    let rule = daily().until(date("2024-06-01"));
    assert!(OccurrenceGate::should_continue_on(&rule, 5, date("2024-05-31")));
    assert!(!OccurrenceGate::should_continue_on(&rule, 5, date("2024-06-01")));
    assert!(!OccurrenceGate::should_continue_on(&rule, 5, date("2024-07-01")));
}

#[test]
fn test_end_date_uses_wall_clock() {
    let past = daily().until(date("2000-01-01"));
    assert!(!past.should_continue(1));

    let future = daily().until(date("2999-01-01"));
    assert!(future.should_continue(1));

    let today = Local::now().date_naive();
    assert!(!daily().until(today).should_continue(1));
}

#[test]
fn test_first_limit_reached_wins() {
    let rule = daily().until(date("2024-06-01")).end_after(2);
    // Count exhausted even though the end date is far away
    assert!(!OccurrenceGate::should_continue_on(&rule, 2, date("2024-01-01")));
    // End date passed even though the count is not
    assert!(!OccurrenceGate::should_continue_on(&rule, 1, date("2024-06-02")));
    assert!(OccurrenceGate::should_continue_on(&rule, 1, date("2024-01-01")));
}

#[test]
fn test_count_check_ignores_end_date() {
    let rule = daily().until(date("2000-01-01")).end_after(5);
    assert!(OccurrenceGate::within_count(&rule, 4));
    assert!(!OccurrenceGate::within_count(&rule, 5));
}

#[test]
fn test_zero_cap_never_continues() {
    assert!(!daily().end_after(0).should_continue(0));
}
