use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use wattbook::display::{
    build_daily_quote_json, build_meter_month_json, build_meter_record_json,
    build_monthly_summary_json, build_usage_history_json,
};
use wattbook::meter::MeterTracker;
use wattbook::models::{Equipment, MeterBillingSettings};
use wattbook::usage::UsageTracker;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

#[test]
fn daily_quote_json_shape() {
    let mut tracker = UsageTracker {
        equipment: vec![Equipment {
            id: 1,
            name: "Heater".into(),
            watts: 1500.0,
        }],
        ..UsageTracker::default()
    };
    tracker.set_hours(1, 2.0).unwrap();

    let json: Value = build_daily_quote_json(&tracker, day(14));
    assert_eq!(json["date"], "2026-10-14");
    assert_eq!(json["equipment"][0]["kwh"], 3.0);
    assert_eq!(json["summary"]["baseCost"], 21.0);
    assert_eq!(json["summary"]["serviceFee"], 1.47);
    assert_eq!(json["summary"]["totalCost"], 22.47);
    assert_eq!(json["billingSettings"]["unitRate"], 7.0);
}

#[test]
fn history_and_month_json_shape() {
    let mut tracker = UsageTracker {
        equipment: Equipment::starter_set(),
        ..UsageTracker::default()
    };
    tracker.set_hours(2, 4.0).unwrap();
    tracker
        .save_daily_usage(day(3), Utc.timestamp_millis_opt(1_000).unwrap())
        .unwrap();

    let history = build_usage_history_json(tracker.recent_history());
    let first = &history[0];
    assert_eq!(first["date"], "2026-10-03");
    assert_eq!(first["equipment"].as_array().unwrap().len(), 3);
    assert_eq!(first["summary"]["totalKwh"], 0.3);

    let month = build_monthly_summary_json(day(20), &tracker.monthly_summary(day(20)));
    assert_eq!(month["month"], "2026-10");
    assert_eq!(month["entries"], 1);
}

#[test]
fn meter_record_json_uses_camel_case() {
    let mut tracker = MeterTracker::new(Vec::new(), MeterBillingSettings::default(), day(2));
    tracker.form.start_reading = Some(100.0);
    tracker.form.start_date = day(1);
    tracker.form.current_reading = Some(150.0);
    tracker.form.note = "  october  ".into();
    let record = tracker
        .save_reading(Utc.timestamp_millis_opt(5_000).unwrap(), day(2))
        .unwrap()
        .clone();

    let json = build_meter_record_json(&record);
    assert_eq!(json["unitsUsed"], 50.0);
    assert_eq!(json["daysDifference"], 1);
    assert_eq!(json["totalCost"], 374.5);
    assert_eq!(json["note"], "october");
    assert!(json["createdAt"].as_str().unwrap().starts_with("1970-01-01"));

    let month = build_meter_month_json(day(2), &tracker.monthly_summary(day(2)));
    assert_eq!(month["recordCount"], 1);
    assert_eq!(month["averagePerRecord"], 374.5);
}
