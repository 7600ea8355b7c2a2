use chrono::NaiveDate;
use proptest::prelude::*;

use wattbook::meter::interval_charge;
use wattbook::models::{BillingSettings, DailyUsage, Equipment, MeterBillingSettings};
use wattbook::pricing::{daily_cost, total_kwh};

fn equipment_and_hours() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((1.0f64..5000.0, 0.0f64..24.0), 0..8)
}

fn build(items: &[(f64, f64)]) -> (Vec<Equipment>, DailyUsage) {
    let mut usage = DailyUsage::default();
    let equipment = items
        .iter()
        .enumerate()
        .map(|(i, &(watts, hours))| {
            let id = i as i64 + 1;
            usage.set(id, hours);
            Equipment {
                id,
                name: format!("item {id}"),
                watts,
            }
        })
        .collect();
    (equipment, usage)
}

proptest! {
    #[test]
    fn kwh_is_sum_of_watts_times_hours(items in equipment_and_hours()) {
        let (equipment, usage) = build(&items);
        let expected: f64 = items.iter().map(|(w, h)| w * h / 1000.0).sum();
        prop_assert!((total_kwh(&equipment, &usage) - expected).abs() < 1e-9);
    }

    #[test]
    fn more_hours_never_cost_less(items in equipment_and_hours(), extra in 0.0f64..10.0, pick in 0usize..8) {
        prop_assume!(!items.is_empty());
        let (equipment, mut usage) = build(&items);
        let billing = BillingSettings::default();
        let before = daily_cost(&equipment, &usage, &billing);

        let id = equipment[pick % equipment.len()].id;
        usage.set(id, usage.hours_for(id) + extra);
        let after = daily_cost(&equipment, &usage, &billing);

        prop_assert!(after.total_kwh >= before.total_kwh);
        prop_assert!(after.total_cost >= before.total_cost);
    }

    #[test]
    fn total_is_base_plus_fee(items in equipment_and_hours(), rate in 0.0f64..50.0, fee in 0.0f64..30.0) {
        let (equipment, usage) = build(&items);
        let billing = BillingSettings { unit_rate: rate, service_fee: fee };
        let s = daily_cost(&equipment, &usage, &billing);
        prop_assert!((s.total_cost - (s.base_cost + s.service_fee)).abs() < 1e-6);
    }

    #[test]
    fn interval_charge_is_finite_and_floored(
        start in 0.0f64..100_000.0,
        end in 0.0f64..100_000.0,
        gap in -30i64..400,
        minimum in 0.0f64..100.0,
    ) {
        let start_date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end_date = start_date + chrono::Duration::days(gap);
        let settings = MeterBillingSettings { minimum_charge: minimum, ..MeterBillingSettings::default() };
        let c = interval_charge(start, start_date, end, end_date, &settings);

        prop_assert!(c.units_used >= 0.0);
        prop_assert!(c.days_difference >= 1);
        prop_assert!(c.total_cost >= minimum);
        prop_assert!(c.cost_per_day.is_finite());
        prop_assert_eq!(c.is_valid, start <= end);
    }
}
