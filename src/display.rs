use chrono::NaiveDate;
use serde_json::{Value, json};
use std::env;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_white(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn cyan(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::meter::{IntervalCharge, MeterMonthlySummary};
use crate::models::{
    BillingSettings, CostSummary, Equipment, MeterBillingSettings, MeterForm, MeterReadingRecord,
    UsageHistoryRecord,
};
use crate::usage::{MonthlySummary, UsageTracker};
use crate::utils::{format_currency, format_kwh, month_label, round_to};

fn colors_enabled() -> bool {
    env::var_os("NO_COLOR").is_none()
}

fn label(text: &str) -> String {
    if colors_enabled() {
        text.bright_black().dimmed().to_string()
    } else {
        text.to_string()
    }
}

fn heading(text: &str) -> String {
    if colors_enabled() {
        text.cyan().bold().to_string()
    } else {
        text.to_string()
    }
}

fn amount(value: f64) -> String {
    let text = format_currency(value);
    if colors_enabled() {
        text.bright_white().bold().to_string()
    } else {
        text
    }
}

fn energy(kwh: f64) -> String {
    let text = format!("{} kWh", format_kwh(kwh));
    if colors_enabled() {
        text.green().to_string()
    } else {
        text
    }
}

fn notice(text: &str) -> String {
    if colors_enabled() {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

fn alert(text: &str) -> String {
    if colors_enabled() {
        text.red().bold().to_string()
    } else {
        text.to_string()
    }
}

fn money_json(v: f64) -> f64 {
    round_to(v, 2)
}

fn kwh_json(v: f64) -> f64 {
    round_to(v, 3)
}

// ---- equipment calculator ----

pub fn render_equipment_list(equipment: &[Equipment]) -> String {
    if equipment.is_empty() {
        return notice("no equipment yet; add some with `equipment add <NAME> <WATTS>`");
    }
    let mut lines = vec![heading("Equipment")];
    for item in equipment {
        lines.push(format!(
            "  {} {} {}",
            label(&format!("#{}", item.id)),
            item.name,
            label(&format!("{} W", item.watts))
        ));
    }
    lines.join("\n")
}

fn summary_lines(summary: &CostSummary, billing: Option<&BillingSettings>) -> Vec<String> {
    let fee_label = match billing {
        Some(b) => format!("service fee ({}%):", b.service_fee),
        None => "service fee:".to_string(),
    };
    vec![
        format!("  {} {}", label("energy:"), energy(summary.total_kwh)),
        format!("  {} {}", label("base cost:"), amount(summary.base_cost)),
        format!("  {} {}", label(&fee_label), amount(summary.service_fee)),
        format!("  {} {}", label("total:"), amount(summary.total_cost)),
    ]
}

/// Today's hours per item plus the day's totals
pub fn render_daily_quote(tracker: &UsageTracker, date: NaiveDate) -> String {
    let mut lines = vec![heading(&format!("Usage for {date}"))];
    for item in &tracker.equipment {
        let hours = tracker.daily.hours_for(item.id);
        if hours <= 0.0 {
            continue;
        }
        lines.push(format!(
            "  {} {} {} {}",
            item.name,
            label(&format!("{hours} h ×")),
            label(&format!("{} W =", item.watts)),
            energy(item.kwh(hours)),
        ));
    }
    lines.extend(summary_lines(&tracker.daily_cost(), Some(&tracker.billing)));
    lines.join("\n")
}

pub fn render_usage_record(record: &UsageHistoryRecord) -> String {
    let mut lines = vec![heading(&format!("Saved {}", record.date))];
    for line in record.equipment.iter().filter(|l| l.hours > 0.0) {
        lines.push(format!(
            "  {} {} {}",
            line.name,
            label(&format!("{} h", line.hours)),
            amount(line.cost)
        ));
    }
    lines.extend(summary_lines(&record.summary, None));
    lines.join("\n")
}

pub fn render_usage_history<'a>(
    records: impl IntoIterator<Item = &'a UsageHistoryRecord>,
) -> String {
    let lines: Vec<String> = records
        .into_iter()
        .map(|r| {
            format!(
                "  {} {} {}",
                r.date,
                energy(r.summary.total_kwh),
                amount(r.summary.total_cost)
            )
        })
        .collect();
    if lines.is_empty() {
        return notice("no usage saved yet");
    }
    let mut out = vec![heading("Recent days")];
    out.extend(lines);
    out.join("\n")
}

pub fn render_monthly_summary(month_of: NaiveDate, summary: &MonthlySummary) -> String {
    [
        heading(&format!("Month {}", month_label(month_of))),
        format!("  {} {}", label("days saved:"), summary.entries),
        format!("  {} {}", label("energy:"), energy(summary.total_kwh)),
        format!("  {} {}", label("total:"), amount(summary.total_cost)),
    ]
    .join("\n")
}

pub fn render_billing_settings(settings: &BillingSettings) -> String {
    [
        heading("Billing settings"),
        format!("  {} {}", label("unit rate:"), settings.unit_rate),
        format!("  {} {}%", label("service fee:"), settings.service_fee),
    ]
    .join("\n")
}

pub fn build_equipment_json(equipment: &[Equipment]) -> Value {
    Value::Array(
        equipment
            .iter()
            .map(|e| json!({"id": e.id, "name": e.name, "watts": e.watts}))
            .collect(),
    )
}

pub fn build_summary_json(summary: &CostSummary) -> Value {
    json!({
        "totalKwh": kwh_json(summary.total_kwh),
        "baseCost": money_json(summary.base_cost),
        "serviceFee": money_json(summary.service_fee),
        "totalCost": money_json(summary.total_cost),
    })
}

pub fn build_daily_quote_json(tracker: &UsageTracker, date: NaiveDate) -> Value {
    let lines: Vec<Value> = tracker
        .equipment
        .iter()
        .map(|item| {
            let hours = tracker.daily.hours_for(item.id);
            json!({
                "id": item.id,
                "name": item.name,
                "watts": item.watts,
                "hours": hours,
                "kwh": kwh_json(item.kwh(hours)),
            })
        })
        .collect();
    json!({
        "date": date.to_string(),
        "equipment": lines,
        "summary": build_summary_json(&tracker.daily_cost()),
        "billingSettings": tracker.billing,
    })
}

pub fn build_usage_record_json(record: &UsageHistoryRecord) -> Value {
    json!({
        "id": record.id,
        "date": record.date.to_string(),
        "equipment": record.equipment.iter().map(|l| json!({
            "name": l.name,
            "watts": l.watts,
            "hours": l.hours,
            "cost": money_json(l.cost),
        })).collect::<Vec<_>>(),
        "summary": build_summary_json(&record.summary),
        "timestamp": record.timestamp.to_rfc3339(),
    })
}

pub fn build_usage_history_json<'a>(
    records: impl IntoIterator<Item = &'a UsageHistoryRecord>,
) -> Value {
    Value::Array(records.into_iter().map(build_usage_record_json).collect())
}

pub fn build_monthly_summary_json(month_of: NaiveDate, summary: &MonthlySummary) -> Value {
    json!({
        "month": month_label(month_of),
        "entries": summary.entries,
        "totalKwh": kwh_json(summary.total_kwh),
        "totalCost": money_json(summary.total_cost),
    })
}

// ---- meter tracker ----

fn interval_lines(form: &MeterForm, charge: &IntervalCharge) -> Vec<String> {
    let reading = |r: Option<f64>| r.map_or_else(|| "-".to_string(), |v| v.to_string());
    let mut lines = vec![
        format!(
            "  {} {} ({}) → {} ({})",
            label("readings:"),
            reading(form.start_reading),
            form.start_date,
            reading(form.current_reading),
            form.current_date
        ),
        format!(
            "  {} {} {}",
            label("used:"),
            energy(charge.units_used),
            label(&format!(
                "over {} day(s), {}/day",
                charge.days_difference,
                format_kwh(charge.average_daily_usage)
            ))
        ),
        format!("  {} {}", label("base cost:"), amount(charge.base_cost)),
        format!("  {} {}", label("service fee:"), amount(charge.service_fee)),
        format!("  {} {}", label("total:"), amount(charge.total_cost)),
        format!("  {} {}", label("per day:"), amount(charge.cost_per_day)),
    ];
    if !charge.is_valid {
        lines.push(format!(
            "  {}",
            alert("current reading is below the start reading")
        ));
    }
    lines
}

pub fn render_interval(form: &MeterForm, charge: &IntervalCharge) -> String {
    let mut lines = vec![heading("Meter interval")];
    lines.extend(interval_lines(form, charge));
    lines.join("\n")
}

pub fn render_meter_record(record: &MeterReadingRecord) -> String {
    let mut lines = vec![heading(&format!(
        "Reading #{} {} → {}",
        record.id, record.start_date, record.current_date
    ))];
    lines.push(format!(
        "  {} {} → {}",
        label("readings:"),
        record.start_reading,
        record.current_reading
    ));
    lines.push(format!(
        "  {} {} {}",
        label("used:"),
        energy(record.units_used),
        label(&format!("over {} day(s)", record.days_difference))
    ));
    lines.push(format!("  {} {}", label("total:"), amount(record.total_cost)));
    if !record.note.is_empty() {
        lines.push(format!("  {} {}", label("note:"), record.note));
    }
    lines.join("\n")
}

pub fn render_meter_history<'a>(
    records: impl IntoIterator<Item = &'a MeterReadingRecord>,
) -> String {
    let lines: Vec<String> = records
        .into_iter()
        .map(|r| {
            let mut line = format!(
                "  {} {} → {} {} {}",
                label(&format!("#{}", r.id)),
                r.start_date,
                r.current_date,
                energy(r.units_used),
                amount(r.total_cost)
            );
            if !r.note.is_empty() {
                line.push(' ');
                line.push_str(&label(&r.note));
            }
            line
        })
        .collect();
    if lines.is_empty() {
        return notice("no meter readings saved yet");
    }
    let mut out = vec![heading("Recent readings")];
    out.extend(lines);
    out.join("\n")
}

pub fn render_meter_month(month_of: NaiveDate, summary: &MeterMonthlySummary) -> String {
    [
        heading(&format!("Meter month {}", month_label(month_of))),
        format!("  {} {}", label("readings:"), summary.record_count),
        format!("  {} {}", label("energy:"), energy(summary.total_units)),
        format!("  {} {}", label("total:"), amount(summary.total_cost)),
        format!(
            "  {} {}",
            label("average per reading:"),
            amount(summary.average_per_record)
        ),
    ]
    .join("\n")
}

pub fn render_meter_settings(settings: &MeterBillingSettings) -> String {
    [
        heading("Meter billing settings"),
        format!("  {} {}", label("unit rate:"), settings.unit_rate),
        format!("  {} {}%", label("service fee:"), settings.service_fee),
        format!(
            "  {} {}",
            label("minimum charge:"),
            format_currency(settings.minimum_charge)
        ),
    ]
    .join("\n")
}

pub fn build_interval_json(form: &MeterForm, charge: &IntervalCharge) -> Value {
    json!({
        "startReading": form.start_reading,
        "startDate": form.start_date.to_string(),
        "currentReading": form.current_reading,
        "currentDate": form.current_date.to_string(),
        "unitsUsed": kwh_json(charge.units_used),
        "daysDifference": charge.days_difference,
        "averageDailyUsage": kwh_json(charge.average_daily_usage),
        "baseCost": money_json(charge.base_cost),
        "serviceFee": money_json(charge.service_fee),
        "totalCost": money_json(charge.total_cost),
        "costPerDay": money_json(charge.cost_per_day),
        "unitRate": charge.unit_rate,
        "isValid": charge.is_valid,
    })
}

pub fn build_meter_record_json(record: &MeterReadingRecord) -> Value {
    json!({
        "id": record.id,
        "startReading": record.start_reading,
        "startDate": record.start_date.to_string(),
        "currentReading": record.current_reading,
        "currentDate": record.current_date.to_string(),
        "note": record.note,
        "unitsUsed": kwh_json(record.units_used),
        "daysDifference": record.days_difference,
        "averageDailyUsage": kwh_json(record.average_daily_usage),
        "baseCost": money_json(record.base_cost),
        "serviceFee": money_json(record.service_fee),
        "totalCost": money_json(record.total_cost),
        "costPerDay": money_json(record.cost_per_day),
        "unitRate": record.unit_rate,
        "createdAt": record.created_at.to_rfc3339(),
    })
}

pub fn build_meter_history_json<'a>(
    records: impl IntoIterator<Item = &'a MeterReadingRecord>,
) -> Value {
    Value::Array(records.into_iter().map(build_meter_record_json).collect())
}

pub fn build_meter_month_json(month_of: NaiveDate, summary: &MeterMonthlySummary) -> Value {
    json!({
        "month": month_label(month_of),
        "recordCount": summary.record_count,
        "totalUnits": kwh_json(summary.total_units),
        "totalCost": money_json(summary.total_cost),
        "averagePerRecord": money_json(summary.average_per_record),
    })
}

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::interval_charge;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_summary_json_rounds_at_output() {
        let summary = CostSummary {
            total_kwh: 3.0004,
            base_cost: 21.0,
            service_fee: 1.4699999,
            total_cost: 22.4699999,
        };
        let v = build_summary_json(&summary);
        assert_eq!(v["totalKwh"], 3.0);
        assert_eq!(v["serviceFee"], 1.47);
        assert_eq!(v["totalCost"], 22.47);
    }

    #[test]
    fn test_interval_json_shape() {
        let mut form = MeterForm::blank(day(2));
        form.start_reading = Some(100.0);
        form.start_date = day(1);
        form.current_reading = Some(150.0);
        let charge = interval_charge(100.0, day(1), 150.0, day(2), &MeterBillingSettings::default());
        let v = build_interval_json(&form, &charge);
        assert_eq!(v["unitsUsed"], 50.0);
        assert_eq!(v["daysDifference"], 1);
        assert_eq!(v["totalCost"], 374.5);
        assert_eq!(v["startDate"], "2026-10-01");
        assert_eq!(v["isValid"], true);
    }

    #[test]
    #[serial_test::serial]
    fn test_plain_text_without_color() {
        // SAFETY: Test runs serially, no concurrent env access
        unsafe {
            env::set_var("NO_COLOR", "1");
        }
        let text = render_billing_settings(&BillingSettings::default());
        unsafe {
            env::remove_var("NO_COLOR");
        }
        assert_eq!(
            text,
            "Billing settings\n  unit rate: 7\n  service fee: 7%"
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_invalid_interval_is_flagged() {
        // SAFETY: Test runs serially, no concurrent env access
        unsafe {
            env::set_var("NO_COLOR", "1");
        }
        let mut form = MeterForm::blank(day(2));
        form.start_reading = Some(150.0);
        form.current_reading = Some(100.0);
        let charge = interval_charge(150.0, day(2), 100.0, day(2), &MeterBillingSettings::default());
        let text = render_interval(&form, &charge);
        unsafe {
            env::remove_var("NO_COLOR");
        }
        assert!(text.contains("below the start reading"));
        assert!(text.contains("0.000 kWh"));
    }

    #[test]
    fn test_empty_lists_show_hint() {
        assert!(render_equipment_list(&[]).contains("equipment add"));
        assert!(render_meter_history(std::iter::empty()).contains("no meter readings"));
    }
}
