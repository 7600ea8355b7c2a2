//! # Pricing Module
//!
//! Cost arithmetic shared by the equipment calculator and the meter tracker.
//!
//! ## Cost Structure
//!
//! - Base cost: energy (kWh) × unit rate
//! - Service fee: base cost × fee percentage / 100
//! - Total: base cost + service fee
//!
//! Everything is computed at full precision; see [`crate::utils`] for the
//! fixed-precision formatting used on output.

use crate::models::{BillingSettings, CostSummary, DailyUsage, Equipment};

/// Base cost, fee amount and total for an energy quantity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Charge {
    pub base_cost: f64,
    pub service_fee: f64,
    pub total_cost: f64,
}

/// Price `kwh` at `unit_rate` plus a `service_fee_percent` surcharge
pub fn charge_for(kwh: f64, unit_rate: f64, service_fee_percent: f64) -> Charge {
    let base_cost = kwh * unit_rate;
    let service_fee = base_cost * (service_fee_percent / 100.0);
    Charge {
        base_cost,
        service_fee,
        total_cost: base_cost + service_fee,
    }
}

/// Total energy for the day across all equipment, in kWh
pub fn total_kwh(equipment: &[Equipment], usage: &DailyUsage) -> f64 {
    equipment
        .iter()
        .map(|item| item.kwh(usage.hours_for(item.id)))
        .sum()
}

/// Day's cost for the given equipment, hours and rates
pub fn daily_cost(
    equipment: &[Equipment],
    usage: &DailyUsage,
    billing: &BillingSettings,
) -> CostSummary {
    let kwh = total_kwh(equipment, usage);
    let charge = charge_for(kwh, billing.unit_rate, billing.service_fee);
    CostSummary {
        total_kwh: kwh,
        base_cost: charge.base_cost,
        service_fee: charge.service_fee,
        total_cost: charge.total_cost,
    }
}
