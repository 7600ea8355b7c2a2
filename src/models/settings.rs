use serde::{Deserialize, Serialize};
use std::env;

use super::numeric::lenient_f64;

/// Rate applied per kWh when nothing has been configured
pub const DEFAULT_UNIT_RATE: f64 = 7.0;
/// Service fee percentage applied when nothing has been configured
pub const DEFAULT_SERVICE_FEE: f64 = 7.0;

/// Billing rates for the equipment calculator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSettings {
    #[serde(deserialize_with = "lenient_f64")]
    pub unit_rate: f64,
    /// Percentage surcharge on the base cost
    #[serde(deserialize_with = "lenient_f64")]
    pub service_fee: f64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            unit_rate: DEFAULT_UNIT_RATE,
            service_fee: DEFAULT_SERVICE_FEE,
        }
    }
}

impl BillingSettings {
    /// Settings for a store that has never saved any.
    ///
    /// `WATTBOOK_UNIT_RATE` and `WATTBOOK_SERVICE_FEE` override the defaults
    /// individually.
    pub fn initial() -> Self {
        let defaults = Self::default();
        Self {
            unit_rate: env_f64("WATTBOOK_UNIT_RATE").unwrap_or(defaults.unit_rate),
            service_fee: env_f64("WATTBOOK_SERVICE_FEE").unwrap_or(defaults.service_fee),
        }
    }
}

/// Billing rates for the meter tracker, with a billing floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeterBillingSettings {
    #[serde(deserialize_with = "lenient_f64")]
    pub unit_rate: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub service_fee: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub minimum_charge: f64,
}

impl Default for MeterBillingSettings {
    fn default() -> Self {
        Self {
            unit_rate: DEFAULT_UNIT_RATE,
            service_fee: DEFAULT_SERVICE_FEE,
            minimum_charge: 0.0,
        }
    }
}

impl MeterBillingSettings {
    pub fn initial() -> Self {
        let rates = BillingSettings::initial();
        Self {
            unit_rate: rates.unit_rate,
            service_fee: rates.service_fee,
            minimum_charge: 0.0,
        }
    }
}

fn env_f64(var: &str) -> Option<f64> {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}
