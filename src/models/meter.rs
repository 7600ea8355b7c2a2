use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::numeric::{lenient_f64, lenient_i64};

/// A saved pair of meter snapshots with the charges derived from them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReadingRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub start_reading: f64,
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "lenient_f64")]
    pub current_reading: f64,
    pub current_date: NaiveDate,
    #[serde(default)]
    pub note: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub units_used: f64,
    #[serde(deserialize_with = "lenient_i64")]
    pub days_difference: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub average_daily_usage: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub base_cost: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub service_fee: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_cost: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub cost_per_day: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub unit_rate: f64,
    pub created_at: DateTime<Utc>,
}

/// The reading currently being entered.
#[derive(Clone, Debug, PartialEq)]
pub struct MeterForm {
    pub start_reading: Option<f64>,
    pub start_date: NaiveDate,
    pub current_reading: Option<f64>,
    pub current_date: NaiveDate,
    pub note: String,
}

impl MeterForm {
    /// Blank form with both dates set to `today`
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            start_reading: None,
            start_date: today,
            current_reading: None,
            current_date: today,
            note: String::new(),
        }
    }

    /// Next form in the reading chain: starts where `record` ended.
    pub fn continuing(record: &MeterReadingRecord, today: NaiveDate) -> Self {
        Self {
            start_reading: Some(record.current_reading),
            start_date: record.current_date,
            current_reading: None,
            current_date: today,
            note: String::new(),
        }
    }

    /// Form holding exactly the inputs of a saved record
    pub fn from_record(record: &MeterReadingRecord) -> Self {
        Self {
            start_reading: Some(record.start_reading),
            start_date: record.start_date,
            current_reading: Some(record.current_reading),
            current_date: record.current_date,
            note: record.note.clone(),
        }
    }
}
