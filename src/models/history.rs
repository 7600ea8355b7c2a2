use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::numeric::{lenient_f64, lenient_i64};

/// Energy and cost totals for one day of equipment use.
///
/// Stored at full precision; rounding is applied only when formatting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[serde(deserialize_with = "lenient_f64")]
    pub total_kwh: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub base_cost: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub service_fee: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_cost: f64,
}

/// One equipment line frozen into a history record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUsage {
    pub name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub watts: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub hours: f64,
    /// Base cost of this line (service fee excluded)
    #[serde(deserialize_with = "lenient_f64")]
    pub cost: f64,
}

/// A saved day of usage. At most one record exists per date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageHistoryRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub date: NaiveDate,
    pub equipment: Vec<EquipmentUsage>,
    pub summary: CostSummary,
    pub timestamp: DateTime<Utc>,
}
