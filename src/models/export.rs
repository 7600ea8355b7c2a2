use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BillingSettings, Equipment, UsageHistoryRecord};

/// Everything the equipment calculator persists, as written to an export file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub equipment: Vec<Equipment>,
    pub usage_history: Vec<UsageHistoryRecord>,
    pub billing_settings: BillingSettings,
    pub export_date: DateTime<Utc>,
}

/// An export file as read back in. Any section may be missing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportBundle {
    pub equipment: Option<Vec<Equipment>>,
    pub usage_history: Option<Vec<UsageHistoryRecord>>,
    pub billing_settings: Option<BillingSettings>,
}

impl From<ExportBundle> for ImportBundle {
    fn from(bundle: ExportBundle) -> Self {
        Self {
            equipment: Some(bundle.equipment),
            usage_history: Some(bundle.usage_history),
            billing_settings: Some(bundle.billing_settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_browser_export_with_string_numbers() {
        let raw = r#"{
            "equipment": [{"id": 1718000000000, "name": "Electric Fan", "watts": 75}],
            "usageHistory": [{
                "id": 1718000000001,
                "date": "2024-06-10",
                "equipment": [{"name": "Electric Fan", "watts": 75, "hours": 8, "cost": "4.20"}],
                "summary": {"totalKwh": "0.600", "baseCost": "4.20", "serviceFee": "0.29", "totalCost": "4.49"},
                "timestamp": "2024-06-10T12:00:00.000Z"
            }],
            "billingSettings": {"unitRate": 7, "serviceFee": 7},
            "exportDate": "2024-06-11T08:00:00.000Z"
        }"#;
        let bundle: ImportBundle = serde_json::from_str(raw).unwrap();
        let history = bundle.usage_history.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].summary.total_cost, 4.49);
        assert_eq!(history[0].equipment[0].cost, 4.2);
        assert_eq!(bundle.equipment.unwrap()[0].watts, 75.0);
    }

    #[test]
    fn missing_sections_are_none() {
        let bundle: ImportBundle = serde_json::from_str("{}").unwrap();
        assert!(bundle.equipment.is_none());
        assert!(bundle.usage_history.is_none());
        assert!(bundle.billing_settings.is_none());
    }
}
