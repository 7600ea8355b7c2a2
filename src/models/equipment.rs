use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::numeric::{lenient_f64, lenient_i64};

/// A piece of electrical equipment with its rated power draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Creation timestamp in milliseconds
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub watts: f64,
}

impl Equipment {
    /// Energy drawn over `hours`, in kWh
    pub fn kwh(&self, hours: f64) -> f64 {
        self.watts * hours / 1000.0
    }

    /// Starter list used when a backend has no equipment list at all.
    pub fn starter_set() -> Vec<Equipment> {
        vec![
            Equipment { id: 1, name: "Air Conditioner".into(), watts: 1500.0 },
            Equipment { id: 2, name: "Electric Fan".into(), watts: 75.0 },
            Equipment { id: 3, name: "Electric Pan".into(), watts: 1200.0 },
        ]
    }
}

/// Hours of use entered for the current day, keyed by equipment id.
///
/// Never persisted; cleared once the day is saved to history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyUsage {
    hours: BTreeMap<i64, f64>,
}

impl DailyUsage {
    /// Hours recorded for an equipment id, 0 when nothing was entered
    pub fn hours_for(&self, id: i64) -> f64 {
        self.hours.get(&id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: i64, hours: f64) {
        self.hours.insert(id, hours);
    }

    pub fn remove(&mut self, id: i64) -> Option<f64> {
        self.hours.remove(&id)
    }

    pub fn clear(&mut self) {
        self.hours.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }
}
