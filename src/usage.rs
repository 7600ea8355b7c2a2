//! # Usage Module
//!
//! In-memory state of the equipment calculator and the operations the
//! command line applies to it. Persistence is the caller's job: after a
//! mutation, save the collections it touched through
//! [`crate::service::DataService`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    BillingSettings, CostSummary, DailyUsage, Equipment, EquipmentUsage, UsageHistoryRecord,
};
use crate::pricing::{charge_for, daily_cost};
use crate::service::Snapshot;
use crate::utils::{next_id, same_month};

/// Entries shown by `usage history`
pub const RECENT_HISTORY_LEN: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum UsageError {
    #[error("equipment name must not be empty")]
    EmptyName,
    #[error("wattage must be a positive number, got {0}")]
    InvalidWatts(f64),
    #[error("hours must be zero or more, got {0}")]
    InvalidHours(f64),
    #[error("no equipment with id {0}")]
    UnknownEquipment(i64),
    #[error("no ids left: an existing id is already the largest possible")]
    IdsExhausted,
}

/// Totals for one calendar month of saved days
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub entries: usize,
    pub total_cost: f64,
    pub total_kwh: f64,
}

#[derive(Clone, Debug, Default)]
pub struct UsageTracker {
    pub equipment: Vec<Equipment>,
    pub daily: DailyUsage,
    pub history: Vec<UsageHistoryRecord>,
    pub billing: BillingSettings,
}

impl From<Snapshot> for UsageTracker {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            equipment: snapshot.equipment,
            daily: DailyUsage::default(),
            history: snapshot.usage_history,
            billing: snapshot.billing_settings,
        }
    }
}

impl UsageTracker {
    pub fn add_equipment(
        &mut self,
        name: &str,
        watts: f64,
        now_ms: i64,
    ) -> Result<&Equipment, UsageError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UsageError::EmptyName);
        }
        if !watts.is_finite() || watts <= 0.0 {
            return Err(UsageError::InvalidWatts(watts));
        }
        let id = next_id(now_ms, self.equipment.iter().map(|e| e.id))
            .ok_or(UsageError::IdsExhausted)?;
        self.equipment.push(Equipment {
            id,
            name: name.to_string(),
            watts,
        });
        Ok(&self.equipment[self.equipment.len() - 1])
    }

    /// Remove equipment and any hours entered for it today
    pub fn remove_equipment(&mut self, id: i64) -> Option<Equipment> {
        let index = self.equipment.iter().position(|e| e.id == id)?;
        self.daily.remove(id);
        Some(self.equipment.remove(index))
    }

    pub fn set_hours(&mut self, id: i64, hours: f64) -> Result<(), UsageError> {
        if !self.equipment.iter().any(|e| e.id == id) {
            return Err(UsageError::UnknownEquipment(id));
        }
        let hours = if hours.is_nan() { 0.0 } else { hours };
        if hours < 0.0 || hours.is_infinite() {
            return Err(UsageError::InvalidHours(hours));
        }
        self.daily.set(id, hours);
        Ok(())
    }

    pub fn daily_cost(&self) -> CostSummary {
        daily_cost(&self.equipment, &self.daily, &self.billing)
    }

    /// Freeze today's hours into a history record for `date`.
    ///
    /// A record already saved for `date` is replaced. Hours are cleared
    /// afterwards. On error nothing changes.
    pub fn save_daily_usage(
        &mut self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<&UsageHistoryRecord, UsageError> {
        let id = next_id(now.timestamp_millis(), self.history.iter().map(|r| r.id))
            .ok_or(UsageError::IdsExhausted)?;
        let summary = self.daily_cost();
        let lines = self
            .equipment
            .iter()
            .map(|item| {
                let hours = self.daily.hours_for(item.id);
                EquipmentUsage {
                    name: item.name.clone(),
                    watts: item.watts,
                    hours,
                    cost: charge_for(item.kwh(hours), self.billing.unit_rate, 0.0).base_cost,
                }
            })
            .collect();
        let record = UsageHistoryRecord {
            id,
            date,
            equipment: lines,
            summary,
            timestamp: now,
        };

        self.history.retain(|entry| entry.date != date);
        self.history.push(record);
        self.daily.clear();
        Ok(&self.history[self.history.len() - 1])
    }

    /// Most recently saved days, newest first
    pub fn recent_history(&self) -> impl Iterator<Item = &UsageHistoryRecord> {
        self.history.iter().rev().take(RECENT_HISTORY_LEN)
    }

    /// Totals over every saved day in the month containing `month_of`
    pub fn monthly_summary(&self, month_of: NaiveDate) -> MonthlySummary {
        monthly_summary(&self.history, month_of)
    }

    /// Reset to an empty dataset with default rates
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub fn monthly_summary(history: &[UsageHistoryRecord], month_of: NaiveDate) -> MonthlySummary {
    history
        .iter()
        .filter(|entry| same_month(entry.date, month_of))
        .fold(MonthlySummary::default(), |acc, entry| MonthlySummary {
            entries: acc.entries + 1,
            total_cost: acc.total_cost + entry.summary.total_cost,
            total_kwh: acc.total_kwh + entry.summary.total_kwh,
        })
}
