//! # Meter Module
//!
//! Interval billing between two meter snapshots, and the reading log that
//! chains one interval onto the next.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{MeterBillingSettings, MeterForm, MeterReadingRecord};
use crate::pricing::charge_for;
use crate::utils::{next_id, same_month};

/// Records shown by `meter history`
pub const RECENT_READINGS_LEN: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum MeterError {
    #[error("both the start and the current meter reading are required")]
    MissingReading,
    #[error("current reading must be at least the start reading")]
    InvalidInterval,
    #[error("no meter reading with id {0}")]
    NotFound(i64),
    #[error("no ids left: an existing reading id is already the largest possible")]
    IdsExhausted,
}

/// Usage and charges over one reading interval
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalCharge {
    pub units_used: f64,
    pub days_difference: i64,
    pub average_daily_usage: f64,
    pub base_cost: f64,
    pub service_fee: f64,
    pub total_cost: f64,
    pub cost_per_day: f64,
    pub unit_rate: f64,
    pub is_valid: bool,
}

/// Price the interval described by explicit readings and dates.
///
/// Backwards readings clamp to zero units and the day count is never below
/// one, so the result is always finite. The total never falls below
/// `minimum_charge`.
pub fn interval_charge(
    start_reading: f64,
    start_date: NaiveDate,
    end_reading: f64,
    end_date: NaiveDate,
    settings: &MeterBillingSettings,
) -> IntervalCharge {
    let units_used = (end_reading - start_reading).max(0.0);
    let days_difference = (end_date - start_date).num_days().max(1);
    let charge = charge_for(units_used, settings.unit_rate, settings.service_fee);
    let total_cost = charge.total_cost.max(settings.minimum_charge);
    let days = days_difference as f64;

    IntervalCharge {
        units_used,
        days_difference,
        average_daily_usage: units_used / days,
        base_cost: charge.base_cost,
        service_fee: charge.service_fee,
        total_cost,
        cost_per_day: total_cost / days,
        unit_rate: settings.unit_rate,
        is_valid: start_reading <= end_reading && days_difference > 0,
    }
}

/// Price a form; blank readings count as zero
pub fn quote(form: &MeterForm, settings: &MeterBillingSettings) -> IntervalCharge {
    interval_charge(
        form.start_reading.unwrap_or(0.0),
        form.start_date,
        form.current_reading.unwrap_or(0.0),
        form.current_date,
        settings,
    )
}

/// Totals over the readings whose current date falls in one month
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterMonthlySummary {
    pub record_count: usize,
    pub total_units: f64,
    pub total_cost: f64,
    pub average_per_record: f64,
}

pub fn monthly_summary(history: &[MeterReadingRecord], month_of: NaiveDate) -> MeterMonthlySummary {
    let mut summary = MeterMonthlySummary::default();
    for record in history.iter().filter(|r| same_month(r.current_date, month_of)) {
        summary.record_count += 1;
        summary.total_units += record.units_used;
        summary.total_cost += record.total_cost;
    }
    if summary.record_count > 0 {
        summary.average_per_record = summary.total_cost / summary.record_count as f64;
    }
    summary
}

/// Reading log plus the form being filled in
#[derive(Clone, Debug)]
pub struct MeterTracker {
    pub form: MeterForm,
    /// Newest first
    pub history: Vec<MeterReadingRecord>,
    pub settings: MeterBillingSettings,
}

impl MeterTracker {
    /// Tracker whose form continues from the newest saved reading, if any
    pub fn new(
        history: Vec<MeterReadingRecord>,
        settings: MeterBillingSettings,
        today: NaiveDate,
    ) -> Self {
        let form = match history.first() {
            Some(latest) => MeterForm::continuing(latest, today),
            None => MeterForm::blank(today),
        };
        Self {
            form,
            history,
            settings,
        }
    }

    pub fn quote(&self) -> IntervalCharge {
        quote(&self.form, &self.settings)
    }

    /// Save the form as a new record at the front of the log.
    ///
    /// On success the form is reseeded from the saved end values. On error
    /// the form is left as it was.
    pub fn save_reading(
        &mut self,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<&MeterReadingRecord, MeterError> {
        let charge = self.quote();
        if !charge.is_valid {
            return Err(MeterError::InvalidInterval);
        }
        let (Some(start_reading), Some(current_reading)) =
            (self.form.start_reading, self.form.current_reading)
        else {
            return Err(MeterError::MissingReading);
        };

        let id = next_id(now.timestamp_millis(), self.history.iter().map(|r| r.id))
            .ok_or(MeterError::IdsExhausted)?;
        let record = MeterReadingRecord {
            id,
            start_reading,
            start_date: self.form.start_date,
            current_reading,
            current_date: self.form.current_date,
            note: self.form.note.trim().to_string(),
            units_used: charge.units_used,
            days_difference: charge.days_difference,
            average_daily_usage: charge.average_daily_usage,
            base_cost: charge.base_cost,
            service_fee: charge.service_fee,
            total_cost: charge.total_cost,
            cost_per_day: charge.cost_per_day,
            unit_rate: charge.unit_rate,
            created_at: now,
        };

        self.form = MeterForm::continuing(&record, today);
        self.history.insert(0, record);
        Ok(&self.history[0])
    }

    pub fn delete_reading(&mut self, id: i64) -> Option<MeterReadingRecord> {
        let index = self.history.iter().position(|r| r.id == id)?;
        Some(self.history.remove(index))
    }

    /// Put a saved record's inputs back into the form
    pub fn load_reading(&mut self, id: i64) -> Result<(), MeterError> {
        let record = self
            .history
            .iter()
            .find(|r| r.id == id)
            .ok_or(MeterError::NotFound(id))?;
        self.form = MeterForm::from_record(record);
        Ok(())
    }

    pub fn recent(&self) -> impl Iterator<Item = &MeterReadingRecord> {
        self.history.iter().take(RECENT_READINGS_LEN)
    }

    pub fn monthly_summary(&self, month_of: NaiveDate) -> MeterMonthlySummary {
        monthly_summary(&self.history, month_of)
    }
}
