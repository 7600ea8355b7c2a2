pub mod equipment;
pub mod export;
pub mod history;
pub mod meter;
pub mod numeric;
pub mod settings;

pub use equipment::{DailyUsage, Equipment};
pub use export::{ExportBundle, ImportBundle};
pub use history::{CostSummary, EquipmentUsage, UsageHistoryRecord};
pub use meter::{MeterForm, MeterReadingRecord};
pub use settings::{BillingSettings, MeterBillingSettings};
