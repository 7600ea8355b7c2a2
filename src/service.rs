//! # Service Module
//!
//! Domain-level persistence on top of a [`Store`]: typed save/get for each
//! collection, plus whole-dataset load, export, import and clear.
//!
//! Load, export and import touch three collections at once. They run the
//! three operations on scoped threads and succeed only if all three do.
//! There is no rollback: an import that fails halfway leaves the
//! collections that were written in their new state.

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::thread;

use crate::models::{
    BillingSettings, Equipment, ExportBundle, ImportBundle, MeterBillingSettings,
    MeterReadingRecord, UsageHistoryRecord,
};
use crate::store::{Backend, Collection, Store, StoreError, StoreResult};

/// Everything the equipment calculator needs at startup
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub equipment: Vec<Equipment>,
    pub usage_history: Vec<UsageHistoryRecord>,
    pub billing_settings: BillingSettings,
}

fn write<T: Serialize + ?Sized>(
    store: &dyn Store,
    collection: Collection,
    value: &T,
) -> StoreResult<()> {
    let data = serde_json::to_value(value)?;
    store.save(collection, &data)?;
    Ok(())
}

fn read<T: DeserializeOwned>(
    store: &dyn Store,
    collection: Collection,
    query: &[(&str, &str)],
) -> StoreResult<Option<T>> {
    match store.get(collection, query)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

type Outcomes = [(Collection, Option<StoreError>); 3];

/// The error for a three-way fan-out where at least one branch failed.
///
/// An unconfigured backend is reported as such; any other failure becomes
/// [`StoreError::Incomplete`] naming the collections that failed.
fn failure(operation: &'static str, outcomes: Outcomes) -> StoreError {
    let mut failed = Vec::new();
    for (collection, error) in outcomes {
        let Some(error) = error else { continue };
        log::warn!("{operation} {collection} failed: {error}");
        if let StoreError::Unavailable { .. } = error {
            return error;
        }
        failed.push(collection);
    }
    StoreError::Incomplete { operation, failed }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Persistence for the equipment calculator
pub struct DataService {
    store: Box<dyn Store>,
}

impl DataService {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn local(&self) -> bool {
        self.backend() == Backend::Local
    }

    pub fn save_equipment(&self, equipment: &[Equipment]) -> StoreResult<()> {
        write(self.store(), Collection::Equipment, equipment)
    }

    /// Equipment list; the local backend reports an empty list when nothing
    /// is stored, other backends report `None`
    pub fn get_equipment(&self) -> StoreResult<Option<Vec<Equipment>>> {
        let found = read(self.store(), Collection::Equipment, &[])?;
        Ok(found.or_else(|| self.local().then(Vec::new)))
    }

    pub fn save_usage_history(&self, history: &[UsageHistoryRecord]) -> StoreResult<()> {
        write(self.store(), Collection::UsageHistory, history)
    }

    /// Usage history, filtered server-side by `query` on the REST backend
    pub fn get_usage_history(
        &self,
        query: &[(&str, &str)],
    ) -> StoreResult<Option<Vec<UsageHistoryRecord>>> {
        let found = read(self.store(), Collection::UsageHistory, query)?;
        Ok(found.or_else(|| self.local().then(Vec::new)))
    }

    pub fn save_billing_settings(&self, settings: &BillingSettings) -> StoreResult<()> {
        write(self.store(), Collection::BillingSettings, settings)
    }

    pub fn get_billing_settings(&self) -> StoreResult<Option<BillingSettings>> {
        let found = read(self.store(), Collection::BillingSettings, &[])?;
        Ok(found.or_else(|| self.local().then(BillingSettings::initial)))
    }

    fn read_all(
        &self,
    ) -> (
        StoreResult<Option<Vec<Equipment>>>,
        StoreResult<Option<Vec<UsageHistoryRecord>>>,
        StoreResult<Option<BillingSettings>>,
    ) {
        thread::scope(|s| {
            let equipment = s.spawn(|| self.get_equipment());
            let history = s.spawn(|| self.get_usage_history(&[]));
            let settings = self.get_billing_settings();
            (join(equipment), join(history), settings)
        })
    }

    /// Initial load of all three collections.
    ///
    /// Collections a backend reports as absent fall back to the starter
    /// equipment list, an empty history and initial rates.
    pub fn load(&self) -> StoreResult<Snapshot> {
        match self.read_all() {
            (Ok(equipment), Ok(history), Ok(settings)) => Ok(Snapshot {
                equipment: equipment.unwrap_or_else(Equipment::starter_set),
                usage_history: history.unwrap_or_default(),
                billing_settings: settings.unwrap_or_else(BillingSettings::initial),
            }),
            (equipment, history, settings) => Err(failure(
                "load",
                [
                    (Collection::Equipment, equipment.err()),
                    (Collection::UsageHistory, history.err()),
                    (Collection::BillingSettings, settings.err()),
                ],
            )),
        }
    }

    /// Bundle all three collections, stamped with the export time
    pub fn export_all(&self) -> StoreResult<ExportBundle> {
        match self.read_all() {
            (Ok(equipment), Ok(history), Ok(settings)) => Ok(ExportBundle {
                equipment: equipment.unwrap_or_default(),
                usage_history: history.unwrap_or_default(),
                billing_settings: settings.unwrap_or_default(),
                export_date: Utc::now(),
            }),
            (equipment, history, settings) => Err(failure(
                "export",
                [
                    (Collection::Equipment, equipment.err()),
                    (Collection::UsageHistory, history.err()),
                    (Collection::BillingSettings, settings.err()),
                ],
            )),
        }
    }

    /// Write all three collections, substituting defaults for missing ones
    pub fn import_all(&self, bundle: ImportBundle) -> StoreResult<()> {
        let equipment = bundle.equipment.unwrap_or_default();
        let history = bundle.usage_history.unwrap_or_default();
        let settings = bundle.billing_settings.unwrap_or_default();

        let outcomes: Outcomes = thread::scope(|s| {
            let equipment = s.spawn(|| self.save_equipment(&equipment));
            let history = s.spawn(|| self.save_usage_history(&history));
            let settings = self.save_billing_settings(&settings);
            [
                (Collection::Equipment, join(equipment).err()),
                (Collection::UsageHistory, join(history).err()),
                (Collection::BillingSettings, settings.err()),
            ]
        });
        if outcomes.iter().all(|(_, error)| error.is_none()) {
            Ok(())
        } else {
            Err(failure("import", outcomes))
        }
    }

    /// Delete every calculator collection. Only the local backend owns its
    /// whole dataset; the others refuse.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.store.clear(&Collection::CALCULATOR)
    }
}

/// Persistence for the meter tracker. Always backed by the local store.
pub struct MeterService {
    store: Box<dyn Store>,
}

impl MeterService {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get_history(&self) -> StoreResult<Vec<MeterReadingRecord>> {
        Ok(read(self.store.as_ref(), Collection::MeterHistory, &[])?.unwrap_or_default())
    }

    pub fn save_history(&self, history: &[MeterReadingRecord]) -> StoreResult<()> {
        write(self.store.as_ref(), Collection::MeterHistory, history)
    }

    pub fn get_settings(&self) -> StoreResult<MeterBillingSettings> {
        Ok(read(self.store.as_ref(), Collection::MeterSettings, &[])?
            .unwrap_or_else(MeterBillingSettings::initial))
    }

    pub fn save_settings(&self, settings: &MeterBillingSettings) -> StoreResult<()> {
        write(self.store.as_ref(), Collection::MeterSettings, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, LocalStore};
    use tempfile::TempDir;

    fn local_service() -> (TempDir, DataService) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(Some(dir.path().join("svc.db").as_path())).unwrap();
        (dir, DataService::new(Box::new(store)))
    }

    #[test]
    fn test_local_defaults_when_empty() {
        let (_dir, svc) = local_service();
        assert_eq!(svc.get_equipment().unwrap(), Some(Vec::new()));
        assert_eq!(svc.get_usage_history(&[]).unwrap(), Some(Vec::new()));
        assert!(svc.get_billing_settings().unwrap().is_some());
    }

    #[test]
    fn test_load_on_empty_local_store() {
        let (_dir, svc) = local_service();
        let snapshot = svc.load().unwrap();
        // local never reports "absent", so the starter set is not used
        assert!(snapshot.equipment.is_empty());
        assert!(snapshot.usage_history.is_empty());
    }

    #[test]
    fn test_document_store_load_is_unavailable() {
        let svc = DataService::new(Box::new(DocumentStore));
        assert!(matches!(
            svc.load(),
            Err(StoreError::Unavailable { backend: Backend::DocumentStore })
        ));
        assert!(matches!(
            svc.export_all(),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            svc.import_all(ImportBundle::default()),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(svc.clear_all(), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_failure_names_failed_collections() {
        let err = failure(
            "import",
            [
                (Collection::Equipment, None),
                (Collection::UsageHistory, Some(StoreError::Status { code: 500 })),
                (Collection::BillingSettings, Some(StoreError::Network("down".into()))),
            ],
        );
        match err {
            StoreError::Incomplete { operation, failed } => {
                assert_eq!(operation, "import");
                assert_eq!(failed, vec![Collection::UsageHistory, Collection::BillingSettings]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_meter_service_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(Some(dir.path().join("meter.db").as_path())).unwrap();
        let meter = MeterService::new(Box::new(store));

        assert!(meter.get_history().unwrap().is_empty());
        let settings = MeterBillingSettings {
            unit_rate: 4.0,
            service_fee: 0.0,
            minimum_charge: 10.0,
        };
        meter.save_settings(&settings).unwrap();
        assert_eq!(meter.get_settings().unwrap(), settings);
    }
}
