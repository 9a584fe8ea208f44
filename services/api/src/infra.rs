use chrono::{DateTime, Utc};
use mariner_qhse::workflows::documents::{
    DocumentFilter, DocumentId, DocumentRecord, DocumentRepository, InMemoryObjectStore,
    LocalDiskObjectStore, ObjectStore, RepositoryError, SequenceKey, StorageError,
};
use mariner_qhse::workflows::kpi::{KpiRepository, KpiRepositoryError, KpiSheet};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn locked<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentRepository {
    records: Arc<Mutex<HashMap<DocumentId, DocumentRecord>>>,
    sequences: Arc<Mutex<BTreeMap<SequenceKey, u32>>>,
    documents: Arc<Mutex<u64>>,
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = locked(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: DocumentRecord) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.records)?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        let guard = locked(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        let mut guard = locked(&self.records)?;
        Ok(guard.remove(id))
    }

    fn mark_superseded(
        &self,
        id: &DocumentId,
        successor: &DocumentId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.records)?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.superseded_by.is_some() {
            return Err(RepositoryError::Conflict);
        }
        record.superseded_by = Some(successor.clone());
        record.updated_at = at;
        Ok(())
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let guard = locked(&self.records)?;
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn next_sequence(&self, key: SequenceKey) -> Result<u32, RepositoryError> {
        let mut guard = locked(&self.sequences)?;
        let next = guard.entry(key).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    fn next_document_number(&self) -> Result<u64, RepositoryError> {
        let mut guard = locked(&self.documents)?;
        *guard += 1;
        Ok(*guard)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryKpiRepository {
    sheets: Arc<Mutex<BTreeMap<i32, KpiSheet>>>,
}

impl InMemoryKpiRepository {
    fn sheets(&self) -> Result<MutexGuard<'_, BTreeMap<i32, KpiSheet>>, KpiRepositoryError> {
        self.sheets
            .lock()
            .map_err(|_| KpiRepositoryError::Unavailable("kpi mutex poisoned".to_string()))
    }
}

impl KpiRepository for InMemoryKpiRepository {
    fn insert(&self, sheet: KpiSheet) -> Result<KpiSheet, KpiRepositoryError> {
        let mut guard = self.sheets()?;
        if guard.contains_key(&sheet.year) {
            return Err(KpiRepositoryError::Conflict);
        }
        guard.insert(sheet.year, sheet.clone());
        Ok(sheet)
    }

    fn update(&self, sheet: KpiSheet) -> Result<(), KpiRepositoryError> {
        let mut guard = self.sheets()?;
        match guard.get_mut(&sheet.year) {
            Some(existing) => {
                *existing = sheet;
                Ok(())
            }
            None => Err(KpiRepositoryError::NotFound),
        }
    }

    fn fetch(&self, year: i32) -> Result<Option<KpiSheet>, KpiRepositoryError> {
        Ok(self.sheets()?.get(&year).cloned())
    }

    fn years(&self) -> Result<Vec<i32>, KpiRepositoryError> {
        Ok(self.sheets()?.keys().copied().collect())
    }
}

/// Object store picked at startup: disk when `APP_STORAGE_DIR` is set, memory otherwise.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryObjectStore),
    Disk(LocalDiskObjectStore),
}

impl ConfiguredStore {
    pub(crate) fn describe(&self) -> String {
        match self {
            ConfiguredStore::Memory(_) => "memory".to_string(),
            ConfiguredStore::Disk(store) => store.root().display().to_string(),
        }
    }
}

impl ObjectStore for ConfiguredStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        match self {
            ConfiguredStore::Memory(store) => store.put(key, bytes),
            ConfiguredStore::Disk(store) => store.put(key, bytes),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self {
            ConfiguredStore::Memory(store) => store.get(key),
            ConfiguredStore::Disk(store) => store.get(key),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            ConfiguredStore::Memory(store) => store.delete(key),
            ConfiguredStore::Disk(store) => store.delete(key),
        }
    }
}
