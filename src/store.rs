use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Record;
use crate::record_id::generate_record_id;
use crate::storage::{KeyValueStorage, StorageError};

/// What `load` does when the stored JSON no longer parses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    #[default]
    Reseed,
    Fail,
}

#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Json(serde_json::Error),
    Corrupt { key: String, source: serde_json::Error },
    DuplicateId(String),
    NotFound { entity: &'static str, id: String },
    /// JSON has no NaN or infinity; serde_json would write `null` and the next load would fail.
    NonFinite {
        entity: &'static str,
        id: String,
        field: &'static str,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Storage(err) => write!(f, "{}", err),
            StoreError::Json(err) => write!(f, "JSON error: {}", err),
            StoreError::Corrupt { key, source } => {
                write!(f, "stored collection '{}' is corrupt: {}", key, source)
            }
            StoreError::DuplicateId(id) => write!(f, "a record with id '{}' already exists", id),
            StoreError::NotFound { entity, id } => write!(f, "{} '{}' not found", entity, id),
            StoreError::NonFinite { entity, id, field } => write!(
                f,
                "{} '{}' has a non-finite value in '{}'; nothing was saved",
                entity, id, field
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Storage(err) => Some(err),
            StoreError::Json(err) => Some(err),
            StoreError::Corrupt { source, .. } => Some(source),
            StoreError::DuplicateId(_) => None,
            StoreError::NotFound { .. } => None,
            StoreError::NonFinite { .. } => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        StoreError::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value)
    }
}

/// The in-memory collection for one record type, mirrored to a single storage key.
///
/// Every public mutation ends with a full [`RecordStore::save`]. The `detach*`
/// methods are the exception: they change memory only, so callers can commit
/// several collections together with [`KeyValueStorage::set_items`].
pub struct RecordStore<'a, R: Record> {
    storage: &'a dyn KeyValueStorage,
    records: Vec<R>,
}

impl<'a, R: Record> RecordStore<'a, R> {
    pub fn load(storage: &'a dyn KeyValueStorage, policy: CorruptPolicy) -> Result<Self, StoreError> {
        let key = R::schema().storage_key;
        let records = match storage.get_item(key)? {
            Some(raw) => match serde_json::from_str::<Vec<R>>(&raw) {
                Ok(records) => records,
                Err(err) => match policy {
                    CorruptPolicy::Fail => {
                        return Err(StoreError::Corrupt {
                            key: key.to_string(),
                            source: err,
                        })
                    }
                    CorruptPolicy::Reseed => {
                        tracing::warn!(key, error = %err, "stored collection is corrupt; reseeding");
                        return Self::seeded(storage);
                    }
                },
            },
            None => {
                tracing::info!(key, "no stored collection; seeding sample data");
                return Self::seeded(storage);
            }
        };
        Ok(Self { storage, records })
    }

    fn seeded(storage: &'a dyn KeyValueStorage) -> Result<Self, StoreError> {
        let store = Self {
            storage,
            records: R::seed(),
        };
        store.save()?;
        Ok(store)
    }

    pub fn key(&self) -> &'static str {
        R::schema().storage_key
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Refuses collections with a NaN or infinite numeric field, computed ones included.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let schema = R::schema();
        for record in &self.records {
            for spec in schema.numeric_fields() {
                let finite = record
                    .get(spec.name)
                    .and_then(|value| value.as_f64())
                    .map_or(true, f64::is_finite);
                if !finite {
                    return Err(StoreError::NonFinite {
                        entity: schema.entity,
                        id: record.id().to_string(),
                        field: spec.name,
                    });
                }
            }
        }
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let json = self.to_json()?;
        self.storage.set_item(self.key(), &json)?;
        Ok(())
    }

    pub fn fresh_id(&self) -> String {
        generate_record_id(R::schema().id_prefix, |candidate| self.contains(candidate))
    }

    pub fn add(&mut self, mut record: R) -> Result<R, StoreError> {
        if record.id().trim().is_empty() {
            record.set_id(self.fresh_id());
        } else if self.contains(record.id()) {
            return Err(StoreError::DuplicateId(record.id().to_string()));
        }
        self.records.push(record.clone());
        if let Err(err) = self.save() {
            self.records.pop();
            return Err(err);
        }
        tracing::info!(key = self.key(), id = record.id(), "record added");
        Ok(record)
    }

    /// Appends every record with one save; blank or clashing ids get fresh ones.
    pub fn append_all(&mut self, incoming: Vec<R>) -> Result<Vec<R>, StoreError> {
        let mut added = Vec::with_capacity(incoming.len());
        for mut record in incoming {
            if record.id().trim().is_empty() || self.contains(record.id()) {
                record.set_id(self.fresh_id());
            }
            self.records.push(record.clone());
            added.push(record);
        }
        self.save()?;
        tracing::info!(key = self.key(), count = added.len(), "records appended");
        Ok(added)
    }

    /// Applies `patch` to a copy of the record and replaces the stored one. The id is kept.
    pub fn update<F>(&mut self, id: &str, patch: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut R),
    {
        let index = self.position(id)?;
        let mut next = self.records[index].clone();
        patch(&mut next);
        next.set_id(id.to_string());
        let previous = std::mem::replace(&mut self.records[index], next.clone());
        if let Err(err) = self.save() {
            self.records[index] = previous;
            return Err(err);
        }
        tracing::info!(key = self.key(), id, "record updated");
        Ok(next)
    }

    pub fn remove(&mut self, id: &str) -> Result<R, StoreError> {
        let removed = self.detach(id)?;
        self.save()?;
        tracing::info!(key = self.key(), id, "record removed");
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let count = self.records.len();
        self.records.clear();
        self.save()?;
        tracing::info!(key = self.key(), count, "collection cleared");
        Ok(count)
    }

    pub fn detach(&mut self, id: &str) -> Result<R, StoreError> {
        let index = self.position(id)?;
        Ok(self.records.remove(index))
    }

    pub fn detach_where<P>(&mut self, mut predicate: P) -> Vec<R>
    where
        P: FnMut(&R) -> bool,
    {
        let (removed, kept): (Vec<R>, Vec<R>) =
            self.records.drain(..).partition(|record| predicate(record));
        self.records = kept;
        removed
    }

    /// The key and JSON a caller must write to persist detached changes.
    pub fn pending_write(&self) -> Result<(&'static str, String), StoreError> {
        Ok((self.key(), self.to_json()?))
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: R::schema().entity,
                id: id.to_string(),
            })
    }
}
