use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::ai::{AiError, AiGateway, Attachment, CommandAssistant};
use crate::config::{Config, ConfigError};
use crate::domain::{
    EntityKind, Invoice, LineItem, PortfolioCompany, Product, Project, Record, Shipment, Task,
};
use crate::form::{self, FormError, FormValues};
use crate::query::{self, CollectionSummary, QueryError, QueryPage, RecordQuery};
use crate::storage::{now_utc_rfc3339, KeyValueStorage, SqliteStorage, StorageError};
use crate::store::{RecordStore, StoreError};
use crate::transfer::{self, FileFormat, ImportOptions, ImportSummary, TransferError};

/// Storage key of the dark-mode preference, stored as `"true"` or `"false"`.
pub const DARK_MODE_KEY: &str = "darkMode";

pub struct App {
    storage: SqliteStorage,
    config: Config,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CollectionCount {
    pub entity: &'static str,
    pub storage_key: &'static str,
    pub count: usize,
    /// True when the key was absent and seed data was written.
    pub seeded: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectRemoval {
    pub project: Project,
    pub removed_tasks: Vec<Task>,
}

impl App {
    pub fn open(db_path: &str, config: Config) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let storage = SqliteStorage::open(db_path)?;
        Ok(Self { storage, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn store<R: Record>(&self) -> Result<RecordStore<'_, R>, AppError> {
        Ok(RecordStore::load(
            &self.storage,
            self.config.storage.on_corrupt,
        )?)
    }

    /// Loads every collection once, seeding the ones that were never written.
    pub fn init_collections(&self) -> Result<Vec<CollectionCount>, AppError> {
        let existing = self.storage.keys()?;
        EntityKind::ALL
            .iter()
            .map(|kind| -> Result<CollectionCount, AppError> {
                let count = match kind {
                    EntityKind::Projects => self.store::<Project>()?.len(),
                    EntityKind::Tasks => self.store::<Task>()?.len(),
                    EntityKind::Invoices => self.store::<Invoice>()?.len(),
                    EntityKind::Shipments => self.store::<Shipment>()?.len(),
                    EntityKind::Companies => self.store::<PortfolioCompany>()?.len(),
                    EntityKind::Products => self.store::<Product>()?.len(),
                };
                let schema = kind.schema();
                Ok(CollectionCount {
                    entity: schema.entity,
                    storage_key: schema.storage_key,
                    count,
                    seeded: !existing.iter().any(|key| key == schema.storage_key),
                })
            })
            .collect()
    }

    pub fn list<R: Record>(&self, query: &RecordQuery) -> Result<QueryPage<R>, AppError> {
        query.validate(R::schema())?;
        let store = self.store::<R>()?;
        Ok(query::run(store.records(), query))
    }

    pub fn show<R: Record>(&self, id: &str) -> Result<R, AppError> {
        let store = self.store::<R>()?;
        store.get(id).cloned().ok_or_else(|| {
            AppError::Store(StoreError::NotFound {
                entity: R::schema().entity,
                id: id.to_string(),
            })
        })
    }

    pub fn create<R: Record>(&self, values: &FormValues) -> Result<R, AppError> {
        let record = form::submit(R::default(), values)?;
        let mut store = self.store::<R>()?;
        Ok(store.add(record)?)
    }

    pub fn update<R: Record>(&self, id: &str, changes: &FormValues) -> Result<R, AppError> {
        if changes.is_empty() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field=value".to_string(),
            ));
        }
        let mut store = self.store::<R>()?;
        let current = store.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            entity: R::schema().entity,
            id: id.to_string(),
        })?;
        let edited = form::submit_edit(current, changes)?;
        Ok(store.update(id, |record| *record = edited)?)
    }

    pub fn remove<R: Record>(&self, id: &str) -> Result<R, AppError> {
        let mut store = self.store::<R>()?;
        Ok(store.remove(id)?)
    }

    pub fn clear<R: Record>(&self) -> Result<usize, AppError> {
        let mut store = self.store::<R>()?;
        Ok(store.clear()?)
    }

    /// Drops the stored collection so the next load writes the seed records again.
    pub fn reseed<R: Record>(&self) -> Result<usize, AppError> {
        let key = R::schema().storage_key;
        self.storage.remove_item(key)?;
        tracing::info!(key, "collection reset to seed data");
        Ok(self.store::<R>()?.len())
    }

    /// Removes a project and, with `cascade`, its tasks; both keys are written in one transaction.
    pub fn remove_project(&self, id: &str, cascade: bool) -> Result<ProjectRemoval, AppError> {
        let mut projects = self.store::<Project>()?;
        let project = projects.detach(id)?;
        let mut writes = vec![projects.pending_write()?];

        let mut removed_tasks = Vec::new();
        if cascade {
            let mut tasks = self.store::<Task>()?;
            removed_tasks = tasks.detach_where(|task| task.project_id == id);
            if !removed_tasks.is_empty() {
                writes.push(tasks.pending_write()?);
            }
        }

        let entries: Vec<(&str, &str)> = writes
            .iter()
            .map(|(key, json)| (*key, json.as_str()))
            .collect();
        self.storage.set_items(&entries)?;
        tracing::info!(
            id,
            cascade,
            removed_tasks = removed_tasks.len(),
            "project removed"
        );
        Ok(ProjectRemoval {
            project,
            removed_tasks,
        })
    }

    pub fn projects(&self) -> Result<Vec<Project>, AppError> {
        Ok(self.store::<Project>()?.into_records())
    }

    /// Tasks whose project no longer exists.
    pub fn orphaned_tasks(&self) -> Result<Vec<Task>, AppError> {
        let projects = self.store::<Project>()?;
        let tasks = self.store::<Task>()?;
        Ok(tasks
            .records()
            .iter()
            .filter(|task| !projects.contains(&task.project_id))
            .cloned()
            .collect())
    }

    pub fn remove_orphaned_tasks(&self) -> Result<Vec<Task>, AppError> {
        let projects = self.store::<Project>()?;
        let mut tasks = self.store::<Task>()?;
        let removed = tasks.detach_where(|task| !projects.contains(&task.project_id));
        if !removed.is_empty() {
            tasks.save()?;
            tracing::info!(count = removed.len(), "orphaned tasks removed");
        }
        Ok(removed)
    }

    pub fn add_line_item(&self, invoice_id: &str, item: LineItem) -> Result<Invoice, AppError> {
        if !item.quantity.is_finite() || !item.unit_price.is_finite() {
            return Err(AppError::InvalidArgument(format!(
                "line item quantity and unit price must be finite numbers, got {} x {}",
                item.quantity, item.unit_price
            )));
        }
        let mut store = self.store::<Invoice>()?;
        Ok(store.update(invoice_id, |invoice| invoice.items.push(item))?)
    }

    /// `index` is 1-based, as shown by `items ls`.
    pub fn remove_line_item(&self, invoice_id: &str, index: usize) -> Result<Invoice, AppError> {
        let mut store = self.store::<Invoice>()?;
        let count = store
            .get(invoice_id)
            .map(|invoice| invoice.items.len())
            .ok_or_else(|| StoreError::NotFound {
                entity: Invoice::schema().entity,
                id: invoice_id.to_string(),
            })?;
        if index == 0 || index > count {
            return Err(AppError::InvalidArgument(format!(
                "invoice '{}' has {} line item(s); index {} is out of range",
                invoice_id, count, index
            )));
        }
        Ok(store.update(invoice_id, |invoice| {
            invoice.items.remove(index - 1);
        })?)
    }

    pub fn export<R: Record>(
        &self,
        format: FileFormat,
        query: &RecordQuery,
    ) -> Result<String, AppError> {
        let page = self.list::<R>(query)?;
        let output = match format {
            FileFormat::Csv => transfer::export_csv(&page.items),
            FileFormat::Json => transfer::export_json(&page.items, &now_utc_rfc3339())?,
        };
        tracing::info!(
            entity = R::schema().entity,
            format = format.as_str(),
            count = page.items.len(),
            "collection exported"
        );
        Ok(output)
    }

    pub fn import<R: Record>(
        &self,
        path: &Path,
        format: Option<FileFormat>,
        options: ImportOptions,
    ) -> Result<ImportSummary, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let format = format.unwrap_or_else(|| FileFormat::from_path(path));
        let batch = match format {
            FileFormat::Csv => transfer::decode_csv::<R>(&raw)?,
            FileFormat::Json => transfer::decode_json::<R>(&raw)?,
        };
        let mut store = self.store::<R>()?;
        Ok(transfer::apply(
            &mut store,
            batch,
            &path.display().to_string(),
            options,
        )?)
    }

    pub fn summarize<R: Record>(&self, query: &RecordQuery) -> Result<CollectionSummary, AppError> {
        let page = self.list::<R>(query)?;
        Ok(query::summarize(&page.items))
    }

    /// The filtered collection as a CSV attachment for the assistant.
    pub fn ai_context<R: Record>(&self, query: &RecordQuery) -> Result<Attachment, AppError> {
        let page = self.list::<R>(query)?;
        Ok(Attachment {
            name: format!("{}.csv", R::schema().storage_key),
            content: transfer::export_csv(&page.items),
        })
    }

    pub fn ai_gateway(&self) -> AiGateway {
        let timeout = self.config.ai.timeout();
        match CommandAssistant::from_argv(&self.config.ai.command) {
            Some(assistant) => AiGateway::new(Box::new(assistant), timeout),
            None => AiGateway::unavailable(timeout),
        }
    }

    pub fn dark_mode(&self) -> Result<bool, AppError> {
        let value = self.storage.get_item(DARK_MODE_KEY)?;
        Ok(value.as_deref().map(str::trim) == Some("true"))
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<bool, AppError> {
        self.storage
            .set_item(DARK_MODE_KEY, if enabled { "true" } else { "false" })?;
        Ok(enabled)
    }

    pub fn toggle_dark_mode(&self) -> Result<bool, AppError> {
        let next = !self.dark_mode()?;
        self.set_dark_mode(next)
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Storage(StorageError),
    Store(StoreError),
    Form(FormError),
    Query(QueryError),
    Transfer(TransferError),
    Config(ConfigError),
    Ai(AiError),
    InvalidArgument(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Storage(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Form(err) => write!(f, "{}", err),
            AppError::Query(err) => write!(f, "{}", err),
            AppError::Transfer(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Ai(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::Query(err) => Some(err),
            AppError::Transfer(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Ai(err) => Some(err),
            AppError::InvalidArgument(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        AppError::Storage(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<FormError> for AppError {
    fn from(value: FormError) -> Self {
        AppError::Form(value)
    }
}

impl From<QueryError> for AppError {
    fn from(value: QueryError) -> Self {
        AppError::Query(value)
    }
}

impl From<TransferError> for AppError {
    fn from(value: TransferError) -> Self {
        AppError::Transfer(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<AiError> for AppError {
    fn from(value: AiError) -> Self {
        AppError::Ai(value)
    }
}

#[cfg(test)]
mod tests;
