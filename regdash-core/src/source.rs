//! Data source trait
//!
//! The remote side of a list: fetch a whole collection, create, update and
//! delete single records. `regdash-client` implements it over HTTP;
//! `MemorySource` keeps everything in process for tests and demos.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DashError, Result};
use crate::record::{Collection, Record};

/// Trait for the remote store of every resource (testable)
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All records of the resource at `path`, in the order the remote returns them
    async fn fetch_records(&self, path: &str) -> Result<Vec<Record>>;

    async fn create(&self, path: &str, record: &Record) -> Result<Record>;

    async fn update(&self, path: &str, id: &str, record: &Record) -> Result<Record>;

    async fn delete(&self, path: &str, id: &str) -> Result<()>;

    /// Fetch and build a collection keyed by `identity`
    async fn fetch_all(&self, path: &str, identity: &str) -> Result<Collection> {
        let records = self.fetch_records(path).await?;
        Collection::new(identity, records)
    }
}

#[derive(Debug, Default)]
struct Table {
    identity: String,
    records: Vec<Record>,
}

/// In-memory data source
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: Mutex<HashMap<String, Table>>,
    failures: Mutex<Vec<DashError>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource
    pub fn with_resource(self, path: &str, identity: &str, records: Vec<Record>) -> Self {
        self.lock_tables().insert(
            path.to_string(),
            Table {
                identity: identity.to_string(),
                records,
            },
        );
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: DashError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(error);
        }
    }

    /// Current records of a resource
    pub fn records(&self, path: &str) -> Vec<Record> {
        self.lock_tables()
            .get(path)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Table>> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn injected_failure(&self) -> Result<()> {
        match self.failures.lock() {
            Ok(mut failures) if !failures.is_empty() => Err(failures.remove(0)),
            _ => Ok(()),
        }
    }

    fn with_table<T>(&self, path: &str, f: impl FnOnce(&mut Table) -> Result<T>) -> Result<T> {
        self.injected_failure()?;
        let mut tables = self.lock_tables();
        let table = tables.get_mut(path).ok_or_else(|| DashError::Http {
            status: 404,
            url: path.to_string(),
            body: "unknown resource".to_string(),
        })?;
        f(table)
    }
}

fn missing(path: &str, id: &str) -> DashError {
    DashError::Http {
        status: 404,
        url: format!("{}/{}", path, id),
        body: "not found".to_string(),
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_records(&self, path: &str) -> Result<Vec<Record>> {
        self.with_table(path, |t| Ok(t.records.clone()))
    }

    async fn create(&self, path: &str, record: &Record) -> Result<Record> {
        self.with_table(path, |t| {
            let key = record
                .identity_key(&t.identity)
                .ok_or_else(|| DashError::missing_identity(&t.identity))?;
            if t.records.iter().any(|r| r.value(&t.identity).key() == key) {
                return Err(DashError::Http {
                    status: 409,
                    url: path.to_string(),
                    body: format!("duplicate {}", key),
                });
            }
            t.records.push(record.clone());
            Ok(record.clone())
        })
    }

    async fn update(&self, path: &str, id: &str, record: &Record) -> Result<Record> {
        self.with_table(path, |t| {
            let slot = t
                .records
                .iter_mut()
                .find(|r| r.value(&t.identity).key() == id)
                .ok_or_else(|| missing(path, id))?;
            *slot = record.clone();
            Ok(record.clone())
        })
    }

    async fn delete(&self, path: &str, id: &str) -> Result<()> {
        self.with_table(path, |t| {
            let before = t.records.len();
            t.records.retain(|r| r.value(&t.identity).key() != id);
            if t.records.len() == before {
                return Err(missing(path, id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new().with_resource(
            "agentes",
            "agente_id",
            vec![
                Record::new().with("agente_id", 1i64).with("nombre_agente", "Ana"),
                Record::new().with("agente_id", 2i64).with("nombre_agente", "Luis"),
            ],
        )
    }

    #[tokio::test]
    async fn crud_round() {
        let source = source();
        let collection = source.fetch_all("agentes", "agente_id").await.unwrap();
        assert_eq!(collection.len(), 2);

        source
            .create("agentes", &Record::new().with("agente_id", 3i64))
            .await
            .unwrap();
        source
            .update("agentes", "1", &Record::new().with("agente_id", 1i64).with("nombre_agente", "Ana M"))
            .await
            .unwrap();
        source.delete("agentes", "2").await.unwrap();

        let names: Vec<String> = source
            .records("agentes")
            .iter()
            .map(|r| r.value("nombre_agente").to_string())
            .collect();
        assert_eq!(names, vec!["Ana M", ""]);
    }

    #[tokio::test]
    async fn missing_rows_are_http_404() {
        let source = source();
        let err = source.delete("agentes", "9").await.unwrap_err();
        assert!(matches!(err, DashError::Http { status: 404, .. }));
        assert!(source.fetch_records("nope").await.is_err());
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let source = source();
        source.fail_next(DashError::transport("connection refused"));
        assert!(source.fetch_records("agentes").await.unwrap_err().is_remote());
        assert!(source.fetch_records("agentes").await.is_ok());
    }
}
