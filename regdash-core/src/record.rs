//! Records and collections
//!
//! A `Record` is one row returned by the backend: a map of field name to
//! scalar `Value`. A `Collection` is the full ordered set of records for one
//! resource, with the identity field's values unique within it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DashError, Result};
use crate::value::Value;

static NULL: Value = Value::Null;

/// One row of a collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy for fixtures and forms
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Value of a field, `Null` when absent
    pub fn value(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Identity key for `field`, `None` when the value is missing or blank
    pub fn identity_key(&self, field: &str) -> Option<String> {
        self.get(field)
            .filter(|v| !v.is_blank())
            .map(Value::key)
    }

    /// True when `needle` (already lowercased) occurs in the string form of
    /// any field. An empty needle matches every record.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.fields
            .values()
            .any(|v| v.to_string().to_lowercase().contains(needle))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The in-memory snapshot of one remote resource
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    identity: String,
    records: Vec<Record>,
}

impl Collection {
    /// Build a collection, enforcing that every record has a unique identity
    pub fn new(identity: impl Into<String>, records: Vec<Record>) -> Result<Self> {
        let identity = identity.into();
        let mut seen = HashSet::with_capacity(records.len());

        for record in &records {
            let key = record
                .identity_key(&identity)
                .ok_or_else(|| DashError::missing_identity(&identity))?;
            if !seen.insert(key.clone()) {
                warn!(field = %identity, identity = %key, "duplicate identity in collection");
                return Err(DashError::duplicate_identity(&identity, key));
            }
        }

        Ok(Self { identity, records })
    }

    pub fn empty(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            records: Vec::new(),
        }
    }

    pub fn identity_field(&self) -> &str {
        &self.identity
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the record whose identity key equals `key`
    pub fn position(&self, key: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.value(&self.identity).key() == key)
    }

    pub fn find(&self, key: &str) -> Option<&Record> {
        self.position(key).map(|idx| &self.records[idx])
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub(crate) fn remove(&mut self, idx: usize) -> Record {
        self.records.remove(idx)
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn replace_at(&mut self, idx: usize, record: Record) -> Record {
        std::mem::replace(&mut self.records[idx], record)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
