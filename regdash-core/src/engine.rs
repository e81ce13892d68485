//! The list engine
//!
//! Owns the in-memory snapshot of one remote collection and derives the
//! filtered, sorted and paginated view rendered by a list screen. Confirmed
//! deletes and updates are patched into the snapshot so the view stays
//! correct until the next refresh replaces it wholesale.
//!
//! The filtered view is a vector of positions into the collection, so both
//! stay consistent through local mutations without copying records.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DashError, Result};
use crate::pagination::{clamp_page, PageInfo};
use crate::record::{Collection, Record};

/// Direction of the active sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// The single active sort column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Allowed page sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Twenty, PageSize::Fifty];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
        }
    }

    /// Next size in the cycle 10 → 20 → 50 → 10
    pub fn next(self) -> Self {
        match self {
            PageSize::Ten => PageSize::Twenty,
            PageSize::Twenty => PageSize::Fifty,
            PageSize::Fifty => PageSize::Ten,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = DashError;

    fn try_from(n: usize) -> Result<Self> {
        match n {
            10 => Ok(PageSize::Ten),
            20 => Ok(PageSize::Twenty),
            50 => Ok(PageSize::Fifty),
            other => Err(DashError::InvalidPageSize(other)),
        }
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Ephemeral search, sort and page state layered over a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub search: String,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: PageSize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

/// Client-side search, sort and pagination over one collection
#[derive(Debug, Clone)]
pub struct ListEngine {
    collection: Collection,
    state: ViewState,
    /// Positions into `collection`, in view order
    filtered: Vec<usize>,
}

impl ListEngine {
    pub fn new(collection: Collection) -> Self {
        Self::with_page_size(collection, PageSize::default())
    }

    pub fn with_page_size(collection: Collection, page_size: PageSize) -> Self {
        let filtered = (0..collection.len()).collect();
        Self {
            collection,
            state: ViewState {
                page_size,
                ..ViewState::default()
            },
            filtered,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn identity_field(&self) -> &str {
        self.collection.identity_field()
    }

    /// Number of records in the filtered view
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// The whole filtered and sorted view
    pub fn filtered(&self) -> impl Iterator<Item = &Record> + Clone + '_ {
        self.filtered.iter().map(move |&i| &self.collection.records()[i])
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo::new(self.state.page, self.state.page_size.get(), self.filtered.len())
    }

    /// Filter by a case-insensitive substring of any field. Resets to page 1.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.state.search = term.into();
        self.state.page = 1;
        self.refilter();
    }

    /// Sort by `column`, toggling the direction when it is already active
    pub fn set_sort(&mut self, column: &str) {
        let direction = match &self.state.sort {
            Some(active) if active.column == column => active.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.state.sort = Some(SortSpec {
            column: column.to_string(),
            direction,
        });
        self.sort_filtered();
    }

    /// Change the page size; the current page is left as is
    pub fn set_page_size(&mut self, size: PageSize) {
        debug!(size = size.get(), page = self.state.page, "page size changed");
        self.state.page_size = size;
    }

    /// Jump to page `n`, clamped to the pages that exist. Returns the page landed on.
    pub fn go_to_page(&mut self, n: usize) -> usize {
        self.state.page = clamp_page(n, self.filtered.len(), self.state.page_size.get());
        self.state.page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.state.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.go_to_page(self.state.page.saturating_sub(1))
    }

    /// Remove the record with this identity from the snapshot and the view.
    ///
    /// A missing identity leaves everything unchanged and returns `None`.
    pub fn apply_delete(&mut self, identity: &str) -> Option<Record> {
        let Some(pos) = self.collection.position(identity) else {
            warn!(
                field = %self.identity_field(),
                identity,
                "delete of a record that is not in the snapshot"
            );
            return None;
        };

        let removed = self.collection.remove(pos);
        self.filtered.retain(|&i| i != pos);
        for i in &mut self.filtered {
            if *i > pos {
                *i -= 1;
            }
        }
        debug!(identity, remaining = self.collection.len(), "applied delete");
        Some(removed)
    }

    /// Replace the record sharing `updated`'s identity, keeping its position.
    ///
    /// Returns the previous record. Fails with `NotFound` when no record
    /// carries that identity, leaving the snapshot unchanged.
    pub fn apply_update(&mut self, updated: Record) -> Result<Record> {
        let field = self.identity_field().to_string();
        let key = updated
            .identity_key(&field)
            .ok_or_else(|| DashError::missing_identity(&field))?;
        let pos = self
            .collection
            .position(&key)
            .ok_or_else(|| DashError::not_found(&field, &key))?;

        debug!(identity = %key, "applied update");
        Ok(self.collection.replace_at(pos, updated))
    }

    /// Append a newly created record, rejecting a duplicate identity
    pub fn apply_insert(&mut self, created: Record) -> Result<()> {
        let field = self.identity_field().to_string();
        let key = created
            .identity_key(&field)
            .ok_or_else(|| DashError::missing_identity(&field))?;
        if self.collection.position(&key).is_some() {
            return Err(DashError::duplicate_identity(&field, key));
        }

        let matches = created.matches(&self.state.search.to_lowercase());
        self.collection.push(created);
        if matches {
            self.filtered.push(self.collection.len() - 1);
            self.sort_filtered();
        }
        Ok(())
    }

    /// The records of the current page, recomputed on each call
    pub fn visible_slice(&self) -> impl Iterator<Item = &Record> + Clone + '_ {
        let info = self.page_info();
        self.filtered
            .iter()
            .skip(info.offset())
            .take(info.page_size)
            .map(move |&i| &self.collection.records()[i])
    }

    /// Swap in a freshly fetched collection.
    ///
    /// Search is cleared and the page reset to 1; sort and page size are kept.
    pub fn replace(&mut self, collection: Collection) {
        debug!(
            old = self.collection.len(),
            new = collection.len(),
            "collection replaced"
        );
        self.collection = collection;
        self.state.search.clear();
        self.state.page = 1;
        self.refilter();
    }

    fn refilter(&mut self) {
        let needle = self.state.search.to_lowercase();
        self.filtered = self
            .collection
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(&needle))
            .map(|(i, _)| i)
            .collect();
        debug!(
            term = %self.state.search,
            matched = self.filtered.len(),
            total = self.collection.len(),
            "filtered view recomputed"
        );
        self.sort_filtered();
    }

    fn sort_filtered(&mut self) {
        let Some(sort) = &self.state.sort else {
            return;
        };
        let records = self.collection.records();
        // sort_by is stable: ties keep their prior relative order
        self.filtered.sort_by(|&a, &b| {
            let ord = records[a]
                .value(&sort.column)
                .natural_cmp(records[b].value(&sort.column));
            sort.direction.apply(ord)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Collection {
        let rows = [
            ("1", "Carlos", 30i64, "2024-03-01"),
            ("2", "ana", 25, "2023-11-20"),
            ("3", "Beatriz", 30, "2024-01-15"),
            ("4", "David", 9, "2022-06-30"),
        ];
        Collection::new(
            "cedula",
            rows.iter()
                .map(|(id, name, age, date)| {
                    Record::new()
                        .with("cedula", *id)
                        .with("nombre", *name)
                        .with("edad", *age)
                        .with("fecha", *date)
                })
                .collect(),
        )
        .unwrap()
    }

    fn ids<'a>(rows: impl Iterator<Item = &'a Record>) -> Vec<String> {
        rows.map(|r| r.value("cedula").key()).collect()
    }

    #[test]
    fn search_is_case_insensitive_and_resets_page() {
        let mut engine = ListEngine::new(people());
        engine.state.page = 3;
        engine.set_search_term("AN");
        assert_eq!(ids(engine.filtered()), vec!["2"]);
        assert_eq!(engine.state().page, 1);

        engine.set_search_term("30");
        assert_eq!(ids(engine.filtered()), vec!["1", "3", "4"]);

        engine.set_search_term("");
        assert_eq!(ids(engine.filtered()), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn sort_numeric_stable_and_toggles() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("edad");
        assert_eq!(ids(engine.filtered()), vec!["4", "2", "1", "3"]);

        engine.set_sort("edad");
        assert_eq!(engine.state().sort.as_ref().unwrap().direction, SortDirection::Descending);
        // ties (1 and 3) keep their relative order
        assert_eq!(ids(engine.filtered()), vec!["1", "3", "2", "4"]);

        engine.set_sort("edad");
        assert_eq!(ids(engine.filtered()), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn sort_dates_chronologically() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("fecha");
        assert_eq!(ids(engine.filtered()), vec!["4", "2", "3", "1"]);
    }

    #[test]
    fn new_column_sorts_ascending() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("edad");
        engine.set_sort("edad");
        engine.set_sort("nombre");
        let sort = engine.state().sort.clone().unwrap();
        assert_eq!(sort.column, "nombre");
        assert_eq!(sort.direction, SortDirection::Ascending);
        // lexicographic: uppercase before lowercase
        assert_eq!(ids(engine.filtered()), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn sort_survives_search() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("nombre");
        engine.set_search_term("a");
        assert_eq!(ids(engine.filtered()), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn go_to_page_clamps() {
        let mut engine = ListEngine::new(people());
        assert_eq!(engine.go_to_page(0), 1);
        assert_eq!(engine.go_to_page(7), 1);

        engine.set_search_term("nobody");
        assert_eq!(engine.go_to_page(2), 1);
        assert_eq!(engine.visible_slice().count(), 0);
    }

    #[test]
    fn visible_slice_is_restartable() {
        let engine = ListEngine::new(people());
        let slice = engine.visible_slice();
        let first: Vec<_> = ids(slice.clone());
        let second: Vec<_> = ids(slice);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn delete_updates_view_positions() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("edad");
        let removed = engine.apply_delete("2").unwrap();
        assert_eq!(removed.value("nombre").to_string(), "ana");
        assert_eq!(ids(engine.filtered()), vec!["4", "1", "3"]);
        assert_eq!(engine.collection().len(), 3);

        assert!(engine.apply_delete("2").is_none());
        assert_eq!(engine.collection().len(), 3);
    }

    #[test]
    fn update_keeps_position() {
        let mut engine = ListEngine::new(people());
        engine.set_search_term("carlos");
        let updated = Record::new()
            .with("cedula", "1")
            .with("nombre", "Camilo")
            .with("edad", 31i64);
        let old = engine.apply_update(updated).unwrap();
        assert_eq!(old.value("nombre").to_string(), "Carlos");

        // stays visible until the next search, even though it no longer matches
        assert_eq!(ids(engine.filtered()), vec!["1"]);
        assert_eq!(engine.collection().records()[0].value("nombre").to_string(), "Camilo");
    }

    #[test]
    fn update_unknown_identity_fails() {
        let mut engine = ListEngine::new(people());
        let before = engine.collection().clone();
        let err = engine
            .apply_update(Record::new().with("cedula", "99"))
            .unwrap_err();
        assert!(err.is_stale());
        assert_eq!(engine.collection(), &before);
    }

    #[test]
    fn insert_appends_and_respects_search() {
        let mut engine = ListEngine::new(people());
        engine.set_search_term("ana");
        engine
            .apply_insert(Record::new().with("cedula", "5").with("nombre", "Eva"))
            .unwrap();
        assert_eq!(engine.collection().len(), 5);
        assert_eq!(ids(engine.filtered()), vec!["2"]);

        let dup = engine.apply_insert(Record::new().with("cedula", "5"));
        assert!(matches!(dup, Err(DashError::DuplicateIdentity { .. })));
    }

    #[test]
    fn replace_resets_search_and_page() {
        let mut engine = ListEngine::new(people());
        engine.set_sort("edad");
        engine.set_search_term("a");
        engine.set_page_size(PageSize::Twenty);
        engine.state.page = 4;

        engine.replace(people());
        assert_eq!(engine.state().search, "");
        assert_eq!(engine.state().page, 1);
        assert_eq!(engine.state().page_size, PageSize::Twenty);
        assert_eq!(ids(engine.filtered()), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn page_size_parsing() {
        assert_eq!(PageSize::try_from(20).unwrap(), PageSize::Twenty);
        assert!(PageSize::try_from(15).is_err());
        assert_eq!(PageSize::Fifty.next(), PageSize::Ten);
        let size: PageSize = serde_json::from_str("50").unwrap();
        assert_eq!(size, PageSize::Fifty);
    }
}
