//! List controller
//!
//! Ties one `ListEngine` to its data source and notification sink. Remote
//! work is started with a `begin_*` method, which returns a detached
//! `PendingOp`, and applied with `complete` once it resolves. Until then the
//! engine keeps serving the previous snapshot, so a UI can stay interactive
//! while a request is in flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dialog::{DeleteConfirmation, EditDraft};
use crate::engine::ListEngine;
use crate::error::{DashError, Result};
use crate::notify::{Notice, NotificationSink, Operation};
use crate::record::{Collection, Record};
use crate::resources::Related;
use crate::schema::{FieldSchema, SelectOption};
use crate::source::DataSource;
use crate::summary::Summary;
use crate::view::ViewConfig;

/// A remote request that no longer borrows the controller
pub type PendingOp = Pin<Box<dyn Future<Output = Completion> + Send + 'static>>;

/// Result of a `PendingOp`, to be passed to `ListController::complete`
#[derive(Debug)]
pub enum Completion {
    Refreshed {
        collection: Result<Collection>,
        related: Vec<(Related, Result<Collection>)>,
    },
    Created(Result<Record>),
    Updated(Result<Record>),
    Deleted { id: String, result: Result<()> },
}

pub struct ListController {
    config: ViewConfig,
    schema: FieldSchema,
    engine: ListEngine,
    source: Arc<dyn DataSource>,
    sink: Arc<dyn NotificationSink>,
    loaded: bool,
}

impl ListController {
    pub fn new(
        config: ViewConfig,
        source: Arc<dyn DataSource>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let resource = config.resource();
        let engine = ListEngine::with_page_size(
            Collection::empty(resource.identity()),
            config.page_size(),
        );
        Self {
            schema: resource.schema.clone(),
            engine,
            config,
            source,
            sink,
            loaded: false,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Current schema, with select options from the last refresh
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn engine(&self) -> &ListEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ListEngine {
        &mut self.engine
    }

    /// True once a refresh has completed successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn item_type(&self) -> &str {
        &self.config.resource().item_type
    }

    fn path(&self) -> String {
        self.config.resource().path.clone()
    }

    /// Rendered cells of the visible page
    pub fn visible_rows(&self) -> Vec<Vec<String>> {
        self.engine
            .visible_slice()
            .map(|r| self.config.row(r, &self.schema))
            .collect()
    }

    /// Summary cards over the whole collection
    pub fn summaries(&self) -> Vec<Summary> {
        self.config
            .resource()
            .cards
            .iter()
            .map(|card| card.compute(self.engine.collection(), &self.schema))
            .collect()
    }

    /// Edit form for the record with this identity
    pub fn edit_draft(&self, id: &str) -> Result<EditDraft> {
        let record = self
            .engine
            .collection()
            .find(id)
            .ok_or_else(|| DashError::not_found(self.engine.identity_field(), id))?;
        Ok(EditDraft::from_record(&self.schema, record, self.item_type()))
    }

    /// Delete confirmation for the record with this identity
    pub fn delete_confirmation(&self, id: &str) -> Result<DeleteConfirmation> {
        let record = self
            .engine
            .collection()
            .find(id)
            .ok_or_else(|| DashError::not_found(self.engine.identity_field(), id))?;
        Ok(DeleteConfirmation::for_record(
            record,
            self.engine.identity_field(),
            self.item_type(),
        ))
    }

    /// Fetch the collection and every related option source
    pub fn begin_refresh(&self) -> PendingOp {
        let source = Arc::clone(&self.source);
        let path = self.path();
        let identity = self.engine.identity_field().to_string();
        let related = self.config.resource().related.clone();

        Box::pin(async move {
            debug!(%path, "refreshing");
            let collection = source.fetch_all(&path, &identity).await;
            let mut loaded = Vec::with_capacity(related.len());
            for rel in related {
                let result = source.fetch_all(&rel.path, &rel.value_field).await;
                loaded.push((rel, result));
            }
            Completion::Refreshed {
                collection,
                related: loaded,
            }
        })
    }

    /// Validate a new record and start creating it
    pub fn begin_create(&self, record: Record) -> Result<PendingOp> {
        if let Err(e) = self.schema.validate_new(&record) {
            self.sink
                .notify(Notice::error(Operation::Validate, self.item_type(), &e));
            return Err(e);
        }

        let source = Arc::clone(&self.source);
        let path = self.path();
        let identity = self.engine.identity_field().to_string();
        Ok(Box::pin(async move {
            let result = source.create(&path, &record).await;
            let result = result.map(|created| {
                // some endpoints answer with a bare acknowledgement
                if created.identity_key(&identity).is_some() {
                    created
                } else {
                    record
                }
            });
            Completion::Created(result)
        }))
    }

    /// Validate an edit form and start saving it
    pub fn begin_save(&self, draft: &EditDraft) -> Result<PendingOp> {
        let identity = self.engine.identity_field().to_string();
        let prepared = draft.finish().and_then(|record| {
            let id = record
                .identity_key(&identity)
                .ok_or_else(|| DashError::missing_identity(&identity))?;
            Ok((id, record))
        });
        let (id, record) = match prepared {
            Ok(ok) => ok,
            Err(e) => {
                self.sink
                    .notify(Notice::error(Operation::Validate, self.item_type(), &e));
                return Err(e);
            }
        };

        let source = Arc::clone(&self.source);
        let path = self.path();
        Ok(Box::pin(async move {
            let result = source.update(&path, &id, &record).await;
            let result = result.map(|saved| {
                if saved.identity_key(&identity).as_deref() == Some(id.as_str()) {
                    saved
                } else {
                    record
                }
            });
            Completion::Updated(result)
        }))
    }

    /// Check the typed identity and start deleting the record
    pub fn begin_delete(&self, confirmation: &DeleteConfirmation, typed: &str) -> Result<PendingOp> {
        let id = match confirmation.confirm(typed) {
            Ok(id) => id,
            Err(e) => {
                self.sink
                    .notify(Notice::error(Operation::Confirm, self.item_type(), &e));
                return Err(e);
            }
        };

        let source = Arc::clone(&self.source);
        let path = self.path();
        Ok(Box::pin(async move {
            let result = source.delete(&path, &id).await;
            Completion::Deleted { id, result }
        }))
    }

    /// Apply a finished request to the local snapshot and report it
    pub fn complete(&mut self, completion: Completion) -> Result<()> {
        let item_type = self.item_type().to_string();
        match completion {
            Completion::Refreshed {
                collection,
                related,
            } => {
                for (rel, result) in related {
                    self.apply_options(&rel, result);
                }
                match collection {
                    Ok(collection) => {
                        info!(resource = %self.path(), records = collection.len(), "refreshed");
                        self.engine.replace(collection);
                        self.loaded = true;
                        Ok(())
                    }
                    Err(e) => self.fail(Operation::Load, &item_type, e),
                }
            }
            Completion::Created(Ok(record)) => {
                info!(resource = %self.path(), "created");
                if let Err(e) = self.engine.apply_insert(record) {
                    // shows up with the next refresh
                    warn!(error = %e, "created record not added to the snapshot");
                }
                self.sink.notify(Notice::success(Operation::Create, &item_type));
                Ok(())
            }
            Completion::Created(Err(e)) => self.fail(Operation::Create, &item_type, e),
            Completion::Updated(Ok(record)) => match self.engine.apply_update(record) {
                Ok(_) => {
                    info!(resource = %self.path(), "updated");
                    self.sink.notify(Notice::success(Operation::Update, &item_type));
                    Ok(())
                }
                Err(e) => self.fail(Operation::Update, &item_type, e),
            },
            Completion::Updated(Err(e)) => self.fail(Operation::Update, &item_type, e),
            Completion::Deleted { id, result: Ok(()) } => {
                info!(resource = %self.path(), %id, "deleted");
                self.engine.apply_delete(&id);
                self.sink.notify(Notice::success(Operation::Delete, &item_type));
                Ok(())
            }
            Completion::Deleted { result: Err(e), .. } => {
                self.fail(Operation::Delete, &item_type, e)
            }
        }
    }

    fn fail(&self, operation: Operation, item_type: &str, error: DashError) -> Result<()> {
        warn!(%operation, error = %error, "operation failed");
        self.sink.notify(Notice::error(operation, item_type, &error));
        Err(error)
    }

    fn apply_options(&mut self, rel: &Related, result: Result<Collection>) {
        let collection = match result {
            Ok(c) => c,
            Err(e) => {
                self.sink
                    .notify(Notice::error(Operation::Load, &rel.item_type, &e));
                return;
            }
        };
        let options = SelectOption::from_collection(&collection, &rel.value_field, |r| {
            r.value(&rel.label_field).to_string()
        });
        match self.schema.with_options(&rel.field, options) {
            Ok(schema) => self.schema = schema,
            Err(e) => warn!(error = %e, field = %rel.field, "options not applied"),
        }
    }

    /// Fetch and replace the collection
    pub async fn refresh(&mut self) -> Result<()> {
        let completion = self.begin_refresh().await;
        self.complete(completion)
    }

    pub async fn create(&mut self, record: Record) -> Result<()> {
        let completion = self.begin_create(record)?.await;
        self.complete(completion)
    }

    pub async fn save_edit(&mut self, draft: &EditDraft) -> Result<()> {
        let completion = self.begin_save(draft)?.await;
        self.complete(completion)
    }

    pub async fn delete(&mut self, confirmation: &DeleteConfirmation, typed: &str) -> Result<()> {
        let completion = self.begin_delete(confirmation, typed)?.await;
        self.complete(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;
    use crate::resources;
    use crate::source::MemorySource;

    fn programs() -> Vec<Record> {
        vec![
            Record::new().with("programa_id", 1i64).with("nombre_programa", "Sistemas"),
            Record::new().with("programa_id", 2i64).with("nombre_programa", "Derecho"),
        ]
    }

    fn moodle() -> Vec<Record> {
        (1..=3)
            .map(|i| {
                Record::new()
                    .with("cedula_estudiantes_moodle", format!("10{}", i))
                    .with("programa_id", if i == 3 { 2i64 } else { 1i64 })
            })
            .collect()
    }

    fn setup() -> (ListController, Arc<MemorySource>, MemorySink) {
        let source = Arc::new(
            MemorySource::new()
                .with_resource("programas", "programa_id", programs())
                .with_resource("estudiantes-moodle", "cedula_estudiantes_moodle", moodle()),
        );
        let sink = MemorySink::new();
        let config = ViewConfig::builder(resources::moodle_students().unwrap())
            .build()
            .unwrap();
        let controller = ListController::new(config, source.clone(), Arc::new(sink.clone()));
        (controller, source, sink)
    }

    #[tokio::test]
    async fn refresh_loads_records_and_options() {
        let (mut controller, _, sink) = setup();
        assert!(!controller.is_loaded());
        controller.refresh().await.unwrap();

        assert!(controller.is_loaded());
        assert_eq!(controller.engine().collection().len(), 3);
        assert_eq!(
            controller.visible_rows()[2],
            vec!["103".to_string(), "Derecho".to_string()]
        );
        assert!(sink.drain().is_empty());

        let summaries = controller.summaries();
        assert_eq!(summaries[0].value.to_string(), "3");
        assert_eq!(summaries[1].value.to_string(), "50.00%");
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let (mut controller, source, sink) = setup();
        controller.refresh().await.unwrap();

        let dialog = controller.delete_confirmation("102").unwrap();
        let err = controller.delete(&dialog, "101").await.unwrap_err();
        assert!(matches!(err, DashError::IdentityMismatch { .. }));
        assert_eq!(source.records("estudiantes-moodle").len(), 3);
        assert!(sink.last().unwrap().is_error());

        controller.delete(&dialog, "102").await.unwrap();
        assert_eq!(source.records("estudiantes-moodle").len(), 2);
        assert_eq!(controller.engine().collection().len(), 2);
        assert!(!sink.last().unwrap().is_error());
    }

    #[tokio::test]
    async fn save_edit_patches_snapshot() {
        let (mut controller, source, _) = setup();
        controller.refresh().await.unwrap();

        let mut draft = controller.edit_draft("101").unwrap();
        draft.set("programa_id", "2").unwrap();
        controller.save_edit(&draft).await.unwrap();

        let row = controller.engine().collection().find("101").unwrap();
        assert_eq!(controller.schema().display(row, "programa_id"), "Derecho");
        assert_eq!(source.records("estudiantes-moodle")[0].value("programa_id").key(), "2");
    }

    #[tokio::test]
    async fn failed_request_leaves_state_unchanged() {
        let (mut controller, source, sink) = setup();
        controller.refresh().await.unwrap();

        source.fail_next(DashError::transport("connection reset"));
        let dialog = controller.delete_confirmation("101").unwrap();
        let err = controller.delete(&dialog, "101").await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(controller.engine().collection().len(), 3);
        assert!(sink.last().unwrap().message.contains("connection reset"));
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_the_source() {
        let (mut controller, source, sink) = setup();
        controller.refresh().await.unwrap();

        let err = controller
            .create(Record::new().with("cedula_estudiantes_moodle", "12x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DashError::Validation(_)));
        assert_eq!(source.records("estudiantes-moodle").len(), 3);
        assert_eq!(sink.drain().len(), 1);

        controller
            .create(Record::new().with("cedula_estudiantes_moodle", "104").with("programa_id", "1"))
            .await
            .unwrap();
        assert_eq!(controller.engine().collection().len(), 4);
    }

    #[tokio::test]
    async fn refresh_wins_over_earlier_local_edits() {
        let (mut controller, source, _) = setup();
        controller.refresh().await.unwrap();

        // a refresh is in flight while a delete lands locally
        let pending = controller.begin_refresh();
        controller.engine_mut().apply_delete("101");
        assert_eq!(controller.engine().collection().len(), 2);

        let completion = pending.await;
        controller.complete(completion).unwrap();
        assert_eq!(controller.engine().collection().len(), 3);
        assert_eq!(source.records("estudiantes-moodle").len(), 3);
    }

    #[tokio::test]
    async fn stale_update_reports_not_found() {
        let (mut controller, _, sink) = setup();
        controller.refresh().await.unwrap();

        let draft = controller.edit_draft("103").unwrap();
        controller.engine_mut().apply_delete("103");
        let completion = controller.begin_save(&draft).unwrap().await;
        let err = controller.complete(completion).unwrap_err();
        assert!(err.is_stale());
        assert!(sink.last().unwrap().is_error());
    }
}
