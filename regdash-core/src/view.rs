//! Per-view configuration
//!
//! A list screen is one `ListEngine` plus a `ViewConfig`: the resource
//! declaration, the initial page size, which columns to show and optional
//! cell renderers overriding the schema's default display.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::PageSize;
use crate::error::{DashError, Result};
use crate::record::Record;
use crate::resources::Resource;
use crate::schema::FieldSchema;

/// Renders one cell of a record
pub type CellRenderer = Arc<dyn Fn(&Record, &FieldSchema) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ViewConfig {
    resource: Resource,
    page_size: PageSize,
    refresh_interval: Duration,
    columns: Vec<String>,
    renderers: HashMap<String, CellRenderer>,
}

impl fmt::Debug for ViewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewConfig")
            .field("resource", &self.resource.name)
            .field("page_size", &self.page_size)
            .field("refresh_interval", &self.refresh_interval)
            .field("columns", &self.columns)
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ViewConfig {
    pub fn builder(resource: Resource) -> ViewConfigBuilder {
        ViewConfigBuilder {
            resource,
            page_size: PageSize::default(),
            refresh_interval: Duration::from_secs(60),
            columns: None,
            renderers: HashMap::new(),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column headers, using the schema labels
    pub fn headers(&self, schema: &FieldSchema) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| {
                schema
                    .field(c)
                    .map(|f| f.label.clone())
                    .unwrap_or_else(|| c.clone())
            })
            .collect()
    }

    /// Text of one cell
    pub fn cell(&self, record: &Record, column: &str, schema: &FieldSchema) -> String {
        match self.renderers.get(column) {
            Some(render) => render(record, schema),
            None => schema.display(record, column),
        }
    }

    /// All cells of a row, in column order
    pub fn row(&self, record: &Record, schema: &FieldSchema) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| self.cell(record, c, schema))
            .collect()
    }
}

/// Consuming builder for `ViewConfig`
pub struct ViewConfigBuilder {
    resource: Resource,
    page_size: PageSize,
    refresh_interval: Duration,
    columns: Option<Vec<String>>,
    renderers: HashMap<String, CellRenderer>,
}

impl ViewConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Show only these columns; defaults to every schema field
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override how `column` is rendered
    pub fn render<F>(mut self, column: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Record, &FieldSchema) -> String + Send + Sync + 'static,
    {
        self.renderers.insert(column.into(), Arc::new(render));
        self
    }

    pub fn build(self) -> Result<ViewConfig> {
        let schema = &self.resource.schema;
        let columns = match self.columns {
            Some(columns) => columns,
            None => schema.names().map(str::to_string).collect(),
        };
        if let Some(unknown) = columns
            .iter()
            .chain(self.renderers.keys())
            .find(|c| !schema.contains(c))
        {
            return Err(DashError::unknown_field(unknown.as_str()));
        }
        if self.refresh_interval.is_zero() {
            return Err(DashError::config("refresh interval must be positive"));
        }

        Ok(ViewConfig {
            resource: self.resource,
            page_size: self.page_size,
            refresh_interval: self.refresh_interval,
            columns,
            renderers: self.renderers,
        })
    }
}
