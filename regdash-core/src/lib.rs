pub mod config;
pub mod controller;
pub mod dialog;
pub mod engine;
pub mod error;
pub mod notify;
pub mod pagination;
pub mod record;
#[cfg(feature = "rt")]
pub mod refresh;
pub mod resources;
pub mod schema;
pub mod source;
pub mod summary;
pub mod validation;
pub mod value;
pub mod view;

pub use config::DashConfig;
pub use controller::{Completion, ListController, PendingOp};
pub use dialog::{DeleteConfirmation, EditDraft, FieldInput};
pub use engine::{ListEngine, PageSize, SortDirection, SortSpec, ViewState};
pub use error::{DashError, Result};
pub use notify::{Level, MemorySink, Notice, NotificationSink, Operation, TracingSink};
pub use pagination::{PageInfo, Paginated};
pub use record::{Collection, Record};
#[cfg(feature = "rt")]
pub use refresh::{RefreshTick, RefreshTimer};
pub use resources::{Related, Resource};
pub use schema::{FieldKind, FieldSchema, FieldSpec, SelectOption};
pub use source::{DataSource, MemorySource};
pub use summary::{CardSpec, Summary, SummaryKind, SummaryValue};
pub use validation::{FieldErrors, Rule, ValidationError};
pub use value::Value;
pub use view::{CellRenderer, ViewConfig};
