//! Notifications
//!
//! Fire-and-forget success and error messages keyed by operation and item type.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// The operation a notice reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
    Validate,
    Confirm,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Validate => "validate",
            Operation::Confirm => "confirm",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub operation: Operation,
    pub item_type: String,
    pub message: String,
}

impl Notice {
    pub fn success(operation: Operation, item_type: &str) -> Self {
        let verb = match operation {
            Operation::Load => "loaded",
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
            Operation::Validate => "validated",
            Operation::Confirm => "confirmed",
        };
        Self {
            level: Level::Success,
            operation,
            item_type: item_type.to_string(),
            message: format!("The {} was {} successfully", item_type, verb),
        }
    }

    pub fn error(operation: Operation, item_type: &str, detail: impl fmt::Display) -> Self {
        Self {
            level: Level::Error,
            operation,
            item_type: item_type.to_string(),
            message: format!("Could not {} the {}: {}", operation, item_type, detail),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives notices. Implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Emits notices as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => info!(
                operation = %notice.operation,
                item_type = %notice.item_type,
                "{}", notice.message
            ),
            Level::Error => error!(
                operation = %notice.operation,
                item_type = %notice.item_type,
                "{}", notice.message
            ),
        }
    }
}

/// Keeps notices in memory; used by the TUI status line and tests
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything received so far
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notice: Notice) {
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }
}
