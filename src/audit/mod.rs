//! Audit Log
//!
//! Append-only records of inventory changes. The description of every entry is a JSON document
//! (an [`AuditPayload`]) so a log viewer can recover the row, product, store and quantities
//! instead of parsing prose.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{AuditEntryId, InventoryId},
    inventory::{DiffError, Inventory, InventoryEvent, SnapshotContext, StockOperation},
};

pub mod auditor;

pub use auditor::{InventoryAuditor, Observation};

/// Errors raised while auditing.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The snapshots cannot be compared; nothing was recorded.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// A description could not be encoded or decoded.
    #[error("invalid audit description: {0}")]
    Description(#[from] serde_json::Error),
}

/// Kind of audited change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A row appeared
    Add,

    /// A row was removed or deleted
    Delete,

    /// Stock was added or subtracted
    Update,

    /// A listing was re-fetched
    Refresh,

    /// A fetch failed
    Error,

    /// Row details were edited
    Edit,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Inventory fields recorded in an audit description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Row id
    pub inv_id: InventoryId,

    /// Product name
    pub product_name: String,

    /// Store name
    pub store_name: String,

    /// Quantity on hand
    pub qty: u64,

    /// Running total of stock received
    pub total_qty: u64,
}

impl From<&Inventory> for InventoryRecord {
    fn from(inventory: &Inventory) -> Self {
        Self {
            inv_id: inventory.inv_id,
            product_name: inventory.product.name.clone(),
            store_name: inventory.store.store_name.clone(),
            qty: inventory.qty,
            total_qty: inventory.total_qty,
        }
    }
}

/// Structured audit description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditPayload {
    /// A row appeared
    Added {
        /// Row as it appeared
        item: InventoryRecord,
    },

    /// A row disappeared between snapshots
    Removed {
        /// Row as last seen
        item: InventoryRecord,
    },

    /// An admin deleted a row
    Deleted {
        /// Row as deleted
        item: InventoryRecord,
    },

    /// Stock was added or subtracted
    Updated {
        /// Row after the change
        item: InventoryRecord,

        /// Operation applied
        operation: StockOperation,

        /// Units moved
        delta: u64,
    },

    /// Row details were edited
    Edited {
        /// Row before
        before: InventoryRecord,

        /// Row after
        after: InventoryRecord,
    },

    /// A listing was re-fetched
    Refreshed {
        /// Query re-fetched
        context: SnapshotContext,

        /// Rows returned
        count: usize,
    },

    /// A fetch failed; no diff was computed
    Error {
        /// Failure reported by the data layer
        message: String,

        /// Query that failed, when known
        context: Option<SnapshotContext>,
    },
}

impl AuditPayload {
    /// Action recorded alongside this payload.
    pub const fn action(&self) -> AuditAction {
        match self {
            Self::Added { .. } => AuditAction::Add,
            Self::Removed { .. } | Self::Deleted { .. } => AuditAction::Delete,
            Self::Updated { .. } => AuditAction::Update,
            Self::Edited { .. } => AuditAction::Edit,
            Self::Refreshed { .. } => AuditAction::Refresh,
            Self::Error { .. } => AuditAction::Error,
        }
    }
}

impl From<InventoryEvent> for AuditPayload {
    fn from(event: InventoryEvent) -> Self {
        match event {
            InventoryEvent::Added(row) => Self::Added { item: (&row).into() },
            InventoryEvent::Removed(row) => Self::Removed { item: (&row).into() },
            InventoryEvent::Deleted(row) => Self::Deleted { item: (&row).into() },
            InventoryEvent::Updated {
                inventory,
                operation,
                delta,
            } => Self::Updated {
                item: (&inventory).into(),
                operation,
                delta,
            },
            InventoryEvent::Edited { before, after } => Self::Edited {
                before: (&before).into(),
                after: (&after).into(),
            },
            InventoryEvent::Refreshed { context, count } => Self::Refreshed { context, count },
        }
    }
}

/// Audit log entry. Entries are never changed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Entry id
    pub id: AuditEntryId,

    /// Kind of change
    pub action: AuditAction,

    /// JSON-encoded [`AuditPayload`]
    pub description: String,

    /// Admin module the change happened in
    pub module: String,

    /// When the change was observed
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    /// Decode the description.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Description`] if the description is not a valid payload.
    pub fn payload(&self) -> Result<AuditPayload, AuditError> {
        Ok(serde_json::from_str(&self.description)?)
    }
}

/// Destination for audit entries, such as a queue feeding the log service.
pub trait AuditSink {
    /// Append an entry.
    fn append(&mut self, entry: AuditLogEntry);
}

impl AuditSink for Vec<AuditLogEntry> {
    fn append(&mut self, entry: AuditLogEntry) {
        self.push(entry);
    }
}

impl<S: AuditSink + ?Sized> AuditSink for &mut S {
    fn append(&mut self, entry: AuditLogEntry) {
        (**self).append(entry);
    }
}
