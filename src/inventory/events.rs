//! Inventory Events
//!
//! Change notifications for inventory rows. A data layer that can push changes emits these
//! directly; otherwise [`crate::inventory::diff`] derives `Added`/`Removed` from two snapshots.

use crate::inventory::{Inventory, SnapshotContext, StockOperation};

/// A change to inventory that must be audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// A row appeared.
    Added(Inventory),

    /// A row disappeared between two snapshots.
    Removed(Inventory),

    /// Stock was added or subtracted. `inventory` holds the row after the change.
    Updated {
        /// Row after the change
        inventory: Inventory,

        /// Operation applied
        operation: StockOperation,

        /// Units moved
        delta: u64,
    },

    /// An admin deleted a row.
    Deleted(Inventory),

    /// An admin edited a row's details.
    Edited {
        /// Row before the edit
        before: Inventory,

        /// Row after the edit
        after: Inventory,
    },

    /// A listing was re-fetched.
    Refreshed {
        /// Query that was re-fetched
        context: SnapshotContext,

        /// Rows returned
        count: usize,
    },
}
