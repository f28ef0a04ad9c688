//! Snapshot Diff
//!
//! Reconciliation fallback for data layers that cannot push change events: compares two snapshots
//! of the same query by inventory id.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    ids::InventoryId,
    inventory::{Inventory, InventoryEvent, InventorySnapshot, SnapshotContext},
};

/// Errors raised when diffing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The snapshots were produced by different queries or pages, so a diff would report rows
    /// that merely moved out of view.
    #[error("snapshots come from different queries (page {} vs page {})", .previous.page, .current.page)]
    StaleSnapshot {
        /// Context of the earlier snapshot
        previous: SnapshotContext,

        /// Context of the later snapshot
        current: SnapshotContext,
    },
}

/// Rows that appeared or disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryDiff {
    /// Rows in the current snapshot whose id is absent from the previous one
    pub added: Vec<Inventory>,

    /// Rows in the previous snapshot whose id is absent from the current one
    pub removed: Vec<Inventory>,
}

impl InventoryDiff {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// One event per added row, then one per removed row.
    pub fn into_events(self) -> Vec<InventoryEvent> {
        self.added
            .into_iter()
            .map(InventoryEvent::Added)
            .chain(self.removed.into_iter().map(InventoryEvent::Removed))
            .collect()
    }
}

/// Diff two snapshots of the same query, keyed by inventory id.
///
/// Both lists keep the order of the snapshot they come from.
///
/// # Errors
///
/// Returns [`DiffError::StaleSnapshot`] if the snapshots come from different queries or pages.
pub fn diff(
    previous: &InventorySnapshot,
    current: &InventorySnapshot,
) -> Result<InventoryDiff, DiffError> {
    if previous.context != current.context {
        return Err(DiffError::StaleSnapshot {
            previous: previous.context.clone(),
            current: current.context.clone(),
        });
    }

    Ok(InventoryDiff {
        added: missing_from(&current.items, &previous.items),
        removed: missing_from(&previous.items, &current.items),
    })
}

/// Rows of `items` whose id does not appear in `other`.
fn missing_from(items: &[Inventory], other: &[Inventory]) -> Vec<Inventory> {
    let known: FxHashSet<InventoryId> = other.iter().map(|row| row.inv_id).collect();

    items
        .iter()
        .filter(|row| !known.contains(&row.inv_id))
        .cloned()
        .collect()
}
