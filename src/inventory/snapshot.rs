//! Inventory Snapshots

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;

/// Query that produced a snapshot: filter parameters plus the page number.
///
/// Two snapshots are only comparable when their contexts are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotContext {
    /// Filter and sort parameters, by name
    pub query: BTreeMap<String, String>,

    /// Page number, starting at 1
    pub page: u32,
}

impl SnapshotContext {
    /// Context for a page with no filters.
    pub fn page(page: u32) -> Self {
        Self {
            query: BTreeMap::new(),
            page,
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

/// Fully resolved, immutable inventory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Query that produced the listing
    pub context: SnapshotContext,

    /// Rows in the order the data API returned them
    pub items: Vec<Inventory>,
}

impl InventorySnapshot {
    /// Create a snapshot.
    pub fn new(context: SnapshotContext, items: Vec<Inventory>) -> Self {
        Self { context, items }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_compare_query_and_page() {
        let base = SnapshotContext::page(1).with_param("store", "3");

        assert_eq!(base, SnapshotContext::page(1).with_param("store", "3"));
        assert_ne!(base, SnapshotContext::page(2).with_param("store", "3"));
        assert_ne!(base, SnapshotContext::page(1).with_param("store", "4"));
        assert_ne!(base, SnapshotContext::page(1));
    }
}
