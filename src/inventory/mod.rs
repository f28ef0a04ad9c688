//! Inventory
//!
//! Stock rows per store and product. Quantities change only through explicit add/subtract
//! operations, each of which yields the [`InventoryEvent`] to audit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ids::InventoryId, products::StoreRef};

pub mod diff;
pub mod events;
pub mod snapshot;

pub use diff::{DiffError, InventoryDiff, diff};
pub use events::InventoryEvent;
pub use snapshot::{InventorySnapshot, SnapshotContext};

/// Errors raised by stock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// A stock operation must move at least one unit.
    #[error("stock operations need a non-zero quantity")]
    ZeroDelta,

    /// Not enough stock on hand to subtract.
    #[error("cannot subtract {requested} from inventory {inventory} holding {available}")]
    InsufficientStock {
        /// Inventory row
        inventory: InventoryId,

        /// Quantity on hand
        available: u64,

        /// Quantity requested
        requested: u64,
    },

    /// Quantity does not fit in the counter.
    #[error("quantity overflowed on inventory {0}")]
    Overflow(InventoryId),
}

/// Admin stock operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    /// Receive stock
    Add,

    /// Remove stock
    Subtract,
}

/// Product fields carried by an inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryProduct {
    /// Product name
    pub name: String,
}

/// Inventory row for one product at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Row id. Two rows for the same product at different stores have different ids.
    pub inv_id: InventoryId,

    /// Store holding the stock
    pub store: StoreRef,

    /// Product stocked
    pub product: InventoryProduct,

    /// Quantity on hand
    pub qty: u64,

    /// Running total of all stock ever received
    pub total_qty: u64,
}

impl Inventory {
    /// Apply a stock operation and return the event describing it.
    ///
    /// `Add` raises both the on-hand and the running total; `Subtract` lowers only the on-hand
    /// quantity. A failed operation leaves the row unchanged.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::ZeroDelta`]: `delta` is zero.
    /// - [`InventoryError::InsufficientStock`]: subtracting more than is on hand.
    /// - [`InventoryError::Overflow`]: the new quantity does not fit.
    pub fn apply(
        &mut self,
        operation: StockOperation,
        delta: u64,
    ) -> Result<InventoryEvent, InventoryError> {
        if delta == 0 {
            return Err(InventoryError::ZeroDelta);
        }

        match operation {
            StockOperation::Add => {
                let qty = self
                    .qty
                    .checked_add(delta)
                    .ok_or(InventoryError::Overflow(self.inv_id))?;

                let total_qty = self
                    .total_qty
                    .checked_add(delta)
                    .ok_or(InventoryError::Overflow(self.inv_id))?;

                self.qty = qty;
                self.total_qty = total_qty;
            }
            StockOperation::Subtract => {
                self.qty = self.qty.checked_sub(delta).ok_or(InventoryError::InsufficientStock {
                    inventory: self.inv_id,
                    available: self.qty,
                    requested: delta,
                })?;
            }
        }

        Ok(InventoryEvent::Updated {
            inventory: self.clone(),
            operation,
            delta,
        })
    }
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::{test_support::row, *};

    #[test]
    fn add_raises_qty_and_running_total() -> TestResult {
        let mut inventory = row(1, "Kopi", 10);

        let event = inventory.apply(StockOperation::Add, 5)?;

        assert_eq!((inventory.qty, inventory.total_qty), (15, 15));
        assert!(matches!(
            event,
            InventoryEvent::Updated { operation: StockOperation::Add, delta: 5, .. }
        ));

        Ok(())
    }

    #[test]
    fn subtract_lowers_only_on_hand() -> TestResult {
        let mut inventory = row(1, "Kopi", 10);

        inventory.apply(StockOperation::Subtract, 4)?;

        assert_eq!((inventory.qty, inventory.total_qty), (6, 10));

        Ok(())
    }

    #[test]
    fn subtract_below_zero_is_rejected() {
        let mut inventory = row(1, "Kopi", 3);

        let result = inventory.apply(StockOperation::Subtract, 4);

        assert_eq!(
            result,
            Err(InventoryError::InsufficientStock {
                inventory: InventoryId::new(1),
                available: 3,
                requested: 4,
            })
        );
        assert_eq!(inventory.qty, 3);
    }

    #[test]
    fn zero_delta_is_rejected() {
        let mut inventory = row(1, "Kopi", 3);

        assert_eq!(
            inventory.apply(StockOperation::Add, 0),
            Err(InventoryError::ZeroDelta)
        );
    }

    #[test]
    fn overflow_leaves_row_unchanged() {
        let mut inventory = row(1, "Kopi", u64::MAX);
        inventory.total_qty = 0;

        let result = inventory.apply(StockOperation::Add, 1);

        assert_eq!(result, Err(InventoryError::Overflow(InventoryId::new(1))));
        assert_eq!(inventory.qty, u64::MAX);
    }

    #[test]
    fn deserializes_data_api_shape() -> TestResult {
        let json = r#"{
            "inv_id": 12,
            "store": { "store_id": 3, "store_name": "Toko Tiga" },
            "product": { "name": "Teh" },
            "qty": 8,
            "total_qty": 20
        }"#;

        let inventory: Inventory = serde_json::from_str(json)?;

        assert_eq!(inventory.inv_id, InventoryId::new(12));
        assert_eq!(inventory.store.store_name, "Toko Tiga");
        assert_eq!(inventory.total_qty, 20);

        Ok(())
    }
}
