//! Typed Identifiers
//!
//! Every entity coming from the data API is identified by a numeric id. The ids are wrapped in a
//! marker-typed newtype so that, for example, an inventory id can never be compared with a product
//! id.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric identifier tagged with the entity it identifies.
pub struct TypedId<T>(u64, PhantomData<T>);

impl<T> TypedId<T> {
    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<u64> for TypedId<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::new)
    }
}

macro_rules! typed_ids {
    ($($(#[$meta:meta])* $alias:ident => $marker:ident;)+) => {
        $(
            #[doc(hidden)]
            #[derive(Debug)]
            pub enum $marker {}

            $(#[$meta])*
            pub type $alias = TypedId<$marker>;
        )+
    };
}

typed_ids! {
    /// Product id
    ProductId => ProductMarker;
    /// Store id
    StoreId => StoreMarker;
    /// Discount id
    DiscountId => DiscountMarker;
    /// Voucher id
    VoucherId => VoucherMarker;
    /// Customer id
    CustomerId => CustomerMarker;
    /// Order id
    OrderId => OrderMarker;
    /// Inventory row id
    InventoryId => InventoryMarker;
    /// Audit log entry id
    AuditEntryId => AuditEntryMarker;
}
