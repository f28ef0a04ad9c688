//! Bazaar prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    audit::{
        AuditAction, AuditError, AuditLogEntry, AuditPayload, AuditSink, InventoryAuditor,
        Observation,
    },
    cart::{Cart, CartError, CartItem, PricedLine},
    config::{ConfigError, Settings},
    discounts::{
        Discount, DiscountError, DiscountKind, DiscountPayload, DiscountScope, DiscountType,
    },
    geo::{
        Coordinate, DistanceRanker, GeoError, RawCoordinate, Ranked, Ranking, haversine_km,
        nearest, rank_by_distance,
    },
    ids::{
        AuditEntryId, CustomerId, DiscountId, InventoryId, OrderId, ProductId, StoreId, VoucherId,
    },
    inventory::{
        DiffError, Inventory, InventoryDiff, InventoryError, InventoryEvent, InventorySnapshot,
        SnapshotContext, StockOperation, diff,
    },
    orders::{
        Order, OrderError, OrderItem, Shipping,
        lifecycle::{LifecycleError, OrderAction, OrderStatus},
    },
    pricing::{
        LinePrice, OrderTotal, PricingError, PromotionOutcome, VoucherOutcome, resolve_line_price,
        resolve_order_total, resolve_product_price,
    },
    products::{Product, ProductError, ProductPayload, StoreRef},
    receipt::{Receipt, ReceiptError},
    vouchers::{
        Voucher, VoucherBook, VoucherError, VoucherPayload, partition_vouchers, select_voucher,
    },
};
