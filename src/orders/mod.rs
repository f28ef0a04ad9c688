//! Orders
//!
//! An order is created from a single-store cart. Its items are snapshots, so later catalog
//! changes never rewrite history. Status changes go through [`lifecycle`] and are recorded on the
//! order; their side effects (stock release, refunds, notifications) belong to the caller.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cart::{Cart, CartError, PricedLine},
    ids::{CustomerId, OrderId, ProductId},
    pricing::{OrderTotal, PricingError, resolve_order_total, total_price},
    products::StoreRef,
    vouchers::Voucher,
};

pub mod lifecycle;

pub use lifecycle::{LifecycleError, OrderAction, OrderStatus};

/// Errors raised while building or progressing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The status change or action is not allowed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The cart cannot be turned into an order.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Pricing the order failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Selected shipping quote. Quotes are computed by the carrier integration, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipping<'a> {
    /// Carrier name
    pub carrier: String,

    /// Quoted cost
    pub cost: Money<'a, Currency>,

    /// Destination address
    pub destination: String,
}

impl Shipping<'_> {
    /// A method counts as selected once a carrier is named and a positive cost is quoted.
    pub fn is_selected(&self) -> bool {
        !self.carrier.trim().is_empty() && self.cost.to_minor_units() > 0
    }
}

/// Order line frozen at order time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem<'a> {
    /// Product id
    pub product_id: ProductId,

    /// Product name at order time
    pub name: String,

    /// Unit price paid, after the catalog promotion
    pub unit_price: Money<'a, Currency>,

    /// Number of units
    pub quantity: u32,
}

impl<'a> OrderItem<'a> {
    /// Freeze a priced cart line.
    pub fn snapshot(line: &PricedLine<'a>) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            unit_price: line.price.unit_price,
            quantity: line.quantity,
        }
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, PricingError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(PricingError::Overflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }
}

/// Recorded status change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Action that caused the change
    pub action: OrderAction,

    /// Status before
    pub from: OrderStatus,

    /// Status after
    pub to: OrderStatus,

    /// When the change was accepted
    pub at: Timestamp,
}

/// Order
#[derive(Debug, Clone)]
pub struct Order<'a> {
    order_id: OrderId,
    customer: CustomerId,
    store: StoreRef,
    items: Vec<OrderItem<'a>>,
    status: OrderStatus,
    shipping: Option<Shipping<'a>>,
    total_price: Money<'a, Currency>,
    order_date: Timestamp,
    history: Vec<StatusChange>,
}

impl<'a> Order<'a> {
    /// Create a pending order from items.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Cart`] if there are no items, or [`OrderError::Pricing`] if the
    /// item totals cannot be summed.
    pub fn new(
        order_id: OrderId,
        customer: CustomerId,
        store: StoreRef,
        items: Vec<OrderItem<'a>>,
        order_date: Timestamp,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(CartError::Empty.into());
        }

        let totals = items
            .iter()
            .map(OrderItem::line_total)
            .collect::<Result<Vec<_>, _>>()?;

        let total_price = total_price(&totals)?;

        Ok(Self {
            order_id,
            customer,
            store,
            items,
            status: OrderStatus::Pending,
            shipping: None,
            total_price,
            order_date,
            history: Vec::new(),
        })
    }

    /// Check out a cart, freezing its lines at `now`.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Cart`]: the cart is empty or spans several stores.
    /// - [`OrderError::Pricing`]: a line cannot be priced.
    pub fn from_cart(order_id: OrderId, cart: &Cart<'a>, now: Timestamp) -> Result<Self, OrderError> {
        let store = cart.store()?.clone();

        let items = cart
            .price_lines(now)?
            .iter()
            .map(OrderItem::snapshot)
            .collect();

        Self::new(order_id, cart.customer(), store, items, now)
    }

    /// Restore the status of an order fetched from the data API.
    #[must_use]
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Order id
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Owning customer
    pub fn customer(&self) -> CustomerId {
        self.customer
    }

    /// Owning store
    pub fn store(&self) -> &StoreRef {
        &self.store
    }

    /// Frozen order lines
    pub fn items(&self) -> &[OrderItem<'a>] {
        &self.items
    }

    /// Current status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Selected shipping, if any
    pub fn shipping(&self) -> Option<&Shipping<'a>> {
        self.shipping.as_ref()
    }

    /// Sum of the order lines, before shipping and vouchers
    pub fn total_price(&self) -> Money<'a, Currency> {
        self.total_price
    }

    /// When the order was placed
    pub fn order_date(&self) -> Timestamp {
        self.order_date
    }

    /// Accepted status changes, oldest first
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// Select or replace the shipping method.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ShippingLocked`] once the order is past `awaiting_payment`.
    pub fn select_shipping(&mut self, shipping: Shipping<'a>) -> Result<(), LifecycleError> {
        match self.status {
            OrderStatus::Pending | OrderStatus::AwaitingPayment => {
                self.shipping = Some(shipping);
                Ok(())
            }
            status => Err(LifecycleError::ShippingLocked(status)),
        }
    }

    /// Check the customer may proceed to payment. This never changes the status.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::PaymentUnavailable`]: the order is not awaiting payment.
    /// - [`LifecycleError::ShippingNotSelected`]: no carrier or no shipping cost.
    pub fn proceed_to_payment(&self) -> Result<(), LifecycleError> {
        if self.status != OrderStatus::AwaitingPayment {
            return Err(LifecycleError::PaymentUnavailable(self.status));
        }

        if !self.shipping.as_ref().is_some_and(Shipping::is_selected) {
            return Err(LifecycleError::ShippingNotSelected);
        }

        Ok(())
    }

    /// Apply an action, recording the resulting status change.
    ///
    /// A rejected action leaves the order untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if the action is not legal in the current
    /// status.
    pub fn apply(&mut self, action: OrderAction, at: Timestamp) -> Result<OrderStatus, LifecycleError> {
        let from = self.status;

        let to = from.transition_to(action.target()).inspect_err(|error| {
            warn!(order_id = %self.order_id, ?action, %error, "rejected order action");
        })?;

        self.status = to;
        self.history.push(StatusChange {
            action,
            from,
            to,
            at,
        });

        info!(order_id = %self.order_id, %from, %to, "order status changed");

        Ok(to)
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] unless the order is pending or awaiting
    /// payment.
    pub fn cancel(&mut self, at: Timestamp) -> Result<OrderStatus, LifecycleError> {
        self.apply(OrderAction::Cancel, at)
    }

    /// Resolve the amount payable with the selected shipping and an optional voucher.
    ///
    /// Without a shipping selection, shipping counts as zero.
    ///
    /// # Errors
    ///
    /// See [`resolve_order_total`].
    pub fn payable(
        &self,
        voucher: Option<&Voucher<'a>>,
        now: Timestamp,
    ) -> Result<OrderTotal<'a>, PricingError> {
        let shipping = self.shipping.as_ref().map_or_else(
            || Money::from_minor(0, self.total_price.currency()),
            |shipping| shipping.cost,
        );

        resolve_order_total(self.total_price, shipping, voucher, now)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use super::*;
    use crate::{
        cart::CartItem,
        ids::StoreId,
        products::Product,
    };

    fn now() -> Result<Timestamp, jiff::Error> {
        "2025-06-01T12:00:00Z".parse()
    }

    fn store(id: u64) -> StoreRef {
        StoreRef {
            store_id: StoreId::new(id),
            store_name: format!("Toko {id}"),
        }
    }

    fn order() -> TestResult<Order<'static>> {
        let items = vec![OrderItem {
            product_id: ProductId::new(1),
            name: "Kopi".to_string(),
            unit_price: Money::from_minor(25_000, IDR),
            quantity: 2,
        }];

        Ok(Order::new(OrderId::new(1), CustomerId::new(1), store(1), items, now()?)?)
    }

    fn shipping(carrier: &str, cost: i64) -> Shipping<'static> {
        Shipping {
            carrier: carrier.to_string(),
            cost: Money::from_minor(cost, IDR),
            destination: "Jl. Merdeka 1".to_string(),
        }
    }

    #[test]
    fn new_order_is_pending_with_item_total() -> TestResult {
        let order = order()?;

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_price(), Money::from_minor(50_000, IDR));

        Ok(())
    }

    #[test]
    fn full_lifecycle_is_recorded() -> TestResult {
        let mut order = order()?;

        for action in [
            OrderAction::RequestPayment,
            OrderAction::Pay,
            OrderAction::Ship,
            OrderAction::Complete,
        ] {
            order.apply(action, now()?)?;
        }

        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.history().len(), 4);
        assert_eq!(
            order.history().first().map(|change| (change.from, change.to)),
            Some((OrderStatus::Pending, OrderStatus::AwaitingPayment))
        );

        Ok(())
    }

    #[test]
    fn rejected_action_leaves_order_untouched() -> TestResult {
        let mut order = order()?.with_status(OrderStatus::Shipped);

        let result = order.cancel(now()?);

        assert_eq!(
            result,
            Err(LifecycleError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            })
        );
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert!(order.history().is_empty());

        Ok(())
    }

    #[test]
    fn proceed_to_payment_requires_shipping() -> TestResult {
        let mut order = order()?.with_status(OrderStatus::AwaitingPayment);

        assert_eq!(order.proceed_to_payment(), Err(LifecycleError::ShippingNotSelected));

        order.select_shipping(shipping("JNE", 0))?;
        assert_eq!(order.proceed_to_payment(), Err(LifecycleError::ShippingNotSelected));

        order.select_shipping(shipping(" ", 9_000))?;
        assert_eq!(order.proceed_to_payment(), Err(LifecycleError::ShippingNotSelected));

        order.select_shipping(shipping("JNE", 9_000))?;
        order.proceed_to_payment()?;

        assert_eq!(order.status(), OrderStatus::AwaitingPayment);

        Ok(())
    }

    #[test]
    fn proceed_to_payment_only_while_awaiting_payment() -> TestResult {
        let mut order = order()?;
        order.select_shipping(shipping("JNE", 9_000))?;

        assert_eq!(
            order.proceed_to_payment(),
            Err(LifecycleError::PaymentUnavailable(OrderStatus::Pending))
        );

        Ok(())
    }

    #[test]
    fn shipping_is_locked_after_payment() -> TestResult {
        let mut order = order()?.with_status(OrderStatus::Processing);

        assert_eq!(
            order.select_shipping(shipping("JNE", 9_000)),
            Err(LifecycleError::ShippingLocked(OrderStatus::Processing))
        );

        Ok(())
    }

    #[test]
    fn payable_adds_selected_shipping() -> TestResult {
        let mut order = order()?.with_status(OrderStatus::AwaitingPayment);
        order.select_shipping(shipping("SiCepat", 12_000))?;

        let payable = order.payable(None, now()?)?;

        assert_eq!(payable.total, Money::from_minor(62_000, IDR));

        Ok(())
    }

    #[test]
    fn from_cart_rejects_cross_store_cart() -> TestResult {
        let one = NonZeroU32::MIN;
        let cart = Cart::with_items(
            CustomerId::new(1),
            [
                CartItem::new(
                    Product::new(ProductId::new(1), "A", Money::from_minor(100, IDR), store(1)),
                    one,
                ),
                CartItem::new(
                    Product::new(ProductId::new(2), "B", Money::from_minor(100, IDR), store(2)),
                    one,
                ),
            ],
            IDR,
        )?;

        let result = Order::from_cart(OrderId::new(1), &cart, now()?);

        assert!(matches!(
            result,
            Err(OrderError::Cart(CartError::MixedStores { .. }))
        ));

        Ok(())
    }

    #[test]
    fn from_cart_snapshots_lines() -> TestResult {
        let cart = Cart::with_items(
            CustomerId::new(7),
            [CartItem::new(
                Product::new(ProductId::new(1), "Kopi", Money::from_minor(30_000, IDR), store(3)),
                NonZeroU32::MIN.saturating_add(2),
            )],
            IDR,
        )?;

        let order = Order::from_cart(OrderId::new(5), &cart, now()?)?;

        assert_eq!(order.customer(), CustomerId::new(7));
        assert_eq!(order.store().store_id, StoreId::new(3));
        assert_eq!(order.items().first().map(|item| item.quantity), Some(3));
        assert_eq!(order.total_price(), Money::from_minor(90_000, IDR));

        Ok(())
    }
}
