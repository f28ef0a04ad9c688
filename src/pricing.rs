//! Pricing
//!
//! The single place effective prices are computed. A catalog promotion discounts each unit of a
//! line; a voucher then discounts the resulting subtotal. Shipping is added after the voucher and
//! is never discounted.

use jiff::Timestamp;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    discounts::{Discount, DiscountError},
    ids::{DiscountId, VoucherId},
    products::Product,
    vouchers::{Voucher, VoucherError},
};

/// Errors that can occur while pricing a cart or order.
#[derive(Debug, Error)]
pub enum PricingError {
    /// No amounts were provided, so currency could not be determined.
    #[error("no amounts provided; cannot determine currency")]
    NoItems,

    /// A line total did not fit in minor units.
    #[error("line total overflowed")]
    Overflow,

    /// Shipping cost must not be negative.
    #[error("shipping cost {0} is negative")]
    NegativeShipping(i64),

    /// The applied voucher cannot be used for this order.
    #[error(transparent)]
    Voucher(#[from] VoucherError),

    /// Discount calculation failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// What happened to a line's catalog promotion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// The promotion reduced the price.
    Applied(DiscountId),

    /// There was no promotion.
    Absent,

    /// The promotion had expired and was ignored.
    Expired(DiscountId),

    /// The promotion is scoped to a different product and was ignored.
    NotApplicable(DiscountId),
}

/// Effective unit price of a line.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinePrice<'a> {
    /// Price before promotions
    pub base_price: Money<'a, Currency>,

    /// Price after the catalog promotion, rounded to a whole minor unit
    pub unit_price: Money<'a, Currency>,

    /// How the promotion was treated
    pub promotion: PromotionOutcome,
}

impl<'a> LinePrice<'a> {
    /// Total for `quantity` units. Rounding happens per unit, before multiplying.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
    pub fn line_total(&self, quantity: u32) -> Result<Money<'a, Currency>, PricingError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(quantity))
            .ok_or(PricingError::Overflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }
}

/// Resolve the effective unit price of `base_price` under an optional catalog promotion.
///
/// An absent or expired promotion leaves the price unchanged; the outcome records which.
///
/// # Errors
///
/// Returns [`PricingError::Discount`] if the promotion cannot be applied to the price (for example
/// a fixed amount in another currency).
pub fn resolve_line_price<'a>(
    base_price: Money<'a, Currency>,
    discount: Option<&Discount<'a>>,
    now: Timestamp,
) -> Result<LinePrice<'a>, PricingError> {
    let Some(discount) = discount else {
        return Ok(LinePrice {
            base_price,
            unit_price: base_price,
            promotion: PromotionOutcome::Absent,
        });
    };

    if discount.is_expired(now) {
        debug!(discount_id = %discount.discount_id, "ignoring expired promotion");

        return Ok(LinePrice {
            base_price,
            unit_price: base_price,
            promotion: PromotionOutcome::Expired(discount.discount_id),
        });
    }

    let unit_price = discount.apply_to(base_price)?;

    Ok(LinePrice {
        base_price,
        unit_price,
        promotion: PromotionOutcome::Applied(discount.discount_id),
    })
}

/// Resolve a product's unit price under its governing promotion.
///
/// # Errors
///
/// See [`resolve_line_price`].
pub fn resolve_product_price<'a>(
    product: &Product<'a>,
    now: Timestamp,
) -> Result<LinePrice<'a>, PricingError> {
    match product.active_discount() {
        Some(discount) if !discount.applies_to(product.product_id) => Ok(LinePrice {
            base_price: product.price,
            unit_price: product.price,
            promotion: PromotionOutcome::NotApplicable(discount.discount_id),
        }),
        discount => resolve_line_price(product.price, discount, now),
    }
}

/// What happened to the order's voucher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoucherOutcome {
    /// The voucher reduced the subtotal.
    Applied(VoucherId),

    /// No voucher was applied.
    Absent,

    /// The voucher had expired and was ignored.
    Expired(VoucherId),
}

/// Breakdown of an order total.
///
/// `total == subtotal + shipping - voucher_discount` always holds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrderTotal<'a> {
    /// Sum of line totals after catalog promotions
    pub subtotal: Money<'a, Currency>,

    /// Shipping cost from the selected quote
    pub shipping: Money<'a, Currency>,

    /// Amount taken off the subtotal by the voucher
    pub voucher_discount: Money<'a, Currency>,

    /// Amount payable
    pub total: Money<'a, Currency>,

    /// How the voucher was treated
    pub voucher: VoucherOutcome,
}

/// Resolve the amount payable for an order.
///
/// The voucher discount is computed on `subtotal` alone, never on shipping.
///
/// # Errors
///
/// - [`PricingError::NegativeShipping`]: `shipping_cost` is below zero.
/// - [`PricingError::Voucher`]: the voucher was redeemed already or the subtotal is below its
///   minimum order. An expired voucher is not an error; it is ignored and reported in the outcome.
/// - [`PricingError::Money`]: amounts are in different currencies.
pub fn resolve_order_total<'a>(
    subtotal: Money<'a, Currency>,
    shipping_cost: Money<'a, Currency>,
    voucher: Option<&Voucher<'a>>,
    now: Timestamp,
) -> Result<OrderTotal<'a>, PricingError> {
    let shipping_minor = shipping_cost.to_minor_units();

    if shipping_minor < 0 {
        return Err(PricingError::NegativeShipping(shipping_minor));
    }

    let zero = Money::from_minor(0, subtotal.currency());

    let (voucher_discount, outcome) = match voucher {
        None => (zero, VoucherOutcome::Absent),
        Some(voucher) => match voucher.check_eligibility(subtotal, now) {
            Ok(()) => (
                voucher.discount_on(subtotal)?,
                VoucherOutcome::Applied(voucher.voucher_id),
            ),
            Err(VoucherError::Expired(voucher_id)) => {
                debug!(%voucher_id, "ignoring expired voucher");
                (zero, VoucherOutcome::Expired(voucher_id))
            }
            Err(error) => return Err(error.into()),
        },
    };

    let total = subtotal.add(shipping_cost)?.sub(voucher_discount)?;

    debug!(
        subtotal = subtotal.to_minor_units(),
        shipping = shipping_minor,
        voucher_discount = voucher_discount.to_minor_units(),
        total = total.to_minor_units(),
        "resolved order total"
    );

    Ok(OrderTotal {
        subtotal,
        shipping: shipping_cost,
        voucher_discount,
        total,
        voucher: outcome,
    })
}

/// Sum a list of amounts.
///
/// # Errors
///
/// - [`PricingError::NoItems`]: no amounts were provided, so currency could not be determined.
/// - [`PricingError::Money`]: amounts are in different currencies.
pub fn total_price<'a>(
    amounts: &[Money<'a, Currency>],
) -> Result<Money<'a, Currency>, PricingError> {
    let first = amounts.first().ok_or(PricingError::NoItems)?;

    let total = amounts
        .iter()
        .try_fold(Money::from_minor(0, first.currency()), |acc, amount| {
            acc.add(*amount)
        })?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{IDR, USD};
    use testresult::TestResult;

    use super::*;
    use crate::{
        discounts::DiscountScope,
        ids::{ProductId, StoreId},
        products::StoreRef,
    };

    fn now() -> Result<Timestamp, jiff::Error> {
        "2025-06-01T12:00:00Z".parse()
    }

    fn later() -> Result<Timestamp, jiff::Error> {
        "2026-01-01T00:00:00Z".parse()
    }

    fn idr(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, IDR)
    }

    #[test]
    fn absent_discount_keeps_base_price() -> TestResult {
        let line = resolve_line_price(idr(100_000), None, now()?)?;

        assert_eq!(line.unit_price, idr(100_000));
        assert_eq!(line.promotion, PromotionOutcome::Absent);

        Ok(())
    }

    #[test]
    fn expired_discount_is_distinguishable_from_absent() -> TestResult {
        let discount = Discount::percentage(DiscountId::new(5), 20.0, now()?)?;

        let line = resolve_line_price(idr(100_000), Some(&discount), now()?)?;

        assert_eq!(line.unit_price, idr(100_000));
        assert_eq!(line.promotion, PromotionOutcome::Expired(DiscountId::new(5)));

        Ok(())
    }

    #[test]
    fn live_percentage_discount_applies() -> TestResult {
        let discount = Discount::percentage(DiscountId::new(5), 20.0, later()?)?;

        let line = resolve_line_price(idr(100_000), Some(&discount), now()?)?;

        assert_eq!(line.unit_price, idr(80_000));
        assert_eq!(line.promotion, PromotionOutcome::Applied(DiscountId::new(5)));

        Ok(())
    }

    #[test]
    fn line_total_rounds_per_unit() -> TestResult {
        let discount = Discount::percentage(DiscountId::new(5), 50.0, later()?)?;

        // 50.5 off rounds up, so each unit costs 50. Rounding the 303 line total would give 152.
        let line = resolve_line_price(idr(101), Some(&discount), now()?)?;

        assert_eq!(line.line_total(3)?, idr(150));

        Ok(())
    }

    #[test]
    fn line_total_overflow_errors() {
        let line = LinePrice {
            base_price: idr(i64::MAX),
            unit_price: idr(i64::MAX),
            promotion: PromotionOutcome::Absent,
        };

        assert!(matches!(line.line_total(2), Err(PricingError::Overflow)));
    }

    #[test]
    fn product_scoped_discount_on_other_product_is_not_applicable() -> TestResult {
        let store = StoreRef {
            store_id: StoreId::new(1),
            store_name: "Toko".to_string(),
        };
        let discount = Discount::percentage(DiscountId::new(5), 20.0, later()?)?
            .with_scope(DiscountScope::Product(ProductId::new(99)));
        let product =
            Product::new(ProductId::new(1), "Beras", idr(60_000), store).with_discount(discount);

        let line = resolve_product_price(&product, now()?)?;

        assert_eq!(line.unit_price, idr(60_000));
        assert_eq!(line.promotion, PromotionOutcome::NotApplicable(DiscountId::new(5)));

        Ok(())
    }

    fn voucher(minimum: i64, percent: f64) -> TestResult<Voucher<'static>> {
        let discount = Discount::percentage(DiscountId::new(9), percent, later()?)?
            .with_minimum_order(idr(minimum));

        Ok(Voucher::new(VoucherId::new(3), "HEMAT", discount, later()?))
    }

    #[test]
    fn order_total_without_voucher() -> TestResult {
        let total = resolve_order_total(idr(90_000), idr(10_000), None, now()?)?;

        assert_eq!(total.total, idr(100_000));
        assert_eq!(total.voucher_discount, idr(0));
        assert_eq!(total.voucher, VoucherOutcome::Absent);

        Ok(())
    }

    #[test]
    fn voucher_discounts_subtotal_not_shipping() -> TestResult {
        let voucher = voucher(0, 10.0)?;

        let total = resolve_order_total(idr(90_000), idr(10_000), Some(&voucher), now()?)?;

        assert_eq!(total.voucher_discount, idr(9_000));
        assert_eq!(total.total, idr(91_000));
        assert_eq!(total.voucher, VoucherOutcome::Applied(VoucherId::new(3)));

        Ok(())
    }

    #[test]
    fn voucher_below_minimum_is_rejected() -> TestResult {
        let voucher = voucher(50_000, 10.0)?;

        let result = resolve_order_total(idr(40_000), idr(10_000), Some(&voucher), now()?);

        assert!(matches!(
            result,
            Err(PricingError::Voucher(VoucherError::Ineligible {
                minimum: 50_000,
                subtotal: 40_000,
                ..
            }))
        ));

        Ok(())
    }

    #[test]
    fn expired_voucher_is_ignored() -> TestResult {
        let voucher = voucher(0, 10.0)?;

        let total = resolve_order_total(idr(40_000), idr(10_000), Some(&voucher), later()?)?;

        assert_eq!(total.total, idr(50_000));
        assert_eq!(total.voucher, VoucherOutcome::Expired(VoucherId::new(3)));

        Ok(())
    }

    #[test]
    fn negative_shipping_is_rejected() -> TestResult {
        let result = resolve_order_total(idr(40_000), idr(-1), None, now()?);

        assert!(matches!(result, Err(PricingError::NegativeShipping(-1))));

        Ok(())
    }

    #[test]
    fn total_price_sums_amounts() -> TestResult {
        assert_eq!(total_price(&[idr(100), idr(200)])?, idr(300));

        Ok(())
    }

    #[test]
    fn total_price_empty() {
        assert!(matches!(total_price(&[]), Err(PricingError::NoItems)));
    }

    #[test]
    fn total_price_currency_mismatch() {
        let amounts = [idr(100), Money::from_minor(100, USD)];

        assert!(matches!(total_price(&amounts), Err(PricingError::Money(_))));
    }
}
