//! Discounts
//!
//! A discount is a store- or product-scoped promotional rule. Catalog promotions and vouchers share
//! the same rule type; only how the rule is reached differs.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DiscountId, ProductId};

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A percentage discount value must lie within 0-100.
    #[error("percentage discount value {0} is outside 0-100")]
    InvalidPercentage(f64),

    /// A fixed discount value must not be negative.
    #[error("fixed discount value {0} is negative")]
    NegativeAmount(i64),

    /// An amount from the data API is not a finite number of whole units.
    #[error("discount amount {0} cannot be represented in whole units")]
    InvalidAmount(f64),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// How a discount reduces a price.
#[derive(Debug, Copy, Clone)]
pub enum DiscountKind<'a> {
    /// Take a percentage off the price (e.g. "20% off").
    Percentage(Percentage),

    /// Subtract a fixed amount from the price (e.g. "15.000 off"), never below zero.
    Fixed(Money<'a, Currency>),

    /// Loyalty points awarded on purchase. Points never change the price.
    Points(u64),
}

/// What a discount may be applied to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiscountScope {
    /// Any product of the owning store.
    StoreWide,

    /// A single product.
    Product(ProductId),
}

/// Discount type as the data API spells it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage in 0-100
    Percentage,

    /// `discount_value` is an amount off
    Fixed,

    /// `discount_value` is a number of loyalty points
    Point,
}

/// Discount record as returned by the data API.
///
/// Amounts are plain numbers in the crate's minor units. Convert with
/// [`DiscountPayload::into_discount`] before pricing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountPayload {
    /// Discount id
    pub discount_id: DiscountId,

    /// How `discount_value` is read
    pub discount_type: DiscountType,

    /// Percentage, amount or points depending on `discount_type`
    pub discount_value: f64,

    /// Smallest subtotal a voucher carrying this discount applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_order: Option<f64>,

    /// Single product the discount is limited to; store-wide when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,

    /// ISO-8601 expiry
    pub expires_at: Timestamp,
}

impl DiscountPayload {
    /// Validate the record and build a [`Discount`] in `currency`.
    ///
    /// Fractional amounts are rounded to whole minor units, halves away from zero.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::InvalidPercentage`]: a percentage outside 0-100.
    /// - [`DiscountError::NegativeAmount`]: a negative amount, minimum order or point count.
    /// - [`DiscountError::InvalidAmount`]: a value that is not finite or does not fit in minor units.
    pub fn into_discount<'a>(self, currency: &'a Currency) -> Result<Discount<'a>, DiscountError> {
        let value = self.discount_value;

        let mut discount = match self.discount_type {
            DiscountType::Percentage => {
                Discount::percentage(self.discount_id, value, self.expires_at)?
            }
            DiscountType::Fixed => Discount::fixed(
                self.discount_id,
                Money::from_minor(minor_units(value)?, currency),
                self.expires_at,
            )?,
            DiscountType::Point => {
                let points = minor_units(value)?;
                let points =
                    u64::try_from(points).map_err(|_err| DiscountError::NegativeAmount(points))?;

                Discount::new(self.discount_id, DiscountKind::Points(points), self.expires_at)
            }
        };

        if let Some(minimum) = self.minimum_order {
            let minimum = minor_units(minimum)?;

            if minimum < 0 {
                return Err(DiscountError::NegativeAmount(minimum));
            }

            discount = discount.with_minimum_order(Money::from_minor(minimum, currency));
        }

        if let Some(product) = self.product_id {
            discount = discount.with_scope(DiscountScope::Product(product));
        }

        Ok(discount)
    }
}

/// Discount rule with an expiry.
#[derive(Debug, Clone)]
pub struct Discount<'a> {
    /// Discount id
    pub discount_id: DiscountId,

    /// How the price is reduced
    pub kind: DiscountKind<'a>,

    /// Smallest subtotal the discount may be applied to, when reached through a voucher
    pub minimum_order: Option<Money<'a, Currency>>,

    /// Products the discount covers
    pub scope: DiscountScope,

    /// The discount stops applying at this instant
    pub expires_at: Timestamp,
}

impl<'a> Discount<'a> {
    /// Create a store-wide discount without a minimum order.
    pub fn new(discount_id: DiscountId, kind: DiscountKind<'a>, expires_at: Timestamp) -> Self {
        Self {
            discount_id,
            kind,
            minimum_order: None,
            scope: DiscountScope::StoreWide,
            expires_at,
        }
    }

    /// Create a percentage discount from a value in the 0-100 range.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::InvalidPercentage`] if `value` is not finite or lies outside 0-100.
    pub fn percentage(
        discount_id: DiscountId,
        value: f64,
        expires_at: Timestamp,
    ) -> Result<Self, DiscountError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(DiscountError::InvalidPercentage(value));
        }

        Ok(Self::new(
            discount_id,
            DiscountKind::Percentage(Percentage::from(value / 100.0)),
            expires_at,
        ))
    }

    /// Create a fixed amount discount.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::NegativeAmount`] if `amount` is below zero.
    pub fn fixed(
        discount_id: DiscountId,
        amount: Money<'a, Currency>,
        expires_at: Timestamp,
    ) -> Result<Self, DiscountError> {
        let minor = amount.to_minor_units();

        if minor < 0 {
            return Err(DiscountError::NegativeAmount(minor));
        }

        Ok(Self::new(
            discount_id,
            DiscountKind::Fixed(amount),
            expires_at,
        ))
    }

    /// Require a minimum order subtotal.
    #[must_use]
    pub fn with_minimum_order(mut self, minimum_order: Money<'a, Currency>) -> Self {
        self.minimum_order = Some(minimum_order);
        self
    }

    /// Restrict the discount to a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: DiscountScope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether the discount has expired at `now`. A discount expiring exactly at `now` is expired.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Whether the discount may still be applied at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.is_expired(now)
    }

    /// Whether the discount covers the given product.
    pub fn applies_to(&self, product: ProductId) -> bool {
        match self.scope {
            DiscountScope::StoreWide => true,
            DiscountScope::Product(scoped) => scoped == product,
        }
    }

    /// Calculate how much this discount takes off `base`.
    ///
    /// The result always lies within `0..=base`, so subtracting it can never produce a negative
    /// price.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::PercentConversion`]: the percentage could not be represented in minor
    ///   units.
    /// - [`DiscountError::Money`]: a fixed amount is in a different currency to `base`.
    pub fn amount_off(
        &self,
        base: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let base_minor = base.to_minor_units();

        let off = match &self.kind {
            DiscountKind::Percentage(percent) => percent_of_minor(percent, base_minor)?,
            DiscountKind::Fixed(amount) => {
                // Surfaces a currency mismatch before comparing minor units.
                base.sub(*amount)?;
                amount.to_minor_units()
            }
            DiscountKind::Points(_) => 0,
        };

        Ok(Money::from_minor(clamp_minor(off, base_minor), base.currency()))
    }

    /// Apply the discount to `base`, returning the reduced price.
    ///
    /// # Errors
    ///
    /// See [`Discount::amount_off`].
    pub fn apply_to(&self, base: Money<'a, Currency>) -> Result<Money<'a, Currency>, DiscountError> {
        let off = self.amount_off(base)?;

        Ok(base.sub(off)?)
    }
}

/// Bound a discount amount to `0..=ceiling`.
fn clamp_minor(off: i64, ceiling: i64) -> i64 {
    if ceiling <= 0 || off <= 0 {
        0
    } else if off > ceiling {
        ceiling
    } else {
        off
    }
}

/// Round a data API number to whole minor units, halves away from zero.
///
/// Returns `None` if `value` is not finite or does not fit in an `i64`.
pub(crate) fn whole_minor_units(value: f64) -> Option<i64> {
    Decimal::from_f64(value)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

fn minor_units(value: f64) -> Result<i64, DiscountError> {
    whole_minor_units(value).ok_or(DiscountError::InvalidAmount(value))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Halves round away from zero, which for the non-negative prices handled here is round-half-up to
/// the nearest minor unit. Every percentage calculation in the crate goes through this function.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or cannot be safely
/// represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
