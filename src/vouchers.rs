//! Vouchers
//!
//! A voucher is a single-use right, held by a customer, to apply one [`Discount`] to an order
//! subtotal. Eligibility is decided when the customer selects a voucher, so an unusable voucher is
//! reported with its reason instead of disappearing from the list.

use jiff::Timestamp;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    discounts::{Discount, DiscountError, DiscountPayload, DiscountScope},
    ids::VoucherId,
};

/// Reasons a voucher cannot be applied.
#[derive(Debug, PartialEq, Error)]
pub enum VoucherError {
    /// The voucher has already been used.
    #[error("voucher {0} has already been redeemed")]
    Redeemed(VoucherId),

    /// The voucher, or the discount behind it, is past its expiry.
    #[error("voucher {0} has expired")]
    Expired(VoucherId),

    /// The order subtotal is below the discount's minimum order (minor units).
    #[error("voucher {voucher} requires a minimum order of {minimum}, subtotal is {subtotal}")]
    Ineligible {
        /// Voucher that was rejected
        voucher: VoucherId,

        /// Minimum order in minor units
        minimum: i64,

        /// Order subtotal in minor units
        subtotal: i64,
    },

    /// Vouchers discount the whole subtotal, so a discount limited to one product cannot back one.
    #[error("voucher {0} carries a product-scoped discount")]
    ProductScoped(VoucherId),

    /// No voucher carries the requested code.
    #[error("no voucher with code {0:?}")]
    UnknownCode(String),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Voucher record as returned by the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherPayload {
    /// Voucher id
    pub voucher_id: VoucherId,

    /// Code the customer redeems
    pub voucher_code: String,

    /// Whether the voucher has been used
    #[serde(default)]
    pub is_redeemed: bool,

    /// ISO-8601 expiry
    pub expires_at: Timestamp,

    /// Discount granted by the voucher
    pub discount: DiscountPayload,
}

impl VoucherPayload {
    /// Validate the record and build a [`Voucher`] in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the nested discount is invalid.
    pub fn into_voucher<'a>(self, currency: &'a Currency) -> Result<Voucher<'a>, DiscountError> {
        let mut voucher = Voucher::new(
            self.voucher_id,
            self.voucher_code,
            self.discount.into_discount(currency)?,
            self.expires_at,
        );
        voucher.is_redeemed = self.is_redeemed;

        Ok(voucher)
    }
}

/// Voucher
///
/// The discount is always taken off the whole order subtotal.
#[derive(Debug, Clone)]
pub struct Voucher<'a> {
    /// Voucher id
    pub voucher_id: VoucherId,

    /// Code the customer redeems
    pub voucher_code: String,

    /// Discount granted by the voucher
    pub discount: Discount<'a>,

    /// Whether the voucher has been used
    pub is_redeemed: bool,

    /// The voucher stops applying at this instant
    pub expires_at: Timestamp,
}

impl<'a> Voucher<'a> {
    /// Create an unredeemed voucher.
    pub fn new(
        voucher_id: VoucherId,
        voucher_code: impl Into<String>,
        discount: Discount<'a>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            voucher_id,
            voucher_code: voucher_code.into(),
            discount,
            is_redeemed: false,
            expires_at,
        }
    }

    /// Whether the voucher or its discount has expired at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now || self.discount.is_expired(now)
    }

    /// Check the voucher can be applied to an order with the given subtotal.
    ///
    /// # Errors
    ///
    /// - [`VoucherError::Redeemed`]: the voucher has already been used.
    /// - [`VoucherError::Expired`]: the voucher or its discount has expired.
    /// - [`VoucherError::ProductScoped`]: the discount is limited to a single product.
    /// - [`VoucherError::Ineligible`]: the subtotal is below the minimum order.
    /// - [`VoucherError::Money`]: the minimum order is in a different currency to the subtotal.
    pub fn check_eligibility(
        &self,
        subtotal: Money<'a, Currency>,
        now: Timestamp,
    ) -> Result<(), VoucherError> {
        if self.is_redeemed {
            return Err(VoucherError::Redeemed(self.voucher_id));
        }

        if self.is_expired(now) {
            return Err(VoucherError::Expired(self.voucher_id));
        }

        if let DiscountScope::Product(_) = self.discount.scope {
            return Err(VoucherError::ProductScoped(self.voucher_id));
        }

        if let Some(minimum) = self.discount.minimum_order {
            let shortfall = subtotal.sub(minimum)?;

            if shortfall.to_minor_units() < 0 {
                return Err(VoucherError::Ineligible {
                    voucher: self.voucher_id,
                    minimum: minimum.to_minor_units(),
                    subtotal: subtotal.to_minor_units(),
                });
            }
        }

        Ok(())
    }

    /// Amount the voucher takes off `subtotal`, ignoring eligibility.
    ///
    /// # Errors
    ///
    /// See [`Discount::amount_off`].
    pub fn discount_on(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        self.discount.amount_off(subtotal)
    }
}

/// Find a voucher by code and check it can be applied.
///
/// # Errors
///
/// Returns [`VoucherError::UnknownCode`] if no voucher carries `code`, otherwise any error from
/// [`Voucher::check_eligibility`].
pub fn select_voucher<'v, 'a>(
    vouchers: &'v [Voucher<'a>],
    code: &str,
    subtotal: Money<'a, Currency>,
    now: Timestamp,
) -> Result<&'v Voucher<'a>, VoucherError> {
    let voucher = vouchers
        .iter()
        .find(|voucher| voucher.voucher_code == code)
        .ok_or_else(|| VoucherError::UnknownCode(code.to_string()))?;

    voucher.check_eligibility(subtotal, now)?;

    Ok(voucher)
}

/// A customer's vouchers split by whether they can be applied to the current order.
#[derive(Debug)]
pub struct VoucherBook<'v, 'a> {
    /// Vouchers that can be applied
    pub eligible: Vec<&'v Voucher<'a>>,

    /// Vouchers that cannot be applied, with the reason
    pub ineligible: Vec<(&'v Voucher<'a>, VoucherError)>,
}

/// Split vouchers into eligible and ineligible for an order with `subtotal`, keeping input order.
pub fn partition_vouchers<'v, 'a>(
    vouchers: &'v [Voucher<'a>],
    subtotal: Money<'a, Currency>,
    now: Timestamp,
) -> VoucherBook<'v, 'a> {
    let mut book = VoucherBook {
        eligible: Vec::new(),
        ineligible: Vec::new(),
    };

    for voucher in vouchers {
        match voucher.check_eligibility(subtotal, now) {
            Ok(()) => book.eligible.push(voucher),
            Err(reason) => book.ineligible.push((voucher, reason)),
        }
    }

    debug!(
        eligible = book.eligible.len(),
        ineligible = book.ineligible.len(),
        "partitioned vouchers"
    );

    book
}
