//! Cart

use std::num::NonZeroU32;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    ids::{CustomerId, ProductId, StoreId},
    pricing::{LinePrice, PricingError, resolve_product_price, total_price},
    products::{Product, StoreRef},
};

/// Errors related to cart construction or checkout.
#[derive(Debug, Error)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// An item was not found in the cart.
    #[error("Item {0} not found")]
    ItemNotFound(usize),

    /// The cart has no items.
    #[error("cart is empty")]
    Empty,

    /// The cart contains products from more than one store; one order belongs to one store.
    #[error("cart mixes products from store {expected} and store {found}")]
    MixedStores {
        /// Store of the first line
        expected: StoreId,

        /// Store of the offending line
        found: StoreId,
    },
}

/// A product with the quantity the customer wants.
#[derive(Debug, Clone)]
pub struct CartItem<'a> {
    /// Product being bought
    pub product: Product<'a>,

    /// Number of units
    pub quantity: NonZeroU32,
}

impl<'a> CartItem<'a> {
    /// Create a cart line.
    pub fn new(product: Product<'a>, quantity: NonZeroU32) -> Self {
        Self { product, quantity }
    }
}

/// A cart line with its resolved price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine<'a> {
    /// Product id
    pub product_id: ProductId,

    /// Product name at pricing time
    pub name: String,

    /// Number of units
    pub quantity: u32,

    /// Resolved unit price
    pub price: LinePrice<'a>,

    /// Unit price times quantity
    pub line_total: Money<'a, Currency>,
}

/// Cart
#[derive(Debug)]
pub struct Cart<'a> {
    customer: CustomerId,
    items: Vec<CartItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart for a customer.
    #[must_use]
    pub fn new(customer: CustomerId, currency: &'static Currency) -> Self {
        Cart {
            customer,
            items: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given items.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::CurrencyMismatch`] if a product is priced in another currency.
    pub fn with_items(
        customer: CustomerId,
        items: impl Into<Vec<CartItem<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            let item_currency = item.product.price.currency();

            if item_currency == currency {
                Ok(())
            } else {
                Err(CartError::CurrencyMismatch(
                    i,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Cart {
            customer,
            items,
            currency,
        })
    }

    /// The store every line belongs to.
    ///
    /// # Errors
    ///
    /// - [`CartError::Empty`]: there are no lines.
    /// - [`CartError::MixedStores`]: lines belong to different stores.
    pub fn store(&self) -> Result<&StoreRef, CartError> {
        let first = &self.items.first().ok_or(CartError::Empty)?.product.store;

        match self
            .items
            .iter()
            .find(|item| item.product.store.store_id != first.store_id)
        {
            Some(other) => Err(CartError::MixedStores {
                expected: first.store_id,
                found: other.product.store.store_id,
            }),
            None => Ok(first),
        }
    }

    /// Resolve the price of every line at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a promotion cannot be applied or a line total overflows.
    pub fn price_lines(&self, now: Timestamp) -> Result<Vec<PricedLine<'a>>, PricingError> {
        self.items
            .iter()
            .map(|item| {
                let price = resolve_product_price(&item.product, now)?;
                let quantity = item.quantity.get();

                Ok(PricedLine {
                    product_id: item.product.product_id,
                    name: item.product.name.clone(),
                    quantity,
                    line_total: price.line_total(quantity)?,
                    price,
                })
            })
            .collect()
    }

    /// Calculate the subtotal of the cart after catalog promotions.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if pricing any line fails.
    pub fn subtotal(&self, now: Timestamp) -> Result<Money<'a, Currency>, PricingError> {
        if self.is_empty() {
            return Ok(Money::from_minor(0, self.currency));
        }

        let totals: Vec<_> = self
            .price_lines(now)?
            .into_iter()
            .map(|line| line.line_total)
            .collect();

        total_price(&totals)
    }

    /// Get an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::ItemNotFound`] if the item is not found.
    pub fn get_item(&self, item: usize) -> Result<&CartItem<'a>, CartError> {
        self.items.get(item).ok_or(CartError::ItemNotFound(item))
    }

    /// Iterate over the items in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem<'a>> {
        self.items.iter()
    }

    /// Owning customer.
    #[must_use]
    pub fn customer(&self) -> CustomerId {
        self.customer
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{IDR, USD};
    use testresult::TestResult;

    use super::*;
    use crate::{discounts::Discount, ids::DiscountId};

    fn store(id: u64) -> StoreRef {
        StoreRef {
            store_id: StoreId::new(id),
            store_name: format!("Toko {id}"),
        }
    }

    fn item(product: u64, store_id: u64, price: i64, quantity: u32) -> TestResult<CartItem<'static>> {
        let quantity = NonZeroU32::new(quantity).ok_or("quantity must be positive")?;

        Ok(CartItem::new(
            Product::new(
                ProductId::new(product),
                format!("Produk {product}"),
                Money::from_minor(price, IDR),
                store(store_id),
            ),
            quantity,
        ))
    }

    #[test]
    fn with_items_currency_mismatch_errors() -> TestResult {
        let mut foreign = item(2, 1, 100, 1)?;
        foreign.product.price = Money::from_minor(100, USD);

        let result = Cart::with_items(CustomerId::new(1), [item(1, 1, 100, 1)?, foreign], IDR);

        match result {
            Err(CartError::CurrencyMismatch(idx, item_currency, cart_currency)) => {
                assert_eq!(idx, 1);
                assert_eq!(item_currency, USD.iso_alpha_code);
                assert_eq!(cart_currency, IDR.iso_alpha_code);
            }
            other => return Err(format!("expected CurrencyMismatch, got {other:?}").into()),
        }

        Ok(())
    }

    #[test]
    fn subtotal_applies_catalog_promotions_per_line() -> TestResult {
        let expires_at: Timestamp = "2030-01-01T00:00:00Z".parse()?;
        let mut discounted = item(1, 1, 100_000, 2)?;
        discounted.product = discounted
            .product
            .with_discount(Discount::percentage(DiscountId::new(1), 20.0, expires_at)?);

        let cart = Cart::with_items(
            CustomerId::new(1),
            [discounted, item(2, 1, 25_000, 1)?],
            IDR,
        )?;

        let subtotal = cart.subtotal("2025-01-01T00:00:00Z".parse()?)?;

        assert_eq!(subtotal, Money::from_minor(185_000, IDR));

        Ok(())
    }

    #[test]
    fn empty_cart_subtotal_is_zero() -> TestResult {
        let cart = Cart::new(CustomerId::new(1), IDR);

        assert_eq!(cart.subtotal("2025-01-01T00:00:00Z".parse()?)?, Money::from_minor(0, IDR));
        assert!(matches!(cart.store(), Err(CartError::Empty)));

        Ok(())
    }

    #[test]
    fn cross_store_cart_is_rejected() -> TestResult {
        let cart = Cart::with_items(
            CustomerId::new(1),
            [item(1, 1, 100, 1)?, item(2, 1, 100, 1)?, item(3, 2, 100, 1)?],
            IDR,
        )?;

        assert!(matches!(
            cart.store(),
            Err(CartError::MixedStores { expected, found })
                if expected == StoreId::new(1) && found == StoreId::new(2)
        ));

        Ok(())
    }

    #[test]
    fn single_store_cart_reports_store() -> TestResult {
        let cart = Cart::with_items(CustomerId::new(1), [item(1, 4, 100, 3)?], IDR)?;

        assert_eq!(cart.store()?.store_id, StoreId::new(4));
        assert_eq!(cart.get_item(0)?.quantity.get(), 3);
        assert!(matches!(cart.get_item(1), Err(CartError::ItemNotFound(1))));

        Ok(())
    }
}
