//! Products

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{Discount, DiscountError, DiscountPayload, whole_minor_units},
    ids::{ProductId, StoreId},
};

/// Errors raised converting a product record.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Price is negative, not finite or too large for minor units.
    #[error("product {product} has an invalid price {price}")]
    InvalidPrice {
        /// Product carrying the price
        product: ProductId,

        /// Price as received
        price: f64,
    },

    /// One of the attached discounts is invalid.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Store a product, order or inventory row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRef {
    /// Store id
    pub store_id: StoreId,

    /// Store display name
    pub store_name: String,
}

/// Product record as returned by the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    /// Product id
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Base price in minor units
    pub price: f64,

    /// Owning store
    pub store: StoreRef,

    /// Attached promotions
    #[serde(rename = "Discount", default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<DiscountPayload>,
}

impl ProductPayload {
    /// Validate the record and build a [`Product`] priced in `currency`.
    ///
    /// Discounts keep the order the data API listed them in.
    ///
    /// # Errors
    ///
    /// - [`ProductError::InvalidPrice`]: the price is negative or not representable.
    /// - [`ProductError::Discount`]: an attached discount is invalid.
    pub fn into_product<'a>(self, currency: &'a Currency) -> Result<Product<'a>, ProductError> {
        let price = whole_minor_units(self.price)
            .filter(|minor| *minor >= 0)
            .ok_or(ProductError::InvalidPrice {
                product: self.product_id,
                price: self.price,
            })?;

        let discounts = self
            .discounts
            .into_iter()
            .map(|discount| discount.into_discount(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Product {
            product_id: self.product_id,
            name: self.name,
            price: Money::from_minor(price, currency),
            store: self.store,
            discounts,
        })
    }
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product id
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Base price
    pub price: Money<'a, Currency>,

    /// Owning store
    pub store: StoreRef,

    /// Catalog promotions attached to the product, in the order the data API returned them
    pub discounts: Vec<Discount<'a>>,
}

impl<'a> Product<'a> {
    /// Create a product without promotions.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        price: Money<'a, Currency>,
        store: StoreRef,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            store,
            discounts: Vec::new(),
        }
    }

    /// Attach a catalog promotion.
    #[must_use]
    pub fn with_discount(mut self, discount: Discount<'a>) -> Self {
        self.discounts.push(discount);
        self
    }

    /// The promotion that governs this product's price.
    ///
    /// Catalog promotions never stack: only the first one listed is considered, even if it has
    /// expired or is scoped to a different product.
    pub fn active_discount(&self) -> Option<&Discount<'a>> {
        self.discounts.first()
    }

    /// Whether the governing promotion is usable at `now`.
    pub fn has_live_discount(&self, now: Timestamp) -> bool {
        self.active_discount()
            .is_some_and(|discount| !discount.is_expired(now) && discount.applies_to(self.product_id))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use super::*;
    use crate::ids::DiscountId;

    fn store() -> StoreRef {
        StoreRef {
            store_id: StoreId::new(1),
            store_name: "Toko Satu".to_string(),
        }
    }

    #[test]
    fn only_first_discount_is_active() -> TestResult {
        let expires_at: Timestamp = "2030-01-01T00:00:00Z".parse()?;

        let product = Product::new(ProductId::new(1), "Kopi", Money::from_minor(50_000, IDR), store())
            .with_discount(Discount::percentage(DiscountId::new(10), 10.0, expires_at)?)
            .with_discount(Discount::percentage(DiscountId::new(11), 50.0, expires_at)?);

        let active = product.active_discount().map(|discount| discount.discount_id);

        assert_eq!(active, Some(DiscountId::new(10)));

        Ok(())
    }

    #[test]
    fn expired_first_discount_is_not_live() -> TestResult {
        let product = Product::new(ProductId::new(1), "Teh", Money::from_minor(20_000, IDR), store())
            .with_discount(Discount::percentage(
                DiscountId::new(10),
                10.0,
                "2020-01-01T00:00:00Z".parse()?,
            )?);

        assert!(!product.has_live_discount("2025-01-01T00:00:00Z".parse()?));

        Ok(())
    }

    #[test]
    fn product_record_keeps_discount_order() -> TestResult {
        let json = r#"{
            "product_id": 1,
            "name": "Kopi",
            "price": 100000,
            "store": { "store_id": 1, "store_name": "Toko Satu" },
            "Discount": [
                { "discount_id": 10, "discount_type": "percentage", "discount_value": 20, "expires_at": "2030-01-01T00:00:00Z" },
                { "discount_id": 11, "discount_type": "point", "discount_value": 5, "expires_at": "2030-01-01T00:00:00Z" }
            ]
        }"#;

        let product = serde_json::from_str::<ProductPayload>(json)?.into_product(IDR)?;

        assert_eq!(product.price, Money::from_minor(100_000, IDR));
        assert_eq!(product.store, store());
        assert_eq!(
            product.active_discount().map(|discount| discount.discount_id),
            Some(DiscountId::new(10))
        );
        assert_eq!(product.discounts.len(), 2);

        Ok(())
    }

    #[test]
    fn product_record_without_discounts_parses() -> TestResult {
        let json = r#"{ "product_id": 2, "name": "Teh", "price": 15000, "store": { "store_id": 1, "store_name": "Toko Satu" } }"#;

        let product = serde_json::from_str::<ProductPayload>(json)?.into_product(IDR)?;

        assert!(product.active_discount().is_none());

        Ok(())
    }

    #[test]
    fn negative_price_is_rejected() -> TestResult {
        let json = r#"{ "product_id": 3, "name": "Gula", "price": -1, "store": { "store_id": 1, "store_name": "Toko Satu" } }"#;

        let result = serde_json::from_str::<ProductPayload>(json)?.into_product(IDR);

        assert!(matches!(
            result,
            Err(ProductError::InvalidPrice { product, .. }) if product == ProductId::new(3)
        ));

        Ok(())
    }

    #[test]
    fn invalid_discount_fails_the_product() -> TestResult {
        let json = r#"{
            "product_id": 4,
            "name": "Susu",
            "price": 20000,
            "store": { "store_id": 1, "store_name": "Toko Satu" },
            "Discount": [
                { "discount_id": 12, "discount_type": "fixed", "discount_value": -5, "expires_at": "2030-01-01T00:00:00Z" }
            ]
        }"#;

        let result = serde_json::from_str::<ProductPayload>(json)?.into_product(IDR);

        assert!(matches!(
            result,
            Err(ProductError::Discount(DiscountError::NegativeAmount(-5)))
        ));

        Ok(())
    }

    #[test]
    fn product_without_discounts_has_none_active() {
        let product = Product::new(ProductId::new(1), "Gula", Money::from_minor(15_000, IDR), store());

        assert!(product.active_discount().is_none());
    }
}
