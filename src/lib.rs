//! Bazaar
//!
//! Bazaar is the pricing and fulfilment core of a multi-store storefront: catalog promotions and
//! vouchers, the order lifecycle, inventory change auditing and distance ranking of stores.

pub mod audit;
pub mod cart;
pub mod config;
pub mod discounts;
pub mod geo;
pub mod ids;
pub mod inventory;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod utils;
pub mod vouchers;
