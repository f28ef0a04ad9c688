//! Checkout Example
//!
//! Prices a two-store catalog, lists the stores nearest the customer, checks out a cart from one
//! store with an optional voucher and walks the order through payment.
//!
//! Run with: `cargo run --example checkout -- --voucher HEMAT10`

use std::{io, num::NonZeroU32};

use anyhow::{Result, anyhow};
use clap::Parser;
use jiff::Timestamp;
use rusty_money::Money;

use bazaar::{
    prelude::*,
    utils::CheckoutArgs,
};

struct Store {
    store: StoreRef,
    location: RawCoordinate,
}

fn store(id: u64, name: &str, latitude: &str, longitude: &str) -> Result<Store> {
    Ok(Store {
        store: StoreRef {
            store_id: StoreId::new(id),
            store_name: name.to_string(),
        },
        location: serde_json::from_str(&format!(
            r#"{{ "latitude": "{latitude}", "longitude": "{longitude}" }}"#
        ))?,
    })
}

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = CheckoutArgs::parse();
    let settings = Settings::from_path(&args.settings)?;
    let currency = settings.currency()?;
    let now = Timestamp::now();
    let next_year = now.checked_add(jiff::SignedDuration::from_hours(24 * 365))?;

    // Stores near the customer
    let stores = vec![
        store(1, "Toko Menteng", "-6.1963", "106.8336")?,
        store(2, "Toko Bandung", "-6.9175", "107.6191")?,
        store(3, "Toko Kemang", "-6.2607", "106.8137")?,
        store(4, "Toko Tanpa Lokasi", "", "")?,
    ];

    let origin = Coordinate::new(args.latitude, args.longitude)?;
    let nearby = settings.ranker()?.nearest(
        origin,
        &stores,
        |s| Coordinate::try_from(&s.location),
        settings.nearby_store_limit,
    );

    println!("Nearby stores:");
    for ranked in nearby.iter() {
        println!("  {:>8.2} km  {}", ranked.distance_km, ranked.item.store.store_name);
    }
    println!("  ({} without a usable location)", nearby.excluded.len());

    let menteng = stores
        .first()
        .ok_or(anyhow!("store list is empty"))?
        .store
        .clone();

    // Catalog
    let kopi = Product::new(
        ProductId::new(1),
        "Kopi Gayo 250g",
        Money::from_minor(100_000, currency),
        menteng.clone(),
    )
    .with_discount(Discount::percentage(DiscountId::new(1), 20.0, next_year)?);

    let teh = Product::new(
        ProductId::new(2),
        "Teh Melati",
        Money::from_minor(35_000, currency),
        menteng.clone(),
    )
    .with_discount(Discount::fixed(
        DiscountId::new(2),
        Money::from_minor(5_000, currency),
        next_year,
    )?);

    let gula = Product::new(
        ProductId::new(3),
        "Gula Aren",
        Money::from_minor(18_000, currency),
        menteng,
    );

    let cart = Cart::with_items(
        CustomerId::new(42),
        [
            CartItem::new(kopi, NonZeroU32::new(2).ok_or(anyhow!("zero quantity"))?),
            CartItem::new(teh, NonZeroU32::MIN),
            CartItem::new(gula, NonZeroU32::new(3).ok_or(anyhow!("zero quantity"))?),
        ],
        currency,
    )?;

    let subtotal = cart.subtotal(now)?;

    // Vouchers held by the customer
    let vouchers = vec![
        Voucher::new(
            VoucherId::new(10),
            "HEMAT10",
            Discount::percentage(DiscountId::new(10), 10.0, next_year)?
                .with_minimum_order(Money::from_minor(150_000, currency)),
            next_year,
        ),
        Voucher::new(
            VoucherId::new(11),
            "BESAR50",
            Discount::fixed(DiscountId::new(11), Money::from_minor(50_000, currency), next_year)?
                .with_minimum_order(Money::from_minor(500_000, currency)),
            next_year,
        ),
    ];

    let book = partition_vouchers(&vouchers, subtotal, now);
    for (voucher, reason) in &book.ineligible {
        println!("Voucher {} unavailable: {reason}", voucher.voucher_code);
    }

    let voucher = args
        .voucher
        .as_deref()
        .map(|code| select_voucher(&vouchers, code, subtotal, now))
        .transpose()?;

    // Order
    let mut order = Order::from_cart(OrderId::new(1001), &cart, now)?;

    order.apply(OrderAction::RequestPayment, now)?;
    order.select_shipping(Shipping {
        carrier: "JNE Reguler".to_string(),
        cost: Money::from_minor(args.shipping, currency),
        destination: "Jl. Sudirman 1, Jakarta".to_string(),
    })?;
    order.proceed_to_payment()?;

    let totals = order.payable(voucher, now)?;

    Receipt::from_cart(&cart, totals, now)?.write_to(io::stdout())?;

    order.apply(OrderAction::Pay, now)?;
    println!("Order {} is {}", order.order_id(), order.status());

    if let Err(error) = order.apply(OrderAction::Complete, now) {
        println!("Rejected: {error}");
    }

    Ok(())
}
