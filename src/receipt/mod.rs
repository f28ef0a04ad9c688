//! Receipt

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, PricedLine},
    pricing::{OrderTotal, PricingError, PromotionOutcome, VoucherOutcome},
};

/// Errors that can occur when building a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error pricing the cart lines.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Checkout summary: priced lines plus the order total.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: Vec<PricedLine<'a>>,
    totals: OrderTotal<'a>,
}

impl<'a> Receipt<'a> {
    /// Create a receipt from already priced lines.
    pub fn new(lines: Vec<PricedLine<'a>>, totals: OrderTotal<'a>) -> Self {
        Self { lines, totals }
    }

    /// Price the cart's lines at `now` and pair them with `totals`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a line cannot be priced.
    pub fn from_cart(
        cart: &Cart<'a>,
        totals: OrderTotal<'a>,
        now: Timestamp,
    ) -> Result<Self, ReceiptError> {
        Ok(Self::new(cart.price_lines(now)?, totals))
    }

    /// Priced lines
    pub fn lines(&self) -> &[PricedLine<'a>] {
        &self.lines
    }

    /// Order total breakdown
    pub fn totals(&self) -> &OrderTotal<'a> {
        &self.totals
    }

    /// Currency used for all monetary values
    pub fn currency(&self) -> &'a Currency {
        self.totals.subtotal.currency()
    }

    /// Sum of base prices times quantities, before any promotion.
    ///
    /// # Errors
    ///
    /// - [`ReceiptError::Pricing`]: a line's base total does not fit in minor units.
    /// - [`ReceiptError::Money`]: the lines are in different currencies.
    pub fn gross(&self) -> Result<Money<'a, Currency>, ReceiptError> {
        self.lines.iter().try_fold(
            Money::from_minor(0, self.currency()),
            |acc, line| -> Result<Money<'a, Currency>, ReceiptError> {
                let base = line
                    .price
                    .base_price
                    .to_minor_units()
                    .checked_mul(i64::from(line.quantity))
                    .ok_or(PricingError::Overflow)?;

                Ok(acc.add(Money::from_minor(base, line.price.base_price.currency()))?)
            },
        )
    }

    /// Catalog promotion savings plus the voucher discount.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the gross amount overflows or the subtraction fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, ReceiptError> {
        Ok(self
            .gross()?
            .sub(self.totals.subtotal)?
            .add(self.totals.voucher_discount)?)
    }

    /// Savings as a fraction of the gross amount.
    ///
    /// # Errors
    ///
    /// See [`Receipt::savings`].
    pub fn savings_percent(&self) -> Result<Percentage, ReceiptError> {
        let savings_minor = self.savings()?.to_minor_units();
        let gross_minor = self.gross()?.to_minor_units();

        if gross_minor == 0 {
            return Ok(Percentage::from(0.0));
        }

        let savings_dec = Decimal::from_i64(savings_minor).unwrap_or(Decimal::ZERO);
        let gross_dec = Decimal::from_i64(gross_minor).unwrap_or(Decimal::ZERO);

        Ok(Percentage::from(savings_dec / gross_dec))
    }

    /// Render the receipt as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Base Price", "Unit Price", "Line Total", "Promotion"]);

        for (idx, line) in self.lines.iter().enumerate() {
            let unit_price = if line.price.unit_price == line.price.base_price {
                String::new()
            } else {
                format!("{}", line.price.unit_price)
            };

            builder.push_record([
                format!("#{}", idx + 1),
                line.name.clone(),
                line.quantity.to_string(),
                format!("{}", line.price.base_price),
                unit_price,
                format!("{}", line.line_total),
                promotion_label(line.price.promotion),
            ]);
        }

        write_receipt_table(&mut out, builder)?;

        write_receipt_summary(&mut out, self)
    }
}

fn promotion_label(outcome: PromotionOutcome) -> String {
    match outcome {
        PromotionOutcome::Applied(id) => format!("discount {id}"),
        PromotionOutcome::Expired(id) => format!("discount {id} (expired)"),
        PromotionOutcome::NotApplicable(id) => format!("discount {id} (other product)"),
        PromotionOutcome::Absent => String::new(),
    }
}

fn voucher_label(outcome: VoucherOutcome) -> String {
    match outcome {
        VoucherOutcome::Applied(id) => format!(" Voucher {id}:"),
        VoucherOutcome::Expired(id) => format!(" Voucher {id} (expired):"),
        VoucherOutcome::Absent => " Voucher:".to_string(),
    }
}

fn write_receipt_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    receipt: &Receipt<'_>,
) -> Result<(), ReceiptError> {
    let totals = receipt.totals();
    let savings = receipt.savings()?;
    let savings_percent_points = percent_points_from_fractional_percentage(receipt.savings_percent()?);

    let rows = [
        (" Subtotal:".to_string(), format!("{}  ", totals.subtotal)),
        (" Shipping:".to_string(), format!("{}  ", totals.shipping)),
        (voucher_label(totals.voucher), format!("-{}  ", totals.voucher_discount)),
        (
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}  \x1b[0m", totals.total),
        ),
        (
            " Savings:".to_string(),
            format!("({savings_percent_points:.2}%) {savings}  "),
        ),
    ];

    let label_width = rows.iter().map(|(label, _)| visible_width(label)).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| visible_width(value)).max().unwrap_or(0);

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use super::*;
    use crate::{
        cart::CartItem,
        discounts::Discount,
        ids::{CustomerId, DiscountId, ProductId, StoreId},
        pricing::{LinePrice, resolve_order_total},
        products::{Product, StoreRef},
    };

    fn now() -> TestResult<Timestamp> {
        Ok("2025-06-01T12:00:00Z".parse()?)
    }

    fn cart() -> TestResult<Cart<'static>> {
        let store = StoreRef {
            store_id: StoreId::new(1),
            store_name: "Toko Satu".to_string(),
        };

        let kopi = Product::new(
            ProductId::new(1),
            "Kopi",
            Money::from_minor(100_000, IDR),
            store.clone(),
        )
        .with_discount(Discount::percentage(
            DiscountId::new(9),
            20.0,
            "2030-01-01T00:00:00Z".parse()?,
        )?);

        let teh = Product::new(ProductId::new(2), "Teh", Money::from_minor(15_000, IDR), store);

        Ok(Cart::with_items(
            CustomerId::new(7),
            [
                CartItem::new(kopi, NonZeroU32::new(2).ok_or("qty")?),
                CartItem::new(teh, NonZeroU32::MIN),
            ],
            IDR,
        )?)
    }

    #[test]
    fn savings_combine_promotions_and_voucher() -> TestResult {
        let cart = cart()?;
        let subtotal = cart.subtotal(now()?)?;
        let totals =
            resolve_order_total(subtotal, Money::from_minor(10_000, IDR), None, now()?)?;

        let receipt = Receipt::from_cart(&cart, totals, now()?)?;

        assert_eq!(receipt.gross()?, Money::from_minor(215_000, IDR));
        assert_eq!(receipt.totals().subtotal, Money::from_minor(175_000, IDR));
        assert_eq!(receipt.savings()?, Money::from_minor(40_000, IDR));

        Ok(())
    }

    #[test]
    fn gross_overflow_is_an_error() -> TestResult {
        let zero = Money::from_minor(0, IDR);
        let totals = resolve_order_total(zero, zero, None, now()?)?;
        let huge = Money::from_minor(i64::MAX, IDR);

        let line = PricedLine {
            product_id: ProductId::new(1),
            name: "Emas".to_string(),
            quantity: 2,
            price: LinePrice {
                base_price: huge,
                unit_price: huge,
                promotion: PromotionOutcome::Absent,
            },
            line_total: huge,
        };

        let receipt = Receipt::new(vec![line], totals);

        assert!(matches!(
            receipt.gross(),
            Err(ReceiptError::Pricing(PricingError::Overflow))
        ));
        assert!(receipt.savings().is_err());

        Ok(())
    }

    #[test]
    fn empty_receipt_has_zero_savings_percent() -> TestResult {
        let zero = Money::from_minor(0, IDR);
        let totals = resolve_order_total(zero, zero, None, now()?)?;

        let receipt = Receipt::new(Vec::new(), totals);

        assert_eq!(
            percent_points_from_fractional_percentage(receipt.savings_percent()?),
            Decimal::ZERO
        );

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_totals() -> TestResult {
        let cart = cart()?;
        let subtotal = cart.subtotal(now()?)?;
        let totals =
            resolve_order_total(subtotal, Money::from_minor(10_000, IDR), None, now()?)?;

        let mut out = Vec::new();
        Receipt::from_cart(&cart, totals, now()?)?.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Kopi"));
        assert!(output.contains("Teh"));
        assert!(output.contains("discount 9"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Shipping:"));
        assert!(output.contains("Total:"));

        Ok(())
    }

    #[test]
    fn borders_are_grey_and_content_is_not() {
        let colored = colorize_borders("│a│");

        assert_eq!(colored, "\x1b[90m│\x1b[0ma\x1b[90m│\x1b[0m");
        assert_eq!(visible_width(&colored), 3);
    }
}
