//! Utils

use std::path::PathBuf;

use clap::Parser;

/// Arguments for the checkout demo
#[derive(Debug, Parser)]
pub struct CheckoutArgs {
    /// YAML settings file
    #[clap(short, long, default_value = "demos/settings.yaml")]
    pub settings: PathBuf,

    /// Voucher code to apply at checkout
    #[clap(short, long)]
    pub voucher: Option<String>,

    /// Shipping cost in minor units
    #[clap(long, default_value_t = 12_000)]
    pub shipping: i64,

    /// Customer latitude, for the nearby-stores list
    #[clap(long, default_value = "-6.2088", allow_hyphen_values = true)]
    pub latitude: f64,

    /// Customer longitude, for the nearby-stores list
    #[clap(long, default_value = "106.8456", allow_hyphen_values = true)]
    pub longitude: f64,
}
