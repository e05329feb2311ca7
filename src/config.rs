use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Command Line Configuration
// ============================================================================
//
// One binary, one subcommand per service. Downstream addresses come from the
// same environment variables the container manifests set; a missing one makes
// clap exit before anything binds.
//
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "online_boutique")]
#[command(about = "Online Boutique microservices")]
pub struct Cli {
    /// Serve Prometheus metrics on this port
    #[arg(long, env = "METRICS_PORT", global = true)]
    pub metrics_port: Option<u16>,

    /// Tracing collector address, recorded on the root span
    #[arg(long, env = "COLLECTOR_ADDR", global = true)]
    pub collector_addr: Option<String>,

    /// Wrap upstream calls in a circuit breaker with retries
    #[arg(long, env = "RESILIENT", global = true)]
    pub resilient: bool,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// HTTP shop frontend
    Frontend(FrontendArgs),
    /// Shopping cart service
    Cart(CartArgs),
    /// Product catalog service
    Productcatalog(CatalogArgs),
    /// Currency conversion service
    Currency(CurrencyArgs),
    /// Mock payment service
    Payment(PaymentArgs),
    /// Shipping quote and tracking service
    Shipping(ShippingArgs),
    /// Order confirmation email service
    Email(EmailArgs),
    /// Order placement service
    Checkout(CheckoutArgs),
    /// Product recommendation service
    Recommendation(RecommendationArgs),
    /// Contextual ad service
    Ad(AdArgs),
}

impl Command {
    pub fn service_name(&self) -> &'static str {
        match self {
            Command::Frontend(_) => "frontend",
            Command::Cart(_) => "cart",
            Command::Productcatalog(_) => "productcatalog",
            Command::Currency(_) => "currency",
            Command::Payment(_) => "payment",
            Command::Shipping(_) => "shipping",
            Command::Email(_) => "email",
            Command::Checkout(_) => "checkout",
            Command::Recommendation(_) => "recommendation",
            Command::Ad(_) => "ad",
        }
    }
}

#[derive(Debug, Args)]
pub struct PaymentArgs {
    #[arg(long, env = "PORT", default_value_t = 8084)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct EmailArgs {
    #[arg(long, env = "PORT", default_value_t = 8086)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct AdArgs {
    #[arg(long, env = "PORT", default_value_t = 8089)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct FrontendArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "PRODUCT_CATALOG_SERVICE_ADDR")]
    pub product_catalog_addr: String,

    #[arg(long, env = "CURRENCY_SERVICE_ADDR")]
    pub currency_addr: String,

    #[arg(long, env = "CART_SERVICE_ADDR")]
    pub cart_addr: String,

    #[arg(long, env = "RECOMMENDATION_SERVICE_ADDR")]
    pub recommendation_addr: String,

    #[arg(long, env = "CHECKOUT_SERVICE_ADDR")]
    pub checkout_addr: String,

    #[arg(long, env = "SHIPPING_SERVICE_ADDR")]
    pub shipping_addr: String,

    #[arg(long, env = "AD_SERVICE_ADDR")]
    pub ad_addr: String,

    /// Seconds between upstream health probes
    #[arg(long, env = "HEALTH_PROBE_INTERVAL_SECS", default_value_t = 10)]
    pub health_probe_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CartBackend {
    Redis,
    Memory,
}

#[derive(Debug, Args)]
pub struct CartArgs {
    #[arg(long, env = "PORT", default_value_t = 8081)]
    pub port: u16,

    #[arg(long, value_enum, env = "CART_STORE", default_value_t = CartBackend::Redis)]
    pub store: CartBackend,

    /// Required with `--store redis`
    #[arg(long, env = "CART_REDIS_ADDR", required_if_eq("store", "redis"))]
    pub redis_addr: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[arg(long, env = "PORT", default_value_t = 8082)]
    pub port: u16,

    #[arg(long, env = "CATALOG_PATH", default_value = "data/products.json")]
    pub catalog_path: PathBuf,

    /// Artificial delay before every RPC, e.g. `150ms` or `2s`
    #[arg(long, env = "EXTRA_LATENCY", value_parser = parse_latency)]
    pub extra_latency: Option<Duration>,
}

#[derive(Debug, Args)]
pub struct CurrencyArgs {
    #[arg(long, env = "PORT", default_value_t = 8083)]
    pub port: u16,

    #[arg(long, env = "CURRENCY_RATES_PATH", default_value = "data/currency_conversion.json")]
    pub rates_path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ShippingArgs {
    #[arg(long, env = "PORT", default_value_t = 8085)]
    pub port: u16,

    #[arg(long, env = "SHIPPING_BASE_FEE_CENTS", default_value_t = 899)]
    pub base_fee_cents: i64,

    #[arg(long, env = "SHIPPING_PER_ITEM_FEE_CENTS", default_value_t = 0)]
    pub per_item_fee_cents: i64,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long, env = "PORT", default_value_t = 8087)]
    pub port: u16,

    #[arg(long, env = "PRODUCT_CATALOG_SERVICE_ADDR")]
    pub product_catalog_addr: String,

    #[arg(long, env = "SHIPPING_SERVICE_ADDR")]
    pub shipping_addr: String,

    #[arg(long, env = "PAYMENT_SERVICE_ADDR")]
    pub payment_addr: String,

    #[arg(long, env = "EMAIL_SERVICE_ADDR")]
    pub email_addr: String,

    #[arg(long, env = "CURRENCY_SERVICE_ADDR")]
    pub currency_addr: String,

    #[arg(long, env = "CART_SERVICE_ADDR")]
    pub cart_addr: String,
}

#[derive(Debug, Args)]
pub struct RecommendationArgs {
    #[arg(long, env = "PORT", default_value_t = 8088)]
    pub port: u16,

    #[arg(long, env = "PRODUCT_CATALOG_SERVICE_ADDR")]
    pub product_catalog_addr: String,
}

/// Accepts `150ms`, `2s`, or a bare number of milliseconds.
pub fn parse_latency(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit_ms) = if let Some(ms) = raw.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(s) = raw.strip_suffix('s') {
        (s, 1000)
    } else {
        (raw, 1)
    };

    digits
        .trim()
        .parse::<u64>()
        .map(|n| Duration::from_millis(n.saturating_mul(unit_ms)))
        .map_err(|_| format!("invalid latency {raw:?}, expected e.g. 150ms or 2s"))
}
