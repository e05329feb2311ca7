use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use kameo::prelude::*;
use tonic::service::Routes;
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod clients;
mod config;
mod domain;
mod frontend;
mod metrics;
mod models;
mod proto;
mod services;
mod utils;

use actors::{CatalogReloader, HealthMonitorActor, UpstreamProbe};
use clients::{
    AdClient, CartClient, CatalogClient, CheckoutClient, CurrencyClient, EmailClient,
    PaymentClient, RecommendationClient, ShippingClient, Upstream,
};
use config::{CartBackend, Cli, Command, LogFormat};
use domain::ads::CategoryAdSelector;
use domain::cart::{CartRepository, CartStore, InMemoryCartStore, RedisCartStore};
use domain::catalog::{CatalogStore, JsonFileSource};
use domain::checkout::UuidOrderIds;
use domain::currency::ExchangeRates;
use domain::payment::PaymentProcessor;
use domain::recommendation::RandomRecommender;
use domain::shipping::{QuoteCalculator, RandomTrackingIds};
use metrics::Metrics;
use proto::{
    AdServiceServer, CartServiceServer, CheckoutServiceServer, CurrencyServiceServer,
    EmailServiceServer, PaymentServiceServer, ProductCatalogServiceServer,
    RecommendationServiceServer, ShippingServiceServer,
};
use services::{
    AdServiceImpl, CartServiceImpl, CheckoutDownstreams, CheckoutServiceImpl, CurrencyServiceImpl,
    EmailServiceImpl, PaymentServiceImpl, ProductCatalogServiceImpl, RecommendationServiceImpl,
    RpcObserver, ShippingServiceImpl,
};
use utils::{CircuitBreakerConfig, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let service = cli.command.service_name();
    let root = tracing::info_span!(
        "service",
        name = service,
        collector = cli.collector_addr.as_deref().unwrap_or("none")
    );

    run(cli).instrument(root).await
}

/// Structured logging. Defaults to INFO, overridable with RUST_LOG.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,online_boutique=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init(),
    }
}

struct Wiring {
    metrics: Arc<Metrics>,
    resilient: bool,
}

impl Wiring {
    fn rpc(&self, service: &'static str) -> RpcObserver {
        RpcObserver::new(service).with_metrics(self.metrics.clone())
    }

    fn upstream(&self, name: &'static str, addr: &str) -> anyhow::Result<Upstream> {
        let upstream = Upstream::connect_lazy(name, addr)?.with_metrics(self.metrics.clone());
        if self.resilient {
            Ok(upstream.with_resilience(CircuitBreakerConfig::default(), RetryConfig::default()))
        } else {
            Ok(upstream)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let service = cli.command.service_name();
    tracing::info!("🚀 Starting Online Boutique {} service", service);
    if let Some(collector) = &cli.collector_addr {
        tracing::info!(collector = %collector, "Tracing collector configured, span export disabled");
    }

    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // Metrics HTTP server runs on its own thread and runtime
    if let Some(port) = cli.metrics_port {
        let registry = Arc::new(metrics.registry().clone());
        std::thread::spawn(move || match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(async {
                if let Err(e) = metrics::start_metrics_server(registry, port, service).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            }),
            Err(e) => tracing::error!("Failed to start metrics runtime: {}", e),
        });
    }

    let wiring = Wiring {
        metrics,
        resilient: cli.resilient,
    };
    if wiring.resilient {
        tracing::info!("🛡️ Resilient mode: circuit breaker and retries on upstream calls");
    }

    let (health, health_service) = tonic_health::server::health_reporter();

    match cli.command {
        Command::Frontend(args) => {
            let catalog = wiring.upstream("productcatalog", &args.product_catalog_addr)?;
            let currency = wiring.upstream("currency", &args.currency_addr)?;
            let cart = wiring.upstream("cart", &args.cart_addr)?;
            let recommendation = wiring.upstream("recommendation", &args.recommendation_addr)?;
            let checkout = wiring.upstream("checkout", &args.checkout_addr)?;
            let shipping = wiring.upstream("shipping", &args.shipping_addr)?;
            let ad = wiring.upstream("ad", &args.ad_addr)?;

            let probes = [&catalog, &currency, &cart, &recommendation, &checkout, &shipping, &ad]
                .into_iter()
                .map(|u| UpstreamProbe {
                    name: u.name(),
                    channel: u.channel(),
                    breaker: u.breaker(),
                })
                .collect();
            let monitor = HealthMonitorActor::spawn(HealthMonitorActor::new(
                probes,
                Duration::from_secs(args.health_probe_interval_secs.max(1)),
            ));

            let shop = frontend::Frontend {
                catalog: CatalogClient::new(catalog),
                currency: CurrencyClient::new(currency),
                cart: CartClient::new(cart),
                recommendation: RecommendationClient::new(recommendation),
                checkout: CheckoutClient::new(checkout),
                shipping: ShippingClient::new(shipping),
                ad: AdClient::new(ad),
                health: monitor,
            };
            frontend::run(shop, args.port)
                .await
                .context("frontend server failed")
        }

        Command::Cart(args) => {
            let store: Arc<dyn CartStore> = match args.store {
                CartBackend::Memory => {
                    tracing::warn!("Using the in-memory cart store, carts are lost on restart");
                    Arc::new(InMemoryCartStore::new())
                }
                CartBackend::Redis => {
                    let addr = args
                        .redis_addr
                        .context("CART_REDIS_ADDR is required with --store redis")?;
                    Arc::new(
                        RedisCartStore::connect(&addr)
                            .await
                            .with_context(|| format!("failed to connect to Redis at {addr}"))?,
                    )
                }
            };
            let repo = Arc::new(CartRepository::new(store));
            tracing::info!(store = repo.store_name(), "Cart store ready");

            health.set_serving::<CartServiceServer<CartServiceImpl>>().await;
            let routes = Routes::new(health_service)
                .add_service(CartServiceServer::new(CartServiceImpl::new(repo, wiring.rpc("cart"))));
            services::serve("cart", args.port, routes).await
        }

        Command::Productcatalog(args) => {
            let source = Arc::new(JsonFileSource::new(&args.catalog_path));
            let store = CatalogStore::open(source)
                .with_context(|| format!("failed to load catalog from {}", args.catalog_path.display()))?
                .with_metrics(wiring.metrics.clone());
            let store = Arc::new(store);

            let reloader = CatalogReloader::spawn(CatalogReloader::new(store.clone()));
            #[cfg(unix)]
            actors::forward_reload_signals(reloader)?;
            #[cfg(not(unix))]
            let _reloader = reloader;

            let latency = args.extra_latency.unwrap_or_default();
            if !latency.is_zero() {
                tracing::info!(latency_ms = latency.as_millis() as u64, "Injecting extra latency");
            }

            health
                .set_serving::<ProductCatalogServiceServer<ProductCatalogServiceImpl>>()
                .await;
            let service = ProductCatalogServiceImpl::new(store, wiring.rpc("productcatalog"))
                .with_extra_latency(latency);
            let routes = Routes::new(health_service)
                .add_service(ProductCatalogServiceServer::new(service));
            services::serve("productcatalog", args.port, routes).await
        }

        Command::Currency(args) => {
            let rates = ExchangeRates::load(&args.rates_path).with_context(|| {
                format!("failed to load exchange rates from {}", args.rates_path.display())
            })?;
            tracing::info!(currencies = rates.len(), "Exchange rates loaded");

            health.set_serving::<CurrencyServiceServer<CurrencyServiceImpl>>().await;
            let service = CurrencyServiceImpl::new(Arc::new(rates), wiring.rpc("currency"));
            let routes = Routes::new(health_service).add_service(CurrencyServiceServer::new(service));
            services::serve("currency", args.port, routes).await
        }

        Command::Payment(args) => {
            health.set_serving::<PaymentServiceServer<PaymentServiceImpl>>().await;
            let service = PaymentServiceImpl::new(PaymentProcessor, wiring.rpc("payment"));
            let routes = Routes::new(health_service).add_service(PaymentServiceServer::new(service));
            services::serve("payment", args.port, routes).await
        }

        Command::Shipping(args) => {
            health.set_serving::<ShippingServiceServer<ShippingServiceImpl>>().await;
            let service = ShippingServiceImpl::new(
                QuoteCalculator::new(args.base_fee_cents, args.per_item_fee_cents),
                Arc::new(RandomTrackingIds),
                wiring.rpc("shipping"),
            );
            let routes = Routes::new(health_service).add_service(ShippingServiceServer::new(service));
            services::serve("shipping", args.port, routes).await
        }

        Command::Email(args) => {
            health.set_serving::<EmailServiceServer<EmailServiceImpl>>().await;
            let service = EmailServiceImpl::new(wiring.rpc("email"));
            let routes = Routes::new(health_service).add_service(EmailServiceServer::new(service));
            services::serve("email", args.port, routes).await
        }

        Command::Checkout(args) => {
            let downstream = CheckoutDownstreams {
                cart: CartClient::new(wiring.upstream("cart", &args.cart_addr)?),
                catalog: CatalogClient::new(
                    wiring.upstream("productcatalog", &args.product_catalog_addr)?,
                ),
                currency: CurrencyClient::new(wiring.upstream("currency", &args.currency_addr)?),
                shipping: ShippingClient::new(wiring.upstream("shipping", &args.shipping_addr)?),
                payment: PaymentClient::new(wiring.upstream("payment", &args.payment_addr)?),
                email: EmailClient::new(wiring.upstream("email", &args.email_addr)?),
            };

            health.set_serving::<CheckoutServiceServer<CheckoutServiceImpl>>().await;
            let service =
                CheckoutServiceImpl::new(downstream, Arc::new(UuidOrderIds), wiring.rpc("checkout"));
            let routes = Routes::new(health_service).add_service(CheckoutServiceServer::new(service));
            services::serve("checkout", args.port, routes).await
        }

        Command::Recommendation(args) => {
            let catalog =
                CatalogClient::new(wiring.upstream("productcatalog", &args.product_catalog_addr)?);

            health
                .set_serving::<RecommendationServiceServer<RecommendationServiceImpl>>()
                .await;
            let service = RecommendationServiceImpl::new(
                catalog,
                Arc::new(RandomRecommender),
                wiring.rpc("recommendation"),
            );
            let routes =
                Routes::new(health_service).add_service(RecommendationServiceServer::new(service));
            services::serve("recommendation", args.port, routes).await
        }

        Command::Ad(args) => {
            health.set_serving::<AdServiceServer<AdServiceImpl>>().await;
            let service =
                AdServiceImpl::new(Arc::new(CategoryAdSelector::default()), wiring.rpc("ad"));
            let routes = Routes::new(health_service).add_service(AdServiceServer::new(service));
            services::serve("ad", args.port, routes).await
        }
    }
}
