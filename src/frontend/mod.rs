use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use kameo::actor::ActorRef;

use crate::actors::HealthMonitorActor;
use crate::clients::{
    AdClient, CartClient, CatalogClient, CheckoutClient, CurrencyClient, RecommendationClient,
    ShippingClient,
};
use crate::domain::ServiceError;

// ============================================================================
// HTTP Frontend
// ============================================================================
//
// Server-rendered shop pages on top of the gRPC backends. Holds no state of
// its own beyond two cookies (session and currency); every page is assembled
// from upstream calls.
//
// ============================================================================

mod handlers;
mod render;
mod session;
mod validator;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Currencies offered in the selector. Anything else is hidden even if the
/// currency service supports it.
pub const WHITELISTED_CURRENCIES: [&str; 6] = ["USD", "EUR", "CAD", "JPY", "GBP", "TRY"];

pub const AD_TIMEOUT: Duration = Duration::from_millis(100);
pub const MAX_RECOMMENDATIONS_SHOWN: usize = 4;

pub fn is_whitelisted(code: &str) -> bool {
    WHITELISTED_CURRENCIES.contains(&code)
}

/// Upstream clients shared by every request handler.
#[derive(Clone)]
pub struct Frontend {
    pub catalog: CatalogClient,
    pub currency: CurrencyClient,
    pub cart: CartClient,
    pub recommendation: RecommendationClient,
    pub checkout: CheckoutClient,
    pub shipping: ShippingClient,
    pub ad: AdClient,
    pub health: ActorRef<HealthMonitorActor>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::UnsupportedCurrency(_)
            | ServiceError::Money(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::UpstreamUnavailable { .. }
            | ServiceError::Storage(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        tracing::warn!(status = status.as_u16(), kind = self.kind(), error = %self, "Request failed");

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(render::error(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Error"),
                &self.to_string(),
            ))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::home))
        .route("/product/{id}", web::get().to(handlers::product))
        .route("/cart", web::get().to(handlers::view_cart))
        .route("/cart", web::post().to(handlers::add_to_cart))
        .route("/cart/empty", web::post().to(handlers::empty_cart))
        .route("/cart/checkout", web::post().to(handlers::place_order))
        .route("/setCurrency", web::post().to(handlers::set_currency))
        .route("/_healthz", web::get().to(handlers::healthz));
}

/// Serve the shop on `0.0.0.0:port` until the process is stopped.
pub async fn run(frontend: Frontend, port: u16) -> std::io::Result<()> {
    tracing::info!("🛍️ Frontend listening on http://0.0.0.0:{}", port);
    let data = web::Data::new(frontend);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}
