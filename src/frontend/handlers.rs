use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::future::try_join_all;
use rand::seq::SliceRandom;
use serde::Deserialize;

use super::render::{self, CartLine, Page, PricedProduct};
use super::session::{long_lived, Session, COOKIE_CURRENCY};
use super::validator::{AddToCartForm, PlaceOrderForm};
use super::{is_whitelisted, Frontend, AD_TIMEOUT, MAX_RECOMMENDATIONS_SHOWN};
use crate::actors::GetSystemHealth;
use crate::clients::PlaceOrder;
use crate::domain::checkout::compute_total;
use crate::domain::ServiceError;
use crate::models::{cart_size, Ad, CartItem, OrderItem, Product};

// ============================================================================
// Page Helpers
// ============================================================================

impl Frontend {
    async fn currencies(&self) -> Result<Vec<String>, ServiceError> {
        let supported = self.currency.supported_currencies().await?;
        Ok(supported.into_iter().filter(|c| is_whitelisted(c)).collect())
    }

    async fn price(&self, product: Product, currency: &str) -> Result<PricedProduct, ServiceError> {
        let price = self.currency.convert(&product.price_usd, currency).await?;
        Ok(PricedProduct { product, price })
    }

    async fn price_all(
        &self,
        products: Vec<Product>,
        currency: &str,
    ) -> Result<Vec<PricedProduct>, ServiceError> {
        try_join_all(products.into_iter().map(|p| self.price(p, currency))).await
    }

    async fn cart_line(&self, item: &CartItem, currency: &str) -> Result<CartLine, ServiceError> {
        let product = self.catalog.get_product(&item.product_id).await?;
        let price = self.currency.convert(&product.price_usd, currency).await?;
        Ok(CartLine {
            product,
            quantity: item.quantity,
            price,
        })
    }

    /// Never fails the page: an empty list stands in for any upstream error.
    async fn recommendations(&self, user_id: &str, product_ids: &[String]) -> Vec<Product> {
        let ids = match self
            .recommendation
            .list_recommendations(user_id, product_ids)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to get recommendations");
                return Vec::new();
            }
        };

        let lookups = ids
            .iter()
            .take(MAX_RECOMMENDATIONS_SHOWN)
            .map(|id| self.catalog.get_product(id));
        match try_join_all(lookups).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve recommended products");
                Vec::new()
            }
        }
    }

    /// One random ad for the given context, or none if the ad service is slow
    /// or failing.
    async fn choose_ad(&self, context_keys: &[String]) -> Option<Ad> {
        match tokio::time::timeout(AD_TIMEOUT, self.ad.get_ads(context_keys)).await {
            Ok(Ok(ads)) => {
                let mut rng = rand::thread_rng();
                ads.choose(&mut rng).cloned()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to retrieve ads");
                None
            }
            Err(_) => {
                tracing::warn!(timeout_ms = AD_TIMEOUT.as_millis() as u64, "Ad request timed out");
                None
            }
        }
    }
}

fn page<'a>(
    title: &'a str,
    session: &'a Session,
    currencies: &'a [String],
    cart_size: i64,
) -> Page<'a> {
    Page {
        title,
        session_id: session.session_id(),
        currency: session.currency(),
        currencies,
        cart_size,
    }
}

fn html(session: &Session, body: String) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    session.attach(&mut response);
    response.content_type("text/html; charset=utf-8").body(body)
}

fn redirect(session: &Session, location: &str) -> HttpResponse {
    let mut response = HttpResponse::Found();
    session.attach(&mut response);
    response
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// A catalog `NotFound` is the shopper's mistake, not an outage.
fn missing_product(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::UpstreamUnavailable { status, .. }
            if status.code() == tonic::Code::NotFound =>
        {
            ServiceError::NotFound(status.message().to_string())
        }
        other => other,
    }
}

// ============================================================================
// Routes
// ============================================================================

#[tracing::instrument(skip_all, fields(session_id = %session.session_id()))]
pub async fn home(
    state: web::Data<Frontend>,
    session: Session,
) -> Result<HttpResponse, ServiceError> {
    let user_id = session.user_id(None);
    let (currencies, products, cart) = tokio::try_join!(
        state.currencies(),
        state.catalog.list_products(),
        state.cart.get_cart(&user_id),
    )?;

    let products = state.price_all(products, session.currency()).await?;
    let ad = state.choose_ad(&[]).await;

    let page = page("Home", &session, &currencies, cart_size(&cart));
    Ok(html(&session, render::home(&page, &products, ad.as_ref())))
}

#[tracing::instrument(
    skip_all,
    fields(session_id = %session.session_id(), product_id = %path.as_str())
)]
pub async fn product(
    state: web::Data<Frontend>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let user_id = session.user_id(None);

    let product = state.catalog.get_product(&id).await.map_err(missing_product)?;
    let categories = product.categories.clone();

    let (currencies, cart, priced) = tokio::try_join!(
        state.currencies(),
        state.cart.get_cart(&user_id),
        state.price(product, session.currency()),
    )?;
    let (recommendations, ad) = tokio::join!(
        state.recommendations(&user_id, std::slice::from_ref(&id)),
        state.choose_ad(&categories),
    );

    let title = priced.product.name.clone();
    let page = page(&title, &session, &currencies, cart_size(&cart));
    Ok(html(
        &session,
        render::product(&page, &priced, &recommendations, ad.as_ref()),
    ))
}

#[tracing::instrument(skip_all, fields(session_id = %session.session_id()))]
pub async fn view_cart(
    state: web::Data<Frontend>,
    session: Session,
) -> Result<HttpResponse, ServiceError> {
    let user_id = session.user_id(None);
    let currency = session.currency();
    let (currencies, items) = tokio::try_join!(state.currencies(), state.cart.get_cart(&user_id))?;

    let lines = try_join_all(items.iter().map(|item| state.cart_line(item, currency))).await?;
    let quote = state.shipping.get_quote(None, &items).await?;
    let shipping = state.currency.convert(&quote, currency).await?;

    let priced_items: Vec<OrderItem> = items
        .iter()
        .zip(&lines)
        .map(|(item, line)| OrderItem {
            item: item.clone(),
            cost: line.price.clone(),
        })
        .collect();
    let total = compute_total(&shipping, &priced_items)?;

    let product_ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
    let recommendations = state.recommendations(&user_id, &product_ids).await;

    let page = page("Shopping Cart", &session, &currencies, cart_size(&items));
    Ok(html(
        &session,
        render::cart(&page, &lines, &shipping, &total, &recommendations),
    ))
}

#[tracing::instrument(skip_all, fields(session_id = %session.session_id()))]
pub async fn add_to_cart(
    state: web::Data<Frontend>,
    session: Session,
    form: web::Form<AddToCartForm>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.into_inner();
    let user_id = session.user_id(form.user_id.as_deref());
    let add = form.validate()?;

    state
        .catalog
        .get_product(&add.product_id)
        .await
        .map_err(missing_product)?;
    state
        .cart
        .add_item(&user_id, &CartItem::new(add.product_id.clone(), add.quantity as i32))
        .await?;

    tracing::info!(
        user_id = %user_id,
        product_id = %add.product_id,
        quantity = add.quantity,
        "🛒 Added to cart"
    );
    Ok(redirect(&session, "/cart"))
}

#[tracing::instrument(skip_all, fields(session_id = %session.session_id()))]
pub async fn empty_cart(
    state: web::Data<Frontend>,
    session: Session,
) -> Result<HttpResponse, ServiceError> {
    let user_id = session.user_id(None);
    state.cart.empty_cart(&user_id).await?;
    tracing::info!(user_id = %user_id, "Emptied cart");
    Ok(redirect(&session, "/"))
}

#[tracing::instrument(skip_all, fields(session_id = %session.session_id()))]
pub async fn place_order(
    state: web::Data<Frontend>,
    session: Session,
    form: web::Form<PlaceOrderForm>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.into_inner();
    let user_id = session.user_id(form.user_id.as_deref());
    let payload = form.validate(Utc::now().date_naive())?;

    let order = state
        .checkout
        .place_order(&PlaceOrder {
            user_id: user_id.clone(),
            user_currency: session.currency().to_string(),
            address: payload.address,
            email: payload.email,
            credit_card: payload.credit_card,
        })
        .await?;
    tracing::info!(user_id = %user_id, order_id = %order.order_id, "✅ Order placed");

    let (recommendations, currencies) =
        tokio::join!(state.recommendations(&user_id, &[]), state.currencies());
    let currencies = currencies?;
    let total = compute_total(&order.shipping_cost, &order.items)?;

    let page = page("Order Confirmation", &session, &currencies, 0);
    Ok(html(
        &session,
        render::order(&page, &order, &total, &recommendations),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    #[serde(default)]
    currency_code: String,
}

pub async fn set_currency(
    req: HttpRequest,
    session: Session,
    form: web::Form<CurrencyForm>,
) -> Result<HttpResponse, ServiceError> {
    let code = form.currency_code.trim();
    if !is_whitelisted(code) {
        return Err(ServiceError::UnsupportedCurrency(code.to_string()));
    }

    let host = req.connection_info().host().to_string();
    let back_to = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map_or("/", |referer| return_path(referer, &host))
        .to_string();

    let mut response = HttpResponse::Found();
    session.attach(&mut response);
    Ok(response
        .cookie(long_lived(COOKIE_CURRENCY, code.to_string()))
        .insert_header((header::LOCATION, back_to))
        .finish())
}

/// Where to send the shopper after a preference change. Only paths on this
/// host are followed; anything else lands on the home page.
fn return_path<'a>(referer: &'a str, host: &str) -> &'a str {
    let path = ["http://", "https://"]
        .iter()
        .find_map(|scheme| referer.strip_prefix(scheme)?.strip_prefix(host))
        .unwrap_or(referer);

    if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") {
        path
    } else {
        "/"
    }
}

/// Upstream health as JSON; 503 only when some upstream is unhealthy.
pub async fn healthz(state: web::Data<Frontend>) -> HttpResponse {
    let health = match state.health.ask(GetSystemHealth).await {
        Ok(health) => health,
        Err(e) => {
            tracing::error!(error = %e, "Health monitor unreachable");
            return HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "detail": "health monitor unreachable",
            }));
        }
    };

    let components: serde_json::Map<String, serde_json::Value> = health
        .components
        .iter()
        .map(|(name, component)| (name.clone(), component.to_json()))
        .collect();
    let body = serde_json::json!({
        "status": health.overall_status.label(),
        "detail": health.overall_status.detail(),
        "components": components,
        "check_time": health.check_time.to_rfc3339(),
    });

    if health.overall_status.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::body::MessageBody;
    use actix_web::cookie::Cookie;
    use actix_web::dev::ServiceResponse;
    use actix_web::{test, App};
    use chrono::Datelike;
    use kameo::prelude::*;

    use super::*;
    use crate::actors::HealthMonitorActor;
    use crate::clients::{
        AdClient, CartClient, CatalogClient, CheckoutClient, CurrencyClient, EmailClient,
        PaymentClient, RecommendationClient, ShippingClient, Upstream,
    };
    use crate::domain::cart::CartRepository;
    use crate::domain::checkout::UuidOrderIds;
    use crate::frontend::configure;
    use crate::frontend::session::COOKIE_SESSION_ID;
    use crate::proto::{self as pb, AdService, AdServiceServer, CheckoutServiceServer};
    use crate::services::{testing, CheckoutDownstreams, CheckoutServiceImpl, RpcObserver};
    use std::sync::Arc;
    use tonic::service::Routes;
    use tonic::{Request, Response, Status};

    /// Answers correctly, but only after the frontend has stopped waiting.
    struct SlowAds;

    #[tonic::async_trait]
    impl AdService for SlowAds {
        async fn get_ads(
            &self,
            _request: Request<pb::AdRequest>,
        ) -> Result<Response<pb::AdResponse>, Status> {
            tokio::time::sleep(AD_TIMEOUT * 5).await;
            Ok(Response::new(pb::AdResponse {
                ads: vec![pb::Ad {
                    redirect_url: "/product/OLJCESPC7Z".into(),
                    text: "Too late to show".into(),
                }],
            }))
        }
    }

    fn order_form() -> Vec<(&'static str, String)> {
        let year = (Utc::now().year() + 1).to_string();
        [
            ("email", "someone@example.com"),
            ("street_address", "1600 Amphitheatre Parkway"),
            ("zip_code", "94043"),
            ("city", "Mountain View"),
            ("state", "CA"),
            ("country", "United States"),
            ("credit_card_number", "4432-8015-6152-0454"),
            ("credit_card_expiration_month", "1"),
            ("credit_card_expiration_year", year.as_str()),
            ("credit_card_cvv", "672"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    async fn body_of<B: MessageBody>(resp: ServiceResponse<B>) -> String {
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    async fn frontend() -> (Frontend, Arc<CartRepository>) {
        frontend_on(testing::backends().await).await
    }

    async fn frontend_on(b: testing::Backends) -> (Frontend, Arc<CartRepository>) {
        let up = Upstream::from_channel;

        let checkout = CheckoutServiceImpl::new(
            CheckoutDownstreams {
                cart: CartClient::new(up("cart", b.cart.clone())),
                catalog: CatalogClient::new(up("productcatalog", b.catalog.clone())),
                currency: CurrencyClient::new(up("currency", b.currency.clone())),
                shipping: ShippingClient::new(up("shipping", b.shipping.clone())),
                payment: PaymentClient::new(up("payment", b.payment)),
                email: EmailClient::new(up("email", b.email)),
            },
            Arc::new(UuidOrderIds),
            RpcObserver::new("checkout"),
        );
        let checkout = testing::spawn(Routes::new(CheckoutServiceServer::new(checkout))).await;

        let health = HealthMonitorActor::spawn(HealthMonitorActor::new(
            vec![],
            Duration::from_secs(3600),
        ));

        let frontend = Frontend {
            catalog: CatalogClient::new(up("productcatalog", b.catalog)),
            currency: CurrencyClient::new(up("currency", b.currency)),
            cart: CartClient::new(up("cart", b.cart)),
            recommendation: RecommendationClient::new(up("recommendation", b.recommendation)),
            checkout: CheckoutClient::new(up("checkout", checkout)),
            shipping: ShippingClient::new(up("shipping", b.shipping)),
            ad: AdClient::new(up("ad", b.ad)),
            health,
        };
        (frontend, b.cart_repo)
    }

    #[actix_web::test]
    async fn test_home_sets_session_and_converts_prices() {
        let (state, _) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .cookie(Cookie::new(COOKIE_CURRENCY, "EUR"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(resp
            .response()
            .cookies()
            .any(|c| c.name() == COOKIE_SESSION_ID));

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Loafers"));
        assert!(body.contains("€"));
        assert!(body.contains("<option value=\"EUR\" selected>"));
    }

    #[actix_web::test]
    async fn test_add_to_cart_then_view() {
        let (state, repo) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/cart")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-1"))
            .set_form([("product_id", "OLJCESPC7Z"), ("quantity", "2")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 302);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/cart");

        let cart = repo.get_cart("shopper-1").await.unwrap();
        assert_eq!(cart, vec![CartItem::new("OLJCESPC7Z", 2)]);

        let req = test::TestRequest::get()
            .uri("/cart")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Quantity: 2"));
        // 8.99 + 19.99 * 2
        assert!(body.contains("$48.97"));
    }

    #[actix_web::test]
    async fn test_add_to_cart_rejects_bad_input() {
        let (state, repo) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/cart")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-2"))
            .set_form([("product_id", "OLJCESPC7Z"), ("quantity", "11")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 422);

        let req = test::TestRequest::post()
            .uri("/cart")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-2"))
            .set_form([("product_id", "nonexistent"), ("quantity", "1")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);

        assert!(repo.get_cart("shopper-2").await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_checkout_renders_confirmation_and_empties_cart() {
        let (state, repo) = frontend().await;
        repo.add_item("shopper-3", CartItem::new("66VCHSJNUP", 1))
            .await
            .unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/cart/checkout")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-3"))
            .set_form(order_form())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Your order is complete!"));
        // 8.99 + 18.99
        assert!(body.contains("$27.98"));
        assert!(repo.get_cart("shopper-3").await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_set_currency() {
        let (state, _) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/setCurrency")
            .insert_header((header::REFERER, "/cart"))
            .set_form([("currency_code", "JPY")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 302);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/cart");
        let currency = resp
            .response()
            .cookies()
            .find(|c| c.name() == COOKIE_CURRENCY)
            .map(|c| c.value().to_string());
        assert_eq!(currency.as_deref(), Some("JPY"));

        let req = test::TestRequest::post()
            .uri("/setCurrency")
            .set_form([("currency_code", "CHF")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 422);
    }

    #[actix_web::test]
    async fn test_healthz_without_probes_is_healthy() {
        let (state, _) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/_healthz").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_set_currency_never_leaves_the_site() {
        let (state, _) = frontend().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let cases = [
            ("http://localhost:8080/product/OLJCESPC7Z", "/product/OLJCESPC7Z"),
            ("https://evil.example/phish", "/"),
            ("//evil.example/phish", "/"),
            ("http://localhost:8080.evil.example/", "/"),
            ("javascript:alert(1)", "/"),
        ];
        for (referer, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/setCurrency")
                .insert_header((header::HOST, "localhost:8080"))
                .insert_header((header::REFERER, referer))
                .set_form([("currency_code", "EUR")])
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), 302);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), expected, "{referer}");
        }
    }

    #[::core::prelude::v1::test]
    fn test_return_path() {
        assert_eq!(return_path("/cart", "shop"), "/cart");
        assert_eq!(return_path("https://shop/cart?x=1", "shop"), "/cart?x=1");
        assert_eq!(return_path("https://shop", "shop"), "/");
        assert_eq!(return_path("/\\evil.example", "shop"), "/");
        assert_eq!(return_path("cart", "shop"), "/");
    }

    #[actix_web::test]
    async fn test_pages_survive_failing_ads_and_recommendations() {
        let mut backends = testing::backends().await;
        backends.ad = testing::unreachable();
        backends.recommendation = testing::unreachable();
        let (state, repo) = frontend_on(backends).await;
        repo.add_item("shopper-4", CartItem::new("OLJCESPC7Z", 1))
            .await
            .unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(!body_of(resp).await.contains("class=\"ad\""));

        let req = test::TestRequest::get()
            .uri("/product/OLJCESPC7Z")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-4"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body = body_of(resp).await;
        assert!(!body.contains("class=\"ad\""));
        assert!(!body.contains("You May Also Like"));

        let req = test::TestRequest::get()
            .uri("/cart")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-4"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(!body_of(resp).await.contains("You May Also Like"));

        let req = test::TestRequest::post()
            .uri("/cart/checkout")
            .cookie(Cookie::new(COOKIE_SESSION_ID, "shopper-4"))
            .set_form(order_form())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(body_of(resp).await.contains("Your order is complete!"));
    }

    #[actix_web::test]
    async fn test_slow_ad_service_is_not_waited_for() {
        let mut backends = testing::backends().await;
        backends.ad = testing::spawn(Routes::new(AdServiceServer::new(SlowAds))).await;
        let (state, _) = frontend_on(backends).await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(configure),
        )
        .await;

        let started = std::time::Instant::now();
        let req = test::TestRequest::get().uri("/product/OLJCESPC7Z").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        assert!(started.elapsed() < AD_TIMEOUT * 5);

        let body = body_of(resp).await;
        assert!(!body.contains("Too late to show"));
        assert!(!body.contains("class=\"ad\""));
    }
}
