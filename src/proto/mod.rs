// ============================================================================
// Protocol Module - gRPC messages and generated service stubs
// ============================================================================
//
// - messages.rs - prost message structs (package `hipstershop`)
// - convert.rs  - conversions between wire messages and domain models
// - generated   - server traits + clients emitted by build.rs
//
// ============================================================================

mod convert;
mod messages;

pub use convert::required;
pub use messages::*;

include!(concat!(env!("OUT_DIR"), "/hipstershop.CartService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.ProductCatalogService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.CurrencyService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.PaymentService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.ShippingService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.EmailService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.CheckoutService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.RecommendationService.rs"));
include!(concat!(env!("OUT_DIR"), "/hipstershop.AdService.rs"));

pub use ad_service_client::AdServiceClient;
pub use ad_service_server::{AdService, AdServiceServer};
pub use cart_service_client::CartServiceClient;
pub use cart_service_server::{CartService, CartServiceServer};
pub use checkout_service_client::CheckoutServiceClient;
pub use checkout_service_server::{CheckoutService, CheckoutServiceServer};
pub use currency_service_client::CurrencyServiceClient;
pub use currency_service_server::{CurrencyService, CurrencyServiceServer};
pub use email_service_client::EmailServiceClient;
pub use email_service_server::{EmailService, EmailServiceServer};
pub use payment_service_client::PaymentServiceClient;
pub use payment_service_server::{PaymentService, PaymentServiceServer};
pub use product_catalog_service_client::ProductCatalogServiceClient;
pub use product_catalog_service_server::{ProductCatalogService, ProductCatalogServiceServer};
pub use recommendation_service_client::RecommendationServiceClient;
pub use recommendation_service_server::{RecommendationService, RecommendationServiceServer};
pub use shipping_service_client::ShippingServiceClient;
pub use shipping_service_server::{ShippingService, ShippingServiceServer};
