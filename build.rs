// ============================================================================
// gRPC stub generation
// ============================================================================
//
// Messages are declared by hand as prost structs in `src/proto/messages.rs`,
// so no `.proto` files or `protoc` are needed. Only the service plumbing
// (server traits + clients) is generated here.
//
// ============================================================================

use tonic_build::manual::{Builder, Method, Service};

const PACKAGE: &str = "hipstershop";
const CODEC: &str = "tonic_prost::ProstCodec";

fn method(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path(CODEC)
        .build()
}

fn main() {
    let services = [
        Service::builder()
            .name("CartService")
            .package(PACKAGE)
            .method(method("add_item", "AddItem", "AddItemRequest", "Empty"))
            .method(method("get_cart", "GetCart", "GetCartRequest", "Cart"))
            .method(method("empty_cart", "EmptyCart", "EmptyCartRequest", "Empty"))
            .build(),
        Service::builder()
            .name("ProductCatalogService")
            .package(PACKAGE)
            .method(method("list_products", "ListProducts", "Empty", "ListProductsResponse"))
            .method(method("get_product", "GetProduct", "GetProductRequest", "Product"))
            .method(method(
                "search_products",
                "SearchProducts",
                "SearchProductsRequest",
                "SearchProductsResponse",
            ))
            .build(),
        Service::builder()
            .name("CurrencyService")
            .package(PACKAGE)
            .method(method(
                "get_supported_currencies",
                "GetSupportedCurrencies",
                "Empty",
                "GetSupportedCurrenciesResponse",
            ))
            .method(method("convert", "Convert", "CurrencyConversionRequest", "Money"))
            .build(),
        Service::builder()
            .name("PaymentService")
            .package(PACKAGE)
            .method(method("charge", "Charge", "ChargeRequest", "ChargeResponse"))
            .build(),
        Service::builder()
            .name("ShippingService")
            .package(PACKAGE)
            .method(method("get_quote", "GetQuote", "GetQuoteRequest", "GetQuoteResponse"))
            .method(method("ship_order", "ShipOrder", "ShipOrderRequest", "ShipOrderResponse"))
            .build(),
        Service::builder()
            .name("EmailService")
            .package(PACKAGE)
            .method(method(
                "send_order_confirmation",
                "SendOrderConfirmation",
                "SendOrderConfirmationRequest",
                "Empty",
            ))
            .build(),
        Service::builder()
            .name("CheckoutService")
            .package(PACKAGE)
            .method(method("place_order", "PlaceOrder", "PlaceOrderRequest", "PlaceOrderResponse"))
            .build(),
        Service::builder()
            .name("RecommendationService")
            .package(PACKAGE)
            .method(method(
                "list_recommendations",
                "ListRecommendations",
                "ListRecommendationsRequest",
                "ListRecommendationsResponse",
            ))
            .build(),
        Service::builder()
            .name("AdService")
            .package(PACKAGE)
            .method(method("get_ads", "GetAds", "AdRequest", "AdResponse"))
            .build(),
    ];

    Builder::new().compile(&services);
}
