// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Everything here is transport-agnostic: the gRPC services in `services` and
// the HTTP frontend only adapt requests onto these types.
//
// - money, currency      - fixed-point arithmetic and pivot conversion
// - catalog              - snapshot store with hot reload
// - cart                 - per-user line items over a pluggable store
// - shipping, payment    - quotes, tracking IDs, card validation
// - checkout             - order totals and order IDs
// - recommendation, ads  - random strategies behind traits
// - email                - order confirmation rendering
//
// ============================================================================

pub mod ads;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod currency;
pub mod email;
pub mod errors;
pub mod money;
pub mod payment;
pub mod recommendation;
pub mod shipping;

pub use errors::ServiceError;
pub use money::{Money, MoneyError};
