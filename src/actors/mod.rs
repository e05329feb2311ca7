// ============================================================================
// Actors Module
// ============================================================================
//
// Long-lived infrastructure actors (kameo). Request handling never goes
// through an actor; these only own background state.
//
// Structure:
// - core/           - health types shared by the actors
// - infrastructure/ - catalog reload control, upstream health monitoring
//
// ============================================================================

mod core;
mod infrastructure;

#[cfg(unix)]
pub use infrastructure::forward_reload_signals;
pub use infrastructure::{CatalogReloader, GetSystemHealth, HealthMonitorActor, UpstreamProbe};
