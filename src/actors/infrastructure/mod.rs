// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// - catalog reload control (messages + Unix signal adapter)
// - upstream health monitoring for the frontend
//
// ============================================================================

mod catalog_reloader;
mod health_monitor;

#[cfg(unix)]
pub use catalog_reloader::forward_reload_signals;
pub use catalog_reloader::CatalogReloader;
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, UpstreamProbe};
