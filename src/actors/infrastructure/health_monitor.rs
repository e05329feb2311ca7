use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::reply::{Reply, ReplyError};
use kameo::Actor;
use tonic::transport::Channel;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

use crate::actors::core::{ComponentHealth, HealthStatus};
use crate::utils::{CircuitBreaker, CircuitState};

// ============================================================================
// Health Monitor Actor - upstream health for the frontend
// ============================================================================
//
// Periodically probes every upstream service:
// - an open circuit breaker marks it unhealthy without a network call
// - otherwise the standard gRPC health check decides
//
// The latest results back the frontend's /_healthz route.
//
// ============================================================================

const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug)]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
}

#[derive(Debug)]
pub struct GetSystemHealth;

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: chrono::DateTime<Utc>,
}

// Implement Reply for SystemHealth to use it as a message reply type
impl Reply for SystemHealth {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

// ============================================================================
// Upstream Probes
// ============================================================================

#[derive(Clone)]
pub struct UpstreamProbe {
    pub name: &'static str,
    pub channel: Channel,
    pub breaker: Option<CircuitBreaker>,
}

impl UpstreamProbe {
    async fn check(&self) -> HealthStatus {
        if let Some(breaker) = &self.breaker {
            match breaker.state().await {
                CircuitState::Open => {
                    return HealthStatus::Unhealthy("circuit breaker open".to_string());
                }
                CircuitState::HalfOpen => {
                    return HealthStatus::Degraded("circuit breaker half-open".to_string());
                }
                CircuitState::Closed => {}
            }
        }

        let mut client = HealthClient::new(self.channel.clone());
        let request = HealthCheckRequest { service: String::new() };

        match tokio::time::timeout(PROBE_TIMEOUT, client.check(request)).await {
            Ok(Ok(response)) if response.get_ref().status == ServingStatus::Serving as i32 => {
                HealthStatus::Healthy
            }
            Ok(Ok(response)) => HealthStatus::Unhealthy(format!(
                "serving status {}",
                response.get_ref().status
            )),
            Ok(Err(status)) => HealthStatus::Unhealthy(format!(
                "{:?}: {}",
                status.code(),
                status.message()
            )),
            Err(_) => HealthStatus::Unhealthy("health check timed out".to_string()),
        }
    }
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    probes: Vec<UpstreamProbe>,
    interval: Duration,
}

impl HealthMonitorActor {
    pub fn new(probes: Vec<UpstreamProbe>, interval: Duration) -> Self {
        Self {
            components: HashMap::new(),
            probes,
            interval,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        unhealthy_components.sort();
        if !unhealthy_components.is_empty() {
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some upstreams degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Actor for HealthMonitorActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(upstreams = state.probes.len(), "HealthMonitorActor started");

        let probes = state.probes.clone();
        let period = state.interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;

                for probe in &probes {
                    let status = probe.check().await;

                    // Fire and forget - use tell
                    let sent = actor_ref
                        .tell(UpdateHealth {
                            component: probe.name.to_string(),
                            status,
                        })
                        .send()
                        .await;

                    if sent.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<UpdateHealth> for HealthMonitorActor {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: UpdateHealth,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let changed = self
            .components
            .get(&msg.component)
            .map_or(true, |previous| previous.status != msg.status);

        if changed {
            tracing::info!(
                component = %msg.component,
                status = ?msg.status,
                "Upstream health changed"
            );
        }

        self.components.insert(msg.component, ComponentHealth::new(msg.status));
    }
}

impl Message<GetSystemHealth> for HealthMonitorActor {
    type Reply = SystemHealth;

    async fn handle(
        &mut self,
        _msg: GetSystemHealth,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kameo::prelude::*;

    #[tokio::test]
    async fn test_overall_status_aggregates_components() {
        let monitor = HealthMonitorActor::spawn(HealthMonitorActor::new(
            vec![],
            Duration::from_secs(3600),
        ));

        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert_eq!(health.overall_status, HealthStatus::Healthy);

        monitor
            .tell(UpdateHealth {
                component: "cart".into(),
                status: HealthStatus::Degraded("circuit breaker half-open".into()),
            })
            .send()
            .await
            .unwrap();
        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert!(matches!(health.overall_status, HealthStatus::Degraded(_)));

        monitor
            .tell(UpdateHealth {
                component: "currency".into(),
                status: HealthStatus::Unhealthy("Unavailable: connection refused".into()),
            })
            .send()
            .await
            .unwrap();
        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert_eq!(
            health.overall_status,
            HealthStatus::Unhealthy("currency: Unavailable: connection refused".into())
        );
        assert_eq!(health.components.len(), 2);
    }

    #[tokio::test]
    async fn test_probe_reports_unreachable_upstream() {
        // Nothing listens on port 1; the lazy channel fails on first use
        let channel = tonic::transport::Endpoint::from_static("http://127.0.0.1:1")
            .connect_timeout(Duration::from_millis(200))
            .connect_lazy();
        let probe = UpstreamProbe {
            name: "ad",
            channel,
            breaker: None,
        };

        assert!(probe.check().await.is_unhealthy());
    }
}
