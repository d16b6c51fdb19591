//! Lifecycle Config

use std::time::Duration;

use clap::Args;

/// Delays between automatic fulfillment steps.
///
/// Each delay is measured from the moment the previous status was entered.
/// The defaults place the professional's assignment, departure and arrival
/// 2s, 5s and 15s after the order is confirmed.
#[derive(Debug, Clone, Args)]
pub struct LifecycleConfig {
    /// Delay before a professional is assigned, in milliseconds
    #[arg(long, env = "ASSIGN_AFTER_MS", default_value_t = 2_000)]
    pub assign_after_ms: u64,

    /// Delay between assignment and departure, in milliseconds
    #[arg(long, env = "DEPART_AFTER_MS", default_value_t = 3_000)]
    pub depart_after_ms: u64,

    /// Delay between departure and arrival, in milliseconds
    #[arg(long, env = "ARRIVE_AFTER_MS", default_value_t = 10_000)]
    pub arrive_after_ms: u64,

    /// Arrival estimate announced on departure, in minutes
    #[arg(long, env = "EN_ROUTE_ETA_MINUTES", default_value_t = 15)]
    pub en_route_eta_minutes: u32,

    /// Also start and complete the service on timers
    #[arg(long, env = "AUTO_SERVICE", default_value_t = false)]
    pub auto_service: bool,

    /// Delay between arrival and service start, in milliseconds
    #[arg(long, env = "START_AFTER_MS", default_value_t = 5_000)]
    pub start_after_ms: u64,

    /// Delay between service start and completion, in milliseconds
    #[arg(long, env = "COMPLETE_AFTER_MS", default_value_t = 30_000)]
    pub complete_after_ms: u64,
}

impl LifecycleConfig {
    /// Delay before assignment.
    pub fn assign_after(&self) -> Duration {
        Duration::from_millis(self.assign_after_ms)
    }

    /// Delay before departure.
    pub fn depart_after(&self) -> Duration {
        Duration::from_millis(self.depart_after_ms)
    }

    /// Delay before arrival.
    pub fn arrive_after(&self) -> Duration {
        Duration::from_millis(self.arrive_after_ms)
    }

    /// Delay before service start, when automatic.
    pub fn start_after(&self) -> Option<Duration> {
        self.auto_service
            .then(|| Duration::from_millis(self.start_after_ms))
    }

    /// Delay before service completion, when automatic.
    pub fn complete_after(&self) -> Option<Duration> {
        self.auto_service
            .then(|| Duration::from_millis(self.complete_after_ms))
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            assign_after_ms: 2_000,
            depart_after_ms: 3_000,
            arrive_after_ms: 10_000,
            en_route_eta_minutes: 15,
            auto_service: false,
            start_after_ms: 5_000,
            complete_after_ms: 30_000,
        }
    }
}
