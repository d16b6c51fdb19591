//! Timer schedule

use std::time::Duration;

use ombaro::orders::{OrderEvent, OrderStatus};

use crate::config::LifecycleConfig;

/// The automatic step armed when an order enters `status`, if any.
pub(crate) fn next_step(
    config: &LifecycleConfig,
    status: OrderStatus,
) -> Option<(Duration, OrderEvent)> {
    match status {
        OrderStatus::Confirmed => Some((config.assign_after(), OrderEvent::AssignTherapist)),
        OrderStatus::TherapistAssigned => Some((
            config.depart_after(),
            OrderEvent::Depart {
                eta_minutes: config.en_route_eta_minutes,
            },
        )),
        OrderStatus::EnRoute => Some((config.arrive_after(), OrderEvent::Arrive)),
        OrderStatus::Arrived => config
            .start_after()
            .map(|delay| (delay, OrderEvent::StartService)),
        OrderStatus::InProgress => config
            .complete_after()
            .map(|delay| (delay, OrderEvent::CompleteService)),
        OrderStatus::Completed | OrderStatus::Cancelled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_stops_at_arrival() {
        let config = LifecycleConfig::default();

        assert_eq!(
            next_step(&config, OrderStatus::Confirmed),
            Some((Duration::from_secs(2), OrderEvent::AssignTherapist))
        );
        assert_eq!(
            next_step(&config, OrderStatus::TherapistAssigned),
            Some((
                Duration::from_secs(3),
                OrderEvent::Depart { eta_minutes: 15 }
            ))
        );
        assert_eq!(
            next_step(&config, OrderStatus::EnRoute),
            Some((Duration::from_secs(10), OrderEvent::Arrive))
        );
        assert_eq!(next_step(&config, OrderStatus::Arrived), None);
        assert_eq!(next_step(&config, OrderStatus::InProgress), None);
    }

    #[test]
    fn auto_service_schedules_control_transitions() {
        let config = LifecycleConfig {
            auto_service: true,
            ..LifecycleConfig::default()
        };

        assert_eq!(
            next_step(&config, OrderStatus::Arrived),
            Some((Duration::from_secs(5), OrderEvent::StartService))
        );
        assert_eq!(
            next_step(&config, OrderStatus::InProgress),
            Some((Duration::from_secs(30), OrderEvent::CompleteService))
        );
        assert_eq!(next_step(&config, OrderStatus::Completed), None);
        assert_eq!(next_step(&config, OrderStatus::Cancelled), None);
    }
}
