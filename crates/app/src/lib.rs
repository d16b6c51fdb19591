//! Ombaro booking sessions: order fulfillment timers, collaborator seams for
//! identity and payment, configuration and logging.

pub mod clock;
pub mod config;
pub mod context;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod payments;
pub mod session;
pub mod shutdown;

#[cfg(test)]
mod test;
