//! Ombaro
//!
//! Booking core for at-home and in-spa wellness services: a read-only provider
//! catalog, a multi-provider cart, the checkout readiness gate and the order
//! fulfillment state machine.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod ids;
pub mod orders;
pub mod prelude;
pub mod pricing;
