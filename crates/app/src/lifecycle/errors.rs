//! Lifecycle Errors

use ombaro::orders::{OrderId, TransitionError};
use thiserror::Error;

/// Errors returned by [`OrderLifecycle`](super::OrderLifecycle).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// No order with this id was placed.
    #[error("order {0} not found")]
    UnknownOrder(OrderId),

    /// The order rejected the requested change.
    #[error("order {order}: {source}")]
    Transition {
        /// Order id
        order: OrderId,

        /// Rejection reason
        #[source]
        source: TransitionError,
    },
}
