//! Session Errors

use ombaro::{catalog::ProviderId, checkout::CheckoutError, pricing::PricingError};
use thiserror::Error;

use crate::{identity::IdentityError, lifecycle::LifecycleError, payments::PaymentError};

/// Errors returned by [`BookingSession`](super::BookingSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The checkout gate refused the request.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The payment preview could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The identity service failed.
    #[error("identity verification failed: {0}")]
    Identity(#[from] IdentityError),

    /// The payment processor failed.
    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// The payment was refused.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// The payment has not settled yet.
    #[error("payment is still pending")]
    PaymentPending,

    /// The order lifecycle refused the request.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// There is no order to act on.
    #[error("no active order in this session")]
    NoActiveOrder,

    /// A reassignment named a provider missing from the catalog.
    #[error("unknown provider: {0}")]
    UnknownProvider(ProviderId),

    /// A reassignment named a provider that is not taking bookings.
    #[error("provider {0} is not available")]
    ProviderUnavailable(ProviderId),
}

impl SessionError {
    /// Whether retrying the same request may succeed without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Identity(_)
                | SessionError::Payment(_)
                | SessionError::PaymentDeclined(_)
                | SessionError::PaymentPending
        )
    }
}
