//! Payments
//!
//! The booking core computes the amount to charge; collecting it is the job
//! of an external [`PaymentProcessor`].

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use ombaro::orders::PaymentMethod;
use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionId;

/// Payment processor errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor could not be reached.
    #[error("payment processor unavailable: {0}")]
    Unavailable(String),

    /// The processor rejected the request as malformed.
    #[error("invalid payment request: {0}")]
    InvalidRequest(String),
}

/// Charge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Paying session
    pub session: SessionId,

    /// Amount in whole currency units
    pub amount: u64,

    /// ISO 4217 currency code
    pub currency: &'static str,

    /// Chosen payment method
    pub method: PaymentMethod,
}

/// Charge outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The payment was captured.
    Succeeded {
        /// Processor reference
        reference: String,
    },

    /// The payment was refused.
    Declined {
        /// Reason given by the processor
        reason: String,
    },

    /// The processor has not settled the payment yet.
    Pending,
}

/// External payment processor
#[automock]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Charge the customer.
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentOutcome, PaymentError>;
}

/// Stand-in processor for demonstrations: captures every non-zero charge
/// after a short delay.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPaymentProcessor {
    latency: Duration,
}

impl SimulatedPaymentProcessor {
    /// Create a processor that answers after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
        if request.amount == 0 {
            return Err(PaymentError::InvalidRequest("amount must be positive".to_string()));
        }

        tokio::time::sleep(self.latency).await;

        Ok(PaymentOutcome::Succeeded {
            reference: format!("{}_{}", request.method, Uuid::now_v7().simple()),
        })
    }
}
