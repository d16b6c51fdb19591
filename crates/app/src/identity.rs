//! Identity Verification
//!
//! The checkout only consumes the outcome of verification. How the check is
//! performed (OTP, document upload) belongs to the verifier implementation.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::session::SessionId;

/// Identity verification errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The verification service could not be reached.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// The verification service did not answer in time.
    #[error("identity verification timed out")]
    Timeout,
}

/// Identity verification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// Requesting session
    pub session: SessionId,

    /// Customer name
    pub name: String,

    /// Customer phone number
    pub phone: String,
}

/// Verification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The customer is verified.
    Verified,

    /// The customer could not be verified.
    NotVerified,

    /// The check has not finished yet.
    Pending,
}

impl Verification {
    /// Whether the outcome allows checkout to proceed.
    pub fn is_verified(self) -> bool {
        self == Verification::Verified
    }
}

/// External identity verification service
#[automock]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify the customer behind a session.
    async fn verify(&self, request: VerificationRequest) -> Result<Verification, IdentityError>;
}

/// Stand-in verifier for demonstrations: accepts any phone number with at
/// least ten digits after a short delay.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedIdentityVerifier {
    latency: Duration,
}

impl SimulatedIdentityVerifier {
    /// Create a verifier that answers after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IdentityVerifier for SimulatedIdentityVerifier {
    async fn verify(&self, request: VerificationRequest) -> Result<Verification, IdentityError> {
        tokio::time::sleep(self.latency).await;

        let digits = request.phone.chars().filter(char::is_ascii_digit).count();

        if digits >= 10 {
            Ok(Verification::Verified)
        } else {
            Ok(Verification::NotVerified)
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn request(phone: &str) -> VerificationRequest {
        VerificationRequest {
            session: SessionId::now_v7(),
            name: "Meera Patel".to_string(),
            phone: phone.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_verifier_accepts_full_phone_numbers() -> TestResult {
        let verifier = SimulatedIdentityVerifier::new(Duration::from_millis(800));

        let outcome = verifier.verify(request("+91 98450 12345")).await?;

        assert!(outcome.is_verified());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_verifier_rejects_short_numbers() -> TestResult {
        let verifier = SimulatedIdentityVerifier::new(Duration::from_millis(800));

        let outcome = verifier.verify(request("12345")).await?;

        assert_eq!(outcome, Verification::NotVerified);

        Ok(())
    }
}
