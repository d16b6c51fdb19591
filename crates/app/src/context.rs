//! App Context

use std::{fmt, sync::Arc, time::Duration};

use ombaro::{catalog::Catalog, catalog::CatalogError, pricing::PricingConfig};
use rusty_money::iso::Currency;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};

use crate::{
    clock::{Clock, SystemClock},
    config::{AppConfig, ConfigError},
    identity::{IdentityVerifier, SimulatedIdentityVerifier},
    lifecycle::OrderLifecycle,
    payments::{PaymentProcessor, SimulatedPaymentProcessor},
    session::BookingSession,
};

const SIMULATED_IDENTITY_LATENCY: Duration = Duration::from_millis(800);
const SIMULATED_PAYMENT_LATENCY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load catalog")]
    Catalog(#[source] CatalogError),

    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("order timers need a tokio runtime")]
    Runtime(#[source] TryCurrentError),

    #[error("configured currency {configured} does not match catalog currency {catalog}")]
    CurrencyMismatch {
        configured: &'static str,
        catalog: &'static str,
    },
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<Catalog>,
    pub pricing: PricingConfig,
    pub currency: &'static Currency,
    pub lifecycle: OrderLifecycle,
    pub identity: Arc<dyn IdentityVerifier>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("services", &self.catalog.service_count())
            .field("providers", &self.catalog.provider_count())
            .field("pricing", &self.pricing)
            .field("currency", &self.currency.iso_alpha_code)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from configuration, wired to the system
    /// clock and the simulated identity and payment services.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be loaded, the checkout
    /// configuration is invalid, the two disagree on currency, or there is no
    /// tokio runtime to drive order timers.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let catalog = Catalog::load(&config.catalog.catalog_path).map_err(AppInitError::Catalog)?;
        let currency = config.checkout.currency()?;

        if currency != catalog.currency() {
            return Err(AppInitError::CurrencyMismatch {
                configured: currency.iso_alpha_code,
                catalog: catalog.currency().iso_alpha_code,
            });
        }

        let runtime = Handle::try_current().map_err(AppInitError::Runtime)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self {
            catalog: Arc::new(catalog),
            pricing: config.checkout.pricing(),
            currency,
            lifecycle: OrderLifecycle::new(config.lifecycle.clone(), Arc::clone(&clock), runtime),
            identity: Arc::new(SimulatedIdentityVerifier::new(SIMULATED_IDENTITY_LATENCY)),
            payments: Arc::new(SimulatedPaymentProcessor::new(SIMULATED_PAYMENT_LATENCY)),
            clock,
        })
    }

    /// Start a new booking session with an empty cart and draft.
    pub fn session(&self) -> BookingSession {
        BookingSession::new(self)
    }
}
