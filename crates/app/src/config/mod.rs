//! Application configuration

use clap::Args;

pub mod catalog;
pub mod checkout;
pub mod lifecycle;
pub mod observability;

pub use catalog::CatalogConfig;
pub use checkout::{CheckoutConfig, ConfigError};
pub use lifecycle::LifecycleConfig;
pub use observability::{LogFormat, LoggingConfig};

/// Ombaro configuration, read from CLI arguments and the environment
#[derive(Debug, Clone, Default, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Catalog source settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// Service fee, tax and currency settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Order fulfillment timer settings.
    #[command(flatten)]
    pub lifecycle: LifecycleConfig,
}
