//! Checkout Config

use std::str::FromStr;

use clap::Args;
use decimal_percentage::Percentage;
use ombaro::pricing::PricingConfig;
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The tax rate is not a number or a percentage.
    #[error("invalid tax rate: '{0}'")]
    InvalidTaxRate(String),

    /// The tax rate is below zero.
    #[error("tax rate cannot be negative: '{0}'")]
    NegativeTaxRate(String),

    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency code: '{0}'")]
    UnknownCurrency(String),
}

/// Service fee, tax and currency settings.
#[derive(Debug, Clone, Args)]
pub struct CheckoutConfig {
    /// Fixed service fee added to every booking, in whole currency units
    #[arg(long, env = "SERVICE_FEE", default_value_t = 50)]
    pub service_fee: u64,

    /// Tax rate applied to subtotal plus fee (`18%` or `0.18`)
    #[arg(long, env = "TAX_RATE", default_value = "18%", value_parser = parse_tax_rate)]
    pub tax_rate: Percentage,

    /// ISO 4217 currency code bookings are charged in
    #[arg(long, env = "CURRENCY", default_value = "INR")]
    pub currency: String,
}

impl CheckoutConfig {
    /// Pricing parameters for the checkout gate.
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            service_fee: self.service_fee,
            tax_rate: self.tax_rate,
        }
    }

    /// Resolve the configured currency code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for codes unknown to ISO 4217.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(self.currency.trim())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        let pricing = PricingConfig::default();

        Self {
            service_fee: pricing.service_fee,
            tax_rate: pricing.tax_rate,
            currency: "INR".to_string(),
        }
    }
}

/// Parse a tax rate written as a percentage (`18%`) or a fraction (`0.18`).
///
/// # Errors
///
/// Returns an error for values that are not numbers or are negative.
pub fn parse_tax_rate(value: &str) -> Result<Percentage, ConfigError> {
    let trimmed = value.trim();

    let (number, is_percent) = match trimmed.strip_suffix('%') {
        Some(stripped) => (stripped.trim(), true),
        None => (trimmed, false),
    };

    let mut rate = Decimal::from_str(number)
        .map_err(|_err| ConfigError::InvalidTaxRate(value.to_string()))?;

    if rate.is_sign_negative() {
        return Err(ConfigError::NegativeTaxRate(value.to_string()));
    }

    if is_percent {
        rate /= Decimal::ONE_HUNDRED;
    }

    Ok(Percentage::from(rate))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_and_fraction_forms_agree() -> TestResult {
        assert_eq!(parse_tax_rate("18%")?, parse_tax_rate("0.18")?);
        assert_eq!(parse_tax_rate(" 5 % ")?, parse_tax_rate("0.05")?);

        Ok(())
    }

    #[test]
    fn malformed_rates_are_rejected() {
        assert_eq!(
            parse_tax_rate("eighteen"),
            Err(ConfigError::InvalidTaxRate("eighteen".to_string()))
        );
        assert_eq!(
            parse_tax_rate("-1%"),
            Err(ConfigError::NegativeTaxRate("-1%".to_string()))
        );
    }

    #[test]
    fn default_config_prices_like_the_core() -> TestResult {
        let config = CheckoutConfig::default();

        assert_eq!(config.pricing().service_fee, 50);
        assert_eq!(config.currency()?, iso::INR);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_reported() {
        let config = CheckoutConfig {
            currency: "ZZZ".to_string(),
            ..CheckoutConfig::default()
        };

        assert_eq!(
            config.currency(),
            Err(ConfigError::UnknownCurrency("ZZZ".to_string()))
        );
    }
}
