//! Pricing
//!
//! Turns a cart subtotal into the amount handed to the payment processor:
//! `round((subtotal + service_fee) × (1 + tax_rate))`, rounding halves away
//! from zero.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Default fixed service fee, in whole currency units.
pub const DEFAULT_SERVICE_FEE: u64 = 50;

/// Default tax rate.
pub const DEFAULT_TAX_RATE: f64 = 0.18;

/// Errors that can occur while pricing a booking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// An amount could not be represented without overflow.
    #[error("amount overflowed while pricing booking")]
    Overflow,

    /// The tax calculation could not be safely converted.
    #[error("tax rate conversion overflowed or was not finite")]
    RateConversion,
}

/// Fee and tax configuration
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Fixed fee added to every booking
    pub service_fee: u64,

    /// Tax applied to subtotal plus fee
    pub tax_rate: Percentage,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee: DEFAULT_SERVICE_FEE,
            tax_rate: Percentage::from(DEFAULT_TAX_RATE),
        }
    }
}

/// Itemised payment amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentBreakdown {
    /// Cart total
    pub subtotal: u64,

    /// Fixed service fee
    pub service_fee: u64,

    /// Tax, such that `subtotal + service_fee + tax == total`
    pub tax: u64,

    /// Amount to charge
    pub total: u64,
}

impl PaymentBreakdown {
    /// Price a subtotal with the given configuration.
    ///
    /// # Errors
    ///
    /// - [`PricingError::Overflow`]: the subtotal plus fee does not fit.
    /// - [`PricingError::RateConversion`]: the taxed amount cannot be represented.
    pub fn calculate(subtotal: u64, config: &PricingConfig) -> Result<Self, PricingError> {
        let taxable = subtotal
            .checked_add(config.service_fee)
            .ok_or(PricingError::Overflow)?;

        let total = with_tax(taxable, &config.tax_rate)?;

        let tax = total
            .checked_sub(taxable)
            .ok_or(PricingError::RateConversion)?;

        Ok(Self {
            subtotal,
            service_fee: config.service_fee,
            tax,
            total,
        })
    }

    /// The total as money in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the amount cannot be expressed in
    /// the currency's minor units.
    pub fn total_money(
        &self,
        currency: &'static Currency,
    ) -> Result<Money<'static, Currency>, PricingError> {
        to_money(self.total, currency)
    }
}

/// Express a whole-unit amount as money in `currency`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the amount cannot be expressed in the
/// currency's minor units.
pub fn to_money(
    amount: u64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = 10_i64
        .checked_pow(currency.exponent)
        .and_then(|scale| i64::try_from(amount).ok()?.checked_mul(scale))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, currency))
}

fn with_tax(amount: u64, rate: &Percentage) -> Result<u64, PricingError> {
    let amount = Decimal::from_u64(amount).ok_or(PricingError::RateConversion)?;

    // decimal_percentage doesn't expose the underlying Decimal
    let multiplier = Decimal::ONE + (*rate) * Decimal::ONE;

    amount
        .checked_mul(multiplier)
        .ok_or(PricingError::RateConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::RateConversion)
}
