//! Configuration for the checkout client.
//!
//! Fees and tax are configuration constants, never computed: the pricing
//! module reads them from [`PricingConfig`], which is the only place they
//! are defined.

use crate::types::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration load/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: {message}")]
    InvalidEnvVar {
        /// The variable name.
        var: String,
        /// What was wrong with it.
        message: String,
    },

    /// The assembled configuration is inconsistent.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// The pricing constants: a flat fee per distinct line item and a tax
/// rate applied to the subtotal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat fee charged once per line item (not per duration unit).
    pub fixed_fee: Money,
    /// Tax rate applied to the subtotal, as a fraction (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            fixed_fee: Money::from_major(10),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// Top-level configuration for the checkout client.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutConfig {
    /// Fee and tax constants.
    pub pricing: PricingConfig,
    /// Currency every payment intent is denominated in.
    pub currency: Currency,
    /// Base URL of the booking service.
    pub booking_service_url: String,
    /// Base URL of the payment service.
    pub payment_service_url: String,
    /// Per-request timeout for collaborator calls.
    ///
    /// A timeout surfaces as the failing step's error; it is not
    /// distinguished as retryable.
    pub request_timeout: Duration,
    /// Where the persisted cart lives on disk.
    pub cart_storage_path: PathBuf,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            currency: Currency::default(),
            booking_service_url: "http://localhost:8080/api".to_string(),
            payment_service_url: "http://localhost:8081/api".to_string(),
            request_timeout: Duration::from_secs(30),
            cart_storage_path: PathBuf::from("bookline-cart.json"),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `BOOKLINE_BOOKING_URL`,
    /// `BOOKLINE_PAYMENT_URL`, `BOOKLINE_CURRENCY`,
    /// `BOOKLINE_BOOKING_FEE`, `BOOKLINE_TAX_RATE`,
    /// `BOOKLINE_REQUEST_TIMEOUT_SECS`, `BOOKLINE_CART_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but unparseable, or
    /// when the assembled configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BOOKLINE_BOOKING_URL") {
            config.booking_service_url = url;
        }
        if let Ok(url) = std::env::var("BOOKLINE_PAYMENT_URL") {
            config.payment_service_url = url;
        }
        if let Ok(code) = std::env::var("BOOKLINE_CURRENCY") {
            config.currency = Currency::new(&code);
        }
        if let Ok(fee) = std::env::var("BOOKLINE_BOOKING_FEE") {
            let amount: Decimal = fee.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: "BOOKLINE_BOOKING_FEE".to_string(),
                message: format!("not a decimal amount: {fee}"),
            })?;
            config.pricing.fixed_fee = Money::new(amount);
        }
        if let Ok(rate) = std::env::var("BOOKLINE_TAX_RATE") {
            config.pricing.tax_rate =
                rate.parse().map_err(|_| ConfigError::InvalidEnvVar {
                    var: "BOOKLINE_TAX_RATE".to_string(),
                    message: format!("not a decimal rate: {rate}"),
                })?;
        }
        if let Ok(secs) = std::env::var("BOOKLINE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: "BOOKLINE_REQUEST_TIMEOUT_SECS".to_string(),
                message: format!("not a number of seconds: {secs}"),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("BOOKLINE_CART_PATH") {
            config.cart_storage_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a negative fee, a tax rate
    /// outside `[0, 1)`, or an empty service URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.fixed_fee.is_negative() {
            return Err(ConfigError::Validation(
                "booking fee must not be negative".to_string(),
            ));
        }
        if self.pricing.tax_rate < Decimal::ZERO || self.pricing.tax_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(format!(
                "tax rate must be in [0, 1), got {}",
                self.pricing.tax_rate
            )));
        }
        if self.booking_service_url.is_empty() || self.payment_service_url.is_empty() {
            return Err(ConfigError::Validation(
                "service URLs must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CheckoutConfig::default().validate().unwrap();
    }

    #[test]
    fn default_pricing_matches_marketplace_constants() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.fixed_fee, Money::from_major(10));
        assert_eq!(pricing.tax_rate, Decimal::new(8, 2));
    }

    #[test]
    fn negative_fee_fails_validation() {
        let mut config = CheckoutConfig::default();
        config.pricing.fixed_fee = Money::from_major(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn tax_rate_of_one_fails_validation() {
        let mut config = CheckoutConfig::default();
        config.pricing.tax_rate = Decimal::ONE;
        assert!(config.validate().is_err());
    }
}
