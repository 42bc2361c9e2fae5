use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{Modality, OverpaymentPolicy};

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 120;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub lending: LendingDefaults,
    pub payments: PaymentPolicy,
    pub storage: StorageConfig,
}

/// values pre-filled on the loan form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingDefaults {
    pub default_interest_percentage: Decimal,
    pub default_modality: Modality,
    /// shown to collectors, never charged
    pub late_fee_percentage: Decimal,
    pub currency_symbol: String,
}

/// payment acceptance rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPolicy {
    pub overpayment: OverpaymentPolicy,
}

/// remote storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub dni_bucket: String,
    pub profile_bucket: String,
    /// upper bound for every store or blob call
    pub request_timeout_secs: u64,
}

impl LendingDefaults {
    /// amount as shown to collectors, e.g. "C$ 366.67"
    pub fn display_amount(&self, amount: Money) -> String {
        format!("{} {:.2}", self.currency_symbol, amount.to_cents().as_decimal())
    }
}

impl StorageConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lending: LendingDefaults {
                default_interest_percentage: dec!(15),
                default_modality: Modality::Daily,
                late_fee_percentage: dec!(10),
                currency_symbol: "C$".to_string(),
            },
            payments: PaymentPolicy {
                overpayment: OverpaymentPolicy::Allow,
            },
            storage: StorageConfig {
                dni_bucket: "dni-pictures".to_string(),
                profile_bucket: "profile-pictures".to_string(),
                request_timeout_secs: 15,
            },
        }
    }
}

impl EngineConfig {
    /// refuses overpayments and fails store calls sooner
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.payments.overpayment = OverpaymentPolicy::Reject;
        config.storage.request_timeout_secs = 10;
        config
    }

    /// load from json and validate
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lending.default_interest_percentage < Decimal::ZERO {
            return Err(LoanError::InvalidConfiguration {
                message: "default interest percentage must not be negative".to_string(),
            });
        }

        if self.lending.late_fee_percentage < Decimal::ZERO || self.lending.late_fee_percentage > Decimal::ONE_HUNDRED {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "late fee percentage must be between 0 and 100, got {}",
                    self.lending.late_fee_percentage
                ),
            });
        }

        if self.lending.currency_symbol.trim().is_empty() {
            return Err(LoanError::InvalidConfiguration {
                message: "currency_symbol must not be empty".to_string(),
            });
        }

        for (name, bucket) in [
            ("dni_bucket", &self.storage.dni_bucket),
            ("profile_bucket", &self.storage.profile_bucket),
        ] {
            if bucket.trim().is_empty() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("{} must not be empty", name),
                });
            }
        }

        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.storage.request_timeout_secs) {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "request timeout must be between {} and {} seconds, got {}",
                    MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.storage.request_timeout_secs
                ),
            });
        }

        Ok(())
    }
}
