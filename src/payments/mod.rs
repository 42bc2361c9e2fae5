pub mod reconciliation;

use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::records::Payment;

pub use reconciliation::{PaymentReceipt, PaymentReconciler};

/// raw amount typed by the collector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentInput {
    pub amount: String,
}

impl PaymentInput {
    pub fn new(amount: impl Into<String>) -> Self {
        Self { amount: amount.into() }
    }

    /// parse into a positive amount
    pub fn parse(&self) -> Result<Money> {
        let raw = self.amount.trim();
        if raw.is_empty() {
            return Err(LoanError::Validation {
                field: "amount",
                message: "must not be empty".to_string(),
            });
        }

        let amount = Money::from_str_exact(raw).map_err(|_| LoanError::Validation {
            field: "amount",
            message: format!("{:?} is not a number", raw),
        })?;

        validate_amount(amount)?;
        Ok(amount)
    }
}

/// payments must be strictly positive
pub fn validate_amount(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LoanError::InvalidPaymentAmount { amount })
    }
}

/// sum of the payments dated `date`
pub fn collected_on(payments: &[Payment], date: NaiveDate) -> Money {
    payments
        .iter()
        .filter(|p| p.payment_date == date)
        .map(|p| p.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_input_parsing() {
        assert_eq!(PaymentInput::new(" 50.25 ").parse().unwrap(), Money::from_cents(5025));
        assert!(matches!(
            PaymentInput::new("").parse(),
            Err(LoanError::Validation { field: "amount", .. })
        ));
        assert!(matches!(
            PaymentInput::new("cincuenta").parse(),
            Err(LoanError::Validation { field: "amount", .. })
        ));
        assert!(matches!(
            PaymentInput::new("0").parse(),
            Err(LoanError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            PaymentInput::new("-5").parse(),
            Err(LoanError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_collected_on_filters_by_date() {
        let loan = Uuid::new_v4();
        let payments = vec![
            Payment::new(loan, Money::from_major(50), date(15), Utc::now()),
            Payment::new(loan, Money::from_cents(2550), date(15), Utc::now()),
            Payment::new(loan, Money::from_major(100), date(14), Utc::now()),
        ];

        assert_eq!(collected_on(&payments, date(15)), Money::from_cents(7550));
        assert_eq!(collected_on(&payments, date(14)), Money::from_major(100));
        assert_eq!(collected_on(&payments, date(16)), Money::ZERO);
        assert_eq!(collected_on(&[], date(15)), Money::ZERO);
    }
}
