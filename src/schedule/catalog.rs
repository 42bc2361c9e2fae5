use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::types::Modality;

/// nominal durations in tenths of a month, shared by daily and weekly terms
const DURATION_TENTHS: [i64; 12] = [10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 120];
const DAILY_INSTALLMENTS: [u32; 12] = [20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 365];
const WEEKLY_INSTALLMENTS: [u32; 12] = [4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 52];

/// one selectable (installment count, duration) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOption {
    pub installments: u32,
    /// nominal duration, display only
    pub months: Decimal,
    pub label: String,
}

impl TermOption {
    fn new(modality: Modality, installments: u32, months: Decimal) -> Self {
        let months = months.normalize();
        let unit = match modality {
            Modality::Weekly => "semanas",
            Modality::Daily | Modality::Monthly if installments == 1 => "cuota",
            Modality::Daily | Modality::Monthly => "cuotas",
        };
        let month_unit = if months == Decimal::ONE { "mes" } else { "meses" };
        Self {
            installments,
            months,
            label: format!("{} {} a {} {}", installments, unit, months, month_unit),
        }
    }
}

/// static lookup of valid terms per modality
pub struct TermCatalog;

impl TermCatalog {
    pub fn options(modality: Modality) -> Vec<TermOption> {
        match modality {
            Modality::Daily => Self::paired(modality, &DAILY_INSTALLMENTS),
            Modality::Weekly => Self::paired(modality, &WEEKLY_INSTALLMENTS),
            Modality::Monthly => (1..=12)
                .map(|n| TermOption::new(modality, n, Decimal::from(n)))
                .collect(),
        }
    }

    /// find an option of `modality` by its label
    pub fn find(modality: Modality, label: &str) -> Option<TermOption> {
        let label = label.trim();
        Self::options(modality).into_iter().find(|o| o.label == label)
    }

    fn paired(modality: Modality, counts: &[u32; 12]) -> Vec<TermOption> {
        counts
            .iter()
            .zip(DURATION_TENTHS.iter())
            .map(|(&n, &tenths)| TermOption::new(modality, n, Decimal::new(tenths, 1)))
            .collect()
    }
}

/// installment count encoded at the start of a term label ("20 cuotas a 1 mes" -> 20)
pub fn installment_count(label: &str) -> Option<u32> {
    label.split_whitespace().next()?.parse().ok()
}

/// modality plus the term chosen for it; a term never survives a modality change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSelection {
    modality: Modality,
    term: Option<TermOption>,
}

impl TermSelection {
    pub fn new(modality: Modality) -> Self {
        Self { modality, term: None }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn term(&self) -> Option<&TermOption> {
        self.term.as_ref()
    }

    /// options for the current modality
    pub fn options(&self) -> Vec<TermOption> {
        TermCatalog::options(self.modality)
    }

    /// switch modality; any selected term is cleared
    pub fn select_modality(&mut self, modality: Modality) {
        self.modality = modality;
        self.term = None;
    }

    /// select a term by label from the current modality's catalog
    pub fn select_term(&mut self, label: &str) -> Result<&TermOption> {
        let option = TermCatalog::find(self.modality, label).ok_or_else(|| LoanError::InvalidTerm {
            label: label.to_string(),
        })?;
        Ok(self.term.insert(option))
    }
}
