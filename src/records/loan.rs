use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::schedule::{LoanRequest, LoanSchedule};
use crate::store::{Record, Table};
use crate::types::{CollectionDay, Modality, RecordId};

/// a disbursed loan with its derived schedule fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client_id: RecordId,
    pub capital: Money,
    pub interest_percentage: Decimal,
    pub modality: Modality,
    pub installments_term: String,
    pub disbursement_date: NaiveDate,
    /// weekday the collector asked for
    #[serde(default)]
    pub anchor_weekday: Option<Weekday>,
    /// effective collection day
    pub day_of_week: CollectionDay,
    pub first_installment_date: NaiveDate,
    pub total_debt: Money,
    pub base_quota: Money,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_amount: Money,
}

impl Loan {
    /// build a new loan for `client_id`; derived fields come from the schedule
    pub fn originate(client_id: RecordId, request: &LoanRequest, now: DateTime<Utc>) -> Result<Self> {
        request.validate()?;
        let schedule = request.schedule();
        let due_date = schedule.due_date.ok_or_else(|| LoanError::InvalidTerm {
            label: request.term.clone(),
        })?;

        Ok(Self {
            id: None,
            client_id,
            capital: request.capital,
            interest_percentage: request.interest.as_percentage(),
            modality: request.modality,
            installments_term: request.term.clone(),
            disbursement_date: request.disbursement_date,
            anchor_weekday: request.anchor_weekday,
            day_of_week: schedule.collection_day,
            first_installment_date: schedule.first_installment_date,
            total_debt: schedule.total_debt,
            base_quota: schedule.quota,
            due_date,
            observation: request.observation.clone(),
            created_at: now,
            paid_amount: Money::ZERO,
        })
    }

    /// total debt minus what has been paid; negative after an overpayment
    pub fn remaining_balance(&self) -> Money {
        self.total_debt - self.paid_amount
    }

    pub fn interest(&self) -> Rate {
        Rate::from_percentage(self.interest_percentage)
    }

    /// the inputs this loan was originated from
    pub fn request(&self) -> LoanRequest {
        LoanRequest {
            capital: self.capital,
            interest: self.interest(),
            modality: self.modality,
            term: self.installments_term.clone(),
            disbursement_date: self.disbursement_date,
            anchor_weekday: self.anchor_weekday,
            observation: self.observation.clone(),
        }
    }

    pub fn schedule(&self) -> LoanSchedule {
        self.request().schedule()
    }

    /// whether the stored derived fields match a fresh computation
    pub fn schedule_is_consistent(&self) -> bool {
        let schedule = self.schedule();
        schedule.total_debt == self.total_debt
            && schedule.quota == self.base_quota
            && schedule.first_installment_date == self.first_installment_date
            && schedule.due_date == Some(self.due_date)
            && schedule.collection_day == self.day_of_week
    }

    /// day of month installments fall on, monthly loans only
    pub fn monthly_payment_day(&self) -> Option<u32> {
        self.schedule().day_of_month
    }

    /// informational late fee on one installment, in cents
    pub fn late_fee_notice(&self, percentage: Decimal) -> Result<Money> {
        self.base_quota
            .percentage(percentage)
            .map(|fee| fee.to_cents())
            .ok_or_else(|| LoanError::InvalidConfiguration {
                message: format!("late fee of {}% on {} does not fit", percentage, self.base_quota),
            })
    }
}

impl Record for Loan {
    const TABLE: Table = Table::Loans;

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}
