use chrono::NaiveDate;
use serde_json::json;
use tracing::{error, info, warn};

use crate::compensation::Compensation;
use crate::context::AppContext;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::events::Event;
use crate::records::{Loan, Payment};
use crate::store::{fields, Record, Table};
use crate::types::{OverpaymentPolicy, RecordId};

use super::{collected_on, validate_amount};

/// outcome of a successful payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub loan: Loan,
    pub previous_paid_amount: Money,
    pub paid_amount: Money,
    pub remaining_balance: Money,
}

/// records payments and keeps the loan's paid amount in step
pub struct PaymentReconciler<'a> {
    ctx: &'a AppContext,
}

impl<'a> PaymentReconciler<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// create a payment, then add it to the loan's paid amount
    ///
    /// the loan is re-read from the store first. if the loan update fails the
    /// payment is deleted again and the update error is returned
    pub async fn apply_payment(
        &self,
        loan_id: RecordId,
        amount: Money,
        payment_date: NaiveDate,
    ) -> Result<PaymentReceipt> {
        validate_amount(amount)?;
        let repo = self.ctx.repository();

        let loan: Loan = match repo.get(loan_id).await {
            Ok(Some(loan)) => loan,
            Ok(None) => {
                return Err(LoanError::NotFound {
                    table: Table::Loans,
                    id: loan_id,
                })
            }
            Err(err) => {
                return Err(LoanError::InconsistentState {
                    message: format!("loan {} could not be re-read before payment: {}", loan_id, err),
                })
            }
        };

        let remaining = loan.remaining_balance();
        if self.ctx.config().payments.overpayment == OverpaymentPolicy::Reject && amount > remaining {
            return Err(LoanError::Overpayment {
                remaining,
                provided: amount,
            });
        }

        let previous_paid_amount = loan.paid_amount;
        let paid_amount = previous_paid_amount
            .checked_add(amount)
            .ok_or(LoanError::InvalidPaymentAmount { amount })?;

        let payment = repo
            .create(&Payment::new(loan_id, amount, payment_date, self.ctx.now()))
            .await?;
        let payment_id = payment.id().ok_or_else(|| LoanError::InconsistentState {
            message: "created payment has no id".to_string(),
        })?;

        let update = fields([("paid_amount", json!(paid_amount))]);

        let updated: Loan = match repo.update_fields::<Loan>(loan_id, update).await {
            Ok(updated) => updated,
            Err(err) => {
                error!(%loan_id, %payment_id, error = %err, "loan update failed, removing payment");
                self.undo_payment(loan_id, payment_id, &err).await;
                return Err(err);
            }
        };

        let remaining_balance = updated.remaining_balance();
        if remaining_balance.is_negative() {
            warn!(%loan_id, %remaining_balance, "loan is overpaid");
        }
        info!(%loan_id, %payment_id, %amount, %paid_amount, "payment applied");

        self.ctx
            .emit(Event::PaymentRecorded {
                payment_id,
                loan_id,
                amount,
                paid_amount,
                remaining_balance,
                timestamp: self.ctx.now(),
            })
            .await;

        Ok(PaymentReceipt {
            payment,
            loan: updated,
            previous_paid_amount,
            paid_amount,
            remaining_balance,
        })
    }

    /// every payment of a loan, oldest first
    pub async fn payments_for(&self, loan_id: RecordId) -> Result<Vec<Payment>> {
        self.ctx.repository().list_by::<Payment>("loan_id", loan_id).await
    }

    /// total collected on the loan today, recomputed from the payment list
    pub async fn collected_today(&self, loan_id: RecordId) -> Result<Money> {
        let payments = self.payments_for(loan_id).await?;
        Ok(collected_on(&payments, self.ctx.today()))
    }

    async fn undo_payment(&self, loan_id: RecordId, payment_id: RecordId, cause: &LoanError) {
        let mut compensation = Compensation::new();
        compensation.record(Table::Payments, payment_id);
        let report = compensation.rollback(self.ctx, &cause.to_string()).await;

        if !report.undone.is_empty() {
            self.ctx
                .emit(Event::PaymentRolledBack {
                    payment_id,
                    loan_id,
                    reason: cause.to_string(),
                    timestamp: self.ctx.now(),
                })
                .await;
        }
    }
}
