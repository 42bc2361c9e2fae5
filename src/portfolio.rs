use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AppContext;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::payments::collected_on;
use crate::records::{Client, Loan, Payment};
use crate::store::Table;
use crate::types::{CollectionDay, Modality, RecordId};

/// where a row stands on a given day of the collector's route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionStatus {
    Overdue,
    DueToday,
    NotDue,
}

/// one line of a collector's client list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRow {
    pub client_id: RecordId,
    pub loan_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub first_installment_date: NaiveDate,
    pub due_date: NaiveDate,
    pub modality: Modality,
    pub collection_day: CollectionDay,
    pub monthly_payment_day: Option<u32>,
    pub remaining_balance: Money,
}

impl CollectionRow {
    fn new(client_id: RecordId, client: &Client, loan_id: RecordId, loan: &Loan) -> Self {
        Self {
            client_id,
            loan_id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            phone_number: client.phone_number.clone(),
            first_installment_date: loan.first_installment_date,
            due_date: loan.due_date,
            modality: loan.modality,
            collection_day: loan.day_of_week,
            monthly_payment_day: loan.monthly_payment_day(),
            remaining_balance: loan.remaining_balance(),
        }
    }

    /// overdue past the due date, otherwise due when today is a collection day of the loan
    pub fn status(&self, today: NaiveDate) -> CollectionStatus {
        if today > self.due_date {
            return CollectionStatus::Overdue;
        }
        let started = today >= self.first_installment_date;
        let due = match (self.modality, self.collection_day) {
            (Modality::Daily, _) => started && !matches!(today.weekday(), Weekday::Sat | Weekday::Sun),
            (Modality::Weekly, CollectionDay::Weekday(day)) => today.weekday() == day,
            (Modality::Weekly, CollectionDay::Daily) => false,
            (Modality::Monthly, _) => started && self.monthly_payment_day == Some(today.day()),
        };
        if due {
            CollectionStatus::DueToday
        } else {
            CollectionStatus::NotDue
        }
    }

    /// case-insensitive match on names or phone
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.first_name.to_lowercase().contains(&query)
            || self.last_name.to_lowercase().contains(&query)
            || self.phone_number.to_lowercase().contains(&query)
    }
}

/// every loan of every client registered by `user_id`
pub async fn collection_rows(ctx: &AppContext, user_id: RecordId) -> Result<Vec<CollectionRow>> {
    let repo = ctx.repository();
    let clients: Vec<Client> = repo.list_by("user_id", user_id).await?;

    let mut rows = Vec::new();
    for client in &clients {
        let Some(client_id) = client.id else {
            continue;
        };
        let loans: Vec<Loan> = repo.list_by("client_id", client_id).await?;
        for loan in &loans {
            if let Some(loan_id) = loan.id {
                rows.push(CollectionRow::new(client_id, client, loan_id, loan));
            }
        }
    }

    debug!(%user_id, clients = clients.len(), rows = rows.len(), "collection rows built");
    Ok(rows)
}

/// rows matching a search query
pub fn search<'r>(rows: &'r [CollectionRow], query: &str) -> Vec<&'r CollectionRow> {
    rows.iter().filter(|r| r.matches(query)).collect()
}

/// what the collector sees before taking a payment
#[derive(Debug, Clone, PartialEq)]
pub struct LoanOverview {
    pub client: Client,
    pub loan: Loan,
    pub payments: Vec<Payment>,
    pub base_quota: Money,
    pub collected_today: Money,
    pub remaining_balance: Money,
    /// informational, never charged
    pub late_fee: Money,
}

/// client, first loan and its payments
///
/// a client without loans is reported as `NotFound` on loans, keyed by the
/// client id
pub async fn loan_overview(ctx: &AppContext, client_id: RecordId) -> Result<LoanOverview> {
    let repo = ctx.repository();
    let client: Client = repo.require(client_id).await?;

    let loan = repo
        .list_by::<Loan>("client_id", client_id)
        .await?
        .into_iter()
        .next()
        .ok_or(LoanError::NotFound {
            table: Table::Loans,
            id: client_id,
        })?;
    let loan_id = loan.id.ok_or_else(|| LoanError::InconsistentState {
        message: format!("stored loan of client {} has no id", client_id),
    })?;

    let payments: Vec<Payment> = repo.list_by("loan_id", loan_id).await?;
    let collected_today = collected_on(&payments, ctx.today());
    let late_fee = loan.late_fee_notice(ctx.config().lending.late_fee_percentage)?;

    Ok(LoanOverview {
        base_quota: loan.base_quota,
        collected_today,
        remaining_balance: loan.remaining_balance(),
        late_fee,
        client,
        loan,
        payments,
    })
}
