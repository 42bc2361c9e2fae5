use tracing::info;

use crate::context::AppContext;
use crate::errors::Result;
use crate::events::Event;
use crate::records::{Client, Loan};
use crate::schedule::LoanRequest;
use crate::types::RecordId;

use super::saved_id;

/// grant a new loan to a client that already exists
pub async fn originate_reloan(ctx: &AppContext, client_id: RecordId, request: &LoanRequest) -> Result<Loan> {
    request.validate()?;
    let repo = ctx.repository();
    let client: Client = repo.require(client_id).await?;

    let loan = repo.create(&Loan::originate(client_id, request, ctx.now())?).await?;
    let loan_id = saved_id(&loan)?;
    info!(%loan_id, %client_id, client = %client.full_name(), total_debt = %loan.total_debt, "reloan originated");

    ctx.emit(Event::LoanOriginated {
        loan_id,
        client_id,
        capital: loan.capital,
        total_debt: loan.total_debt,
        modality: loan.modality,
        due_date: loan.due_date,
        timestamp: ctx.now(),
    })
    .await;
    Ok(loan)
}
