/// quick start - register a client with a weekly loan and collect a payment
use std::sync::Arc;

use microloan_rs::chrono::{Duration, TimeZone, Utc};
use microloan_rs::{
    AppContext, Client, ClientForm, EngineConfig, FormOrchestrator, Guarantee, InMemoryBlobStore,
    InMemoryRecordStore, LoanFormInput, Money, PaymentReconciler, SafeTimeProvider, TimeSource, Uuid,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Arc::new(AppContext::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(InMemoryBlobStore::new()),
        EngineConfig::default(),
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
        )),
    )?);

    // what the collector typed into the form
    let loan = LoanFormInput {
        capital: "5000".to_string(),
        interest_percentage: "15".to_string(),
        modality: "Semanal".to_string(),
        term: "8 semanas a 2 meses".to_string(),
        weekday: "viernes".to_string(),
        observation: String::new(),
    }
    .parse(ctx.today())?;

    let collector = Uuid::new_v4();
    let form = ClientForm::new(
        Client::new(collector, "Rosa", "Martinez", ctx.now()).with_phone("8888-1111"),
        loan,
    )
    .with_guarantee(Guarantee::new("Refrigeradora", Money::from_major(3_000)))
    .with_dni(Some(vec![0xFF, 0xD8]), Some(vec![0xFF, 0xD8]));

    let saved = FormOrchestrator::new().save_full_client_form(&ctx, form).await?;
    let schedule = saved.loan.schedule();
    println!(
        "{}: {} x {} starting {} ({})",
        saved.client.full_name(),
        schedule.installments,
        schedule.quota,
        schedule.first_installment_date,
        schedule.collection_day
    );

    let loan_id = saved.loan.id.ok_or("loan was not stored")?;

    // a week later the collector visits
    ctx.time().test_control().unwrap().advance(Duration::days(7));
    let receipt = PaymentReconciler::new(&ctx)
        .apply_payment(loan_id, Money::from_major(718), ctx.today())
        .await?;
    let lending = &ctx.config().lending;
    println!(
        "paid {} of {}, {} left",
        lending.display_amount(receipt.paid_amount),
        lending.display_amount(receipt.loan.total_debt),
        lending.display_amount(receipt.remaining_balance)
    );

    for event in ctx.take_events().await {
        println!("{:?}", event);
    }

    Ok(())
}
