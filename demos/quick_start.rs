/// quick start - create a payroll loan, pay installments and settle a pay day in bulk
use chrono::{NaiveDate, TimeZone, Utc};
use payroll_loan_rs::{
    BulkAction, InstallmentKey, InstallmentOrder, LoanLedger, LoanTerms, Money, SafeTimeProvider, TimeSource,
    Worker,
};
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
    ));

    let mut ledger = LoanLedger::in_memory();
    ledger.register_worker(Worker::new("T-001", "Ana Perez", "LEON"), &time)?;
    ledger.register_worker(Worker::new("T-002", "Bruno Diaz", "LEON"), &time)?;

    // rates and term come from the ledger defaults (3%, 10%, 11 installments for 500)
    let terms = LoanTerms::builder()
        .principal(Money::from_major(500))
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
        .build_with(ledger.config())?;
    let loan = ledger.create_loan("T-001", terms.clone(), &time)?;
    ledger.create_loan("T-002", terms, &time)?;

    println!("=== schedule for {} ===", loan.worker_code);
    for inst in ledger.installments(loan.id, InstallmentOrder::BySequence)? {
        println!(
            "{:>2}  {}  {} + {} + {} = {}",
            inst.sequence_number,
            inst.due_date,
            inst.principal_component,
            inst.commission_component,
            inst.interest_component,
            inst.total_amount
        );
    }

    ledger.record_payment(InstallmentKey::new(loan.id, 1), Some("CHK-1001"), &time)?;

    // settle everything pending on the 31st for one campus with a single check
    let due = ledger.pending_due_on(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), Some("LEON"))?;
    println!("\n{} installments due, total {}", due.len(), due.total);

    let report = ledger.bulk_cancel(
        &due.keys(),
        &BulkAction::Settle {
            reference: Some("CHK-2024-01".to_string()),
        },
        &time,
    )?;
    println!("settled {} for {}", report.processed, report.processed_total);

    println!("\n{}", ledger.statement(loan.id)?.to_json_pretty()?);

    Ok(())
}
