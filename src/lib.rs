pub mod config;
pub mod decimal;
pub mod documents;
pub mod errors;
pub mod events;
pub mod import;
pub mod ledger;
pub mod lifecycle;
pub mod loan;
pub mod schedule;
pub mod store;
pub mod types;

// re-export key types
pub use config::{LedgerConfig, TermBracket};
pub use decimal::{Money, Rate};
pub use documents::{LoanStatement, SelectionLine, SelectionSummary, StatementLine};
pub use errors::{ErrorKind, LoanError, Result};
pub use events::{Event, EventStore};
pub use import::{parse_records, ImportReport, RawLoanRecord, SkippedRecord};
pub use ledger::LoanLedger;
pub use lifecycle::{BulkAction, BulkReport, PaymentOutcome, SkipReason};
pub use loan::{Loan, LoanTerms, LoanTermsBuilder, Worker};
pub use schedule::{
    compute_fixed_amounts, generate_schedule, next_due_date, normalize_start, AmortizationSchedule,
    FixedAmounts, Installment,
};
pub use store::{LoanStore, MemoryStore, WriteBatch, WriteOp};
pub use types::{InstallmentKey, InstallmentOrder, InstallmentState, LoanId, WorkerCode};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
