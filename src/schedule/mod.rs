pub mod amortization;
pub mod dates;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentKey, InstallmentState, LoanId};

pub use amortization::{compute_fixed_amounts, generate_schedule, AmortizationSchedule, FixedAmounts};
pub use dates::{end_of_month, is_end_of_month, next_due_date, normalize_start, sequence, DueDates};

/// one scheduled repayment of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub loan_id: LoanId,
    pub sequence_number: u32,
    pub principal_component: Money,
    pub commission_component: Money,
    pub interest_component: Money,
    pub total_amount: Money,
    pub due_date: NaiveDate,
    pub state: InstallmentState,
    /// e.g. a check number, set when the installment is paid
    pub payment_reference: Option<String>,
    /// reason given when rescheduled
    pub note: Option<String>,
}

impl Installment {
    /// new pending installment; the total is the sum of the components
    pub fn pending(
        loan_id: LoanId,
        sequence_number: u32,
        principal_component: Money,
        commission_component: Money,
        interest_component: Money,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            loan_id,
            sequence_number,
            principal_component,
            commission_component,
            interest_component,
            total_amount: principal_component + commission_component + interest_component,
            due_date,
            state: InstallmentState::Pending,
            payment_reference: None,
            note: None,
        }
    }

    pub fn key(&self) -> InstallmentKey {
        InstallmentKey::new(self.loan_id, self.sequence_number)
    }

    pub fn is_pending(&self) -> bool {
        self.state == InstallmentState::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.state == InstallmentState::Paid
    }
}
