use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// worker code, unique per organization
pub type WorkerCode = String;

/// identifies one installment: (loan, 1-based position in the term)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstallmentKey {
    pub loan_id: LoanId,
    pub sequence_number: u32,
}

impl InstallmentKey {
    pub fn new(loan_id: LoanId, sequence_number: u32) -> Self {
        Self {
            loan_id,
            sequence_number,
        }
    }
}

impl fmt::Display for InstallmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "installment {} of loan {}", self.sequence_number, self.loan_id)
    }
}

/// installment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstallmentState {
    /// scheduled, not yet paid
    #[default]
    Pending,
    /// settled; terminal
    Paid,
    /// due date moved forward one period; can still be paid
    Rescheduled,
}

impl InstallmentState {
    /// whether a payment may be recorded from this state
    pub fn accepts_payment(&self) -> bool {
        matches!(self, InstallmentState::Pending | InstallmentState::Rescheduled)
    }

    /// whether the due date may still be edited
    pub fn is_date_mutable(&self) -> bool {
        !matches!(self, InstallmentState::Paid)
    }
}

impl fmt::Display for InstallmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentState::Pending => "pending",
            InstallmentState::Paid => "paid",
            InstallmentState::Rescheduled => "rescheduled",
        };
        f.write_str(label)
    }
}

/// ordering for installment listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InstallmentOrder {
    #[default]
    BySequence,
    ByDueDate,
}
