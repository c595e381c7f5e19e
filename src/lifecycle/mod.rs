//! Installment state transitions.
//!
//! `Pending -> Paid`, `Pending -> Rescheduled -> Paid`. Nothing leaves `Paid`.

pub mod bulk;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::schedule::{next_due_date, Installment};
use crate::types::InstallmentState;

pub use bulk::{apply_bulk_action, BulkAction, BulkItem, BulkOutcome, BulkReport, SkipReason};

/// result of recording a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    /// the installment moved to paid
    Recorded,
    /// it was already paid; nothing changed
    AlreadyPaid,
}

/// normalize a free-text token: trimmed, `None` when blank
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Installment {
    /// mark as paid, keeping `reference` (e.g. a check number) when given
    ///
    /// Recording again is a no-op reported as [`PaymentOutcome::AlreadyPaid`];
    /// a different reference on a paid installment is an `InvalidState`
    /// conflict and the stored reference stays.
    pub fn record_payment(&mut self, reference: Option<&str>) -> Result<PaymentOutcome> {
        let reference = clean(reference);

        if !self.state.accepts_payment() {
            return match reference {
                Some(new_ref) if self.payment_reference.as_deref() != Some(new_ref.as_str()) => {
                    Err(LoanError::InvalidState {
                        key: self.key(),
                        state: self.state,
                        reason: format!(
                            "already paid with reference {}, refusing {}",
                            self.payment_reference.as_deref().unwrap_or("(none)"),
                            new_ref
                        ),
                    })
                }
                _ => Ok(PaymentOutcome::AlreadyPaid),
            };
        }

        self.state = InstallmentState::Paid;
        if reference.is_some() {
            self.payment_reference = reference;
        }
        Ok(PaymentOutcome::Recorded)
    }

    /// manual due date override; paid installments keep their date
    pub fn change_due_date(&mut self, new_date: NaiveDate) -> Result<()> {
        if !self.state.is_date_mutable() {
            return Err(LoanError::InvalidState {
                key: self.key(),
                state: self.state,
                reason: "the due date of a paid installment cannot change".to_string(),
            });
        }
        self.due_date = new_date;
        Ok(())
    }

    /// push a pending installment to the next pay day
    ///
    /// Silently does nothing unless pending, so callers may re-invoke freely.
    /// Returns whether the installment moved.
    pub fn reschedule(&mut self, reason: &str) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.due_date = next_due_date(self.due_date);
        self.state = InstallmentState::Rescheduled;
        self.note = clean(Some(reason));
        true
    }
}
