//! Serializable views handed to document renderers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::loan::{Loan, Worker};
use crate::schedule::Installment;
use crate::types::{InstallmentKey, InstallmentState, LoanId, WorkerCode};

/// full view of one loan and its installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanStatement {
    pub loan_id: LoanId,
    pub worker: Worker,
    pub terms: TermsView,
    pub totals: TotalsView,
    pub first_due_date: Option<NaiveDate>,
    pub last_due_date: Option<NaiveDate>,
    pub installments: Vec<StatementLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub monthly_interest_rate: Rate,
    pub commission_rate: Rate,
    pub term: u32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsView {
    /// sum of every installment's total
    pub total_amount: Money,
    pub total_principal: Money,
    pub total_commission: Money,
    pub total_interest: Money,
    pub paid_amount: Money,
    pub outstanding_amount: Money,
    pub paid_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub principal: Money,
    pub commission: Money,
    pub interest: Money,
    pub total: Money,
    pub state: InstallmentState,
    pub payment_reference: Option<String>,
    pub note: Option<String>,
}

impl From<&Installment> for StatementLine {
    fn from(i: &Installment) -> Self {
        StatementLine {
            sequence_number: i.sequence_number,
            due_date: i.due_date,
            principal: i.principal_component,
            commission: i.commission_component,
            interest: i.interest_component,
            total: i.total_amount,
            state: i.state,
            payment_reference: i.payment_reference.clone(),
            note: i.note.clone(),
        }
    }
}

impl LoanStatement {
    /// `installments` must be in sequence order
    pub fn new(worker: Worker, loan: &Loan, installments: &[Installment]) -> Self {
        let total_amount: Money = installments.iter().map(|i| i.total_amount).sum();
        let paid: Vec<&Installment> = installments.iter().filter(|i| i.is_paid()).collect();
        let paid_amount: Money = paid.iter().map(|i| i.total_amount).sum();

        LoanStatement {
            loan_id: loan.id,
            worker,
            terms: TermsView {
                principal: loan.terms.principal,
                monthly_interest_rate: loan.terms.monthly_interest_rate,
                commission_rate: loan.terms.commission_rate,
                term: loan.terms.term,
                start_date: loan.terms.start_date,
            },
            totals: TotalsView {
                total_amount,
                total_principal: installments.iter().map(|i| i.principal_component).sum(),
                total_commission: installments.iter().map(|i| i.commission_component).sum(),
                total_interest: installments.iter().map(|i| i.interest_component).sum(),
                paid_amount,
                outstanding_amount: total_amount - paid_amount,
                paid_count: paid.len() as u32,
            },
            first_due_date: installments.iter().map(|i| i.due_date).min(),
            last_due_date: installments.iter().map(|i| i.due_date).max(),
            installments: installments.iter().map(StatementLine::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// one row of a bulk selection, e.g. a line on a payment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionLine {
    pub key: InstallmentKey,
    pub worker_code: WorkerCode,
    pub worker_name: String,
    pub campus: String,
    pub due_date: NaiveDate,
    pub total_amount: Money,
}

/// installments selected for a bulk action and what they add up to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub due_date: NaiveDate,
    pub campus: Option<String>,
    pub lines: Vec<SelectionLine>,
    pub total: Money,
}

impl SelectionSummary {
    pub fn new(due_date: NaiveDate, campus: Option<String>, lines: Vec<SelectionLine>) -> Self {
        let total = lines.iter().map(|l| l.total_amount).sum();
        SelectionSummary {
            due_date,
            campus,
            lines,
            total,
        }
    }

    /// keys to feed into a bulk action
    pub fn keys(&self) -> Vec<InstallmentKey> {
        self.lines.iter().map(|l| l.key).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
