//! Persistence boundary.
//!
//! The ledger never writes piecemeal: each operation stages its writes in a
//! [`WriteBatch`] and hands it to [`LoanStore::commit`], which must apply all
//! of it or none of it.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::errors::{LoanError, Result};
use crate::loan::{Loan, Worker};
use crate::schedule::Installment;
use crate::types::{InstallmentKey, InstallmentOrder, InstallmentState, LoanId, WorkerCode};

/// row-level change to the mutable fields of one installment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentUpdate {
    pub key: InstallmentKey,
    pub state: InstallmentState,
    pub payment_reference: Option<String>,
    pub due_date: NaiveDate,
    pub note: Option<String>,
}

impl InstallmentUpdate {
    /// capture the mutable fields of an installment after a transition
    pub fn from_installment(installment: &Installment) -> Self {
        Self {
            key: installment.key(),
            state: installment.state,
            payment_reference: installment.payment_reference.clone(),
            due_date: installment.due_date,
            note: installment.note.clone(),
        }
    }

    /// amounts and sequence are never touched
    pub fn apply_to(&self, installment: &mut Installment) {
        installment.state = self.state;
        installment.payment_reference = self.payment_reference.clone();
        installment.due_date = self.due_date;
        installment.note = self.note.clone();
    }
}

/// a single staged write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    PutWorker(Worker),
    PutLoan(Loan),
    /// drop every installment of the loan, then insert these
    ReplaceInstallments {
        loan_id: LoanId,
        installments: Vec<Installment>,
    },
    UpdateInstallment(InstallmentUpdate),
}

/// writes committed together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_worker(&mut self, worker: Worker) -> &mut Self {
        self.ops.push(WriteOp::PutWorker(worker));
        self
    }

    pub fn put_loan(&mut self, loan: Loan) -> &mut Self {
        self.ops.push(WriteOp::PutLoan(loan));
        self
    }

    pub fn replace_installments(&mut self, loan_id: LoanId, installments: Vec<Installment>) -> &mut Self {
        self.ops.push(WriteOp::ReplaceInstallments {
            loan_id,
            installments,
        });
        self
    }

    pub fn update_installment(&mut self, installment: &Installment) -> &mut Self {
        self.ops
            .push(WriteOp::UpdateInstallment(InstallmentUpdate::from_installment(installment)));
        self
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// data-store contract the ledger runs against
pub trait LoanStore {
    fn worker(&self, code: &str) -> Result<Option<Worker>>;

    fn loan(&self, id: LoanId) -> Result<Option<Loan>>;

    fn loans(&self) -> Result<Vec<Loan>>;

    /// all installments of a loan in the requested order
    fn installments(&self, loan_id: LoanId, order: InstallmentOrder) -> Result<Vec<Installment>>;

    fn installment(&self, key: &InstallmentKey) -> Result<Option<Installment>>;

    /// installments in `state` due on `date`, across loans
    fn installments_due_on(&self, date: NaiveDate, state: InstallmentState) -> Result<Vec<Installment>>;

    /// apply every op in the batch, or none of them
    fn commit(&mut self, batch: WriteBatch) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct Tables {
    workers: BTreeMap<WorkerCode, Worker>,
    loans: HashMap<LoanId, Loan>,
    installments: BTreeMap<InstallmentKey, Installment>,
}

impl Tables {
    fn apply(&mut self, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::PutWorker(worker) => {
                self.workers.insert(worker.code.clone(), worker);
            }
            WriteOp::PutLoan(loan) => {
                self.loans.insert(loan.id, loan);
            }
            WriteOp::ReplaceInstallments {
                loan_id,
                installments,
            } => {
                if !self.loans.contains_key(&loan_id) {
                    return Err(LoanError::StorageFailure {
                        message: format!("installments reference unknown loan {}", loan_id),
                    });
                }

                let mut numbers = HashSet::new();
                for installment in &installments {
                    if installment.loan_id != loan_id {
                        return Err(LoanError::StorageFailure {
                            message: format!(
                                "installment {} belongs to loan {}, not {}",
                                installment.sequence_number, installment.loan_id, loan_id
                            ),
                        });
                    }
                    if !numbers.insert(installment.sequence_number) {
                        return Err(LoanError::StorageFailure {
                            message: format!(
                                "duplicate installment number {} for loan {}",
                                installment.sequence_number, loan_id
                            ),
                        });
                    }
                }

                self.installments.retain(|key, _| key.loan_id != loan_id);
                for installment in installments {
                    self.installments.insert(installment.key(), installment);
                }
            }
            WriteOp::UpdateInstallment(update) => {
                let row = self
                    .installments
                    .get_mut(&update.key)
                    .ok_or_else(|| LoanError::StorageFailure {
                        message: format!("no row for {}", update.key),
                    })?;
                update.apply_to(row);
            }
        }
        Ok(())
    }
}

/// in-memory store; commits are applied to a staged copy and swapped in
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Tables,
    commits: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of successful commits
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn installment_count(&self) -> usize {
        self.tables.installments.len()
    }
}

impl LoanStore for MemoryStore {
    fn worker(&self, code: &str) -> Result<Option<Worker>> {
        Ok(self.tables.workers.get(code).cloned())
    }

    fn loan(&self, id: LoanId) -> Result<Option<Loan>> {
        Ok(self.tables.loans.get(&id).cloned())
    }

    fn loans(&self) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self.tables.loans.values().cloned().collect();
        loans.sort_by_key(|loan| (loan.terms.start_date, loan.id));
        Ok(loans)
    }

    fn installments(&self, loan_id: LoanId, order: InstallmentOrder) -> Result<Vec<Installment>> {
        let range = InstallmentKey::new(loan_id, 0)..=InstallmentKey::new(loan_id, u32::MAX);
        let mut rows: Vec<Installment> = self.tables.installments.range(range).map(|(_, i)| i.clone()).collect();

        if order == InstallmentOrder::ByDueDate {
            rows.sort_by_key(|i| (i.due_date, i.sequence_number));
        }
        Ok(rows)
    }

    fn installment(&self, key: &InstallmentKey) -> Result<Option<Installment>> {
        Ok(self.tables.installments.get(key).cloned())
    }

    fn installments_due_on(&self, date: NaiveDate, state: InstallmentState) -> Result<Vec<Installment>> {
        Ok(self
            .tables
            .installments
            .values()
            .filter(|i| i.due_date == date && i.state == state)
            .cloned()
            .collect())
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        let mut staged = self.tables.clone();
        for op in batch.into_ops() {
            staged.apply(op)?;
        }
        self.tables = staged;
        self.commits += 1;
        Ok(())
    }
}
