use std::collections::HashMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::documents::{LoanStatement, SelectionLine, SelectionSummary};
use crate::errors::{ErrorKind, LoanError, Result};
use crate::events::{Event, EventStore};
use crate::import::{ImportReport, RawLoanRecord, SkippedRecord};
use crate::lifecycle::{apply_bulk_action, BulkAction, BulkReport, PaymentOutcome};
use crate::loan::{Loan, LoanTerms, Worker};
use crate::schedule::{AmortizationSchedule, Installment};
use crate::store::{LoanStore, MemoryStore, WriteBatch};
use crate::types::{InstallmentKey, InstallmentOrder, InstallmentState, LoanId};

/// loan ledger: binds schedules and lifecycle transitions to a store
pub struct LoanLedger<S: LoanStore = MemoryStore> {
    store: S,
    config: LedgerConfig,
    events: EventStore,
}

impl LoanLedger<MemoryStore> {
    /// ledger over a fresh in-memory store with default configuration
    pub fn in_memory() -> Self {
        Self {
            store: MemoryStore::new(),
            config: LedgerConfig::default(),
            events: EventStore::new(),
        }
    }
}

impl<S: LoanStore> LoanLedger<S> {
    /// create a ledger; the configuration is validated first
    pub fn new(store: S, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            events: EventStore::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// add a borrower
    pub fn register_worker(&mut self, worker: Worker, time_provider: &SafeTimeProvider) -> Result<()> {
        worker.validate()?;

        if self.store.worker(&worker.code)?.is_some() {
            return Err(LoanError::invalid_input(
                "code",
                format!("worker {} is already registered", worker.code),
            ));
        }

        let code = worker.code.clone();
        let campus = worker.campus.clone();

        let mut batch = WriteBatch::new();
        batch.put_worker(worker);
        self.commit(batch)?;

        debug!(worker = %code, %campus, "worker registered");
        self.events.emit(Event::WorkerRegistered {
            code,
            campus,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// create a loan for a registered worker and generate its schedule
    pub fn create_loan(
        &mut self,
        worker_code: &str,
        terms: LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        terms.validate()?;

        let worker = self
            .store
            .worker(worker_code)?
            .ok_or_else(|| LoanError::WorkerNotFound {
                code: worker_code.to_string(),
            })?;

        let mut loan = Loan::new(worker.code, terms);
        let schedule = AmortizationSchedule::generate(&loan)?;
        loan.end_date = schedule.end_date();

        let mut batch = WriteBatch::new();
        batch
            .put_loan(loan.clone())
            .replace_installments(loan.id, schedule.installments.clone());
        self.commit(batch)?;

        info!(
            loan_id = %loan.id,
            worker = %loan.worker_code,
            principal = %loan.terms.principal,
            term = loan.terms.term,
            "loan created"
        );

        self.events.emit(Event::LoanCreated {
            loan_id: loan.id,
            worker_code: loan.worker_code.clone(),
            principal: loan.terms.principal,
            term: loan.terms.term,
            timestamp: time_provider.now(),
        });
        self.emit_schedule_generated(&schedule, time_provider);

        Ok(loan)
    }

    /// replace a loan's terms
    ///
    /// The schedule is regenerated only when the terms actually differ; an
    /// unchanged edit keeps every installment (and its state) as it is.
    pub fn edit_loan(
        &mut self,
        loan_id: LoanId,
        terms: LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        terms.validate()?;

        let mut loan = self.load_loan(loan_id)?;
        let regenerate = loan.terms != terms;
        loan.terms = terms;

        let mut batch = WriteBatch::new();
        let schedule = if regenerate {
            let schedule = AmortizationSchedule::generate(&loan)?;
            loan.end_date = schedule.end_date();
            batch
                .put_loan(loan.clone())
                .replace_installments(loan.id, schedule.installments.clone());
            Some(schedule)
        } else {
            batch.put_loan(loan.clone());
            None
        };
        self.commit(batch)?;

        debug!(%loan_id, regenerated = regenerate, "loan terms updated");
        self.events.emit(Event::LoanTermsUpdated {
            loan_id,
            schedule_regenerated: regenerate,
            timestamp: time_provider.now(),
        });
        if let Some(schedule) = &schedule {
            self.emit_schedule_generated(schedule, time_provider);
        }

        Ok(loan)
    }

    /// discard every installment of the loan and generate the schedule again
    pub fn regenerate_schedule(
        &mut self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<AmortizationSchedule> {
        let mut loan = self.load_loan(loan_id)?;
        let schedule = AmortizationSchedule::generate(&loan)?;
        loan.end_date = schedule.end_date();

        let mut batch = WriteBatch::new();
        batch
            .put_loan(loan)
            .replace_installments(loan_id, schedule.installments.clone());
        self.commit(batch)?;

        self.emit_schedule_generated(&schedule, time_provider);
        Ok(schedule)
    }

    /// record a payment against one installment
    pub fn record_payment(
        &mut self,
        key: InstallmentKey,
        reference: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        let mut installment = self.load_installment(&key)?;

        match installment.record_payment(reference)? {
            PaymentOutcome::Recorded => {
                let mut batch = WriteBatch::new();
                batch.update_installment(&installment);
                self.commit(batch)?;

                info!(%key, amount = %installment.total_amount, "payment recorded");
                self.events.emit(Event::PaymentRecorded {
                    key,
                    amount: installment.total_amount,
                    reference: installment.payment_reference.clone(),
                    timestamp: time_provider.now(),
                });
                Ok(PaymentOutcome::Recorded)
            }
            PaymentOutcome::AlreadyPaid => {
                warn!(%key, "payment already recorded, nothing to do");
                self.events.emit(Event::PaymentAlreadyRecorded {
                    key,
                    timestamp: time_provider.now(),
                });
                Ok(PaymentOutcome::AlreadyPaid)
            }
        }
    }

    /// manual due date override
    pub fn change_due_date(
        &mut self,
        key: InstallmentKey,
        new_date: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Installment> {
        let mut installment = self.load_installment(&key)?;
        let old_date = installment.due_date;
        installment.change_due_date(new_date)?;

        let mut batch = WriteBatch::new();
        batch.update_installment(&installment);
        self.commit(batch)?;

        self.events.emit(Event::DueDateChanged {
            key,
            old_date,
            new_date,
            timestamp: time_provider.now(),
        });
        Ok(installment)
    }

    /// push a pending installment to the next pay day; returns whether it moved
    pub fn reschedule(
        &mut self,
        key: InstallmentKey,
        reason: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<bool> {
        let mut installment = self.load_installment(&key)?;
        let old_date = installment.due_date;

        if !installment.reschedule(reason) {
            debug!(%key, state = %installment.state, "reschedule ignored");
            return Ok(false);
        }

        let mut batch = WriteBatch::new();
        batch.update_installment(&installment);
        self.commit(batch)?;

        self.events.emit(Event::InstallmentRescheduled {
            key,
            old_date,
            new_date: installment.due_date,
            reason: installment.note.clone(),
            timestamp: time_provider.now(),
        });
        Ok(true)
    }

    /// apply a bulk action to the selected installments in one commit
    ///
    /// Per-item conflicts are skipped and reported. A storage failure
    /// leaves every selected installment as it was.
    pub fn bulk_cancel(
        &mut self,
        keys: &[InstallmentKey],
        action: &BulkAction,
        time_provider: &SafeTimeProvider,
    ) -> Result<BulkReport> {
        let selection = keys
            .iter()
            .map(|key| Ok((*key, self.store.installment(key)?)))
            .collect::<Result<Vec<_>>>()?;

        let (changed, report) = apply_bulk_action(selection, action);

        if !changed.is_empty() {
            let mut batch = WriteBatch::new();
            for installment in &changed {
                batch.update_installment(installment);
            }
            self.commit(batch)?;
        }

        let skipped = report.items.len() - report.processed;
        info!(
            processed = report.processed,
            skipped,
            total = %report.processed_total,
            "bulk action applied"
        );

        self.events.emit(Event::BulkActionApplied {
            processed: report.processed,
            skipped,
            total: report.processed_total,
            timestamp: time_provider.now(),
        });
        Ok(report)
    }

    /// create and schedule a loan per record, each in its own commit
    ///
    /// Records with an unknown worker or invalid values are skipped; a
    /// storage failure stops the import with what was created so far kept.
    pub fn import(&mut self, records: &[RawLoanRecord], time_provider: &SafeTimeProvider) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let created = record
                .to_terms()
                .and_then(|terms| self.create_loan(&record.worker_code, terms, time_provider));

            match created {
                Ok(loan) => report.created.push(loan.id),
                Err(err) if err.kind() == ErrorKind::StorageFailure => return Err(err),
                Err(err) => {
                    let reason = err.to_string();
                    warn!(row, worker = %record.worker_code, %reason, "import record skipped");
                    self.events.emit(Event::ImportRecordSkipped {
                        row,
                        reason: reason.clone(),
                        timestamp: time_provider.now(),
                    });
                    report.skipped.push(SkippedRecord {
                        row,
                        worker_code: record.worker_code.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            created = report.created_count(),
            skipped = report.skipped_count(),
            "import finished"
        );
        Ok(report)
    }

    pub fn loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.load_loan(loan_id)
    }

    pub fn installment(&self, key: &InstallmentKey) -> Result<Installment> {
        self.load_installment(key)
    }

    /// installments of a loan, by sequence or by due date
    pub fn installments(&self, loan_id: LoanId, order: InstallmentOrder) -> Result<Vec<Installment>> {
        self.load_loan(loan_id)?;
        self.store.installments(loan_id, order)
    }

    /// statement document for one loan
    pub fn statement(&self, loan_id: LoanId) -> Result<LoanStatement> {
        let loan = self.load_loan(loan_id)?;
        let worker = self
            .store
            .worker(&loan.worker_code)?
            .ok_or_else(|| LoanError::WorkerNotFound {
                code: loan.worker_code.clone(),
            })?;
        let installments = self.store.installments(loan_id, InstallmentOrder::BySequence)?;

        Ok(LoanStatement::new(worker, &loan, &installments))
    }

    /// pending installments due on `date`, optionally for one campus only
    pub fn pending_due_on(&self, date: NaiveDate, campus: Option<&str>) -> Result<SelectionSummary> {
        let due = self.store.installments_due_on(date, InstallmentState::Pending)?;
        let mut workers: HashMap<LoanId, Worker> = HashMap::new();
        let mut lines = Vec::new();

        for installment in due {
            if !workers.contains_key(&installment.loan_id) {
                let loan = self.load_loan(installment.loan_id)?;
                let worker = self
                    .store
                    .worker(&loan.worker_code)?
                    .ok_or_else(|| LoanError::WorkerNotFound {
                        code: loan.worker_code.clone(),
                    })?;
                workers.insert(installment.loan_id, worker);
            }
            let Some(worker) = workers.get(&installment.loan_id) else {
                continue;
            };

            if campus.is_some_and(|c| worker.campus.to_lowercase() != c.trim().to_lowercase()) {
                continue;
            }

            lines.push(SelectionLine {
                key: installment.key(),
                worker_code: worker.code.clone(),
                worker_name: worker.name.clone(),
                campus: worker.campus.clone(),
                due_date: installment.due_date,
                total_amount: installment.total_amount,
            });
        }

        lines.sort_by(|a, b| a.worker_name.cmp(&b.worker_name).then(a.key.cmp(&b.key)));
        Ok(SelectionSummary::new(date, campus.map(|c| c.trim().to_string()), lines))
    }

    fn load_loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.store
            .loan(loan_id)?
            .ok_or(LoanError::LoanNotFound { id: loan_id })
    }

    fn load_installment(&self, key: &InstallmentKey) -> Result<Installment> {
        self.store
            .installment(key)?
            .ok_or(LoanError::InstallmentNotFound { key: *key })
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        let ops = batch.len();
        self.store.commit(batch).map_err(|err| {
            warn!(ops, error = %err, "commit failed, batch rolled back");
            err
        })
    }

    fn emit_schedule_generated(&mut self, schedule: &AmortizationSchedule, time_provider: &SafeTimeProvider) {
        let (Some(first_due_date), Some(end_date)) = (schedule.first_due_date(), schedule.end_date()) else {
            return;
        };

        info!(
            loan_id = %schedule.loan_id,
            installments = schedule.installments.len(),
            total = %schedule.total_amount,
            %end_date,
            "schedule generated"
        );

        self.events.emit(Event::ScheduleGenerated {
            loan_id: schedule.loan_id,
            installments: schedule.installments.len() as u32,
            total_amount: schedule.total_amount,
            first_due_date,
            end_date,
            timestamp: time_provider.now(),
        });
    }
}
