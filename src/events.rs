use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentKey, LoanId, WorkerCode};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // registry events
    WorkerRegistered {
        code: WorkerCode,
        campus: String,
        timestamp: DateTime<Utc>,
    },

    // loan events
    LoanCreated {
        loan_id: LoanId,
        worker_code: WorkerCode,
        principal: Money,
        term: u32,
        timestamp: DateTime<Utc>,
    },
    LoanTermsUpdated {
        loan_id: LoanId,
        schedule_regenerated: bool,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        total_amount: Money,
        first_due_date: NaiveDate,
        end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // installment events
    PaymentRecorded {
        key: InstallmentKey,
        amount: Money,
        reference: Option<String>,
        timestamp: DateTime<Utc>,
    },
    PaymentAlreadyRecorded {
        key: InstallmentKey,
        timestamp: DateTime<Utc>,
    },
    DueDateChanged {
        key: InstallmentKey,
        old_date: NaiveDate,
        new_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InstallmentRescheduled {
        key: InstallmentKey,
        old_date: NaiveDate,
        new_date: NaiveDate,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    BulkActionApplied {
        processed: usize,
        skipped: usize,
        total: Money,
        timestamp: DateTime<Utc>,
    },

    // import events
    ImportRecordSkipped {
        row: usize,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
