//! Bulk loan import.
//!
//! Records arrive with binary floats for amounts (spreadsheet exports). They
//! are converted to cents here and never used as floats again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::LoanTerms;
use crate::types::{LoanId, WorkerCode};

/// one raw loan row as exported by the payroll office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLoanRecord {
    pub worker_code: WorkerCode,
    pub principal: f64,
    pub interest_rate: f64,
    pub commission_rate: f64,
    pub term: i64,
    pub start_date: NaiveDate,
}

impl RawLoanRecord {
    /// validated terms for this record
    pub fn to_terms(&self) -> Result<LoanTerms> {
        if !self.principal.is_finite() || !self.interest_rate.is_finite() || !self.commission_rate.is_finite() {
            return Err(LoanError::invalid_input(
                "principal",
                format!("non-finite amount in record for worker {}", self.worker_code),
            ));
        }

        let term = u32::try_from(self.term)
            .map_err(|_| LoanError::invalid_input("term", format!("{} is not a valid term", self.term)))?;

        LoanTerms::new(
            Money::from_f64(self.principal)?,
            Rate::from_f64(self.interest_rate)?,
            Rate::from_f64(self.commission_rate)?,
            term,
            self.start_date,
        )
    }
}

/// parse a JSON array of records
pub fn parse_records(json: &str) -> Result<Vec<RawLoanRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// a row that was not imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// 1-based position in the input
    pub row: usize,
    pub worker_code: WorkerCode,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<LoanId>,
    pub skipped: Vec<SkippedRecord>,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
