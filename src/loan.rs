use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{LoanId, WorkerCode};

/// largest principal a loan may carry (12 digits, 2 of them decimals)
pub const MAX_PRINCIPAL: Decimal = dec!(9999999999.99);

/// largest interest or commission percentage (5 digits, 2 of them decimals)
pub const MAX_RATE: Decimal = dec!(999.99);

/// borrower registered with the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub code: WorkerCode,
    pub name: String,
    pub campus: String,
}

impl Worker {
    pub fn new(code: impl Into<String>, name: impl Into<String>, campus: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_string(),
            name: name.into().trim().to_string(),
            campus: campus.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(LoanError::invalid_input("code", "worker code is required"));
        }
        if self.name.is_empty() {
            return Err(LoanError::invalid_input(
                "name",
                format!("worker {} needs a name", self.code),
            ));
        }
        Ok(())
    }
}

/// the amounts, rates and dates a schedule is generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// flat monthly rate, charged per half-month period at half its value
    pub monthly_interest_rate: Rate,
    /// one-time commission on the principal
    pub commission_rate: Rate,
    /// number of installments
    pub term: u32,
    /// intended first due date
    pub start_date: NaiveDate,
}

impl LoanTerms {
    /// create validated terms
    pub fn new(
        principal: Money,
        monthly_interest_rate: Rate,
        commission_rate: Rate,
        term: u32,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let terms = Self {
            principal,
            monthly_interest_rate,
            commission_rate,
            term,
            start_date,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn builder() -> LoanTermsBuilder {
        LoanTermsBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LoanError::invalid_input(
                "principal",
                format!("must be positive, got {}", self.principal),
            ));
        }
        if self.principal.as_decimal() > MAX_PRINCIPAL {
            return Err(LoanError::invalid_input(
                "principal",
                format!("must not exceed {}, got {}", MAX_PRINCIPAL, self.principal),
            ));
        }
        check_rate("monthly_interest_rate", self.monthly_interest_rate)?;
        check_rate("commission_rate", self.commission_rate)?;
        if self.term == 0 {
            return Err(LoanError::invalid_input("term", "must be at least 1 installment"));
        }
        Ok(())
    }
}

fn check_rate(field: &str, rate: Rate) -> Result<()> {
    if rate.is_negative() {
        return Err(LoanError::invalid_input(field, format!("must not be negative, got {}", rate)));
    }
    if rate.as_percent() > MAX_RATE {
        return Err(LoanError::invalid_input(field, format!("must not exceed {}%, got {}", MAX_RATE, rate)));
    }
    Ok(())
}

/// a loan record; its installments live in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub worker_code: WorkerCode,
    pub terms: LoanTerms,
    /// due date of the last installment, set by schedule generation
    pub end_date: Option<NaiveDate>,
}

impl Loan {
    pub fn new(worker_code: impl Into<String>, terms: LoanTerms) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker_code: worker_code.into(),
            terms,
            end_date: None,
        }
    }
}

/// builder for loan terms; rates and term fall back to ledger defaults
#[derive(Debug, Clone, Default)]
pub struct LoanTermsBuilder {
    principal: Option<Money>,
    monthly_interest_rate: Option<Rate>,
    commission_rate: Option<Rate>,
    term: Option<u32>,
    start_date: Option<NaiveDate>,
}

impl LoanTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn monthly_interest_rate(mut self, rate: Rate) -> Self {
        self.monthly_interest_rate = Some(rate);
        self
    }

    pub fn commission_rate(mut self, rate: Rate) -> Self {
        self.commission_rate = Some(rate);
        self
    }

    pub fn term(mut self, term: u32) -> Self {
        self.term = Some(term);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// build with the default configuration
    pub fn build(self) -> Result<LoanTerms> {
        self.build_with(&LedgerConfig::default())
    }

    /// build, filling rates and term from `config`
    pub fn build_with(self, config: &LedgerConfig) -> Result<LoanTerms> {
        let principal = self
            .principal
            .ok_or_else(|| LoanError::invalid_input("principal", "principal required"))?;

        let start_date = self
            .start_date
            .ok_or_else(|| LoanError::invalid_input("start_date", "start date required"))?;

        let term = self
            .term
            .unwrap_or_else(|| config.suggested_term(principal));

        LoanTerms::new(
            principal,
            self.monthly_interest_rate.unwrap_or(config.default_interest_rate),
            self.commission_rate.unwrap_or(config.default_commission_rate),
            term,
            start_date,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_terms_upper_bounds() {
        let terms = |principal: Decimal, rate: Decimal, commission: Decimal| {
            LoanTerms::new(
                Money::from_decimal(principal),
                Rate::from_percent(rate),
                Rate::from_percent(commission),
                11,
                start(),
            )
        };

        assert!(terms(MAX_PRINCIPAL, MAX_RATE, MAX_RATE).is_ok());
        assert!(matches!(
            terms(dec!(10000000000.00), dec!(3), dec!(10)),
            Err(LoanError::InvalidInput { ref field, .. }) if field == "principal"
        ));
        assert!(matches!(
            terms(dec!(500), dec!(1000), dec!(10)),
            Err(LoanError::InvalidInput { ref field, .. }) if field == "monthly_interest_rate"
        ));
        assert!(matches!(
            terms(dec!(500), dec!(3), dec!(100000)),
            Err(LoanError::InvalidInput { ref field, .. }) if field == "commission_rate"
        ));
    }

    #[test]
    fn test_builder_applies_defaults() {
        let terms = LoanTerms::builder()
            .principal(Money::from_major(500))
            .start_date(start())
            .build()
            .unwrap();

        assert_eq!(terms.monthly_interest_rate, Rate::from_percent(dec!(3)));
        assert_eq!(terms.commission_rate, Rate::from_percent(dec!(10)));
        assert_eq!(terms.term, 11);
    }

    #[test]
    fn test_builder_explicit_values_win() {
        let terms = LoanTerms::builder()
            .principal(Money::from_major(80))
            .monthly_interest_rate(Rate::from_percentage(2))
            .commission_rate(Rate::ZERO)
            .term(3)
            .start_date(start())
            .build()
            .unwrap();

        assert_eq!(terms.term, 3);
        assert_eq!(terms.commission_rate, Rate::ZERO);
    }

    #[test]
    fn test_builder_requires_principal_and_date() {
        let missing_principal = LoanTerms::builder().start_date(start()).build();
        assert!(matches!(missing_principal, Err(LoanError::InvalidInput { .. })));

        let missing_date = LoanTerms::builder().principal(Money::from_major(10)).build();
        assert!(matches!(missing_date, Err(LoanError::InvalidInput { .. })));
    }

    #[test]
    fn test_terms_validation() {
        let rate = Rate::from_percentage(3);

        assert!(LoanTerms::new(Money::ZERO, rate, rate, 4, start()).is_err());
        assert!(LoanTerms::new(Money::from_major(-5), rate, rate, 4, start()).is_err());
        assert!(LoanTerms::new(Money::from_major(100), rate, rate, 0, start()).is_err());
        assert!(LoanTerms::new(
            Money::from_major(100),
            Rate::from_percent(dec!(-1)),
            rate,
            4,
            start()
        )
        .is_err());
        assert!(LoanTerms::new(Money::from_major(100), rate, rate, 4, start()).is_ok());
    }

    #[test]
    fn test_worker_validation() {
        assert!(Worker::new("  ", "Ana", "LEÓN").validate().is_err());
        assert!(Worker::new("W-01", "", "LEÓN").validate().is_err());

        let worker = Worker::new(" W-01 ", "Ana Ruiz", "LEÓN");
        assert!(worker.validate().is_ok());
        assert_eq!(worker.code, "W-01");
    }
}
