use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::{Loan, LoanTerms, MAX_PRINCIPAL, MAX_RATE};
use crate::types::LoanId;

use super::dates::sequence;
use super::Installment;

/// per-period and total amounts derived from the loan terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAmounts {
    pub interest_per_period: Money,
    pub total_interest: Money,
    pub total_commission: Money,
    pub principal_per_period: Money,
    pub commission_per_period: Money,
}

/// compute the fixed installment amounts
///
/// Each period is half a month, so the monthly rate is halved. Every value is
/// rounded half-up to cents from its exact decimal expression; total interest
/// is computed on its own rather than as `interest_per_period * term`, so the
/// two may differ by a few cents on long terms and the last installment
/// absorbs the gap.
pub fn compute_fixed_amounts(
    principal: Money,
    monthly_interest_rate: Rate,
    commission_rate: Rate,
    term: u32,
) -> Result<FixedAmounts> {
    if !principal.is_positive() {
        return Err(LoanError::invalid_input(
            "principal",
            format!("must be positive, got {}", principal),
        ));
    }
    if monthly_interest_rate.is_negative() || commission_rate.is_negative() {
        return Err(LoanError::invalid_input("rate", "rates must not be negative"));
    }
    if term == 0 {
        return Err(LoanError::invalid_input("term", "must be at least 1 installment"));
    }

    let p = principal.as_decimal();
    if p > MAX_PRINCIPAL {
        return Err(LoanError::invalid_input(
            "principal",
            format!("must not exceed {}, got {}", MAX_PRINCIPAL, principal),
        ));
    }
    if monthly_interest_rate.as_percent() > MAX_RATE || commission_rate.as_percent() > MAX_RATE {
        return Err(LoanError::invalid_input("rate", format!("rates must not exceed {}%", MAX_RATE)));
    }

    let out_of_range = || {
        LoanError::invalid_input(
            "principal",
            format!("amounts for {} over {} installments are out of range", principal, term),
        )
    };

    let periods = Decimal::from(term);
    let half_month_rate = monthly_interest_rate.as_percent() / dec!(100) / dec!(2);
    let interest_per_period = p.checked_mul(half_month_rate).ok_or_else(out_of_range)?;
    let total_interest = interest_per_period.checked_mul(periods).ok_or_else(out_of_range)?;
    let commission = p
        .checked_mul(commission_rate.as_percent())
        .ok_or_else(out_of_range)?
        / dec!(100);

    let total_commission = Money::from_decimal(commission);

    Ok(FixedAmounts {
        interest_per_period: Money::from_decimal(interest_per_period),
        total_interest: Money::from_decimal(total_interest),
        total_commission,
        principal_per_period: Money::from_decimal(p / periods),
        commission_per_period: Money::from_decimal(total_commission.as_decimal() / periods),
    })
}

impl FixedAmounts {
    /// (principal, commission, interest) of the last installment: whatever the
    /// first `term - 1` installments leave over
    pub fn last_period(&self, principal: Money, term: u32) -> (Money, Money, Money) {
        let previous = Decimal::from(term.saturating_sub(1));
        let remainder = |total: Money, per_period: Money| {
            Money::from_decimal(total.as_decimal() - per_period.as_decimal() * previous)
        };

        (
            remainder(principal, self.principal_per_period),
            remainder(self.total_commission, self.commission_per_period),
            remainder(self.total_interest, self.interest_per_period),
        )
    }

    /// principal + total interest + total commission
    pub fn total_due(&self, principal: Money) -> Money {
        principal + self.total_interest + self.total_commission
    }
}

/// generated schedule for one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_id: LoanId,
    pub fixed: FixedAmounts,
    pub installments: Vec<Installment>,
    pub total_amount: Money,
}

impl AmortizationSchedule {
    /// generate the full installment set for a loan
    pub fn generate(loan: &Loan) -> Result<Self> {
        Self::generate_for(loan.id, &loan.terms)
    }

    /// generate from terms alone
    ///
    /// Fails with `InvalidInput` on `term` when the last installment would
    /// need a negative principal, commission or interest component (e.g. a
    /// few cents spread over many installments); nothing is generated then.
    pub fn generate_for(loan_id: LoanId, terms: &LoanTerms) -> Result<Self> {
        terms.validate()?;

        let fixed = compute_fixed_amounts(
            terms.principal,
            terms.monthly_interest_rate,
            terms.commission_rate,
            terms.term,
        )?;

        let (last_principal, last_commission, last_interest) =
            fixed.last_period(terms.principal, terms.term);

        if last_principal.is_negative() || last_commission.is_negative() || last_interest.is_negative() {
            return Err(LoanError::invalid_input(
                "term",
                format!(
                    "{} installments leave a negative final installment for principal {}",
                    terms.term, terms.principal
                ),
            ));
        }

        let installments: Vec<Installment> = sequence(terms.start_date, terms.term)
            .zip(1..=terms.term)
            .map(|(due_date, number)| {
                if number < terms.term {
                    Installment::pending(
                        loan_id,
                        number,
                        fixed.principal_per_period,
                        fixed.commission_per_period,
                        fixed.interest_per_period,
                        due_date,
                    )
                } else {
                    Installment::pending(
                        loan_id,
                        number,
                        last_principal,
                        last_commission,
                        last_interest,
                        due_date,
                    )
                }
            })
            .collect();

        let total_amount = installments.iter().map(|i| i.total_amount).sum();

        Ok(Self {
            loan_id,
            fixed,
            installments,
            total_amount,
        })
    }

    /// due date of the last installment
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.installments.last().map(|i| i.due_date)
    }

    pub fn first_due_date(&self) -> Option<NaiveDate> {
        self.installments.first().map(|i| i.due_date)
    }

    pub fn get_installment(&self, sequence_number: u32) -> Option<&Installment> {
        sequence_number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }
}

/// installments for a loan, ordered by sequence number
pub fn generate_schedule(loan: &Loan) -> Result<Vec<Installment>> {
    Ok(AmortizationSchedule::generate(loan)?.installments)
}
