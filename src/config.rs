use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// ledger configuration: defaults offered when a loan is drafted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// monthly interest rate applied when none is given
    pub default_interest_rate: Rate,
    /// one-time commission applied when none is given
    pub default_commission_rate: Rate,
    /// suggested term by principal, ascending by `up_to`
    pub term_brackets: Vec<TermBracket>,
    /// term suggested above the last bracket
    pub fallback_term: u32,
}

/// principal ceiling and the number of installments suggested up to it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermBracket {
    pub up_to: Money,
    pub term: u32,
}

impl TermBracket {
    pub fn new(up_to: Money, term: u32) -> Self {
        Self { up_to, term }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_interest_rate: Rate::from_percent(dec!(3)),
            default_commission_rate: Rate::from_percent(dec!(10)),
            term_brackets: vec![
                TermBracket::new(Money::from_major(50), 4),
                TermBracket::new(Money::from_major(100), 6),
                TermBracket::new(Money::from_major(150), 6),
                TermBracket::new(Money::from_major(200), 7),
                TermBracket::new(Money::from_major(250), 7),
                TermBracket::new(Money::from_major(300), 8),
                TermBracket::new(Money::from_major(350), 9),
                TermBracket::new(Money::from_major(400), 10),
                TermBracket::new(Money::from_major(450), 11),
                TermBracket::new(Money::from_major(500), 11),
            ],
            fallback_term: 12,
        }
    }
}

impl LedgerConfig {
    /// load from json, validating the result
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_interest_rate.is_negative() {
            return Err(LoanError::invalid_input(
                "default_interest_rate",
                "must not be negative",
            ));
        }
        if self.default_commission_rate.is_negative() {
            return Err(LoanError::invalid_input(
                "default_commission_rate",
                "must not be negative",
            ));
        }
        if self.fallback_term == 0 || self.term_brackets.iter().any(|b| b.term == 0) {
            return Err(LoanError::invalid_input("term_brackets", "terms must be at least 1"));
        }
        if self
            .term_brackets
            .windows(2)
            .any(|pair| pair[0].up_to >= pair[1].up_to)
        {
            return Err(LoanError::invalid_input(
                "term_brackets",
                "ceilings must be strictly ascending",
            ));
        }
        Ok(())
    }

    /// term suggested for a principal: first bracket whose ceiling covers it
    pub fn suggested_term(&self, principal: Money) -> u32 {
        self.term_brackets
            .iter()
            .find(|bracket| principal <= bracket.up_to)
            .map(|bracket| bracket.term)
            .unwrap_or(self.fallback_term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_term_brackets() {
        let config = LedgerConfig::default();

        assert_eq!(config.suggested_term(Money::from_major(30)), 4);
        assert_eq!(config.suggested_term(Money::from_major(50)), 4);
        assert_eq!(config.suggested_term(Money::from_minor(5001)), 6);
        assert_eq!(config.suggested_term(Money::from_major(300)), 8);
        assert_eq!(config.suggested_term(Money::from_major(500)), 11);
        assert_eq!(config.suggested_term(Money::from_major(2_000)), 12);
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let config = LedgerConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(LedgerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_unordered_brackets() {
        let json = r#"{
            "default_interest_rate": "3",
            "default_commission_rate": "10",
            "term_brackets": [
                { "up_to": "200.00", "term": 7 },
                { "up_to": "100.00", "term": 6 }
            ],
            "fallback_term": 12
        }"#;

        assert!(LedgerConfig::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_zero_fallback_term() {
        let mut config = LedgerConfig::default();
        config.fallback_term = 0;
        assert!(config.validate().is_err());
    }
}
