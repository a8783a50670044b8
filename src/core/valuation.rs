//! Bare-ownership valuation.
//!
//! The split between life estate (usufrutto) and bare ownership (nuda
//! proprietà) is read from an age-indexed coefficient table. Everything here is
//! pure: no I/O, no interior mutability, safe to share across threads.

use crate::domain::model::{CoefficientBracket, ValuationQuote};
use crate::utils::error::{MarketError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::{Arc, LazyLock};

pub const MIN_BENEFICIARY_AGE: u32 = 20;
pub const MAX_BENEFICIARY_AGE: u32 = 100;

/// Minor currency unit (cents).
const MONEY_SCALE: u32 = 2;

/// Statutory interest rate (tasso legale) for 2025: 2.5%.
pub fn default_legal_rate() -> Decimal {
    Decimal::new(25, 3)
}

// min age, coefficient, usufruct %, bare % (all in tenths)
const STATUTORY_ROWS: [(u32, i64, i64, i64); 20] = [
    (20, 190, 950, 50),
    (30, 180, 900, 100),
    (40, 170, 850, 150),
    (50, 160, 800, 200),
    (55, 150, 750, 250),
    (60, 140, 700, 300),
    (65, 130, 650, 350),
    (67, 125, 625, 375),
    (70, 120, 600, 400),
    (72, 115, 575, 425),
    (75, 110, 550, 450),
    (77, 105, 525, 475),
    (80, 100, 500, 500),
    (82, 95, 475, 525),
    (85, 90, 450, 550),
    (87, 85, 425, 575),
    (90, 80, 400, 600),
    (92, 75, 375, 625),
    (95, 70, 350, 650),
    (100, 50, 250, 750),
];

static STATUTORY_TABLE: LazyLock<Arc<CoefficientTable>> = LazyLock::new(|| {
    let brackets = STATUTORY_ROWS
        .iter()
        .map(|&(age, coefficient, usufruct, bare)| {
            CoefficientBracket::new(
                age,
                Decimal::new(coefficient, 1),
                Decimal::new(usufruct, 1),
                Decimal::new(bare, 1),
            )
        })
        .collect();
    Arc::new(CoefficientTable { brackets })
});

/// Immutable, age-ordered set of coefficient brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientTable {
    brackets: Vec<CoefficientBracket>,
}

impl CoefficientTable {
    /// Builds a table after checking that it is non-empty, strictly ordered by
    /// `min_age` and that every row splits exactly 100%.
    pub fn new(brackets: Vec<CoefficientBracket>) -> Result<Self> {
        if brackets.is_empty() {
            return Err(MarketError::InvalidTable {
                reason: "table has no brackets".to_string(),
            });
        }

        let hundred = Decimal::ONE_HUNDRED;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.usufruct_pct + bracket.bare_pct != hundred {
                return Err(MarketError::InvalidTable {
                    reason: format!(
                        "bracket for age {} splits {}% + {}%, expected 100%",
                        bracket.min_age, bracket.usufruct_pct, bracket.bare_pct
                    ),
                });
            }
            if bracket.bare_pct.is_sign_negative() || bracket.usufruct_pct.is_sign_negative() {
                return Err(MarketError::InvalidTable {
                    reason: format!("bracket for age {} has a negative share", bracket.min_age),
                });
            }
            if bracket.coefficient <= Decimal::ZERO {
                return Err(MarketError::InvalidTable {
                    reason: format!("bracket for age {} has a non-positive coefficient", bracket.min_age),
                });
            }
            if index > 0 && brackets[index - 1].min_age >= bracket.min_age {
                return Err(MarketError::InvalidTable {
                    reason: format!(
                        "min_age must be strictly increasing ({} follows {})",
                        bracket.min_age,
                        brackets[index - 1].min_age
                    ),
                });
            }
        }

        Ok(Self { brackets })
    }

    /// The statutory life-estate table, shared process-wide.
    pub fn statutory() -> Arc<CoefficientTable> {
        Arc::clone(&STATUTORY_TABLE)
    }

    pub fn brackets(&self) -> &[CoefficientBracket] {
        &self.brackets
    }

    pub fn lowest(&self) -> &CoefficientBracket {
        &self.brackets[0]
    }

    /// Bracket with the largest `min_age` not above `age`.
    ///
    /// Ages below the first bracket get the lowest bracket rather than an
    /// error; callers validate the age range before getting here.
    pub fn bracket_for(&self, age: u32) -> &CoefficientBracket {
        let mut selected = self.lowest();
        for bracket in &self.brackets {
            if bracket.min_age <= age {
                selected = bracket;
            } else {
                break;
            }
        }
        selected
    }
}

/// Computes bare-ownership quotes against a coefficient table.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    table: Arc<CoefficientTable>,
    age_range: RangeInclusive<u32>,
    legal_rate: Decimal,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new(CoefficientTable::statutory())
    }
}

impl ValuationEngine {
    pub fn new(table: Arc<CoefficientTable>) -> Self {
        Self {
            table,
            age_range: MIN_BENEFICIARY_AGE..=MAX_BENEFICIARY_AGE,
            legal_rate: default_legal_rate(),
        }
    }

    pub fn with_legal_rate(mut self, legal_rate: Decimal) -> Self {
        self.legal_rate = legal_rate;
        self
    }

    pub fn legal_rate(&self) -> Decimal {
        self.legal_rate
    }

    pub fn with_age_range(mut self, min_age: u32, max_age: u32) -> Self {
        self.age_range = min_age..=max_age;
        self
    }

    pub fn table(&self) -> &CoefficientTable {
        &self.table
    }

    pub fn age_range(&self) -> (u32, u32) {
        (*self.age_range.start(), *self.age_range.end())
    }

    /// Inside the configured range and covered by the table's lowest bracket.
    pub fn accepts_age(&self, age: u32) -> bool {
        self.age_range.contains(&age) && age >= self.table.lowest().min_age
    }

    pub fn bracket_for(&self, age: u32) -> &CoefficientBracket {
        self.table.bracket_for(age)
    }

    /// Splits `full_value` for a beneficiary of `beneficiary_age`.
    ///
    /// Returns `None` for a value that is not positive once rounded to cents,
    /// an age outside the accepted range, or a value too large to split
    /// without overflowing. Amounts are rounded to cents with banker's
    /// rounding and the life-estate share is taken as the remainder, so
    /// `bare_property_value + usufruct_value == full_value` holds exactly.
    pub fn quote(&self, full_value: Decimal, beneficiary_age: u32) -> Option<ValuationQuote> {
        let full_value = round_money(full_value);
        if full_value <= Decimal::ZERO || !self.accepts_age(beneficiary_age) {
            tracing::debug!(
                "No quote for value {} and age {}: outside accepted domain",
                full_value,
                beneficiary_age
            );
            return None;
        }

        let bracket = self.table.bracket_for(beneficiary_age);
        let Some(bare_property_value) = full_value
            .checked_mul(bracket.bare_pct)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(round_money)
        else {
            tracing::debug!("No quote for value {}: split overflows", full_value);
            return None;
        };
        let usufruct_value = full_value - bare_property_value;
        let savings = full_value - bare_property_value;

        Some(ValuationQuote {
            full_value,
            beneficiary_age,
            bare_property_value,
            usufruct_value,
            savings,
            bare_pct: bracket.bare_pct,
            usufruct_pct: bracket.usufruct_pct,
            coefficient: bracket.coefficient,
        })
    }

    pub fn quote_request(&self, request: &ValuationRequest) -> Option<ValuationQuote> {
        let age = u32::try_from(request.beneficiary_age).ok()?;
        self.quote(request.full_value, age)
    }

    /// Tax-office valuation: the life estate is worth the annual yield at the
    /// legal rate times the bracket coefficient, and bare ownership is the
    /// rest. Same domain as `quote`; also `None` when the life estate would
    /// exceed the full value.
    pub fn fiscal_value(&self, full_value: Decimal, beneficiary_age: u32) -> Option<FiscalValue> {
        let full_value = round_money(full_value);
        if full_value <= Decimal::ZERO || !self.accepts_age(beneficiary_age) {
            return None;
        }

        let bracket = self.table.bracket_for(beneficiary_age);
        let annuity = round_money(full_value.checked_mul(self.legal_rate)?);
        let usufruct_value = round_money(annuity.checked_mul(bracket.coefficient)?);
        if usufruct_value > full_value {
            tracing::debug!(
                "No fiscal value for {} at rate {}: life estate {} exceeds it",
                full_value,
                self.legal_rate,
                usufruct_value
            );
            return None;
        }

        Some(FiscalValue {
            full_value,
            legal_rate: self.legal_rate,
            coefficient: bracket.coefficient,
            annuity,
            usufruct_value,
            bare_property_value: full_value - usufruct_value,
        })
    }
}

/// Result of `ValuationEngine::fiscal_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalValue {
    #[serde(with = "rust_decimal::serde::float")]
    pub full_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub legal_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub coefficient: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub annuity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usufruct_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bare_property_value: Decimal,
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Inbound valuation payload: `{ "fullValue": 300000, "beneficiaryAge": 75 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValuationRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub full_value: Decimal,
    pub beneficiary_age: i64,
}

impl ValuationRequest {
    /// Parses a request body. Malformed payloads (missing fields, a
    /// non-integer age, a non-numeric value) are rejected here; well-typed but
    /// out-of-range values are left to `ValuationEngine::quote`.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| MarketError::validation("valuation request", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[test]
    fn statutory_table_has_twenty_brackets_that_split_to_100() {
        let table = CoefficientTable::statutory();
        assert_eq!(table.brackets().len(), 20);
        for bracket in table.brackets() {
            assert_eq!(bracket.usufruct_pct + bracket.bare_pct, Decimal::ONE_HUNDRED);
        }
        let ages: Vec<u32> = table.brackets().iter().map(|b| b.min_age).collect();
        assert_eq!(
            ages,
            vec![20, 30, 40, 50, 55, 60, 65, 67, 70, 72, 75, 77, 80, 82, 85, 87, 90, 92, 95, 100]
        );
    }

    #[test]
    fn statutory_table_passes_its_own_validation() {
        let table = CoefficientTable::statutory();
        assert!(CoefficientTable::new(table.brackets().to_vec()).is_ok());
    }

    #[test]
    fn bracket_for_picks_largest_min_age_not_above_age() {
        let table = CoefficientTable::statutory();
        assert_eq!(table.bracket_for(68).min_age, 67);
        assert_eq!(table.bracket_for(67).min_age, 67);
        assert_eq!(table.bracket_for(99).min_age, 95);
        assert_eq!(table.bracket_for(100).min_age, 100);
        assert_eq!(table.bracket_for(130).min_age, 100);
    }

    #[test]
    fn bracket_for_below_table_returns_lowest() {
        let table = CoefficientTable::statutory();
        assert_eq!(table.bracket_for(5).min_age, 20);
        assert_eq!(table.bracket_for(0).min_age, 20);
    }

    #[test]
    fn bracket_for_is_monotonic() {
        let table = CoefficientTable::statutory();
        let mut previous = table.bracket_for(0).min_age;
        for age in 1..=120 {
            let current = table.bracket_for(age).min_age;
            assert!(previous <= current, "age {} went from {} to {}", age, previous, current);
            previous = current;
        }
    }

    #[test]
    fn quote_at_75_uses_the_45_percent_bracket() {
        let engine = ValuationEngine::default();
        let quote = engine.quote(dec(300_000), 75).unwrap();

        assert_eq!(quote.coefficient, dec(11));
        assert_eq!(quote.usufruct_pct, dec(55));
        assert_eq!(quote.bare_pct, dec(45));
        assert_eq!(quote.bare_property_value, dec(135_000));
        assert_eq!(quote.usufruct_value, dec(165_000));
        assert_eq!(quote.savings, dec(165_000));
    }

    #[test]
    fn quote_at_68_falls_back_to_the_67_bracket() {
        let engine = ValuationEngine::default();
        let quote = engine.quote(dec(300_000), 68).unwrap();

        assert_eq!(quote.coefficient, Decimal::new(125, 1));
        assert_eq!(quote.bare_pct, Decimal::new(375, 1));
        assert_eq!(quote.bare_property_value, dec(112_500));
        assert_eq!(quote.usufruct_value, dec(187_500));
    }

    #[test]
    fn quote_rejects_out_of_domain_inputs() {
        let engine = ValuationEngine::default();
        assert!(engine.quote(Decimal::ZERO, 70).is_none());
        assert!(engine.quote(dec(-1), 70).is_none());
        assert!(engine.quote(dec(200_000), 19).is_none());
        assert!(engine.quote(dec(200_000), 101).is_none());
        assert!(engine.quote(dec(200_000), 20).is_some());
        assert!(engine.quote(dec(200_000), 100).is_some());
    }

    #[test]
    fn split_is_exact_after_bankers_rounding() {
        let engine = ValuationEngine::default();
        // 123457 * 37.5% = 46296.375, rounds to even
        let quote = engine.quote(dec(123_457), 67).unwrap();
        assert_eq!(quote.bare_property_value, Decimal::new(4_629_638, 2));
        assert_eq!(quote.usufruct_value, Decimal::new(7_716_062, 2));
        assert_eq!(quote.bare_property_value + quote.usufruct_value, quote.full_value);

        let independent = round_money(quote.full_value * quote.usufruct_pct / Decimal::ONE_HUNDRED);
        assert!((independent - quote.usufruct_value).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn split_is_exact_for_every_age() {
        let engine = ValuationEngine::default();
        let value = Decimal::new(98_765_43, 2);
        for age in MIN_BENEFICIARY_AGE..=MAX_BENEFICIARY_AGE {
            let quote = engine.quote(value, age).unwrap();
            assert_eq!(quote.bare_property_value + quote.usufruct_value, value);
            assert_eq!(quote.savings, quote.full_value - quote.bare_property_value);
        }
    }

    #[test]
    fn custom_age_range_narrows_quotes() {
        let engine = ValuationEngine::default().with_age_range(50, 90);
        assert!(engine.quote(dec(100_000), 45).is_none());
        assert!(engine.quote(dec(100_000), 91).is_none());
        assert!(engine.quote(dec(100_000), 60).is_some());
    }

    #[test]
    fn quote_is_none_when_the_split_overflows() {
        let engine = ValuationEngine::default();
        assert!(engine.quote(Decimal::MAX, 75).is_none());
        assert!(engine.quote(Decimal::MAX, 20).is_none());

        // large but splittable
        let big = Decimal::from_str("1000000000000000000000000").unwrap();
        let quote = engine.quote(big, 80).unwrap();
        assert_eq!(quote.bare_property_value + quote.usufruct_value, big);
    }

    #[test]
    fn sub_cent_value_gets_no_quote() {
        let engine = ValuationEngine::default();
        assert!(engine.quote(Decimal::new(1, 3), 70).is_none());
        assert!(engine.quote(Decimal::new(5, 3), 70).is_none());
        let quote = engine.quote(Decimal::new(6, 3), 70).unwrap();
        assert_eq!(quote.full_value, Decimal::new(1, 2));
    }

    #[test]
    fn age_below_the_lowest_bracket_is_rejected_even_if_range_allows_it() {
        let engine = ValuationEngine::default().with_age_range(5, 120);
        assert!(engine.quote(dec(300_000), 5).is_none());
        assert!(engine.quote(dec(300_000), 19).is_none());
        assert!(engine.quote(dec(300_000), 20).is_some());

        let table = CoefficientTable::new(vec![
            CoefficientBracket::new(30, dec(18), dec(90), dec(10)),
            CoefficientBracket::new(60, Decimal::new(125, 1), Decimal::new(625, 1), Decimal::new(375, 1)),
        ])
        .unwrap();
        let engine = ValuationEngine::new(Arc::new(table));
        assert!(!engine.accepts_age(25));
        assert!(engine.accepts_age(30));
    }

    #[test]
    fn fiscal_value_uses_the_legal_rate_annuity() {
        let engine = ValuationEngine::default();
        let fiscal = engine.fiscal_value(dec(300_000), 75).unwrap();

        assert_eq!(fiscal.legal_rate, Decimal::new(25, 3));
        assert_eq!(fiscal.annuity, dec(7_500));
        assert_eq!(fiscal.coefficient, dec(11));
        assert_eq!(fiscal.usufruct_value, dec(82_500));
        assert_eq!(fiscal.bare_property_value, dec(217_500));
    }

    #[test]
    fn fiscal_value_shares_the_quote_domain() {
        let engine = ValuationEngine::default();
        assert!(engine.fiscal_value(Decimal::ZERO, 75).is_none());
        assert!(engine.fiscal_value(dec(300_000), 19).is_none());
        // must not panic, whatever the outcome
        let _ = engine.fiscal_value(Decimal::MAX, 20);

        // 10% of 100000 times 19 exceeds the full value
        let steep = ValuationEngine::default().with_legal_rate(Decimal::new(10, 2));
        assert!(steep.fiscal_value(dec(100_000), 20).is_none());
        assert!(steep.fiscal_value(dec(100_000), 100).is_some());
    }

    #[test]
    fn table_rejects_rows_that_do_not_split_to_100() {
        let err = CoefficientTable::new(vec![CoefficientBracket::new(20, dec(19), dec(90), dec(5))]).unwrap_err();
        assert!(matches!(err, MarketError::InvalidTable { .. }));
    }

    #[test]
    fn table_rejects_unordered_rows() {
        let rows = vec![
            CoefficientBracket::new(50, dec(16), dec(80), dec(20)),
            CoefficientBracket::new(40, dec(17), dec(85), dec(15)),
        ];
        assert!(CoefficientTable::new(rows).is_err());
        assert!(CoefficientTable::new(Vec::new()).is_err());
    }

    #[test]
    fn request_parsing_fails_fast_on_malformed_age() {
        assert!(ValuationRequest::from_json(r#"{"fullValue": 300000, "beneficiaryAge": "old"}"#).is_err());
        assert!(ValuationRequest::from_json(r#"{"fullValue": 300000, "beneficiaryAge": 68.5}"#).is_err());
        assert!(ValuationRequest::from_json(r#"{"fullValue": 300000}"#).is_err());
    }

    #[test]
    fn well_typed_out_of_range_request_yields_no_quote() {
        let engine = ValuationEngine::default();
        let request = ValuationRequest::from_json(r#"{"fullValue": 300000, "beneficiaryAge": -3}"#).unwrap();
        assert!(engine.quote_request(&request).is_none());

        let request = ValuationRequest::from_json(r#"{"fullValue": 300000, "beneficiaryAge": 75}"#).unwrap();
        let quote = engine.quote_request(&request).unwrap();
        assert_eq!(quote.bare_property_value, dec(135_000));
    }

    #[test]
    fn quote_serializes_with_camel_case_numbers() {
        let engine = ValuationEngine::default();
        let quote = engine.quote(dec(300_000), 75);
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["barePropertyValue"], serde_json::json!(135000.0));
        assert_eq!(json["usufructPct"], serde_json::json!(55.0));

        let none: Option<ValuationQuote> = engine.quote(dec(300_000), 10);
        assert_eq!(serde_json::to_string(&none).unwrap(), "null");
    }
}
