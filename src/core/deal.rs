use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealLevel {
    #[serde(rename = "AFFARE_ECCEZIONALE")]
    Exceptional,
    #[serde(rename = "OTTIMO_AFFARE")]
    Great,
    #[serde(rename = "IN_LINEA")]
    InLine,
    #[serde(rename = "MARGINE_TRATTATIVA")]
    Negotiable,
    #[serde(rename = "SOPRAVVALUTATO")]
    Overpriced,
}

impl DealLevel {
    pub fn stars(&self) -> u8 {
        match self {
            DealLevel::Exceptional => 5,
            DealLevel::Great => 4,
            DealLevel::InLine => 3,
            DealLevel::Negotiable => 2,
            DealLevel::Overpriced => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealLevel::Exceptional => "Affare Eccezionale",
            DealLevel::Great => "Ottimo Affare",
            DealLevel::InLine => "In Linea",
            DealLevel::Negotiable => "Margine di Trattativa",
            DealLevel::Overpriced => "Sopravvalutato",
        }
    }
}

/// How an asking price compares with an estimated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealScore {
    pub level: DealLevel,
    pub stars: u8,
    /// Signed deviation of the asking price from the estimate, in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub deviation_pct: Decimal,
}

/// Scores `asking_price` against `estimated_value`. `None` when the estimate is
/// not positive or the deviation does not fit in a `Decimal`.
pub fn deal_score(asking_price: Decimal, estimated_value: Decimal) -> Option<DealScore> {
    if estimated_value <= Decimal::ZERO {
        return None;
    }

    let deviation = asking_price
        .checked_sub(estimated_value)?
        .checked_div(estimated_value)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    let level = if deviation <= Decimal::from(-10) {
        DealLevel::Exceptional
    } else if deviation <= Decimal::from(-5) {
        DealLevel::Great
    } else if deviation <= Decimal::from(5) {
        DealLevel::InLine
    } else if deviation <= Decimal::from(15) {
        DealLevel::Negotiable
    } else {
        DealLevel::Overpriced
    };

    Some(DealScore {
        level,
        stars: level.stars(),
        deviation_pct: deviation.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
    })
}
