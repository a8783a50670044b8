use crate::core::deal::{deal_score, DealScore};
use crate::core::merit::{MeritBreakdown, MeritFactors};
use crate::core::surface::{commercial_surface, CommercialSurface, SurfaceInput};
use crate::core::valuation::{round_money, FiscalValue, ValuationEngine};
use crate::domain::model::ValuationQuote;
use crate::utils::error::{MarketError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateInput {
    pub surface: SurfaceInput,
    /// Market price per commercial square metre.
    pub price_per_sqm: Decimal,
    #[serde(default)]
    pub merit: MeritFactors,
    pub beneficiary_age: u32,
    #[serde(default)]
    pub asking_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEstimate {
    pub surface: CommercialSurface,
    pub merit: MeritBreakdown,
    /// Commercial surface times price per square metre.
    pub base_value: Decimal,
    /// Base value adjusted by the merit multiplier.
    pub full_value: Decimal,
    pub quote: ValuationQuote,
    pub fiscal: Option<FiscalValue>,
    pub deal: Option<DealScore>,
}

fn too_large(field: &str) -> MarketError {
    MarketError::validation(field, "value is too large")
}

/// Prices a unit from its surfaces and characteristics, then splits the
/// result between bare ownership and life estate.
pub fn estimate(engine: &ValuationEngine, input: &EstimateInput) -> Result<PropertyEstimate> {
    if input.price_per_sqm <= Decimal::ZERO {
        return Err(MarketError::validation(
            "price_per_sqm",
            format!("{} is not positive", input.price_per_sqm),
        ));
    }

    let surface = commercial_surface(&input.surface)?;
    let merit = input.merit.breakdown();
    let base_value = round_money(
        surface
            .total
            .checked_mul(input.price_per_sqm)
            .ok_or_else(|| too_large("price_per_sqm"))?,
    );
    let full_value = round_money(
        base_value
            .checked_mul(merit.multiplier)
            .ok_or_else(|| too_large("price_per_sqm"))?,
    );
    tracing::debug!(
        "Estimated {} from {} commercial sqm at {} per sqm, multiplier {}",
        full_value,
        surface.total,
        input.price_per_sqm,
        merit.multiplier
    );

    let quote = engine.quote(full_value, input.beneficiary_age).ok_or_else(|| {
        let (min, max) = engine.age_range();
        MarketError::validation(
            "estimate",
            format!(
                "no quote for value {} and age {} (ages {}..={}, value must be positive)",
                full_value, input.beneficiary_age, min, max
            ),
        )
    })?;
    let fiscal = engine.fiscal_value(full_value, input.beneficiary_age);
    let deal = input
        .asking_price
        .and_then(|asking| deal_score(asking, quote.bare_property_value));

    Ok(PropertyEstimate {
        surface,
        merit,
        base_value,
        full_value,
        quote,
        fiscal,
        deal,
    })
}
