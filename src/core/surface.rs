//! Commercial surface (superficie commerciale).
//!
//! Walkable floor area counts in full; balconies, terraces, gardens, cellars
//! and attics count at a fraction of their area, and parking comes as fixed
//! square-metre equivalents.

use crate::utils::error::{MarketError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// weights in hundredths
const BALCONY_WEIGHT: i64 = 25;
const TERRACE_WEIGHT: i64 = 35;
const GARDEN_WEIGHT: i64 = 15;
const CELLAR_WEIGHT: i64 = 50;
const ATTIC_WEIGHT: i64 = 40;

/// Square metres credited for a private garage box.
pub const BOX_SQM: u32 = 25;
pub const COVERED_PARKING_SQM: u32 = 20;
pub const OPEN_PARKING_SQM: u32 = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceInput {
    pub main_sqm: Decimal,
    pub balcony_sqm: Option<Decimal>,
    pub terrace_sqm: Option<Decimal>,
    pub garden_sqm: Option<Decimal>,
    pub cellar_sqm: Option<Decimal>,
    pub attic_sqm: Option<Decimal>,
    pub has_box: bool,
    pub covered_parking: u32,
    pub open_parking: u32,
}

impl SurfaceInput {
    pub fn new(main_sqm: Decimal) -> Self {
        Self {
            main_sqm,
            ..Self::default()
        }
    }
}

/// Weighted contribution of every component, in commercial square metres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommercialSurface {
    pub main: Decimal,
    pub balcony: Decimal,
    pub terrace: Decimal,
    pub garden: Decimal,
    pub cellar: Decimal,
    pub attic: Decimal,
    pub garage_box: Decimal,
    pub covered_parking: Decimal,
    pub open_parking: Decimal,
    pub total: Decimal,
    /// Total over main surface; zero when the main surface is zero.
    pub ratio: Decimal,
}

fn weighted(field: &str, area: Option<Decimal>, weight: i64) -> Result<Decimal> {
    match area {
        None => Ok(Decimal::ZERO),
        Some(sqm) if sqm.is_sign_negative() => Err(MarketError::validation(field, format!("{} is negative", sqm))),
        Some(sqm) => sqm
            .checked_mul(Decimal::new(weight, 2))
            .ok_or_else(|| MarketError::validation(field, format!("{} is too large", sqm))),
    }
}

fn overflow() -> MarketError {
    MarketError::validation("surface", "commercial surface is too large")
}

/// Weights each component and sums them. Negative areas are rejected.
pub fn commercial_surface(input: &SurfaceInput) -> Result<CommercialSurface> {
    if input.main_sqm.is_sign_negative() {
        return Err(MarketError::validation(
            "main_sqm",
            format!("{} is negative", input.main_sqm),
        ));
    }

    let balcony = weighted("balcony_sqm", input.balcony_sqm, BALCONY_WEIGHT)?;
    let terrace = weighted("terrace_sqm", input.terrace_sqm, TERRACE_WEIGHT)?;
    let garden = weighted("garden_sqm", input.garden_sqm, GARDEN_WEIGHT)?;
    let cellar = weighted("cellar_sqm", input.cellar_sqm, CELLAR_WEIGHT)?;
    let attic = weighted("attic_sqm", input.attic_sqm, ATTIC_WEIGHT)?;
    let garage_box = if input.has_box { Decimal::from(BOX_SQM) } else { Decimal::ZERO };
    let covered_parking = Decimal::from(input.covered_parking) * Decimal::from(COVERED_PARKING_SQM);
    let open_parking = Decimal::from(input.open_parking) * Decimal::from(OPEN_PARKING_SQM);

    let total = [balcony, terrace, garden, cellar, attic, garage_box, covered_parking, open_parking]
        .into_iter()
        .try_fold(input.main_sqm, |sum, part| sum.checked_add(part))
        .ok_or_else(overflow)?;
    let ratio = if input.main_sqm.is_zero() {
        Decimal::ZERO
    } else {
        total.checked_div(input.main_sqm).ok_or_else(overflow)?
    };

    Ok(CommercialSurface {
        main: input.main_sqm,
        balcony,
        terrace,
        garden,
        cellar,
        attic,
        garage_box,
        covered_parking,
        open_parking,
        total,
        ratio,
    })
}

fn sqm(value: Decimal) -> String {
    value.round_dp(0).normalize().to_string()
}

impl CommercialSurface {
    /// Plain-text breakdown, one line per non-zero component.
    pub fn report(&self, input: &SurfaceInput) -> String {
        let mut lines = vec![format!("Superficie principale: {} mq", sqm(self.main))];

        let weighted_parts = [
            ("Balconi", input.balcony_sqm, BALCONY_WEIGHT, self.balcony),
            ("Terrazze", input.terrace_sqm, TERRACE_WEIGHT, self.terrace),
            ("Giardino", input.garden_sqm, GARDEN_WEIGHT, self.garden),
            ("Cantina", input.cellar_sqm, CELLAR_WEIGHT, self.cellar),
            ("Soffitta", input.attic_sqm, ATTIC_WEIGHT, self.attic),
        ];
        for (label, area, weight, credited) in weighted_parts {
            if let Some(area) = area.filter(|a| !a.is_zero()) {
                lines.push(format!("{}: {} mq x {}% = {} mq", label, sqm(area), weight, sqm(credited)));
            }
        }
        if !self.garage_box.is_zero() {
            lines.push(format!("Box: {} mq commerciali", sqm(self.garage_box)));
        }
        if input.covered_parking > 0 {
            lines.push(format!(
                "Posti auto coperti ({}): {} mq commerciali",
                input.covered_parking,
                sqm(self.covered_parking)
            ));
        }
        if input.open_parking > 0 {
            lines.push(format!(
                "Posti auto scoperti ({}): {} mq commerciali",
                input.open_parking,
                sqm(self.open_parking)
            ));
        }

        lines.push(format!("Totale superficie commerciale: {} mq", sqm(self.total)));
        lines.push(format!("Rapporto: {}x", self.ratio.round_dp(2)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[test]
    fn flat_with_balcony_and_box() {
        let input = SurfaceInput {
            balcony_sqm: Some(dec(15)),
            has_box: true,
            ..SurfaceInput::new(dec(100))
        };
        let surface = commercial_surface(&input).unwrap();

        assert_eq!(surface.balcony, Decimal::new(375, 2));
        assert_eq!(surface.garage_box, dec(25));
        assert_eq!(surface.total, Decimal::new(12875, 2));
        assert_eq!(surface.ratio, Decimal::new(12875, 4));
    }

    #[test]
    fn villa_with_every_appurtenance() {
        let input = SurfaceInput {
            terrace_sqm: Some(dec(40)),
            garden_sqm: Some(dec(300)),
            cellar_sqm: Some(dec(30)),
            attic_sqm: Some(dec(20)),
            has_box: true,
            covered_parking: 1,
            open_parking: 2,
            ..SurfaceInput::new(dec(200))
        };
        let surface = commercial_surface(&input).unwrap();

        assert_eq!(surface.terrace, dec(14));
        assert_eq!(surface.garden, dec(45));
        assert_eq!(surface.cellar, dec(15));
        assert_eq!(surface.attic, dec(8));
        assert_eq!(surface.covered_parking, dec(20));
        assert_eq!(surface.open_parking, dec(24));
        // 200 + 14 + 45 + 15 + 8 + 25 + 20 + 24
        assert_eq!(surface.total, dec(351));
    }

    #[test]
    fn zero_main_surface_has_zero_ratio() {
        let input = SurfaceInput {
            open_parking: 1,
            ..SurfaceInput::new(Decimal::ZERO)
        };
        let surface = commercial_surface(&input).unwrap();
        assert_eq!(surface.total, dec(12));
        assert_eq!(surface.ratio, Decimal::ZERO);
    }

    #[test]
    fn negative_areas_are_rejected() {
        assert!(commercial_surface(&SurfaceInput::new(dec(-1))).is_err());
        let input = SurfaceInput {
            cellar_sqm: Some(dec(-5)),
            ..SurfaceInput::new(dec(80))
        };
        assert!(matches!(commercial_surface(&input), Err(MarketError::Validation { .. })));
    }

    #[test]
    fn oversized_areas_are_rejected() {
        let input = SurfaceInput {
            balcony_sqm: Some(Decimal::MAX),
            ..SurfaceInput::new(Decimal::MAX)
        };
        assert!(commercial_surface(&input).is_err());
    }

    #[test]
    fn report_lists_only_present_components() {
        let input = SurfaceInput {
            balcony_sqm: Some(dec(15)),
            covered_parking: 2,
            ..SurfaceInput::new(dec(100))
        };
        let report = commercial_surface(&input).unwrap().report(&input);

        assert!(report.contains("Balconi: 15 mq x 25% = 4 mq"));
        assert!(report.contains("Posti auto coperti (2): 40 mq commerciali"));
        assert!(!report.contains("Box"));
        assert!(report.contains("Totale superficie commerciale: 144 mq"));
    }
}
