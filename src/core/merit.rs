//! Merit coefficients (coefficienti di merito).
//!
//! Each characteristic adds or removes a percentage from the base market
//! value. The adjustments are summed, not compounded: the value multiplier is
//! `1 + total`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Year used for the building-age adjustment when none is given.
pub const DEFAULT_CURRENT_YEAR: i32 = 2025;

/// Percent adjustment as a fraction: `pct(-10)` is `-0.10`.
fn pct(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    DaRistrutturare,
    Buono,
    Ristrutturato,
    FinementeRistrutturato,
    NuovaCostruzione,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Brightness {
    MoltoLuminoso,
    Luminoso,
    MediamenteLuminoso,
    PocoLuminoso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum View {
    EsternaPanoramica,
    Esterna,
    Mista,
    Interna,
    CompletamenteInterna,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum BuildingCondition {
    Ottimo,
    #[default]
    Normale,
    Scadente,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Heating {
    Autonomo,
    CentralizzatoContabilizzato,
    Centralizzato,
    Assente,
}

impl Condition {
    pub fn adjustment(self) -> Decimal {
        match self {
            Condition::DaRistrutturare => pct(-10),
            Condition::Buono => Decimal::ZERO,
            Condition::Ristrutturato => pct(5),
            Condition::FinementeRistrutturato | Condition::NuovaCostruzione => pct(10),
        }
    }
}

impl Brightness {
    pub fn adjustment(self) -> Decimal {
        match self {
            Brightness::MoltoLuminoso => pct(10),
            Brightness::Luminoso => pct(5),
            Brightness::MediamenteLuminoso => Decimal::ZERO,
            Brightness::PocoLuminoso => pct(-5),
        }
    }
}

impl View {
    pub fn adjustment(self) -> Decimal {
        match self {
            View::EsternaPanoramica => pct(10),
            View::Esterna => pct(5),
            View::Mista => Decimal::ZERO,
            View::Interna => pct(-5),
            View::CompletamenteInterna => pct(-10),
        }
    }
}

impl Heating {
    pub fn adjustment(self) -> Decimal {
        match self {
            Heating::Autonomo => pct(5),
            Heating::CentralizzatoContabilizzato => pct(2),
            Heating::Centralizzato => Decimal::ZERO,
            Heating::Assente => pct(-5),
        }
    }
}

/// Where the unit sits in the building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorPosition {
    /// `-1` basement, `0` ground floor.
    pub floor: i32,
    pub has_elevator: bool,
    pub is_attic: bool,
    pub is_last_floor: bool,
    pub has_garden: bool,
}

impl FloorPosition {
    pub fn adjustment(&self) -> Decimal {
        // (with elevator, without elevator)
        let (with_elevator, without_elevator) = if self.is_attic {
            (20, -20)
        } else if self.is_last_floor {
            (10, -30)
        } else {
            match self.floor {
                i32::MIN..=-1 => (-25, -25),
                0 | 1 => (-10, -10),
                2 => (-3, -15),
                3 => (0, -20),
                _ => (5, -30),
            }
        };
        let base = pct(if self.has_elevator { with_elevator } else { without_elevator });

        // ground floor without a garden takes a further cut
        if self.floor == 0 && !self.has_garden {
            base - pct(10)
        } else {
            base
        }
    }
}

/// Building age bands: up to 20 years, up to 40, older.
pub fn building_age_adjustment(building_year: i32, current_year: i32, condition: BuildingCondition) -> Decimal {
    let age = current_year.saturating_sub(building_year);
    let (young, middle, old) = match condition {
        BuildingCondition::Ottimo => (0, 5, 10),
        BuildingCondition::Normale => (0, 0, 0),
        BuildingCondition::Scadente => (-5, -10, -15),
    };
    pct(match age {
        i32::MIN..=20 => young,
        21..=40 => middle,
        _ => old,
    })
}

/// Energy performance class (`A4+` down to `G`). Unknown classes have no
/// effect; underscores and case are ignored.
pub fn energy_class_adjustment(energy_class: &str) -> Decimal {
    let normalized = energy_class.trim().to_uppercase().replace('_', "");
    pct(match normalized.as_str() {
        "A4+" => 15,
        "A4" => 12,
        "A3" => 10,
        "A2" => 8,
        "A1" => 5,
        "B" => 3,
        "D" => -3,
        "E" => -5,
        "F" => -8,
        "G" => -10,
        _ => 0,
    })
}

/// Characteristics of a unit. Absent characteristics contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeritFactors {
    #[serde(flatten)]
    pub position: FloorPosition,
    pub condition: Option<Condition>,
    pub brightness: Option<Brightness>,
    pub view: Option<View>,
    pub building_year: Option<i32>,
    pub current_year: i32,
    pub building_condition: BuildingCondition,
    pub heating: Option<Heating>,
    pub energy_class: Option<String>,
}

impl Default for MeritFactors {
    fn default() -> Self {
        Self {
            position: FloorPosition::default(),
            condition: None,
            brightness: None,
            view: None,
            building_year: None,
            current_year: DEFAULT_CURRENT_YEAR,
            building_condition: BuildingCondition::default(),
            heating: None,
            energy_class: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeritBreakdown {
    pub floor: Decimal,
    pub condition: Option<Decimal>,
    pub brightness: Option<Decimal>,
    pub view: Option<Decimal>,
    pub building_age: Option<Decimal>,
    pub heating: Option<Decimal>,
    pub energy_class: Option<Decimal>,
    pub total: Decimal,
    pub multiplier: Decimal,
}

impl MeritFactors {
    pub fn breakdown(&self) -> MeritBreakdown {
        let floor = self.position.adjustment();
        let condition = self.condition.map(Condition::adjustment);
        let brightness = self.brightness.map(Brightness::adjustment);
        let view = self.view.map(View::adjustment);
        let building_age = self
            .building_year
            .map(|year| building_age_adjustment(year, self.current_year, self.building_condition));
        let heating = self.heating.map(Heating::adjustment);
        let energy_class = self.energy_class.as_deref().map(energy_class_adjustment);

        let total = [condition, brightness, view, building_age, heating, energy_class]
            .into_iter()
            .flatten()
            .fold(floor, |sum, part| sum + part);

        MeritBreakdown {
            floor,
            condition,
            brightness,
            view,
            building_age,
            heating,
            energy_class,
            total,
            multiplier: Decimal::ONE + total,
        }
    }
}

impl MeritBreakdown {
    /// Signed percentages, one line per present factor.
    pub fn report(&self) -> String {
        let as_pct = |value: Decimal| {
            let sign = if value.is_sign_negative() { "" } else { "+" };
            format!("{}{}%", sign, (value * Decimal::ONE_HUNDRED).normalize())
        };
        let named = [
            ("Piano", Some(self.floor)),
            ("Stato", self.condition),
            ("Luminosità", self.brightness),
            ("Vista", self.view),
            ("Età edificio", self.building_age),
            ("Riscaldamento", self.heating),
            ("Classe energetica", self.energy_class),
        ];
        let mut lines: Vec<String> = named
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| format!("  {}: {}", label, as_pct(v))))
            .collect();
        lines.push(format!("  Totale: {}", as_pct(self.total)));
        lines.push(format!("  Moltiplicatore: {}x", self.multiplier.round_dp(3)));
        lines.join("\n")
    }
}
