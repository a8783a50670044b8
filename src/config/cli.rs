use crate::app::estimate::EstimateInput;
use crate::config::toml_config::TomlConfig;
use crate::core::merit::{Brightness, BuildingCondition, Condition, FloorPosition, Heating, MeritFactors, View};
use crate::core::surface::SurfaceInput;
use crate::utils::error::Result;
use crate::utils::validation::{validate_input_file, validate_output_file, validate_url, Validate};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "nuda-market")]
#[command(about = "Bare-ownership valuation and listing URL resolution")]
pub struct CliConfig {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Overrides `store.base_url` from the configuration file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split a full-ownership value into bare ownership and usufruct.
    Quote {
        #[arg(long)]
        value: Decimal,
        #[arg(long)]
        age: u32,
        /// Asking price to score against the estimated bare value.
        #[arg(long)]
        asking: Option<Decimal>,
        #[arg(long)]
        json: bool,
    },
    /// Estimate a unit's value from its surfaces and characteristics, then
    /// quote the bare ownership.
    Estimate(EstimateArgs),
    /// Show the coefficient bracket applied to an age.
    Bracket { age: u32 },
    /// Print the coefficient table in use.
    Coefficients {
        #[arg(long)]
        json: bool,
    },
    /// Quote every row of a CSV file.
    Batch {
        input: String,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print canonical slugs and paths for listings read from a JSON file.
    Slug { listings: String },
    /// Print the id encoded at the end of a listing slug.
    ExtractId { slug: String },
    /// Resolve a listing URL (or a city slug and listing slug) to a listing.
    Resolve {
        /// Listing URL or path, or a city slug when LISTING_SLUG is given.
        target: String,
        listing_slug: Option<String>,
        /// JSON file of listings to resolve against instead of the HTTP store.
        #[arg(long)]
        fixtures: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    /// Walkable floor area in square metres.
    #[arg(long)]
    pub sqm: Decimal,
    #[arg(long)]
    pub price_sqm: Decimal,
    #[arg(long)]
    pub age: u32,
    #[arg(long)]
    pub balcony: Option<Decimal>,
    #[arg(long)]
    pub terrace: Option<Decimal>,
    /// Private garden area; any garden also spares the ground-floor cut.
    #[arg(long)]
    pub garden: Option<Decimal>,
    #[arg(long)]
    pub cellar: Option<Decimal>,
    #[arg(long)]
    pub attic: Option<Decimal>,
    #[arg(long = "box")]
    pub garage_box: bool,
    #[arg(long, default_value_t = 0)]
    pub covered_parking: u32,
    #[arg(long, default_value_t = 0)]
    pub open_parking: u32,
    /// `-1` for a basement, `0` for the ground floor.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub floor: i32,
    #[arg(long)]
    pub elevator: bool,
    /// The unit is a penthouse.
    #[arg(long)]
    pub penthouse: bool,
    #[arg(long)]
    pub last_floor: bool,
    #[arg(long, value_enum)]
    pub condition: Option<Condition>,
    #[arg(long, value_enum)]
    pub brightness: Option<Brightness>,
    #[arg(long, value_enum)]
    pub view: Option<View>,
    #[arg(long)]
    pub building_year: Option<i32>,
    #[arg(long, value_enum, default_value = "normale")]
    pub building_condition: BuildingCondition,
    #[arg(long, value_enum)]
    pub heating: Option<Heating>,
    #[arg(long)]
    pub energy_class: Option<String>,
    #[arg(long)]
    pub asking: Option<Decimal>,
    #[arg(long)]
    pub json: bool,
}

impl EstimateArgs {
    pub fn to_input(&self) -> EstimateInput {
        EstimateInput {
            surface: SurfaceInput {
                main_sqm: self.sqm,
                balcony_sqm: self.balcony,
                terrace_sqm: self.terrace,
                garden_sqm: self.garden,
                cellar_sqm: self.cellar,
                attic_sqm: self.attic,
                has_box: self.garage_box,
                covered_parking: self.covered_parking,
                open_parking: self.open_parking,
            },
            price_per_sqm: self.price_sqm,
            merit: MeritFactors {
                position: FloorPosition {
                    floor: self.floor,
                    has_elevator: self.elevator,
                    is_attic: self.penthouse,
                    is_last_floor: self.last_floor,
                    has_garden: self.garden.is_some_and(|sqm| sqm > Decimal::ZERO),
                },
                condition: self.condition,
                brightness: self.brightness,
                view: self.view,
                building_year: self.building_year,
                building_condition: self.building_condition,
                heating: self.heating,
                energy_class: self.energy_class.clone(),
                ..MeritFactors::default()
            },
            beneficiary_age: self.age,
            asking_price: self.asking,
        }
    }
}

impl CliConfig {
    /// The configuration file, or defaults, with command-line overrides
    /// applied.
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.set_base_url(base_url.clone());
        }
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validate_input_file("config", path)?;
        }
        if let Some(base_url) = &self.base_url {
            validate_url("base_url", base_url)?;
        }
        match &self.command {
            Command::Batch { input, output } => {
                validate_input_file("input", input)?;
                if let Some(output) = output {
                    validate_output_file("output", output)?;
                }
            }
            Command::Slug { listings } => validate_input_file("listings", listings)?,
            Command::Resolve { fixtures: Some(path), .. } => validate_input_file("fixtures", path)?,
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_with_global_flags() {
        let cli = CliConfig::try_parse_from([
            "nuda-market",
            "quote",
            "--value",
            "300000",
            "--age",
            "75",
            "--verbose",
            "--base-url",
            "http://localhost:9000",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Quote { value, age, asking, json } => {
                assert_eq!(value, Decimal::new(300_000, 0));
                assert_eq!(age, 75);
                assert!(asking.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.validate().is_ok());
        assert_eq!(cli.load_config().unwrap().store.base_url, "http://localhost:9000");
    }

    #[test]
    fn negative_age_is_rejected_at_parse_time() {
        assert!(CliConfig::try_parse_from(["nuda-market", "quote", "--value", "1000", "--age", "-5"]).is_err());
    }

    #[test]
    fn invalid_base_url_fails_validation() {
        let cli = CliConfig::try_parse_from(["nuda-market", "extract-id", "villa-42", "--base-url", "ftp://x"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn batch_input_must_exist() {
        let cli = CliConfig::try_parse_from(["nuda-market", "batch", "/no/such/quotes.csv"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn estimate_flags_build_the_input() {
        let cli = CliConfig::try_parse_from([
            "nuda-market",
            "estimate",
            "--sqm",
            "95",
            "--price-sqm",
            "3000",
            "--age",
            "75",
            "--balcony",
            "20",
            "--floor",
            "-1",
            "--heating",
            "centralizzato-contabilizzato",
            "--box",
        ])
        .unwrap();

        match cli.command {
            Command::Estimate(args) => {
                let input = args.to_input();
                assert_eq!(input.surface.main_sqm, Decimal::new(95, 0));
                assert_eq!(input.surface.balcony_sqm, Some(Decimal::new(20, 0)));
                assert!(input.surface.has_box);
                assert_eq!(input.merit.position.floor, -1);
                assert!(!input.merit.position.has_garden);
                assert_eq!(input.merit.heating, Some(Heating::CentralizzatoContabilizzato));
                assert_eq!(input.merit.building_condition, BuildingCondition::Normale);
                assert_eq!(input.beneficiary_age, 75);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn resolve_accepts_url_or_pair() {
        let cli = CliConfig::try_parse_from(["nuda-market", "resolve", "https://example.it/nuda-proprieta/roma/villa-7"])
            .unwrap();
        assert!(matches!(cli.command, Command::Resolve { listing_slug: None, .. }));

        let cli = CliConfig::try_parse_from(["nuda-market", "resolve", "roma", "villa-7", "--fixtures", "l.json"]).unwrap();
        match cli.command {
            Command::Resolve { target, listing_slug, fixtures, .. } => {
                assert_eq!(target, "roma");
                assert_eq!(listing_slug.as_deref(), Some("villa-7"));
                assert_eq!(fixtures.as_deref(), Some("l.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
