use clap::Parser;
use nuda_market::config::{CliConfig, Command, TomlConfig};
use nuda_market::core::{format, slug};
use nuda_market::utils::error::{ErrorSeverity, MarketError, Result};
use nuda_market::utils::{logger, validation::Validate};
use nuda_market::{
    app, deal_score, HttpListingStore, IdentityResolver, InMemoryListingStore, Listing, ListingStore, Resolution,
    ValuationEngine,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::sync::Arc;

/// Exit code for a resolution that found nothing while the store answered.
const EXIT_NOT_FOUND: i32 = 4;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    let config = cli.load_config();

    let level = config.as_ref().ok().and_then(|c| c.log_level().map(str::to_string));
    let json_logs = cli.json_logs || config.as_ref().map(TomlConfig::json_logs).unwrap_or(false);
    if json_logs {
        logger::init_json_logger(cli.verbose, level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, level.as_deref());
    }

    tracing::debug!("CLI config: {:?}", cli);

    let config = match config.and_then(|c| {
        cli.validate()?;
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    match run(cli.command, &config).await {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            tracing::error!(
                "Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(command: Command, config: &TomlConfig) -> Result<i32> {
    match command {
        Command::Quote {
            value,
            age,
            asking,
            json,
        } => {
            let engine = config.valuation_engine()?;
            let quote = engine.quote(value, age).ok_or_else(|| out_of_domain(&engine, age))?;
            let score = asking.and_then(|a| deal_score(a, quote.bare_property_value));

            if json {
                let body = serde_json::json!({ "quote": quote, "deal": score });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", format::quote_report(&quote));
                if let Some(score) = score {
                    println!(
                        "Valutazione:            {} ({}%, {} stelle)",
                        score.level.label(),
                        score.deviation_pct,
                        score.stars
                    );
                }
            }
        }
        Command::Estimate(args) => {
            let engine = config.valuation_engine()?;
            let input = args.to_input();
            let estimate = app::estimate(&engine, &input)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                println!("{}", estimate.surface.report(&input.surface));
                println!();
                println!("Coefficienti di merito:");
                println!("{}", estimate.merit.report());
                println!();
                println!("Valore base:            {}", format::format_currency(estimate.base_value));
                println!("Valore piena proprietà: {}", format::format_currency(estimate.full_value));
                println!("{}", format::quote_report(&estimate.quote));
                if let Some(fiscal) = &estimate.fiscal {
                    println!(
                        "Valore fiscale:         {} (tasso legale {}%)",
                        format::format_currency(fiscal.bare_property_value),
                        (fiscal.legal_rate * rust_decimal::Decimal::ONE_HUNDRED).normalize()
                    );
                }
                if let Some(score) = &estimate.deal {
                    println!(
                        "Valutazione:            {} ({}%, {} stelle)",
                        score.level.label(),
                        score.deviation_pct,
                        score.stars
                    );
                }
            }
        }
        Command::Bracket { age } => {
            let engine = config.valuation_engine()?;
            if !engine.accepts_age(age) {
                return Err(out_of_domain(&engine, age));
            }
            let bracket = engine.bracket_for(age);
            println!(
                "età >= {}: coefficiente {}, usufrutto {}%, nuda proprietà {}%",
                bracket.min_age,
                bracket.coefficient.normalize(),
                bracket.usufruct_pct.normalize(),
                bracket.bare_pct.normalize()
            );
        }
        Command::Coefficients { json } => {
            let table = config.coefficient_table()?;
            if json {
                println!("{}", serde_json::to_string_pretty(table.brackets())?);
            } else {
                println!("{:>4}  {:>6}  {:>9}  {:>14}", "età", "coeff", "usufrutto", "nuda proprietà");
                for b in table.brackets() {
                    println!(
                        "{:>4}  {:>6}  {:>8}%  {:>13}%",
                        b.min_age,
                        b.coefficient.normalize(),
                        b.usufruct_pct.normalize(),
                        b.bare_pct.normalize()
                    );
                }
            }
        }
        Command::Batch { input, output } => {
            let engine = config.valuation_engine()?;
            let reader = BufReader::new(File::open(&input)?);
            let summary = match output {
                Some(path) => app::quote_csv(&engine, reader, BufWriter::new(File::create(&path)?))?,
                None => app::quote_csv(&engine, reader, io::stdout().lock())?,
            };
            eprintln!(
                "{} rows: {} quoted, {} out of range, {} invalid",
                summary.rows, summary.quoted, summary.out_of_range, summary.invalid
            );
        }
        Command::Slug { listings } => {
            for listing in read_listings(&listings)? {
                println!("{}\t{}", slug::canonical_slug(&listing), slug::listing_path(&listing));
            }
        }
        Command::ExtractId { slug: raw } => match slug::extract_id(&raw) {
            Some(id) => println!("{}", id),
            None => return Err(MarketError::validation("slug", format!("'{}' does not end in an id", raw))),
        },
        Command::Resolve {
            target,
            listing_slug,
            fixtures,
            json,
        } => {
            let (city_slug, listing_slug) = match listing_slug {
                Some(listing_slug) => (target, listing_slug),
                None => {
                    let path = slug::parse_listing_path(&target).ok_or_else(|| {
                        MarketError::validation("target", format!("'{}' is not a listing path", target))
                    })?;
                    (path.city_slug, path.listing_slug)
                }
            };

            let store: Arc<dyn ListingStore> = match fixtures {
                Some(path) => Arc::new(InMemoryListingStore::from_file(path)?),
                None => Arc::new(HttpListingStore::from_config(config)?),
            };
            let resolver = IdentityResolver::new(store).with_policy(config.call_policy());

            match resolver.resolve_detailed(&city_slug, &listing_slug).await {
                Resolution::Found(resolved) => {
                    let listing = &resolved.listing;
                    if json {
                        println!("{}", serde_json::to_string_pretty(listing)?);
                    } else {
                        println!("{}", format::listing_title(listing));
                        println!("{}", slug::listing_path(listing));
                        println!("{}", format::listing_description(listing));
                        println!("match: {:?}", resolved.matched_by);
                    }
                }
                Resolution::NotFound => {
                    eprintln!("No listing found for {}/{}", city_slug, listing_slug);
                    return Ok(EXIT_NOT_FOUND);
                }
                Resolution::Unavailable => {
                    return Err(MarketError::store("resolve", "listing store unavailable"));
                }
            }
        }
    }
    Ok(0)
}

fn out_of_domain(engine: &ValuationEngine, age: u32) -> MarketError {
    let (min, max) = engine.age_range();
    MarketError::validation(
        "age",
        format!("{} is outside {}..={} or the value is not positive", age, min, max),
    )
}

/// Accepts a single listing object or an array of listings.
fn read_listings(path: &str) -> Result<Vec<Listing>> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&content)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(MarketError::from))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}
