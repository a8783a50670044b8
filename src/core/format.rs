//! Italian-locale formatting and SEO text for listings and quotes.

use crate::domain::model::{Listing, ValuationQuote};
use rust_decimal::{Decimal, RoundingStrategy};

pub const SITE_NAME: &str = "Mia Per Sempre";

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Whole euros with dot thousands separators: `135.000 €`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{} €", sign, group_thousands(&digits))
}

/// Number with dot thousands separators and up to three decimals after a
/// comma: `1.234,5`.
pub fn format_number(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let formatted = format!("{:.3}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, ""));
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}{}", sign, group_thousands(int_part))
    } else {
        format!("{}{},{}", sign, group_thousands(int_part), frac)
    }
}

pub fn format_surface(sqm: f64) -> String {
    format!("{} m²", format_number(sqm))
}

fn plural(count: u32, stem: &str, singular: char, plural: char) -> String {
    format!("{} {}{}", count, stem, if count == 1 { singular } else { plural })
}

/// Short feature line: `3 locali • 1 bagno • 85,4 m²`.
pub fn property_summary(listing: &Listing) -> String {
    let mut parts = Vec::new();
    if let Some(rooms) = listing.known_rooms() {
        parts.push(plural(rooms, "local", 'e', 'i'));
    }
    if let Some(bathrooms) = listing.bathrooms.filter(|b| *b > 0) {
        parts.push(plural(bathrooms, "bagn", 'o', 'i'));
    }
    parts.push(format_surface(listing.surface_sqm));
    parts.join(" • ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn listing_title(listing: &Listing) -> String {
    let rooms = listing
        .known_rooms()
        .map(|r| format!("{} locali", r))
        .unwrap_or_default();
    collapse_whitespace(&format!(
        "{} {} {} {} mq - Nuda Proprietà | {}",
        listing.property_type.label(),
        listing.city,
        rooms,
        listing.surface_sqm.max(0.0).round() as u64,
        SITE_NAME
    ))
}

pub fn listing_description(listing: &Listing) -> String {
    let mut features = Vec::new();
    if let Some(rooms) = listing.known_rooms() {
        features.push(format!("{} locali", rooms));
    }
    if let Some(bathrooms) = listing.bathrooms.filter(|b| *b > 0) {
        features.push(format!("{} bagni", bathrooms));
    }
    features.push(format!("{} mq", listing.surface_sqm.max(0.0).round() as u64));

    let price = listing
        .bare_property_value
        .map(|value| format!("Prezzo: {}", format_currency(value)))
        .unwrap_or_else(|| "Prezzo su richiesta".to_string());

    format!(
        "{} in nuda proprietà a {}. {}. {}. Usufrutto vitalizio, investimento sicuro. Scopri su {}.",
        listing.property_type.label(),
        listing.city,
        features.join(", "),
        price,
        SITE_NAME
    )
}

pub fn city_title(city: &str, count: Option<usize>) -> String {
    let count = match count {
        Some(n) if n > 0 => format!("{} annunci", n),
        _ => "Annunci".to_string(),
    };
    format!("Nuda Proprietà {} - {} | {}", city, count, SITE_NAME)
}

pub fn city_description(city: &str, count: Option<usize>) -> String {
    let count = match count {
        Some(n) if n > 0 => format!("{} immobili", n),
        _ => "Immobili".to_string(),
    };
    format!(
        "{} in nuda proprietà a {}. Appartamenti, ville e case con usufrutto vitalizio. \
         Valutazione automatica, annunci verificati. Il marketplace italiano della nuda proprietà.",
        count, city
    )
}

fn format_pct(pct: Decimal) -> String {
    format!("{}%", pct.normalize())
}

/// Multi-line plain-text rendering of a quote.
pub fn quote_report(quote: &ValuationQuote) -> String {
    [
        format!("Valore piena proprietà: {}", format_currency(quote.full_value)),
        format!("Età usufruttuario:      {}", quote.beneficiary_age),
        format!("Coefficiente:           {}", quote.coefficient.normalize()),
        format!(
            "Nuda proprietà ({}):  {}",
            format_pct(quote.bare_pct),
            format_currency(quote.bare_property_value)
        ),
        format!(
            "Usufrutto ({}):       {}",
            format_pct(quote.usufruct_pct),
            format_currency(quote.usufruct_value)
        ),
        format!("Risparmio:              {}", format_currency(quote.savings)),
    ]
    .join("\n")
}
