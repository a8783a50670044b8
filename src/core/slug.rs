//! Listing slugs and SEO paths.
//!
//! A canonical slug describes the listing in a few lowercase words and always
//! ends with `-{id}`, e.g. `appartamento-3-locali-85mq-42`. The id suffix is
//! what makes the slug resolvable; the descriptive part is cosmetic.

use crate::domain::model::{Listing, PropertyType};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Root of every public listing path.
pub const LISTING_ROOT: &str = "/nuda-proprieta";

/// Below this length the descriptive tokens are replaced by type + city.
const MIN_DESCRIPTIVE_LEN: usize = 10;

static STREET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(via|piazza|corso|viale|largo)\s+[a-zA-ZÀ-ÿ\s]+").expect("street pattern is valid")
});

static LISTING_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/nuda-proprieta/([^/?#]+)/([^/?#]+)").expect("listing path pattern is valid")
});

/// Converts free text into a URL-safe slug: lowercase ASCII, accents
/// stripped, words joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.nfd() {
        if ('\u{0300}'..='\u{036f}').contains(&c) {
            continue;
        }
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    slug
}

/// Street part of an address ("Via Roma 12" gives `via-roma`), when the
/// address starts with a recognised thoroughfare designator.
pub fn street_token(address: &str) -> Option<String> {
    let matched = STREET_PATTERN.find(address.trim())?;
    let token = slugify(matched.as_str());
    (!token.is_empty()).then_some(token)
}

/// Hyphenated type token used inside slugs (`casa-indipendente`). Types the
/// crate does not know are slugified from their raw name.
pub fn type_token(kind: &PropertyType) -> String {
    let token = slugify(&kind.as_str().replace('_', " "));
    if token.is_empty() {
        slugify(PropertyType::Unspecified.as_str())
    } else {
        token
    }
}

/// Builds the canonical slug for a listing. The result always ends with
/// `-{id}`.
pub fn canonical_slug(listing: &Listing) -> String {
    let kind = type_token(&listing.property_type);
    let mut parts: Vec<String> = vec![kind.clone()];

    if listing.show_exact_location {
        if let Some(street) = listing.address.as_deref().and_then(street_token) {
            parts.push(street);
        }
    }
    if let Some(rooms) = listing.known_rooms() {
        parts.push(rooms_token(rooms));
    }
    if let Some(surface) = listing.rounded_surface() {
        parts.push(surface_token(surface));
    }

    let mut slug = parts.join("-");
    if slug.len() < MIN_DESCRIPTIVE_LEN {
        let mut short = vec![kind];
        let city = slugify(&listing.city);
        if !city.is_empty() {
            short.push(city);
        }
        if let Some(rooms) = listing.known_rooms() {
            short.push(rooms_token(rooms));
        }
        slug = short.join("-");
    }

    format!("{}-{}", slug, listing.id)
}

pub fn rooms_token(rooms: u32) -> String {
    format!("{}-locali", rooms)
}

pub fn surface_token(rounded_sqm: u64) -> String {
    format!("{}mq", rounded_sqm)
}

/// Trailing numeric id of a slug (`...-42` gives 42).
pub fn extract_id(slug: &str) -> Option<u64> {
    let (_, digits) = slug.rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn city_slug(city: &str) -> String {
    slugify(city)
}

/// Display name implied by a city slug: `san-giovanni-valdarno` gives
/// `San Giovanni Valdarno`.
pub fn city_from_slug(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn listing_path(listing: &Listing) -> String {
    format!(
        "{}/{}/{}",
        LISTING_ROOT,
        city_slug(&listing.city),
        canonical_slug(listing)
    )
}

pub fn city_path(city: &str) -> String {
    format!("{}/{}", LISTING_ROOT, city_slug(city))
}

/// City and listing segments of a listing URL or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPath {
    pub city_slug: String,
    pub listing_slug: String,
}

impl ListingPath {
    pub fn city(&self) -> String {
        city_from_slug(&self.city_slug)
    }
}

pub fn parse_listing_path(path: &str) -> Option<ListingPath> {
    let caps = LISTING_PATH_PATTERN.captures(path)?;
    Some(ListingPath {
        city_slug: caps[1].to_string(),
        listing_slug: caps[2].to_string(),
    })
}

/// A listing slug split into its hyphen-delimited segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugToken {
    segments: Vec<String>,
}

impl SlugToken {
    pub fn parse(slug: &str) -> Self {
        let segments = slug
            .trim()
            .to_lowercase()
            .split('-')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn id(&self) -> Option<u64> {
        if self.segments.len() < 2 {
            return None;
        }
        let last = self.segments.last()?;
        if last.bytes().all(|b| b.is_ascii_digit()) {
            last.parse().ok()
        } else {
            None
        }
    }

    /// Segments before the id suffix.
    pub fn descriptive(&self) -> &[String] {
        match self.id() {
            Some(_) => &self.segments[..self.segments.len() - 1],
            None => &self.segments,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.id().is_none()
    }
}

/// True when `slug` is in canonical form: lowercase ASCII words joined by
/// single hyphens and ending in `-{id}`.
pub fn is_canonical(slug: &str) -> bool {
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return false;
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return false;
    }
    extract_id(slug).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PropertyType;

    fn appartamento_42() -> Listing {
        Listing::new(42, PropertyType::Appartamento, "Milano", 85.4).with_rooms(3)
    }

    #[test]
    fn canonical_slug_without_visible_address() {
        assert_eq!(canonical_slug(&appartamento_42()), "appartamento-3-locali-85mq-42");
    }

    #[test]
    fn canonical_slug_includes_visible_street() {
        let listing = Listing::new(7, PropertyType::CasaIndipendente, "Firenze", 120.6)
            .with_rooms(4)
            .with_address("Via Roma 12", true);
        assert_eq!(
            canonical_slug(&listing),
            "casa-indipendente-via-roma-4-locali-121mq-7"
        );
    }

    #[test]
    fn canonical_slug_skips_hidden_or_unrecognised_address() {
        let hidden = appartamento_42().with_address("Via Roma 12", false);
        assert_eq!(canonical_slug(&hidden), "appartamento-3-locali-85mq-42");

        let unrecognised = appartamento_42().with_address("Località Poggio 3", true);
        assert_eq!(canonical_slug(&unrecognised), "appartamento-3-locali-85mq-42");
    }

    #[test]
    fn canonical_slug_strips_accents_from_street() {
        let listing = appartamento_42().with_address("Viale Nicolò Machiavelli 5", true);
        assert_eq!(
            canonical_slug(&listing),
            "appartamento-viale-nicolo-machiavelli-3-locali-85mq-42"
        );

        // the street name stops at the first character outside letters/spaces
        let listing = appartamento_42().with_address("Piazza Sant'Agnese 4", true);
        assert_eq!(canonical_slug(&listing), "appartamento-piazza-sant-3-locali-85mq-42");
    }

    #[test]
    fn short_slug_is_replaced_by_type_and_city() {
        let listing = Listing::new(5, PropertyType::Loft, "Forlì", 50.0);
        assert_eq!(canonical_slug(&listing), "loft-forli-5");

        let villa = Listing::new(9, PropertyType::Villa, "Forte dei Marmi", 0.0);
        assert_eq!(canonical_slug(&villa), "villa-forte-dei-marmi-9");
    }

    #[test]
    fn extract_id_reads_trailing_digits() {
        assert_eq!(extract_id("appartamento-3-locali-85mq-42"), Some(42));
        assert_eq!(extract_id("villa-roma-7"), Some(7));
        assert_eq!(extract_id("appartamento-3-locali-85mq"), None);
        assert_eq!(extract_id("42"), None);
        assert_eq!(extract_id("villa-"), None);
        assert_eq!(extract_id("villa-99999999999999999999999"), None);
    }

    #[test]
    fn canonical_slug_round_trips_through_extract_id() {
        let listings = vec![
            appartamento_42(),
            Listing::new(1, PropertyType::Villa, "Roma", 0.0),
            Listing::new(1_000_000, PropertyType::Unspecified, "", 0.4),
            Listing::new(8, PropertyType::Other("capannone industriale".to_string()), "Prato", 900.0),
            Listing::new(17, PropertyType::Mansarda, "L'Aquila", 64.5)
                .with_rooms(2)
                .with_address("Corso Federico II 20", true),
        ];
        for listing in listings {
            let slug = canonical_slug(&listing);
            assert_eq!(extract_id(&slug), Some(listing.id), "slug {}", slug);
            assert!(is_canonical(&slug), "slug {}", slug);
        }
    }

    #[test]
    fn unknown_type_keeps_its_name_in_the_slug() {
        let listing = Listing::new(8, PropertyType::parse("Capannone"), "Prato", 900.0);
        assert_eq!(canonical_slug(&listing), "capannone-900mq-8");

        assert_eq!(type_token(&PropertyType::CasaIndipendente), "casa-indipendente");
        assert_eq!(type_token(&PropertyType::Other("baita_di_montagna".to_string())), "baita-di-montagna");
        assert_eq!(type_token(&PropertyType::Other("???".to_string())), "immobile");
    }

    #[test]
    fn slugify_normalises_text() {
        assert_eq!(slugify("  Città   di Castello "), "citta-di-castello");
        assert_eq!(slugify("Reggio nell'Emilia"), "reggio-nellemilia");
        assert_eq!(slugify("--Via__Roma--"), "viaroma");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn city_from_slug_capitalises_words() {
        assert_eq!(city_from_slug("san-giovanni-valdarno"), "San Giovanni Valdarno");
        assert_eq!(city_from_slug("milano"), "Milano");
    }

    #[test]
    fn listing_path_round_trips() {
        let listing = appartamento_42();
        let path = listing_path(&listing);
        assert_eq!(path, "/nuda-proprieta/milano/appartamento-3-locali-85mq-42");

        let parsed = parse_listing_path(&format!("https://example.it{}?ref=home", path)).unwrap();
        assert_eq!(parsed.city_slug, "milano");
        assert_eq!(parsed.city(), "Milano");
        assert_eq!(parsed.listing_slug, "appartamento-3-locali-85mq-42");
        assert!(parse_listing_path("/immobili/42").is_none());
        assert_eq!(city_path("San Donà di Piave"), "/nuda-proprieta/san-dona-di-piave");
    }

    #[test]
    fn slug_token_splits_id_from_description() {
        let token = SlugToken::parse("appartamento-3-locali-85mq-42");
        assert_eq!(token.id(), Some(42));
        assert_eq!(token.descriptive().len(), 4);
        assert!(!token.is_legacy());

        let legacy = SlugToken::parse("appartamento-3-locali-85mq");
        assert!(legacy.is_legacy());
        assert_eq!(legacy.descriptive(), legacy.segments());
    }
}
