use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One row of the life-estate coefficient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientBracket {
    pub min_age: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub coefficient: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usufruct_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bare_pct: Decimal,
}

impl CoefficientBracket {
    pub const fn new(min_age: u32, coefficient: Decimal, usufruct_pct: Decimal, bare_pct: Decimal) -> Self {
        Self {
            min_age,
            coefficient,
            usufruct_pct,
            bare_pct,
        }
    }
}

/// Price split between bare ownership and life estate for one valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub full_value: Decimal,
    pub beneficiary_age: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub bare_property_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usufruct_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub savings: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bare_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usufruct_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub coefficient: Decimal,
}

/// Kind of property. Values the listing service sends that are not in the
/// known set are kept verbatim (trimmed, lowercased) in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Appartamento,
    Villa,
    Villetta,
    Attico,
    Loft,
    Mansarda,
    CasaIndipendente,
    Rustico,
    Castello,
    Palazzo,
    #[default]
    Unspecified,
    Other(String),
}

const UNSPECIFIED_TYPE: &str = "immobile";

impl PropertyType {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "appartamento" => PropertyType::Appartamento,
            "villa" => PropertyType::Villa,
            "villetta" => PropertyType::Villetta,
            "attico" => PropertyType::Attico,
            "loft" => PropertyType::Loft,
            "mansarda" => PropertyType::Mansarda,
            "casa_indipendente" | "casa-indipendente" => PropertyType::CasaIndipendente,
            "rustico" => PropertyType::Rustico,
            "castello" => PropertyType::Castello,
            "palazzo" => PropertyType::Palazzo,
            "" | UNSPECIFIED_TYPE => PropertyType::Unspecified,
            _ => PropertyType::Other(normalized),
        }
    }

    /// Identifier as stored by the listing service.
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Appartamento => "appartamento",
            PropertyType::Villa => "villa",
            PropertyType::Villetta => "villetta",
            PropertyType::Attico => "attico",
            PropertyType::Loft => "loft",
            PropertyType::Mansarda => "mansarda",
            PropertyType::CasaIndipendente => "casa_indipendente",
            PropertyType::Rustico => "rustico",
            PropertyType::Castello => "castello",
            PropertyType::Palazzo => "palazzo",
            PropertyType::Unspecified => UNSPECIFIED_TYPE,
            PropertyType::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Appartamento => "Appartamento",
            PropertyType::Villa => "Villa",
            PropertyType::Villetta => "Villetta",
            PropertyType::Attico => "Attico",
            PropertyType::Loft => "Loft",
            PropertyType::Mansarda => "Mansarda",
            PropertyType::CasaIndipendente => "Casa Indipendente",
            PropertyType::Rustico => "Rustico",
            PropertyType::Castello => "Castello",
            PropertyType::Palazzo => "Palazzo",
            PropertyType::Unspecified | PropertyType::Other(_) => "Immobile",
        }
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(PropertyType::parse).unwrap_or_default())
    }
}

/// A listing as returned by the listing service. Only the fields this crate
/// reads are modelled; anything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub property_type: PropertyType,
    pub city: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub show_exact_location: bool,
    #[serde(default)]
    pub surface_sqm: f64,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub full_property_value: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub bare_property_value: Option<Decimal>,
    #[serde(default)]
    pub usufructuary_age: Option<u32>,
}

impl Listing {
    pub fn new(id: u64, property_type: PropertyType, city: impl Into<String>, surface_sqm: f64) -> Self {
        Self {
            id,
            title: String::new(),
            property_type,
            city: city.into(),
            province: None,
            region: None,
            address: None,
            show_exact_location: false,
            surface_sqm,
            rooms: None,
            bathrooms: None,
            full_property_value: None,
            bare_property_value: None,
            usufructuary_age: None,
        }
    }

    pub fn with_rooms(mut self, rooms: u32) -> Self {
        self.rooms = Some(rooms);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>, visible: bool) -> Self {
        self.address = Some(address.into());
        self.show_exact_location = visible;
        self
    }

    /// Rooms count, treating zero as unknown.
    pub fn known_rooms(&self) -> Option<u32> {
        self.rooms.filter(|r| *r > 0)
    }

    /// Surface rounded half-up to whole square metres, if positive.
    pub fn rounded_surface(&self) -> Option<u64> {
        if self.surface_sqm.is_finite() && self.surface_sqm > 0.0 {
            Some(self.surface_sqm.round() as u64)
        } else {
            None
        }
    }
}
