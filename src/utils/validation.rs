use crate::utils::error::{MarketError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> MarketError {
    MarketError::InvalidConfigValue {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Accepts absolute `http`/`https` URLs only.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(MarketError::MissingConfig {
            field: field_name.to_string(),
        });
    }

    let url = Url::parse(url_str).map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field_name, url_str, format!("Unsupported URL scheme: {}", scheme))),
    }
}

/// API prefixes are absolute paths such as `/api/v1`.
pub fn validate_api_prefix(field_name: &str, prefix: &str) -> Result<()> {
    if !prefix.starts_with('/') {
        return Err(invalid(field_name, prefix, "Prefix must start with '/'"));
    }
    if prefix.contains(['?', '#']) {
        return Err(invalid(field_name, prefix, "Prefix cannot carry a query or fragment"));
    }
    Ok(())
}

/// The path must name an existing regular file.
pub fn validate_input_file(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() || path.contains('\0') {
        return Err(invalid(field_name, path, "Not a usable file path"));
    }
    if !Path::new(path).is_file() {
        return Err(invalid(field_name, path, "File does not exist"));
    }
    Ok(())
}

/// The file may not exist yet, but its directory must.
pub fn validate_output_file(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() || path.contains('\0') {
        return Err(invalid(field_name, path, "Not a usable file path"));
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            Err(invalid(field_name, path, format!("Directory {} does not exist", dir.display())))
        }
        _ => Ok(()),
    }
}

pub fn validate_log_level(field_name: &str, level: &str) -> Result<()> {
    if LOG_LEVELS.contains(&level.trim().to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(invalid(
            field_name,
            level,
            format!("Expected one of {}", LOG_LEVELS.join(", ")),
        ))
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field_name, value, format!("Value must be between {} and {}", min, max)));
    }
    Ok(())
}
