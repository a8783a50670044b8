use crate::core::resolver::{CallPolicy, RetryPolicy};
use crate::core::valuation::{
    default_legal_rate, CoefficientTable, ValuationEngine, MAX_BENEFICIARY_AGE, MIN_BENEFICIARY_AGE,
};
use crate::domain::model::CoefficientBracket;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{validate_api_prefix, validate_log_level, validate_range, validate_url, Validate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 200;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub store: StoreConfig,
    pub valuation: Option<ValuationConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_prefix: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    /// Fraction, e.g. `0.025` for 2.5%.
    pub legal_rate: Option<Decimal>,
    /// Replaces the statutory table when present.
    pub brackets: Option<Vec<BracketConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketConfig {
    pub min_age: u32,
    pub coefficient: Decimal,
    pub usufruct_pct: Decimal,
    pub bare_pct: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_prefix: None,
                timeout_seconds: None,
                retry_attempts: None,
                retry_delay_ms: None,
            },
            valuation: None,
            logging: None,
        }
    }
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text, substituting `${VAR}` references
    /// from the environment first.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| MarketError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("store.base_url", &self.store.base_url)?;
        if let Some(prefix) = &self.store.api_prefix {
            validate_api_prefix("store.api_prefix", prefix)?;
        }
        if let Some(timeout) = self.store.timeout_seconds {
            validate_range("store.timeout_seconds", timeout, 1, 300)?;
        }
        if let Some(attempts) = self.store.retry_attempts {
            validate_range("store.retry_attempts", attempts, 0, 10)?;
        }

        if let Some(level) = self.log_level() {
            validate_log_level("logging.level", level)?;
        }

        // the age range may narrow the table's coverage, never widen it
        let table = self.coefficient_table()?;
        let lowest_age = MIN_BENEFICIARY_AGE.max(table.lowest().min_age);
        let (min_age, max_age) = self.age_range();
        validate_range("valuation.min_age", min_age, lowest_age, MAX_BENEFICIARY_AGE)?;
        validate_range("valuation.max_age", max_age, min_age, MAX_BENEFICIARY_AGE)?;
        validate_range("valuation.legal_rate", self.legal_rate(), Decimal::new(1, 4), Decimal::ONE)?;
        Ok(())
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.store.base_url = base_url.into();
    }

    pub fn age_range(&self) -> (u32, u32) {
        let valuation = self.valuation.as_ref();
        (
            valuation.and_then(|v| v.min_age).unwrap_or(MIN_BENEFICIARY_AGE),
            valuation.and_then(|v| v.max_age).unwrap_or(MAX_BENEFICIARY_AGE),
        )
    }

    /// The configured bracket override, or the statutory table.
    pub fn coefficient_table(&self) -> Result<Arc<CoefficientTable>> {
        match self.valuation.as_ref().and_then(|v| v.brackets.as_ref()) {
            Some(rows) => {
                let brackets = rows
                    .iter()
                    .map(|row| CoefficientBracket::new(row.min_age, row.coefficient, row.usufruct_pct, row.bare_pct))
                    .collect();
                Ok(Arc::new(CoefficientTable::new(brackets)?))
            }
            None => Ok(CoefficientTable::statutory()),
        }
    }

    pub fn legal_rate(&self) -> Decimal {
        self.valuation
            .as_ref()
            .and_then(|v| v.legal_rate)
            .unwrap_or_else(default_legal_rate)
    }

    pub fn valuation_engine(&self) -> Result<ValuationEngine> {
        let (min_age, max_age) = self.age_range();
        Ok(ValuationEngine::new(self.coefficient_table()?)
            .with_age_range(min_age, max_age)
            .with_legal_rate(self.legal_rate()))
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            call_timeout: Some(self.request_timeout()),
            by_id_retry: RetryPolicy {
                max_retries: self.retry_attempts(),
                base_delay: self.retry_delay(),
            },
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn store_base_url(&self) -> &str {
        &self.store.base_url
    }

    fn api_prefix(&self) -> &str {
        self.store.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn retry_attempts(&self) -> u32 {
        self.store.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.store.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
