#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Price calculation for hire-an-agent job requests.
//!
//! A quote is `unit × max(1, agents) × max(1, days)` where the unit price is
//! the base price plus the inter-city and foreign-national surcharges that
//! apply. Prices are never stored; every read computes them fresh from the
//! current [`PricingConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Pricing configuration compiled into the binary.
const DEFAULT_PRICING_TOML: &str = include_str!("../pricing.toml");

/// Errors that can occur while loading pricing configuration.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// The configuration file could not be read.
    #[error("Failed to read pricing config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The configuration was not valid TOML for [`PricingConfig`].
    #[error("Failed to parse pricing config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Amounts used by [`calculate_price`]. Keys missing from a TOML file
/// keep their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Per agent per day.
    pub base_price: u64,
    /// Added to the unit price for trips between cities.
    pub inter_city_fee: u64,
    /// Added to the unit price when protecting a foreign national.
    pub foreign_national_fee: u64,
    /// ISO 4217 code, e.g. `"NGN"`.
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: 50_000,
            inter_city_fee: 30_000,
            foreign_national_fee: 30_000,
            currency: "NGN".to_string(),
        }
    }
}

impl PricingConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Parse`] if the input is not valid TOML or a
    /// value has the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, PricingError> {
        Ok(toml::de::from_str(content)?)
    }

    /// Loads the configuration from `path`, or the embedded defaults when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, PricingError> {
        let Some(path) = path else {
            return Self::from_toml_str(DEFAULT_PRICING_TOML);
        };

        let content = std::fs::read_to_string(path).map_err(|source| PricingError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded pricing config from {} (base {} {})",
            path.display(),
            config.base_price,
            config.currency
        );
        Ok(config)
    }
}

/// The inputs that determine a job's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub agents: i64,
    pub days: i64,
    pub inter_city: bool,
    pub foreign_national: bool,
}

/// A computed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Price per agent per day, including surcharges.
    pub unit_price: u64,
    /// `unit_price × agents × days`.
    pub total: u64,
    pub currency: String,
}

impl Quote {
    /// The total in the currency's minor unit (kobo for NGN).
    #[must_use]
    pub const fn amount_minor(&self) -> u64 {
        self.total.saturating_mul(100)
    }
}

/// Prices `request` against `config`.
///
/// Agent and day counts below 1 are treated as 1. Arithmetic saturates
/// rather than overflowing.
#[must_use]
pub fn calculate_price(config: &PricingConfig, request: &PriceRequest) -> Quote {
    let mut unit_price = config.base_price;
    if request.inter_city {
        unit_price = unit_price.saturating_add(config.inter_city_fee);
    }
    if request.foreign_national {
        unit_price = unit_price.saturating_add(config.foreign_national_fee);
    }

    let agents = clamp_count(request.agents);
    let days = clamp_count(request.days);

    Quote {
        unit_price,
        total: unit_price.saturating_mul(agents).saturating_mul(days),
        currency: config.currency.clone(),
    }
}

fn clamp_count(value: i64) -> u64 {
    u64::try_from(value.max(1)).unwrap_or(1)
}
