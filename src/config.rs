//! Settings

use std::{fs, path::Path};

use rusty_money::iso::{self, Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    audit::{AuditSink, InventoryAuditor, auditor::DEFAULT_MODULE},
    geo::{DistanceRanker, EARTH_RADIUS_KM, GeoError},
};

/// Settings Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Earth radius is not a positive number of kilometres
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Runtime settings for the storefront core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// ISO 4217 code for carts and orders
    pub currency: String,

    /// How many stores the nearby-stores strip shows
    pub nearby_store_limit: usize,

    /// Module name recorded on audit entries
    pub audit_module: String,

    /// Sphere radius for distance ranking
    pub earth_radius_km: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "IDR".to_string(),
            nearby_store_limit: 3,
            audit_module: DEFAULT_MODULE.to_string(),
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }
}

impl Settings {
    /// Parse settings from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is invalid or a value fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_norway::from_str(yaml)?;

        settings.currency()?;
        settings.ranker()?;

        Ok(settings)
    }

    /// Read settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(&self.currency).ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Ranker using the configured radius.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Geo`] if the radius is not a positive number of kilometres.
    pub fn ranker(&self) -> Result<DistanceRanker, ConfigError> {
        Ok(DistanceRanker::new(self.earth_radius_km)?)
    }

    /// Auditor recording under the configured module name.
    pub fn auditor<S: AuditSink>(&self, sink: S) -> InventoryAuditor<S> {
        InventoryAuditor::new(sink).with_module(self.audit_module.clone())
    }
}
