//! Engine hyperparameters
//!
//! All tunables of the three pipelines live here so components never embed
//! literals. A config can be loaded from a JSON file; missing keys fall back
//! to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Longest accepted seasonal cycle, one year of daily observations
pub const MAX_SEASONAL_PERIOD: usize = 366;

/// Non-seasonal `(p, d, q)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 1, d: 1, q: 1 }
    }
}

/// Seasonal `(P, D, Q, s)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    /// True when any seasonal term is active
    pub fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            period: 12,
        }
    }
}

/// K-Means settings other than the cluster count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Seed for the centroid initialisation RNG
    pub seed: u64,
    /// Number of restarts; the lowest-inertia run wins
    pub n_runs: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_runs: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// Origin/type filter for the route ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteFilter {
    pub origin_city: String,
    pub origin_country: String,
    pub shipment_type: String,
    pub top_n: usize,
}

impl Default for RouteFilter {
    fn default() -> Self {
        Self {
            origin_city: "Mumbai".to_string(),
            origin_country: "India".to_string(),
            shipment_type: "Export".to_string(),
            top_n: 5,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cluster_count: usize,
    pub arima_order: ArimaOrder,
    pub seasonal_order: SeasonalOrder,
    pub forecast_horizon: usize,
    pub confidence_level: f64,
    pub clustering: ClusteringConfig,
    pub routes: RouteFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster_count: 4,
            arima_order: ArimaOrder::default(),
            seasonal_order: SeasonalOrder::default(),
            forecast_horizon: 6,
            confidence_level: 0.95,
            clustering: ClusteringConfig::default(),
            routes: RouteFilter::default(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalyticsError::MissingFile(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipelines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cluster_count == 0 {
            return Err(AnalyticsError::Config(
                "cluster_count must be at least 1".to_string(),
            ));
        }
        if self.forecast_horizon == 0 {
            return Err(AnalyticsError::Config(
                "forecast_horizon must be at least 1".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalyticsError::Config(format!(
                "confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.seasonal_order.is_active() && self.seasonal_order.period < 2 {
            return Err(AnalyticsError::Config(format!(
                "seasonal period must be at least 2, got {}",
                self.seasonal_order.period
            )));
        }
        if self.seasonal_order.period > MAX_SEASONAL_PERIOD {
            return Err(AnalyticsError::Config(format!(
                "seasonal period must be at most {}, got {}",
                MAX_SEASONAL_PERIOD, self.seasonal_order.period
            )));
        }
        if self.clustering.n_runs == 0 {
            return Err(AnalyticsError::Config(
                "clustering.n_runs must be at least 1".to_string(),
            ));
        }
        if !(self.clustering.tolerance > 0.0) {
            return Err(AnalyticsError::Config(
                "clustering.tolerance must be positive".to_string(),
            ));
        }
        if self.routes.top_n == 0 {
            return Err(AnalyticsError::Config(
                "routes.top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
