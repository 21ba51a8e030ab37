//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::EngineConfig;
use crate::pipeline::{Pipeline, Request};

/// Trade analytics: customer segments, top export routes and a sales forecast
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customer CSV file
    #[arg(long, default_value = "customer.csv")]
    pub customers: PathBuf,

    /// Path to the shipment CSV file
    #[arg(long, default_value = "shipment.csv")]
    pub shipments: PathBuf,

    /// Run only these pipelines (comma-separated); all by default
    #[arg(long, value_enum, value_delimiter = ',')]
    pub only: Vec<Pipeline>,

    /// JSON file with engine settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of customer segments
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Months to forecast
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Confidence level of the forecast interval, e.g. 0.95
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Seed for K-Means initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of K-Means restarts
    #[arg(long)]
    pub n_runs: Option<usize>,

    /// Maximum iterations for K-Means algorithm
    #[arg(long)]
    pub max_iters: Option<u64>,

    /// Tolerance for K-Means convergence
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Origin city for the route ranking
    #[arg(long)]
    pub origin_city: Option<String>,

    /// Origin country for the route ranking
    #[arg(long)]
    pub origin_country: Option<String>,

    /// Shipment type for the route ranking, e.g. Export
    #[arg(long)]
    pub shipment_type: Option<String>,

    /// Number of destinations to report
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Print single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Engine settings from the config file (or defaults) with flag overrides
    pub fn engine_config(&self) -> crate::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(k) = self.clusters {
            config.cluster_count = k;
        }
        if let Some(horizon) = self.horizon {
            config.forecast_horizon = horizon;
        }
        if let Some(level) = self.confidence {
            config.confidence_level = level;
        }
        if let Some(seed) = self.seed {
            config.clustering.seed = seed;
        }
        if let Some(n_runs) = self.n_runs {
            config.clustering.n_runs = n_runs;
        }
        if let Some(max_iters) = self.max_iters {
            config.clustering.max_iterations = max_iters;
        }
        if let Some(tolerance) = self.tolerance {
            config.clustering.tolerance = tolerance;
        }
        if let Some(city) = &self.origin_city {
            config.routes.origin_city = city.clone();
        }
        if let Some(country) = &self.origin_country {
            config.routes.origin_country = country.clone();
        }
        if let Some(kind) = &self.shipment_type {
            config.routes.shipment_type = kind.clone();
        }
        if let Some(top_n) = self.top_n {
            config.routes.top_n = top_n;
        }

        config.validate()?;
        Ok(config)
    }

    /// Inputs and pipelines to run
    pub fn request(&self) -> Request {
        let pipelines = if self.only.is_empty() {
            Pipeline::ALL.to_vec()
        } else {
            self.only.clone()
        };
        Request {
            customers: self.customers.clone(),
            shipments: self.shipments.clone(),
            pipelines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["tradesight"]);
        let config = args.engine_config().unwrap();
        assert_eq!(config, EngineConfig::default());

        let request = args.request();
        assert_eq!(request.customers, PathBuf::from("customer.csv"));
        assert_eq!(request.shipments, PathBuf::from("shipment.csv"));
        assert_eq!(request.pipelines, Pipeline::ALL.to_vec());
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "tradesight",
            "-k",
            "3",
            "--horizon",
            "12",
            "--confidence",
            "0.8",
            "--origin-city",
            "Chennai",
            "--only",
            "routes,forecast",
        ]);

        let config = args.engine_config().unwrap();
        assert_eq!(config.cluster_count, 3);
        assert_eq!(config.forecast_horizon, 12);
        assert!((config.confidence_level - 0.8).abs() < 1e-12);
        assert_eq!(config.routes.origin_city, "Chennai");
        assert_eq!(
            args.request().pipelines,
            vec![Pipeline::Routes, Pipeline::Forecast]
        );
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::parse_from(["tradesight", "--confidence", "1.5"]);
        assert!(args.engine_config().is_err());

        assert!(Args::try_parse_from(["tradesight", "--only", "news"]).is_err());
    }
}
