//! TradeSight: batch analytics for trade data
//!
//! Three independent pipelines feed the dashboard:
//! customer segmentation (z-scored features clustered with K-Means), export
//! route ranking, and a seasonal ARIMA forecast of monthly shipment value
//! with confidence intervals.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod model;
pub mod optimize;
pub mod output;
pub mod pipeline;
pub mod routes;
pub mod scaler;
pub mod timeseries;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{ArimaOrder, ClusteringConfig, EngineConfig, RouteFilter, SeasonalOrder};
pub use data::{
    load_customers, load_routes, load_shipments, CustomerData, CustomerRecord, RouteRecord,
    ShipmentRecord,
};
pub use error::{AnalyticsError, Result};
pub use forecast::{FittedSarima, Forecast, ForecastPoint, SeasonalArima};
pub use model::{fit_kmeans, KMeansModel};
pub use output::Report;
pub use pipeline::{analyze_routes, forecast_sales, run, segment_customers, Pipeline, Request};
pub use routes::{top_destinations, RouteSummary};
pub use scaler::StandardScaler;
pub use timeseries::{monthly_totals, MonthlySeries, YearMonth};
