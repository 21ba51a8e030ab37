//! Batch pipelines: load → transform → model → format
//!
//! Each pipeline opens its own input and returns either a complete section or
//! an error; [`run`] collects the outcomes independently so a failure in one
//! pipeline never blocks another.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::{info, warn};

use crate::config::{EngineConfig, RouteFilter};
use crate::data::{load_customers, load_routes, load_shipments};
use crate::error::Result;
use crate::forecast::{Forecast, SeasonalArima};
use crate::model::{fit_kmeans, KMeansModel};
use crate::output::{ForecastSection, Report, RouteSection, Section, SegmentPoint};
use crate::routes::{top_destinations, RouteSummary};
use crate::scaler::StandardScaler;
use crate::timeseries::monthly_totals;

/// Selectable pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pipeline {
    Segmentation,
    Routes,
    Forecast,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [Pipeline::Segmentation, Pipeline::Routes, Pipeline::Forecast];
}

/// Inputs and pipelines for one invocation
#[derive(Debug, Clone)]
pub struct Request {
    pub customers: PathBuf,
    pub shipments: PathBuf,
    pub pipelines: Vec<Pipeline>,
}

impl Request {
    pub fn wants(&self, pipeline: Pipeline) -> bool {
        self.pipelines.contains(&pipeline)
    }
}

/// Customer segmentation with per-row cluster labels
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub points: Vec<SegmentPoint>,
    pub model: KMeansModel,
    pub scaler: StandardScaler,
}

/// Standardize customer features and cluster them
///
/// # Arguments
/// * `path` - Path to the customer CSV file
/// * `config` - Engine settings; `cluster_count` and `clustering` are used
///
/// # Returns
/// * `Segmentation` with one point per retained customer, in file order
pub fn segment_customers(path: &Path, config: &EngineConfig) -> Result<Segmentation> {
    let customers = load_customers(path)?;
    let features = customers.features();
    let (scaler, scaled) = StandardScaler::fit_transform(&features)?;
    let model = fit_kmeans(&scaled, config.cluster_count, &config.clustering)?;

    let points = customers
        .records
        .iter()
        .zip(model.labels.iter())
        .map(|(record, &cluster)| SegmentPoint {
            x: record.order_value_usd,
            y: record.satisfaction_score,
            cluster,
        })
        .collect();

    info!(
        customers = customers.records.len(),
        clusters = model.n_clusters,
        sizes = ?model.cluster_sizes(),
        inertia = model.inertia,
        "Segmentation complete"
    );

    Ok(Segmentation {
        points,
        model,
        scaler,
    })
}

/// Rank destinations for the configured origin
pub fn analyze_routes(path: &Path, filter: &RouteFilter) -> Result<RouteSummary> {
    let routes = load_routes(path)?;
    let summary = top_destinations(&routes, filter);
    if summary.is_empty() {
        warn!(
            origin_city = %filter.origin_city,
            origin_country = %filter.origin_country,
            shipment_type = %filter.shipment_type,
            "No shipments match the route filter"
        );
    }
    info!(destinations = summary.destinations.len(), "Route analysis complete");
    Ok(summary)
}

/// Aggregate monthly shipment value and forecast ahead
pub fn forecast_sales(path: &Path, config: &EngineConfig) -> Result<Forecast> {
    let shipments = load_shipments(path)?;
    let series = monthly_totals(&shipments);
    info!(months = series.len(), "Monthly totals aggregated");

    let model = SeasonalArima::new(config.arima_order, config.seasonal_order);
    let fitted = model.fit(&series)?;
    let forecast = fitted.forecast(config.forecast_horizon, config.confidence_level)?;

    info!(horizon = forecast.points.len(), "Forecast complete");
    Ok(forecast)
}

/// Run every requested pipeline and collect the outcomes
pub fn run(request: &Request, config: &EngineConfig) -> Report {
    let mut report = Report::default();

    if request.wants(Pipeline::Segmentation) {
        let result = segment_customers(&request.customers, config).map(|s| s.points);
        report.customer_segmentation = Some(record_outcome("segmentation", result));
    }

    if request.wants(Pipeline::Routes) {
        let result =
            analyze_routes(&request.shipments, &config.routes).map(|s| RouteSection::from(&s));
        report.trade_route_analysis = Some(record_outcome("routes", result));
    }

    if request.wants(Pipeline::Forecast) {
        let result =
            forecast_sales(&request.shipments, config).map(|f| ForecastSection::from(&f));
        report.forecast = Some(record_outcome("forecast", result));
    }

    report
}

fn record_outcome<T>(pipeline: &str, result: Result<T>) -> Section<T> {
    if let Err(e) = &result {
        warn!(pipeline, error = %e, "Pipeline failed");
    }
    Section::from_result(result)
}
