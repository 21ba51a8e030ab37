//! Input tables: CSV loading with Polars and typed record construction

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ndarray::Array2;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};

/// Customer feature column names, in feature-matrix order
pub const CUSTOMER_FEATURES: [&str; 3] = ["order_value_usd", "satisfaction_score", "lead_time_days"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One customer row with all three features present
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    /// Zero-based data row in the source table
    pub row: usize,
    pub order_value_usd: f64,
    pub satisfaction_score: f64,
    pub lead_time_days: f64,
}

impl CustomerRecord {
    /// Feature `j` in [`CUSTOMER_FEATURES`] order
    pub fn feature(&self, j: usize) -> f64 {
        match j {
            0 => self.order_value_usd,
            1 => self.satisfaction_score,
            _ => self.lead_time_days,
        }
    }
}

/// Customers retained for modeling
#[derive(Debug, Clone)]
pub struct CustomerData {
    pub records: Vec<CustomerRecord>,
    /// Rows dropped for a missing feature value
    pub dropped: usize,
}

impl CustomerData {
    /// Feature matrix (n_customers, 3)
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.records.len(), CUSTOMER_FEATURES.len()), |(i, j)| {
            self.records[i].feature(j)
        })
    }
}

/// Route fields of one shipment row, trimmed; nulls load as empty strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub kind: String,
    pub origin_city: String,
    pub origin_country: String,
    pub destination: String,
}

/// One shipment row; string fields are trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub date: NaiveDate,
    pub value: f64,
    pub kind: String,
    pub origin_city: String,
    pub origin_country: String,
    pub destination: String,
}

/// Read a CSV with a header row
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalyticsError::MissingFile(path.to_path_buf()));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), "Read table");
    Ok(df)
}

fn column(df: &DataFrame, name: &str, path: &Path) -> Result<Series> {
    df.column(name)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| AnalyticsError::Schema {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn float_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<f64>>> {
    let series = column(df, name, path)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn string_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<Option<String>>> {
    let series = column(df, name, path)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

/// Load customer records, dropping rows with any missing feature
///
/// # Arguments
/// * `path` - Path to the customer CSV file
///
/// # Returns
/// * `CustomerData` with the complete rows and the number dropped
pub fn load_customers(path: &Path) -> Result<CustomerData> {
    let df = read_table(path)?;
    let order_value = float_column(&df, CUSTOMER_FEATURES[0], path)?;
    let satisfaction = float_column(&df, CUSTOMER_FEATURES[1], path)?;
    let lead_time = float_column(&df, CUSTOMER_FEATURES[2], path)?;

    let mut records = Vec::with_capacity(df.height());
    for (row, ((o, s), l)) in order_value
        .into_iter()
        .zip(satisfaction)
        .zip(lead_time)
        .enumerate()
    {
        match (o, s, l) {
            (Some(o), Some(s), Some(l)) if o.is_finite() && s.is_finite() && l.is_finite() => {
                records.push(CustomerRecord {
                    row,
                    order_value_usd: o,
                    satisfaction_score: s,
                    lead_time_days: l,
                });
            }
            _ => {}
        }
    }

    let dropped = df.height() - records.len();
    info!(
        path = %path.display(),
        retained = records.len(),
        dropped,
        "Loaded customers"
    );
    Ok(CustomerData { records, dropped })
}

fn route_records(df: &DataFrame, path: &Path) -> Result<Vec<RouteRecord>> {
    let kinds = string_column(df, "type", path)?;
    let cities = string_column(df, "origin", path)?;
    let countries = string_column(df, "O_Country", path)?;
    let destinations = string_column(df, "destination", path)?;

    Ok(kinds
        .into_iter()
        .zip(cities)
        .zip(countries)
        .zip(destinations)
        .map(|(((kind, city), country), destination)| RouteRecord {
            kind: kind.unwrap_or_default(),
            origin_city: city.unwrap_or_default(),
            origin_country: country.unwrap_or_default(),
            destination: destination.unwrap_or_default(),
        })
        .collect())
}

/// Load only the route columns of a shipment table
///
/// `date` and `value` are neither required nor parsed, so malformed
/// dates or amounts never affect route ranking.
///
/// # Arguments
/// * `path` - Path to the shipment CSV file
///
/// # Returns
/// * One `RouteRecord` per data row
pub fn load_routes(path: &Path) -> Result<Vec<RouteRecord>> {
    let df = read_table(path)?;
    let routes = route_records(&df, path)?;
    info!(path = %path.display(), shipments = routes.len(), "Loaded shipment routes");
    Ok(routes)
}

/// Load shipment records; any unparseable date or missing value fails the load
pub fn load_shipments(path: &Path) -> Result<Vec<ShipmentRecord>> {
    let df = read_table(path)?;
    let dates = string_column(&df, "date", path)?;
    let values = float_column(&df, "value", path)?;
    let routes = route_records(&df, path)?;

    let mut records = Vec::with_capacity(df.height());
    for (row, ((raw_date, value), route)) in dates
        .into_iter()
        .zip(values)
        .zip(routes)
        .enumerate()
    {
        let raw_date = raw_date.unwrap_or_default();
        let date = parse_date(&raw_date).ok_or_else(|| AnalyticsError::MalformedRecord {
            row,
            field: "date",
            value: raw_date.clone(),
        })?;
        let value = value
            .filter(|v| v.is_finite())
            .ok_or_else(|| AnalyticsError::MalformedRecord {
                row,
                field: "value",
                value: String::new(),
            })?;

        records.push(ShipmentRecord {
            date,
            value,
            kind: route.kind,
            origin_city: route.origin_city,
            origin_country: route.origin_country,
            destination: route.destination,
        });
    }

    info!(path = %path.display(), shipments = records.len(), "Loaded shipments");
    Ok(records)
}

/// Parse a calendar date from the formats shipment exports use
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
