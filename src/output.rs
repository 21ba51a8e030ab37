//! JSON result shapes consumed by the dashboard

use serde::Serialize;
use serde_json::Value;

use crate::error::{AnalyticsError, Result};
use crate::forecast::Forecast;
use crate::routes::RouteSummary;

/// One customer in the segmentation scatter plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPoint {
    /// Order value in USD
    pub x: f64,
    /// Satisfaction score
    pub y: f64,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSection {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl From<&RouteSummary> for RouteSection {
    fn from(summary: &RouteSummary) -> Self {
        Self {
            labels: summary.labels(),
            data: summary.counts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSection {
    pub labels: Vec<String>,
    pub forecast_data: Vec<f64>,
    pub confidence_lower: Vec<f64>,
    pub confidence_upper: Vec<f64>,
}

impl From<&Forecast> for ForecastSection {
    fn from(forecast: &Forecast) -> Self {
        Self {
            labels: forecast.labels(),
            forecast_data: forecast.values(),
            confidence_lower: forecast.lower(),
            confidence_upper: forecast.upper(),
        }
    }
}

/// Outcome of one pipeline: its payload, or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> Section<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Section::Ok(value),
            Err(e) => Section::Failed {
                error: e.to_string(),
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Ok(_) => None,
            Section::Failed { error } => Some(error.as_str()),
        }
    }
}

/// Combined result of the requested pipelines
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_segmentation: Option<Section<Vec<SegmentPoint>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_route_analysis: Option<Section<RouteSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Section<ForecastSection>>,
}

impl Report {
    /// `(section, message)` for every failed section
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        let mut errors = Vec::new();
        if let Some(message) = self.customer_segmentation.as_ref().and_then(Section::error) {
            errors.push(("customer_segmentation", message));
        }
        if let Some(message) = self.trade_route_analysis.as_ref().and_then(Section::error) {
            errors.push(("trade_route_analysis", message));
        }
        if let Some(message) = self.forecast.as_ref().and_then(Section::error) {
            errors.push(("forecast", message));
        }
        errors
    }

    /// Number of sections present, failed or not
    pub fn section_count(&self) -> usize {
        [
            self.customer_segmentation.is_some(),
            self.trade_route_analysis.is_some(),
            self.forecast.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }

    /// True when at least one section failed and none succeeded
    pub fn all_failed(&self) -> bool {
        let failed = self.errors().len();
        failed > 0 && failed == self.section_count()
    }

    /// Serialize and normalize into a plain JSON tree
    pub fn to_json(&self) -> Result<Value> {
        normalize(serde_json::to_value(self)?)
    }
}

/// Walk a JSON tree and guarantee every number is a plain finite value
///
/// serde_json encodes NaN and infinities as `null`; report shapes have no
/// nullable fields, so any `null` marks a non-finite number and is rejected
/// with its JSON path.
pub fn normalize(value: Value) -> Result<Value> {
    normalize_at(value, "$")
}

fn normalize_at(value: Value, path: &str) -> Result<Value> {
    match value {
        Value::Null => Err(AnalyticsError::NonFiniteOutput {
            path: path.to_string(),
        }),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Ok(Value::Number(n)),
            _ => Err(AnalyticsError::NonFiniteOutput {
                path: path.to_string(),
            }),
        },
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| normalize_at(item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| {
                let child = format!("{}.{}", path, key);
                normalize_at(item, &child).map(|v| (key, v))
            })
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

/// `{"error": "..."}` payload for the error channel
pub fn error_payload(message: &str) -> Value {
    serde_json::json!({ "error": message })
}
