//! Seasonal ARIMA model for monthly shipment value
//!
//! The series is differenced with `(1 - B)^d (1 - B^s)^D` and the result is
//! modeled as
//!
//! ```text
//! φ(B) Φ(B^s) w_t = θ(B) Θ(B^s) ε_t,   ε_t ~ N(0, σ²)
//! ```
//!
//! Coefficients are estimated by conditional maximum likelihood: pre-sample
//! observations and innovations are taken as zero, σ² is concentrated out and
//! the remaining negative log-likelihood is minimized with Nelder–Mead. No
//! stationarity or invertibility constraint is imposed on the search.

use tracing::{debug, info};

use crate::config::{ArimaOrder, SeasonalOrder};
use crate::error::{AnalyticsError, Result};
use crate::optimize::{nelder_mead, quantile_normal, NelderMeadConfig};
use crate::timeseries::{MonthlySeries, YearMonth};

/// Differenced values below this (relative to the series scale) count as zero
const DEGENERATE_TOLERANCE: f64 = 1e-10;

/// Polynomial in the backshift operator; index k holds the coefficient of B^k
type Poly = Vec<f64>;

fn poly_mul(a: &[f64], b: &[f64]) -> Poly {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * Σ c_i B^(i * stride)`
fn lag_poly(coefs: &[f64], stride: usize, sign: f64) -> Poly {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * stride] = sign * c;
    }
    poly
}

fn difference_poly(order: &ArimaOrder, seasonal: &SeasonalOrder) -> Poly {
    let mut poly = vec![1.0];
    for _ in 0..order.d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal.d {
        poly = poly_mul(&poly, &lag_poly(&[1.0], seasonal.period, -1.0));
    }
    poly
}

/// Apply a monic polynomial filter: `out_t = Σ_k poly_k · x_(t-k)` for `t >= deg`
fn apply_filter(poly: &[f64], x: &[f64]) -> Vec<f64> {
    let lag = poly.len() - 1;
    (lag..x.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * x[t - k]).sum())
        .collect()
}

/// Coefficient blocks of a SARIMA model
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl Coefficients {
    fn zeros(order: &ArimaOrder, seasonal: &SeasonalOrder) -> Self {
        Self {
            ar: vec![0.0; order.p],
            ma: vec![0.0; order.q],
            seasonal_ar: vec![0.0; seasonal.p],
            seasonal_ma: vec![0.0; seasonal.q],
        }
    }

    fn from_flat(params: &[f64], order: &ArimaOrder, seasonal: &SeasonalOrder) -> Self {
        let (ar, rest) = params.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(seasonal.p);
        Self {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ar: seasonal_ar.to_vec(),
            seasonal_ma: seasonal_ma.to_vec(),
        }
    }

    /// `φ(B) Φ(B^s)`
    fn ar_poly(&self, period: usize) -> Poly {
        poly_mul(
            &lag_poly(&self.ar, 1, -1.0),
            &lag_poly(&self.seasonal_ar, period, -1.0),
        )
    }

    /// `θ(B) Θ(B^s)`
    fn ma_poly(&self, period: usize) -> Poly {
        poly_mul(
            &lag_poly(&self.ma, 1, 1.0),
            &lag_poly(&self.seasonal_ma, period, 1.0),
        )
    }
}

/// Innovations of the ARMA recursion with zero pre-sample values
fn innovations(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut value = w[t];
        for (k, a) in ar.iter().enumerate().skip(1).take(t) {
            value += a * w[t - k];
        }
        for (k, c) in ma.iter().enumerate().skip(1).take(t) {
            value -= c * e[t - k];
        }
        e[t] = value;
    }
    e
}

/// Concentrated negative log-likelihood of the innovations
fn neg_log_likelihood(e: &[f64]) -> f64 {
    let n = e.len() as f64;
    let sse: f64 = e.iter().map(|v| v * v).sum();
    0.5 * n * ((2.0 * std::f64::consts::PI * sse / n).ln() + 1.0)
}

/// Seasonal ARIMA model with its orders, before fitting
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
    pub optimizer: NelderMeadConfig,
}

impl SeasonalArima {
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal,
            optimizer: NelderMeadConfig::default(),
        }
    }

    fn period(&self) -> usize {
        if self.seasonal.is_active() {
            self.seasonal.period
        } else {
            1
        }
    }

    fn n_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Observations lost to differencing
    fn differencing_lag(&self) -> usize {
        self.order.d + self.seasonal.d * self.period()
    }

    /// Months of history needed to fit
    pub fn min_history(&self) -> usize {
        let cycles = if self.seasonal.is_active() {
            2 * self.seasonal.period
        } else {
            0
        };
        cycles.max(self.differencing_lag() + self.n_params() + 1)
    }

    /// Estimate the model on a monthly series
    pub fn fit(&self, series: &MonthlySeries) -> Result<FittedSarima> {
        let required = self.min_history();
        if series.len() < required {
            return Err(AnalyticsError::InsufficientHistory {
                actual: series.len(),
                required,
            });
        }
        let last_month = series.last_month().ok_or(AnalyticsError::InsufficientHistory {
            actual: 0,
            required,
        })?;

        let y = &series.totals;
        if y.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ForecastFit(
                "series contains non-finite values".to_string(),
            ));
        }
        let scale = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if scale == 0.0 {
            return Err(AnalyticsError::ForecastFit(
                "series is identically zero".to_string(),
            ));
        }

        let diff = difference_poly(&self.order, &self.seasonal);
        let w = apply_filter(&diff, y);
        let period = self.period();

        let w_scale = w.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if w_scale <= DEGENERATE_TOLERANCE * scale.max(1.0) {
            debug!(
                months = y.len(),
                "Differenced series is flat; using deterministic continuation"
            );
            return Ok(FittedSarima {
                order: self.order,
                seasonal: self.seasonal,
                coefficients: Coefficients::zeros(&self.order, &self.seasonal),
                sigma2: 0.0,
                log_likelihood: f64::INFINITY,
                differenced: vec![0.0; w.len()],
                innovations: vec![0.0; w.len()],
                history: y.clone(),
                last_month,
            });
        }

        let objective = |params: &[f64]| {
            let coefs = Coefficients::from_flat(params, &self.order, &self.seasonal);
            let e = innovations(&w, &coefs.ar_poly(period), &coefs.ma_poly(period));
            neg_log_likelihood(&e)
        };

        let x0 = vec![0.0; self.n_params()];
        let result = nelder_mead(objective, &x0, &self.optimizer);
        if !result.converged {
            return Err(AnalyticsError::ForecastFit(format!(
                "likelihood optimization did not converge after {} iterations",
                result.iterations
            )));
        }
        if !result.value.is_finite() || result.x.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ForecastFit(
                "likelihood optimization produced a non-finite optimum".to_string(),
            ));
        }

        let coefficients = Coefficients::from_flat(&result.x, &self.order, &self.seasonal);
        let e = innovations(&w, &coefficients.ar_poly(period), &coefficients.ma_poly(period));
        let sigma2 = e.iter().map(|v| v * v).sum::<f64>() / e.len() as f64;
        if !sigma2.is_finite() {
            return Err(AnalyticsError::ForecastFit(
                "innovation variance is not finite".to_string(),
            ));
        }

        info!(
            months = y.len(),
            iterations = result.iterations,
            sigma2,
            ar = ?coefficients.ar,
            ma = ?coefficients.ma,
            seasonal_ar = ?coefficients.seasonal_ar,
            seasonal_ma = ?coefficients.seasonal_ma,
            "Seasonal ARIMA fitted"
        );

        Ok(FittedSarima {
            order: self.order,
            seasonal: self.seasonal,
            coefficients,
            sigma2,
            log_likelihood: -result.value,
            differenced: w,
            innovations: e,
            history: y.clone(),
            last_month,
        })
    }
}

/// One forecasted month with its interval
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub month: YearMonth,
    pub label: String,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Multi-step forecast in chronological order
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    pub confidence_level: f64,
}

impl Forecast {
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }
}

/// Seasonal ARIMA with estimated coefficients
#[derive(Debug, Clone)]
pub struct FittedSarima {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
    pub coefficients: Coefficients,
    /// Innovation variance
    pub sigma2: f64,
    /// `+inf` for a flat differenced series
    pub log_likelihood: f64,
    differenced: Vec<f64>,
    innovations: Vec<f64>,
    history: Vec<f64>,
    last_month: YearMonth,
}

impl FittedSarima {
    fn period(&self) -> usize {
        if self.seasonal.is_active() {
            self.seasonal.period
        } else {
            1
        }
    }

    /// ψ-weights of the integrated model, `ψ_0 .. ψ_(n-1)`
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        let period = self.period();
        let phi = poly_mul(
            &self.coefficients.ar_poly(period),
            &difference_poly(&self.order, &self.seasonal),
        );
        let theta = self.coefficients.ma_poly(period);

        let mut psi = vec![0.0; n];
        for j in 0..n {
            let mut value = theta.get(j).copied().unwrap_or(0.0);
            for k in 1..=j.min(phi.len() - 1) {
                value -= phi[k] * psi[j - k];
            }
            psi[j] = value;
        }
        psi
    }

    /// Forecast `horizon` months past the end of the history
    pub fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<Forecast> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(AnalyticsError::Config(format!(
                "confidence_level must lie in (0, 1), got {}",
                confidence_level
            )));
        }

        let period = self.period();
        let ar = self.coefficients.ar_poly(period);
        let ma = self.coefficients.ma_poly(period);
        let diff = difference_poly(&self.order, &self.seasonal);

        // ARMA recursion on the differenced scale; future innovations are zero
        let m = self.differenced.len();
        let mut w = self.differenced.clone();
        for j in m..m + horizon {
            let mut value = 0.0;
            for (k, a) in ar.iter().enumerate().skip(1).filter(|(k, _)| *k <= j) {
                value -= a * w[j - k];
            }
            for (k, c) in ma.iter().enumerate().skip(1) {
                if k <= j && j - k < m {
                    value += c * self.innovations[j - k];
                }
            }
            w.push(value);
        }

        // undo differencing: y_t = w_t - Σ_{k>=1} diff_k y_(t-k)
        let mut y = self.history.clone();
        for h in 0..horizon {
            let t = y.len();
            let mut value = w[m + h];
            for (k, c) in diff.iter().enumerate().skip(1) {
                value -= c * y[t - k];
            }
            y.push(value);
        }

        let z = quantile_normal(1.0 - (1.0 - confidence_level) / 2.0);
        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let mut month = self.last_month;
        let n = self.history.len();

        let points = (0..horizon)
            .map(|h| {
                cumulative += psi[h] * psi[h];
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                month = month.succ();
                let point = y[n + h];
                ForecastPoint {
                    month,
                    label: month.label(),
                    point,
                    lower: point - half_width,
                    upper: point + half_width,
                }
            })
            .collect::<Vec<_>>();

        if points
            .iter()
            .any(|p| !(p.point.is_finite() && p.lower.is_finite() && p.upper.is_finite()))
        {
            return Err(AnalyticsError::ForecastFit(
                "forecast recursion produced non-finite values".to_string(),
            ));
        }

        debug!(horizon, sigma2 = self.sigma2, "Forecast computed");

        Ok(Forecast {
            points,
            confidence_level,
        })
    }
}
