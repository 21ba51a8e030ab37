//! Derivative-free minimization and normal quantiles used by the forecaster

/// Settings for [`nelder_mead`]
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iterations: usize,
    /// Relative spread of simplex values at which the search stops
    pub ftol: f64,
    /// Simplex diameter at which the search stops
    pub xtol: f64,
    /// Edge length of the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            ftol: 1e-10,
            xtol: 1e-8,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`
///
/// Non-finite objective values are treated as `+inf`, so the simplex moves
/// away from regions where the objective is undefined.
pub fn nelder_mead<F>(f: F, x0: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let n = x0.len();
    if n == 0 {
        return NelderMeadResult {
            x: Vec::new(),
            value: eval(x0),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] += config.initial_step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let (best, worst) = (values[0], values[n]);
        let diameter = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        let spread = if best.is_finite() && worst.is_finite() {
            (worst - best).abs() <= config.ftol * (best.abs() + worst.abs()) + f64::EPSILON
        } else {
            false
        };
        if spread || (best.is_finite() && diameter <= config.xtol) {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n])
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(REFLECT);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(EXPAND);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
        } else if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
        } else {
            let (contracted, f_contracted) = if f_reflected < values[n] {
                let c = along(CONTRACT);
                let fc = eval(&c);
                (c, fc)
            } else {
                let c = along(-CONTRACT);
                let fc = eval(&c);
                (c, fc)
            };

            if f_contracted < values[n].min(f_reflected) {
                simplex[n] = contracted;
                values[n] = f_contracted;
            } else {
                let best_vertex = simplex[0].clone();
                for i in 1..=n {
                    for (x, b) in simplex[i].iter_mut().zip(&best_vertex) {
                        *x = b + SHRINK * (*x - b);
                    }
                    values[i] = eval(&simplex[i]);
                }
            }
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        x: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// Inverse of the standard normal CDF
///
/// Rational approximation (Acklam) with relative error below 1.2e-9 over
/// the open unit interval. Returns `NaN` outside `(0, 1)`.
pub fn quantile_normal(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimizes_rosenbrock() {
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let result = nelder_mead(rosenbrock, &[-1.2, 1.0], &NelderMeadConfig::default());

        assert!(result.converged);
        assert!((result.x[0] - 1.0).abs() < 1e-3, "x0 = {}", result.x[0]);
        assert!((result.x[1] - 1.0).abs() < 1e-3, "x1 = {}", result.x[1]);
    }

    #[test]
    fn test_avoids_undefined_region() {
        // ln is undefined for x <= 0; minimum of x - ln(x) is at x = 1
        let f = |x: &[f64]| x[0] - x[0].ln();
        let result = nelder_mead(f, &[0.05], &NelderMeadConfig::default());
        assert!(result.converged);
        assert!((result.x[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_iteration_budget_reports_non_convergence() {
        let config = NelderMeadConfig {
            max_iterations: 2,
            ..NelderMeadConfig::default()
        };
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let result = nelder_mead(rosenbrock, &[-1.2, 1.0], &config);
        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_normal_quantiles() {
        assert!(quantile_normal(0.5).abs() < 1e-9);
        assert!((quantile_normal(0.975) - 1.959_963_984_540_054).abs() < 1e-8);
        assert!((quantile_normal(0.025) + 1.959_963_984_540_054).abs() < 1e-8);
        assert!((quantile_normal(0.995) - 2.575_829_303_548_901).abs() < 1e-8);
        assert!((quantile_normal(0.001) + 3.090_232_306_167_813).abs() < 1e-7);
        assert!(quantile_normal(0.0).is_nan());
        assert!(quantile_normal(1.0).is_nan());
    }
}
