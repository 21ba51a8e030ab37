//! Z-score feature standardization

use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};

use crate::error::{AnalyticsError, Result};

/// Columns whose spread falls below this are treated as constant
const DEGENERATE_STD: f64 = 1e-12;

/// Standard scaler fitted on the training rows
///
/// Wraps linfa's linear scaler and additionally pins columns without spread
/// to exactly 0.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    inner: LinearScaler<f64>,
    /// Population standard deviation of each column
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fit column statistics on `features` (rows are samples)
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(AnalyticsError::InsufficientData {
                records: 0,
                required: 1,
            });
        }

        let dataset = DatasetBase::from(features.clone());
        let inner = LinearScaler::standard()
            .fit(&dataset)
            .map_err(|e| AnalyticsError::Scaling(e.to_string()))?;
        let std = features.std_axis(Axis(0), 0.0);
        Ok(Self { inner, std })
    }

    /// Per-column mean
    pub fn mean(&self) -> &Array1<f64> {
        self.inner.offsets()
    }

    /// Whether column `j` has no spread
    pub fn is_degenerate(&self, j: usize) -> bool {
        let scale = self.mean()[j].abs().max(1.0);
        !self.std[j].is_finite() || self.std[j] <= DEGENERATE_STD * scale
    }

    /// Apply `(x - mean) / std`; degenerate columns map to 0
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = self.inner.transform(features.clone());
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            if self.is_degenerate(j) {
                column.fill(0.0);
            }
        }
        scaled
    }

    /// Fit on `features` and transform the same rows
    pub fn fit_transform(features: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(features)?;
        let scaled = scaler.transform(features);
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_std() {
        let raw = array![
            [120.0, 4.5, 10.0],
            [80.0, 3.0, 14.0],
            [300.0, 4.9, 7.0],
            [55.0, 2.1, 21.0],
            [210.0, 3.8, 9.0],
        ];
        let (_, scaled) = StandardScaler::fit_transform(&raw).unwrap();

        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < 1e-9, "mean {} not ~0", mean);
            assert!((std - 1.0).abs() < 1e-9, "std {} not ~1", std);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let raw = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&raw).unwrap();

        assert!(scaler.is_degenerate(1));
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_row_is_all_zero() {
        let raw = array![[5.0, 6.0, 7.0]];
        let (_, scaled) = StandardScaler::fit_transform(&raw).unwrap();
        assert!(scaled.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mean_and_std_are_population_statistics() {
        let raw = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0], [7.0, 10.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&raw).unwrap();

        assert!((scaler.mean()[0] - 4.0).abs() < 1e-12);
        assert!((scaler.std[0] - 5.0_f64.sqrt()).abs() < 1e-12);
        assert!((scaled[[0, 0]] + 3.0 / 5.0_f64.sqrt()).abs() < 1e-9);
        assert!(!scaler.is_degenerate(0));
        assert!(scaler.is_degenerate(1));
    }

    #[test]
    fn test_transform_new_rows_uses_training_statistics() {
        let raw = array![[0.0, 2.0], [2.0, 4.0]];
        let scaler = StandardScaler::fit(&raw).unwrap();
        let scaled = scaler.transform(&array![[4.0, 3.0]]);
        assert!((scaled[[0, 0]] - 3.0).abs() < 1e-9);
        assert!(scaled[[0, 1]].abs() < 1e-9);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let raw = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            StandardScaler::fit(&raw),
            Err(AnalyticsError::InsufficientData { .. })
        ));
    }
}
