//! K-Means clustering model implementation

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::error::{AnalyticsError, Result};

/// Fitted K-Means partition of the standardized features
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignment for each training row
    pub labels: Array1<usize>,
    /// Cluster centroids in standardized space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl KMeansModel {
    /// Nearest centroid for a standardized feature vector
    pub fn predict(&self, features: &Array1<f64>) -> Result<usize> {
        if features.len() != self.centroids.ncols() {
            return Err(AnalyticsError::Clustering(format!(
                "feature vector must have {} dimensions, got {}",
                self.centroids.ncols(),
                features.len()
            )));
        }

        let closest = self
            .centroids
            .outer_iter()
            .map(|centroid| squared_distance(&features.view(), &centroid))
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        Ok(closest)
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Partition `features` into `n_clusters` groups
///
/// Initialisation is seeded from `config.seed`, so identical input always
/// yields the identical partition. `config.n_runs` restarts are performed and
/// the lowest-inertia run is kept.
///
/// # Arguments
/// * `features` - Standardized features (n_samples, n_features)
/// * `n_clusters` - Number of clusters
/// * `config` - Seed, restarts, iteration budget and tolerance
///
/// # Returns
/// * Fitted `KMeansModel` with one label per row
pub fn fit_kmeans(
    features: &Array2<f64>,
    n_clusters: usize,
    config: &ClusteringConfig,
) -> Result<KMeansModel> {
    if n_clusters == 0 {
        return Err(AnalyticsError::Config(
            "number of clusters must be at least 1".to_string(),
        ));
    }

    if features.nrows() < n_clusters {
        return Err(AnalyticsError::InsufficientData {
            records: features.nrows(),
            required: n_clusters,
        });
    }

    let dataset = DatasetBase::from(features.clone());
    let rng = StdRng::seed_from_u64(config.seed);

    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(config.n_runs)
        .max_n_iterations(config.max_iterations)
        .tolerance(config.tolerance)
        .fit(&dataset)
        .map_err(|e| AnalyticsError::Clustering(e.to_string()))?;

    let labels: Array1<usize> = model.predict(features);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(features, &labels, &centroids);

    debug!(n_clusters, inertia, "K-Means fitted");

    Ok(KMeansModel {
        n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .filter_map(|(i, &cluster)| {
            (cluster < centroids.nrows())
                .then(|| squared_distance(&features.row(i), &centroids.row(cluster)))
        })
        .sum()
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
