use crate::config::ClusterConfig;
use crate::error::ClusterError;
use crate::fuzzy::build_fuzzy_graph;
use crate::graph::to_undirected_graph;
use crate::neighbors::find_neighbors;
use crate::partition::partition;
use ndarray::{Array1, ArrayView2};

/// Assigns cluster identities to the rows of a feature matrix.
///
/// Wires the pipeline together: approximate nearest neighbors, fuzzy
/// connectivity graph, explicit weighted graph, community detection. Holds no
/// algorithmic content of its own; all failures of the stages propagate
/// unchanged.
///
/// # Example
///
/// ```
/// use fastleiden_rs::{ClusterConfig, ClusterLabeler};
/// use ndarray::Array2;
/// use ndarray_rand::RandomExt;
/// use ndarray_rand::rand_distr::Uniform;
///
/// let data = Array2::random((200, 8), Uniform::new(-1.0f32, 1.0));
///
/// let labeler = ClusterLabeler::with_config(
///     ClusterConfig::default().with_n_neighbors(15).with_seed(42),
/// );
/// let labels = labeler.label(&data.view()).unwrap();
/// assert_eq!(labels.len(), 200);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClusterLabeler {
    config: ClusterConfig,
}

impl ClusterLabeler {
    /// Create a labeler with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a labeler with a custom configuration
    pub fn with_config(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Cluster the rows of `data` and return one integer label per row.
    ///
    /// Label ids are contiguous non-negative integers starting at 0. With a
    /// fixed seed in the configuration, repeated calls on the same input
    /// return identical labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty or contains non-finite
    /// values, if `n_neighbors >= n`, or if the resolution is not positive.
    pub fn label(&self, data: &ArrayView2<f32>) -> Result<Array1<i64>, ClusterError> {
        let config = &self.config;
        log::info!(
            "clustering {} observations with {} features (n_neighbors = {}, resolution = {})",
            data.nrows(),
            data.ncols(),
            config.n_neighbors,
            config.resolution
        );

        let knn = find_neighbors(
            data,
            config.n_neighbors,
            config.metric,
            config.seed,
            config.angular,
        )?;

        log::info!("building fuzzy connectivity graph");
        let fuzzy = build_fuzzy_graph(&knn);

        log::info!("materializing graph ({} edges)", fuzzy.n_edges());
        let graph = to_undirected_graph(&fuzzy);

        log::info!("partitioning");
        let labels = partition(&graph, &config.partition_config())?;

        Ok(Array1::from_iter(labels.into_iter().map(|l| l as i64)))
    }
}

/// Cluster the rows of `data` in one call; see [`ClusterLabeler::label`]
pub fn label_clusters(
    data: &ArrayView2<f32>,
    config: &ClusterConfig,
) -> Result<Array1<i64>, ClusterError> {
    ClusterLabeler::with_config(config.clone()).label(data)
}
