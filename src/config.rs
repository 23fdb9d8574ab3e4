use crate::distance::Metric;
use crate::partition::{PartitionConfig, QualityFunction};

/// Configuration for the full clustering pipeline
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Resolution parameter for community detection. Higher values favor
    /// many small communities, lower values few large ones. Must be > 0.
    pub resolution: f64,

    /// Number of nearest neighbors per observation (self excluded).
    /// Must satisfy 1 <= n_neighbors < n_observations.
    pub n_neighbors: usize,

    /// Distance metric for neighbor search
    pub metric: Metric,

    /// Random seed. `Some` makes neighbor search and partitioning fully
    /// reproducible; `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Use angular (direction-based) splits when building the random
    /// projection trees for neighbor search
    pub angular: bool,

    /// Use edge weights during partitioning. When false, every edge of the
    /// connectivity graph counts as weight 1.
    pub use_weights: bool,

    /// Maximum number of move/aggregate iterations for the partitioner.
    /// `-1` runs until convergence with no fixed cap.
    pub n_iterations: i32,

    /// Community-quality objective optimized by the partitioner
    pub quality: QualityFunction,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            n_neighbors: 30,
            metric: Metric::Euclidean,
            seed: None,
            angular: false,
            use_weights: true,
            n_iterations: -1,
            quality: QualityFunction::RbConfiguration,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration with the given resolution
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    /// Set the number of nearest neighbors
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    /// Set the distance metric
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable angular projection-tree splits
    pub fn with_angular(mut self, angular: bool) -> Self {
        self.angular = angular;
        self
    }

    /// Enable or disable edge weights during partitioning
    pub fn with_use_weights(mut self, use_weights: bool) -> Self {
        self.use_weights = use_weights;
        self
    }

    /// Set the partitioner iteration cap (`-1` = run to convergence)
    pub fn with_n_iterations(mut self, n_iterations: i32) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Set the community-quality objective
    pub fn with_quality(mut self, quality: QualityFunction) -> Self {
        self.quality = quality;
        self
    }

    /// The subset of options consumed by the partitioner
    pub fn partition_config(&self) -> PartitionConfig {
        PartitionConfig {
            resolution: self.resolution,
            quality: self.quality,
            use_weights: self.use_weights,
            n_iterations: self.n_iterations,
            seed: self.seed,
        }
    }
}
