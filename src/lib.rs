//! # fastleiden-rs
//!
//! Graph-based clustering for high-dimensional numeric data in Rust,
//! compatible with ndarray.
//!
//! ## Features
//!
//! - **Approximate neighbor search**: randomized projection trees seed a
//!   neighbor-graph descent, trading a small recall loss for sub-quadratic
//!   running time on large inputs
//! - **Fuzzy connectivity graph**: per-point scaled distance decay with
//!   probabilistic t-conorm symmetrization
//! - **Leiden-style partitioning**: resolution-parameterized community
//!   detection with local moving, refinement, and aggregation phases
//! - **Parallel computation**: uses rayon for multi-threaded neighbor search
//! - **Reproducible**: a fixed seed makes the whole pipeline deterministic
//!
//! ## Example
//!
//! ```rust
//! use fastleiden_rs::{label_clusters, ClusterConfig};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! // Generate random data
//! let data = Array2::random((500, 16), Uniform::new(-1.0f32, 1.0));
//!
//! // Cluster with a fixed seed
//! let config = ClusterConfig::default()
//!     .with_n_neighbors(15)
//!     .with_seed(42);
//! let labels = label_clusters(&data.view(), &config).unwrap();
//! assert_eq!(labels.len(), 500);
//! ```
//!
//! ## Custom Configuration
//!
//! ```rust
//! use fastleiden_rs::{ClusterConfig, ClusterLabeler, Metric, QualityFunction};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let data = Array2::random((300, 8), Uniform::new(-1.0f32, 1.0));
//!
//! let config = ClusterConfig::new(0.8)
//!     .with_n_neighbors(20)
//!     .with_metric(Metric::Cosine)
//!     .with_quality(QualityFunction::Cpm)
//!     .with_seed(7);
//!
//! let labels = ClusterLabeler::with_config(config)
//!     .label(&data.view())
//!     .unwrap();
//! assert_eq!(labels.len(), 300);
//! ```
//!
//! The pipeline stages are also usable on their own via [`find_neighbors`],
//! [`build_fuzzy_graph`], [`to_graph`], and [`partition`] for callers that
//! want to reuse a neighbor graph or bring their own connectivities.

mod config;
mod distance;
mod error;
mod fuzzy;
mod graph;
mod labeler;
mod neighbors;
mod partition;

pub use config::ClusterConfig;
pub use distance::Metric;
pub use error::ClusterError;
pub use fuzzy::{build_fuzzy_graph, FuzzyGraph};
pub use graph::{to_directed_graph, to_graph, to_undirected_graph};
pub use labeler::{label_clusters, ClusterLabeler};
pub use neighbors::{find_neighbors, NeighborGraph};
pub use partition::{partition, PartitionConfig, QualityFunction};
