//! Basic example demonstrating fastleiden-rs usage
//!
//! Run with: cargo run --example basic --release

use fastleiden_rs::{label_clusters, ClusterConfig};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    env_logger::init();

    println!("=== fastleiden-rs example ===\n");

    // Generate synthetic data: 3 blobs in 2D for easy inspection
    let n_samples = 300;
    let n_features = 2;

    println!("Generating {} samples with {} features...", n_samples, n_features);

    let centers = [[-5.0f32, -5.0], [0.0, 5.0], [5.0, -5.0]];
    let noise = Array2::random((n_samples, n_features), Uniform::new(-0.8f32, 0.8));
    let mut data = Array2::<f32>::zeros((n_samples, n_features));

    for i in 0..n_samples {
        let center = centers[i % 3];
        data[[i, 0]] = center[0] + noise[[i, 0]];
        data[[i, 1]] = center[1] + noise[[i, 1]];
    }

    println!("Generating blobs around:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Blob {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    // Cluster with a fixed seed for reproducible output
    let config = ClusterConfig::default()
        .with_n_neighbors(15)
        .with_seed(42);

    println!("Clustering (n_neighbors = 15, resolution = 1.0)...");
    let labels = label_clusters(&data.view(), &config).unwrap();

    let n_clusters = labels.iter().max().unwrap() + 1;
    println!("Found {} clusters\n", n_clusters);

    let mut sizes = vec![0usize; n_clusters as usize];
    for &label in labels.iter() {
        sizes[label as usize] += 1;
    }
    for (id, size) in sizes.iter().enumerate() {
        println!("  Cluster {}: {} points", id, size);
    }
}
