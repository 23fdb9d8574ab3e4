use crate::error::ClusterError;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::str::FromStr;

/// Distance metric used for neighbor search.
///
/// The variant is resolved once at the call boundary (e.g. via [`FromStr`]);
/// the per-pair kernels below are dispatched on the enum, never on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Straight-line (L2) distance
    Euclidean,
    /// City-block (L1) distance
    Manhattan,
    /// One minus the cosine similarity
    Cosine,
    /// Maximum coordinate difference (L-infinity)
    Chebyshev,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean
    }
}

impl FromStr for Metric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            "manhattan" | "l1" | "cityblock" => Ok(Metric::Manhattan),
            "cosine" => Ok(Metric::Cosine),
            "chebyshev" | "linf" => Ok(Metric::Chebyshev),
            other => Err(ClusterError::UnknownMetric(other.to_string())),
        }
    }
}

impl Metric {
    /// Distance between two feature rows. Accumulates in f64 so that long
    /// rows of f32 features do not lose precision.
    #[inline]
    pub fn distance(&self, a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f64 {
        match self {
            Metric::Euclidean => {
                let mut sum = 0.0f64;
                for (x, y) in a.iter().zip(b.iter()) {
                    let d = (*x - *y) as f64;
                    sum += d * d;
                }
                sum.sqrt()
            }
            Metric::Manhattan => {
                let mut sum = 0.0f64;
                for (x, y) in a.iter().zip(b.iter()) {
                    sum += ((*x - *y) as f64).abs();
                }
                sum
            }
            Metric::Cosine => {
                let mut dot = 0.0f64;
                let mut na = 0.0f64;
                let mut nb = 0.0f64;
                for (x, y) in a.iter().zip(b.iter()) {
                    let (x, y) = (*x as f64, *y as f64);
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                let denom = (na * nb).sqrt();
                if denom < 1e-15 {
                    // zero vectors carry no direction
                    1.0
                } else {
                    (1.0 - dot / denom).max(0.0)
                }
            }
            Metric::Chebyshev => {
                let mut max = 0.0f64;
                for (x, y) in a.iter().zip(b.iter()) {
                    let d = ((*x - *y) as f64).abs();
                    if d > max {
                        max = d;
                    }
                }
                max
            }
        }
    }
}

/// Return a row-normalized copy of the data (unit L2 norm per row).
///
/// Rows with vanishing norm are left unchanged. Used by the neighbor finder's
/// angular mode, where projection-tree splits operate on directions rather
/// than positions.
pub fn normalize_rows(data: &ArrayView2<f32>) -> Array2<f32> {
    let mut out = data.to_owned();
    for mut row in out.rows_mut() {
        let norm = row.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
        if norm > 1e-15 {
            let inv = (1.0 / norm) as f32;
            row.mapv_inplace(|x| x * inv);
        }
    }
    out
}
