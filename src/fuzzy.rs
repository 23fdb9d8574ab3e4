use crate::neighbors::NeighborGraph;
use std::collections::HashMap;

/// Bisection stops once the membership mass is within this of the target
const SMOOTH_K_TOLERANCE: f64 = 1e-5;

/// Maximum bisection steps for the local scale parameter
const MAX_SMOOTH_ITER: usize = 64;

/// Scale floor, as a fraction of the mean neighbor distance
const MIN_SCALE_FRACTION: f64 = 1e-3;

/// Symmetric fuzzy connectivity graph over `n` observations.
///
/// Entry `(i, j)` encodes the probability that observations `i` and `j` are
/// locally adjacent, obtained as the fuzzy union of both directed membership
/// strengths. Entries lie in `[0, 1]`; self-loops are absent. Edges are stored
/// once per unordered pair with `i < j`, sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyGraph {
    n: usize,
    edges: Vec<(u32, u32, f64)>,
}

impl FuzzyGraph {
    /// Build a fuzzy graph directly from `(i, j, weight)` triples.
    ///
    /// Triples must use canonical order (`i < j`, no duplicates); weights
    /// outside `(0, 1]` are dropped. Intended for assembling graphs from
    /// precomputed connectivities.
    pub fn from_edges(n: usize, mut edges: Vec<(u32, u32, f64)>) -> Self {
        edges.retain(|&(i, j, w)| i < j && (j as usize) < n && w > 0.0 && w <= 1.0);
        edges.sort_unstable_by_key(|&(i, j, _)| (i, j));
        edges.dedup_by_key(|&mut (i, j, _)| (i, j));
        FuzzyGraph { n, edges }
    }

    /// Number of observations (rows/columns of the conceptual matrix)
    pub fn n_vertices(&self) -> usize {
        self.n
    }

    /// Number of stored unordered pairs
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edges as `(i, j, weight)` triples with `i < j`, sorted by `(i, j)`
    pub fn edges(&self) -> &[(u32, u32, f64)] {
        &self.edges
    }
}

/// Convert asymmetric neighbor lists into a symmetric fuzzy graph.
///
/// For each observation a local scale is solved by monotone bisection so that
/// the total membership mass over its neighbors equals `log2(k)`, with the
/// distance to the nearest neighbor subtracted off first. Directed
/// memberships are then combined with the probabilistic t-conorm
/// `s = p + p' - p * p'`, which keeps entries in `[0, 1]` and leaves
/// `s[i,j] = 0` exactly when neither point lists the other.
///
/// Degenerate rows where the bisection cannot converge (e.g. duplicate
/// points) fall back to a floored scale instead of failing; the fallback is
/// logged.
pub fn build_fuzzy_graph(knn: &NeighborGraph) -> FuzzyGraph {
    let n = knn.n_observations();
    let k = knn.k();
    let target = (k as f64).log2();

    let mean_all: f64 = {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..n {
            for &d in knn.distances(i) {
                sum += d;
                count += 1;
            }
        }
        if count > 0 {
            sum / count as f64
        } else {
            0.0
        }
    };

    let mut n_floored = 0usize;
    let mut directed: HashMap<(u32, u32), (f64, f64)> = HashMap::with_capacity(n * k);

    for i in 0..n {
        let dists = knn.distances(i);
        // distance to the nearest non-duplicate neighbor
        let rho = dists.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

        let (mut sigma, converged) = smooth_knn_scale(dists, rho, target);
        if !converged {
            n_floored += 1;
        }

        // floor keeps the output scale stable on near-duplicate rows
        let mean_i: f64 = dists.iter().sum::<f64>() / dists.len().max(1) as f64;
        let floor = if rho > 0.0 {
            MIN_SCALE_FRACTION * mean_i
        } else {
            MIN_SCALE_FRACTION * mean_all
        };
        if sigma < floor {
            sigma = floor;
        }

        for (j, d) in knn.neighbors(i) {
            let w = membership(d, rho, sigma);
            if w <= 0.0 {
                continue;
            }
            let key = if (i as u32) < j {
                (i as u32, j)
            } else {
                (j, i as u32)
            };
            let slot = directed.entry(key).or_insert((0.0, 0.0));
            if (i as u32) < j {
                slot.0 = w;
            } else {
                slot.1 = w;
            }
        }
    }

    if n_floored > 0 {
        log::warn!(
            "local scale bisection did not converge for {} of {} observations; \
             applied minimum-scale floor",
            n_floored,
            n
        );
    }

    let mut edges: Vec<(u32, u32, f64)> = directed
        .into_iter()
        .map(|((i, j), (a, b))| (i, j, a + b - a * b))
        .filter(|&(_, _, w)| w > 0.0)
        .collect();
    edges.sort_unstable_by_key(|&(i, j, _)| (i, j));

    FuzzyGraph { n, edges }
}

#[inline]
fn membership(d: f64, rho: f64, sigma: f64) -> f64 {
    let diff = d - rho;
    if diff <= 0.0 || sigma <= 0.0 {
        1.0
    } else {
        (-diff / sigma).exp()
    }
}

/// Solve for the scale sigma such that the membership mass over the neighbor
/// distances equals `target`. The mass is strictly increasing in sigma, so
/// plain bisection applies; the upper bracket is grown geometrically until it
/// encloses the root. Returns the scale and whether the tolerance was met.
fn smooth_knn_scale(dists: &[f64], rho: f64, target: f64) -> (f64, bool) {
    let mut lo = 0.0f64;
    let mut hi = f64::INFINITY;
    let mut mid = 1.0f64;
    let mut converged = false;

    for _ in 0..MAX_SMOOTH_ITER {
        let mass: f64 = dists.iter().map(|&d| membership(d, rho, mid)).sum();

        if (mass - target).abs() < SMOOTH_K_TOLERANCE {
            converged = true;
            break;
        }
        if mass > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            if hi.is_infinite() {
                mid *= 2.0;
            } else {
                mid = (lo + hi) / 2.0;
            }
        }
    }

    (mid, converged)
}
