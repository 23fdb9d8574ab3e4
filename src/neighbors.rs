use crate::distance::{normalize_rows, Metric};
use crate::error::ClusterError;
use ndarray::ArrayView2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Exact search is cheaper than tree construction below this size
const EXACT_SEARCH_CUTOFF: usize = 512;

/// Number of random projection trees used to seed the descent
const N_TREES: usize = 8;

/// Maximum recursion depth for a projection tree
const MAX_TREE_DEPTH: usize = 100;

/// Maximum neighbor-descent rounds
const MAX_DESCENT_ROUNDS: usize = 10;

/// Descent converges when fewer than this fraction of list slots change
const DESCENT_DELTA: f64 = 0.001;

/// Approximate k-nearest-neighbor lists for a set of observations.
///
/// For each observation `i`, holds `k` `(neighbor_index, distance)` pairs
/// sorted ascending by distance, with `i` itself excluded. The relation is
/// asymmetric: `j` appearing in `i`'s list does not imply the reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborGraph {
    indices: Vec<Vec<u32>>,
    distances: Vec<Vec<f64>>,
    k: usize,
}

impl NeighborGraph {
    /// Number of observations
    pub fn n_observations(&self) -> usize {
        self.indices.len()
    }

    /// Neighbors per observation
    pub fn k(&self) -> usize {
        self.k
    }

    /// Neighbor indices of observation `i`, nearest first
    pub fn indices(&self, i: usize) -> &[u32] {
        &self.indices[i]
    }

    /// Neighbor distances of observation `i`, ascending
    pub fn distances(&self, i: usize) -> &[f64] {
        &self.distances[i]
    }

    /// Iterate `(neighbor_index, distance)` pairs of observation `i`
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices[i]
            .iter()
            .copied()
            .zip(self.distances[i].iter().copied())
    }
}

/// Compute approximate k-nearest neighbors for every row of `data`.
///
/// Small inputs are scanned exactly; larger ones are seeded from a forest of
/// randomized projection trees and refined by neighbor-graph descent, trading
/// a small recall loss for sub-quadratic running time. With a fixed `seed`
/// the result is fully reproducible; `None` seeds from entropy.
///
/// `angular` switches the tree splits to operate on row directions instead of
/// positions (the reported distances still use `metric`).
///
/// # Errors
///
/// Returns an error if:
/// - `data` has no rows or no columns
/// - `data` contains NaN or infinite values
/// - `k` is 0 or `k >= n`
pub fn find_neighbors(
    data: &ArrayView2<f32>,
    k: usize,
    metric: Metric,
    seed: Option<u64>,
    angular: bool,
) -> Result<NeighborGraph, ClusterError> {
    let n = data.nrows();
    if n == 0 || data.ncols() == 0 {
        return Err(ClusterError::EmptyInput(format!(
            "matrix is {} x {}",
            n,
            data.ncols()
        )));
    }
    if let Some(bad) = data.iter().position(|v| !v.is_finite()) {
        return Err(ClusterError::NonFiniteInput(format!(
            "value at flat index {} is not finite",
            bad
        )));
    }
    if k == 0 || k >= n {
        return Err(ClusterError::InvalidNeighborCount(format!(
            "n_neighbors = {} must satisfy 1 <= n_neighbors < n = {}",
            k, n
        )));
    }

    let root_seed = seed.unwrap_or_else(|| rand::thread_rng().gen());

    let lists = if n <= EXACT_SEARCH_CUTOFF {
        log::debug!("n = {} at or below exact-search cutoff, scanning all pairs", n);
        exact_neighbors(data, k, metric)
    } else {
        approximate_neighbors(data, k, metric, root_seed, angular)
    };

    let mut indices = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);
    for list in lists {
        indices.push(list.iter().map(|&(_, j)| j).collect());
        distances.push(list.iter().map(|&(d, _)| d).collect());
    }

    Ok(NeighborGraph {
        indices,
        distances,
        k,
    })
}

/// Ascending by distance, index as tie-break. Distances are finite here
/// (input was validated), so the comparison is total.
#[inline]
fn cmp_candidates(a: &(f64, u32), b: &(f64, u32)) -> Ordering {
    a.0.partial_cmp(&b.0)
        .unwrap_or(Ordering::Equal)
        .then(a.1.cmp(&b.1))
}

fn exact_neighbors(data: &ArrayView2<f32>, k: usize, metric: Metric) -> Vec<Vec<(f64, u32)>> {
    let n = data.nrows();
    (0..n)
        .into_par_iter()
        .map(|i| {
            let row_i = data.row(i);
            let mut cands: Vec<(f64, u32)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (metric.distance(&row_i, &data.row(j)), j as u32))
                .collect();
            cands.sort_unstable_by(cmp_candidates);
            cands.truncate(k);
            cands
        })
        .collect()
}

fn approximate_neighbors(
    data: &ArrayView2<f32>,
    k: usize,
    metric: Metric,
    root_seed: u64,
    angular: bool,
) -> Vec<Vec<(f64, u32)>> {
    let n = data.nrows();
    let leaf_size = k.max(32);

    // angular mode splits on directions; distances still use the raw rows
    let normalized = if angular {
        Some(normalize_rows(data))
    } else {
        None
    };
    let split_data = match &normalized {
        Some(a) => a.view(),
        None => data.view(),
    };

    // forest of randomized partition trees, built serially so the leaf set
    // depends only on the seed
    let mut rng = ChaCha8Rng::seed_from_u64(root_seed);
    let mut leaves: Vec<Vec<u32>> = Vec::new();
    for _ in 0..N_TREES {
        let indices: Vec<u32> = (0..n as u32).collect();
        split_recursive(&split_data, metric, indices, leaf_size, &mut rng, &mut leaves, 0);
    }

    // leaf membership per point, for pull-based candidate gathering
    let mut point_leaves: Vec<Vec<u32>> = vec![Vec::with_capacity(N_TREES); n];
    for (leaf_id, leaf) in leaves.iter().enumerate() {
        for &p in leaf {
            point_leaves[p as usize].push(leaf_id as u32);
        }
    }

    // initial lists: leaf co-members plus random fill
    let mut lists: Vec<Vec<(f64, u32)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut cands: Vec<u32> = point_leaves[i]
                .iter()
                .flat_map(|&leaf_id| leaves[leaf_id as usize].iter().copied())
                .filter(|&j| j as usize != i)
                .collect();
            let mut point_rng = point_stream(root_seed, i);
            while cands.len() < 2 * k {
                let j = point_rng.gen_range(0..n as u32);
                if j as usize != i {
                    cands.push(j);
                }
            }
            cands.sort_unstable();
            cands.dedup();
            // random fill can collide; top up from the index range so every
            // initial list reaches k entries
            if cands.len() < k {
                for j in 0..n as u32 {
                    if j as usize != i && !cands.contains(&j) {
                        cands.push(j);
                        if cands.len() >= k {
                            break;
                        }
                    }
                }
            }

            let row_i = data.row(i);
            let mut scored: Vec<(f64, u32)> = cands
                .into_iter()
                .map(|j| (metric.distance(&row_i, &data.row(j as usize)), j))
                .collect();
            scored.sort_unstable_by(cmp_candidates);
            scored.truncate(k);
            scored
        })
        .collect();

    // neighbor-graph descent: each point pulls candidates from the neighbors
    // of its neighbors (forward and reverse) and keeps the k best; pull-based
    // rounds read only the previous snapshot, so parallel execution stays
    // deterministic
    let max_candidates = (2 * k).max(60);
    let stop_threshold = (DESCENT_DELTA * n as f64 * k as f64) as usize;

    for round in 0..MAX_DESCENT_ROUNDS {
        let mut reverse: Vec<Vec<u32>> = vec![Vec::new(); n];
        for (i, list) in lists.iter().enumerate() {
            for &(_, j) in list {
                let rev = &mut reverse[j as usize];
                if rev.len() < 2 * k {
                    rev.push(i as u32);
                }
            }
        }

        let results: Vec<(Vec<(f64, u32)>, usize)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut cands: Vec<u32> = Vec::with_capacity(4 * k * k);
                for &j in reverse[i].iter() {
                    cands.push(j);
                }
                let first_degree: Vec<u32> = lists[i]
                    .iter()
                    .map(|&(_, j)| j)
                    .chain(reverse[i].iter().copied())
                    .collect();
                for &j in &first_degree {
                    for &(_, l) in &lists[j as usize] {
                        cands.push(l);
                    }
                    for &l in &reverse[j as usize] {
                        cands.push(l);
                    }
                }
                cands.retain(|&l| l as usize != i);
                cands.sort_unstable();
                cands.dedup();

                // bound the per-round work; sampling which candidates survive
                // is part of the seeded stream
                if cands.len() > max_candidates {
                    let mut point_rng = point_stream(root_seed.wrapping_add(round as u64 + 1), i);
                    cands.shuffle(&mut point_rng);
                    cands.truncate(max_candidates);
                }

                let current = &lists[i];
                let row_i = data.row(i);
                let mut merged: Vec<(f64, u32)> = current.clone();
                for &l in &cands {
                    if current.iter().any(|&(_, j)| j == l) {
                        continue;
                    }
                    merged.push((metric.distance(&row_i, &data.row(l as usize)), l));
                }
                merged.sort_unstable_by(cmp_candidates);
                merged.dedup_by_key(|&mut (_, j)| j);
                merged.truncate(k);

                let changed = merged
                    .iter()
                    .filter(|&&(_, j)| !current.iter().any(|&(_, c)| c == j))
                    .count();
                (merged, changed)
            })
            .collect();

        let mut total_changed = 0usize;
        lists = results
            .into_iter()
            .map(|(list, changed)| {
                total_changed += changed;
                list
            })
            .collect();

        log::debug!(
            "descent round {}: {} of {} list slots updated",
            round + 1,
            total_changed,
            n * k
        );
        if total_changed <= stop_threshold {
            break;
        }
    }

    lists
}

/// Per-point RNG stream derived from the root seed, so parallel per-point
/// sampling stays independent of scheduling order.
fn point_stream(root_seed: u64, i: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(
        root_seed ^ (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
    )
}

/// Recursively split `indices` by proximity to two randomly chosen anchor
/// points until leaves fit `leaf_size`. Degenerate splits (duplicates putting
/// everything on one side) fall back to a random halving.
fn split_recursive(
    data: &ArrayView2<f32>,
    metric: Metric,
    mut indices: Vec<u32>,
    leaf_size: usize,
    rng: &mut ChaCha8Rng,
    leaves: &mut Vec<Vec<u32>>,
    depth: usize,
) {
    if indices.len() <= leaf_size || depth >= MAX_TREE_DEPTH {
        leaves.push(indices);
        return;
    }

    let a = indices[rng.gen_range(0..indices.len())];
    let mut b = a;
    for _ in 0..8 {
        let cand = indices[rng.gen_range(0..indices.len())];
        if cand != a {
            b = cand;
            break;
        }
    }
    if b == a {
        leaves.push(indices);
        return;
    }

    let row_a = data.row(a as usize);
    let row_b = data.row(b as usize);
    let (mut left, mut right): (Vec<u32>, Vec<u32>) = indices.iter().copied().partition(|&p| {
        let row_p = data.row(p as usize);
        metric.distance(&row_p, &row_a) <= metric.distance(&row_p, &row_b)
    });

    if left.is_empty() || right.is_empty() {
        indices.shuffle(rng);
        let mid = indices.len() / 2;
        right = indices.split_off(mid);
        left = indices;
    }

    split_recursive(data, metric, left, leaf_size, rng, leaves, depth + 1);
    split_recursive(data, metric, right, leaf_size, rng, leaves, depth + 1);
}
