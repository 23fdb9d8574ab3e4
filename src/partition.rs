use crate::error::ClusterError;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::str::FromStr;

/// Minimum quality gain considered a real improvement
const MIN_GAIN: f64 = 1e-12;

/// Community-quality objective optimized by the partitioner.
///
/// Each variant is evaluable incrementally as single vertices move between
/// communities, which is what the local-moving phase requires. The
/// `resolution` parameter is local to the selected variant; values are not
/// comparable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityFunction {
    /// Modularity with the null-model term scaled by the resolution
    /// parameter (the Reichardt-Bornholdt configuration model)
    RbConfiguration,
    /// Constant Potts model; resolution acts as an inner-density threshold
    Cpm,
}

impl Default for QualityFunction {
    fn default() -> Self {
        QualityFunction::RbConfiguration
    }
}

impl FromStr for QualityFunction {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rbconfiguration" | "rb" | "modularity" => Ok(QualityFunction::RbConfiguration),
            "cpm" => Ok(QualityFunction::Cpm),
            other => Err(ClusterError::UnknownQuality(other.to_string())),
        }
    }
}

/// Options consumed by [`partition`]
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Granularity knob; higher favors more, smaller communities. Must be > 0.
    pub resolution: f64,
    /// Quality objective
    pub quality: QualityFunction,
    /// When false, every edge counts as weight 1
    pub use_weights: bool,
    /// Cap on move/aggregate iterations; `-1` runs to convergence
    pub n_iterations: i32,
    /// Seed for the vertex-visitation order
    pub seed: Option<u64>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            quality: QualityFunction::RbConfiguration,
            use_weights: true,
            n_iterations: -1,
            seed: None,
        }
    }
}

/// Partition a weighted undirected graph into communities.
///
/// Iterates a local-moving phase (seeded random vertex order, each vertex
/// moved to the neighboring or empty community with the strictest quality
/// gain) with a refinement step that splits communities into their connected
/// components, then contracts the refined communities into a coarser graph
/// and repeats. The hierarchy is flattened back to the original vertices and
/// cluster ids are renumbered contiguously from 0 in first-appearance order.
///
/// Degenerate all-singleton or all-in-one results are valid outputs, not
/// errors.
///
/// # Errors
///
/// Returns an error if `resolution <= 0` or the graph has no vertices.
pub fn partition(
    graph: &UnGraph<(), f64>,
    config: &PartitionConfig,
) -> Result<Vec<usize>, ClusterError> {
    if !(config.resolution > 0.0 && config.resolution.is_finite()) {
        return Err(ClusterError::InvalidResolution(format!(
            "resolution = {} must be a positive finite number",
            config.resolution
        )));
    }
    let n = graph.node_count();
    if n == 0 {
        return Err(ClusterError::EmptyGraph);
    }

    let mut rng = match config.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut level = LevelGraph::from_graph(graph, config.use_weights);
    let mut membership: Vec<usize> = (0..n).collect();
    let mut comm_of: Vec<usize> = (0..n).collect();

    let mut iteration = 0i32;
    while config.n_iterations < 0 || iteration < config.n_iterations {
        let moved = local_move(&level, &mut comm_of, &mut rng, config);
        iteration += 1;

        let (refined, n_refined) = refine(&level, &comm_of);
        log::debug!(
            "partition iteration {}: {} vertices, {} refined communities, moved = {}",
            iteration,
            level.n(),
            n_refined,
            moved
        );
        if n_refined == level.n() {
            // every refined community is a single vertex; no contraction left
            break;
        }

        let (coarse, seeds) = aggregate(&level, &refined, n_refined, &comm_of);
        for m in membership.iter_mut() {
            *m = refined[*m];
        }
        comm_of = seeds;
        level = coarse;
    }

    // final split into connected components; communities stay internally
    // connected even when a seeded community never re-merged
    let (refined, _) = refine(&level, &comm_of);
    let mut labels: Vec<usize> = membership.into_iter().map(|m| refined[m]).collect();
    renumber(&mut labels);
    Ok(labels)
}

/// Flattened adjacency for one aggregation level
struct LevelGraph {
    /// Neighbor lists (no self entries), sorted by neighbor id
    adj: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per vertex (from contracted intra-community edges)
    self_weight: Vec<f64>,
    /// Weighted degree: adjacent weights plus twice the self-loop
    degree: Vec<f64>,
    /// Number of original observations contracted into each vertex
    node_size: Vec<usize>,
    /// Sum of all distinct edge weights, self-loops included
    total_weight: f64,
}

impl LevelGraph {
    fn n(&self) -> usize {
        self.adj.len()
    }

    fn from_graph(graph: &UnGraph<(), f64>, use_weights: bool) -> Self {
        let n = graph.node_count();
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut self_weight = vec![0.0f64; n];
        let mut total_weight = 0.0f64;

        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let w = if use_weights { *edge.weight() } else { 1.0 };
            if a == b {
                self_weight[a] += w;
            } else {
                adj[a].push((b, w));
                adj[b].push((a, w));
            }
            total_weight += w;
        }
        for list in &mut adj {
            list.sort_unstable_by_key(|&(u, _)| u);
        }

        let degree = (0..n)
            .map(|v| adj[v].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self_weight[v])
            .collect();

        LevelGraph {
            adj,
            self_weight,
            degree,
            node_size: vec![1; n],
            total_weight,
        }
    }
}

/// Gain of placing a vertex with degree `k_v` and size `size_v` into a
/// community currently holding total degree `comm_degree` and `comm_size`
/// observations, to which the vertex has `k_v_to` edge weight. The vertex's
/// own contribution has already been removed from the community aggregates.
#[inline]
fn move_gain(
    quality: QualityFunction,
    resolution: f64,
    two_m: f64,
    k_v: f64,
    size_v: usize,
    k_v_to: f64,
    comm_degree: f64,
    comm_size: usize,
) -> f64 {
    match quality {
        QualityFunction::RbConfiguration => k_v_to - resolution * k_v * comm_degree / two_m,
        QualityFunction::Cpm => k_v_to - resolution * size_v as f64 * comm_size as f64,
    }
}

/// One local-moving phase: sweep vertices in seeded random order, moving each
/// to the neighboring (or empty) community with the strictest gain, until a
/// full sweep makes no move. Returns whether anything moved at all.
fn local_move(
    g: &LevelGraph,
    comm_of: &mut [usize],
    rng: &mut ChaCha8Rng,
    config: &PartitionConfig,
) -> bool {
    let n = g.n();
    let two_m = 2.0 * g.total_weight;
    if two_m <= 0.0 {
        return false;
    }

    let mut comm_degree = vec![0.0f64; n];
    let mut comm_size = vec![0usize; n];
    let mut comm_members = vec![0usize; n];
    for v in 0..n {
        comm_degree[comm_of[v]] += g.degree[v];
        comm_size[comm_of[v]] += g.node_size[v];
        comm_members[comm_of[v]] += 1;
    }
    let mut empty_ids: Vec<usize> = (0..n).filter(|&c| comm_members[c] == 0).collect();

    let mut moved_any = false;
    let mut improved = true;
    while improved {
        improved = false;
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        for &v in &order {
            let current = comm_of[v];
            let k_v = g.degree[v];
            let size_v = g.node_size[v];

            let mut weights: HashMap<usize, f64> = HashMap::new();
            for &(u, w) in &g.adj[v] {
                *weights.entry(comm_of[u]).or_insert(0.0) += w;
            }

            comm_degree[current] -= k_v;
            comm_size[current] -= size_v;
            comm_members[current] -= 1;

            let k_v_current = weights.get(&current).copied().unwrap_or(0.0);
            let mut best_comm = current;
            let mut best_gain = move_gain(
                config.quality,
                config.resolution,
                two_m,
                k_v,
                size_v,
                k_v_current,
                comm_degree[current],
                comm_size[current],
            );

            // candidate order is fixed by community id so ties resolve the
            // same way on every run
            let mut candidates: Vec<(usize, f64)> = weights.into_iter().collect();
            candidates.sort_unstable_by_key(|&(c, _)| c);
            for &(c, k_v_c) in &candidates {
                if c == current {
                    continue;
                }
                let gain = move_gain(
                    config.quality,
                    config.resolution,
                    two_m,
                    k_v,
                    size_v,
                    k_v_c,
                    comm_degree[c],
                    comm_size[c],
                );
                if gain > best_gain + MIN_GAIN {
                    best_gain = gain;
                    best_comm = c;
                }
            }

            // splitting off into an empty community can also be the best move
            if let Some(&empty) = empty_ids.last() {
                if comm_members[current] > 0 {
                    let gain = move_gain(
                        config.quality,
                        config.resolution,
                        two_m,
                        k_v,
                        size_v,
                        0.0,
                        0.0,
                        0,
                    );
                    if gain > best_gain + MIN_GAIN {
                        best_gain = gain;
                        best_comm = empty;
                    }
                }
            }

            if best_comm != current {
                if empty_ids.last() == Some(&best_comm) {
                    empty_ids.pop();
                }
                if comm_members[current] == 0 {
                    empty_ids.push(current);
                }
                improved = true;
                moved_any = true;
            }

            comm_of[v] = best_comm;
            comm_degree[best_comm] += k_v;
            comm_size[best_comm] += size_v;
            comm_members[best_comm] += 1;
        }
    }

    moved_any
}

/// Split every community into its connected components (edges internal to
/// the community only). Returns the component id per vertex and the number
/// of components.
fn refine(g: &LevelGraph, comm_of: &[usize]) -> (Vec<usize>, usize) {
    let n = g.n();
    let mut refined = vec![usize::MAX; n];
    let mut next = 0usize;
    let mut stack = Vec::new();

    for start in 0..n {
        if refined[start] != usize::MAX {
            continue;
        }
        let community = comm_of[start];
        refined[start] = next;
        stack.push(start);
        while let Some(v) = stack.pop() {
            for &(u, _) in &g.adj[v] {
                if comm_of[u] == community && refined[u] == usize::MAX {
                    refined[u] = next;
                    stack.push(u);
                }
            }
        }
        next += 1;
    }

    (refined, next)
}

/// Contract refined communities into single vertices. Intra-community edges
/// become self-loops; inter-community weights are summed. Each coarse vertex
/// starts out in the community its members held before refinement, so the
/// next local-moving phase resumes from the current partition.
fn aggregate(
    g: &LevelGraph,
    refined: &[usize],
    n_refined: usize,
    comm_of: &[usize],
) -> (LevelGraph, Vec<usize>) {
    let n = g.n();

    let mut seeds = vec![0usize; n_refined];
    let mut node_size = vec![0usize; n_refined];
    let mut self_weight = vec![0.0f64; n_refined];
    for v in 0..n {
        let c = refined[v];
        seeds[c] = comm_of[v];
        node_size[c] += g.node_size[v];
        self_weight[c] += g.self_weight[v];
    }
    renumber(&mut seeds);

    let mut pair_weights: HashMap<(usize, usize), f64> = HashMap::new();
    for v in 0..n {
        for &(u, w) in &g.adj[v] {
            if u <= v {
                continue; // each undirected edge once
            }
            let (cu, cv) = (refined[v], refined[u]);
            if cu == cv {
                self_weight[cu] += w;
            } else {
                let key = if cu < cv { (cu, cv) } else { (cv, cu) };
                *pair_weights.entry(key).or_insert(0.0) += w;
            }
        }
    }

    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_refined];
    for (&(cu, cv), &w) in &pair_weights {
        adj[cu].push((cv, w));
        adj[cv].push((cu, w));
    }
    for list in &mut adj {
        list.sort_unstable_by_key(|&(u, _)| u);
    }

    let degree = (0..n_refined)
        .map(|v| adj[v].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self_weight[v])
        .collect();

    let coarse = LevelGraph {
        adj,
        self_weight,
        degree,
        node_size,
        total_weight: g.total_weight,
    };
    (coarse, seeds)
}

/// Relabel to contiguous ids starting at 0, in order of first appearance
fn renumber(labels: &mut [usize]) {
    let mut map: HashMap<usize, usize> = HashMap::new();
    for l in labels.iter_mut() {
        let next = map.len();
        *l = *map.entry(*l).or_insert(next);
    }
}
