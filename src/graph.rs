use crate::fuzzy::FuzzyGraph;
use petgraph::graph::{Graph, NodeIndex, UnGraph};
use petgraph::{Directed, EdgeType, Undirected};

/// Materialize a fuzzy connectivity graph as an explicit `petgraph` graph.
///
/// One vertex is created per observation index `0..n`, whether or not it has
/// any nonzero edge, so vertex ids map 1:1 back to observations. Undirected
/// graphs get one edge per stored pair; directed graphs get both arcs with
/// the same weight.
///
/// A resulting vertex count other than `n` would break the observation
/// mapping; it is reported as a warning rather than a failure since it only
/// degrades clustering quality, not the shape of the output.
pub fn to_graph<Ty: EdgeType>(fuzzy: &FuzzyGraph) -> Graph<(), f64, Ty> {
    let n = fuzzy.n_vertices();
    let n_edges = fuzzy.n_edges();
    let mut graph = Graph::<(), f64, Ty>::with_capacity(
        n,
        if Ty::is_directed() { 2 * n_edges } else { n_edges },
    );

    for _ in 0..n {
        graph.add_node(());
    }

    for &(i, j, w) in fuzzy.edges() {
        let (a, b) = (NodeIndex::new(i as usize), NodeIndex::new(j as usize));
        graph.add_edge(a, b, w);
        if Ty::is_directed() {
            graph.add_edge(b, a, w);
        }
    }

    if graph.node_count() != n {
        log::warn!(
            "constructed graph has {} vertices but the input had {} observations; \
             cluster ids may not map back cleanly",
            graph.node_count(),
            n
        );
    }

    graph
}

/// Undirected adapter, the default used by the pipeline
pub fn to_undirected_graph(fuzzy: &FuzzyGraph) -> UnGraph<(), f64> {
    to_graph::<Undirected>(fuzzy)
}

/// Directed adapter; both arcs of each pair carry the same weight
pub fn to_directed_graph(fuzzy: &FuzzyGraph) -> Graph<(), f64, Directed> {
    to_graph::<Directed>(fuzzy)
}
