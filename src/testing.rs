#[cfg(test)]
use rand::Rng;

#[cfg(test)]
use crate::{prelude::*, utils::Dsf};

/// Every graph should implement `GraphNodeOrder` and `GraphEdgeOrder`
macro_rules! test_graph_ops {
    ($env:ident, $graph:ident, $undirected:literal, ($($trait:ident),*)) => {
        #[cfg(test)]
        mod $env {
            use crate::{prelude::*, testing::test_graph_ops};
            use rand::{Rng, SeedableRng};
            use rand_pcg::Pcg64Mcg;
            use stream_bitset::prelude::*;
            use itertools::Itertools;

            /// Creates a list of at most `m_ub` random edges for nodes `0..n`
            fn random_edges<R: Rng>(rng: &mut R, n: NumNodes, m_ub: NumEdges) -> Vec<Edge> {
                let mut edges: Vec<Edge> = (0..m_ub).map(|_| {
                    let u = rng.random_range(0..n);
                    let v = rng.random_range(0..n);

                    if $undirected {
                        Edge(u, v).normalized()
                    } else {
                        Edge(u, v)
                    }
                }).collect_vec();
                edges.sort_unstable();
                edges.dedup();

                edges
            }

            $(
                test_graph_ops!($graph<$undirected>: $trait);
            )*
        }
    };
    ($graph:ident<$undirected:literal>: GraphNew) => {
        #[test]
        fn graph_new() {
            for n in 1..50 {
                let graph = <$graph>::new(n);

                assert_eq!(graph.number_of_edges(), 0);
                assert_eq!(graph.number_of_nodes(), n);

                assert_eq!(graph.vertices_range().len(), n as usize);
                assert_eq!(graph.vertices().collect_vec(), (0..n).collect_vec());
            }
        }
    };
    ($graph:ident<$undirected:literal>: AdjacencyList) => {
        #[test]
        fn test_adjacency_list() {
            let rng = &mut Pcg64Mcg::seed_from_u64(3);

            for n in [10 as NumNodes, 20, 50] {
                for m_ub in [n * 2, n * 5, n * 10] {
                    for _ in 0..10 {
                        let edges = random_edges(rng, n, m_ub as NumEdges);

                        let mut adj_matrix: Vec<NodeBitSet> = vec![NodeBitSet::new(n); n as usize];
                        for &Edge(u, v) in &edges {
                            adj_matrix[u as usize].set_bit(v);
                            if $undirected {
                                adj_matrix[v as usize].set_bit(u);
                            }
                        }

                        let graph = <$graph>::from_edges(n, edges.iter().copied());
                        let m = edges.len() as NumEdges;

                        assert_eq!(graph.number_of_nodes(), n);
                        assert_eq!(graph.number_of_edges(), m);
                        assert_eq!(edges, graph.ordered_edges($undirected));

                        for u in 0..n {
                            assert_eq!(graph.neighbors_of_as_bitset(u), adj_matrix[u as usize]);
                            assert_eq!(graph.degree_of(u), adj_matrix[u as usize].cardinality());
                        }
                    }
                }
            }
        }
    };
}

pub(crate) use test_graph_ops;

#[cfg(test)]
/// Random bipartite adjacency lists with `nl <= max_nl` left and `nr <= max_nr`
/// right vertices, each pair connected with probability `p`.
/// Returns `nr` and the adjacency of the left side.
pub(crate) fn random_bipartite_adjacency<R: Rng>(
    rng: &mut R,
    max_nl: NumNodes,
    max_nr: NumNodes,
    p: f64,
) -> (NumNodes, Vec<Vec<Node>>) {
    let nl = rng.random_range(0..=max_nl);
    let nr = rng.random_range(0..=max_nr);

    let adj = (0..nl)
        .map(|_| (0..nr).filter(|_| rng.random_bool(p)).collect())
        .collect();

    (nr, adj)
}

#[cfg(test)]
/// Asserts that `dsf` partitions a `width x height` grid into 4-connected
/// `k`-ominoes without holes.
pub(crate) fn assert_valid_partition(width: u32, height: u32, k: u32, dsf: &mut Dsf) {
    let grid = GridGraph::new(width, height);
    let n = grid.number_of_nodes();
    assert_eq!(dsf.len(), n as usize);

    let classes = dsf.classes();
    assert_eq!(classes.len() as u32, n / k);

    for class in classes {
        assert_eq!(class.len() as u32, k);

        let mut inside = grid.vertex_bitset_unset();
        for &u in &class {
            inside.set_bit(u);
        }

        // connected
        let mut reached = grid.vertex_bitset_unset();
        let mut stack = vec![class[0]];
        reached.set_bit(class[0]);
        while let Some(u) = stack.pop() {
            for v in grid.neighbors_of(u) {
                if inside.get_bit(v) && !reached.set_bit(v) {
                    stack.push(v);
                }
            }
        }
        assert_eq!(reached, inside, "omino {class:?} is not connected");

        // every outside cell reaches the border without crossing the omino
        let mut outside = grid.vertex_bitset_unset();
        let mut stack = Vec::new();
        for u in grid.vertices() {
            let (x, y) = grid.coords(u);
            let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            if on_border && !inside.get_bit(u) && !outside.set_bit(u) {
                stack.push(u);
            }
        }
        while let Some(u) = stack.pop() {
            for v in grid.neighbors_of(u) {
                if !inside.get_bit(v) && !outside.set_bit(v) {
                    stack.push(v);
                }
            }
        }
        for u in grid.vertices() {
            assert!(
                inside.get_bit(u) || outside.get_bit(u),
                "omino {class:?} encloses cell {u}"
            );
        }
    }
}
