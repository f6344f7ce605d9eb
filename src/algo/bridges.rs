/*!
# Bridges and Loop Edges

Classifies every edge of an undirected graph as either a **bridge** (its
removal disconnects its component) or a **loop edge** (it lies on a cycle).

[`LoopFinder`] runs Tarjan's bridge criterion over a rooted spanning forest in
three passes:
1. link all vertices into a forest (first-child / next-sibling pointers below
   a virtual super-root),
2. number the vertices in preorder, so every subtree covers a contiguous
   index interval,
3. compute for every subtree the range of indices reachable through a single
   edge that is not the tree edge to its parent. The parent edge is a bridge
   iff that range stays inside the subtree's own interval.

The graph is supplied as a neighbour callback. Parallel edges are treated as a
single edge and self-loops are ignored.

# Example
```
use puzgraphs::{algo::*, prelude::*};

// a triangle 0-1-2 with a pendant path 2-3-4
let mut graph = AdjArray::new(5);
graph.connect_cycle([0, 1, 2]);
graph.connect_path([2, 3, 4]);

let finder = graph.loop_finder();
assert!(finder.has_loop());
assert!(finder.is_loop_edge(0, 1));
assert_eq!(finder.is_bridge(2, 3), Some((3, 2)));
assert_eq!(graph.compute_bridges(), vec![Edge(2, 3), Edge(3, 4)]);
```
*/

use super::*;

/// Bridge queries implemented for all graphs
pub trait Bridges: AdjacencyList {
    /// Runs a [`LoopFinder`] on the graph and returns it for further queries
    fn loop_finder(&self) -> LoopFinder {
        let mut finder = LoopFinder::new(self.number_of_nodes());
        finder.run(|u| self.neighbors_of(u));
        finder
    }

    /// Returns all bridges as normalized edges in sorted order
    fn compute_bridges(&self) -> Vec<Edge> {
        self.loop_finder().bridges()
    }

    /// Returns *true* if the graph contains a cycle
    fn has_loop(&self) -> bool {
        self.loop_finder().has_loop()
    }
}

impl<G: AdjacencyList> Bridges for G {}

#[derive(Debug, Clone, Copy, Default)]
struct VertexRecord {
    parent: Node,
    child: Option<Node>,
    sibling: Option<Node>,
    component_root: Node,
    in_tree: bool,
    visited: bool,

    index: Node,
    min_index: Node,
    max_index: Node,
    min_reach: Node,
    max_reach: Node,

    // set on the child side of a bridge to its parent
    bridge: Option<Node>,
}

/// Reusable state of the bridge / loop finder for graphs with `nv` vertices.
///
/// Holds one record per vertex plus one for the virtual root of the forest.
/// All records are reinitialised at the start of each [`LoopFinder::run`].
#[derive(Debug, Clone)]
pub struct LoopFinder {
    nv: NumNodes,
    records: Vec<VertexRecord>,
    seen_from: Vec<Node>,
    num_edges: NumEdges,
    num_bridges: NumEdges,
}

impl LoopFinder {
    /// Creates the state for graphs with `nv` vertices
    pub fn new(nv: NumNodes) -> Self {
        Self::try_new(nv).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`LoopFinder::new`], but reports allocation failure
    pub fn try_new(nv: NumNodes) -> Result<Self> {
        assert!(nv < INVALID_NODE);
        Ok(Self {
            nv,
            records: Vec::try_filled(nv as usize + 1, VertexRecord::default())?,
            seen_from: Vec::try_filled(nv as usize, INVALID_NODE)?,
            num_edges: 0,
            num_bridges: 0,
        })
    }

    /// Number of vertices this state was created for
    pub fn number_of_nodes(&self) -> NumNodes {
        self.nv
    }

    #[inline]
    fn root(&self) -> Node {
        self.nv
    }

    #[inline]
    fn rec(&self, u: Node) -> &VertexRecord {
        &self.records[u as usize]
    }

    #[inline]
    fn rec_mut(&mut self, u: Node) -> &mut VertexRecord {
        &mut self.records[u as usize]
    }

    /// Next vertex of the forest walk after `u`'s subtree is complete
    #[inline]
    fn next_after(&self, u: Node) -> Node {
        self.rec(u).sibling.unwrap_or(self.rec(u).parent)
    }

    /// Classifies all edges of the graph given by `neighbors` and returns
    /// *true* iff the graph contains a cycle.
    ///
    /// `neighbors(u)` must enumerate every neighbour of `u` and yield the same
    /// sequence each time it is called for the same `u`.
    ///
    /// # Panics
    /// If a neighbour is `>= nv`.
    #[instrument(skip_all)]
    pub fn run<F, I>(&mut self, mut neighbors: F) -> bool
    where
        F: FnMut(Node) -> I,
        I: IntoIterator<Item = Node>,
    {
        let nv = self.nv;
        let root = self.root();

        for rec in self.records.iter_mut() {
            *rec = VertexRecord {
                parent: root,
                ..VertexRecord::default()
            };
        }
        self.seen_from.fill(INVALID_NODE);
        self.num_edges = 0;
        self.num_bridges = 0;

        if nv == 0 {
            return false;
        }

        self.build_forest(&mut neighbors);
        self.assign_indices();
        self.find_bridges(&mut neighbors);

        debug!(
            nv,
            edges = self.num_edges,
            bridges = self.num_bridges,
            "classified bridges"
        );
        self.has_loop()
    }

    fn build_forest<F, I>(&mut self, neighbors: &mut F)
    where
        F: FnMut(Node) -> I,
        I: IntoIterator<Item = Node>,
    {
        let root = self.root();
        self.rec_mut(root).in_tree = true;
        self.rec_mut(root).visited = true;

        for v in 0..self.nv {
            if self.rec(v).in_tree {
                continue;
            }

            let first_root_child = self.rec(root).child;
            let rec = self.rec_mut(v);
            rec.in_tree = true;
            rec.sibling = first_root_child;
            rec.component_root = v;
            self.rec_mut(root).child = Some(v);
            trace!(v, "new component");

            let mut u = v;
            loop {
                if !self.rec(u).visited {
                    self.rec_mut(u).visited = true;

                    for w in neighbors(u) {
                        assert!(w < self.nv, "Neighbour {w} of {u} out of range");

                        if !self.rec(w).in_tree {
                            let (first_child, component_root) =
                                (self.rec(u).child, self.rec(u).component_root);
                            *self.rec_mut(w) = VertexRecord {
                                parent: u,
                                sibling: first_child,
                                component_root,
                                in_tree: true,
                                ..VertexRecord::default()
                            };
                            self.rec_mut(u).child = Some(w);
                        }

                        // parallel edges are counted once
                        if self.seen_from[w as usize] != u {
                            self.seen_from[w as usize] = u;
                            if w > u {
                                self.num_edges += 1;
                            }
                        }
                    }

                    if let Some(child) = self.rec(u).child {
                        u = child;
                        continue;
                    }
                }

                if u == v {
                    break;
                }
                u = self.next_after(u);
            }
        }
    }

    fn assign_indices(&mut self) {
        let root = self.root();
        for rec in &mut self.records[..self.nv as usize] {
            rec.visited = false;
        }

        let mut index = 0;
        let Some(mut u) = self.rec(root).child else {
            return;
        };

        loop {
            if !self.rec(u).visited {
                let rec = self.rec_mut(u);
                rec.visited = true;
                rec.index = index;
                rec.min_index = index;
                index += 1;

                if let Some(child) = rec.child {
                    u = child;
                    continue;
                }
            }

            if u == root {
                break;
            }

            self.rec_mut(u).max_index = index - 1;
            u = self.next_after(u);
        }
    }

    fn find_bridges<F, I>(&mut self, neighbors: &mut F)
    where
        F: FnMut(Node) -> I,
        I: IntoIterator<Item = Node>,
    {
        let root = self.root();
        for rec in &mut self.records[..self.nv as usize] {
            rec.visited = false;
        }

        let Some(mut u) = self.rec(root).child else {
            return;
        };

        loop {
            if !self.rec(u).visited {
                self.rec_mut(u).visited = true;

                let parent = self.rec(u).parent;
                let (mut min_reach, mut max_reach) = (self.rec(u).min_index, self.rec(u).min_index);
                for w in neighbors(u) {
                    if w != parent {
                        let i = self.rec(w).index;
                        min_reach = min_reach.min(i);
                        max_reach = max_reach.max(i);
                    }
                }

                let rec = self.rec_mut(u);
                rec.min_reach = min_reach;
                rec.max_reach = max_reach;

                if let Some(child) = rec.child {
                    u = child;
                    continue;
                }
            }

            if u == root {
                break;
            }

            let mut child = self.rec(u).child;
            while let Some(c) = child {
                let (c_min, c_max) = (self.rec(c).min_reach, self.rec(c).max_reach);
                let rec = self.rec_mut(u);
                rec.min_reach = rec.min_reach.min(c_min);
                rec.max_reach = rec.max_reach.max(c_max);
                child = self.rec(c).sibling;
            }

            let rec = self.rec(u);
            let parent = rec.parent;
            if parent != root && rec.min_reach >= rec.min_index && rec.max_reach <= rec.max_index {
                self.rec_mut(u).bridge = Some(parent);
                self.num_bridges += 1;
                trace!(u, parent, "found bridge");
            }

            u = self.next_after(u);
        }
    }

    /// Returns *true* if the last run found a cycle, i.e. fewer bridges than edges
    pub fn has_loop(&self) -> bool {
        self.num_bridges < self.num_edges
    }

    /// Number of distinct non-loop edges seen by the last run
    pub fn number_of_edges(&self) -> NumEdges {
        self.num_edges
    }

    /// Number of bridges found by the last run
    pub fn number_of_bridges(&self) -> NumEdges {
        self.num_bridges
    }

    /// Returns *true* if the edge `{u, v}` lies on a cycle.
    ///
    /// Only meaningful for edges of the graph; the result for non-edges is unspecified.
    pub fn is_loop_edge(&self, u: Node, v: Node) -> bool {
        !(self.rec(u).bridge == Some(v) || self.rec(v).bridge == Some(u))
    }

    fn is_bridge_oneway(&self, u: Node, v: Node) -> Option<(NumNodes, NumNodes)> {
        if self.rec(u).bridge != Some(v) {
            return None;
        }

        let root = self.rec(self.rec(u).component_root);
        let total = root.max_index - root.min_index + 1;
        let below = self.rec(u).max_index - self.rec(u).min_index + 1;

        Some((below, total - below))
    }

    /// If `{u, v}` is a bridge, returns the number of vertices that stay
    /// connected to `u` and to `v` respectively once the edge is removed.
    pub fn is_bridge(&self, u: Node, v: Node) -> Option<(NumNodes, NumNodes)> {
        self.is_bridge_oneway(u, v)
            .or_else(|| self.is_bridge_oneway(v, u).map(|(nv, nu)| (nu, nv)))
    }

    /// Returns all bridges of the last run as normalized edges in sorted order
    pub fn bridges(&self) -> Vec<Edge> {
        let mut bridges = (0..self.nv)
            .filter_map(|u| self.rec(u).bridge.map(|p| Edge(u, p).normalized()))
            .collect_vec();
        bridges.sort_unstable();
        bridges
    }

    /// Number of vertices in the connected component of `u`
    pub fn component_size(&self, u: Node) -> NumNodes {
        let root = self.rec(self.rec(u).component_root);
        root.max_index - root.min_index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn triangle_with_pendant_path() {
        let graph = AdjArray::from_edges(5, [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
        let mut finder = LoopFinder::new(5);

        for _ in 0..2 {
            assert!(finder.run(|u| graph.neighbors_of(u)));

            for (u, v) in [(0, 1), (1, 2), (2, 0)] {
                assert!(finder.is_loop_edge(u, v));
                assert!(finder.is_loop_edge(v, u));
                assert_eq!(finder.is_bridge(u, v), None);
            }

            assert!(!finder.is_loop_edge(2, 3));
            assert_eq!(finder.is_bridge(2, 3), Some((3, 2)));
            assert_eq!(finder.is_bridge(3, 2), Some((2, 3)));

            assert!(!finder.is_loop_edge(4, 3));
            assert_eq!(finder.is_bridge(4, 3), Some((1, 4)));
            assert_eq!(finder.is_bridge(3, 4), Some((4, 1)));

            assert_eq!(finder.bridges(), vec![Edge(2, 3), Edge(3, 4)]);
        }
    }

    #[test]
    fn cycles_and_trees() {
        for n in [3, 4, 10] {
            let mut cycle = AdjArray::new(n);
            cycle.connect_cycle(0..n);
            let finder = cycle.loop_finder();
            assert!(finder.has_loop());
            assert!(finder.bridges().is_empty());
            for Edge(u, v) in cycle.edges(true) {
                assert!(finder.is_loop_edge(u, v));
            }

            let mut path = AdjArray::new(n);
            path.connect_path(0..n);
            let finder = path.loop_finder();
            assert!(!finder.has_loop());
            assert_eq!(finder.bridges(), path.ordered_edges(true));
            for u in 0..n - 1 {
                assert_eq!(finder.is_bridge(u, u + 1), Some((u + 1, n - u - 1)));
            }
        }
    }

    #[test]
    fn empty_and_isolated() {
        let mut finder = LoopFinder::new(0);
        assert!(!finder.run(|_| std::iter::empty()));

        let graph = AdjArray::new(4);
        assert!(!graph.has_loop());
        assert!(graph.compute_bridges().is_empty());
    }

    #[test]
    fn parallel_edges_and_self_loops() {
        // doubled edge 0-1, self-loop at 2, edge 1-2
        let adj: Vec<Vec<Node>> = vec![vec![1, 1], vec![0, 0, 2], vec![2, 1]];
        let finder = adj.loop_finder();

        assert!(!finder.has_loop());
        assert_eq!(finder.number_of_edges(), 2);
        assert_eq!(finder.bridges(), vec![Edge(0, 1), Edge(1, 2)]);
        assert_eq!(finder.is_bridge(0, 1), Some((1, 2)));
    }

    #[test]
    fn matches_naive_on_random_graphs() {
        let rng = &mut Pcg64Mcg::seed_from_u64(123);

        for _ in 0..100 {
            let n = rng.random_range(1..25);
            let m = rng.random_range(0..2 * n);
            let mut graph = AdjArray::new(n);
            for _ in 0..m {
                let (u, v) = (rng.random_range(0..n), rng.random_range(0..n));
                if u != v {
                    graph.try_add_edge(u, v);
                }
            }

            let finder = graph.loop_finder();
            let edges = graph.ordered_edges(true);
            let mut full = Dsf::new(n);
            for &Edge(u, v) in &edges {
                full.union(u, v);
            }

            let mut num_bridges = 0;
            for &Edge(u, v) in &edges {
                let mut without = Dsf::new(n);
                for &Edge(a, b) in edges.iter().filter(|e| **e != Edge(u, v)) {
                    without.union(a, b);
                }

                let is_bridge = !without.equivalent(u, v);
                assert_eq!(finder.is_loop_edge(u, v), !is_bridge);

                if is_bridge {
                    num_bridges += 1;
                    let (nu, nv) = finder.is_bridge(u, v).unwrap();
                    assert_eq!(nu, without.size(u));
                    assert_eq!(nv, without.size(v));
                    assert_eq!(nu + nv, full.size(u));
                    assert_eq!(finder.component_size(u), full.size(u));
                } else {
                    assert_eq!(finder.is_bridge(u, v), None);
                }
            }

            assert_eq!(finder.bridges().len(), num_bridges);
            assert_eq!(finder.has_loop(), num_bridges < edges.len());
        }
    }
}
