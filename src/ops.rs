use std::ops::Range;

use itertools::Itertools;

use crate::{edge::*, node::*};

/// Provides getters pertaining to the node-size of a graph
pub trait GraphNodeOrder {
    /// Returns the number of nodes of the graph
    fn number_of_nodes(&self) -> NumNodes;

    /// Return the number of nodes as usize
    fn len(&self) -> usize {
        self.number_of_nodes() as usize
    }

    /// Returns a range over V.
    /// In contrast to iterators borrowing the graph, the range may be used where a
    /// mutable reference to the graph is needed at the same time.
    fn vertices_range(&self) -> Range<Node> {
        0..self.number_of_nodes()
    }

    /// Returns an iterator over V.
    fn vertices(&self) -> impl Iterator<Item = Node> + '_ {
        self.vertices_range()
    }

    /// Returns empty bitset with one entry per node
    fn vertex_bitset_unset(&self) -> NodeBitSet {
        NodeBitSet::new(self.number_of_nodes())
    }

    /// Returns *true* if the graph has no nodes (and thus no edges)
    fn is_empty(&self) -> bool {
        self.number_of_nodes() == 0
    }
}

/// Provides getters pertaining to the edge-size of a graph
pub trait GraphEdgeOrder {
    /// Returns the number of edges of the graph
    fn number_of_edges(&self) -> NumEdges;

    /// Returns *true* if the graph has no edges
    fn is_singleton(&self) -> bool {
        self.number_of_edges() == 0
    }
}

/// Traits pertaining getters for neighborhoods & edges
pub trait AdjacencyList: GraphNodeOrder + Sized {
    /// Returns an iterator over the (open) neighborhood of a given vertex.
    /// ** Panics if `u >= n` **
    fn neighbors_of(&self, u: Node) -> impl Iterator<Item = Node> + '_;

    /// Returns the number of neighbors of `u`
    /// ** Panics if `u >= n` **
    fn degree_of(&self, u: Node) -> NumNodes;

    /// Returns an iterator over the degrees of all vertices
    fn degrees(&self) -> impl Iterator<Item = NumNodes> + '_ {
        self.vertices_range().map(|u| self.degree_of(u))
    }

    /// Returns the maximum degree in the graph
    fn max_degree(&self) -> NumNodes {
        self.degrees().max().unwrap_or(0)
    }

    /// Returns the neighborhood of `u` as a bitset
    /// ** Panics if `u >= n` **
    fn neighbors_of_as_bitset(&self, u: Node) -> NodeBitSet {
        NodeBitSet::new_with_bits_set(self.number_of_nodes(), self.neighbors_of(u))
    }

    /// Returns an iterator over outgoing edges of a given vertex.
    /// If `only_normalized`, then only edges `(u, v)` with `u <= v` are considered.
    /// ** Panics if `u >= n` **
    fn edges_of(&self, u: Node, only_normalized: bool) -> impl Iterator<Item = Edge> + '_ {
        self.neighbors_of(u)
            .map(move |v| Edge(u, v))
            .filter(move |e| !only_normalized || e.is_normalized())
    }

    /// Returns an iterator over all edges in the graph.
    /// If `only_normalized`, then only edges `(u, v)` with `u <= v` are considered.
    fn edges(&self, only_normalized: bool) -> impl Iterator<Item = Edge> + '_ {
        self.vertices_range()
            .flat_map(move |u| self.edges_of(u, only_normalized))
    }

    /// Returns all edges in sorted order, each one exactly once.
    /// If `only_normalized`, then only edges `(u, v)` with `u <= v` are considered.
    fn ordered_edges(&self, only_normalized: bool) -> Vec<Edge> {
        self.edges(only_normalized).sorted_unstable().dedup().collect_vec()
    }
}

/// Trait to test existence of edges in a graph.
pub trait AdjacencyTest: GraphNodeOrder {
    /// Returns *true* if the egde (u,v) exists in the graph.
    /// ** Panics if `u >= n || v >= n` **
    fn has_edge(&self, u: Node, v: Node) -> bool;
}

/// Trait for creating a new empty graph
pub trait GraphNew {
    /// Creates an empty graph with n singleton nodes
    fn new(n: NumNodes) -> Self;
}

/// Provides functions to insert edges
pub trait GraphEdgeEditing: GraphNew {
    /// Adds the edge *(u,v)* to the graph.
    /// ** Panics if `u >= n || v >= n` or the edge was already present **
    fn add_edge(&mut self, u: Node, v: Node) {
        assert!(!self.try_add_edge(u, v))
    }

    /// Adds the edge `(u, v)` to the graph.
    /// Returns *true* exactly if the edge was present previously.
    /// ** Panics if `u >= n || v >= n` **
    fn try_add_edge(&mut self, u: Node, v: Node) -> bool;

    /// Adds all edges in the collection
    fn add_edges(&mut self, edges: impl IntoIterator<Item = impl Into<Edge>>) {
        for Edge(u, v) in edges.into_iter().map(|d| d.into()) {
            self.add_edge(u, v);
        }
    }

    /// Connects the given nodes in order with a simple path.
    ///
    /// ```
    /// use puzgraphs::prelude::*;
    ///
    /// let mut g = AdjArray::new(4);
    /// g.connect_path([0, 1, 2, 3]);
    /// assert!(g.has_edge(2, 3));
    /// assert!(!g.has_edge(3, 0));
    /// ```
    fn connect_path<P>(&mut self, nodes_on_path: P)
    where
        P: IntoIterator<Item = Node>,
    {
        for (u, v) in nodes_on_path.into_iter().tuple_windows() {
            self.add_edge(u, v);
        }
    }

    /// Connects the given nodes with a cycle, i.e. a path closed by an edge
    /// from the last node back to the first.
    fn connect_cycle<C>(&mut self, nodes_in_cycle: C)
    where
        C: IntoIterator<Item = Node>,
    {
        let mut iter = nodes_in_cycle.into_iter();

        if let Some(first) = iter.next() {
            let mut prev = first;
            for cur in iter {
                self.add_edge(prev, cur);
                prev = cur;
            }

            self.add_edge(prev, first);
        }
    }
}

/// A super trait for creating a graph from scratch from a set of edges and a number of nodes
pub trait GraphFromScratch {
    /// Create a graph from a number of nodes and an iterator over Edges
    fn from_edges(n: NumNodes, edges: impl IntoIterator<Item = impl Into<Edge>>) -> Self;
}

impl<G: GraphEdgeEditing> GraphFromScratch for G {
    fn from_edges(n: NumNodes, edges: impl IntoIterator<Item = impl Into<Edge>>) -> Self {
        let mut graph = Self::new(n);
        graph.add_edges(edges);
        graph
    }
}

// Plain adjacency lists, as produced by puzzle code building auxiliary graphs on the fly.
// Parallel edges and self-loops are kept as given.

impl GraphNodeOrder for Vec<Vec<Node>> {
    fn number_of_nodes(&self) -> NumNodes {
        self.as_slice().len() as NumNodes
    }
}

impl AdjacencyList for Vec<Vec<Node>> {
    fn neighbors_of(&self, u: Node) -> impl Iterator<Item = Node> + '_ {
        self[u as usize].iter().copied()
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self[u as usize].len() as NumNodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_bitset::prelude::*;

    #[test]
    fn nested_vec_is_adjacency_list() {
        let adj: Vec<Vec<Node>> = vec![vec![1, 2], vec![0], vec![0, 2], vec![]];

        assert_eq!(adj.number_of_nodes(), 4);
        assert_eq!(adj.vertices().collect_vec(), vec![0, 1, 2, 3]);
        assert_eq!(adj.degrees().collect_vec(), vec![2, 1, 2, 0]);
        assert_eq!(adj.max_degree(), 2);
        assert_eq!(
            adj.ordered_edges(true),
            vec![Edge(0, 1), Edge(0, 2), Edge(2, 2)]
        );
        assert_eq!(adj.neighbors_of_as_bitset(0).cardinality(), 2);
    }
}
