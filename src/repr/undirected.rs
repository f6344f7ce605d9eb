use super::*;
use crate::testing::test_graph_ops;

/// An undirected graph stored as one neighbor array per node.
///
/// Every edge `{u, v}` appears in the arrays of both endpoints; a self-loop
/// `{u, u}` is stored once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjArray {
    nbs: Vec<Vec<Node>>,
    num_edges: NumEdges,
}

impl GraphNodeOrder for AdjArray {
    fn number_of_nodes(&self) -> NumNodes {
        self.nbs.len() as NumNodes
    }
}

impl GraphEdgeOrder for AdjArray {
    fn number_of_edges(&self) -> NumEdges {
        self.num_edges
    }
}

impl AdjacencyList for AdjArray {
    fn neighbors_of(&self, u: Node) -> impl Iterator<Item = Node> + '_ {
        self.nbs[u as usize].iter().copied()
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self.nbs[u as usize].len() as NumNodes
    }
}

impl AdjacencyTest for AdjArray {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        self.nbs[u as usize].contains(&v)
    }
}

impl GraphNew for AdjArray {
    fn new(n: NumNodes) -> Self {
        Self {
            nbs: vec![Vec::new(); n as usize],
            num_edges: 0,
        }
    }
}

impl GraphEdgeEditing for AdjArray {
    fn try_add_edge(&mut self, u: Node, v: Node) -> bool {
        assert!(v < self.number_of_nodes());
        if self.has_edge(u, v) {
            return true;
        }

        self.nbs[u as usize].push(v);
        if u != v {
            self.nbs[v as usize].push(u);
        }
        self.num_edges += 1;
        false
    }
}

impl From<AdjArray> for Vec<Vec<Node>> {
    fn from(graph: AdjArray) -> Self {
        graph.nbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substructures() {
        let mut graph = AdjArray::new(6);
        graph.connect_path([0, 1, 2]);
        graph.connect_cycle([3, 4, 5]);

        assert_eq!(graph.number_of_edges(), 5);
        assert!(graph.has_edge(5, 3));
        assert!(!graph.has_edge(2, 0));
        assert!(graph.try_add_edge(1, 0));
        assert_eq!(graph.number_of_edges(), 5);
    }

    #[test]
    fn self_loops_are_stored_once() {
        let graph = AdjArray::from_edges(3, [Edge(0, 0), Edge(0, 1)]);
        assert_eq!(graph.degree_of(0), 2);
        assert_eq!(graph.number_of_edges(), 2);
        assert_eq!(graph.ordered_edges(true), vec![Edge(0, 0), Edge(0, 1)]);

        let lists: Vec<Vec<Node>> = graph.into();
        assert_eq!(lists, vec![vec![0, 1], vec![0], vec![]]);
    }
}

test_graph_ops!(test_adj_array, AdjArray, true, (GraphNew, AdjacencyList));
