/*!
# Maximum Flow and Minimum Cut

Integer maximum flows on directed capacitated networks with the
Edmonds-Karp algorithm (shortest augmenting paths found by BFS).

A network is given as an edge list sorted lexicographically by `(tail, head)`
together with a capacity per edge, where [`Capacity::Unlimited`] marks edges
without a bound. The residual graph is never materialised: a forward residual
edge exists on `e = (u, v)` while `flow[e] < cap[e]`, a backward residual edge
`v -> u` while `flow[e] > 0`. To enumerate edges *into* a vertex, the
algorithm needs a permutation of the edge list sorted by `(head, tail)`,
computed by [`setup_backedges`].

At termination the vertices reachable from the source in the residual graph
form the source side of a minimum cut.

# Example
```
use puzgraphs::{algo::*, prelude::*};

// two parallel routes of capacity 2 and 3 from 0 to 3
let edges = [Edge(0, 1), Edge(0, 2), Edge(1, 3), Edge(2, 3)];
let caps = [
    Capacity::Finite(2),
    Capacity::Unlimited,
    Capacity::Unlimited,
    Capacity::Finite(3),
];

let result = max_flow(4, 0, 3, &edges, &caps).unwrap();
assert_eq!(result.value, 5);
assert_eq!(result.flow, vec![2, 3, 2, 3]);
assert!(result.sink_side.get_bit(3));
assert!(!result.sink_side.get_bit(2));
```
*/

use std::collections::VecDeque;

use super::*;

/// Amount of flow on an edge
pub type Flow = u64;

/// Capacity of a network edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capacity {
    /// The edge carries at most the given amount.
    /// The maximum flow must fit into [`Flow`]; [`EdmondsKarp::run`] panics otherwise.
    Finite(Flow),
    /// The edge carries arbitrary amounts
    Unlimited,
}

impl Capacity {
    /// Remaining capacity given the current `flow`; `None` if unlimited
    #[inline]
    pub fn residual(&self, flow: Flow) -> Option<Flow> {
        match *self {
            Capacity::Finite(cap) => Some(cap.saturating_sub(flow)),
            Capacity::Unlimited => None,
        }
    }

    /// Returns *true* if the edge can carry more than `flow`
    #[inline]
    pub fn admits_more(&self, flow: Flow) -> bool {
        self.residual(flow) != Some(0)
    }
}

impl From<Flow> for Capacity {
    fn from(cap: Flow) -> Self {
        Capacity::Finite(cap)
    }
}

/// How the BFS reached a vertex in the residual graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResidualStep {
    /// Along edge `e` from its tail
    Forward(usize),
    /// Against edge `e` from its head
    Backward(usize),
}

impl ResidualStep {
    /// Vertex the step starts at
    #[inline]
    fn origin(self, edges: &[Edge]) -> Node {
        match self {
            ResidualStep::Forward(e) => edges[e].tail(),
            ResidualStep::Backward(e) => edges[e].head(),
        }
    }

    /// Amount that can be pushed along the step; `None` if unbounded
    #[inline]
    fn spare(self, caps: &[Capacity], flow: &[Flow]) -> Option<Flow> {
        match self {
            ResidualStep::Forward(e) => caps[e].residual(flow[e]),
            ResidualStep::Backward(e) => Some(flow[e]),
        }
    }
}

/// Computes the permutation of `edges` that sorts them by `(head, tail)`.
///
/// ```
/// use puzgraphs::{algo::setup_backedges, prelude::*};
///
/// let edges = [Edge(0, 1), Edge(0, 2), Edge(1, 2), Edge(2, 0)];
/// assert_eq!(setup_backedges(&edges), vec![3, 0, 1, 2]);
/// ```
pub fn setup_backedges(edges: &[Edge]) -> Vec<usize> {
    let mut backedges = vec![0; edges.len()];
    fill_backedges(edges, &mut backedges);
    backedges
}

/// Like [`setup_backedges`], but writes into a caller-provided buffer
pub fn fill_backedges(edges: &[Edge], backedges: &mut [usize]) {
    assert_eq!(edges.len(), backedges.len());
    for (i, b) in backedges.iter_mut().enumerate() {
        *b = i;
    }
    backedges.sort_unstable_by_key(|&e| edges[e].reverse());
}

/// Edmonds-Karp max-flow solver for networks with `nv` vertices.
///
/// Owns the BFS queue, the predecessor array and the per-vertex edge offsets,
/// so it can be reused for any number of networks of the same order.
#[derive(Debug, Clone)]
pub struct EdmondsKarp {
    nv: NumNodes,
    todo: VecDeque<Node>,
    prev: Vec<Option<ResidualStep>>,
    first_edge: Vec<usize>,
    first_backedge: Vec<usize>,
    source: Node,
}

impl EdmondsKarp {
    /// Creates a solver for networks with `nv` vertices
    pub fn new(nv: NumNodes) -> Self {
        Self::try_new(nv).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`EdmondsKarp::new`], but reports allocation failure
    pub fn try_new(nv: NumNodes) -> Result<Self> {
        let n = nv as usize;
        let mut todo = VecDeque::new();
        todo.try_reserve_exact(n)?;

        Ok(Self {
            nv,
            todo,
            prev: Vec::try_filled(n, None)?,
            first_edge: Vec::try_filled(n, 0)?,
            first_backedge: Vec::try_filled(n, 0)?,
            source: 0,
        })
    }

    /// Upper bound in bytes on the scratch space held by a solver for `nv` vertices
    pub fn scratch_size(nv: NumNodes) -> usize {
        size_of::<Self>()
            + nv as usize
                * (size_of::<Node>() + size_of::<Option<ResidualStep>>() + 2 * size_of::<usize>())
    }

    /// Number of vertices this solver was created for
    pub fn number_of_nodes(&self) -> NumNodes {
        self.nv
    }

    /// Computes a maximum flow from `source` to `sink` and returns its value.
    ///
    /// `edges` must be sorted by `(tail, head)` and `backedges` must be the
    /// permutation returned by [`setup_backedges`]. On return `flow[e]` holds
    /// the flow on edge `e`.
    ///
    /// # Panics
    /// If `source == sink`, an index is out of range, the slice lengths
    /// disagree, or some augmenting path consists of unlimited edges only.
    #[instrument(skip_all)]
    pub fn run(
        &mut self,
        source: Node,
        sink: Node,
        edges: &[Edge],
        backedges: &[usize],
        caps: &[Capacity],
        flow: &mut [Flow],
    ) -> Flow {
        let ne = edges.len();
        assert!(source < self.nv && sink < self.nv);
        assert_ne!(source, sink, "Source and sink must differ");
        assert_eq!(backedges.len(), ne);
        assert_eq!(caps.len(), ne);
        assert_eq!(flow.len(), ne);
        debug_assert!(edges.is_sorted(), "Edge list must be sorted");

        self.source = source;
        self.compute_offsets(edges, backedges);
        flow.fill(0);

        let mut total: Flow = 0;
        let mut augmentations = 0usize;

        while self.search_augmenting_path(source, sink, edges, backedges, caps, flow) {
            let amount = self.bottleneck(source, sink, edges, caps, flow);

            let mut to = sink;
            while to != source {
                let step = self.prev[to as usize].expect("vertex on path has a predecessor");
                match step {
                    ResidualStep::Forward(e) => {
                        flow[e] = flow[e]
                            .checked_add(amount)
                            .expect("Flow on an edge exceeds the range of Flow")
                    }
                    ResidualStep::Backward(e) => flow[e] -= amount,
                }
                to = step.origin(edges);
            }

            total = total
                .checked_add(amount)
                .expect("Total flow exceeds the range of Flow");
            augmentations += 1;
            trace!(amount, total, "augmented flow");
        }

        debug!(nv = self.nv, ne, augmentations, total, "computed maximum flow");
        total
    }

    /// Returns the sink side of the minimum cut found by the last [`EdmondsKarp::run`]:
    /// all vertices not reachable from the source in the final residual graph.
    pub fn sink_side(&self) -> NodeBitSet {
        NodeBitSet::new_with_bits_set(
            self.nv,
            (0..self.nv).filter(|&v| v != self.source && self.prev[v as usize].is_none()),
        )
    }

    fn compute_offsets(&mut self, edges: &[Edge], backedges: &[usize]) {
        let ne = edges.len();

        let mut j = 0;
        for (i, e) in edges.iter().enumerate() {
            assert!(e.tail() < self.nv && e.head() < self.nv, "Edge {e} out of range");
            while j <= e.tail() as usize {
                self.first_edge[j] = i;
                j += 1;
            }
        }
        self.first_edge[j..].fill(ne);

        let mut j = 0;
        for (i, &b) in backedges.iter().enumerate() {
            while j <= edges[b].head() as usize {
                self.first_backedge[j] = i;
                j += 1;
            }
        }
        self.first_backedge[j..].fill(ne);
    }

    /// BFS in the residual graph; returns *true* if `sink` was reached
    fn search_augmenting_path(
        &mut self,
        source: Node,
        sink: Node,
        edges: &[Edge],
        backedges: &[usize],
        caps: &[Capacity],
        flow: &[Flow],
    ) -> bool {
        self.prev.fill(None);
        self.todo.clear();
        self.todo.push_back(source);

        while let Some(from) = self.todo.pop_front() {
            if self.prev[sink as usize].is_some() {
                break;
            }

            let first = self.first_edge[from as usize];
            for (i, e) in edges[first..]
                .iter()
                .enumerate()
                .take_while(|(_, e)| e.tail() == from)
            {
                let i = first + i;
                let to = e.head();
                if to == source || self.prev[to as usize].is_some() || !caps[i].admits_more(flow[i]) {
                    continue;
                }

                self.prev[to as usize] = Some(ResidualStep::Forward(i));
                self.todo.push_back(to);
            }

            let first = self.first_backedge[from as usize];
            for &j in backedges[first..]
                .iter()
                .take_while(|&&j| edges[j].head() == from)
            {
                let to = edges[j].tail();
                if to == source || self.prev[to as usize].is_some() || flow[j] == 0 {
                    continue;
                }

                self.prev[to as usize] = Some(ResidualStep::Backward(j));
                self.todo.push_back(to);
            }
        }

        self.prev[sink as usize].is_some()
    }

    /// Minimum spare capacity along the path recorded in `prev`
    fn bottleneck(
        &self,
        source: Node,
        sink: Node,
        edges: &[Edge],
        caps: &[Capacity],
        flow: &[Flow],
    ) -> Flow {
        let mut bottleneck: Option<Flow> = None;

        let mut to = sink;
        while to != source {
            let step = self.prev[to as usize].expect("vertex on path has a predecessor");
            let from = step.origin(edges);
            assert_ne!(from, to);

            if let Some(spare) = step.spare(caps, flow) {
                bottleneck = Some(bottleneck.map_or(spare, |b| b.min(spare)));
            }

            to = from;
        }

        let Some(amount) = bottleneck else {
            panic!("Augmenting path from {source} to {sink} has unlimited capacity");
        };
        assert!(amount > 0);
        amount
    }
}

/// An owned maximum flow
#[derive(Debug, Clone)]
pub struct MaxFlow {
    /// Total flow from source to sink
    pub value: Flow,
    /// Flow on each edge
    pub flow: Vec<Flow>,
    /// Vertices on the sink side of a minimum cut
    pub sink_side: NodeBitSet,
}

/// Computes a maximum flow on the network with `nv` vertices and the sorted
/// edge list `edges`, allocating all scratch space internally.
pub fn max_flow(
    nv: NumNodes,
    source: Node,
    sink: Node,
    edges: &[Edge],
    caps: &[Capacity],
) -> Result<MaxFlow> {
    let mut solver = EdmondsKarp::try_new(nv)?;

    let mut backedges = Vec::try_filled(edges.len(), 0)?;
    fill_backedges(edges, &mut backedges);
    let mut flow = Vec::try_filled(edges.len(), 0)?;

    let value = solver.run(source, sink, edges, &backedges, caps, &mut flow);

    Ok(MaxFlow {
        value,
        flow,
        sink_side: solver.sink_side(),
    })
}
