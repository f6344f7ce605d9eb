/*!
`puzgraphs` is a small graph & grid algorithms library for generating and solving logic puzzles.
Puzzle generators repeatedly ask questions such as *"can these clues still be matched?"*,
*"does this wall layout leave a loop?"* or *"split this board into random regions"*;
this crate answers them on unlabelled graphs and rectangular grids.

# Representation

We represent **nodes** as `u32` in the range `0..n` where `n` is the number of nodes in the graph.
Grid cells are nodes as well: cell `(x, y)` of a `width x height` grid is node `y * width + x`.
For **edges**, we use a simple tuple-struct `Edge(Node, Node)`.

Algorithms accept any graph implementing [`ops::AdjacencyList`], which includes
- plain adjacency lists `Vec<Vec<Node>>`,
- [`AdjArray`](crate::repr::AdjArray), an editable undirected graph,
- [`GridGraph`](crate::repr::GridGraph), the implicit 4-neighbour graph of a rectangle.

# Design

Algorithms that are run many times on graphs of the same size own their scratch space
and are configured via structs (e.g. [`algo::HopcroftKarp`], [`algo::EdmondsKarp`],
[`algo::LoopFinder`], [`algo::Divvy`]). Their `try_new` constructors report allocation
failure as [`Error::OutOfMemory`]; `new` panics instead.
For one-off use, free functions such as [`algo::matching`] or [`algo::max_flow`] bundle
allocation, computation and result extraction.

All randomised algorithms draw from a [`random::RandomSource`], implemented for every
[`rand::Rng`] and for the seed-string based [`random::HashRng`].

Progress is reported through [`tracing`] events; install any subscriber to see them.

# Usage

There are *3* core submodules you probably want to interact with:
- [`prelude`] includes definitions for nodes, edges, basic graph operations, and all graph representations,
- [`algo`] includes matching, network flow, bridge finding and rectangle divvying,
- [`utils`] includes the disjoint-set forest [`utils::Dsf`].

In most use-cases, `use puzgraphs::{prelude::*, algo::*};` suffices for your needs.
*/

pub mod algo;
pub mod edge;
pub mod error;
pub mod node;
pub mod ops;
pub mod random;
pub mod repr;
pub(crate) mod testing;
pub mod utils;

pub use error::{Error, Result};

/// `puzgraphs::prelude` includes definitions for nodes and edges, all basic graph operation traits as well as all implemented representations.
pub mod prelude {
    pub use super::{edge::*, node::*, ops::*, repr::*};
}
