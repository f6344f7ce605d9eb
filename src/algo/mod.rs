/*!
# Puzzle Algorithms

Graph and grid algorithms used by puzzle generators and solvers.
All algorithms are re-exported at the top level of this module, so you can simply do:
```rust
use puzgraphs::algo::*;
```
and gain access to
- bipartite matching ([`HopcroftKarp`], [`matching`], [`random_matching`]),
- maximum flow and minimum cut ([`EdmondsKarp`], [`max_flow`]),
- bridge and loop detection ([`LoopFinder`], [`Bridges`]),
- random partitions of a rectangle into ominoes ([`Divvy`], [`divvy_rectangle`]).

Algorithms that run repeatedly (e.g. once per solver step) are provided as
structs owning their scratch space, so consecutive runs do not allocate.
*/

mod bridges;
mod divvy;
mod matching;
mod network_flow;

use crate::{
    error::{Error, Result},
    prelude::*,
    random::RandomSource,
    utils::*,
};
use itertools::Itertools;
use stream_bitset::prelude::*;
use tracing::{debug, instrument, trace};

pub use bridges::*;
pub use divvy::*;
pub use matching::*;
pub use network_flow::*;
