/*!
# Graph Representations

- [`AdjArray`] stores one neighbor array per node. It is the general purpose
  undirected representation used for auxiliary puzzle graphs.
- [`GridGraph`] is the implicit 4-neighbour graph of a `width x height` grid.
  Nothing is stored besides the dimensions.

Both implement [`AdjacencyList`] and can thus be fed into any algorithm of
[`algo`](crate::algo) that works on general graphs.
*/

use crate::{edge::*, node::*, ops::*};

mod grid;
mod undirected;

pub use grid::*;
pub use undirected::*;
