/*!
# Node Representation

Vertices, grid cells and omino ids are all plain `u32` indices counted from `0`.
Puzzle grids and their auxiliary graphs stay far below `2^32` elements, so the
narrower type halves the footprint of the many per-vertex scratch arrays.
*/

use std::num::NonZero;
use stream_bitset::bitset::BitSetImpl;

/// Nodes can be any unsigned integer from `0` to `Node::MAX - 1`
pub type Node = u32;

/// Node-Value that is considered invalid
pub const INVALID_NODE: Node = Node::MAX;

/// There can be at most `2^32 - 1` nodes in a graph!
pub type NumNodes = Node;

/// BitSet for Nodes
pub type NodeBitSet = BitSetImpl<Node>;

/// `Option<Node>` needs eight bytes; scratch arrays such as matching partners
/// store `Option<OptionalNodeImpl<N>>` instead, which keeps four bytes by
/// using the value `N` as the niche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct OptionalNodeImpl<const N: Node>(NonZero<Node>);

/// `INVALID_NODE` never occurs as a real index
pub type OptionalNode = OptionalNodeImpl<INVALID_NODE>;

impl<const N: Node> OptionalNodeImpl<N> {
    /// Returns `Some(OptionalNodeImpl)` if `n != N` and `None` otherwise
    pub const fn new(n: Node) -> Option<Self> {
        match NonZero::new(n ^ N) {
            Some(inner) => Some(OptionalNodeImpl(inner)),
            None => None,
        }
    }

    /// Gets the underlying Node-Value
    pub const fn get(&self) -> Node {
        self.0.get() ^ N
    }
}

/// Unpacks a compact optional node into a regular `Option<Node>`
#[inline]
pub fn unpack_node(packed: Option<OptionalNode>) -> Option<Node> {
    packed.map(|u| u.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_node_roundtrip_and_niche() {
        assert_eq!(size_of::<Option<OptionalNode>>(), size_of::<Node>());

        for u in [0, 1, 17, INVALID_NODE - 1] {
            assert_eq!(unpack_node(OptionalNode::new(u)), Some(u));
        }
        assert_eq!(OptionalNode::new(INVALID_NODE), None);
    }
}
