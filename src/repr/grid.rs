use num::Integer;

use super::*;

/// Offsets of the 4-neighbourhood in the order left, up, right, down
pub(crate) const GRID_DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// The implicit 4-neighbour graph of a `width x height` grid.
///
/// Cell `(x, y)` is node `y * width + x`.
///
/// # Example
/// ```
/// use puzgraphs::prelude::*;
///
/// let grid = GridGraph::new(3, 2);
/// assert_eq!(grid.number_of_nodes(), 6);
/// assert_eq!(grid.cell(2, 1), 5);
/// assert_eq!(grid.coords(4), (1, 1));
/// assert_eq!(grid.degree_of(grid.cell(1, 0)), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGraph {
    width: u32,
    height: u32,
}

impl GridGraph {
    /// Creates the grid graph of the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width.checked_mul(height).is_some_and(|n| n < INVALID_NODE),
            "Grid too large"
        );
        Self { width, height }
    }

    /// Width of the grid
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the grid
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the node of cell `(x, y)`
    /// ** Panics if the cell is outside the grid **
    #[inline]
    pub fn cell(&self, x: u32, y: u32) -> Node {
        assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Returns the coordinates `(x, y)` of a node
    #[inline]
    pub fn coords(&self, u: Node) -> (u32, u32) {
        let (y, x) = u.div_rem(&self.width);
        (x, y)
    }

    /// Returns the cell at offset `(dx, dy)` from `u` if it lies inside the grid
    #[inline]
    pub fn offset(&self, u: Node, dx: i32, dy: i32) -> Option<Node> {
        let (x, y) = self.coords(u);
        let x = x.checked_add_signed(dx).filter(|&x| x < self.width)?;
        let y = y.checked_add_signed(dy).filter(|&y| y < self.height)?;
        Some(self.cell(x, y))
    }
}

impl GraphNodeOrder for GridGraph {
    fn number_of_nodes(&self) -> NumNodes {
        self.width * self.height
    }
}

impl GraphEdgeOrder for GridGraph {
    fn number_of_edges(&self) -> NumEdges {
        let horizontal = self.width.saturating_sub(1) * self.height;
        let vertical = self.width * self.height.saturating_sub(1);
        horizontal + vertical
    }
}

impl AdjacencyList for GridGraph {
    fn neighbors_of(&self, u: Node) -> impl Iterator<Item = Node> + '_ {
        assert!(u < self.number_of_nodes());
        GRID_DIRECTIONS
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(u, dx, dy))
    }

    fn degree_of(&self, u: Node) -> NumNodes {
        self.neighbors_of(u).count() as NumNodes
    }
}

impl AdjacencyTest for GridGraph {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        let (ux, uy) = self.coords(u);
        let (vx, vy) = self.coords(v);
        ux.abs_diff(vx) + uy.abs_diff(vy) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn grid_neighborhoods() {
        let grid = GridGraph::new(4, 3);

        assert_eq!(grid.neighbors_of(0).collect_vec(), vec![1, 4]);
        assert_eq!(grid.neighbors_of(5).collect_vec(), vec![4, 1, 6, 9]);
        assert_eq!(grid.neighbors_of(11).collect_vec(), vec![10, 7]);
        assert_eq!(grid.offset(3, 1, 0), None);
        assert_eq!(grid.offset(4, -1, 0), None);

        for u in grid.vertices() {
            assert_eq!(grid.cell(grid.coords(u).0, grid.coords(u).1), u);
            for v in grid.neighbors_of(u) {
                assert!(grid.has_edge(v, u));
            }
        }
    }

    #[test]
    fn edge_count_matches_neighborhoods() {
        for (w, h) in [(1, 1), (1, 5), (4, 3), (9, 4)] {
            let grid = GridGraph::new(w, h);
            let degree_sum: NumNodes = grid.degrees().sum();
            assert_eq!(degree_sum, 2 * grid.number_of_edges());
            assert_eq!(grid.ordered_edges(true).len(), grid.number_of_edges() as usize);
        }
    }
}
