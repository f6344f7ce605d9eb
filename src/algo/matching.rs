/*!
# Bipartite Matching

Maximum matchings of bipartite graphs with the Hopcroft-Karp algorithm.

The graph is given as left adjacency lists: `adj[l]` lists the right
vertices `0..nr` adjacent to left vertex `l`. Each phase builds the
alternating BFS layers from all unmatched left vertices and then augments
along as many vertex-disjoint shortest augmenting paths as a layered DFS
finds, giving `O(E sqrt(V))` in total.

With a [`RandomSource`], the order in which left vertices start the DFS and
the order in which each adjacency list is explored are randomised (the lists
are permuted in place). Every maximum matching is then a possible result.

# Example
```
use puzgraphs::algo::*;

// a path l0 - r0 - l1 - r1
let adj: Vec<Vec<u32>> = vec![vec![0], vec![0, 1]];
let result = matching(2, &adj).unwrap();

assert_eq!(result.size, 2);
assert_eq!(result.left, vec![Some(0), Some(1)]);
assert_eq!(result.right, vec![Some(0), Some(1)]);
```
*/

use super::*;

const NO_LAYER: u32 = u32::MAX;

/// Access to the left adjacency lists during a run.
/// Separates the deterministic from the randomised exploration order.
trait LeftAdjacency {
    fn len(&self) -> usize;
    fn degree(&self, l: Node) -> usize;
    fn neighbor(&self, l: Node, j: usize) -> Node;

    /// Called right before position `j` of `l`'s list is read by the DFS
    fn prepare_position(&mut self, l: Node, j: usize);

    /// Reorders the left vertices before a DFS sweep
    fn permute(&mut self, order: &mut [Node]);
}

struct Fixed<'a, A>(&'a [A]);

impl<A: AsRef<[Node]>> LeftAdjacency for Fixed<'_, A> {
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn degree(&self, l: Node) -> usize {
        self.0[l as usize].as_ref().len()
    }

    #[inline]
    fn neighbor(&self, l: Node, j: usize) -> Node {
        self.0[l as usize].as_ref()[j]
    }

    fn prepare_position(&mut self, _l: Node, _j: usize) {}

    fn permute(&mut self, _order: &mut [Node]) {}
}

struct Shuffled<'a, A, R> {
    adj: &'a mut [A],
    rng: &'a mut R,
}

impl<A, R> LeftAdjacency for Shuffled<'_, A, R>
where
    A: AsRef<[Node]> + AsMut<[Node]>,
    R: RandomSource,
{
    fn len(&self) -> usize {
        self.adj.len()
    }

    #[inline]
    fn degree(&self, l: Node) -> usize {
        self.adj[l as usize].as_ref().len()
    }

    #[inline]
    fn neighbor(&self, l: Node, j: usize) -> Node {
        self.adj[l as usize].as_ref()[j]
    }

    fn prepare_position(&mut self, l: Node, j: usize) {
        let list = self.adj[l as usize].as_mut();
        let remaining = list.len() - j;
        if remaining > 1 {
            let which = j + self.rng.uniform_upto(remaining as u32) as usize;
            list.swap(j, which);
        }
    }

    fn permute(&mut self, order: &mut [Node]) {
        self.rng.shuffle(order);
    }
}

/// Hopcroft-Karp matcher for bipartite graphs with `nl` left and `nr` right vertices.
///
/// Owns all scratch space, so a single instance can be reused for many
/// graphs of the same dimensions. After [`HopcroftKarp::compute`] the
/// matching can be inspected via [`HopcroftKarp::left_partner`],
/// [`HopcroftKarp::right_partner`] and [`HopcroftKarp::pairs`].
#[derive(Debug, Clone)]
pub struct HopcroftKarp {
    nl: NumNodes,
    nr: NumNodes,

    left_partner: Vec<Option<OptionalNode>>,
    right_partner: Vec<Option<OptionalNode>>,

    left_layer: Vec<u32>,
    right_layer: Vec<u32>,

    left_queue: Vec<Node>,
    right_queue: Vec<Node>,

    // alternates left (even positions) and right (odd positions) vertices
    aug_path: Vec<Node>,
    // progress of the DFS at each left position of `aug_path`
    dfs_state: Vec<NumNodes>,
    left_order: Vec<Node>,
}

impl HopcroftKarp {
    /// Creates a matcher for `nl` left and `nr` right vertices
    pub fn new(nl: NumNodes, nr: NumNodes) -> Self {
        Self::try_new(nl, nr).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`HopcroftKarp::new`], but reports allocation failure
    pub fn try_new(nl: NumNodes, nr: NumNodes) -> Result<Self> {
        let nmin = nl.min(nr) as usize;
        let (nl_, nr_) = (nl as usize, nr as usize);

        let mut left_queue = Vec::new();
        left_queue.try_reserve_exact(nl_)?;
        let mut right_queue = Vec::new();
        right_queue.try_reserve_exact(nr_)?;

        Ok(Self {
            nl,
            nr,
            left_partner: Vec::try_filled(nl_, None)?,
            right_partner: Vec::try_filled(nr_, None)?,
            left_layer: Vec::try_filled(nl_, NO_LAYER)?,
            right_layer: Vec::try_filled(nr_, NO_LAYER)?,
            left_queue,
            right_queue,
            aug_path: Vec::try_filled(2 * nmin, 0)?,
            dfs_state: Vec::try_filled(nmin + 1, 0)?,
            left_order: Vec::try_filled(nl_, 0)?,
        })
    }

    /// Upper bound in bytes on the scratch space held by a matcher of the given dimensions
    pub fn scratch_size(nl: NumNodes, nr: NumNodes) -> usize {
        let (nl, nr) = (nl as usize, nr as usize);
        let nmin = nl.min(nr);
        let words = 4 * nl + 4 * nr + 3 * nmin + 1;
        size_of::<Self>() + words * size_of::<u32>()
    }

    /// Number of left vertices
    pub fn number_of_left(&self) -> NumNodes {
        self.nl
    }

    /// Number of right vertices
    pub fn number_of_right(&self) -> NumNodes {
        self.nr
    }

    /// Computes a maximum matching and returns its cardinality.
    /// Tie-breaking follows the order of the adjacency lists.
    ///
    /// # Panics
    /// If `adj.len() != nl` or some list contains a vertex `>= nr`.
    #[instrument(skip_all)]
    pub fn compute<A>(&mut self, adj: &[A]) -> NumNodes
    where
        A: AsRef<[Node]>,
    {
        self.run(&mut Fixed(adj))
    }

    /// Computes a maximum matching with randomised tie-breaking.
    ///
    /// The adjacency lists are permuted in place as a side effect.
    ///
    /// # Panics
    /// If `adj.len() != nl` or some list contains a vertex `>= nr`.
    #[instrument(skip_all)]
    pub fn compute_randomized<A, R>(&mut self, adj: &mut [A], rng: &mut R) -> NumNodes
    where
        A: AsRef<[Node]> + AsMut<[Node]>,
        R: RandomSource,
    {
        self.run(&mut Shuffled { adj, rng })
    }

    /// Returns the right partner of left vertex `l`, if matched
    pub fn left_partner(&self, l: Node) -> Option<Node> {
        unpack_node(self.left_partner[l as usize])
    }

    /// Returns the left partner of right vertex `r`, if matched
    pub fn right_partner(&self, r: Node) -> Option<Node> {
        unpack_node(self.right_partner[r as usize])
    }

    /// Iterates over all matched pairs `(l, r)` in increasing order of `l`
    pub fn pairs(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.left_partner
            .iter()
            .enumerate()
            .filter_map(|(l, r)| unpack_node(*r).map(|r| (l as Node, r)))
    }

    /// Returns a labelling certifying that the last computed matching is maximum.
    ///
    /// A vertex is labelled *1* iff its bit is set. The labelling satisfies:
    /// - unmatched left vertices are labelled *0*, unmatched right vertices *1*,
    /// - every edge from a left *0* to a right *1* vertex is in the matching,
    /// - no edge from a left *1* to a right *0* vertex is in the matching.
    ///
    /// Any augmenting path would start at a left *0*, end at a right *1*, and
    /// never cross from *0* to *1*, so no such path exists.
    pub fn maximality_witness(&self) -> (NodeBitSet, NodeBitSet) {
        let labels = |layers: &[u32]| {
            NodeBitSet::new_with_bits_set(
                layers.len() as NumNodes,
                layers
                    .iter()
                    .enumerate()
                    .filter_map(|(u, &layer)| (layer == NO_LAYER).then_some(u as Node)),
            )
        };

        (labels(&self.left_layer), labels(&self.right_layer))
    }

    fn run<G: LeftAdjacency>(&mut self, adj: &mut G) -> NumNodes {
        assert_eq!(adj.len(), self.nl as usize, "Adjacency lists do not match nl");

        self.left_partner.fill(None);
        self.right_partner.fill(None);

        let mut phases = 0usize;
        while let Some(target_layer) = self.build_layers(adj) {
            phases += 1;

            // only unmatched vertices are interesting in the target layer
            for (r, layer) in self.right_layer.iter_mut().enumerate() {
                if *layer == target_layer && self.right_partner[r].is_some() {
                    *layer = NO_LAYER;
                }
            }

            for (l, slot) in self.left_order.iter_mut().enumerate() {
                *slot = l as Node;
            }
            adj.permute(&mut self.left_order);

            let augmented = self.augment_along_layers(adj, target_layer);
            trace!(phases, target_layer, augmented, "completed phase");
        }

        let size = self.left_partner.iter().filter(|p| p.is_some()).count() as NumNodes;
        debug!(nl = self.nl, nr = self.nr, phases, size, "computed maximum matching");
        size
    }

    /// Alternating BFS from all unmatched left vertices. Returns the first
    /// layer containing an unmatched right vertex, or `None` if there is none.
    fn build_layers<G: LeftAdjacency>(&mut self, adj: &G) -> Option<u32> {
        self.left_layer.fill(NO_LAYER);
        self.right_layer.fill(NO_LAYER);

        self.left_queue.clear();
        for l in 0..self.nl {
            if self.left_partner[l as usize].is_none() {
                self.left_layer[l as usize] = 0;
                self.left_queue.push(l);
            }
        }

        let mut layer = 0;
        loop {
            let mut found_free_right = false;

            self.right_queue.clear();
            for &l in &self.left_queue {
                debug_assert_eq!(self.left_layer[l as usize], layer);
                let partner = unpack_node(self.left_partner[l as usize]);

                for j in 0..adj.degree(l) {
                    let r = adj.neighbor(l, j);
                    assert!(r < self.nr, "Right vertex {r} out of range");

                    if Some(r) != partner && self.right_layer[r as usize] == NO_LAYER {
                        self.right_layer[r as usize] = layer + 1;
                        self.right_queue.push(r);
                        found_free_right |= self.right_partner[r as usize].is_none();
                    }
                }
            }
            layer += 1;

            if found_free_right {
                return Some(layer);
            }

            if self.right_queue.is_empty() {
                return None;
            }

            self.left_queue.clear();
            for &r in &self.right_queue {
                debug_assert_eq!(self.right_layer[r as usize], layer);
                if let Some(l) = unpack_node(self.right_partner[r as usize]) {
                    if self.left_layer[l as usize] == NO_LAYER {
                        self.left_layer[l as usize] = layer + 1;
                        self.left_queue.push(l);
                    }
                }
            }
            layer += 1;

            if self.left_queue.is_empty() {
                return None;
            }
        }
    }

    /// Layered DFS augmenting along vertex-disjoint shortest paths.
    /// Visited vertices have their layer reset to `NO_LAYER`.
    fn augment_along_layers<G: LeftAdjacency>(&mut self, adj: &mut G, target_layer: u32) -> usize {
        let mut augmented = 0;
        let mut depth = 0usize;
        self.dfs_state[0] = 0;

        loop {
            let next_left = if depth == 0 {
                if self.dfs_state[0] == self.nl {
                    break;
                }

                let l = self.left_order[self.dfs_state[0] as usize];
                self.dfs_state[0] += 1;

                if self.left_layer[l as usize] != 0 {
                    continue;
                }
                l
            } else {
                let prev = self.aug_path[2 * depth - 2];
                let j = self.dfs_state[depth] as usize;
                self.dfs_state[depth] += 1;

                if j == adj.degree(prev) {
                    depth -= 1;
                    continue;
                }

                adj.prepare_position(prev, j);
                let r = adj.neighbor(prev, j);

                if self.right_layer[r as usize] != (2 * depth - 1) as u32 {
                    continue;
                }

                self.aug_path[2 * depth - 1] = r;
                self.right_layer[r as usize] = NO_LAYER;

                if 2 * depth - 1 == target_layer as usize {
                    for pair in self.aug_path[..2 * depth].chunks_exact(2) {
                        self.left_partner[pair[0] as usize] = OptionalNode::new(pair[1]);
                        self.right_partner[pair[1] as usize] = OptionalNode::new(pair[0]);
                    }
                    trace!(length = 2 * depth - 1, "augmented matching");

                    augmented += 1;
                    depth = 0;
                    continue;
                }

                // below the target layer every right vertex is matched
                let Some(l) = self.right_partner(r) else {
                    continue;
                };
                if self.left_layer[l as usize] != (2 * depth) as u32 {
                    continue;
                }
                l
            };

            self.aug_path[2 * depth] = next_left;
            self.left_layer[next_left as usize] = NO_LAYER;
            depth += 1;
            self.dfs_state[depth] = 0;
        }

        augmented
    }
}

/// An owned maximum matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    /// Number of matched pairs
    pub size: NumNodes,
    /// Right partner of every left vertex
    pub left: Vec<Option<Node>>,
    /// Left partner of every right vertex
    pub right: Vec<Option<Node>>,
}

impl Matching {
    fn from_matcher(matcher: &HopcroftKarp, size: NumNodes) -> Result<Self> {
        let mut left = Vec::new();
        left.try_reserve_exact(matcher.nl as usize)?;
        left.extend((0..matcher.nl).map(|l| matcher.left_partner(l)));

        let mut right = Vec::new();
        right.try_reserve_exact(matcher.nr as usize)?;
        right.extend((0..matcher.nr).map(|r| matcher.right_partner(r)));

        Ok(Self { size, left, right })
    }
}

/// Computes a maximum matching of the bipartite graph with left adjacency
/// lists `adj` and `nr` right vertices.
pub fn matching<A>(nr: NumNodes, adj: &[A]) -> Result<Matching>
where
    A: AsRef<[Node]>,
{
    let mut matcher = HopcroftKarp::try_new(adj.len() as NumNodes, nr)?;
    let size = matcher.compute(adj);
    Matching::from_matcher(&matcher, size)
}

/// Like [`matching`], but breaks ties at random. Permutes the lists of `adj` in place.
pub fn random_matching<A, R>(nr: NumNodes, adj: &mut [A], rng: &mut R) -> Result<Matching>
where
    A: AsRef<[Node]> + AsMut<[Node]>,
    R: RandomSource,
{
    let mut matcher = HopcroftKarp::try_new(adj.len() as NumNodes, nr)?;
    let size = matcher.compute_randomized(adj, rng);
    Matching::from_matcher(&matcher, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::random_bipartite_adjacency;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    /// Size of a maximum matching by exhaustive search
    fn naive_maximum(nr: NumNodes, adj: &[Vec<Node>]) -> NumNodes {
        fn rec(l: usize, adj: &[Vec<Node>], used: &mut [bool]) -> NumNodes {
            if l == adj.len() {
                return 0;
            }
            let mut best = rec(l + 1, adj, used);
            for &r in &adj[l] {
                if !used[r as usize] {
                    used[r as usize] = true;
                    best = best.max(1 + rec(l + 1, adj, used));
                    used[r as usize] = false;
                }
            }
            best
        }
        rec(0, adj, &mut vec![false; nr as usize])
    }

    fn check_matching(matcher: &HopcroftKarp, adj: &[Vec<Node>], size: NumNodes) {
        let pairs = matcher.pairs().collect_vec();
        assert_eq!(pairs.len(), size as usize);

        for &(l, r) in &pairs {
            assert!(adj[l as usize].contains(&r));
            assert_eq!(matcher.right_partner(r), Some(l));
        }
        let matched_right = (0..matcher.number_of_right())
            .filter(|&r| matcher.right_partner(r).is_some())
            .count();
        assert_eq!(matched_right, size as usize);

        let (left_labels, right_labels) = matcher.maximality_witness();
        for l in 0..matcher.number_of_left() {
            if matcher.left_partner(l).is_none() {
                assert!(!left_labels.get_bit(l));
            }
            for &r in &adj[l as usize] {
                let used = matcher.left_partner(l) == Some(r);
                if !left_labels.get_bit(l) && right_labels.get_bit(r) {
                    assert!(used);
                }
                if left_labels.get_bit(l) && !right_labels.get_bit(r) {
                    assert!(!used);
                }
            }
        }
        for r in 0..matcher.number_of_right() {
            if matcher.right_partner(r).is_none() {
                assert!(right_labels.get_bit(r));
            }
        }
    }

    #[test]
    fn complete_bipartite_minus_edge() {
        let adj: Vec<Vec<Node>> = (0..5)
            .map(|l| (0..5).filter(|&r| !(l == 2 && r == 3)).collect_vec())
            .collect_vec();

        let mut matcher = HopcroftKarp::new(5, 5);
        let size = matcher.compute(&adj);
        assert_eq!(size, 5);
        check_matching(&matcher, &adj, size);
    }

    #[test]
    fn no_perfect_matching() {
        // three left vertices competing for the two right vertices 0 and 1
        let adj: Vec<Vec<Node>> = vec![vec![0, 1], vec![0], vec![1], vec![2, 3]];
        let mut matcher = HopcroftKarp::new(4, 4);
        let size = matcher.compute(&adj);
        assert_eq!(size, 3);
        check_matching(&matcher, &adj, size);
    }

    #[test]
    fn empty_sides() {
        let empty: Vec<Vec<Node>> = Vec::new();
        assert_eq!(matching(4, &empty).unwrap().size, 0);

        let adj: Vec<Vec<Node>> = vec![vec![]; 3];
        let result = matching(0, &adj).unwrap();
        assert_eq!(result.size, 0);
        assert_eq!(result.left, vec![None; 3]);
    }

    #[test]
    fn matches_naive_on_random_graphs() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);

        for _ in 0..200 {
            let (nr, adj) = random_bipartite_adjacency(rng, 7, 7, 0.3);
            let nl = adj.len() as NumNodes;

            let mut matcher = HopcroftKarp::new(nl, nr);
            let size = matcher.compute(&adj);
            assert_eq!(size, naive_maximum(nr, &adj));
            check_matching(&matcher, &adj, size);

            let mut shuffled = adj.clone();
            let size = matcher.compute_randomized(&mut shuffled, rng);
            assert_eq!(size, naive_maximum(nr, &adj));
            check_matching(&matcher, &shuffled, size);

            for (a, b) in adj.iter().zip(&shuffled) {
                assert_eq!(a.iter().sorted().collect_vec(), b.iter().sorted().collect_vec());
            }
        }
    }

    #[test]
    fn randomized_is_deterministic_per_seed() {
        let rng = &mut Pcg64Mcg::seed_from_u64(11);
        let (nr, adj) = random_bipartite_adjacency(rng, 20, 20, 0.4);

        let run = |seed| {
            let mut adj = adj.clone();
            random_matching(nr, &mut adj, &mut Pcg64Mcg::seed_from_u64(seed)).unwrap()
        };

        assert_eq!(run(1), run(1));
    }

    #[test]
    fn randomized_reaches_every_perfect_matching() {
        // K_{3,3} has 6 perfect matchings
        let adj: Vec<Vec<Node>> = vec![vec![0, 1, 2]; 3];
        let rng = &mut Pcg64Mcg::seed_from_u64(2);

        let mut seen = Vec::new();
        for _ in 0..300 {
            let mut adj = adj.clone();
            let result = random_matching(3, &mut adj, rng).unwrap();
            assert_eq!(result.size, 3);
            if !seen.contains(&result.left) {
                seen.push(result.left);
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn scratch_reuse() {
        let mut matcher = HopcroftKarp::new(3, 3);
        let first: Vec<Vec<Node>> = vec![vec![0], vec![1], vec![2]];
        let second: Vec<Vec<Node>> = vec![vec![0], vec![0], vec![0]];

        assert_eq!(matcher.compute(&first), 3);
        assert_eq!(matcher.compute(&second), 1);
        assert_eq!(matcher.compute(&first), 3);
        assert!(HopcroftKarp::scratch_size(3, 3) > 0);
    }
}
