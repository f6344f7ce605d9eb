/*!
# Disjoint-Set Forest

Union-find over the elements `0..n` with union by size and path compression.

Besides plain equivalence classes, a forest can optionally track
- the **minimal element** of each class ([`Dsf::new_min`]), and
- a **flip bit** per element ([`Dsf::new_flip`]), recording whether an element
  is "the same as" or "the opposite of" its canonical representative. Solvers
  use this to propagate parity constraints such as "these two cells have
  different colours".

# Example
```rust
use puzgraphs::utils::Dsf;

let mut dsf = Dsf::new(6);
dsf.union(0, 1);
dsf.union(4, 1);

assert!(dsf.equivalent(0, 4));
assert!(!dsf.equivalent(0, 5));
assert_eq!(dsf.size(4), 3);
```
*/

use fxhash::FxHashMap;

use crate::{error::Result, node::*, utils::TryFromLength};

const FLAG_CANONICAL: u32 = 1 << 31;
const INDEX_MASK: u32 = FLAG_CANONICAL - 1;

/// Largest number of elements a forest can hold
pub const DSF_MAX: usize = INDEX_MASK as usize + 1;

/// A disjoint-set forest over the elements `0..len`.
///
/// A canonical element stores the size of its class (tagged with a flag bit),
/// every other element the index of an element closer to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsf {
    parent_or_size: Vec<u32>,
    flip: Option<Vec<bool>>,
    min: Option<Vec<Node>>,
}

impl Dsf {
    /// Creates a forest of `n` singleton classes.
    ///
    /// # Panics
    /// If `n` exceeds [`DSF_MAX`].
    pub fn new(n: NumNodes) -> Self {
        Self::try_new(n).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`Dsf::new`], but reports allocation failure instead of aborting.
    pub fn try_new(n: NumNodes) -> Result<Self> {
        Self::try_with_tracking(n, false, false)
    }

    /// Creates a forest that additionally tracks a flip bit per element.
    /// Use [`Dsf::union_flip`] / [`Dsf::find_flip`] on such a forest.
    pub fn new_flip(n: NumNodes) -> Self {
        Self::try_with_tracking(n, true, false).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Creates a forest that additionally tracks the minimal element of each class.
    pub fn new_min(n: NumNodes) -> Self {
        Self::try_with_tracking(n, false, true).unwrap_or_else(|err| panic!("{err}"))
    }

    fn try_with_tracking(n: NumNodes, flip: bool, min: bool) -> Result<Self> {
        assert!(n as usize <= DSF_MAX, "Bad dsf size");

        let len = n as usize;
        let mut dsf = Self {
            parent_or_size: Vec::try_filled(len, 0)?,
            flip: flip.then(|| Vec::try_filled(len, false)).transpose()?,
            min: min.then(|| Vec::try_filled(len, 0)).transpose()?,
        };
        dsf.reinit();
        Ok(dsf)
    }

    /// Number of elements in the forest
    pub fn len(&self) -> usize {
        self.parent_or_size.len()
    }

    /// Returns *true* if the forest has no elements
    pub fn is_empty(&self) -> bool {
        self.parent_or_size.is_empty()
    }

    /// Resets every element into its own singleton class
    pub fn reinit(&mut self) {
        self.parent_or_size.fill(FLAG_CANONICAL | 1);

        if let Some(min) = self.min.as_mut() {
            for (i, m) in min.iter_mut().enumerate() {
                *m = i as Node;
            }
        }

        // flip bits are only meaningful for non-canonical elements, of which there are none
    }

    /// Overwrites `self` with the state of `other`.
    ///
    /// # Panics
    /// If the sizes differ or `other` lacks tracking data that `self` carries.
    pub fn copy_from(&mut self, other: &Dsf) {
        assert_eq!(self.len(), other.len(), "Mismatch in copy_from");
        self.parent_or_size.copy_from_slice(&other.parent_or_size);

        if let Some(flip) = self.flip.as_mut() {
            let from = other
                .flip
                .as_ref()
                .expect("Copying a non-flip dsf to a flip one");
            flip.copy_from_slice(from);
        }

        if let Some(min) = self.min.as_mut() {
            let from = other
                .min
                .as_ref()
                .expect("Copying a non-min dsf to a min one");
            min.copy_from_slice(from);
        }
    }

    #[inline]
    fn is_canonical(&self, n: usize) -> bool {
        self.parent_or_size[n] & FLAG_CANONICAL != 0
    }

    #[inline]
    fn class_size(&self, root: usize) -> u32 {
        self.parent_or_size[root] & INDEX_MASK
    }

    fn find_root(&self, mut n: usize) -> usize {
        while !self.is_canonical(n) {
            n = self.parent_or_size[n] as usize;
        }
        n
    }

    fn path_compress(&mut self, mut n: usize, root: usize) {
        while !self.is_canonical(n) {
            let prev = n;
            n = self.parent_or_size[n] as usize;
            self.parent_or_size[prev] = root as u32;
        }
        debug_assert_eq!(n, root);
    }

    /// Returns the canonical element of `n`'s class without compressing paths.
    ///
    /// Useful for read-only inspection; prefer [`Dsf::find`] in hot loops.
    pub fn root_of(&self, n: Node) -> Node {
        assert!((n as usize) < self.len(), "Overrun in root_of");
        self.find_root(n as usize) as Node
    }

    /// Returns the canonical element of `n`'s class
    pub fn find(&mut self, n: Node) -> Node {
        assert!((n as usize) < self.len(), "Overrun in find");

        let root = self.find_root(n as usize);
        self.path_compress(n as usize, root);
        root as Node
    }

    /// Merges the classes of `a` and `b`.
    ///
    /// # Panics
    /// On a flip-tracking forest; use [`Dsf::union_flip`] there.
    pub fn union(&mut self, a: Node, b: Node) {
        assert!((a as usize) < self.len(), "Overrun in union");
        assert!((b as usize) < self.len(), "Overrun in union");
        assert!(self.flip.is_none(), "union on a flip dsf");

        let (a, b) = (a as usize, b as usize);
        let r1 = self.find_root(a);
        let r2 = self.find_root(b);

        let root = if r1 == r2 { r1 } else { self.link_roots(r1, r2) };

        self.path_compress(a, root);
        self.path_compress(b, root);
    }

    /// Hangs the smaller of two distinct roots below the larger one and
    /// returns the new root.
    fn link_roots(&mut self, r1: usize, r2: usize) -> usize {
        let s1 = self.class_size(r1);
        let s2 = self.class_size(r2);

        let (root, child) = if s1 > s2 { (r1, r2) } else { (r2, r1) };
        self.parent_or_size[child] = root as u32;
        self.parent_or_size[root] = (s1 + s2) | FLAG_CANONICAL;

        if let Some(min) = self.min.as_mut() {
            min[root] = min[r1].min(min[r2]);
        }

        root
    }

    /// Returns *true* if `a` and `b` are in the same class
    pub fn equivalent(&mut self, a: Node, b: Node) -> bool {
        self.find(a) == self.find(b)
    }

    /// Returns the number of elements in `n`'s class
    pub fn size(&mut self, n: Node) -> NumNodes {
        let root = self.find(n);
        self.class_size(root as usize)
    }

    /// Returns the smallest element of `n`'s class.
    ///
    /// # Panics
    /// If the forest was not created by [`Dsf::new_min`].
    pub fn minimal(&mut self, n: Node) -> Node {
        assert!(self.min.is_some(), "minimal on a non-min dsf");
        let root = self.find(n) as usize;
        self.min.as_ref().map_or(root as Node, |min| min[root])
    }

    fn find_root_flip(&self, mut n: usize, flips: &[bool]) -> (usize, bool) {
        let mut flip = false;
        while !self.is_canonical(n) {
            flip ^= flips[n];
            n = self.parent_or_size[n] as usize;
        }
        (n, flip)
    }

    fn path_compress_flip(
        parent_or_size: &mut [u32],
        flips: &mut [bool],
        mut n: usize,
        root: usize,
        mut flip: bool,
    ) {
        while parent_or_size[n] & FLAG_CANONICAL == 0 {
            let prev = n;
            let flip_prev = flip;
            n = parent_or_size[n] as usize;
            flip ^= flips[prev];
            flips[prev] = flip_prev;
            parent_or_size[prev] = root as u32;
        }
        debug_assert_eq!(n, root);
    }

    /// Returns the canonical element of `n`'s class together with a flag
    /// telling whether `n` is inverted relative to it.
    ///
    /// # Panics
    /// If the forest was not created by [`Dsf::new_flip`].
    pub fn find_flip(&mut self, n: Node) -> (Node, bool) {
        assert!((n as usize) < self.len(), "Overrun in find_flip");
        let mut flips = self.flip.take().expect("find_flip on a non-flip dsf");

        let (root, flip) = self.find_root_flip(n as usize, &flips);
        Self::path_compress_flip(&mut self.parent_or_size, &mut flips, n as usize, root, flip);

        self.flip = Some(flips);
        (root as Node, flip)
    }

    /// Merges the classes of `a` and `b`, recording that `b` is inverted
    /// relative to `a` iff `inverse` is set.
    ///
    /// # Panics
    /// If the forest was not created by [`Dsf::new_flip`], or if `a` and `b`
    /// are already equivalent with the opposite relation.
    pub fn union_flip(&mut self, a: Node, b: Node, inverse: bool) {
        assert!((a as usize) < self.len(), "Overrun in union_flip");
        assert!((b as usize) < self.len(), "Overrun in union_flip");
        let mut flips = self.flip.take().expect("union_flip on a non-flip dsf");

        let (a, b) = (a as usize, b as usize);
        let (r1, mut f1) = self.find_root_flip(a, &flips);
        let (r2, mut f2) = self.find_root_flip(b, &flips);

        let root = if r1 == r2 {
            assert!(!(f1 ^ f2 ^ inverse), "Inconsistency in union_flip");
            r1
        } else {
            let root = self.link_roots(r1, r2);
            if root == r1 {
                flips[r2] = f1 ^ f2 ^ inverse;
                f2 ^= flips[r2];
            } else {
                flips[r1] = f1 ^ f2 ^ inverse;
                f1 ^= flips[r1];
            }
            root
        };

        Self::path_compress_flip(&mut self.parent_or_size, &mut flips, a, root, f1);
        Self::path_compress_flip(&mut self.parent_or_size, &mut flips, b, root, f2);
        self.flip = Some(flips);
    }

    /// Groups all elements by class.
    ///
    /// Classes are ordered by their smallest element, and each class lists
    /// its elements in increasing order.
    pub fn classes(&mut self) -> Vec<Vec<Node>> {
        let mut index_of_root: FxHashMap<Node, usize> = FxHashMap::default();
        let mut classes: Vec<Vec<Node>> = Vec::new();

        for u in 0..self.len() as Node {
            let root = self.find(u);
            let idx = *index_of_root.entry(root).or_insert_with(|| {
                classes.push(Vec::new());
                classes.len() - 1
            });
            classes[idx].push(u);
        }

        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn singletons_after_new_and_reinit() {
        let mut dsf = Dsf::new(5);
        for u in 0..5 {
            assert_eq!(dsf.find(u), u);
            assert_eq!(dsf.size(u), 1);
        }

        dsf.union(0, 4);
        dsf.union(2, 3);
        assert_eq!(dsf.classes().len(), 3);

        dsf.reinit();
        assert_eq!(dsf.classes(), (0..5).map(|u| vec![u]).collect_vec());
    }

    #[test]
    fn try_new_matches_new() {
        let mut dsf = Dsf::try_new(6).unwrap();
        assert_eq!(dsf, Dsf::new(6));
        assert_eq!(dsf.len(), 6);

        dsf.union(1, 5);
        assert!(dsf.equivalent(5, 1));
        assert_eq!(dsf.size(1), 2);

        assert!(Dsf::try_new(0).unwrap().is_empty());
    }

    #[test]
    fn union_tracks_sizes_and_roots() {
        let mut dsf = Dsf::new(8);
        dsf.union(0, 1);
        dsf.union(2, 3);
        dsf.union(1, 3);
        dsf.union(3, 3);

        assert!(dsf.equivalent(0, 2));
        assert_eq!(dsf.size(3), 4);
        assert_eq!(dsf.size(7), 1);
        assert_eq!(dsf.root_of(0), dsf.find(2));
        assert_eq!(dsf.classes(), vec![vec![0, 1, 2, 3], vec![4], vec![5], vec![6], vec![7]]);
    }

    #[test]
    fn matches_naive_labels_on_random_unions() {
        let rng = &mut Pcg64Mcg::seed_from_u64(3);

        for n in [1 as NumNodes, 10, 50] {
            let mut dsf = Dsf::new(n);
            let mut label = (0..n).collect_vec();

            for _ in 0..n {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                dsf.union(a, b);

                let (la, lb) = (label[a as usize], label[b as usize]);
                label.iter_mut().filter(|l| **l == lb).for_each(|l| *l = la);
            }

            for a in 0..n {
                for b in 0..n {
                    assert_eq!(
                        dsf.equivalent(a, b),
                        label[a as usize] == label[b as usize]
                    );
                }
                let expected = label.iter().filter(|&&l| l == label[a as usize]).count();
                assert_eq!(dsf.size(a) as usize, expected);
            }
        }
    }

    #[test]
    fn minimal_element() {
        let mut dsf = Dsf::new_min(6);
        dsf.union(5, 3);
        dsf.union(4, 5);
        assert_eq!(dsf.minimal(4), 3);
        dsf.union(1, 4);
        assert_eq!(dsf.minimal(5), 1);
        assert_eq!(dsf.minimal(0), 0);
    }

    #[test]
    fn flip_parity() {
        let mut dsf = Dsf::new_flip(5);
        dsf.union_flip(0, 1, true);
        dsf.union_flip(1, 2, true);
        dsf.union_flip(3, 2, false);

        let (r0, f0) = dsf.find_flip(0);
        let (r2, f2) = dsf.find_flip(2);
        let (r3, f3) = dsf.find_flip(3);
        assert_eq!(r0, r2);
        assert_eq!(r0, r3);
        assert_eq!(f0, f2); // inverted twice
        assert_eq!(f2, f3);
        assert_ne!(dsf.find_flip(1).1, f0);

        // consistent re-statement is fine
        dsf.union_flip(0, 3, false);
    }

    #[test]
    #[should_panic]
    fn flip_inconsistency_panics() {
        let mut dsf = Dsf::new_flip(3);
        dsf.union_flip(0, 1, true);
        dsf.union_flip(0, 1, false);
    }

    #[test]
    fn copy_from_restores_state() {
        let mut a = Dsf::new_min(4);
        a.union(2, 3);
        let mut b = Dsf::new_min(4);
        b.copy_from(&a);
        assert!(b.equivalent(3, 2));
        assert_eq!(b.minimal(3), 2);
        assert_eq!(a, b);
    }
}
