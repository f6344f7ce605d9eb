/*!
# Rectangle Divvy

Random partitions of a `width x height` rectangle into `width * height / k`
simply connected `k`-ominoes, e.g. the regions of a jigsaw-sudoku or the
rooms of a region-based puzzle.

An attempt seeds every omino with a single random cell and then repeatedly
grows a random incomplete omino by one cell. If no unclaimed cell can be
added directly, a BFS over the *ominoes* looks for a chain of steals: the
growing omino takes a cell from a neighbour, which takes a cell from its own
neighbour, and so on until some omino in the chain can expand into an
unclaimed cell. Every step keeps all ominoes 4-connected and free of holes.
If the BFS finds no such chain, the attempt fails and a new one is started.

Whether a cell may join or leave an omino is decided locally: walk the eight
cells around it in cyclic order and count the changes between "belongs to
the omino" and "does not". The cell is admissible iff it has a 4-neighbour
in the omino and the count is exactly two.

The result is a [`Dsf`] over the cells (`y * width + x`) whose classes are the
ominoes.

# Example
```
use puzgraphs::{algo::*, random::HashRng};

let mut rng = HashRng::from_bytes(b"123456");
let mut dsf = Divvy::new(9, 4, 6).max_attempts(10_000).generate(&mut rng).unwrap();

let classes = dsf.classes();
assert_eq!(classes.len(), 6);
assert!(classes.iter().all(|c| c.len() == 6));
```
*/

use std::collections::VecDeque;

use super::*;

/// The eight cells around a cell in cyclic order; even positions are the 4-neighbours
const RING: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Unclaimed,
    /// Temporarily taken away from its omino while the BFS looks for a replacement
    Stolen,
    Omino(Node),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BfsLink {
    Start,
    /// This omino hands `square` over to `omino`
    GivesTo { omino: Node, square: Node },
}

/// Configurable generator for random omino partitions of a rectangle.
///
/// By default [`Divvy::generate`] retries until an attempt succeeds;
/// [`Divvy::max_attempts`] bounds the number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divvy {
    width: u32,
    height: u32,
    k: u32,
    max_attempts: Option<u64>,
}

impl Divvy {
    /// Creates a generator for `k`-ominoes in a `width x height` rectangle.
    ///
    /// # Panics
    /// If `k == 0` or `k` does not divide `width * height`.
    pub fn new(width: u32, height: u32, k: u32) -> Self {
        let wh = width
            .checked_mul(height)
            .filter(|&wh| wh < INVALID_NODE)
            .expect("Rectangle too large");
        assert!(k > 0 && wh % k == 0, "{k} does not divide {width}x{height}");

        Self {
            width,
            height,
            k,
            max_attempts: None,
        }
    }

    /// Gives up after `attempts` failed attempts
    pub fn max_attempts(mut self, attempts: u64) -> Self {
        self.set_max_attempts(Some(attempts));
        self
    }

    /// Sets the attempt limit; `None` retries forever
    pub fn set_max_attempts(&mut self, attempts: Option<u64>) {
        self.max_attempts = attempts;
    }

    /// Number of ominoes in every partition
    pub fn number_of_ominoes(&self) -> u32 {
        self.width * self.height / self.k
    }

    /// Runs a single attempt. Returns `None` if it got stuck.
    pub fn attempt<R: RandomSource>(&self, rng: &mut R) -> Option<Dsf> {
        DivvyAttempt::new(self, rng).run(rng)
    }

    /// Retries [`Divvy::attempt`] until it succeeds or the attempt limit is reached.
    #[instrument(skip_all)]
    pub fn generate<R: RandomSource>(&self, rng: &mut R) -> Result<Dsf> {
        let mut attempts = 0u64;
        loop {
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(Error::DivvyExhausted {
                    width: self.width,
                    height: self.height,
                    k: self.k,
                    attempts,
                });
            }

            attempts += 1;
            if let Some(dsf) = self.attempt(rng) {
                debug!(
                    width = self.width,
                    height = self.height,
                    k = self.k,
                    attempts,
                    "divided rectangle"
                );
                return Ok(dsf);
            }
            debug!(attempts, "divvy attempt failed");
        }
    }
}

/// Divides a `width x height` rectangle into random `k`-ominoes, retrying until an attempt succeeds.
///
/// # Panics
/// If `k == 0` or `k` does not divide `width * height`.
pub fn divvy_rectangle<R: RandomSource>(width: u32, height: u32, k: u32, rng: &mut R) -> Dsf {
    let divvy = Divvy::new(width, height, k);
    loop {
        if let Some(dsf) = divvy.attempt(rng) {
            return dsf;
        }
        debug!("divvy attempt failed");
    }
}

/// Single attempt of [`divvy_rectangle`]; `None` if the attempt got stuck
pub fn divvy_rectangle_attempt<R: RandomSource>(
    width: u32,
    height: u32,
    k: u32,
    rng: &mut R,
) -> Option<Dsf> {
    Divvy::new(width, height, k).attempt(rng)
}

struct DivvyAttempt {
    grid: GridGraph,
    k: u32,
    n: u32,

    // random cell order for every scan across the grid
    order: Vec<Node>,
    own: Vec<Owner>,
    sizes: Vec<u32>,

    // omino of the neighbour in each of the four directions, if the cell may join it
    addable: Vec<Option<Node>>,
    removable: NodeBitSet,

    links: Vec<Option<BfsLink>>,
    queue: VecDeque<Node>,
    incomplete: Vec<Node>,
}

impl DivvyAttempt {
    fn new<R: RandomSource>(config: &Divvy, rng: &mut R) -> Self {
        let grid = GridGraph::new(config.width, config.height);
        let wh = grid.number_of_nodes();
        let n = wh / config.k;

        let mut order = (0..wh).collect_vec();
        rng.shuffle(&mut order);

        let mut own = vec![Owner::Unclaimed; wh as usize];
        for (i, &cell) in order.iter().take(n as usize).enumerate() {
            own[cell as usize] = Owner::Omino(i as Node);
        }

        Self {
            grid,
            k: config.k,
            n,
            order,
            own,
            sizes: vec![1; n as usize],
            addable: vec![None; 4 * wh as usize],
            removable: NodeBitSet::new(wh),
            links: vec![None; n as usize],
            queue: VecDeque::with_capacity(n as usize),
            incomplete: Vec::with_capacity(n as usize),
        }
    }

    fn run<R: RandomSource>(mut self, rng: &mut R) -> Option<Dsf> {
        loop {
            self.refresh_tables();

            self.incomplete.clear();
            self.incomplete
                .extend((0..self.n).filter(|&i| self.sizes[i as usize] < self.k));
            if self.incomplete.is_empty() {
                break;
            }

            let j = self.incomplete[rng.uniform_upto(self.incomplete.len() as u32) as usize];
            if !self.expand(j) {
                return None;
            }
        }

        Some(self.into_dsf())
    }

    /// Returns *true* if `cell` can join (or leave) omino `val` without
    /// breaking its connectivity or enclosing a hole.
    fn admissible(&self, cell: Node, val: Node) -> bool {
        let ring = RING.map(|(dx, dy)| {
            self.grid
                .offset(cell, dx, dy)
                .is_some_and(|nb| self.own[nb as usize] == Owner::Omino(val))
        });

        if !(ring[0] || ring[2] || ring[4] || ring[6]) {
            return false;
        }

        (0..8).filter(|&d| ring[d] != ring[(d + 1) % 8]).count() == 2
    }

    fn refresh_tables(&mut self) {
        for cell in 0..self.grid.number_of_nodes() {
            let removable = match self.own[cell as usize] {
                Owner::Omino(c) => self.sizes[c as usize] == 1 || self.admissible(cell, c),
                _ => false,
            };
            if removable {
                self.removable.set_bit(cell);
            } else {
                self.removable.clear_bit(cell);
            }

            for (dir, &(dx, dy)) in GRID_DIRECTIONS.iter().enumerate() {
                let entry = self
                    .grid
                    .offset(cell, dx, dy)
                    .and_then(|nb| match self.own[nb as usize] {
                        Owner::Omino(o) => Some(o),
                        _ => None,
                    })
                    .filter(|&o| self.own[cell as usize] != Owner::Omino(o))
                    .filter(|&o| self.admissible(cell, o));

                self.addable[4 * cell as usize + dir] = entry;
            }
        }
    }

    /// Checks the cached table and re-checks against the current (possibly
    /// temporarily modified) ownership.
    fn addable_to(&self, cell: Node, omino: Node) -> bool {
        let cached = &self.addable[4 * cell as usize..4 * cell as usize + 4];
        cached.contains(&Some(omino)) && self.admissible(cell, omino)
    }

    /// Grows omino `start` by one cell, possibly via a chain of steals
    fn expand(&mut self, start: Node) -> bool {
        self.links.fill(None);
        self.links[start as usize] = Some(BfsLink::Start);
        self.queue.clear();
        self.queue.push_back(start);

        while let Some(j) = self.queue.pop_front() {
            let stolen = match self.links[j as usize] {
                Some(BfsLink::GivesTo { square, .. }) => Some(square),
                _ => None,
            };

            if let Some(square) = stolen {
                debug_assert_eq!(self.own[square as usize], Owner::Omino(j));
                self.own[square as usize] = Owner::Stolen;
            }

            if let Some(target) = self.find_unclaimed(j, stolen.is_some()) {
                if let Some(square) = stolen {
                    self.own[square as usize] = Owner::Omino(j);
                }
                self.apply_chain(target, j);
                self.sizes[start as usize] += 1;
                return true;
            }

            self.enqueue_donors(j);

            if let Some(square) = stolen {
                self.own[square as usize] = Owner::Omino(j);
            }
        }

        trace!(start, "no chain of steals found");
        false
    }

    fn find_unclaimed(&self, j: Node, emptied: bool) -> Option<Node> {
        self.order.iter().copied().find(|&cell| {
            self.own[cell as usize] == Owner::Unclaimed
                // a singleton that lost its square may restart anywhere
                && ((emptied && self.sizes[j as usize] == 1) || self.addable_to(cell, j))
        })
    }

    fn enqueue_donors(&mut self, j: Node) {
        for i in 0..self.order.len() {
            let cell = self.order[i];
            let Owner::Omino(donor) = self.own[cell as usize] else {
                continue;
            };

            if self.links[donor as usize].is_some() || !self.removable.get_bit(cell) {
                continue;
            }

            if self.addable_to(cell, j) {
                self.links[donor as usize] = Some(BfsLink::GivesTo {
                    omino: j,
                    square: cell,
                });
                self.queue.push_back(donor);
            }
        }
    }

    /// Hands `cell` to omino `j` and walks the BFS links back to the start,
    /// moving every stolen square to the omino that stole it.
    fn apply_chain(&mut self, mut cell: Node, mut j: Node) {
        let mut steals = 0usize;
        loop {
            self.own[cell as usize] = Owner::Omino(j);
            match self.links[j as usize] {
                Some(BfsLink::GivesTo { omino, square }) => {
                    cell = square;
                    j = omino;
                    steals += 1;
                }
                _ => break,
            }
        }
        trace!(omino = j, steals, "extended omino");
    }

    fn into_dsf(self) -> Dsf {
        let wh = self.grid.number_of_nodes();

        let mut representative = vec![0; self.n as usize];
        let omino_of = |cell: Node| match self.own[cell as usize] {
            Owner::Omino(o) => {
                assert!(o < self.n);
                o
            }
            other => panic!("Cell {cell} left as {other:?}"),
        };

        for cell in 0..wh {
            representative[omino_of(cell) as usize] = cell;
        }

        let mut dsf = Dsf::new(wh);
        for cell in 0..wh {
            dsf.union(cell, representative[omino_of(cell) as usize]);
        }

        // rebuild from 4-adjacency to make sure no omino fell apart
        let mut adjacency = Dsf::new(wh);
        for Edge(u, v) in self.grid.edges(true) {
            if self.own[u as usize] == self.own[v as usize] {
                adjacency.union(u, v);
            }
        }
        for cell in 0..wh {
            let root = dsf.find(cell);
            assert_eq!(
                adjacency.find(root),
                adjacency.find(cell),
                "Omino of cell {cell} is not connected"
            );
        }

        dsf
    }
}

/// Renders the partition in `dsf` of a `width x height` rectangle as ASCII art.
///
/// Boundaries between different classes are drawn with `-`, `|` and `+`.
///
/// ```
/// use puzgraphs::{algo::render_ominoes, utils::Dsf};
///
/// let mut dsf = Dsf::new(4);
/// dsf.union(0, 1);
/// dsf.union(2, 3);
///
/// let expected = "\
/// +-----+
/// |     |
/// +-----+
/// |     |
/// +-----+
/// ";
/// assert_eq!(render_ominoes(2, 2, &mut dsf), expected);
/// ```
pub fn render_ominoes(width: u32, height: u32, dsf: &mut Dsf) -> String {
    assert_eq!(dsf.len(), (width * height) as usize);

    let (w, h) = (width as i64, height as i64);
    let mut out = String::new();

    for y in 0..=2 * h {
        for x in 0..=2 * w {
            let (min_x, min_y) = (x / 2 - 1, y / 2 - 1);

            let mut classes = [None; 4];
            for ty in 0..2 {
                for tx in 0..2 {
                    let (cx, cy) = (min_x + tx, min_y + ty);
                    if (0..w).contains(&cx) && (0..h).contains(&cy) {
                        classes[(2 * ty + tx) as usize] = Some(dsf.find((cy * w + cx) as Node));
                    }
                }
            }

            let piece = match (y % 2, x % 2) {
                (0, 0) => {
                    if classes[0] == classes[1] && classes[1] == classes[2] && classes[2] == classes[3] {
                        " "
                    } else if classes[0] == classes[1] && classes[2] == classes[3] {
                        "-"
                    } else if classes[0] == classes[2] && classes[1] == classes[3] {
                        "|"
                    } else {
                        "+"
                    }
                }
                (0, _) => {
                    if classes[1] == classes[3] {
                        "  "
                    } else {
                        "--"
                    }
                }
                (_, 0) => {
                    if classes[2] == classes[3] {
                        " "
                    } else {
                        "|"
                    }
                }
                _ => "  ",
            };
            out.push_str(piece);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random::HashRng, testing::assert_valid_partition};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn nine_by_four_hexominoes() {
        let mut rng = HashRng::from_bytes(b"123456");
        let divvy = Divvy::new(9, 4, 6).max_attempts(10_000);

        for _ in 0..100 {
            let mut dsf = divvy.generate(&mut rng).unwrap();
            assert_valid_partition(9, 4, 6, &mut dsf);
        }
    }

    #[test]
    fn various_shapes() {
        let rng = &mut Pcg64Mcg::seed_from_u64(42);

        for (w, h, k) in [(1, 1, 1), (4, 4, 1), (5, 5, 5), (6, 6, 4), (7, 3, 3), (8, 5, 10)] {
            for _ in 0..10 {
                let mut dsf = divvy_rectangle(w, h, k, rng);
                assert_valid_partition(w, h, k, &mut dsf);
            }
        }
    }

    #[test]
    fn single_class_covers_everything() {
        let rng = &mut Pcg64Mcg::seed_from_u64(3);
        for (w, h) in [(1, 7), (3, 3), (5, 4)] {
            let mut dsf = divvy_rectangle(w, h, w * h, rng);
            assert_eq!(dsf.classes().len(), 1);
            assert_eq!(dsf.size(0), w * h);
        }
    }

    #[test]
    fn attempts_are_deterministic_per_seed() {
        let divvy = Divvy::new(6, 6, 6);
        let run = |seed: &[u8]| {
            let mut rng = HashRng::from_bytes(seed);
            let mut dsf = divvy.generate(&mut rng).unwrap();
            dsf.classes()
        };
        assert_eq!(run(b"seed"), run(b"seed"));
    }

    #[test]
    fn attempt_limit_is_reported() {
        let rng = &mut Pcg64Mcg::seed_from_u64(1);
        let result = Divvy::new(4, 4, 4).max_attempts(0).generate(rng);
        assert!(matches!(
            result,
            Err(Error::DivvyExhausted { attempts: 0, k: 4, .. })
        ));

        let failures = (0..50)
            .filter(|_| divvy_rectangle_attempt(8, 8, 8, rng).is_none())
            .count();
        assert!(failures < 50);
    }

    #[test]
    #[should_panic]
    fn k_must_divide_area() {
        Divvy::new(3, 3, 2);
    }

    #[test]
    fn admissibility_predicate() {
        // omino 0 is the L shape {0, 1, 3}
        let config = Divvy::new(3, 3, 1);
        let rng = &mut Pcg64Mcg::seed_from_u64(0);
        let mut state = DivvyAttempt::new(&config, rng);
        state.own.fill(Owner::Unclaimed);
        for cell in [0, 1, 3] {
            state.own[cell] = Owner::Omino(0);
        }

        assert!(state.admissible(4, 0));
        assert!(state.admissible(2, 0));
        assert!(!state.admissible(8, 0));

        // a U shape around cell 4: filling the gap at 4 is fine, but with the
        // bottom row also owned, cell 4 would be enclosed
        for cell in [2, 5] {
            state.own[cell] = Owner::Omino(0);
        }
        assert!(state.admissible(4, 0));
        for cell in [6, 7, 8] {
            state.own[cell] = Owner::Omino(0);
        }
        assert!(!state.admissible(4, 0));
    }

    #[test]
    fn render_single_cell_and_strip() {
        let mut dsf = Dsf::new(1);
        assert_eq!(render_ominoes(1, 1, &mut dsf), "+--+\n|  |\n+--+\n");

        let mut dsf = Dsf::new(3);
        dsf.union(0, 1);
        assert_eq!(
            render_ominoes(3, 1, &mut dsf),
            "+-----+--+\n|     |  |\n+-----+--+\n"
        );
    }
}
