/*!
# Random Sources

All randomised algorithms in this crate only need two primitives: a uniform
integer below a bound and an in-place shuffle. Both are bundled in the
[`RandomSource`] trait, which is implemented for every [`rand::Rng`], so any
generator from the `rand` ecosystem can be passed in directly.

[`HashRng`] is a deterministic generator that accepts an arbitrary byte string
as seed. It is meant for puzzle generation, where the same seed string has to
reproduce the same puzzle on every platform.

# Example
```
use puzgraphs::random::{HashRng, RandomSource};

let mut a = HashRng::from_bytes(b"12345");
let mut b = HashRng::from_bytes(b"12345");

let mut xs = [0, 1, 2, 3, 4, 5, 6, 7];
let mut ys = xs;
a.shuffle(&mut xs);
b.shuffle(&mut ys);
assert_eq!(xs, ys);

assert!(a.uniform_upto(6) < 6);
```
*/

use ::digest::Digest;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;

/// Source of randomness used by the randomised algorithms of this crate
pub trait RandomSource {
    /// Returns a uniformly distributed integer in `0..n`.
    ///
    /// # Panics
    /// If `n == 0`.
    fn uniform_upto(&mut self, n: u32) -> u32;

    /// Permutes `items` uniformly at random (Fisher-Yates, back to front)
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.uniform_upto(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl<R> RandomSource for R
where
    R: Rng + ?Sized,
{
    #[inline]
    fn uniform_upto(&mut self, n: u32) -> u32 {
        assert!(n >= 1, "uniform_upto needs a non-empty range");
        self.random_range(0..n)
    }
}

const DIGEST_LEN: usize = 32;

/// Deterministic generator seeded by an arbitrary byte string.
///
/// The seed is hashed into a seed buffer; output is produced by hashing the
/// buffer, and the buffer is incremented as a little-endian counter every
/// time a block of output has been consumed.
#[derive(Clone, Debug)]
pub struct HashRng {
    seed_buf: [u8; 2 * DIGEST_LEN],
    data_buf: [u8; DIGEST_LEN],
    pos: usize,
}

impl HashRng {
    /// Creates a generator from an arbitrary seed string
    pub fn from_bytes(seed: &[u8]) -> Self {
        let first = Sha256::digest(seed);
        let second = Sha256::digest(first);

        let mut seed_buf = [0u8; 2 * DIGEST_LEN];
        seed_buf[..DIGEST_LEN].copy_from_slice(&first);
        seed_buf[DIGEST_LEN..].copy_from_slice(&second);

        let mut data_buf = [0u8; DIGEST_LEN];
        data_buf.copy_from_slice(&Sha256::digest(seed_buf));

        Self {
            seed_buf,
            data_buf,
            pos: 0,
        }
    }

    fn refill(&mut self) {
        for byte in self.seed_buf.iter_mut() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
        self.data_buf.copy_from_slice(&Sha256::digest(self.seed_buf));
        self.pos = 0;
    }

    #[inline]
    fn next_byte(&mut self) -> u8 {
        if self.pos >= DIGEST_LEN {
            self.refill();
        }
        let byte = self.data_buf[self.pos];
        self.pos += 1;
        byte
    }

    /// Returns `bits` random bits as the low bits of the result.
    ///
    /// Bytes are assembled big-endian and the result is masked to `bits`.
    ///
    /// # Panics
    /// If `bits` is not in `1..=32`.
    pub fn random_bits(&mut self, bits: u32) -> u32 {
        assert!((1..=32).contains(&bits), "random_bits supports 1 to 32 bits");

        let mut ret: u64 = 0;
        for _ in (0..bits).step_by(8) {
            ret = (ret << 8) | self.next_byte() as u64;
        }

        (ret & ((1u64 << bits) - 1)) as u32
    }
}

impl RngCore for HashRng {
    fn next_u32(&mut self) -> u32 {
        self.random_bits(32)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst.iter_mut() {
            *byte = self.next_byte();
        }
    }
}

impl SeedableRng for HashRng {
    type Seed = [u8; DIGEST_LEN];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::from_bytes(&seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn hash_rng_is_deterministic() {
        let mut a = HashRng::from_bytes(b"puzzle seed");
        let mut b = HashRng::from_bytes(b"puzzle seed");
        let mut c = HashRng::from_bytes(b"puzzle seeds");

        let xs = (0..100).map(|_| a.next_u32()).collect_vec();
        let ys = (0..100).map(|_| b.next_u32()).collect_vec();
        let zs = (0..100).map(|_| c.next_u32()).collect_vec();

        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn random_bits_respects_width() {
        let mut rng = HashRng::from_bytes(b"");
        for bits in 1..=32 {
            for _ in 0..20 {
                let x = rng.random_bits(bits) as u64;
                assert!(x < (1u64 << bits));
            }
        }
    }

    #[test]
    fn counter_crosses_block_boundary() {
        let mut rng = HashRng::from_seed([7; 32]);
        let mut bytes = [0u8; 3 * DIGEST_LEN + 5];
        rng.fill_bytes(&mut bytes);

        // consecutive blocks come from different counter values
        assert_ne!(bytes[..DIGEST_LEN], bytes[DIGEST_LEN..2 * DIGEST_LEN]);
    }

    #[test]
    fn uniform_upto_hits_whole_range() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        let mut seen = [false; 7];
        for _ in 0..500 {
            seen[rng.uniform_upto(7) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));

        let mut hash_rng = HashRng::from_bytes(b"1");
        assert!((0..100).all(|_| hash_rng.uniform_upto(1) == 0));
    }

    #[test]
    #[should_panic]
    fn uniform_upto_zero_panics() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        rng.uniform_upto(0);
    }

    /// Always answers `value` and records every bound it was asked for
    struct RecordingSource {
        value: u32,
        bounds: Vec<u32>,
    }

    impl RandomSource for RecordingSource {
        fn uniform_upto(&mut self, n: u32) -> u32 {
            self.bounds.push(n);
            self.value.min(n - 1)
        }
    }

    #[test]
    fn shuffle_runs_back_to_front() {
        let mut source = RecordingSource {
            value: 0,
            bounds: Vec::new(),
        };
        let mut items = [0, 1, 2, 3];
        source.shuffle(&mut items);

        assert_eq!(source.bounds, vec![4, 3, 2]);
        assert_eq!(items, [1, 2, 3, 0]);

        // always picking the last candidate leaves every element in place
        let mut source = RecordingSource {
            value: u32::MAX,
            bounds: Vec::new(),
        };
        let mut items = [10, 20, 30, 40, 50];
        source.shuffle(&mut items);

        assert_eq!(source.bounds, vec![5, 4, 3, 2]);
        assert_eq!(items, [10, 20, 30, 40, 50]);

        // nothing to draw for fewer than two elements
        source.bounds.clear();
        source.shuffle(&mut [7][..]);
        source.shuffle::<u8>(&mut [][..]);
        assert!(source.bounds.is_empty());
    }

    #[test]
    fn shuffle_is_permutation() {
        let rng = &mut Pcg64Mcg::seed_from_u64(1);
        for len in [0usize, 1, 2, 10, 100] {
            let mut items = (0..len).collect_vec();
            rng.shuffle(&mut items);
            assert_eq!(items.iter().copied().sorted().collect_vec(), (0..len).collect_vec());
        }
    }
}
