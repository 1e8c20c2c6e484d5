//! Deterministic random stream keyed by a seed.
//!
//! Every randomized decision in a generation run is one *draw* from a single
//! [`SeededStream`]. The stream is a totally ordered sequence: skipping or
//! reordering a single draw shifts every value after it, so components take
//! the stream as `&mut dyn RandomStream` and consume it strictly in the order
//! documented in [`pipeline`](crate::pipeline).
//!
//! ## Construction
//!
//! ```text
//! digest = SHA-256(seed ++ ":collage")
//! state  = u32::from_be_bytes(digest[0..4]) / 2^32        // [0, 1)
//! next() = state = (state * 9301 + 49297) mod 233280
//!          return state / 233280
//! ```
//!
//! The recurrence runs on `f64` exactly as written; it is not an integer LCG.
//! That keeps replays bit-identical with previously generated batches.
//!
//! ## The first draw is narrow
//!
//! The initial state is below 1, so the first `next()` is
//! `(state * 9301 + 49297) / 233280`, which always lies in
//! `[0.2113, 0.2512)` whatever the seed. From the second draw on, the state
//! has been multiplied past the modulus and values cover `[0, 1)`. Consumers
//! that need a uniform first decision call [`SeededStream::skip`] first.

use sha2::{Digest, Sha256};

/// Appended to every seed before hashing so the stream never collides with
/// other SHA-256 uses of the same seed string.
const DOMAIN_SUFFIX: &str = ":collage";

const LCG_A: f64 = 9301.0;
const LCG_C: f64 = 49297.0;
const LCG_M: f64 = 233280.0;

/// A source of uniformly distributed draws in `[0, 1)`.
///
/// [`SeededStream`] is the production implementation. Tests substitute a
/// scripted stream to force specific branches (e.g. the stroke threshold).
pub trait RandomStream {
    /// Produce the next draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform value in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform index in `0..n`. Returns 0 for `n == 0` after consuming a draw,
    /// so the draw count never depends on the collection size.
    fn index(&mut self, n: usize) -> usize {
        let v = self.next_f64();
        if n == 0 {
            return 0;
        }
        ((v * n as f64).floor() as usize).min(n - 1)
    }

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// The seeded linear-congruential stream shared by one generation run.
#[derive(Debug, Clone)]
pub struct SeededStream {
    state: f64,
    position: u64,
}

impl SeededStream {
    /// Derive a fresh stream from a seed.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is empty. Seeds are minted by the pipeline, so an
    /// empty one is a programming error rather than a runtime condition.
    pub fn derive(seed: &str) -> Self {
        assert!(!seed.is_empty(), "seed must not be empty");
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(DOMAIN_SUFFIX.as_bytes());
        let digest = hasher.finalize();
        let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Self::from_state(f64::from(prefix) / 4_294_967_296.0)
    }

    /// Start a stream from a normalized state in `[0, 1)`.
    ///
    /// Used for child streams (grain noise) seeded by a single captured draw,
    /// so per-pixel randomness never consumes the run's main stream.
    pub fn from_state(state: f64) -> Self {
        Self { state, position: 0 }
    }

    /// Advance past `n` draws without using them.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.next_f64();
        }
    }

    /// Number of draws consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl RandomStream for SeededStream {
    fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_A + LCG_C) % LCG_M;
        self.position += 1;
        self.state / LCG_M
    }
}

/// Fisher-Yates shuffle driven by the stream, one draw per swap step.
///
/// Walks `i` from the last index down to 1 and swaps with
/// `floor(next() * (i + 1))`, consuming exactly `len - 1` draws.
pub fn shuffle<T>(items: &mut [T], stream: &mut dyn RandomStream) {
    for i in (1..items.len()).rev() {
        let j = stream.index(i + 1);
        items.swap(i, j);
    }
}

/// Mint a new random seed: 16 bytes of OS-seeded randomness, hex-encoded.
pub fn generate_seed() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Reproducible seed for instance `n` of a prefixed batch.
pub fn prefixed_seed(prefix: &str, instance: u32) -> String {
    format!("{}_{}", prefix, instance)
}
