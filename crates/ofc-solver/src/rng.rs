//! Deterministic search RNG.
//!
//! SplitMix64 keeps a single u64 of state, which makes per-worker streams
//! cheap to derive and search traces reproducible from `(seed, workers)`.

use rand_core::{Error, RngCore, SeedableRng};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline(always)]
    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

impl RngCore for SplitMix64 {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

/// Derive the stream for one worker from the root seed. Distinct workers get
/// well-separated states; worker 0 with one thread reproduces the
/// single-threaded trace.
pub fn worker_stream(root_seed: u64, worker: usize) -> SplitMix64 {
    let mut mixer = SplitMix64::new(root_seed ^ (worker as u64).wrapping_mul(GOLDEN_GAMMA));
    let state = mixer.next_u64();
    if worker == 0 {
        SplitMix64::new(root_seed)
    } else {
        SplitMix64::new(state)
    }
}
