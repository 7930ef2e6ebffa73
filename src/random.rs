//! Thread-local uniform random source.
//!
//! Every thread owns an independent `SmallRng` stream. Streams are seeded
//! from the process seed and a unique stream index, mixed through
//! SplitMix64, so no two threads ever draw from correlated sequences and
//! no generator state is shared between threads.
//!
//! A thread keeps its stream index for its whole lifetime. [`reseed`]
//! starts a new epoch; each thread notices the change on its next draw and
//! re-seeds its own stream, so the same seed replays the same sequence on
//! the same thread.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seed used until [`reseed`] is called.
pub const DEFAULT_SEED: u64 = 0x6C62_272E_07BB_0142;

static SEED: AtomicU64 = AtomicU64::new(DEFAULT_SEED);
static EPOCH: AtomicU64 = AtomicU64::new(0);
static NEXT_STREAM: AtomicU64 = AtomicU64::new(0);

struct Stream {
    epoch: u64,
    id: u64,
    rng: SmallRng,
}

impl Stream {
    fn open() -> Self {
        let id = NEXT_STREAM.fetch_add(1, Ordering::Relaxed);
        let mut stream = Self { epoch: 0, id, rng: stream_rng(DEFAULT_SEED, id) };
        stream.restart();
        stream
    }

    /// Re-seed from the current process seed, keeping the stream index.
    fn restart(&mut self) {
        // Epoch is read before the seed so a concurrent reseed can only
        // trigger another restart, never leave a stale seed in place.
        self.epoch = EPOCH.load(Ordering::Acquire);
        self.rng = stream_rng(SEED.load(Ordering::Acquire), self.id);
    }
}

thread_local! {
    static STREAM: RefCell<Stream> = RefCell::new(Stream::open());
}

/// SplitMix64 finalizer.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Generator for stream `id` under process seed `seed`.
fn stream_rng(seed: u64, id: u64) -> SmallRng {
    SmallRng::seed_from_u64(splitmix64(seed ^ splitmix64(id)))
}

/// Next uniform float in [0, 1) from this thread's stream.
#[inline]
pub fn next() -> f32 {
    STREAM.with(|stream| {
        let mut stream = stream.borrow_mut();
        if stream.epoch != EPOCH.load(Ordering::Acquire) {
            stream.restart();
        }
        stream.rng.gen::<f32>()
    })
}

/// Index of the calling thread's current stream.
pub fn stream_id() -> u64 {
    STREAM.with(|stream| stream.borrow().id)
}

/// Replace the process seed; every thread re-seeds on its next draw.
pub fn reseed(seed: u64) {
    SEED.store(seed, Ordering::Release);
    EPOCH.fetch_add(1, Ordering::AcqRel);
}
