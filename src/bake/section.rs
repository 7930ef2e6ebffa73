//! Exclusive section for serializing whole bake jobs.
//!
//! Baking never locks per point. Hosts that must run a bake together
//! with a post-process step (denoiser device setup, file output) as one
//! unit hold a [`BakeSection`] guard around the sequence.

use parking_lot::{const_mutex, Mutex, MutexGuard};

/// Caller-held mutual exclusion around a bake-plus-postprocess sequence.
pub struct BakeSection {
    lock: Mutex<()>,
}

static GLOBAL: BakeSection = BakeSection::new();

impl BakeSection {
    pub const fn new() -> Self {
        Self { lock: const_mutex(()) }
    }

    /// Process-wide section shared by every host component.
    pub fn global() -> &'static BakeSection {
        &GLOBAL
    }

    /// Block until the section is free. Released when the guard drops.
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Enter only if nobody holds the section.
    pub fn try_enter(&self) -> Option<MutexGuard<'_, ()>> {
        self.lock.try_lock()
    }
}

impl Default for BakeSection {
    fn default() -> Self {
        Self::new()
    }
}
