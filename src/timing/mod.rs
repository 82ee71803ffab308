//! Elapsed-time ticker for the recording counter
//!
//! The counter is recomputed from the wall-clock delta on every tick rather
//! than incremented, so a late or skipped tick does not make it drift.

use crate::errors::CameraError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const SECONDS_MASK: u64 = u32::MAX as u64;

/// Shared view of the elapsed seconds
///
/// Generation and seconds live in one atomic word (generation in the high
/// half), so a ticker holding an old generation can never write after a
/// reset has gone through.
#[derive(Debug, Clone, Default)]
pub struct ElapsedCounter {
    word: Arc<AtomicU64>,
}

impl ElapsedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.word.load(Ordering::Acquire) & SECONDS_MASK
    }

    /// Zero the counter and detach any ticker still writing to it.
    /// Returns the new generation.
    pub fn reset(&self) -> u32 {
        let previous = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                Some(pack(generation_of(word).wrapping_add(1), 0))
            })
            .unwrap_or_else(|word| word);
        generation_of(previous).wrapping_add(1)
    }

    /// Only ever moves forward, and only for the current generation
    fn advance_to(&self, generation: u32, value: u64) {
        let value = value.min(SECONDS_MASK);
        let _ = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                (generation_of(word) == generation && word & SECONDS_MASK < value)
                    .then(|| pack(generation, value))
            });
    }
}

#[inline]
fn generation_of(word: u64) -> u32 {
    (word >> 32) as u32
}

#[inline]
fn pack(generation: u32, seconds: u64) -> u64 {
    (u64::from(generation) << 32) | (seconds & SECONDS_MASK)
}

/// A repeating tick task bound to one recording
///
/// Dropping the ticker aborts the task.
#[derive(Debug)]
pub struct ElapsedTicker {
    handle: JoinHandle<()>,
    started: Instant,
}

impl ElapsedTicker {
    /// Reset `counter` to 0 and start ticking every `period` on the
    /// current tokio runtime.
    pub fn start(counter: ElapsedCounter, period: Duration) -> Result<Self, CameraError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            CameraError::InitializationError(format!("Elapsed ticker needs a tokio runtime: {}", e))
        })?;
        let generation = counter.reset();
        let started = Instant::now();
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(started + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                counter.advance_to(generation, started.elapsed().as_secs());
            }
        });
        log::debug!("Elapsed ticker started ({:?} period)", period);
        Ok(Self { handle, started })
    }

    /// Seconds since the ticker started, independent of tick delivery
    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn cancel(self) {
        // Drop does the work
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.handle.abort();
        log::debug!("Elapsed ticker cancelled");
    }
}
