//! Per-key minimum spacing between upstream attempts
//!
//! Each key owns an async mutex around the time of its last attempt. A caller
//! holds that mutex for the whole check, sleep and record sequence, so
//! overlapping callers for one key line up one interval apart instead of all
//! computing the same deadline. Distinct keys never wait on each other.
//!
//! The record table is bounded softly: once it holds `max_tracked_keys`
//! records, a new key triggers a sweep of idle cooled-down records. A sweep
//! that frees nothing is not repeated for one interval, so the table may
//! grow past the bound in the meantime.

use crate::cache::CacheKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

type Slot = Arc<tokio::sync::Mutex<Option<Instant>>>;

#[derive(Default)]
struct Records {
    slots: HashMap<CacheKey, Slot>,
    /// Earliest time the next full-table sweep may run
    next_sweep: Option<Instant>,
}

/// Default bound on tracked keys before idle records are swept
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

/// Per-key cooldown throttle
///
/// Waiting is a tokio timer, so a cooling-down request does not pin a thread
/// and is cancelled with its future.
pub struct CooldownGate {
    interval: Duration,
    max_tracked_keys: usize,
    records: Mutex<Records>,
}

impl CooldownGate {
    pub fn new(interval: Duration) -> Self {
        Self::with_max_tracked_keys(interval, DEFAULT_MAX_TRACKED_KEYS)
    }

    pub fn with_max_tracked_keys(interval: Duration, max_tracked_keys: usize) -> Self {
        Self { interval, max_tracked_keys, records: Mutex::new(Records::default()) }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_tracked_keys(&self) -> usize {
        self.max_tracked_keys
    }

    fn lock_records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch or create the slot for `key`, sweeping first if the table is full
    fn slot(&self, key: &CacheKey) -> Slot {
        let mut records = self.lock_records();
        let full = records.slots.len() >= self.max_tracked_keys;
        if full && !records.slots.contains_key(key) {
            let now = Instant::now();
            if records.next_sweep.map_or(true, |at| now >= at) {
                let swept = Self::sweep_locked(&mut records.slots, self.interval);
                if swept > 0 {
                    log::debug!("Cooldown table full, swept {} idle records", swept);
                    records.next_sweep = None;
                } else {
                    // Every fresh record cools down within one interval
                    records.next_sweep = Some(now + self.interval);
                }
            }
        }
        Arc::clone(records.slots.entry(key.clone()).or_default())
    }

    /// Wait until `key` may be attempted again, then record the attempt
    ///
    /// Returns how long the caller was delayed. The attempt time is recorded
    /// when the caller is released, not when it arrived. If the future is
    /// dropped while waiting, nothing is recorded.
    pub async fn wait(&self, key: &CacheKey) -> Duration {
        let slot = self.slot(key);
        let mut last_attempt = slot.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last_attempt {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                waited = self.interval - elapsed;
                log::debug!("Cooling down {} for {:?}", key, waited);
                tokio::time::sleep(waited).await;
            }
        }

        *last_attempt = Some(Instant::now());
        waited
    }

    /// Time left before `key` may be attempted without waiting
    pub fn remaining(&self, key: &CacheKey) -> Duration {
        let slot = match self.lock_records().slots.get(key) {
            Some(slot) => Arc::clone(slot),
            None => return Duration::ZERO,
        };
        // A caller mid-wait will record a fresh attempt when released
        let last_attempt = match slot.try_lock() {
            Ok(guard) => *guard,
            Err(_) => return self.interval,
        };
        match last_attempt {
            Some(previous) => self.interval.saturating_sub(previous.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Number of keys with a recorded attempt
    pub fn tracked_keys(&self) -> usize {
        self.lock_records().slots.len()
    }

    /// Forget records nobody is using whose cooldown has fully elapsed
    ///
    /// Such a record behaves exactly like a missing one, so sweeping never
    /// lets an attempt through early.
    pub fn sweep(&self) -> usize {
        let mut records = self.lock_records();
        records.next_sweep = None;
        Self::sweep_locked(&mut records.slots, self.interval)
    }

    fn sweep_locked(records: &mut HashMap<CacheKey, Slot>, interval: Duration) -> usize {
        let before = records.len();
        records.retain(|_, slot| {
            // Someone holds a clone: waiting or about to lock
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(guard) => match *guard {
                    Some(previous) => previous.elapsed() < interval,
                    None => false,
                },
                Err(_) => true,
            }
        });
        before - records.len()
    }
}
