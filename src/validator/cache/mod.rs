//! TTL cache of validation verdicts keyed by the raw input string.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::ValidationOutcome;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_SWEEP_EVERY: u64 = 100;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Intended for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

struct CacheEntry {
    outcome: ValidationOutcome,
    expires_at: Instant,
}

/// State shared with the background sweep thread.
struct CacheShared {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Bumped by every `clear`, under the entries write lock.
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
    sweep_in_flight: AtomicBool,
}

impl CacheShared {
    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }
}

/// Clears the in-flight flag even if the sweep panics.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Memoized verdicts with an absolute per-entry TTL.
///
/// Expiry is checked on every read, so an expired entry is never returned
/// even if no sweep has removed it yet. Every `sweep_every`-th insertion
/// starts a background sweep; at most one sweep runs at a time and the
/// inserting caller never waits for it.
pub struct ValidationCache {
    shared: Arc<CacheShared>,
    ttl: Duration,
    sweep_every: u64,
    inserts: AtomicU64,
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_SWEEP_EVERY)
    }
}

impl ValidationCache {
    pub fn new(ttl: Duration, sweep_every: u64) -> Self {
        Self::with_clock(ttl, sweep_every, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, sweep_every: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                entries: RwLock::new(HashMap::new()),
                generation: AtomicU64::new(0),
                clock,
                sweep_in_flight: AtomicBool::new(false),
            }),
            ttl,
            sweep_every: sweep_every.max(1),
            inserts: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached verdict for `key`, if present and not yet expired.
    pub fn get(&self, key: &str) -> Option<ValidationOutcome> {
        let now = self.shared.clock.now();
        let entries = self
            .shared
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.outcome.clone())
    }

    /// Insert or overwrite the verdict for `key`, expiring `ttl` from now.
    pub fn set(&self, key: &str, outcome: ValidationOutcome) {
        let expires_at = self.shared.clock.now() + self.ttl;
        {
            let mut entries = self
                .shared
                .entries
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            entries.insert(
                key.to_string(),
                CacheEntry {
                    outcome,
                    expires_at,
                },
            );
        }
        self.count_insert();
    }

    /// Current clear generation. Pass it to [`ValidationCache::set_if_current`]
    /// to drop a verdict computed across a `clear`.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Like [`ValidationCache::set`], but only if the cache has not been
    /// cleared since `generation` was read. Returns whether it was stored.
    pub fn set_if_current(&self, key: &str, outcome: ValidationOutcome, generation: u64) -> bool {
        let expires_at = self.shared.clock.now() + self.ttl;
        {
            let mut entries = self
                .shared
                .entries
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if self.shared.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            entries.insert(
                key.to_string(),
                CacheEntry {
                    outcome,
                    expires_at,
                },
            );
        }
        self.count_insert();
        true
    }

    fn count_insert(&self) {
        let count = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.sweep_every == 0 {
            self.spawn_sweep();
        }
    }

    /// Remove expired entries now, on the calling thread.
    pub fn sweep_expired(&self) -> usize {
        self.shared.sweep()
    }

    /// Whether a background sweep is currently running.
    pub fn sweep_in_flight(&self) -> bool {
        self.shared.sweep_in_flight.load(Ordering::Acquire)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        let mut entries = self
            .shared
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    fn spawn_sweep(&self) {
        if self
            .shared
            .sweep_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("cache sweep already in flight, skipping");
            return;
        }

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("linkguard-cache-sweep".into())
            .spawn(move || {
                let _guard = SweepGuard(&shared.sweep_in_flight);
                let removed = shared.sweep();
                debug!("cache sweep removed {} expired entries", removed);
            });

        if let Err(e) = spawned {
            self.shared.sweep_in_flight.store(false, Ordering::Release);
            warn!("failed to spawn cache sweep thread: {}", e);
        }
    }
}
