// zahroflow/src/keyed_lock.rs

//! Async single-writer sections keyed by an identifier.
//!
//! `KeyedLocks<K>` hands out one `tokio` mutex per key, so work on different
//! keys proceeds in parallel while work on the same key is serialized. Slots
//! that nobody holds or waits on are pruned on the next acquisition.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{event, Level};

pub struct KeyedLocks<K> {
  slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of a single-writer section; releases on drop.
#[derive(Debug)]
pub struct KeyedGuard<K> {
  key: K,
  _guard: OwnedMutexGuard<()>,
}

impl<K> KeyedGuard<K> {
  pub fn key(&self) -> &K {
    &self.key
  }
}

impl<K> KeyedLocks<K>
where
  K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      slots: Mutex::new(HashMap::new()),
    }
  }

  /// Waits until no other holder of `key` remains, then returns the guard.
  pub async fn acquire(&self, key: K) -> KeyedGuard<K> {
    let slot = {
      let mut slots = self.slots.lock();
      // A count of 1 means only the table references the slot.
      slots.retain(|_, slot| Arc::strong_count(slot) > 1);
      Arc::clone(slots.entry(key.clone()).or_default())
    };
    event!(Level::TRACE, ?key, "Waiting for keyed lock.");
    let guard = slot.lock_owned().await;
    KeyedGuard { key, _guard: guard }
  }

  /// Returns the guard only if nobody currently holds `key`.
  pub fn try_acquire(&self, key: K) -> Option<KeyedGuard<K>> {
    let slot = {
      let mut slots = self.slots.lock();
      Arc::clone(slots.entry(key.clone()).or_default())
    };
    slot.try_lock_owned().ok().map(|guard| KeyedGuard { key, _guard: guard })
  }

  /// Number of keys with a live slot.
  pub fn active_keys(&self) -> usize {
    self
      .slots
      .lock()
      .values()
      .filter(|slot| Arc::strong_count(slot) > 1)
      .count()
  }
}

impl<K> Default for KeyedLocks<K>
where
  K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
