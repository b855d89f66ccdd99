use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Convergent merge of two replicas of the same value.
///
/// Implementations must be commutative, associative and idempotent.
pub trait Join {
    fn join(&mut self, other: &Self);
}

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Orders concurrent writes to one field: later timestamp wins, then the
/// higher write sequence, then the origin node id.
///
/// Every stamp issued by a process carries a fresh sequence number, so two
/// writes from one node never compare equal even within one millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionStamp {
    pub timestamp_ms: i64,
    #[serde(default)]
    pub sequence: u64,
    pub origin: Uuid,
}

impl VersionStamp {
    pub fn now(origin: Uuid) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            sequence: next_sequence(),
            origin,
        }
    }

    /// A stamp that sorts strictly after `self`, even if the clock went backwards.
    pub fn successor(&self, origin: Uuid) -> Self {
        let now = Utc::now().timestamp_millis();
        let timestamp_ms = now.max(self.timestamp_ms.saturating_add(1));
        let mut sequence = next_sequence();
        if timestamp_ms == self.timestamp_ms {
            // The clock is pinned at i64::MAX; order by sequence alone.
            sequence = sequence.max(self.sequence.saturating_add(1));
        }
        Self {
            timestamp_ms,
            sequence,
            origin,
        }
    }
}

/// A field carrying the version of its last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    value: T,
    stamp: VersionStamp,
}

impl<T> Versioned<T> {
    pub fn new(value: T, origin: Uuid) -> Self {
        Self {
            value,
            stamp: VersionStamp::now(origin),
        }
    }

    pub fn with_stamp(value: T, stamp: VersionStamp) -> Self {
        Self { value, stamp }
    }

    pub fn get_ref(&self) -> &T {
        &self.value
    }

    pub fn stamp(&self) -> VersionStamp {
        self.stamp
    }

    /// Overwrites the value and advances the version past the current one.
    pub fn set(&mut self, value: T, origin: Uuid) {
        self.stamp = self.stamp.successor(origin);
        self.value = value;
    }
}

impl<T: Clone> Join for Versioned<T> {
    fn join(&mut self, other: &Self) {
        if other.stamp > self.stamp {
            self.value = other.value.clone();
            self.stamp = other.stamp;
        }
    }
}

/// A record that can be tombstoned. Once deleted it stays deleted: a
/// tombstone absorbs every live version it is joined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum Deletable<T> {
    Live(T),
    Deleted,
}

impl<T> Deletable<T> {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Deletable::Deleted)
    }

    pub fn get_ref(&self) -> Option<&T> {
        match self {
            Deletable::Live(value) => Some(value),
            Deletable::Deleted => None,
        }
    }

    pub fn get_mutable(&mut self) -> Option<&mut T> {
        match self {
            Deletable::Live(value) => Some(value),
            Deletable::Deleted => None,
        }
    }

    pub fn mark_deleted(&mut self) {
        *self = Deletable::Deleted;
    }
}

impl<T: Join + Clone> Join for Deletable<T> {
    fn join(&mut self, other: &Self) {
        match (self.is_deleted(), other) {
            (true, _) => {}
            (false, Deletable::Deleted) => self.mark_deleted(),
            (false, Deletable::Live(theirs)) => {
                if let Some(ours) = self.get_mutable() {
                    ours.join(theirs);
                }
            }
        }
    }
}
