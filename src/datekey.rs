//! Date key derivation for the daily cache.
//!
//! A date key is the `YYYY-MM-DD` rendering of an instant at a fixed,
//! configured UTC offset. The key doubles as the cache lookup key (prefixed
//! with `daily:` by the cache) and as the freshness comparator: a record is
//! fresh iff re-deriving a key from its creation timestamp yields the key
//! it was stored under.
//!
//! The offset is explicit configuration rather than the ambient system
//! timezone, so write-side and read-side derivations always agree and the
//! freshness check stays reproducible in tests.

use chrono::{DateTime, FixedOffset, Utc};

/// Derives calendar-day cache keys at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct DateKeyer {
    offset: FixedOffset,
}

impl DateKeyer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build a keyer from a whole-hour UTC offset; `None` when the offset
    /// is out of range (beyond +-23 hours).
    pub fn from_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }

    /// Derive the key for an arbitrary instant. Pure and total: any two
    /// instants falling on the same calendar day at the configured offset
    /// produce equal keys.
    pub fn key_for(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// The key for the current instant.
    pub fn today(&self) -> String {
        self.key_for(Utc::now())
    }
}
