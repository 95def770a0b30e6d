//! Timestamped value samples.

use crate::error::Result;
use crate::span::TimeSpan;
use crate::value::TemporalValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable timestamped sample, the smallest temporal value.
///
/// Two instants are equal iff they carry the same timestamp and the same
/// value under the base type's equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TInstant<V: TemporalValue> {
    value: V,
    timestamp: DateTime<Utc>,
}

impl<V: TemporalValue> TInstant<V> {
    pub fn new(value: V, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The instant's (degenerate) time extent.
    pub fn time_span(&self) -> Result<TimeSpan> {
        TimeSpan::new(self.timestamp, self.timestamp, true, true)
    }

    /// Consume the instant, returning its parts.
    pub fn into_parts(self) -> (V, DateTime<Utc>) {
        (self.value, self.timestamp)
    }

    /// A new instant with the same timestamp and a mapped value.
    pub fn map<R: TemporalValue>(&self, f: impl FnOnce(&V) -> R) -> TInstant<R> {
        TInstant::new(f(&self.value), self.timestamp)
    }
}
