//! Interpolation semantics and the turning-point seam.
//!
//! Each interpolation mode defines how a value is derived between two
//! recorded instants: discrete sequences are undefined between instants,
//! step sequences hold the previous value, linear sequences delegate to the
//! base type's own interpolation.
//!
//! Turning points are the single seam through which condition-specific
//! numeric algebra (distance thresholds, segment intersection, extrema)
//! plugs into the generic lifting engine: a capability examines one segment
//! (or a synchronized pair of segments) and reports the instants strictly
//! inside it where the derived condition changes.

use crate::value::TemporalValue;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Tolerance on interpolation fractions when deciding whether a computed
/// root coincides with a segment boundary or with another root.
pub(crate) const EPSILON: f64 = 1e-12;

/// How values are derived between the recorded instants of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Defined only at the instants themselves.
    Discrete,
    /// The most recent preceding instant's value holds until the next one.
    Step,
    /// The base type's interpolation of the two endpoint values.
    #[default]
    Linear,
}

impl Interpolation {
    /// Whether values exist between instants (step or linear).
    pub fn is_continuous(self) -> bool {
        !matches!(self, Interpolation::Discrete)
    }
}

/// Timestamp at `fraction` of the way through `[lower, upper]`.
pub fn timestamp_at_fraction(
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    fraction: f64,
) -> DateTime<Utc> {
    let total = (upper - lower).num_microseconds().unwrap_or(i64::MAX) as f64;
    lower + TimeDelta::microseconds((total * fraction).round() as i64)
}

/// Fraction of the way through `[lower, upper]` at which `at` falls.
pub fn fraction_at_timestamp(
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    at: DateTime<Utc>,
) -> f64 {
    let total = (upper - lower).num_microseconds().unwrap_or(i64::MAX) as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let elapsed = (at - lower).num_microseconds().unwrap_or(i64::MAX) as f64;
    (elapsed / total).clamp(0.0, 1.0)
}

/// Value of one segment at timestamp `at`.
///
/// The segment runs from `start` at `lower` to `end` at `upper`. For
/// discrete interpolation the value is only defined at the two instants;
/// the engine never samples a discrete segment in between.
pub fn segment_value<V: TemporalValue>(
    start: &V,
    end: &V,
    interp: Interpolation,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    at: DateTime<Utc>,
) -> V {
    match interp {
        Interpolation::Discrete | Interpolation::Step => {
            if at >= upper {
                end.clone()
            } else {
                start.clone()
            }
        }
        Interpolation::Linear => {
            if at <= lower {
                start.clone()
            } else if at >= upper {
                end.clone()
            } else {
                V::interpolate(start, end, fraction_at_timestamp(lower, upper, at))
            }
        }
    }
}

/// Result of a turning-point search over one segment.
///
/// Carries zero, one, or two timestamps `t1 <= t2`. In the two-root case
/// `inside` reports the derived boolean value strictly between the roots;
/// callers must use it rather than re-deriving the orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct TurningPoints {
    pub times: SmallVec<[DateTime<Utc>; 2]>,
    pub inside: Option<bool>,
}

impl TurningPoints {
    /// No turning point inside the segment.
    pub fn none() -> Self {
        Self {
            times: SmallVec::new(),
            inside: None,
        }
    }

    /// A single turning point.
    pub fn one(t: DateTime<Utc>) -> Self {
        Self {
            times: SmallVec::from_slice(&[t]),
            inside: None,
        }
    }

    /// A pair of turning points with the condition value between them.
    ///
    /// Two analytic roots that collapse to the same timestamp are emitted
    /// as a single turning point.
    pub fn pair(t1: DateTime<Utc>, t2: DateTime<Utc>, inside: bool) -> Self {
        let (t1, t2) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        if t1 == t2 {
            return Self::one(t1);
        }
        Self {
            times: SmallVec::from_slice(&[t1, t2]),
            inside: Some(inside),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Apply the segment-bound rule: a root at an inclusive bound coincides
    /// with an existing instant and is dropped; a root at an exclusive bound
    /// must be materialized and is kept.
    pub(crate) fn clamp_to_bounds(
        mut self,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
        lower_inc: bool,
        upper_inc: bool,
    ) -> Self {
        self.times
            .retain(|t| (*t != lower || !lower_inc) && (*t != upper || !upper_inc));
        if self.times.len() < 2 {
            self.inside = None;
        }
        self
    }
}

/// Turning-point capability over one temporal argument's segment.
pub trait SegmentTurn<V: TemporalValue> {
    fn turning_points(
        &self,
        start: &V,
        end: &V,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> TurningPoints;
}

impl<V, F> SegmentTurn<V> for F
where
    V: TemporalValue,
    F: Fn(&V, &V, DateTime<Utc>, DateTime<Utc>) -> TurningPoints,
{
    fn turning_points(
        &self,
        start: &V,
        end: &V,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> TurningPoints {
        self(start, end, lower, upper)
    }
}

/// Turning-point capability over a synchronized pair of segments.
pub trait SyncTurn<A: TemporalValue, B: TemporalValue> {
    #[allow(clippy::too_many_arguments)]
    fn turning_points(
        &self,
        a_start: &A,
        a_end: &A,
        b_start: &B,
        b_end: &B,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> TurningPoints;
}

impl<A, B, F> SyncTurn<A, B> for F
where
    A: TemporalValue,
    B: TemporalValue,
    F: Fn(&A, &A, &B, &B, DateTime<Utc>, DateTime<Utc>) -> TurningPoints,
{
    fn turning_points(
        &self,
        a_start: &A,
        a_end: &A,
        b_start: &B,
        b_end: &B,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> TurningPoints {
        self(a_start, a_end, b_start, b_end, lower, upper)
    }
}
