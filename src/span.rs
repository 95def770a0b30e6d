//! Ordered-interval arithmetic over comparable base domains.
//!
//! A [`Span`] is a bounded interval `(lower, upper)` with independently
//! inclusive or exclusive endpoints, generic over the domain type. Spans are
//! used both for time extents (timestamp spans) and for value extents
//! (integer/float spans acting as bounding boxes of temporal numbers).
//!
//! Discrete domains (integers, dates) are canonicalized on construction to
//! the `[lower, upper)` form, so two spans denoting the same set of values
//! always compare equal: `[1, 3]` and `[1, 4)` are the same integer span.

use crate::error::{Result, TemporaError};
use crate::spanset::SpanSet;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// A span over timestamps, the time extent of every temporal value.
pub type TimeSpan = Span<DateTime<Utc>>;

/// A totally ordered domain usable as a span bound.
///
/// Implemented for `i64`, `f64`, `chrono::NaiveDate`, and
/// `chrono::DateTime<Utc>`. Discrete domains report `DISCRETE = true` and
/// provide successor/predecessor so span bounds can be canonicalized.
pub trait SpanBound: Copy + PartialOrd + PartialEq + std::fmt::Debug {
    /// Whether the domain is discrete (integers, dates) rather than
    /// continuous (floats, timestamps).
    const DISCRETE: bool;

    /// Short domain name used in diagnostics.
    const NAME: &'static str;

    /// The next representable value. Only called on discrete domains;
    /// fails when the domain runs out of representable values.
    fn successor(self) -> Result<Self>;

    /// The previous representable value. Only called on discrete domains.
    fn predecessor(self) -> Result<Self>;

    /// Distance between two values in domain units.
    fn distance(self, other: Self) -> f64;

    /// Whether the value is usable as a bound (finite, in range).
    fn is_valid_bound(&self) -> bool {
        true
    }

    /// Render the bound for the textual form.
    fn format_bound(&self) -> String;

    /// Parse the bound from its textual form.
    fn parse_bound(s: &str) -> Result<Self>;
}

impl SpanBound for i64 {
    const DISCRETE: bool = true;
    const NAME: &'static str = "int";

    fn successor(self) -> Result<Self> {
        self.checked_add(1).ok_or_else(|| {
            TemporaError::ValueOutOfRange(format!("integer span bound overflow above {}", self))
        })
    }

    fn predecessor(self) -> Result<Self> {
        self.checked_sub(1).ok_or_else(|| {
            TemporaError::ValueOutOfRange(format!("integer span bound overflow below {}", self))
        })
    }

    fn distance(self, other: Self) -> f64 {
        (other as f64 - self as f64).abs()
    }

    fn format_bound(&self) -> String {
        self.to_string()
    }

    fn parse_bound(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| TemporaError::Parse(format!("invalid integer bound: '{}'", s)))
    }
}

impl SpanBound for f64 {
    const DISCRETE: bool = false;
    const NAME: &'static str = "float";

    fn successor(self) -> Result<Self> {
        Ok(self)
    }

    fn predecessor(self) -> Result<Self> {
        Ok(self)
    }

    fn distance(self, other: Self) -> f64 {
        (other - self).abs()
    }

    fn is_valid_bound(&self) -> bool {
        self.is_finite()
    }

    fn format_bound(&self) -> String {
        self.to_string()
    }

    fn parse_bound(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| TemporaError::Parse(format!("invalid float bound: '{}'", s)))
    }
}

impl SpanBound for NaiveDate {
    const DISCRETE: bool = true;
    const NAME: &'static str = "date";

    fn successor(self) -> Result<Self> {
        self.checked_add_days(Days::new(1)).ok_or_else(|| {
            TemporaError::ValueOutOfRange(format!("date span bound overflow above {}", self))
        })
    }

    fn predecessor(self) -> Result<Self> {
        self.checked_sub_days(Days::new(1)).ok_or_else(|| {
            TemporaError::ValueOutOfRange(format!("date span bound overflow below {}", self))
        })
    }

    fn distance(self, other: Self) -> f64 {
        (other - self).num_days().abs() as f64
    }

    fn format_bound(&self) -> String {
        self.to_string()
    }

    fn parse_bound(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| TemporaError::Parse(format!("invalid date bound: '{}'", s)))
    }
}

impl SpanBound for DateTime<Utc> {
    const DISCRETE: bool = false;
    const NAME: &'static str = "timestamptz";

    fn successor(self) -> Result<Self> {
        Ok(self)
    }

    fn predecessor(self) -> Result<Self> {
        Ok(self)
    }

    /// Distance in seconds.
    fn distance(self, other: Self) -> f64 {
        let micros = (other - self).num_microseconds().unwrap_or(i64::MAX);
        (micros as f64 / 1_000_000.0).abs()
    }

    fn format_bound(&self) -> String {
        crate::text::format_timestamp(self)
    }

    fn parse_bound(s: &str) -> Result<Self> {
        crate::text::parse_timestamp(s)
    }
}

/// Compare two bound values, treating incomparable values as equal.
///
/// Constructors reject non-finite floats, so incomparable pairs cannot
/// reach the algebra through public entry points.
fn cmp_values<T: SpanBound>(a: T, b: T) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// An interval over a totally ordered domain, with independently
/// inclusive/exclusive bounds.
///
/// # Examples
///
/// ```rust
/// use tempora::span::Span;
///
/// let a = Span::new(1i64, 5, true, true).unwrap();
/// let b = Span::new(1i64, 6, true, false).unwrap();
/// // Discrete spans canonicalize: [1, 5] and [1, 6) are the same set
/// assert_eq!(a, b);
/// assert!(a.contains_value(5));
/// assert!(!a.contains_value(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T: SpanBound> {
    lower: T,
    upper: T,
    lower_inc: bool,
    upper_inc: bool,
}

impl<T: SpanBound> Span<T> {
    /// Create a span, canonicalizing discrete bounds.
    ///
    /// # Errors
    ///
    /// Returns [`TemporaError::InvalidSpan`] when the bounds denote an empty
    /// interval, [`TemporaError::InvalidInput`] for unusable bound values,
    /// and [`TemporaError::ValueOutOfRange`] when canonicalization overflows
    /// the domain.
    pub fn new(lower: T, upper: T, lower_inc: bool, upper_inc: bool) -> Result<Self> {
        if !lower.is_valid_bound() || !upper.is_valid_bound() {
            return Err(TemporaError::InvalidInput(format!(
                "span bounds must be finite {} values",
                T::NAME
            )));
        }

        let (mut lower, mut upper) = (lower, upper);
        let (mut lower_inc, mut upper_inc) = (lower_inc, upper_inc);
        if T::DISCRETE {
            if !lower_inc {
                lower = lower.successor()?;
                lower_inc = true;
            }
            if upper_inc {
                upper = upper.successor()?;
                upper_inc = false;
            }
        }

        match cmp_values(lower, upper) {
            Ordering::Greater => Err(TemporaError::InvalidSpan(format!(
                "lower bound {:?} is above upper bound {:?}",
                lower, upper
            ))),
            Ordering::Equal if !(lower_inc && upper_inc) => Err(TemporaError::InvalidSpan(
                format!("span over {:?} denotes the empty set", lower),
            )),
            _ => Ok(Self {
                lower,
                upper,
                lower_inc,
                upper_inc,
            }),
        }
    }

    /// A single-value span `[v, v]`.
    pub fn point(value: T) -> Result<Self> {
        if T::DISCRETE {
            Self::new(value, value.successor()?, true, false)
        } else {
            Self::new(value, value, true, true)
        }
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    /// Width of the span in domain units.
    pub fn width(&self) -> f64 {
        self.lower.distance(self.upper)
    }

    /// Compare the lower bounds of two spans, inclusivity breaking ties
    /// (an inclusive lower bound starts before an exclusive one).
    pub(crate) fn cmp_lower(&self, other: &Self) -> Ordering {
        cmp_values(self.lower, other.lower).then_with(|| match (self.lower_inc, other.lower_inc) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }

    /// Compare the upper bounds of two spans, inclusivity breaking ties
    /// (an inclusive upper bound ends after an exclusive one).
    pub(crate) fn cmp_upper(&self, other: &Self) -> Ordering {
        cmp_values(self.upper, other.upper).then_with(|| match (self.upper_inc, other.upper_inc) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Ordering::Equal,
        })
    }

    /// Whether the span contains a single value.
    pub fn contains_value(&self, value: T) -> bool {
        let above_lower = match cmp_values(self.lower, value) {
            Ordering::Less => true,
            Ordering::Equal => self.lower_inc,
            Ordering::Greater => false,
        };
        let below_upper = match cmp_values(value, self.upper) {
            Ordering::Less => true,
            Ordering::Equal => self.upper_inc,
            Ordering::Greater => false,
        };
        above_lower && below_upper
    }

    /// Whether the span fully contains another span.
    pub fn contains_span(&self, other: &Self) -> bool {
        self.cmp_lower(other) != Ordering::Greater && self.cmp_upper(other) != Ordering::Less
    }

    /// Whether the two spans share at least one value.
    ///
    /// Spans touching at a shared bound overlap only when both touching
    /// bounds are inclusive.
    pub fn overlaps(&self, other: &Self) -> bool {
        let self_starts_before_other_ends = match cmp_values(self.lower, other.upper) {
            Ordering::Less => true,
            Ordering::Equal => self.lower_inc && other.upper_inc,
            Ordering::Greater => false,
        };
        let other_starts_before_self_ends = match cmp_values(other.lower, self.upper) {
            Ordering::Less => true,
            Ordering::Equal => other.lower_inc && self.upper_inc,
            Ordering::Greater => false,
        };
        self_starts_before_other_ends && other_starts_before_self_ends
    }

    /// Whether the two spans do not overlap but together cover a contiguous
    /// range: they touch at one bound and exactly one of the touching bounds
    /// is inclusive.
    pub fn adjacent(&self, other: &Self) -> bool {
        let touch_right = cmp_values(self.upper, other.lower) == Ordering::Equal
            && (self.upper_inc != other.lower_inc);
        let touch_left = cmp_values(other.upper, self.lower) == Ordering::Equal
            && (other.upper_inc != self.lower_inc);
        touch_right || touch_left
    }

    /// Whether every value of `self` is strictly before every value of
    /// `other`.
    pub fn is_left(&self, other: &Self) -> bool {
        match cmp_values(self.upper, other.lower) {
            Ordering::Less => true,
            Ordering::Equal => !(self.upper_inc && other.lower_inc),
            Ordering::Greater => false,
        }
    }

    /// Whether every value of `self` is strictly after every value of
    /// `other`.
    pub fn is_right(&self, other: &Self) -> bool {
        other.is_left(self)
    }

    /// Whether `self` does not extend to the right of `other`.
    pub fn is_over_left(&self, other: &Self) -> bool {
        self.cmp_upper(other) != Ordering::Greater
    }

    /// Whether `self` does not extend to the left of `other`.
    pub fn is_over_right(&self, other: &Self) -> bool {
        self.cmp_lower(other) != Ordering::Less
    }

    /// Whether every value of the span is strictly before `value`.
    pub fn is_left_of_value(&self, value: T) -> bool {
        match cmp_values(self.upper, value) {
            Ordering::Less => true,
            Ordering::Equal => !self.upper_inc,
            Ordering::Greater => false,
        }
    }

    /// Whether every value of the span is strictly after `value`.
    pub fn is_right_of_value(&self, value: T) -> bool {
        match cmp_values(value, self.lower) {
            Ordering::Less => true,
            Ordering::Equal => !self.lower_inc,
            Ordering::Greater => false,
        }
    }

    /// Union of two spans. A single merged span when they overlap or are
    /// adjacent, otherwise a two-span set.
    pub fn union(&self, other: &Self) -> Result<SpanSet<T>> {
        SpanSet::new(vec![*self, *other])
    }

    /// The smallest span covering both inputs, bridging any gap.
    pub fn hull(&self, other: &Self) -> Self {
        let (lower, lower_inc) = if self.cmp_lower(other) != Ordering::Greater {
            (self.lower, self.lower_inc)
        } else {
            (other.lower, other.lower_inc)
        };
        let (upper, upper_inc) = if self.cmp_upper(other) != Ordering::Less {
            (self.upper, self.upper_inc)
        } else {
            (other.upper, other.upper_inc)
        };
        Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }

    /// Grow the span in place to cover `other`.
    pub fn expand(&mut self, other: &Self) {
        *self = self.hull(other);
    }

    /// Overlapping part of the two spans, `None` when disjoint.
    ///
    /// Each resulting bound takes the inclusivity of whichever input bound
    /// is tighter; at equal bound values the inclusivities combine with AND.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (lower, lower_inc) = match cmp_values(self.lower, other.lower) {
            Ordering::Less => (other.lower, other.lower_inc),
            Ordering::Greater => (self.lower, self.lower_inc),
            Ordering::Equal => (self.lower, self.lower_inc && other.lower_inc),
        };
        let (upper, upper_inc) = match cmp_values(self.upper, other.upper) {
            Ordering::Less => (self.upper, self.upper_inc),
            Ordering::Greater => (other.upper, other.upper_inc),
            Ordering::Equal => (self.upper, self.upper_inc && other.upper_inc),
        };
        match cmp_values(lower, upper) {
            Ordering::Greater => None,
            Ordering::Equal if !(lower_inc && upper_inc) => None,
            _ => Some(Self {
                lower,
                upper,
                lower_inc,
                upper_inc,
            }),
        }
    }

    /// `self` minus `other`: zero, one, or two spans depending on whether
    /// `other` fully covers `self`, covers one side, or splits it.
    pub fn difference(&self, other: &Self) -> Result<SmallVec<[Self; 2]>> {
        let mut pieces = SmallVec::new();
        let Some(common) = self.intersection(other) else {
            pieces.push(*self);
            return Ok(pieces);
        };

        // Piece to the left of the overlap
        let has_left = self.cmp_lower(&common) == Ordering::Less;
        if has_left {
            pieces.push(Self::new(
                self.lower,
                common.lower,
                self.lower_inc,
                !common.lower_inc,
            )?);
        }
        // Piece to the right of the overlap
        let has_right = self.cmp_upper(&common) == Ordering::Greater;
        if has_right {
            pieces.push(Self::new(
                common.upper,
                self.upper,
                !common.upper_inc,
                self.upper_inc,
            )?);
        }
        Ok(pieces)
    }

    /// Distance between the spans in domain units: zero when they overlap,
    /// otherwise the gap between the nearest bounds. Discrete spans measure
    /// from the last value actually covered, not the canonical exclusive
    /// bound.
    pub fn distance(&self, other: &Self) -> Result<f64> {
        if self.overlaps(other) {
            return Ok(0.0);
        }
        let (left, right) = if self.is_left(other) {
            (self, other)
        } else {
            (other, self)
        };
        let left_edge = if T::DISCRETE {
            left.upper.predecessor()?
        } else {
            left.upper
        };
        Ok(left_edge.distance(right.lower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lower: i64, upper: i64, li: bool, ui: bool) -> Span<i64> {
        Span::new(lower, upper, li, ui).unwrap()
    }

    #[test]
    fn test_discrete_canonicalization() {
        // [1, 5] == [1, 6) == (0, 6)
        let a = span(1, 5, true, true);
        let b = span(1, 6, true, false);
        let c = span(0, 6, false, false);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.lower(), 1);
        assert_eq!(a.upper(), 6);
        assert!(a.lower_inc());
        assert!(!a.upper_inc());
    }

    #[test]
    fn test_empty_span_rejected() {
        assert!(Span::new(5i64, 5, true, false).is_err());
        assert!(Span::new(5.0f64, 5.0, true, false).is_err());
        assert!(Span::new(5.0f64, 4.0, true, true).is_err());
    }

    #[test]
    fn test_point_span_continuous() {
        let p = Span::point(2.5f64).unwrap();
        assert!(p.contains_value(2.5));
        assert!(!p.contains_value(2.500001));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Span::new(f64::NAN, 1.0, true, true).is_err());
        assert!(Span::new(0.0, f64::INFINITY, true, true).is_err());
    }

    #[test]
    fn test_canonicalization_overflow() {
        let result = Span::new(0i64, i64::MAX, true, true);
        assert!(matches!(result, Err(TemporaError::ValueOutOfRange(_))));
    }

    #[test]
    fn test_contains_value_bounds() {
        let s = Span::new(1.0f64, 5.0, true, false).unwrap();
        assert!(s.contains_value(1.0));
        assert!(s.contains_value(4.999));
        assert!(!s.contains_value(5.0));
        assert!(!s.contains_value(0.999));
    }

    #[test]
    fn test_overlaps_touching_bounds() {
        let a = Span::new(1.0f64, 3.0, true, true).unwrap();
        let b = Span::new(3.0f64, 5.0, true, true).unwrap();
        let c = Span::new(3.0f64, 5.0, false, true).unwrap();
        // both touching bounds inclusive: overlap
        assert!(a.overlaps(&b));
        // one exclusive: no overlap, adjacent instead
        assert!(!a.overlaps(&c));
        assert!(a.adjacent(&c));
        assert!(!a.adjacent(&b));
    }

    #[test]
    fn test_adjacent_discrete() {
        // [1, 2] and [3, 4] canonicalize to [1, 3) and [3, 5)
        let a = span(1, 2, true, true);
        let b = span(3, 4, true, true);
        assert!(a.adjacent(&b));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_ordering_predicates() {
        let a = Span::new(1.0f64, 3.0, true, false).unwrap();
        let b = Span::new(3.0f64, 5.0, true, true).unwrap();
        assert!(a.is_left(&b));
        assert!(b.is_right(&a));
        assert!(a.is_over_left(&b));
        assert!(!b.is_over_left(&a));
        assert!(b.is_over_right(&a));

        // Touching with both bounds inclusive is no longer strictly left
        let c = Span::new(1.0f64, 3.0, true, true).unwrap();
        assert!(!c.is_left(&b));
    }

    #[test]
    fn test_value_predicates() {
        let s = Span::new(1.0f64, 3.0, true, false).unwrap();
        assert!(s.is_left_of_value(3.0));
        assert!(s.is_left_of_value(4.0));
        assert!(!s.is_left_of_value(2.0));
        assert!(s.is_right_of_value(0.5));
        assert!(!s.is_right_of_value(1.0));
    }

    #[test]
    fn test_intersection_inclusivity() {
        let a = Span::new(1.0f64, 5.0, true, true).unwrap();
        let b = Span::new(3.0f64, 8.0, false, true).unwrap();
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.lower(), 3.0);
        assert!(!i.lower_inc());
        assert_eq!(i.upper(), 5.0);
        assert!(i.upper_inc());

        // Equal bound values AND their inclusivities
        let c = Span::new(5.0f64, 9.0, true, true).unwrap();
        let j = a.intersection(&c).unwrap();
        assert_eq!(j.lower(), 5.0);
        assert_eq!(j.upper(), 5.0);
        assert!(j.lower_inc() && j.upper_inc());

        let d = Span::new(6.0f64, 9.0, true, true).unwrap();
        assert!(a.intersection(&d).is_none());
    }

    #[test]
    fn test_difference_cases() {
        let a = Span::new(1.0f64, 9.0, true, true).unwrap();

        // b splits a in two
        let b = Span::new(3.0f64, 5.0, true, true).unwrap();
        let parts = a.difference(&b).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].upper(), 3.0);
        assert!(!parts[0].upper_inc());
        assert_eq!(parts[1].lower(), 5.0);
        assert!(!parts[1].lower_inc());

        // b covers one side
        let c = Span::new(0.0f64, 4.0, true, true).unwrap();
        let parts = a.difference(&c).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].lower(), 4.0);

        // b covers all of a
        let d = Span::new(0.0f64, 10.0, true, true).unwrap();
        assert!(a.difference(&d).unwrap().is_empty());

        // disjoint
        let e = Span::new(20.0f64, 30.0, true, true).unwrap();
        let parts = a.difference(&e).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], a);
    }

    #[test]
    fn test_difference_discrete_split() {
        // [1, 10] minus [4, 6] = [1, 3] + [7, 10]
        let a = span(1, 10, true, true);
        let b = span(4, 6, true, true);
        let parts = a.difference(&b).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], span(1, 3, true, true));
        assert_eq!(parts[1], span(7, 10, true, true));
    }

    #[test]
    fn test_distance() {
        let a = Span::new(1.0f64, 3.0, true, true).unwrap();
        let b = Span::new(2.0f64, 8.0, true, true).unwrap();
        let c = Span::new(7.0f64, 9.0, true, true).unwrap();
        assert_eq!(a.distance(&b).unwrap(), 0.0);
        assert_eq!(a.distance(&c).unwrap(), 4.0);
        assert_eq!(c.distance(&a).unwrap(), 4.0);
    }

    #[test]
    fn test_distance_discrete_canonical() {
        // [1, 2] to [5, 6]: gap from value 2 to value 5
        let a = span(1, 2, true, true);
        let b = span(5, 6, true, true);
        assert_eq!(a.distance(&b).unwrap(), 3.0);
    }

    #[test]
    fn test_hull_bridges_gap() {
        let a = Span::new(1.0f64, 3.0, true, false).unwrap();
        let b = Span::new(7.0f64, 9.0, false, true).unwrap();
        let h = a.hull(&b);
        assert_eq!(h.lower(), 1.0);
        assert_eq!(h.upper(), 9.0);
        assert!(h.lower_inc());
        assert!(h.upper_inc());
    }

    #[test]
    fn test_containment_law_small_integers() {
        // contains_span(a, b) iff every value of b lies in a
        let spans: Vec<Span<i64>> = (0..5)
            .flat_map(|l| (l..5).map(move |u| span(l, u, true, true)))
            .collect();
        for a in &spans {
            for b in &spans {
                let exhaustive = (b.lower()..b.upper()).all(|v| a.contains_value(v));
                assert_eq!(
                    a.contains_span(b),
                    exhaustive,
                    "containment mismatch for {:?} vs {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_containment_law_float_boundaries() {
        let a = Span::new(1.0f64, 5.0, true, false).unwrap();
        let inside = Span::new(1.0f64, 5.0, true, false).unwrap();
        let touches_open_end = Span::new(2.0f64, 5.0, true, true).unwrap();
        assert!(a.contains_span(&inside));
        // b includes 5.0 which a excludes
        assert!(!a.contains_span(&touches_open_end));
        assert!(a.contains_value(a.lower()));
        assert!(!a.contains_value(a.upper()));
    }

    #[test]
    fn test_date_spans() {
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        // [2000-01-01, 2000-01-05] canonicalizes to [.., 2000-01-06)
        let a = Span::new(d("2000-01-01"), d("2000-01-05"), true, true).unwrap();
        assert_eq!(a.upper(), d("2000-01-06"));
        assert!(!a.upper_inc());
        assert!(a.contains_value(d("2000-01-05")));
        assert!(!a.contains_value(d("2000-01-06")));
    }
}
