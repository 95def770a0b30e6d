//! Normalized collections of disjoint spans.
//!
//! A [`SpanSet`] is a non-empty, strictly ascending sequence of pairwise
//! non-overlapping, non-adjacent spans over one domain. Normalization (sort
//! plus merge of overlapping or adjacent spans) is an invariant of the type:
//! every public constructor normalizes its input.

use crate::error::{Result, TemporaError};
use crate::span::{Span, SpanBound};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A normalized set of disjoint spans.
///
/// # Examples
///
/// ```rust
/// use tempora::span::Span;
/// use tempora::spanset::SpanSet;
///
/// let set = SpanSet::new(vec![
///     Span::new(4.0f64, 9.0, true, false).unwrap(),
///     Span::new(1.0f64, 5.0, true, false).unwrap(),
/// ])
/// .unwrap();
/// // Overlapping inputs merge into one span
/// assert_eq!(set.num_spans(), 1);
/// assert!(set.contains_value(8.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSet<T: SpanBound> {
    spans: Vec<Span<T>>,
}

impl<T: SpanBound> SpanSet<T> {
    /// Build a span set from arbitrary spans, normalizing as required.
    ///
    /// # Errors
    ///
    /// Returns [`TemporaError::InvalidInput`] when `spans` is empty.
    pub fn new(mut spans: Vec<Span<T>>) -> Result<Self> {
        if spans.is_empty() {
            return Err(TemporaError::InvalidInput(
                "a span set requires at least one span".into(),
            ));
        }
        spans.sort_by(|a, b| a.cmp_lower(b).then_with(|| a.cmp_upper(b)));

        let mut merged: Vec<Span<T>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if last.overlaps(&span) || last.adjacent(&span) => {
                    last.expand(&span);
                }
                _ => merged.push(span),
            }
        }
        Ok(Self { spans: merged })
    }

    /// Wrap spans already known to be normalized. Used on hot paths where
    /// the caller produced the spans in ascending disjoint order; such
    /// values are indistinguishable from normalized ones externally.
    pub(crate) fn from_normalized(spans: Vec<Span<T>>) -> Self {
        debug_assert!(!spans.is_empty());
        debug_assert!(
            spans
                .windows(2)
                .all(|w| w[0].is_left(&w[1]) && !w[0].adjacent(&w[1])),
            "span set input not normalized"
        );
        Self { spans }
    }

    /// A span set holding a single span.
    pub fn from_span(span: Span<T>) -> Self {
        Self { spans: vec![span] }
    }

    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }

    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    /// The smallest single span covering the whole set.
    pub fn hull(&self) -> Span<T> {
        let mut hull = self.spans[0];
        if let Some(last) = self.spans.last() {
            hull.expand(last);
        }
        hull
    }

    /// Whether any member span contains the value.
    pub fn contains_value(&self, value: T) -> bool {
        // Binary search on the ascending spans
        self.spans
            .binary_search_by(|span| {
                if span.is_left_of_value(value) {
                    Ordering::Less
                } else if span.is_right_of_value(value) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Whether any member span overlaps the given span.
    pub fn overlaps_span(&self, span: &Span<T>) -> bool {
        self.spans.iter().any(|s| s.overlaps(span))
    }

    /// Whether the two sets share at least one value.
    pub fn overlaps(&self, other: &Self) -> bool {
        // Merge walk over both ascending sequences
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a, b) = (&self.spans[i], &other.spans[j]);
            if a.overlaps(b) {
                return true;
            }
            if a.is_left(b) {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Union with another set.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let mut spans = self.spans.clone();
        spans.extend_from_slice(&other.spans);
        Self::new(spans)
    }

    /// Restrict the set to a span, `None` when nothing remains.
    pub fn intersection_span(&self, span: &Span<T>) -> Option<Self> {
        let spans: Vec<Span<T>> = self
            .spans
            .iter()
            .filter_map(|s| s.intersection(span))
            .collect();
        if spans.is_empty() {
            None
        } else {
            Some(Self::from_normalized(spans))
        }
    }

    /// Total width of all member spans in domain units.
    pub fn width(&self) -> f64 {
        self.spans.iter().map(|s| s.width()).sum()
    }
}
