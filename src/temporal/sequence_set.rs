//! Ordered collections of disjoint sequences.

use crate::error::{Result, TemporaError};
use crate::interp::Interpolation;
use crate::span::{Span, TimeSpan};
use crate::spanset::SpanSet;
use crate::temporal::sequence::TSequence;
use crate::value::TemporalValue;
use chrono::{DateTime, Utc};

/// A non-empty, ascending, pairwise non-overlapping collection of
/// sequences sharing one non-discrete interpolation: a single temporal
/// value with possible time gaps.
///
/// Two sequences may share a boundary timestamp only when at most one of
/// the touching bounds is inclusive, or when their boundary values agree —
/// in which case the constructor joins them. A cached instant count and
/// value summary cover the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct TSequenceSet<V: TemporalValue> {
    sequences: Vec<TSequence<V>>,
    instant_count: usize,
    bbox: V::Bbox,
}

impl<V: TemporalValue> TSequenceSet<V> {
    /// Build a sequence set, sorting, validating, and joining adjacent
    /// sequences where the interpolation allows it.
    pub fn new(mut sequences: Vec<TSequence<V>>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(TemporaError::InvalidInput(
                "a sequence set requires at least one sequence".into(),
            ));
        }
        let interp = sequences[0].interpolation();
        if interp == Interpolation::Discrete {
            return Err(TemporaError::InterpolationMismatch(
                "a sequence set cannot hold discrete sequences".into(),
            ));
        }
        if sequences.iter().any(|s| s.interpolation() != interp) {
            return Err(TemporaError::InterpolationMismatch(
                "all sequences of a set must share one interpolation".into(),
            ));
        }
        sequences.sort_by(|a, b| a.time_span().cmp_lower(&b.time_span()));

        let mut normalized: Vec<TSequence<V>> = Vec::with_capacity(sequences.len());
        for seq in sequences {
            match normalized.last() {
                None => normalized.push(seq),
                Some(last) => {
                    if let Some(joined) = last.try_join(&seq) {
                        *normalized.last_mut().expect("just matched Some") = joined;
                    } else if last.time_span().overlaps(&seq.time_span()) {
                        return Err(TemporaError::InvalidInput(format!(
                            "sequences overlap in time: {:?} and {:?}",
                            last.time_span(),
                            seq.time_span()
                        )));
                    } else {
                        normalized.push(seq);
                    }
                }
            }
        }

        let instant_count = normalized.iter().map(|s| s.num_instants()).sum();
        let mut bbox = normalized[0].bbox().clone();
        for seq in &normalized[1..] {
            for inst in seq.instants() {
                V::expand_bbox(&mut bbox, inst.value());
            }
        }

        Ok(Self {
            sequences: normalized,
            instant_count,
            bbox,
        })
    }

    /// A set holding a single sequence.
    pub fn from_sequence(sequence: TSequence<V>) -> Result<Self> {
        Self::new(vec![sequence])
    }

    pub fn sequences(&self) -> &[TSequence<V>] {
        &self.sequences
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Total number of instants across all member sequences (cached).
    pub fn num_instants(&self) -> usize {
        self.instant_count
    }

    pub fn interpolation(&self) -> Interpolation {
        self.sequences[0].interpolation()
    }

    pub fn bbox(&self) -> &V::Bbox {
        &self.bbox
    }

    /// The smallest single span covering the whole set.
    pub fn time_span(&self) -> TimeSpan {
        let first = self.sequences[0].time_span();
        let last = self.sequences[self.sequences.len() - 1].time_span();
        first.hull(&last)
    }

    /// The exact definition domain, one span per member sequence.
    pub fn time_domain(&self) -> Result<SpanSet<DateTime<Utc>>> {
        SpanSet::new(self.sequences.iter().map(|s| s.time_span()).collect())
    }

    /// Value at a timestamp, `None` in gaps or outside the set.
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<V> {
        let idx = self
            .sequences
            .partition_point(|s| s.time_span().is_left_of_value(at));
        self.sequences.get(idx)?.value_at(at)
    }

    /// Restrict the set to a time span. `None` when nothing remains.
    pub fn at_span(&self, span: &Span<DateTime<Utc>>) -> Option<Self> {
        let kept: Vec<TSequence<V>> = self
            .sequences
            .iter()
            .filter_map(|s| s.at_span(span))
            .collect();
        if kept.is_empty() {
            return None;
        }
        Self::new(kept).ok()
    }
}
