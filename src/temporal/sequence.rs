//! Time-ordered runs of instants under one interpolation mode.

use crate::error::{Result, TemporaError};
use crate::interp::{Interpolation, segment_value};
use crate::span::TimeSpan;
use crate::temporal::instant::TInstant;
use crate::value::TemporalValue;
use chrono::{DateTime, Utc};

/// A non-empty, strictly time-increasing run of instants over a bounded
/// time span, with one interpolation mode and a cached value summary.
///
/// Discrete sequences always carry inclusive bounds, as do instantaneous
/// step/linear sequences. The first and last instants sit exactly on the
/// span bounds; an exclusive bound means the boundary instant's value is
/// a limit, not part of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TSequence<V: TemporalValue> {
    instants: Vec<TInstant<V>>,
    span: TimeSpan,
    interp: Interpolation,
    bbox: V::Bbox,
}

impl<V: TemporalValue> TSequence<V> {
    /// Build a sequence from instants and explicit bound inclusivity.
    ///
    /// Discrete interpolation and instantaneous sequences force both bounds
    /// inclusive. Linear interpolation requires a continuous base type.
    ///
    /// # Errors
    ///
    /// [`TemporaError::InvalidInput`] for empty or non-increasing instants,
    /// [`TemporaError::InterpolationMismatch`] for a linear sequence over a
    /// step-only base type.
    pub fn new(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> Result<Self> {
        if instants.is_empty() {
            return Err(TemporaError::InvalidInput(
                "a sequence requires at least one instant".into(),
            ));
        }
        if interp == Interpolation::Linear && !V::CONTINUOUS {
            return Err(TemporaError::InterpolationMismatch(format!(
                "base type {} does not support linear interpolation",
                V::NAME
            )));
        }
        for pair in instants.windows(2) {
            if pair[0].timestamp() >= pair[1].timestamp() {
                return Err(TemporaError::InvalidInput(format!(
                    "instants must be strictly increasing in time: {} then {}",
                    pair[0].timestamp(),
                    pair[1].timestamp()
                )));
            }
        }

        let (lower_inc, upper_inc) =
            if interp == Interpolation::Discrete || instants.len() == 1 {
                (true, true)
            } else {
                (lower_inc, upper_inc)
            };
        let span = TimeSpan::new(
            instants[0].timestamp(),
            instants[instants.len() - 1].timestamp(),
            lower_inc,
            upper_inc,
        )?;

        let mut bbox = instants[0].value().to_bbox();
        for inst in &instants[1..] {
            V::expand_bbox(&mut bbox, inst.value());
        }

        Ok(Self {
            instants,
            span,
            interp,
            bbox,
        })
    }

    /// A sequence holding one instant.
    pub fn from_instant(instant: TInstant<V>, interp: Interpolation) -> Self {
        let bbox = instant.value().to_bbox();
        let span = TimeSpan::new(instant.timestamp(), instant.timestamp(), true, true)
            .expect("a point time span is always valid");
        Self {
            instants: vec![instant],
            span,
            interp,
            bbox,
        }
    }

    /// A discrete sequence: defined only at its instants.
    pub fn discrete(instants: Vec<TInstant<V>>) -> Result<Self> {
        Self::new(instants, true, true, Interpolation::Discrete)
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    pub fn time_span(&self) -> TimeSpan {
        self.span
    }

    pub fn lower_inc(&self) -> bool {
        self.span.lower_inc()
    }

    pub fn upper_inc(&self) -> bool {
        self.span.upper_inc()
    }

    pub fn bbox(&self) -> &V::Bbox {
        &self.bbox
    }

    pub fn start(&self) -> &TInstant<V> {
        &self.instants[0]
    }

    pub fn end(&self) -> &TInstant<V> {
        &self.instants[self.instants.len() - 1]
    }

    /// Whether the sequence contains exactly one instant.
    pub fn is_instantaneous(&self) -> bool {
        self.instants.len() == 1
    }

    /// Value at a timestamp, `None` outside the definition domain.
    ///
    /// Discrete sequences are defined only at their instants; step holds the
    /// most recent preceding value; linear interpolates along the segment.
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<V> {
        if self.interp == Interpolation::Discrete {
            return self
                .instants
                .iter()
                .find(|i| i.timestamp() == at)
                .map(|i| i.value().clone());
        }
        if !self.span.contains_value(at) {
            return None;
        }
        // Index of the segment whose start is the last instant at or before `at`
        let idx = self
            .instants
            .partition_point(|i| i.timestamp() <= at)
            .saturating_sub(1);
        if idx + 1 >= self.instants.len() {
            return Some(self.instants[idx].value().clone());
        }
        let (start, end) = (&self.instants[idx], &self.instants[idx + 1]);
        Some(segment_value(
            start.value(),
            end.value(),
            self.interp,
            start.timestamp(),
            end.timestamp(),
            at,
        ))
    }

    /// Restrict the sequence to a time span, interpolating new boundary
    /// instants as needed. `None` when the restriction is empty.
    pub fn at_span(&self, span: &TimeSpan) -> Option<Self> {
        if self.interp == Interpolation::Discrete {
            let kept: Vec<TInstant<V>> = self
                .instants
                .iter()
                .filter(|i| span.contains_value(i.timestamp()))
                .cloned()
                .collect();
            if kept.is_empty() {
                return None;
            }
            return Self::discrete(kept).ok();
        }

        let inter = self.span.intersection(span)?;
        if inter == self.span {
            return Some(self.clone());
        }

        let mut instants: Vec<TInstant<V>> = Vec::new();
        let lower_value = self.sample_at(inter.lower());
        instants.push(TInstant::new(lower_value, inter.lower()));
        for inst in &self.instants {
            if inst.timestamp() > inter.lower() && inst.timestamp() < inter.upper() {
                instants.push(inst.clone());
            }
        }
        if inter.upper() > inter.lower() {
            let upper_value = self.sample_at(inter.upper());
            instants.push(TInstant::new(upper_value, inter.upper()));
        }
        Self::new(instants, inter.lower_inc(), inter.upper_inc(), self.interp).ok()
    }

    /// Value used when materializing an instant at a restriction boundary
    /// or a synchronization cut. Unlike [`Self::value_at`] this samples
    /// limits at exclusive bounds.
    pub(crate) fn sample_at(&self, at: DateTime<Utc>) -> V {
        let idx = self
            .instants
            .partition_point(|i| i.timestamp() <= at)
            .saturating_sub(1);
        if idx + 1 >= self.instants.len() {
            return self.instants[idx].value().clone();
        }
        let (start, end) = (&self.instants[idx], &self.instants[idx + 1]);
        segment_value(
            start.value(),
            end.value(),
            self.interp,
            start.timestamp(),
            end.timestamp(),
            at,
        )
    }

    /// Try to join an adjacent sequence into one. Succeeds when the spans
    /// touch, the shared boundary is covered by at least one side, and both
    /// sides agree on the boundary value.
    pub(crate) fn try_join(&self, other: &Self) -> Option<Self> {
        if self.interp != other.interp || self.interp == Interpolation::Discrete {
            return None;
        }
        if self.span.upper() != other.span.lower() {
            return None;
        }
        // A boundary covered by neither side leaves a gap at that instant
        if !self.upper_inc() && !other.lower_inc() {
            return None;
        }
        if self.end().value() == other.start().value() {
            let mut instants = self.instants.clone();
            instants.extend(other.instants[1..].iter().cloned());
            return Self::new(
                instants,
                self.lower_inc(),
                other.upper_inc(),
                self.interp,
            )
            .ok();
        }
        // Step values may jump at the boundary: when the left side's closing
        // sample is redundant (exclusive upper, value held from the previous
        // instant) and the right side owns the boundary instant, the right
        // side's instant takes its place.
        if self.interp == Interpolation::Step
            && !self.upper_inc()
            && other.lower_inc()
            && self.instants.len() >= 2
            && self.end().value() == self.instants[self.instants.len() - 2].value()
        {
            let mut instants = self.instants[..self.instants.len() - 1].to_vec();
            instants.extend(other.instants.iter().cloned());
            return Self::new(
                instants,
                self.lower_inc(),
                other.upper_inc(),
                self.interp,
            )
            .ok();
        }
        None
    }
}
