//! The temporal value model: instants, sequences, sequence sets.
//!
//! [`Temporal`] is the closed sum over the three representations. All
//! per-base-type behavior flows through the
//! [`TemporalValue`](crate::value::TemporalValue) capability trait, so the
//! model itself is independent of what the base type actually is.

pub mod instant;
pub mod sequence;
pub mod sequence_set;

pub use instant::TInstant;
pub use sequence::TSequence;
pub use sequence_set::TSequenceSet;

use crate::error::{Result, TemporaError};
use crate::interp::Interpolation;
use crate::span::TimeSpan;
use crate::spanset::SpanSet;
use crate::value::TemporalValue;
use chrono::{DateTime, Utc};

/// A value that varies over time: a single sample, a sequence, or a set of
/// sequences with gaps.
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal<V: TemporalValue> {
    Instant(TInstant<V>),
    Sequence(TSequence<V>),
    SequenceSet(TSequenceSet<V>),
}

/// Canonical shape of a temporal value for engine dispatch: a lone sample,
/// a discrete instant collection, or one-or-more continuous sequences.
pub(crate) enum TemporalForm<'a, V: TemporalValue> {
    Instant(&'a TInstant<V>),
    Discrete(&'a TSequence<V>),
    Continuous(&'a [TSequence<V>]),
}

/// Compatibility class for aggregation: instants cannot mix with
/// sequences, nor linear with non-linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AggClass {
    Instant,
    StepSequence,
    LinearSequence,
}

impl<V: TemporalValue> Temporal<V> {
    /// A temporal value holding one sample.
    pub fn instant(value: V, timestamp: DateTime<Utc>) -> Self {
        Temporal::Instant(TInstant::new(value, timestamp))
    }

    /// Short subtype name used in diagnostics.
    pub fn subtype_name(&self) -> &'static str {
        match self {
            Temporal::Instant(_) => "instant",
            Temporal::Sequence(_) => "sequence",
            Temporal::SequenceSet(_) => "sequence set",
        }
    }

    /// The interpolation mode; instants count as discrete.
    pub fn interpolation(&self) -> Interpolation {
        match self {
            Temporal::Instant(_) => Interpolation::Discrete,
            Temporal::Sequence(seq) => seq.interpolation(),
            Temporal::SequenceSet(set) => set.interpolation(),
        }
    }

    /// The smallest single span covering the definition domain.
    pub fn time_span(&self) -> Result<TimeSpan> {
        match self {
            Temporal::Instant(inst) => inst.time_span(),
            Temporal::Sequence(seq) => Ok(seq.time_span()),
            Temporal::SequenceSet(set) => Ok(set.time_span()),
        }
    }

    /// The exact definition domain as a normalized span set.
    pub fn time_domain(&self) -> Result<SpanSet<DateTime<Utc>>> {
        match self {
            Temporal::Instant(inst) => Ok(SpanSet::from_span(inst.time_span()?)),
            Temporal::Sequence(seq) => {
                if seq.interpolation() == Interpolation::Discrete {
                    SpanSet::new(
                        seq.instants()
                            .iter()
                            .map(|i| i.time_span())
                            .collect::<Result<Vec<_>>>()?,
                    )
                } else {
                    Ok(SpanSet::from_span(seq.time_span()))
                }
            }
            Temporal::SequenceSet(set) => set.time_domain(),
        }
    }

    /// Total number of instants.
    pub fn num_instants(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::Sequence(seq) => seq.num_instants(),
            Temporal::SequenceSet(set) => set.num_instants(),
        }
    }

    /// Value at a timestamp under the interpolation contract, `None`
    /// outside the definition domain.
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<V> {
        match self {
            Temporal::Instant(inst) => {
                (inst.timestamp() == at).then(|| inst.value().clone())
            }
            Temporal::Sequence(seq) => seq.value_at(at),
            Temporal::SequenceSet(set) => set.value_at(at),
        }
    }

    /// Spatial reference identifier of the base values, if they carry one.
    pub fn srid(&self) -> Option<i32> {
        match self {
            Temporal::Instant(inst) => inst.value().srid(),
            Temporal::Sequence(seq) => seq.start().value().srid(),
            Temporal::SequenceSet(set) => set.sequences()[0].start().value().srid(),
        }
    }

    pub(crate) fn form(&self) -> TemporalForm<'_, V> {
        match self {
            Temporal::Instant(inst) => TemporalForm::Instant(inst),
            Temporal::Sequence(seq) if seq.interpolation() == Interpolation::Discrete => {
                TemporalForm::Discrete(seq)
            }
            Temporal::Sequence(seq) => TemporalForm::Continuous(std::slice::from_ref(seq)),
            Temporal::SequenceSet(set) => TemporalForm::Continuous(set.sequences()),
        }
    }

    pub(crate) fn agg_class(&self) -> AggClass {
        match self.interpolation() {
            Interpolation::Discrete => AggClass::Instant,
            Interpolation::Step => AggClass::StepSequence,
            Interpolation::Linear => AggClass::LinearSequence,
        }
    }

    /// Wrap a list of continuous sequences as the narrowest subtype.
    pub(crate) fn from_sequences(mut sequences: Vec<TSequence<V>>) -> Result<Self> {
        match sequences.len() {
            0 => Err(TemporaError::InvalidInput(
                "cannot build a temporal value from zero sequences".into(),
            )),
            1 => Ok(Temporal::Sequence(
                sequences.pop().expect("length checked above"),
            )),
            _ => {
                let set = TSequenceSet::new(sequences)?;
                if set.num_sequences() == 1 {
                    Ok(Temporal::Sequence(set.sequences()[0].clone()))
                } else {
                    Ok(Temporal::SequenceSet(set))
                }
            }
        }
    }

    /// Merge disjoint (or touching, or exactly duplicated) fragments into
    /// one temporal value. Fragments with genuinely conflicting overlap are
    /// rejected.
    pub fn merge_all(fragments: &[Temporal<V>]) -> Result<Self> {
        if fragments.is_empty() {
            return Err(TemporaError::InvalidInput(
                "cannot merge zero fragments".into(),
            ));
        }
        let continuous = fragments[0].interpolation().is_continuous()
            && !matches!(fragments[0], Temporal::Instant(_));

        if continuous {
            let mut sequences: Vec<TSequence<V>> = Vec::new();
            for frag in fragments {
                match frag.form() {
                    TemporalForm::Continuous(seqs) => {
                        for seq in seqs {
                            if !sequences.contains(seq) {
                                sequences.push(seq.clone());
                            }
                        }
                    }
                    _ => {
                        return Err(TemporaError::AggregationMismatch(format!(
                            "cannot merge {} into a sequence aggregate",
                            frag.subtype_name()
                        )));
                    }
                }
            }
            return Self::from_sequences(sequences);
        }

        // Instant-class merge: dedupe by timestamp, values must agree
        let mut instants: Vec<TInstant<V>> = Vec::new();
        for frag in fragments {
            let frag_instants: &[TInstant<V>] = match frag.form() {
                TemporalForm::Instant(inst) => std::slice::from_ref(inst),
                TemporalForm::Discrete(seq) => seq.instants(),
                TemporalForm::Continuous(_) => {
                    return Err(TemporaError::AggregationMismatch(
                        "cannot merge sequences into an instant aggregate".into(),
                    ));
                }
            };
            for inst in frag_instants {
                match instants.iter().find(|i| i.timestamp() == inst.timestamp()) {
                    None => instants.push(inst.clone()),
                    Some(existing) if existing.value() == inst.value() => {}
                    Some(existing) => {
                        return Err(TemporaError::InvalidInput(format!(
                            "conflicting values at {}: {:?} vs {:?}",
                            inst.timestamp(),
                            existing.value(),
                            inst.value()
                        )));
                    }
                }
            }
        }
        instants.sort_by_key(|i| i.timestamp());
        if instants.len() == 1 {
            return Ok(Temporal::Instant(
                instants.pop().expect("length checked above"),
            ));
        }
        Ok(Temporal::Sequence(TSequence::discrete(instants)?))
    }
}
