//! The lifting engine: generic application of scalar functions across
//! temporal values.
//!
//! Lifting turns a function over base values into a function over temporal
//! values. One-argument lifting maps instants and inserts turning-point
//! instants inside linear segments; two-argument lifting first synchronizes
//! the arguments onto a common timestamp set (restricting to the
//! intersection of their time domains, inserting segment crossings where
//! requested) and then proceeds per synchronized segment.
//!
//! Discontinuous lifts — boolean predicates over continuously moving
//! arguments — emit step sequence sets whose pieces change value exactly at
//! the turning points reported by the condition's capability.

use crate::error::{Result, TemporaError};
use crate::interp::{Interpolation, SegmentTurn, SyncTurn, timestamp_at_fraction};
use crate::temporal::{TInstant, TSequence, Temporal, TemporalForm};
use crate::value::TemporalValue;
use chrono::{DateTime, Utc};

/// Capability reporting where two synchronized linear segments cross, as a
/// fraction strictly inside `(0, 1)`.
pub trait SyncCrossing<A: TemporalValue, B: TemporalValue> {
    fn crossing(&self, a_start: &A, a_end: &A, b_start: &B, b_end: &B) -> Option<f64>;
}

impl<A, B, F> SyncCrossing<A, B> for F
where
    A: TemporalValue,
    B: TemporalValue,
    F: Fn(&A, &A, &B, &B) -> Option<f64>,
{
    fn crossing(&self, a_start: &A, a_end: &A, b_start: &B, b_end: &B) -> Option<f64> {
        self(a_start, a_end, b_start, b_end)
    }
}

/// Configuration of a one-argument lifting call: the scalar function plus
/// the turning-point behavior of the derived result.
pub struct UnaryLift<'a, A: TemporalValue, R: TemporalValue> {
    func: &'a dyn Fn(&A) -> R,
    turn: Option<&'a dyn SegmentTurn<A>>,
    discont: bool,
}

impl<'a, A: TemporalValue, R: TemporalValue> UnaryLift<'a, A, R> {
    /// A plain pointwise lift.
    pub fn new(func: &'a dyn Fn(&A) -> R) -> Self {
        Self {
            func,
            turn: None,
            discont: false,
        }
    }

    /// Insert extra instants at the turning points the capability reports,
    /// keeping the result continuous.
    pub fn with_turning(mut self, turn: &'a dyn SegmentTurn<A>) -> Self {
        self.turn = Some(turn);
        self
    }

    /// Treat the result as possibly discontinuous: the lift emits step
    /// pieces that change value at the capability's turning points.
    pub fn discontinuous(mut self, turn: &'a dyn SegmentTurn<A>) -> Self {
        self.turn = Some(turn);
        self.discont = true;
        self
    }
}

/// Configuration of a two-argument lifting call.
pub struct BinaryLift<'a, A: TemporalValue, B: TemporalValue, R: TemporalValue> {
    func: &'a dyn Fn(&A, &B) -> R,
    turn: Option<&'a dyn SyncTurn<A, B>>,
    crossing: Option<&'a dyn SyncCrossing<A, B>>,
    discont: bool,
}

impl<'a, A: TemporalValue, B: TemporalValue, R: TemporalValue> BinaryLift<'a, A, B, R> {
    /// A plain pointwise lift over synchronized arguments.
    pub fn new(func: &'a dyn Fn(&A, &B) -> R) -> Self {
        Self {
            func,
            turn: None,
            crossing: None,
            discont: false,
        }
    }

    /// Insert extra instants at the turning points the capability reports,
    /// keeping the result continuous.
    pub fn with_turning(mut self, turn: &'a dyn SyncTurn<A, B>) -> Self {
        self.turn = Some(turn);
        self
    }

    /// Also sample both arguments wherever their segments cross.
    pub fn with_crossing(mut self, crossing: &'a dyn SyncCrossing<A, B>) -> Self {
        self.crossing = Some(crossing);
        self
    }

    /// Treat the result as possibly discontinuous (see [`UnaryLift`]).
    pub fn discontinuous(mut self, turn: &'a dyn SyncTurn<A, B>) -> Self {
        self.turn = Some(turn);
        self.discont = true;
        self
    }
}

/// Interpolation of a lifted result given the input interpolation.
fn result_interp(input: Interpolation, result_continuous: bool, discont: bool) -> Interpolation {
    match input {
        Interpolation::Discrete => Interpolation::Discrete,
        Interpolation::Step => Interpolation::Step,
        Interpolation::Linear => {
            if result_continuous && !discont {
                Interpolation::Linear
            } else {
                Interpolation::Step
            }
        }
    }
}

/// Apply a one-argument lift, producing a temporal value of the result
/// type with the same definition domain.
pub fn apply_unary<A, R>(temp: &Temporal<A>, lift: &UnaryLift<'_, A, R>) -> Result<Temporal<R>>
where
    A: TemporalValue,
    R: TemporalValue,
{
    match temp.form() {
        TemporalForm::Instant(inst) => Ok(Temporal::Instant(inst.map(lift.func))),
        TemporalForm::Discrete(seq) => {
            let instants = seq.instants().iter().map(|i| i.map(lift.func)).collect();
            Ok(Temporal::Sequence(TSequence::discrete(instants)?))
        }
        TemporalForm::Continuous(seqs) => {
            let mut out = Vec::with_capacity(seqs.len());
            for seq in seqs {
                out.extend(lift_unary_sequence(seq, lift)?);
            }
            Temporal::from_sequences(out)
        }
    }
}

fn lift_unary_sequence<A, R>(
    seq: &TSequence<A>,
    lift: &UnaryLift<'_, A, R>,
) -> Result<Vec<TSequence<R>>>
where
    A: TemporalValue,
    R: TemporalValue,
{
    let interp = seq.interpolation();
    let turning = lift
        .turn
        .filter(|_| interp == Interpolation::Linear && !seq.is_instantaneous());

    let Some(turn) = turning else {
        // Pointwise map, instant count preserved
        let instants: Vec<TInstant<R>> =
            seq.instants().iter().map(|i| i.map(lift.func)).collect();
        let out = TSequence::new(
            instants,
            seq.lower_inc(),
            seq.upper_inc(),
            result_interp(interp, R::CONTINUOUS, lift.discont),
        )?;
        return Ok(vec![out]);
    };

    // Cuts: every existing instant plus every turning point inside a segment
    let mut cuts: Vec<DateTime<Utc>> = Vec::with_capacity(seq.num_instants());
    let instants = seq.instants();
    let last_segment = instants.len() - 2;
    for (k, pair) in instants.windows(2).enumerate() {
        let (lower, upper) = (pair[0].timestamp(), pair[1].timestamp());
        cuts.push(lower);
        let lower_inc = k != 0 || seq.lower_inc();
        let upper_inc = k != last_segment || seq.upper_inc();
        let points = turn
            .turning_points(pair[0].value(), pair[1].value(), lower, upper)
            .clamp_to_bounds(lower, upper, lower_inc, upper_inc);
        for t in points.times {
            if t > lower && t < upper {
                cuts.push(t);
            }
        }
    }
    cuts.push(seq.end().timestamp());

    let sample = |t: DateTime<Utc>| (lift.func)(&seq.sample_at(t));
    if lift.discont {
        assemble_step_pieces(&cuts, seq.lower_inc(), seq.upper_inc(), sample)
    } else {
        let instants: Vec<TInstant<R>> =
            cuts.iter().map(|t| TInstant::new(sample(*t), *t)).collect();
        Ok(vec![TSequence::new(
            instants,
            seq.lower_inc(),
            seq.upper_inc(),
            result_interp(interp, R::CONTINUOUS, false),
        )?])
    }
}

/// Synchronize two sequences: restrict both to the intersection of their
/// time spans and resample each at the union of the restricted timestamp
/// sets, optionally adding instants where the segments cross. Returns
/// `None` when the time spans do not intersect.
pub fn synchronize<A, B>(
    a: &TSequence<A>,
    b: &TSequence<B>,
    crossing: Option<&dyn SyncCrossing<A, B>>,
) -> Result<Option<(TSequence<A>, TSequence<B>)>>
where
    A: TemporalValue,
    B: TemporalValue,
{
    if !a.is_instantaneous()
        && !b.is_instantaneous()
        && a.interpolation() != b.interpolation()
    {
        return Err(TemporaError::InterpolationMismatch(format!(
            "cannot synchronize {:?} with {:?} interpolation",
            a.interpolation(),
            b.interpolation()
        )));
    }

    let Some(inter) = a.time_span().intersection(&b.time_span()) else {
        return Ok(None);
    };
    let (Some(ra), Some(rb)) = (a.at_span(&inter), b.at_span(&inter)) else {
        return Ok(None);
    };

    // Union of both timestamp sets, ascending
    let mut times: Vec<DateTime<Utc>> = Vec::with_capacity(ra.num_instants() + rb.num_instants());
    {
        let (ta, tb) = (ra.instants(), rb.instants());
        let (mut i, mut j) = (0, 0);
        while i < ta.len() || j < tb.len() {
            let next = match (ta.get(i), tb.get(j)) {
                (Some(x), Some(y)) => {
                    if x.timestamp() <= y.timestamp() {
                        if x.timestamp() == y.timestamp() {
                            j += 1;
                        }
                        i += 1;
                        x.timestamp()
                    } else {
                        j += 1;
                        y.timestamp()
                    }
                }
                (Some(x), None) => {
                    i += 1;
                    x.timestamp()
                }
                (None, Some(y)) => {
                    j += 1;
                    y.timestamp()
                }
                (None, None) => break,
            };
            times.push(next);
        }
    }

    // Insert crossing instants between adjacent samples
    if let Some(cross) = crossing {
        let mut augmented: Vec<DateTime<Utc>> = Vec::with_capacity(times.len());
        for pair in times.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            augmented.push(u);
            let (a0, a1) = (ra.sample_at(u), ra.sample_at(v));
            let (b0, b1) = (rb.sample_at(u), rb.sample_at(v));
            if let Some(s) = cross.crossing(&a0, &a1, &b0, &b1) {
                let t = timestamp_at_fraction(u, v, s);
                if t > u && t < v {
                    augmented.push(t);
                }
            }
        }
        augmented.push(*times.last().expect("times is non-empty"));
        times = augmented;
    }

    let interp = if !ra.is_instantaneous() {
        ra.interpolation()
    } else {
        rb.interpolation()
    };
    let sa = TSequence::new(
        times
            .iter()
            .map(|t| TInstant::new(ra.sample_at(*t), *t))
            .collect(),
        inter.lower_inc(),
        inter.upper_inc(),
        interp,
    )?;
    let sb = TSequence::new(
        times
            .iter()
            .map(|t| TInstant::new(rb.sample_at(*t), *t))
            .collect(),
        inter.lower_inc(),
        inter.upper_inc(),
        interp,
    )?;
    Ok(Some((sa, sb)))
}

/// Apply a two-argument lift. Validates SRID and interpolation
/// compatibility before any computation; an empty time-domain intersection
/// is the valid outcome `Ok(None)`, not an error.
pub fn apply_binary<A, B, R>(
    a: &Temporal<A>,
    b: &Temporal<B>,
    lift: &BinaryLift<'_, A, B, R>,
) -> Result<Option<Temporal<R>>>
where
    A: TemporalValue,
    B: TemporalValue,
    R: TemporalValue,
{
    if let (Some(sa), Some(sb)) = (a.srid(), b.srid())
        && sa != sb
    {
        return Err(TemporaError::SridMismatch(sa, sb));
    }

    match (a.form(), b.form()) {
        (TemporalForm::Instant(ia), _) => {
            let Some(bv) = b.value_at(ia.timestamp()) else {
                return Ok(None);
            };
            Ok(Some(Temporal::Instant(ia.map(|av| (lift.func)(av, &bv)))))
        }
        (_, TemporalForm::Instant(ib)) => {
            let Some(av) = a.value_at(ib.timestamp()) else {
                return Ok(None);
            };
            Ok(Some(Temporal::Instant(ib.map(|bv| (lift.func)(&av, bv)))))
        }
        (TemporalForm::Discrete(da), _) => {
            let instants: Vec<TInstant<R>> = da
                .instants()
                .iter()
                .filter_map(|ia| {
                    b.value_at(ia.timestamp())
                        .map(|bv| ia.map(|av| (lift.func)(av, &bv)))
                })
                .collect();
            discrete_result(instants)
        }
        (_, TemporalForm::Discrete(db)) => {
            let instants: Vec<TInstant<R>> = db
                .instants()
                .iter()
                .filter_map(|ib| {
                    a.value_at(ib.timestamp())
                        .map(|av| ib.map(|bv| (lift.func)(&av, bv)))
                })
                .collect();
            discrete_result(instants)
        }
        (TemporalForm::Continuous(sas), TemporalForm::Continuous(sbs)) => {
            let mut out: Vec<TSequence<R>> = Vec::new();
            for sa in sas {
                for sb in sbs {
                    if !sa.time_span().overlaps(&sb.time_span()) {
                        continue;
                    }
                    let Some((ra, rb)) = synchronize(sa, sb, lift.crossing)? else {
                        continue;
                    };
                    out.extend(lift_synced_pair(&ra, &rb, lift)?);
                }
            }
            if out.is_empty() {
                Ok(None)
            } else {
                Temporal::from_sequences(out).map(Some)
            }
        }
    }
}

fn discrete_result<R: TemporalValue>(instants: Vec<TInstant<R>>) -> Result<Option<Temporal<R>>> {
    if instants.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Temporal::Sequence(TSequence::discrete(instants)?)))
    }
}

/// Lift one synchronized pair of sequences sharing identical timestamps.
fn lift_synced_pair<A, B, R>(
    ra: &TSequence<A>,
    rb: &TSequence<B>,
    lift: &BinaryLift<'_, A, B, R>,
) -> Result<Vec<TSequence<R>>>
where
    A: TemporalValue,
    B: TemporalValue,
    R: TemporalValue,
{
    debug_assert_eq!(ra.num_instants(), rb.num_instants());
    let interp = if !ra.is_instantaneous() {
        ra.interpolation()
    } else {
        rb.interpolation()
    };
    let turning = lift
        .turn
        .filter(|_| interp == Interpolation::Linear && !ra.is_instantaneous());

    let Some(turn) = turning else {
        let instants: Vec<TInstant<R>> = ra
            .instants()
            .iter()
            .zip(rb.instants())
            .map(|(ia, ib)| TInstant::new((lift.func)(ia.value(), ib.value()), ia.timestamp()))
            .collect();
        let out = TSequence::new(
            instants,
            ra.lower_inc(),
            ra.upper_inc(),
            result_interp(interp, R::CONTINUOUS, lift.discont),
        )?;
        return Ok(vec![out]);
    };

    let (ia, ib) = (ra.instants(), rb.instants());
    let mut cuts: Vec<DateTime<Utc>> = Vec::with_capacity(ia.len());
    let last_segment = ia.len() - 2;
    for k in 0..ia.len() - 1 {
        let (lower, upper) = (ia[k].timestamp(), ia[k + 1].timestamp());
        cuts.push(lower);
        let lower_inc = k != 0 || ra.lower_inc();
        let upper_inc = k != last_segment || ra.upper_inc();
        let points = turn
            .turning_points(
                ia[k].value(),
                ia[k + 1].value(),
                ib[k].value(),
                ib[k + 1].value(),
                lower,
                upper,
            )
            .clamp_to_bounds(lower, upper, lower_inc, upper_inc);
        for t in points.times {
            if t > lower && t < upper {
                cuts.push(t);
            }
        }
    }
    cuts.push(ra.end().timestamp());

    let sample = |t: DateTime<Utc>| (lift.func)(&ra.sample_at(t), &rb.sample_at(t));
    if lift.discont {
        assemble_step_pieces(&cuts, ra.lower_inc(), ra.upper_inc(), sample)
    } else {
        let instants: Vec<TInstant<R>> =
            cuts.iter().map(|t| TInstant::new(sample(*t), *t)).collect();
        Ok(vec![TSequence::new(
            instants,
            ra.lower_inc(),
            ra.upper_inc(),
            result_interp(interp, R::CONTINUOUS, false),
        )?])
    }
}

/// Assemble the step pieces of a discontinuous lift into maximal step
/// sequences.
///
/// `cuts` are the ascending timestamps where the result may change value:
/// every source instant plus every turning point. The value at a cut comes
/// from sampling the lifted function there; the value of the open interval
/// between two cuts comes from sampling at its midpoint (the orientation
/// reference point). A new sequence starts exactly where the value changes
/// immediately after a cut owned by the previous piece.
fn assemble_step_pieces<R, F>(
    cuts: &[DateTime<Utc>],
    lower_inc: bool,
    upper_inc: bool,
    sample: F,
) -> Result<Vec<TSequence<R>>>
where
    R: TemporalValue,
    F: Fn(DateTime<Utc>) -> R,
{
    debug_assert!(!cuts.is_empty());
    if cuts.len() == 1 {
        let inst = TInstant::new(sample(cuts[0]), cuts[0]);
        return Ok(vec![TSequence::new(
            vec![inst],
            true,
            true,
            Interpolation::Step,
        )?]);
    }

    let open_value = |i: usize| {
        let mid = timestamp_at_fraction(cuts[i], cuts[i + 1], 0.5);
        sample(mid)
    };

    // Runs of instants; every run closed mid-assembly owns its final cut
    // (inclusive upper), only the last run takes the sequence's upper bound
    let mut runs: Vec<(Vec<TInstant<R>>, bool)> = Vec::new();
    let mut cur: Vec<TInstant<R>> = Vec::new();
    let mut cur_lower_inc = lower_inc;

    // First instant: the cut's own value when the bound is inclusive, the
    // value just after it when exclusive (the excluded limit is unobservable)
    let first_value = if lower_inc {
        sample(cuts[0])
    } else {
        open_value(0)
    };
    cur.push(TInstant::new(first_value, cuts[0]));

    for i in 0..cuts.len() - 1 {
        let open = open_value(i);
        let last_value = cur.last().expect("current run is never empty").value();
        if *last_value != open {
            // The value changes just after an owned cut: close here and
            // reopen exclusively with the new value
            runs.push((std::mem::take(&mut cur), cur_lower_inc));
            cur_lower_inc = false;
            cur.push(TInstant::new(open.clone(), cuts[i]));
        }
        let is_final_cut = i + 1 == cuts.len() - 1;
        let point_value = if is_final_cut && !upper_inc {
            // Closing sample at an excluded bound holds the open value
            open
        } else {
            sample(cuts[i + 1])
        };
        cur.push(TInstant::new(point_value, cuts[i + 1]));
    }
    runs.push((cur, cur_lower_inc));

    let total = runs.len();
    runs.into_iter()
        .enumerate()
        .map(|(idx, (instants, run_lower_inc))| {
            let run_upper_inc = if idx + 1 == total { upper_inc } else { true };
            normalize_step_instants(instants, run_lower_inc, run_upper_inc)
        })
        .collect()
}

/// Drop interior instants whose value repeats the previous one; under step
/// interpolation they are unobservable.
fn normalize_step_instants<R: TemporalValue>(
    instants: Vec<TInstant<R>>,
    lower_inc: bool,
    upper_inc: bool,
) -> Result<TSequence<R>> {
    let last = instants.len() - 1;
    let kept: Vec<TInstant<R>> = instants
        .into_iter()
        .enumerate()
        .scan(None::<R>, |prev, (i, inst)| {
            let redundant =
                i != 0 && i != last && prev.as_ref() == Some(inst.value());
            if !redundant {
                *prev = Some(inst.value().clone());
            }
            Some((redundant, inst))
        })
        .filter_map(|(redundant, inst)| (!redundant).then_some(inst))
        .collect();
    TSequence::new(kept, lower_inc, upper_inc, Interpolation::Step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::TurningPoints;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, day, 0, 0, 0).unwrap()
    }

    fn linear(values: &[(f64, u32)]) -> TSequence<f64> {
        let instants = values
            .iter()
            .map(|(v, d)| TInstant::new(*v, ts(*d)))
            .collect();
        TSequence::new(instants, true, true, Interpolation::Linear).unwrap()
    }

    #[test]
    fn test_apply_unary_instant() {
        let t = Temporal::instant(2.0f64, ts(1));
        let double = |v: &f64| v * 2.0;
        let out = apply_unary(&t, &UnaryLift::new(&double)).unwrap();
        assert_eq!(out.value_at(ts(1)), Some(4.0));
    }

    #[test]
    fn test_apply_unary_preserves_instant_count() {
        let seq = Temporal::Sequence(linear(&[(1.0, 1), (3.0, 3), (5.0, 5)]));
        let negate = |v: &f64| -v;
        let out = apply_unary(&seq, &UnaryLift::new(&negate)).unwrap();
        assert_eq!(out.num_instants(), 3);
        assert_eq!(out.value_at(ts(2)), Some(-2.0));
        assert_eq!(out.interpolation(), Interpolation::Linear);
    }

    #[test]
    fn test_apply_unary_continuous_to_step() {
        let seq = Temporal::Sequence(linear(&[(1.0, 1), (5.0, 5)]));
        let to_int = |v: &f64| v.floor() as i64;
        let out = apply_unary(&seq, &UnaryLift::new(&to_int)).unwrap();
        assert_eq!(out.interpolation(), Interpolation::Step);
    }

    #[test]
    fn test_synchronize_domain_is_intersection() {
        let a = linear(&[(1.0, 1), (5.0, 5)]);
        let b = linear(&[(0.0, 3), (4.0, 7)]);
        let (ra, rb) = synchronize(&a, &b, None).unwrap().unwrap();
        assert_eq!(ra.time_span().lower(), ts(3));
        assert_eq!(ra.time_span().upper(), ts(5));
        assert_eq!(ra.time_span(), rb.time_span());
        // Values resampled at the shared timestamps
        assert_eq!(*ra.start().value(), 3.0);
        assert_eq!(*rb.start().value(), 0.0);
        assert_eq!(*ra.end().value(), 5.0);
        assert_eq!(*rb.end().value(), 2.0);
    }

    #[test]
    fn test_synchronize_no_overlap() {
        let a = linear(&[(1.0, 1), (5.0, 3)]);
        let b = linear(&[(0.0, 5), (4.0, 7)]);
        assert!(synchronize(&a, &b, None).unwrap().is_none());
    }

    #[test]
    fn test_synchronize_merges_timestamps() {
        let a = linear(&[(0.0, 1), (4.0, 5)]);
        let b = linear(&[(10.0, 1), (20.0, 3), (30.0, 5)]);
        let (ra, rb) = synchronize(&a, &b, None).unwrap().unwrap();
        assert_eq!(ra.num_instants(), 3);
        assert_eq!(rb.num_instants(), 3);
        assert_eq!(*ra.instants()[1].value(), 2.0);
    }

    #[test]
    fn test_synchronize_with_crossing() {
        let a = linear(&[(0.0, 1), (4.0, 5)]);
        let b = linear(&[(4.0, 1), (0.0, 5)]);
        let cross = |a0: &f64, a1: &f64, b0: &f64, b1: &f64| f64::crossing(a0, a1, b0, b1);
        let (ra, rb) = synchronize(&a, &b, Some(&cross)).unwrap().unwrap();
        assert_eq!(ra.num_instants(), 3);
        assert_eq!(ra.instants()[1].timestamp(), ts(3));
        assert_eq!(*ra.instants()[1].value(), 2.0);
        assert_eq!(*rb.instants()[1].value(), 2.0);
    }

    #[test]
    fn test_apply_binary_sum() {
        let a = Temporal::Sequence(linear(&[(1.0, 1), (5.0, 5)]));
        let b = Temporal::Sequence(linear(&[(10.0, 3), (12.0, 7)]));
        let add = |x: &f64, y: &f64| x + y;
        let out = apply_binary(&a, &b, &BinaryLift::new(&add)).unwrap().unwrap();
        assert_eq!(out.time_span().unwrap().lower(), ts(3));
        assert_eq!(out.time_span().unwrap().upper(), ts(5));
        assert_eq!(out.value_at(ts(3)), Some(13.0));
        assert_eq!(out.value_at(ts(5)), Some(16.0));
    }

    #[test]
    fn test_apply_binary_no_overlap_is_none() {
        let a = Temporal::Sequence(linear(&[(1.0, 1), (5.0, 3)]));
        let b = Temporal::Sequence(linear(&[(10.0, 5), (12.0, 7)]));
        let add = |x: &f64, y: &f64| x + y;
        assert!(apply_binary(&a, &b, &BinaryLift::new(&add)).unwrap().is_none());
    }

    #[test]
    fn test_apply_binary_instant_sampling() {
        let a = Temporal::instant(100.0f64, ts(3));
        let b = Temporal::Sequence(linear(&[(0.0, 1), (4.0, 5)]));
        let add = |x: &f64, y: &f64| x + y;
        let out = apply_binary(&a, &b, &BinaryLift::new(&add)).unwrap().unwrap();
        assert_eq!(out.num_instants(), 1);
        assert_eq!(out.value_at(ts(3)), Some(102.0));
    }

    #[test]
    fn test_apply_binary_discrete_and_continuous() {
        let a = Temporal::Sequence(
            TSequence::discrete(vec![
                TInstant::new(1.0f64, ts(2)),
                TInstant::new(2.0f64, ts(4)),
                TInstant::new(3.0f64, ts(9)),
            ])
            .unwrap(),
        );
        let b = Temporal::Sequence(linear(&[(0.0, 1), (4.0, 5)]));
        let add = |x: &f64, y: &f64| x + y;
        let out = apply_binary(&a, &b, &BinaryLift::new(&add)).unwrap().unwrap();
        // ts(9) is outside b's domain
        assert_eq!(out.num_instants(), 2);
        assert_eq!(out.value_at(ts(2)), Some(2.0));
        assert_eq!(out.value_at(ts(4)), Some(5.0));
    }

    #[test]
    fn test_discontinuous_lift_emits_pieces() {
        // Condition: a <= b, with segments crossing at day 3: the true piece
        // owns the crossing instant, the false piece reopens exclusively
        let a = Temporal::Sequence(linear(&[(0.0, 1), (4.0, 5)]));
        let b = Temporal::Sequence(linear(&[(4.0, 1), (0.0, 5)]));
        let le = |x: &f64, y: &f64| x <= y;
        let turn = |a0: &f64, a1: &f64, b0: &f64, b1: &f64, lower: DateTime<Utc>, upper: DateTime<Utc>| {
            match f64::crossing(a0, a1, b0, b1) {
                Some(s) => TurningPoints::one(timestamp_at_fraction(lower, upper, s)),
                None => TurningPoints::none(),
            }
        };
        let lift = BinaryLift::new(&le).discontinuous(&turn);
        let out = apply_binary(&a, &b, &lift).unwrap().unwrap();

        match &out {
            Temporal::SequenceSet(set) => {
                assert_eq!(set.num_sequences(), 2);
                let first = &set.sequences()[0];
                let second = &set.sequences()[1];
                // true on [day1, day3], false on (day3, day5]
                assert_eq!(*first.start().value(), true);
                assert_eq!(first.time_span().upper(), ts(3));
                assert!(first.upper_inc());
                assert_eq!(*second.instants()[0].value(), false);
                assert!(!second.lower_inc());
                assert_eq!(second.time_span().upper(), ts(5));
            }
            other => panic!("expected sequence set, got {}", other.subtype_name()),
        }
        assert_eq!(out.value_at(ts(2)), Some(true));
        assert_eq!(out.value_at(ts(4)), Some(false));
    }

    #[test]
    fn test_condition_flips_across_turning_point() {
        let a = Temporal::Sequence(linear(&[(0.0, 1), (4.0, 5)]));
        let b = Temporal::Sequence(linear(&[(4.0, 1), (0.0, 5)]));
        let lt = |x: &f64, y: &f64| x < y;
        let turn = |a0: &f64, a1: &f64, b0: &f64, b1: &f64, lower: DateTime<Utc>, upper: DateTime<Utc>| {
            match f64::crossing(a0, a1, b0, b1) {
                Some(s) => TurningPoints::one(timestamp_at_fraction(lower, upper, s)),
                None => TurningPoints::none(),
            }
        };
        let lift = BinaryLift::new(&lt).discontinuous(&turn);
        let out = apply_binary(&a, &b, &lift).unwrap().unwrap();
        let just_before = ts(3) - chrono::TimeDelta::seconds(1);
        let just_after = ts(3) + chrono::TimeDelta::seconds(1);
        assert_eq!(out.value_at(just_before), Some(true));
        assert_eq!(out.value_at(just_after), Some(false));
    }

    #[test]
    fn test_srid_mismatch_fails_fast() {
        use crate::value::GeomPoint;
        let a = Temporal::instant(GeomPoint::new(0.0, 0.0).with_srid(3857), ts(1));
        let b = Temporal::instant(GeomPoint::new(1.0, 1.0).with_srid(2154), ts(1));
        let dist = |x: &GeomPoint, y: &GeomPoint| x.distance(y);
        let result = apply_binary(&a, &b, &BinaryLift::new(&dist));
        assert!(matches!(result, Err(TemporaError::SridMismatch(_, _))));
    }

    #[test]
    fn test_interpolation_mismatch_fails() {
        let step = TSequence::new(
            vec![TInstant::new(1.0, ts(1)), TInstant::new(2.0, ts(5))],
            true,
            true,
            Interpolation::Step,
        )
        .unwrap();
        let lin = linear(&[(1.0, 1), (5.0, 5)]);
        let result = synchronize(&lin, &step, None);
        assert!(matches!(
            result,
            Err(TemporaError::InterpolationMismatch(_))
        ));
    }
}
