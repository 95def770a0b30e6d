use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tempora::ops::{tdiv, tdwithin, tlt};
use tempora::prelude::*;
use tempora::{SkipList, SplitMix64, TemporaError};

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, day, 0, 0, 0).unwrap()
}

fn linear_f64(values: &[(f64, u32)]) -> Temporal<f64> {
    let instants = values
        .iter()
        .map(|(v, d)| TInstant::new(*v, ts(*d)))
        .collect();
    Temporal::Sequence(TSequence::new(instants, true, true, Interpolation::Linear).unwrap())
}

/// Test 1: instantaneous sequences degrade to point behavior
#[test]
fn test_instantaneous_sequence_operations() {
    let single = Temporal::Sequence(TSequence::from_instant(
        TInstant::new(2.0f64, ts(3)),
        Interpolation::Linear,
    ));
    let ramp = linear_f64(&[(0.0, 1), (4.0, 5)]);

    let sum = tempora::ops::tadd(&single, &ramp).unwrap().unwrap();
    assert_eq!(sum.num_instants(), 1);
    assert_eq!(sum.value_at(ts(3)), Some(4.0));
}

/// Test 2: a turning point landing on an exclusive bound is materialized
#[test]
fn test_turning_point_at_exclusive_bound() {
    // a crosses b exactly at day 3; restrict a to (day3, day5] so the
    // crossing sits on the excluded lower bound
    let a = linear_f64(&[(0.0, 1), (4.0, 5)]);
    let b = linear_f64(&[(2.0, 1), (2.0, 5)]);
    let cmp = tlt(&a, &b).unwrap().unwrap();
    // Before the crossing a < b, after it a > b; at day 3 they are equal
    assert_eq!(cmp.value_at(ts(2)), Some(true));
    assert_eq!(cmp.value_at(ts(3)), Some(false));
    assert_eq!(cmp.value_at(ts(4)), Some(false));

    let when = cmp.when_true().unwrap().unwrap();
    assert_eq!(when.num_spans(), 1);
    assert!(!when.spans()[0].upper_inc());
    assert_eq!(when.spans()[0].upper(), ts(3));
}

/// Test 3: tangential contact yields a single-instant true piece
#[test]
fn test_tangential_dwithin_contact() {
    let a: Temporal<GeomPoint> = "[POINT(0 0)@2000-01-01, POINT(4 0)@2000-01-05]"
        .parse()
        .unwrap();
    let b: Temporal<GeomPoint> = "[POINT(2 2)@2000-01-01, POINT(2 2)@2000-01-05]"
        .parse()
        .unwrap();
    // Closest approach is exactly 2 at day 3
    let within = tdwithin(&a, &b, 2.0).unwrap().unwrap();
    assert_eq!(within.value_at(ts(3)), Some(true));
    assert_eq!(within.value_at(ts(3) - TimeDelta::seconds(1)), Some(false));
    assert_eq!(within.value_at(ts(3) + TimeDelta::seconds(1)), Some(false));

    let when = within.when_true().unwrap().unwrap();
    assert_eq!(when.num_spans(), 1);
    assert_eq!(when.spans()[0].lower(), ts(3));
    assert_eq!(when.spans()[0].upper(), ts(3));
}

/// Test 4: geodetic points evaluate pointwise without analytic roots
#[test]
fn test_geodetic_dwithin_pointwise() {
    let a: Temporal<GeomPoint> =
        "[SRID=4326;POINT(-74.0060 40.7128)@2000-01-01, SRID=4326;POINT(-73.9352 40.7306)@2000-01-05]"
            .parse()
            .unwrap();
    let b: Temporal<GeomPoint> =
        "[SRID=4326;POINT(-74.0060 40.7128)@2000-01-01, SRID=4326;POINT(-74.0060 40.7128)@2000-01-05]"
            .parse()
            .unwrap();
    // Same start point: within 1km at the start, outside at the end
    let within = tdwithin(&a, &b, 1000.0).unwrap().unwrap();
    assert_eq!(within.value_at(ts(1)), Some(true));
    assert_eq!(within.value_at(ts(5)), Some(false));
}

/// Test 5: SRID mismatch fails before any computation
#[test]
fn test_srid_mismatch() {
    let a: Temporal<GeomPoint> = "[SRID=3857;POINT(0 0)@2000-01-01, SRID=3857;POINT(4 0)@2000-01-05]"
        .parse()
        .unwrap();
    let b: Temporal<GeomPoint> = "[POINT(2 2)@2000-01-01, POINT(2 2)@2000-01-05]"
        .parse()
        .unwrap();
    assert!(matches!(
        tdwithin(&a, &b, 1.0),
        Err(TemporaError::SridMismatch(3857, 0))
    ));
}

/// Test 6: division by a divisor touching zero at its boundary instant
#[test]
fn test_division_by_zero_at_boundary() {
    let a = linear_f64(&[(1.0, 1), (1.0, 5)]);
    let b = linear_f64(&[(4.0, 1), (0.0, 5)]);
    assert!(matches!(
        tdiv(&a, &b),
        Err(TemporaError::DivisionByZero(t)) if t == ts(5)
    ));
}

/// Test 7: span canonicalization overflow is a domain error
#[test]
fn test_span_overflow() {
    assert!(matches!(
        Span::new(0i64, i64::MAX, true, true),
        Err(TemporaError::ValueOutOfRange(_))
    ));
}

/// Test 8: large skip-list aggregation stays ordered
#[test]
fn test_large_aggregation() {
    let mut agg = SumAggregate::<f64>::new(&AggConfig::default());
    // 500 instants inserted in a scattered order
    for i in (0..500).rev() {
        let t = ts(1) + TimeDelta::minutes(i * 7);
        agg.add(&Temporal::instant(1.0f64, t)).unwrap();
    }
    let result = agg.finalize().unwrap().unwrap();
    assert_eq!(result.num_instants(), 500);
    assert_eq!(result.value_at(ts(1)), Some(1.0));
}

/// Test 9: seeded generators replay identical aggregation structures
#[test]
fn test_seeded_skiplist_replay() {
    let combine = |_old: &[Temporal<f64>], new: &[Temporal<f64>]| Ok(new.to_vec());
    let mut first = SkipList::with_rng(Box::new(SplitMix64::new(99)));
    let mut second = SkipList::with_rng(Box::new(SplitMix64::new(99)));
    for day in 1..20 {
        first
            .splice(&[Temporal::instant(day as f64, ts(day))], &combine)
            .unwrap();
        second
            .splice(&[Temporal::instant(day as f64, ts(day))], &combine)
            .unwrap();
    }
    assert_eq!(first.values(), second.values());
}

/// Test 10: sequences with identical boundary instants under one exclusive
/// bound survive the sequence-set invariant
#[test]
fn test_touching_sequences_with_jump() {
    let set: Temporal<bool> = "{[t@2000-01-01, t@2000-01-03], (f@2000-01-03, f@2000-01-05]}"
        .parse()
        .unwrap();
    assert_eq!(set.value_at(ts(3)), Some(true));
    assert_eq!(set.value_at(ts(4)), Some(false));

    // Both bounds inclusive with different values is a true overlap
    let overlap: std::result::Result<TSequenceSet<bool>, _> =
        "{[t@2000-01-01, t@2000-01-03], [f@2000-01-03, f@2000-01-05]}".parse();
    assert!(overlap.is_err());
}

/// Test 11: discrete sequences only combine at shared timestamps
#[test]
fn test_discrete_discrete_lifting() {
    let a: Temporal<i64> = "{1@2000-01-01, 2@2000-01-03, 3@2000-01-05}".parse().unwrap();
    let b: Temporal<i64> = "{10@2000-01-03, 20@2000-01-07}".parse().unwrap();
    let sum = tempora::ops::tadd(&a, &b).unwrap().unwrap();
    assert_eq!(sum.num_instants(), 1);
    assert_eq!(sum.value_at(ts(3)), Some(12));

    let c: Temporal<i64> = "{10@2000-01-02}".parse().unwrap();
    assert!(tempora::ops::tadd(&a, &c).unwrap().is_none());
}

/// Test 12: values at exclusive sequence bounds are undefined
#[test]
fn test_exclusive_bound_sampling() {
    let seq: Temporal<f64> = "(1@2000-01-01, 5@2000-01-05)".parse().unwrap();
    assert_eq!(seq.value_at(ts(1)), None);
    assert_eq!(seq.value_at(ts(5)), None);
    assert_eq!(seq.value_at(ts(3)), Some(3.0));
}

/// Test 13: aggregation rejects mixing without corrupting state
#[test]
fn test_aggregation_mixing_rejected() {
    let mut agg = SumAggregate::<f64>::new(&AggConfig::default());
    agg.add(&Temporal::instant(1.0f64, ts(1))).unwrap();
    let seq = linear_f64(&[(1.0, 2), (2.0, 4)]);
    assert!(agg.add(&seq).is_err());
    // The instant content survives the rejected splice
    let result = agg.finalize().unwrap().unwrap();
    assert_eq!(result.value_at(ts(1)), Some(1.0));
}
