use chrono::{DateTime, TimeZone, Utc};
use tempora::ops::{tadd, tdwithin};
use tempora::prelude::*;
use tempora::value::TemporalValue;
use tempora::{Span, SpanSet, apply_binary, BinaryLift};

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

#[test]
fn test_worked_example_distance_within_threshold() {
    let a: Temporal<GeomPoint> = "[POINT(1 1)@2000-01-01, POINT(5 5)@2000-01-05]"
        .parse()
        .expect("valid point sequence");
    let b: Temporal<GeomPoint> = "[POINT(1 3)@2000-01-01, POINT(5 3)@2000-01-05]"
        .parse()
        .expect("valid point sequence");

    let within = tdwithin(&a, &b, 1.0)
        .expect("compatible arguments")
        .expect("overlapping time domains");

    // Two turning points at day 2 and day 4, false outside, true inside
    assert_eq!(
        within.to_string(),
        "{[f@2000-01-01 00:00:00+00:00, t@2000-01-02 00:00:00+00:00, \
         t@2000-01-04 00:00:00+00:00], (f@2000-01-04 00:00:00+00:00, \
         f@2000-01-05 00:00:00+00:00]}"
    );

    let when = within.when_true().unwrap().expect("condition holds somewhere");
    assert_eq!(when.num_spans(), 1);
    assert_eq!(when.spans()[0].lower(), ts(2));
    assert_eq!(when.spans()[0].upper(), ts(4));
    assert!(when.spans()[0].lower_inc());
    assert!(when.spans()[0].upper_inc());
}

#[test]
fn test_span_text_round_trip_property() {
    for lower in -3i64..3 {
        for width in 1i64..4 {
            for (li, ui) in [(true, true), (true, false), (false, true), (false, false)] {
                let span = Span::new(lower, lower + width, li, ui).unwrap();
                let back: Span<i64> = span.to_string().parse().unwrap();
                assert_eq!(back, span, "round trip failed for {}", span);
            }
        }
    }
    for (lower, upper) in [(0.5, 1.5), (-2.25, 0.0), (1e-6, 1e6)] {
        for (li, ui) in [(true, true), (true, false), (false, true)] {
            let span = Span::new(lower, upper, li, ui).unwrap();
            let back: Span<f64> = span.to_string().parse().unwrap();
            assert_eq!(back, span);
        }
    }
}

#[test]
fn test_spanset_normalization_idempotence() {
    let raw = vec![
        Span::new(4.0f64, 9.0, true, false).unwrap(),
        Span::new(1.0f64, 5.0, true, false).unwrap(),
        Span::new(9.0f64, 12.0, true, true).unwrap(),
        Span::new(20.0f64, 30.0, false, false).unwrap(),
    ];
    let once = SpanSet::new(raw).unwrap();
    let twice = SpanSet::new(once.spans().to_vec()).unwrap();
    assert_eq!(once, twice);
    // Everything contiguous merged into one span
    assert_eq!(once.num_spans(), 2);
}

#[test]
fn test_synchronization_domain_law() {
    // a is defined on [1,3] and [5,9]; b on [2,7]
    let a = Temporal::SequenceSet(
        TSequenceSet::new(vec![
            TSequence::new(
                vec![TInstant::new(1.0, ts(1)), TInstant::new(3.0, ts(3))],
                true,
                true,
                Interpolation::Linear,
            )
            .unwrap(),
            TSequence::new(
                vec![TInstant::new(5.0, ts(5)), TInstant::new(9.0, ts(9))],
                true,
                true,
                Interpolation::Linear,
            )
            .unwrap(),
        ])
        .unwrap(),
    );
    let b = linear_f64(&[(0.0, 2), (10.0, 7)]);

    let sum = tadd(&a, &b).unwrap().expect("domains overlap");
    let result_domain = sum.time_domain().unwrap();

    // Expected: intersection of {[1,3], [5,9]} with [2,7] = {[2,3], [5,7]}
    assert_eq!(result_domain.num_spans(), 2);
    assert_eq!(result_domain.spans()[0].lower(), ts(2));
    assert_eq!(result_domain.spans()[0].upper(), ts(3));
    assert_eq!(result_domain.spans()[1].lower(), ts(5));
    assert_eq!(result_domain.spans()[1].upper(), ts(7));

    // Empty intersection reports "no overlap", not an error
    let far = linear_f64(&[(0.0, 20), (1.0, 25)]);
    assert!(tadd(&a, &far).unwrap().is_none());
}

#[test]
fn test_turning_point_matches_analytic_crossing() {
    // A point moving x = 0..10 over days 1..11 against a fixed target at
    // (5, 0) with threshold 1: within distance exactly on x in [4, 6],
    // i.e. days 5 through 7.
    let moving: Temporal<GeomPoint> = "[POINT(0 0)@2000-01-01, POINT(10 0)@2000-01-11]"
        .parse()
        .unwrap();
    let target = GeomPoint::new(5.0, 0.0);
    let within = tempora::ops::tdwithin_value(&moving, &target, 1.0).unwrap();

    let when = within.when_true().unwrap().unwrap();
    assert_eq!(when.num_spans(), 1);
    assert_eq!(when.spans()[0].lower(), ts(5));
    assert_eq!(when.spans()[0].upper(), ts(7));

    // The condition flips across each turning point
    let second = chrono::TimeDelta::seconds(1);
    assert_eq!(within.value_at(ts(5) - second), Some(false));
    assert_eq!(within.value_at(ts(5) + second), Some(true));
    assert_eq!(within.value_at(ts(7) - second), Some(true));
    assert_eq!(within.value_at(ts(7) + second), Some(false));
}

#[test]
fn test_skiplist_batch_order_independence() {
    // Count aggregation over many fragments, spliced in different batch
    // splits and orders, must agree everywhere
    let fragments: Vec<Temporal<f64>> = (0..12)
        .map(|i| linear_f64(&[(i as f64, i + 1), ((i + 2) as f64, i + 3)]))
        .collect();

    let run = |order: &[usize], chunk: usize| {
        let mut agg = CountAggregate::new(&AggConfig::default());
        for chunk_ids in order.chunks(chunk) {
            for &i in chunk_ids {
                agg.add(&fragments[i]).unwrap();
            }
        }
        agg.finalize().unwrap().unwrap()
    };

    let forward: Vec<usize> = (0..12).collect();
    let backward: Vec<usize> = (0..12).rev().collect();
    let interleaved: Vec<usize> = vec![0, 6, 1, 7, 2, 8, 3, 9, 4, 10, 5, 11];

    let reference = run(&forward, 12);
    for (order, chunk) in [
        (&forward, 1usize),
        (&backward, 3),
        (&interleaved, 4),
        (&backward, 1),
    ] {
        let other = run(order, chunk);
        for day in 1..=15u32 {
            assert_eq!(
                other.value_at(ts(day)),
                reference.value_at(ts(day)),
                "count diverges at day {day}"
            );
        }
    }
}

#[test]
fn test_span_containment_law() {
    // Exhaustive over small integer spans
    let spans: Vec<Span<i64>> = (0..6)
        .flat_map(|l| ((l + 1)..7).map(move |u| Span::new(l, u, true, false).unwrap()))
        .collect();
    for a in &spans {
        for b in &spans {
            let expected = (b.lower()..b.upper()).all(|v| a.contains_value(v));
            assert_eq!(a.contains_span(b), expected, "{} contains {}", a, b);
        }
    }

    // Boundary sampling for timestamp spans
    let a = Span::new(ts(1), ts(9), true, false).unwrap();
    let inside = Span::new(ts(2), ts(9), true, false).unwrap();
    let closed_end = Span::new(ts(2), ts(9), true, true).unwrap();
    assert!(a.contains_span(&inside));
    assert!(!a.contains_span(&closed_end));
    assert!(a.contains_value(ts(1)));
    assert!(!a.contains_value(ts(9)));
}

#[test]
fn test_parse_compute_format_pipeline() {
    let a: Temporal<f64> = "[1@2000-01-01, 5@2000-01-05]".parse().unwrap();
    let b: Temporal<f64> = "[2@2000-01-03, 2@2000-01-07]".parse().unwrap();

    let sum = tadd(&a, &b).unwrap().unwrap();
    let rendered = sum.to_string();
    let reparsed: Temporal<f64> = rendered.parse().unwrap();
    assert_eq!(reparsed, sum);
    assert_eq!(sum.value_at(ts(4)), Some(6.0));
}

#[test]
fn test_lifting_with_custom_capability() {
    // A caller-supplied condition through the public seam: flag where the
    // two signals are closer than 0.5
    let a = linear_f64(&[(0.0, 1), (4.0, 5)]);
    let b = linear_f64(&[(2.0, 1), (2.0, 5)]);
    let close = |x: &f64, y: &f64| (x - y).abs() <= 0.5;
    let turn = |a0: &f64,
                a1: &f64,
                b0: &f64,
                b1: &f64,
                lower: DateTime<Utc>,
                upper: DateTime<Utc>| {
        // Difference is linear: solve |d0 + s (d1 - d0)| = 0.5
        let (d0, d1) = (a0 - b0, a1 - b1);
        let mut times = Vec::new();
        for threshold in [-0.5f64, 0.5] {
            let denom = d1 - d0;
            if denom.abs() > f64::EPSILON {
                let s = (threshold - d0) / denom;
                if s > 0.0 && s < 1.0 {
                    times.push(tempora::interp::timestamp_at_fraction(lower, upper, s));
                }
            }
        }
        times.sort();
        match times.len() {
            2 => tempora::TurningPoints::pair(times[0], times[1], true),
            1 => tempora::TurningPoints::one(times[0]),
            _ => tempora::TurningPoints::none(),
        }
    };
    let lift = BinaryLift::new(&close).discontinuous(&turn);
    let result = apply_binary(&a, &b, &lift).unwrap().unwrap();

    // |a - b| = |s*4 - 2| <= 0.5 for s in [0.375, 0.625]: days 2.5 to 3.5
    let half_day = chrono::TimeDelta::hours(12);
    assert_eq!(result.value_at(ts(2)), Some(false));
    assert_eq!(result.value_at(ts(2) + half_day), Some(true));
    assert_eq!(result.value_at(ts(3)), Some(true));
    assert_eq!(result.value_at(ts(3) + half_day), Some(true));
    assert_eq!(result.value_at(ts(4)), Some(false));
}

#[test]
fn test_merge_aggregate_across_workers() {
    // Two independent partial aggregates reconciled by a final combine,
    // mirroring one list spliced into the other
    let mut worker_a = MergeAggregate::<f64>::new(&AggConfig::default());
    worker_a
        .add(&linear_f64(&[(1.0, 1), (2.0, 3)]))
        .unwrap();
    let mut worker_b = MergeAggregate::<f64>::new(&AggConfig::default());
    worker_b
        .add(&linear_f64(&[(5.0, 5), (6.0, 7)]))
        .unwrap();

    for fragment in worker_b.fragments() {
        worker_a.add(&fragment).unwrap();
    }
    let combined = worker_a.finalize().unwrap().unwrap();
    assert_eq!(combined.value_at(ts(2)), Some(1.5));
    assert_eq!(combined.value_at(ts(6)), Some(5.5));
    assert_eq!(combined.value_at(ts(4)), None);
}

#[test]
fn test_text_value_formats() {
    let p = GeomPoint::new(1.0, 1.0);
    assert_eq!(p.format_value(), "POINT(1 1)");
    let q = GeomPoint::geodetic(-74.006, 40.7128);
    assert_eq!(q.format_value(), "SRID=4326;POINT(-74.006 40.7128)");
    assert_eq!(true.format_value(), "t");
    assert_eq!((1.5f64).format_value(), "1.5");
}
