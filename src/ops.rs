//! Lifted operations over temporal values.
//!
//! Every function here is a thin instantiation of the generic lifting
//! engine: a scalar function plus, where the derived result can change
//! between instants, the turning-point capability that pins down exactly
//! when. Temporal-versus-constant variants carry the `_value` suffix; the
//! directed subtraction/division variants replace the classic
//! argument-swap flag.

use crate::error::{Result, TemporaError};
use crate::interp::{EPSILON, Interpolation, TurningPoints, timestamp_at_fraction};
use crate::lift::{BinaryLift, UnaryLift, apply_binary, apply_unary};
use crate::span::Span;
use crate::spanset::SpanSet;
use crate::temporal::{Temporal, TemporalForm};
use crate::value::{GeomPoint, TemporalNumber, TemporalValue};
use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Temporal arithmetic
// ---------------------------------------------------------------------------

/// Pointwise sum of two temporal numbers over their common time domain.
pub fn tadd<V: TemporalNumber>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<V>>> {
    let func = |x: &V, y: &V| x.add(y);
    apply_binary(a, b, &BinaryLift::new(&func))
}

/// Pointwise difference `a - b`.
pub fn tsub<V: TemporalNumber>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<V>>> {
    let func = |x: &V, y: &V| x.sub(y);
    apply_binary(a, b, &BinaryLift::new(&func))
}

/// Pointwise product, with extra instants at the product's interior
/// extremum so linear approximations stay tight.
pub fn tmul<V: TemporalNumber>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<V>>> {
    let func = |x: &V, y: &V| x.mul(y);
    let turn = |a0: &V, a1: &V, b0: &V, b1: &V, lower: DateTime<Utc>, upper: DateTime<Utc>| {
        product_extremum(
            a0.to_f64(),
            a1.to_f64(),
            b0.to_f64(),
            b1.to_f64(),
            lower,
            upper,
        )
    };
    apply_binary(a, b, &BinaryLift::new(&func).with_turning(&turn))
}

/// Pointwise quotient `a / b`.
///
/// # Errors
///
/// [`TemporaError::DivisionByZero`] when the divisor reaches zero anywhere
/// inside its definition domain.
pub fn tdiv<V: TemporalNumber>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<V>>> {
    if let Some(at) = divisor_zero(b)? {
        return Err(TemporaError::DivisionByZero(at));
    }
    // Divisor vetted above; the fallback is unreachable
    let func = |x: &V, y: &V| x.checked_div(y).unwrap_or_else(|| V::from_f64(0.0));
    apply_binary(a, b, &BinaryLift::new(&func))
}

/// Add a constant to a temporal number.
pub fn tadd_value<V: TemporalNumber>(temp: &Temporal<V>, value: &V) -> Result<Temporal<V>> {
    let func = |x: &V| x.add(value);
    apply_unary(temp, &UnaryLift::new(&func))
}

/// Subtract a constant from a temporal number.
pub fn tsub_value<V: TemporalNumber>(temp: &Temporal<V>, value: &V) -> Result<Temporal<V>> {
    let func = |x: &V| x.sub(value);
    apply_unary(temp, &UnaryLift::new(&func))
}

/// Subtract a temporal number from a constant: `value - temp`.
pub fn tsub_value_temporal<V: TemporalNumber>(
    value: &V,
    temp: &Temporal<V>,
) -> Result<Temporal<V>> {
    let func = |x: &V| value.sub(x);
    apply_unary(temp, &UnaryLift::new(&func))
}

/// Scale a temporal number by a constant.
pub fn tmul_value<V: TemporalNumber>(temp: &Temporal<V>, value: &V) -> Result<Temporal<V>> {
    let func = |x: &V| x.mul(value);
    apply_unary(temp, &UnaryLift::new(&func))
}

/// Divide a temporal number by a constant.
pub fn tdiv_value<V: TemporalNumber>(temp: &Temporal<V>, value: &V) -> Result<Temporal<V>> {
    if value.is_zero() {
        return Err(TemporaError::InvalidInput(
            "division of a temporal value by constant zero".into(),
        ));
    }
    let func = |x: &V| x.checked_div(value).unwrap_or_else(|| V::from_f64(0.0));
    apply_unary(temp, &UnaryLift::new(&func))
}

/// Interior extremum of the product of two linear segments.
fn product_extremum(
    a0: f64,
    a1: f64,
    b0: f64,
    b1: f64,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
) -> TurningPoints {
    let (da, db) = (a1 - a0, b1 - b0);
    let denom = 2.0 * da * db;
    if denom.abs() < EPSILON {
        return TurningPoints::none();
    }
    let s = -(a0 * db + b0 * da) / denom;
    if s > EPSILON && s < 1.0 - EPSILON {
        TurningPoints::one(timestamp_at_fraction(lower, upper, s))
    } else {
        TurningPoints::none()
    }
}

/// First timestamp at which a divisor reaches zero, scanning both the
/// recorded instants and the interior of linear segments.
fn divisor_zero<V: TemporalNumber>(divisor: &Temporal<V>) -> Result<Option<DateTime<Utc>>> {
    let zero_at_instant = |temp: &Temporal<V>| -> Option<DateTime<Utc>> {
        match temp.form() {
            TemporalForm::Instant(inst) => inst.value().is_zero().then(|| inst.timestamp()),
            TemporalForm::Discrete(seq) => seq
                .instants()
                .iter()
                .find(|i| i.value().is_zero())
                .map(|i| i.timestamp()),
            TemporalForm::Continuous(seqs) => seqs
                .iter()
                .flat_map(|s| s.instants())
                .find(|i| i.value().is_zero())
                .map(|i| i.timestamp()),
        }
    };
    if let Some(at) = zero_at_instant(divisor) {
        return Ok(Some(at));
    }
    if let TemporalForm::Continuous(seqs) = divisor.form() {
        for seq in seqs {
            if seq.interpolation() != Interpolation::Linear {
                continue;
            }
            for pair in seq.instants().windows(2) {
                let (v0, v1) = (pair[0].value().to_f64(), pair[1].value().to_f64());
                if (v0 < 0.0) != (v1 < 0.0) {
                    let s = v0 / (v0 - v1);
                    return Ok(Some(timestamp_at_fraction(
                        pair[0].timestamp(),
                        pair[1].timestamp(),
                        s,
                    )));
                }
            }
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Temporal comparisons
// ---------------------------------------------------------------------------

fn crossing_turn<V: TemporalValue>(
    a0: &V,
    a1: &V,
    b0: &V,
    b1: &V,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
) -> TurningPoints {
    match V::crossing(a0, a1, b0, b1) {
        Some(s) => TurningPoints::one(timestamp_at_fraction(lower, upper, s)),
        None => TurningPoints::none(),
    }
}

fn tcomp<V: TemporalValue>(
    a: &Temporal<V>,
    b: &Temporal<V>,
    op: fn(&V, &V) -> bool,
) -> Result<Option<Temporal<bool>>> {
    let func = |x: &V, y: &V| op(x, y);
    let turn = crossing_turn::<V>;
    apply_binary(a, b, &BinaryLift::new(&func).discontinuous(&turn))
}

fn tcomp_value<V: TemporalValue>(
    temp: &Temporal<V>,
    value: &V,
    op: fn(&V, &V) -> bool,
) -> Result<Temporal<bool>> {
    let func = |x: &V| op(x, value);
    // A constant is a degenerate segment; the crossing seam covers it
    let turn = |a0: &V, a1: &V, lower: DateTime<Utc>, upper: DateTime<Utc>| {
        crossing_turn(a0, a1, value, value, lower, upper)
    };
    apply_unary(temp, &UnaryLift::new(&func).discontinuous(&turn))
}

fn lt<V: PartialOrd>(x: &V, y: &V) -> bool {
    x < y
}

fn le<V: PartialOrd>(x: &V, y: &V) -> bool {
    x <= y
}

fn gt<V: PartialOrd>(x: &V, y: &V) -> bool {
    x > y
}

fn ge<V: PartialOrd>(x: &V, y: &V) -> bool {
    x >= y
}

fn eq<V: PartialEq>(x: &V, y: &V) -> bool {
    x == y
}

fn ne<V: PartialEq>(x: &V, y: &V) -> bool {
    x != y
}

/// Temporal equality of two temporal values.
pub fn teq<V: TemporalValue>(a: &Temporal<V>, b: &Temporal<V>) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, eq::<V>)
}

/// Temporal inequality.
pub fn tne<V: TemporalValue>(a: &Temporal<V>, b: &Temporal<V>) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, ne::<V>)
}

/// Temporal `a < b`.
pub fn tlt<V: TemporalValue + PartialOrd>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, lt::<V>)
}

/// Temporal `a <= b`.
pub fn tle<V: TemporalValue + PartialOrd>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, le::<V>)
}

/// Temporal `a > b`.
pub fn tgt<V: TemporalValue + PartialOrd>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, gt::<V>)
}

/// Temporal `a >= b`.
pub fn tge<V: TemporalValue + PartialOrd>(
    a: &Temporal<V>,
    b: &Temporal<V>,
) -> Result<Option<Temporal<bool>>> {
    tcomp(a, b, ge::<V>)
}

/// Temporal equality against a constant.
pub fn teq_value<V: TemporalValue>(temp: &Temporal<V>, value: &V) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, eq::<V>)
}

/// Temporal inequality against a constant.
pub fn tne_value<V: TemporalValue>(temp: &Temporal<V>, value: &V) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, ne::<V>)
}

/// Temporal `temp < value`.
pub fn tlt_value<V: TemporalValue + PartialOrd>(
    temp: &Temporal<V>,
    value: &V,
) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, lt::<V>)
}

/// Temporal `temp <= value`.
pub fn tle_value<V: TemporalValue + PartialOrd>(
    temp: &Temporal<V>,
    value: &V,
) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, le::<V>)
}

/// Temporal `temp > value`.
pub fn tgt_value<V: TemporalValue + PartialOrd>(
    temp: &Temporal<V>,
    value: &V,
) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, gt::<V>)
}

/// Temporal `temp >= value`.
pub fn tge_value<V: TemporalValue + PartialOrd>(
    temp: &Temporal<V>,
    value: &V,
) -> Result<Temporal<bool>> {
    tcomp_value(temp, value, ge::<V>)
}

// ---------------------------------------------------------------------------
// Spatial predicates
// ---------------------------------------------------------------------------

/// Relative position deltas of two point segments, `None` when the
/// analytic machinery does not apply (geodetic coordinates).
struct RelativeMotion {
    dx0: f64,
    dy0: f64,
    dz0: f64,
    vx: f64,
    vy: f64,
    vz: f64,
}

impl RelativeMotion {
    fn of(p0: &GeomPoint, p1: &GeomPoint, q0: &GeomPoint, q1: &GeomPoint) -> Option<Self> {
        if p0.is_geodetic() || q0.is_geodetic() {
            return None;
        }
        let with_z = p0.has_z() && q0.has_z();
        let z = |p: &GeomPoint| if with_z { p.z().unwrap_or(0.0) } else { 0.0 };
        let (dx0, dy0, dz0) = (q0.x() - p0.x(), q0.y() - p0.y(), z(q0) - z(p0));
        let (dx1, dy1, dz1) = (q1.x() - p1.x(), q1.y() - p1.y(), z(q1) - z(p1));
        Some(Self {
            dx0,
            dy0,
            dz0,
            vx: dx1 - dx0,
            vy: dy1 - dy0,
            vz: dz1 - dz0,
        })
    }

    fn speed_squared(&self) -> f64 {
        self.vx * self.vx + self.vy * self.vy + self.vz * self.vz
    }

    fn dot(&self) -> f64 {
        self.dx0 * self.vx + self.dy0 * self.vy + self.dz0 * self.vz
    }

    fn gap_squared(&self) -> f64 {
        self.dx0 * self.dx0 + self.dy0 * self.dy0 + self.dz0 * self.dz0
    }
}

/// Times at which the distance between two uniformly moving points equals
/// the threshold: the roots of a quadratic in the time fraction. With two
/// roots the distance is within the threshold strictly between them.
fn dwithin_turn(
    p0: &GeomPoint,
    p1: &GeomPoint,
    q0: &GeomPoint,
    q1: &GeomPoint,
    distance: f64,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
) -> TurningPoints {
    let Some(motion) = RelativeMotion::of(p0, p1, q0, q1) else {
        return TurningPoints::none();
    };
    let a = motion.speed_squared();
    if a < EPSILON {
        // Constant relative distance, the condition never changes
        return TurningPoints::none();
    }
    let b = 2.0 * motion.dot();
    let c = motion.gap_squared() - distance * distance;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return TurningPoints::none();
    }
    let sqrt_disc = disc.sqrt();
    let mut roots: Vec<f64> = Vec::with_capacity(2);
    for s in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
        if (-EPSILON..=1.0 + EPSILON).contains(&s) {
            roots.push(s.clamp(0.0, 1.0));
        }
    }
    match roots.len() {
        2 => TurningPoints::pair(
            timestamp_at_fraction(lower, upper, roots[0]),
            timestamp_at_fraction(lower, upper, roots[1]),
            true,
        ),
        1 => TurningPoints::one(timestamp_at_fraction(lower, upper, roots[0])),
        _ => TurningPoints::none(),
    }
}

/// Time of closest approach of two uniformly moving points.
fn closest_approach_turn(
    p0: &GeomPoint,
    p1: &GeomPoint,
    q0: &GeomPoint,
    q1: &GeomPoint,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
) -> TurningPoints {
    let Some(motion) = RelativeMotion::of(p0, p1, q0, q1) else {
        return TurningPoints::none();
    };
    let a = motion.speed_squared();
    if a < EPSILON {
        return TurningPoints::none();
    }
    let s = -motion.dot() / a;
    if s > EPSILON && s < 1.0 - EPSILON {
        TurningPoints::one(timestamp_at_fraction(lower, upper, s))
    } else {
        TurningPoints::none()
    }
}

/// Temporal distance between two moving points, with an extra instant at
/// the closest approach of every segment pair.
pub fn tdistance(
    a: &Temporal<GeomPoint>,
    b: &Temporal<GeomPoint>,
) -> Result<Option<Temporal<f64>>> {
    let func = |p: &GeomPoint, q: &GeomPoint| p.distance(q);
    let turn = closest_approach_turn;
    apply_binary(a, b, &BinaryLift::new(&func).with_turning(&turn))
}

/// Temporal distance from a moving point to a fixed one.
pub fn tdistance_value(temp: &Temporal<GeomPoint>, value: &GeomPoint) -> Result<Temporal<f64>> {
    let func = |p: &GeomPoint| p.distance(value);
    let turn = |p0: &GeomPoint, p1: &GeomPoint, lower: DateTime<Utc>, upper: DateTime<Utc>| {
        closest_approach_turn(p0, p1, value, value, lower, upper)
    };
    apply_unary(temp, &UnaryLift::new(&func).with_turning(&turn))
}

/// Whether two moving points stay within a distance threshold, exact at
/// the instants the condition changes.
pub fn tdwithin(
    a: &Temporal<GeomPoint>,
    b: &Temporal<GeomPoint>,
    distance: f64,
) -> Result<Option<Temporal<bool>>> {
    if distance < 0.0 {
        return Err(TemporaError::InvalidInput(
            "distance threshold must be non-negative".into(),
        ));
    }
    let func = |p: &GeomPoint, q: &GeomPoint| p.distance(q) <= distance;
    let turn = |p0: &GeomPoint,
                p1: &GeomPoint,
                q0: &GeomPoint,
                q1: &GeomPoint,
                lower: DateTime<Utc>,
                upper: DateTime<Utc>| {
        dwithin_turn(p0, p1, q0, q1, distance, lower, upper)
    };
    apply_binary(a, b, &BinaryLift::new(&func).discontinuous(&turn))
}

/// Whether a moving point stays within a distance threshold of a fixed one.
pub fn tdwithin_value(
    temp: &Temporal<GeomPoint>,
    value: &GeomPoint,
    distance: f64,
) -> Result<Temporal<bool>> {
    if distance < 0.0 {
        return Err(TemporaError::InvalidInput(
            "distance threshold must be non-negative".into(),
        ));
    }
    let func = |p: &GeomPoint| p.distance(value) <= distance;
    let turn = |p0: &GeomPoint, p1: &GeomPoint, lower: DateTime<Utc>, upper: DateTime<Utc>| {
        dwithin_turn(p0, p1, value, value, distance, lower, upper)
    };
    apply_unary(temp, &UnaryLift::new(&func).discontinuous(&turn))
}

/// Whether two moving points coincide: the zero-distance specialization of
/// [`tdwithin`].
pub fn tintersects(
    a: &Temporal<GeomPoint>,
    b: &Temporal<GeomPoint>,
) -> Result<Option<Temporal<bool>>> {
    tdwithin(a, b, 0.0)
}

/// Whether a moving point passes through a fixed one.
pub fn tintersects_value(
    temp: &Temporal<GeomPoint>,
    value: &GeomPoint,
) -> Result<Temporal<bool>> {
    tdwithin_value(temp, value, 0.0)
}

// ---------------------------------------------------------------------------
// Boolean restriction
// ---------------------------------------------------------------------------

impl Temporal<bool> {
    /// The set of timestamps at which the predicate holds, `None` when it
    /// never does.
    pub fn when_true(&self) -> Result<Option<SpanSet<DateTime<Utc>>>> {
        let mut spans: Vec<Span<DateTime<Utc>>> = Vec::new();
        match self.form() {
            TemporalForm::Instant(inst) => {
                if *inst.value() {
                    spans.push(inst.time_span()?);
                }
            }
            TemporalForm::Discrete(seq) => {
                for inst in seq.instants() {
                    if *inst.value() {
                        spans.push(inst.time_span()?);
                    }
                }
            }
            TemporalForm::Continuous(seqs) => {
                for seq in seqs {
                    let instants = seq.instants();
                    let last = instants.len() - 1;
                    for i in 0..last {
                        if *instants[i].value() {
                            spans.push(Span::new(
                                instants[i].timestamp(),
                                instants[i + 1].timestamp(),
                                i > 0 || seq.lower_inc(),
                                false,
                            )?);
                        }
                    }
                    if *instants[last].value() && seq.upper_inc() {
                        spans.push(Span::new(
                            instants[last].timestamp(),
                            instants[last].timestamp(),
                            true,
                            true,
                        )?);
                    }
                }
            }
        }
        if spans.is_empty() {
            Ok(None)
        } else {
            SpanSet::new(spans).map(Some)
        }
    }
}
