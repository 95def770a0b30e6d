//! Streaming aggregation of temporal values.
//!
//! Aggregation is incremental: fragments arrive in arbitrary batches, a
//! [`SkipList`] keeps the partial state ordered by time, and a combinator
//! merges overlapping fragments as batches are spliced in. For aggregates
//! over synchronized values (sum, min, max, average, centroid) the
//! combinator is the lifting engine's pointwise merge; for union-style
//! aggregation it is plain temporal merge.
//!
//! Each aggregate is scoped to one group and one thread. Partial aggregates
//! built by independent workers reconcile through
//! [`SkipList::merge_from`], which is a splice of one list's contents into
//! the other.

pub mod skiplist;

pub use skiplist::{RandomBits, SkipList, SplitMix64};

use crate::error::{Result, TemporaError};
use crate::lift::{BinaryLift, UnaryLift, apply_binary, apply_unary};
use crate::span::TimeSpan;
use crate::temporal::{AggClass, TInstant, TSequence, Temporal, TemporalForm};
use crate::value::{GeomPoint, TemporalNumber, TemporalValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Aggregation configuration.
///
/// Loadable from JSON for embedding hosts:
///
/// ```rust
/// use tempora::agg::AggConfig;
///
/// let config = AggConfig::from_json(r#"{ "rng_seed": 42 }"#).unwrap();
/// assert_eq!(config.rng_seed, 42);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggConfig {
    /// Seed of the skip-list level generator; aggregations with the same
    /// seed and the same splice sequence build identical structures.
    #[serde(default = "AggConfig::default_seed")]
    pub rng_seed: u64,
}

impl AggConfig {
    const fn default_seed() -> u64 {
        0x9E37_79B9_7F4A_7C15
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn build_list<V: TemporalValue>(&self) -> SkipList<V> {
        SkipList::with_rng(Box::new(SplitMix64::new(self.rng_seed)))
    }
}

impl Default for AggConfig {
    fn default() -> Self {
        Self {
            rng_seed: Self::default_seed(),
        }
    }
}

/// Running sum and sample count, the accumulator base type of the
/// averaging aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mean {
    pub sum: f64,
    pub count: f64,
}

impl TemporalValue for Mean {
    const NAME: &'static str = "mean";
    const CONTINUOUS: bool = true;
    type Bbox = ();

    fn interpolate(start: &Self, end: &Self, fraction: f64) -> Self {
        Self {
            sum: start.sum + (end.sum - start.sum) * fraction,
            count: start.count + (end.count - start.count) * fraction,
        }
    }

    fn to_bbox(&self) -> Self::Bbox {}

    fn expand_bbox(_bbox: &mut Self::Bbox, _value: &Self) {}

    fn format_value(&self) -> String {
        format!("({},{})", self.sum, self.count)
    }

    fn parse_value(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| TemporaError::Parse(format!("invalid mean value: '{}'", s)))?;
        let (sum, count) = inner
            .split_once(',')
            .ok_or_else(|| TemporaError::Parse(format!("invalid mean value: '{}'", s)))?;
        Ok(Self {
            sum: f64::parse_value(sum)?,
            count: f64::parse_value(count)?,
        })
    }
}

/// Running coordinate sums and sample count, the accumulator base type of
/// the centroid aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub count: f64,
    pub has_z: bool,
}

impl TemporalValue for CentroidState {
    const NAME: &'static str = "centroid";
    const CONTINUOUS: bool = true;
    type Bbox = ();

    fn interpolate(start: &Self, end: &Self, fraction: f64) -> Self {
        Self {
            x: start.x + (end.x - start.x) * fraction,
            y: start.y + (end.y - start.y) * fraction,
            z: start.z + (end.z - start.z) * fraction,
            count: start.count + (end.count - start.count) * fraction,
            has_z: start.has_z,
        }
    }

    fn to_bbox(&self) -> Self::Bbox {}

    fn expand_bbox(_bbox: &mut Self::Bbox, _value: &Self) {}

    fn format_value(&self) -> String {
        format!("({},{},{},{})", self.x, self.y, self.z, self.count)
    }

    fn parse_value(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| TemporaError::Parse(format!("invalid centroid value: '{}'", s)))?;
        let parts: Vec<f64> = inner
            .split(',')
            .map(f64::parse_value)
            .collect::<Result<_>>()?;
        if parts.len() != 4 {
            return Err(TemporaError::Parse(format!(
                "invalid centroid value: '{}'",
                s
            )));
        }
        Ok(Self {
            x: parts[0],
            y: parts[1],
            z: parts[2],
            count: parts[3],
            has_z: parts[2] != 0.0,
        })
    }
}

/// How overlapping fragments are merged during a splice.
enum Combinator<V: TemporalValue> {
    /// Pointwise combination through the lifting engine; `crossings` adds
    /// samples where linear segments cross (min/max need the kink).
    Pointwise {
        func: fn(&V, &V) -> V,
        crossings: bool,
    },
    /// Union-style merge: values must agree where fragments coincide.
    Merge,
}

impl<V: TemporalValue> Clone for Combinator<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: TemporalValue> Copy for Combinator<V> {}

/// Shared skip-list state of all splice-based aggregates.
struct SpliceAggregate<V: TemporalValue> {
    list: SkipList<V>,
    combinator: Combinator<V>,
}

impl<V: TemporalValue> SpliceAggregate<V> {
    fn new(combinator: Combinator<V>, config: &AggConfig) -> Self {
        Self {
            list: config.build_list(),
            combinator,
        }
    }

    /// Split a temporal value into skip-list fragments: instants stay
    /// whole, sequence sets splice as one fragment per component.
    fn splice_value(&mut self, value: &Temporal<V>) -> Result<()> {
        let batch: Vec<Temporal<V>> = match value.form() {
            TemporalForm::Continuous(seqs) if seqs.len() > 1 => seqs
                .iter()
                .map(|s| Temporal::Sequence(s.clone()))
                .collect(),
            _ => vec![value.clone()],
        };
        let combinator = self.combinator;
        let combine = move |old: &[Temporal<V>], new: &[Temporal<V>]| {
            combine_groups(old, new, combinator)
        };
        self.list.splice(&batch, &combine)
    }

    fn fragments(&self) -> Vec<Temporal<V>> {
        self.list.values()
    }

    fn finalize(self) -> Result<Option<Temporal<V>>> {
        let values = self.list.into_values();
        if values.is_empty() {
            Ok(None)
        } else {
            Temporal::merge_all(&values).map(Some)
        }
    }
}

/// Dispatch of the combinator contract: merge the removed run with the
/// incoming batch into a minimal ascending fragment list.
fn combine_groups<V: TemporalValue>(
    old: &[Temporal<V>],
    new: &[Temporal<V>],
    combinator: Combinator<V>,
) -> Result<Vec<Temporal<V>>> {
    match combinator {
        Combinator::Merge => {
            let mut all = old.to_vec();
            all.extend_from_slice(new);
            Ok(vec![Temporal::merge_all(&all)?])
        }
        Combinator::Pointwise { func, crossings } => {
            if old.first().map(|t| t.agg_class()) == Some(AggClass::Instant) {
                combine_instant_groups(old, new, func)
            } else {
                combine_sequence_groups(old, new, func, crossings)
            }
        }
    }
}

/// Combine instant fragments: equal timestamps merge through the function,
/// everything else passes through.
fn combine_instant_groups<V: TemporalValue>(
    old: &[Temporal<V>],
    new: &[Temporal<V>],
    func: fn(&V, &V) -> V,
) -> Result<Vec<Temporal<V>>> {
    let mut merged: Vec<(DateTime<Utc>, V)> = Vec::new();
    for frag in old.iter().chain(new) {
        let instants: Vec<TInstant<V>> = match frag.form() {
            TemporalForm::Instant(inst) => vec![inst.clone()],
            TemporalForm::Discrete(seq) => seq.instants().to_vec(),
            TemporalForm::Continuous(_) => {
                return Err(TemporaError::AggregationMismatch(
                    "sequence fragment in an instant aggregate".into(),
                ));
            }
        };
        for inst in instants {
            match merged.iter_mut().find(|(t, _)| *t == inst.timestamp()) {
                Some((_, value)) => *value = func(value, inst.value()),
                None => merged.push((inst.timestamp(), inst.value().clone())),
            }
        }
    }
    merged.sort_by_key(|(t, _)| *t);
    Ok(merged
        .into_iter()
        .map(|(t, v)| Temporal::instant(v, t))
        .collect())
}

/// Combine sequence fragments with an interval sweep: non-overlapping
/// stretches pass through unchanged, overlapping stretches go through the
/// synchronized pointwise lift, split at the overlap boundaries.
fn combine_sequence_groups<V: TemporalValue>(
    old: &[Temporal<V>],
    new: &[Temporal<V>],
    func: fn(&V, &V) -> V,
    crossings: bool,
) -> Result<Vec<Temporal<V>>> {
    let mut queue_old = sequence_queue(old)?;
    let mut queue_new = sequence_queue(new)?;
    let mut out: Vec<TSequence<V>> = Vec::new();

    let lifted = |x: &V, y: &V| func(x, y);
    let cross = |a0: &V, a1: &V, b0: &V, b1: &V| V::crossing(a0, a1, b0, b1);
    let mut lift = BinaryLift::new(&lifted);
    if crossings {
        lift = lift.with_crossing(&cross);
    }

    while let (Some(a), Some(b)) = (queue_old.front(), queue_new.front()) {
        let (sa, sb) = (a.time_span(), b.time_span());
        if sa.is_left(&sb) {
            out.push(queue_old.pop_front().expect("front just observed"));
            continue;
        }
        if sb.is_left(&sa) {
            out.push(queue_new.pop_front().expect("front just observed"));
            continue;
        }
        let a = queue_old.pop_front().expect("front just observed");
        let b = queue_new.pop_front().expect("front just observed");
        let inter = sa
            .intersection(&sb)
            .expect("neither span is strictly left of the other");

        for piece in sa.difference(&inter)? {
            let Some(clipped) = a.at_span(&piece) else {
                continue;
            };
            if piece.is_left(&inter) {
                out.push(clipped);
            } else {
                queue_old.push_front(clipped);
            }
        }
        for piece in sb.difference(&inter)? {
            let Some(clipped) = b.at_span(&piece) else {
                continue;
            };
            if piece.is_left(&inter) {
                out.push(clipped);
            } else {
                queue_new.push_front(clipped);
            }
        }

        let (ca, cb) = (a.at_span(&inter), b.at_span(&inter));
        if let (Some(ca), Some(cb)) = (ca, cb)
            && let Some(combined) =
                apply_binary(&Temporal::Sequence(ca), &Temporal::Sequence(cb), &lift)?
        {
            match combined.form() {
                TemporalForm::Continuous(seqs) => out.extend(seqs.iter().cloned()),
                _ => unreachable!("synchronized sequences lift to sequences"),
            }
        }
    }
    out.extend(queue_old);
    out.extend(queue_new);
    out.sort_by(|x, y| x.time_span().cmp_lower(&y.time_span()));
    Ok(out.into_iter().map(Temporal::Sequence).collect())
}

fn sequence_queue<V: TemporalValue>(
    fragments: &[Temporal<V>],
) -> Result<VecDeque<TSequence<V>>> {
    let mut queue = VecDeque::with_capacity(fragments.len());
    for frag in fragments {
        match frag.form() {
            TemporalForm::Continuous(seqs) => queue.extend(seqs.iter().cloned()),
            _ => {
                return Err(TemporaError::AggregationMismatch(
                    "instant fragment in a sequence aggregate".into(),
                ));
            }
        }
    }
    Ok(queue)
}

fn sum_value<V: TemporalNumber>(a: &V, b: &V) -> V {
    a.add(b)
}

fn min_value<V: TemporalNumber + PartialOrd>(a: &V, b: &V) -> V {
    if b < a { b.clone() } else { a.clone() }
}

fn max_value<V: TemporalNumber + PartialOrd>(a: &V, b: &V) -> V {
    if b > a { b.clone() } else { a.clone() }
}

fn mean_value(a: &Mean, b: &Mean) -> Mean {
    Mean {
        sum: a.sum + b.sum,
        count: a.count + b.count,
    }
}

fn centroid_value(a: &CentroidState, b: &CentroidState) -> CentroidState {
    CentroidState {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
        count: a.count + b.count,
        has_z: a.has_z,
    }
}

/// Count of contributing values over time.
pub struct CountAggregate {
    inner: SpliceAggregate<i64>,
}

impl CountAggregate {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: sum_value::<i64>,
                    crossings: false,
                },
                config,
            ),
        }
    }

    pub fn add<V: TemporalValue>(&mut self, value: &Temporal<V>) -> Result<()> {
        let one = |_: &V| 1i64;
        let transformed = apply_unary(value, &UnaryLift::new(&one))?;
        self.inner.splice_value(&transformed)
    }

    pub fn fragments(&self) -> Vec<Temporal<i64>> {
        self.inner.fragments()
    }

    pub fn finalize(self) -> Result<Option<Temporal<i64>>> {
        self.inner.finalize()
    }
}

/// Pointwise sum over time.
pub struct SumAggregate<V: TemporalNumber> {
    inner: SpliceAggregate<V>,
}

impl<V: TemporalNumber> SumAggregate<V> {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: sum_value::<V>,
                    crossings: false,
                },
                config,
            ),
        }
    }

    pub fn add(&mut self, value: &Temporal<V>) -> Result<()> {
        self.inner.splice_value(value)
    }

    pub fn fragments(&self) -> Vec<Temporal<V>> {
        self.inner.fragments()
    }

    pub fn finalize(self) -> Result<Option<Temporal<V>>> {
        self.inner.finalize()
    }
}

/// Pointwise minimum over time; linear fragments keep the kink where
/// segments cross.
pub struct MinAggregate<V: TemporalNumber + PartialOrd> {
    inner: SpliceAggregate<V>,
}

impl<V: TemporalNumber + PartialOrd> MinAggregate<V> {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: min_value::<V>,
                    crossings: true,
                },
                config,
            ),
        }
    }

    pub fn add(&mut self, value: &Temporal<V>) -> Result<()> {
        self.inner.splice_value(value)
    }

    pub fn fragments(&self) -> Vec<Temporal<V>> {
        self.inner.fragments()
    }

    pub fn finalize(self) -> Result<Option<Temporal<V>>> {
        self.inner.finalize()
    }
}

/// Pointwise maximum over time.
pub struct MaxAggregate<V: TemporalNumber + PartialOrd> {
    inner: SpliceAggregate<V>,
}

impl<V: TemporalNumber + PartialOrd> MaxAggregate<V> {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: max_value::<V>,
                    crossings: true,
                },
                config,
            ),
        }
    }

    pub fn add(&mut self, value: &Temporal<V>) -> Result<()> {
        self.inner.splice_value(value)
    }

    pub fn fragments(&self) -> Vec<Temporal<V>> {
        self.inner.fragments()
    }

    pub fn finalize(self) -> Result<Option<Temporal<V>>> {
        self.inner.finalize()
    }
}

/// Pointwise average over time, accumulated as [`Mean`] pairs and divided
/// at finalize time.
pub struct AvgAggregate {
    inner: SpliceAggregate<Mean>,
}

impl AvgAggregate {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: mean_value,
                    crossings: false,
                },
                config,
            ),
        }
    }

    pub fn add<V: TemporalNumber>(&mut self, value: &Temporal<V>) -> Result<()> {
        let to_mean = |v: &V| Mean {
            sum: v.to_f64(),
            count: 1.0,
        };
        let transformed = apply_unary(value, &UnaryLift::new(&to_mean))?;
        self.inner.splice_value(&transformed)
    }

    pub fn finalize(self) -> Result<Option<Temporal<f64>>> {
        let Some(accumulated) = self.inner.finalize()? else {
            return Ok(None);
        };
        let divide = |m: &Mean| m.sum / m.count;
        apply_unary(&accumulated, &UnaryLift::new(&divide)).map(Some)
    }
}

/// Time-weighted centroid of moving points, accumulated as coordinate
/// sums and divided at finalize time.
pub struct CentroidAggregate {
    inner: SpliceAggregate<CentroidState>,
    srid: Option<i32>,
    geodetic: bool,
}

impl CentroidAggregate {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(
                Combinator::Pointwise {
                    func: centroid_value,
                    crossings: false,
                },
                config,
            ),
            srid: None,
            geodetic: false,
        }
    }

    pub fn add(&mut self, value: &Temporal<GeomPoint>) -> Result<()> {
        if let Some(srid) = value.srid() {
            match self.srid {
                None => self.srid = Some(srid),
                Some(existing) if existing != srid => {
                    return Err(TemporaError::SridMismatch(existing, srid));
                }
                Some(_) => {}
            }
        }
        if let Some(first) = match value.form() {
            TemporalForm::Instant(inst) => Some(inst.value()),
            TemporalForm::Discrete(seq) => Some(seq.start().value()),
            TemporalForm::Continuous(seqs) => seqs.first().map(|s| s.start().value()),
        } {
            self.geodetic = first.is_geodetic();
        }
        let to_state = |p: &GeomPoint| CentroidState {
            x: p.x(),
            y: p.y(),
            z: p.z().unwrap_or(0.0),
            count: 1.0,
            has_z: p.has_z(),
        };
        let transformed = apply_unary(value, &UnaryLift::new(&to_state))?;
        self.inner.splice_value(&transformed)
    }

    pub fn finalize(self) -> Result<Option<Temporal<GeomPoint>>> {
        let srid = self.srid.unwrap_or(0);
        let geodetic = self.geodetic;
        let Some(accumulated) = self.inner.finalize()? else {
            return Ok(None);
        };
        let divide = |c: &CentroidState| {
            let point = if geodetic {
                GeomPoint::geodetic(c.x / c.count, c.y / c.count)
            } else if c.has_z {
                GeomPoint::new_z(c.x / c.count, c.y / c.count, c.z / c.count)
            } else {
                GeomPoint::new(c.x / c.count, c.y / c.count)
            };
            point.with_srid(srid)
        };
        apply_unary(&accumulated, &UnaryLift::new(&divide)).map(Some)
    }
}

/// Union-style aggregation: fragments merge into one temporal value,
/// agreeing wherever they coincide.
pub struct MergeAggregate<V: TemporalValue> {
    inner: SpliceAggregate<V>,
}

impl<V: TemporalValue> MergeAggregate<V> {
    pub fn new(config: &AggConfig) -> Self {
        Self {
            inner: SpliceAggregate::new(Combinator::Merge, config),
        }
    }

    pub fn add(&mut self, value: &Temporal<V>) -> Result<()> {
        self.inner.splice_value(value)
    }

    pub fn fragments(&self) -> Vec<Temporal<V>> {
        self.inner.fragments()
    }

    pub fn finalize(self) -> Result<Option<Temporal<V>>> {
        self.inner.finalize()
    }
}

/// Hull of the time extents seen so far.
#[derive(Debug, Clone, Default)]
pub struct ExtentAggregate {
    span: Option<TimeSpan>,
}

impl ExtentAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<V: TemporalValue>(&mut self, value: &Temporal<V>) -> Result<()> {
        let span = value.time_span()?;
        self.span = Some(match self.span {
            Some(existing) => existing.hull(&span),
            None => span,
        });
        Ok(())
    }

    pub fn finalize(self) -> Option<TimeSpan> {
        self.span
    }
}
