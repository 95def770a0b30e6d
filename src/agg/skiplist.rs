//! Arena-backed skip list over temporal fragments.
//!
//! The list keys its entries by time extent and supports the one operation
//! streaming aggregation needs: `splice`, which locates the run of entries
//! overlapping an incoming batch in O(log n) expected time, removes it,
//! hands both groups to a caller-supplied combinator, and reinserts the
//! merged fragments at randomized heights.
//!
//! Level assignment draws from an injected [`RandomBits`] generator rather
//! than a hidden global source, so aggregation runs are reproducible.

use crate::error::{Result, TemporaError};
use crate::span::TimeSpan;
use crate::temporal::Temporal;
use crate::value::TemporalValue;

/// Maximum node height; covers lists far beyond practical sizes at one
/// quarter promotion probability.
const MAX_LEVEL: usize = 32;

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Source of raw random bits for level assignment.
///
/// Injected explicitly so tests can reset the generator and replay an
/// aggregation deterministically.
pub trait RandomBits {
    fn next_random_bits(&mut self) -> u64;
}

/// SplitMix64 generator: tiny, fast, and resettable.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Reset to a seed, replaying the same level choices afterwards.
    pub fn reset(&mut self, seed: u64) {
        self.state = seed;
    }
}

impl Default for SplitMix64 {
    fn default() -> Self {
        Self::new(0x9E37_79B9_7F4A_7C15)
    }
}

impl RandomBits for SplitMix64 {
    fn next_random_bits(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

struct Node<V: TemporalValue> {
    payload: Option<Temporal<V>>,
    span: Option<TimeSpan>,
    next: Vec<usize>,
}

/// Combinator merging the removed entries with an incoming batch.
pub type Combine<'a, V> =
    &'a dyn Fn(&[Temporal<V>], &[Temporal<V>]) -> Result<Vec<Temporal<V>>>;

/// An ordered, indexable collection of temporal fragments keyed by their
/// time extent, owned exclusively by one aggregation group.
pub struct SkipList<V: TemporalValue> {
    nodes: Vec<Node<V>>,
    freed: Vec<usize>,
    length: usize,
    height: usize,
    rng: Box<dyn RandomBits>,
}

impl<V: TemporalValue> SkipList<V> {
    /// An empty list with the default deterministic generator.
    pub fn new() -> Self {
        Self::with_rng(Box::new(SplitMix64::default()))
    }

    /// An empty list drawing level bits from the given generator.
    pub fn with_rng(rng: Box<dyn RandomBits>) -> Self {
        let head = Node {
            payload: None,
            span: None,
            next: vec![TAIL; MAX_LEVEL],
        };
        let tail = Node {
            payload: None,
            span: None,
            next: Vec::new(),
        };
        Self {
            nodes: vec![head, tail],
            freed: Vec::new(),
            length: 0,
            height: 1,
            rng,
        }
    }

    /// Number of live fragments.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Copies of every payload in ascending time order. Does not mutate
    /// the list.
    pub fn values(&self) -> Vec<Temporal<V>> {
        let mut out = Vec::with_capacity(self.length);
        let mut cur = self.nodes[HEAD].next[0];
        while cur != TAIL {
            let node = &self.nodes[cur];
            out.push(
                node.payload
                    .clone()
                    .expect("live nodes always carry a payload"),
            );
            cur = node.next[0];
        }
        out
    }

    /// Consume the list, extracting the payloads in ascending time order.
    pub fn into_values(mut self) -> Vec<Temporal<V>> {
        let mut out = Vec::with_capacity(self.length);
        let mut cur = self.nodes[HEAD].next[0];
        while cur != TAIL {
            let next = self.nodes[cur].next[0];
            out.push(
                self.nodes[cur]
                    .payload
                    .take()
                    .expect("live nodes always carry a payload"),
            );
            cur = next;
        }
        out
    }

    /// Splice a batch of fragments into the list.
    ///
    /// The batch must be in ascending time order with non-overlapping
    /// fragments, and must match the subtype and interpolation class of the
    /// existing content. Entries whose time spans overlap the batch's
    /// overall span are removed and handed to `combine` together with the
    /// batch; the merged fragments are reinserted. When nothing overlaps,
    /// the batch is inserted directly without calling the combinator.
    pub fn splice(&mut self, batch: &[Temporal<V>], combine: Combine<'_, V>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let class = batch[0].agg_class();
        if batch.iter().any(|t| t.agg_class() != class) {
            return Err(TemporaError::AggregationMismatch(
                "batch mixes subtypes or interpolation modes".into(),
            ));
        }
        if let Some(first) = self.first_payload()
            && first.agg_class() != class
        {
            log::warn!(
                "rejecting aggregation batch: {} content cannot mix with {} batch",
                first.subtype_name(),
                batch[0].subtype_name()
            );
            return Err(TemporaError::AggregationMismatch(format!(
                "cannot aggregate {} fragments into {} content",
                batch[0].subtype_name(),
                first.subtype_name()
            )));
        }

        let mut batch_span = batch[0].time_span()?;
        for frag in &batch[1..] {
            let span = frag.time_span()?;
            if !batch_span.is_left(&span) && !batch_span.adjacent(&span) {
                return Err(TemporaError::InvalidInput(
                    "batch fragments must be ascending and non-overlapping".into(),
                ));
            }
            batch_span.expand(&span);
        }

        // Walk the levels down to the last entry strictly before the batch
        let mut update = [HEAD; MAX_LEVEL];
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            loop {
                let next = self.nodes[cur].next[level];
                if next == TAIL {
                    break;
                }
                let next_span = self.nodes[next].span.expect("live nodes carry a span");
                if next_span.is_left(&batch_span) {
                    cur = next;
                } else {
                    break;
                }
            }
            update[level] = cur;
        }

        // Collect the contiguous run overlapping or inside the batch span
        let mut removed: Vec<usize> = Vec::new();
        let mut scan = self.nodes[update[0]].next[0];
        while scan != TAIL {
            let span = self.nodes[scan].span.expect("live nodes carry a span");
            if span.is_right(&batch_span) {
                break;
            }
            removed.push(scan);
            scan = self.nodes[scan].next[0];
        }

        let merged: Vec<Temporal<V>>;
        if removed.is_empty() {
            merged = batch.to_vec();
        } else {
            // Unlink the run level by level before taking the payloads
            let mut removed_sorted = removed.clone();
            removed_sorted.sort_unstable();
            for level in 0..self.height {
                let from = update[level];
                let mut next = self.nodes[from].next[level];
                while next != TAIL && removed_sorted.binary_search(&next).is_ok() {
                    next = self.nodes[next].next[level];
                }
                self.nodes[from].next[level] = next;
            }
            let mut old: Vec<Temporal<V>> = Vec::with_capacity(removed.len());
            for idx in &removed {
                old.push(
                    self.nodes[*idx]
                        .payload
                        .take()
                        .expect("removed nodes carried payloads"),
                );
                self.nodes[*idx].span = None;
                self.nodes[*idx].next.clear();
                self.freed.push(*idx);
            }
            self.length -= removed.len();
            log::debug!(
                "splice merges {} existing fragments with a batch of {}",
                old.len(),
                batch.len()
            );
            merged = combine(&old, batch)?;
        }

        for frag in merged {
            self.insert_after(&mut update, frag)?;
        }
        Ok(())
    }

    /// Splice another list's full contents into this one: the pairwise
    /// combine step reconciling independently built partial aggregates.
    pub fn merge_from(&mut self, other: SkipList<V>, combine: Combine<'_, V>) -> Result<()> {
        let batch = other.into_values();
        self.splice(&batch, combine)
    }

    fn first_payload(&self) -> Option<&Temporal<V>> {
        let first = self.nodes[HEAD].next[0];
        if first == TAIL {
            None
        } else {
            self.nodes[first].payload.as_ref()
        }
    }

    fn insert_after(&mut self, update: &mut [usize; MAX_LEVEL], frag: Temporal<V>) -> Result<()> {
        let span = frag.time_span()?;
        let height = self.random_height();
        if height > self.height {
            for entry in update.iter_mut().take(height).skip(self.height) {
                *entry = HEAD;
            }
            self.height = height;
        }

        let idx = match self.freed.pop() {
            Some(idx) => idx,
            None => {
                self.nodes
                    .try_reserve(1)
                    .map_err(|_| TemporaError::AggregationCapacity)?;
                self.nodes.push(Node {
                    payload: None,
                    span: None,
                    next: Vec::new(),
                });
                self.nodes.len() - 1
            }
        };

        self.nodes[idx].payload = Some(frag);
        self.nodes[idx].span = Some(span);
        self.nodes[idx].next = vec![TAIL; height];
        for level in 0..height {
            let prev = update[level];
            let succ = self.nodes[prev].next[level];
            self.nodes[idx].next[level] = succ;
            self.nodes[prev].next[level] = idx;
            update[level] = idx;
        }
        self.length += 1;
        Ok(())
    }

    /// Geometric height: each extra level with probability 1/4.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        let mut bits = self.rng.next_random_bits();
        let mut available = 64;
        while height < MAX_LEVEL && bits & 0b11 == 0b11 {
            height += 1;
            bits >>= 2;
            available -= 2;
            if available < 2 {
                bits = self.rng.next_random_bits();
                available = 64;
            }
        }
        height
    }
}

impl<V: TemporalValue> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(day as i64 - 1)
    }

    fn inst(v: f64, day: u32) -> Temporal<f64> {
        Temporal::instant(v, ts(day))
    }

    /// Sum values at shared timestamps, pass the rest through.
    fn sum_instants(
        old: &[Temporal<f64>],
        new: &[Temporal<f64>],
    ) -> Result<Vec<Temporal<f64>>> {
        let mut all: Vec<(DateTime<Utc>, f64)> = Vec::new();
        for frag in old.iter().chain(new) {
            let Temporal::Instant(i) = frag else {
                panic!("test combinator expects instants");
            };
            match all.iter_mut().find(|(t, _)| *t == i.timestamp()) {
                Some((_, v)) => *v += *i.value(),
                None => all.push((i.timestamp(), *i.value())),
            }
        }
        all.sort_by_key(|(t, _)| *t);
        Ok(all
            .into_iter()
            .map(|(t, v)| Temporal::instant(v, t))
            .collect())
    }

    #[test]
    fn test_first_splice_inserts_directly() {
        let mut list = SkipList::new();
        list.splice(&[inst(1.0, 1), inst(2.0, 3)], &sum_instants)
            .unwrap();
        assert_eq!(list.len(), 2);
        let values = list.values();
        assert_eq!(values[0].value_at(ts(1)), Some(1.0));
        assert_eq!(values[1].value_at(ts(3)), Some(2.0));
    }

    #[test]
    fn test_splice_merges_overlap() {
        let mut list = SkipList::new();
        list.splice(&[inst(1.0, 1), inst(2.0, 3), inst(3.0, 5)], &sum_instants)
            .unwrap();
        // Overlaps the middle entry only at day 3
        list.splice(&[inst(10.0, 3)], &sum_instants).unwrap();
        assert_eq!(list.len(), 3);
        let values = list.values();
        assert_eq!(values[1].value_at(ts(3)), Some(12.0));
        // Untouched neighbours survive
        assert_eq!(values[0].value_at(ts(1)), Some(1.0));
        assert_eq!(values[2].value_at(ts(5)), Some(3.0));
    }

    #[test]
    fn test_splice_no_overlap_keeps_existing() {
        let mut list = SkipList::new();
        list.splice(&[inst(1.0, 1)], &sum_instants).unwrap();
        list.splice(&[inst(2.0, 9)], &sum_instants).unwrap();
        list.splice(&[inst(3.0, 5)], &sum_instants).unwrap();
        let values = list.values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].value_at(ts(1)), Some(1.0));
        assert_eq!(values[1].value_at(ts(5)), Some(3.0));
        assert_eq!(values[2].value_at(ts(9)), Some(2.0));
    }

    #[test]
    fn test_splice_run_removal_spans_batch() {
        let mut list = SkipList::new();
        list.splice(
            &[inst(1.0, 1), inst(2.0, 3), inst(3.0, 5), inst(4.0, 7)],
            &sum_instants,
        )
        .unwrap();
        // Batch covering days 2..6 touches the entries at days 3 and 5
        list.splice(&[inst(10.0, 2), inst(20.0, 6)], &sum_instants)
            .unwrap();
        assert_eq!(list.len(), 6);
        let values = list.values();
        assert_eq!(values[0].value_at(ts(1)), Some(1.0));
        assert_eq!(values[1].value_at(ts(2)), Some(10.0));
        assert_eq!(values[2].value_at(ts(3)), Some(2.0));
        assert_eq!(values[5].value_at(ts(7)), Some(4.0));
    }

    #[test]
    fn test_mixed_classes_rejected_without_mutation() {
        let mut list = SkipList::new();
        list.splice(&[inst(1.0, 1)], &sum_instants).unwrap();
        let seq = crate::temporal::TSequence::new(
            vec![
                crate::temporal::TInstant::new(1.0, ts(1)),
                crate::temporal::TInstant::new(2.0, ts(3)),
            ],
            true,
            true,
            crate::interp::Interpolation::Linear,
        )
        .unwrap();
        let result = list.splice(&[Temporal::Sequence(seq)], &sum_instants);
        assert!(matches!(result, Err(TemporaError::AggregationMismatch(_))));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_unordered_batch_rejected() {
        let mut list = SkipList::new();
        let result = list.splice(&[inst(1.0, 5), inst(2.0, 1)], &sum_instants);
        assert!(result.is_err());
    }

    #[test]
    fn test_deterministic_with_seeded_rng() {
        let mut a = SkipList::with_rng(Box::new(SplitMix64::new(7)));
        let mut b = SkipList::with_rng(Box::new(SplitMix64::new(7)));
        for day in 1..40 {
            a.splice(&[inst(day as f64, day)], &sum_instants).unwrap();
            b.splice(&[inst(day as f64, day)], &sum_instants).unwrap();
        }
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn test_merge_from() {
        let mut a = SkipList::new();
        a.splice(&[inst(1.0, 1), inst(2.0, 3)], &sum_instants).unwrap();
        let mut b = SkipList::new();
        b.splice(&[inst(10.0, 3), inst(20.0, 5)], &sum_instants)
            .unwrap();
        a.merge_from(b, &sum_instants).unwrap();
        let values = a.values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].value_at(ts(1)), Some(1.0));
        assert_eq!(values[1].value_at(ts(3)), Some(12.0));
        assert_eq!(values[2].value_at(ts(5)), Some(20.0));
    }

    #[test]
    fn test_into_values_ordering_large() {
        let mut list = SkipList::new();
        // Insert in shuffled batches to exercise multiple levels
        for day in (1..30).rev() {
            list.splice(&[inst(day as f64, day)], &sum_instants).unwrap();
        }
        let values = list.into_values();
        assert_eq!(values.len(), 29);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(value.value_at(ts(i as u32 + 1)), Some(i as f64 + 1.0));
        }
    }
}
