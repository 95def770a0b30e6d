//! Textual form of spans, span sets, and temporal values.
//!
//! The grammar follows the conventional temporal-database notation:
//! spans `[lower, upper)` with an independent bracket choice per side,
//! instants `value@timestamp`, sequences `[i1, i2]` (or `{i1, i2}` for
//! discrete ones) with an optional `Interp=Step;` prefix, and sequence
//! sets `{seq1, seq2}`. Formatting and parsing round-trip: for every
//! value `x`, `parse(format(x)) == x`.

use crate::error::{Result, TemporaError};
use crate::interp::Interpolation;
use crate::span::{Span, SpanBound};
use crate::spanset::SpanSet;
use crate::temporal::{TInstant, TSequence, TSequenceSet, Temporal};
use crate::value::TemporalValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

const STEP_PREFIX: &str = "Interp=Step;";

/// Canonical timestamp rendering: `2000-01-01 00:00:00+00:00`.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Parse a timestamp, accepting a bare date, a date-time without offset
/// (read as UTC), and date-times with `+HH`/`+HH:MM` offsets or a `T`
/// separator.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let trimmed = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%dT%H:%M:%S%#z"] {
        if let Ok(t) = DateTime::<FixedOffset>::parse_from_str(trimmed, format) {
            return Ok(t.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TemporaError::Parse(format!("invalid date: '{}'", trimmed)))?;
        return Ok(midnight.and_utc());
    }
    Err(TemporaError::Parse(format!(
        "invalid timestamp: '{}'",
        trimmed
    )))
}

/// Split on commas at the top level, respecting brackets, parentheses,
/// braces, and double-quoted stretches.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' | '{' if !in_quotes => depth += 1,
            ']' | ')' | '}' if !in_quotes => depth -= 1,
            ',' if depth == 0 && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn strip_outer(s: &str, open: char, close: char) -> Result<&str> {
    let trimmed = s.trim();
    trimmed
        .strip_prefix(open)
        .and_then(|r| r.strip_suffix(close))
        .ok_or_else(|| {
            TemporaError::Parse(format!(
                "expected '{}...{}' around '{}'",
                open, close, s
            ))
        })
}

// ---------------------------------------------------------------------------
// Spans and span sets
// ---------------------------------------------------------------------------

impl<T: SpanBound> fmt::Display for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc() { '[' } else { '(' },
            self.lower().format_bound(),
            self.upper().format_bound(),
            if self.upper_inc() { ']' } else { ')' },
        )
    }
}

impl<T: SpanBound> FromStr for Span<T> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let lower_inc = match chars.next() {
            Some('[') => true,
            Some('(') => false,
            _ => {
                return Err(TemporaError::Parse(format!(
                    "span must open with '[' or '(': '{}'",
                    s
                )));
            }
        };
        let upper_inc = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => {
                return Err(TemporaError::Parse(format!(
                    "span must close with ']' or ')': '{}'",
                    s
                )));
            }
        };
        let inner = &trimmed[1..trimmed.len() - 1];
        let parts = split_top_level(inner);
        if parts.len() != 2 {
            return Err(TemporaError::Parse(format!(
                "span requires exactly two bounds: '{}'",
                s
            )));
        }
        Span::new(
            T::parse_bound(parts[0])?,
            T::parse_bound(parts[1])?,
            lower_inc,
            upper_inc,
        )
    }
}

impl<T: SpanBound> fmt::Display for SpanSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, span) in self.spans().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", span)?;
        }
        write!(f, "}}")
    }
}

impl<T: SpanBound> FromStr for SpanSet<T> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let inner = strip_outer(s, '{', '}')?;
        let spans = split_top_level(inner)
            .into_iter()
            .map(|part| part.parse())
            .collect::<Result<Vec<Span<T>>>>()?;
        SpanSet::new(spans)
    }
}

// ---------------------------------------------------------------------------
// Temporal values
// ---------------------------------------------------------------------------

impl<V: TemporalValue> fmt::Display for TInstant<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.value().format_value(),
            format_timestamp(&self.timestamp())
        )
    }
}

impl<V: TemporalValue> FromStr for TInstant<V> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let at = trimmed.rfind('@').ok_or_else(|| {
            TemporaError::Parse(format!("instant requires 'value@timestamp': '{}'", s))
        })?;
        let value = V::parse_value(&trimmed[..at])?;
        let timestamp = parse_timestamp(&trimmed[at + 1..])?;
        Ok(TInstant::new(value, timestamp))
    }
}

impl<V: TemporalValue> fmt::Display for TSequence<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interpolation() == Interpolation::Discrete {
            write!(f, "{{")?;
            for (i, inst) in self.instants().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", inst)?;
            }
            return write!(f, "}}");
        }
        if self.interpolation() == Interpolation::Step && V::CONTINUOUS {
            write!(f, "{}", STEP_PREFIX)?;
        }
        write!(f, "{}", if self.lower_inc() { '[' } else { '(' })?;
        for (i, inst) in self.instants().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", inst)?;
        }
        write!(f, "{}", if self.upper_inc() { ']' } else { ')' })
    }
}

/// Default interpolation of a bracketed sequence without an explicit
/// marker: linear for continuous base types, step otherwise.
fn default_interp<V: TemporalValue>() -> Interpolation {
    if V::CONTINUOUS {
        Interpolation::Linear
    } else {
        Interpolation::Step
    }
}

fn parse_bracketed_sequence<V: TemporalValue>(
    s: &str,
    interp: Interpolation,
) -> Result<TSequence<V>> {
    let trimmed = s.trim();
    let lower_inc = match trimmed.chars().next() {
        Some('[') => true,
        Some('(') => false,
        _ => {
            return Err(TemporaError::Parse(format!(
                "sequence must open with '[' or '(': '{}'",
                s
            )));
        }
    };
    let upper_inc = match trimmed.chars().last() {
        Some(']') => true,
        Some(')') => false,
        _ => {
            return Err(TemporaError::Parse(format!(
                "sequence must close with ']' or ')': '{}'",
                s
            )));
        }
    };
    let instants = split_top_level(&trimmed[1..trimmed.len() - 1])
        .into_iter()
        .map(|part| part.parse())
        .collect::<Result<Vec<TInstant<V>>>>()?;
    TSequence::new(instants, lower_inc, upper_inc, interp)
}

impl<V: TemporalValue> FromStr for TSequence<V> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut rest = s.trim();
        let mut interp = default_interp::<V>();
        if let Some(stripped) = rest.strip_prefix(STEP_PREFIX) {
            interp = Interpolation::Step;
            rest = stripped.trim();
        }
        if rest.starts_with('{') {
            let instants = split_top_level(strip_outer(rest, '{', '}')?)
                .into_iter()
                .map(|part| part.parse())
                .collect::<Result<Vec<TInstant<V>>>>()?;
            return TSequence::discrete(instants);
        }
        parse_bracketed_sequence(rest, interp)
    }
}

impl<V: TemporalValue> fmt::Display for TSequenceSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interpolation() == Interpolation::Step && V::CONTINUOUS {
            write!(f, "{}", STEP_PREFIX)?;
        }
        write!(f, "{{")?;
        for (i, seq) in self.sequences().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            // The set-level prefix already states the interpolation
            write!(f, "{}", if seq.lower_inc() { '[' } else { '(' })?;
            for (j, inst) in seq.instants().iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", inst)?;
            }
            write!(f, "{}", if seq.upper_inc() { ']' } else { ')' })?;
        }
        write!(f, "}}")
    }
}

impl<V: TemporalValue> FromStr for TSequenceSet<V> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut rest = s.trim();
        let mut interp = default_interp::<V>();
        if let Some(stripped) = rest.strip_prefix(STEP_PREFIX) {
            interp = Interpolation::Step;
            rest = stripped.trim();
        }
        let sequences = split_top_level(strip_outer(rest, '{', '}')?)
            .into_iter()
            .map(|part| parse_bracketed_sequence(part, interp))
            .collect::<Result<Vec<TSequence<V>>>>()?;
        TSequenceSet::new(sequences)
    }
}

impl<V: TemporalValue> fmt::Display for Temporal<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Instant(inst) => write!(f, "{}", inst),
            Temporal::Sequence(seq) => write!(f, "{}", seq),
            Temporal::SequenceSet(set) => write!(f, "{}", set),
        }
    }
}

impl<V: TemporalValue> FromStr for Temporal<V> {
    type Err = TemporaError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix(STEP_PREFIX).unwrap_or(trimmed).trim();
        if body.starts_with('[') || body.starts_with('(') {
            return trimmed.parse().map(Temporal::Sequence);
        }
        if body.starts_with('{') {
            let inner = strip_outer(body, '{', '}')?;
            let first = inner.trim_start().chars().next();
            return if matches!(first, Some('[') | Some('(')) {
                trimmed.parse().map(Temporal::SequenceSet)
            } else {
                trimmed.parse().map(Temporal::Sequence)
            };
        }
        trimmed.parse().map(Temporal::Instant)
    }
}
