//! Temporal value algebra: time-varying values with interpolation, generic
//! lifting, and streaming aggregation.
//!
//! A temporal value is a single timestamped sample, a sequence of samples
//! under one interpolation mode (discrete, step, or linear), or a set of
//! sequences with gaps. Scalar functions lift generically over one or two
//! temporal values, and derived predicates stay exact at the instants where
//! they change thanks to turning-point insertion.
//!
//! ```rust
//! use tempora::ops::tdwithin;
//! use tempora::temporal::Temporal;
//! use tempora::value::GeomPoint;
//!
//! let a: Temporal<GeomPoint> =
//!     "[POINT(1 1)@2000-01-01, POINT(5 5)@2000-01-05]".parse()?;
//! let b: Temporal<GeomPoint> =
//!     "[POINT(1 3)@2000-01-01, POINT(5 3)@2000-01-05]".parse()?;
//!
//! // Within distance 1 exactly between 2000-01-02 and 2000-01-04
//! let within = tdwithin(&a, &b, 1.0)?.unwrap();
//! let when = within.when_true()?.unwrap();
//! assert_eq!(when.num_spans(), 1);
//! # Ok::<(), tempora::TemporaError>(())
//! ```

pub mod agg;
pub mod error;
pub mod interp;
pub mod lift;
pub mod ops;
pub mod span;
pub mod spanset;
pub mod temporal;
pub mod text;
pub mod value;

pub use error::{Result, TemporaError};

pub use span::{Span, SpanBound, TimeSpan};
pub use spanset::SpanSet;

pub use interp::{Interpolation, SegmentTurn, SyncTurn, TurningPoints};

pub use temporal::{TInstant, TSequence, TSequenceSet, Temporal};

pub use value::{GeomPoint, TemporalNumber, TemporalValue, ValueExtent};

pub use lift::{BinaryLift, SyncCrossing, UnaryLift, apply_binary, apply_unary, synchronize};

pub use agg::{
    AggConfig, AvgAggregate, CentroidAggregate, CountAggregate, ExtentAggregate, MaxAggregate,
    MergeAggregate, MinAggregate, RandomBits, SkipList, SplitMix64, SumAggregate,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, TemporaError};

    pub use crate::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};

    pub use crate::{GeomPoint, Span, SpanSet, TimeSpan};

    pub use crate::ops::{tadd, tdistance, tdwithin, tintersects, tsub};

    pub use crate::{AggConfig, CountAggregate, MergeAggregate, SumAggregate};

    pub use chrono::{DateTime, Utc};
}
