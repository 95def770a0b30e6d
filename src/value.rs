//! Base-type capability registry for temporal values.
//!
//! The temporal engine has no hardcoded knowledge of any concrete base type:
//! everything it needs — equality, interpolation, segment crossings, bounding
//! summaries, text I/O — comes through the [`TemporalValue`] trait. Numeric
//! lifts additionally require [`TemporalNumber`]. Any type implementing these
//! traits participates in the full machinery (lifting, synchronization,
//! aggregation), which is how host systems plug in further base types such as
//! network positions or rigid-body poses.

use crate::error::{Result, TemporaError};
use geo::{Distance, Euclidean, Haversine, Point, Rect};
use serde::{Deserialize, Serialize};

/// The SRID conventionally used for geodetic (lon/lat) coordinates.
pub const WGS84_SRID: i32 = 4326;

/// Minimum and maximum of the values seen so far; the cached value summary
/// of sequences over ordered base types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueExtent<T> {
    pub min: T,
    pub max: T,
}

/// Capabilities a base type must provide to live inside a temporal value.
pub trait TemporalValue: Clone + PartialEq + std::fmt::Debug + Sized {
    /// Short type name used in diagnostics.
    const NAME: &'static str;

    /// Whether linear interpolation is meaningful for this type. Types with
    /// `CONTINUOUS = false` are restricted to discrete and step sequences.
    const CONTINUOUS: bool;

    /// Cached summary of the value range of a sequence.
    type Bbox: Clone + PartialEq + std::fmt::Debug;

    /// Value at `fraction` of the way from `start` to `end`.
    ///
    /// Only called for continuous types; step types return `start`.
    fn interpolate(start: &Self, end: &Self, fraction: f64) -> Self;

    /// Fraction strictly inside `(0, 1)` at which two linear segments meet,
    /// if they do. Used by synchronization to sample both arguments at
    /// mutually consistent timestamps.
    fn crossing(_a0: &Self, _a1: &Self, _b0: &Self, _b1: &Self) -> Option<f64> {
        None
    }

    /// Value summary of a single value.
    fn to_bbox(&self) -> Self::Bbox;

    /// Grow a summary to cover one more value.
    fn expand_bbox(bbox: &mut Self::Bbox, value: &Self);

    /// Spatial reference identifier, for base types that carry one.
    fn srid(&self) -> Option<i32> {
        None
    }

    /// Render the value for the textual form.
    fn format_value(&self) -> String;

    /// Parse the value from its textual form.
    fn parse_value(s: &str) -> Result<Self>;
}

/// Arithmetic capabilities for numeric base types, used by the lifted
/// arithmetic operations and the averaging aggregates.
pub trait TemporalNumber: TemporalValue {
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    /// `None` when `other` is zero.
    fn checked_div(&self, other: &Self) -> Option<Self>;
    fn is_zero(&self) -> bool;
    fn to_f64(&self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl TemporalValue for bool {
    const NAME: &'static str = "bool";
    const CONTINUOUS: bool = false;
    type Bbox = ();

    fn interpolate(start: &Self, _end: &Self, _fraction: f64) -> Self {
        *start
    }

    fn to_bbox(&self) -> Self::Bbox {}

    fn expand_bbox(_bbox: &mut Self::Bbox, _value: &Self) {}

    fn format_value(&self) -> String {
        if *self { "t".into() } else { "f".into() }
    }

    fn parse_value(s: &str) -> Result<Self> {
        match s.trim() {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            other => Err(TemporaError::Parse(format!(
                "invalid boolean value: '{}'",
                other
            ))),
        }
    }
}

impl TemporalValue for i64 {
    const NAME: &'static str = "int";
    const CONTINUOUS: bool = false;
    type Bbox = ValueExtent<i64>;

    fn interpolate(start: &Self, _end: &Self, _fraction: f64) -> Self {
        *start
    }

    fn to_bbox(&self) -> Self::Bbox {
        ValueExtent {
            min: *self,
            max: *self,
        }
    }

    fn expand_bbox(bbox: &mut Self::Bbox, value: &Self) {
        bbox.min = bbox.min.min(*value);
        bbox.max = bbox.max.max(*value);
    }

    fn format_value(&self) -> String {
        self.to_string()
    }

    fn parse_value(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| TemporaError::Parse(format!("invalid integer value: '{}'", s)))
    }
}

impl TemporalValue for f64 {
    const NAME: &'static str = "float";
    const CONTINUOUS: bool = true;
    type Bbox = ValueExtent<f64>;

    fn interpolate(start: &Self, end: &Self, fraction: f64) -> Self {
        start + (end - start) * fraction
    }

    fn crossing(a0: &Self, a1: &Self, b0: &Self, b1: &Self) -> Option<f64> {
        // Solve a0 + s(a1 - a0) = b0 + s(b1 - b0)
        let denom = (a1 - a0) - (b1 - b0);
        if denom.abs() < crate::interp::EPSILON {
            return None;
        }
        let s = (b0 - a0) / denom;
        (s > crate::interp::EPSILON && s < 1.0 - crate::interp::EPSILON).then_some(s)
    }

    fn to_bbox(&self) -> Self::Bbox {
        ValueExtent {
            min: *self,
            max: *self,
        }
    }

    fn expand_bbox(bbox: &mut Self::Bbox, value: &Self) {
        bbox.min = bbox.min.min(*value);
        bbox.max = bbox.max.max(*value);
    }

    fn format_value(&self) -> String {
        self.to_string()
    }

    fn parse_value(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| TemporaError::Parse(format!("invalid float value: '{}'", s)))
    }
}

impl TemporalValue for String {
    const NAME: &'static str = "text";
    const CONTINUOUS: bool = false;
    type Bbox = ();

    fn interpolate(start: &Self, _end: &Self, _fraction: f64) -> Self {
        start.clone()
    }

    fn to_bbox(&self) -> Self::Bbox {}

    fn expand_bbox(_bbox: &mut Self::Bbox, _value: &Self) {}

    fn format_value(&self) -> String {
        format!("\"{}\"", self)
    }

    fn parse_value(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            Ok(trimmed[1..trimmed.len() - 1].to_string())
        } else {
            Err(TemporaError::Parse(format!(
                "text value must be double-quoted: '{}'",
                s
            )))
        }
    }
}

impl TemporalNumber for i64 {
    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn checked_div(&self, other: &Self) -> Option<Self> {
        if *other == 0 { None } else { Some(self / other) }
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn to_f64(&self) -> f64 {
        *self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as i64
    }
}

impl TemporalNumber for f64 {
    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.abs() < crate::interp::EPSILON {
            None
        } else {
            Some(self / other)
        }
    }

    fn is_zero(&self) -> bool {
        self.abs() < crate::interp::EPSILON
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// A point in 2D or 3D space with a spatial reference identifier.
///
/// The geodetic flag selects Haversine distance over planar Euclidean
/// distance; planar coordinates are required for the analytic turning-point
/// machinery of the distance predicates.
///
/// # Examples
///
/// ```rust
/// use tempora::value::GeomPoint;
///
/// let a = GeomPoint::new(0.0, 0.0);
/// let b = GeomPoint::new(3.0, 4.0);
/// assert_eq!(a.distance(&b), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeomPoint {
    point: Point<f64>,
    z: Option<f64>,
    srid: i32,
    geodetic: bool,
}

impl GeomPoint {
    /// A planar 2D point with SRID 0.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: None,
            srid: 0,
            geodetic: false,
        }
    }

    /// A planar 3D point with SRID 0.
    pub fn new_z(x: f64, y: f64, z: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: Some(z),
            srid: 0,
            geodetic: false,
        }
    }

    /// A geodetic lon/lat point (SRID 4326, Haversine distance).
    pub fn geodetic(lon: f64, lat: f64) -> Self {
        Self {
            point: Point::new(lon, lat),
            z: None,
            srid: WGS84_SRID,
            geodetic: true,
        }
    }

    /// Set the spatial reference identifier.
    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn z(&self) -> Option<f64> {
        self.z
    }

    /// Whether the point carries a Z coordinate.
    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn is_geodetic(&self) -> bool {
        self.geodetic
    }

    pub fn point(&self) -> Point<f64> {
        self.point
    }

    /// Distance to another point: Haversine meters for geodetic points,
    /// Euclidean units (including Z when present on both) otherwise.
    pub fn distance(&self, other: &Self) -> f64 {
        if self.geodetic {
            Haversine.distance(self.point, other.point)
        } else {
            let planar = Euclidean.distance(self.point, other.point);
            match (self.z, other.z) {
                (Some(az), Some(bz)) => (planar * planar + (bz - az) * (bz - az)).sqrt(),
                _ => planar,
            }
        }
    }
}

impl TemporalValue for GeomPoint {
    const NAME: &'static str = "geompoint";
    const CONTINUOUS: bool = true;
    type Bbox = Rect<f64>;

    fn interpolate(start: &Self, end: &Self, fraction: f64) -> Self {
        let x = start.x() + (end.x() - start.x()) * fraction;
        let y = start.y() + (end.y() - start.y()) * fraction;
        let z = match (start.z, end.z) {
            (Some(sz), Some(ez)) => Some(sz + (ez - sz) * fraction),
            _ => None,
        };
        Self {
            point: Point::new(x, y),
            z,
            srid: start.srid,
            geodetic: start.geodetic,
        }
    }

    fn crossing(a0: &Self, a1: &Self, b0: &Self, b1: &Self) -> Option<f64> {
        // The segments meet where their relative position reaches zero.
        // With r(s) = r0 + s * rv, each coordinate pins s independently;
        // all coordinates must agree for a genuine meeting point.
        let r0 = (b0.x() - a0.x(), b0.y() - a0.y());
        let rv = (
            (b1.x() - a1.x()) - r0.0,
            (b1.y() - a1.y()) - r0.1,
        );
        let s = if rv.0.abs() >= crate::interp::EPSILON {
            -r0.0 / rv.0
        } else if rv.1.abs() >= crate::interp::EPSILON {
            -r0.1 / rv.1
        } else {
            return None;
        };
        if s <= crate::interp::EPSILON || s >= 1.0 - crate::interp::EPSILON {
            return None;
        }
        let meet_x = (r0.0 + s * rv.0).abs() < 1e-9;
        let meet_y = (r0.1 + s * rv.1).abs() < 1e-9;
        (meet_x && meet_y).then_some(s)
    }

    fn to_bbox(&self) -> Self::Bbox {
        Rect::new(self.point.0, self.point.0)
    }

    fn expand_bbox(bbox: &mut Self::Bbox, value: &Self) {
        let min = bbox.min();
        let max = bbox.max();
        *bbox = Rect::new(
            geo::coord! { x: min.x.min(value.x()), y: min.y.min(value.y()) },
            geo::coord! { x: max.x.max(value.x()), y: max.y.max(value.y()) },
        );
    }

    fn srid(&self) -> Option<i32> {
        Some(self.srid)
    }

    fn format_value(&self) -> String {
        let mut out = String::new();
        if self.srid != 0 {
            out.push_str(&format!("SRID={};", self.srid));
        }
        match self.z {
            Some(z) => out.push_str(&format!("POINT Z ({} {} {})", self.x(), self.y(), z)),
            None => out.push_str(&format!("POINT({} {})", self.x(), self.y())),
        }
        out
    }

    fn parse_value(s: &str) -> Result<Self> {
        let mut rest = s.trim();
        let mut srid = 0;
        if let Some(stripped) = rest.strip_prefix("SRID=") {
            let (num, tail) = stripped.split_once(';').ok_or_else(|| {
                TemporaError::Parse(format!("missing ';' after SRID in '{}'", s))
            })?;
            srid = num
                .parse()
                .map_err(|_| TemporaError::Parse(format!("invalid SRID in '{}'", s)))?;
            rest = tail.trim();
        }

        let with_z = if let Some(tail) = rest.strip_prefix("POINT Z") {
            rest = tail.trim_start();
            true
        } else if let Some(tail) = rest.strip_prefix("POINT") {
            rest = tail.trim_start();
            false
        } else {
            return Err(TemporaError::Parse(format!(
                "expected POINT geometry, got '{}'",
                s
            )));
        };

        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| {
                TemporaError::Parse(format!("malformed POINT coordinates in '{}'", s))
            })?;
        let coords: Vec<f64> = inner
            .split_whitespace()
            .map(|c| {
                c.parse()
                    .map_err(|_| TemporaError::Parse(format!("invalid coordinate '{}'", c)))
            })
            .collect::<Result<_>>()?;

        let expected = if with_z { 3 } else { 2 };
        if coords.len() != expected {
            return Err(TemporaError::Parse(format!(
                "expected {} coordinates in '{}'",
                expected, s
            )));
        }

        let geodetic = srid == WGS84_SRID;
        Ok(Self {
            point: Point::new(coords[0], coords[1]),
            z: with_z.then(|| coords[2]),
            srid,
            geodetic,
        })
    }
}
