//! Core fixed-point geometry types
//!
//! All spatial reasoning happens in signed integer nanometres. Products that
//! can exceed 64 bits (areas, cross products, squared distances) are widened
//! to i128 before multiplying.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A length in integer nanometres
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(i64);

impl Length {
    pub const ZERO: Length = Length(0);

    pub const fn new(nm: i64) -> Self {
        Length(nm)
    }

    /// Construct from millimetres, rounding to the nearest nanometre
    pub fn from_mm(mm: f64) -> Self {
        Length((mm * 1_000_000.0).round() as i64)
    }

    pub const fn nm(self) -> i64 {
        self.0
    }

    /// Millimetre value for display only, never for comparisons
    pub fn to_mm(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub const fn abs(self) -> Length {
        Length(self.0.abs())
    }

    pub fn min(self, other: Length) -> Length {
        Length(self.0.min(other.0))
    }

    pub fn max(self, other: Length) -> Length {
        Length(self.0.max(other.0))
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Length> {
        self.0.checked_mul(rhs).map(Length)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}mm", self.to_mm())
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}

impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Length {
        Length(-self.0)
    }
}

impl Mul<i64> for Length {
    type Output = Length;
    fn mul(self, rhs: i64) -> Length {
        Length(self.0 * rhs)
    }
}

impl Div<i64> for Length {
    type Output = Length;
    fn div(self, rhs: i64) -> Length {
        Length(self.0 / rhs)
    }
}

/// A length guaranteed to be >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedLength(Length);

impl UnsignedLength {
    pub const ZERO: UnsignedLength = UnsignedLength(Length::ZERO);

    /// Returns `None` for negative input
    pub fn new(len: Length) -> Option<Self> {
        if len.nm() >= 0 {
            Some(UnsignedLength(len))
        } else {
            None
        }
    }

    /// Clamps negative input to zero
    pub fn clamped(len: Length) -> Self {
        UnsignedLength(len.max(Length::ZERO))
    }

    pub const fn get(self) -> Length {
        self.0
    }

    pub const fn nm(self) -> i64 {
        self.0.nm()
    }

    pub fn is_zero(self) -> bool {
        self.0 == Length::ZERO
    }
}

impl fmt::Display for UnsignedLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A length guaranteed to be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositiveLength(Length);

impl PositiveLength {
    /// Returns `None` for input <= 0
    pub fn new(len: Length) -> Option<Self> {
        if len.nm() > 0 {
            Some(PositiveLength(len))
        } else {
            None
        }
    }

    /// Clamps input to at least 1 nm
    pub fn clamped(len: Length) -> Self {
        PositiveLength(len.max(Length::new(1)))
    }

    pub const fn get(self) -> Length {
        self.0
    }

    pub const fn nm(self) -> i64 {
        self.0.nm()
    }
}

impl fmt::Display for PositiveLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<PositiveLength> for UnsignedLength {
    fn from(len: PositiveLength) -> Self {
        UnsignedLength(len.get())
    }
}

/// Fixed-point ratio in parts per million (1_000_000 = 100%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(i32);

impl Ratio {
    pub const ZERO: Ratio = Ratio(0);
    pub const FULL: Ratio = Ratio(1_000_000);

    pub const fn from_ppm(ppm: i32) -> Self {
        Ratio(ppm)
    }

    pub fn from_percent(percent: i32) -> Self {
        Ratio(percent * 10_000)
    }

    pub const fn ppm(self) -> i32 {
        self.0
    }

    /// Scales a length by this ratio, rounding towards zero
    pub fn scaled(self, len: Length) -> Length {
        Length::new(((len.nm() as i128 * self.0 as i128) / 1_000_000) as i64)
    }
}

/// A ratio limited to [0%, 100%]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedLimitedRatio(Ratio);

impl UnsignedLimitedRatio {
    pub const ZERO: UnsignedLimitedRatio = UnsignedLimitedRatio(Ratio::ZERO);
    pub const FULL: UnsignedLimitedRatio = UnsignedLimitedRatio(Ratio::FULL);

    /// Returns `None` outside [0, 100%]
    pub fn new(ratio: Ratio) -> Option<Self> {
        if ratio.ppm() >= 0 && ratio.ppm() <= 1_000_000 {
            Some(UnsignedLimitedRatio(ratio))
        } else {
            None
        }
    }

    pub const fn get(self) -> Ratio {
        self.0
    }

    pub fn scaled(self, len: Length) -> Length {
        self.0.scaled(len)
    }
}

/// An angle in integer 1/1000 degree ticks, normalized to (-360°, 360°) open
/// on construction via `normalized()`, stored modulo 360000
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(i32);

impl Angle {
    pub const ZERO: Angle = Angle(0);

    pub const fn from_millideg(mdeg: i32) -> Self {
        Angle(mdeg)
    }

    pub const fn from_deg(deg: i32) -> Self {
        Angle(deg * 1000)
    }

    pub const fn deg_90() -> Angle {
        Angle(90_000)
    }

    pub const fn deg_180() -> Angle {
        Angle(180_000)
    }

    pub const fn millideg(self) -> i32 {
        self.0
    }

    /// Wraps into [0°, 360°)
    pub fn normalized(self) -> Angle {
        Angle(self.0.rem_euclid(360_000))
    }

    pub fn to_rad(self) -> f64 {
        self.0 as f64 * std::f64::consts::PI / 180_000.0
    }

    pub fn to_deg(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn abs(self) -> Angle {
        Angle(self.0.abs())
    }

    /// True for 0°, 90°, 180°, 270° (exact integer rotation possible)
    pub fn is_ortho(self) -> bool {
        self.normalized().0 % 90_000 == 0
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

/// A 2D point in integer nanometres
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Length,
    pub y: Length,
}

impl Point {
    pub const ORIGIN: Point = Point {
        x: Length::ZERO,
        y: Length::ZERO,
    };

    pub const fn new(x: Length, y: Length) -> Self {
        Point { x, y }
    }

    pub fn from_nm(x: i64, y: i64) -> Self {
        Point {
            x: Length::new(x),
            y: Length::new(y),
        }
    }

    pub fn translated(self, dx: Length, dy: Length) -> Point {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared distance, widened to i128
    pub fn distance_sq(self, other: Point) -> i128 {
        let dx = (other.x.nm() - self.x.nm()) as i128;
        let dy = (other.y.nm() - self.y.nm()) as i128;
        dx * dx + dy * dy
    }

    /// Rotates around `center`. Multiples of 90° are exact integer swaps;
    /// other angles round each coordinate to the nearest nanometre.
    pub fn rotated(self, angle: Angle, center: Point) -> Point {
        let dx = self.x.nm() - center.x.nm();
        let dy = self.y.nm() - center.y.nm();
        let (rx, ry) = if angle.is_ortho() {
            match angle.normalized().millideg() {
                0 => (dx, dy),
                90_000 => (-dy, dx),
                180_000 => (-dx, -dy),
                _ => (dy, -dx),
            }
        } else {
            let rad = angle.to_rad();
            let (sin, cos) = rad.sin_cos();
            (
                (dx as f64 * cos - dy as f64 * sin).round() as i64,
                (dx as f64 * sin + dy as f64 * cos).round() as i64,
            )
        };
        Point::from_nm(center.x.nm() + rx, center.y.nm() + ry)
    }

    /// Mirrors the X coordinate around `center`
    pub fn mirrored_x(self, center: Point) -> Point {
        Point::from_nm(2 * center.x.nm() - self.x.nm(), self.y.nm())
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Cross product of (b - a) x (c - a), widened to i128
pub fn cross(a: Point, b: Point, c: Point) -> i128 {
    let abx = (b.x.nm() - a.x.nm()) as i128;
    let aby = (b.y.nm() - a.y.nm()) as i128;
    let acx = (c.x.nm() - a.x.nm()) as i128;
    let acy = (c.y.nm() - a.y.nm()) as i128;
    abx * acy - aby * acx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_arithmetic() {
        let a = Length::new(1_000_000);
        let b = Length::new(250_000);
        assert_eq!((a + b).nm(), 1_250_000);
        assert_eq!((a - b).nm(), 750_000);
        assert_eq!((a * 3).nm(), 3_000_000);
        assert_eq!((a / 4).nm(), 250_000);
        assert_eq!((-a).nm(), -1_000_000);
    }

    #[test]
    fn test_unsigned_length_rejects_negative() {
        assert!(UnsignedLength::new(Length::new(-1)).is_none());
        assert!(UnsignedLength::new(Length::ZERO).is_some());
        assert_eq!(UnsignedLength::clamped(Length::new(-5)).nm(), 0);
    }

    #[test]
    fn test_positive_length_rejects_zero() {
        assert!(PositiveLength::new(Length::ZERO).is_none());
        assert_eq!(PositiveLength::clamped(Length::ZERO).nm(), 1);
        assert_eq!(PositiveLength::new(Length::new(7)).unwrap().nm(), 7);
    }

    #[test]
    fn test_ratio_scaling() {
        let half = Ratio::from_percent(50);
        assert_eq!(half.scaled(Length::new(1_000_000)).nm(), 500_000);
        assert!(UnsignedLimitedRatio::new(Ratio::from_percent(101)).is_none());
    }

    #[test]
    fn test_angle_normalization() {
        assert_eq!(Angle::from_deg(-90).normalized().millideg(), 270_000);
        assert_eq!(Angle::from_deg(450).normalized().millideg(), 90_000);
        assert!(Angle::from_deg(270).is_ortho());
        assert!(!Angle::from_millideg(45_500).is_ortho());
    }

    #[test]
    fn test_point_rotation_exact_ortho() {
        let p = Point::from_nm(10, 0);
        let r = p.rotated(Angle::deg_90(), Point::ORIGIN);
        assert_eq!(r, Point::from_nm(0, 10));
        let r = p.rotated(Angle::from_deg(180), Point::ORIGIN);
        assert_eq!(r, Point::from_nm(-10, 0));
    }

    #[test]
    fn test_cross_widening() {
        // Coordinates near the 32-bit limit must not overflow
        let a = Point::from_nm(0, 0);
        let b = Point::from_nm(3_000_000_000, 0);
        let c = Point::from_nm(0, 3_000_000_000);
        assert_eq!(cross(a, b, c), 9_000_000_000_000_000_000i128);
    }
}
