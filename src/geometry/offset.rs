//! Polygon offsetting (Minkowski sum/difference with a disc)
//!
//! Inflation unions the input with one obround per boundary edge; deflation
//! subtracts the boundary band instead. Both keep every intermediate operand
//! a valid multipolygon for the sweep.

use super::path::Path;
use super::polygon::PolygonSet;
use super::types::{Length, PositiveLength};

/// Offsets a polygon set by a signed disc radius. Positive values grow the
/// area, negative values shrink it; zero is a no-op.
pub fn offset(set: &PolygonSet, delta: Length, tolerance: PositiveLength) -> PolygonSet {
    if delta.nm() > 0 {
        inflate(set, PositiveLength::clamped(delta), tolerance)
    } else if delta.nm() < 0 {
        deflate(set, PositiveLength::clamped(-delta), tolerance)
    } else {
        set.clone()
    }
}

/// Minkowski sum with a disc of the given radius
pub fn inflate(set: &PolygonSet, radius: PositiveLength, tolerance: PositiveLength) -> PolygonSet {
    if set.is_empty() {
        return PolygonSet::new();
    }
    let mut parts = vec![set.clone()];
    parts.extend(boundary_band(set, radius, tolerance));
    PolygonSet::union_all(parts)
}

/// Minkowski erosion by a disc of the given radius
pub fn deflate(set: &PolygonSet, radius: PositiveLength, tolerance: PositiveLength) -> PolygonSet {
    if set.is_empty() {
        return PolygonSet::new();
    }
    let band = PolygonSet::union_all(boundary_band(set, radius, tolerance));
    set.subtract(&band)
}

/// One disc-swept obround per boundary edge of every ring
fn boundary_band(
    set: &PolygonSet,
    radius: PositiveLength,
    tolerance: PositiveLength,
) -> Vec<PolygonSet> {
    let width = PositiveLength::clamped(radius.get() * 2);
    let mut parts = Vec::new();
    for ring in set.rings() {
        let n = ring.points.len();
        for i in 0..n {
            let a = ring.points[i];
            let b = ring.points[(i + 1) % n];
            let ob = Path::obround(a, b, width);
            let poly = PolygonSet::from_closed_path(&ob, tolerance);
            if !poly.is_empty() {
                parts.push(poly);
            }
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::types::Point;

    fn tol() -> PositiveLength {
        PositiveLength::clamped(Length::new(5_000))
    }

    fn square(size: i64) -> PolygonSet {
        let h = size / 2;
        PolygonSet::from_closed_path(
            &Path::from_points(&[
                Point::from_nm(-h, -h),
                Point::from_nm(h, -h),
                Point::from_nm(h, h),
                Point::from_nm(-h, h),
                Point::from_nm(-h, -h),
            ]),
            tol(),
        )
    }

    #[test]
    fn test_inflate_grows_bounds() {
        let s = square(1_000_000);
        let grown = inflate(&s, PositiveLength::clamped(Length::new(100_000)), tol());
        let b = grown.bounds().unwrap();
        assert_eq!(b[0], -600_000);
        assert_eq!(b[2], 600_000);
        assert!(grown.area2() > s.area2());
    }

    #[test]
    fn test_deflate_shrinks_bounds() {
        let s = square(1_000_000);
        let shrunk = deflate(&s, PositiveLength::clamped(Length::new(100_000)), tol());
        let b = shrunk.bounds().unwrap();
        assert_eq!(b, [-400_000, -400_000, 400_000, 400_000]);
        assert_eq!(shrunk.area2() / 2, 800_000i128 * 800_000);
    }

    #[test]
    fn test_deflate_to_nothing() {
        let s = square(100_000);
        let gone = deflate(&s, PositiveLength::clamped(Length::new(60_000)), tol());
        assert!(gone.is_empty());
    }

    #[test]
    fn test_offset_zero_is_identity() {
        let s = square(500_000);
        assert_eq!(offset(&s, Length::ZERO, tol()), s);
    }

    #[test]
    fn test_offset_round_trip_keeps_convex_shape() {
        // grow then shrink a convex shape: corners are rounded outward and
        // restored by the erosion, up to flattening tolerance
        let s = square(1_000_000);
        let r = Length::new(200_000);
        let round = offset(&offset(&s, r, tol()), -r, tol());
        let b = round.bounds().unwrap();
        for (got, want) in b.iter().zip([-500_000i64, -500_000, 500_000, 500_000]) {
            assert!((got - want).abs() <= 10_000, "bound {} vs {}", got, want);
        }
    }
}
