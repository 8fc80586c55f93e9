//! Polygon sets: flattened closed rings with hole classification
//!
//! A `PolygonSet` is the result type of all area computations. Rings are
//! stored fully flattened (no arcs) with integer nanometre vertices; outer
//! rings are counter-clockwise, holes clockwise.

use serde::{Deserialize, Serialize};

use super::boolean::{boolean_op, Contour, Operation};
use super::path::Path;
use super::types::{Point, PositiveLength};

/// One closed flattened ring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    pub points: Vec<Point>,
    pub is_hole: bool,
}

impl Ring {
    /// Twice the signed area (counter-clockwise positive), in i128
    pub fn signed_area2(&self) -> i128 {
        let mut sum = 0i128;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            sum += a.x.nm() as i128 * b.y.nm() as i128 - b.x.nm() as i128 * a.y.nm() as i128;
        }
        sum
    }

    fn normalized(mut self) -> Ring {
        let ccw = self.signed_area2() > 0;
        if ccw == self.is_hole {
            self.points.reverse();
        }
        self
    }
}

/// A set of closed rings forming zero or more polygons with holes.
/// The empty set is the unit for union and absorbing for intersect/subtract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonSet {
    rings: Vec<Ring>,
}

impl PolygonSet {
    pub fn new() -> Self {
        PolygonSet::default()
    }

    /// Flattens a closed path's arcs and wraps it as one positive ring.
    /// Paths with fewer than three distinct vertices yield the empty set.
    pub fn from_closed_path(path: &Path, tolerance: PositiveLength) -> Self {
        let flat = path.to_closed().flattened_arcs(tolerance);
        let mut points: Vec<Point> = flat.vertices().iter().map(|v| v.position).collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points.dedup();
        if points.len() < 3 {
            return PolygonSet::new();
        }
        PolygonSet {
            rings: vec![Ring {
                points,
                is_hole: false,
            }
            .normalized()],
        }
    }

    pub fn from_paths<'a>(
        paths: impl IntoIterator<Item = &'a Path>,
        tolerance: PositiveLength,
    ) -> Vec<PolygonSet> {
        paths
            .into_iter()
            .map(|p| PolygonSet::from_closed_path(p, tolerance))
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    fn input_rings(&self) -> Vec<Vec<Point>> {
        self.rings.iter().map(|r| r.points.clone()).collect()
    }

    fn from_contours(contours: Vec<Contour>) -> PolygonSet {
        PolygonSet {
            rings: contours
                .into_iter()
                .filter(|c| c.points.len() >= 3)
                .map(|c| {
                    let is_hole = c.is_hole();
                    Ring {
                        points: c.points,
                        is_hole,
                    }
                    .normalized()
                })
                .collect(),
        }
    }

    pub fn unite(&self, other: &PolygonSet) -> PolygonSet {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        PolygonSet::from_contours(boolean_op(
            &self.input_rings(),
            &other.input_rings(),
            Operation::Union,
        ))
    }

    pub fn intersect(&self, other: &PolygonSet) -> PolygonSet {
        if self.is_empty() || other.is_empty() {
            return PolygonSet::new();
        }
        PolygonSet::from_contours(boolean_op(
            &self.input_rings(),
            &other.input_rings(),
            Operation::Intersection,
        ))
    }

    pub fn subtract(&self, other: &PolygonSet) -> PolygonSet {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        PolygonSet::from_contours(boolean_op(
            &self.input_rings(),
            &other.input_rings(),
            Operation::Difference,
        ))
    }

    /// Balanced pairwise union; each intermediate operand stays a valid
    /// multipolygon, which the sweep requires
    pub fn union_all(mut sets: Vec<PolygonSet>) -> PolygonSet {
        sets.retain(|s| !s.is_empty());
        if sets.is_empty() {
            return PolygonSet::new();
        }
        while sets.len() > 1 {
            let mut merged = Vec::with_capacity(sets.len().div_ceil(2));
            for chunk in sets.chunks(2) {
                match chunk {
                    [a, b] => merged.push(a.unite(b)),
                    [a] => merged.push(a.clone()),
                    _ => unreachable!(),
                }
            }
            sets = merged;
        }
        sets.pop().unwrap_or_default()
    }

    /// All boundary rings as closed paths, nesting discarded (every ring
    /// counter-clockwise). Used to report overlap areas.
    pub fn flatten_tree(&self) -> Vec<Path> {
        self.rings
            .iter()
            .map(|r| {
                let mut points = r.points.clone();
                if r.is_hole {
                    points.reverse();
                }
                let mut path = Path::from_points(&points);
                path = path.to_closed();
                path
            })
            .collect()
    }

    /// All rings as closed paths preserving their hole orientation
    pub fn tree_to_paths(&self) -> Vec<Path> {
        self.rings
            .iter()
            .map(|r| Path::from_points(&r.points).to_closed())
            .collect()
    }

    /// Even-odd containment; boundary points count as inside
    pub fn contains(&self, p: Point) -> bool {
        let mut crossings = 0u32;
        for ring in &self.rings {
            let n = ring.points.len();
            for i in 0..n {
                let a = ring.points[i];
                let b = ring.points[(i + 1) % n];
                if on_segment(a, b, p) {
                    return true;
                }
                // upward crossing rule
                let (ay, by) = (a.y.nm(), b.y.nm());
                if (ay <= p.y.nm()) != (by <= p.y.nm()) {
                    let side = super::types::cross(a, b, p);
                    if (by > ay && side > 0) || (by < ay && side < 0) {
                        crossings += 1;
                    }
                }
            }
        }
        crossings % 2 == 1
    }

    /// Axis-aligned bounds as [min_x, min_y, max_x, max_y], `None` when empty
    pub fn bounds(&self) -> Option<[i64; 4]> {
        let mut it = self.rings.iter().flat_map(|r| r.points.iter());
        let first = it.next()?;
        let mut b = [first.x.nm(), first.y.nm(), first.x.nm(), first.y.nm()];
        for p in it {
            b[0] = b[0].min(p.x.nm());
            b[1] = b[1].min(p.y.nm());
            b[2] = b[2].max(p.x.nm());
            b[3] = b[3].max(p.y.nm());
        }
        Some(b)
    }

    /// Total enclosed area (outer minus holes), halved from 2x ring areas
    pub fn area2(&self) -> i128 {
        self.rings.iter().map(|r| r.signed_area2()).sum()
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    if super::types::cross(a, b, p) != 0 {
        return false;
    }
    p.x.nm() >= a.x.nm().min(b.x.nm())
        && p.x.nm() <= a.x.nm().max(b.x.nm())
        && p.y.nm() >= a.y.nm().min(b.y.nm())
        && p.y.nm() <= a.y.nm().max(b.y.nm())
}
