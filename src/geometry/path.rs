//! Paths with circular arc segments
//!
//! A `Path` is an ordered vertex list where each vertex carries the arc sweep
//! angle towards the *next* vertex (0 = straight segment). Arcs are flattened
//! into polylines within a caller-supplied chord tolerance, and paths can be
//! outline-stroked into closed area boundaries (obrounds for straight
//! segments, washer slices for arcs).

use serde::{Deserialize, Serialize};

use super::types::{Angle, Length, Point, PositiveLength};

/// One path vertex; `arc_sweep` describes the edge to the following vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point,
    pub arc_sweep: Angle,
}

impl Vertex {
    pub fn new(position: Point) -> Self {
        Vertex {
            position,
            arc_sweep: Angle::ZERO,
        }
    }

    pub fn with_sweep(position: Point, arc_sweep: Angle) -> Self {
        Vertex {
            position,
            arc_sweep,
        }
    }
}

/// An ordered, possibly closed sequence of vertices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path {
    vertices: Vec<Vertex>,
}

impl Path {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Path { vertices }
    }

    pub fn from_points(points: &[Point]) -> Self {
        Path {
            vertices: points.iter().map(|p| Vertex::new(*p)).collect(),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// A path is closed when its first and last positions coincide
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => {
                self.vertices.len() > 2 && first.position == last.position
            }
            _ => false,
        }
    }

    /// Appends the first vertex if the path is not closed yet
    pub fn to_closed(&self) -> Path {
        let mut path = self.clone();
        if !path.is_closed() {
            if let Some(first) = path.vertices.first().copied() {
                path.vertices.push(Vertex::new(first.position));
            }
        }
        path
    }

    pub fn translated(&self, offset: Point) -> Path {
        Path {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex::with_sweep(v.position + offset, v.arc_sweep))
                .collect(),
        }
    }

    pub fn rotated(&self, angle: Angle, center: Point) -> Path {
        Path {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex::with_sweep(v.position.rotated(angle, center), v.arc_sweep))
                .collect(),
        }
    }

    /// Mirror around the Y axis through `center`; arc sweeps change sign
    pub fn mirrored_x(&self, center: Point) -> Path {
        Path {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex::with_sweep(v.position.mirrored_x(center), -v.arc_sweep))
                .collect(),
        }
    }

    pub fn reversed(&self) -> Path {
        let mut vertices: Vec<Vertex> = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate().rev() {
            let sweep = if i > 0 {
                -self.vertices[i - 1].arc_sweep
            } else {
                Angle::ZERO
            };
            vertices.push(Vertex::with_sweep(v.position, sweep));
        }
        Path { vertices }
    }

    /// Replaces every arc edge by a polyline whose chord deviation from the
    /// true arc stays within `max_tolerance`
    pub fn flattened_arcs(&self, max_tolerance: PositiveLength) -> Path {
        let mut out: Vec<Vertex> = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            if v.arc_sweep == Angle::ZERO || i + 1 >= self.vertices.len() {
                out.push(Vertex::new(v.position));
                continue;
            }
            let next = self.vertices[i + 1].position;
            out.push(Vertex::new(v.position));
            for p in flatten_arc(v.position, next, v.arc_sweep, max_tolerance) {
                out.push(Vertex::new(p));
            }
        }
        // collapse consecutive duplicates produced by tiny arcs
        out.dedup_by(|a, b| a.position == b.position);
        Path { vertices: out }
    }

    /// One closed outline path per segment: obround for straight segments,
    /// washer slice for arcs. Adjacent outlines overlap; callers union them.
    pub fn to_outline_strokes(&self, width: PositiveLength) -> Vec<Path> {
        if self.vertices.len() < 2 {
            if let Some(v) = self.vertices.first() {
                return vec![Path::circle(width).translated(v.position)];
            }
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.vertices.len() - 1);
        for i in 0..self.vertices.len() - 1 {
            let a = self.vertices[i];
            let b = self.vertices[i + 1];
            if a.arc_sweep == Angle::ZERO {
                out.push(Path::obround(a.position, b.position, width));
            } else {
                out.push(arc_obround(a.position, b.position, a.arc_sweep, width));
            }
        }
        out
    }

    /// Circle of the given diameter centered at the origin, built from two
    /// 180° arcs
    pub fn circle(diameter: PositiveLength) -> Path {
        let r = diameter.nm() / 2;
        Path {
            vertices: vec![
                Vertex::with_sweep(Point::from_nm(r, 0), Angle::deg_180()),
                Vertex::with_sweep(Point::from_nm(-r, 0), Angle::deg_180()),
                Vertex::new(Point::from_nm(r, 0)),
            ],
        }
    }

    /// Stadium shape around the segment p1..p2. Degenerates to a circle when
    /// the points coincide. The perpendicular direction is the documented
    /// floating-point touchpoint: no exact integer alternative exists.
    pub fn obround(p1: Point, p2: Point, width: PositiveLength) -> Path {
        if p1 == p2 {
            return Path::circle(width).translated(p1);
        }
        let hw = width.nm() as f64 / 2.0;
        let dx = (p2.x.nm() - p1.x.nm()) as f64;
        let dy = (p2.y.nm() - p1.y.nm()) as f64;
        let len = dx.hypot(dy);
        let (px, py) = (-dy / len * hw, dx / len * hw);
        let off = |p: Point, sx: f64, sy: f64| {
            Point::from_nm(
                p.x.nm() + sx.round() as i64,
                p.y.nm() + sy.round() as i64,
            )
        };
        let a = off(p1, px, py);
        let b = off(p2, px, py);
        let c = off(p2, -px, -py);
        let d = off(p1, -px, -py);
        Path {
            vertices: vec![
                Vertex::new(a),
                Vertex::with_sweep(b, -Angle::deg_180()),
                Vertex::new(c),
                Vertex::with_sweep(d, -Angle::deg_180()),
                Vertex::new(a),
            ],
        }
    }

    /// Axis-aligned rectangle centered at the origin
    pub fn centered_rect(width: PositiveLength, height: PositiveLength) -> Path {
        let hw = width.nm() / 2;
        let hh = height.nm() / 2;
        Path::from_points(&[
            Point::from_nm(-hw, -hh),
            Point::from_nm(hw, -hh),
            Point::from_nm(hw, hh),
            Point::from_nm(-hw, hh),
            Point::from_nm(-hw, -hh),
        ])
    }

    /// Rectangle with rounded corners (radius 0 gives a plain rectangle)
    pub fn rounded_rect(
        width: PositiveLength,
        height: PositiveLength,
        corner_radius: Length,
    ) -> Path {
        let hw = width.nm() / 2;
        let hh = height.nm() / 2;
        let r = corner_radius.nm().clamp(0, hw.min(hh));
        if r == 0 {
            return Path::centered_rect(width, height);
        }
        // corner arcs sweep +90° each, walking counter-clockwise
        let quarter = Angle::deg_90();
        Path {
            vertices: vec![
                Vertex::new(Point::from_nm(-hw + r, -hh)),
                Vertex::with_sweep(Point::from_nm(hw - r, -hh), quarter),
                Vertex::new(Point::from_nm(hw, -hh + r)),
                Vertex::with_sweep(Point::from_nm(hw, hh - r), quarter),
                Vertex::new(Point::from_nm(hw - r, hh)),
                Vertex::with_sweep(Point::from_nm(-hw + r, hh), quarter),
                Vertex::new(Point::from_nm(-hw, hh - r)),
                Vertex::with_sweep(Point::from_nm(-hw, -hh + r), quarter),
                Vertex::new(Point::from_nm(-hw + r, -hh)),
            ],
        }
    }

    /// Regular octagon with optionally rounded corners, inscribed in
    /// width x height
    pub fn rounded_octagon(
        width: PositiveLength,
        height: PositiveLength,
        corner_radius: Length,
    ) -> Path {
        let hw = width.nm() / 2;
        let hh = height.nm() / 2;
        // 45° corner cut, sized by the corner radius when one is given
        let tangent = ((hw.min(hh)) as f64 * (1.0 - 1.0 / std::f64::consts::SQRT_2)).round() as i64;
        let c = if corner_radius.nm() > 0 {
            corner_radius.nm().clamp(1, hw.min(hh))
        } else {
            tangent
        };
        Path::from_points(&[
            Point::from_nm(hw - c, -hh),
            Point::from_nm(hw, -hh + c),
            Point::from_nm(hw, hh - c),
            Point::from_nm(hw - c, hh),
            Point::from_nm(-hw + c, hh),
            Point::from_nm(-hw, hh - c),
            Point::from_nm(-hw, -hh + c),
            Point::from_nm(-hw + c, -hh),
            Point::from_nm(hw - c, -hh),
        ])
    }
}

/// Centre of the arc from `p1` to `p2` with the given sweep. At exactly
/// ±180° the centre falls on the chord midpoint (left of the directed edge).
pub fn arc_center(p1: Point, p2: Point, sweep: Angle) -> Point {
    let mx = (p1.x.nm() + p2.x.nm()) as f64 / 2.0;
    let my = (p1.y.nm() + p2.y.nm()) as f64 / 2.0;
    let half = sweep.to_rad() / 2.0;
    let tan_half = half.tan();
    if tan_half.abs() < 1e-12 || sweep.abs() == Angle::deg_180() {
        return Point::from_nm(mx.round() as i64, my.round() as i64);
    }
    let dx = (p2.x.nm() - p1.x.nm()) as f64;
    let dy = (p2.y.nm() - p1.y.nm()) as f64;
    // left normal of the chord, scaled by |chord|/(2 tan(sweep/2))
    let k = 1.0 / (2.0 * tan_half);
    Point::from_nm((mx - dy * k).round() as i64, (my + dx * k).round() as i64)
}

/// Intermediate points (excluding endpoints) approximating the arc within the
/// chord tolerance
fn flatten_arc(p1: Point, p2: Point, sweep: Angle, tolerance: PositiveLength) -> Vec<Point> {
    let center = arc_center(p1, p2, sweep);
    let rx = (p1.x.nm() - center.x.nm()) as f64;
    let ry = (p1.y.nm() - center.y.nm()) as f64;
    let radius = rx.hypot(ry);
    if radius <= tolerance.nm() as f64 {
        return Vec::new();
    }
    // sagitta of a segment spanning theta: r * (1 - cos(theta / 2)) <= tol
    let max_span = 2.0 * (1.0 - tolerance.nm() as f64 / radius).clamp(-1.0, 1.0).acos();
    let total = sweep.to_rad();
    let segments = (total.abs() / max_span).ceil().max(1.0) as usize;
    if segments < 2 {
        return Vec::new();
    }
    let start = ry.atan2(rx);
    let mut points = Vec::with_capacity(segments - 1);
    for i in 1..segments {
        let a = start + total * (i as f64 / segments as f64);
        points.push(Point::from_nm(
            (center.x.nm() as f64 + radius * a.cos()).round() as i64,
            (center.y.nm() as f64 + radius * a.sin()).round() as i64,
        ));
    }
    points
}

/// Washer slice: the arc segment swept with a stroke width. Falls back to a
/// filled pie when the inner radius vanishes.
fn arc_obround(p1: Point, p2: Point, sweep: Angle, width: PositiveLength) -> Path {
    let center = arc_center(p1, p2, sweep);
    let hw = width.nm() as f64 / 2.0;
    let scale = |p: Point, factor: f64| {
        let dx = (p.x.nm() - center.x.nm()) as f64;
        let dy = (p.y.nm() - center.y.nm()) as f64;
        let len = dx.hypot(dy);
        if len < 1.0 {
            return p;
        }
        Point::from_nm(
            (center.x.nm() as f64 + dx * factor / len).round() as i64,
            (center.y.nm() as f64 + dy * factor / len).round() as i64,
        )
    };
    let dx = (p1.x.nm() - center.x.nm()) as f64;
    let dy = (p1.y.nm() - center.y.nm()) as f64;
    let radius = dx.hypot(dy);
    let outer = radius + hw;
    let inner = (radius - hw).max(0.0);

    let start_outer = scale(p1, outer);
    let end_outer = scale(p2, outer);
    if inner <= 0.0 {
        // stroke swallows the arc centre: collapse to a pie
        return Path::new(vec![
            Vertex::with_sweep(start_outer, sweep),
            Vertex::new(end_outer),
            Vertex::new(center),
            Vertex::new(start_outer),
        ]);
    }
    let start_inner = scale(p1, inner);
    let end_inner = scale(p2, inner);
    Path::new(vec![
        Vertex::with_sweep(start_outer, sweep),
        Vertex::with_sweep(end_outer, Angle::deg_180()),
        Vertex::with_sweep(end_inner, -sweep),
        Vertex::with_sweep(start_inner, Angle::deg_180()),
        Vertex::new(start_outer),
    ])
}

/// Placement transform: mirror across Y, rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point,
    pub rotation: Angle,
    pub mirrored: bool,
}

impl Transform {
    pub fn new(position: Point, rotation: Angle, mirrored: bool) -> Self {
        Transform {
            position,
            rotation,
            mirrored,
        }
    }

    pub fn identity() -> Self {
        Transform::default()
    }

    pub fn map_point(&self, p: Point) -> Point {
        let p = if self.mirrored {
            p.mirrored_x(Point::ORIGIN)
        } else {
            p
        };
        p.rotated(self.rotation, Point::ORIGIN) + self.position
    }

    pub fn map_angle(&self, a: Angle) -> Angle {
        if self.mirrored {
            (Angle::deg_180() - a + self.rotation).normalized()
        } else {
            (a + self.rotation).normalized()
        }
    }

    pub fn map_path(&self, path: &Path) -> Path {
        let path = if self.mirrored {
            path.mirrored_x(Point::ORIGIN)
        } else {
            path.clone()
        };
        path.rotated(self.rotation, Point::ORIGIN)
            .translated(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::types::Length;

    fn pos_len(nm: i64) -> PositiveLength {
        PositiveLength::new(Length::new(nm)).unwrap()
    }

    #[test]
    fn test_closed_detection() {
        let open = Path::from_points(&[Point::from_nm(0, 0), Point::from_nm(10, 0)]);
        assert!(!open.is_closed());
        let closed = open.to_closed();
        assert!(closed.len() == 3 && closed.is_closed());
    }

    #[test]
    fn test_circle_flattening_stays_on_radius() {
        let circle = Path::circle(pos_len(1_000_000));
        let flat = circle.flattened_arcs(pos_len(5_000));
        assert!(flat.len() > 8);
        for v in flat.vertices() {
            let r = (v.position.distance_sq(Point::ORIGIN) as f64).sqrt();
            assert!((r - 500_000.0).abs() < 5_000.0, "vertex off radius: {}", r);
        }
    }

    #[test]
    fn test_arc_center_180_is_midpoint() {
        let c = arc_center(
            Point::from_nm(-500, 0),
            Point::from_nm(500, 0),
            Angle::deg_180(),
        );
        assert_eq!(c, Point::from_nm(0, 0));
    }

    #[test]
    fn test_arc_center_90() {
        // quarter arc from (r,0) to (0,r) CCW has its centre at the origin
        let c = arc_center(
            Point::from_nm(1000, 0),
            Point::from_nm(0, 1000),
            Angle::deg_90(),
        );
        assert_eq!(c, Point::from_nm(0, 0));
    }

    #[test]
    fn test_obround_degenerates_to_circle() {
        let p = Point::from_nm(100, 100);
        let ob = Path::obround(p, p, pos_len(500));
        let circle = Path::circle(pos_len(500)).translated(p);
        assert_eq!(ob, circle);
    }

    #[test]
    fn test_obround_bounds() {
        let ob = Path::obround(
            Point::from_nm(0, 0),
            Point::from_nm(10_000, 0),
            pos_len(2_000),
        );
        let flat = ob.flattened_arcs(pos_len(10));
        let xs: Vec<i64> = flat.vertices().iter().map(|v| v.position.x.nm()).collect();
        let ys: Vec<i64> = flat.vertices().iter().map(|v| v.position.y.nm()).collect();
        assert_eq!(*ys.iter().max().unwrap(), 1_000);
        assert_eq!(*ys.iter().min().unwrap(), -1_000);
        assert!(*xs.iter().max().unwrap() >= 10_900);
        assert!(*xs.iter().min().unwrap() <= -900);
    }

    #[test]
    fn test_outline_strokes_one_per_segment() {
        let path = Path::from_points(&[
            Point::from_nm(0, 0),
            Point::from_nm(1000, 0),
            Point::from_nm(1000, 1000),
        ]);
        let strokes = path.to_outline_strokes(pos_len(100));
        assert_eq!(strokes.len(), 2);
        assert!(strokes.iter().all(|s| s.is_closed()));
    }

    #[test]
    fn test_transform_round_trip() {
        let t = Transform::new(Point::from_nm(1000, 2000), Angle::deg_90(), false);
        let p = t.map_point(Point::from_nm(10, 0));
        assert_eq!(p, Point::from_nm(1000, 2010));
    }

    #[test]
    fn test_transform_mirror() {
        let t = Transform::new(Point::ORIGIN, Angle::ZERO, true);
        assert_eq!(t.map_point(Point::from_nm(10, 5)), Point::from_nm(-10, 5));
    }
}
