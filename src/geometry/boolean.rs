//! Boolean operations on polygon rings
//!
//! Sweep-line clipping (Martinez–Rueda–Feito) over signed 64-bit integer
//! coordinates. Orientation tests use i128 cross products so no input within
//! the nanometre coordinate range can overflow. Intersection points are
//! rounded to the nearest nanometre; callers that inflate by a clearance
//! already subtract one nanometre to absorb that rounding.
//!
//! The module is self-contained: events, the status line, subdivision and
//! the contour connector all operate on one event arena indexed by `usize`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::{cross, Point};

/// Boolean operation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Union,
    Intersection,
    Difference,
    Xor,
}

/// An output ring; `depth` parity tells holes (odd) from outer rings (even)
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point>,
    pub depth: u32,
}

impl Contour {
    pub fn is_hole(&self) -> bool {
        self.depth % 2 == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeType {
    Normal,
    NonContributing,
    SameTransition,
    DifferentTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    None,
    InOut,
    OutIn,
}

#[derive(Debug, Clone)]
struct SweepEvent {
    point: Point,
    left: bool,
    other: usize,
    is_subject: bool,
    edge_type: EdgeType,
    in_out: bool,
    other_in_out: bool,
    prev_in_result: Option<usize>,
    in_result: bool,
    result_transition: Transition,
    output_contour_id: usize,
}

impl SweepEvent {
    fn new(point: Point, left: bool, other: usize, is_subject: bool) -> Self {
        SweepEvent {
            point,
            left,
            other,
            is_subject,
            edge_type: EdgeType::Normal,
            in_out: false,
            other_in_out: true,
            prev_in_result: None,
            in_result: false,
            result_transition: Transition::None,
            output_contour_id: usize::MAX,
        }
    }
}

struct Arena {
    events: Vec<SweepEvent>,
}

impl Arena {
    fn other_point(&self, e: usize) -> Point {
        self.events[self.events[e].other].point
    }

    /// True if `p` lies strictly above the segment of left event `e`
    fn is_below(&self, e: usize, p: Point) -> bool {
        let ev = &self.events[e];
        if ev.left {
            cross(ev.point, self.other_point(e), p) > 0
        } else {
            cross(self.other_point(e), ev.point, p) > 0
        }
    }

    fn is_vertical(&self, e: usize) -> bool {
        self.events[e].point.x == self.other_point(e).x
    }

    /// Event processing order: lexicographic point, right endpoints first,
    /// then bottom segment first, subject before clip
    fn compare_events(&self, a: usize, b: usize) -> Ordering {
        let ea = &self.events[a];
        let eb = &self.events[b];
        match (ea.point.x, ea.point.y).cmp(&(eb.point.x, eb.point.y)) {
            Ordering::Equal => {}
            ord => return ord,
        }
        if ea.left != eb.left {
            return if ea.left { Ordering::Greater } else { Ordering::Less };
        }
        let area = cross(ea.point, self.other_point(a), self.other_point(b));
        if area != 0 {
            return if self.is_below(a, self.other_point(b)) {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        match (ea.is_subject, eb.is_subject) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.cmp(&b),
        }
    }

    /// Status-line order of two left events (which segment is lower)
    fn compare_segments(&self, a: usize, b: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let pa = self.events[a].point;
        let pb = self.events[b].point;
        let oa = self.other_point(a);
        let ob = self.other_point(b);
        if cross(pa, oa, pb) != 0 || cross(pa, oa, ob) != 0 {
            if pa == pb {
                return if self.is_below(a, ob) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            if pa.x == pb.x {
                return if pa.y < pb.y { Ordering::Less } else { Ordering::Greater };
            }
            if self.compare_events(a, b) == Ordering::Greater {
                // a is inserted later: compare against b's segment
                return if !self.is_below(b, pa) { Ordering::Less } else { Ordering::Greater };
            }
            return if self.is_below(a, pb) { Ordering::Less } else { Ordering::Greater };
        }
        // collinear segments
        if self.events[a].is_subject != self.events[b].is_subject {
            return if self.events[a].is_subject { Ordering::Less } else { Ordering::Greater };
        }
        if pa == pb {
            return a.cmp(&b);
        }
        self.compare_events(a, b)
    }
}

/// Snapshot used for heap ordering; point/left never change after creation
/// and collinearity with the (possibly re-paired) other endpoint is stable
#[derive(Debug, Clone, Copy)]
struct QueueItem {
    point: Point,
    left: bool,
    other_point: Point,
    is_subject: bool,
    idx: usize,
}

impl QueueItem {
    fn cmp_key(&self, other: &QueueItem) -> Ordering {
        match (self.point.x, self.point.y).cmp(&(other.point.x, other.point.y)) {
            Ordering::Equal => {}
            ord => return ord,
        }
        if self.left != other.left {
            return if self.left { Ordering::Greater } else { Ordering::Less };
        }
        let area = cross(self.point, self.other_point, other.other_point);
        if area != 0 {
            let below = if self.left {
                cross(self.point, self.other_point, other.other_point) > 0
            } else {
                cross(self.other_point, self.point, other.other_point) > 0
            };
            return if below { Ordering::Less } else { Ordering::Greater };
        }
        match (self.is_subject, other.is_subject) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.idx.cmp(&other.idx),
        }
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}
impl Eq for QueueItem {}
impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-first processing
        self.cmp_key(other).reverse()
    }
}

/// Rounded division to the nearest integer, ties away from zero
fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den != 0);
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegIntersection {
    None,
    One(Point),
    Overlap(Point, Point),
}

/// Intersection of segments a1..a2 and b1..b2 in exact integer arithmetic;
/// the single-point case rounds to the nearest nanometre
fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> SegIntersection {
    let rx = (a2.x.nm() - a1.x.nm()) as i128;
    let ry = (a2.y.nm() - a1.y.nm()) as i128;
    let sx = (b2.x.nm() - b1.x.nm()) as i128;
    let sy = (b2.y.nm() - b1.y.nm()) as i128;
    let qpx = (b1.x.nm() - a1.x.nm()) as i128;
    let qpy = (b1.y.nm() - a1.y.nm()) as i128;
    let rxs = rx * sy - ry * sx;
    let qpxr = qpx * ry - qpy * rx;

    if rxs == 0 {
        if qpxr != 0 {
            return SegIntersection::None;
        }
        // collinear: project b endpoints onto a's direction
        let rr = rx * rx + ry * ry;
        if rr == 0 {
            return SegIntersection::None;
        }
        let t0 = qpx * rx + qpy * ry;
        let t1 = t0 + sx * rx + sy * ry;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        let start = lo.max(0);
        let end = hi.min(rr);
        if start > end {
            return SegIntersection::None;
        }
        let at = |t: i128| {
            Point::from_nm(
                a1.x.nm() + div_round(t * rx, rr) as i64,
                a1.y.nm() + div_round(t * ry, rr) as i64,
            )
        };
        if start == end {
            return SegIntersection::One(at(start));
        }
        SegIntersection::Overlap(at(start), at(end))
    } else {
        let t_num = qpx * sy - qpy * sx;
        let u_num = qpxr;
        let (t_ok, u_ok) = if rxs > 0 {
            (t_num >= 0 && t_num <= rxs, u_num >= 0 && u_num <= rxs)
        } else {
            (t_num <= 0 && t_num >= rxs, u_num <= 0 && u_num >= rxs)
        };
        if !t_ok || !u_ok {
            return SegIntersection::None;
        }
        SegIntersection::One(Point::from_nm(
            a1.x.nm() + div_round(t_num * rx, rxs) as i64,
            a1.y.nm() + div_round(t_num * ry, rxs) as i64,
        ))
    }
}

struct Sweep {
    arena: Arena,
    queue: BinaryHeap<QueueItem>,
}

impl Sweep {
    fn new() -> Self {
        Sweep {
            arena: Arena { events: Vec::new() },
            queue: BinaryHeap::new(),
        }
    }

    fn push_queue(&mut self, idx: usize) {
        let e = &self.arena.events[idx];
        self.queue.push(QueueItem {
            point: e.point,
            left: e.left,
            other_point: self.arena.other_point(idx),
            is_subject: e.is_subject,
            idx,
        });
    }

    fn add_ring(&mut self, ring: &[Point], is_subject: bool) {
        for i in 0..ring.len() {
            let p = ring[i];
            let q = ring[(i + 1) % ring.len()];
            if p == q {
                continue;
            }
            let base = self.arena.events.len();
            let p_is_left = (p.x, p.y) < (q.x, q.y);
            self.arena
                .events
                .push(SweepEvent::new(p, p_is_left, base + 1, is_subject));
            self.arena
                .events
                .push(SweepEvent::new(q, !p_is_left, base, is_subject));
            self.push_queue(base);
            self.push_queue(base + 1);
        }
    }

    /// Splits the segment of left event `l` at `p`, queueing the new pair
    fn divide_segment(&mut self, l: usize, p: Point) {
        let right = self.arena.events[l].other;
        if p == self.arena.events[l].point || p == self.arena.events[right].point {
            return;
        }
        let r_idx = self.arena.events.len();
        let l_idx = r_idx + 1;
        let is_subject = self.arena.events[l].is_subject;
        let mut new_r = SweepEvent::new(p, false, l, is_subject);
        new_r.edge_type = self.arena.events[l].edge_type;
        let mut new_l = SweepEvent::new(p, true, right, is_subject);
        new_l.edge_type = self.arena.events[right].edge_type;
        self.arena.events.push(new_r);
        self.arena.events.push(new_l);
        // rounding may put the division point past the right endpoint
        if self.arena.compare_events(l_idx, right) == Ordering::Greater {
            self.arena.events[right].left = true;
            self.arena.events[l_idx].left = false;
        }
        self.arena.events[l].other = r_idx;
        self.arena.events[right].other = l_idx;
        self.push_queue(r_idx);
        self.push_queue(l_idx);
    }

    /// Checks two left events for intersection, subdividing as needed.
    /// Returns 2 when the caller must recompute flags (overlapping edges).
    fn possible_intersection(&mut self, se1: usize, se2: usize) -> u8 {
        let a1 = self.arena.events[se1].point;
        let a2 = self.arena.other_point(se1);
        let b1 = self.arena.events[se2].point;
        let b2 = self.arena.other_point(se2);

        match segment_intersection(a1, a2, b1, b2) {
            SegIntersection::None => 0,
            SegIntersection::One(p) => {
                if a1 == b1 || a2 == b2 {
                    return 0; // common endpoint only
                }
                if p != a1 && p != a2 {
                    self.divide_segment(se1, p);
                }
                if p != b1 && p != b2 {
                    self.divide_segment(se2, p);
                }
                1
            }
            SegIntersection::Overlap(_, _) => {
                if self.arena.events[se1].is_subject == self.arena.events[se2].is_subject {
                    return 0; // overlapping edges of one operand: parity handles it
                }
                let left_coincide = a1 == b1;
                let right_coincide = a2 == b2;

                let (first_l, second_l) = if left_coincide {
                    (se1, se2)
                } else if self.arena.compare_events(se1, se2) == Ordering::Less {
                    (se1, se2)
                } else {
                    (se2, se1)
                };
                let r1 = self.arena.events[se1].other;
                let r2 = self.arena.events[se2].other;
                let (first_r, second_r) = if right_coincide {
                    (r1, r2)
                } else if self.arena.compare_events(r1, r2) == Ordering::Less {
                    (r1, r2)
                } else {
                    (r2, r1)
                };

                if left_coincide {
                    // shared left endpoint: mark the shorter common part
                    self.arena.events[se2].edge_type = EdgeType::NonContributing;
                    self.arena.events[se1].edge_type =
                        if self.arena.events[se2].in_out == self.arena.events[se1].in_out {
                            EdgeType::SameTransition
                        } else {
                            EdgeType::DifferentTransition
                        };
                    if !right_coincide {
                        let long_left = self.arena.events[second_r].other;
                        let split = self.arena.events[first_r].point;
                        self.divide_segment(long_left, split);
                    }
                    return 2;
                }
                if right_coincide {
                    let split = self.arena.events[second_l].point;
                    self.divide_segment(first_l, split);
                    return 3;
                }
                if first_l != self.arena.events[second_r].other {
                    // partial overlap, no shared endpoint
                    let p1 = self.arena.events[second_l].point;
                    let p2 = self.arena.events[first_r].point;
                    self.divide_segment(first_l, p1);
                    self.divide_segment(second_l, p2);
                    return 3;
                }
                // one segment fully contains the other
                let p1 = self.arena.events[second_l].point;
                let p2 = self.arena.events[first_r].point;
                self.divide_segment(first_l, p1);
                let outer_left = self.arena.events[second_r].other;
                self.divide_segment(outer_left, p2);
                3
            }
        }
    }

    fn in_result(&self, e: usize, op: Operation) -> bool {
        let ev = &self.arena.events[e];
        match ev.edge_type {
            EdgeType::Normal => match op {
                Operation::Intersection => !ev.other_in_out,
                Operation::Union => ev.other_in_out,
                Operation::Difference => {
                    (ev.is_subject && ev.other_in_out) || (!ev.is_subject && !ev.other_in_out)
                }
                Operation::Xor => true,
            },
            EdgeType::SameTransition => {
                op == Operation::Intersection || op == Operation::Union
            }
            EdgeType::DifferentTransition => op == Operation::Difference,
            EdgeType::NonContributing => false,
        }
    }

    fn compute_fields(&mut self, e: usize, prev: Option<usize>, op: Operation) {
        match prev {
            None => {
                self.arena.events[e].in_out = false;
                self.arena.events[e].other_in_out = true;
                self.arena.events[e].prev_in_result = None;
            }
            Some(p) => {
                if self.arena.events[e].is_subject == self.arena.events[p].is_subject {
                    self.arena.events[e].in_out = !self.arena.events[p].in_out;
                    self.arena.events[e].other_in_out = self.arena.events[p].other_in_out;
                } else {
                    self.arena.events[e].in_out = !self.arena.events[p].other_in_out;
                    self.arena.events[e].other_in_out = if self.arena.is_vertical(p) {
                        !self.arena.events[p].in_out
                    } else {
                        self.arena.events[p].in_out
                    };
                }
                self.arena.events[e].prev_in_result =
                    if !self.in_result(p, op) || self.arena.is_vertical(p) {
                        self.arena.events[p].prev_in_result
                    } else {
                        Some(p)
                    };
            }
        }
        let in_res = self.in_result(e, op);
        self.arena.events[e].in_result = in_res;
        self.arena.events[e].result_transition = if in_res {
            let ev = &self.arena.events[e];
            let this_in = !ev.in_out;
            let that_in = !ev.other_in_out;
            let above_in = match op {
                Operation::Intersection => this_in && that_in,
                Operation::Union => this_in || that_in,
                Operation::Xor => this_in ^ that_in,
                Operation::Difference => {
                    if ev.is_subject {
                        this_in && !that_in
                    } else {
                        that_in && !this_in
                    }
                }
            };
            if above_in {
                Transition::OutIn
            } else {
                Transition::InOut
            }
        } else {
            Transition::None
        };
    }

    /// Runs the sweep; returns all events in processed order
    fn subdivide(&mut self, op: Operation) -> Vec<usize> {
        let mut sorted: Vec<usize> = Vec::with_capacity(self.queue.len());
        // status line: left events ordered bottom-to-top
        let mut status: Vec<usize> = Vec::new();

        while let Some(item) = self.queue.pop() {
            let e = item.idx;
            sorted.push(e);
            if self.arena.events[e].left {
                let pos = match status
                    .binary_search_by(|&s| self.arena.compare_segments(s, e))
                {
                    Ok(p) => p,
                    Err(p) => p,
                };
                status.insert(pos, e);
                let prev = if pos > 0 { Some(status[pos - 1]) } else { None };
                let next = if pos + 1 < status.len() {
                    Some(status[pos + 1])
                } else {
                    None
                };
                self.compute_fields(e, prev, op);
                if let Some(n) = next {
                    if self.possible_intersection(e, n) == 2 {
                        self.compute_fields(e, prev, op);
                        self.compute_fields(n, Some(e), op);
                    }
                }
                if let Some(p) = prev {
                    if self.possible_intersection(p, e) == 2 {
                        let pp = status
                            .iter()
                            .position(|&s| s == p)
                            .and_then(|i| if i > 0 { Some(status[i - 1]) } else { None });
                        self.compute_fields(p, pp, op);
                        self.compute_fields(e, Some(p), op);
                    }
                }
            } else {
                let l = self.arena.events[e].other;
                if let Some(pos) = status.iter().position(|&s| s == l) {
                    status.remove(pos);
                    if pos > 0 && pos < status.len() {
                        self.possible_intersection(status[pos - 1], status[pos]);
                    }
                }
            }
        }
        sorted
    }
}

/// Connects in-result edges into closed contours with hole depths
fn connect_edges(arena: &Arena, sorted: &[usize]) -> Vec<Contour> {
    let mut result: Vec<usize> = sorted
        .iter()
        .copied()
        .filter(|&e| {
            (arena.events[e].left && arena.events[e].in_result)
                || (!arena.events[e].left && arena.events[arena.events[e].other].in_result)
        })
        .collect();

    // re-sort: subdivisions may have produced slightly out-of-order events
    let mut fully_sorted = false;
    while !fully_sorted {
        fully_sorted = true;
        for i in 1..result.len() {
            if arena.compare_events(result[i - 1], result[i]) == Ordering::Greater {
                result.swap(i - 1, i);
                fully_sorted = false;
            }
        }
    }

    let mut pos_of = vec![usize::MAX; arena.events.len()];
    for (i, &e) in result.iter().enumerate() {
        pos_of[e] = i;
    }

    let mut processed = vec![false; result.len()];
    let mut contours: Vec<Contour> = Vec::new();
    let mut output_contour_id = vec![usize::MAX; arena.events.len()];

    for i in 0..result.len() {
        if processed[i] {
            continue;
        }
        let contour_id = contours.len();

        // hole depth from the closest result edge below the starting event
        let depth = match arena.events[result[i]].prev_in_result {
            None => 0,
            Some(prev) => {
                let lower = output_contour_id[prev];
                if lower == usize::MAX {
                    0
                } else if arena.events[prev].result_transition == Transition::OutIn {
                    contours[lower].depth + 1
                } else {
                    contours[lower].depth
                }
            }
        };

        let mut points = vec![arena.events[result[i]].point];
        let mut pos = i;
        let guard = result.len() + 1;
        for _ in 0..guard {
            processed[pos] = true;
            let e = result[pos];
            if arena.events[e].left {
                output_contour_id[e] = contour_id;
            } else {
                output_contour_id[arena.events[e].other] = contour_id;
            }
            let other = arena.events[e].other;
            let other_pos = pos_of[other];
            if other_pos == usize::MAX {
                break;
            }
            processed[other_pos] = true;
            points.push(arena.events[other].point);
            match next_pos(arena, &result, &processed, other_pos, i) {
                Some(next) => pos = next,
                None => break,
            }
        }

        if points.len() > 3 && points.first() == points.last() {
            points.pop();
        }
        if points.len() >= 3 {
            contours.push(Contour { points, depth });
        } else {
            // degenerate sliver: keep id mapping consistent
            contours.push(Contour {
                points: Vec::new(),
                depth,
            });
        }
    }

    contours.retain(|c| !c.points.is_empty());
    contours
}

/// Finds an unprocessed result event sharing the point at `pos`
fn next_pos(
    arena: &Arena,
    result: &[usize],
    processed: &[bool],
    pos: usize,
    orig: usize,
) -> Option<usize> {
    let p = arena.events[result[pos]].point;
    let mut i = pos + 1;
    while i < result.len() && arena.events[result[i]].point == p {
        if !processed[i] {
            return Some(i);
        }
        i += 1;
    }
    let mut i = pos;
    while i > orig {
        i -= 1;
        if !processed[i] {
            return Some(i);
        }
    }
    None
}

/// Boolean operation over two operands given as flattened closed rings
pub fn boolean_op(subject: &[Vec<Point>], clip: &[Vec<Point>], op: Operation) -> Vec<Contour> {
    let mut sweep = Sweep::new();
    for ring in subject {
        if ring.len() >= 3 {
            sweep.add_ring(ring, true);
        }
    }
    for ring in clip {
        if ring.len() >= 3 {
            sweep.add_ring(ring, false);
        }
    }
    let sorted = sweep.subdivide(op);
    connect_edges(&sweep.arena, &sorted)
}
