//! Plane fragment building
//!
//! Computes the filled copper fragments of a plane: outline, clipped to the
//! board area, minus clearance-inflated foreign copper and drilled holes,
//! eroded and re-dilated to enforce the minimum width. Orphan fragments not
//! touching any same-net pad or via are dropped unless the plane keeps them.

use crate::board::layer::Layer;
use crate::board::model::BoardModel;
use crate::board::objects::Plane;
use crate::geometry::offset::{deflate, inflate, offset};
use crate::geometry::{Length, Path, PolygonSet, PositiveLength};

/// Builds the fragments for one plane. Degenerate geometry leaves the plane
/// empty rather than failing the caller.
pub fn build_fragments(model: &BoardModel, plane: &Plane, tolerance: PositiveLength) -> PolygonSet {
    let outline = PolygonSet::from_closed_path(&plane.outline.to_closed(), tolerance);
    if outline.is_empty() {
        eprintln!("[planes] plane {} has a degenerate outline, leaving it empty", plane.uuid);
        return PolygonSet::new();
    }

    // clip to the board area, pulled in by the plane clearance
    let board_area = board_area(model, tolerance);
    let mut result = if board_area.is_empty() {
        outline
    } else {
        let clearance = plane.min_clearance.get();
        let shrunk = offset(&board_area, -clearance, tolerance);
        outline.intersect(&shrunk)
    };
    if result.is_empty() {
        return result;
    }

    result = subtract_other_objects(model, plane, result, tolerance);
    result = subtract_holes(model, plane, result, tolerance);

    // enforce the minimum width: erode by half of it, then grow back
    if plane.min_width.nm() > 1 {
        let half = PositiveLength::clamped(plane.min_width.get() / 2);
        result = inflate(&deflate(&result, half, tolerance), half, tolerance);
    }

    if !plane.keep_orphans {
        result = remove_orphans(model, plane, result, tolerance);
    }
    result
}

fn board_area(model: &BoardModel, tolerance: PositiveLength) -> PolygonSet {
    let mut outlines: Vec<PolygonSet> = Vec::new();
    for polygon in model.polygons() {
        if polygon.layer == Layer::BoardOutlines {
            outlines.push(PolygonSet::from_closed_path(
                &polygon.path.to_closed(),
                tolerance,
            ));
        }
    }
    for device in model.devices() {
        let transform = device.transform();
        for polygon in &device.footprint.polygons {
            if polygon.layer == Layer::BoardOutlines {
                outlines.push(PolygonSet::from_closed_path(
                    &transform.map_path(&polygon.path).to_closed(),
                    tolerance,
                ));
            }
        }
    }
    PolygonSet::union_all(outlines)
}

fn subtract_other_objects(
    model: &BoardModel,
    plane: &Plane,
    result: PolygonSet,
    tolerance: PositiveLength,
) -> PolygonSet {
    let clearance = plane.min_clearance.get();
    let mut keepout: Vec<PolygonSet> = Vec::new();

    // every via and pad gets a cutout: clearance for foreign nets, thermal
    // relief gap for the plane's own net (spokes are not modelled)
    for segment in model.net_segments() {
        let foreign = segment.net != Some(plane.net);
        for via in &segment.vias {
            let diameter = PositiveLength::clamped(via.size.get() + clearance * 2);
            let disc = Path::circle(diameter).translated(via.position);
            keepout.push(PolygonSet::from_closed_path(&disc, tolerance));
        }
        for line in &segment.net_lines {
            // same-net traces stay solidly connected
            if foreign && line.layer == plane.layer {
                let width = PositiveLength::clamped(line.width.get() + clearance * 2);
                let ob = Path::obround(line.start, line.end, width);
                keepout.push(PolygonSet::from_closed_path(&ob, tolerance));
            }
        }
    }

    for device in model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            if let Some(geometries) = pad.geometries.get(&plane.layer) {
                let pad_transform = pad.transform();
                let mut parts = Vec::new();
                for geometry in geometries {
                    for path in geometry.to_paths() {
                        let mapped = transform.map_path(&pad_transform.map_path(&path));
                        parts.push(PolygonSet::from_closed_path(&mapped, tolerance));
                    }
                }
                let area = PolygonSet::union_all(parts);
                keepout.push(inflate(
                    &area,
                    PositiveLength::clamped(clearance),
                    tolerance,
                ));
            }
        }
    }

    // planes of other nets on the same layer push this plane away
    for other in model.planes() {
        if other.uuid == plane.uuid || other.layer != plane.layer || other.net == plane.net {
            continue;
        }
        let fragments = other.fragments();
        if !fragments.is_empty() {
            keepout.push(offset(&fragments, clearance, tolerance));
        }
    }

    if keepout.is_empty() {
        return result;
    }
    result.subtract(&PolygonSet::union_all(keepout))
}

fn subtract_holes(
    model: &BoardModel,
    plane: &Plane,
    mut result: PolygonSet,
    tolerance: PositiveLength,
) -> PolygonSet {
    let clearance = plane.min_clearance.get();
    let mut cuts: Vec<PolygonSet> = Vec::new();

    let mut add_hole = |path: &Path, diameter: PositiveLength| {
        let width = PositiveLength::clamped(diameter.get() + clearance * 2);
        for stroke in path.to_outline_strokes(width) {
            cuts.push(PolygonSet::from_closed_path(&stroke, tolerance));
        }
    };

    for hole in model.holes() {
        add_hole(&hole.path, hole.diameter);
    }
    for device in model.devices() {
        let transform = device.transform();
        for hole in &device.footprint.holes {
            add_hole(&transform.map_path(&hole.path), hole.diameter);
        }
    }
    // plated drills of foreign nets are already covered by their pads/vias;
    // same-net drills stay connected to the plane
    if cuts.is_empty() {
        return result;
    }
    result = result.subtract(&PolygonSet::union_all(cuts));
    result
}

fn remove_orphans(
    model: &BoardModel,
    plane: &Plane,
    result: PolygonSet,
    tolerance: PositiveLength,
) -> PolygonSet {
    // connected areas of the plane's net; via/pad discs are widened across
    // the thermal gap so a fragment separated only by the relief still
    // counts. The extra two tolerances absorb arc flattening shortfall.
    let clearance = plane.min_clearance.get();
    let reach = PositiveLength::clamped(clearance + tolerance.get() * 2);
    let mut connected: Vec<PolygonSet> = Vec::new();

    for segment in model.net_segments() {
        if segment.net != Some(plane.net) {
            continue;
        }
        for via in &segment.vias {
            let disc = Path::circle(via.size).translated(via.position);
            let area = PolygonSet::from_closed_path(&disc, tolerance);
            connected.push(inflate(&area, reach, tolerance));
        }
        for line in &segment.net_lines {
            if line.layer == plane.layer {
                let ob = Path::obround(line.start, line.end, line.width);
                connected.push(PolygonSet::from_closed_path(&ob, tolerance));
            }
        }
    }
    for device in model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            if pad.net != Some(plane.net) {
                continue;
            }
            if let Some(geometries) = pad.geometries.get(&plane.layer) {
                let pad_transform = pad.transform();
                for geometry in geometries {
                    for path in geometry.to_paths() {
                        let mapped = transform.map_path(&pad_transform.map_path(&path));
                        let area = PolygonSet::from_closed_path(&mapped, tolerance);
                        connected.push(inflate(&area, reach, tolerance));
                    }
                }
            }
        }
    }

    if connected.is_empty() {
        return PolygonSet::new();
    }
    let connected = PolygonSet::union_all(connected);
    let kept: Vec<PolygonSet> = split_rings(&result)
        .into_iter()
        .filter(|fragment| !fragment.intersect(&connected).is_empty())
        .collect();
    PolygonSet::union_all(kept)
}

/// Splits a set into one set per outer ring, each keeping its own holes
fn split_rings(set: &PolygonSet) -> Vec<PolygonSet> {
    let mut outers: Vec<PolygonSet> = Vec::new();
    let mut holes: Vec<&crate::geometry::Ring> = Vec::new();
    for ring in set.rings() {
        if ring.is_hole {
            holes.push(ring);
        } else {
            let single = PolygonSet::from_closed_path(
                &Path::from_points(&ring.points).to_closed(),
                PositiveLength::clamped(crate::geometry::Length::new(1)),
            );
            outers.push(single);
        }
    }
    // attach each hole to the outer that contains it
    let mut result = outers;
    for hole in holes {
        if let Some(point) = hole.points.first() {
            if let Some(owner) = result.iter_mut().find(|o| o.contains(*point)) {
                let hole_set = PolygonSet::from_closed_path(
                    &Path::from_points(&hole.points).to_closed(),
                    PositiveLength::clamped(crate::geometry::Length::new(1)),
                );
                *owner = owner.subtract(&hole_set);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::model::NetSignal;
    use crate::board::objects::{NetLineAnchor, NetSegment, Via};
    use crate::geometry::{Length, Point, UnsignedLength};
    use uuid::Uuid;

    fn tolerance() -> PositiveLength {
        PositiveLength::clamped(Length::new(5_000))
    }

    fn board_with_outline() -> BoardModel {
        let mut model = BoardModel::new("planes", 0);
        model.polygons.push(crate::board::objects::BoardPolygon {
            uuid: Uuid::from_u128(100),
            layer: Layer::BoardOutlines,
            path: Path::from_points(&[
                Point::from_nm(0, 0),
                Point::from_nm(20_000_000, 0),
                Point::from_nm(20_000_000, 10_000_000),
                Point::from_nm(0, 10_000_000),
                Point::from_nm(0, 0),
            ]),
            line_width: UnsignedLength::ZERO,
            filled: false,
        });
        model
    }

    fn gnd_plane(net: Uuid) -> Plane {
        Plane::new(
            Uuid::from_u128(200),
            Layer::TopCopper,
            net,
            Path::from_points(&[
                Point::from_nm(1_000_000, 1_000_000),
                Point::from_nm(19_000_000, 1_000_000),
                Point::from_nm(19_000_000, 9_000_000),
                Point::from_nm(1_000_000, 9_000_000),
                Point::from_nm(1_000_000, 1_000_000),
            ]),
            UnsignedLength::clamped(Length::new(200_000)),
            UnsignedLength::clamped(Length::new(300_000)),
        )
    }

    #[test]
    fn test_fragments_clip_to_outline() {
        let mut model = board_with_outline();
        let net = Uuid::from_u128(1);
        model.project.circuit.net_signals.push(NetSignal {
            uuid: net,
            name: "GND".into(),
        });
        let mut plane = gnd_plane(net);
        plane.keep_orphans = true;
        let fragments = build_fragments(&model, &plane, tolerance());
        assert!(!fragments.is_empty());
        let b = fragments.bounds().unwrap();
        assert!(b[0] >= 1_000_000 && b[2] <= 19_000_000);
    }

    #[test]
    fn test_foreign_trace_carves_clearance() {
        let mut model = board_with_outline();
        let gnd = Uuid::from_u128(1);
        let sig = Uuid::from_u128(2);
        let mut plane = gnd_plane(gnd);
        plane.keep_orphans = true;
        model.net_segments.push(NetSegment {
            uuid: Uuid::from_u128(300),
            net: Some(sig),
            vias: Vec::new(),
            net_lines: vec![crate::board::objects::NetLine {
                uuid: Uuid::from_u128(301),
                layer: Layer::TopCopper,
                width: PositiveLength::clamped(Length::new(200_000)),
                start: Point::from_nm(5_000_000, 5_000_000),
                end: Point::from_nm(15_000_000, 5_000_000),
                start_anchor: NetLineAnchor::Junction(Uuid::from_u128(302)),
                end_anchor: NetLineAnchor::Junction(Uuid::from_u128(303)),
            }],
            net_points: Vec::new(),
        });
        let fragments = build_fragments(&model, &plane, tolerance());
        // the trace centre must not be covered by plane copper
        assert!(!fragments.contains(Point::from_nm(10_000_000, 5_000_000)));
        assert!(!fragments.is_empty());
    }

    #[test]
    fn test_orphan_removal_keeps_anchored_fragment() {
        let mut model = board_with_outline();
        let gnd = Uuid::from_u128(1);
        let plane = gnd_plane(gnd);
        // same-net via anchors the single fragment across its thermal gap
        model.net_segments.push(NetSegment {
            uuid: Uuid::from_u128(400),
            net: Some(gnd),
            vias: vec![Via {
                uuid: Uuid::from_u128(401),
                position: Point::from_nm(10_000_000, 5_000_000),
                drill_diameter: PositiveLength::clamped(Length::new(300_000)),
                size: PositiveLength::clamped(Length::new(600_000)),
                stop_mask_offset: None,
            }],
            net_lines: Vec::new(),
            net_points: Vec::new(),
        });
        let fragments = build_fragments(&model, &plane, tolerance());
        assert!(!fragments.is_empty());
        // the thermal relief keeps a gap around the via itself
        assert!(!fragments.contains(Point::from_nm(10_000_000, 5_000_000)));
        // but copper resumes beyond the gap (size/2 + clearance = 600 um)
        assert!(fragments.contains(Point::from_nm(10_800_000, 5_000_000)));
    }

    #[test]
    fn test_orphan_removal_drops_unanchored_plane() {
        let model = board_with_outline();
        let plane = gnd_plane(Uuid::from_u128(1));
        let fragments = build_fragments(&model, &plane, tolerance());
        assert!(fragments.is_empty());
    }
}
