//! Board items: copper features, graphics, holes, devices
//!
//! All cross references between items are `Uuid` links resolved through the
//! owning containers; items never point back at their owners.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::layer::Layer;
use crate::geometry::{
    Angle, Length, Path, Point, PositiveLength, Transform, UnsignedLength, UnsignedLimitedRatio,
};

/// Plated through-hole via; always spans all copper layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Via {
    pub uuid: Uuid,
    pub position: Point,
    pub drill_diameter: PositiveLength,
    pub size: PositiveLength,
    pub stop_mask_offset: Option<Length>,
}

/// What a net line endpoint is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetLineAnchor {
    Junction(Uuid),
    Via(Uuid),
    Pad(Uuid),
}

/// Straight copper trace on a single copper layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetLine {
    pub uuid: Uuid,
    pub layer: Layer,
    pub width: PositiveLength,
    pub start: Point,
    pub end: Point,
    pub start_anchor: NetLineAnchor,
    pub end_anchor: NetLineAnchor,
}

/// Free junction point within a net segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetPoint {
    pub uuid: Uuid,
    pub position: Point,
}

/// Owns the traces, vias and junctions of one connected routing group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetSegment {
    pub uuid: Uuid,
    pub net: Option<Uuid>,
    pub vias: Vec<Via>,
    pub net_lines: Vec<NetLine>,
    pub net_points: Vec<NetPoint>,
}

impl NetSegment {
    /// An empty segment carries no routing at all
    pub fn is_used(&self) -> bool {
        !self.vias.is_empty() || !self.net_lines.is_empty() || !self.net_points.is_empty()
    }

    /// A junction is stale when no net line is attached to it
    pub fn is_net_point_used(&self, net_point: &NetPoint) -> bool {
        self.net_lines.iter().any(|line| {
            line.start_anchor == NetLineAnchor::Junction(net_point.uuid)
                || line.end_anchor == NetLineAnchor::Junction(net_point.uuid)
        })
    }
}

/// Pad copper outline on one layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PadGeometry {
    RoundedRect {
        width: PositiveLength,
        height: PositiveLength,
        corner_radius: UnsignedLimitedRatio,
    },
    RoundedOctagon {
        width: PositiveLength,
        height: PositiveLength,
        corner_radius: UnsignedLimitedRatio,
    },
    Stroke {
        path: Path,
        width: PositiveLength,
    },
    Custom {
        outline: Path,
    },
}

impl PadGeometry {
    /// The pad outline in pad-local coordinates, ready for flattening
    pub fn to_paths(&self) -> Vec<Path> {
        match self {
            PadGeometry::RoundedRect {
                width,
                height,
                corner_radius,
            } => {
                let radius = corner_radius.scaled(width.get().min(height.get()) / 2);
                vec![Path::rounded_rect(*width, *height, radius)]
            }
            PadGeometry::RoundedOctagon {
                width,
                height,
                corner_radius,
            } => {
                let radius = corner_radius.scaled(width.get().min(height.get()) / 2);
                vec![Path::rounded_octagon(*width, *height, radius)]
            }
            PadGeometry::Stroke { path, width } => path.to_outline_strokes(*width),
            PadGeometry::Custom { outline } => vec![outline.to_closed()],
        }
    }
}

/// Drilled hole inside a pad (plated)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadHole {
    pub uuid: Uuid,
    pub diameter: PositiveLength,
    pub path: Path,
}

/// Footprint pad instance; `net` is the resolved signal of the linked
/// component signal instance, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintPad {
    pub uuid: Uuid,
    pub position: Point,
    pub rotation: Angle,
    pub net: Option<Uuid>,
    pub geometries: IndexMap<Layer, Vec<PadGeometry>>,
    pub holes: Vec<PadHole>,
}

impl FootprintPad {
    pub fn is_on_layer(&self, layer: Layer) -> bool {
        self.geometries.get(&layer).is_some_and(|g| !g.is_empty())
    }

    /// Pad placement inside the footprint
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, false)
    }
}

/// Filled copper area belonging to a net
#[derive(Debug, Serialize, Deserialize)]
pub struct Plane {
    pub uuid: Uuid,
    pub layer: Layer,
    pub net: Uuid,
    pub outline: Path,
    pub min_width: UnsignedLength,
    pub min_clearance: UnsignedLength,
    pub keep_orphans: bool,
    #[serde(skip)]
    fragments: std::sync::RwLock<crate::geometry::PolygonSet>,
}

impl Plane {
    pub fn new(
        uuid: Uuid,
        layer: Layer,
        net: Uuid,
        outline: Path,
        min_width: UnsignedLength,
        min_clearance: UnsignedLength,
    ) -> Self {
        Plane {
            uuid,
            layer,
            net,
            outline,
            min_width,
            min_clearance,
            keep_orphans: false,
            fragments: std::sync::RwLock::new(crate::geometry::PolygonSet::new()),
        }
    }

    pub fn fragments(&self) -> crate::geometry::PolygonSet {
        self.fragments.read().expect("plane fragments poisoned").clone()
    }

    pub fn set_fragments(&self, fragments: crate::geometry::PolygonSet) {
        *self.fragments.write().expect("plane fragments poisoned") = fragments;
    }
}

impl Clone for Plane {
    fn clone(&self) -> Self {
        Plane {
            uuid: self.uuid,
            layer: self.layer,
            net: self.net,
            outline: self.outline.clone(),
            min_width: self.min_width,
            min_clearance: self.min_clearance,
            keep_orphans: self.keep_orphans,
            fragments: std::sync::RwLock::new(self.fragments()),
        }
    }
}

/// Graphic polygon on any layer; on copper layers it is copper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPolygon {
    pub uuid: Uuid,
    pub layer: Layer,
    pub path: Path,
    pub line_width: UnsignedLength,
    pub filled: bool,
}

/// Graphic circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub uuid: Uuid,
    pub layer: Layer,
    pub center: Point,
    pub diameter: PositiveLength,
    pub line_width: UnsignedLength,
    pub filled: bool,
}

/// Stroke text with pre-rendered glyph paths in text coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokeText {
    pub uuid: Uuid,
    pub layer: Layer,
    pub position: Point,
    pub rotation: Angle,
    pub mirrored: bool,
    pub stroke_width: PositiveLength,
    pub paths: Vec<Path>,
}

impl StrokeText {
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.mirrored)
    }

    /// Glyph paths mapped to board coordinates
    pub fn mapped_paths(&self) -> Vec<Path> {
        let t = self.transform();
        self.paths.iter().map(|p| t.map_path(p)).collect()
    }
}

/// Non-plated (board/footprint) drilled hole; the path shape decides between
/// round drills and slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hole {
    pub uuid: Uuid,
    pub diameter: PositiveLength,
    pub path: Path,
    pub stop_mask_offset: Option<Length>,
}

impl Hole {
    /// More than one distinct vertex makes a slot
    pub fn is_slot(&self) -> bool {
        path_is_slot(&self.path)
    }

    /// Three or more vertices
    pub fn is_multi_segment_slot(&self) -> bool {
        path_is_multi_segment_slot(&self.path)
    }

    /// Any arc edge
    pub fn is_curved_slot(&self) -> bool {
        path_is_curved_slot(&self.path)
    }
}

impl PadHole {
    pub fn is_slot(&self) -> bool {
        path_is_slot(&self.path)
    }

    pub fn is_multi_segment_slot(&self) -> bool {
        path_is_multi_segment_slot(&self.path)
    }

    pub fn is_curved_slot(&self) -> bool {
        path_is_curved_slot(&self.path)
    }
}

fn path_is_slot(path: &Path) -> bool {
    path.vertices()
        .windows(2)
        .any(|w| w[0].position != w[1].position)
}

fn path_is_multi_segment_slot(path: &Path) -> bool {
    path.len() > 2
}

fn path_is_curved_slot(path: &Path) -> bool {
    let vertices = path.vertices();
    vertices
        .iter()
        .take(vertices.len().saturating_sub(1))
        .any(|v| v.arc_sweep != Angle::ZERO)
}

/// Library footprint contents, denormalized per device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub polygons: Vec<BoardPolygon>,
    pub circles: Vec<Circle>,
    pub holes: Vec<Hole>,
    pub pads: Vec<FootprintPad>,
}

/// Placed device: a footprint under a board transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub uuid: Uuid,
    pub component: Uuid,
    pub lib_device: Uuid,
    pub position: Point,
    pub rotation: Angle,
    pub mirrored: bool,
    pub footprint: Footprint,
    pub stroke_texts: Vec<StrokeText>,
}

impl Device {
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.mirrored)
    }
}

/// Unrouted connection between two endpoints, precomputed by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirWire {
    pub net: Option<Uuid>,
    pub endpoint1: Uuid,
    pub endpoint2: Uuid,
    pub p1: Point,
    pub p2: Point,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;

    fn hole_with_path(path: Path) -> Hole {
        Hole {
            uuid: Uuid::from_u128(1),
            diameter: PositiveLength::clamped(Length::new(800_000)),
            path,
            stop_mask_offset: None,
        }
    }

    #[test]
    fn test_round_drill_is_no_slot() {
        let hole = hole_with_path(Path::from_points(&[Point::from_nm(0, 0)]));
        assert!(!hole.is_slot());
        assert!(!hole.is_multi_segment_slot());
        assert!(!hole.is_curved_slot());
    }

    #[test]
    fn test_single_segment_slot() {
        let hole = hole_with_path(Path::from_points(&[
            Point::from_nm(0, 0),
            Point::from_nm(5_000_000, 0),
        ]));
        assert!(hole.is_slot());
        assert!(!hole.is_multi_segment_slot());
        assert!(!hole.is_curved_slot());
    }

    #[test]
    fn test_multi_segment_slot() {
        let hole = hole_with_path(Path::from_points(&[
            Point::from_nm(0, 0),
            Point::from_nm(1_000_000, 0),
            Point::from_nm(1_000_000, 1_000_000),
        ]));
        assert!(hole.is_slot());
        assert!(hole.is_multi_segment_slot());
    }

    #[test]
    fn test_curved_slot() {
        let hole = hole_with_path(Path::new(vec![
            Vertex::with_sweep(Point::from_nm(0, 0), Angle::deg_90()),
            Vertex::new(Point::from_nm(1_000_000, 1_000_000)),
        ]));
        assert!(hole.is_slot());
        assert!(hole.is_curved_slot());
    }

    #[test]
    fn test_net_point_usage() {
        let junction = NetPoint {
            uuid: Uuid::from_u128(7),
            position: Point::ORIGIN,
        };
        let lonely = NetPoint {
            uuid: Uuid::from_u128(8),
            position: Point::ORIGIN,
        };
        let segment = NetSegment {
            uuid: Uuid::from_u128(9),
            net: None,
            vias: Vec::new(),
            net_lines: vec![NetLine {
                uuid: Uuid::from_u128(10),
                layer: Layer::TopCopper,
                width: PositiveLength::clamped(Length::new(200_000)),
                start: Point::ORIGIN,
                end: Point::from_nm(1000, 0),
                start_anchor: NetLineAnchor::Junction(junction.uuid),
                end_anchor: NetLineAnchor::Via(Uuid::from_u128(11)),
            }],
            net_points: vec![junction.clone(), lonely.clone()],
        };
        assert!(segment.is_used());
        assert!(segment.is_net_point_used(&junction));
        assert!(!segment.is_net_point_used(&lonely));
    }
}
