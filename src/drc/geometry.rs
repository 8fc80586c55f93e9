//! Geometry extraction for the rule checks
//!
//! Converts board objects into polygon sets on a requested layer with an
//! optional outward offset, all flattened within the engine arc tolerance.

use uuid::Uuid;

use crate::board::{
    BoardModel, BoardPolygon, Circle, FootprintPad, Layer, NetLine, Plane, StrokeText, Via,
};
use crate::geometry::offset::inflate;
use crate::geometry::{Length, Path, Point, PolygonSet, PositiveLength, Transform, UnsignedLength};

/// Maps a footprint layer through a device transform (mirroring swaps
/// top/bottom); stroke texts keep their own layer and never use this
pub fn map_layer(transform: &Transform, layer: Layer) -> Layer {
    if transform.mirrored {
        layer.mirrored()
    } else {
        layer
    }
}

/// Generates polygon sets for board objects at a fixed arc tolerance
pub struct BoardPathGenerator<'a> {
    model: &'a BoardModel,
    tolerance: PositiveLength,
}

impl<'a> BoardPathGenerator<'a> {
    pub fn new(model: &'a BoardModel, tolerance: PositiveLength) -> Self {
        BoardPathGenerator { model, tolerance }
    }

    pub fn tolerance(&self) -> PositiveLength {
        self.tolerance
    }

    /// Via copper: a disc of the outer size, grown by `offset`. The drill is
    /// not subtracted; copper covers the full annular disc.
    pub fn via_area(&self, via: &Via, offset: UnsignedLength) -> PolygonSet {
        let diameter = PositiveLength::clamped(via.size.get() + offset.get() * 2);
        let disc = Path::circle(diameter).translated(via.position);
        PolygonSet::from_closed_path(&disc, self.tolerance)
    }

    /// Stop-mask opening of a via: the outer disc grown by the via's
    /// stop-mask offset (no offset means no automatic opening expansion)
    pub fn via_stop_mask_area(&self, via: &Via) -> PolygonSet {
        let expansion = via.stop_mask_offset.unwrap_or(Length::ZERO);
        let diameter = PositiveLength::clamped(via.size.get() + expansion * 2);
        let disc = Path::circle(diameter).translated(via.position);
        PolygonSet::from_closed_path(&disc, self.tolerance)
    }

    /// Stop-mask opening of a non-plated hole
    pub fn hole_stop_mask_area(&self, hole: &crate::board::Hole, transform: &Transform) -> PolygonSet {
        let expansion = hole.stop_mask_offset.unwrap_or(Length::ZERO);
        let path = transform.map_path(&hole.path);
        self.hole_area(&path, hole.diameter, expansion)
    }

    /// Trace copper: the obround between the endpoints
    pub fn net_line_area(&self, line: &NetLine, offset: UnsignedLength) -> PolygonSet {
        let width = PositiveLength::clamped(line.width.get() + offset.get() * 2);
        let ob = Path::obround(line.start, line.end, width);
        PolygonSet::from_closed_path(&ob, self.tolerance)
    }

    /// Plane copper: the cached fragments; empty when planes are ignored
    pub fn plane_area(&self, plane: &Plane, ignore_planes: bool) -> PolygonSet {
        if ignore_planes {
            PolygonSet::new()
        } else {
            plane.fragments()
        }
    }

    /// Pad copper on one layer: the union of the layer's pad geometries
    pub fn pad_area(
        &self,
        pad: &FootprintPad,
        device_transform: &Transform,
        layer: Layer,
        offset: UnsignedLength,
    ) -> PolygonSet {
        let Some(geometries) = pad.geometries.get(&layer) else {
            return PolygonSet::new();
        };
        let pad_transform = pad.transform();
        let mut parts = Vec::new();
        for geometry in geometries {
            for path in geometry.to_paths() {
                let mapped = device_transform.map_path(&pad_transform.map_path(&path));
                let set = PolygonSet::from_closed_path(&mapped, self.tolerance);
                if !set.is_empty() {
                    parts.push(set);
                }
            }
        }
        let area = PolygonSet::union_all(parts);
        if offset.is_zero() {
            area
        } else {
            inflate(&area, PositiveLength::clamped(offset.get()), self.tolerance)
        }
    }

    /// Polygon graphics: filled area when closed and filled, outline strokes
    /// when it has a line width
    pub fn polygon_area(
        &self,
        polygon: &BoardPolygon,
        transform: Option<&Transform>,
    ) -> PolygonSet {
        let path = match transform {
            Some(t) => t.map_path(&polygon.path),
            None => polygon.path.clone(),
        };
        let mut parts = Vec::new();
        if polygon.filled && path.is_closed() {
            parts.push(PolygonSet::from_closed_path(&path, self.tolerance));
        }
        if polygon.line_width.nm() > 0 {
            let width = PositiveLength::clamped(polygon.line_width.get());
            for stroke in path.to_outline_strokes(width) {
                parts.push(PolygonSet::from_closed_path(&stroke, self.tolerance));
            }
        }
        PolygonSet::union_all(parts)
    }

    /// Circle graphics: disc when filled, ring strokes otherwise
    pub fn circle_area(
        &self,
        circle: &Circle,
        transform: Option<&Transform>,
        offset: UnsignedLength,
    ) -> PolygonSet {
        let center = match transform {
            Some(t) => t.map_point(circle.center),
            None => circle.center,
        };
        if circle.filled {
            let diameter = PositiveLength::clamped(circle.diameter.get() + offset.get() * 2);
            let disc = Path::circle(diameter).translated(center);
            PolygonSet::from_closed_path(&disc, self.tolerance)
        } else {
            let ring = Path::circle(circle.diameter).translated(center);
            let width =
                PositiveLength::clamped(circle.line_width.get().max(Length::new(1)) + offset.get() * 2);
            let parts = PolygonSet::from_paths(&ring.to_outline_strokes(width), self.tolerance);
            PolygonSet::union_all(parts)
        }
    }

    /// Stroke text copper: outline strokes of every glyph path
    pub fn stroke_text_area(&self, text: &StrokeText, offset: UnsignedLength) -> PolygonSet {
        let width = PositiveLength::clamped(text.stroke_width.get() + offset.get() * 2);
        let mut parts = Vec::new();
        for path in text.mapped_paths() {
            for stroke in path.to_outline_strokes(width) {
                let set = PolygonSet::from_closed_path(&stroke, self.tolerance);
                if !set.is_empty() {
                    parts.push(set);
                }
            }
        }
        PolygonSet::union_all(parts)
    }

    /// Drilled area of a hole path, optionally expanded; `expansion` may be
    /// negative but never shrinks below 1 nm of diameter
    pub fn hole_area(&self, path: &Path, diameter: PositiveLength, expansion: Length) -> PolygonSet {
        let width = PositiveLength::clamped(diameter.get() + expansion * 2);
        let parts = PolygonSet::from_paths(&path.to_outline_strokes(width), self.tolerance);
        PolygonSet::union_all(parts)
    }

    /// All copper on `layer`, restricted to the given nets (an empty filter
    /// keeps everything). Netless copper passes every non-empty filter that
    /// contains `None`.
    pub fn copper_area(
        &self,
        layer: Layer,
        net_filter: &[Option<Uuid>],
        ignore_planes: bool,
    ) -> PolygonSet {
        let matches = |net: Option<Uuid>| net_filter.is_empty() || net_filter.contains(&net);
        let mut parts: Vec<PolygonSet> = Vec::new();

        for segment in self.model.net_segments() {
            for via in &segment.vias {
                if matches(segment.net) {
                    parts.push(self.via_area(via, UnsignedLength::ZERO));
                }
            }
            for line in &segment.net_lines {
                if line.layer == layer && matches(segment.net) {
                    parts.push(self.net_line_area(line, UnsignedLength::ZERO));
                }
            }
        }

        for plane in self.model.planes() {
            if plane.layer == layer && matches(Some(plane.net)) {
                parts.push(self.plane_area(plane, ignore_planes));
            }
        }

        for polygon in self.model.polygons() {
            if polygon.layer == layer && matches(None) {
                parts.push(self.polygon_area(polygon, None));
            }
        }

        for text in self.model.stroke_texts() {
            if text.layer == layer && matches(None) {
                parts.push(self.stroke_text_area(text, UnsignedLength::ZERO));
            }
        }

        for device in self.model.devices() {
            let transform = device.transform();
            for pad in &device.footprint.pads {
                if pad.is_on_layer(layer) && matches(pad.net) {
                    parts.push(self.pad_area(pad, &transform, layer, UnsignedLength::ZERO));
                }
            }
            for polygon in &device.footprint.polygons {
                if map_layer(&transform, polygon.layer) == layer && matches(None) {
                    parts.push(self.polygon_area(polygon, Some(&transform)));
                }
            }
            for circle in &device.footprint.circles {
                if map_layer(&transform, circle.layer) == layer && matches(None) {
                    parts.push(self.circle_area(circle, Some(&transform), UnsignedLength::ZERO));
                }
            }
            for text in &device.stroke_texts {
                if text.layer == layer && matches(None) {
                    parts.push(self.stroke_text_area(text, UnsignedLength::ZERO));
                }
            }
        }

        PolygonSet::union_all(parts)
    }

    /// The forbidden band along the board outline used by the board
    /// clearance checks; width is `2*clearance - tolerance - 1`, never below
    /// one nanometre
    pub fn board_clearance_band(&self, clearance: UnsignedLength) -> PolygonSet {
        let width = PositiveLength::clamped(
            clearance.get() + clearance.get() - self.tolerance.get() - Length::new(1),
        );
        let mut parts: Vec<PolygonSet> = Vec::new();
        let mut add_outline = |path: Path| {
            for stroke in path.to_outline_strokes(width) {
                let set = PolygonSet::from_closed_path(&stroke, self.tolerance);
                if !set.is_empty() {
                    parts.push(set);
                }
            }
        };
        for polygon in self.model.polygons() {
            if polygon.layer == Layer::BoardOutlines {
                add_outline(polygon.path.clone());
            }
        }
        for device in self.model.devices() {
            let transform = device.transform();
            for polygon in &device.footprint.polygons {
                if polygon.layer == Layer::BoardOutlines {
                    add_outline(transform.map_path(&polygon.path));
                }
            }
            for circle in &device.footprint.circles {
                if circle.layer == Layer::BoardOutlines {
                    let ring =
                        Path::circle(circle.diameter).translated(transform.map_point(circle.center));
                    add_outline(ring);
                }
            }
        }
        PolygonSet::union_all(parts)
    }

    /// Courtyard area of one device on the given courtyard layer
    pub fn device_courtyard_area(
        &self,
        device: &crate::board::Device,
        layer: Layer,
    ) -> PolygonSet {
        let transform = device.transform();
        let mut parts = Vec::new();
        for polygon in &device.footprint.polygons {
            if map_layer(&transform, polygon.layer) == layer {
                let path = transform.map_path(&polygon.path).to_closed();
                let set = PolygonSet::from_closed_path(&path, self.tolerance);
                if !set.is_empty() {
                    parts.push(set);
                }
            }
        }
        for circle in &device.footprint.circles {
            if map_layer(&transform, circle.layer) == layer {
                let disc =
                    Path::circle(circle.diameter).translated(transform.map_point(circle.center));
                let set = PolygonSet::from_closed_path(&disc, self.tolerance);
                if !set.is_empty() {
                    parts.push(set);
                }
            }
        }
        PolygonSet::union_all(parts)
    }
}

/// Location highlight for a hole: its path stroked at the drill diameter
pub fn hole_location(path: &Path, diameter: PositiveLength) -> Vec<Path> {
    path.to_outline_strokes(diameter)
}

/// Location highlight for a device: documentation drawings (placement as
/// fallback) plus an origin cross
pub fn device_location(device: &crate::board::Device) -> Vec<Path> {
    let transform = device.transform();
    let mut locations: Vec<Path> = Vec::new();

    let mut add_drawings = |layers: [Layer; 2], out: &mut Vec<Path>| {
        for polygon in &device.footprint.polygons {
            if layers.contains(&map_layer(&transform, polygon.layer)) {
                let path = transform.map_path(&polygon.path);
                if polygon.line_width.nm() > 0 {
                    out.extend(
                        path.to_outline_strokes(PositiveLength::clamped(polygon.line_width.get())),
                    );
                }
                if path.is_closed() && polygon.filled {
                    out.push(path);
                }
            }
        }
        for circle in &device.footprint.circles {
            if layers.contains(&map_layer(&transform, circle.layer)) {
                let ring =
                    Path::circle(circle.diameter).translated(transform.map_point(circle.center));
                if circle.line_width.nm() > 0 {
                    out.extend(
                        ring.to_outline_strokes(PositiveLength::clamped(circle.line_width.get())),
                    );
                }
                if circle.filled {
                    out.push(ring);
                }
            }
        }
    };

    add_drawings(
        [Layer::TopDocumentation, Layer::BotDocumentation],
        &mut locations,
    );
    if locations.is_empty() {
        add_drawings([Layer::TopPlacement, Layer::BotPlacement], &mut locations);
    }

    // origin cross, 1 mm across
    let stroke = PositiveLength::clamped(Length::new(50_000));
    let half = Length::new(500_000);
    let h = Path::from_points(&[
        Point::new(-half, Length::ZERO),
        Point::new(half, Length::ZERO),
    ]);
    let v = Path::from_points(&[
        Point::new(Length::ZERO, -half),
        Point::new(Length::ZERO, half),
    ]);
    locations.extend(h.translated(device.position).to_outline_strokes(stroke));
    locations.extend(v.translated(device.position).to_outline_strokes(stroke));
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PadGeometry;
    use indexmap::IndexMap;
    use uuid::Uuid;

    fn tolerance() -> PositiveLength {
        PositiveLength::clamped(Length::new(5_000))
    }

    fn model() -> BoardModel {
        BoardModel::new("geom", 0)
    }

    #[test]
    fn test_via_disc_bounds() {
        let m = model();
        let generator = BoardPathGenerator::new(&m, tolerance());
        let via = Via {
            uuid: Uuid::from_u128(1),
            position: Point::from_nm(1_000_000, 0),
            drill_diameter: PositiveLength::clamped(Length::new(300_000)),
            size: PositiveLength::clamped(Length::new(500_000)),
            stop_mask_offset: None,
        };
        let area = generator.via_area(&via, UnsignedLength::ZERO);
        let b = area.bounds().unwrap();
        assert_eq!(b, [750_000, -250_000, 1_250_000, 250_000]);
        let grown = generator.via_area(&via, UnsignedLength::clamped(Length::new(100_000)));
        assert_eq!(grown.bounds().unwrap(), [650_000, -350_000, 1_350_000, 350_000]);
    }

    #[test]
    fn test_pad_area_respects_layer() {
        let m = model();
        let generator = BoardPathGenerator::new(&m, tolerance());
        let mut geometries = IndexMap::new();
        geometries.insert(
            Layer::TopCopper,
            vec![PadGeometry::RoundedRect {
                width: PositiveLength::clamped(Length::new(1_000_000)),
                height: PositiveLength::clamped(Length::new(500_000)),
                corner_radius: crate::geometry::UnsignedLimitedRatio::ZERO,
            }],
        );
        let pad = FootprintPad {
            uuid: Uuid::from_u128(2),
            position: Point::ORIGIN,
            rotation: crate::geometry::Angle::ZERO,
            net: None,
            geometries,
            holes: Vec::new(),
        };
        let identity = Transform::identity();
        let top = generator.pad_area(&pad, &identity, Layer::TopCopper, UnsignedLength::ZERO);
        assert_eq!(top.bounds().unwrap(), [-500_000, -250_000, 500_000, 250_000]);
        let bottom = generator.pad_area(&pad, &identity, Layer::BotCopper, UnsignedLength::ZERO);
        assert!(bottom.is_empty());
    }

    #[test]
    fn test_copper_area_net_filter() {
        let mut m = model();
        let net_a = Uuid::from_u128(10);
        m.net_segments.push(crate::board::NetSegment {
            uuid: Uuid::from_u128(11),
            net: Some(net_a),
            vias: vec![Via {
                uuid: Uuid::from_u128(12),
                position: Point::ORIGIN,
                drill_diameter: PositiveLength::clamped(Length::new(300_000)),
                size: PositiveLength::clamped(Length::new(500_000)),
                stop_mask_offset: None,
            }],
            net_lines: Vec::new(),
            net_points: Vec::new(),
        });
        let generator = BoardPathGenerator::new(&m, tolerance());
        assert!(!generator.copper_area(Layer::TopCopper, &[], false).is_empty());
        assert!(!generator
            .copper_area(Layer::TopCopper, &[Some(net_a)], false)
            .is_empty());
        assert!(generator
            .copper_area(Layer::TopCopper, &[Some(Uuid::from_u128(99))], false)
            .is_empty());
    }

    #[test]
    fn test_stop_mask_openings() {
        let m = model();
        let generator = BoardPathGenerator::new(&m, tolerance());
        let via = Via {
            uuid: Uuid::from_u128(3),
            position: Point::ORIGIN,
            drill_diameter: PositiveLength::clamped(Length::new(300_000)),
            size: PositiveLength::clamped(Length::new(500_000)),
            stop_mask_offset: Some(Length::new(100_000)),
        };
        let opening = generator.via_stop_mask_area(&via);
        assert_eq!(opening.bounds().unwrap(), [-350_000, -350_000, 350_000, 350_000]);

        let hole = crate::board::Hole {
            uuid: Uuid::from_u128(4),
            diameter: PositiveLength::clamped(Length::new(1_000_000)),
            path: Path::from_points(&[Point::ORIGIN]),
            stop_mask_offset: None,
        };
        let opening = generator.hole_stop_mask_area(&hole, &Transform::identity());
        assert_eq!(opening.bounds().unwrap(), [-500_000, -500_000, 500_000, 500_000]);
    }

    #[test]
    fn test_mirrored_device_layer_mapping() {
        let t = Transform::new(Point::ORIGIN, crate::geometry::Angle::ZERO, true);
        assert_eq!(map_layer(&t, Layer::TopCopper), Layer::BotCopper);
        assert_eq!(map_layer(&t, Layer::TopCourtyard), Layer::BotCourtyard);
        let id = Transform::identity();
        assert_eq!(map_layer(&id, Layer::TopCopper), Layer::TopCopper);
    }
}
