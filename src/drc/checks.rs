//! The individual design rule checks
//!
//! Each check takes the shared run context, inspects the model and appends
//! messages in visit order. A check whose setting is zero (or `Any` for slot
//! allowances) returns before logging its status line.

use rayon::prelude::*;
use uuid::Uuid;

use crate::board::{Device, Hole, Layer, NetLineAnchor, PadHole};
use crate::drc::geometry::{device_location, hole_location, map_layer};
use crate::drc::messages::{self, ObjRef};
use crate::drc::runners::CheckContext;
use crate::drc::settings::AllowedSlots;
use crate::drc::types::RuleCheckMessage;
use crate::geometry::offset::offset;
use crate::geometry::spatial::{build_index, candidates_after, BoundedItem};
use crate::geometry::{
    Length, Path, Point, PolygonSet, PositiveLength, Transform, UnsignedLength,
};

/// 1. copper widths of stroke texts, planes, device texts and traces
pub(crate) fn check_minimum_copper_width(ctx: &mut CheckContext) {
    let min_width = ctx.settings.min_copper_width;
    if min_width.is_zero() {
        return;
    }
    ctx.status("Check copper widths...");
    let copper_layers = ctx.model.copper_layers();

    for text in ctx.model.stroke_texts() {
        if !copper_layers.contains(&text.layer) {
            continue;
        }
        if text.stroke_width.get() < min_width.get() {
            let stroke =
                PositiveLength::clamped(text.stroke_width.get().max(Length::new(50_000)));
            let mut locations = Vec::new();
            for path in text.mapped_paths() {
                locations.extend(path.to_outline_strokes(stroke));
            }
            ctx.emit(messages::minimum_width(
                ObjRef::new("stroke_text", text.uuid),
                "stroke text",
                min_width,
                locations,
            ));
        }
    }

    for plane in ctx.model.planes() {
        if !copper_layers.contains(&plane.layer) {
            continue;
        }
        if plane.min_width.get() < min_width.get() {
            let locations = plane
                .outline
                .to_closed()
                .to_outline_strokes(PositiveLength::clamped(Length::new(200_000)));
            ctx.emit(messages::minimum_width(
                ObjRef::new("plane", plane.uuid),
                "plane",
                min_width,
                locations,
            ));
        }
    }

    for device in ctx.model.devices() {
        // text layers are independent of the device mirror state
        for text in &device.stroke_texts {
            if !copper_layers.contains(&text.layer) {
                continue;
            }
            if text.stroke_width.get() < min_width.get() {
                let stroke =
                    PositiveLength::clamped(text.stroke_width.get().max(Length::new(50_000)));
                let mut locations = Vec::new();
                for path in text.mapped_paths() {
                    locations.extend(path.to_outline_strokes(stroke));
                }
                ctx.emit(messages::minimum_width(
                    ObjRef::new("stroke_text", text.uuid),
                    "stroke text",
                    min_width,
                    locations,
                ));
            }
        }
    }

    for segment in ctx.model.net_segments() {
        for line in &segment.net_lines {
            if !copper_layers.contains(&line.layer) {
                continue;
            }
            if line.width.get() < min_width.get() {
                let locations = vec![Path::obround(line.start, line.end, line.width)];
                ctx.emit(messages::minimum_width(
                    ObjRef::new("netline", line.uuid),
                    "trace",
                    min_width,
                    locations,
                ));
            }
        }
    }
}

struct CopperItem {
    obj: ObjRef,
    name: String,
    layer: Option<Layer>,
    net: Option<Uuid>,
    area: PolygonSet,
}

/// 2. pairwise copper clearance between features of different nets
pub(crate) fn check_copper_copper_clearances(ctx: &mut CheckContext) {
    let clearance = ctx.settings.min_copper_copper_clearance;
    if clearance.is_zero() {
        return;
    }
    ctx.status("Check copper clearances...");

    // every item grows by half of the remaining clearance budget
    let item_offset = UnsignedLength::clamped(
        (clearance.get() - ctx.generator().tolerance().get()) / 2 - Length::new(1),
    );
    let items = collect_copper_items(ctx, item_offset);

    let tree = build_index(
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.area.bounds().map(|b| (i, b))),
    );

    let pair_messages: Vec<Vec<RuleCheckMessage>> = items
        .par_iter()
        .enumerate()
        .map(|(i, item1)| {
            let mut found = Vec::new();
            let Some(bounds) = item1.area.bounds() else {
                return found;
            };
            for j in candidates_after(&tree, &BoundedItem::new(i, bounds), 0) {
                let item2 = &items[j];
                let nets_differ =
                    item1.net != item2.net || item1.net.is_none() || item2.net.is_none();
                let layers_shared = item1.layer.is_none()
                    || item2.layer.is_none()
                    || item1.layer == item2.layer;
                if !nets_differ || !layers_shared {
                    continue;
                }
                let overlap = item1.area.intersect(&item2.area);
                if !overlap.is_empty() {
                    found.push(messages::copper_copper_clearance(
                        item1.layer,
                        item1.net,
                        item1.obj,
                        item2.layer,
                        item2.net,
                        item2.obj,
                        (item1.name.as_str(), item2.name.as_str()),
                        clearance,
                        overlap.flatten_tree().into_iter().collect(),
                    ));
                }
            }
            found
        })
        .collect();

    for group in pair_messages {
        for message in group {
            ctx.emit(message);
        }
    }
}

fn collect_copper_items(ctx: &CheckContext, item_offset: UnsignedLength) -> Vec<CopperItem> {
    let generator = ctx.generator();
    let copper_layers = ctx.model.copper_layers();
    let mut items: Vec<CopperItem> = Vec::new();

    for segment in ctx.model.net_segments() {
        for via in &segment.vias {
            items.push(CopperItem {
                obj: ObjRef::new("via", via.uuid),
                name: format!("via of net '{}'", ctx.model.net_name(segment.net)),
                layer: None, // through-hole: shares every copper layer
                net: segment.net,
                area: generator.via_area(via, item_offset),
            });
        }
        for line in &segment.net_lines {
            if line.start == line.end {
                eprintln!("[DRC] Skipping zero-length trace {}", line.uuid);
                continue;
            }
            if copper_layers.contains(&line.layer) {
                items.push(CopperItem {
                    obj: ObjRef::new("netline", line.uuid),
                    name: format!("trace of net '{}'", ctx.model.net_name(segment.net)),
                    layer: Some(line.layer),
                    net: segment.net,
                    area: generator.net_line_area(line, item_offset),
                });
            }
        }
    }

    if !ctx.ignore_planes {
        for plane in ctx.model.planes() {
            if copper_layers.contains(&plane.layer) {
                let area = offset(
                    &generator.plane_area(plane, false),
                    item_offset.get(),
                    generator.tolerance(),
                );
                items.push(CopperItem {
                    obj: ObjRef::new("plane", plane.uuid),
                    name: format!("plane of net '{}'", ctx.model.net_name(Some(plane.net))),
                    layer: Some(plane.layer),
                    net: Some(plane.net),
                    area,
                });
            }
        }
    }

    for polygon in ctx.model.polygons() {
        if copper_layers.contains(&polygon.layer) {
            let area = offset(
                &generator.polygon_area(polygon, None),
                item_offset.get(),
                generator.tolerance(),
            );
            items.push(CopperItem {
                obj: ObjRef::new("polygon", polygon.uuid),
                name: "polygon".into(),
                layer: Some(polygon.layer),
                net: None,
                area,
            });
        }
    }

    for text in ctx.model.stroke_texts() {
        if copper_layers.contains(&text.layer) {
            items.push(CopperItem {
                obj: ObjRef::new("stroke_text", text.uuid),
                name: "stroke text".into(),
                layer: Some(text.layer),
                net: None,
                area: generator.stroke_text_area(text, item_offset),
            });
        }
    }

    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            for layer in &copper_layers {
                if pad.is_on_layer(*layer) {
                    items.push(CopperItem {
                        obj: ObjRef::new("pad", pad.uuid),
                        name: format!("pad of net '{}'", ctx.model.net_name(pad.net)),
                        layer: Some(*layer),
                        net: pad.net,
                        area: generator.pad_area(pad, &transform, *layer, item_offset),
                    });
                }
            }
        }
        for polygon in &device.footprint.polygons {
            let layer = map_layer(&transform, polygon.layer);
            if copper_layers.contains(&layer) {
                let area = offset(
                    &generator.polygon_area(polygon, Some(&transform)),
                    item_offset.get(),
                    generator.tolerance(),
                );
                items.push(CopperItem {
                    obj: ObjRef::new("polygon", polygon.uuid),
                    name: "footprint polygon".into(),
                    layer: Some(layer),
                    net: None,
                    area,
                });
            }
        }
        for circle in &device.footprint.circles {
            let layer = map_layer(&transform, circle.layer);
            if copper_layers.contains(&layer) {
                items.push(CopperItem {
                    obj: ObjRef::new("circle", circle.uuid),
                    name: "footprint circle".into(),
                    layer: Some(layer),
                    net: None,
                    area: generator.circle_area(circle, Some(&transform), item_offset),
                });
            }
        }
        for text in &device.stroke_texts {
            if copper_layers.contains(&text.layer) {
                items.push(CopperItem {
                    obj: ObjRef::new("stroke_text", text.uuid),
                    name: "stroke text".into(),
                    layer: Some(text.layer),
                    net: None,
                    area: generator.stroke_text_area(text, item_offset),
                });
            }
        }
    }

    items
}

/// 3. copper keepout band along the board outline
pub(crate) fn check_copper_board_clearances(ctx: &mut CheckContext) {
    let clearance = ctx.settings.min_copper_board_clearance;
    if clearance.is_zero() {
        return;
    }
    ctx.status("Check board clearances...");

    let band = ctx.generator().board_clearance_band(clearance);
    if band.is_empty() {
        return;
    }
    // reuse the copper item walk with zero inflation; the band already
    // carries the whole clearance
    let items = collect_copper_items(ctx, UnsignedLength::ZERO);
    for item in items {
        let overlap = band.intersect(&item.area);
        if !overlap.is_empty() {
            ctx.emit(messages::copper_board_clearance(
                item.obj,
                &item.name,
                clearance,
                overlap.flatten_tree(),
            ));
        }
    }
}

/// 4. copper too close to non-plated holes
pub(crate) fn check_copper_hole_clearances(ctx: &mut CheckContext) {
    let clearance = ctx.settings.min_copper_npth_clearance;
    if clearance.is_zero() {
        return;
    }
    ctx.status("Check hole clearances...");

    // copper anywhere in the stackup
    let mut copper = PolygonSet::new();
    for layer in ctx.model.copper_layers() {
        let layer_copper = ctx.copper_area(layer, &[]);
        copper = copper.unite(&layer_copper);
    }

    let expansion = clearance.get() - ctx.generator().tolerance().get() - Length::new(1);
    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    {
        let generator = ctx.generator();
        let mut check_hole = |owner: ObjRef, hole: &Hole, transform: &Transform| {
            let path = transform.map_path(&hole.path);
            let area = generator.hole_area(&path, hole.diameter, expansion);
            let overlap = copper.intersect(&area);
            if !overlap.is_empty() {
                pending.push(messages::copper_hole_clearance(
                    owner,
                    hole.uuid,
                    clearance,
                    overlap.flatten_tree(),
                ));
            }
        };

        let identity = Transform::identity();
        for hole in ctx.model.holes() {
            check_hole(ObjRef::new("hole", hole.uuid), hole, &identity);
        }
        for device in ctx.model.devices() {
            let transform = device.transform();
            for hole in &device.footprint.holes {
                check_hole(ObjRef::new("device", device.uuid), hole, &transform);
            }
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

struct DrillItem {
    obj: ObjRef,
    hole: Uuid,
    area: PolygonSet,
}

/// 5. drill to drill clearance, pairwise over every drilled hole
pub(crate) fn check_drill_drill_clearances(ctx: &mut CheckContext) {
    let clearance = ctx.settings.min_drill_drill_clearance;
    if clearance.is_zero() {
        return;
    }
    ctx.status("Check drill clearances...");

    let expansion = (clearance.get() - ctx.generator().tolerance().get() - Length::new(1))
        .max(Length::ZERO);
    let mut items: Vec<DrillItem> = Vec::new();
    {
        let generator = ctx.generator();
        let mut add = |obj: ObjRef, hole: Uuid, path: Path, diameter: PositiveLength| {
            // the expansion widens the drill diameter, splitting the
            // clearance evenly between both partners
            let area = generator.hole_area(&path, diameter, expansion / 2);
            items.push(DrillItem { obj, hole, area });
        };

        for segment in ctx.model.net_segments() {
            for via in &segment.vias {
                add(
                    ObjRef::new("via", via.uuid),
                    via.uuid,
                    Path::from_points(&[via.position]),
                    via.drill_diameter,
                );
            }
        }
        for hole in ctx.model.holes() {
            add(
                ObjRef::new("hole", hole.uuid),
                hole.uuid,
                hole.path.clone(),
                hole.diameter,
            );
        }
        for device in ctx.model.devices() {
            let transform = device.transform();
            for pad in &device.footprint.pads {
                let pad_transform = pad.transform();
                for hole in &pad.holes {
                    add(
                        ObjRef::new("pad", pad.uuid),
                        hole.uuid,
                        transform.map_path(&pad_transform.map_path(&hole.path)),
                        hole.diameter,
                    );
                }
            }
            for hole in &device.footprint.holes {
                add(
                    ObjRef::new("device", device.uuid),
                    hole.uuid,
                    transform.map_path(&hole.path),
                    hole.diameter,
                );
            }
        }
    }

    let tree = build_index(
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.area.bounds().map(|b| (i, b))),
    );
    let pair_messages: Vec<Vec<RuleCheckMessage>> = items
        .par_iter()
        .enumerate()
        .map(|(i, item1)| {
            let mut found = Vec::new();
            let Some(bounds) = item1.area.bounds() else {
                return found;
            };
            for j in candidates_after(&tree, &BoundedItem::new(i, bounds), 0) {
                let item2 = &items[j];
                let overlap = item1.area.intersect(&item2.area);
                if !overlap.is_empty() {
                    found.push(messages::drill_drill_clearance(
                        item1.obj,
                        item1.hole,
                        item2.obj,
                        item2.hole,
                        clearance,
                        overlap.flatten_tree(),
                    ));
                }
            }
            found
        })
        .collect();
    for group in pair_messages {
        for message in group {
            ctx.emit(message);
        }
    }
}

/// 6. drills too close to the board edge
pub(crate) fn check_drill_board_clearances(ctx: &mut CheckContext) {
    let clearance = ctx.settings.min_drill_board_clearance;
    if clearance.is_zero() {
        return;
    }
    ctx.status("Check drill to board edge clearances...");

    let band = ctx.generator().board_clearance_band(clearance);
    if band.is_empty() {
        return;
    }
    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    {
        let generator = ctx.generator();
        let mut check = |obj: ObjRef, hole: Uuid, path: Path, diameter: PositiveLength| {
            let area = generator.hole_area(&path, diameter, Length::ZERO);
            let overlap = band.intersect(&area);
            if !overlap.is_empty() {
                pending.push(messages::drill_board_clearance(
                    obj,
                    hole,
                    clearance,
                    overlap.flatten_tree(),
                ));
            }
        };

        for segment in ctx.model.net_segments() {
            for via in &segment.vias {
                check(
                    ObjRef::new("via", via.uuid),
                    via.uuid,
                    Path::from_points(&[via.position]),
                    via.drill_diameter,
                );
            }
        }
        for hole in ctx.model.holes() {
            check(
                ObjRef::new("hole", hole.uuid),
                hole.uuid,
                hole.path.clone(),
                hole.diameter,
            );
        }
        for device in ctx.model.devices() {
            let transform = device.transform();
            for pad in &device.footprint.pads {
                let pad_transform = pad.transform();
                for hole in &pad.holes {
                    check(
                        ObjRef::new("pad", pad.uuid),
                        hole.uuid,
                        transform.map_path(&pad_transform.map_path(&hole.path)),
                        hole.diameter,
                    );
                }
            }
            for hole in &device.footprint.holes {
                check(
                    ObjRef::new("device", device.uuid),
                    hole.uuid,
                    transform.map_path(&hole.path),
                    hole.diameter,
                );
            }
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

/// 7. plated holes must keep their annular ring on every copper layer
pub(crate) fn check_minimum_pth_annular_ring(ctx: &mut CheckContext) {
    let min_ring = ctx.settings.min_pth_annular_ring;
    if min_ring.is_zero() {
        return;
    }
    ctx.status("Check PTH annular rings...");

    // copper present on *all* layers simultaneously
    let mut common: Option<PolygonSet> = None;
    for layer in ctx.model.copper_layers() {
        let layer_copper = ctx.copper_area(layer, &[]);
        common = Some(match common {
            None => layer_copper,
            Some(prev) => prev.intersect(&layer_copper),
        });
    }
    let common = common.unwrap_or_default();

    let tolerance = ctx.generator().tolerance();
    let mut pending: Vec<RuleCheckMessage> = Vec::new();

    for segment in ctx.model.net_segments() {
        for via in &segment.vias {
            let diameter = via.drill_diameter.get() + min_ring.get() * 2 - Length::new(1);
            let Some(diameter) = PositiveLength::new(diameter) else {
                continue;
            };
            let disc = Path::circle(diameter).translated(via.position);
            let area = PolygonSet::from_closed_path(&disc, tolerance);
            let uncovered = area.subtract(&common);
            if !uncovered.is_empty() {
                pending.push(messages::minimum_annular_ring(
                    ObjRef::new("via", via.uuid),
                    "via",
                    min_ring,
                    uncovered.flatten_tree(),
                ));
            }
        }
    }

    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            let pad_transform = pad.transform();
            let mut parts: Vec<PolygonSet> = Vec::new();
            for hole in &pad.holes {
                let diameter = hole.diameter.get() + min_ring.get() * 2 - Length::new(1);
                let Some(diameter) = PositiveLength::new(diameter) else {
                    continue;
                };
                let path = transform.map_path(&pad_transform.map_path(&hole.path));
                for stroke in path.to_outline_strokes(diameter) {
                    parts.push(PolygonSet::from_closed_path(&stroke, tolerance));
                }
            }
            if parts.is_empty() {
                continue;
            }
            let area = PolygonSet::union_all(parts);
            let uncovered = area.subtract(&common);
            if !uncovered.is_empty() {
                pending.push(messages::minimum_annular_ring(
                    ObjRef::new("pad", pad.uuid),
                    "pad",
                    min_ring,
                    uncovered.flatten_tree(),
                ));
            }
        }
    }

    for message in pending {
        ctx.emit(message);
    }
}

/// 8a. non-plated round drills below the minimum diameter
pub(crate) fn check_minimum_npth_drill_diameter(ctx: &mut CheckContext) {
    let min_diameter = ctx.settings.min_npth_drill_diameter;
    if min_diameter.is_zero() {
        return;
    }
    ctx.status("Check NPTH drill diameters...");

    for hole in ctx.model.holes() {
        if !hole.is_slot() && hole.diameter.get() < min_diameter.get() {
            ctx.emit(messages::minimum_drill_diameter(
                ObjRef::new("hole", hole.uuid),
                hole.uuid,
                min_diameter,
                hole.diameter.into(),
                hole_location(&hole.path, hole.diameter),
            ));
        }
    }
    for device in ctx.model.devices() {
        let transform = device.transform();
        for hole in &device.footprint.holes {
            if !hole.is_slot() && hole.diameter.get() < min_diameter.get() {
                ctx.emit(messages::minimum_drill_diameter(
                    ObjRef::new("device", device.uuid),
                    hole.uuid,
                    min_diameter,
                    hole.diameter.into(),
                    hole_location(&transform.map_path(&hole.path), hole.diameter),
                ));
            }
        }
    }
}

/// 8b. plated drills (vias, pad holes) below the minimum diameter
pub(crate) fn check_minimum_pth_drill_diameter(ctx: &mut CheckContext) {
    let min_diameter = ctx.settings.min_pth_drill_diameter;
    if min_diameter.is_zero() {
        return;
    }
    ctx.status("Check PTH drill diameters...");

    for segment in ctx.model.net_segments() {
        for via in &segment.vias {
            if via.drill_diameter.get() < min_diameter.get() {
                let locations =
                    vec![Path::circle(via.drill_diameter).translated(via.position)];
                ctx.emit(messages::minimum_drill_diameter(
                    ObjRef::new("via", via.uuid),
                    via.uuid,
                    min_diameter,
                    via.drill_diameter.into(),
                    locations,
                ));
            }
        }
    }
    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            for hole in &pad.holes {
                if hole.diameter.get() < min_diameter.get() {
                    let display = PositiveLength::clamped(
                        hole.diameter.get().max(Length::new(50_000)),
                    );
                    let center = transform.map_point(pad.position);
                    let locations = vec![Path::circle(display).translated(center)];
                    ctx.emit(messages::minimum_drill_diameter(
                        ObjRef::new("pad", pad.uuid),
                        hole.uuid,
                        min_diameter,
                        hole.diameter.into(),
                        locations,
                    ));
                }
            }
        }
    }
}

/// 9a. non-plated slots below the minimum width (short-axis diameter)
pub(crate) fn check_minimum_npth_slot_width(ctx: &mut CheckContext) {
    let min_width = ctx.settings.min_npth_slot_width;
    if min_width.is_zero() {
        return;
    }
    ctx.status("Check NPTH slot widths...");

    for hole in ctx.model.holes() {
        if hole.is_slot() && hole.diameter.get() < min_width.get() {
            ctx.emit(messages::minimum_slot_width(
                ObjRef::new("hole", hole.uuid),
                hole.uuid,
                min_width,
                hole.diameter.into(),
                hole_location(&hole.path, hole.diameter),
            ));
        }
    }
    for device in ctx.model.devices() {
        let transform = device.transform();
        for hole in &device.footprint.holes {
            if hole.is_slot() && hole.diameter.get() < min_width.get() {
                ctx.emit(messages::minimum_slot_width(
                    ObjRef::new("device", device.uuid),
                    hole.uuid,
                    min_width,
                    hole.diameter.into(),
                    hole_location(&transform.map_path(&hole.path), hole.diameter),
                ));
            }
        }
    }
}

/// 9b. plated slots in pads below the minimum width
pub(crate) fn check_minimum_pth_slot_width(ctx: &mut CheckContext) {
    let min_width = ctx.settings.min_pth_slot_width;
    if min_width.is_zero() {
        return;
    }
    ctx.status("Check PTH slot widths...");

    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            let pad_transform = pad.transform();
            for hole in &pad.holes {
                if hole.is_slot() && hole.diameter.get() < min_width.get() {
                    let path = transform.map_path(&pad_transform.map_path(&hole.path));
                    ctx.emit(messages::minimum_slot_width(
                        ObjRef::new("pad", pad.uuid),
                        hole.uuid,
                        min_width,
                        hole.diameter.into(),
                        hole_location(&path, hole.diameter),
                    ));
                }
            }
        }
    }
}

fn slot_exceeds_allowance(
    is_slot: bool,
    is_multi: bool,
    is_curved: bool,
    allowed: AllowedSlots,
) -> bool {
    if is_curved && allowed < AllowedSlots::Any {
        true
    } else if is_multi && allowed < AllowedSlots::MultiSegmentStraight {
        true
    } else {
        is_slot && allowed < AllowedSlots::SingleSegmentStraight
    }
}

fn hole_slot_warning(hole: &Hole, allowed: AllowedSlots) -> bool {
    slot_exceeds_allowance(
        hole.is_slot(),
        hole.is_multi_segment_slot(),
        hole.is_curved_slot(),
        allowed,
    )
}

fn pad_hole_slot_warning(hole: &PadHole, allowed: AllowedSlots) -> bool {
    slot_exceeds_allowance(
        hole.is_slot(),
        hole.is_multi_segment_slot(),
        hole.is_curved_slot(),
        allowed,
    )
}

/// 10a. disallowed non-plated slot shapes
pub(crate) fn check_allowed_npth_slots(ctx: &mut CheckContext) {
    let allowed = ctx.settings.allowed_npth_slots;
    if allowed == AllowedSlots::Any {
        return;
    }
    ctx.status("Check for disallowed NPTH slots...");

    for hole in ctx.model.holes() {
        if hole_slot_warning(hole, allowed) {
            ctx.emit(messages::forbidden_slot(
                ObjRef::new("hole", hole.uuid),
                hole.uuid,
                hole_location(&hole.path, hole.diameter),
            ));
        }
    }
    for device in ctx.model.devices() {
        let transform = device.transform();
        for hole in &device.footprint.holes {
            if hole_slot_warning(hole, allowed) {
                ctx.emit(messages::forbidden_slot(
                    ObjRef::new("device", device.uuid),
                    hole.uuid,
                    hole_location(&transform.map_path(&hole.path), hole.diameter),
                ));
            }
        }
    }
}

/// 10b. disallowed plated slot shapes in pads
pub(crate) fn check_allowed_pth_slots(ctx: &mut CheckContext) {
    let allowed = ctx.settings.allowed_pth_slots;
    if allowed == AllowedSlots::Any {
        return;
    }
    ctx.status("Check for disallowed PTH slots...");

    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            let pad_transform = pad.transform();
            for hole in &pad.holes {
                if pad_hole_slot_warning(hole, allowed) {
                    let path = transform.map_path(&pad_transform.map_path(&hole.path));
                    ctx.emit(messages::forbidden_slot(
                        ObjRef::new("pad", pad.uuid),
                        hole.uuid,
                        hole_location(&path, hole.diameter),
                    ));
                }
            }
        }
    }
}

/// 11. traces must land on pad copper that covers the pad origin
pub(crate) fn check_invalid_pad_connections(ctx: &mut CheckContext) {
    ctx.status("Check pad connections...");

    let tolerance = ctx.generator().tolerance();
    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    for device in ctx.model.devices() {
        let transform = device.transform();
        for pad in &device.footprint.pads {
            let mut connected_layers: Vec<Layer> = Vec::new();
            for segment in ctx.model.net_segments() {
                for line in &segment.net_lines {
                    let touches = line.start_anchor == NetLineAnchor::Pad(pad.uuid)
                        || line.end_anchor == NetLineAnchor::Pad(pad.uuid);
                    if touches && !connected_layers.contains(&line.layer) {
                        connected_layers.push(line.layer);
                    }
                }
            }
            for layer in connected_layers {
                let covered = pad
                    .geometries
                    .get(&layer)
                    .map(|geometries| {
                        geometries.iter().any(|g| {
                            let parts = PolygonSet::from_paths(&g.to_paths(), tolerance);
                            PolygonSet::union_all(parts).contains(Point::ORIGIN)
                        })
                    })
                    .unwrap_or(false);
                if !covered {
                    let center = transform.map_point(pad.position);
                    let locations = vec![Path::circle(PositiveLength::clamped(Length::new(
                        500_000,
                    )))
                    .translated(center)];
                    pending.push(messages::invalid_pad_connection(pad.uuid, layer, locations));
                }
            }
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

/// 12. courtyard overlaps, per courtyard layer
pub(crate) fn check_courtyard_clearances(ctx: &mut CheckContext) {
    ctx.status("Check courtyard clearances...");

    for layer in [Layer::TopCourtyard, Layer::BotCourtyard] {
        let courtyards: Vec<(&Device, PolygonSet)> = ctx
            .model
            .devices()
            .iter()
            .map(|d| (d, ctx.generator().device_courtyard_area(d, layer)))
            .collect();

        let pair_messages: Vec<Vec<RuleCheckMessage>> = (0..courtyards.len())
            .into_par_iter()
            .map(|i| {
                let mut found = Vec::new();
                let (dev1, area1) = &courtyards[i];
                if area1.is_empty() {
                    return found;
                }
                for (dev2, area2) in courtyards.iter().skip(i + 1) {
                    let overlap = area1.intersect(area2);
                    if !overlap.is_empty() {
                        let name1 = dev1.component.to_string();
                        let name2 = dev2.component.to_string();
                        found.push(messages::courtyard_overlap(
                            dev1.uuid,
                            dev2.uuid,
                            (name1.as_str(), name2.as_str()),
                            overlap.flatten_tree(),
                        ));
                    }
                }
                found
            })
            .collect();
        for group in pair_messages {
            for message in group {
                ctx.emit(message);
            }
        }
    }
}

/// 13. board outline sanity: presence, closedness, count, inner radii
pub(crate) fn check_board_outline(ctx: &mut CheckContext) {
    ctx.status("Check board outline...");

    let tolerance = ctx.generator().tolerance();
    let mut outline_paths: Vec<Path> = Vec::new();
    let mut pending: Vec<RuleCheckMessage> = Vec::new();

    for polygon in ctx.model.polygons() {
        if polygon.layer == Layer::BoardOutlines {
            outline_paths.push(polygon.path.clone());
        }
    }
    for device in ctx.model.devices() {
        let transform = device.transform();
        for polygon in &device.footprint.polygons {
            if polygon.layer == Layer::BoardOutlines {
                let path = transform.map_path(&polygon.path);
                if !path.is_closed() {
                    let stroke = PositiveLength::clamped(
                        polygon.line_width.get().max(Length::new(100_000)),
                    );
                    pending.push(messages::open_board_outline_polygon(
                        Some(device.uuid),
                        polygon.uuid,
                        path.to_outline_strokes(stroke),
                    ));
                }
                outline_paths.push(path);
            }
        }
        for circle in &device.footprint.circles {
            if circle.layer == Layer::BoardOutlines {
                outline_paths.push(
                    Path::circle(circle.diameter).translated(transform.map_point(circle.center)),
                );
            }
        }
    }

    let area = PolygonSet::union_all(
        outline_paths
            .iter()
            .map(|p| PolygonSet::from_closed_path(p, tolerance))
            .collect(),
    );

    if area.is_empty() {
        pending.push(messages::missing_board_outline());
    }

    let outer_rings = area.rings().iter().filter(|r| !r.is_hole).count();
    if outer_rings > 1 {
        pending.push(messages::multiple_board_outlines(area.flatten_tree()));
    }

    let min_radius = UnsignedLength::clamped(ctx.settings.min_outline_tool_diameter.get() / 2);
    if min_radius.nm() > 0 && !area.is_empty() {
        let grow = (min_radius.get() - Length::new(10_000)).max(Length::ZERO);
        let grown = offset(&area, grow, tolerance);
        let shrunk = offset(&grown, -min_radius.get(), tolerance);
        let residue = shrunk.subtract(&area);
        if !residue.is_empty() {
            pending.push(messages::minimum_board_outline_inner_radius(
                min_radius,
                residue.flatten_tree(),
            ));
        }
    }

    for message in pending {
        ctx.emit(message);
    }
}

/// 14. circuit components without a board device
pub(crate) fn check_for_unplaced_components(ctx: &mut CheckContext) {
    ctx.status("Check for unplaced components...");

    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    for component in ctx.model.project().circuit().component_instances() {
        let device = ctx.model.device_instance_by_component_uuid(component.uuid);
        if device.is_none() && !component.schematic_only {
            pending.push(messages::missing_device(component.uuid, &component.name));
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

/// 15. placed devices that differ from the configured default device
pub(crate) fn check_circuit_default_devices(ctx: &mut CheckContext) {
    ctx.status("Check configured default devices...");

    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    for device in ctx.model.devices() {
        let Some(component) = ctx
            .model
            .project()
            .circuit()
            .component_instances()
            .iter()
            .find(|c| c.uuid == device.component)
        else {
            continue;
        };
        if let Some(default) = component.default_device {
            if default != device.lib_device {
                pending.push(messages::default_device_mismatch(
                    component.uuid,
                    &component.name,
                    device_location(device),
                ));
            }
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

/// 16. remaining air wires are unrouted connections
pub(crate) fn check_for_missing_connections(ctx: &mut CheckContext) {
    ctx.status("Check for missing connections...");

    ctx.model.force_air_wires_rebuild();
    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    for wire in ctx.model.air_wires() {
        let locations = vec![Path::obround(
            wire.p1,
            wire.p2,
            PositiveLength::clamped(Length::new(50_000)),
        )];
        pending.push(messages::missing_connection(
            wire.net,
            &ctx.model.net_name(wire.net),
            wire.endpoint1,
            wire.endpoint2,
            locations,
        ));
    }
    for message in pending {
        ctx.emit(message);
    }
}

/// 17. stale leftovers: empty net segments and unconnected junctions
pub(crate) fn check_for_stale_objects(ctx: &mut CheckContext) {
    ctx.status("Check for stale objects...");

    let mut pending: Vec<RuleCheckMessage> = Vec::new();
    for segment in ctx.model.net_segments() {
        if !segment.is_used() {
            pending.push(messages::empty_net_segment(
                segment.uuid,
                &ctx.model.net_name(segment.net),
            ));
        }
        for net_point in &segment.net_points {
            if !segment.is_net_point_used(net_point) {
                let locations = vec![Path::circle(PositiveLength::clamped(Length::new(
                    300_000,
                )))
                .translated(net_point.position)];
                pending.push(messages::unconnected_junction(net_point.uuid, locations));
            }
        }
    }
    for message in pending {
        ctx.emit(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_allowance_matrix() {
        // round drill passes everything
        assert!(!slot_exceeds_allowance(false, false, false, AllowedSlots::None));
        // single segment slot
        assert!(slot_exceeds_allowance(true, false, false, AllowedSlots::None));
        assert!(!slot_exceeds_allowance(
            true,
            false,
            false,
            AllowedSlots::SingleSegmentStraight
        ));
        // multi segment slot
        assert!(slot_exceeds_allowance(
            true,
            true,
            false,
            AllowedSlots::SingleSegmentStraight
        ));
        assert!(!slot_exceeds_allowance(
            true,
            true,
            false,
            AllowedSlots::MultiSegmentStraight
        ));
        // curved slot only passes Any
        assert!(slot_exceeds_allowance(
            true,
            false,
            true,
            AllowedSlots::MultiSegmentStraight
        ));
        assert!(!slot_exceeds_allowance(true, false, true, AllowedSlots::Any));
    }
}
