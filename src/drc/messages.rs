//! Rule check message constructors
//!
//! One constructor per violation kind. Each builds the human readable text
//! and the approval key; the key's child order is part of the stable
//! approval contract, so it never depends on visit order (symmetric pairs
//! are canonicalized here).

use uuid::Uuid;

use crate::board::Layer;
use crate::drc::types::{RuleCheckMessage, Severity};
use crate::geometry::{Path, UnsignedLength};
use crate::sexpr::SExpr;

/// Reference to a board object by kind and identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef {
    pub kind: &'static str,
    pub uuid: Uuid,
}

impl ObjRef {
    pub fn new(kind: &'static str, uuid: Uuid) -> Self {
        ObjRef { kind, uuid }
    }

    fn child(self, tag: &str) -> SExpr {
        SExpr::tagged(
            tag,
            [SExpr::atom(self.kind), SExpr::atom(self.uuid.to_string())],
        )
    }

    /// Ordering key for pair canonicalization
    fn sort_key(self) -> (String, String) {
        (self.kind.to_string(), self.uuid.to_string())
    }
}

fn key(kind: &str, children: impl IntoIterator<Item = SExpr>) -> SExpr {
    let mut all = vec![SExpr::atom(kind)];
    all.extend(children);
    SExpr::tagged("approved", all)
}

fn net_child(tag: &str, net: Option<Uuid>) -> SExpr {
    match net {
        Some(uuid) => SExpr::tagged(tag, [SExpr::atom(uuid.to_string())]),
        None => SExpr::tagged(tag, [SExpr::atom("none")]),
    }
}

fn mm(len: UnsignedLength) -> String {
    format!("{:.3} mm", len.get().to_mm())
}

pub fn minimum_width(
    obj: ObjRef,
    what: &str,
    min_width: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        format!("Copper width of {} < {}", what, mm(min_width)),
        format!(
            "The copper width of {} is smaller than the minimum copper width \
             configured in the design rules. It may not be manufactured reliably.",
            what
        ),
        key("minimum_width_violation", [obj.child("object")]),
        locations,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn copper_copper_clearance(
    layer1: Option<Layer>,
    net1: Option<Uuid>,
    obj1: ObjRef,
    layer2: Option<Layer>,
    net2: Option<Uuid>,
    obj2: ObjRef,
    names: (&str, &str),
    clearance: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    // symmetric check: order the pair by (kind, uuid) so swapped inputs
    // yield the same approval key
    let ((l1, n1, o1, name1), (l2, n2, o2, name2)) =
        if obj2.sort_key() < obj1.sort_key() {
            ((layer2, net2, obj2, names.1), (layer1, net1, obj1, names.0))
        } else {
            ((layer1, net1, obj1, names.0), (layer2, net2, obj2, names.1))
        };
    let layer_child = |tag: &str, layer: Option<Layer>| match layer {
        Some(l) => SExpr::tagged(tag, [SExpr::atom(l.id())]),
        None => SExpr::tagged(tag, [SExpr::atom("tht")]),
    };
    RuleCheckMessage::new(
        Severity::Error,
        format!("Clearance between {} and {} < {}", name1, name2, mm(clearance)),
        "The clearance between two copper objects of different nets is \
         smaller than the minimum copper clearance configured in the design \
         rules. This may lead to short circuits."
            .to_string(),
        key(
            "copper_copper_clearance_violation",
            [
                layer_child("layer1", l1),
                net_child("net1", n1),
                o1.child("object1"),
                layer_child("layer2", l2),
                net_child("net2", n2),
                o2.child("object2"),
            ],
        ),
        locations,
    )
}

pub fn copper_board_clearance(
    obj: ObjRef,
    what: &str,
    clearance: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        format!("Clearance of {} to board edge < {}", what, mm(clearance)),
        "The clearance between a copper object and the board outline is \
         smaller than the minimum clearance configured in the design rules. \
         The copper may be damaged when the board is cut out."
            .to_string(),
        key("copper_board_clearance_violation", [obj.child("object")]),
        locations,
    )
}

pub fn copper_hole_clearance(
    owner: ObjRef,
    hole: Uuid,
    clearance: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        format!("Clearance of copper to hole < {}", mm(clearance)),
        "The clearance between copper and a non-plated hole is smaller than \
         the minimum clearance configured in the design rules. The copper may \
         be damaged by the drill."
            .to_string(),
        key(
            "copper_hole_clearance_violation",
            [
                owner.child("object"),
                SExpr::tagged("hole", [SExpr::atom(hole.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn drill_drill_clearance(
    obj1: ObjRef,
    hole1: Uuid,
    obj2: ObjRef,
    hole2: Uuid,
    clearance: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    // canonical order: (obj1, hole1) <= (obj2, hole2)
    let ((o1, h1), (o2, h2)) =
        if (obj2.sort_key(), hole2.to_string()) < (obj1.sort_key(), hole1.to_string()) {
            ((obj2, hole2), (obj1, hole1))
        } else {
            ((obj1, hole1), (obj2, hole2))
        };
    let drill_child = |tag: &str, obj: ObjRef, hole: Uuid| {
        SExpr::tagged(
            tag,
            [
                SExpr::atom(obj.kind),
                SExpr::atom(obj.uuid.to_string()),
                SExpr::atom(hole.to_string()),
            ],
        )
    };
    RuleCheckMessage::new(
        Severity::Error,
        format!("Clearance between two drills < {}", mm(clearance)),
        "The clearance between two drilled holes is smaller than the minimum \
         drill clearance configured in the design rules. The drill bits may \
         break during manufacturing."
            .to_string(),
        key(
            "drill_drill_clearance_violation",
            [drill_child("drill1", o1, h1), drill_child("drill2", o2, h2)],
        ),
        locations,
    )
}

pub fn drill_board_clearance(
    obj: ObjRef,
    hole: Uuid,
    clearance: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        format!("Clearance of drill to board edge < {}", mm(clearance)),
        "The clearance between a drilled hole and the board outline is \
         smaller than the minimum clearance configured in the design rules."
            .to_string(),
        key(
            "drill_board_clearance_violation",
            [
                obj.child("object"),
                SExpr::tagged("hole", [SExpr::atom(hole.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn minimum_annular_ring(
    obj: ObjRef,
    what: &str,
    min_ring: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Annular ring of {} < {}", what, mm(min_ring)),
        "The remaining copper ring around a plated hole is smaller than the \
         minimum annular ring configured in the design rules. The connection \
         may be unreliable after drilling."
            .to_string(),
        key("minimum_annular_ring_violation", [obj.child("object")]),
        locations,
    )
}

pub fn minimum_drill_diameter(
    obj: ObjRef,
    hole: Uuid,
    min_diameter: UnsignedLength,
    actual: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Drill diameter {} < {}", mm(actual), mm(min_diameter)),
        "A drilled hole is smaller than the minimum drill diameter configured \
         in the design rules; the fabricator may not be able to drill it."
            .to_string(),
        key(
            "minimum_drill_diameter_violation",
            [
                obj.child("object"),
                SExpr::tagged("hole", [SExpr::atom(hole.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn minimum_slot_width(
    obj: ObjRef,
    hole: Uuid,
    min_width: UnsignedLength,
    actual: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Slot width {} < {}", mm(actual), mm(min_width)),
        "A slot is narrower than the minimum slot width configured in the \
         design rules; the fabricator may not be able to mill it."
            .to_string(),
        key(
            "minimum_slot_width_violation",
            [
                obj.child("object"),
                SExpr::tagged("hole", [SExpr::atom(hole.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn forbidden_slot(obj: ObjRef, hole: Uuid, locations: Vec<Path>) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        "Hole is a slot of a disallowed shape".to_string(),
        "The hole is a slot whose shape exceeds what the design rules allow. \
         Slots can raise the board price or may not be manufacturable at all."
            .to_string(),
        key(
            "forbidden_slot",
            [
                obj.child("object"),
                SExpr::tagged("hole", [SExpr::atom(hole.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn invalid_pad_connection(pad: Uuid, layer: Layer, locations: Vec<Path>) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        format!("Invalid pad connection on {}", layer),
        "A trace is connected to a pad on a layer where the pad's copper does \
         not cover the pad origin, so the connection would be unreliable or \
         open."
            .to_string(),
        key(
            "invalid_pad_connection",
            [
                SExpr::tagged("pad", [SExpr::atom(pad.to_string())]),
                SExpr::tagged("layer", [SExpr::atom(layer.id())]),
            ],
        ),
        locations,
    )
}

pub fn courtyard_overlap(
    dev1: Uuid,
    dev2: Uuid,
    names: (&str, &str),
    locations: Vec<Path>,
) -> RuleCheckMessage {
    // lexicographic device order
    let ((d1, n1), (d2, n2)) = if dev2.to_string() < dev1.to_string() {
        ((dev2, names.1), (dev1, names.0))
    } else {
        ((dev1, names.0), (dev2, names.1))
    };
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Courtyards of {} and {} overlap", n1, n2),
        "The courtyards of two devices overlap, so the devices may collide \
         mechanically during assembly."
            .to_string(),
        key(
            "courtyard_overlap",
            [
                SExpr::tagged("device1", [SExpr::atom(d1.to_string())]),
                SExpr::tagged("device2", [SExpr::atom(d2.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn open_board_outline_polygon(
    device: Option<Uuid>,
    polygon: Uuid,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        "Board outline polygon is not closed".to_string(),
        "A polygon on the board outline layer is open (its first and last \
         vertex differ), so the board shape is ambiguous."
            .to_string(),
        key(
            "open_board_outline_polygon",
            [
                match device {
                    Some(d) => SExpr::tagged("device", [SExpr::atom(d.to_string())]),
                    None => SExpr::tagged("device", [SExpr::atom("none")]),
                },
                SExpr::tagged("polygon", [SExpr::atom(polygon.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn missing_board_outline() -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Error,
        "Board outline is missing".to_string(),
        "No closed polygon exists on the board outline layer, so the board \
         cannot be manufactured."
            .to_string(),
        key("missing_board_outline", []),
        Vec::new(),
    )
}

pub fn multiple_board_outlines(locations: Vec<Path>) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        "Multiple board outlines".to_string(),
        "The board outline layer contains more than one independent outline. \
         Unless panelization is intended, this is probably a mistake."
            .to_string(),
        key("multiple_board_outlines", []),
        locations,
    )
}

pub fn minimum_board_outline_inner_radius(
    min_radius: UnsignedLength,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Board outline inner radius < {}", mm(min_radius)),
        "Inner corners of the board outline are sharper than the smallest \
         milling tool configured in the design rules, so the outline cannot \
         be cut as drawn."
            .to_string(),
        key("minimum_board_outline_inner_radius_violation", []),
        locations,
    )
}

pub fn missing_device(component: Uuid, name: &str) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Device of component '{}' is missing", name),
        "A component of the circuit has no device placed on the board, so \
         the assembled board would be incomplete."
            .to_string(),
        key(
            "missing_device",
            [SExpr::tagged("component", [SExpr::atom(component.to_string())])],
        ),
        Vec::new(),
    )
}

pub fn default_device_mismatch(
    component: Uuid,
    name: &str,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Hint,
        format!("Device of '{}' differs from the configured default", name),
        "The placed device is not the default device configured for its \
         component. This may be intentional, but reviewing it is advised."
            .to_string(),
        key(
            "default_device_mismatch",
            [SExpr::tagged("component", [SExpr::atom(component.to_string())])],
        ),
        locations,
    )
}

pub fn missing_connection(
    net: Option<Uuid>,
    net_name: &str,
    endpoint1: Uuid,
    endpoint2: Uuid,
    locations: Vec<Path>,
) -> RuleCheckMessage {
    // endpoints ordered lexicographically
    let (e1, e2) = if endpoint2.to_string() < endpoint1.to_string() {
        (endpoint2, endpoint1)
    } else {
        (endpoint1, endpoint2)
    };
    RuleCheckMessage::new(
        Severity::Warning,
        format!("Missing connection in net '{}'", net_name),
        "Two points of the net are not connected by copper yet. Route the \
         remaining air wire to finish the board."
            .to_string(),
        key(
            "missing_connection",
            [
                net_child("net", net),
                SExpr::tagged("endpoint1", [SExpr::atom(e1.to_string())]),
                SExpr::tagged("endpoint2", [SExpr::atom(e2.to_string())]),
            ],
        ),
        locations,
    )
}

pub fn empty_net_segment(segment: Uuid, net_name: &str) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Hint,
        format!("Empty net segment of '{}'", net_name),
        "A net segment contains no vias, traces or junctions; it is a stale \
         leftover that can be removed."
            .to_string(),
        key(
            "empty_net_segment",
            [SExpr::tagged("netsegment", [SExpr::atom(segment.to_string())])],
        ),
        Vec::new(),
    )
}

pub fn unconnected_junction(net_point: Uuid, locations: Vec<Path>) -> RuleCheckMessage {
    RuleCheckMessage::new(
        Severity::Hint,
        "Junction without any traces".to_string(),
        "A junction has no attached traces; it is a stale leftover that can \
         be removed."
            .to_string(),
        key(
            "unconnected_junction",
            [SExpr::tagged("junction", [SExpr::atom(net_point.to_string())])],
        ),
        locations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Length;

    fn len(nm: i64) -> UnsignedLength {
        UnsignedLength::clamped(Length::new(nm))
    }

    #[test]
    fn test_drill_pair_canonicalization() {
        let a = ObjRef::new("via", Uuid::from_u128(1));
        let b = ObjRef::new("via", Uuid::from_u128(2));
        let h1 = Uuid::from_u128(10);
        let h2 = Uuid::from_u128(20);
        let m1 = drill_drill_clearance(a, h1, b, h2, len(200_000), Vec::new());
        let m2 = drill_drill_clearance(b, h2, a, h1, len(200_000), Vec::new());
        assert_eq!(m1.approval_key, m2.approval_key);
    }

    #[test]
    fn test_copper_pair_canonicalization() {
        let a = ObjRef::new("netline", Uuid::from_u128(1));
        let b = ObjRef::new("netline", Uuid::from_u128(2));
        let m1 = copper_copper_clearance(
            Some(Layer::TopCopper),
            None,
            a,
            Some(Layer::TopCopper),
            None,
            b,
            ("x", "y"),
            len(150_000),
            Vec::new(),
        );
        let m2 = copper_copper_clearance(
            Some(Layer::TopCopper),
            None,
            b,
            Some(Layer::TopCopper),
            None,
            a,
            ("y", "x"),
            len(150_000),
            Vec::new(),
        );
        assert_eq!(m1.approval_key, m2.approval_key);
    }

    #[test]
    fn test_courtyard_lexicographic_order() {
        let d1 = Uuid::from_u128(0xaa);
        let d2 = Uuid::from_u128(0x0b);
        let m1 = courtyard_overlap(d1, d2, ("R1", "R2"), Vec::new());
        let m2 = courtyard_overlap(d2, d1, ("R2", "R1"), Vec::new());
        assert_eq!(m1.approval_key, m2.approval_key);
    }

    #[test]
    fn test_missing_connection_endpoint_order() {
        let e1 = Uuid::from_u128(5);
        let e2 = Uuid::from_u128(3);
        let m1 = missing_connection(None, "GND", e1, e2, Vec::new());
        let m2 = missing_connection(None, "GND", e2, e1, Vec::new());
        assert_eq!(m1.approval_key, m2.approval_key);
    }

    #[test]
    fn test_approval_key_round_trip() {
        let m = minimum_width(
            ObjRef::new("netline", Uuid::from_u128(9)),
            "trace",
            len(150_000),
            Vec::new(),
        );
        let text = m.approval_key.canonical_text();
        let parsed = crate::sexpr::SExpr::parse(&text).unwrap();
        assert_eq!(parsed, m.approval_key);
    }

    #[test]
    fn test_constant_keys_are_stable() {
        assert_eq!(
            missing_board_outline().approval_key,
            missing_board_outline().approval_key
        );
        assert_eq!(
            missing_board_outline().approval_key.canonical_text(),
            "(approved\n missing_board_outline\n)"
        );
    }
}
