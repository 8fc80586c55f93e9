//! End-to-end rule check scenarios with literal nanometre inputs

use std::collections::HashSet;

use uuid::Uuid;

use boardcheck::board::{
    BoardModel, BoardPolygon, ComponentInstance, Device, Footprint, FootprintPad, Layer, NetLine,
    NetLineAnchor, NetSegment, NetSignal, PadGeometry, PadHole, Plane, Via,
};
use boardcheck::drc::{
    resolve_approvals, run_drc, BoardDesignRuleCheckSettings, AllowedSlots, CancelToken,
    NullObserver,
};
use boardcheck::geometry::{
    Angle, Length, Path, Point, PositiveLength, UnsignedLength, UnsignedLimitedRatio,
};

fn pos(nm: i64) -> PositiveLength {
    PositiveLength::new(Length::new(nm)).unwrap()
}

fn ulen(nm: i64) -> UnsignedLength {
    UnsignedLength::new(Length::new(nm)).unwrap()
}

fn rect_outline(uuid: u128, x0: i64, y0: i64, x1: i64, y1: i64) -> BoardPolygon {
    BoardPolygon {
        uuid: Uuid::from_u128(uuid),
        layer: Layer::BoardOutlines,
        path: Path::from_points(&[
            Point::from_nm(x0, y0),
            Point::from_nm(x1, y0),
            Point::from_nm(x1, y1),
            Point::from_nm(x0, y1),
            Point::from_nm(x0, y0),
        ]),
        line_width: UnsignedLength::ZERO,
        filled: false,
    }
}

fn kind_of(key_text: &str) -> &str {
    // second line of the canonical key holds the message kind
    key_text.lines().nth(1).unwrap().trim()
}

/// S1: two parallel traces of different nets, too close together
fn s1_board() -> BoardModel {
    let mut model = BoardModel::new("s1", 0);
    model
        .polygons
        .push(rect_outline(0x100, 0, 0, 20_000_000, 10_000_000));
    let net_a = Uuid::from_u128(0x200);
    let net_b = Uuid::from_u128(0x201);
    model.project.circuit.net_signals.push(NetSignal {
        uuid: net_a,
        name: "A".into(),
    });
    model.project.circuit.net_signals.push(NetSignal {
        uuid: net_b,
        name: "B".into(),
    });
    let trace = |seg: u128, net: Uuid, y: i64| NetSegment {
        uuid: Uuid::from_u128(seg),
        net: Some(net),
        vias: Vec::new(),
        net_lines: vec![NetLine {
            uuid: Uuid::from_u128(seg + 1),
            layer: Layer::TopCopper,
            width: pos(200_000),
            start: Point::from_nm(5_000_000, y),
            end: Point::from_nm(15_000_000, y),
            start_anchor: NetLineAnchor::Junction(Uuid::from_u128(seg + 2)),
            end_anchor: NetLineAnchor::Junction(Uuid::from_u128(seg + 3)),
        }],
        net_points: Vec::new(),
    };
    model.net_segments.push(trace(0x400, net_a, 3_000_000));
    model.net_segments.push(trace(0x410, net_b, 3_150_000));
    model
}

#[test]
fn s1_two_parallel_traces_too_close() {
    let model = s1_board();
    let settings = BoardDesignRuleCheckSettings {
        min_copper_copper_clearance: ulen(200_000),
        ..Default::default()
    };
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.messages.len(), 1, "{:#?}", outcome.messages);
    let message = &outcome.messages[0];
    let key = message.approval_key.canonical_text();
    assert_eq!(kind_of(&key), "copper_copper_clearance_violation");
    assert!(!message.locations.is_empty());
    // both net lines are referenced
    assert!(key.contains(&Uuid::from_u128(0x401).to_string()));
    assert!(key.contains(&Uuid::from_u128(0x411).to_string()));
}

#[test]
fn s1_approving_the_key_clears_the_report() {
    let model = s1_board();
    let settings = BoardDesignRuleCheckSettings {
        min_copper_copper_clearance: ulen(200_000),
        ..Default::default()
    };
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    let mut approved = HashSet::new();
    approved.insert(outcome.messages[0].approval_key.clone());
    let (count, remaining) = resolve_approvals(outcome.messages, &approved);
    assert_eq!(count, 1);
    assert!(remaining.is_empty());
}

/// S2: via whose annular ring is too thin, planes on both copper layers
#[test]
fn s2_annular_ring_too_thin() {
    let mut model = BoardModel::new("s2", 0);
    model
        .polygons
        .push(rect_outline(0x100, -5_000_000, -5_000_000, 5_000_000, 5_000_000));
    let gnd = Uuid::from_u128(0x200);
    model.project.circuit.net_signals.push(NetSignal {
        uuid: gnd,
        name: "GND".into(),
    });
    let plane_outline = Path::from_points(&[
        Point::from_nm(-5_000_000, -5_000_000),
        Point::from_nm(5_000_000, -5_000_000),
        Point::from_nm(5_000_000, 5_000_000),
        Point::from_nm(-5_000_000, 5_000_000),
        Point::from_nm(-5_000_000, -5_000_000),
    ]);
    for (uuid, layer) in [(0x300u128, Layer::TopCopper), (0x301, Layer::BotCopper)] {
        model.planes.push(Plane::new(
            Uuid::from_u128(uuid),
            layer,
            gnd,
            plane_outline.clone(),
            ulen(200_000),
            ulen(300_000),
        ));
    }
    model.net_segments.push(NetSegment {
        uuid: Uuid::from_u128(0x400),
        net: Some(gnd),
        vias: vec![Via {
            uuid: Uuid::from_u128(0x401),
            position: Point::ORIGIN,
            drill_diameter: pos(300_000),
            size: pos(500_000),
            stop_mask_offset: None,
        }],
        net_lines: Vec::new(),
        net_points: Vec::new(),
    });

    let settings = BoardDesignRuleCheckSettings {
        min_pth_annular_ring: ulen(150_000),
        ..Default::default()
    };
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    assert_eq!(outcome.messages.len(), 1, "{:#?}", outcome.messages);
    let key = outcome.messages[0].approval_key.canonical_text();
    assert_eq!(kind_of(&key), "minimum_annular_ring_violation");
    assert!(key.contains(&Uuid::from_u128(0x401).to_string()));
    assert!(!outcome.messages[0].locations.is_empty());
}

/// S3: hole too close to a circular board edge
#[test]
fn s3_hole_too_close_to_board_edge() {
    let mut model = BoardModel::new("s3", 0);
    model.polygons.push(BoardPolygon {
        uuid: Uuid::from_u128(0x100),
        layer: Layer::BoardOutlines,
        path: Path::circle(pos(10_000_000)),
        line_width: UnsignedLength::ZERO,
        filled: false,
    });
    model.holes.push(boardcheck::board::Hole {
        uuid: Uuid::from_u128(0x200),
        diameter: pos(1_000_000),
        path: Path::from_points(&[Point::from_nm(4_500_000, 0)]),
        stop_mask_offset: None,
    });

    let settings = BoardDesignRuleCheckSettings {
        min_drill_board_clearance: ulen(300_000),
        ..Default::default()
    };
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    assert_eq!(outcome.messages.len(), 1, "{:#?}", outcome.messages);
    let key = outcome.messages[0].approval_key.canonical_text();
    assert_eq!(kind_of(&key), "drill_board_clearance_violation");
    assert!(key.contains(&Uuid::from_u128(0x200).to_string()));
}

/// S4: plated slot in a pad while slots are disallowed entirely
#[test]
fn s4_forbidden_pth_slot() {
    let mut model = BoardModel::new("s4", 0);
    model
        .polygons
        .push(rect_outline(0x100, -10_000_000, -5_000_000, 10_000_000, 5_000_000));
    let mut geometries = indexmap::IndexMap::new();
    for layer in [Layer::TopCopper, Layer::BotCopper] {
        geometries.insert(
            layer,
            vec![PadGeometry::RoundedRect {
                width: pos(6_000_000),
                height: pos(1_600_000),
                corner_radius: UnsignedLimitedRatio::ZERO,
            }],
        );
    }
    model.devices.push(Device {
        uuid: Uuid::from_u128(0x300),
        component: Uuid::from_u128(0x301),
        lib_device: Uuid::from_u128(0x302),
        position: Point::ORIGIN,
        rotation: Angle::ZERO,
        mirrored: false,
        footprint: Footprint {
            polygons: Vec::new(),
            circles: Vec::new(),
            holes: Vec::new(),
            pads: vec![FootprintPad {
                uuid: Uuid::from_u128(0x310),
                position: Point::ORIGIN,
                rotation: Angle::ZERO,
                net: None,
                geometries,
                holes: vec![PadHole {
                    uuid: Uuid::from_u128(0x311),
                    diameter: pos(800_000),
                    path: Path::from_points(&[
                        Point::from_nm(-2_500_000, 0),
                        Point::from_nm(2_500_000, 0),
                    ]),
                }],
            }],
        },
        stroke_texts: Vec::new(),
    });

    let settings = BoardDesignRuleCheckSettings {
        allowed_pth_slots: AllowedSlots::None,
        ..Default::default()
    };
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    assert_eq!(outcome.messages.len(), 1, "{:#?}", outcome.messages);
    let key = outcome.messages[0].approval_key.canonical_text();
    assert_eq!(kind_of(&key), "forbidden_slot");
    assert!(key.contains(&Uuid::from_u128(0x311).to_string()));
}

/// S5: open footprint outline polygon which is also the only outline
#[test]
fn s5_open_board_outline() {
    let mut model = BoardModel::new("s5", 0);
    model.devices.push(Device {
        uuid: Uuid::from_u128(0x300),
        component: Uuid::from_u128(0x301),
        lib_device: Uuid::from_u128(0x302),
        position: Point::ORIGIN,
        rotation: Angle::ZERO,
        mirrored: false,
        footprint: Footprint {
            polygons: vec![BoardPolygon {
                uuid: Uuid::from_u128(0x310),
                layer: Layer::BoardOutlines,
                path: Path::from_points(&[
                    Point::from_nm(0, 0),
                    Point::from_nm(5_000_000, 0),
                ]),
                line_width: UnsignedLength::ZERO,
                filled: false,
            }],
            circles: Vec::new(),
            holes: Vec::new(),
            pads: Vec::new(),
        },
        stroke_texts: Vec::new(),
    });

    let settings = BoardDesignRuleCheckSettings::default();
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    let kinds: Vec<String> = outcome
        .messages
        .iter()
        .map(|m| kind_of(&m.approval_key.canonical_text()).to_string())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "open_board_outline_polygon".to_string(),
            "missing_board_outline".to_string(),
        ],
        "{:#?}",
        outcome.messages
    );
}

/// S6: circuit component without any placed device
#[test]
fn s6_missing_device() {
    let mut model = BoardModel::new("s6", 0);
    model
        .polygons
        .push(rect_outline(0x100, 0, 0, 10_000_000, 10_000_000));
    let c1 = Uuid::from_u128(0x500);
    model.project.circuit.component_instances.push(ComponentInstance {
        uuid: c1,
        name: "C1".into(),
        schematic_only: false,
        default_device: None,
    });

    let settings = BoardDesignRuleCheckSettings::default();
    let outcome = run_drc(&model, &settings, false, &CancelToken::new(), &NullObserver);
    assert_eq!(outcome.messages.len(), 1, "{:#?}", outcome.messages);
    let key = outcome.messages[0].approval_key.canonical_text();
    assert_eq!(kind_of(&key), "missing_device");
    assert!(key.contains(&c1.to_string()));
    // schematic-only components are not reported
    let mut model2 = BoardModel::new("s6b", 0);
    model2
        .polygons
        .push(rect_outline(0x100, 0, 0, 10_000_000, 10_000_000));
    model2.project.circuit.component_instances.push(ComponentInstance {
        uuid: c1,
        name: "C1".into(),
        schematic_only: true,
        default_device: None,
    });
    let outcome2 = run_drc(&model2, &settings, false, &CancelToken::new(), &NullObserver);
    assert!(outcome2.messages.is_empty());
}
