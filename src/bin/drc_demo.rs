//! CLI tool for running the rule checker against an in-code demo board
//!
//! Usage:
//!   cargo run --release --bin drc_demo -- [options]
//!
//! Options:
//!   --quick    Run the quick check subset only
//!   --json     Dump the non-approved messages as JSON

use std::collections::HashSet;
use std::env;
use std::process::ExitCode;

use uuid::Uuid;

use boardcheck::board::{
    BoardModel, BoardPolygon, ComponentInstance, Layer, NetLine, NetLineAnchor, NetSegment,
    NetSignal,
};
use boardcheck::drc::{
    format_report, resolve_approvals, run_drc, BoardDesignRuleCheckSettings, CancelToken,
    DrcObserver, RuleCheckMessage,
};
use boardcheck::geometry::{Length, Path, Point, PositiveLength, UnsignedLength};

struct StderrObserver;

impl DrcObserver for StderrObserver {
    fn status(&self, status: &str) {
        eprintln!("[demo] {}", status);
    }

    fn message(&self, message: &RuleCheckMessage) {
        eprintln!("[demo]   -> {}", message.message);
    }
}

/// A 20 x 10 mm board with two traces routed too close together and one
/// component that never got placed
fn demo_board() -> BoardModel {
    let mut model = BoardModel::new("Demo", 0);

    model.polygons.push(BoardPolygon {
        uuid: Uuid::from_u128(0x100),
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

    let net_a = Uuid::from_u128(0x200);
    let net_b = Uuid::from_u128(0x201);
    model.project.circuit.net_signals.push(NetSignal {
        uuid: net_a,
        name: "SIG_A".into(),
    });
    model.project.circuit.net_signals.push(NetSignal {
        uuid: net_b,
        name: "SIG_B".into(),
    });
    model.project.circuit.component_instances.push(ComponentInstance {
        uuid: Uuid::from_u128(0x300),
        name: "R1".into(),
        schematic_only: false,
        default_device: None,
    });

    let width = PositiveLength::clamped(Length::new(200_000));
    let trace = |uuid: u128, net: Uuid, y: i64| NetSegment {
        uuid: Uuid::from_u128(uuid),
        net: Some(net),
        vias: Vec::new(),
        net_lines: vec![NetLine {
            uuid: Uuid::from_u128(uuid + 1),
            layer: Layer::TopCopper,
            width,
            start: Point::from_nm(5_000_000, y),
            end: Point::from_nm(15_000_000, y),
            start_anchor: NetLineAnchor::Junction(Uuid::from_u128(uuid + 2)),
            end_anchor: NetLineAnchor::Junction(Uuid::from_u128(uuid + 3)),
        }],
        net_points: Vec::new(),
    };
    model.net_segments.push(trace(0x400, net_a, 3_000_000));
    model.net_segments.push(trace(0x410, net_b, 3_150_000));

    model
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let quick = args.iter().any(|a| a == "--quick");
    let json = args.iter().any(|a| a == "--json");

    let model = demo_board();
    let settings = BoardDesignRuleCheckSettings {
        min_copper_width: UnsignedLength::clamped(Length::new(150_000)),
        min_copper_copper_clearance: UnsignedLength::clamped(Length::new(200_000)),
        min_copper_board_clearance: UnsignedLength::clamped(Length::new(300_000)),
        ..Default::default()
    };

    let outcome = run_drc(
        &model,
        &settings,
        quick,
        &CancelToken::new(),
        &StderrObserver,
    );
    if let Some(error) = outcome.fatal_error {
        eprintln!("fatal: {}", error);
        return ExitCode::FAILURE;
    }

    let approved = HashSet::new();
    let (approved_count, non_approved) = resolve_approvals(outcome.messages, &approved);

    if json {
        match serde_json::to_string_pretty(&non_approved) {
            Ok(dump) => println!("{}", dump),
            Err(error) => {
                eprintln!("fatal: {}", error);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", format_report(&model.name, approved_count, &non_approved));
    }

    if non_approved.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
