//! The board aggregate consumed by the rule checker
//!
//! A `BoardModel` is read-only for the duration of a check run except for
//! `rebuild_planes` (plane fragments live behind a lock on each plane) and
//! the air-wire consistency pass.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::layer::Layer;
use crate::board::objects::{AirWire, BoardPolygon, Device, Hole, NetSegment, Plane, StrokeText};
use crate::board::planes;
use crate::geometry::PositiveLength;

/// Electrical net
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetSignal {
    pub uuid: Uuid,
    pub name: String,
}

/// Component from the circuit; `schematic_only` components never get a
/// board device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub uuid: Uuid,
    pub name: String,
    pub schematic_only: bool,
    pub default_device: Option<Uuid>,
}

/// The circuit view of the surrounding project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Circuit {
    pub net_signals: Vec<NetSignal>,
    pub component_instances: Vec<ComponentInstance>,
}

impl Circuit {
    pub fn net_signal(&self, uuid: Uuid) -> Option<&NetSignal> {
        self.net_signals.iter().find(|n| n.uuid == uuid)
    }

    pub fn component_instances(&self) -> &[ComponentInstance] {
        &self.component_instances
    }
}

/// The surrounding project; only the circuit is needed by the checker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub circuit: Circuit,
}

impl Project {
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

/// A fully described board
#[derive(Debug, Default)]
pub struct BoardModel {
    pub name: String,
    pub inner_copper_count: u8,
    pub devices: Vec<Device>,
    pub net_segments: Vec<NetSegment>,
    pub planes: Vec<Plane>,
    pub polygons: Vec<BoardPolygon>,
    pub stroke_texts: Vec<StrokeText>,
    pub holes: Vec<Hole>,
    pub project: Project,
    air_wires: RwLock<Vec<AirWire>>,
}

impl BoardModel {
    pub fn new(name: impl Into<String>, inner_copper_count: u8) -> Self {
        BoardModel {
            name: name.into(),
            inner_copper_count,
            ..Default::default()
        }
    }

    /// Copper layers in stackup order: top, inner 1..N, bottom
    pub fn copper_layers(&self) -> Vec<Layer> {
        let mut layers = Vec::with_capacity(self.inner_copper_count as usize + 2);
        layers.push(Layer::TopCopper);
        for i in 1..=self.inner_copper_count {
            layers.push(Layer::InnerCopper(i));
        }
        layers.push(Layer::BotCopper);
        layers
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn net_segments(&self) -> &[NetSegment] {
        &self.net_segments
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn polygons(&self) -> &[BoardPolygon] {
        &self.polygons
    }

    pub fn stroke_texts(&self) -> &[StrokeText] {
        &self.stroke_texts
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn device_instance_by_component_uuid(&self, component: Uuid) -> Option<&Device> {
        self.devices.iter().find(|d| d.component == component)
    }

    pub fn net_name(&self, net: Option<Uuid>) -> String {
        net.and_then(|uuid| self.project.circuit.net_signal(uuid))
            .map(|n| n.name.clone())
            .unwrap_or_else(|| "-".into())
    }

    /// Replaces the precomputed unrouted connections
    pub fn set_air_wires(&self, wires: Vec<AirWire>) {
        *self.air_wires.write().expect("air wires poisoned") = wires;
    }

    /// Drops air wires referencing nets that no longer exist; connectivity
    /// itself is precomputed by the editor, not traced here
    pub fn force_air_wires_rebuild(&self) {
        let mut wires = self.air_wires.write().expect("air wires poisoned");
        wires.retain(|w| match w.net {
            Some(net) => self.project.circuit.net_signal(net).is_some(),
            None => true,
        });
    }

    pub fn air_wires(&self) -> Vec<AirWire> {
        self.air_wires.read().expect("air wires poisoned").clone()
    }

    /// Recomputes the filled fragments of every plane. A failing plane is
    /// left empty; the run continues.
    pub fn rebuild_planes(&self, tolerance: PositiveLength) {
        for plane in &self.planes {
            let fragments = planes::build_fragments(self, plane, tolerance);
            plane.set_fragments(fragments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_copper_layer_order() {
        let model = BoardModel::new("test", 2);
        assert_eq!(
            model.copper_layers(),
            vec![
                Layer::TopCopper,
                Layer::InnerCopper(1),
                Layer::InnerCopper(2),
                Layer::BotCopper,
            ]
        );
    }

    #[test]
    fn test_air_wire_rebuild_drops_unknown_nets() {
        let mut model = BoardModel::new("test", 0);
        let known = Uuid::from_u128(1);
        model.project.circuit.net_signals.push(NetSignal {
            uuid: known,
            name: "GND".into(),
        });
        model.set_air_wires(vec![
            AirWire {
                net: Some(known),
                endpoint1: Uuid::from_u128(2),
                endpoint2: Uuid::from_u128(3),
                p1: Point::ORIGIN,
                p2: Point::from_nm(1000, 0),
            },
            AirWire {
                net: Some(Uuid::from_u128(99)),
                endpoint1: Uuid::from_u128(4),
                endpoint2: Uuid::from_u128(5),
                p1: Point::ORIGIN,
                p2: Point::from_nm(2000, 0),
            },
        ]);
        model.force_air_wires_rebuild();
        let wires = model.air_wires();
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].net, Some(known));
    }

    #[test]
    fn test_device_lookup_by_component() {
        use crate::board::objects::Footprint;
        use crate::geometry::Angle;
        let mut model = BoardModel::new("test", 0);
        let component = Uuid::from_u128(42);
        model.devices.push(Device {
            uuid: Uuid::from_u128(1),
            component,
            lib_device: Uuid::from_u128(2),
            position: Point::ORIGIN,
            rotation: Angle::ZERO,
            mirrored: false,
            footprint: Footprint::default(),
            stroke_texts: Vec::new(),
        });
        assert!(model.device_instance_by_component_uuid(component).is_some());
        assert!(model
            .device_instance_by_component_uuid(Uuid::from_u128(7))
            .is_none());
    }
}
