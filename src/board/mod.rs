//! Board data model
//!
//! # Submodules
//! - `layer` - layer and stackup enumeration
//! - `objects` - board items (copper, graphics, holes, devices)
//! - `model` - the `BoardModel` aggregate and project/circuit view
//! - `planes` - plane fragment building

pub mod layer;
pub mod model;
pub mod objects;
pub mod planes;

pub use layer::Layer;
pub use model::{BoardModel, Circuit, ComponentInstance, NetSignal, Project};
pub use objects::{
    AirWire, BoardPolygon, Circle, Device, Footprint, FootprintPad, Hole, NetLine, NetLineAnchor,
    NetPoint, NetSegment, PadGeometry, PadHole, Plane, StrokeText, Via,
};
