//! Fixed-point planar geometry
//!
//! # Submodules
//! - `types` - nanometre lengths, angles, points, ratios
//! - `path` - arc paths, flattening, outline stroking
//! - `boolean` - sweep-line boolean operations on integer rings
//! - `polygon` - polygon sets with holes
//! - `offset` - disc inflation/deflation
//! - `spatial` - R-tree pruning for pairwise checks

pub mod boolean;
pub mod offset;
pub mod path;
pub mod polygon;
pub mod spatial;
pub mod types;

pub use path::{Path, Transform, Vertex};
pub use polygon::{PolygonSet, Ring};
pub use types::{
    Angle, Length, Point, PositiveLength, Ratio, UnsignedLength, UnsignedLimitedRatio,
};
