//! Spatial indexing for pairwise clearance pruning
//!
//! Wraps item indices with integer bounding boxes in an R-tree so the
//! pairwise checks only visit candidate pairs whose inflated bounds touch.

use rstar::{RTree, RTreeObject, AABB};

/// An indexed item with an axis-aligned bounding box in nanometres
#[derive(Clone, Debug)]
pub struct BoundedItem {
    pub index: usize,
    pub bounds: [i64; 4],
}

impl BoundedItem {
    pub fn new(index: usize, bounds: [i64; 4]) -> Self {
        BoundedItem { index, bounds }
    }
}

impl RTreeObject for BoundedItem {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bounds[0], self.bounds[1]], [self.bounds[2], self.bounds[3]])
    }
}

/// Builds an R-tree over `(index, bounds)` items
pub fn build_index(items: impl IntoIterator<Item = (usize, [i64; 4])>) -> RTree<BoundedItem> {
    RTree::bulk_load(
        items
            .into_iter()
            .map(|(index, bounds)| BoundedItem::new(index, bounds))
            .collect(),
    )
}

/// Candidate partners with a larger index than `item`, in ascending order.
/// The ascending sort keeps message emission independent of tree layout.
pub fn candidates_after(tree: &RTree<BoundedItem>, item: &BoundedItem, margin: i64) -> Vec<usize> {
    let query = AABB::from_corners(
        [item.bounds[0] - margin, item.bounds[1] - margin],
        [item.bounds[2] + margin, item.bounds[3] + margin],
    );
    let mut out: Vec<usize> = tree
        .locate_in_envelope_intersecting(&query)
        .map(|other| other.index)
        .filter(|&i| i > item.index)
        .collect();
    out.sort_unstable();
    out
}
