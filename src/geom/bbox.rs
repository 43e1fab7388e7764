use geo::Rect;
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a feature by its id-order index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: u32, // Index of the feature in id order
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: u32, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the id-order index of the corresponding feature.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx as usize }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Envelope of `rect` grown by `pad` on every side.
#[inline]
pub(crate) fn padded(rect: &Rect<f64>, pad: f64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [rect.min().x - pad, rect.min().y - pad],
        [rect.max().x + pad, rect.max().y + pad],
    )
}
