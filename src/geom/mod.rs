mod bbox;
mod index;
mod segments;

pub(crate) use bbox::{padded, BoundingBox};
pub use index::SpatialIndex;
pub(crate) use segments::{self_intersects, shared_boundary_length};
