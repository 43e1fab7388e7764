mod contiguity;
mod weights;

pub use contiguity::build_contiguity;
pub use weights::{AdjacencyEdge, WeightsMatrix};
