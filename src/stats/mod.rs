mod join_count;
mod nearest_neighbor;
pub(crate) mod normal;

pub use join_count::{join_count, Classification};
pub use nearest_neighbor::{nearest_neighbor_index, nearest_neighbor_index_with, STANDARD_ERROR_CONSTANT};
