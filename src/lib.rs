#![doc = "geopattern: contiguity weights and spatial pattern statistics (Join Count, Nearest Neighbor Index)"]
mod analysis;
mod config;
mod error;
mod feature;
mod geom;
mod graph;
mod monitor;
mod report;
mod stats;

#[doc(inline)]
pub use analysis::{build_weights, build_weights_with, join_count, nearest_neighbor_index, Statistic};

#[doc(inline)]
pub use config::{
    Contiguity, DistanceMethod, JoinCountConfig, NearestNeighborConfig, Normalization, SamplingAssumption,
    StudyArea, WeightsConfig, DEFAULT_BATCH_SIZE, DEFAULT_TOLERANCE,
};

#[doc(inline)]
pub use error::{Error, GeometryError, Result};

#[doc(inline)]
pub use feature::{
    ingest, AttributeValue, Attributes, Class, ClassSelector, FeatureId, FeatureRecord, IngestOptions, SourceFeature,
};

#[doc(inline)]
pub use geom::SpatialIndex;

#[doc(inline)]
pub use graph::{build_contiguity, AdjacencyEdge, WeightsMatrix};

#[doc(inline)]
pub use monitor::{CancellationToken, Monitor, NullMonitor};

#[doc(inline)]
pub use report::{JoinCountResult, JoinStatistic, NearestNeighborResult, NumericDegeneracy, Report};

#[doc(inline)]
pub use stats::{nearest_neighbor_index_with, Classification, STANDARD_ERROR_CONSTANT};
