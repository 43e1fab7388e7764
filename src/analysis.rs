//! One entry point per operation, plus [`Statistic`] which runs a whole
//! build → compute → report pipeline from a configuration value.

use serde::{Deserialize, Serialize};

use crate::config::{
    Contiguity, DistanceMethod, JoinCountConfig, NearestNeighborConfig, Normalization, SamplingAssumption,
    StudyArea, WeightsConfig,
};
use crate::error::Result;
use crate::feature::FeatureRecord;
use crate::geom::SpatialIndex;
use crate::graph::{build_contiguity, WeightsMatrix};
use crate::monitor::{Monitor, NullMonitor};
use crate::report::{JoinCountResult, NearestNeighborResult, Report};
use crate::stats::{self, Classification};

/// Build contiguity weights with the default tolerance and batch size.
pub fn build_weights(records: &[FeatureRecord], contiguity: Contiguity, normalization: Normalization)
    -> Result<WeightsMatrix>
{
    build_weights_with(records, &WeightsConfig::new(contiguity, normalization), &NullMonitor)
}

/// Build contiguity weights with explicit configuration and a progress monitor.
pub fn build_weights_with(records: &[FeatureRecord], config: &WeightsConfig, monitor: &dyn Monitor)
    -> Result<WeightsMatrix>
{
    config.validate()?;
    let index = SpatialIndex::build(records)?;
    build_contiguity(&index, config, monitor)
}

pub fn join_count(weights: &WeightsMatrix, classification: &Classification, sampling: SamplingAssumption)
    -> Result<JoinCountResult>
{
    stats::join_count(weights, classification, sampling)
}

pub fn nearest_neighbor_index(points: &[FeatureRecord], study_area: &StudyArea, distance_method: DistanceMethod)
    -> Result<NearestNeighborResult>
{
    stats::nearest_neighbor_index(points, study_area, distance_method, &NullMonitor)
}

/// A fully configured statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "statistic", rename_all = "snake_case")]
pub enum Statistic {
    JoinCount(JoinCountConfig),
    NearestNeighbor(NearestNeighborConfig),
}

impl Statistic {
    pub fn validate(&self) -> Result<()> {
        match self {
            Statistic::JoinCount(config) => config.validate(),
            Statistic::NearestNeighbor(config) => config.validate(),
        }
    }

    /// Run the statistic over `records`. Join Count takes its classes from the records.
    pub fn run(&self, records: &[FeatureRecord], monitor: &dyn Monitor) -> Result<Report> {
        self.validate()?;
        match self {
            Statistic::JoinCount(config) => {
                let weights = build_weights_with(records, &config.weights, monitor)?;
                let classification = Classification::from_records(records);
                stats::join_count(&weights, &classification, config.sampling).map(Report::JoinCount)
            }
            Statistic::NearestNeighbor(config) => {
                let index = SpatialIndex::build(records)?;
                stats::nearest_neighbor_index_with(&index, config, monitor).map(Report::NearestNeighbor)
            }
        }
    }
}
