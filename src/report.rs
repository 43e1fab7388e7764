//! Immutable reports returned by the pattern statistics.

use serde::Serialize;

use crate::config::{DistanceMethod, SamplingAssumption};

/// A numeric condition that prevents a meaningful z-score. Reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericDegeneracy {
    /// Variance is zero (or numerically indistinguishable from it).
    ZeroVariance,
    /// Every feature belongs to the same class.
    SingleClass,
    /// The weights matrix has no joins at all.
    NoJoins,
    /// The study area is empty or not finite.
    ZeroStudyArea,
}

/// One of the three join-count tests (BB, WW or BW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinStatistic {
    pub observed: f64,
    pub expected: f64,
    pub variance: f64,
    /// NaN when `degenerate`.
    pub z_score: f64,
    /// Two-sided, from the standard normal; NaN when `degenerate`.
    pub p_value: f64,
    pub degenerate: bool,
    pub degeneracy: Option<NumericDegeneracy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinCountResult {
    pub bb: JoinStatistic,
    pub ww: JoinStatistic,
    pub bw: JoinStatistic,
    pub sampling: SamplingAssumption,
    pub n: usize,
    pub n_black: usize,
    pub n_white: usize,
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    /// First degeneracy found among BB, WW, BW, in that order.
    pub degeneracy: Option<NumericDegeneracy>,
}

impl JoinCountResult {
    /// True if any of the three statistics is degenerate.
    pub fn is_degenerate(&self) -> bool { self.degeneracy.is_some() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestNeighborResult {
    pub observed_mean_distance: f64,
    pub expected_mean_distance: f64,
    /// Observed over expected mean distance; below 1 suggests clustering.
    pub ratio: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub standard_error: f64,
    pub n: usize,
    /// Area of the study region.
    pub study_area: f64,
    pub distance_method: DistanceMethod,
    /// Some point shares its location with another (nearest distance 0).
    pub has_coincident_points: bool,
    pub degeneracy: Option<NumericDegeneracy>,
}

impl NearestNeighborResult {
    pub fn is_degenerate(&self) -> bool { self.degeneracy.is_some() }
}

/// The output of any statistic run through [`crate::Statistic`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "statistic", rename_all = "snake_case")]
pub enum Report {
    JoinCount(JoinCountResult),
    NearestNeighbor(NearestNeighborResult),
}

impl Report {
    /// Serialize as JSON; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_degenerate(&self) -> bool {
        match self {
            Report::JoinCount(result) => result.is_degenerate(),
            Report::NearestNeighbor(result) => result.is_degenerate(),
        }
    }
}
