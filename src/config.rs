//! Configuration for weights construction and pattern statistics.
//!
//! Every option has a sensible default; `validate()` rejects bad values before
//! any computation starts.

use std::str::FromStr;

use geo::{MultiPolygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which contacts make two features neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contiguity {
    /// Any shared point (edge or vertex).
    #[default]
    Queen,
    /// Only boundaries shared along a positive length.
    Rook,
}

/// How neighbor weights are scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Every neighbor weighs exactly 1.0.
    #[default]
    Binary,
    /// Each non-empty row sums to 1.0.
    #[serde(alias = "row", alias = "row_standardized")]
    RowStandardized,
}

/// Null-hypothesis sampling model for the Join Count statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingAssumption {
    /// Labels drawn independently with replacement (binomial).
    Free,
    /// Class counts fixed; labels permuted without replacement.
    #[default]
    #[serde(alias = "non_free", alias = "non-free")]
    NonFree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMethod {
    #[default]
    Euclidean,
    Manhattan,
}

impl DistanceMethod {
    #[inline]
    pub fn distance(self, a: [f64; 2], b: [f64; 2]) -> f64 {
        let (dx, dy) = (a[0] - b[0], a[1] - b[1]);
        match self {
            DistanceMethod::Euclidean => dx.hypot(dy),
            DistanceMethod::Manhattan => dx.abs() + dy.abs(),
        }
    }
}

fn normalized(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

impl FromStr for Contiguity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalized(s).as_str() {
            "queen" => Ok(Self::Queen),
            "rook" => Ok(Self::Rook),
            _ => Err(Error::config(format!("unknown contiguity type {s:?}"))),
        }
    }
}

impl FromStr for Normalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalized(s).as_str() {
            "binary" => Ok(Self::Binary),
            "row" | "rowstandardized" | "row_standardized" => Ok(Self::RowStandardized),
            _ => Err(Error::config(format!("unknown normalization {s:?}"))),
        }
    }
}

impl FromStr for SamplingAssumption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalized(s).as_str() {
            "free" => Ok(Self::Free),
            "nonfree" | "non_free" => Ok(Self::NonFree),
            _ => Err(Error::config(format!("unknown sampling assumption {s:?}"))),
        }
    }
}

impl FromStr for DistanceMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalized(s).as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "manhattan" => Ok(Self::Manhattan),
            _ => Err(Error::config(format!("unknown distance method {s:?}"))),
        }
    }
}

/// Default number of records processed between cancellation polls.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Default envelope padding used when looking up contiguity candidates.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Parameters of the contiguity builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub contiguity: Contiguity,
    pub normalization: Normalization,
    /// Padding applied to envelopes before the candidate query.
    pub tolerance: f64,
    pub batch_size: usize,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            contiguity: Contiguity::default(),
            normalization: Normalization::default(),
            tolerance: DEFAULT_TOLERANCE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl WeightsConfig {
    pub fn new(contiguity: Contiguity, normalization: Normalization) -> Self {
        Self { contiguity, normalization, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::config(format!("tolerance must be positive, got {}", self.tolerance)));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinCountConfig {
    pub weights: WeightsConfig,
    pub sampling: SamplingAssumption,
}

impl JoinCountConfig {
    pub fn validate(&self) -> Result<()> { self.weights.validate() }
}

/// The region against which point density is measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyArea {
    /// Explicit study-area polygon.
    Polygon(MultiPolygon<f64>),
    /// Caller-supplied bounding extent.
    Extent(Rect<f64>),
    /// Bounding rectangle of the input points.
    #[default]
    Envelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearestNeighborConfig {
    pub study_area: StudyArea,
    pub distance_method: DistanceMethod,
    pub batch_size: usize,
}

impl Default for NearestNeighborConfig {
    fn default() -> Self {
        Self {
            study_area: StudyArea::default(),
            distance_method: DistanceMethod::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl NearestNeighborConfig {
    pub fn new(study_area: StudyArea, distance_method: DistanceMethod) -> Self {
        Self { study_area, distance_method, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Queen".parse::<Contiguity>().unwrap(), Contiguity::Queen);
        assert_eq!(" rook ".parse::<Contiguity>().unwrap(), Contiguity::Rook);
        assert_eq!("row-standardized".parse::<Normalization>().unwrap(), Normalization::RowStandardized);
        assert_eq!("NON_FREE".parse::<SamplingAssumption>().unwrap(), SamplingAssumption::NonFree);
        assert_eq!("manhattan".parse::<DistanceMethod>().unwrap(), DistanceMethod::Manhattan);
    }

    #[test]
    fn unknown_contiguity_is_a_configuration_error() {
        assert!(matches!("bishop".parse::<Contiguity>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let mut config = WeightsConfig::default();
        assert!(config.validate().is_ok());

        config.tolerance = 0.0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        config.tolerance = -1.0;
        assert!(config.validate().is_err());
        config.tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: WeightsConfig = serde_json::from_str(r#"{ "contiguity": "rook" }"#).unwrap();
        assert_eq!(config.contiguity, Contiguity::Rook);
        assert_eq!(config.normalization, Normalization::Binary);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn distances() {
        assert_eq!(DistanceMethod::Euclidean.distance([0.0, 0.0], [3.0, 4.0]), 5.0);
        assert_eq!(DistanceMethod::Manhattan.distance([0.0, 0.0], [3.0, -4.0]), 7.0);
    }
}
