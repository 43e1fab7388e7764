use geo::Area;

use crate::config::{DistanceMethod, NearestNeighborConfig, StudyArea};
use crate::error::{Error, Result};
use crate::feature::FeatureRecord;
use crate::geom::SpatialIndex;
use crate::monitor::{Monitor, MonitorSession};
use crate::report::{NearestNeighborResult, NumericDegeneracy};
use crate::stats::normal::two_sided_p_value;

/// Standard error constant of the Clark-Evans test under complete spatial randomness.
pub const STANDARD_ERROR_CONSTANT: f64 = 0.26136;

/// Area of the study region; `Envelope` uses the bounding rectangle of the points.
fn study_area_size(study_area: &StudyArea, index: &SpatialIndex<'_>) -> f64 {
    match study_area {
        StudyArea::Polygon(polygon) => polygon.unsigned_area(),
        StudyArea::Extent(rect) => rect.width() * rect.height(),
        StudyArea::Envelope => {
            let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
            for [x, y] in (0..index.len()).map(|i| index.point(i)) {
                min = [min[0].min(x), min[1].min(y)];
                max = [max[0].max(x), max[1].max(y)];
            }
            (max[0] - min[0]) * (max[1] - min[1])
        }
    }
}

/// Nearest Neighbor Index over records that are already indexed.
pub fn nearest_neighbor_index_with(index: &SpatialIndex<'_>, config: &NearestNeighborConfig, monitor: &dyn Monitor)
    -> Result<NearestNeighborResult>
{
    config.validate()?;
    let n = index.len();
    if n < 2 {
        return Err(Error::InsufficientData { required: 2, found: n });
    }

    let _span = tracing::info_span!("nearest_neighbor_index", n, method = ?config.distance_method).entered();
    let session = MonitorSession::start(monitor);
    let method = config.distance_method;

    let distances = session.run_batched(n, config.batch_size, 0, n, |i| {
        index.nearest_to(i, 1, true, method).first().map_or(f64::NAN, |&(_, d)| d)
    })?;

    let observed = distances.iter().sum::<f64>() / n as f64;
    let has_coincident_points = distances.iter().any(|&d| d == 0.0);
    if has_coincident_points {
        tracing::warn!("coincident points found; nearest distance of zero included in the mean");
    }

    let area = study_area_size(&config.study_area, index);
    let result = if !area.is_finite() || area <= 0.0 {
        tracing::warn!(area, "study area is empty; index is undefined");
        NearestNeighborResult {
            observed_mean_distance: observed,
            expected_mean_distance: f64::NAN,
            ratio: f64::NAN,
            z_score: f64::NAN,
            p_value: f64::NAN,
            standard_error: f64::NAN,
            n,
            study_area: area,
            distance_method: method,
            has_coincident_points,
            degeneracy: Some(NumericDegeneracy::ZeroStudyArea),
        }
    } else {
        let density = n as f64 / area;
        let expected = 0.5 / density.sqrt();
        let standard_error = STANDARD_ERROR_CONSTANT / (n as f64 * density).sqrt();
        let z_score = (observed - expected) / standard_error;
        NearestNeighborResult {
            observed_mean_distance: observed,
            expected_mean_distance: expected,
            ratio: observed / expected,
            z_score,
            p_value: two_sided_p_value(z_score),
            standard_error,
            n,
            study_area: area,
            distance_method: method,
            has_coincident_points,
            degeneracy: None,
        }
    };

    tracing::debug!(observed, ratio = result.ratio, z = result.z_score, "nearest neighbor index computed");
    session.complete();
    Ok(result)
}

/// Nearest Neighbor Index of a point set (non-point features use their centroid).
pub fn nearest_neighbor_index(records: &[FeatureRecord], study_area: &StudyArea,
    distance_method: DistanceMethod, monitor: &dyn Monitor,
) -> Result<NearestNeighborResult> {
    let config = NearestNeighborConfig::new(study_area.clone(), distance_method);
    config.validate()?;
    if records.len() < 2 {
        return Err(Error::InsufficientData { required: 2, found: records.len() });
    }
    let index = SpatialIndex::build(records)?;
    nearest_neighbor_index_with(&index, &config, monitor)
}
