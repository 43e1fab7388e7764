use ahash::AHashMap;

use crate::config::SamplingAssumption;
use crate::error::{Error, Result};
use crate::feature::{Class, FeatureId, FeatureRecord};
use crate::graph::WeightsMatrix;
use crate::report::{JoinCountResult, JoinStatistic, NumericDegeneracy};
use crate::stats::normal::two_sided_p_value;

/// Variances at or below this are treated as zero.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Binary class labels keyed by feature id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    classes: AHashMap<FeatureId, Class>,
}

impl Classification {
    pub fn new() -> Self { Self::default() }

    /// Collect the labels carried by the records; unlabeled records are skipped.
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        records.iter()
            .filter_map(|record| Some((record.id().clone(), record.classification()?)))
            .collect()
    }

    pub fn insert(&mut self, id: impl Into<FeatureId>, class: Class) -> Option<Class> {
        self.classes.insert(id.into(), class)
    }

    #[inline] pub fn get(&self, id: &FeatureId) -> Option<Class> { self.classes.get(id).copied() }

    #[inline] pub fn len(&self) -> usize { self.classes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.classes.is_empty() }
}

impl FromIterator<(FeatureId, Class)> for Classification {
    fn from_iter<I: IntoIterator<Item = (FeatureId, Class)>>(iter: I) -> Self {
        Self { classes: iter.into_iter().collect() }
    }
}

/// Weight-structure sums and observed join counts, accumulated in row order.
#[derive(Debug, Default)]
struct Reductions {
    s0: f64,
    s1: f64,
    s2: f64,
    bb: f64,
    ww: f64,
    bw: f64,
}

impl Reductions {
    fn compute(weights: &WeightsMatrix, black: &[bool]) -> Self {
        let n = weights.len();
        let mut col_sums = vec![0.0; n];
        let mut sums = Reductions::default();

        for i in 0..n {
            for (j, w_ij) in weights.neighbors_with_weights(i) {
                let w_ji = weights.weight(j, i);
                sums.s0 += w_ij;
                sums.s1 += (w_ij + w_ji).powi(2);
                col_sums[j] += w_ij;

                match (black[i], black[j]) {
                    (true, true) => sums.bb += w_ij,
                    (false, false) => sums.ww += w_ij,
                    _ => sums.bw += w_ij,
                }
            }
        }

        sums.s1 *= 0.5;
        sums.s2 = (0..n).map(|i| (weights.row_sum(i) + col_sums[i]).powi(2)).sum();

        // Every unordered pair was visited from both ends.
        sums.bb *= 0.5;
        sums.ww *= 0.5;
        sums.bw *= 0.5;
        sums
    }
}

/// Falling factorial `x (x-1) ... (x-k+1)`.
fn falling(x: usize, k: usize) -> f64 {
    (0..k).map(|i| x as f64 - i as f64).product()
}

/// `num^(k) / den^(k)`, zero whenever the numerator vanishes.
fn falling_ratio(num: usize, den: usize, k: usize) -> f64 {
    if num < k { 0.0 } else { falling(num, k) / falling(den, k) }
}

/// Expected value and variance of a same-class count (BB or WW).
fn same_class_moments(sums: &Reductions, count: usize, n: usize, sampling: SamplingAssumption) -> (f64, f64) {
    let Reductions { s0, s1, s2, .. } = *sums;
    match sampling {
        SamplingAssumption::Free => {
            let p = count as f64 / n as f64;
            let expected = 0.5 * s0 * p.powi(2);
            let variance = 0.25 * (s1 * p.powi(2) + (s2 - 2.0 * s1) * p.powi(3) + (s1 - s2) * p.powi(4));
            (expected, variance)
        }
        SamplingAssumption::NonFree => {
            let (p2, p3, p4) = (falling_ratio(count, n, 2), falling_ratio(count, n, 3), falling_ratio(count, n, 4));
            let expected = 0.5 * s0 * p2;
            let variance = 0.25 * (s1 * p2 + (s2 - 2.0 * s1) * p3 + (s0 * s0 + s1 - s2) * p4) - expected.powi(2);
            (expected, variance)
        }
    }
}

/// Expected value and variance of the BW count.
fn cross_class_moments(sums: &Reductions, n_black: usize, n_white: usize, sampling: SamplingAssumption) -> (f64, f64) {
    let Reductions { s0, s1, s2, .. } = *sums;
    let n = n_black + n_white;
    match sampling {
        SamplingAssumption::Free => {
            let p = n_black as f64 / n as f64;
            let q = 1.0 - p;
            let expected = s0 * p * q;
            let variance = 0.25 * (s2 * p * q - 4.0 * (s2 - s1) * (p * q).powi(2));
            (expected, variance)
        }
        SamplingAssumption::NonFree => {
            let r = n_black as f64 * n_white as f64 / falling(n, 2);
            let t4 = if n_black < 2 || n_white < 2 {
                0.0
            } else {
                4.0 * falling(n_black, 2) * falling(n_white, 2) / falling(n, 4)
            };
            let expected = s0 * r;
            let variance = 0.25 * (s2 * r + (s0 * s0 + s1 - s2) * t4) - expected.powi(2);
            (expected, variance)
        }
    }
}

fn statistic(observed: f64, expected: f64, variance: f64, flag: Option<NumericDegeneracy>) -> JoinStatistic {
    let flag = flag.or_else(|| {
        (!variance.is_finite() || variance <= VARIANCE_EPSILON).then_some(NumericDegeneracy::ZeroVariance)
    });

    let (z_score, p_value) = match flag {
        Some(_) => (f64::NAN, f64::NAN),
        None => {
            let z = (observed - expected) / variance.sqrt();
            (z, two_sided_p_value(z))
        }
    };

    JoinStatistic { observed, expected, variance, z_score, p_value, degenerate: flag.is_some(), degeneracy: flag }
}

/// Compute the BB, WW and BW join-count statistics over a weights matrix.
///
/// Every row of `weights` must have a class in `classification`.
pub fn join_count(weights: &WeightsMatrix, classification: &Classification, sampling: SamplingAssumption)
    -> Result<JoinCountResult>
{
    let n = weights.len();
    if n < 2 {
        return Err(Error::InsufficientData { required: 2, found: n });
    }

    let black = weights.ids().iter()
        .map(|id| classification.get(id)
            .map(Class::is_black)
            .ok_or_else(|| Error::config(format!("feature {id} has no classification"))))
        .collect::<Result<Vec<_>>>()?;

    let n_black = black.iter().filter(|&&b| b).count();
    let n_white = n - n_black;
    let sums = Reductions::compute(weights, &black);

    let shared_flag = if n_black == 0 || n_white == 0 {
        Some(NumericDegeneracy::SingleClass)
    } else if sums.s0 == 0.0 {
        Some(NumericDegeneracy::NoJoins)
    } else {
        None
    };

    let (e_bb, var_bb) = same_class_moments(&sums, n_black, n, sampling);
    let (e_ww, var_ww) = same_class_moments(&sums, n_white, n, sampling);
    let (e_bw, var_bw) = cross_class_moments(&sums, n_black, n_white, sampling);

    let bb = statistic(sums.bb, e_bb, var_bb, shared_flag);
    let ww = statistic(sums.ww, e_ww, var_ww, shared_flag);
    let bw = statistic(sums.bw, e_bw, var_bw, shared_flag);
    let degeneracy = bb.degeneracy.or(ww.degeneracy).or(bw.degeneracy);

    if let Some(flag) = degeneracy {
        tracing::warn!(?flag, n, n_black, "join count statistic is degenerate");
    }
    tracing::debug!(n, n_black, s0 = sums.s0, bb = sums.bb, ww = sums.ww, bw = sums.bw, z_bw = bw.z_score, "join count computed");

    Ok(JoinCountResult {
        bb,
        ww,
        bw,
        sampling,
        n,
        n_black,
        n_white,
        s0: sums.s0,
        s1: sums.s1,
        s2: sums.s2,
        degeneracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Normalization;
    use crate::config::Contiguity;
    use crate::graph::AdjacencyEdge;
    use approx::assert_abs_diff_eq;

    /// Four cells in a row, classed B, W, B, W.
    fn alternating_row() -> (WeightsMatrix, Classification) {
        let ids = (0..4).map(FeatureId::Int).collect::<Vec<_>>();
        let edges = vec![AdjacencyEdge::new(0, 1, 1.0), AdjacencyEdge::new(1, 2, 1.0), AdjacencyEdge::new(2, 3, 1.0)];
        let weights = WeightsMatrix::from_edges(ids, edges, Contiguity::Rook, Normalization::Binary).unwrap();
        let classes = (0..4).map(|i| (FeatureId::Int(i), Class::from(i % 2 == 0))).collect();
        (weights, classes)
    }

    #[test]
    fn weight_sums_and_observed_counts() {
        let (weights, classes) = alternating_row();
        let result = join_count(&weights, &classes, SamplingAssumption::Free).unwrap();

        assert_eq!((result.s0, result.s1, result.s2), (6.0, 12.0, 40.0));
        assert_eq!((result.bb.observed, result.ww.observed, result.bw.observed), (0.0, 0.0, 3.0));
        assert_eq!((result.n_black, result.n_white), (2, 2));
        assert!(!result.is_degenerate());
    }

    #[test]
    fn free_sampling_moments() {
        let (weights, classes) = alternating_row();
        let result = join_count(&weights, &classes, SamplingAssumption::Free).unwrap();

        assert_abs_diff_eq!(result.bw.expected, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bw.variance, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bw.z_score, 3f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(result.bb.expected, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bb.variance, 0.8125, epsilon = 1e-12);
        assert_eq!(result.bb, JoinStatistic { observed: 0.0, ..result.ww });
    }

    #[test]
    fn non_free_sampling_moments() {
        let (weights, classes) = alternating_row();
        let result = join_count(&weights, &classes, SamplingAssumption::NonFree).unwrap();

        assert_abs_diff_eq!(result.bw.expected, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bw.variance, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bb.expected, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bb.variance, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(result.bb.z_score, -1.0, epsilon = 1e-12);
        assert!(result.bw.p_value > 0.0 && result.bw.p_value < 1.0);
    }

    #[test]
    fn single_class_is_flagged_not_raised() {
        let (weights, _) = alternating_row();
        let classes = (0..4).map(|i| (FeatureId::Int(i), Class::Black)).collect();
        let result = join_count(&weights, &classes, SamplingAssumption::NonFree).unwrap();

        assert_eq!(result.degeneracy, Some(NumericDegeneracy::SingleClass));
        for stat in [result.bb, result.ww, result.bw] {
            assert!(stat.degenerate);
            assert!(stat.z_score.is_nan() && stat.p_value.is_nan());
        }
        assert_eq!(result.bb.observed, 3.0);
    }

    #[test]
    fn no_joins_is_flagged() {
        let ids = (0..3).map(FeatureId::Int).collect::<Vec<_>>();
        let weights = WeightsMatrix::from_edges(ids, vec![], Contiguity::Queen, Normalization::Binary).unwrap();
        let classes = (0..3).map(|i| (FeatureId::Int(i), Class::from(i == 0))).collect();
        let result = join_count(&weights, &classes, SamplingAssumption::Free).unwrap();
        assert_eq!(result.degeneracy, Some(NumericDegeneracy::NoJoins));
    }

    #[test]
    fn missing_class_and_tiny_inputs_are_errors() {
        let (weights, mut classes) = alternating_row();
        classes.classes.remove(&FeatureId::Int(2));
        assert!(matches!(join_count(&weights, &classes, SamplingAssumption::Free), Err(Error::Configuration(_))));

        let single = WeightsMatrix::from_edges(vec![FeatureId::Int(0)], vec![], Contiguity::Queen, Normalization::Binary).unwrap();
        let classes = Classification::from_iter([(FeatureId::Int(0), Class::Black)]);
        assert!(matches!(
            join_count(&single, &classes, SamplingAssumption::Free),
            Err(Error::InsufficientData { required: 2, found: 1 })
        ));
    }

    #[test]
    fn falling_ratio_vanishes_below_order() {
        assert_eq!(falling_ratio(1, 4, 2), 0.0);
        assert_eq!(falling_ratio(2, 3, 4), 0.0);
        assert_abs_diff_eq!(falling_ratio(3, 5, 2), 6.0 / 20.0, epsilon = 1e-15);
    }
}
