use ahash::AHashMap;
use geo::Rect;
use rstar::{primitives::GeomWithData, RTree, AABB};

use crate::config::DistanceMethod;
use crate::error::{Error, Result};
use crate::feature::{FeatureId, FeatureRecord};
use crate::geom::{bbox::padded, BoundingBox};

type IndexedPoint = GeomWithData<[f64; 2], u32>;

/// Read-only spatial index over a set of feature records.
///
/// Records are held in id order; every index handed out by this type refers to
/// that order. Two R-trees are bulk loaded: one over feature envelopes for
/// candidate lookups, one over representative points for nearest-neighbor queries.
#[derive(Debug)]
pub struct SpatialIndex<'a> {
    records: Vec<&'a FeatureRecord>,
    lookup: AHashMap<&'a FeatureId, u32>,
    points: Vec<[f64; 2]>,
    envelope_tree: RTree<BoundingBox>,
    point_tree: RTree<IndexedPoint>,
}

impl<'a> SpatialIndex<'a> {
    /// Bulk load the index in O(n log n). Fails on duplicate ids.
    pub fn build(records: &'a [FeatureRecord]) -> Result<Self> {
        let mut sorted = records.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.id().cmp(b.id()));

        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(Error::DuplicateId(pair[0].id().clone()));
        }
        if sorted.len() > u32::MAX as usize {
            return Err(Error::config("too many records for a single index"));
        }

        let lookup = sorted.iter().enumerate()
            .map(|(i, record)| (record.id(), i as u32))
            .collect::<AHashMap<_, _>>();

        let points = sorted.iter()
            .map(|record| {
                let point = record.representative_point();
                [point.x(), point.y()]
            })
            .collect::<Vec<_>>();

        let (envelope_tree, point_tree) = rayon::join(
            || RTree::bulk_load(sorted.iter().enumerate()
                .map(|(i, record)| BoundingBox::new(i as u32, record.bbox()))
                .collect()),
            || RTree::bulk_load(points.iter().enumerate()
                .map(|(i, &point)| IndexedPoint::new(point, i as u32))
                .collect()),
        );

        tracing::debug!(records = sorted.len(), "built spatial index");

        Ok(Self { records: sorted, lookup, points, envelope_tree, point_tree })
    }

    /// Get the number of indexed records.
    #[inline] pub fn len(&self) -> usize { self.records.len() }

    /// Check if the index holds no records.
    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Records in id order.
    #[inline] pub fn records(&self) -> &[&'a FeatureRecord] { &self.records }

    #[inline] pub fn record(&self, idx: usize) -> &'a FeatureRecord { self.records[idx] }

    #[inline] pub fn id(&self, idx: usize) -> &'a FeatureId { self.records[idx].id() }

    /// Position of a feature in id order.
    #[inline]
    pub fn index_of(&self, id: &FeatureId) -> Option<usize> {
        self.lookup.get(id).map(|&i| i as usize)
    }

    /// Representative point (the point itself, or the centroid) of a record.
    #[inline] pub fn point(&self, idx: usize) -> [f64; 2] { self.points[idx] }

    /// Indices of records whose envelopes intersect `envelope`, in tree order.
    #[inline]
    pub(crate) fn candidates(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.envelope_tree.locate_in_envelope_intersecting(envelope).map(BoundingBox::idx)
    }

    /// Ids of records whose envelopes intersect `bbox`, in id order.
    pub fn query_candidates(&self, bbox: &Rect<f64>) -> Vec<FeatureId> {
        let mut hits = self.candidates(&padded(bbox, 0.0)).collect::<Vec<_>>();
        hits.sort_unstable();
        hits.into_iter().map(|i| self.id(i).clone()).collect()
    }

    /// The `k` records nearest to record `idx`, closest first, ties broken by id.
    ///
    /// Candidates arrive in Euclidean order; since no supported metric is shorter
    /// than the Euclidean one, the walk stops once that lower bound exceeds the
    /// current k-th best distance.
    pub(crate) fn nearest_to(&self, idx: usize, k: usize, exclude_self: bool, method: DistanceMethod) -> Vec<(usize, f64)> {
        let mut best: Vec<(usize, f64)> = Vec::with_capacity(k + 1);
        if k == 0 { return best }

        let query = self.points[idx];
        for entry in self.point_tree.nearest_neighbor_iter(&query) {
            let j = entry.data as usize;
            if exclude_self && j == idx { continue }
            let distance = method.distance(query, *entry.geom());
            if best.len() == k {
                // Euclidean distance bounds every method from below; the slack keeps
                // points at an equal distance in play for the id tie-break.
                let lower = match method {
                    DistanceMethod::Euclidean => distance,
                    _ => DistanceMethod::Euclidean.distance(query, *entry.geom()),
                };
                if lower > best[k - 1].1 * (1.0 + 4.0 * f64::EPSILON) { break }
            }

            let pos = best.partition_point(|&(i, d)| d < distance || (d == distance && i < j));
            if pos < k {
                best.insert(pos, (j, distance));
                best.truncate(k);
            }
        }
        best
    }

    /// The `k` features nearest to feature `id` under `method`.
    pub fn nearest(&self, id: &FeatureId, k: usize, exclude_self: bool, method: DistanceMethod)
        -> Result<Vec<(FeatureId, f64)>>
    {
        let idx = self.index_of(id).ok_or_else(|| Error::UnknownFeature(id.clone()))?;
        Ok(self.nearest_to(idx, k, exclude_self, method).into_iter()
            .map(|(j, distance)| (self.id(j).clone(), distance))
            .collect())
    }
}
