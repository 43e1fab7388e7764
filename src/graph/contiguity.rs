use geo::algorithm::coordinate_position::CoordPos;
use geo::algorithm::dimensions::Dimensions;
use geo::{Rect, Relate};
use rstar::AABB;
use smallvec::SmallVec;

use crate::config::{Contiguity, WeightsConfig};
use crate::error::{GeometryError, Result};
use crate::geom::{padded, self_intersects, shared_boundary_length, SpatialIndex};
use crate::graph::{AdjacencyEdge, WeightsMatrix};
use crate::monitor::{Monitor, MonitorSession};

/// Outcome of relating a record to one of its envelope candidates.
#[derive(Debug, Clone, Copy)]
enum Contact {
    Neighbor(AdjacencyEdge),
    /// Interiors intersect: overlapping features are never neighbors.
    Overlap(u32, u32),
}

/// Overlap of two envelopes, grown by `pad`.
fn overlap_window(a: &Rect<f64>, b: &Rect<f64>, pad: f64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [a.min().x.max(b.min().x) - pad, a.min().y.max(b.min().y) - pad],
        [a.max().x.min(b.max().x) + pad, a.max().y.min(b.max().y) + pad],
    )
}

/// Relate record `i` to every candidate with a larger index, so each unordered
/// pair is evaluated once and self-pairs never are.
fn contacts(index: &SpatialIndex<'_>, config: &WeightsConfig, i: usize) -> SmallVec<[Contact; 8]> {
    let record = index.record(i);
    let mut candidates = index.candidates(&padded(&record.bbox(), config.tolerance))
        .filter(|&j| j > i)
        .collect::<SmallVec<[usize; 16]>>();
    candidates.sort_unstable();

    candidates.into_iter()
        .filter_map(|j| {
            let other = index.record(j);
            let im = record.geometry().relate(other.geometry());
            if !im.is_intersects() { return None }
            if !im.is_touches() { return Some(Contact::Overlap(i as u32, j as u32)) }

            // Rook: the boundaries meet along a line.
            let shares_edge = im.get(CoordPos::OnBoundary, CoordPos::OnBoundary) == Dimensions::OneDimensional;
            if config.contiguity == Contiguity::Rook && !shares_edge { return None }

            let length = if shares_edge {
                let window = overlap_window(&record.bbox(), &other.bbox(), config.tolerance);
                shared_boundary_length(record.geometry(), other.geometry(), &window)
            } else {
                0.0
            };
            Some(Contact::Neighbor(AdjacencyEdge::new(i as u32, j as u32, length)))
        })
        .collect()
}

/// Build a Queen or Rook weights matrix from the records of `index`.
///
/// Candidates come from the envelope R-tree and are confirmed with exact DE-9IM
/// predicates, batch by batch in parallel. Fails with
/// `GeometryError::SelfIntersecting` on invalid polygon rings (the first in id
/// order) and with `Error::Cancelled` if the monitor asks to stop.
pub fn build_contiguity(index: &SpatialIndex<'_>, config: &WeightsConfig, monitor: &dyn Monitor) -> Result<WeightsMatrix> {
    config.validate()?;
    let _span = tracing::info_span!("build_contiguity",
        contiguity = ?config.contiguity, normalization = ?config.normalization, records = index.len()
    ).entered();

    let session = MonitorSession::start(monitor);
    let n = index.len();

    let invalid = session.run_batched(n, config.batch_size, 0, 2 * n, |i| {
        let record = index.record(i);
        record.is_polygonal() && self_intersects(record.geometry())
    })?;
    if let Some(i) = invalid.iter().position(|&bad| bad) {
        return Err(GeometryError::SelfIntersecting { id: index.id(i).clone() }.into());
    }

    let mut edges = Vec::new();
    let mut overlaps = Vec::new();
    for contact in session.run_batched(n, config.batch_size, n, 2 * n, |i| contacts(index, config, i))?.into_iter().flatten() {
        match contact {
            Contact::Neighbor(edge) => edges.push(edge),
            Contact::Overlap(a, b) => overlaps.push((a, b)),
        }
    }

    if let Some(&(a, b)) = overlaps.first() {
        tracing::warn!(
            count = overlaps.len(),
            first = %format_args!("{} / {}", index.id(a as usize), index.id(b as usize)),
            "overlapping features excluded from contiguity"
        );
    }

    let ids = index.records().iter().map(|record| record.id().clone()).collect();
    let matrix = WeightsMatrix::from_edges(ids, edges, config.contiguity, config.normalization)?;

    tracing::debug!(
        edges = matrix.edge_count(),
        isolated = matrix.isolated().count(),
        "computed contiguity"
    );

    session.complete();
    Ok(matrix)
}
