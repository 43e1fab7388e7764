use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{BoundingRect, Geometry, Intersects, Line, LineString, MultiPolygon, Polygon, Relate};
use rstar::{primitives::GeomWithData, Envelope, RTree, RTreeObject, AABB};

/// A boundary segment tagged with its position along the boundary.
type IndexedSegment = GeomWithData<Line<f64>, usize>;

#[inline]
fn length(line: &Line<f64>) -> f64 { line.dx().hypot(line.dy()) }

#[inline]
fn segment_box(line: &Line<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(line.start.into(), line.end.into())
}

fn polygon_rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// All non-degenerate boundary segments of a geometry (polygon rings, or the lines themselves).
pub(crate) fn boundary_segments(geometry: &Geometry<f64>) -> Vec<Line<f64>> {
    let mut segments = Vec::new();
    let mut push_ring = |ring: &LineString<f64>| {
        segments.extend(ring.lines().filter(|line| line.start != line.end));
    };

    match geometry {
        Geometry::Polygon(polygon) => polygon_rings(polygon).for_each(&mut push_ring),
        Geometry::MultiPolygon(polygons) => polygons.iter()
            .flat_map(polygon_rings)
            .for_each(&mut push_ring),
        Geometry::Rect(rect) => polygon_rings(&rect.to_polygon()).for_each(&mut push_ring),
        Geometry::Triangle(triangle) => polygon_rings(&triangle.to_polygon()).for_each(&mut push_ring),
        Geometry::LineString(line) => push_ring(line),
        Geometry::MultiLineString(lines) => lines.iter().for_each(&mut push_ring),
        Geometry::Line(line) => push_ring(&LineString::from(*line)),
        _ => {}
    }
    segments
}

/// Length of boundary shared by `a` and `b`, summed over collinear segment overlaps.
/// Only segments touching `window` (normally the overlap of both envelopes) are considered.
pub(crate) fn shared_boundary_length(a: &Geometry<f64>, b: &Geometry<f64>, window: &AABB<[f64; 2]>) -> f64 {
    let in_window = |line: &Line<f64>| window.intersects(&segment_box(line));

    let tree = RTree::bulk_load(boundary_segments(b).into_iter()
        .filter(in_window)
        .enumerate()
        .map(|(i, line)| IndexedSegment::new(line, i))
        .collect());
    if tree.size() == 0 { return 0.0 }

    boundary_segments(a).iter()
        .filter(|line| in_window(*line))
        .map(|line| tree.locate_in_envelope_intersecting(&line.envelope())
            .filter_map(|other| match line_intersection(*line, *other.geom()) {
                Some(LineIntersection::Collinear { intersection }) => Some(length(&intersection)),
                _ => None,
            })
            .sum::<f64>())
        .sum()
}

/// A ring segment tagged with `(ring, position)` within its polygon.
type RingSegment = GeomWithData<Line<f64>, (usize, usize)>;

/// True if the rings of one polygon cross or overlap.
///
/// Consecutive segments of a ring may share only their common vertex. Segments
/// of different rings may touch at isolated points but never cross or share a
/// stretch of boundary.
fn rings_intersect(rings: &[&LineString<f64>]) -> bool {
    let mut segments = Vec::new();
    let mut ring_lengths = Vec::with_capacity(rings.len());
    for (r, ring) in rings.iter().enumerate() {
        let before = segments.len();
        segments.extend(ring.lines()
            .filter(|line| line.start != line.end)
            .enumerate()
            .map(|(i, line)| RingSegment::new(line, (r, i))));
        ring_lengths.push(segments.len() - before);
    }
    if segments.len() < 2 { return false }

    let tree = RTree::bulk_load(segments.clone());

    segments.iter().any(|segment| {
        let (ring, i) = segment.data;
        tree.locate_in_envelope_intersecting(&segment.envelope()).any(|other| {
            if other.data <= segment.data { return false }
            let (other_ring, j) = other.data;
            let intersection = line_intersection(*segment.geom(), *other.geom());

            if other_ring != ring {
                return match intersection {
                    None => false,
                    Some(LineIntersection::Collinear { intersection }) => length(&intersection) > 0.0,
                    Some(LineIntersection::SinglePoint { is_proper, .. }) => is_proper,
                };
            }

            let n = ring_lengths[ring];
            let consecutive = j == i + 1 || (i == 0 && j == n - 1);
            match intersection {
                None => false,
                Some(LineIntersection::Collinear { intersection }) => !consecutive || length(&intersection) > 0.0,
                Some(LineIntersection::SinglePoint { .. }) => !consecutive,
            }
        })
    })
}

/// True if some hole vertex lies outside the shell.
fn hole_outside_shell(polygon: &Polygon<f64>) -> bool {
    if polygon.interiors().is_empty() { return false }
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    polygon.interiors().iter().any(|hole| hole.coords().any(|c| !shell.intersects(c)))
}

fn polygon_is_invalid(polygon: &Polygon<f64>) -> bool {
    rings_intersect(&polygon_rings(polygon).collect::<Vec<_>>()) || hole_outside_shell(polygon)
}

/// True if the interiors of two parts intersect. Parts may touch.
fn parts_overlap(parts: &MultiPolygon<f64>) -> bool {
    let boxes = parts.iter().map(|part| part.bounding_rect()).collect::<Vec<_>>();
    (0..parts.0.len()).any(|i| (i + 1..parts.0.len()).any(|j| {
        let near = boxes[i].zip(boxes[j]).is_some_and(|(a, b)| a.intersects(&b));
        near && {
            let im = parts.0[i].relate(&parts.0[j]);
            im.is_intersects() && !im.is_touches()
        }
    }))
}

/// True if the geometry is an invalid polygon: a ring crosses itself or another
/// ring, a hole leaves its shell, or multipolygon parts overlap.
pub(crate) fn self_intersects(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Polygon(polygon) => polygon_is_invalid(polygon),
        Geometry::MultiPolygon(polygons) => polygons.iter().any(polygon_is_invalid) || parts_overlap(polygons),
        _ => false,
    }
}
