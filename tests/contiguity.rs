// Integration tests for contiguity weights on regular grids and an irregular map:
//   rook and queen degrees, symmetry, normalization, and error paths.

mod common;

use geo::{polygon, MultiPolygon, Rect};
use geopattern::{
    build_weights, build_weights_with, ingest, CancellationToken, Contiguity, Error, FeatureId, GeometryError,
    FeatureRecord, IngestOptions, Normalization, SourceFeature, WeightsConfig, WeightsMatrix,
};

fn degrees(contiguity: Contiguity) -> Vec<usize> {
    let weights = build_weights(&common::grid(3, 3), contiguity, Normalization::Binary).unwrap();
    (0..weights.len()).map(|row| weights.degree(row)).collect()
}

#[test]
fn rook_grid_degrees() {
    assert_eq!(degrees(Contiguity::Rook), vec![2, 3, 2, 3, 4, 3, 2, 3, 2]);
}

#[test]
fn queen_grid_degrees() {
    assert_eq!(degrees(Contiguity::Queen), vec![3, 5, 3, 5, 8, 5, 3, 5, 3]);
}

#[test]
fn weights_are_symmetric_without_self_loops() {
    for contiguity in [Contiguity::Queen, Contiguity::Rook] {
        let weights = build_weights(&common::grid(4, 5), contiguity, Normalization::Binary).unwrap();
        for i in 0..weights.len() {
            assert!(!weights.contains(i, i));
            for j in weights.neighbors(i) {
                assert!(weights.contains(j, i), "{contiguity:?}: {i} -> {j} is not mirrored");
                assert_eq!(weights.weight(i, j), weights.weight(j, i));
            }
        }
    }
}

#[test]
fn rook_neighbors_are_a_subset_of_queen_neighbors() {
    let records = common::grid(4, 4);
    let rook = build_weights(&records, Contiguity::Rook, Normalization::Binary).unwrap();
    let queen = build_weights(&records, Contiguity::Queen, Normalization::Binary).unwrap();

    for i in 0..rook.len() {
        assert!(rook.neighbors(i).all(|j| queen.contains(i, j)));
    }
    assert_eq!(rook.edge_count(), 24);
    assert_eq!(queen.edge_count(), 42);
}

/// A donut with an island in its hole, two squares meeting the donut at a
/// T-junction, a two-part multipolygon, and a strip touching square 4 at a corner.
fn irregular_map() -> Vec<FeatureRecord> {
    let rect = |x0: f64, y0: f64, x1: f64, y1: f64| Rect::new((x0, y0), (x1, y1)).to_polygon();
    let donut = polygon!(
        exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
        interiors: [[(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)]],
    );
    let features = vec![
        SourceFeature::new(1i64, donut),
        SourceFeature::new(2i64, rect(1.0, 1.0, 3.0, 3.0)),
        SourceFeature::new(3i64, rect(4.0, 0.0, 6.0, 2.0)),
        SourceFeature::new(4i64, rect(4.0, 2.0, 6.0, 4.0)),
        SourceFeature::new(5i64, MultiPolygon::new(vec![rect(6.0, 0.0, 7.0, 1.0), rect(6.0, 3.0, 7.0, 4.0)])),
        SourceFeature::new(6i64, rect(0.0, 4.0, 4.0, 5.0)),
    ];
    ingest(features, &IngestOptions::default()).unwrap()
}

fn neighbor_ids(weights: &WeightsMatrix, id: i64) -> Vec<i64> {
    let mut ids = weights.neighbors_of(&FeatureId::Int(id)).unwrap().into_iter()
        .map(|(id, _)| match id { FeatureId::Int(id) => id, other => panic!("unexpected id {other:?}") })
        .collect::<Vec<_>>();
    ids.sort_unstable();
    ids
}

#[test]
fn irregular_map_neighbors() {
    let records = irregular_map();
    let rook = build_weights(&records, Contiguity::Rook, Normalization::Binary).unwrap();
    let queen = build_weights(&records, Contiguity::Queen, Normalization::Binary).unwrap();

    let expected_rook: [&[i64]; 6] = [&[2, 3, 4, 6], &[1], &[1, 4, 5], &[1, 3, 5], &[3, 4], &[1]];
    for (id, expected) in (1..=6).zip(expected_rook) {
        assert_eq!(neighbor_ids(&rook, id), expected, "rook neighbors of {id}");
    }
    assert_eq!(rook.edge_count(), 7);

    assert_eq!(neighbor_ids(&queen, 4), vec![1, 3, 5, 6]);
    assert_eq!(neighbor_ids(&queen, 6), vec![1, 4]);
    assert_eq!(queen.edge_count(), 8);

    let island = rook.edges().iter().find(|edge| (edge.a, edge.b) == (0, 1)).unwrap();
    assert_eq!(island.shared_boundary_length, 8.0);
}

#[test]
fn irregular_map_is_symmetric_and_rook_is_within_queen() {
    let records = irregular_map();
    let rook = build_weights(&records, Contiguity::Rook, Normalization::Binary).unwrap();
    let queen = build_weights(&records, Contiguity::Queen, Normalization::Binary).unwrap();

    for weights in [&rook, &queen] {
        for i in 0..weights.len() {
            assert!(!weights.contains(i, i));
            assert!(weights.neighbors(i).all(|j| weights.contains(j, i)));
        }
    }
    for i in 0..rook.len() {
        assert!(rook.neighbors(i).all(|j| queen.contains(i, j)));
    }
}

#[test]
fn row_standardized_rows_sum_to_one() {
    let weights = build_weights(&common::grid(3, 3), Contiguity::Queen, Normalization::RowStandardized).unwrap();
    for row in 0..weights.len() {
        assert!((weights.row_sum(row) - 1.0).abs() < 1e-12);
    }
    assert_eq!(weights.weight(4, 0), 0.125);
    assert_eq!(weights.weight(0, 4), 1.0 / 3.0);
}

#[test]
fn shared_boundary_lengths_are_recorded_per_edge() {
    let weights = build_weights(&common::grid(2, 2), Contiguity::Queen, Normalization::Binary).unwrap();
    let lengths = weights.edges().iter().map(|edge| edge.shared_boundary_length).collect::<Vec<_>>();
    assert_eq!(weights.edge_count(), 6);
    assert_eq!(lengths.iter().filter(|&&l| l == 1.0).count(), 4);
    assert_eq!(lengths.iter().filter(|&&l| l == 0.0).count(), 2);
}

#[test]
fn isolated_features_get_empty_rows() {
    let mut features = common::grid_features(1, 2);
    features.push(SourceFeature::new(99i64, Rect::new((10.0, 10.0), (11.0, 11.0)).to_polygon()));
    let records = ingest(features, &IngestOptions::default()).unwrap();

    let weights = build_weights(&records, Contiguity::Queen, Normalization::RowStandardized).unwrap();
    let isolated = weights.isolated().map(|row| weights.id(row).clone()).collect::<Vec<_>>();
    assert_eq!(isolated, vec![FeatureId::Int(99)]);
    assert_eq!(weights.neighbors_of(&FeatureId::Int(99)), Some(vec![]));
    assert_eq!(weights.row_sum(2), 0.0);
}

#[test]
fn self_intersecting_polygon_is_rejected() {
    let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0)];
    let mut features = common::grid_features(1, 2);
    features.push(SourceFeature::new(5i64, bowtie));
    let records = ingest(features, &IngestOptions::default()).unwrap();

    let err = build_weights(&records, Contiguity::Queen, Normalization::Binary).unwrap_err();
    assert!(matches!(err, Error::Geometry(GeometryError::SelfIntersecting { id }) if id == FeatureId::Int(5)));
}

#[test]
fn cancelled_build_returns_no_matrix() {
    let token = CancellationToken::new();
    token.cancel();
    let result = build_weights_with(&common::grid(3, 3), &WeightsConfig::default(), &token);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn empty_input_builds_an_empty_matrix() -> anyhow::Result<()> {
    let weights = build_weights(&[], Contiguity::Rook, Normalization::Binary)?;
    assert!(weights.is_empty());
    assert_eq!(weights.edge_count(), 0);
    Ok(())
}
