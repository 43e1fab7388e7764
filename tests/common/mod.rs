#![allow(dead_code)]

use geo::{Point, Rect};
use geopattern::{ingest, AttributeValue, ClassSelector, FeatureRecord, IngestOptions, SourceFeature};

/// Unit squares on a `rows` x `cols` grid, id `r * cols + c`.
/// Cells are classed as a checkerboard: black when `r + c` is even.
pub fn grid_features(rows: usize, cols: usize) -> Vec<SourceFeature> {
    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (r, c)))
        .map(|(r, c)| {
            let (x, y) = (c as f64, r as f64);
            SourceFeature::new((r * cols + c) as i64, Rect::new((x, y), (x + 1.0, y + 1.0)).to_polygon())
                .with_attribute("black", AttributeValue::Bool((r + c) % 2 == 0))
        })
        .collect()
}

pub fn grid(rows: usize, cols: usize) -> Vec<FeatureRecord> {
    let options = IngestOptions { classification: Some(ClassSelector::boolean("black")), ..Default::default() };
    ingest(grid_features(rows, cols), &options).expect("grid cells are valid")
}

pub fn points(coords: &[(f64, f64)]) -> Vec<FeatureRecord> {
    let features = coords.iter().enumerate()
        .map(|(i, &(x, y))| SourceFeature::new(i as i64, Point::new(x, y)));
    ingest(features, &IngestOptions::default()).expect("points are valid")
}
