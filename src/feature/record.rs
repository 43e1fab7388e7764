use ahash::AHashMap;
use geo::{BoundingRect, Centroid, Geometry, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::feature::FeatureId;

/// Binary label used by the Join Count statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    Black,
    White,
}

impl Class {
    #[inline] pub fn is_black(self) -> bool { self == Class::Black }
}

impl From<bool> for Class {
    fn from(black: bool) -> Self { if black { Class::Black } else { Class::White } }
}

/// A raw attribute value carried by a source feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

pub type Attributes = AHashMap<String, AttributeValue>;

/// One item yielded by an external feature source, before validation.
#[derive(Debug, Clone)]
pub struct SourceFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry<f64>>,
    pub attributes: Attributes,
}

impl SourceFeature {
    pub fn new(id: impl Into<FeatureId>, geometry: impl Into<Geometry<f64>>) -> Self {
        Self { id: id.into(), geometry: Some(geometry.into()), attributes: Attributes::new() }
    }

    /// Attach an attribute, builder style.
    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }
}

/// A validated, immutable feature: id, planar geometry and optional labels.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    id: FeatureId,
    geometry: Geometry<f64>,
    bbox: Rect<f64>,
    classification: Option<Class>,
    weight: Option<f64>,
}

impl FeatureRecord {
    /// Assemble a record from an already validated geometry.
    /// Returns `None` when the geometry has no bounding rectangle (i.e. it is empty).
    pub(crate) fn new(id: FeatureId, geometry: Geometry<f64>,
        classification: Option<Class>, weight: Option<f64>,
    ) -> Option<Self> {
        let bbox = geometry.bounding_rect()?;
        Some(Self { id, geometry, bbox, classification, weight })
    }

    #[inline] pub fn id(&self) -> &FeatureId { &self.id }

    #[inline] pub fn geometry(&self) -> &Geometry<f64> { &self.geometry }

    /// Bounding rectangle, computed once at ingestion.
    #[inline] pub fn bbox(&self) -> Rect<f64> { self.bbox }

    #[inline] pub fn classification(&self) -> Option<Class> { self.classification }

    #[inline] pub fn weight(&self) -> Option<f64> { self.weight }

    /// True if the feature carries areal (polygon) parts.
    pub fn is_polygonal(&self) -> bool {
        matches!(self.geometry,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_))
    }

    /// The point used for distance-based statistics: the point itself, or the centroid.
    pub fn representative_point(&self) -> Point<f64> {
        match &self.geometry {
            Geometry::Point(point) => *point,
            geometry => geometry.centroid().unwrap_or_else(|| self.bbox.center().into()),
        }
    }
}
