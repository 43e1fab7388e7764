use ahash::AHashSet;
use geo::{CoordsIter, Geometry, LineString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, GeometryError, Result};
use crate::feature::{AttributeValue, Attributes, Class, FeatureId, FeatureRecord, SourceFeature};

/// Derives a feature's `Class` from one of its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSelector {
    pub attribute: String,
    /// Value that marks a feature Black; anything else is White.
    /// When unset, the attribute itself must be boolean-like.
    pub black: Option<AttributeValue>,
}

impl ClassSelector {
    pub fn boolean(attribute: &str) -> Self {
        Self { attribute: attribute.to_string(), black: None }
    }

    pub fn equals(attribute: &str, black: AttributeValue) -> Self {
        Self { attribute: attribute.to_string(), black: Some(black) }
    }

    fn select(&self, id: &FeatureId, attributes: &Attributes) -> Result<Option<Class>> {
        let Some(value) = attributes.get(&self.attribute) else { return Ok(None) };

        if let Some(black) = &self.black {
            return Ok(Some(Class::from(value == black)));
        }

        let black = match value {
            AttributeValue::Bool(b) => *b,
            AttributeValue::Int(0) => false,
            AttributeValue::Int(1) => true,
            AttributeValue::Text(text) if text.eq_ignore_ascii_case("true") => true,
            AttributeValue::Text(text) if text.eq_ignore_ascii_case("false") => false,
            other => return Err(Error::config(format!(
                "attribute {:?} of feature {id} is not boolean: {other:?}", self.attribute
            ))),
        };
        Ok(Some(Class::from(black)))
    }
}

/// Attribute selectors applied while ingesting features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    pub classification: Option<ClassSelector>,
    pub weight_attribute: Option<String>,
}

impl IngestOptions {
    fn select_weight(&self, id: &FeatureId, attributes: &Attributes) -> Result<Option<f64>> {
        let Some(name) = &self.weight_attribute else { return Ok(None) };
        let Some(value) = attributes.get(name) else { return Ok(None) };

        match value {
            AttributeValue::Int(v) => Ok(Some(*v as f64)),
            AttributeValue::Float(v) => Ok(Some(*v)),
            AttributeValue::Text(text) => text.trim().parse::<f64>().map(Some)
                .map_err(|_| Error::config(format!("attribute {name:?} of feature {id} is not numeric: {text:?}"))),
            AttributeValue::Bool(_) => Err(Error::config(format!("attribute {name:?} of feature {id} is not numeric"))),
        }
    }
}

/// Check that a ring is closed-capable (at least 4 coordinates).
fn check_ring(id: &FeatureId, ring: &LineString<f64>) -> Result<()> {
    if ring.0.len() < 4 {
        return Err(GeometryError::Invalid {
            id: id.clone(),
            reason: format!("polygon ring has {} coordinates, need at least 4", ring.0.len()),
        }.into());
    }
    Ok(())
}

/// Reject null, empty, non-finite and degenerate geometries.
fn validate(id: &FeatureId, geometry: Option<Geometry<f64>>) -> Result<Geometry<f64>> {
    let invalid = |reason: &str| -> Error {
        GeometryError::Invalid { id: id.clone(), reason: reason.to_string() }.into()
    };

    let geometry = geometry.ok_or_else(|| invalid("geometry is null"))?;
    if geometry.coords_count() == 0 { return Err(invalid("geometry is empty")) }
    if geometry.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(invalid("geometry has non-finite coordinates"))
    }

    match &geometry {
        Geometry::Polygon(polygon) => {
            check_ring(id, polygon.exterior())?;
            polygon.interiors().iter().try_for_each(|ring| check_ring(id, ring))?;
        }
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                check_ring(id, polygon.exterior())?;
                polygon.interiors().iter().try_for_each(|ring| check_ring(id, ring))?;
            }
        }
        Geometry::LineString(line) if line.0.len() < 2 => return Err(invalid("line has fewer than 2 coordinates")),
        Geometry::GeometryCollection(_) => return Err(invalid("geometry collections are not supported")),
        _ => {}
    }

    Ok(geometry)
}

/// Ingest a feature source into validated, immutable records.
/// The geometry is assumed to be in a single planar CRS; nothing is reprojected.
pub fn ingest<I>(features: I, options: &IngestOptions) -> Result<Vec<FeatureRecord>>
where
    I: IntoIterator<Item = SourceFeature>,
{
    let mut seen = AHashSet::new();
    let mut records = Vec::new();

    for SourceFeature { id, geometry, attributes } in features {
        if !seen.insert(id.clone()) { return Err(Error::DuplicateId(id)) }

        let geometry = validate(&id, geometry)?;
        let classification = match &options.classification {
            Some(selector) => selector.select(&id, &attributes)?,
            None => None,
        };
        let weight = options.select_weight(&id, &attributes)?;

        let record = FeatureRecord::new(id.clone(), geometry, classification, weight)
            .ok_or_else(|| GeometryError::Invalid { id, reason: "geometry has no extent".to_string() })?;
        records.push(record);
    }

    tracing::debug!(
        records = records.len(),
        classified = records.iter().filter(|r| r.classification().is_some()).count(),
        "ingested features"
    );

    Ok(records)
}
