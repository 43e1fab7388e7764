mod id;
mod ingest;
mod record;

pub use id::FeatureId;
pub use ingest::{ingest, ClassSelector, IngestOptions};
pub use record::{AttributeValue, Attributes, Class, FeatureRecord, SourceFeature};
