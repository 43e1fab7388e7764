use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Stable key for a feature, as supplied by the feature source.
///
/// Ids are totally ordered: integers sort numerically and before all strings,
/// strings sort lexicographically. Every reduction in this crate runs in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Int(i64),
    Text(Arc<str>),
}

impl FeatureId {
    /// Build a string id without repeated owned Strings.
    pub fn text(id: &str) -> Self { Self::Text(Arc::from(id)) }
}

impl From<i64> for FeatureId {
    fn from(id: i64) -> Self { Self::Int(id) }
}

impl From<u32> for FeatureId {
    fn from(id: u32) -> Self { Self::Int(id as i64) }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self { Self::text(id) }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self { Self::Text(Arc::from(id)) }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id:?}"),
        }
    }
}
