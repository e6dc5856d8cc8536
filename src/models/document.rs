use serde::{Deserialize, Serialize};

/// A text chunk stored in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: serde_json::Value) -> Self {
        let metadata = match metadata {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A neighbour returned by a similarity query. `distance` is the raw metric
/// reported by the index (smaller is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub distance: f64,
}
