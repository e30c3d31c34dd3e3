//! Diagram document format
//!
//! The persisted/exported form of a diagram is a JSON object with exactly two
//! arrays:
//!
//! ```json
//! { "nodes": [ { "id": "..", "x": 0, "y": 0, "label": ".." } ],
//!   "connections": [ { "id": "..", "from": "..", "to": ".." } ] }
//! ```
//!
//! `parse_document` is the strict entry point used for files: a payload that
//! lacks either array is rejected before the diagram is touched.
//! `DiagramDocument::from_value_lenient` mirrors `load_diagram` semantics and
//! treats a missing or non-array field as empty.

use crate::diagram::DiagramController;
use crate::error::{DocumentError, DocumentResult};
use crate::types::{DiagramConnection, DiagramNode, DiagramState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub connections: Vec<DiagramConnection>,
}

impl DiagramDocument {
    pub fn new(nodes: Vec<DiagramNode>, connections: Vec<DiagramConnection>) -> Self {
        Self { nodes, connections }
    }

    /// Nodes and connections of a state snapshot; selection is not persisted.
    pub fn from_state(state: &DiagramState) -> Self {
        Self {
            nodes: state.nodes.clone(),
            connections: state.connections.clone(),
        }
    }

    pub fn from_controller(controller: &DiagramController) -> Self {
        let model = controller.model();
        Self {
            nodes: model.nodes().to_vec(),
            connections: model.connections().to_vec(),
        }
    }

    /// Build a document from arbitrary JSON, treating a missing or malformed
    /// field as empty. Individual entries that do not parse are skipped.
    pub fn from_value_lenient(value: &Value) -> Self {
        Self {
            nodes: lenient_array(value, "nodes"),
            connections: lenient_array(value, "connections"),
        }
    }

    /// Replace the controller's diagram with this document.
    pub fn load_into(self, controller: &mut DiagramController) {
        controller.load_diagram(self.nodes, self.connections);
    }

    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `path`, replacing any existing file atomically.
    pub fn write_to(&self, path: &Path) -> DocumentResult<()> {
        let json = self.to_json_pretty()?;
        write_atomic(path, json.as_bytes())?;
        debug!(path = %path.display(), "wrote diagram document");
        Ok(())
    }
}

/// Parse a document, rejecting payloads whose top level lacks either array.
pub fn parse_document(json: &str) -> DocumentResult<DiagramDocument> {
    let value: Value = serde_json::from_str(json)?;
    let obj = value.as_object().ok_or(DocumentError::NotAnObject)?;

    for key in ["nodes", "connections"] {
        if !matches!(obj.get(key), Some(Value::Array(_))) {
            return Err(DocumentError::MissingArray(key));
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Read and strictly parse a document file.
pub fn read_document(path: &Path) -> DocumentResult<DiagramDocument> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

fn lenient_array<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    let Some(Value::Array(items)) = value.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = %e, "skipping malformed entry");
                None
            }
        })
        .collect()
}

/// Write through a temp file in the destination directory, then rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
