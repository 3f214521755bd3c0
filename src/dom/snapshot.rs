use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::document::{Document, NodeId, Rect};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read page snapshot '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid page snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One element of a captured page, as emitted by the capture script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rect: Option<Rect>,
    /// Computed CSS `position` at capture time.
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

/// A captured page: location, title and the body subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub body: NodeSnapshot,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &str) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Build a live document from the capture. The snapshot's body element
    /// becomes the document body.
    pub fn into_document(self) -> Document {
        let mut doc = Document::new(&self.url, &self.title);
        let body = doc.body();
        apply_node(&mut doc, body, &self.body);
        for child in &self.body.children {
            build_node(&mut doc, body, child);
        }
        doc
    }
}

fn apply_node(doc: &mut Document, id: NodeId, snapshot: &NodeSnapshot) {
    for (name, value) in &snapshot.attributes {
        doc.set_attribute(id, name, value);
    }
    if let Some(text) = &snapshot.text {
        doc.set_text(id, text);
    }
    if let Some(rect) = snapshot.rect {
        doc.set_rect(id, rect);
    }
    doc.set_computed_position(id, snapshot.position.as_deref());
}

fn build_node(doc: &mut Document, parent: NodeId, snapshot: &NodeSnapshot) {
    let id = doc.create_element(&snapshot.tag);
    apply_node(doc, id, snapshot);
    doc.append_child(parent, id);
    for child in &snapshot.children {
        build_node(doc, id, child);
    }
}
