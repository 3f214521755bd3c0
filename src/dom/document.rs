use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::dom::selector::Selector;

/// Handle to a node in a `Document` arena. Ids are never reused, so a handle
/// to a removed node stays valid but reports `is_connected() == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Layout box of a rendered element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    rect: Rect,
    position: Option<String>,
}

/// A change to the content tree, delivered to every observer.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
}

impl MutationRecord {
    pub fn is_child_list(&self) -> bool {
        matches!(self, MutationRecord::ChildList { .. })
    }
}

/// Owned model of one page's live content tree.
///
/// Nodes live in an arena; `body` is the root every connected node hangs
/// from. Structural and attribute changes are broadcast to observers
/// registered through [`Document::observe`].
#[derive(Debug)]
pub struct Document {
    url: String,
    title: String,
    nodes: Vec<NodeData>,
    body: NodeId,
    observers: Vec<mpsc::UnboundedSender<MutationRecord>>,
}

impl Document {
    pub fn new(url: &str, title: &str) -> Self {
        let mut doc = Self {
            url: url.to_string(),
            title: title.to_string(),
            nodes: Vec::new(),
            body: NodeId(0),
            observers: Vec::new(),
        };
        doc.body = doc.create_element("body");
        doc
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Subscribe to mutation records. Dropping the receiver unsubscribes.
    pub fn observe(&mut self) -> mpsc::UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, record: MutationRecord) {
        self.observers.retain(|tx| tx.send(record.clone()).is_ok());
    }

    // ========================================================================
    // Construction and mutation
    // ========================================================================

    /// Create a detached element. It becomes part of the page once appended.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            rect: Rect::default(),
            position: None,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first. Returns false when the move would create a cycle
    /// or either id is unknown.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.exists(parent) || !self.exists(child) || parent == child {
            return false;
        }
        if self.ancestors(parent).any(|a| a == child) {
            return false;
        }

        if self.nodes[child.0].parent.is_some() {
            self.remove(child);
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.notify(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: vec![],
        });
        true
    }

    /// Detach `node` from its parent. The subtree stays in the arena but is no
    /// longer connected to the page.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
        self.notify(MutationRecord::ChildList {
            target: parent,
            added: vec![],
            removed: vec![node],
        });
        true
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(data) = self.nodes.get_mut(node.0) else {
            return;
        };
        data.attributes.insert(name.to_ascii_lowercase(), value.to_string());
        self.notify(MutationRecord::Attributes {
            target: node,
            name: name.to_ascii_lowercase(),
        });
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let key = name.to_ascii_lowercase();
        let removed = self
            .nodes
            .get_mut(node.0)
            .and_then(|d| d.attributes.remove(&key))
            .is_some();
        if removed {
            self.notify(MutationRecord::Attributes { target: node, name: key });
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let value = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &value);
    }

    /// Replace the node's own text. Children are left untouched.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        let Some(data) = self.nodes.get_mut(node.0) else {
            return;
        };
        data.text = text.to_string();
        self.notify(MutationRecord::Attributes {
            target: node,
            name: "#text".to_string(),
        });
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.rect = rect;
        }
    }

    /// Record the element's computed `position` as reported by a page capture.
    pub fn set_computed_position(&mut self, node: NodeId, position: Option<&str>) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.position = position.map(|p| p.trim().to_ascii_lowercase());
        }
    }

    /// Set one declaration in the inline `style` attribute, keeping the others.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let mut declarations: Vec<(String, String)> = self
            .attribute(node, "style")
            .map(parse_style)
            .unwrap_or_default()
            .into_iter()
            .filter(|(p, _)| !p.eq_ignore_ascii_case(property))
            .collect();
        declarations.push((property.to_ascii_lowercase(), value.to_string()));

        let style = declarations
            .iter()
            .map(|(p, v)| format!("{}: {};", p, v))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(node, "style", &style);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    fn exists(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|d| d.tag.as_str())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)?
            .attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .get(node.0)
            .into_iter()
            .flat_map(|d| d.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().any(|token| token == class))
            .unwrap_or(false)
    }

    pub fn own_text(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map(|d| d.text.as_str()).unwrap_or("")
    }

    /// Concatenated text of the node and its descendants, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|n| self.own_text(n))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn rect(&self, node: NodeId) -> Rect {
        self.nodes.get(node.0).map(|d| d.rect).unwrap_or_default()
    }

    /// The effective `position` value: inline style wins over the captured
    /// computed style, and elements default to `static`.
    pub fn computed_position(&self, node: NodeId) -> String {
        let inline = self.attribute(node, "style").and_then(|style| {
            parse_style(style)
                .into_iter()
                .rev()
                .find(|(p, _)| p == "position")
                .map(|(_, v)| v.to_ascii_lowercase())
        });

        inline
            .or_else(|| self.nodes.get(node.0).and_then(|d| d.position.clone()))
            .unwrap_or_else(|| "static".to_string())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    /// Strict descendants in document (pre-)order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Whether the node is still attached to the page body.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.body || self.ancestors(node).any(|a| a == self.body)
    }

    // ========================================================================
    // Selector queries
    // ========================================================================

    /// First descendant of `scope` matching `selector`, in document order.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    /// All descendants of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`. The walk stops
    /// after `bound` when one is given.
    pub fn closest(&self, node: NodeId, selector: &Selector, bound: Option<NodeId>) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if selector.matches(self, n) {
                return Some(n);
            }
            if Some(n) == bound {
                return None;
            }
            current = self.parent(n);
        }
        None
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            if property.is_empty() {
                return None;
            }
            Some((property, value.trim().to_string()))
        })
        .collect()
}
