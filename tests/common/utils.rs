use std::sync::Arc;

use linkogenei_agent::{
    annotate::annotator::CONTROL_CLASS,
    dom::{
        document::{Document, NodeId, Rect},
        selector::Selector,
    },
    engine::context::EngineContext,
    platform::{descriptor::PlatformDescriptor, registry::PlatformRegistry},
};

pub const TOKEN: &str = "tok-123";

pub fn sel(source: &str) -> Selector {
    Selector::parse(source).unwrap()
}

pub fn registry() -> PlatformRegistry {
    PlatformRegistry::builtin().unwrap()
}

pub fn descriptor(id: &str) -> Arc<PlatformDescriptor> {
    Arc::new(registry().get(id).unwrap().clone())
}

pub fn active_context(platform: &str) -> Arc<EngineContext> {
    let context = Arc::new(EngineContext::new());
    context.activate(Some(TOKEN.to_string()), Some(platform.to_string()));
    context
}

/// Create `tag` with `attrs` and append it to `parent`.
pub fn element(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let node = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attribute(node, name, value);
    }
    assert!(doc.append_child(parent, node));
    node
}

pub fn set_size(doc: &mut Document, node: NodeId, width: f32, height: f32) {
    doc.set_rect(node, Rect { width, height });
}

// ============================================================================
// Page builders
// ============================================================================

/// `<article><header><a href="/p/{code}/?utm_source=ig_web">..</a></header><img ..></article>`
pub fn instagram_post(doc: &mut Document, parent: NodeId, code: &str) -> NodeId {
    let article = element(doc, parent, "article", &[]);
    let header = element(doc, article, "header", &[]);
    let link = element(
        doc,
        header,
        "a",
        &[("href", &format!("/p/{}/?utm_source=ig_web", code))],
    );
    doc.set_text(link, "2h");
    let src = format!("https://scontent.cdninstagram.com/v/{}.jpg?sig=abc", code);
    element(doc, article, "img", &[("src", &src)]);
    article
}

pub fn instagram_page(codes: &[&str]) -> Document {
    let mut doc = Document::new("https://www.instagram.com/", "Instagram");
    let body = doc.body();
    let main = element(&mut doc, body, "main", &[]);
    for code in codes {
        instagram_post(&mut doc, main, code);
    }
    doc
}

pub fn tweet(doc: &mut Document, parent: NodeId, user: &str, id: &str) -> NodeId {
    let article = element(doc, parent, "article", &[("data-testid", "tweet")]);
    let link = element(doc, article, "a", &[("href", &format!("/{}/status/{}", user, id))]);
    element(doc, link, "time", &[("datetime", "2024-01-01T00:00:00.000Z")]);
    article
}

pub fn x_page(ids: &[&str]) -> Document {
    let mut doc = Document::new("https://x.com/home", "Home / X");
    let body = doc.body();
    for id in ids {
        tweet(&mut doc, body, "rustlang", id);
    }
    doc
}

// ============================================================================
// Page inspection
// ============================================================================

pub fn controls_in(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|n| doc.has_class(*n, CONTROL_CLASS))
        .collect()
}

pub fn all_controls(doc: &Document) -> Vec<NodeId> {
    controls_in(doc, doc.body())
}
