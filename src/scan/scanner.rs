use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::annotate::annotator::{Annotator, SaveControl};
use crate::dom::document::{Document, NodeId};
use crate::engine::context::EngineContext;
use crate::extract::extractor::extract_post;
use crate::platform::descriptor::{FallbackDiscovery, PlatformDescriptor};

/// Outcome of one scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Post containers found (precise selector or fallback discovery).
    pub candidates: usize,
    /// Controls injected during this pass.
    pub annotated: Vec<SaveControl>,
    /// Candidates skipped because they already carry a control.
    pub already_annotated: usize,
    /// Candidates skipped because no permalink could be resolved.
    pub unresolved: usize,
    /// Whether the fallback container discovery produced the candidates.
    pub used_fallback: bool,
}

/// Finds posts for one platform and annotates the ones not yet annotated.
/// New controls are bound in the engine context so clicks can be dispatched.
#[derive(Debug, Clone)]
pub struct Scanner {
    descriptor: Arc<PlatformDescriptor>,
    annotator: Annotator,
    context: Arc<EngineContext>,
}

impl Scanner {
    pub fn new(descriptor: Arc<PlatformDescriptor>, context: Arc<EngineContext>) -> Self {
        let annotator = Annotator::new(descriptor.anchor);
        Self {
            descriptor,
            annotator,
            context,
        }
    }

    pub fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    /// Post containers under `root`, in document order. Falls back to
    /// link-driven discovery only when the precise selector finds nothing.
    pub fn find_posts(&self, doc: &Document, root: NodeId) -> (Vec<NodeId>, bool) {
        let posts = doc.query_selector_all(root, &self.descriptor.post_selector);
        if !posts.is_empty() {
            return (posts, false);
        }

        match &self.descriptor.fallback {
            Some(fallback) => {
                let discovered = discover_by_links(doc, root, fallback);
                debug!(
                    platform = %self.descriptor.id,
                    containers = discovered.len(),
                    "post selector matched nothing; used link-driven discovery"
                );
                (discovered, true)
            }
            None => (posts, false),
        }
    }

    /// Annotate every post under `root` that lacks a control. Safe to call
    /// repeatedly: annotated posts are skipped via the control marker.
    /// Does nothing once the engine has been deactivated.
    pub fn scan(&self, doc: &mut Document, root: NodeId) -> ScanReport {
        if !self.context.is_active() {
            debug!(platform = %self.descriptor.id, "engine inactive; scan skipped");
            return ScanReport::default();
        }

        let (posts, used_fallback) = self.find_posts(doc, root);
        let mut report = ScanReport {
            candidates: posts.len(),
            used_fallback,
            ..ScanReport::default()
        };

        for (index, post) in posts.into_iter().enumerate() {
            if self.annotator.is_annotated(doc, post) {
                report.already_annotated += 1;
                continue;
            }

            let Some(extracted) = extract_post(doc, post, &self.descriptor) else {
                debug!(platform = %self.descriptor.id, post = index + 1, "skipping post without permalink");
                report.unresolved += 1;
                continue;
            };

            debug!(platform = %self.descriptor.id, post = index + 1, url = %extracted.url, "annotating post");
            let control = self.annotator.annotate(doc, post, extracted);
            report.annotated.push(control);
        }

        self.context.register_controls(&report.annotated);

        if report.annotated.is_empty() {
            debug!(
                platform = %self.descriptor.id,
                candidates = report.candidates,
                unresolved = report.unresolved,
                "scan found nothing new"
            );
        } else {
            info!(
                platform = %self.descriptor.id,
                candidates = report.candidates,
                annotated = report.annotated.len(),
                unresolved = report.unresolved,
                "scan annotated posts"
            );
        }

        report
    }
}

/// Approximate post containers from permalink anchors: walk up at most
/// `max_depth` ancestors of each link and keep the first one that is either
/// large enough or carries a post-like class. Containers are de-duplicated;
/// `root` itself is never returned.
pub fn discover_by_links(doc: &Document, root: NodeId, fallback: &FallbackDiscovery) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut containers = Vec::new();

    for link in doc.query_selector_all(root, &fallback.link_selector) {
        let candidate = doc
            .ancestors(link)
            .take_while(|a| *a != root)
            .take(fallback.max_depth)
            .find(|a| looks_like_post(doc, *a, fallback));

        if let Some(container) = candidate {
            if seen.insert(container) {
                containers.push(container);
            }
        }
    }

    containers
}

fn looks_like_post(doc: &Document, node: NodeId, fallback: &FallbackDiscovery) -> bool {
    let rect = doc.rect(node);
    if rect.height > fallback.min_height && rect.width > fallback.min_width {
        return true;
    }

    let class = doc.attribute(node, "class").unwrap_or("");
    fallback.class_hints.iter().any(|hint| class.contains(hint.as_str()))
}
