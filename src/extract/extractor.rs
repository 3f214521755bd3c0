use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::extract::canonical::{canonicalize_permalink, qualify_media};
use crate::platform::descriptor::{MediaStrategy, PlatformDescriptor, UrlStrategy};

/// What the engine knows about one post at annotation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPost {
    pub url: String,
    pub media_url: Option<String>,
    pub platform: String,
    pub title: String,
}

/// Run `attempt` over `strategies` in order and return the first hit.
/// Later strategies are never evaluated once one succeeds.
pub fn run_chain<'a, S, T>(
    strategies: &'a [S],
    mut attempt: impl FnMut(usize, &'a S) -> Option<T>,
) -> Option<T> {
    strategies
        .iter()
        .enumerate()
        .find_map(|(index, strategy)| attempt(index, strategy))
}

/// Resolve the canonical permalink of `post`, or `None` when every strategy
/// comes up empty.
pub fn extract_url(doc: &Document, post: NodeId, descriptor: &PlatformDescriptor) -> Option<String> {
    let resolved = run_chain(&descriptor.url_strategies, |index, strategy| {
        let (href, url) = resolve_permalink(doc, post, strategy, descriptor)?;
        debug!(
            platform = %descriptor.id,
            strategy = strategy.kind(),
            index,
            raw = %href,
            %url,
            "permalink resolved"
        );
        Some(url)
    });

    if resolved.is_none() {
        debug!(platform = %descriptor.id, node = post.index(), "no permalink strategy matched");
    }
    resolved
}

/// Resolve a representative image for `post`. Best effort: a miss never
/// affects permalink resolution.
pub fn extract_media(doc: &Document, post: NodeId, descriptor: &PlatformDescriptor) -> Option<String> {
    run_chain(&descriptor.media_strategies, |_, strategy| match strategy {
        MediaStrategy::Image { selector, attribute } => doc
            .query_selector_all(post, selector)
            .into_iter()
            .filter_map(|img| doc.attribute(img, attribute))
            .find_map(|src| qualify_media(src, &descriptor.base_url)),
    })
}

/// Extract everything the save control needs, or `None` if the post has no
/// resolvable permalink.
pub fn extract_post(doc: &Document, post: NodeId, descriptor: &PlatformDescriptor) -> Option<ExtractedPost> {
    let url = extract_url(doc, post, descriptor)?;
    Some(ExtractedPost {
        url,
        media_url: extract_media(doc, post, descriptor),
        platform: descriptor.display_name.clone(),
        title: doc.title().to_string(),
    })
}

fn non_empty_href(doc: &Document, node: NodeId) -> Option<String> {
    doc.attribute(node, "href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Canonicalize the href of `node`, yielding `(raw, canonical)`.
fn permalink_of(doc: &Document, node: NodeId, descriptor: &PlatformDescriptor) -> Option<(String, String)> {
    let href = non_empty_href(doc, node)?;
    canonical_pair(href, descriptor)
}

fn canonical_pair(href: String, descriptor: &PlatformDescriptor) -> Option<(String, String)> {
    let url = canonicalize_permalink(&href, &descriptor.base_url, &descriptor.keep_query)?;
    Some((href, url))
}

/// Every element a strategy selects is tried in document order, so an
/// unusable href does not hide a later usable one from the same strategy.
fn resolve_permalink(
    doc: &Document,
    post: NodeId,
    strategy: &UrlStrategy,
    descriptor: &PlatformDescriptor,
) -> Option<(String, String)> {
    match strategy {
        UrlStrategy::FirstMatch { selector } => doc
            .query_selector_all(post, selector)
            .into_iter()
            .find_map(|link| permalink_of(doc, link, descriptor)),

        UrlStrategy::ClosestAncestor { from, ancestor } => doc
            .query_selector_all(post, from)
            .into_iter()
            .filter_map(|start| doc.closest(start, ancestor, Some(post)))
            .find_map(|link| permalink_of(doc, link, descriptor)),

        UrlStrategy::Within { region, link } => {
            let region = doc.query_selector(post, region)?;
            doc.query_selector_all(region, link)
                .into_iter()
                .find_map(|l| permalink_of(doc, l, descriptor))
        }

        UrlStrategy::AnyLink { patterns } => doc
            .descendants(post)
            .into_iter()
            .filter(|n| doc.tag(*n) == Some("a"))
            .filter_map(|n| non_empty_href(doc, n))
            .filter(|href| patterns.iter().any(|p| href.contains(p.as_str())))
            .find_map(|href| canonical_pair(href, descriptor)),

        UrlStrategy::AttributeTemplate {
            attributes,
            pattern,
            template,
        } => attributes.iter().find_map(|name| {
            let value = doc.attribute(post, name)?;
            let captures = pattern.regex().captures(value)?;
            let mut url = template.replace("{0}", captures.get(0)?.as_str());
            if let Some(first) = captures.get(1) {
                url = url.replace("{1}", first.as_str());
            }
            canonical_pair(url, descriptor)
        }),
    }
}
