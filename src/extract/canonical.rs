use url::Url;

/// Turn a raw `href` into a permalink: qualified against `base_url`, with the
/// fragment removed and only the `keep_query` parameters retained.
///
/// Returns `None` for empty or fragment-only hrefs and for anything that does
/// not resolve to an http(s) URL.
pub fn canonicalize_permalink(href: &str, base_url: &str, keep_query: &[String]) -> Option<String> {
    let mut url = qualify(href, base_url)?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| keep_query.iter().any(|k| k == key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Some(url.to_string())
}

/// Qualify a media source against `base_url`. Query strings are kept since
/// CDN image URLs are usually signed.
pub fn qualify_media(src: &str, base_url: &str) -> Option<String> {
    let mut url = qualify(src, base_url)?;
    url.set_fragment(None);
    Some(url.to_string())
}

fn qualify(raw: &str, base_url: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let url = base.join(raw).ok()?;

    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}
