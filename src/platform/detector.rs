use tracing::debug;
use url::Url;

use crate::platform::registry::PlatformRegistry;

/// Resolve a page origin (or bare host name) to a registered platform id.
///
/// A descriptor matches when the host equals one of its hostnames or is a
/// subdomain of one; the first descriptor in registry order wins. Unknown
/// origins yield `None`, which callers treat as "do nothing".
pub fn detect(registry: &PlatformRegistry, origin: &str) -> Option<String> {
    let host = host_of(origin)?;

    let found = registry.iter().find(|platform| {
        platform
            .hostnames
            .iter()
            .any(|domain| host_matches(&host, domain))
    });

    match found {
        Some(platform) => {
            debug!(%host, platform = %platform.id, "platform detected");
            Some(platform.id.clone())
        }
        None => {
            debug!(%host, "platform not supported");
            None
        }
    }
}

fn host_of(origin: &str) -> Option<String> {
    let origin = origin.trim();
    if origin.is_empty() {
        return None;
    }

    let host = if origin.contains("://") {
        Url::parse(origin).ok()?.host_str()?.to_string()
    } else {
        // Bare host such as "www.instagram.com" or "x.com:443".
        origin.split(['/', ':']).next()?.to_string()
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}
