use linkogenei_agent::platform::{
    descriptor::{ControlAnchor, MediaStrategy, PlatformDescriptor, UrlStrategy},
    detector::detect,
    registry::{PlatformRegistry, RegistryError},
};

use crate::common::utils::registry;

mod common;

// =========================================================================
// Detection
// =========================================================================

#[test]
fn known_origins_map_to_their_platform() {
    let registry = registry();
    let cases = [
        ("https://www.instagram.com/", "instagram"),
        ("https://www.linkedin.com/feed/", "linkedin"),
        ("https://twitter.com/home", "twitter"),
        ("https://mobile.twitter.com/rustlang", "twitter"),
        ("https://x.com/home", "x"),
        ("https://www.youtube.com/watch?v=abc", "youtube"),
        ("https://m.youtube.com/", "youtube"),
    ];
    for (origin, expected) in cases {
        assert_eq!(detect(&registry, origin).as_deref(), Some(expected), "{}", origin);
    }
}

#[test]
fn bare_hosts_are_accepted() {
    let registry = registry();
    assert_eq!(detect(&registry, "www.instagram.com").as_deref(), Some("instagram"));
    assert_eq!(detect(&registry, "x.com:443").as_deref(), Some("x"));
    assert_eq!(detect(&registry, "X.COM").as_deref(), Some("x"));
}

#[test]
fn unsupported_origins_are_not_detected() {
    let registry = registry();
    assert_eq!(detect(&registry, "https://example.com"), None);
    assert_eq!(detect(&registry, "https://www.netflix.com/browse"), None);
    assert_eq!(detect(&registry, "https://notinstagram.com/"), None);
    assert_eq!(detect(&registry, ""), None);
    assert_eq!(detect(&registry, "file:///tmp/page.html"), None);
}

// =========================================================================
// Built-in descriptors
// =========================================================================

#[test]
fn builtin_descriptors_are_complete() {
    let registry = registry();
    assert_eq!(registry.len(), 5);
    for platform in registry.iter() {
        assert!(!platform.url_strategies.is_empty(), "{}", platform.id);
        assert!(!platform.media_strategies.is_empty(), "{}", platform.id);
        assert_eq!(platform.anchor, ControlAnchor::TopRight);
    }
}

#[test]
fn display_names_match_the_save_payload_labels() {
    let registry = registry();
    let names: Vec<_> = registry.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, vec!["Instagram", "LinkedIn", "Twitter", "X (Twitter)", "YouTube"]);
}

#[test]
fn linkedin_carries_fallback_discovery_and_urn_template() {
    let registry = registry();
    let linkedin = registry.get("linkedin").unwrap();

    let fallback = linkedin.fallback.as_ref().unwrap();
    assert_eq!(fallback.max_depth, 8);
    assert_eq!(fallback.min_width, 300.0);
    assert_eq!(fallback.min_height, 100.0);
    assert_eq!(fallback.class_hints, vec!["feed", "update", "post"]);

    let last = linkedin.url_strategies.last().unwrap();
    assert_eq!(last.kind(), "attribute_template");
}

#[test]
fn youtube_keeps_the_video_parameter() {
    let registry = registry();
    assert_eq!(registry.get("youtube").unwrap().keep_query, vec!["v"]);
    assert!(registry.get("instagram").unwrap().keep_query.is_empty());
}

// =========================================================================
// Registry construction
// =========================================================================

const CUSTOM: &str = r#"
- id: mastodon
  display_name: Mastodon
  hostnames: [mastodon.social]
  base_url: https://mastodon.social
  post_selector: 'article.status'
  url_strategies:
    - kind: first_match
      selector: 'a.status__relative-time'
  media_strategies:
    - kind: image
      selector: '.media-gallery img'
      attribute: data-src
  anchor: bottom_left
"#;

#[test]
fn descriptors_load_from_yaml() {
    let registry = PlatformRegistry::from_yaml(CUSTOM).unwrap();
    let mastodon = registry.get("mastodon").unwrap();
    assert_eq!(mastodon.anchor, ControlAnchor::BottomLeft);
    assert!(mastodon.fallback.is_none());
    assert!(matches!(&mastodon.url_strategies[0], UrlStrategy::FirstMatch { .. }));
    match &mastodon.media_strategies[0] {
        MediaStrategy::Image { attribute, .. } => assert_eq!(attribute, "data-src"),
    }
}

#[test]
fn overrides_replace_by_id_and_append_new_platforms() {
    let extra: Vec<PlatformDescriptor> = serde_yaml::from_str(CUSTOM).unwrap();
    let mut replacement = registry().get("x").unwrap().clone();
    replacement.display_name = "X".to_string();

    let mut overrides = extra;
    overrides.push(replacement);
    let registry = registry().with_overrides(overrides).unwrap();

    assert_eq!(registry.len(), 6);
    assert_eq!(registry.get("x").unwrap().display_name, "X");
    assert_eq!(registry.iter().last().unwrap().id, "mastodon");
    assert_eq!(detect(&registry, "https://mastodon.social/@rust").as_deref(), Some("mastodon"));
}

#[test]
fn descriptor_without_url_strategies_is_rejected() {
    let yaml = r#"
- id: empty
  display_name: Empty
  hostnames: [empty.example]
  base_url: https://empty.example
  post_selector: article
  url_strategies: []
"#;
    assert!(matches!(
        PlatformRegistry::from_yaml(yaml),
        Err(RegistryError::NoUrlStrategies(id)) if id == "empty"
    ));
}

#[test]
fn invalid_selector_in_yaml_is_a_yaml_error() {
    let yaml = r#"
- id: broken
  display_name: Broken
  hostnames: [broken.example]
  base_url: https://broken.example
  post_selector: 'article >'
  url_strategies:
    - kind: any_link
      patterns: ['/p/']
"#;
    assert!(matches!(PlatformRegistry::from_yaml(yaml), Err(RegistryError::Yaml(_))));
}

#[test]
fn invalid_base_url_is_rejected() {
    let yaml = r#"
- id: relative
  display_name: Relative
  hostnames: [relative.example]
  base_url: /not/absolute
  post_selector: article
  url_strategies:
    - kind: any_link
      patterns: ['/p/']
"#;
    assert!(matches!(
        PlatformRegistry::from_yaml(yaml),
        Err(RegistryError::BaseUrl { .. })
    ));
}
