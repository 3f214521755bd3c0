use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::selector::Selector;

// ============================================================================
// Permalink strategies
// ============================================================================

/// One attempt at locating a post's permalink. Strategies are pure reads of
/// the post subtree; a descriptor lists them in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UrlStrategy {
    /// First descendant matching `selector` that carries an `href`.
    FirstMatch { selector: Selector },

    /// Find descendants matching `from` (e.g. a timestamp) and walk up to the
    /// nearest ancestor matching `ancestor`, without leaving the post.
    ClosestAncestor { from: Selector, ancestor: Selector },

    /// First `link` inside the first `region` of the post.
    Within { region: Selector, link: Selector },

    /// Scan every anchor in the post; the first whose `href` contains one of
    /// `patterns` wins.
    AnyLink { patterns: Vec<String> },

    /// Build the URL from an attribute on the post element itself. `{1}` in
    /// `template` is replaced with the first capture group of `pattern`.
    AttributeTemplate {
        attributes: Vec<String>,
        pattern: Pattern,
        template: String,
    },
}

impl UrlStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            UrlStrategy::FirstMatch { .. } => "first_match",
            UrlStrategy::ClosestAncestor { .. } => "closest_ancestor",
            UrlStrategy::Within { .. } => "within",
            UrlStrategy::AnyLink { .. } => "any_link",
            UrlStrategy::AttributeTemplate { .. } => "attribute_template",
        }
    }
}

// ============================================================================
// Media strategies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaStrategy {
    /// First element matching `selector` with a non-empty `attribute`.
    Image {
        selector: Selector,
        #[serde(default = "default_src")]
        attribute: String,
    },
}

fn default_src() -> String {
    "src".to_string()
}

// ============================================================================
// Descriptor
// ============================================================================

/// Where the save control sits inside its post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAnchor {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

/// Last-resort container discovery: start from permalink anchors and walk up
/// until an ancestor looks like a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackDiscovery {
    pub link_selector: Selector,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_width")]
    pub min_width: f32,
    #[serde(default = "default_min_height")]
    pub min_height: f32,
    #[serde(default)]
    pub class_hints: Vec<String>,
}

fn default_max_depth() -> usize { 8 }
fn default_min_width() -> f32 { 300.0 }
fn default_min_height() -> f32 { 100.0 }

/// Capabilities of one supported site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub id: String,
    pub display_name: String,
    /// Domains served by this platform; subdomains match too.
    pub hostnames: Vec<String>,
    /// Origin used to qualify relative permalinks.
    pub base_url: String,
    pub post_selector: Selector,
    pub url_strategies: Vec<UrlStrategy>,
    #[serde(default)]
    pub media_strategies: Vec<MediaStrategy>,
    /// Query parameters that identify the post and survive canonicalization.
    #[serde(default)]
    pub keep_query: Vec<String>,
    #[serde(default)]
    pub anchor: ControlAnchor,
    #[serde(default)]
    pub fallback: Option<FallbackDiscovery>,
}

// ============================================================================
// Pattern (serde-friendly Regex)
// ============================================================================

/// A compiled regular expression that (de)serializes as its source string.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(source)?))
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.0.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::new(&raw).map_err(serde::de::Error::custom)
    }
}
