use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::document::{Document, NodeId};

/// Errors raised while compiling a selector string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character '{found}' at offset {offset} in '{selector}'")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),

    #[error("dangling combinator in '{0}'")]
    DanglingCombinator(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Includes,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrMatcher {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrMatcher {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            // Empty operands never match for the substring operators.
            AttrOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttrOp::Includes => actual.split_whitespace().any(|t| t == self.value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrMatcher>,
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(node) != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|a| a.matches(doc.attribute(node, &a.name)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.compounds.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent(node)
                .map(|p| self.matches_at(doc, p, idx - 1))
                .unwrap_or(false),
            Combinator::Descendant => doc.ancestors(node).any(|a| self.matches_at(doc, a, idx - 1)),
        }
    }
}

/// A compiled CSS selector list covering the subset feed markup needs:
/// type, `#id`, `.class`, attribute operators (`=`, `*=`, `^=`, `$=`, `~=`)
/// and the descendant / child combinators.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let alternatives = split_list(source)
            .into_iter()
            .map(|part| parse_complex(part, source))
            .collect::<Result<Vec<_>, _>>()?;

        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }

        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any selector in the list. Ancestor matching is
    /// evaluated against the whole document, as browsers do.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Serialize for Selector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Selector::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Split on top-level commas, ignoring commas inside brackets or quotes.
fn split_list(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);

    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_complex(part: &str, full: &str) -> Result<Complex, SelectorError> {
    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut pos = 0;
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    loop {
        let mut saw_child = false;
        while pos < chars.len() && (chars[pos].1.is_whitespace() || chars[pos].1 == '>') {
            if chars[pos].1 == '>' {
                if saw_child {
                    return Err(SelectorError::Unexpected {
                        selector: full.to_string(),
                        found: '>',
                        offset: chars[pos].0,
                    });
                }
                saw_child = true;
            }
            pos += 1;
        }

        if pos >= chars.len() {
            if saw_child {
                return Err(SelectorError::DanglingCombinator(full.to_string()));
            }
            break;
        }

        if !compounds.is_empty() {
            combinators.push(if saw_child {
                Combinator::Child
            } else {
                Combinator::Descendant
            });
        } else if saw_child {
            return Err(SelectorError::DanglingCombinator(full.to_string()));
        }

        let (compound, next) = parse_compound(&chars, pos, full)?;
        compounds.push(compound);
        pos = next;
    }

    if compounds.is_empty() {
        return Err(SelectorError::Empty);
    }

    Ok(Complex {
        compounds,
        combinators,
    })
}

/// Parse one compound selector. A compound with no constraints is the
/// universal selector. Stops at whitespace, `>` or the end of input.
fn parse_compound(
    chars: &[(usize, char)],
    mut pos: usize,
    full: &str,
) -> Result<(Compound, usize), SelectorError> {
    let mut compound = Compound::default();
    let mut first = true;

    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        selector: full.to_string(),
        found,
        offset,
    };

    while pos < chars.len() {
        let (offset, c) = chars[pos];
        match c {
            c if c.is_whitespace() || c == '>' => break,
            '*' if first => pos += 1,
            c if first && is_ident_char(c) => {
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos].1) {
                    pos += 1;
                }
                let tag: String = chars[start..pos].iter().map(|(_, ch)| *ch).collect();
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            '#' | '.' => {
                pos += 1;
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos].1) {
                    pos += 1;
                }
                if start == pos {
                    return Err(unexpected(offset, c));
                }
                let ident: String = chars[start..pos].iter().map(|(_, ch)| *ch).collect();
                if c == '#' {
                    compound.id = Some(ident);
                } else {
                    compound.classes.push(ident);
                }
            }
            '[' => {
                let (matcher, next) = parse_attribute(chars, pos + 1, full)?;
                compound.attributes.push(matcher);
                pos = next;
            }
            other => return Err(unexpected(offset, other)),
        }
        first = false;
    }

    Ok((compound, pos))
}

/// Parse the inside of `[...]`, starting just after the opening bracket.
/// Returns the matcher and the position just after the closing bracket.
fn parse_attribute(
    chars: &[(usize, char)],
    mut pos: usize,
    full: &str,
) -> Result<(AttrMatcher, usize), SelectorError> {
    let unterminated = || SelectorError::UnterminatedAttribute(full.to_string());
    let skip_ws = |pos: &mut usize| {
        while *pos < chars.len() && chars[*pos].1.is_whitespace() {
            *pos += 1;
        }
    };

    skip_ws(&mut pos);
    let start = pos;
    while pos < chars.len() && is_ident_char(chars[pos].1) {
        pos += 1;
    }
    if start == pos {
        return Err(match chars.get(pos) {
            Some((offset, found)) => SelectorError::Unexpected {
                selector: full.to_string(),
                found: *found,
                offset: *offset,
            },
            None => unterminated(),
        });
    }
    let name: String = chars[start..pos].iter().map(|(_, c)| c.to_ascii_lowercase()).collect();
    skip_ws(&mut pos);

    let (_, c) = *chars.get(pos).ok_or_else(unterminated)?;
    if c == ']' {
        return Ok((
            AttrMatcher {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            },
            pos + 1,
        ));
    }

    let op = match c {
        '=' => {
            pos += 1;
            AttrOp::Equals
        }
        '*' | '^' | '$' | '~' => {
            if chars.get(pos + 1).map(|(_, c)| *c) != Some('=') {
                return Err(SelectorError::Unexpected {
                    selector: full.to_string(),
                    found: c,
                    offset: chars[pos].0,
                });
            }
            pos += 2;
            match c {
                '*' => AttrOp::Contains,
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                _ => AttrOp::Includes,
            }
        }
        other => {
            return Err(SelectorError::Unexpected {
                selector: full.to_string(),
                found: other,
                offset: chars[pos].0,
            });
        }
    };

    skip_ws(&mut pos);
    let (_, first) = *chars.get(pos).ok_or_else(unterminated)?;
    let value: String = if first == '"' || first == '\'' {
        pos += 1;
        let start = pos;
        while pos < chars.len() && chars[pos].1 != first {
            pos += 1;
        }
        if pos >= chars.len() {
            return Err(unterminated());
        }
        let v = chars[start..pos].iter().map(|(_, c)| *c).collect();
        pos += 1;
        v
    } else {
        let start = pos;
        while pos < chars.len() && chars[pos].1 != ']' && !chars[pos].1.is_whitespace() {
            pos += 1;
        }
        chars[start..pos].iter().map(|(_, c)| *c).collect()
    };

    skip_ws(&mut pos);
    match chars.get(pos) {
        Some((_, ']')) => Ok((AttrMatcher { name, op, value }, pos + 1)),
        Some((offset, found)) => Err(SelectorError::Unexpected {
            selector: full.to_string(),
            found: *found,
            offset: *offset,
        }),
        None => Err(unterminated()),
    }
}
