//! Selector scoping transform
//!
//! Prefixes every style-rule selector with an instance attribute
//! selector. At-rules and declaration blocks are never touched.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::rules::{split_rules, Segment};
use crate::{scope_selector, CssError};

/// Selector specificity (a, b, c)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// Scope a stylesheet to one widget instance.
///
/// Pure and deterministic: the same `(css, instance_id)` pair always
/// yields byte-identical output. Rules that cannot be parsed pass
/// through unscoped; scoping is best-effort by design so a broken rule
/// never takes the whole widget down.
pub fn scope_stylesheet(css: &str, instance_id: &str) -> String {
    let marker = scope_selector(instance_id);
    let mut out = String::with_capacity(css.len() + css.len() / 4);

    for segment in split_rules(css) {
        match segment {
            Segment::Style { selectors, block } => {
                out.push_str(&scope_selector_list(&selectors, &marker));
                out.push(' ');
                out.push_str(&block);
            }
            Segment::Passthrough(text) => out.push_str(&text),
        }
    }

    out
}

/// Like [`scope_stylesheet`], but reports the first malformed rule
/// instead of passing it through.
pub fn scope_stylesheet_checked(css: &str, instance_id: &str) -> Result<String, CssError> {
    let mut offset = 0;
    for segment in split_rules(css) {
        match &segment {
            Segment::Style { selectors, block } => offset += selectors.len() + block.len(),
            Segment::Passthrough(text) => {
                if !is_benign_passthrough(text) {
                    return Err(CssError::MalformedRule {
                        offset,
                        message: "unterminated rule".into(),
                    });
                }
                offset += text.len();
            }
        }
    }
    Ok(scope_stylesheet(css, instance_id))
}

/// Passthrough text is benign when it is an at-rule, whitespace, or a
/// comment; anything else is the debris of an unterminated rule.
fn is_benign_passthrough(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with('@') || trimmed.starts_with("/*")
}

/// Scope a comma-separated selector list.
fn scope_selector_list(selectors: &str, marker: &str) -> String {
    split_top_level(selectors, ',')
        .into_iter()
        .map(|sel| scope_one(sel.trim(), marker))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scope one selector.
fn scope_one(selector: &str, marker: &str) -> String {
    if selector.is_empty() {
        return String::new();
    }
    // Already anchored to this instance: leave untouched so the
    // transform is idempotent.
    if selector.starts_with(marker) {
        return selector.to_string();
    }
    // Keyframe steps (0%, 50%, 100%) are not element selectors.
    if is_percentage(selector) {
        return selector.to_string();
    }
    // The widget's root is the wrapper itself, not an ancestor of it.
    if let Some(rest) = selector.strip_prefix(":root") {
        return format!("{}{}", marker, rest);
    }
    format!("{} {}", marker, selector)
}

fn is_percentage(selector: &str) -> bool {
    selector
        .strip_suffix('%')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

/// Split on a separator, ignoring separators nested inside brackets,
/// parentheses, or quoted strings.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth -= 1,
                c if c == sep && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + sep.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Compute (id, class/attr/pseudo-class, type/pseudo-element) counts
/// for a single selector.
pub fn specificity(selector: &str) -> Specificity {
    let mut spec = Specificity::default();
    let bytes = selector.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                spec.0 += 1;
                i += 1 + ident_len(&selector[i + 1..]);
            }
            b'.' => {
                spec.1 += 1;
                i += 1 + ident_len(&selector[i + 1..]);
            }
            b'[' => {
                spec.1 += 1;
                i += selector[i..].find(']').map(|e| e + 1).unwrap_or(1);
            }
            b':' => {
                if selector[i..].starts_with("::") {
                    spec.2 += 1;
                    i += 2 + ident_len(&selector[i + 2..]);
                } else {
                    spec.1 += 1;
                    i += 1 + ident_len(&selector[i + 1..]);
                    // Skip functional arguments like :nth-child(2n).
                    if i < bytes.len() && bytes[i] == b'(' {
                        i += selector[i..].find(')').map(|e| e + 1).unwrap_or(1);
                    }
                }
            }
            b'*' | b' ' | b'>' | b'+' | b'~' | b',' => i += 1,
            _ => {
                spec.2 += 1;
                i += ident_len(&selector[i..]).max(1);
            }
        }
    }

    spec
}

fn ident_len(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
        .unwrap_or(s.len())
}

/// Memoizing scoping engine.
///
/// Re-scoping the same `(css, instance_id)` pair returns the cached
/// output, so repeated initialization never pays the transform twice.
#[derive(Debug, Default)]
pub struct ScopeEngine {
    cache: Mutex<HashMap<(u64, String), Arc<str>>>,
}

impl ScopeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope a stylesheet, memoized per `(content, instance_id)`.
    pub fn scope(&self, css: &str, instance_id: &str) -> Arc<str> {
        let key = (content_hash(css), instance_id.to_string());
        let mut cache = self.cache.lock().expect("scope cache poisoned");
        cache
            .entry(key)
            .or_insert_with(|| scope_stylesheet(css, instance_id).into())
            .clone()
    }
}

pub(crate) fn content_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
