//! Top-level rule scanner
//!
//! Splits a stylesheet into style rules, at-rules, and passthrough
//! text without interpreting declaration blocks.

/// One top-level segment of a stylesheet.
///
/// `Style` carries the selector text and the declaration block
/// (including braces) verbatim. Everything else — at-rules, comments,
/// whitespace, unparseable trailing text — is `Passthrough` and must be
/// emitted byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Style { selectors: String, block: String },
    Passthrough(String),
}

/// Split a stylesheet into top-level segments.
///
/// The scanner tracks comments, string literals, and brace depth, so
/// `@media` bodies and quoted attribute values never confuse rule
/// boundaries. Malformed trailing input is preserved as passthrough.
pub fn split_rules(css: &str) -> Vec<Segment> {
    let bytes = css.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // Whitespace and comments between rules pass through.
        let gap_start = pos;
        loop {
            let rest = &css[pos..];
            let trimmed = rest.trim_start();
            let ws = rest.len() - trimmed.len();
            pos += ws;
            if css[pos..].starts_with("/*") {
                match css[pos..].find("*/") {
                    Some(end) => pos += end + 2,
                    None => pos = bytes.len(),
                }
            } else {
                break;
            }
        }
        if pos > gap_start {
            segments.push(Segment::Passthrough(css[gap_start..pos].to_string()));
        }
        if pos >= bytes.len() {
            break;
        }

        if bytes[pos] == b'@' {
            // At-rule: either a statement ending in ';' or a block.
            let start = pos;
            match scan_at_rule(css, pos) {
                Some(end) => pos = end,
                None => pos = bytes.len(),
            }
            segments.push(Segment::Passthrough(css[start..pos].to_string()));
            continue;
        }

        // Style rule: selector text up to '{', then a balanced block.
        let sel_start = pos;
        let Some(brace) = scan_until_brace(css, pos) else {
            tracing::warn!("unterminated selector text, passing through");
            segments.push(Segment::Passthrough(css[sel_start..].to_string()));
            break;
        };
        let Some(block_end) = scan_block(css, brace) else {
            tracing::warn!("unterminated declaration block, passing through");
            segments.push(Segment::Passthrough(css[sel_start..].to_string()));
            break;
        };
        segments.push(Segment::Style {
            selectors: css[sel_start..brace].to_string(),
            block: css[brace..block_end].to_string(),
        });
        pos = block_end;
    }

    segments
}

/// Find the end of an at-rule starting at `pos` (the '@').
fn scan_at_rule(css: &str, pos: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return Some(i + 1),
            b'{' => return scan_block(css, i),
            b'"' | b'\'' => i = scan_string(css, i)?,
            b'/' if css[i..].starts_with("/*") => {
                i += css[i..].find("*/").map(|e| e + 2)?;
            }
            _ => i += 1,
        }
    }
    None
}

/// Find the index of the next top-level '{' starting at `pos`.
fn scan_until_brace(css: &str, pos: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => return Some(i),
            b'"' | b'\'' => i = scan_string(css, i)?,
            b'/' if css[i..].starts_with("/*") => {
                i += css[i..].find("*/").map(|e| e + 2)?;
            }
            _ => i += 1,
        }
    }
    None
}

/// Given `pos` at a '{', return the index just past its matching '}'.
fn scan_block(css: &str, pos: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut depth = 0usize;
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' => i = scan_string(css, i)?,
            b'/' if css[i..].starts_with("/*") => {
                i += css[i..].find("*/").map(|e| e + 2)?;
            }
            _ => i += 1,
        }
    }
    None
}

/// Given `pos` at a quote, return the index just past the closing quote.
fn scan_string(css: &str, pos: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let quote = bytes[pos];
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
