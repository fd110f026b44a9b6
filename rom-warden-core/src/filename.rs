//! Parser for No-Intro/Redump-style file names.
//!
//! Collection file names encode metadata in parenthesized and bracketed
//! tags:
//! ```text
//! Game Name (USA, Europe) (Rev A) (v1.1) [SLUS-00123]
//! ```
//!
//! This parser extracts the base title, regions, version/revision, and a
//! serial if one is embedded. It also provides the tag-stripping and
//! normalization helpers the duplicate detector groups names with.

use crate::region::Region;

/// Parsed components of a collection file name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedName {
    /// Base title without any parenthetical or bracketed tags.
    pub title: String,
    /// Region strings as they appear in the name (e.g., "USA", "Japan").
    pub regions: Vec<Region>,
    /// Version string if present (e.g., "v1.0", "v1.1").
    pub version: Option<String>,
    /// Revision string if present (e.g., "Rev A", "Rev 1").
    pub revision: Option<String>,
    /// Serial embedded in a bracket tag (e.g., "[SLUS-00594]").
    pub serial: Option<String>,
    /// Remaining tags that didn't classify (e.g., "Proto", "Beta").
    pub flags: Vec<String>,
}

/// Known region words accepted inside parenthesized tags.
const KNOWN_REGIONS: &[&str] = &[
    "USA", "Japan", "Europe", "World", "Australia", "Korea", "China", "Asia", "Brazil",
];

#[derive(Debug)]
enum Tag {
    Paren(String),
    Bracket(String),
}

/// Parse a file name (with or without extension) into its components.
pub fn parse_file_name(name: &str) -> ParsedName {
    let stem = strip_extension(name);
    let (title, tags) = extract_title_and_tags(stem);

    let mut result = ParsedName {
        title,
        ..Default::default()
    };

    for tag in &tags {
        match tag {
            Tag::Paren(content) => classify_paren_tag(content, &mut result),
            Tag::Bracket(content) => classify_bracket_tag(content, &mut result),
        }
    }

    result
}

/// Drop a trailing `.ext` if the extension looks like one (1-4 alphanumerics).
fn strip_extension(name: &str) -> &str {
    if let Some(dot) = name.rfind('.') {
        let ext = &name[dot + 1..];
        if (1..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return &name[..dot];
        }
    }
    name
}

/// Split a name into the base title and a sequence of (paren) and [bracket] tags.
fn extract_title_and_tags(name: &str) -> (String, Vec<Tag>) {
    let mut tags = Vec::new();
    let mut title_end = None;
    let mut chars = name.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let (open, close, make_tag): (char, char, fn(String) -> Tag) = match ch {
            '(' => ('(', ')', Tag::Paren),
            '[' => ('[', ']', Tag::Bracket),
            _ => continue,
        };

        if title_end.is_none() {
            title_end = Some(i);
        }

        let mut depth = 1u32;
        let start = i + open.len_utf8();
        let mut end = start;

        for (j, c) in chars.by_ref() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    end = j;
                    break;
                }
            }
        }

        let content = name[start..end].to_string();
        if !content.is_empty() {
            tags.push(make_tag(content));
        }
    }

    let title = match title_end {
        Some(pos) => name[..pos].trim_end().to_string(),
        None => name.trim().to_string(),
    };

    (title, tags)
}

fn classify_paren_tag(content: &str, result: &mut ParsedName) {
    let trimmed = content.trim();

    // Region tag: "USA", "Japan", "USA, Europe", etc.
    if is_region_string(trimmed) {
        for part in trimmed.split(',') {
            if let Some(region) = Region::from_tag(part) {
                if !result.regions.contains(&region) {
                    result.regions.push(region);
                }
            }
        }
        return;
    }

    // Revision: "Rev A", "Rev 1", "Rev 1.1"
    if let Some(rev) = trimmed.strip_prefix("Rev ") {
        result.revision = Some(format!("Rev {rev}"));
        return;
    }

    // Version: "v1.0", "V1.2"
    if (trimmed.starts_with('v') || trimmed.starts_with('V'))
        && trimmed.len() > 1
        && trimmed.as_bytes()[1].is_ascii_digit()
    {
        result.version = Some(trimmed.to_string());
        return;
    }

    result.flags.push(trimmed.to_string());
}

fn classify_bracket_tag(content: &str, result: &mut ParsedName) {
    let trimmed = content.trim();

    // Serial: "SLUS-00594", "NTR-AMCE-USA" — uppercase letters/digits with
    // at least one hyphen separating groups.
    if looks_like_serial(trimmed) {
        result.serial = Some(trimmed.to_string());
        return;
    }

    result.flags.push(trimmed.to_string());
}

fn looks_like_serial(s: &str) -> bool {
    if !s.contains('-') || s.len() < 6 || s.len() > 16 {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
}

fn is_region_string(s: &str) -> bool {
    s.split(',').all(|part| {
        let trimmed = part.trim();
        KNOWN_REGIONS
            .iter()
            .any(|r| r.eq_ignore_ascii_case(trimmed))
    })
}

// ── Tag stripping for duplicate grouping ────────────────────────────────────

/// Remove parenthesized/bracketed tags containing a region word.
///
/// `"Chrono Trigger (USA).sfc"` → `"Chrono Trigger.sfc"`. Tags that mix a
/// region with other words (e.g. "(USA, Europe)") are removed whole.
pub fn strip_region_tags(name: &str) -> String {
    strip_tags_matching(name, |content| {
        content.split(',').any(|part| {
            KNOWN_REGIONS
                .iter()
                .any(|r| r.eq_ignore_ascii_case(part.trim()))
        })
    })
}

/// Remove parenthesized/bracketed version and revision tags
/// (`(v1.0)`, `(Rev A)`, `[v1.1]`).
pub fn strip_version_tags(name: &str) -> String {
    strip_tags_matching(name, |content| {
        let t = content.trim();
        t.starts_with("Rev ")
            || ((t.starts_with('v') || t.starts_with('V'))
                && t.len() > 1
                && t.as_bytes()[1].is_ascii_digit())
    })
}

fn strip_tags_matching(name: &str, matches: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let close = match ch {
            '(' => ')',
            '[' => ']',
            _ => {
                out.push(ch);
                continue;
            }
        };

        let open = ch;
        let mut depth = 1u32;
        let start = i + open.len_utf8();
        let mut end = start;
        for (j, c) in chars.by_ref() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    end = j;
                    break;
                }
            }
        }

        let content = &name[start..end];
        if !matches(content) {
            out.push(open);
            out.push_str(content);
            out.push(close);
        }
    }

    // Collapse runs of spaces left behind by removed tags
    let mut collapsed = String::with_capacity(out.len());
    let mut prev_space = false;
    for c in out.trim().chars() {
        if c == ' ' {
            if !prev_space {
                collapsed.push(c);
            }
            prev_space = true;
        } else {
            collapsed.push(c);
            prev_space = false;
        }
    }
    collapsed
}

/// Normalize a name for comparison: drop the extension, remove every
/// parenthesized/bracketed/braced tag, lowercase, map punctuation to
/// spaces, and collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let stem = strip_extension(name);
    let without_tags = strip_tags_matching(stem, |_| true);

    let mut cleaned = String::with_capacity(without_tags.len());
    for c in without_tags.chars() {
        if c.is_ascii_alphanumeric() {
            cleaned.push(c.to_ascii_lowercase());
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a numeric version from a version/revision string for comparison.
///
/// `"v1.2"` → 1.2, `"Rev 2"` → 2.0, `"Rev A"` → 1.0 (letters map to their
/// alphabet position).
pub fn version_number(version: &str) -> Option<f64> {
    let trimmed = version.trim();

    if let Some(rest) = trimmed.strip_prefix("Rev ").or_else(|| trimmed.strip_prefix("rev ")) {
        let rest = rest.trim();
        if let Ok(n) = rest.parse::<f64>() {
            return Some(n);
        }
        // Letter revisions: A=1, B=2, ...
        let mut chars = rest.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                return Some((c.to_ascii_uppercase() as u8 - b'A' + 1) as f64);
            }
        }
        return None;
    }

    let digits = trimmed.trim_start_matches(['v', 'V']);
    let numeric: String = digits
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok()
}
