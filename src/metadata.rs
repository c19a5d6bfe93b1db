//! Inline metadata extraction.
//!
//! Headings and item lines carry `key:value` annotations mixed into ordinary
//! text:
//!
//! ```text
//! ## ID:Box1 (parent:Garage) Storage Box 1 tag:tools,workshop
//! * type:drill Cordless drill (shelf:top)
//! ```
//!
//! [`extract`] splits such a line into a clean display label and a
//! [`Metadata`] value.
//!
//! ## Recognized keys
//!
//! | Key | Field | Notes |
//! |---|---|---|
//! | `ID` | [`Metadata::id`] | explicit identifier |
//! | `parent` | [`Metadata::parent`] | overrides heading nesting |
//! | `tag` | [`Metadata::tags`] | comma-separated, accumulates |
//! | `type` | [`Metadata::kind`] | free-form category |
//! | `photos` | [`Metadata::photos`] | photo directory override |
//!
//! Keys match case-insensitively (`ID:`, `id:` and `Id:` are the same key).
//! A repeated single-valued key keeps its last value.
//!
//! ## Tokens
//!
//! A token is a run of text delimited by whitespace or parentheses, so
//! `Box(parent:Garage)` and `(tag:a,b)(type:bin)` split cleanly and a value
//! never runs past a closing parenthesis. Several tokens may share one pair
//! of parentheses. Recognized
//! tokens are removed from the label, then empty parentheses and repeated
//! whitespace are cleaned up.
//!
//! Any other `key:value`-shaped token is recorded in
//! [`Metadata::extensions`] but stays in the label: an unknown key might be
//! ordinary prose, and the label must never lose words. A key starts with an
//! ASCII letter, so `10:30` is not a token, and values starting with `//`
//! (URLs) are ignored.

use crate::types::Extensions;

/// Metadata fields pulled out of one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub id: Option<String>,
    pub parent: Option<String>,
    pub kind: Option<String>,
    pub photos: Option<String>,
    pub tags: Vec<String>,
    /// Unrecognized `key:value` pairs, keys as written.
    pub extensions: Extensions,
}

/// Result of [`extract`]: the display label and the metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub label: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Id,
    Parent,
    Tag,
    Type,
    Photos,
}

impl Key {
    fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "id" => Some(Key::Id),
            "parent" => Some(Key::Parent),
            "tag" => Some(Key::Tag),
            "type" => Some(Key::Type),
            "photos" => Some(Key::Photos),
            _ => None,
        }
    }
}

/// Split `text` into a display label and metadata.
pub fn extract(text: &str) -> Extracted {
    let mut metadata = Metadata::default();
    let mut removed: Vec<(usize, usize)> = Vec::new();

    for (start, end) in token_spans(text) {
        let Some((key, value)) = split_token(&text[start..end]) else {
            continue;
        };

        match Key::parse(key) {
            Some(known) => {
                apply(&mut metadata, known, value);
                removed.push((start, end));
            }
            None => {
                metadata
                    .extensions
                    .insert(key.to_string(), value.to_string());
            }
        }
    }

    metadata.tags = normalize_tags(std::mem::take(&mut metadata.tags));

    let mut remaining = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in removed {
        remaining.push_str(&text[cursor..start]);
        remaining.push(' ');
        cursor = end;
    }
    remaining.push_str(&text[cursor..]);

    Extracted {
        label: clean_label(&remaining),
        metadata,
    }
}

/// Trim tags, drop empties and duplicates, keep first-occurrence order.
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn apply(metadata: &mut Metadata, key: Key, value: &str) {
    match key {
        Key::Id => metadata.id = Some(value.to_string()),
        Key::Parent => metadata.parent = Some(value.to_string()),
        Key::Type => metadata.kind = Some(value.to_string()),
        Key::Photos => metadata.photos = Some(value.to_string()),
        Key::Tag => metadata
            .tags
            .extend(value.split(',').map(|t| t.to_string())),
    }
}

/// Byte spans of tokens. Whitespace and parentheses both end a token, so
/// `Box(parent:Garage),` yields `Box`, `parent:Garage` and `,`.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        let boundary = c.is_whitespace() || c == '(' || c == ')';
        match (boundary, start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Split a token into `(key, value)` if it is `key:value`-shaped.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(':')?;
    let mut chars = key.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    if value.is_empty() || value.starts_with("//") {
        return None;
    }
    Some((key, value))
}

/// Drop empty parentheses, collapse whitespace, tidy padding around parens
/// and before commas.
fn clean_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open: Vec<usize> = Vec::new();
    for c in text.chars() {
        match c {
            '(' => {
                open.push(out.len());
                out.push(c);
            }
            ')' => match open.pop() {
                Some(pos) if out[pos + 1..].trim().is_empty() => out.truncate(pos),
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( ", "(")
        .replace(" )", ")")
        .replace(" ,", ",")
}
