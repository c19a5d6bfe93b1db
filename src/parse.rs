//! Document scanning: turns the markdown text into a flat container list.
//!
//! Stage 1 of the inventory pipeline. The document is read line by line and
//! every line is classified:
//!
//! | Line | Effect |
//! |---|---|
//! | `#` … `######` heading | opens a new container |
//! | `*`, `-` or `+` bullet | item in the current container (indented = nested) |
//! | `![alt](target)` | ignored, photos come from the filesystem |
//! | `[text](photos/DIR/)` | legacy photo directory for the current container |
//! | fenced code block | skipped entirely |
//! | anything else | appended to the current container's description |
//!
//! ## Heading nesting
//!
//! A stack of `(level, id)` pairs tracks the open headings. A heading of
//! level L pops every entry with level ≥ L; whatever remains on top is the
//! new container's parent. Skipped levels (`#` then `###`) do not create
//! intermediate containers. An explicit `parent:` token replaces the
//! inferred parent but the stack is updated exactly as without it.
//!
//! ## Prose sections
//!
//! Level-1 headings whose text matches one of the configured prose section
//! titles are not containers: their body, up to the next level-1 heading, is
//! kept verbatim in [`ParsedDocument::sections`].

use crate::metadata::{self, Extracted};
use crate::naming::{self, IdRegistry};
use crate::types::{Container, Item};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Duplicate container id '{id}' on line {line} (first declared on line {first_line})")]
    DuplicateId {
        id: String,
        first_line: usize,
        line: usize,
    },
}

/// Recoverable problems found while scanning.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// A bullet item before the first container heading.
    OrphanItem { line: usize, label: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::OrphanItem { line, label } => {
                write!(f, "line {line}: item '{label}' is not inside any container")
            }
        }
    }
}

/// Output of the scan stage.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    /// Prose section title → body text.
    pub sections: BTreeMap<String, String>,
    /// Containers in document order.
    pub containers: Vec<Container>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a whole document.
///
/// `prose_sections` lists the level-1 heading titles to capture as prose
/// instead of containers.
pub fn parse(text: &str, prose_sections: &[String]) -> Result<ParsedDocument, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut state = ParserState::new(prose_sections);
    for (idx, line) in text.lines().enumerate() {
        state.feed(idx + 1, line)?;
    }
    Ok(state.finish())
}

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Item { text: &'a str, nested: bool },
    Image,
    PhotoLink { dir: &'a str },
    Text(&'a str),
}

/// Open prose section: title and the body lines collected so far.
struct Prose<'a> {
    title: String,
    lines: Vec<&'a str>,
}

/// All scan state, threaded through [`ParserState::feed`] one line at a time.
struct ParserState<'a> {
    prose_titles: &'a [String],
    stack: Vec<(u8, String)>,
    containers: Vec<Container>,
    registry: IdRegistry,
    /// Index into `containers` of the container receiving body lines.
    current: Option<usize>,
    /// Fence character of the open code block, if any.
    fence: Option<char>,
    prose: Option<Prose<'a>>,
    sections: BTreeMap<String, String>,
    warnings: Vec<ParseWarning>,
}

impl<'a> ParserState<'a> {
    fn new(prose_titles: &'a [String]) -> Self {
        Self {
            prose_titles,
            stack: Vec::new(),
            containers: Vec::new(),
            registry: IdRegistry::new(),
            current: None,
            fence: None,
            prose: None,
            sections: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn feed(&mut self, line_no: usize, line: &'a str) -> Result<(), ParseError> {
        if let Some(marker) = self.fence {
            if fence_marker(line) == Some(marker) {
                self.fence = None;
            }
            self.push_prose(line);
            return Ok(());
        }
        if let Some(marker) = fence_marker(line) {
            self.fence = Some(marker);
            self.push_prose(line);
            return Ok(());
        }

        let classified = classify(line);
        if let Some(prose) = &mut self.prose {
            match classified {
                Line::Heading { level: 1, .. } => self.close_prose(),
                _ => {
                    prose.lines.push(line);
                    return Ok(());
                }
            }
        }

        match classified {
            Line::Blank | Line::Image => {}
            Line::Heading { level, text } => self.heading(line_no, level, text)?,
            Line::Item { text, nested } => self.item(line_no, text, nested),
            Line::PhotoLink { dir } => {
                if let Some(c) = self.current_mut()
                    && c.photos_link.is_none()
                {
                    c.photos_link = Some(dir.to_string());
                }
            }
            Line::Text(text) => {
                if let Some(c) = self.current_mut() {
                    if !c.description.is_empty() {
                        c.description.push(' ');
                    }
                    c.description.push_str(text);
                }
            }
        }
        Ok(())
    }

    fn heading(&mut self, line_no: usize, level: u8, text: &str) -> Result<(), ParseError> {
        if level == 1 && self.prose_titles.iter().any(|t| t == text) {
            self.stack.clear();
            self.current = None;
            self.prose = Some(Prose {
                title: text.to_string(),
                lines: Vec::new(),
            });
            return Ok(());
        }

        let Extracted { label, metadata } = metadata::extract(text);

        let id = match metadata.id {
            Some(id) => {
                self.registry
                    .claim_explicit(&id, line_no)
                    .map_err(|first_line| ParseError::DuplicateId {
                        id: id.clone(),
                        first_line,
                        line: line_no,
                    })?;
                id
            }
            None => self
                .registry
                .claim_generated(&naming::generate_id(&label), line_no),
        };

        while self.stack.last().is_some_and(|(l, _)| *l >= level) {
            self.stack.pop();
        }
        let structural = self.stack.last().map(|(_, id)| id.clone());
        let parent = metadata.parent.or(structural);
        self.stack.push((level, id.clone()));

        debug!(id = %id, parent = ?parent, level, "container");

        self.containers.push(Container {
            id,
            label,
            parent,
            heading_level: level,
            kind: metadata.kind,
            tags: metadata.tags,
            photos: metadata.photos,
            photos_link: None,
            description: String::new(),
            metadata: metadata.extensions,
            items: Vec::new(),
            line: line_no,
            photos_dir: String::new(),
            images: Vec::new(),
        });
        self.current = Some(self.containers.len() - 1);
        Ok(())
    }

    fn item(&mut self, line_no: usize, text: &str, nested: bool) {
        let Extracted { label, metadata } = metadata::extract(text);
        let Some(container) = self.current_mut() else {
            warn!(line = line_no, label = %label, "item outside any container");
            self.warnings.push(ParseWarning::OrphanItem {
                line: line_no,
                label,
            });
            return;
        };

        // Items never move, so `parent:` and `photos:` are plain metadata here.
        let mut extra = metadata.extensions;
        if let Some(parent) = metadata.parent {
            extra.insert("parent".to_string(), parent);
        }
        if let Some(photos) = metadata.photos {
            extra.insert("photos".to_string(), photos);
        }

        let parent_container_id = container.id.clone();
        container.items.push(Item {
            id: metadata.id,
            label,
            kind: metadata.kind,
            tags: metadata.tags,
            parent_container_id,
            metadata: extra,
            nested,
        });
    }

    fn current_mut(&mut self) -> Option<&mut Container> {
        self.current.and_then(|i| self.containers.get_mut(i))
    }

    fn push_prose(&mut self, line: &'a str) {
        if let Some(prose) = &mut self.prose {
            prose.lines.push(line);
        }
    }

    fn close_prose(&mut self) {
        if let Some(Prose { title, lines }) = self.prose.take() {
            let body = lines.join("\n").trim().to_string();
            match self.sections.get_mut(&title) {
                Some(existing) if !body.is_empty() => {
                    existing.push_str("\n\n");
                    existing.push_str(&body);
                }
                Some(_) => {}
                None => {
                    self.sections.insert(title, body);
                }
            }
        }
    }

    fn finish(mut self) -> ParsedDocument {
        self.close_prose();
        ParsedDocument {
            sections: self.sections,
            containers: self.containers,
            warnings: self.warnings,
        }
    }
}

/// The fence character if `line` opens or closes a fenced code block.
fn fence_marker(line: &str) -> Option<char> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_thematic_break(trimmed) {
        return Line::Blank;
    }

    if line.starts_with('#') {
        let level = line.chars().take_while(|&c| c == '#').count();
        let rest = &line[level..];
        if level <= 6 && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            return Line::Heading {
                level: level as u8,
                text: rest.trim(),
            };
        }
        return Line::Text(trimmed);
    }

    let unindented = line.trim_start();
    let mut chars = unindented.chars();
    if let (Some('*' | '-' | '+'), Some(c)) = (chars.next(), chars.next())
        && c.is_whitespace()
    {
        let text = unindented[1..].trim();
        if text.is_empty() {
            return Line::Blank;
        }
        return Line::Item {
            text,
            nested: unindented.len() < line.len(),
        };
    }

    if trimmed.starts_with("![") {
        return Line::Image;
    }
    if let Some(dir) = legacy_photo_dir(trimmed) {
        return Line::PhotoLink { dir };
    }
    Line::Text(trimmed)
}

/// `[text](photos/DIR/)` → `DIR`.
///
/// Only a single directory segment counts; a link to a file such as
/// `photos/DIR/front.jpg` is ordinary text.
fn legacy_photo_dir(line: &str) -> Option<&str> {
    if !line.starts_with('[') || !line.ends_with(')') {
        return None;
    }
    let (_, target) = line.split_once("](")?;
    let path = target.strip_suffix(')')?.strip_prefix("photos/")?;
    let dir = path.strip_suffix('/').unwrap_or(path);
    (!dir.is_empty() && !dir.contains('/')).then_some(dir)
}

fn is_thematic_break(trimmed: &str) -> bool {
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&m| compact.chars().all(|c| c == m))
}
