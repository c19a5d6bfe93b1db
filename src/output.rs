//! CLI output formatting for all commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every container is
//! shown by its positional index and label, with its id and photo directory
//! as indented context lines. The output reads as the inventory itself while
//! still letting users trace entries back to directories on disk.
//!
//! # Output Format
//!
//! ## Parse
//!
//! ```text
//! Sections
//!     Intro
//!
//! Containers
//! 001 Garage (2 photos)
//!     ID: garage
//!     Photos: photos/garage/
//!     - Hammer
//!     001 Storage Box 1
//!         ID: Box1
//!         Tags: storage
//!         - Screwdriver set [tools, workshop]
//!
//! 2 containers, 2 items, 2 photos
//! ```
//!
//! ## Thumbnails
//!
//! ```text
//! garage (2 photos)
//!     001 a.jpg
//!         Source: photos/garage/a.jpg
//!         thumbnail: created 800x600
//! ```
//!
//! ## Listings
//!
//! ```text
//! 001 A78 (5 photos) → photo-listings/A78.txt
//!
//! Wrote 1 listing from 3 directories
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::listing::ListingSummary;
use crate::parse::ParseWarning;
use crate::photos::PhotoWarning;
use crate::pipeline::RunResult;
use crate::process::{ProcessEvent, ThumbnailStatus};
use crate::types::{ContainerNode, Document};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional photo count.
///
/// ```text
/// 001 Garage (5 photos)
/// 002 Loft
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({})", format_index(index), title, photos(n)),
        None => format!("{} {}", format_index(index), title),
    }
}

fn photos(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

// ============================================================================
// Parse output
// ============================================================================

/// Format the assembled inventory tree.
pub fn format_document(document: &Document) -> Vec<String> {
    let mut lines = Vec::new();

    if !document.sections.is_empty() {
        lines.push("Sections".to_string());
        for title in document.sections.keys() {
            lines.push(format!("    {}", title));
        }
        lines.push(String::new());
    }

    lines.push("Containers".to_string());
    for (i, node) in document.containers.iter().enumerate() {
        format_container(node, i + 1, 0, &mut lines);
    }
    lines
}

fn format_container(node: &ContainerNode, position: usize, depth: usize, lines: &mut Vec<String>) {
    let base = indent(depth);
    let count = (!node.images.is_empty()).then_some(node.images.len());
    let title = if node.label.is_empty() { &node.id } else { &node.label };
    lines.push(format!("{}{}", base, entity_header(position, title, count)));

    lines.push(format!("{}    ID: {}", base, node.id));
    if let Some(kind) = &node.kind {
        lines.push(format!("{}    Type: {}", base, kind));
    }
    if !node.tags.is_empty() {
        lines.push(format!("{}    Tags: {}", base, node.tags.join(", ")));
    }
    if let Some(first) = node.images.first()
        && let Some(dir) = Path::new(&first.source_path).parent()
    {
        lines.push(format!("{}    Photos: {}/", base, dir.display()));
    }

    for item in &node.items {
        let tags = if item.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", item.tags.join(", "))
        };
        let nest = if item.nested { "    " } else { "" };
        lines.push(format!("{}    {}- {}{}", base, nest, item.label, tags));
    }

    for (i, child) in node.children.iter().enumerate() {
        format_container(child, i + 1, depth + 1, lines);
    }
}

/// Format the result of a `parse` or `check` run.
pub fn format_run_output(result: &RunResult) -> Vec<String> {
    let mut lines = format_document(&result.document);

    let containers = result.document.iter().count();
    let items: usize = result.document.iter().map(|c| c.items.len()).sum();
    let images: usize = result.document.iter().map(|c| c.images.len()).sum();
    lines.push(String::new());
    lines.push(format!(
        "{}, {}, {}",
        plural(containers, "container", "containers"),
        plural(items, "item", "items"),
        photos(images)
    ));

    if let Some(stats) = &result.stats {
        lines.push(format!("Thumbnails: {}", stats));
    }
    if let Some(path) = &result.output_path {
        lines.push(format!("Output: {}", path.display()));
    }
    lines
}

/// Print a `parse` or `check` result to stdout.
pub fn print_run_output(result: &RunResult) {
    for line in format_run_output(result) {
        println!("{}", line);
    }
}

/// Format recoverable problems, one per line.
pub fn format_warnings(parse: &[ParseWarning], photos: &[PhotoWarning]) -> Vec<String> {
    parse
        .iter()
        .map(|w| format!("Warning: {}", w))
        .chain(photos.iter().map(|w| format!("Warning: {}", w)))
        .collect()
}

/// Print warnings to stderr so they never mix with the inventory listing.
pub fn print_warnings(parse: &[ParseWarning], photos: &[PhotoWarning]) {
    for line in format_warnings(parse, photos) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Thumbnail progress
// ============================================================================

/// Format a single thumbnail progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::DirectoryStarted { dir, image_count } => {
            vec![format!("{} ({})", dir, photos(*image_count))]
        }
        ProcessEvent::ThumbnailDone {
            index,
            source_path,
            status,
        } => {
            let filename = Path::new(source_path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| source_path.clone());
            let status = match status {
                ThumbnailStatus::Existing => "existing".to_string(),
                ThumbnailStatus::Created { width, height } => {
                    format!("created {}x{}", width, height)
                }
                ThumbnailStatus::Failed(reason) => format!("failed ({})", reason),
            };
            vec![
                format!("    {} {}", format_index(*index), filename),
                format!("        Source: {}", source_path),
                format!("        thumbnail: {}", status),
            ]
        }
    }
}

// ============================================================================
// Listings output
// ============================================================================

/// Format the result of the `listings` command.
pub fn format_listing_output(summary: &ListingSummary) -> Vec<String> {
    let mut lines: Vec<String> = summary
        .written
        .iter()
        .enumerate()
        .map(|(i, listing)| {
            format!(
                "{} \u{2192} {}",
                entity_header(i + 1, &listing.dir, Some(listing.image_count)),
                listing.path.display()
            )
        })
        .collect();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Wrote {} from {}",
        plural(summary.files_written(), "listing", "listings"),
        plural(summary.directories, "directory", "directories")
    ));
    lines
}

/// Print `listings` output to stdout.
pub fn print_listing_output(summary: &ListingSummary) {
    for line in format_listing_output(summary) {
        println!("{}", line);
    }
}
