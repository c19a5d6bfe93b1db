//! # Inventory MD
//!
//! Turns a markdown-based home inventory into a structured JSON document.
//! Headings declare containers (rooms, shelves, boxes), bullets declare the
//! items stored in them, and a `photos/` directory next to the document holds
//! one directory of pictures per container.
//!
//! # Pipeline
//!
//! ```text
//! 1. Parse      inventory.md  →  flat containers   (headings, items, metadata tokens)
//! 2. Photos     photos/       →  images per container
//! 3. Assemble   containers    →  validated tree    (parents resolve, no cycles)
//! 4. Thumbnails photos/       →  resized/          (800px, only missing ones)
//! 5. Write      tree          →  inventory.json    (atomic)
//! ```
//!
//! Fatal problems (duplicate ids, dangling parents, cycles) stop the run
//! before anything is written. Everything else (missing photo directories,
//! corrupt images, items outside any container) is reported and skipped.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`parse`] | Single-pass line scanner with an explicit heading stack |
//! | [`metadata`] | `ID:`, `parent:`, `type:`, `tag:`, `photos:` token extraction |
//! | [`naming`] | Container id generation and uniqueness registry |
//! | [`photos`] | Photo directory resolution and image listing |
//! | [`imaging`] | Pure-Rust thumbnail backend |
//! | [`process`] | Parallel thumbnail generation with progress events |
//! | [`assemble`] | Parent validation and tree nesting |
//! | [`pipeline`] | The full run, wiring the stages together |
//! | [`listing`] | Per-directory `photo-listings/*.txt` files |
//! | [`config`] | Optional `inventory.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared data types and the serialized [`types::Document`] |
//!
//! # Document Syntax
//!
//! ```markdown
//! # Garage
//!
//! ## ID:Box1 (parent:Garage) type:box Storage Box 1
//!
//! * tag:tools,workshop Screwdriver set
//! * Extension cord
//! ```
//!
//! Headings without `ID:` get an id derived from their label (`Storage Box 1`
//! becomes `storage-box-1`); collisions get `-2`, `-3`, ... suffixes. Without
//! `parent:`, a heading's parent is the nearest enclosing heading of a lower
//! level.

pub mod assemble;
mod atomic;
pub mod config;
pub mod imaging;
pub mod listing;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod parse;
pub mod photos;
pub mod pipeline;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
