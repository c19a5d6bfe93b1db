//! Container id generation and the per-document id registry.
//!
//! Headings without an explicit `ID:` token get an id derived from their
//! label:
//!
//! - `"Storage Box 1"` → `"storage-box-1"`
//! - `"A78 - stor"` → `"a78-stor"`
//! - `"Kasse på loftet!"` → `"kasse-på-loftet"`
//! - `"???"` → `"container"`
//!
//! The derivation is a pure function of the label, so an id only changes
//! when its own heading text changes. Collisions are resolved by the
//! [`IdRegistry`], which appends `-2`, `-3`, … in order of first occurrence.

use std::collections::HashMap;

/// Generated ids are truncated to this many characters (before any
/// collision suffix).
pub const MAX_ID_LEN: usize = 50;

const FALLBACK_ID: &str = "container";

/// Derive an id from a display label.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, strips leading and trailing dashes and truncates to
/// [`MAX_ID_LEN`] characters.
pub fn generate_id(label: &str) -> String {
    let mut id = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(c);
        } else {
            pending_dash = true;
        }
    }

    let truncated: String = id.chars().take(MAX_ID_LEN).collect();
    let trimmed = truncated.trim_end_matches('-');
    if trimmed.is_empty() {
        FALLBACK_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Every container id claimed so far in one document, with the line that
/// claimed it.
#[derive(Debug, Default)]
pub struct IdRegistry {
    claimed: HashMap<String, usize>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an explicit id.
    ///
    /// Explicit ids are never rewritten: if the id is already taken, by an
    /// explicit or a generated id, returns `Err` with the line of the first
    /// claim.
    pub fn claim_explicit(&mut self, id: &str, line: usize) -> Result<(), usize> {
        if let Some(&first) = self.claimed.get(id) {
            return Err(first);
        }
        self.claimed.insert(id.to_string(), line);
        Ok(())
    }

    /// Claim a generated id, appending the first free `-N` suffix (N ≥ 2)
    /// on collision. Returns the id actually claimed.
    pub fn claim_generated(&mut self, base: &str, line: usize) -> String {
        let mut candidate = base.to_string();
        let mut n = 2;
        while self.claimed.contains_key(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.claimed.insert(candidate.clone(), line);
        candidate
    }
}
