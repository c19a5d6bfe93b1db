//! Shared types produced by the parse stage and consumed by every later stage.
//!
//! The parse stage yields a flat, document-ordered list of [`Container`]s.
//! Photo resolution fills in [`Container::photos_dir`] and
//! [`Container::images`]; the assembler then nests the flat list into the
//! serialized [`Document`] tree.

use serde::Serialize;
use std::collections::BTreeMap;

/// Unrecognized `key:value` tokens, kept verbatim for forward compatibility.
///
/// A `BTreeMap` so serialization order never depends on insertion order.
pub type Extensions = BTreeMap<String, String>;

/// One physical storage location, as declared by a heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    pub label: String,
    /// Parent container id; `None` only for roots.
    pub parent: Option<String>,
    pub heading_level: u8,
    pub kind: Option<String>,
    pub tags: Vec<String>,
    /// Explicit `photos:` value from the heading.
    pub photos: Option<String>,
    /// Directory named by a deprecated `[..](photos/DIR/)` link line.
    pub photos_link: Option<String>,
    pub description: String,
    pub metadata: Extensions,
    pub items: Vec<Item>,
    /// 1-based source line of the heading.
    pub line: usize,
    /// Resolved in the photo pass; empty until then.
    pub photos_dir: String,
    /// Resolved in the photo pass; empty until then.
    pub images: Vec<Image>,
}

/// A leaf entry for a stored object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: Option<String>,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub parent_container_id: String,
    pub metadata: Extensions,
    /// Bullet was indented under another bullet.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nested: bool,
}

/// One discovered photo.
///
/// Paths are relative to the document's directory, using `/` separators so
/// the output is identical on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub filename: String,
    #[serde(rename = "source")]
    pub source_path: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_path: String,
}

/// The serialized inventory: prose sections plus the container forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, String>,
    pub containers: Vec<ContainerNode>,
}

impl Document {
    /// Depth-first iterator over every container in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerNode> {
        let mut stack: Vec<&ContainerNode> = self.containers.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find a container anywhere in the tree by id.
    pub fn find(&self, id: &str) -> Option<&ContainerNode> {
        self.iter().find(|c| c.id == id)
    }
}

/// A container as it appears in the output tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerNode {
    pub id: String,
    pub label: String,
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub heading_level: u8,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub photos_dir: String,
    pub images: Vec<Image>,
    pub items: Vec<Item>,
    pub metadata: Extensions,
    pub children: Vec<ContainerNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, children: Vec<ContainerNode>) -> ContainerNode {
        ContainerNode {
            id: id.to_string(),
            label: id.to_string(),
            parent: None,
            kind: None,
            heading_level: 1,
            tags: vec![],
            description: String::new(),
            photos_dir: id.to_string(),
            images: vec![],
            items: vec![],
            metadata: Extensions::new(),
            children,
        }
    }

    #[test]
    fn iter_is_depth_first_in_document_order() {
        let doc = Document {
            sections: BTreeMap::new(),
            containers: vec![
                node("a", vec![node("a1", vec![node("a1x", vec![])]), node("a2", vec![])]),
                node("b", vec![]),
            ],
        };
        let ids: Vec<&str> = doc.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn find_reaches_nested_containers() {
        let doc = Document {
            sections: BTreeMap::new(),
            containers: vec![node("a", vec![node("deep", vec![])])],
        };
        assert!(doc.find("deep").is_some());
        assert!(doc.find("missing").is_none());
    }

    #[test]
    fn empty_description_and_sections_are_omitted() {
        let doc = Document {
            sections: BTreeMap::new(),
            containers: vec![node("a", vec![])],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("sections").is_none());
        assert!(json["containers"][0].get("description").is_none());
        assert!(json["containers"][0]["type"].is_null());
        assert!(json["containers"][0]["parent"].is_null());
    }
}
