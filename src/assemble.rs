//! Tree assembly and validation.
//!
//! Turns the flat, document-ordered container list into the nested
//! [`Document`]. Validation runs before anything is nested:
//!
//! - every `parent` must name a container in the same document,
//! - following `parent` links must never loop back (explicit `parent:`
//!   tokens can point anywhere, so cycles are possible).
//!
//! Children and items keep document order.

use crate::metadata::normalize_tags;
use crate::types::{Container, ContainerNode, Document};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AssembleError {
    #[error("Container '{id}' (line {line}) has unknown parent '{parent}'")]
    DanglingParent {
        id: String,
        parent: String,
        line: usize,
    },
    #[error("Parent cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    InProgress,
    Done,
}

/// Validate the containers and nest them into a [`Document`].
///
/// Container ids are assumed unique, which the parser guarantees.
pub fn assemble(
    sections: BTreeMap<String, String>,
    containers: Vec<Container>,
) -> Result<Document, AssembleError> {
    let index: HashMap<&str, usize> = containers
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(containers.len());
    for c in &containers {
        let parent = match &c.parent {
            None => None,
            Some(p) => Some(*index.get(p.as_str()).ok_or_else(|| {
                AssembleError::DanglingParent {
                    id: c.id.clone(),
                    parent: p.clone(),
                    line: c.line,
                }
            })?),
        };
        parents.push(parent);
    }

    check_cycles(&containers, &parents)?;

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); containers.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let containers = build_tree(containers, &children, &roots);

    Ok(Document {
        sections,
        containers,
    })
}

fn check_cycles(containers: &[Container], parents: &[Option<usize>]) -> Result<(), AssembleError> {
    let mut state = vec![Visit::New; containers.len()];
    for start in 0..containers.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut cur = Some(start);
        while let Some(i) = cur {
            match state[i] {
                Visit::Done => break,
                Visit::InProgress => {
                    let pos = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut ids: Vec<String> =
                        path[pos..].iter().map(|&p| containers[p].id.clone()).collect();
                    ids.push(containers[i].id.clone());
                    return Err(AssembleError::Cycle { path: ids });
                }
                Visit::New => {
                    state[i] = Visit::InProgress;
                    path.push(i);
                    cur = parents[i];
                }
            }
        }
        for i in path {
            state[i] = Visit::Done;
        }
    }
    Ok(())
}

/// Move every container into its place in the forest.
///
/// Nodes are built children-first from an explicit stack, so deep parent
/// chains do not grow the call stack.
fn build_tree(
    containers: Vec<Container>,
    children: &[Vec<usize>],
    roots: &[usize],
) -> Vec<ContainerNode> {
    let mut order = Vec::with_capacity(containers.len());
    let mut stack = roots.to_vec();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(&children[i]);
    }

    let mut built: Vec<Option<ContainerNode>> =
        std::iter::repeat_with(|| None).take(containers.len()).collect();
    let mut slots: Vec<Option<Container>> = containers.into_iter().map(Some).collect();
    for &i in order.iter().rev() {
        let Some(c) = slots[i].take() else { continue };
        let child_nodes = children[i]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[i] = Some(into_node(c, child_nodes));
    }

    roots.iter().filter_map(|&i| built[i].take()).collect()
}

fn into_node(c: Container, children: Vec<ContainerNode>) -> ContainerNode {
    let items = c
        .items
        .into_iter()
        .map(|mut item| {
            item.tags = normalize_tags(item.tags);
            item
        })
        .collect();

    ContainerNode {
        id: c.id,
        label: c.label,
        parent: c.parent,
        kind: c.kind,
        heading_level: c.heading_level,
        tags: normalize_tags(c.tags),
        description: c.description,
        photos_dir: c.photos_dir,
        images: c.images,
        items,
        metadata: c.metadata,
        children,
    }
}
