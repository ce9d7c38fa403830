//! Shape Set Builder — merges caller SVG documents into one flat shape collection.
//!
//! Top-level elements of each document become direct children of a single merged `<svg>`.
//! Top-level `<g>` containers are un-grouped exactly one level; anything nested deeper is
//! carried through untouched. Geometry is never inspected here.

use thiserror::Error;
use xmltree::{Element, XMLNode};

/// View box declared on every merged shape document. The oracle needs *some* declared
/// bounds on the shape document; output sheets always take the template's bounds instead.
pub const SHAPE_VIEW_BOX: &str = "0 0 100 100";

const GROUP: &str = "g";

/// Group attributes that must not be copied onto un-grouped children.
const NON_INHERITED: &[&str] = &["id", "transform"];

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("shape document {index} is not valid XML: {source}")]
    Parse {
        index: usize,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("shape document {index} has root <{found}>, expected <svg>")]
    NotSvg { index: usize, found: String },
}

/// The merged, immutable shape set for one request.
#[derive(Debug, Clone)]
pub struct ShapeCollection {
    document: Element,
    total_count: usize,
}

impl ShapeCollection {
    /// Merges `documents` in order into one collection.
    pub fn from_documents<S: AsRef<str>>(documents: &[S]) -> Result<Self, ShapeError> {
        let mut merged = super::svg_root(SHAPE_VIEW_BOX);

        for (index, raw) in documents.iter().enumerate() {
            let root = Element::parse(raw.as_ref().as_bytes())
                .map_err(|source| ShapeError::Parse { index, source })?;

            if root.name != "svg" {
                return Err(ShapeError::NotSvg {
                    index,
                    found: root.name,
                });
            }

            for child in root.children {
                let XMLNode::Element(element) = child else {
                    continue;
                };

                if element.name == GROUP {
                    for grouped in ungroup(element) {
                        merged.children.push(XMLNode::Element(grouped));
                    }
                } else {
                    merged.children.push(XMLNode::Element(element));
                }
            }
        }

        let total_count = merged.children.len();
        Ok(ShapeCollection {
            document: merged,
            total_count,
        })
    }

    /// Wraps an already-built document. Every element child of `document` counts as a shape.
    #[cfg(test)]
    pub fn from_document(document: Element) -> Self {
        let total_count = document
            .children
            .iter()
            .filter(|node| matches!(node, XMLNode::Element(_)))
            .count();
        ShapeCollection {
            document,
            total_count,
        }
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// The merged `<svg>` root.
    pub fn document(&self) -> &Element {
        &self.document
    }

    /// The merged document as SVG text.
    pub fn to_svg_string(&self) -> Result<String, xmltree::Error> {
        super::render_svg(&self.document)
    }

    /// The individual shapes, in merge order.
    pub fn shapes(&self) -> impl Iterator<Item = &Element> {
        self.document.children.iter().filter_map(|node| match node {
            XMLNode::Element(element) => Some(element),
            _ => None,
        })
    }
}

/// Lifts the element children of a top-level group, pushing the group's transform and
/// presentation attributes down onto each child.
fn ungroup(group: Element) -> Vec<Element> {
    let group_transform = group.attributes.get("transform").cloned();
    let inherited: Vec<(String, String)> = group
        .attributes
        .iter()
        .filter(|(name, _)| !NON_INHERITED.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    group
        .children
        .into_iter()
        .filter_map(|node| match node {
            XMLNode::Element(element) => Some(element),
            _ => None,
        })
        .map(|mut child| {
            if let Some(outer) = &group_transform {
                let combined = match child.attributes.get("transform") {
                    Some(inner) => format!("{outer} {inner}"),
                    None => outer.clone(),
                };
                child.attributes.insert("transform".to_string(), combined);
            }
            for (name, value) in &inherited {
                child
                    .attributes
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            child
        })
        .collect()
}
