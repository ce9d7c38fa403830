//! Axis-aligned bounding boxes of SVG shape elements.
//!
//! Each shape is wrapped in a bare `<svg>` and resolved by `usvg`, so transforms, units and
//! `auto` radii follow the SVG rules. Boxes are the exact object bounds (stroke excluded).
//! Text needs loaded fonts to have geometry and measures as nothing.

use xmltree::{Element, XMLNode};

use crate::nesting::{render_svg, svg_element};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl From<usvg::Rect> for BoundingBox {
    fn from(rect: usvg::Rect) -> Self {
        BoundingBox {
            min_x: f64::from(rect.left()),
            min_y: f64::from(rect.top()),
            max_x: f64::from(rect.right()),
            max_y: f64::from(rect.bottom()),
        }
    }
}

/// Measures `element` in the coordinate space of its parent, its own `transform` included.
///
/// `Ok(None)` means nothing renders: an empty group, `<title>`, a `<rect>` without a size.
pub fn measure(
    element: &Element,
    options: &usvg::Options,
) -> Result<Option<BoundingBox>, String> {
    let mut wrapper = svg_element();
    wrapper.children.push(XMLNode::Element(element.clone()));
    let text = render_svg(&wrapper)
        .map_err(|e| format!("cannot serialize <{}>: {e}", element.name))?;

    let tree = usvg::Tree::from_str(&text, options)
        .map_err(|e| format!("cannot read <{}>: {e}", element.name))?;

    let root = tree.root();
    if !root.has_children() {
        return Ok(None);
    }
    Ok(Some(root.abs_bounding_box().into()))
}
