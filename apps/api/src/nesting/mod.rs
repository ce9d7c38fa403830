// Sheet nesting: shape merging, sheet templates, the oracle seam and the allocation loop.
// The allocation loop is blocking and must run inside tokio::task::spawn_blocking.

pub mod allocator;
pub mod bounds;
pub mod handlers;
pub mod oracle;
pub mod shapes;
pub mod sheet;
pub mod shelf;

use xmltree::{Element, EmitterConfig, Namespace};

use crate::nesting::sheet::SVG_NAMESPACE;

/// An empty `<svg>` root in the SVG namespace with the given `viewBox`.
pub(crate) fn svg_root(view_box: &str) -> Element {
    let mut root = svg_element();
    root.attributes
        .insert("viewBox".to_string(), view_box.to_string());
    root
}

/// An empty `<svg>` root in the SVG namespace, no bounds declared.
pub(crate) fn svg_element() -> Element {
    let mut root = Element::new("svg");
    root.namespace = Some(SVG_NAMESPACE.to_string());
    let mut namespaces = Namespace::empty();
    namespaces.put("", SVG_NAMESPACE);
    root.namespaces = Some(namespaces);
    root
}

/// Serializes an element without the XML declaration.
pub(crate) fn render_svg(element: &Element) -> Result<String, xmltree::Error> {
    let mut buf = Vec::new();
    element.write_with_config(
        &mut buf,
        EmitterConfig::new().write_document_declaration(false),
    )?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
