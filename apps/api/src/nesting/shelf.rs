//! Shelf Oracle — default `NestingOracle` backend.
//!
//! First-fit decreasing-height shelf packing of shape bounding boxes:
//! 1. measure every shape; any unmeasurable shape fails the whole call
//! 2. sort by height, tallest first
//! 3. for each shape, walk the offered sheets in order and take the first shelf with room,
//!    opening a new shelf below the last one when none has room
//!
//! `offset` is the gap left between shapes. Boxes never cross the sheet edge. `tolerance`
//! bounds curve flattening in polygon nesters; boxes here are exact, so it is unused.
//! A 90° turn is tried when `rotations` is a positive multiple of 4.
//! The packer keeps no state between calls, so `persist` has no effect.

use xmltree::{Element, XMLNode};

use crate::nesting::bounds::{measure, BoundingBox};
use crate::nesting::oracle::{NestingOracle, OracleError, OracleOutput, OracleParams};
use crate::nesting::shapes::ShapeCollection;
use crate::nesting::sheet::SheetTemplate;
use crate::nesting::render_svg;

pub struct ShelfOracle;

#[derive(Debug, Clone, Copy)]
struct Item {
    shape_index: usize,
    bounds: BoundingBox,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    shape_index: usize,
    bounds: BoundingBox,
    x: f64,
    y: f64,
    rotated: bool,
}

#[derive(Debug, Clone, Copy)]
struct Shelf {
    y: f64,
    height: f64,
    cursor_x: f64,
}

/// Packing state of one offered sheet.
#[derive(Debug, Default)]
struct SheetLayout {
    shelves: Vec<Shelf>,
    next_shelf_y: f64,
    placements: Vec<Placement>,
}

impl SheetLayout {
    /// Tries to place a `w × h` box inside the sheet, existing shelves first.
    fn place(&mut self, w: f64, h: f64, sheet: &SheetTemplate, offset: f64) -> Option<(f64, f64)> {
        for shelf in self.shelves.iter_mut() {
            if h <= shelf.height && shelf.cursor_x + w <= sheet.pixel_width {
                let at = (shelf.cursor_x, shelf.y);
                shelf.cursor_x += w + offset;
                return Some(at);
            }
        }

        if w <= sheet.pixel_width && self.next_shelf_y + h <= sheet.pixel_height {
            let y = self.next_shelf_y;
            self.shelves.push(Shelf {
                y,
                height: h,
                cursor_x: w + offset,
            });
            self.next_shelf_y = y + h + offset;
            return Some((0.0, y));
        }

        None
    }
}

impl NestingOracle for ShelfOracle {
    fn pack(
        &self,
        sheets: &[SheetTemplate],
        shapes: &ShapeCollection,
        params: &OracleParams,
    ) -> Result<OracleOutput, OracleError> {
        let root = shapes.document();
        let declares_bounds = root.attributes.contains_key("viewBox")
            || (root.attributes.contains_key("width") && root.attributes.contains_key("height"));
        if !declares_bounds {
            return Err(OracleError::MalformedInput(
                "shape document declares no viewBox or width/height".to_string(),
            ));
        }

        let options = usvg::Options::default();
        let elements: Vec<&Element> = shapes.shapes().collect();
        let mut items = Vec::with_capacity(elements.len());
        for (shape_index, element) in elements.iter().enumerate() {
            let bounds = measure(element, &options)
                .map_err(OracleError::MalformedInput)?
                .ok_or_else(|| {
                    OracleError::MalformedInput(format!(
                        "shape {shape_index} (<{}>) has nothing to measure",
                        element.name
                    ))
                })?;
            items.push(Item {
                shape_index,
                bounds,
            });
        }
        items.sort_by(|a, b| b.bounds.height().total_cmp(&a.bounds.height()));

        let offset = params.pack.offset.max(0.0);
        let allow_turn = params.pack.rotations > 0 && params.pack.rotations % 4 == 0;

        let mut layouts: Vec<SheetLayout> = sheets.iter().map(|_| SheetLayout::default()).collect();
        let mut failed = 0usize;

        for item in &items {
            let (w, h) = (item.bounds.width(), item.bounds.height());
            let mut orientations = vec![(w, h, false)];
            if allow_turn && w != h {
                orientations.push((h, w, true));
            }

            let mut slotted = false;
            'sheets: for (layout, sheet) in layouts.iter_mut().zip(sheets) {
                for &(ow, oh, rotated) in &orientations {
                    if let Some((x, y)) = layout.place(ow, oh, sheet, offset) {
                        layout.placements.push(Placement {
                            shape_index: item.shape_index,
                            bounds: item.bounds,
                            x,
                            y,
                            rotated,
                        });
                        slotted = true;
                        break 'sheets;
                    }
                }
            }

            if !slotted {
                failed += 1;
            }
        }

        let placed = items.len() - failed;
        if !params.partial_solution && failed > 0 {
            return Err(OracleError::IncompleteSolution { placed, failed });
        }

        let mut produced = Vec::new();
        for (index, (layout, sheet)) in layouts.iter().zip(sheets).enumerate() {
            if layout.placements.is_empty() {
                continue;
            }
            let svg = render_sheet(sheet, &layout.placements, &elements)
                .map_err(|e| OracleError::Render(e.to_string()))?;
            produced.push((index, svg));
        }

        Ok(OracleOutput {
            sheets: produced,
            placed,
            failed,
        })
    }

    fn name(&self) -> &'static str {
        "shelf"
    }
}

fn render_sheet(
    sheet: &SheetTemplate,
    placements: &[Placement],
    elements: &[&Element],
) -> Result<String, xmltree::Error> {
    let mut root = sheet.to_element();

    for placement in placements {
        let mut element = elements[placement.shape_index].clone();
        let transform = placement_transform(placement);
        let combined = match element.attributes.get("transform") {
            Some(existing) => format!("{transform} {existing}"),
            None => transform,
        };
        element.attributes.insert("transform".to_string(), combined);
        root.children.push(XMLNode::Element(element));
    }

    render_svg(&root)
}

/// Moves the shape's bounding box corner to the placement point, turning it first if needed.
fn placement_transform(placement: &Placement) -> String {
    let bounds = &placement.bounds;
    if placement.rotated {
        // rotate(90) maps (x, y) to (-y, x)
        format!(
            "translate({} {}) rotate(90)",
            placement.x + bounds.max_y,
            placement.y - bounds.min_x
        )
    } else {
        format!(
            "translate({} {})",
            placement.x - bounds.min_x,
            placement.y - bounds.min_y
        )
    }
}
