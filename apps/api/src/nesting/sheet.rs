//! Sheet Template Generator — turns a physical sheet size into pixel-space bounds.
//!
//! The template's view box is the canonical bounds of every sheet returned to the caller,
//! whatever bounds the input shape documents declare.

use thiserror::Error;
use xmltree::Element;

use crate::nesting::{render_svg, svg_root};

/// Standard screen resolution, used when neither the request nor the config sets a DPI.
pub const DEFAULT_DPI: f64 = 96.0;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("{field} must be a positive number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} of {value} at {dpi} dpi is too large")]
    TooLarge {
        field: &'static str,
        value: f64,
        dpi: f64,
    },
}

/// A single empty sheet in pixel space. Copied by value into every oracle call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetTemplate {
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl SheetTemplate {
    /// Builds a template of `width × dpi` by `height × dpi` pixels.
    pub fn from_physical(width: f64, height: f64, dpi: f64) -> Result<Self, TemplateError> {
        let width = positive("width", width)?;
        let height = positive("height", height)?;
        let dpi = positive("dpi", dpi)?;

        let pixel_width = scaled("width", width, dpi)?;
        let pixel_height = scaled("height", height, dpi)?;
        Ok(SheetTemplate {
            pixel_width,
            pixel_height,
        })
    }

    /// `viewBox` attribute value, e.g. `0 0 192 96`.
    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.pixel_width, self.pixel_height)
    }

    /// An empty `<svg>` root carrying the template's view box.
    pub fn to_element(&self) -> Element {
        svg_root(&self.view_box())
    }

    /// The empty sheet as SVG text.
    pub fn to_svg_string(&self) -> Result<String, xmltree::Error> {
        render_svg(&self.to_element())
    }
}

fn scaled(field: &'static str, value: f64, dpi: f64) -> Result<f64, TemplateError> {
    let pixels = value * dpi;
    if pixels.is_finite() {
        Ok(pixels)
    } else {
        Err(TemplateError::TooLarge { field, value, dpi })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, TemplateError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TemplateError::NonPositive { field, value })
    }
}
