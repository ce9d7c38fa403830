//! Nesting Oracle — the placement capability the allocator drives.
//!
//! The allocator only ever sees placed/failed counts and finished sheet documents.
//! `ShelfOracle` is the default backend; tests plug in scripted fakes.
//!
//! `AppState` holds an `Arc<dyn NestingOracle>`, chosen at startup.

use thiserror::Error;

use crate::nesting::shapes::ShapeCollection;
use crate::nesting::sheet::SheetTemplate;

// ────────────────────────────────────────────────────────────────────────────
// Parameters and output
// ────────────────────────────────────────────────────────────────────────────

/// Placement-quality knobs supplied by the caller. Forwarded to the oracle unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackParams {
    pub tolerance: f64,
    pub offset: f64,
    pub rotations: u32,
}

/// Everything the oracle receives besides sheets and shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleParams {
    pub pack: PackParams,
    /// Place a subset rather than failing when not every shape fits.
    pub partial_solution: bool,
    /// Keep solver state between calls within one request.
    pub persist: bool,
}

/// Result of one oracle call.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutput {
    /// `(sheet_index, sheet_svg)` for each offered sheet that received at least one shape.
    pub sheets: Vec<(usize, String)>,
    pub placed: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum OracleError {
    /// The shape document cannot be measured (no declared bounds, unknown geometry).
    #[error("malformed shape input: {0}")]
    MalformedInput(String),

    #[error("{failed} shape(s) could not be placed ({placed} placed) and partial solutions are disabled")]
    IncompleteSolution { placed: usize, failed: usize },

    #[error("failed to render sheet: {0}")]
    Render(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// A placement backend. Calls are blocking; the allocator never overlaps them.
pub trait NestingOracle: Send + Sync {
    /// Places as many of `shapes` as possible across `sheets`.
    fn pack(
        &self,
        sheets: &[SheetTemplate],
        shapes: &ShapeCollection,
        params: &OracleParams,
    ) -> Result<OracleOutput, OracleError>;

    /// Backend name, for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
