//! Sheet Allocation Orchestrator — finds the fewest sheets that hold every shape.
//!
//! # Algorithm
//! Offer the oracle 1, 2, 3, ... identical copies of the template, always asking for a
//! partial solution, and stop at the first count with zero failures. Two outcomes end
//! the search without success:
//! - every shape failed: nothing fits one sheet of this size (`NoShapeFits`)
//! - more sheets offered than there are shapes, yet something still failed: at least one
//!   shape is larger than the sheet (`OneShapeTooBig`)
//!
//! The sheet count grows by one per attempt, so the loop makes at most `total + 1` calls
//! and the first success is the minimal sheet count.
//!
//! Runs synchronously; callers move it onto `tokio::task::spawn_blocking`.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::nesting::oracle::{NestingOracle, OracleError, OracleParams, PackParams};
use crate::nesting::shapes::ShapeCollection;
use crate::nesting::sheet::SheetTemplate;

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

/// Why a request can never be satisfied with sheets of the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingErrorKind {
    /// Not a single shape fits on one sheet.
    NoShapeFits,
    /// Some shape stays unplaced even with more sheets than shapes.
    OneShapeTooBig,
}

impl PackingErrorKind {
    /// Stable machine-readable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            PackingErrorKind::NoShapeFits => "NO_SHAPE_FITS",
            PackingErrorKind::OneShapeTooBig => "ONE_SHAPE_TOO_BIG",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PackingErrorKind::NoShapeFits => {
                "No shape fits onto a single sheet of the requested size"
            }
            PackingErrorKind::OneShapeTooBig => {
                "At least one shape is too large for a sheet of the requested size"
            }
        }
    }
}

impl std::fmt::Display for PackingErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// A successful allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSheets {
    /// Sheet documents ordered by ascending sheet index.
    pub sheets: Vec<String>,
    /// Number of sheets offered on the successful attempt (the minimum).
    pub sheet_count: usize,
    /// Oracle calls made.
    pub attempts: usize,
}

/// Terminal result of one allocation run.
#[derive(Debug, Clone, PartialEq)]
pub enum PackingOutcome {
    Packed(PackedSheets),
    Unsatisfiable(PackingErrorKind),
}

/// Failures that are not a property of the shapes versus the sheet size.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("allocation exceeded its deadline after {attempts} attempt(s) ({elapsed:?})")]
    Timeout { attempts: usize, elapsed: Duration },

    #[error(
        "oracle reported {placed} placed + {failed} failed with {sheet_count} sheet(s), \
         expected {total} shapes"
    )]
    OracleContract {
        sheet_count: usize,
        placed: usize,
        failed: usize,
        total: usize,
    },

    #[error("oracle error: {0}")]
    Oracle(OracleError),
}

impl From<OracleError> for AllocationError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::MalformedInput(msg) => AllocationError::MalformedInput(msg),
            other => AllocationError::Oracle(other),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Grows the sheet count until the oracle places every shape, or the request is
/// shown to be unsatisfiable.
///
/// `deadline` is checked before each oracle call, never during one.
pub fn allocate(
    oracle: &dyn NestingOracle,
    shapes: &ShapeCollection,
    template: &SheetTemplate,
    params: &PackParams,
    persist: bool,
    deadline: Option<Instant>,
) -> Result<PackingOutcome, AllocationError> {
    let total = shapes.total_count();
    if shapes.is_empty() {
        return Ok(PackingOutcome::Packed(PackedSheets {
            sheets: Vec::new(),
            sheet_count: 0,
            attempts: 0,
        }));
    }

    let oracle_params = OracleParams {
        pack: *params,
        partial_solution: true,
        persist,
    };
    debug!(
        total,
        oracle = oracle.name(),
        persist = oracle_params.persist,
        "Starting allocation"
    );
    let started = Instant::now();
    let mut sheets = vec![*template];
    let mut attempts = 0usize;

    loop {
        let sheet_count = sheets.len();

        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(attempts, sheet_count, "Allocation deadline reached");
            return Err(AllocationError::Timeout {
                attempts,
                elapsed: started.elapsed(),
            });
        }

        attempts += 1;
        let output = oracle.pack(&sheets, shapes, &oracle_params)?;
        let (placed, failed) = (output.placed, output.failed);

        debug!(sheet_count, placed, failed, total, "Allocation attempt");

        if placed + failed != total {
            return Err(AllocationError::OracleContract {
                sheet_count,
                placed,
                failed,
                total,
            });
        }

        if failed == 0 {
            let mut produced = output.sheets;
            produced.sort_by_key(|(index, _)| *index);

            info!(
                sheet_count,
                attempts,
                shapes = total,
                oracle = oracle.name(),
                "Allocation succeeded"
            );
            return Ok(PackingOutcome::Packed(PackedSheets {
                sheets: produced.into_iter().map(|(_, svg)| svg).collect(),
                sheet_count,
                attempts,
            }));
        }

        let verdict = if failed == total {
            Some(PackingErrorKind::NoShapeFits)
        } else if sheet_count > total {
            Some(PackingErrorKind::OneShapeTooBig)
        } else {
            None
        };

        if let Some(kind) = verdict {
            warn!(
                sheet_count,
                attempts,
                failed,
                code = kind.code(),
                "Allocation unsatisfiable"
            );
            return Ok(PackingOutcome::Unsatisfiable(kind));
        }

        sheets.push(*template);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
