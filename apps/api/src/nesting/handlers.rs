//! Axum route handlers for the nesting API.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, trace, Level};
use uuid::Uuid;

use crate::errors::AppError;
use crate::nesting::allocator::{allocate, PackingOutcome};
use crate::nesting::oracle::PackParams;
use crate::nesting::shapes::ShapeCollection;
use crate::nesting::sheet::SheetTemplate;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /pack`. Sizes are physical units, converted to pixels with `dpi`.
#[derive(Debug, Deserialize)]
pub struct PackRequest {
    pub height: f64,
    pub width: f64,
    pub shapes: Vec<String>,
    pub tolerance: Option<f64>,
    pub offset: Option<f64>,
    #[serde(alias = "rotation_count")]
    pub rotations: Option<u32>,
    pub dpi: Option<f64>,
}

impl PackRequest {
    /// Caller knobs with configured defaults filled in.
    fn params(&self, state: &AppState) -> Result<PackParams, AppError> {
        let tolerance = self.tolerance.unwrap_or(state.config.default_tolerance);
        let offset = self.offset.unwrap_or(state.config.default_offset);

        for (field, value) in [("tolerance", tolerance), ("offset", offset)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Validation(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }

        Ok(PackParams {
            tolerance,
            offset,
            rotations: self.rotations.unwrap_or(state.config.default_rotations),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /pack
///
/// Nests every shape onto the fewest sheets of the requested size.
/// Returns the sheet SVG documents in sheet order.
#[tracing::instrument(name = "pack", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn handle_pack(
    State(state): State<AppState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<Json<Vec<String>>, AppError> {
    let Json(request) = payload?;
    if request.shapes.is_empty() {
        return Err(AppError::Validation("shapes cannot be empty".to_string()));
    }

    let dpi = request.dpi.unwrap_or(state.config.default_dpi);
    let template = SheetTemplate::from_physical(request.width, request.height, dpi)?;
    let params = request.params(&state)?;
    let shapes = ShapeCollection::from_documents(&request.shapes)?;

    info!(
        documents = request.shapes.len(),
        shapes = shapes.total_count(),
        sheet = %template.view_box(),
        "Packing request"
    );

    if tracing::enabled!(Level::TRACE) {
        match (template.to_svg_string(), shapes.to_svg_string()) {
            (Ok(sheet), Ok(document)) => trace!(%sheet, %document, "Packing input"),
            (Err(e), _) | (_, Err(e)) => trace!(error = %e, "Packing input not renderable"),
        }
    }

    let oracle = state.oracle.clone();
    let persist = state.config.oracle_persist;
    let deadline = state.config.pack_timeout().map(|t| Instant::now() + t);
    let span = tracing::Span::current();

    // The allocation loop is blocking; keep it off the async executor.
    let outcome = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            allocate(oracle.as_ref(), &shapes, &template, &params, persist, deadline)
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in packing: {e}")))??;

    match outcome {
        PackingOutcome::Packed(packed) => {
            info!(
                sheet_count = packed.sheet_count,
                attempts = packed.attempts,
                "Packing complete"
            );
            Ok(Json(packed.sheets))
        }
        PackingOutcome::Unsatisfiable(kind) => Err(AppError::Unsatisfiable(kind)),
    }
}
