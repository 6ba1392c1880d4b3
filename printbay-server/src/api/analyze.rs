//! Model analysis
//!
//! Measures the uploaded mesh when its bytes are available and parse.
//! Anything else gets an estimate drawn from fixed ranges.

use std::time::Instant;

use axum::{Router, extract::State, routing::post};
use chrono::Utc;
use rand::Rng;
use shared::geometry::analyze_mesh;
use shared::models::analysis::{format_of, round_to};
use shared::models::{AnalysisSource, AnalyzeRequest, Complexity, Dimensions, ModelAnalysis};
use shared::{ApiResponse, AppError, AppResult};

use crate::api::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/models-analyze", post(analyze))
}

/// Analysis from random ranges, for files whose geometry is unavailable
pub fn estimate_analysis(req: &AnalyzeRequest, rng: &mut impl Rng) -> ModelAnalysis {
    let vertices = rng.gen_range(1_000..51_000u64);
    let faces = rng.gen_range(2_000..102_000u64);
    let volume = round_to(rng.gen_range(1.0..101.0), 2);
    let mut dim = || round_to(rng.gen_range(10.0..210.0), 1);
    let dimensions = Dimensions::new(dim(), dim(), dim());
    let complexity = Complexity::from_volume(volume);

    let mut warnings = vec!["Geometry estimated from file metadata".to_string()];
    if complexity == Complexity::Complex {
        warnings.push("High complexity model - longer print time expected".into());
    }

    ModelAnalysis {
        id: format!("analysis-{}", shared::util::now_millis()),
        format: format_of(&req.file_name),
        file_name: req.file_name.clone(),
        file_size: req.file_size.unwrap_or_default(),
        vertices,
        faces,
        edges: faces * 3 / 2,
        volume,
        // Surface of a cube holding the same volume
        surface_area: round_to(6.0 * volume.powf(2.0 / 3.0), 2),
        dimensions,
        complexity,
        support_needed: dimensions.z > dimensions.x * 2.0 || dimensions.z > dimensions.y * 2.0,
        printable: true,
        warnings,
        recommendations: vec!["Ensure proper bed adhesion for successful print".into()],
        source: AnalysisSource::Estimated,
        processing_time_ms: rng.gen_range(1_000..6_000),
        timestamp: Utc::now(),
    }
}

/// POST /api/models-analyze
pub async fn analyze(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnalyzeRequest>,
) -> AppResult<ApiResponse<ModelAnalysis>> {
    if req.file_name.trim().is_empty() {
        return Err(AppError::validation("fileName is required"));
    }
    tracing::info!(file_name = %req.file_name, file_id = ?req.file_id, "Analyzing model");

    if let Some(file_id) = &req.file_id
        && let Some(bytes) = state.load_blob(file_id).await
    {
        let started = Instant::now();
        match analyze_mesh(&bytes, &req.file_name) {
            Ok(stats) => {
                let analysis = ModelAnalysis::from_mesh(
                    format!("analysis-{}", shared::util::now_millis()),
                    req.file_name.clone(),
                    bytes.len() as u64,
                    &stats,
                    started.elapsed().as_millis() as u64,
                );
                return Ok(ApiResponse::success(analysis));
            }
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "Mesh parse failed, estimating");
            }
        }
    }

    let analysis = estimate_analysis(&req, &mut rand::thread_rng());
    Ok(ApiResponse::success(analysis))
}
