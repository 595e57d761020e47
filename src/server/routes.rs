use crate::errors::{PricingError, PricingResult};
use crate::models::sweep::{HeatmapGrid, SweepSpec};
use crate::models::ValuationRequest;
use crate::server::ApiError;
use crate::state::{AppState, HeatmapQuery, HeatmapResponse, PerfCounters, ValuationResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;
use uuid::Uuid;

/// Price one request and wrap it for the dashboard. Shared by REST and WS.
pub fn valuate(
    state: &AppState,
    request_id: Uuid,
    request: &ValuationRequest,
) -> PricingResult<ValuationResponse> {
    match state.engine.value(request) {
        Ok(valuation) => {
            PerfCounters::bump(&state.counters.valuations_computed);
            tracing::debug!(
                %request_id,
                call = valuation.prices.call_price,
                put = valuation.prices.put_price,
                "valuation computed"
            );
            Ok(ValuationResponse::new(request_id, &valuation))
        }
        Err(e) => Err(rejected(state, request_id, e)),
    }
}

/// Count and log a rejected request, then hand the error back.
pub(crate) fn rejected(state: &AppState, request_id: Uuid, e: PricingError) -> PricingError {
    PerfCounters::bump(&state.counters.requests_rejected);
    tracing::warn!(%request_id, kind = e.kind(), error = %e, "request rejected");
    e
}

/// Unwrap a JSON body. A body that does not deserialize becomes a `parse`
/// error with the rejection's status.
fn parse_body<T>(
    state: &AppState,
    request_id: Uuid,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let status = rejection.status();
            let e = rejected(state, request_id, PricingError::Parse(rejection.body_text()));
            Err(ApiError {
                status,
                ..ApiError::from(e)
            })
        }
    }
}

/// POST /api/valuation -- headline prices, PnL and risk metrics
pub async fn post_valuation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ValuationRequest>, JsonRejection>,
) -> Result<Json<ValuationResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let request = parse_body(&state, request_id, body)?;
    Ok(Json(valuate(&state, request_id, &request)?))
}

/// POST /api/heatmap -- value and PnL grids over spot x volatility
pub async fn post_heatmap(
    State(state): State<Arc<AppState>>,
    body: Result<Json<HeatmapQuery>, JsonRejection>,
) -> Result<Json<HeatmapResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let query = parse_body(&state, request_id, body)?;
    let request = query.request;

    // The default sweep is derived from the request, so check the request first.
    request
        .validate()
        .map_err(|e| rejected(&state, request_id, e))?;

    let sweep = query
        .sweep
        .unwrap_or_else(|| SweepSpec::around(&request, state.config.heatmap_steps));

    sweep
        .validate(state.config.heatmap_max_steps)
        .map_err(|e| rejected(&state, request_id, e))?;

    // Grid pricing is CPU-bound; keep it off the async workers.
    let worker = state.clone();
    let grid = tokio::task::spawn_blocking(move || {
        HeatmapGrid::compute(&worker.engine, &request, &sweep)
    })
    .await
    .map_err(|e| {
        tracing::error!(%request_id, error = %e, "heatmap worker failed");
        ApiError::internal(format!("heatmap worker failed: {e}"))
    })?
    .map_err(|e| rejected(&state, request_id, e))?;

    let (rows, cols) = grid.shape();
    PerfCounters::bump(&state.counters.heatmaps_computed);
    state
        .counters
        .grid_cells_priced
        .fetch_add((rows * cols) as u64, portable_atomic::Ordering::Relaxed);
    tracing::info!(%request_id, rows, cols, "heatmap computed");

    Ok(Json(HeatmapResponse {
        request_id,
        computed_at: chrono::Utc::now().to_rfc3339(),
        sweep,
        grid,
    }))
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "valuations_computed": state.counters.valuations_computed.load(Relaxed),
        "heatmaps_computed": state.counters.heatmaps_computed.load(Relaxed),
        "grid_cells_priced": state.counters.grid_cells_priced.load(Relaxed),
        "requests_rejected": state.counters.requests_rejected.load(Relaxed),
        "ws_sessions": state.counters.ws_sessions.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}

/// GET /api/health -- liveness plus the active precision and grid limits
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "decimal_places": state.engine.precision().decimal_places(),
        "heatmap_steps": state.config.heatmap_steps,
        "heatmap_max_steps": state.config.heatmap_max_steps,
    }))
}
