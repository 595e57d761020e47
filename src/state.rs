use crate::config::AppConfig;
use crate::models::sweep::{HeatmapGrid, SweepSpec};
use crate::models::{MaxGain, PricingEngine, Valuation, ValuationRequest};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Responses OUT of the service ──

/// One valuation as the dashboard consumes it. PnL is flattened to plain
/// numbers (0.0 without a position) with explicit position flags beside them.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValuationResponse {
    pub request_id: uuid::Uuid,
    pub computed_at: String,
    pub request: ValuationRequest,

    pub call_price: f64,
    pub put_price: f64,
    pub call_delta: f64,
    pub put_delta: f64,
    pub gamma: f64,

    pub has_call_position: bool,
    pub call_pnl: f64,
    pub call_pnl_percentage: f64,
    pub has_put_position: bool,
    pub put_pnl: f64,
    pub put_pnl_percentage: f64,

    pub max_call_loss: f64,
    pub max_put_loss: f64,
    pub max_call_gain: MaxGain,
    pub max_put_gain: MaxGain,
    pub call_breakeven: f64,
    pub put_breakeven: f64,
}

impl ValuationResponse {
    pub fn new(request_id: uuid::Uuid, valuation: &Valuation) -> Self {
        let p = &valuation.prices;
        let r = &valuation.risk;
        Self {
            request_id,
            computed_at: chrono::Utc::now().to_rfc3339(),
            request: valuation.request,
            call_price: p.call_price,
            put_price: p.put_price,
            call_delta: p.call_delta,
            put_delta: p.put_delta,
            gamma: p.gamma,
            has_call_position: p.call_position.is_some(),
            call_pnl: p.call_pnl(),
            call_pnl_percentage: p.call_pnl_percentage(),
            has_put_position: p.put_position.is_some(),
            put_pnl: p.put_pnl(),
            put_pnl_percentage: p.put_pnl_percentage(),
            max_call_loss: r.max_call_loss,
            max_put_loss: r.max_put_loss,
            max_call_gain: r.max_call_gain,
            max_put_gain: r.max_put_gain,
            call_breakeven: r.call_breakeven,
            put_breakeven: r.put_breakeven,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HeatmapQuery {
    pub request: ValuationRequest,
    /// Falls back to `SweepSpec::around` with the configured step count.
    #[serde(default)]
    pub sweep: Option<SweepSpec>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HeatmapResponse {
    pub request_id: uuid::Uuid,
    pub computed_at: String,
    pub sweep: SweepSpec,
    #[serde(flatten)]
    pub grid: HeatmapGrid,
}

/// Error body for rejected requests.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Frames sent to WebSocket clients.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "valuation")]
    Valuation(ValuationResponse),

    #[serde(rename = "error")]
    Error(ErrorResponse),
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub valuations_computed: AtomicU64,
    pub heatmaps_computed: AtomicU64,
    pub grid_cells_priced: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub ws_sessions: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            valuations_computed: AtomicU64::new(0),
            heatmaps_computed: AtomicU64::new(0),
            grid_cells_priced: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            ws_sessions: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

// ── Application shared state (immutable config + engine, atomic counters) ──

pub struct AppState {
    pub config: AppConfig,
    pub engine: PricingEngine,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let engine = PricingEngine::new(config.precision);
        Arc::new(Self {
            config,
            engine,
            counters: PerfCounters::new(),
        })
    }
}
