pub mod black_scholes;
pub mod precision;
pub mod sweep;
pub mod types;

pub use black_scholes::PricingEngine;
pub use precision::Precision;
pub use sweep::{HeatmapGrid, SweepSpec};
pub use types::{MaxGain, PositionPnl, PriceResult, RiskMetrics, Valuation, ValuationRequest};
