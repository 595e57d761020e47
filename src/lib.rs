//! Black-Scholes pricing, PnL and risk metrics for European options, plus
//! the spot x volatility heatmaps and the HTTP/WS service a dashboard uses.
//!
//! ```
//! use bs_dashboard::models::{PricingEngine, ValuationRequest};
//!
//! let engine = PricingEngine::default();
//! let req = ValuationRequest::new(1.0, 100.0, 100.0, 0.2, 0.05).with_call_purchase(8.0);
//! let prices = engine.price(&req).unwrap();
//! let risk = engine.risk_metrics(&req, &prices).unwrap();
//! assert!((prices.call_price - 10.4506).abs() < 1e-3);
//! assert!(risk.max_call_gain.is_unbounded());
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod server;
pub mod state;
