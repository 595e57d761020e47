use crate::errors::{PricingError, PricingResult};
use crate::models::black_scholes::PricingEngine;
use crate::models::types::ValuationRequest;
use smallvec::SmallVec;

/// Axis values for a heatmap. Dashboard grids are small, so they stay inline.
pub type Axis = SmallVec<[f64; 16]>;

/// `steps` evenly spaced values from `min` to `max`, both ends included.
pub fn linspace(min: f64, max: f64, steps: usize) -> Axis {
    match steps {
        0 => Axis::new(),
        1 => smallvec::smallvec![min],
        _ => {
            let step = (max - min) / (steps - 1) as f64;
            let mut axis: Axis = (0..steps).map(|i| min + step * i as f64).collect();
            // Pin the last point so accumulated error never overshoots `max`.
            axis[steps - 1] = max;
            axis
        }
    }
}

/// Spot and volatility ranges for a heatmap.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SweepSpec {
    pub spot_min: f64,
    pub spot_max: f64,
    pub vol_min: f64,
    pub vol_max: f64,
    pub steps: usize,
}

impl SweepSpec {
    /// Dashboard defaults: spot within 20% of the request, volatility from
    /// half to one and a half times the request's.
    pub fn around(request: &ValuationRequest, steps: usize) -> Self {
        Self {
            spot_min: request.current_price * 0.8,
            spot_max: request.current_price * 1.2,
            vol_min: request.volatility * 0.5,
            vol_max: request.volatility * 1.5,
            steps,
        }
    }

    pub fn validate(&self, max_steps: usize) -> PricingResult<()> {
        check_range("spot", self.spot_min, self.spot_max)?;
        check_range("volatility", self.vol_min, self.vol_max)?;
        if self.steps == 0 || self.steps > max_steps {
            return Err(PricingError::InvalidSweep(format!(
                "steps must be in 1..={max_steps}, got {}",
                self.steps
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, min: f64, max: f64) -> PricingResult<()> {
    if !(min.is_finite() && max.is_finite() && min > 0.0) {
        return Err(PricingError::InvalidSweep(format!(
            "{name} bounds must be finite and > 0, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(PricingError::InvalidSweep(format!(
            "{name} min {min} is above max {max}"
        )));
    }
    Ok(())
}

/// Call/put value and PnL over a volatility x spot grid.
/// Matrices are indexed `[vol_index][spot_index]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HeatmapGrid {
    pub spot_axis: Axis,
    pub vol_axis: Axis,
    pub call_value: Vec<Vec<f64>>,
    pub put_value: Vec<Vec<f64>>,
    pub call_pnl: Vec<Vec<f64>>,
    pub put_pnl: Vec<Vec<f64>>,
}

impl HeatmapGrid {
    /// Reprice `base` at every grid point. Each cell is independent; any
    /// invalid cell fails the whole grid.
    pub fn compute(
        engine: &PricingEngine,
        base: &ValuationRequest,
        spec: &SweepSpec,
    ) -> PricingResult<Self> {
        base.validate()?;

        let spot_axis = linspace(spec.spot_min, spec.spot_max, spec.steps);
        let vol_axis = linspace(spec.vol_min, spec.vol_max, spec.steps);
        let rows = vol_axis.len();
        let cols = spot_axis.len();

        let mut grid = Self {
            call_value: Vec::with_capacity(rows),
            put_value: Vec::with_capacity(rows),
            call_pnl: Vec::with_capacity(rows),
            put_pnl: Vec::with_capacity(rows),
            spot_axis,
            vol_axis,
        };

        for &vol in &grid.vol_axis {
            let mut call_row = Vec::with_capacity(cols);
            let mut put_row = Vec::with_capacity(cols);
            let mut call_pnl_row = Vec::with_capacity(cols);
            let mut put_pnl_row = Vec::with_capacity(cols);

            for &spot in &grid.spot_axis {
                let prices = engine.price(&base.at_point(spot, vol))?;
                call_row.push(prices.call_price);
                put_row.push(prices.put_price);
                call_pnl_row.push(prices.call_pnl());
                put_pnl_row.push(prices.put_pnl());
            }

            grid.call_value.push(call_row);
            grid.put_value.push(put_row);
            grid.call_pnl.push(call_pnl_row);
            grid.put_pnl.push(put_pnl_row);
        }

        Ok(grid)
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.vol_axis.len(), self.spot_axis.len())
    }
}
