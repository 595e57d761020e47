use crate::errors::{PricingError, PricingResult};
use crate::models::precision::Precision;
use crate::models::types::{
    MaxGain, PositionPnl, PriceResult, RiskMetrics, Valuation, ValuationRequest,
};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Black-Scholes pricing for European calls and puts, no dividends.
///
/// d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
///
/// call = S*Phi(d1) - K*exp(-rT)*Phi(d2)
/// put  = K*exp(-rT)*Phi(-d2) - S*Phi(-d1)
///
/// Every input is rounded through `precision` before use and every output
/// before it is returned. The engine holds no mutable state; one instance
/// can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
    precision: Precision,
}

/// Intermediate terms shared by prices and Greeks.
#[derive(Debug, Clone, Copy)]
struct D1D2 {
    d1: f64,
    d2: f64,
    sigma_sqrt_t: f64,
    discount: f64,
}

impl PricingEngine {
    pub fn new(precision: Precision) -> Self {
        Self {
            normal: Normal::standard(),
            precision,
        }
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Fair values, delta, gamma and per-leg PnL.
    pub fn price(&self, request: &ValuationRequest) -> PricingResult<PriceResult> {
        request.validate()?;
        let req = request.normalized(&self.precision);
        self.price_normalized(&req)
    }

    /// Loss, gain and break-even bounds for long positions at the given
    /// purchase prices. Depends only on the request; `prices` is accepted so
    /// callers can pass what `price` returned without recomputing anything.
    pub fn risk_metrics(
        &self,
        request: &ValuationRequest,
        _prices: &PriceResult,
    ) -> PricingResult<RiskMetrics> {
        request.validate()?;
        Ok(self.risk_normalized(&request.normalized(&self.precision)))
    }

    /// Validate, price and derive risk metrics in one pass.
    pub fn value(&self, request: &ValuationRequest) -> PricingResult<Valuation> {
        request.validate()?;
        let req = request.normalized(&self.precision);
        let prices = self.price_normalized(&req)?;
        let risk = self.risk_normalized(&req);
        Ok(Valuation {
            request: req,
            prices,
            risk,
        })
    }

    fn price_normalized(&self, req: &ValuationRequest) -> PricingResult<PriceResult> {
        let terms = self.terms(req)?;
        let p = &self.precision;
        let s = req.current_price;
        let k = req.strike;

        let call_price = p.round(
            s * self.normal.cdf(terms.d1) - k * terms.discount * self.normal.cdf(terms.d2),
        );
        let put_price = p.round(
            k * terms.discount * self.normal.cdf(-terms.d2) - s * self.normal.cdf(-terms.d1),
        );

        let call_delta = p.round(self.normal.cdf(terms.d1));
        let put_delta = p.round(-self.normal.cdf(-terms.d1));
        let gamma = p.round(self.normal.pdf(terms.d1) / (s * terms.sigma_sqrt_t));

        Ok(PriceResult {
            call_price,
            put_price,
            call_delta,
            put_delta,
            gamma,
            call_position: req.call_purchase_price.map(|paid| self.position(call_price, paid)),
            put_position: req.put_purchase_price.map(|paid| self.position(put_price, paid)),
        })
    }

    fn terms(&self, req: &ValuationRequest) -> PricingResult<D1D2> {
        let t = req.time_to_maturity;
        let sigma = req.volatility;

        // Rounding can push a tiny positive input to zero.
        let sigma_sqrt_t = sigma * t.sqrt();
        if !(sigma_sqrt_t.is_finite() && sigma_sqrt_t > 0.0) {
            return Err(PricingError::Degenerate(format!(
                "volatility * sqrt(time_to_maturity) = {sigma_sqrt_t} \
                 (volatility={sigma}, time_to_maturity={t})"
            )));
        }

        let ln_s_k = (req.current_price / req.strike).ln();
        if !ln_s_k.is_finite() {
            return Err(PricingError::Degenerate(format!(
                "ln(current_price / strike) is undefined for current_price={}, strike={}",
                req.current_price, req.strike
            )));
        }

        let d1 = (ln_s_k + (req.interest_rate + 0.5 * sigma * sigma) * t) / sigma_sqrt_t;
        Ok(D1D2 {
            d1,
            d2: d1 - sigma_sqrt_t,
            sigma_sqrt_t,
            discount: (-req.interest_rate * t).exp(),
        })
    }

    #[inline]
    fn position(&self, price: f64, paid: f64) -> PositionPnl {
        let pnl = self.precision.round(price - paid);
        let pnl_percentage = if paid != 0.0 {
            self.precision.round(pnl / paid * 100.0)
        } else {
            0.0
        };
        PositionPnl {
            pnl,
            pnl_percentage,
        }
    }

    fn risk_normalized(&self, req: &ValuationRequest) -> RiskMetrics {
        let p = &self.precision;
        let call_paid = req.call_purchase_price;
        let put_paid = req.put_purchase_price;

        RiskMetrics {
            max_call_loss: p.round(call_paid.map_or(0.0, f64::abs)),
            max_put_loss: p.round(put_paid.map_or(0.0, f64::abs)),
            max_call_gain: match call_paid {
                Some(_) => MaxGain::Unbounded,
                None => MaxGain::Bounded(0.0),
            },
            max_put_gain: MaxGain::Bounded(
                put_paid.map_or(0.0, |paid| p.round(req.strike - paid)),
            ),
            call_breakeven: p.round(req.strike + call_paid.unwrap_or(0.0)),
            put_breakeven: p.round(req.strike - put_paid.unwrap_or(0.0)),
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(Precision::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-7;

    fn atm() -> ValuationRequest {
        ValuationRequest::new(1.0, 100.0, 100.0, 0.2, 0.05)
    }

    /// At-the-money, in-the-money call and out-of-the-money call books.
    fn books() -> [ValuationRequest; 3] {
        [
            atm().with_call_purchase(8.0).with_put_purchase(6.0),
            ValuationRequest::new(1.0, 90.0, 100.0, 0.2, 0.05)
                .with_call_purchase(15.0)
                .with_put_purchase(2.0),
            ValuationRequest::new(1.0, 110.0, 100.0, 0.2, 0.05)
                .with_call_purchase(3.0)
                .with_put_purchase(10.0),
        ]
    }

    #[test]
    fn test_reference_values() {
        let engine = PricingEngine::default();
        let prices = engine.price(&atm()).unwrap();
        assert!((prices.call_price - 10.4506).abs() < 1e-3, "call={}", prices.call_price);
        assert!((prices.put_price - 5.5735).abs() < 1e-3, "put={}", prices.put_price);
        assert!((prices.call_delta - 0.6368).abs() < 1e-3, "call delta={}", prices.call_delta);
        assert!((prices.put_delta + 0.3632).abs() < 1e-3, "put delta={}", prices.put_delta);
        assert!((prices.gamma - 0.018762).abs() < 1e-5, "gamma={}", prices.gamma);
    }

    #[test]
    fn test_put_call_parity() {
        let engine = PricingEngine::default();
        for req in books() {
            let prices = engine.price(&req).unwrap();
            let lhs = prices.call_price - prices.put_price;
            let rhs = req.current_price
                - req.strike * (-req.interest_rate * req.time_to_maturity).exp();
            assert!((lhs - rhs).abs() < TOL, "parity broken for {req:?}: {lhs} vs {rhs}");
        }
    }

    #[test]
    fn test_delta_relationship() {
        let engine = PricingEngine::default();
        for req in books() {
            let p = engine.price(&req).unwrap();
            assert!((p.call_delta - p.put_delta - 1.0).abs() < TOL);
            assert!(p.call_delta > 0.0 && p.call_delta < 1.0);
            assert!(p.gamma > 0.0);
        }
    }

    #[test]
    fn test_call_pnl_scenario() {
        let engine = PricingEngine::default();
        let prices = engine.price(&atm().with_call_purchase(8.0)).unwrap();
        assert!((prices.call_pnl() - 2.4506).abs() < 1e-3, "pnl={}", prices.call_pnl());
        assert!(
            (prices.call_pnl_percentage() - 30.63).abs() < 1e-2,
            "pnl%={}",
            prices.call_pnl_percentage()
        );
        assert_eq!(prices.put_position, None);
    }

    #[test]
    fn test_zero_pnl_without_position() {
        let engine = PricingEngine::default();
        let prices = engine.price(&atm()).unwrap();
        assert_eq!(prices.call_pnl(), 0.0);
        assert_eq!(prices.call_pnl_percentage(), 0.0);
        assert_eq!(prices.put_pnl(), 0.0);
        assert_eq!(prices.put_pnl_percentage(), 0.0);
    }

    #[test]
    fn test_zero_purchase_price_has_no_percentage() {
        let engine = PricingEngine::default();
        let prices = engine.price(&atm().with_call_purchase(0.0)).unwrap();
        let pos = prices.call_position.unwrap();
        assert_eq!(pos.pnl, prices.call_price);
        assert_eq!(pos.pnl_percentage, 0.0);
    }

    #[test]
    fn test_pnl_ignores_purchase_time() {
        // Same maturity and spot at purchase used to short-circuit to zero.
        let engine = PricingEngine::default();
        let req = atm().with_call_purchase(8.0).with_purchase_time(1.0);
        let prices = engine.price(&req).unwrap();
        assert!(prices.call_pnl() > 2.0, "pnl={}", prices.call_pnl());
    }

    #[test]
    fn test_risk_metric_identities() {
        let engine = PricingEngine::default();
        for req in books() {
            let prices = engine.price(&req).unwrap();
            let risk = engine.risk_metrics(&req, &prices).unwrap();
            let call_paid = req.call_purchase_price.unwrap();
            let put_paid = req.put_purchase_price.unwrap();

            assert!((risk.max_call_loss - call_paid.abs()).abs() < TOL);
            assert!((risk.max_put_loss - put_paid.abs()).abs() < TOL);
            assert!((risk.call_breakeven - (req.strike + call_paid)).abs() < TOL);
            assert!((risk.put_breakeven - (req.strike - put_paid)).abs() < TOL);
            assert_eq!(risk.max_call_gain, MaxGain::Unbounded);
            assert_eq!(risk.max_put_gain, MaxGain::Bounded(req.strike - put_paid));
        }
    }

    #[test]
    fn test_risk_metrics_without_positions() {
        let engine = PricingEngine::default();
        let prices = engine.price(&atm()).unwrap();
        let risk = engine.risk_metrics(&atm(), &prices).unwrap();
        assert_eq!(risk.max_call_loss, 0.0);
        assert_eq!(risk.max_put_loss, 0.0);
        assert_eq!(risk.max_call_gain, MaxGain::Bounded(0.0));
        assert_eq!(risk.max_put_gain, MaxGain::Bounded(0.0));
        assert_eq!(risk.call_breakeven, 100.0);
        assert_eq!(risk.put_breakeven, 100.0);
    }

    #[test]
    fn test_any_call_purchase_is_unbounded() {
        let engine = PricingEngine::default();
        for paid in [0.0, 0.01, 8.0, 1e6] {
            let req = atm().with_call_purchase(paid);
            let risk = engine.value(&req).unwrap().risk;
            assert!(risk.max_call_gain.is_unbounded());
            assert!(risk.max_call_gain > MaxGain::Bounded(f64::MAX));
        }
    }

    #[test]
    fn test_monotonic_in_spot() {
        let engine = PricingEngine::default();
        let mut prev: Option<PriceResult> = None;
        for i in 0..40 {
            let spot = 60.0 + i as f64 * 2.0;
            let p = engine.price(&atm().at_point(spot, 0.2)).unwrap();
            if let Some(prev) = prev {
                assert!(p.call_price >= prev.call_price, "call fell at spot={spot}");
                assert!(p.put_price <= prev.put_price, "put rose at spot={spot}");
            }
            prev = Some(p);
        }
    }

    #[test]
    fn test_converges_to_intrinsic_near_expiry() {
        let engine = PricingEngine::default();
        for (spot, call_iv, put_iv) in [(120.0, 20.0, 0.0), (80.0, 0.0, 20.0), (100.0, 0.0, 0.0)] {
            let req = ValuationRequest {
                time_to_maturity: 1e-8,
                current_price: spot,
                ..atm()
            };
            let p = engine.price(&req).unwrap();
            assert!((p.call_price - call_iv).abs() < 1e-2, "call {} vs {call_iv}", p.call_price);
            assert!((p.put_price - put_iv).abs() < 1e-2, "put {} vs {put_iv}", p.put_price);
        }
    }

    #[test]
    fn test_rejects_bad_input_without_result() {
        let engine = PricingEngine::default();
        let mut bad = atm();
        bad.volatility = 0.0;
        let err = engine.price(&bad).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(engine.value(&bad).is_err());
        let prices = engine.price(&atm()).unwrap();
        assert!(engine.risk_metrics(&bad, &prices).is_err());
    }

    #[test]
    fn test_rounding_to_zero_is_degenerate() {
        let engine = PricingEngine::default();
        let mut req = atm();
        req.volatility = 1e-12;
        match engine.price(&req) {
            Err(PricingError::Degenerate(msg)) => assert!(msg.contains("volatility")),
            other => panic!("expected Degenerate, got {other:?}"),
        }
    }

    #[test]
    fn test_precision_is_per_engine() {
        let coarse = PricingEngine::new(Precision::new(2));
        let fine = PricingEngine::default();
        let c = coarse.price(&atm()).unwrap();
        let f = fine.price(&atm()).unwrap();
        assert_eq!(c.call_price, 10.45);
        assert!((f.call_price - 10.4505835722).abs() < 1e-9, "call={}", f.call_price);
    }

    #[test]
    fn test_deterministic() {
        let engine = PricingEngine::default();
        let req = atm().with_call_purchase(8.0).with_put_purchase(6.0);
        assert_eq!(engine.value(&req).unwrap(), engine.value(&req).unwrap());
    }
}
