use crate::errors::{PricingError, PricingResult};
use crate::models::precision::Precision;
use std::cmp::Ordering;
use std::fmt;

// ── Input ──

/// Market and contract parameters for one valuation. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValuationRequest {
    /// Years until expiry.
    pub time_to_maturity: f64,
    pub strike: f64,
    /// Spot price of the underlying.
    pub current_price: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Annualized risk-free rate.
    pub interest_rate: f64,
    #[serde(default)]
    pub call_purchase_price: Option<f64>,
    #[serde(default)]
    pub put_purchase_price: Option<f64>,
    #[serde(default)]
    pub purchase_time_to_maturity: Option<f64>,
}

impl ValuationRequest {
    pub fn new(
        time_to_maturity: f64,
        strike: f64,
        current_price: f64,
        volatility: f64,
        interest_rate: f64,
    ) -> Self {
        Self {
            time_to_maturity,
            strike,
            current_price,
            volatility,
            interest_rate,
            call_purchase_price: None,
            put_purchase_price: None,
            purchase_time_to_maturity: None,
        }
    }

    pub fn with_call_purchase(mut self, price: f64) -> Self {
        self.call_purchase_price = Some(price);
        self
    }

    pub fn with_put_purchase(mut self, price: f64) -> Self {
        self.put_purchase_price = Some(price);
        self
    }

    pub fn with_purchase_time(mut self, years: f64) -> Self {
        self.purchase_time_to_maturity = Some(years);
        self
    }

    /// Same contract, different spot and volatility. Used by the sweep.
    pub fn at_point(&self, current_price: f64, volatility: f64) -> Self {
        Self {
            current_price,
            volatility,
            ..*self
        }
    }

    /// Time to maturity when the position was opened; defaults to now.
    #[inline]
    pub fn purchase_time_to_maturity(&self) -> f64 {
        self.purchase_time_to_maturity.unwrap_or(self.time_to_maturity)
    }

    /// Check every field against its domain. No partial results: the first
    /// offending field is reported.
    pub fn validate(&self) -> PricingResult<()> {
        positive("time_to_maturity", self.time_to_maturity)?;
        positive("strike", self.strike)?;
        positive("current_price", self.current_price)?;
        positive("volatility", self.volatility)?;

        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            return Err(PricingError::InvalidInput {
                field: "interest_rate",
                requirement: "finite and >= 0",
                value: self.interest_rate,
            });
        }

        if let Some(p) = self.call_purchase_price {
            finite("call_purchase_price", p)?;
        }
        if let Some(p) = self.put_purchase_price {
            finite("put_purchase_price", p)?;
        }
        if let Some(t) = self.purchase_time_to_maturity {
            positive("purchase_time_to_maturity", t)?;
        }
        Ok(())
    }

    /// Round every field through `precision`.
    pub fn normalized(&self, precision: &Precision) -> Self {
        Self {
            time_to_maturity: precision.round(self.time_to_maturity),
            strike: precision.round(self.strike),
            current_price: precision.round(self.current_price),
            volatility: precision.round(self.volatility),
            interest_rate: precision.round(self.interest_rate),
            call_purchase_price: precision.round_opt(self.call_purchase_price),
            put_purchase_price: precision.round_opt(self.put_purchase_price),
            purchase_time_to_maturity: Some(precision.round(self.purchase_time_to_maturity())),
        }
    }
}

fn positive(field: &'static str, value: f64) -> PricingResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidInput {
            field,
            requirement: "finite and > 0",
            value,
        })
    }
}

fn finite(field: &'static str, value: f64) -> PricingResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::InvalidInput {
            field,
            requirement: "finite",
            value,
        })
    }
}

// ── Prices ──

/// Mark-to-model PnL for one leg, relative to its purchase price.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PositionPnl {
    pub pnl: f64,
    /// Percent of the purchase price; 0 when the purchase price is 0.
    pub pnl_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PriceResult {
    pub call_price: f64,
    pub put_price: f64,
    pub call_delta: f64,
    pub put_delta: f64,
    pub gamma: f64,
    /// `None` when no call purchase price was given.
    pub call_position: Option<PositionPnl>,
    /// `None` when no put purchase price was given.
    pub put_position: Option<PositionPnl>,
}

impl PriceResult {
    /// Call PnL, or 0.0 without a position. A flat position reads the same.
    #[inline]
    pub fn call_pnl(&self) -> f64 {
        self.call_position.map_or(0.0, |p| p.pnl)
    }

    #[inline]
    pub fn call_pnl_percentage(&self) -> f64 {
        self.call_position.map_or(0.0, |p| p.pnl_percentage)
    }

    #[inline]
    pub fn put_pnl(&self) -> f64 {
        self.put_position.map_or(0.0, |p| p.pnl)
    }

    #[inline]
    pub fn put_pnl_percentage(&self) -> f64 {
        self.put_position.map_or(0.0, |p| p.pnl_percentage)
    }
}

// ── Risk ──

/// Maximum gain of a long position. A long call has no upper bound, which
/// is kept as its own variant so it never collides with a finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxGain {
    Bounded(f64),
    Unbounded,
}

impl MaxGain {
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// `Unbounded` maps to `f64::INFINITY`.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Bounded(v) => *v,
            Self::Unbounded => f64::INFINITY,
        }
    }

    pub fn bounded(&self) -> Option<f64> {
        match self {
            Self::Bounded(v) => Some(*v),
            Self::Unbounded => None,
        }
    }
}

impl PartialOrd for MaxGain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Unbounded, Self::Unbounded) => Some(Ordering::Equal),
            (Self::Unbounded, Self::Bounded(_)) => Some(Ordering::Greater),
            (Self::Bounded(_), Self::Unbounded) => Some(Ordering::Less),
            (Self::Bounded(a), Self::Bounded(b)) => a.partial_cmp(b),
        }
    }
}

impl fmt::Display for MaxGain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(v) => write!(f, "{v:.2}"),
            Self::Unbounded => write!(f, "inf"),
        }
    }
}

/// Bounded gains serialize as numbers, unbounded as the string `"Infinity"`
/// (JSON has no infinite number).
impl serde::Serialize for MaxGain {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(v) => serializer.serialize_f64(*v),
            Self::Unbounded => serializer.serialize_str("Infinity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RiskMetrics {
    pub max_call_loss: f64,
    pub max_put_loss: f64,
    pub max_call_gain: MaxGain,
    pub max_put_gain: MaxGain,
    pub call_breakeven: f64,
    pub put_breakeven: f64,
}

/// Full result of one valuation: the request as priced, prices, risk.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Valuation {
    pub request: ValuationRequest,
    pub prices: PriceResult,
    pub risk: RiskMetrics,
}
