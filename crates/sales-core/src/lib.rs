#![deny(warnings)]

//! Core domain models and invariants for the sales revenue simulator.
//!
//! This crate defines the serializable inputs of a simulation (market segments,
//! fee tiers, unit estimates, budget lines) together with validated wrappers that
//! guarantee the invariants the simulator relies on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One million, the unit most tracker figures and fee thresholds are quoted in.
pub const MILLION: f64 = 1_000_000.0;

/// Tolerance used when checking that segment shares add up to one.
pub const SHARE_SUM_EPSILON: f64 = 1e-9;

/// A market partition (usually a country) with its sales share and unit price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSegment {
    /// Human-readable label, e.g. "US" or "World".
    pub label: String,
    /// Fraction of all units sold in this segment, in (0, 1].
    pub share: f64,
    /// Unit price in local currency (>= 0).
    pub price: f64,
}

impl MarketSegment {
    pub fn new(label: impl Into<String>, share: f64, price: f64) -> Self {
        Self {
            label: label.into(),
            share,
            price,
        }
    }
}

/// A cumulative-revenue band with its platform commission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    /// Exclusive upper bound in reference currency; `None` means unbounded.
    #[serde(default)]
    pub upper_bound: Option<f64>,
    /// Commission fraction in [0, 1).
    pub fee: f64,
}

impl FeeTier {
    pub fn bounded(upper_bound: f64, fee: f64) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            fee,
        }
    }

    pub fn unbounded(fee: f64) -> Self {
        Self {
            upper_bound: None,
            fee,
        }
    }
}

/// A named unit-count estimate supplied by a tracker or heuristic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub label: String,
    pub units: u64,
}

impl Estimate {
    pub fn new(label: impl Into<String>, units: u64) -> Self {
        Self {
            label: label.into(),
            units,
        }
    }
}

/// A development budget figure in reference currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub label: String,
    pub amount: Decimal,
}

/// Local and reference currency description plus the exchange rate between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO code of the currency prices are quoted in (e.g. "UAH").
    pub local_code: String,
    /// Display sign of the local currency (e.g. "₴").
    pub local_sign: String,
    /// ISO code of the currency fee thresholds are quoted in (e.g. "USD").
    pub reference_code: String,
    /// Display sign of the reference currency (e.g. "$").
    pub reference_sign: String,
    /// Local currency units per one reference unit.
    pub local_per_reference: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            local_code: "UAH".into(),
            local_sign: "₴".into(),
            reference_code: "USD".into(),
            reference_sign: "$".into(),
            local_per_reference: 41.59,
        }
    }
}

impl CurrencyConfig {
    /// Identity conversion, handy when prices are already in reference currency.
    pub fn identity(code: &str, sign: &str) -> Self {
        Self {
            local_code: code.into(),
            local_sign: sign.into(),
            reference_code: code.into(),
            reference_sign: sign.into(),
            local_per_reference: 1.0,
        }
    }

    /// Convert a local-currency amount into reference currency.
    pub fn to_reference(&self, local: f64) -> f64 {
        local / self.local_per_reference
    }
}

/// Errors raised while constructing validated models.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// Segment list is empty, a share/price is out of range, or shares do not sum to 1.
    #[error("invalid market model: {0}")]
    InvalidModel(String),
    /// Fee tiers are empty, unordered, or carry an out-of-range fee or exchange rate.
    #[error("invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),
}

/// Validated, immutable market description.
///
/// Weights and prices are kept as parallel vectors in segment order; weighted
/// sampling relies on the positional correspondence between the two.
#[derive(Clone, Debug)]
pub struct MarketModel {
    segments: Vec<MarketSegment>,
    weights: Vec<f64>,
    prices: Vec<f64>,
}

impl MarketModel {
    pub fn new(segments: Vec<MarketSegment>) -> Result<Self, ModelError> {
        if segments.is_empty() {
            return Err(ModelError::InvalidModel("no market segments".into()));
        }
        for s in &segments {
            validate_segment(s)?;
        }
        let sum: f64 = segments.iter().map(|s| s.share).sum();
        if (sum - 1.0).abs() > SHARE_SUM_EPSILON {
            return Err(ModelError::InvalidModel(format!(
                "segment shares sum to {sum}, expected 1"
            )));
        }
        let weights = segments.iter().map(|s| s.share).collect();
        let prices = segments.iter().map(|s| s.price).collect();
        Ok(Self {
            segments,
            weights,
            prices,
        })
    }

    pub fn segments(&self) -> &[MarketSegment] {
        &self.segments
    }

    /// Segment shares in segment order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Segment prices in segment order.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Share-weighted mean unit price.
    pub fn expected_price(&self) -> f64 {
        self.weights
            .iter()
            .zip(&self.prices)
            .map(|(w, p)| w * p)
            .sum()
    }
}

/// Validate a single market segment.
pub fn validate_segment(s: &MarketSegment) -> Result<(), ModelError> {
    if s.label.trim().is_empty() {
        return Err(ModelError::InvalidModel("segment label is empty".into()));
    }
    if !s.share.is_finite() || s.share <= 0.0 || s.share > 1.0 {
        return Err(ModelError::InvalidModel(format!(
            "share of {} must be in (0, 1], got {}",
            s.label, s.share
        )));
    }
    if !s.price.is_finite() || s.price < 0.0 {
        return Err(ModelError::InvalidModel(format!(
            "price of {} must be non-negative, got {}",
            s.label, s.price
        )));
    }
    Ok(())
}

/// Tiered platform commission keyed on cumulative revenue.
///
/// Thresholds are quoted in reference currency while the simulator accumulates
/// revenue in local currency, so lookups convert through the exchange rate first.
#[derive(Clone, Debug)]
pub struct FeeSchedule {
    tiers: Vec<FeeTier>,
    local_per_reference: f64,
}

impl FeeSchedule {
    pub fn new(tiers: Vec<FeeTier>, currency: &CurrencyConfig) -> Result<Self, ModelError> {
        let rate = currency.local_per_reference;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ModelError::InvalidFeeSchedule(format!(
                "exchange rate must be positive, got {rate}"
            )));
        }
        validate_tiers(&tiers)?;
        Ok(Self {
            tiers,
            local_per_reference: rate,
        })
    }

    /// Steam revenue share: 30% up to $10M, 25% up to $50M, 20% beyond.
    pub fn steam(currency: &CurrencyConfig) -> Result<Self, ModelError> {
        Self::new(steam_tiers(), currency)
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// Commission for a cumulative revenue expressed in local currency.
    pub fn fee_fraction(&self, cumulative_revenue: f64) -> f64 {
        self.fee_fraction_reference(cumulative_revenue / self.local_per_reference)
    }

    /// Commission for a cumulative revenue already in reference currency.
    pub fn fee_fraction_reference(&self, revenue: f64) -> f64 {
        self.tiers
            .iter()
            .find(|t| t.upper_bound.map_or(true, |bound| bound > revenue))
            .or_else(|| self.tiers.last())
            .map_or(0.0, |t| t.fee)
    }
}

/// The reference tier list for Steam, in USD.
pub fn steam_tiers() -> Vec<FeeTier> {
    vec![
        FeeTier::bounded(10.0 * MILLION, 0.30),
        FeeTier::bounded(50.0 * MILLION, 0.25),
        FeeTier::unbounded(0.20),
    ]
}

/// Validate ordering and ranges of a tier list.
pub fn validate_tiers(tiers: &[FeeTier]) -> Result<(), ModelError> {
    if tiers.is_empty() {
        return Err(ModelError::InvalidFeeSchedule("no fee tiers".into()));
    }
    let mut prev: Option<f64> = None;
    for (i, t) in tiers.iter().enumerate() {
        if !t.fee.is_finite() || !(0.0..1.0).contains(&t.fee) {
            return Err(ModelError::InvalidFeeSchedule(format!(
                "tier {i} fee must be in [0, 1), got {}",
                t.fee
            )));
        }
        match t.upper_bound {
            Some(bound) => {
                if !bound.is_finite() || bound < 0.0 {
                    return Err(ModelError::InvalidFeeSchedule(format!(
                        "tier {i} bound must be finite and non-negative"
                    )));
                }
                if prev.is_some_and(|p| bound <= p) {
                    return Err(ModelError::InvalidFeeSchedule(format!(
                        "tier {i} bound {bound} is not above the previous tier"
                    )));
                }
                prev = Some(bound);
            }
            None if i + 1 != tiers.len() => {
                return Err(ModelError::InvalidFeeSchedule(format!(
                    "tier {i} is unbounded but not last"
                )));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference_segments() -> Vec<MarketSegment> {
        vec![
            MarketSegment::new("US", 0.229, 2490.52),
            MarketSegment::new("Ukraine", 0.146, 1399.00),
            MarketSegment::new("Germany", 0.081, 2634.46),
            MarketSegment::new("China", 0.081, 1536.40),
            MarketSegment::new("World", 0.463, 1399.00 * 1.5),
        ]
    }

    fn usd() -> CurrencyConfig {
        CurrencyConfig::identity("USD", "$")
    }

    #[test]
    fn reference_model_is_valid() {
        let model = MarketModel::new(reference_segments()).unwrap();
        let sum: f64 = model.weights().iter().sum();
        assert!((sum - 1.0).abs() <= SHARE_SUM_EPSILON);
        assert_eq!(model.weights().len(), model.prices().len());
        assert_eq!(model.prices()[1], 1399.00);
        assert_eq!(model.segments()[4].label, "World");
    }

    #[test]
    fn shares_not_summing_to_one_are_rejected() {
        let segs = vec![
            MarketSegment::new("A", 0.5, 10.0),
            MarketSegment::new("B", 0.4, 10.0),
        ];
        assert!(matches!(
            MarketModel::new(segs),
            Err(ModelError::InvalidModel(_))
        ));
    }

    #[test]
    fn non_positive_share_and_negative_price_are_rejected() {
        let zero_share = vec![
            MarketSegment::new("A", 1.0, 10.0),
            MarketSegment::new("B", 0.0, 10.0),
        ];
        assert!(matches!(
            MarketModel::new(zero_share),
            Err(ModelError::InvalidModel(_))
        ));
        let negative_price = vec![MarketSegment::new("A", 1.0, -1.0)];
        assert!(matches!(
            MarketModel::new(negative_price),
            Err(ModelError::InvalidModel(_))
        ));
        assert!(MarketModel::new(vec![]).is_err());
    }

    #[test]
    fn expected_price_is_share_weighted() {
        let model = MarketModel::new(vec![
            MarketSegment::new("A", 0.25, 100.0),
            MarketSegment::new("B", 0.75, 20.0),
        ])
        .unwrap();
        assert!((model.expected_price() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn steam_reference_tiers() {
        let fees = FeeSchedule::steam(&usd()).unwrap();
        assert_eq!(fees.fee_fraction(0.0), 0.30);
        assert_eq!(fees.fee_fraction(10.0 * MILLION - 0.01), 0.30);
        assert_eq!(fees.fee_fraction(10.0 * MILLION), 0.25);
        assert_eq!(fees.fee_fraction(50.0 * MILLION - 0.01), 0.25);
        assert_eq!(fees.fee_fraction(50.0 * MILLION), 0.20);
        assert_eq!(fees.fee_fraction(1e12), 0.20);
    }

    #[test]
    fn local_revenue_is_converted_before_lookup() {
        let fees = FeeSchedule::steam(&CurrencyConfig::default()).unwrap();
        // 10M USD at 41.59 UAH/USD
        assert_eq!(fees.fee_fraction(415.0 * MILLION), 0.30);
        assert_eq!(fees.fee_fraction(416.0 * MILLION), 0.25);
        assert_eq!(fees.fee_fraction(2080.0 * MILLION), 0.20);
    }

    #[test]
    fn last_tier_applies_when_no_bound_exceeds() {
        let fees = FeeSchedule::new(
            vec![FeeTier::bounded(100.0, 0.1), FeeTier::bounded(200.0, 0.05)],
            &usd(),
        )
        .unwrap();
        assert_eq!(fees.fee_fraction(99.0), 0.1);
        assert_eq!(fees.fee_fraction(150.0), 0.05);
        assert_eq!(fees.fee_fraction(500.0), 0.05);
    }

    #[test]
    fn malformed_tiers_are_rejected() {
        let cur = usd();
        assert!(FeeSchedule::new(vec![], &cur).is_err());
        assert!(FeeSchedule::new(vec![FeeTier::unbounded(1.0)], &cur).is_err());
        assert!(FeeSchedule::new(
            vec![FeeTier::bounded(50.0, 0.2), FeeTier::bounded(10.0, 0.1)],
            &cur
        )
        .is_err());
        assert!(FeeSchedule::new(
            vec![FeeTier::unbounded(0.2), FeeTier::bounded(10.0, 0.1)],
            &cur
        )
        .is_err());
        let bad_rate = CurrencyConfig {
            local_per_reference: 0.0,
            ..CurrencyConfig::default()
        };
        assert!(matches!(
            FeeSchedule::steam(&bad_rate),
            Err(ModelError::InvalidFeeSchedule(_))
        ));
    }

    #[test]
    fn serde_roundtrip_budget_line() {
        let line = BudgetLine {
            label: "Average".into(),
            amount: Decimal::new(60_000_000, 0),
        };
        let s = serde_json::to_string(&line).unwrap();
        let back: BudgetLine = serde_json::from_str(&s).unwrap();
        assert_eq!(back, line);
    }

    proptest! {
        #[test]
        fn steam_fee_never_rises_with_revenue(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let fees = FeeSchedule::steam(&CurrencyConfig::default()).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            // Higher cumulative revenue never moves back into a pricier tier.
            prop_assert!(fees.fee_fraction(lo) >= fees.fee_fraction(hi));
            prop_assert!((0.0..1.0).contains(&fees.fee_fraction(hi)));
        }

        #[test]
        fn two_segment_split_is_valid(share in 0.001f64..0.999, p1 in 0.0f64..10_000.0, p2 in 0.0f64..10_000.0) {
            let model = MarketModel::new(vec![
                MarketSegment::new("A", share, p1),
                MarketSegment::new("B", 1.0 - share, p2),
            ]);
            prop_assert!(model.is_ok());
        }
    }
}
