#![deny(warnings)]

//! Scenario files: every input of a revenue simulation in one YAML document.
//!
//! A scenario bundles the market split, fee tiers, currency, unit estimates from
//! trackers and review heuristics, and budget figures. Values fetched from outside
//! services (exchange rates, review counts) enter here as plain numbers.

use chrono::NaiveDate;
use sales_core::{
    steam_tiers, BudgetLine, CurrencyConfig, Estimate, FeeSchedule, FeeTier, MarketModel,
    MarketSegment, ModelError,
};
use sales_sim::SimulationConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Scenario shipped with the binary.
pub const BUILTIN_SCENARIO: &str = include_str!("../../../assets/scenarios/stalker2.yaml");

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid scenario: {0}")]
    Parse(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        ScenarioError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for ScenarioError {
    fn from(e: serde_yaml::Error) -> Self {
        ScenarioError::Parse(e.to_string())
    }
}

/// Positive and negative review totals of a store page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewCounts {
    pub positive: u64,
    pub negative: u64,
}

impl ReviewCounts {
    pub fn total(&self) -> u64 {
        self.positive.saturating_add(self.negative)
    }
}

/// Review counts plus the "units per review" multipliers to derive estimates from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewHeuristic {
    #[serde(flatten)]
    pub counts: ReviewCounts,
    #[serde(default)]
    pub multipliers: Vec<u64>,
}

impl ReviewHeuristic {
    /// One estimate per multiplier, labelled "reviews x N".
    pub fn estimates(&self) -> Vec<Estimate> {
        let total = self.counts.total();
        self.multipliers
            .iter()
            .map(|&m| Estimate::new(format!("reviews x {m}"), total.saturating_mul(m)))
            .collect()
    }
}

/// Source of the local-per-reference exchange rate.
pub trait ExchangeRateSource {
    fn local_per_reference(&self, local_code: &str, reference_code: &str) -> Option<f64>;
}

/// A rate pinned in configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRate(pub f64);

impl ExchangeRateSource for FixedRate {
    fn local_per_reference(&self, _local_code: &str, _reference_code: &str) -> Option<f64> {
        Some(self.0)
    }
}

/// Raw scenario document.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub title: String,
    /// Date the tracker figures were collected.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub currency: CurrencyConfig,
    pub market: Vec<MarketSegment>,
    #[serde(default = "steam_tiers")]
    pub fee_tiers: Vec<FeeTier>,
    #[serde(default)]
    pub trackers: Vec<Estimate>,
    #[serde(default)]
    pub reviews: Option<ReviewHeuristic>,
    #[serde(default)]
    pub budget: Vec<BudgetLine>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Validated inputs ready for the simulator.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub model: MarketModel,
    pub fees: FeeSchedule,
    pub estimates: Vec<Estimate>,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        if scenario.title.trim().is_empty() {
            return Err(ScenarioError::Parse("title is empty".into()));
        }
        Ok(scenario)
    }

    pub fn builtin() -> Result<Self, ScenarioError> {
        Self::from_yaml_str(BUILTIN_SCENARIO)
    }

    /// Tracker estimates followed by review-derived ones.
    pub fn estimates(&self) -> Vec<Estimate> {
        let mut out = self.trackers.clone();
        if let Some(reviews) = &self.reviews {
            out.extend(reviews.estimates());
        }
        out
    }

    /// Replace the configured exchange rate with one from `source`, if it has one.
    pub fn refresh_exchange_rate(&mut self, source: &dyn ExchangeRateSource) {
        let cur = &mut self.currency;
        match source.local_per_reference(&cur.local_code, &cur.reference_code) {
            Some(rate) => {
                info!(
                    local = %cur.local_code,
                    reference = %cur.reference_code,
                    rate,
                    "exchange rate updated"
                );
                cur.local_per_reference = rate;
            }
            None => warn!(
                local = %cur.local_code,
                reference = %cur.reference_code,
                "no exchange rate available, keeping configured value"
            ),
        }
    }

    /// Build the validated market model, fee schedule and estimate list.
    pub fn inputs(&self) -> Result<Inputs, ScenarioError> {
        let model = MarketModel::new(self.market.clone())?;
        let fees = FeeSchedule::new(self.fee_tiers.clone(), &self.currency)?;
        Ok(Inputs {
            model,
            fees,
            estimates: self.estimates(),
        })
    }
}

/// Read and parse a scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let scenario = Scenario::from_yaml_str(&text)?;
    info!(path = %path.display(), title = %scenario.title, "scenario loaded");
    Ok(scenario)
}
