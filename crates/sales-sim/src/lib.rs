#![deny(warnings)]

//! Stochastic sales simulation: fee-adjusted revenue for a unit count and
//! aggregation across unit-count estimates.
//!
//! Randomness and progress reporting are injected by the caller. Seed the
//! generator through [`SimulationConfig::rng`] to get reproducible output.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sales_core::ModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod aggregate;
mod progress;
mod simulator;

pub use aggregate::{
    derived_estimates, median_exact, median_units, ProfitAggregator, ProfitRow, RowKind,
    SummaryEstimate,
};
pub use progress::{NoProgress, ProgressReporter};
pub use simulator::{RevenueSimulator, SimulationRun};

/// Sales simulated per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Errors produced by the simulator and the aggregator.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// A call parameter is out of range, e.g. a zero chunk size.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Caller-supplied data cannot be aggregated, e.g. no estimates at all.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// What to do with the `total_units % chunk_size` sales left after the last full chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Drop them; matches the historical numbers.
    #[default]
    Truncate,
    /// Simulate them as one final short chunk.
    Simulate,
}

/// Simulation knobs. Unknown keys are rejected when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Sales drawn per chunk (> 0).
    pub chunk_size: usize,
    /// Seed for deterministic RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub remainder: RemainderPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            seed: None,
            remainder: RemainderPolicy::Truncate,
        }
    }
}

impl SimulationConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.chunk_size == 0 {
            return Err(SimError::InvalidParameter(
                "chunk size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Random source for one aggregation.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
