//! Randomized per-sale revenue accumulation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use sales_core::{FeeSchedule, MarketModel, ModelError};
use serde::Serialize;
use tracing::debug;

use crate::{ProgressReporter, RemainderPolicy, SimError, SimulationConfig};

/// Outcome of simulating one unit count.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulationRun {
    pub label: String,
    pub total_units: u64,
    /// Sales actually drawn; below `total_units` when the remainder is truncated.
    pub samples: u64,
    /// Sum of sampled prices before commission.
    pub gross_revenue: f64,
    /// Revenue after commission, in local currency.
    pub net_revenue: f64,
}

/// Draws sales from a market model and accumulates fee-adjusted revenue.
///
/// The cumulative weight table is built once in [`RevenueSimulator::new`] and
/// reused for every draw.
#[derive(Clone, Debug)]
pub struct RevenueSimulator<'a> {
    model: &'a MarketModel,
    fees: &'a FeeSchedule,
    sampler: WeightedIndex<f64>,
}

impl<'a> RevenueSimulator<'a> {
    pub fn new(model: &'a MarketModel, fees: &'a FeeSchedule) -> Result<Self, SimError> {
        let sampler = WeightedIndex::new(model.weights())
            .map_err(|e| ModelError::InvalidModel(e.to_string()))?;
        Ok(Self {
            model,
            fees,
            sampler,
        })
    }

    pub fn model(&self) -> &MarketModel {
        self.model
    }

    /// Net revenue of `total_units` sales drawn in chunks of `chunk_size`.
    ///
    /// Only whole chunks are simulated.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        total_units: u64,
        chunk_size: usize,
        rng: &mut R,
    ) -> Result<f64, SimError> {
        let cfg = SimulationConfig {
            chunk_size,
            ..SimulationConfig::default()
        };
        let run = self.run("", total_units, &cfg, rng, &mut crate::NoProgress)?;
        Ok(run.net_revenue)
    }

    /// Simulate one labelled unit count, reporting progress per chunk.
    pub fn run<R, P>(
        &self,
        label: &str,
        total_units: u64,
        cfg: &SimulationConfig,
        rng: &mut R,
        progress: &mut P,
    ) -> Result<SimulationRun, SimError>
    where
        R: Rng + ?Sized,
        P: ProgressReporter + ?Sized,
    {
        cfg.validate()?;
        let chunk = cfg.chunk_size as u64;
        let full_chunks = total_units / chunk;
        let tail = match cfg.remainder {
            RemainderPolicy::Truncate => 0,
            RemainderPolicy::Simulate => total_units % chunk,
        };
        let chunks = full_chunks + u64::from(tail > 0);

        let mut run = SimulationRun {
            label: label.to_string(),
            total_units,
            ..SimulationRun::default()
        };
        progress.run_started(label, total_units, chunks);
        for done in 1..=full_chunks {
            self.draw_chunk(chunk, rng, &mut run);
            progress.chunk_finished(label, done, chunks);
        }
        if tail > 0 {
            self.draw_chunk(tail, rng, &mut run);
            progress.chunk_finished(label, chunks, chunks);
        }
        debug!(
            label,
            total_units,
            samples = run.samples,
            net = run.net_revenue,
            "simulation finished"
        );
        progress.run_finished(&run);
        Ok(run)
    }

    fn draw_chunk<R: Rng + ?Sized>(&self, n: u64, rng: &mut R, run: &mut SimulationRun) {
        let prices = self.model.prices();
        for _ in 0..n {
            let price = prices[self.sampler.sample(rng)];
            // The tier is picked from revenue booked before this sale.
            let fee = self.fees.fee_fraction(run.net_revenue);
            run.net_revenue += price * (1.0 - fee);
            run.gross_revenue += price;
            run.samples += 1;
        }
    }
}
