//! Revenue for every unit-count estimate plus min / median / max summary rows.

use std::fmt;

use rand::Rng;
use sales_core::{Estimate, FeeSchedule, MarketModel};
use serde::Serialize;
use tracing::info;

use crate::{ProgressReporter, RevenueSimulator, SimError, SimulationConfig};

/// Where a result row comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Estimate,
    Minimum,
    Median,
    Maximum,
}

impl RowKind {
    pub fn is_derived(self) -> bool {
        !matches!(self, RowKind::Estimate)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RowKind::Estimate => "Estimate",
            RowKind::Minimum => "Minimum",
            RowKind::Median => "Median",
            RowKind::Maximum => "Maximum",
        };
        f.write_str(s)
    }
}

/// One line of the profit table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfitRow {
    pub label: String,
    pub kind: RowKind,
    /// Units actually simulated.
    pub units: u64,
    /// Units shown in reports. Equals `units` except on an even-count median row,
    /// which keeps the half unit.
    pub display_units: f64,
    pub samples: u64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
}

/// A derived summary estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryEstimate {
    pub kind: RowKind,
    pub estimate: Estimate,
    pub display_units: f64,
}

fn middle_pair(units: &[u64]) -> Option<(u64, u64)> {
    if units.is_empty() {
        return None;
    }
    let mut sorted = units.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some((sorted[mid], sorted[mid]))
    } else {
        Some((sorted[mid - 1], sorted[mid]))
    }
}

/// Median of unit counts; even-length input takes the floor of the two middle values' mean.
///
/// Returns `None` for empty input.
pub fn median_units(units: &[u64]) -> Option<u64> {
    middle_pair(units).map(|(lo, hi)| ((lo as u128 + hi as u128) / 2) as u64)
}

/// Median of unit counts without rounding, e.g. `250.5` for `[200, 301]`.
pub fn median_exact(units: &[u64]) -> Option<f64> {
    middle_pair(units).map(|(lo, hi)| (lo as f64 + hi as f64) / 2.0)
}

/// Synthetic minimum, median and maximum estimates, in that order.
pub fn derived_estimates(estimates: &[Estimate]) -> Result<Vec<SummaryEstimate>, SimError> {
    let units: Vec<u64> = estimates.iter().map(|e| e.units).collect();
    let (Some(min), Some(max), Some(median), Some(exact)) = (
        units.iter().copied().min(),
        units.iter().copied().max(),
        median_units(&units),
        median_exact(&units),
    ) else {
        return Err(SimError::InvalidInput("no unit-count estimates".into()));
    };
    Ok([
        (RowKind::Minimum, min, min as f64),
        (RowKind::Median, median, exact),
        (RowKind::Maximum, max, max as f64),
    ]
    .into_iter()
    .map(|(kind, units, display_units)| SummaryEstimate {
        kind,
        estimate: Estimate::new(kind.to_string(), units),
        display_units,
    })
    .collect())
}

/// Runs the simulator once per estimate and once per derived summary row.
#[derive(Clone, Debug)]
pub struct ProfitAggregator<'a> {
    simulator: RevenueSimulator<'a>,
    cfg: SimulationConfig,
}

impl<'a> ProfitAggregator<'a> {
    pub fn new(
        model: &'a MarketModel,
        fees: &'a FeeSchedule,
        cfg: SimulationConfig,
    ) -> Result<Self, SimError> {
        cfg.validate()?;
        Ok(Self {
            simulator: RevenueSimulator::new(model, fees)?,
            cfg,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.cfg
    }

    /// Estimates sorted ascending by units (ties keep input order), followed by
    /// the minimum, median and maximum rows.
    pub fn aggregate<R, P>(
        &self,
        estimates: &[Estimate],
        rng: &mut R,
        progress: &mut P,
    ) -> Result<Vec<ProfitRow>, SimError>
    where
        R: Rng + ?Sized,
        P: ProgressReporter + ?Sized,
    {
        let derived = derived_estimates(estimates)?;
        let mut primary: Vec<&Estimate> = estimates.iter().collect();
        primary.sort_by_key(|e| e.units);
        info!(
            estimates = primary.len(),
            chunk_size = self.cfg.chunk_size,
            "aggregating revenue"
        );

        let rows = primary
            .into_iter()
            .map(|e| (RowKind::Estimate, e, e.units as f64))
            .chain(derived.iter().map(|d| (d.kind, &d.estimate, d.display_units)));
        let mut out = Vec::with_capacity(estimates.len() + derived.len());
        for (kind, e, display_units) in rows {
            let run = self
                .simulator
                .run(&e.label, e.units, &self.cfg, rng, progress)?;
            out.push(ProfitRow {
                label: run.label,
                kind,
                units: run.total_units,
                display_units,
                samples: run.samples,
                gross_revenue: run.gross_revenue,
                net_revenue: run.net_revenue,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoProgress;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sales_core::{CurrencyConfig, MarketSegment};

    fn setup() -> (MarketModel, FeeSchedule) {
        let model = MarketModel::new(vec![
            MarketSegment::new("US", 0.6, 60.0),
            MarketSegment::new("EU", 0.4, 50.0),
        ])
        .unwrap();
        let fees = FeeSchedule::steam(&CurrencyConfig::identity("USD", "$")).unwrap();
        (model, fees)
    }

    fn cfg() -> SimulationConfig {
        SimulationConfig {
            chunk_size: 10,
            ..SimulationConfig::seeded(5)
        }
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        assert_eq!(median_units(&[500, 100, 300]), Some(300));
        assert_eq!(median_units(&[1, 2]), Some(1));
        assert_eq!(median_units(&[100, 400, 200, 300]), Some(250));
        assert_eq!(median_units(&[]), None);
        assert_eq!(median_exact(&[1, 2]), Some(1.5));
        assert_eq!(median_exact(&[100, 400, 200, 300]), Some(250.0));
        assert_eq!(median_exact(&[500, 100, 300]), Some(300.0));
        assert_eq!(median_exact(&[]), None);
    }

    #[test]
    fn even_median_row_shows_the_half_unit() {
        let (model, fees) = setup();
        let agg = ProfitAggregator::new(&model, &fees, cfg()).unwrap();
        let estimates = vec![Estimate::new("B", 201), Estimate::new("A", 100)];
        let rows = agg
            .aggregate(&estimates, &mut agg.config().rng(), &mut NoProgress)
            .unwrap();
        let median = rows.iter().find(|r| r.kind == RowKind::Median).unwrap();
        assert_eq!(median.units, 150);
        assert_eq!(median.display_units, 150.5);
        for r in rows.iter().filter(|r| r.kind != RowKind::Median) {
            assert_eq!(r.display_units, r.units as f64);
        }
    }

    #[test]
    fn rows_are_sorted_then_followed_by_summary() {
        let (model, fees) = setup();
        let agg = ProfitAggregator::new(&model, &fees, cfg()).unwrap();
        let estimates = vec![
            Estimate::new("C", 500),
            Estimate::new("A", 100),
            Estimate::new("B", 300),
        ];
        let mut rng = agg.config().rng();
        let rows = agg.aggregate(&estimates, &mut rng, &mut NoProgress).unwrap();
        let got: Vec<(&str, RowKind, u64)> = rows
            .iter()
            .map(|r| (r.label.as_str(), r.kind, r.units))
            .collect();
        assert_eq!(
            got,
            vec![
                ("A", RowKind::Estimate, 100),
                ("B", RowKind::Estimate, 300),
                ("C", RowKind::Estimate, 500),
                ("Minimum", RowKind::Minimum, 100),
                ("Median", RowKind::Median, 300),
                ("Maximum", RowKind::Maximum, 500),
            ]
        );
        assert_eq!(rows.iter().filter(|r| r.kind.is_derived()).count(), 3);
        assert!(rows.iter().all(|r| r.net_revenue > 0.0));
    }

    #[test]
    fn ties_keep_input_order() {
        let (model, fees) = setup();
        let agg = ProfitAggregator::new(&model, &fees, cfg()).unwrap();
        let estimates = vec![Estimate::new("second", 200), Estimate::new("first", 200)];
        let rows = agg
            .aggregate(&estimates, &mut ChaCha8Rng::seed_from_u64(1), &mut NoProgress)
            .unwrap();
        assert_eq!(rows[0].label, "second");
        assert_eq!(rows[1].label, "first");
    }

    #[test]
    fn empty_estimates_are_invalid_input() {
        let (model, fees) = setup();
        let agg = ProfitAggregator::new(&model, &fees, cfg()).unwrap();
        let err = agg
            .aggregate(&[], &mut ChaCha8Rng::seed_from_u64(1), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)));
    }

    #[test]
    fn zero_chunk_size_fails_at_construction() {
        let (model, fees) = setup();
        let bad = SimulationConfig {
            chunk_size: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            ProfitAggregator::new(&model, &fees, bad),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn seeded_aggregation_is_reproducible() {
        let (model, fees) = setup();
        let agg = ProfitAggregator::new(&model, &fees, cfg()).unwrap();
        let estimates = vec![Estimate::new("A", 1_000), Estimate::new("B", 5_000)];
        let a = agg
            .aggregate(&estimates, &mut agg.config().rng(), &mut NoProgress)
            .unwrap();
        let b = agg
            .aggregate(&estimates, &mut agg.config().rng(), &mut NoProgress)
            .unwrap();
        assert_eq!(a, b);
    }
}
