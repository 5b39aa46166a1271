#![deny(warnings)]

//! Headless CLI: simulate revenue for every unit estimate of a scenario and
//! print it next to the budget figures.

mod report;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sales_sim::{
    ProfitAggregator, ProfitRow, ProgressReporter, RemainderPolicy, RowKind, SimulationRun,
};
use scenario::{load_scenario, FixedRate, Scenario};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<PathBuf>,
    seed: Option<u64>,
    chunk_size: Option<usize>,
    rate: Option<f64>,
    simulate_remainder: bool,
    json: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    fn value<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let v = v.with_context(|| format!("{flag} needs a value"))?;
        v.parse()
            .with_context(|| format!("invalid value for {flag}: {v}"))
    }

    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => out.scenario = Some(value(&arg, it.next())?),
            "--seed" => out.seed = Some(value(&arg, it.next())?),
            "--chunk-size" => out.chunk_size = Some(value(&arg, it.next())?),
            "--rate" => out.rate = Some(value(&arg, it.next())?),
            "--simulate-remainder" => out.simulate_remainder = true,
            "--json" => out.json = true,
            "--version" | "-V" => out.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(out)
}

/// Logs per-run progress at roughly every tenth of the chunks.
#[derive(Default)]
struct LogProgress {
    step: u64,
}

impl ProgressReporter for LogProgress {
    fn run_started(&mut self, label: &str, total_units: u64, chunks: u64) {
        self.step = (chunks / 10).max(1);
        info!(source = label, total_units, chunks, "simulating sales");
    }

    fn chunk_finished(&mut self, label: &str, done: u64, chunks: u64) {
        if done % self.step == 0 || done == chunks {
            debug!(source = label, done, chunks, "chunk progress");
        }
    }

    fn run_finished(&mut self, run: &SimulationRun) {
        debug!(
            source = %run.label,
            samples = run.samples,
            gross = run.gross_revenue,
            net = run.net_revenue,
            "run finished"
        );
    }
}

#[derive(Serialize)]
struct JsonRow<'a> {
    label: &'a str,
    kind: RowKind,
    units: u64,
    display_units: f64,
    net_local: Decimal,
    net_reference: Decimal,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    as_of: Option<NaiveDate>,
    local_code: &'a str,
    reference_code: &'a str,
    rows: Vec<JsonRow<'a>>,
}

fn json_report<'a>(scenario: &'a Scenario, rows: &'a [ProfitRow]) -> JsonReport<'a> {
    let cur = &scenario.currency;
    JsonReport {
        title: &scenario.title,
        as_of: scenario.as_of,
        local_code: &cur.local_code,
        reference_code: &cur.reference_code,
        rows: rows
            .iter()
            .map(|r| JsonRow {
                label: &r.label,
                kind: r.kind,
                units: r.units,
                display_units: r.display_units,
                net_local: report::whole_units(r.net_revenue),
                net_reference: report::whole_units(cur.to_reference(r.net_revenue)),
            })
            .collect(),
    }
}

fn apply_overrides(scenario: &mut Scenario, args: &Args) {
    if let Some(rate) = args.rate {
        scenario.refresh_exchange_rate(&FixedRate(rate));
    }
    let sim = &mut scenario.simulation;
    if let Some(seed) = args.seed {
        sim.seed = Some(seed);
    }
    if let Some(chunk_size) = args.chunk_size {
        sim.chunk_size = chunk_size;
    }
    if args.simulate_remainder {
        sim.remainder = RemainderPolicy::Simulate;
    }
}

/// `RUST_LOG` directives when given and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    // Logging setup; the filter alone decides the level.
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "sales-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(scenario = ?args.scenario, seed = ?args.seed, "starting CLI");

    let mut scenario = match &args.scenario {
        Some(path) => load_scenario(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Scenario::builtin()?,
    };
    apply_overrides(&mut scenario, &args);

    let inputs = scenario.inputs()?;
    let aggregator =
        ProfitAggregator::new(&inputs.model, &inputs.fees, scenario.simulation.clone())?;
    let mut rng = aggregator.config().rng();
    let rows = aggregator.aggregate(&inputs.estimates, &mut rng, &mut LogProgress::default())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_report(&scenario, &rows))?);
        return Ok(());
    }

    let as_of = scenario
        .as_of
        .map(|d| format!(" (as of {d})"))
        .unwrap_or_default();
    println!("{} profit from several sources{as_of}", scenario.title);
    if let Some(reviews) = &scenario.reviews {
        println!(
            "* reviews {} ~ positive {} + negative {}",
            reviews.counts.total(),
            reviews.counts.positive,
            reviews.counts.negative
        );
    }
    print!("{}", report::profit_table(&scenario.title, &rows, &scenario.currency));
    if !scenario.budget.is_empty() {
        print!(
            "{}",
            report::budget_table(&scenario.title, &scenario.budget, &scenario.currency)
        );
    }
    Ok(())
}
