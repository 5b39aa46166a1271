use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sales_core::{CurrencyConfig, Estimate, FeeSchedule, MarketModel, MarketSegment};
use sales_sim::{NoProgress, ProfitAggregator, RevenueSimulator, SimulationConfig};

fn build_model() -> MarketModel {
    MarketModel::new(vec![
        MarketSegment::new("US", 0.229, 2490.52),
        MarketSegment::new("Ukraine", 0.146, 1399.00),
        MarketSegment::new("Germany", 0.081, 2634.46),
        MarketSegment::new("China", 0.081, 1536.40),
        MarketSegment::new("World", 0.463, 1399.00 * 1.5),
    ])
    .unwrap()
}

fn bench_simulate(c: &mut Criterion) {
    let model = build_model();
    let fees = FeeSchedule::steam(&CurrencyConfig::default()).unwrap();
    let sim = RevenueSimulator::new(&model, &fees).unwrap();
    c.bench_function("simulate 100k units", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| black_box(sim.simulate(100_000, 1000, &mut rng).unwrap()))
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let model = build_model();
    let fees = FeeSchedule::steam(&CurrencyConfig::default()).unwrap();
    let agg = ProfitAggregator::new(&model, &fees, SimulationConfig::seeded(42)).unwrap();
    let estimates: Vec<Estimate> = (1..=5)
        .map(|i| Estimate::new(format!("E{i}"), i * 20_000))
        .collect();
    c.bench_function("aggregate 5 estimates", |b| {
        b.iter(|| {
            let mut rng = agg.config().rng();
            black_box(agg.aggregate(&estimates, &mut rng, &mut NoProgress).unwrap())
        })
    });
}

criterion_group!(benches, bench_simulate, bench_aggregate);
criterion_main!(benches);
