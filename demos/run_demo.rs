//! Minimal demo entry point (SPEC_FULL.md §10.7): feeds a small synthetic,
//! heavily skewed stream through the engine and prints what it found. Not a
//! benchmark harness or a dataset loader — those live in `benches/` and are
//! out of scope for this crate, per the spec's non-goals around external
//! dataset generation and CLI tooling.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use heavykeeper::{Engine, EngineConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let config = EngineConfig {
        num_threads: 4,
        ..Default::default()
    };
    let engine = Engine::build(config)?;

    // A few keys dominate the stream; the rest is near-uniform noise.
    let heavy_keys = [1u32, 2, 3];
    for i in 0..20_000u32 {
        let (key, source) = if i % 10 < 6 {
            (heavy_keys[(i as usize) % heavy_keys.len()], i as usize % 4)
        } else {
            (1_000 + (i % 5_000), i as usize % 4)
        };
        engine.worker_feed(source, key, 1);
    }

    std::thread::sleep(std::time::Duration::from_millis(200));

    tracing::info!("estimate(key=1) = {}", engine.query_estimate(1));
    let mut heavy_hitters = engine.query_heavy_hitters(500);
    heavy_hitters.sort_by(|a, b| b.1.cmp(&a.1));
    tracing::info!(?heavy_hitters, "current heavy hitters (threshold=500)");

    let stats = engine.stop();
    tracing::info!(
        total_received = stats.total_received(),
        consistent = stats.accounting_is_consistent(),
        "engine stopped"
    );

    Ok(())
}
