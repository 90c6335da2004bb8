//! End-to-end scenarios against literal stream/threshold/thread-count
//! combinations, mirroring the scenario table tests must satisfy: a
//! skewed stream with a long singleton tail (E1), an all-one-key stream
//! (E3), and a stream where no key can possibly clear the threshold (E4).
//! Shared config across scenarios: `b=1.08, P=16, B=1024,
//! filter_capacity=16, K=1024`.

mod common;

use heavykeeper::config::{AggregationMode, EvaluationMode};
use heavykeeper::{Engine, EngineConfig};

fn config(num_threads: usize, theta: f64) -> EngineConfig {
    EngineConfig {
        num_threads,
        theta,
        filter_capacity: 16,
        bucket_count: 1024,
        promotion_threshold: 16,
        decay_base: 1.08,
        max_kicks: 10,
        heavy_ratio: 0.8,
        local_heap_bound: 1024,
        aggregation_mode: AggregationMode::SharedMap,
        evaluation_mode: EvaluationMode::Accuracy,
        pin_threads: false,
    }
}

/// E1: two clear heavy hitters, two sub-threshold keys, and a long
/// singleton tail that must not pollute the reported set.
#[test]
fn e1_skewed_stream_with_singleton_tail_finds_only_the_true_heavy_hitters() {
    let engine = Engine::build(config(4, 0.1)).expect("valid config");

    let mut source = 0usize;
    let mut feed = |key: u32, count: u32| {
        for _ in 0..count {
            engine.worker_feed(source % 4, key, 1);
            source += 1;
        }
    };
    feed(1, 100_000);
    feed(2, 50_000);
    feed(3, 1_000);
    feed(4, 1_000);
    for k in 0..100_000u32 {
        feed(10_000 + k, 1);
    }

    common::wait_for_quiescence(&engine, 1);
    common::wait_for_quiescence(&engine, 2);

    let n: f64 = 252_000.0;
    let threshold = (n * 0.1) as u32;
    let mut heavy_hitters = engine.query_heavy_hitters(threshold);
    heavy_hitters.sort();

    assert!(
        heavy_hitters.iter().any(|&(k, _)| k == 1),
        "key 1 should clear the threshold: {heavy_hitters:?}"
    );
    assert!(
        heavy_hitters.iter().any(|&(k, _)| k == 2),
        "key 2 should clear the threshold: {heavy_hitters:?}"
    );
    assert!(
        !heavy_hitters.iter().any(|&(k, _)| k == 3 || k == 4),
        "sub-threshold keys must not appear: {heavy_hitters:?}"
    );

    let stats = engine.stop();
    assert!(stats.accounting_is_consistent());
}

/// E3: a single key repeated a million times must converge to an estimate
/// within 1% of the true count.
#[test]
fn e3_all_same_key_converges_close_to_the_true_count() {
    let engine = Engine::build(config(4, 0.5)).expect("valid config");

    for i in 0..1_000_000u32 {
        engine.worker_feed((i % 4) as usize, 42, 1);
    }

    common::wait_for_quiescence(&engine, 42);

    let estimate = engine.query_estimate(42);
    assert!(
        estimate >= 990_000,
        "expected estimate within 1% of 1_000_000, got {estimate}"
    );

    let heavy_hitters = engine.query_heavy_hitters(500_000);
    assert_eq!(heavy_hitters.len(), 1);
    assert_eq!(heavy_hitters[0].0, 42);

    let stats = engine.stop();
    assert!(stats.accounting_is_consistent());
}

/// E4: every key appears exactly once, so no key can ever clear a
/// threshold above 1 — the heavy-hitter set must be empty.
#[test]
fn e4_round_robin_singletons_yield_no_heavy_hitters() {
    let engine = Engine::build(config(8, 0.001)).expect("valid config");

    let total_keys = 8 * 100_000u32;
    for key in 0..total_keys {
        engine.worker_feed((key % 8) as usize, key, 1);
    }

    // No probe key to wait on specifically; give the engine's channels and
    // inboxes time to drain entirely instead.
    std::thread::sleep(std::time::Duration::from_millis(500));

    let threshold = ((total_keys as f64) * 0.001) as u32;
    let heavy_hitters = engine.query_heavy_hitters(threshold.max(1));
    assert!(
        heavy_hitters.is_empty(),
        "no key repeats, so none should clear the threshold: {heavy_hitters:?}"
    );

    let stats = engine.stop();
    assert_eq!(stats.total_received(), total_keys as u64);
    assert!(stats.accounting_is_consistent());
}
