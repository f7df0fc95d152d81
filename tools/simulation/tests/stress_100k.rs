//! Stress test: 100,000 market events
//!
//! Replays a 100k-trade synthetic tape plus a custom signal feed through the
//! crossover bot, asserts every event was dispatched, measures throughput.

use simulation::bots::{SmaCrossover, SmaCrossoverConfig};
use simulation::synthetic::{SyntheticTape, TapeConfig};
use simulation::Simulation;
use std::time::Instant;
use types::order::OrderState;
use types::update::{CustomPayload, CustomUpdate};

fn signal_feed(count: usize, interval: i64) -> Vec<CustomUpdate> {
    (0..count)
        .map(|i| {
            let ts = i as i64 * interval + interval / 2;
            CustomUpdate::new(ts, "signal", "", CustomPayload::Value(i as f64))
        })
        .collect()
}

#[test]
#[ignore] // Run with: cargo test --test stress_100k -- --ignored
fn test_100k_events() {
    let target_trades = 100_000;
    let tape = TapeConfig::default();
    let interval = tape.interval;
    let trades = SyntheticTape::new(tape, 42).generate(target_trades);

    let mut sim = Simulation::with_latencies(
        2_000_000,
        500_000,
        SmaCrossover::new(SmaCrossoverConfig {
            max_position: 1_000.into(),
            ..SmaCrossoverConfig::default()
        }),
    )
    .unwrap();
    sim.add_trades("SYN", trades)
        .add_custom_updates("signal", signal_feed(target_trades / 10, interval * 10));

    let start = Instant::now();
    let summary = sim.run().unwrap();
    let elapsed = start.elapsed();

    println!("=== STRESS TEST 100K RESULTS ===");
    println!("Market events: {}", summary.market_events);
    println!("Actions: {}", summary.actions);
    println!("Orders: {}", summary.orders_created);
    println!("Fills: {}", summary.fills);
    println!("Elapsed: {:.2?}", elapsed);
    println!(
        "Throughput: {:.0} events/sec",
        summary.market_events as f64 / elapsed.as_secs_f64()
    );
    println!("================================");

    assert_eq!(summary.market_events, (target_trades + target_trades / 10) as u64);
    assert_eq!(summary.actions, summary.orders_created as u64);
    assert!(summary.fills > 0, "Expected some fills");
    assert!(sim.orders().all(|o| o.check_invariant()));
}

#[test]
fn test_10k_events_quick() {
    let trades = SyntheticTape::new(TapeConfig::default(), 42).generate(10_000);
    let mut sim = Simulation::with_latencies(0, 0, SmaCrossover::new(SmaCrossoverConfig::default())).unwrap();
    sim.add_trades("SYN", trades);

    let start = Instant::now();
    let summary = sim.run().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.market_events, 10_000);
    assert!(summary.orders_created > 0);
    assert!(sim
        .orders()
        .all(|o| o.state != OrderState::PendingNew && o.check_invariant()));
    println!(
        "10k events in {:.2?} ({:.0} events/sec)",
        elapsed,
        summary.market_events as f64 / elapsed.as_secs_f64()
    );
}
