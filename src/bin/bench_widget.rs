//! Wall-clock benchmarks for the widget solver.
//!
//! Usage:
//!   WIDGET_NUM_DICE=5 WIDGET_NUM_FACES=6 bench_widget [iterations]
//!
//! The terminal table is synthetic: sum of the faces, plus 50 when all dice
//! show the same face. Both resolvers are timed and checked for agreement.

use std::time::Instant;

use widget::dice_mechanics::iter_possible_rolls;
use widget::env_config::{init_rayon_threads_lenient, widget_config_from_env};
use widget::phase0_tables::precompute_lookup_tables;
use widget::state_computation::Widget;
use widget::validation::parse_roll_values;
use widget::widget_solver::{compute_from_cond, compute_from_cond_dp, compute_values_given_kept};

struct BenchResult {
    mean_ms: f64,
}

fn run_bench<F: FnMut()>(name: &str, iterations: usize, mut f: F) -> BenchResult {
    // Warmup
    f();

    let mut times = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        f();
        times.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    let n = times.len() as f64;
    let mean = times.iter().sum::<f64>() / n;
    let std = (times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n).sqrt();

    let mut sorted = times.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let p95 = sorted[((n * 0.95) as usize).min(sorted.len() - 1)];

    if mean >= 1.0 {
        println!(
            "  {:<32} {:>8.1} ms  (σ={:.1}, p95={:.1})",
            name, mean, std, p95
        );
    } else {
        println!(
            "  {:<32} {:>8.0} μs  (σ={:.0}, p95={:.0})",
            name,
            mean * 1000.0,
            std * 1000.0,
            p95 * 1000.0
        );
    }

    BenchResult { mean_ms: mean }
}

fn synthetic_value(dice: &[u8]) -> f64 {
    let total: u32 = dice.iter().map(|&d| d as u32).sum();
    let bonus = if dice.first() == dice.last() && !dice.is_empty() {
        50.0
    } else {
        0.0
    };
    total as f64 + bonus
}

fn main() {
    let iterations: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(20)
        .max(1);

    let config = match widget_config_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let threads = init_rayon_threads_lenient();

    println!("Widget benchmarks");
    println!(
        "  dice={} faces={} rolls={} keep_all_optimal={} threads={} iterations={}",
        config.num_dice,
        config.num_faces,
        config.num_rolls,
        config.keep_all_optimal,
        threads,
        iterations
    );

    let index = match precompute_lookup_tables(&config) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!(
        "  {} full rolls, {} keep-multisets",
        index.layer_len(config.num_dice),
        index.lattice_len()
    );

    let raw: Vec<(Vec<u8>, f64)> = iter_possible_rolls(config.num_dice, config.num_faces)
        .map(|r| {
            let value = synthetic_value(&r);
            (r.into_vec(), value)
        })
        .collect();
    let terminal = match parse_roll_values(&index, raw) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!();

    run_bench("phase0 tables", iterations, || {
        let _ = precompute_lookup_tables(&config);
    });

    let cond = compute_values_given_kept(&index, &terminal);
    run_bench("conditional values", iterations, || {
        let _ = compute_values_given_kept(&index, &terminal);
    });

    let dp = run_bench("resolve (lattice DP)", iterations, || {
        let _ = compute_from_cond_dp(&index, &cond, config.keep_all_optimal);
    });
    let bf = run_bench("resolve (brute force)", iterations, || {
        let _ = compute_from_cond(&index, &cond, config.keep_all_optimal);
    });
    if dp.mean_ms > 0.0 {
        println!("  {:<32} {:>8.1}x", "brute force / DP", bf.mean_ms / dp.mean_ms);
    }

    let dp_solution = compute_from_cond_dp(&index, &cond, config.keep_all_optimal);
    let bf_solution = compute_from_cond(&index, &cond, config.keep_all_optimal);
    if dp_solution.roll_values != bf_solution.roll_values {
        eprintln!("Resolver mismatch: lattice DP and brute force disagree on round values");
        std::process::exit(1);
    }

    let mut ev = 0.0;
    run_bench("full solve", iterations, || {
        if let Ok(widget) = Widget::from_terminal_values(config, terminal.clone()) {
            ev = widget.expected_value();
        }
    });

    println!();
    println!("Expected value before first roll: {:.6}", ev);
}
