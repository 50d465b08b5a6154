use std::time::Instant;

use atpg_core::config::Config;
use atpg_core::dtpg_engine::{DtpgEngine, DtpgResult};
use atpg_core::fault::FaultSet;
use atpg_core::stats::DtpgStats;
use atpg_core::structural_index::StructuralIndex;
use atpg_netgen::{RandomNetConfig, RandomNetwork};
use clap::Parser;
use rand::Rng;
use rayon::prelude::*;

/// CMD Arguments
#[derive(Parser, Debug)]
#[command(
    version = "0.1",
    about = "
        Generates a random gate-level netlist and, unless --no-dtpg is given,
        runs stuck-at ATPG over every collapsed fault to stress-test the engine.
    "
)]
struct Args {
    /// Number of primary inputs.
    #[arg(long, default_value_t = 8)]
    n_pi: usize,
    /// Number of combinational gates before the register stage.
    #[arg(long, default_value_t = 40)]
    n_gates1: usize,
    /// Number of storage elements (flip-flops). Zero for a purely
    /// combinational network.
    #[arg(long, default_value_t = 0)]
    n_ff: usize,
    /// Number of combinational gates after the register stage.
    #[arg(long, default_value_t = 0)]
    n_gates2: usize,
    /// Number of primary outputs.
    #[arg(long, default_value_t = 4)]
    n_po: usize,
    /// Rates for And, Nand, Or, Nor, Xor, Xnor, Unary(Not/Buff) gate kinds.
    /// Must sum to 1.
    #[arg(long, value_delimiter = ',', num_args = 7, default_value = "0.25,0.15,0.25,0.15,0.1,0.05,0.05")]
    gate_rates: Vec<f64>,
    /// Maximum fanin for variable-arity gates.
    #[arg(long, default_value_t = 4)]
    max_fanin: usize,
    #[arg(long, value_parser = clap::value_parser!(u64))]
    seed: Option<u64>,
    /// Skip the ATPG sweep, only report the generated network's shape.
    #[arg(long, default_value_t = false)]
    no_dtpg: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("generating random network with seed {}", seed);
    let config = RandomNetConfig::from_vec(args.gate_rates.clone());
    let rn = RandomNetwork::new_random(
        args.n_pi,
        args.n_gates1,
        args.n_ff,
        args.n_gates2,
        args.n_po,
        config,
        seed,
    );

    println!(
        "Generated network: {} nodes, {} PI, {} PO, {} storage elements. Seed: {}.",
        rn.net.num_nodes(),
        rn.net.primary_inputs().len(),
        rn.net.primary_outputs().len(),
        rn.net.storage_elements().len(),
        seed,
    );

    if args.no_dtpg {
        return;
    }

    let start = Instant::now();
    let structural = StructuralIndex::build(&rn.net);
    let fault_set = FaultSet::collapsed_stuck_at(&rn.net);
    let representatives: Vec<_> = fault_set.representatives().collect();
    println!(
        "{} collapsed representative faults out of {} total sites.",
        representatives.len(),
        fault_set.faults().len()
    );

    let dtpg_config = Config::default();
    let total = representatives
        .par_iter()
        .map(|fault| {
            let ffr_root = structural.ffr_root_of(fault.site.node());
            let engine = DtpgEngine::for_ffr(&rn.net, &structural, ffr_root, dtpg_config.clone());
            match engine.solve(fault) {
                Ok((_, stats)) => stats,
                Err(_) => DtpgStats::default(),
            }
        })
        .reduce(DtpgStats::default, |mut acc, s| {
            acc.merge(&s);
            acc
        });

    let duration = start.elapsed();
    println!(
        "detected={} untestable={} aborted={} sat_calls={} time={:?}",
        total.detected, total.untestable, total.aborted, total.sat_calls, duration
    );
}
