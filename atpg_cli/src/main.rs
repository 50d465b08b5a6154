mod netlist;

use std::fs;
use std::path::Path;

use atpg_core::config::{Config, JustifyStrategy, ScopeMode};
use atpg_core::dtpg_engine::{DtpgEngine, DtpgResult};
use atpg_core::fault::{Fault, FaultModel, FaultSet, FaultSite};
use atpg_core::justifier::NodeValList;
use atpg_core::network::NetworkModel;
use atpg_core::stats::DtpgStats;
use atpg_core::structural_index::StructuralIndex;
use atpg_netgen::{RandomNetConfig, RandomNetwork};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;

/// CMD Arguments
#[derive(Parser, Debug)]
#[command(
    version = "0.1",
    about = "
        Command-line driver for the ATPG core engine. Reads a gate-level
        netlist from this tool's own JSON interchange format, not from any
        industry HDL/bench format.
    "
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(about = "Prints a structural summary of a netlist file.")]
    Info(InfoCommand),
    #[clap(about = "Lists the collapsed representative faults of a netlist file.")]
    Faults(FaultsCommand),
    #[clap(about = "Runs ATPG over every collapsed fault and reports detected patterns.")]
    Dtpg(DtpgCommand),
    #[clap(about = "Generates a random netlist and writes it out as a netlist file.")]
    Generate(GenerateCommand),
}

#[derive(ClapArgs, Debug)]
struct InfoCommand {
    /// Input file containing the netlist in this tool's JSON format.
    #[arg(short, long, required = true)]
    input: String,
}

#[derive(ClapArgs, Debug)]
struct FaultsCommand {
    #[arg(short, long, required = true)]
    input: String,
}

#[derive(ClapArgs, Debug)]
struct DtpgCommand {
    #[arg(short, long, required = true)]
    input: String,
    /// Structural scope used to bound each SAT call: ffr, mffc, or node.
    #[arg(long, default_value = "ffr")]
    scope: String,
    /// Back-justification strategy: single-path or all-path.
    #[arg(long, default_value = "single-path")]
    justify: String,
    /// SAT conflict budget per fault, unbounded if omitted.
    #[arg(long)]
    conflict_limit: Option<u64>,
    /// Inject transition-delay faults instead of stuck-at.
    #[arg(long, default_value_t = false)]
    transition_delay: bool,
}

#[derive(ClapArgs, Debug)]
struct GenerateCommand {
    #[arg(short, long, required = true)]
    output: String,
    #[arg(long, default_value_t = 8)]
    n_pi: usize,
    #[arg(long, default_value_t = 40)]
    n_gates1: usize,
    #[arg(long, default_value_t = 0)]
    n_ff: usize,
    #[arg(long, default_value_t = 0)]
    n_gates2: usize,
    #[arg(long, default_value_t = 4)]
    n_po: usize,
    #[arg(long, value_delimiter = ',', num_args = 7, default_value = "0.25,0.15,0.25,0.15,0.1,0.05,0.05")]
    gate_rates: Vec<f64>,
    #[arg(long, value_parser = clap::value_parser!(u64))]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Info(c) => info(c),
        Command::Faults(c) => faults(c),
        Command::Dtpg(c) => dtpg(c),
        Command::Generate(c) => generate(c),
    }
}

fn load_network(path: &str) -> NetworkModel {
    let text = fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {}", path, e));
    let file: netlist::NetlistFile =
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("parsing {}: {}", path, e));
    netlist::build_network(&file).unwrap_or_else(|e| panic!("malformed netlist {}: {}", path, e))
}

fn info(command: InfoCommand) {
    let net = load_network(&command.input);
    let model_name = Path::new(&command.input).file_name().unwrap();
    println!(
        "{}",
        json!({
            "model": model_name.to_str(),
            "num_nodes": net.num_nodes(),
            "num_primary_inputs": net.primary_inputs().len(),
            "num_primary_outputs": net.primary_outputs().len(),
            "num_storage_elements": net.storage_elements().len(),
            "sequential": net.is_sequential(),
        })
    );
}

#[derive(Serialize)]
struct FaultReport {
    id: usize,
    site: String,
    stuck_at: String,
    model: String,
}

fn fault_report(f: &Fault) -> FaultReport {
    let site = match f.site {
        FaultSite::Stem(n) => format!("stem({})", n.raw() as usize),
        FaultSite::Branch { node, pin } => format!("branch({},{})", node.raw() as usize, pin),
    };
    FaultReport {
        id: f.id.raw() as usize,
        site,
        stuck_at: f.stuck_at.to_string(),
        model: match f.model {
            FaultModel::StuckAt => "stuck-at".to_string(),
            FaultModel::TransitionDelay => "transition-delay".to_string(),
        },
    }
}

fn faults(command: FaultsCommand) {
    let net = load_network(&command.input);
    let set = FaultSet::collapsed_stuck_at(&net);
    let reports: Vec<FaultReport> = set.representatives().map(fault_report).collect();
    log::info!(
        "{} representative faults out of {} total sites",
        reports.len(),
        set.faults().len()
    );
    println!("{}", serde_json::to_string_pretty(&reports).unwrap());
}

fn parse_scope(s: &str) -> ScopeMode {
    match s {
        "ffr" => ScopeMode::Ffr,
        "mffc" => ScopeMode::Mffc,
        "node" => ScopeMode::SingleNode,
        other => panic!("unknown scope mode {:?}, expected ffr/mffc/node", other),
    }
}

fn parse_justify(s: &str) -> JustifyStrategy {
    match s {
        "single-path" => JustifyStrategy::SinglePath,
        "all-path" => JustifyStrategy::AllPath,
        other => panic!("unknown justify strategy {:?}, expected single-path/all-path", other),
    }
}

#[derive(Serialize)]
struct PatternAssign {
    node: usize,
    time: u8,
    value: bool,
}

#[derive(Serialize)]
struct DtpgReport {
    fault_id: usize,
    outcome: String,
    pattern: Vec<PatternAssign>,
}

fn pattern_of(assigns: &NodeValList) -> Vec<PatternAssign> {
    assigns
        .iter()
        .map(|a| PatternAssign {
            node: a.node.raw() as usize,
            time: a.time,
            value: a.value,
        })
        .collect()
}

fn dtpg(command: DtpgCommand) {
    let net = load_network(&command.input);
    let scope_mode = parse_scope(&command.scope);
    let justify_strategy = parse_justify(&command.justify);
    let config = Config {
        scope: scope_mode,
        justify: justify_strategy,
        conflict_limit: command.conflict_limit,
        deterministic_order: true,
    };

    let structural = StructuralIndex::build(&net);
    let fault_set = FaultSet::collapsed_stuck_at(&net);
    let mut representatives: Vec<_> = fault_set.representatives().cloned().collect();
    if command.transition_delay {
        for f in representatives.iter_mut() {
            f.model = FaultModel::TransitionDelay;
        }
    }

    let outcomes: Vec<(DtpgReport, DtpgStats)> = representatives
        .par_iter()
        .map(|fault| {
            let engine = match scope_mode {
                ScopeMode::Ffr => {
                    let root = structural.ffr_root_of(fault.site.node());
                    DtpgEngine::for_ffr(&net, &structural, root, config.clone())
                }
                ScopeMode::Mffc => {
                    let root = structural.ffr_root_of(fault.site.node());
                    DtpgEngine::for_mffc(&net, &structural, root, config.clone())
                }
                ScopeMode::SingleNode => {
                    DtpgEngine::for_node(&net, &structural, fault.site.node(), config.clone())
                }
            };
            match engine.solve(fault) {
                Ok((DtpgResult::Detected(pattern), stats)) => (
                    DtpgReport {
                        fault_id: fault.id.raw() as usize,
                        outcome: "detected".to_string(),
                        pattern: pattern_of(&pattern),
                    },
                    stats,
                ),
                Ok((DtpgResult::Untestable, stats)) => (
                    DtpgReport {
                        fault_id: fault.id.raw() as usize,
                        outcome: "untestable".to_string(),
                        pattern: Vec::new(),
                    },
                    stats,
                ),
                Ok((DtpgResult::Aborted, stats)) => (
                    DtpgReport {
                        fault_id: fault.id.raw() as usize,
                        outcome: "aborted".to_string(),
                        pattern: Vec::new(),
                    },
                    stats,
                ),
                Err(e) => {
                    log::warn!("fault {} rejected: {}", fault.id.raw() as usize, e);
                    (
                        DtpgReport {
                            fault_id: fault.id.raw() as usize,
                            outcome: "rejected".to_string(),
                            pattern: Vec::new(),
                        },
                        DtpgStats::default(),
                    )
                }
            }
        })
        .collect();

    let mut total = DtpgStats::default();
    let reports: Vec<&DtpgReport> = outcomes
        .iter()
        .map(|(report, stats)| {
            total.merge(stats);
            report
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports).unwrap());
    println!(
        "detected={} untestable={} aborted={} sat_calls={}",
        total.detected, total.untestable, total.aborted, total.sat_calls
    );
}

fn generate(command: GenerateCommand) {
    let seed = command.seed.unwrap_or_else(rand::random);
    let config = RandomNetConfig::from_vec(command.gate_rates);
    let rn = RandomNetwork::new_random(
        command.n_pi,
        command.n_gates1,
        command.n_ff,
        command.n_gates2,
        command.n_po,
        config,
        seed,
    );
    let file = netlist::to_netlist_file(&rn.net);
    fs::write(&command.output, serde_json::to_string_pretty(&file).unwrap())
        .unwrap_or_else(|e| panic!("writing {}: {}", command.output, e));
    println!("wrote {} (seed {})", command.output, seed);
}
