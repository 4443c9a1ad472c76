//! KPLink Solver - Command Line Interface
//!
//! Solves the Knapsack-with-Linking Problem with an exact label-setting
//! algorithm, a greedy heuristic, a unit-cost dynamic program and an
//! optional Gurobi compact model.

use clap::{Parser, Subcommand, ValueEnum};
use kplink_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use kplink_solver::dp::UnitCostDp;
use kplink_solver::exact::{CompactModel, CompactModelConfig};
use kplink_solver::heuristics::GreedyHeuristic;
use kplink_solver::instance::{
    self, CostsProfile, GeneratorConfig, KpLinkInstance, WeightsProfile,
};
use kplink_solver::labelling::{Labelling, LabellingParams};
use kplink_solver::solution::Solution;

use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kplink-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Solves the Knapsack-with-Linking Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        /// Path to the instance file (JSON)
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "labelling")]
        algorithm: Algorithm,

        /// Time limit in seconds (labelling and exact)
        #[arg(short, long, default_value = "3600")]
        time_limit: f64,

        /// Gurobi thread count (exact only)
        #[arg(long, default_value = "1")]
        threads: i32,

        /// Save the result as a CSV file (default: <instance>-<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics about an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Generate a random instance
    Generate {
        /// Number of items
        #[arg(short, long, default_value = "100")]
        n_items: usize,

        /// Maximum linking distance
        #[arg(short, long, default_value = "5")]
        max_distance: usize,

        /// Weight threshold as a fraction of the total weight
        #[arg(short = 'r', long, default_value = "0.3")]
        min_weight_ratio: f64,

        /// Weight distribution shape
        #[arg(short, long, value_enum, default_value = "noise")]
        weights: WeightsShape,

        /// Cost distribution shape
        #[arg(short, long, value_enum, default_value = "random")]
        costs: CostsShape,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output CSV file for per-run results
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// Time limit per labelling run
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Run the exact solver as well (requires Gurobi)
        #[arg(long)]
        exact: bool,

        /// Exact solver time limit
        #[arg(long, default_value = "300")]
        exact_time_limit: f64,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Exact label-setting algorithm
    Labelling,
    /// Greedy heuristic (constant costs only)
    Greedy,
    /// O(n^2) dynamic program (unit costs only)
    UnitDp,
    /// Compact MIP model via Gurobi
    Exact,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum WeightsShape {
    Noise,
    OnePeak,
    TwoPeaks,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum CostsShape {
    Constant,
    Random,
}

/// Flat CSV record for a single solve run.
#[derive(Serialize)]
struct SolveRecord<'a> {
    instance: &'a str,
    n_items: usize,
    max_distance: usize,
    min_weight: f64,
    algorithm: &'a str,
    n_selected: usize,
    selected_items: String,
    total_cost: f64,
    total_weight: f64,
    time_elapsed: f64,
    n_frontier_labels: Option<usize>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            algorithm,
            time_limit,
            threads,
            output,
            verbose,
        } => solve_instance(&instance, algorithm, time_limit, threads, output, verbose),

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Generate {
            n_items,
            max_distance,
            min_weight_ratio,
            weights,
            costs,
            seed,
            output,
        } => generate_instance(n_items, max_distance, min_weight_ratio, weights, costs, seed, &output),

        Commands::Benchmark {
            dir,
            output,
            time_limit,
            exact,
            exact_time_limit,
            max_size,
        } => run_benchmark(&dir, &output, time_limit, exact, exact_time_limit, max_size),
    }
}

fn load_or_exit(path: &PathBuf) -> KpLinkInstance {
    match KpLinkInstance::from_file(path) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    algorithm: Algorithm,
    time_limit: f64,
    threads: i32,
    output: Option<PathBuf>,
    verbose: bool,
) {
    if time_limit < 0.0 {
        eprintln!("Invalid time limit: {}", time_limit);
        std::process::exit(1);
    }
    if threads < 1 {
        eprintln!("Invalid number of threads: {}", threads);
        std::process::exit(1);
    }

    let instance = load_or_exit(path);

    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving {} with {:?}...", instance.name, algorithm);

    let result: Result<Solution, String> = match algorithm {
        Algorithm::Labelling => {
            let params = LabellingParams { time_limit };
            Labelling::new(&instance, params)
                .solve()
                .map_err(|e| e.to_string())
        }
        Algorithm::Greedy => GreedyHeuristic::new(&instance)
            .and_then(|g| g.solve())
            .map_err(|e| e.to_string()),
        Algorithm::UnitDp => UnitCostDp::new(&instance)
            .and_then(|dp| dp.solve())
            .map_err(|e| e.to_string()),
        Algorithm::Exact => {
            let config = CompactModelConfig {
                time_limit,
                threads,
                verbose,
                ..Default::default()
            };
            CompactModel::new(config)
                .solve(&instance)
                .and_then(|r| match r.solution {
                    Some(solution) => Ok(solution),
                    None => Err(format!("no incumbent found, status {}", r.status)),
                })
        }
    };

    let solution = match result {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("No solution: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", solution);

    if !solution.verify(&instance) {
        eprintln!("Warning: produced solution failed structural verification!");
    }

    let out = output.unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M");
        PathBuf::from(format!("{}-{}.csv", instance.name, timestamp))
    });

    if let Err(e) = export_solution_csv(&out, &instance, &solution) {
        eprintln!("Cannot write solution to {}: skipping! ({})", out.display(), e);
    } else {
        println!("Result written to {}", out.display());
    }
}

fn export_solution_csv(
    path: &PathBuf,
    instance: &KpLinkInstance,
    solution: &Solution,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    let items = solution
        .selected_items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");

    writer.serialize(SolveRecord {
        instance: &instance.name,
        n_items: instance.n_items,
        max_distance: instance.max_distance,
        min_weight: instance.min_weight,
        algorithm: &solution.algorithm,
        n_selected: solution.n_selected(),
        selected_items: format!("[{}]", items),
        total_cost: solution.total_cost,
        total_weight: solution.total_weight,
        time_elapsed: solution.elapsed_time,
        n_frontier_labels: solution.n_frontier_labels,
    })?;
    writer.flush()?;
    Ok(())
}

fn analyze_instance(path: &PathBuf) {
    let instance = load_or_exit(path);
    println!("{}", instance.statistics());
}

fn generate_instance(
    n_items: usize,
    max_distance: usize,
    min_weight_ratio: f64,
    weights: WeightsShape,
    costs: CostsShape,
    seed: u64,
    output: &PathBuf,
) {
    let config = GeneratorConfig {
        n_items,
        max_distance,
        min_weight_ratio,
        weights_profile: match weights {
            WeightsShape::Noise => WeightsProfile::Noise,
            WeightsShape::OnePeak => WeightsProfile::OnePeak,
            WeightsShape::TwoPeaks => WeightsProfile::TwoPeaks,
        },
        costs_profile: match costs {
            CostsShape::Constant => CostsProfile::Constant,
            CostsShape::Random => CostsProfile::Random,
        },
        seed,
        ..GeneratorConfig::default()
    };

    let instance = match instance::generate(&config) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = instance.save(output) {
        eprintln!("Cannot write instance to {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!("Generated {} -> {}", instance, output.display());
}

fn run_benchmark(
    dir: &PathBuf,
    output: &PathBuf,
    time_limit: f64,
    exact: bool,
    exact_time_limit: f64,
    max_size: Option<usize>,
) {
    let mut instances = load_instances_from_dir(dir);
    if let Some(max) = max_size {
        instances.retain(|i| i.n_items <= max);
    }

    if instances.is_empty() {
        eprintln!("No instances found in {}", dir.display());
        std::process::exit(1);
    }

    println!("Benchmarking {} instances...", instances.len());

    let config = BenchmarkConfig {
        time_limit,
        run_exact: exact,
        exact_time_limit,
        parallel: true,
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances);

    print!("{}", benchmark.generate_report());

    if let Err(e) = benchmark.export_to_csv(output) {
        eprintln!("Cannot write results to {}: {}", output.display(), e);
        std::process::exit(1);
    }
    println!("Results written to {}", output.display());
}
