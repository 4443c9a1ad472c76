//! Benchmarking and experimentation module for KPLink.
//!
//! Provides tools for running the solvers over a directory of instances,
//! collecting per-run records and aggregating per-algorithm statistics.

use crate::dp::UnitCostDp;
use crate::heuristics::GreedyHeuristic;
use crate::instance::KpLinkInstance;
use crate::labelling::{Labelling, LabellingParams};
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of running a single algorithm on an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance size
    pub n_items: usize,
    /// Instance linking distance
    pub max_distance: usize,
    /// Instance weight threshold
    pub min_weight: f64,
    /// Whether the run produced a (verified) feasible solution
    pub solved: bool,
    /// Number of selected items, if solved
    pub n_selected: Option<usize>,
    /// Total cost, if solved
    pub total_cost: Option<f64>,
    /// Total weight, if solved
    pub total_weight: Option<f64>,
    /// Undominated labels at the sink (labelling only)
    pub n_frontier_labels: Option<usize>,
    /// Computation time in seconds
    pub time: f64,
    /// Error message, if the run failed
    pub error: Option<String>,
}

impl AlgorithmResult {
    fn from_solution(instance: &KpLinkInstance, solution: &Solution) -> Self {
        AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            n_items: instance.n_items,
            max_distance: instance.max_distance,
            min_weight: instance.min_weight,
            solved: solution.verify(instance),
            n_selected: Some(solution.n_selected()),
            total_cost: Some(solution.total_cost),
            total_weight: Some(solution.total_weight),
            n_frontier_labels: solution.n_frontier_labels,
            time: solution.elapsed_time,
            error: None,
        }
    }

    fn from_error(
        instance: &KpLinkInstance,
        algorithm: &str,
        time: f64,
        error: impl ToString,
    ) -> Self {
        AlgorithmResult {
            algorithm: algorithm.to_string(),
            instance: instance.name.clone(),
            n_items: instance.n_items,
            max_distance: instance.max_distance,
            min_weight: instance.min_weight,
            solved: false,
            n_selected: None,
            total_cost: None,
            total_weight: None,
            n_frontier_labels: None,
            time,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregated statistics for an algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Number of runs that produced a feasible solution
    pub num_solved: usize,
    /// Average cost over solved runs
    pub avg_cost: f64,
    /// Best cost over solved runs
    pub best_cost: f64,
    /// Standard deviation of the cost over solved runs
    pub std_cost: f64,
    /// Average time over all runs
    pub avg_time: f64,
    /// Total time over all runs
    pub total_time: f64,
}

/// Benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Time limit per labelling run in seconds
    pub time_limit: f64,
    /// Run the Gurobi compact model as well (requires the `gurobi` feature)
    pub run_exact: bool,
    /// Exact solver time limit
    pub exact_time_limit: f64,
    /// Run instances in parallel
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            time_limit: 60.0,
            run_exact: false,
            exact_time_limit: 300.0,
            parallel: true,
        }
    }
}

/// Benchmarking engine.
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every applicable algorithm on one instance.
    fn run_instance(&self, instance: &KpLinkInstance) -> Vec<AlgorithmResult> {
        let mut results = Vec::new();

        let params = LabellingParams {
            time_limit: self.config.time_limit,
        };
        let start = Instant::now();
        match Labelling::new(instance, params).solve() {
            Ok(solution) => results.push(AlgorithmResult::from_solution(instance, &solution)),
            Err(e) => results.push(AlgorithmResult::from_error(
                instance,
                "labelling",
                start.elapsed().as_secs_f64(),
                e,
            )),
        }

        if instance.constant_costs {
            let start = Instant::now();
            match GreedyHeuristic::new(instance).and_then(|g| g.solve()) {
                Ok(solution) => results.push(AlgorithmResult::from_solution(instance, &solution)),
                Err(e) => results.push(AlgorithmResult::from_error(
                    instance,
                    "greedy",
                    start.elapsed().as_secs_f64(),
                    e,
                )),
            }
        }

        if instance.has_unit_costs() {
            let start = Instant::now();
            match UnitCostDp::new(instance).and_then(|dp| dp.solve()) {
                Ok(solution) => results.push(AlgorithmResult::from_solution(instance, &solution)),
                Err(e) => results.push(AlgorithmResult::from_error(
                    instance,
                    "unit_dp",
                    start.elapsed().as_secs_f64(),
                    e,
                )),
            }
        }

        if self.config.run_exact {
            results.push(self.run_exact(instance));
        }

        results
    }

    fn run_exact(&self, instance: &KpLinkInstance) -> AlgorithmResult {
        use crate::exact::{CompactModel, CompactModelConfig};

        let config = CompactModelConfig {
            time_limit: self.config.exact_time_limit,
            ..Default::default()
        };
        let start = Instant::now();
        match CompactModel::new(config).solve(instance) {
            Ok(result) => match result.solution {
                Some(solution) => AlgorithmResult::from_solution(instance, &solution),
                None => AlgorithmResult::from_error(
                    instance,
                    "compact_mip",
                    start.elapsed().as_secs_f64(),
                    format!("no incumbent, status {}", result.status),
                ),
            },
            Err(e) => AlgorithmResult::from_error(
                instance,
                "compact_mip",
                start.elapsed().as_secs_f64(),
                e,
            ),
        }
    }

    /// Run the benchmark over a set of instances.
    pub fn run_on_instances(&mut self, instances: &[KpLinkInstance]) {
        let bar = ProgressBar::new(instances.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut collected: Vec<AlgorithmResult> = if self.config.parallel {
            instances
                .par_iter()
                .flat_map(|instance| {
                    let res = self.run_instance(instance);
                    bar.inc(1);
                    res
                })
                .collect()
        } else {
            instances
                .iter()
                .flat_map(|instance| {
                    let res = self.run_instance(instance);
                    bar.inc(1);
                    res
                })
                .collect()
        };

        bar.finish_and_clear();
        self.results.append(&mut collected);
    }

    /// Compute statistics for each algorithm.
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut by_algorithm: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            by_algorithm
                .entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();
        for (algorithm, results) in by_algorithm {
            let costs: Vec<f64> = results.iter().filter_map(|r| r.total_cost).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();
            let num_solved = results.iter().filter(|r| r.solved).count();

            let best_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let total_time = times.iter().sum();

            let cost_data = Data::new(costs);
            let time_data = Data::new(times);

            statistics.push(AlgorithmStatistics {
                algorithm,
                num_runs: results.len(),
                num_solved,
                avg_cost: cost_data.mean().unwrap_or(f64::NAN),
                best_cost,
                std_cost: cost_data.std_dev().unwrap_or(0.0),
                avg_time: time_data.mean().unwrap_or(0.0),
                total_time,
            });
        }

        statistics.sort_by(|a, b| a.algorithm.cmp(&b.algorithm));
        statistics
    }

    /// Export per-run results to CSV.
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export aggregated statistics to CSV.
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate a plain-text summary report.
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       KPLink Benchmark Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!(
            "{:<15} {:>10} {:>12} {:>12} {:>12} {:>10}\n",
            "Algorithm", "Solved", "Avg Cost", "Best Cost", "Std Cost", "Avg Time"
        ));
        report.push_str(&"-".repeat(76));
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<15} {:>10} {:>12.4} {:>12.4} {:>12.4} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_solved, stat.num_runs),
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                stat.avg_time
            ));
        }

        report
    }

    /// All collected results.
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Load every `.json` instance from a directory, sorted by size.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<KpLinkInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match KpLinkInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("skipping {}: {}", path.display(), e),
                }
            }
        }
    }

    instances.sort_by_key(|i| i.n_items);
    instances
}
