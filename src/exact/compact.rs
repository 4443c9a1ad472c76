//! Compact MIP formulation of KPLink, solved with Gurobi.
//!
//! One binary variable per item; the objective minimizes total cost, a
//! single knapsack-style constraint enforces the weight threshold, and one
//! linking constraint per far-apart pair enforces compactness: if items i
//! and j with j - i > max_distance are both selected, some item strictly
//! between them must be selected too. Applied to every pair, this forces
//! consecutive selected items within max_distance of each other.

use crate::instance::KpLinkInstance;
use crate::solution::Solution;
use grb::prelude::*;

/// Gurobi solver configuration.
#[derive(Debug, Clone)]
pub struct CompactModelConfig {
    /// Time limit in seconds
    pub time_limit: f64,
    /// MIP gap tolerance
    pub mip_gap: f64,
    /// Number of threads (0 = automatic)
    pub threads: i32,
    /// Enable verbose solver output
    pub verbose: bool,
    /// Let Gurobi presolve the model
    pub use_presolve: bool,
}

impl Default for CompactModelConfig {
    fn default() -> Self {
        CompactModelConfig {
            time_limit: 3600.0,
            mip_gap: 1e-6,
            threads: 1,
            verbose: false,
            use_presolve: true,
        }
    }
}

/// Result of exact solving.
#[derive(Debug, Clone)]
pub struct ExactResult {
    /// Best feasible solution found, if any
    pub solution: Option<Solution>,
    /// Best dual bound when the solver stopped
    pub best_bound: f64,
    /// Optimality gap
    pub gap: f64,
    /// Whether optimality was proven
    pub optimal: bool,
    /// Whether the model was proven infeasible
    pub proven_infeasible: bool,
    /// Solver status
    pub status: String,
    /// Number of branch-and-bound nodes explored
    pub nodes_explored: i64,
}

/// Gurobi-based exact solver for KPLink.
pub struct CompactModel {
    config: CompactModelConfig,
}

impl CompactModel {
    pub fn new(config: CompactModelConfig) -> Self {
        CompactModel { config }
    }

    /// Build and solve the compact model.
    pub fn solve(&self, instance: &KpLinkInstance) -> Result<ExactResult, String> {
        let start = std::time::Instant::now();
        let n = instance.n_items;

        let env = Env::new("").map_err(|e| format!("Failed to create Gurobi environment: {}", e))?;
        let mut model =
            Model::with_env("kplink", env).map_err(|e| format!("Failed to create model: {}", e))?;

        model
            .set_param(param::TimeLimit, self.config.time_limit)
            .map_err(|e| format!("Failed to set time limit: {}", e))?;
        model
            .set_param(param::MIPGap, self.config.mip_gap)
            .map_err(|e| format!("Failed to set MIP gap: {}", e))?;
        model
            .set_param(param::Threads, self.config.threads)
            .map_err(|e| format!("Failed to set threads: {}", e))?;
        if !self.config.use_presolve {
            model
                .set_param(param::Presolve, 0)
                .map_err(|e| format!("Failed to disable presolve: {}", e))?;
        }
        if !self.config.verbose {
            model
                .set_param(param::OutputFlag, 0)
                .map_err(|e| format!("Failed to set output flag: {}", e))?;
        }

        // x[i] = 1 if item i is selected; the objective carries the costs
        let mut x: Vec<Var> = Vec::with_capacity(n);
        for i in 0..n {
            let var = add_binvar!(model,
                name: &format!("x_{}", i),
                obj: instance.costs[i]
            )
            .map_err(|e| format!("Failed to add variable x[{}]: {}", i, e))?;
            x.push(var);
        }

        model
            .update()
            .map_err(|e| format!("Failed to update model: {}", e))?;

        // Weight threshold
        let collected: Expr = (0..n).map(|i| instance.weights[i] * x[i]).grb_sum();
        model
            .add_constr("min_weight", c!(collected >= instance.min_weight))
            .map_err(|e| format!("Failed to add weight constraint: {}", e))?;

        // Compactness linking: both endpoints of a far pair require a
        // selected item strictly between them
        for i in 0..n {
            for j in (i + instance.max_distance + 1)..n {
                let between: Expr = ((i + 1)..j).map(|k| x[k]).grb_sum();
                model
                    .add_constr(
                        &format!("link_{}_{}", i, j),
                        c!(between >= x[i] + x[j] - 1.0),
                    )
                    .map_err(|e| format!("Failed to add linking constraint: {}", e))?;
            }
        }

        model
            .update()
            .map_err(|e| format!("Failed to update model before optimization: {}", e))?;
        model
            .optimize()
            .map_err(|e| format!("Optimization failed: {}", e))?;

        let status = model
            .status()
            .map_err(|e| format!("Failed to get status: {}", e))?;

        let status_str = match status {
            Status::Optimal => "Optimal",
            Status::TimeLimit => "TimeLimit",
            Status::Infeasible => "Infeasible",
            Status::InfOrUnbd => "InfeasibleOrUnbounded",
            Status::Unbounded => "Unbounded",
            Status::NodeLimit => "NodeLimit",
            Status::SolutionLimit => "SolutionLimit",
            _ => "Unknown",
        };

        let mut result = ExactResult {
            solution: None,
            best_bound: model.get_attr(attr::ObjBound).unwrap_or(0.0),
            gap: model.get_attr(attr::MIPGap).unwrap_or(1.0),
            optimal: status == Status::Optimal,
            proven_infeasible: status == Status::Infeasible || status == Status::InfOrUnbd,
            status: status_str.to_string(),
            nodes_explored: model.get_attr(attr::NodeCount).unwrap_or(0.0) as i64,
        };

        let has_incumbent = model.get_attr(attr::SolCount).unwrap_or(0) > 0;
        if has_incumbent {
            let mut selected_items = Vec::new();
            for (i, var) in x.iter().enumerate() {
                let val = model
                    .get_obj_attr(attr::X, var)
                    .map_err(|e| format!("Failed to read x[{}]: {}", i, e))?;
                if val > 0.5 {
                    selected_items.push(i);
                }
            }
            let mut solution = Solution::from_items(instance, selected_items, "compact_mip");
            solution.elapsed_time = start.elapsed().as_secs_f64();
            result.solution = Some(solution);
        }

        Ok(result)
    }
}
