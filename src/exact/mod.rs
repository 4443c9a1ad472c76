//! Exact solvers module.
//!
//! Besides the labelling algorithm, the compact MIP formulation can solve
//! KPLink by delegating the search to Gurobi.

// When built with the `gurobi` feature, expose the real implementation
#[cfg(feature = "gurobi")]
mod compact;
#[cfg(feature = "gurobi")]
pub use compact::*;

// Otherwise provide a lightweight stub so the rest of the codebase can compile
#[cfg(not(feature = "gurobi"))]
mod compact_stub {
    use crate::instance::KpLinkInstance;
    use crate::solution::Solution;

    #[derive(Debug, Clone)]
    pub struct CompactModelConfig {
        pub time_limit: f64,
        pub mip_gap: f64,
        pub threads: i32,
        pub verbose: bool,
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

    #[derive(Debug, Clone)]
    pub struct ExactResult {
        pub solution: Option<Solution>,
        pub best_bound: f64,
        pub gap: f64,
        pub optimal: bool,
        pub proven_infeasible: bool,
        pub status: String,
        pub nodes_explored: i64,
    }

    pub struct CompactModel {
        pub config: CompactModelConfig,
    }

    impl CompactModel {
        pub fn new(config: CompactModelConfig) -> Self {
            CompactModel { config }
        }
        pub fn solve(&self, _instance: &KpLinkInstance) -> Result<ExactResult, String> {
            Err("Gurobi feature not enabled in this build".to_string())
        }
    }
}

#[cfg(not(feature = "gurobi"))]
pub use compact_stub::*;
