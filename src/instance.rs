//! Module for parsing and representing KPLink instances.
//!
//! An instance of the Knapsack-with-Linking Problem consists of `n_items`
//! items laid out on a line, each with a cost and a weight, a minimum
//! weight to collect, and a maximum distance between consecutive selected
//! items. Instances are stored as JSON files and can also be generated
//! randomly with a seeded generator.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};

/// Tolerance used when deciding whether all costs are equal.
const COST_EQ_EPS: f64 = 1e-12;

/// Errors raised while loading, validating or generating an instance.
#[derive(Debug)]
pub enum InstanceError {
    /// The instance file could not be opened or read.
    Io(std::io::Error),
    /// The instance file is not valid JSON or misses required fields.
    Parse(serde_json::Error),
    /// The instance data violates a structural requirement.
    Invalid(String),
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::Io(e) => write!(f, "cannot read instance file: {}", e),
            InstanceError::Parse(e) => write!(f, "cannot parse instance file: {}", e),
            InstanceError::Invalid(msg) => write!(f, "invalid instance: {}", msg),
        }
    }
}

impl std::error::Error for InstanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Io(e) => Some(e),
            InstanceError::Parse(e) => Some(e),
            InstanceError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for InstanceError {
    fn from(e: std::io::Error) -> Self {
        InstanceError::Io(e)
    }
}

impl From<serde_json::Error> for InstanceError {
    fn from(e: serde_json::Error) -> Self {
        InstanceError::Parse(e)
    }
}

/// On-disk representation of an instance.
///
/// The `costs` field also accepts the legacy key `profits` used by older
/// instance files; in both cases the objective is to minimize their sum.
#[derive(Debug, Serialize, Deserialize)]
struct InstanceFile {
    n_items: usize,
    max_distance: usize,
    min_weight: f64,
    weights: Vec<f64>,
    #[serde(alias = "profits")]
    costs: Vec<f64>,
}

/// Represents a complete KPLink instance.
#[derive(Debug, Clone, Serialize)]
pub struct KpLinkInstance {
    /// Name of the instance (file stem or generator tag), for reporting.
    pub name: String,
    /// Number of items.
    pub n_items: usize,
    /// Maximum index gap between two consecutive selected items.
    ///
    /// Items i and j with |i - j| <= max_distance are linked; a selection
    /// is compact when every pair of consecutive selected items is linked.
    pub max_distance: usize,
    /// Minimum total weight a feasible selection must collect.
    pub min_weight: f64,
    /// Weights of the items. Length: n_items.
    pub weights: Vec<f64>,
    /// Costs of the items. Length: n_items.
    pub costs: Vec<f64>,
    /// True if all costs are equal (up to a small tolerance).
    pub constant_costs: bool,
}

impl KpLinkInstance {
    /// Build an instance from raw data, validating it.
    pub fn new(
        name: impl Into<String>,
        max_distance: usize,
        min_weight: f64,
        weights: Vec<f64>,
        costs: Vec<f64>,
    ) -> Result<Self, InstanceError> {
        let n_items = weights.len();

        if n_items == 0 {
            return Err(InstanceError::Invalid("instance has no items".to_string()));
        }
        if costs.len() != n_items {
            return Err(InstanceError::Invalid(format!(
                "weights has {} entries but costs has {}",
                n_items,
                costs.len()
            )));
        }
        if max_distance == 0 {
            return Err(InstanceError::Invalid(
                "max_distance must be at least 1".to_string(),
            ));
        }
        if !min_weight.is_finite() || min_weight < 0.0 {
            return Err(InstanceError::Invalid(format!(
                "min_weight must be finite and non-negative, got {}",
                min_weight
            )));
        }
        for (i, &w) in weights.iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(InstanceError::Invalid(format!(
                    "weight of item {} must be finite and non-negative, got {}",
                    i, w
                )));
            }
        }
        for (i, &c) in costs.iter().enumerate() {
            if !c.is_finite() || c < 0.0 {
                return Err(InstanceError::Invalid(format!(
                    "cost of item {} must be finite and non-negative, got {}",
                    i, c
                )));
            }
        }

        let first_cost = costs[0];
        let constant_costs = costs.iter().all(|&c| (c - first_cost).abs() < COST_EQ_EPS);

        Ok(KpLinkInstance {
            name: name.into(),
            n_items,
            max_distance,
            min_weight,
            weights,
            costs,
            constant_costs,
        })
    }

    /// Parse a KPLink instance from a JSON file.
    ///
    /// The instance name is taken from the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        let file = File::open(path)?;
        let raw: InstanceFile = serde_json::from_reader(BufReader::new(file))?;

        if raw.weights.len() != raw.n_items {
            return Err(InstanceError::Invalid(format!(
                "n_items is {} but weights has {} entries",
                raw.n_items,
                raw.weights.len()
            )));
        }

        Self::new(name, raw.max_distance, raw.min_weight, raw.weights, raw.costs)
    }

    /// Write the instance to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), InstanceError> {
        let file = File::create(path.as_ref())?;
        let raw = InstanceFile {
            n_items: self.n_items,
            max_distance: self.max_distance,
            min_weight: self.min_weight,
            weights: self.weights.clone(),
            costs: self.costs.clone(),
        };
        serde_json::to_writer_pretty(BufWriter::new(file), &raw)?;
        Ok(())
    }

    /// True if all costs are exactly 1, the precondition of the unit-cost DP.
    pub fn has_unit_costs(&self) -> bool {
        self.costs.iter().all(|&c| c == 1.0)
    }

    /// Sum of all item weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Get statistics about the instance.
    pub fn statistics(&self) -> InstanceStatistics {
        let total_weight = self.total_weight();
        let total_cost: f64 = self.costs.iter().sum();
        let max_weight = self.weights.iter().cloned().fold(0.0, f64::max);
        let min_item_weight = self.weights.iter().cloned().fold(f64::INFINITY, f64::min);

        InstanceStatistics {
            name: self.name.clone(),
            n_items: self.n_items,
            max_distance: self.max_distance,
            min_weight: self.min_weight,
            total_weight,
            total_cost,
            max_item_weight: max_weight,
            min_item_weight,
            constant_costs: self.constant_costs,
        }
    }
}

impl fmt::Display for KpLinkInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KpLinkInstance[ name = {}, n_items = {}, max_distance = {}, min_weight = {}, constant_costs = {} ]",
            self.name, self.n_items, self.max_distance, self.min_weight, self.constant_costs
        )
    }
}

/// Statistics about a KPLink instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub n_items: usize,
    pub max_distance: usize,
    pub min_weight: f64,
    pub total_weight: f64,
    pub total_cost: f64,
    pub max_item_weight: f64,
    pub min_item_weight: f64,
    pub constant_costs: bool,
}

impl fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Items: {}", self.n_items)?;
        writeln!(f, "  Max distance: {}", self.max_distance)?;
        writeln!(f, "  Min weight: {:.6}", self.min_weight)?;
        writeln!(f, "  Total weight: {:.6}", self.total_weight)?;
        writeln!(
            f,
            "  Item weights: min {:.6}, max {:.6}",
            self.min_item_weight, self.max_item_weight
        )?;
        writeln!(f, "  Total cost: {:.6}", self.total_cost)?;
        writeln!(f, "  Constant costs: {}", self.constant_costs)
    }
}

/// Shape of the generated weight distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightsProfile {
    /// Near-uniform weights with small multiplicative noise.
    Noise,
    /// A single Gaussian bump of heavy items.
    OnePeak,
    /// Two Gaussian bumps of heavy items.
    TwoPeaks,
}

/// Shape of the generated cost distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostsProfile {
    /// All costs equal to 1 (enables the greedy and unit-cost DP).
    Constant,
    /// Costs drawn uniformly from [1, 10).
    Random,
}

/// Configuration of the random instance generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub n_items: usize,
    pub max_distance: usize,
    /// Required weight expressed as a fraction of the total weight.
    pub min_weight_ratio: f64,
    pub weights_profile: WeightsProfile,
    pub costs_profile: CostsProfile,
    /// Height of the Gaussian bumps relative to the base weight.
    pub peak_strength: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            n_items: 100,
            max_distance: 5,
            min_weight_ratio: 0.3,
            weights_profile: WeightsProfile::Noise,
            costs_profile: CostsProfile::Random,
            peak_strength: 10.0,
            seed: 42,
        }
    }
}

/// Generate a random instance. Deterministic for a given configuration.
///
/// Weights are normalized to sum to 1, so `min_weight` equals
/// `min_weight_ratio` directly.
pub fn generate(config: &GeneratorConfig) -> Result<KpLinkInstance, InstanceError> {
    if config.n_items == 0 {
        return Err(InstanceError::Invalid(
            "cannot generate an instance with no items".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.min_weight_ratio) {
        return Err(InstanceError::Invalid(format!(
            "min_weight_ratio must be in [0, 1], got {}",
            config.min_weight_ratio
        )));
    }

    let n = config.n_items;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let base = 1.0 / n as f64;

    let mut weights: Vec<f64> = (0..n)
        .map(|_| base * (1.0 + 0.1 * rng.gen_range(-1.0..1.0)))
        .collect();

    let n_peaks = match config.weights_profile {
        WeightsProfile::Noise => 0,
        WeightsProfile::OnePeak => 1,
        WeightsProfile::TwoPeaks => 2,
    };

    for _ in 0..n_peaks {
        let center = rng.gen_range(0..n) as f64;
        let sd = (n as f64 / 10.0).max(1.0);
        let bump = Normal::new(center, sd)
            .map_err(|e| InstanceError::Invalid(format!("cannot build weight peak: {}", e)))?;
        for (i, w) in weights.iter_mut().enumerate() {
            *w += config.peak_strength * base * bump.pdf(i as f64) * sd;
        }
    }

    let total: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= total;
    }

    let costs: Vec<f64> = match config.costs_profile {
        CostsProfile::Constant => vec![1.0; n],
        CostsProfile::Random => (0..n).map(|_| rng.gen_range(1.0..10.0)).collect(),
    };

    let name = format!(
        "gen-n{}-d{}-s{}",
        config.n_items, config.max_distance, config.seed
    );

    KpLinkInstance::new(name, config.max_distance, config.min_weight_ratio, weights, costs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_instance() {
        let res = KpLinkInstance::new("empty", 1, 1.0, vec![], vec![]);
        assert!(matches!(res, Err(InstanceError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_max_distance() {
        let res = KpLinkInstance::new("bad", 0, 1.0, vec![1.0], vec![1.0]);
        assert!(matches!(res, Err(InstanceError::Invalid(_))));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let res = KpLinkInstance::new("bad", 1, 1.0, vec![1.0, 2.0], vec![1.0]);
        assert!(matches!(res, Err(InstanceError::Invalid(_))));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let res = KpLinkInstance::new("bad", 1, 1.0, vec![1.0, -2.0], vec![1.0, 1.0]);
        assert!(matches!(res, Err(InstanceError::Invalid(_))));
    }

    #[test]
    fn test_rejects_nan_min_weight() {
        let res = KpLinkInstance::new("bad", 1, f64::NAN, vec![1.0], vec![1.0]);
        assert!(matches!(res, Err(InstanceError::Invalid(_))));
    }

    #[test]
    fn test_constant_costs_detection() {
        let inst = KpLinkInstance::new("c", 2, 1.0, vec![1.0, 2.0], vec![3.0, 3.0]).unwrap();
        assert!(inst.constant_costs);
        assert!(!inst.has_unit_costs());

        let inst = KpLinkInstance::new("u", 2, 1.0, vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();
        assert!(inst.constant_costs);
        assert!(inst.has_unit_costs());

        let inst = KpLinkInstance::new("v", 2, 1.0, vec![1.0, 2.0], vec![1.0, 2.0]).unwrap();
        assert!(!inst.constant_costs);
    }

    #[test]
    fn test_parse_legacy_profits_key() {
        let raw = r#"{
            "n_items": 2,
            "max_distance": 1,
            "min_weight": 0.5,
            "weights": [0.4, 0.6],
            "profits": [1.0, 2.0]
        }"#;
        let file: InstanceFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.costs, vec![1.0, 2.0]);
    }

    #[test]
    fn test_generator_is_deterministic() {
        let config = GeneratorConfig {
            n_items: 50,
            seed: 7,
            ..GeneratorConfig::default()
        };
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.costs, b.costs);
    }

    #[test]
    fn test_generated_instance_is_valid() {
        for profile in [
            WeightsProfile::Noise,
            WeightsProfile::OnePeak,
            WeightsProfile::TwoPeaks,
        ] {
            let config = GeneratorConfig {
                n_items: 80,
                weights_profile: profile,
                costs_profile: CostsProfile::Constant,
                ..GeneratorConfig::default()
            };
            let inst = generate(&config).unwrap();
            assert_eq!(inst.n_items, 80);
            assert!(inst.constant_costs);
            let total: f64 = inst.weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
            assert!(inst.weights.iter().all(|&w| w > 0.0));
        }
    }
}
