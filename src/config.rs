use serde::{Deserialize, Serialize};

/// Hyperparameters for the boosted-tree base scorer.
///
/// Defaults follow the fixed production configuration (100 trees of depth 6
/// with a 0.1 learning rate and the log-likelihood loss) except for the
/// sample ratios, which stay at 1.0 so a default run is reproducible.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScorerParams {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Fraction of rows drawn per tree. The booster subsamples from an
    /// unseeded RNG, so any ratio below 1.0 gives up run-to-run
    /// reproducibility in exchange for regularization.
    #[serde(default = "default_sample_ratio")]
    pub data_sample_ratio: f64,
    /// Fraction of features drawn per tree, with the same reproducibility
    /// caveat as `data_sample_ratio`.
    #[serde(default = "default_sample_ratio")]
    pub feature_sample_ratio: f64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_optimization_level")]
    pub training_optimization_level: u8,
    #[serde(default = "default_loss")]
    pub loss_type: String,
}

fn default_iterations() -> usize {
    100
}

fn default_max_depth() -> u32 {
    6
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_sample_ratio() -> f64 {
    1.0
}

fn default_optimization_level() -> u8 {
    2
}

fn default_loss() -> String {
    "LogLikelyhood".to_string()
}

impl Default for ScorerParams {
    fn default() -> Self {
        ScorerParams {
            iterations: default_iterations(),
            max_depth: default_max_depth(),
            learning_rate: default_learning_rate(),
            data_sample_ratio: default_sample_ratio(),
            feature_sample_ratio: default_sample_ratio(),
            debug: false,
            training_optimization_level: default_optimization_level(),
            loss_type: default_loss(),
        }
    }
}

/// Settings for one training run.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TrainingConfig {
    /// Number of expanding-window cross-validation folds.
    #[serde(default = "default_folds")]
    pub folds: usize,
    /// Version string stamped into the model blob and its metadata.
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Seed for the permutation-importance shuffles.
    #[serde(default = "default_importance_seed")]
    pub importance_seed: u64,
    #[serde(default)]
    pub scorer: ScorerParams,
}

fn default_folds() -> usize {
    5
}

fn default_model_version() -> String {
    "1.0".to_string()
}

fn default_importance_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            folds: default_folds(),
            model_version: default_model_version(),
            importance_seed: default_importance_seed(),
            scorer: ScorerParams::default(),
        }
    }
}
