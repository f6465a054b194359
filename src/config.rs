use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::{Bound, RangeBounds},
    path::Path,
};

/// Largest seed that survives a round trip through TOML integers.
pub const MAX_SEED: u64 = i64::MAX as u64;

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Master random seed (drawn from the OS when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Tick budget after which the run is reported as incomplete.
    pub max_ticks: usize,
    /// Consecutive denials after which a waiting agent is forced to replan.
    pub wait_threshold: usize,

    /// How agents pick their moves.
    pub mode: Mode,
    /// How contested cells are awarded.
    pub priority: PriorityStrategy,

    /// Learning-mode parameters.
    pub learning: LearningConfig,
    /// Learning-mode reward shaping.
    pub rewards: RewardConfig,

    /// Output parameters.
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            max_ticks: 500,
            wait_threshold: 3,
            mode: Mode::Search,
            priority: PriorityStrategy::Sequence,
            learning: LearningConfig::default(),
            rewards: RewardConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Follow A* plans, replanning when blocked.
    Search,
    /// Follow an epsilon-greedy learned policy.
    Learning,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityStrategy {
    /// Earlier agents in the scenario win.
    Sequence,
    /// The agent closer to its destination wins, scenario order breaks ties.
    Distance,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LearningConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Initial exploration probability.
    pub epsilon: f64,
    /// Multiplicative exploration decay per decision.
    pub epsilon_decay: f64,
    /// Exploration floor.
    pub epsilon_min: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.2,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Reaching the destination.
    pub goal: f64,
    /// Trying to move into an obstacle or off the grid.
    pub obstacle: f64,
    /// Being denied a move by another agent.
    pub blocked: f64,
    /// Every other decision.
    pub step: f64,
    /// Added when moving onto a previously visited cell.
    pub revisit: f64,
    /// Multiplies the Manhattan distance gained towards the destination.
    pub distance_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            goal: 100.0,
            obstacle: -100.0,
            blocked: -20.0,
            step: -1.0,
            revisit: -10.0,
            distance_bonus: 1.0,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Write every tick record to the trajectory file.
    pub save_trajectory: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_trajectory: true,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded; missing fields take their defaults.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter against its admissible range.
    ///
    /// # Errors
    /// Returns an error naming the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if let Some(seed) = self.seed {
            check_num(seed, 0..=MAX_SEED).context("invalid seed")?;
        }
        check_num(self.max_ticks, 1..=1_000_000).context("invalid maximum number of ticks")?;
        check_num(self.wait_threshold, 1..=1_000).context("invalid wait threshold")?;

        let unit = (Bound::Excluded(0.0), Bound::Included(1.0));
        let lrn = &self.learning;
        check_num(lrn.alpha, unit).context("invalid learning rate")?;
        check_num(lrn.gamma, unit).context("invalid discount factor")?;
        check_num(lrn.epsilon, 0.0..=1.0).context("invalid exploration rate")?;
        check_num(lrn.epsilon_decay, unit).context("invalid exploration decay")?;
        check_num(lrn.epsilon_min, 0.0..=lrn.epsilon).context("invalid exploration floor")?;

        let rwd = &self.rewards;
        for (name, val) in [
            ("goal", rwd.goal),
            ("obstacle", rwd.obstacle),
            ("blocked", rwd.blocked),
            ("step", rwd.step),
            ("revisit", rwd.revisit),
            ("distance_bonus", rwd.distance_bonus),
        ] {
            if !val.is_finite() {
                bail!("reward {name} must be finite, but is {val}");
            }
        }

        Ok(())
    }
}

/// Draw a fresh master seed from the OS.
pub fn draw_seed() -> Result<u64> {
    let mut rng = ChaCha12Rng::try_from_os_rng().context("failed to seed from the OS")?;
    Ok(rng.random_range(0..=MAX_SEED))
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_takes_defaults() {
        let config: Config = toml::from_str("seed = 9\nmode = \"learning\"\n").expect("valid toml");
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.mode, Mode::Learning);
        assert_eq!(config.learning, LearningConfig::default());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn nested_tables_override_fields() {
        let text = "priority = \"distance\"\n[learning]\nalpha = 0.5\n[rewards]\nblocked = -10.0\n";
        let config: Config = toml::from_str(text).expect("valid toml");
        assert_eq!(config.priority, PriorityStrategy::Distance);
        assert_eq!(config.learning.alpha, 0.5);
        assert_eq!(config.learning.gamma, 0.9);
        assert_eq!(config.rewards.blocked, -10.0);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(toml::from_str::<Config>("max_tick = 3\n").is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let invalid = [
            Config {
                max_ticks: 0,
                ..Config::default()
            },
            Config {
                wait_threshold: 0,
                ..Config::default()
            },
            Config {
                learning: LearningConfig {
                    alpha: 0.0,
                    ..LearningConfig::default()
                },
                ..Config::default()
            },
            Config {
                learning: LearningConfig {
                    epsilon: 0.1,
                    epsilon_min: 0.2,
                    ..LearningConfig::default()
                },
                ..Config::default()
            },
            Config {
                seed: Some(u64::MAX),
                ..Config::default()
            },
            Config {
                rewards: RewardConfig {
                    goal: f64::NAN,
                    ..RewardConfig::default()
                },
                ..Config::default()
            },
        ];
        for config in invalid {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn drawn_seeds_fit_in_toml() {
        let seed = draw_seed().expect("OS entropy");
        assert!(seed <= MAX_SEED);
    }

    #[test]
    fn default_config_serializes_and_reloads() {
        let text = toml::to_string_pretty(&Config::default()).expect("serializable");
        let config: Config = toml::from_str(&text).expect("valid toml");
        assert_eq!(config, Config::default());
    }
}
