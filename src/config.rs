//! Configuration and the environment-driven generator boundary
//!
//! [`GuideConfig`] collects the knobs shared by all guides and builds a
//! guide by name. [`GeneratorEnv`] is the contract with an external fuzzer
//! that runs a generator as a child process: the process learns its input
//! choice file and output artifact path from environment variables, replays
//! the input, and writes the artifact followed by the choices it actually
//! made.

use crate::choices::{DEFAULT_LINE_LENGTH, DEFAULT_PREFIX};
use crate::error::{GuideError, GuideResult};
use crate::guide::{
    BfsGuide, Chooser, DefaultGuide, FileGuide, Guide, SaverGuide, SyncMode, WeightedSamplerGuide,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Choice log to replay
pub const INPUT_FILE_VAR: &str = "FILEGUIDE_INPUT_FILE";
/// Where the generated artifact goes
pub const OUTPUT_FILE_VAR: &str = "FILEGUIDE_OUTPUT_FILE";
pub const SEED_VAR: &str = "TREE_GUIDE_SEED";
pub const SYNC_VAR: &str = "TREE_GUIDE_SYNC";
pub const PREFIX_VAR: &str = "TREE_GUIDE_PREFIX";

/// Settings shared by every guide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// PRNG seed; `None` seeds from the operating system
    pub seed: Option<u64>,

    /// Prefix of every line of a formatted choice block
    pub prefix: String,

    /// Nesting reconciliation used when replaying a choice log
    pub sync: SyncMode,

    /// Formatted choice lines are wrapped below this length
    pub max_line_length: usize,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            seed: None,
            prefix: DEFAULT_PREFIX.to_string(),
            sync: SyncMode::default(),
            max_line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

impl GuideConfig {
    /// Build a fresh exploring guide of the given kind
    pub fn build(&self, kind: GuideKind) -> Box<dyn Guide> {
        log::debug!("Building {} guide (seed {:?})", kind, self.seed);
        match (kind, self.seed) {
            (GuideKind::Default, Some(seed)) => Box::new(DefaultGuide::new(seed)),
            (GuideKind::Default, None) => Box::new(DefaultGuide::from_entropy()),
            (GuideKind::Bfs, Some(seed)) => Box::new(BfsGuide::new(seed)),
            (GuideKind::Bfs, None) => Box::new(BfsGuide::from_entropy()),
            (GuideKind::WeightedSampler, seed) => {
                Box::new(WeightedSamplerGuide::new(seed.unwrap_or_else(rand::random)))
            }
        }
    }

    /// Apply the `TREE_GUIDE_*` overrides found through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> GuideResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(SEED_VAR) {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|err| GuideError::Config(format!("{} must be an integer: {}", SEED_VAR, err)))?;
            self.seed = Some(seed);
        }
        if let Some(sync) = lookup(SYNC_VAR) {
            self.sync = sync.parse()?;
        }
        if let Some(prefix) = lookup(PREFIX_VAR) {
            self.prefix = prefix;
        }
        Ok(self)
    }

    /// Apply the `TREE_GUIDE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> GuideResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

/// Guides that can be built from configuration alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuideKind {
    Default,
    Bfs,
    WeightedSampler,
}

impl fmt::Display for GuideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuideKind::Default => "default",
            GuideKind::Bfs => "bfs",
            GuideKind::WeightedSampler => "weighted",
        })
    }
}

impl FromStr for GuideKind {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "random" => Ok(GuideKind::Default),
            "bfs" => Ok(GuideKind::Bfs),
            "weighted" | "weighted-sampler" => Ok(GuideKind::WeightedSampler),
            other => Err(GuideError::Config(format!("unknown guide '{}'", other))),
        }
    }
}

/// Input and output locations handed to a generator process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorEnv {
    pub input_file: PathBuf,
    pub output_file: Option<PathBuf>,
}

impl GeneratorEnv {
    /// Read the locations from the process environment
    pub fn from_env() -> GuideResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read the locations through `lookup`; the input file is required
    pub fn from_vars<F>(lookup: F) -> GuideResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input_file = lookup(INPUT_FILE_VAR)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| GuideError::Config(format!("{} is not set", INPUT_FILE_VAR)))?;
        Ok(Self {
            input_file: PathBuf::from(input_file),
            output_file: lookup(OUTPUT_FILE_VAR)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Replay the input file through `generate` once.
    ///
    /// The returned text is the generated artifact followed by the choice
    /// block of this run, which is also written to the output file when one
    /// is configured. Any error means the run must be treated as failed.
    pub fn run<F>(&self, config: &GuideConfig, generate: F) -> GuideResult<String>
    where
        F: FnOnce(&mut dyn Chooser) -> String,
    {
        let mut file = FileGuide::from_path(&self.input_file, &config.prefix)?.with_sync(config.sync);
        if let Some(seed) = config.seed {
            file = file.with_seed(seed);
        }
        let mut saver = SaverGuide::new(&mut file)
            .with_prefix(config.prefix.clone())
            .with_line_length(config.max_line_length);

        // a file guide never runs out of choosers
        let mut chooser = saver.chooser()?.ok_or(GuideError::EmptyLog)?;
        let mut artifact = generate(&mut chooser);
        chooser.finish()?;

        if !artifact.is_empty() && !artifact.ends_with('\n') {
            artifact.push('\n');
        }
        artifact.push_str(&chooser.format_choices());
        drop(chooser);
        let stats = saver.stats();

        if let Some(output) = &self.output_file {
            std::fs::write(output, &artifact).map_err(|err| {
                GuideError::Io(format!("cannot write '{}': {}", output.display(), err))
            })?;
            log::debug!("Wrote {} bytes to {}", artifact.len(), output.display());
        }
        log::debug!(
            "Replayed {} with {} fill-ins and {} discards",
            self.input_file.display(),
            stats.fill_ins,
            stats.discards
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GuideConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.prefix, "// ");
        assert_eq!(config.sync, SyncMode::Resync);
        assert_eq!(config.max_line_length, 70);
    }

    #[test]
    fn test_overrides() {
        let config = GuideConfig::default()
            .with_overrides(vars(&[(SEED_VAR, "42"), (SYNC_VAR, "balance"), (PREFIX_VAR, "# ")]))
            .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.sync, SyncMode::Balance);
        assert_eq!(config.prefix, "# ");
    }

    #[test]
    fn test_bad_overrides_are_config_errors() {
        let bad_seed = GuideConfig::default().with_overrides(vars(&[(SEED_VAR, "soon")]));
        assert!(matches!(bad_seed, Err(GuideError::Config(_))));
        let bad_sync = GuideConfig::default().with_overrides(vars(&[(SYNC_VAR, "maybe")]));
        assert!(matches!(bad_sync, Err(GuideError::Config(_))));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: GuideConfig = serde_json::from_str(r#"{"seed": 7, "sync": "none"}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.sync, SyncMode::None);
        assert_eq!(config.prefix, "// ");
    }

    #[test]
    fn test_build_by_name() {
        let config = GuideConfig {
            seed: Some(1),
            ..GuideConfig::default()
        };
        for (name, expected) in [("bfs", "BFS"), ("default", "default"), ("weighted", "weighted sample")] {
            let kind: GuideKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
            assert_eq!(config.build(kind).name(), expected);
        }
        assert!("dfs".parse::<GuideKind>().is_err());
    }

    #[test]
    fn test_input_file_is_required() {
        assert!(matches!(GeneratorEnv::from_vars(vars(&[])), Err(GuideError::Config(_))));
        let env = GeneratorEnv::from_vars(vars(&[(INPUT_FILE_VAR, "in.txt")])).unwrap();
        assert_eq!(env.input_file, PathBuf::from("in.txt"));
        assert_eq!(env.output_file, None);
    }
}
