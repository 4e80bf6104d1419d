//! Pipeline configuration loading.
//!
//! A YAML file provides the base configuration; command-line flags override
//! individual fields on top of it.

use std::path::Path;

use anyhow::{Context, Result};
use equalizer::{AccumulationStrategy, MappingMode, PipelineConfig, Rounding};
use tracing::debug;

/// Load a pipeline configuration from a YAML file.
pub fn load(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty document deserializes to null, which is not a mapping
    if content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }

    let config: PipelineConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    debug!(path = %path.display(), ?config, "Loaded pipeline config");
    Ok(config)
}

/// Field overrides collected from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub strategy: Option<AccumulationStrategy>,
    pub rows_per_task: Option<usize>,
    pub mapping: Option<MappingMode>,
    pub rounding: Option<Rounding>,
    pub verify: bool,
}

impl Overrides {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(strategy) = self.strategy {
            config.builder.strategy = strategy;
        }
        if let Some(rows) = self.rows_per_task {
            config.builder.rows_per_task = Some(rows);
        }
        if let Some(mapping) = self.mapping {
            config.mapping = mapping;
        }
        if let Some(rounding) = self.rounding {
            config.rounding = rounding;
        }
        if self.verify {
            config.builder.verify = true;
        }
        config
    }
}

/// Resolve the effective configuration: file (if any), then flag overrides,
/// then validation.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<PipelineConfig> {
    let base = match path {
        Some(path) => load(path)?,
        None => PipelineConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate().context("Invalid pipeline configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let file = write_config(
            r#"
workers: 4
builder:
  strategy: atomic
  rows_per_task: 8
  verify: true
mapping: cumulative
rounding: half_even
"#,
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.builder.strategy, AccumulationStrategy::Atomic);
        assert_eq!(config.builder.rows_per_task, Some(8));
        assert!(config.builder.verify);
        assert_eq!(config.mapping, MappingMode::Cumulative);
        assert_eq!(config.rounding, Rounding::HalfEven);
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = write_config("\n");
        assert_eq!(load(file.path()).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_unknown_strategy_fails() {
        let file = write_config("builder:\n  strategy: magic\n");
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nope.yaml")).is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config("workers: 2\nmapping: cumulative\n");
        let overrides = Overrides {
            workers: Some(6),
            strategy: Some(AccumulationStrategy::Sequential),
            verify: true,
            ..Default::default()
        };
        let config = resolve(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.workers, Some(6));
        assert_eq!(config.builder.strategy, AccumulationStrategy::Sequential);
        assert!(config.builder.verify);
        // Untouched fields come from the file
        assert_eq!(config.mapping, MappingMode::Cumulative);
    }

    #[test]
    fn test_resolve_validates() {
        let overrides = Overrides {
            rows_per_task: Some(0),
            ..Default::default()
        };
        assert!(resolve(None, &overrides).is_err());
    }
}
