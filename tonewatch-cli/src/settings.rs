//! Detector configuration: JSON file plus command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tonewatch_core::{DetectorConfig, MagnitudeMode};

use crate::args::Args;

/// Load a `DetectorConfig` from JSON. Missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<DetectorConfig> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Build the effective config: file (or defaults), then flags on top.
pub fn resolve(args: &Args) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.filter.threshold = threshold;
    }
    if let Some(n) = args.block_size {
        config.filter.block_size = Some(n);
    }
    if args.optimized {
        config.filter.magnitude_mode = MagnitudeMode::Optimized;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use tonewatch_core::BlockSizeStrategy;

    use super::*;
    use crate::args::Command;

    fn args() -> Args {
        Args {
            command: Command::Detect,
            frequency: 1400.0,
            absence: false,
            sample_rate: None,
            min_duration: Duration::from_millis(50),
            threshold: None,
            block_size: None,
            optimized: false,
            config: None,
            input: None,
        }
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let cfg = resolve(&args()).unwrap();
        assert_eq!(cfg.filter.threshold, 7.8e7);
        assert_eq!(cfg.filter.magnitude_mode, MagnitudeMode::Standard);
    }

    #[test]
    fn flags_override_file() {
        let path = std::env::temp_dir().join(format!("tonewatch-cfg-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"filter": {"threshold": 5e6, "blockSizeStrategy": "commensurate"}, "minRequiredBlocks": 3}"#,
        )
        .unwrap();

        let mut a = args();
        a.config = Some(path.clone());
        a.optimized = true;
        a.block_size = Some(183);
        let cfg = resolve(&a).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(cfg.filter.threshold, 5e6);
        assert_eq!(cfg.filter.block_size_strategy, BlockSizeStrategy::Commensurate);
        assert_eq!(cfg.filter.block_size, Some(183));
        assert_eq!(cfg.filter.magnitude_mode, MagnitudeMode::Optimized);
        assert_eq!(cfg.min_required_blocks, 3);
    }

    #[test]
    fn zero_required_blocks_in_file_is_rejected() {
        let path =
            std::env::temp_dir().join(format!("tonewatch-zero-{}.json", std::process::id()));
        fs::write(&path, r#"{"minRequiredBlocks": 0}"#).unwrap();

        let mut a = args();
        a.config = Some(path.clone());
        let result = resolve(&a);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut a = args();
        a.config = Some(PathBuf::from("/nonexistent/tonewatch.json"));
        assert!(resolve(&a).is_err());
    }
}
