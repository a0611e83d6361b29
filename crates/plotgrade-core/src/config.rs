//! Engine configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grading::{AnswerValidator, AreaPolicy};
use crate::mapper::Canvas;
use crate::render::Renderer;
use crate::sampler::{DEFAULT_RESOLUTION, MAX_RESOLUTION};

/// Environment variable overriding the sampling resolution.
pub const RESOLUTION_ENV: &str = "PLOTGRADE_RESOLUTION";

/// Top-level plotgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotgradeConfig {
    /// Canvas used for rendering and for mapping clicks.
    #[serde(default)]
    pub canvas: Canvas,
    /// Sampling steps across the x-range.
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// How area answers are graded.
    #[serde(default)]
    pub area_policy: AreaPolicy,
}

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}

impl Default for PlotgradeConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            resolution: default_resolution(),
            area_policy: AreaPolicy::default(),
        }
    }
}

impl PlotgradeConfig {
    pub fn validator(&self) -> AnswerValidator {
        AnswerValidator::new(self.area_policy)
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.canvas, self.resolution)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        check_resolution(self.resolution)?;
        self.area_policy
            .check()
            .map_err(|e| anyhow::anyhow!("invalid area_policy: {e}"))
    }

    fn apply_resolution_override(&mut self, value: Option<String>) -> Result<()> {
        if let Some(value) = value {
            let resolution = value
                .trim()
                .parse()
                .with_context(|| format!("invalid {RESOLUTION_ENV}: {value}"))?;
            check_resolution(resolution).with_context(|| format!("invalid {RESOLUTION_ENV}"))?;
            self.resolution = resolution;
        }
        Ok(())
    }
}

/// Reject sampling resolutions above [`MAX_RESOLUTION`].
pub fn check_resolution(resolution: usize) -> Result<()> {
    if resolution > MAX_RESOLUTION {
        anyhow::bail!("resolution {resolution} exceeds the maximum of {MAX_RESOLUTION}");
    }
    Ok(())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `plotgrade.toml` in the current directory
/// 2. `~/.config/plotgrade/config.toml`
///
/// `PLOTGRADE_RESOLUTION` overrides the sampling resolution.
pub fn load_config() -> Result<PlotgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PlotgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("plotgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(
                &std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?,
            )
            .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PlotgradeConfig::default(),
    };

    config.apply_resolution_override(std::env::var(RESOLUTION_ENV).ok())?;

    Ok(config)
}

/// Parse configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<PlotgradeConfig> {
    let config: PlotgradeConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("plotgrade"))
}
