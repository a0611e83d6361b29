//! Graph file loading and linting.
//!
//! Graphs are stored as the flat `GraphConfig` shape in either JSON or TOML.
//! Loading goes through the model's validating deserializer, so anything
//! returned from here satisfies every structural invariant. [`lint_graph`]
//! then reports softer problems that are legal but probably unintended.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::expr::evaluate;
use crate::model::{AxisRange, CorrectAnswer, GraphModel};
use crate::render::grid_values;
use crate::sampler::{sample, DEFAULT_RESOLUTION};
use crate::session::PROBE_X;

/// On-disk encoding of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Toml,
}

impl GraphFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(GraphFormat::Json),
            "toml" => Some(GraphFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphFormat::Json => write!(f, "json"),
            GraphFormat::Toml => write!(f, "toml"),
        }
    }
}

/// Parse and validate a graph from a string.
pub fn parse_graph_str(content: &str, format: GraphFormat) -> Result<GraphModel> {
    let model = match format {
        GraphFormat::Json => serde_json::from_str(content).context("failed to parse graph JSON")?,
        GraphFormat::Toml => toml::from_str(content).context("failed to parse graph TOML")?,
    };
    Ok(model)
}

/// Load a single graph file, choosing the format by extension.
pub fn load_graph(path: &Path) -> Result<GraphModel> {
    let format = GraphFormat::from_path(path)
        .with_context(|| format!("unsupported graph file extension: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file: {}", path.display()))?;

    parse_graph_str(&content, format).with_context(|| format!("invalid graph: {}", path.display()))
}

/// Recursively load every `.json` and `.toml` graph under `dir`.
///
/// Files that fail to load are skipped with a warning. Results are ordered
/// by path.
pub fn load_graph_directory(dir: &Path) -> Result<Vec<(PathBuf, GraphModel)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))? {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut graphs = Vec::new();
    for path in paths {
        if path.is_dir() {
            graphs.extend(load_graph_directory(&path)?);
        } else if GraphFormat::from_path(&path).is_some() {
            match load_graph(&path) {
                Ok(model) => graphs.push((path, model)),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }

    Ok(graphs)
}

/// A soft problem found by [`lint_graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    /// The line or function the warning is about, if any.
    pub subject: Option<String>,
    pub message: String,
}

impl LintWarning {
    fn new(subject: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{subject}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Check a valid graph for issues that are legal but likely mistakes.
pub fn lint_graph(model: &GraphModel) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    for function in &model.functions {
        let id = Some(function.id.as_str());
        if evaluate(&function.expression, PROBE_X).is_none() {
            warnings.push(LintWarning::new(
                id,
                format!("'{}' is undefined at x = {PROBE_X}", function.expression),
            ));
        }
        if sample(function, model.x_range, model.y_range, DEFAULT_RESOLUTION).is_empty() {
            warnings.push(LintWarning::new(id, "nothing visible in the current ranges"));
        }
    }

    for line in &model.lines {
        if line.points.is_empty() {
            warnings.push(LintWarning::new(Some(&line.id), "line has no points"));
        }
    }

    if let Some(CorrectAnswer::Point(p)) = &model.answer {
        if !model.x_range.contains(p.x) || !model.y_range.contains(p.y) {
            warnings.push(LintWarning::new(
                None,
                format!("correct point ({}, {}) is outside the visible ranges", p.x, p.y),
            ));
        }
        if model.tolerance_radius == 0.0 {
            warnings.push(LintWarning::new(
                None,
                "tolerance radius is 0 but clicks are rounded to 0.1",
            ));
        }
    }

    let too_dense = |range: AxisRange| grid_values(range.min, range.max, model.grid_step).is_none();
    if model.show_grid && (too_dense(model.x_range) || too_dense(model.y_range)) {
        warnings.push(LintWarning::new(
            None,
            format!("grid step {} is too dense to draw", model.grid_step),
        ));
    }

    warnings
}
