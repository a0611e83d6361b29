//! The `plotgrade render` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use plotgrade_core::config::load_config_from;
use plotgrade_core::grading::SubmittedAnswer;
use plotgrade_core::loader::load_graph;
use plotgrade_core::render::RenderMode;

pub fn execute(
    graph_path: PathBuf,
    mode: String,
    answer: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let model = load_graph(&graph_path)?;

    let submitted = answer
        .map(|json| {
            serde_json::from_str::<SubmittedAnswer>(&json)
                .with_context(|| format!("invalid submitted answer: {json}"))
        })
        .transpose()?;

    let mode = match mode.as_str() {
        "authoring" => {
            if submitted.is_some() {
                tracing::warn!("--answer is ignored in authoring mode");
            }
            RenderMode::Authoring
        }
        "answer" => RenderMode::Answer { submitted },
        "review" => RenderMode::Review { submitted },
        other => anyhow::bail!("unknown render mode: {other} (expected authoring, answer or review)"),
    };

    let primitives = config.renderer().render(&model, &mode)?;
    println!("{}", serde_json::to_string_pretty(&primitives)?);

    Ok(())
}
