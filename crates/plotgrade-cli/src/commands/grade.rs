//! The `plotgrade grade` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use plotgrade_core::config::load_config_from;
use plotgrade_core::grading::{AnswerValidator, AreaPolicy};
use plotgrade_core::loader::load_graph;
use plotgrade_core::report::{describe_answer, format_metric, grade_batch, GradingReport, Submission};

pub fn execute(
    graph_path: PathBuf,
    submissions_path: PathBuf,
    policy: Option<String>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let model = load_graph(&graph_path)?;
    let submissions = load_submissions(&submissions_path)?;

    let area_policy = match policy {
        Some(p) => p.parse::<AreaPolicy>().map_err(|e| anyhow::anyhow!("{}", e))?,
        None => config.area_policy,
    };
    let validator = AnswerValidator::new(area_policy);

    let question_id = graph_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "question".to_string());

    let report = grade_batch(&question_id, &model, &validator, &submissions);

    if let Some(path) = &output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    match format.as_str() {
        "text" => print_summary(&report),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" => print!("{}", report.to_markdown()),
        other => anyhow::bail!("unknown format: {other} (expected text, json or markdown)"),
    }

    Ok(())
}

fn load_submissions(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions: {}", path.display()))
}

fn print_summary(report: &GradingReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Student", "Answer", "Metric", "Correct"]);

    for r in &report.results {
        table.add_row(vec![
            Cell::new(&r.student_id),
            Cell::new(describe_answer(&r.answer)),
            Cell::new(format_metric(r.verdict.metric)),
            Cell::new(if r.verdict.correct { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
    println!(
        "\n{}: {}/{} correct ({:.1}%), area policy {}",
        report.question_id,
        report.summary.correct,
        report.summary.total,
        report.summary.pass_rate * 100.0,
        report.area_policy
    );
}
