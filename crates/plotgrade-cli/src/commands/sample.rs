//! The `plotgrade sample` command.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use plotgrade_core::config::{check_resolution, load_config_from};
use plotgrade_core::loader::load_graph;
use plotgrade_core::sampler::{sample, Polyline};

#[derive(Serialize)]
struct SampledFunction<'a> {
    id: &'a str,
    expression: &'a str,
    polylines: Vec<Polyline>,
}

pub fn execute(
    graph_path: PathBuf,
    resolution: Option<usize>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let model = load_graph(&graph_path)?;
    let resolution = resolution.unwrap_or(config.resolution);
    check_resolution(resolution)?;

    let sampled: Vec<SampledFunction> = model
        .functions
        .iter()
        .map(|f| SampledFunction {
            id: &f.id,
            expression: &f.expression,
            polylines: sample(f, model.x_range, model.y_range, resolution),
        })
        .collect();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&sampled)?),
        "text" => print_table(&sampled),
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

fn print_table(sampled: &[SampledFunction]) {
    use comfy_table::{Cell, Table};

    if sampled.is_empty() {
        println!("Graph has no functions.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Function", "Expression", "Segments", "Points"]);

    for f in sampled {
        let points: usize = f.polylines.iter().map(Polyline::len).sum();
        table.add_row(vec![
            Cell::new(f.id),
            Cell::new(f.expression),
            Cell::new(f.polylines.len()),
            Cell::new(points),
        ]);
    }

    println!("{table}");
}
