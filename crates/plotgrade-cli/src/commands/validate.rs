//! The `plotgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use plotgrade_core::loader::{lint_graph, load_graph, load_graph_directory};

pub fn execute(graph_path: PathBuf) -> Result<()> {
    let graphs = if graph_path.is_dir() {
        load_graph_directory(&graph_path)?
    } else {
        let model = load_graph(&graph_path)?;
        vec![(graph_path, model)]
    };

    if graphs.is_empty() {
        println!("No graphs found.");
        return Ok(());
    }

    let mut total_warnings = 0;

    for (path, model) in &graphs {
        let answer = model
            .answer_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "Graph: {} ({} functions, {} lines, answer: {answer})",
            path.display(),
            model.functions.len(),
            model.lines.len()
        );

        let warnings = lint_graph(model);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All graphs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
