//! The `plotgrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("plotgrade.toml").exists() {
        println!("plotgrade.toml already exists, skipping.");
    } else {
        std::fs::write("plotgrade.toml", SAMPLE_CONFIG)?;
        println!("Created plotgrade.toml");
    }

    std::fs::create_dir_all("graphs")?;
    std::fs::create_dir_all("submissions")?;
    for (path, content) in [
        ("graphs/example.json", EXAMPLE_GRAPH),
        ("submissions/example.json", EXAMPLE_SUBMISSIONS),
    ] {
        if Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, content)?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Run: plotgrade validate --graph graphs/example.json");
    println!("  2. Run: plotgrade render --graph graphs/example.json --mode authoring");
    println!(
        "  3. Run: plotgrade grade --graph graphs/example.json --submissions submissions/example.json"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# plotgrade configuration

# Sampling steps across the x-range
resolution = 200

[canvas]
width = 600
height = 400
padding = 40

# How area answers are graded: "containment", "overlap" (with threshold) or "centroid"
[area_policy]
kind = "containment"
"#;

const EXAMPLE_GRAPH: &str = r##"{
  "xRange": [-2, 6],
  "yRange": [-3, 8],
  "xLabel": "x",
  "yLabel": "y",
  "title": "Click the vertex of the parabola",
  "showGrid": true,
  "gridStep": 1,
  "functions": [
    { "id": "fn-1", "expression": "x^2 - 4*x + 3", "color": "#1f77b4", "label": "f(x)" }
  ],
  "isInteractive": true,
  "answerType": "point",
  "correctPoint": { "x": 2, "y": -1 },
  "toleranceRadius": 0.25
}
"##;

const EXAMPLE_SUBMISSIONS: &str = r#"[
  { "student_id": "s-001", "answer": { "type": "point", "x": 2.1, "y": -0.9 } },
  { "student_id": "s-002", "answer": { "type": "point", "x": 1.0, "y": 0.0 } },
  { "student_id": "s-003", "answer": { "type": "function", "id": "fn-1" } }
]
"#;
