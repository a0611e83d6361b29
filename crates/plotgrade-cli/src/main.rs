//! plotgrade CLI: author checks, rendering and batch grading for graph questions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "plotgrade", version, about = "Interactive Cartesian graph questions for exams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and lint graph files
    Validate {
        /// Path to a .json/.toml graph or a directory of them
        #[arg(long)]
        graph: PathBuf,
    },

    /// Evaluate an expression at one x value
    Eval {
        /// Expression in x, e.g. "x^2 - 3*sin(x)"
        #[arg(long)]
        expr: String,

        /// Value of x
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
    },

    /// Sample every function of a graph into polylines
    Sample {
        /// Graph file
        #[arg(long)]
        graph: PathBuf,

        /// Steps across the x-range (default from config)
        #[arg(long)]
        resolution: Option<usize>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a graph to drawable primitives (JSON)
    Render {
        /// Graph file
        #[arg(long)]
        graph: PathBuf,

        /// Render mode: authoring, answer, review
        #[arg(long, default_value = "authoring")]
        mode: String,

        /// Submitted answer as JSON, for answer and review modes
        #[arg(long)]
        answer: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a batch of submissions against a graph question
    Grade {
        /// Graph file holding the question
        #[arg(long)]
        graph: PathBuf,

        /// JSON file with an array of submissions
        #[arg(long)]
        submissions: PathBuf,

        /// Area policy: containment, overlap:<threshold>, centroid
        #[arg(long)]
        policy: Option<String>,

        /// Write the JSON report to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example question
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("plotgrade=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { graph } => commands::validate::execute(graph),
        Commands::Eval { expr, x } => commands::eval::execute(expr, x),
        Commands::Sample {
            graph,
            resolution,
            format,
            config,
        } => commands::sample::execute(graph, resolution, format, config),
        Commands::Render {
            graph,
            mode,
            answer,
            config,
        } => commands::render::execute(graph, mode, answer, config),
        Commands::Grade {
            graph,
            submissions,
            policy,
            output,
            format,
            config,
        } => commands::grade::execute(graph, submissions, policy, output, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
