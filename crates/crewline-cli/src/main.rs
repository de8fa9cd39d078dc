//! crewline - research a topic and write it up with a sequential crew of roles
//!
//! ## Commands
//!
//! - `run`: execute the research → writing pipeline (or a JSON-defined one)
//!   and print the resulting markdown
//! - `plan`: show the execution order and sequencing digest without calling
//!   any provider

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, Level};

use crewline_core::blueprint;
use crewline_core::{
    CancelSignal, ExecutionResult, Pipeline, PipelineExecutor, RunOptions, RunStatus,
    DEFAULT_MAX_DELEGATION_DEPTH, DEFAULT_MODEL, DEFAULT_SEARCH_RESULT_LIMIT,
};
use crewline_providers::{OpenAiGenerator, ProviderConfig, SerperSearch};

#[derive(Parser)]
#[command(name = "crewline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Research a topic and turn it into a blog post with a crew of AI roles",
    long_about = None
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline on a topic and print the final markdown
    Run(RunArgs),

    /// Show the ordered plan of a pipeline
    Plan {
        /// JSON pipeline definition (default: built-in research → writing)
        #[arg(long)]
        pipeline: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Topic to research and write about
    #[arg(short, long, default_value = blueprint::DEFAULT_TOPIC)]
    topic: String,

    /// Generation model identifier
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Results requested per web search (1-100)
    #[arg(long, default_value_t = DEFAULT_SEARCH_RESULT_LIMIT)]
    search_results: u32,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,

    /// JSON pipeline definition (default: built-in research → writing)
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// Also save the final markdown to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full execution result as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Maximum nesting of delegations between roles
    #[arg(long, default_value_t = DEFAULT_MAX_DELEGATION_DEPTH)]
    max_delegation_depth: usize,

    /// Wall-time limit per work unit, in seconds
    #[arg(long, value_name = "SECS")]
    stage_timeout: Option<u64>,
}

impl RunArgs {
    fn run_options(&self) -> RunOptions {
        let options = RunOptions::default()
            .with_model(self.model.clone())
            .with_search_result_limit(self.search_results)
            .with_verbose(!self.quiet)
            .with_max_delegation_depth(self.max_delegation_depth);
        match self.stage_timeout {
            Some(secs) => options.with_stage_timeout_secs(secs),
            None => options,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    crewline_core::telemetry::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Plan { pipeline } => cmd_plan(pipeline.as_deref()),
    }
}

async fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = ProviderConfig::from_env().context("Failed to read provider configuration")?;
    debug!(?config, "Provider configuration loaded");
    let executor = build_executor(&config)?;

    let result = run_pipeline(&executor, args, &cancel_on_interrupt()).await?;
    report(args, &result)
}

/// Cancel the run at the next work unit boundary once Ctrl-C arrives.
fn cancel_on_interrupt() -> CancelSignal {
    let (canceller, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, stopping before the next work unit");
            canceller.cancel();
        }
    });
    signal
}

fn build_executor(config: &ProviderConfig) -> Result<PipelineExecutor> {
    let generator = OpenAiGenerator::new(config).context("Failed to create generation client")?;
    let mut executor = PipelineExecutor::new(Arc::new(generator))
        .with_observer(Arc::new(|message: &str| eprintln!("{message}")));

    if config.search_enabled() {
        let search = SerperSearch::new(config).context("Failed to create search client")?;
        executor = executor.with_search(Arc::new(search));
    }
    Ok(executor)
}

async fn run_pipeline(
    executor: &PipelineExecutor,
    args: &RunArgs,
    cancel: &CancelSignal,
) -> Result<ExecutionResult> {
    let pipeline = load_pipeline(args.pipeline.as_deref())?;
    let result = executor
        .run_with_cancel(&pipeline, &args.topic, &args.run_options(), cancel)
        .await
        .context("Pipeline could not start")?;
    Ok(result)
}

/// Print the result, save the artifact and turn a failed run into an error.
fn report(args: &RunArgs, result: &ExecutionResult) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_completed() {
        println!("{}", result.final_output);
    }

    if let (Some(path), true) = (&args.output, result.is_completed()) {
        write_artifact(path, &result.final_output)?;
        eprintln!("Saved to {}", path.display());
    }

    match result.failure_reason() {
        None => Ok(()),
        Some(reason) => {
            if !args.json {
                eprint!("{}", render_trace(result));
            }
            anyhow::bail!(reason)
        }
    }
}

fn cmd_plan(path: Option<&Path>) -> Result<()> {
    let pipeline = load_pipeline(path)?;
    print!("{}", render_plan(&pipeline));
    Ok(())
}

fn load_pipeline(path: Option<&Path>) -> Result<Pipeline> {
    let Some(path) = path else {
        return Ok(blueprint::content_pipeline());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline definition {}", path.display()))?;
    Pipeline::from_json_str(&json)
        .with_context(|| format!("Invalid pipeline definition {}", path.display()))
}

fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn render_plan(pipeline: &Pipeline) -> String {
    let mut out = String::new();
    for step in pipeline.plan() {
        let _ = write!(out, "{}. {} → {}", step.position + 1, step.unit, step.role);
        if let Some(role) = pipeline.role(&step.role) {
            let tools: Vec<String> = role.tools.iter().map(ToString::to_string).collect();
            if !tools.is_empty() {
                let _ = write!(out, " [{}]", tools.join(", "));
            }
            if role.allow_delegation {
                out.push_str(" (may delegate)");
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "Sequencing digest: {}", pipeline.sequencing_digest());
    out
}

/// Completed stages and the terminal status, for a run that did not finish.
fn render_trace(result: &ExecutionResult) -> String {
    let mut out = format!("\nRun {} stopped.\n", result.run_id);
    if result.stage_outputs.is_empty() {
        out.push_str("No work units completed.\n");
    }
    for stage in &result.stage_outputs {
        let _ = writeln!(
            out,
            "  ✓ {} by {} ({} ms, {} chars)",
            stage.unit,
            stage.role,
            stage.duration_ms,
            stage.output.chars().count()
        );
    }
    match &result.status {
        RunStatus::Failed { unit, reason } => {
            let _ = writeln!(out, "  ✗ {unit}: {reason}");
        }
        RunStatus::Cancelled { before_unit } => {
            let _ = writeln!(out, "  - cancelled before {before_unit}");
        }
        RunStatus::Completed => {}
    }
    out
}
