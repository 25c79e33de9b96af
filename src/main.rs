//! `ffagent`: CLI front end over the toolkit operations.
//!
//! The CLI is intentionally thin: each subcommand maps 1:1 onto one
//! toolkit operation and prints its structured result as JSON, so the
//! same core logic can sit behind any transport.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use ffmpeg_agent::command::CommandSpec;
use ffmpeg_agent::config::{self, ToolsConfig};
use ffmpeg_agent::tools::Tools;

#[derive(Parser, Debug)]
#[command(
    name = "ffagent",
    version,
    about = "Agent-facing ffmpeg execution, inspection, and source cross-reference",
    after_help = "Examples:\n  ffagent exec -- ffmpeg -i in.mp4 out.mp4\n  ffagent probe out.mp4\n  ffagent screenshot out.mp4 --at 00:00:05\n  ffagent ls libavfilter\n  ffagent cat libavfilter/vf_scale.c\n  ffagent suggest --stderr \"No such filter: 'scal'\" -- ffmpeg -vf scal=320:-1",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Configuration file (JSON); defaults apply when omitted
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// ffmpeg source snapshot root (overrides config and FFAGENT_SOURCE_ROOT)
    #[arg(long, value_name = "DIR", global = true)]
    source_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute an argument vector and print the structured result
    Exec(ExecArgs),
    /// Inspect declared output files with ffprobe
    Probe(ProbeArgs),
    /// Extract a single frame from a media file
    Screenshot(ScreenshotArgs),
    /// List immediate children of a source-tree path
    Ls(LsArgs),
    /// Print the contents of a source file
    Cat(CatArgs),
    /// Rank source files likely related to a failed command
    Suggest(SuggestArgs),
}

#[derive(Parser, Debug)]
struct ExecArgs {
    /// Deadline override in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Working directory for the spawned process
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Full argument vector, first token included (after `--`)
    #[arg(value_name = "ARG", num_args = 1.., last = true)]
    args: Vec<String>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Output files to inspect, in order
    #[arg(value_name = "FILE", num_args = 1..)]
    paths: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct ScreenshotArgs {
    /// Media file to sample
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Timestamp: seconds ("12.5") or clock form ("00:00:05")
    #[arg(long, value_name = "TS")]
    at: Option<String>,

    /// Explicit output image path (deterministic across calls)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct LsArgs {
    /// Source-tree path; empty for the root
    #[arg(value_name = "PATH", default_value = "")]
    path: String,
}

#[derive(Parser, Debug)]
struct CatArgs {
    /// Source-tree file path
    #[arg(value_name = "PATH")]
    path: String,
}

#[derive(Parser, Debug)]
struct SuggestArgs {
    /// Captured stderr of the failed invocation
    #[arg(long, value_name = "TEXT", conflicts_with = "stderr_file")]
    stderr: Option<String>,

    /// Read the failed invocation's stderr from a file
    #[arg(long, value_name = "FILE")]
    stderr_file: Option<PathBuf>,

    /// The failed argument vector (after `--`)
    #[arg(value_name = "ARG", num_args = 0.., last = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let tools = Tools::new(config).context("initialize toolkit")?;

    match cli.command {
        Commands::Exec(args) => run_exec(&tools, args),
        Commands::Probe(args) => print_json(&tools.probe(&args.paths)),
        Commands::Screenshot(args) => run_screenshot(&tools, args),
        Commands::Ls(args) => print_json(&tools.list_source(&args.path)?),
        Commands::Cat(args) => {
            print!("{}", tools.read_source(&args.path)?);
            Ok(())
        }
        Commands::Suggest(args) => run_suggest(&tools, args),
    }
}

fn resolve_config(cli: &Cli) -> Result<ToolsConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ToolsConfig::default(),
    };
    if let Some(root) = &cli.source_root {
        config.source_root = Some(root.clone());
    } else if config.source_root.is_none() {
        if let Some(root) = std::env::var_os("FFAGENT_SOURCE_ROOT") {
            config.source_root = Some(PathBuf::from(root));
        }
    }
    config::validate_config(&config)?;
    Ok(config)
}

fn run_exec(tools: &Tools, args: ExecArgs) -> Result<()> {
    let mut spec = CommandSpec::new(args.args);
    if let Some(timeout_ms) = args.timeout_ms {
        spec = spec.with_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(cwd) = args.cwd {
        spec = spec.with_current_dir(cwd);
    }
    print_json(&tools.execute(spec)?)
}

fn run_screenshot(tools: &Tools, args: ScreenshotArgs) -> Result<()> {
    let frame = tools.screenshot(&args.path, args.at.as_deref(), args.out)?;
    println!("{}", frame.display());
    Ok(())
}

fn run_suggest(tools: &Tools, args: SuggestArgs) -> Result<()> {
    let stderr = match (args.stderr, args.stderr_file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("read stderr file {}", path.display()))?,
        (None, None) => String::new(),
        (Some(_), Some(_)) => return Err(anyhow!("--stderr conflicts with --stderr-file")),
    };
    print_json(&tools.validate(&args.args, &stderr)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serialize result")?
    );
    Ok(())
}
