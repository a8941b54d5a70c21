//! Phaselens CLI
//!
//! The `phaselens` command runs a compiler on a source file and shows its
//! output split into phases.
//!
//! ## Commands
//!
//! - `compile`: Compile a source file (or stdin) and display the result
//! - `interpret`: Interpret previously captured compiler output
//! - `channels`: List display channels and the phase titles routed to them

mod render;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phaselens_core::{
    compile, interpret, record_outcome, titles_for, Channel, CompileRequest, CompilerConfig,
    InterpretSpan, OutputModel, ProcessInvoker, METRICS,
};
use tracing::{debug, Level};

use crate::render::{render_json, render_text};

#[derive(Parser)]
#[command(name = "phaselens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile with an external toolchain and show its output per phase", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file and display the compiler's output
    Compile {
        /// Source file to compile, or `-` to read from stdin
        source: PathBuf,

        /// Compiler executable (default: ./compiler, or $PHASELENS_COMPILER)
        #[arg(long)]
        compiler: Option<PathBuf>,

        /// Deadline in seconds (default: 10, or $PHASELENS_TIMEOUT_SECS)
        #[arg(long)]
        timeout: Option<u64>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Interpret previously captured compiler output without running anything
    Interpret {
        /// File holding the compiler's stdout
        #[arg(long)]
        stdout: PathBuf,

        /// File holding the compiler's stderr
        #[arg(long)]
        stderr: Option<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// List display channels and the phase titles routed to them
    Channels,
}

#[derive(clap::Args)]
struct DisplayArgs {
    /// Show a single channel (lexical, syntax, semantic, ir, optimization, codegen)
    #[arg(long)]
    channel: Option<Channel>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

/// Exit code when the compiler could not be run at all.
const EXIT_INVOCATION_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    phaselens_core::init_tracing(cli.log_json, level);

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_INVOCATION_FAILED)
        }
    };

    METRICS.flush();
    code
}

async fn run(command: Commands) -> Result<ExitCode> {
    let code = match command {
        Commands::Compile {
            source,
            compiler,
            timeout,
            display,
        } => cmd_compile(&source, compiler, timeout, &display).await?,
        Commands::Interpret {
            stdout,
            stderr,
            display,
        } => cmd_interpret(&stdout, stderr.as_deref(), &display)?,
        Commands::Channels => cmd_channels(),
    };
    Ok(code)
}

async fn cmd_compile(
    source_path: &Path,
    compiler: Option<PathBuf>,
    timeout: Option<u64>,
    display: &DisplayArgs,
) -> Result<ExitCode> {
    let mut config = CompilerConfig::from_env().context("Invalid PHASELENS_* environment")?;
    if let Some(compiler) = compiler {
        config.executable = compiler;
    }
    if let Some(timeout) = timeout {
        config.timeout_secs = timeout;
    }
    config.validate()?;

    let source = read_source(source_path)?;
    debug!(executable = %config.executable.display(), timeout_secs = config.timeout_secs, "compiling");

    let invoker = ProcessInvoker::new(config);
    let model = compile(&invoker, &source).await?;
    show(&model, display)
}

fn cmd_interpret(stdout: &Path, stderr: Option<&Path>, display: &DisplayArgs) -> Result<ExitCode> {
    let stdout_text = std::fs::read_to_string(stdout)
        .with_context(|| format!("Could not open file: {}", stdout.display()))?;
    let stderr_text = match stderr {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not open file: {}", path.display()))?,
        None => String::new(),
    };

    let request = CompileRequest::new(&stdout_text);
    let _span = InterpretSpan::enter(&request.id.to_string());
    let model = interpret(&stdout_text, &stderr_text);
    record_outcome(&model);
    show(&model, display)
}

fn cmd_channels() -> ExitCode {
    for channel in Channel::ALL {
        let titles: Vec<&str> = titles_for(channel).collect();
        let source = if channel == Channel::Optimization {
            "--- OPTIMIZER START --- markers".to_string()
        } else {
            titles.join(", ")
        };
        println!("{:<14} {}", channel.label(), source);
    }
    ExitCode::SUCCESS
}

/// Read source text from a file, or from stdin when the path is `-`.
fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Could not read source from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("Could not open file: {}", path.display()))
}

fn show(model: &OutputModel, display: &DisplayArgs) -> Result<ExitCode> {
    if display.json {
        println!("{}", render_json(model, display.channel)?);
    } else {
        let rendered = render_text(model, display.channel);
        print!("{}", rendered.stdout);
        eprint!("{}", rendered.stderr);
    }

    Ok(if model.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
