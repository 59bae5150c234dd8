//! CLI entry point for storyctx.
//!
//! Provides commands for retrieving reference sentences, inspecting the
//! loaded artifacts and managing configuration.

use anyhow::{Context, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use storyctx::display::{THEME, Theme, create_info_table, create_results_table};
use storyctx::io::{ExitCode, OutputFormat, OutputManager};
use storyctx::{RetrievalError, Retriever, Settings, logging};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Create custom help text with consistent styling
fn create_custom_help() -> String {
    let heading = |text: &str| {
        if Theme::should_disable_colors() {
            text.to_string()
        } else {
            THEME.header.apply_to(text).to_string()
        }
    };

    let mut help = String::new();

    help.push_str(&format!("{}\n", heading("Quick Start:")));
    help.push_str("  $ storyctx init                         # Write .storyctx/settings.toml\n");
    help.push_str("  $ storyctx retrieve \"the sun rose\"      # Closest reference sentences\n");
    help.push_str("  $ storyctx retrieve \"rain\" -k 3 --prompt # Lines ready for a prompt\n\n");

    help.push_str("Retrieve reference sentences from a story corpus for prompt context.\n\n");

    help.push_str(&heading("Usage:"));
    help.push_str(" storyctx [OPTIONS] <COMMAND>\n\n");

    help.push_str(&format!("{}\n", heading("Commands:")));
    help.push_str("  retrieve    Find the sentences closest to a query\n");
    help.push_str("  info        Show the loaded model, index and metadata\n");
    help.push_str("  config      Display active settings\n");
    help.push_str("  init        Set up .storyctx directory\n");
    help.push_str("  help        Print this message or the help of the given subcommand(s)\n\n");

    help.push_str("See 'storyctx help <command>' for more information on a specific command.\n\n");

    help.push_str(&format!("{}\n", heading("Options:")));
    help.push_str("  -c, --config <CONFIG>  Path to custom settings.toml file\n");
    help.push_str("  -v, --verbose          Enable debug logging on stderr\n");
    help.push_str("  -h, --help             Print help\n");
    help.push_str("  -V, --version          Print version\n");

    help
}

/// Story context retrieval
#[derive(Parser)]
#[command(
    name = "storyctx",
    version = env!("CARGO_PKG_VERSION"),
    about = "Story context retrieval",
    long_about = "Retrieve reference sentences from a story corpus for prompt context.",
    next_line_help = true,
    styles = clap_cargo_style(),
    override_help = create_custom_help()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Find the corpus sentences closest to a query
    #[command(
        about = "Find the sentences closest to a query",
        after_help = "Examples:\n  storyctx retrieve \"It's so good to be alive\"\n  storyctx retrieve \"a storm at sea\" -k 3 --prompt\n  storyctx retrieve \"dawn\" --json | jq '.data[].sentence'\n\nJSON paths:\n  .data[].sentence\n  .data[].story_title\n  .data[].distance"
    )]
    Retrieve {
        /// Query text
        query: String,

        /// Number of sentences to return (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Partitions searched per query (overrides config)
        #[arg(long)]
        nprobe: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Output prompt-context lines
        #[arg(long, conflicts_with = "json")]
        prompt: bool,

        /// Output a compact table
        #[arg(long, conflicts_with_all = ["json", "prompt"])]
        table: bool,
    },

    /// Show artifact statistics
    #[command(about = "Show the loaded model, index and metadata")]
    Info {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .storyctx/settings.toml")]
    Config,

    /// Initialize project
    #[command(about = "Set up .storyctx directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Entry point.
///
/// Loads configuration, sets up logging and dispatches the command.
/// Every path ends in `std::process::exit` with a documented exit code.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(config_path) => Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "{}",
                THEME.error_with_icon(&format!(
                    "Configuration error loading from {}: {e}",
                    config_path.display()
                ))
            );
            std::process::exit(ExitCode::ConfigError as i32);
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("{}", THEME.warning_with_icon(&format!("Configuration error: {e}")));
            eprintln!("Using default configuration.");
            Settings::default()
        }),
    };

    logging::init(&settings.logging, cli.verbose || settings.debug);

    let exit_code = match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Config => run_config(&settings),
        Commands::Info { json } => run_info(&settings, json),
        Commands::Retrieve {
            query,
            top_k,
            nprobe,
            json,
            prompt,
            table,
        } => {
            if let Some(nprobe) = nprobe {
                settings.retrieval.nprobe = nprobe;
            }
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            run_retrieve(&settings, query, top_k, OutputFormat::from_flags(json, prompt), table)
                .await
        }
    };

    std::process::exit(exit_code as i32);
}

fn run_init(force: bool) -> ExitCode {
    match write_default_config(force) {
        Ok(path) => {
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    THEME.apply(&THEME.path, path.display())
                ))
            );
            println!("Edit this file to point at your index and metadata files.");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::ConfigError
        }
    }
}

fn write_default_config(force: bool) -> anyhow::Result<PathBuf> {
    let dir = std::env::current_dir().context("Cannot read current directory")?;
    Settings::init_config_file(&dir, force).map_err(|e| anyhow!("{e}"))
}

fn run_config(settings: &Settings) -> ExitCode {
    let rendered = toml::to_string_pretty(settings).context("Error displaying config");
    match rendered {
        Ok(toml_str) => {
            println!("{}", THEME.apply(&THEME.header, "Current Configuration:"));
            println!("{}", THEME.apply(&THEME.dim, "=".repeat(50)));
            println!("{toml_str}");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::ConfigError
        }
    }
}

fn load_retriever(settings: &Settings, output: &mut OutputManager) -> Result<Retriever, ExitCode> {
    Retriever::from_settings(settings).map_err(|e| report(output, &e))
}

fn report(output: &mut OutputManager, error: &RetrievalError) -> ExitCode {
    output
        .error(error)
        .unwrap_or_else(|_| ExitCode::from_error(error))
}

fn run_info(settings: &Settings, json: bool) -> ExitCode {
    let mut output = OutputManager::new(OutputFormat::from_flags(json, false));
    let retriever = match load_retriever(settings, &mut output) {
        Ok(retriever) => retriever,
        Err(code) => return code,
    };
    let info = retriever.info();

    if json {
        return output.success(info).unwrap_or(ExitCode::GeneralError);
    }

    println!(
        "{}",
        create_info_table(
            &info,
            &settings.index_path().display().to_string(),
            &settings.metadata_path().display().to_string(),
        )
    );
    ExitCode::Success
}

async fn run_retrieve(
    settings: &Settings,
    query: String,
    top_k: usize,
    format: OutputFormat,
    table: bool,
) -> ExitCode {
    let mut output = OutputManager::new(format);
    let retriever = match load_retriever(settings, &mut output) {
        Ok(retriever) => Arc::new(retriever),
        Err(code) => return code,
    };

    let started = Instant::now();
    let result = match settings.retrieval.timeout_ms {
        0 => retriever.retrieve(&query, top_k),
        millis => {
            retriever
                .retrieve_with_timeout(query.clone(), top_k, Duration::from_millis(millis))
                .await
        }
    };
    let elapsed = started.elapsed();

    match result {
        Ok(results) if table && !results.is_empty() => {
            println!("{}", create_results_table(&results));
            println!(
                "{}",
                THEME.apply(
                    &THEME.dim,
                    format!("{} results in {}ms", results.len(), elapsed.as_millis())
                )
            );
            ExitCode::Success
        }
        Ok(results) => output
            .results(&query, &results, elapsed)
            .unwrap_or(ExitCode::GeneralError),
        Err(e) => report(&mut output, &e),
    }
}
