//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;
use wordy_core::compiler::DocumentCompiler;
use wordy_core::generation::ChatCompletionsClient;
use wordy_core::pipeline::{
    AnalysisConfig, Collaborators, PipelineState, ProgressReporter, RunReport, run_analysis,
};
use wordy_discovery::HtmlSearch;
use wordy_shared::{AppConfig, init_config, load_config, validate_api_key};

use crate::chart::TerminalChart;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Wordy — compare your site's wording against search competitors.
#[derive(Parser)]
#[command(
    name = "wordy",
    version,
    about = "Compare your website's content against the top search results for a keyword and compile an SEO report.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Your website URL (prompted for when omitted).
    pub url: Option<String>,

    /// Search keyword used to find competitors (prompted for when omitted).
    pub keyword: Option<String>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "wordy=info",
        1 => "wordy=debug",
        _ => "wordy=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
        None => cmd_analyze(cli.url, cli.keyword).await,
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_analyze(url: Option<String>, keyword: Option<String>) -> Result<()> {
    // Fail on a missing key before asking anything
    let config = load_config()?;
    validate_api_key(&config.generation)?;

    let url = match url {
        Some(url) => url,
        None => ask("Enter your website URL: ")?,
    };
    let keyword = match keyword {
        Some(keyword) => keyword,
        None => ask("Enter the keyword to search for: ")?,
    };

    let own_url = url.trim();
    Url::parse(own_url).map_err(|e| eyre!("invalid URL '{own_url}': {e}"))?;

    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(eyre!("search keyword must not be empty"));
    }

    let cwd =
        std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    let analysis = AnalysisConfig {
        own_url: own_url.to_string(),
        keyword: keyword.to_string(),
        result_count: config.defaults.result_count,
        fetch_timeout_secs: config.defaults.fetch_timeout_secs,
        fetch_concurrency: config.defaults.fetch_concurrency,
        output_path: cwd.join(&config.defaults.output_file),
    };

    let search =
        HtmlSearch::with_timeout(&config.search.endpoint, config.defaults.fetch_timeout_secs)?;
    let generator = ChatCompletionsClient::new(&config.generation)?;
    let compiler = DocumentCompiler::new(config.compiler.clone());

    info!(
        url = own_url,
        keyword,
        model = %config.generation.model,
        "comparing against search competitors"
    );

    let reporter = CliProgress::new();
    let chart = TerminalChart::new(reporter.spinner.clone());
    let collaborators = Collaborators {
        search: &search,
        generator: &generator,
        renderer: &chart,
        compiler: &compiler,
    };

    let report = run_analysis(&analysis, &collaborators, &reporter).await?;

    // Print summary
    let stats = report.competitors;
    println!();
    println!("  SEO report compiled successfully!");
    println!("  Output:      {}", report.artifact.display());
    println!(
        "  Competitors: {} fetched, {} failed, {} skipped (of {} found)",
        stats.fetched, stats.failed, stats.skipped, stats.discovered
    );
    println!(
        "  Words:       {} distinct ({} on your site)",
        report.combined_table.len(),
        report.own_table.len()
    );
    if let Some(reason) = &report.own_failure {
        println!("  Warning:     your site produced no text ({reason})");
    }
    println!("  Time:        {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Prompt on stdout and read one trimmed line from stdin.
fn ask(question: &str) -> Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{question}")?;
    stdout.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(eyre!("no input provided"));
    }
    Ok(line.trim().to_string())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, state: PipelineState) {
        let message = match state {
            PipelineState::CollectSelf => "Fetching your website",
            PipelineState::DiscoverCompetitors => "Searching for competitors",
            PipelineState::FetchCompetitors => "Fetching competitor pages",
            PipelineState::Aggregate => "Counting words",
            PipelineState::BuildPrompt => "Building analysis prompt",
            PipelineState::Generate => "Generating report",
            PipelineState::Compile => "Compiling report",
            PipelineState::Done | PipelineState::Failed => {
                self.spinner.finish_and_clear();
                return;
            }
        };
        self.spinner.set_message(message);
    }

    fn source_fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path: PathBuf = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
