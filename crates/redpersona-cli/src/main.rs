use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use redpersona_application::{ActivityInput, PersonaService, RunSummary};
use redpersona_core::PersonaError;
use redpersona_core::config::ConfigRoot;
use redpersona_infrastructure::ConfigStorage;
use redpersona_interaction::{OpenAIApiAgent, RedditJsonSource};

mod logging;
mod progress;

const EXIT_FAILURE: u8 = 1;
const EXIT_MALFORMED_EVIDENCE: u8 = 3;
const EXIT_REPORT_UNAVAILABLE: u8 = 4;
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "redpersona")]
#[command(version, about = "Generate a citation-linked persona from a Reddit user's public activity", long_about = None)]
struct Cli {
    /// Reddit profile URL (e.g. https://www.reddit.com/user/kojied/)
    #[arg(long, conflicts_with = "input", required_unless_present_any = ["input", "init_config"])]
    url: Option<String>,

    /// Analyze a saved activity dump instead of fetching
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Maximum number of posts to fetch
    #[arg(long)]
    max_posts: Option<usize>,

    /// Maximum number of comments to fetch
    #[arg(long)]
    max_comments: Option<usize>,

    /// Directory for the generated files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Leave the citations list out of the text report
    #[arg(long)]
    no_citations: bool,

    /// Also save the fetched activity as a JSON dump
    #[arg(long)]
    save_raw: bool,

    /// Deadline in seconds for analyzing all categories
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Show per-category progress and info logs
    #[arg(short, long)]
    verbose: bool,

    /// Show debug logs
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn config_storage(&self) -> Result<ConfigStorage> {
        match &self.config {
            Some(path) => Ok(ConfigStorage::with_path(path.clone())),
            None => Ok(ConfigStorage::new()?),
        }
    }

    fn apply_overrides(&self, config: &mut ConfigRoot) {
        if let Some(max_posts) = self.max_posts {
            config.fetch.max_posts = max_posts;
        }
        if let Some(max_comments) = self.max_comments {
            config.fetch.max_comments = max_comments;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.no_citations {
            config.output.include_citations = false;
        }
        if self.save_raw {
            config.output.save_raw = true;
        }
        if let Some(secs) = self.timeout {
            config.pipeline.run_timeout_secs = Some(secs);
        }
    }

    fn input(&self) -> Option<ActivityInput> {
        match (&self.url, &self.input) {
            (Some(url), _) => Some(ActivityInput::ProfileUrl(url.clone())),
            (None, Some(path)) => Some(ActivityInput::Dump(path.clone())),
            (None, None) => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (_log_guard, events) = logging::init(cli.verbose, cli.debug)?;

    let storage = cli.config_storage()?;
    if cli.init_config {
        if storage.ensure_exists()? {
            println!("Wrote default configuration to {}", storage.path().display());
        } else {
            println!("Configuration already exists at {}", storage.path().display());
        }
        return Ok(());
    }

    let mut config = storage
        .load()
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;
    cli.apply_overrides(&mut config);

    let input = cli
        .input()
        .context("Either --url or --input is required")?;

    let mut agent = OpenAIApiAgent::try_from_env()?;
    if let Some(model) = &cli.model {
        agent = agent.with_model(model.clone());
    }
    tracing::info!(model = agent.model(), "Using OpenAI agent");

    let source = RedditJsonSource::new(config.fetch.user_agent.clone());
    let service = PersonaService::new(Arc::new(source), Arc::new(agent), config);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, cancelling the run...".yellow());
            interrupt.cancel();
        }
    });

    let printing_done = CancellationToken::new();
    let printer = cli
        .verbose
        .then(|| progress::spawn_printer(events, printing_done.clone()));

    println!("{}", "Generating persona...".bold());
    let started = Instant::now();
    let summary = service.run(&input, cancel).await;

    printing_done.cancel();
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    print_summary(&summary?, started);
    Ok(())
}

fn print_summary(summary: &RunSummary, started: Instant) {
    println!();
    println!("{}", "Persona generated successfully!".green().bold());
    println!("  User:              u/{}", summary.username);
    println!("  Posts analyzed:    {}", summary.posts_analyzed);
    println!("  Comments analyzed: {}", summary.comments_analyzed);
    if summary.records_dropped > 0 {
        println!("  Records dropped:   {}", summary.records_dropped);
    }
    println!("  Citations:         {}", summary.citations);
    println!("  Elapsed:           {:.1}s", started.elapsed().as_secs_f64());

    if !summary.degraded.is_empty() {
        let names: Vec<String> = summary.degraded.iter().map(|c| c.name()).collect();
        println!(
            "  {} {}",
            "Degraded:".yellow(),
            names.join(", ").yellow()
        );
    }

    println!();
    println!("  Report: {}", summary.text_path.display());
    println!("  JSON:   {}", summary.json_path.display());
    if let Some(raw) = &summary.raw_path {
        println!("  Raw:    {}", raw.display());
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PersonaError>() {
        Some(PersonaError::MalformedEvidence { .. }) => EXIT_MALFORMED_EVIDENCE,
        Some(PersonaError::ReportUnavailable { .. }) => EXIT_REPORT_UNAVAILABLE,
        Some(PersonaError::Cancelled) => EXIT_CANCELLED,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = Cli::parse_from([
            "redpersona",
            "--url",
            "https://www.reddit.com/user/kojied/",
            "--max-posts",
            "25",
            "--no-citations",
            "--timeout",
            "90",
        ]);
        let mut config = ConfigRoot::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.fetch.max_posts, 25);
        assert_eq!(config.fetch.max_comments, 15);
        assert!(!config.output.include_citations);
        assert_eq!(config.pipeline.run_timeout_secs, Some(90));
        assert_eq!(
            cli.input(),
            Some(ActivityInput::ProfileUrl(
                "https://www.reddit.com/user/kojied/".into()
            ))
        );
    }

    #[test]
    fn test_url_and_input_conflict() {
        let result = Cli::try_parse_from([
            "redpersona",
            "--url",
            "https://www.reddit.com/user/kojied/",
            "--input",
            "dump.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["redpersona"]).is_err());
        assert!(Cli::try_parse_from(["redpersona", "--init-config"]).is_ok());
    }

    #[test]
    fn test_exit_codes() {
        let unavailable = anyhow::Error::new(PersonaError::ReportUnavailable { degraded: 6 });
        assert_eq!(exit_code(&unavailable), EXIT_REPORT_UNAVAILABLE);

        let malformed = anyhow::Error::new(PersonaError::MalformedEvidence { dropped: 2 })
            .context("Failed to generate persona");
        assert_eq!(exit_code(&malformed), EXIT_MALFORMED_EVIDENCE);

        assert_eq!(exit_code(&anyhow::anyhow!("network down")), EXIT_FAILURE);
    }
}
