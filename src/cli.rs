//! CLI parsing and orchestration. Parses args, sets up logging, cache and client,
//! runs the crawl, prints the status summary. Maps errors to exit codes.

use crate::config;
use crate::reconcile::{crawl, CrawlOptions};
use crate::scraper::{
    PageFetcher, PoliteClient, ResponseCache, ScraperError, DEFAULT_DELAY_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::tally::StatusCounts;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_INDEX_URL: &str = "https://peps.python.org/";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Interrupted; counts above cover only the PEPs processed before the interrupt.")]
    Cancelled,
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(_) => 2,
            CliRunError::Output(_) => 3,
            CliRunError::Cancelled => 130,
        }
    }
}

/// Summary format on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "pepcheck")]
#[command(
    about = "Check PEP index status markers against each PEP page and count PEPs per status"
)]
#[command(
    after_help = "Config file keys (index_url, user_agent, request_delay_ms, timeout_secs, cache_dir, no_cache, log_file) are read from ./pepcheck.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// PEP index URL (overrides config; default https://peps.python.org/).
    #[arg(long)]
    pub index_url: Option<String>,

    /// Summary format: text or json.
    #[arg(long, default_value = "text", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Only log warnings and errors; no progress bar.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log debug detail (cache hits, pages without status).
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,

    /// Empty the response cache before crawling.
    #[arg(short, long)]
    pub clear_cache: bool,

    /// Do not read or write the response cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Response cache directory (overrides config).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay between network requests in milliseconds (overrides config; default 250).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also append log lines to this file (overrides config).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "text" | "txt" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use text or json.",
            s
        )),
    }
}

/// Default filter directive: our crate at the requested level, everything else at warn.
fn log_directive(args: &Args) -> String {
    let level = if args.debug {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    format!("warn,pepcheck={}", level)
}

/// Stderr for log lines. Clears the progress bar around each write so lines don't
/// land on top of it.
#[derive(Clone, Default)]
struct BarAwareStderr {
    bar: Option<ProgressBar>,
}

impl Write for BarAwareStderr {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.bar {
            Some(bar) => bar.suspend(|| std::io::stderr().write(buf)),
            None => std::io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}

/// Install the global subscriber: stderr, plus an append-only file when `log_file` is set.
/// RUST_LOG overrides the level flags.
fn init_logging(
    args: &Args,
    log_file: Option<&Path>,
    bar: Option<ProgressBar>,
) -> Result<(), CliRunError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(args)));
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        CliRunError::InvalidInput(format!(
                            "Cannot create log directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    CliRunError::InvalidInput(format!(
                        "Cannot open log file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };
    let stderr = BarAwareStderr { bar };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(move || stderr.clone()))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliRunError::InvalidInput(format!("Cannot initialise logging: {}", e)))
}

/// Set `flag` on the first signal; call `force_quit` on the second.
async fn watch_interrupts<S, F>(mut next_signal: S, flag: &AtomicBool, force_quit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        return;
    }
    warn!("interrupt received; stopping after the current PEP (Ctrl-C again to quit now)");
    flag.store(true, Ordering::SeqCst);
    if next_signal().await.is_ok() {
        warn!("second interrupt; quitting without a summary");
        force_quit();
    }
}

/// First Ctrl-C sets `flag` (the crawl checks it between PEPs); a second one exits 130.
fn install_interrupt_handler(flag: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "cannot install Ctrl-C handler");
                return;
            }
        };
        runtime.block_on(watch_interrupts(tokio::signal::ctrl_c, &flag, || {
            std::process::exit(130);
        }));
    });
}

/// Bar sized once the index is parsed. `None` when quiet.
fn progress_bar(quiet: bool) -> Result<Option<ProgressBar>, CliRunError> {
    if quiet {
        return Ok(None);
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            .map_err(|e| CliRunError::InvalidInput(format!("Bad progress template: {}", e)))?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    bar.set_message("Fetching PEP index");
    Ok(Some(bar))
}

fn report_progress(bar: &ProgressBar, done: u32, total: u32) {
    bar.set_length(total as u64);
    bar.set_position(done as u64);
    bar.set_message("Checking PEPs");
}

/// Write the summary in the chosen format.
pub fn write_summary<W: Write>(
    out: &mut W,
    counts: &StatusCounts,
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, counts)?;
            writeln!(out)
        }
        OutputFormat::Text => {
            let width = counts
                .iter()
                .map(|(k, _)| k.len())
                .max()
                .unwrap_or(0)
                .max("Status".len());
            writeln!(out, "{:<width$}  {:>6}", "Status", "Count", width = width)?;
            for (status, count) in counts.iter() {
                writeln!(out, "{:<width$}  {:>6}", status, count, width = width)?;
            }
            Ok(())
        }
    }
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.log_file.clone()));
    let bar = progress_bar(args.quiet)?;
    init_logging(args, log_file.as_deref(), bar.clone())?;
    info!(?args, "pepcheck started");

    let index_url = args
        .index_url
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.index_url.clone()))
        .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());
    let delay_ms = args
        .delay
        .or_else(|| config.as_ref().and_then(|c| c.request_delay_ms))
        .unwrap_or(DEFAULT_DELAY_MS);
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));
    let no_cache = args.no_cache || config.as_ref().and_then(|c| c.no_cache).unwrap_or(false);

    let mut builder = PoliteClient::builder()
        .delay_ms(delay_ms)
        .timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let client = builder
        .build()
        .map_err(|e| CliRunError::Scraper(ScraperError::ClientBuild { source: e }))?;

    let cache = if no_cache {
        None
    } else {
        let dir = args
            .cache_dir
            .clone()
            .or_else(|| config.as_ref().and_then(|c| c.cache_dir.clone()))
            .or_else(ResponseCache::default_dir)
            .ok_or_else(|| {
                CliRunError::InvalidInput(
                    "No cache directory available on this platform. Use --cache-dir or --no-cache."
                        .to_string(),
                )
            })?;
        let cache = ResponseCache::open(dir)?;
        if args.clear_cache {
            let removed = cache.clear()?;
            info!(removed, dir = %cache.dir().display(), "response cache cleared");
        }
        Some(cache)
    };
    let mut fetcher = PageFetcher::new(client, cache);

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&cancel));

    if let Some(bar) = &bar {
        bar.enable_steady_tick(Duration::from_millis(80));
    }
    let progress_cb = |done: u32, total: u32| {
        if let Some(bar) = &bar {
            report_progress(bar, done, total);
        }
    };
    let options = CrawlOptions {
        progress: Some(&progress_cb),
        cancel: Some(&*cancel),
    };

    let result = crawl(&mut fetcher, &index_url, &options);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let report = result?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, &report.counts, args.format)?;
    out.flush()?;

    if report.cancelled {
        return Err(CliRunError::Cancelled);
    }
    info!("pepcheck finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::StatusTally;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["pepcheck"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn sample_counts() -> StatusCounts {
        let mut tally = StatusTally::new();
        tally.increment("Final");
        tally.increment("Final");
        tally.increment("Accepted");
        tally.finish()
    }

    #[test]
    fn parse_format_all() {
        assert_eq!(parse_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_format("txt").unwrap(), OutputFormat::Text);
        assert_eq!(parse_format("json").unwrap(), OutputFormat::Json);
        assert_eq!(parse_format("JSON").unwrap(), OutputFormat::Json);
    }

    #[test]
    fn parse_format_invalid() {
        assert!(parse_format("csv").is_err());
    }

    #[test]
    fn args_defaults() {
        let a = args(&[]);
        assert_eq!(a.format, OutputFormat::Text);
        assert!(a.index_url.is_none());
        assert!(!a.clear_cache);
        assert!(!a.no_cache);
    }

    #[test]
    fn args_flags() {
        let a = args(&[
            "-c",
            "--format",
            "json",
            "--delay",
            "0",
            "--index-url",
            "http://localhost/",
        ]);
        assert!(a.clear_cache);
        assert_eq!(a.format, OutputFormat::Json);
        assert_eq!(a.delay, Some(0));
        assert_eq!(a.index_url.as_deref(), Some("http://localhost/"));
    }

    #[test]
    fn quiet_and_debug_conflict() {
        assert!(Args::try_parse_from(["pepcheck", "--quiet", "--debug"]).is_err());
    }

    #[test]
    fn log_directive_follows_flags() {
        assert_eq!(log_directive(&args(&[])), "warn,pepcheck=info");
        assert_eq!(log_directive(&args(&["-q"])), "warn,pepcheck=warn");
        assert_eq!(log_directive(&args(&["--debug"])), "warn,pepcheck=debug");
    }

    #[test]
    fn text_summary_lists_every_status_then_total() -> std::io::Result<()> {
        let mut buf = Vec::new();
        write_summary(&mut buf, &sample_counts(), OutputFormat::Text)?;
        let text = String::from_utf8_lossy(&buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("Status"));
        assert!(lines[1].starts_with("Active"));
        assert!(lines.iter().any(|l| l.starts_with("Final") && l.ends_with(" 2")));
        assert!(lines[10].starts_with("Total") && lines[10].ends_with(" 3"));
        Ok(())
    }

    #[test]
    fn json_summary_is_an_object_with_total() -> Result<(), Box<dyn std::error::Error>> {
        let mut buf = Vec::new();
        write_summary(&mut buf, &sample_counts(), OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_slice(&buf)?;
        assert_eq!(value["Final"].as_u64(), Some(2));
        assert_eq!(value["Accepted"].as_u64(), Some(1));
        assert_eq!(value["Draft"].as_u64(), Some(0));
        assert_eq!(value["Total"].as_u64(), Some(3));
        Ok(())
    }

    #[test]
    fn quiet_run_has_no_progress_bar() -> Result<(), CliRunError> {
        assert!(progress_bar(true)?.is_none());
        assert!(progress_bar(false)?.is_some());
        Ok(())
    }

    #[test]
    fn progress_sizes_bar_from_row_total() {
        let bar = ProgressBar::hidden();
        report_progress(&bar, 0, 12);
        assert_eq!(bar.length(), Some(12));
        assert_eq!(bar.position(), 0);
        report_progress(&bar, 5, 12);
        assert_eq!(bar.position(), 5);
    }

    #[test]
    fn log_writes_pass_through_an_active_bar() -> std::io::Result<()> {
        let bar = ProgressBar::hidden();
        bar.set_length(3);
        bar.set_position(1);
        let mut stderr = BarAwareStderr { bar: Some(bar.clone()) };
        assert_eq!(stderr.write(b"")?, 0);
        stderr.flush()?;
        assert_eq!(bar.position(), 1);
        assert!(!bar.is_finished());
        let mut plain = BarAwareStderr::default();
        assert_eq!(plain.write(b"")?, 0);
        Ok(())
    }

    fn run_watch<S, F>(next_signal: S) -> std::io::Result<(bool, bool)>
    where
        S: FnMut() -> F,
        F: Future<Output = std::io::Result<()>>,
    {
        let flag = AtomicBool::new(false);
        let quit = std::cell::Cell::new(false);
        tokio::runtime::Builder::new_current_thread()
            .build()?
            .block_on(watch_interrupts(next_signal, &flag, || quit.set(true)));
        Ok((flag.load(Ordering::SeqCst), quit.get()))
    }

    fn signal_closed() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "signal stream closed")
    }

    #[test]
    fn second_interrupt_forces_quit() -> std::io::Result<()> {
        let (cancelled, quit) = run_watch(|| std::future::ready(Ok(())))?;
        assert!(cancelled);
        assert!(quit);
        Ok(())
    }

    #[test]
    fn single_interrupt_only_sets_flag() -> std::io::Result<()> {
        let mut calls = 0;
        let (cancelled, quit) = run_watch(move || {
            calls += 1;
            std::future::ready(if calls == 1 { Ok(()) } else { Err(signal_closed()) })
        })?;
        assert!(cancelled);
        assert!(!quit);
        Ok(())
    }

    #[test]
    fn failed_signal_listener_changes_nothing() -> std::io::Result<()> {
        let (cancelled, quit) = run_watch(|| std::future::ready(Err(signal_closed())))?;
        assert!(!cancelled);
        assert!(!quit);
        Ok(())
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(
            CliRunError::Scraper(ScraperError::IndexUnavailable { url: "x".into() }).exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Output(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "x"))
                .exit_code(),
            3
        );
        assert_eq!(CliRunError::Cancelled.exit_code(), 130);
    }
}
