//! smugline - command line tool for SmugMug
//!
//! Uploads folders and manifests to albums, downloads albums, and clears
//! duplicate images, comparing content by MD5.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use smugline::{Cli, Command, Config, FileResult, Processor, ProcessingStatus, SmugMugClient};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli_output {
    //! Colored terminal output

    use crossterm::QueueableCommand;
    use crossterm::style::{Color, Print, PrintStyledContent, Stylize};
    use std::io::{Write, stdout};

    pub const OK: Color = Color::Green;
    pub const WARN: Color = Color::Yellow;
    pub const FAIL: Color = Color::Red;
    pub const DIM: Color = Color::DarkGrey;
    pub const NOTE: Color = Color::Cyan;

    enum Part<'a> {
        Plain(&'a str),
        Colored(&'a str, Color),
        Bold(&'a str, Color),
    }

    fn emit(parts: &[Part<'_>]) {
        let mut out = stdout();
        for part in parts {
            let _ = match *part {
                Part::Plain(text) => out.queue(Print(text)),
                Part::Colored(text, color) => out.queue(PrintStyledContent(text.with(color))),
                Part::Bold(text, color) => out.queue(PrintStyledContent(text.with(color).bold())),
            };
        }
        let _ = out.queue(Print("\n"));
        let _ = out.flush();
    }

    pub fn rule() {
        emit(&[Part::Colored(&"─".repeat(60), DIM)]);
    }

    pub fn heading(text: &str) {
        emit(&[Part::Bold(text, Color::Reset)]);
    }

    pub fn line(text: &str) {
        emit(&[Part::Plain("  "), Part::Plain(text)]);
    }

    pub fn warning(text: &str) {
        emit(&[Part::Bold("⚠ ", WARN), Part::Plain(text)]);
    }

    pub fn failure(text: &str) {
        emit(&[Part::Bold("✗ ", FAIL), Part::Plain(text)]);
    }

    pub fn counter(label: &str, value: usize, color: Color) {
        let value = value.to_string();
        emit(&[
            Part::Plain("  "),
            Part::Colored(label, DIM),
            Part::Plain(": "),
            Part::Bold(&value, color),
        ]);
    }

    pub fn item(icon: &str, color: Color, source: &str, detail: &str) {
        emit(&[
            Part::Plain("  "),
            Part::Bold(icon, color),
            Part::Plain(" "),
            Part::Plain(source),
            Part::Plain(" "),
            Part::Colored(detail, DIM),
        ]);
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!(error = %e, "Command failed");
        cli_output::failure(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.command.needs_session() {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = load_config(cli)?;

    let log_path = get_log_path(&config, cli);
    let _guard = setup_logging(cli, &config, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "smugline starting");
    debug!(
        api_url = %config.api_url,
        upload_attempts = config.upload_attempts,
        dry_run = config.dry_run,
        "Configuration loaded"
    );

    let Some(api_key) = config.api_key.clone() else {
        anyhow::bail!(
            "An API key is required (--api-key, SMUGLINE_API_KEY or api_key in the config file)"
        );
    };

    let client = SmugMugClient::new(api_key, &config)?;
    let (email, password) = credentials(cli, &config)?;
    let mut processor = Processor::login(&client, &email, &password, &config)?;

    match &cli.command {
        Command::Upload {
            album_name,
            from,
            media,
            privacy,
        } => {
            let results = processor.upload_folder(from, album_name, *media, *privacy)?;
            report(&processor, &results, &config, &log_path);
        }
        Command::Download {
            album_name,
            to,
            media,
        } => {
            let results = processor.download_album(album_name, to, *media)?;
            report(&processor, &results, &config, &log_path);
        }
        Command::Process { manifest, from } => {
            let results = processor.process_manifest(manifest, from)?;
            report(&processor, &results, &config, &log_path);
        }
        Command::List => {
            cli_output::heading("available albums:");
            for title in processor.list_albums()? {
                cli_output::line(&title);
            }
        }
        Command::Create {
            album_name,
            privacy,
        } => {
            // the resolver reports the created album and its URL
            if processor.create_album(album_name, *privacy)?.is_none() {
                cli_output::warning("Dry run: no album was created");
            }
        }
        Command::ClearDuplicates { album_name } => {
            let results = processor.clear_duplicates(album_name)?;
            report(&processor, &results, &config, &log_path);
        }
        // printed before login
        Command::SampleConfig => {}
    }

    Ok(())
}

/// Print counters, per-item lines in verbose mode, and every failure
fn report(processor: &Processor<'_>, results: &[FileResult], config: &Config, log_path: &Path) {
    use cli_output::*;

    let stats = processor.stats();

    rule();
    heading("Done");
    counter("Uploaded", stats.uploaded, OK);
    counter("Downloaded", stats.downloaded, OK);
    counter("Duplicates", stats.duplicates, NOTE);
    counter("Skipped", stats.skipped, WARN);
    counter("Deleted", stats.deleted, NOTE);
    counter("Failed", stats.failed, FAIL);
    if config.dry_run {
        counter("Planned", stats.planned, NOTE);
    }

    if config.verbose {
        rule();
        for result in results {
            let target = result.target.as_deref().unwrap_or_default();
            let reason = result.error.as_deref();
            let (icon, color, detail) = match result.status {
                ProcessingStatus::Uploaded | ProcessingStatus::Downloaded => {
                    ("✓", OK, format!("→ {}", target))
                }
                ProcessingStatus::Duplicate => ("≡", NOTE, format!("already in {}", target)),
                ProcessingStatus::Deleted => ("−", NOTE, format!("removed from {}", target)),
                ProcessingStatus::Skipped => {
                    ("⊘", WARN, reason.unwrap_or("exists locally").to_string())
                }
                ProcessingStatus::Failed => {
                    ("✗", FAIL, reason.unwrap_or("unknown error").to_string())
                }
                ProcessingStatus::DryRun => ("~", NOTE, format!("would go to {}", target)),
            };
            item(icon, color, &result.source, &detail);
        }
    }

    let failed: Vec<&FileResult> = results
        .iter()
        .filter(|r| r.status == ProcessingStatus::Failed)
        .collect();
    if !failed.is_empty() {
        rule();
        failure(&format!("{} item(s) failed", failed.len()));
        for result in failed {
            let reason = result.error.as_deref().unwrap_or("unknown error");
            line(&format!("{}: {}", result.source, reason));
        }
    }

    if config.dry_run {
        rule();
        warning("Dry run: nothing was changed");
    }

    rule();
    line(&format!("Log file: {}", log_path.display()));
    info!(log_file = %log_path.display(), "{}", stats.summary());
}

/// Take credentials from flags or config, prompting for what is missing
fn credentials(cli: &Cli, config: &Config) -> Result<(String, String)> {
    let email = match config.email.clone() {
        Some(email) => email,
        None => {
            print!("Email address: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    let password = match cli.password.clone() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    Ok((email, password))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(config: &Config, cli: &Cli) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    match cli.config_name() {
        Some(config_name) => config
            .log_dir
            .join(&config_name)
            .join(format!("{}_{}.log", config_name, timestamp)),
        None => config.log_dir.join(format!("smugline_{}.log", timestamp)),
    }
}

/// Find the config file a `--config` argument refers to
///
/// `-C trip` tries `trip`, `trip.toml`, then `Config/trip.toml` next to
/// the executable.
fn resolve_config_path(config_path: &Path) -> PathBuf {
    let mut candidates = vec![config_path.to_path_buf()];
    if config_path.extension().is_none() {
        candidates.push(config_path.with_extension("toml"));
    }
    if let Ok(exe) = std::env::current_exe()
        && let (Some(dir), Some(name)) = (exe.parent(), config_path.file_name())
    {
        let beside_exe = dir.join("Config").join(name);
        candidates.push(match beside_exe.extension() {
            Some(_) => beside_exe,
            None => beside_exe.with_extension("toml"),
        });
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| config_path.to_path_buf())
}

/// Build the effective configuration; flags win over the file
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            let path = resolve_config_path(path);
            cli.merge_with_config(Config::load_from_file(&path)?)
        }
        None => cli.to_config(),
    };

    config.validate()?;
    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, config: &Config, log_path: &Path) -> Result<WorkerGuard> {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("reqwest=warn".parse()?);

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}
