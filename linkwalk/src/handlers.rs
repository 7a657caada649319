use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkwalk_core::data::Database;
use linkwalk_core::map::{self, ExportFormat};
use linkwalk_core::navigator::Population;
use linkwalk_core::{Navigator, Registry, Selection, Snapshot, Step};
use linkwalk_scanner::resolve::is_fetchable;
use linkwalk_scanner::{Fetcher, HttpFetcher};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::commands::DEFAULT_SEED;

/// Everything `walk` needs, pulled out of the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkConfig {
    pub seed: String,
    pub db_path: Option<PathBuf>,
    pub resume: bool,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
    pub export: Option<(PathBuf, ExportFormat)>,
}

impl WalkConfig {
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let raw_seed = args
            .get_one::<String>("URL")
            .map(String::as_str)
            .unwrap_or(DEFAULT_SEED);
        let seed = parse_url_line(raw_seed)
            .with_context(|| format!("'{}' is not a usable URL", raw_seed))?;

        let format = args
            .get_one::<String>("format")
            .and_then(|f| ExportFormat::from_str(f))
            .unwrap_or(ExportFormat::Dot);

        Ok(Self {
            seed,
            db_path: args.get_one::<String>("db").map(|p| expand_path(p)),
            resume: args.get_flag("resume"),
            timeout_secs: args.get_one::<u64>("timeout").copied().unwrap_or(10),
            max_redirects: args.get_one::<usize>("max-redirects").copied().unwrap_or(5),
            user_agent: args.get_one::<String>("user-agent").cloned(),
            export: args
                .get_one::<PathBuf>("export")
                .map(|path| (path.clone(), format)),
        })
    }
}

/// A walk being recorded to the database.
pub struct Session {
    db: Database,
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn save(&self, registry: &Registry) -> Result<()> {
        self.db
            .save_registry(&self.id, registry)
            .with_context(|| format!("Failed to save session {}", self.id))
    }
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is. `host:8080` parses with `host` as the scheme,
    // so a scheme followed by a port number is treated as scheme-less.
    if let Ok(url) = Url::parse(line) {
        let after_scheme = line.get(url.scheme().len() + 1..).unwrap_or_default();
        let looks_like_port = after_scheme.starts_with(|c: char| c.is_ascii_digit());
        if is_fetchable(&url) || !looks_like_port {
            return Some(line.to_string());
        }
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Open (or create) the database, making its directory first if needed.
pub fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Database::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn print_divider<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "{}", "═".repeat(60).bright_blue().bold())
}

/// The current page as shown at the prompt.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let title = snapshot
        .title
        .as_deref()
        .map(|t| format!("\"{}\"", t))
        .unwrap_or_else(|| "(untitled)".to_string());
    out.push_str(&format!(
        "{} {} {}\n",
        "On site:".bright_white().bold(),
        snapshot.url.bright_white(),
        title.bright_green()
    ));

    if snapshot.partial {
        out.push_str(&format!(
            "  {} page was cut off, links may be missing\n",
            "⚠".yellow()
        ));
    }

    for url in &snapshot.linked_from {
        out.push_str(&format!("{} {}\n", "Linked from:".blue(), url));
    }

    if snapshot.linked_to.is_empty() {
        out.push_str(&format!("  {}\n", "(no outbound links)".dimmed()));
    }
    for (i, url) in snapshot.linked_to.iter().enumerate() {
        out.push_str(&format!("{:>4} ) {}\n", i.to_string().cyan(), url));
    }

    out
}

/// A line worth telling the user about how the page got populated.
pub fn describe_population(population: &Population) -> Option<String> {
    match population {
        Population::Cached => None,
        Population::Complete(extraction) => Some(format!(
            "{} {} links, {} new pages",
            "✓".green().bold(),
            extraction.anchors,
            extraction.pages_discovered
        )),
        Population::Partial(reason) => Some(format!(
            "{} Page only partly read: {}",
            "⚠".yellow().bold(),
            reason
        )),
    }
}

fn fetch_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

/// Show the current page, read a selection, move. Repeat until the user
/// quits or input runs out.
pub async fn repl<F, R, W>(
    navigator: &mut Navigator<F>,
    mut input: R,
    mut output: W,
    session: Option<&Session>,
) -> Result<()>
where
    F: Fetcher,
    R: BufRead,
    W: Write,
{
    loop {
        if let Some(snapshot) = navigator.snapshot() {
            print_divider(&mut output)?;
            write!(output, "{}", render_snapshot(&snapshot))?;
        }
        write!(output, "{} ", "Enter a number (q to quit):".bright_cyan().bold())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        let selection = match Selection::parse(&line) {
            Ok(selection) => selection,
            Err(e) => {
                writeln!(output, "{} {}, try again", "✗".red().bold(), e)?;
                continue;
            }
        };

        let spinner = match selection {
            Selection::Index(index)
                if usize::try_from(index).is_ok_and(|i| navigator.would_fetch(i)) =>
            {
                Some(fetch_spinner("Fetching..."))
            }
            _ => None,
        };
        let result = navigator.apply(selection).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Ok(Step::Quit) => return Ok(()),
            Ok(Step::Moved { population, .. }) => {
                if let Some(note) = describe_population(&population) {
                    writeln!(output, "{}", note)?;
                }
                if let Some(session) = session {
                    session.save(navigator.registry())?;
                }
            }
            Err(e) if e.is_user_error() => {
                writeln!(output, "{} {}", "✗".red().bold(), e)?;
            }
            Err(e) => {
                writeln!(output, "{} {}", "✗".red().bold(), e)?;
                writeln!(output, "{} Pick another link", "→".yellow())?;
            }
        }
    }
}

pub async fn handle_walk(args: &ArgMatches, quiet: bool) -> Result<()> {
    let config = WalkConfig::from_matches(args)?;

    let mut fetcher =
        HttpFetcher::with_timeout(config.timeout_secs)?.with_max_redirects(config.max_redirects)?;
    if let Some(ref agent) = config.user_agent {
        fetcher = fetcher.with_user_agent(agent.clone())?;
    }

    let mut seed = config.seed.clone();
    let mut registry = Registry::new();
    let mut resumed = false;

    let session = match config.db_path {
        Some(ref path) => {
            let db = open_database(path)?;
            let previous = if config.resume {
                db.latest_session()?
            } else {
                None
            };

            let id = match previous {
                Some(previous) => {
                    registry = db.load_registry(&previous.id)?;
                    seed = previous.seed_url;
                    resumed = true;
                    info!(
                        "Resuming session {} ({} pages)",
                        previous.id,
                        registry.len()
                    );
                    previous.id
                }
                None => {
                    if config.resume {
                        warn!("No stored walk in {}, starting a new one", path.display());
                    }
                    db.create_session(&seed)?
                }
            };
            Some(Session { db, id })
        }
        None => None,
    };

    if !quiet {
        println!("\n{} Walking from {}", "→".blue(), seed.bright_white());
        if let Some(ref session) = session {
            println!("{} Session: {}", "→".blue(), session.id().bright_white());
        }
        println!();
    }

    let mut navigator = Navigator::with_registry(fetcher, registry);

    let spinner = fetch_spinner(&format!("Fetching {}", seed));
    let started = if resumed {
        navigator.resume(&seed).await
    } else {
        navigator.start(&seed).await
    };
    spinner.finish_and_clear();

    match started {
        Ok(population) => {
            if let Some(note) = describe_population(&population) {
                println!("{}", note);
            }
        }
        Err(e) => {
            if let Some(ref session) = session {
                session.save(navigator.registry())?;
                session.db.fail_session(&session.id)?;
            }
            return Err(e).with_context(|| format!("Could not start walking from {}", seed));
        }
    }

    if let Some(ref session) = session {
        session.save(navigator.registry())?;
    }

    {
        let stdin = io::stdin();
        let stdout = io::stdout();
        repl(&mut navigator, stdin.lock(), stdout.lock(), session.as_ref()).await?;
    }

    let registry = navigator.into_registry();
    if let Some(ref session) = session {
        session.save(&registry)?;
        session.db.complete_session(&session.id)?;
    }

    if let Some((ref path, format)) = config.export {
        let content = map::render(&registry, format)?;
        map::save_export(&content, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} Graph written to {}", "✓".green().bold(), path.display());
    }

    if !quiet {
        let summary = map::summarize(&registry);
        println!(
            "{} Visited {} of {} pages, {} links",
            "✓".green().bold(),
            summary.populated,
            summary.pages,
            summary.edges
        );
    }

    Ok(())
}

pub fn handle_export(args: &ArgMatches) -> Result<()> {
    let db_path = args
        .get_one::<String>("db")
        .map(|p| expand_path(p))
        .context("--db is required")?;
    if !Database::exists(&db_path) {
        bail!("No database at {}", db_path.display());
    }
    let db = open_database(&db_path)?;

    let session_id = match args.get_one::<String>("session") {
        Some(id) => id.clone(),
        None => match db.latest_session()? {
            Some(session) => session.id,
            None => bail!("{} has no stored walks", db_path.display()),
        },
    };
    if db.get_session(&session_id)?.is_none() {
        bail!("No session {} in {}", session_id, db_path.display());
    }

    let format = args
        .get_one::<String>("format")
        .and_then(|f| ExportFormat::from_str(f))
        .unwrap_or(ExportFormat::Dot);

    let registry = db.load_registry(&session_id)?;
    let content = map::render(&registry, format)?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            map::save_export(&content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Graph written to {}", "✓".green().bold(), path.display());
        }
        None => print!("{}", content),
    }

    Ok(())
}

pub fn handle_sessions(args: &ArgMatches) -> Result<()> {
    let db_path = args
        .get_one::<String>("db")
        .map(|p| expand_path(p))
        .context("--db is required")?;
    if !Database::exists(&db_path) {
        bail!("No database at {}", db_path.display());
    }
    let db = open_database(&db_path)?;

    let sessions = db.list_sessions()?;
    if sessions.is_empty() {
        println!("No stored walks");
        return Ok(());
    }

    for session in sessions {
        let pages = db.page_count(&session.id)?;
        println!(
            "{}  {:<9}  {:>5} pages  {}",
            session.id.bright_white(),
            session.status,
            pages,
            session.seed_url
        );
    }

    Ok(())
}
