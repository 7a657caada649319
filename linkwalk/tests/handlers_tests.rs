use linkwalk::commands::{DEFAULT_SEED, command_argument_builder};
use linkwalk::handlers::*;
use linkwalk_core::data::Database;
use linkwalk_core::extract::Extraction;
use linkwalk_core::map::ExportFormat;
use linkwalk_core::{Navigator, PageState, Population, Snapshot};
use linkwalk_scanner::error::Result as ScanResult;
use linkwalk_scanner::{Document, Fetcher, ScanError};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Default)]
struct StaticFetcher {
    documents: HashMap<String, Document>,
}

impl StaticFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.documents
            .insert(url.to_string(), Document::new(url, html));
        self
    }
}

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> ScanResult<Document> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn site() -> StaticFetcher {
    StaticFetcher::default()
        .page(
            "https://site.test",
            r#"<title>Home</title><a href="/a">A</a><a href="/b">B</a><a href="/gone">Gone</a>"#,
        )
        .page("https://site.test/a", r#"<title>A</title><a href="/">Home</a>"#)
        .page("https://site.test/b", "<title>B</title><p>Dead end</p>")
}

fn run_repl(input: &str) -> (Navigator<StaticFetcher>, String) {
    colored::control::set_override(false);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let mut navigator = Navigator::new(site());
    let mut output = Vec::new();
    runtime.block_on(async {
        navigator.start("https://site.test").await.unwrap();
        repl(&mut navigator, Cursor::new(input), &mut output, None)
            .await
            .unwrap();
    });

    (navigator, String::from_utf8(output).unwrap())
}

// ============================================================================
// URL Parsing Tests
// ============================================================================

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_trims() {
    let result = parse_url_line("  https://example.com/page \n");
    assert_eq!(result, Some("https://example.com/page".to_string()));
}

#[test]
fn test_parse_url_line_host_port() {
    assert_eq!(
        parse_url_line("localhost:8080"),
        Some("http://localhost:8080".to_string())
    );
    assert_eq!(
        parse_url_line("example.com:8080/x"),
        Some("http://example.com:8080/x".to_string())
    );
    assert_eq!(
        parse_url_line("https://example.com:8443/x"),
        Some("https://example.com:8443/x".to_string())
    );
}

#[test]
fn test_parse_url_line_keeps_other_schemes() {
    // Left alone so the navigator can reject them by name
    assert_eq!(
        parse_url_line("mailto:me@example.com"),
        Some("mailto:me@example.com".to_string())
    );
}

#[test]
fn test_parse_url_line_invalid() {
    assert_eq!(parse_url_line("not a valid url!!!"), None);
    assert_eq!(parse_url_line("   "), None);
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_walk_config_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["linkwalk", "walk"])
        .unwrap();
    let (_, walk) = matches.subcommand().unwrap();

    let config = WalkConfig::from_matches(walk).unwrap();

    assert_eq!(config.seed, DEFAULT_SEED);
    assert_eq!(config.db_path, None);
    assert!(!config.resume);
    assert_eq!(config.timeout_secs, 10);
    assert_eq!(config.max_redirects, 5);
    assert_eq!(config.user_agent, None);
    assert_eq!(config.export, None);
}

#[test]
fn test_walk_config_all_options() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "linkwalk",
            "walk",
            "example.com/start",
            "--db",
            "/tmp/walks.db",
            "--timeout",
            "3",
            "--max-redirects",
            "1",
            "--user-agent",
            "walker/1.0",
            "--export",
            "graph.json",
            "--format",
            "json",
        ])
        .unwrap();
    let (_, walk) = matches.subcommand().unwrap();

    let config = WalkConfig::from_matches(walk).unwrap();

    assert_eq!(config.seed, "http://example.com/start");
    assert_eq!(config.db_path, Some(PathBuf::from("/tmp/walks.db")));
    assert!(!config.resume);
    assert_eq!(config.timeout_secs, 3);
    assert_eq!(config.max_redirects, 1);
    assert_eq!(config.user_agent.as_deref(), Some("walker/1.0"));
    assert_eq!(
        config.export,
        Some((PathBuf::from("graph.json"), ExportFormat::Json))
    );
}

#[test]
fn test_resume_requires_db() {
    let result = command_argument_builder().try_get_matches_from(["linkwalk", "walk", "--resume"]);
    assert!(result.is_err());
}

#[test]
fn test_resume_with_db() {
    let matches = command_argument_builder()
        .try_get_matches_from(["linkwalk", "walk", "--db", "walks.db", "--resume"])
        .unwrap();
    let (_, walk) = matches.subcommand().unwrap();

    let config = WalkConfig::from_matches(walk).unwrap();

    assert!(config.resume);
    assert_eq!(config.db_path, Some(PathBuf::from("walks.db")));
}

#[test]
fn test_resume_conflicts_with_url() {
    let result = command_argument_builder().try_get_matches_from([
        "linkwalk",
        "walk",
        "https://example.com",
        "--db",
        "walks.db",
        "--resume",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_zero_timeout_is_rejected() {
    let result = command_argument_builder().try_get_matches_from([
        "linkwalk",
        "walk",
        "--timeout",
        "0",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_subcommand_required() {
    let result = command_argument_builder().try_get_matches_from(["linkwalk"]);
    assert!(result.is_err());
}

#[test]
fn test_export_requires_db() {
    let result = command_argument_builder().try_get_matches_from(["linkwalk", "export"]);
    assert!(result.is_err());
}

#[test]
fn test_verbose_counts() {
    let matches = command_argument_builder()
        .try_get_matches_from(["linkwalk", "-vv", "sessions", "--db", "x.db"])
        .unwrap();
    assert_eq!(matches.get_count("verbose"), 2);
    assert!(!matches.get_flag("quiet"));
}

// ============================================================================
// Database Tests
// ============================================================================

#[test]
fn test_open_database_creates_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("walks.db");

    let db = open_database(&db_path).unwrap();
    db.create_session("https://site.test").unwrap();

    assert!(Database::exists(&db_path));
}

// ============================================================================
// Rendering Tests
// ============================================================================

fn snapshot() -> Snapshot {
    Snapshot {
        url: "https://site.test/a".to_string(),
        title: Some("Page A".to_string()),
        state: PageState::Ready,
        partial: false,
        fetched_at: None,
        linked_from: vec!["https://site.test".to_string()],
        linked_to: vec![
            "https://site.test".to_string(),
            "https://site.test/b".to_string(),
        ],
    }
}

#[test]
fn test_render_snapshot() {
    colored::control::set_override(false);

    let rendered = render_snapshot(&snapshot());

    assert!(rendered.contains("On site: https://site.test/a \"Page A\""));
    assert!(rendered.contains("Linked from: https://site.test\n"));
    assert!(rendered.contains("   0 ) https://site.test\n"));
    assert!(rendered.contains("   1 ) https://site.test/b\n"));
    assert!(!rendered.contains("cut off"));
    assert!(!rendered.contains("no outbound links"));
}

#[test]
fn test_render_snapshot_without_links() {
    colored::control::set_override(false);
    let mut snapshot = snapshot();
    snapshot.title = None;
    snapshot.partial = true;
    snapshot.linked_to.clear();

    let rendered = render_snapshot(&snapshot);

    assert!(rendered.contains("(untitled)"));
    assert!(rendered.contains("cut off"));
    assert!(rendered.contains("(no outbound links)"));
}

#[test]
fn test_describe_population() {
    colored::control::set_override(false);

    assert_eq!(describe_population(&Population::Cached), None);

    let extraction = Extraction {
        anchors: 3,
        pages_discovered: 2,
        ..Default::default()
    };
    let note = describe_population(&Population::Complete(extraction)).unwrap();
    assert!(note.contains("3 links, 2 new pages"));

    let note = describe_population(&Population::Partial("reset".to_string())).unwrap();
    assert!(note.contains("reset"));
}

// ============================================================================
// REPL Tests
// ============================================================================

#[test]
fn test_repl_moves_and_quits() {
    let (navigator, output) = run_repl("0\nq\n");

    assert_eq!(navigator.snapshot().unwrap().url, "https://site.test/a");
    assert!(output.contains("On site: https://site.test \"Home\""));
    assert!(output.contains("On site: https://site.test/a \"A\""));
    assert!(output.contains("Enter a number (q to quit):"));
}

#[test]
fn test_repl_reprompts_on_bad_input() {
    let (navigator, output) = run_repl("1\nfoo\n9\nq\n");

    assert_eq!(navigator.snapshot().unwrap().url, "https://site.test/b");
    assert!(output.contains("'foo' is not a number"));
    assert!(output.contains("Selection 9 is invalid: this page has no links"));
}

#[test]
fn test_repl_survives_failed_fetch() {
    let (navigator, output) = run_repl("2\n0\nq\n");

    assert!(output.contains("Failed to fetch https://site.test/gone"));
    assert!(output.contains("Pick another link"));
    assert_eq!(navigator.snapshot().unwrap().url, "https://site.test/a");
}

#[test]
fn test_repl_stops_at_end_of_input() {
    let (navigator, output) = run_repl("1\n");

    assert_eq!(navigator.snapshot().unwrap().url, "https://site.test/b");
    assert!(output.contains("(no outbound links)"));
}

#[test]
fn test_repl_out_of_range() {
    let (navigator, output) = run_repl("-1\n3\nq\n");

    assert!(output.contains("number must be between 0 and 2"));
    assert_eq!(navigator.snapshot().unwrap().url, "https://site.test");
}
