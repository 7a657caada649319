use colored::Colorize;
use linkwalk::commands::command_argument_builder;
use linkwalk::handlers::{handle_export, handle_sessions, handle_walk};
use tracing::Level;

fn print_banner() {
    println!(
        "{} {}",
        "linkwalk".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("{}", "walk the web one link at a time".dimmed());
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr so they don't interleave with the prompt
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_logging(chosen_command.get_count("verbose"));

    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("walk", primary_command)) => handle_walk(primary_command, quiet).await,
        Some(("export", primary_command)) => handle_export(primary_command),
        Some(("sessions", primary_command)) => handle_sessions(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
