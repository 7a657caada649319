use clap::{arg, command};
use std::path::PathBuf;

/// Where the original walk began when no URL is given.
pub const DEFAULT_SEED: &str = "https://404notboring.com/articles/boids";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkwalk")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress the banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log more (repeat for debug and trace output)")
                .required(false)
                .action(clap::ArgAction::Count),
        )
        .subcommand_required(true)
        .subcommand(
            command!("walk")
                .about(
                    "Fetch a page and walk its links one hop at a time. Each page is fetched \
                the first time you land on it.",
                )
                .arg(
                    arg!([URL])
                        .required(false)
                        .help("The page to start from")
                        .default_value(DEFAULT_SEED),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("SQLite file to save the walked graph to after every step"),
                )
                .arg(
                    arg!(--"resume")
                        .required(false)
                        .help("Continue the most recent walk stored in --db")
                        .action(clap::ArgAction::SetTrue)
                        .requires("db")
                        .conflicts_with("URL"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-redirects" <COUNT>)
                        .required(false)
                        .help("Redirects to follow before giving up on a page")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"user-agent" <AGENT>)
                        .required(false)
                        .help("User-Agent header sent with every request"),
                )
                .arg(
                    arg!(-e --"export" <PATH>)
                        .required(false)
                        .help("Write the walked graph to a file when the walk ends")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: dot, json")
                        .value_parser(["dot", "json"])
                        .default_value("dot"),
                ),
        )
        .subcommand(
            command!("export")
                .about("Export a stored walk as a Graphviz or JSON graph")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(true)
                        .help("SQLite file written by 'walk --db'"),
                )
                .arg(
                    arg!(-s --"session" <ID>)
                        .required(false)
                        .help("Session to export (default: the most recent one)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save to file (default: print to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: dot, json")
                        .value_parser(["dot", "json"])
                        .default_value("dot"),
                ),
        )
        .subcommand(
            command!("sessions")
                .about("List the walks stored in a database")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(true)
                        .help("SQLite file written by 'walk --db'"),
                ),
        )
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
