pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    WalkConfig, describe_population, open_database, parse_url_line, render_snapshot, repl,
};
