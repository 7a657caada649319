use linkwalk_scanner::{ResolveError, ScanError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(#[from] ResolveError),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ScanError,
    },

    #[error("No page selected yet")]
    NoCurrentPage,

    #[error("{}", selection_message(.index, .available))]
    InvalidSelection { index: i64, available: usize },

    #[error("'{0}' is not a number")]
    NotANumber(String),
}

fn selection_message(index: &i64, available: &usize) -> String {
    if *available == 0 {
        format!("Selection {} is invalid: this page has no links", index)
    } else {
        format!(
            "Selection {} is invalid: number must be between 0 and {}",
            index,
            available - 1
        )
    }
}

impl NavigationError {
    /// Errors caused by what the user typed. The prompt should simply be shown again.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            NavigationError::InvalidSelection { .. }
                | NavigationError::NotANumber(_)
                | NavigationError::NoCurrentPage
        )
    }
}
