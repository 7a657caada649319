use thiserror::Error;

/// Failure to turn an href into an absolute URL. Always scoped to a single link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid href '{href}': {source}")]
    InvalidHref {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid base URL '{base}': {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL '{0}' has no scheme")]
    MissingBaseScheme(String),

    #[error("unsupported scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ScanError {
    /// Transport and HTTP status failures, as opposed to markup errors.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, ScanError::HttpError(_) | ScanError::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
