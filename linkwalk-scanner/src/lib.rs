pub mod error;
pub mod fetch;
pub mod resolve;
pub mod tokens;

pub use error::{ResolveError, ScanError};
pub use fetch::{Document, Fetcher, HttpFetcher};
pub use resolve::{resolve, resolve_url};
pub use tokens::{Token, tokenize};
