use crate::error::ResolveError;
use url::{ParseError, Url};

/// Resolve `href` against `base` and return the canonical string form.
///
/// An empty `base` means `href` must already be absolute. A non-empty
/// `base` must parse and must carry a scheme, otherwise the link is
/// rejected rather than guessed at.
pub fn resolve(href: &str, base: &str) -> Result<String, ResolveError> {
    resolve_url(href, base).map(|url| canonical(&url))
}

/// Same as [`resolve`] but hands back the parsed [`Url`].
pub fn resolve_url(href: &str, base: &str) -> Result<Url, ResolveError> {
    let href = href.trim();

    if base.is_empty() {
        return Url::parse(href).map_err(|source| ResolveError::InvalidHref {
            href: href.to_string(),
            source,
        });
    }

    let base_url = match Url::parse(base) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            return Err(ResolveError::MissingBaseScheme(base.to_string()));
        }
        Err(source) => {
            return Err(ResolveError::InvalidBase {
                base: base.to_string(),
                source,
            });
        }
    };

    base_url.join(href).map_err(|source| match source {
        // mailto:, data: and the like have no path to resolve against
        ParseError::RelativeUrlWithCannotBeABaseBase => ResolveError::InvalidBase {
            base: base.to_string(),
            source,
        },
        source => ResolveError::InvalidHref {
            href: href.to_string(),
            source,
        },
    })
}

/// Serialize a URL the way pages are keyed.
///
/// `https://a.com` and `https://a.com/` name the same page; both come out
/// without the trailing slash.
pub fn canonical(url: &Url) -> String {
    let serialized = url.as_str();
    if url.has_host() && url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        serialized
            .strip_suffix('/')
            .unwrap_or(serialized)
            .to_string()
    } else {
        serialized.to_string()
    }
}

/// Only http(s) targets can be fetched and therefore become pages.
pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
