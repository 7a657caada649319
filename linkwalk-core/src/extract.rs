use crate::page::PageId;
use crate::registry::Registry;
use linkwalk_scanner::resolve::{canonical, is_fetchable, resolve_url};
use linkwalk_scanner::{ResolveError, ScanError, Token};
use tracing::{debug, warn};

/// What a single population pass found.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    pub anchors: usize,
    pub edges_added: usize,
    pub pages_discovered: usize,
    pub skipped: usize,
    pub title_set: bool,
}

/// Walk the token stream of `page`'s document, recording its title and an
/// edge for every anchor whose href resolves.
///
/// Edges are registered as they are seen, so a stream error keeps whatever
/// was found before it: the page is still marked populated (and partial)
/// and the error is returned.
pub fn populate<I>(
    registry: &mut Registry,
    page: PageId,
    body: &str,
    tokens: I,
) -> Result<Extraction, ScanError>
where
    I: IntoIterator<Item = Result<Token, ScanError>>,
{
    let base = registry.page(page).url().to_string();
    let mut extraction = Extraction::default();
    let mut tokens = tokens.into_iter().peekable();
    let mut in_anchor = false;

    while let Some(token) = tokens.next() {
        let token = match token {
            Ok(token) => token,
            Err(e) => {
                warn!("Token stream for {} failed: {}", base, e);
                registry.page_mut(page).finish(body.to_string(), true);
                return Err(e);
            }
        };

        match token {
            Token::StartTag(name) if name.eq_ignore_ascii_case("title") => {
                in_anchor = false;
                while tokens
                    .next_if(|t| matches!(t, Ok(Token::Attr { .. })))
                    .is_some()
                {}
                if let Some(Ok(Token::Text(text))) =
                    tokens.next_if(|t| matches!(t, Ok(Token::Text(_))))
                    && registry.page_mut(page).set_title(&text)
                {
                    extraction.title_set = true;
                }
            }
            Token::StartTag(name) => {
                in_anchor = name.eq_ignore_ascii_case("a");
                if in_anchor {
                    extraction.anchors += 1;
                }
            }
            Token::Attr { name, value, .. } if in_anchor && name.eq_ignore_ascii_case("href") => {
                follow(registry, page, &base, &value, &mut extraction);
            }
            Token::Attr { .. } => {}
            Token::Text(_) => in_anchor = false,
        }
    }

    registry.page_mut(page).finish(body.to_string(), false);
    debug!(
        "Populated {}: {} anchors, {} new edges, {} skipped",
        base, extraction.anchors, extraction.edges_added, extraction.skipped
    );
    Ok(extraction)
}

fn follow(
    registry: &mut Registry,
    page: PageId,
    base: &str,
    href: &str,
    extraction: &mut Extraction,
) {
    match resolve_link(href, base) {
        Ok(url) => {
            let (target, created) = registry.get_or_create(&url);
            if created {
                extraction.pages_discovered += 1;
            }
            if registry.link_to(page, target) {
                debug!("Found link: {} -> {}", base, url);
                extraction.edges_added += 1;
            }
        }
        Err(e) => {
            debug!("Skipping href {:?} on {}: {}", href, base, e);
            extraction.skipped += 1;
        }
    }
}

/// Resolve an anchor href to the canonical URL of a page that could be
/// fetched. Non-http(s) targets are rejected.
pub fn resolve_link(href: &str, base: &str) -> Result<String, ResolveError> {
    let url = resolve_url(href, base)?;
    if !is_fetchable(&url) {
        return Err(ResolveError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
            url: url.to_string(),
        });
    }
    Ok(canonical(&url))
}
