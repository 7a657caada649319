use crate::error::NavigationError;
use crate::extract::{self, Extraction};
use crate::page::{Page, PageId, PageState};
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use linkwalk_scanner::{Fetcher, ScanError, Token, tokenize};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A parsed line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Index(i64),
    Quit,
}

impl Selection {
    pub fn parse(input: &str) -> Result<Self, NavigationError> {
        let input = input.trim();
        match input.to_lowercase().as_str() {
            "q" | "quit" | "exit" => return Ok(Selection::Quit),
            _ => {}
        }

        input
            .parse::<i64>()
            .map(Selection::Index)
            .map_err(|_| NavigationError::NotANumber(input.to_string()))
    }
}

/// How the page we landed on came to be populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Population {
    /// Already fetched earlier, nothing was requested.
    Cached,
    Complete(Extraction),
    /// The body broke off; links found before the break were kept.
    Partial(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved { url: String, population: Population },
    Quit,
}

/// Everything the interactive layer may show about the current page.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub url: String,
    pub title: Option<String>,
    pub state: PageState,
    pub partial: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub linked_from: Vec<String>,
    pub linked_to: Vec<String>,
}

/// Walks the link graph one hop at a time, fetching each page the first
/// time it is reached.
pub struct Navigator<F> {
    fetcher: F,
    registry: Registry,
    current: Option<PageId>,
    fetches: usize,
}

impl<F: Fetcher> Navigator<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_registry(fetcher, Registry::new())
    }

    /// Continue walking a graph built earlier (e.g. restored from disk).
    pub fn with_registry(fetcher: F, registry: Registry) -> Self {
        Self {
            fetcher,
            registry,
            current: None,
            fetches: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    pub fn current(&self) -> Option<PageId> {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current.map(|id| self.registry.page(id))
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Register the seed page, populate it and make it current.
    pub async fn start(&mut self, seed: &str) -> Result<Population, NavigationError> {
        let url = extract::resolve_link(seed, "")?;
        let (id, _) = self.registry.get_or_create(&url);
        info!("Starting walk at {}", url);

        let population = self.ensure_populated(id).await?;
        self.current = Some(id);
        Ok(population)
    }

    /// Make an already registered page current, populating it if needed.
    pub async fn resume(&mut self, url: &str) -> Result<Population, NavigationError> {
        let url = extract::resolve_link(url, "")?;
        let Some(id) = self.registry.lookup(&url) else {
            return self.start(&url).await;
        };

        let population = self.ensure_populated(id).await?;
        self.current = Some(id);
        Ok(population)
    }

    /// Follow outbound link `index` of the current page.
    ///
    /// The current page only changes once the target has been populated.
    pub async fn select(&mut self, index: usize) -> Result<Population, NavigationError> {
        let current = self.current.ok_or(NavigationError::NoCurrentPage)?;
        let links = self.registry.page(current).linked_to();

        let Some(&target) = links.get(index) else {
            return Err(NavigationError::InvalidSelection {
                index: index as i64,
                available: links.len(),
            });
        };

        let population = self.ensure_populated(target).await?;
        self.current = Some(target);
        Ok(population)
    }

    pub async fn apply(&mut self, selection: Selection) -> Result<Step, NavigationError> {
        match selection {
            Selection::Quit => Ok(Step::Quit),
            Selection::Index(index) => {
                let index = usize::try_from(index).map_err(|_| {
                    NavigationError::InvalidSelection {
                        index,
                        available: self.current_page().map_or(0, |p| p.linked_to().len()),
                    }
                })?;
                let population = self.select(index).await?;
                let url = self
                    .current_page()
                    .map(|p| p.url().to_string())
                    .unwrap_or_default();
                Ok(Step::Moved { url, population })
            }
        }
    }

    /// Whether following link `index` of the current page would hit the
    /// network. False for cached targets and out-of-range indexes.
    pub fn would_fetch(&self, index: usize) -> bool {
        self.current_page()
            .and_then(|page| page.linked_to().get(index))
            .is_some_and(|target| !self.registry.page(*target).is_populated())
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        let page = self.current_page()?;
        Some(Snapshot {
            url: page.url().to_string(),
            title: page.title().map(str::to_string),
            state: page.state(),
            partial: page.is_partial(),
            fetched_at: page.fetched_at(),
            linked_from: self.registry.urls(page.linked_from()),
            linked_to: self.registry.urls(page.linked_to()),
        })
    }

    async fn ensure_populated(&mut self, id: PageId) -> Result<Population, NavigationError> {
        if self.registry.page(id).is_populated() {
            debug!("{} already populated", self.registry.page(id).url());
            return Ok(Population::Cached);
        }

        let url = self.registry.page(id).url().to_string();
        self.registry.page_mut(id).begin_fetch();
        self.fetches += 1;

        let document = match self.fetcher.fetch(&url).await {
            Ok(document) => document,
            Err(source) => {
                warn!("Fetch of {} failed: {}", url, source);
                self.registry.page_mut(id).abort_fetch();
                return Err(NavigationError::Fetch { url, source });
            }
        };

        if !document.is_html() {
            debug!(
                "{} has content type {:?}, tokenizing anyway",
                url, document.content_type
            );
        }

        let mut stream: Vec<Result<Token, ScanError>> =
            tokenize(&document.body).into_iter().map(Ok).collect();
        if let Some(reason) = document.truncated.clone() {
            stream.push(Err(ScanError::Stream(reason)));
        }

        match extract::populate(&mut self.registry, id, &document.body, stream) {
            Ok(extraction) => {
                info!(
                    "{}: {} links ({} new pages)",
                    url,
                    self.registry.page(id).linked_to().len(),
                    extraction.pages_discovered
                );
                Ok(Population::Complete(extraction))
            }
            Err(e) => Ok(Population::Partial(e.to_string())),
        }
    }
}
