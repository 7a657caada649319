use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index of a page in its [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub(crate) usize);

impl PageId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageState {
    Idle,
    Fetching,
    Ready,
}

impl PageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageState::Idle => "idle",
            PageState::Fetching => "fetching",
            PageState::Ready => "ready",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(PageState::Idle),
            "fetching" => Some(PageState::Fetching),
            "ready" => Some(PageState::Ready),
            _ => None,
        }
    }
}

/// A node in the link graph.
///
/// Edges are ids into the owning registry. They only ever grow, and only
/// through the registry so both directions stay in step.
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) url: String,
    pub(crate) title: Option<String>,
    pub(crate) html: Option<String>,
    pub(crate) state: PageState,
    pub(crate) partial: bool,
    pub(crate) fetched_at: Option<DateTime<Utc>>,
    pub(crate) linked_to: Vec<PageId>,
    pub(crate) linked_from: Vec<PageId>,
}

impl Page {
    pub(crate) fn new(url: String) -> Self {
        Self {
            url,
            title: None,
            html: None,
            state: PageState::Idle,
            partial: false,
            fetched_at: None,
            linked_to: Vec::new(),
            linked_from: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn is_populated(&self) -> bool {
        self.state == PageState::Ready
    }

    /// Populated, but the token stream broke off before the end.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn linked_to(&self) -> &[PageId] {
        &self.linked_to
    }

    pub fn linked_from(&self) -> &[PageId] {
        &self.linked_from
    }

    /// First title wins; later `<title>` tags are ignored.
    pub(crate) fn set_title(&mut self, title: &str) -> bool {
        if self.title.is_some() {
            return false;
        }
        self.title = Some(title.trim().to_string());
        true
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.state = PageState::Fetching;
    }

    pub(crate) fn abort_fetch(&mut self) {
        self.state = PageState::Idle;
    }

    pub(crate) fn finish(&mut self, body: String, partial: bool) {
        self.html = Some(body);
        self.partial = partial;
        self.state = PageState::Ready;
        self.fetched_at = Some(Utc::now());
    }

    fn push_outbound(&mut self, target: PageId) -> bool {
        if self.linked_to.contains(&target) {
            return false;
        }
        self.linked_to.push(target);
        true
    }

    fn push_inbound(&mut self, source: PageId) -> bool {
        if self.linked_from.contains(&source) {
            return false;
        }
        self.linked_from.push(source);
        true
    }

    /// Record `source -> target` on both pages. Works for self-loops.
    pub(crate) fn connect(pages: &mut [Page], source: PageId, target: PageId) -> bool {
        let added = pages[source.0].push_outbound(target);
        if added {
            pages[target.0].push_inbound(source);
        }
        added
    }
}
