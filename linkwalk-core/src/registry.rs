use crate::page::{Page, PageId};
use std::collections::HashMap;
use tracing::debug;

/// Owns every page of a walk and is the only place pages come from.
///
/// Pages are kept in an arena and never removed, so a [`PageId`] stays
/// valid for the life of the registry.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    pages: Vec<Page>,
    index: HashMap<String, PageId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the page for `url`, creating and registering it if needed.
    pub fn get_or_create(&mut self, url: &str) -> (PageId, bool) {
        if let Some(id) = self.index.get(url) {
            return (*id, false);
        }

        let id = PageId(self.pages.len());
        self.pages.push(Page::new(url.to_string()));
        self.index.insert(url.to_string(), id);
        debug!("Registered page {} as #{}", url, id.0);
        (id, true)
    }

    pub fn exists(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn lookup(&self, url: &str) -> Option<PageId> {
        self.index.get(url).copied()
    }

    /// Panics if `id` came from a different registry.
    pub fn page(&self, id: PageId) -> &Page {
        &self.pages[id.0]
    }

    pub(crate) fn page_mut(&mut self, id: PageId) -> &mut Page {
        &mut self.pages[id.0]
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0)
    }

    /// Add the edge `source -> target`. Returns false if it already existed.
    pub fn link_to(&mut self, source: PageId, target: PageId) -> bool {
        Page::connect(&mut self.pages, source, target)
    }

    /// Add the edge `source -> target`, seen from the target's side.
    pub fn link_from(&mut self, target: PageId, source: PageId) -> bool {
        Page::connect(&mut self.pages, source, target)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageId, &Page)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    pub fn edge_count(&self) -> usize {
        self.pages.iter().map(|p| p.linked_to.len()).sum()
    }

    /// URLs for a list of ids, in the same order.
    pub fn urls(&self, ids: &[PageId]) -> Vec<String> {
        ids.iter().map(|id| self.page(*id).url.clone()).collect()
    }

    /// Append a page rebuilt from storage. Edges are filled in by the caller.
    pub(crate) fn push_restored(&mut self, page: Page) -> PageId {
        let id = PageId(self.pages.len());
        self.index.insert(page.url.clone(), id);
        self.pages.push(page);
        id
    }
}
