// Tests for page identity and edge bookkeeping

use linkwalk_core::{PageState, Registry};

// ============================================================================
// Identity Tests
// ============================================================================

#[test]
fn test_get_or_create_returns_same_page() {
    let mut registry = Registry::new();

    let (first, created_first) = registry.get_or_create("https://example.com/a");
    let (second, created_second) = registry.get_or_create("https://example.com/a");

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_distinct_urls_get_distinct_pages() {
    let mut registry = Registry::new();

    let (a, _) = registry.get_or_create("https://example.com/a");
    let (b, _) = registry.get_or_create("https://example.com/b");

    assert_ne!(a, b);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.page(a).url(), "https://example.com/a");
    assert_eq!(registry.page(b).url(), "https://example.com/b");
}

#[test]
fn test_exists_and_lookup() {
    let mut registry = Registry::new();
    assert!(registry.is_empty());
    assert!(!registry.exists("https://example.com"));
    assert_eq!(registry.lookup("https://example.com"), None);

    let (id, _) = registry.get_or_create("https://example.com");

    assert!(registry.exists("https://example.com"));
    assert_eq!(registry.lookup("https://example.com"), Some(id));
}

#[test]
fn test_new_page_is_empty() {
    let mut registry = Registry::new();
    let (id, _) = registry.get_or_create("https://example.com");
    let page = registry.page(id);

    assert_eq!(page.state(), PageState::Idle);
    assert!(!page.is_populated());
    assert!(!page.is_partial());
    assert_eq!(page.title(), None);
    assert_eq!(page.html(), None);
    assert_eq!(page.fetched_at(), None);
    assert!(page.linked_to().is_empty());
    assert!(page.linked_from().is_empty());
}

// ============================================================================
// Edge Tests
// ============================================================================

#[test]
fn test_link_to_is_symmetric() {
    let mut registry = Registry::new();
    let (a, _) = registry.get_or_create("https://example.com/a");
    let (b, _) = registry.get_or_create("https://example.com/b");

    assert!(registry.link_to(a, b));

    assert_eq!(registry.page(a).linked_to(), &[b]);
    assert_eq!(registry.page(b).linked_from(), &[a]);
    assert!(registry.page(a).linked_from().is_empty());
    assert!(registry.page(b).linked_to().is_empty());
}

#[test]
fn test_link_to_is_idempotent() {
    let mut registry = Registry::new();
    let (a, _) = registry.get_or_create("https://example.com/a");
    let (b, _) = registry.get_or_create("https://example.com/b");

    assert!(registry.link_to(a, b));
    assert!(!registry.link_to(a, b));
    assert!(!registry.link_from(b, a));

    assert_eq!(registry.page(a).linked_to().len(), 1);
    assert_eq!(registry.page(b).linked_from().len(), 1);
    assert_eq!(registry.edge_count(), 1);
}

#[test]
fn test_link_from_adds_the_same_pair() {
    let mut registry = Registry::new();
    let (a, _) = registry.get_or_create("https://example.com/a");
    let (b, _) = registry.get_or_create("https://example.com/b");

    assert!(registry.link_from(b, a));

    assert_eq!(registry.page(a).linked_to(), &[b]);
    assert_eq!(registry.page(b).linked_from(), &[a]);
}

#[test]
fn test_self_loop() {
    let mut registry = Registry::new();
    let (a, _) = registry.get_or_create("https://example.com/a");

    assert!(registry.link_to(a, a));
    assert!(!registry.link_to(a, a));

    assert_eq!(registry.page(a).linked_to(), &[a]);
    assert_eq!(registry.page(a).linked_from(), &[a]);
}

#[test]
fn test_edges_keep_discovery_order() {
    let mut registry = Registry::new();
    let (hub, _) = registry.get_or_create("https://example.com");
    let (c, _) = registry.get_or_create("https://example.com/c");
    let (a, _) = registry.get_or_create("https://example.com/a");
    let (b, _) = registry.get_or_create("https://example.com/b");

    registry.link_to(hub, c);
    registry.link_to(hub, a);
    registry.link_to(hub, b);
    registry.link_to(hub, a);

    assert_eq!(registry.page(hub).linked_to(), &[c, a, b]);
    assert_eq!(
        registry.urls(registry.page(hub).linked_to()),
        vec![
            "https://example.com/c",
            "https://example.com/a",
            "https://example.com/b"
        ]
    );
}

#[test]
fn test_inbound_edges_from_many_sources() {
    let mut registry = Registry::new();
    let (target, _) = registry.get_or_create("https://example.com/t");
    let (x, _) = registry.get_or_create("https://example.com/x");
    let (y, _) = registry.get_or_create("https://example.com/y");

    registry.link_to(y, target);
    registry.link_to(x, target);

    assert_eq!(registry.page(target).linked_from(), &[y, x]);
}
