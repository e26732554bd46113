//! # Content Observer
//!
//! One-way content sync from the rich editor's editable area to the plain
//! text widget that currently owns it.
//!
//! The backend is picked once from the page's capabilities: native mutation
//! observation when available, otherwise a per-change character data
//! listener. Both expose the same subscribe/unsubscribe/deliver contract.

use hsuforum_dom::{DomResult, NodeId, ObservationId, ObserverMode, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverBackend {
    MutationObserver,
    CharacterDataListener,
}

impl ObserverBackend {
    pub fn detect(page: &Page) -> Self {
        if page.capabilities().mutation_observer {
            ObserverBackend::MutationObserver
        } else {
            ObserverBackend::CharacterDataListener
        }
    }

    fn mode(self) -> ObserverMode {
        match self {
            ObserverBackend::MutationObserver => ObserverMode::Batched,
            ObserverBackend::CharacterDataListener => ObserverMode::PerChange,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Subscription {
    observation: ObservationId,
    source: NodeId,
    sink: NodeId,
}

/// Holds at most one active subscription
#[derive(Debug)]
pub struct ContentObserver {
    backend: ObserverBackend,
    subscription: Option<Subscription>,
}

impl ContentObserver {
    pub fn new(backend: ObserverBackend) -> Self {
        Self {
            backend,
            subscription: None,
        }
    }

    pub fn backend(&self) -> ObserverBackend {
        self.backend
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Copy `source` into `sink` whenever `source`'s subtree changes.
    /// Replaces any existing subscription.
    pub fn subscribe(&mut self, page: &mut Page, source: NodeId, sink: NodeId) -> DomResult<()> {
        self.unsubscribe(page);
        let observation = page.observe(source, self.backend.mode())?;
        self.subscription = Some(Subscription {
            observation,
            source,
            sink,
        });
        Ok(())
    }

    /// Returns false when nothing was subscribed
    pub fn unsubscribe(&mut self, page: &mut Page) -> bool {
        match self.subscription.take() {
            Some(subscription) => page.disconnect(subscription.observation),
            None => false,
        }
    }

    /// Run the callback once per due notification; returns how many ran
    pub fn deliver(&mut self, page: &mut Page) -> DomResult<usize> {
        let Some(subscription) = self.subscription else {
            return Ok(0);
        };

        let due = page.take_notifications(subscription.observation);
        for _ in 0..due {
            let content = page.content(subscription.source)?.to_string();
            page.set_content(subscription.sink, content)?;
        }
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsuforum_dom::{Capabilities, Node};

    fn page(mutation_observer: bool) -> (Page, NodeId, NodeId) {
        let mut page = Page::new().with_capabilities(Capabilities { mutation_observer });
        let source = page.append(page.root(), Node::element("div")).unwrap();
        let sink = page.append(page.root(), Node::element("div")).unwrap();
        (page, source, sink)
    }

    #[test]
    fn test_native_backend_delivers_once_per_turn() {
        let (mut page, source, sink) = page(true);
        let mut observer = ContentObserver::new(ObserverBackend::detect(&page));
        assert_eq!(observer.backend(), ObserverBackend::MutationObserver);

        observer.subscribe(&mut page, source, sink).unwrap();
        page.set_content(source, "one").unwrap();
        page.set_content(source, "two").unwrap();

        assert_eq!(observer.deliver(&mut page).unwrap(), 1);
        assert_eq!(page.content(sink).unwrap(), "two");
    }

    #[test]
    fn test_fallback_backend_delivers_every_change() {
        let (mut page, source, sink) = page(false);
        let mut observer = ContentObserver::new(ObserverBackend::detect(&page));
        assert_eq!(observer.backend(), ObserverBackend::CharacterDataListener);

        observer.subscribe(&mut page, source, sink).unwrap();
        page.set_content(source, "one").unwrap();
        page.set_content(source, "two").unwrap();

        assert_eq!(observer.deliver(&mut page).unwrap(), 2);
        assert_eq!(page.content(sink).unwrap(), "two");
    }

    #[test]
    fn test_unsubscribe_drops_pending_changes() {
        let (mut page, source, sink) = page(true);
        let mut observer = ContentObserver::new(ObserverBackend::MutationObserver);

        observer.subscribe(&mut page, source, sink).unwrap();
        page.set_content(source, "late").unwrap();
        assert!(observer.unsubscribe(&mut page));
        assert!(!observer.unsubscribe(&mut page));

        assert_eq!(observer.deliver(&mut page).unwrap(), 0);
        assert_eq!(page.content(sink).unwrap(), "");
        assert_eq!(page.observation_count(), 0);
    }

    #[test]
    fn test_resubscribe_keeps_single_observation() {
        let (mut page, source, sink) = page(true);
        let mut observer = ContentObserver::new(ObserverBackend::MutationObserver);

        observer.subscribe(&mut page, source, sink).unwrap();
        observer.subscribe(&mut page, source, sink).unwrap();
        assert_eq!(page.observation_count(), 1);
    }
}
