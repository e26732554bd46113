//! # Event Bus
//!
//! Synchronous fan-out of [`ForumEvent`]s to a fixed, ordered list of
//! subscribers per event kind.
//!
//! ## Design
//!
//! Subscribers are plain data naming which collaborator method runs; the
//! controller owns the collaborators and performs the calls. Handlers for
//! one event run to completion in table order before anything else, and a
//! failing handler stops the remaining ones.

use crate::events::EventKind;
use std::collections::BTreeMap;

/// Markup handlers of the [`DomUpdater`](crate::DomUpdater)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomHandler {
    UpdateDiscussion,
    Notification,
    DiscussionCreated,
    DiscussionDeleted,
}

/// Handlers of the [`UrlRouter`](crate::UrlRouter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterHandler {
    ViewDiscussion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscriber {
    Dom(DomHandler),
    Router(RouterHandler),
    /// Forward the payload's `livelog` message
    LiveLog,
}

/// Subscription table keyed by event kind
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: BTreeMap<EventKind, Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The forum's subscription table
    pub fn forum_defaults() -> Self {
        use DomHandler::*;
        use Subscriber::{Dom, LiveLog, Router};
        const VIEW: Subscriber = Router(RouterHandler::ViewDiscussion);

        let mut bus = Self::new();
        for subscriber in [Dom(UpdateDiscussion), Dom(Notification), VIEW, LiveLog] {
            bus.subscribe(EventKind::PostCreated, subscriber);
        }
        for subscriber in [Dom(UpdateDiscussion), VIEW, Dom(Notification), LiveLog] {
            bus.subscribe(EventKind::PostUpdated, subscriber);
        }
        for subscriber in [
            Dom(UpdateDiscussion),
            Dom(DiscussionCreated),
            Dom(Notification),
            VIEW,
            LiveLog,
        ] {
            bus.subscribe(EventKind::DiscussionCreated, subscriber);
        }
        for subscriber in [Dom(DiscussionDeleted), Dom(Notification), LiveLog] {
            bus.subscribe(EventKind::DiscussionDeleted, subscriber);
        }
        for subscriber in [Dom(UpdateDiscussion), VIEW, Dom(Notification), LiveLog] {
            bus.subscribe(EventKind::PostDeleted, subscriber);
        }
        bus.subscribe(EventKind::FormCanceled, VIEW);
        bus
    }

    /// Append `subscriber` to the list for `kind`
    pub fn subscribe(&mut self, kind: EventKind, subscriber: Subscriber) -> &mut Self {
        self.subscribers.entry(kind).or_default().push(subscriber);
        self
    }

    /// Subscribers for `kind`, in delivery order
    pub fn subscribers(&self, kind: EventKind) -> &[Subscriber] {
        self.subscribers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forum_table_order() {
        let bus = EventBus::forum_defaults();

        assert_eq!(
            bus.subscribers(EventKind::PostUpdated),
            &[
                Subscriber::Dom(DomHandler::UpdateDiscussion),
                Subscriber::Router(RouterHandler::ViewDiscussion),
                Subscriber::Dom(DomHandler::Notification),
                Subscriber::LiveLog,
            ]
        );
        assert_eq!(
            bus.subscribers(EventKind::DiscussionDeleted),
            &[
                Subscriber::Dom(DomHandler::DiscussionDeleted),
                Subscriber::Dom(DomHandler::Notification),
                Subscriber::LiveLog,
            ]
        );
        assert_eq!(
            bus.subscribers(EventKind::FormCanceled),
            &[Subscriber::Router(RouterHandler::ViewDiscussion)]
        );
    }

    #[test]
    fn test_every_kind_has_subscribers() {
        let bus = EventBus::forum_defaults();
        for kind in EventKind::ALL {
            assert!(!bus.subscribers(kind).is_empty(), "{kind} has no subscribers");
        }
    }

    #[test]
    fn test_empty_bus() {
        let bus = EventBus::new();
        assert!(bus.is_empty());
        assert!(bus.subscribers(EventKind::PostCreated).is_empty());
    }
}
