//! # Forum Article
//!
//! Client-side controller for a discussion forum page.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: gestures, clock ticks, responses      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ForumArticle                                │
//! │  - CommandRouter: gesture → command         │
//! │  - EditorRelocator: shared rich editor      │
//! │  - EventBus: event → ordered subscribers    │
//! │  - Io: server calls with context id         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ collaborators: DOM updater, URL router,     │
//! │ form controller, live log, prompt           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One editor owner**: at most one plain text widget holds the rich
//!    editor; attaching always releases every other owner first
//! 2. **Observer before mount**: content sync is disconnected before the
//!    editor leaves a widget
//! 3. **Ordered events**: subscribers run synchronously in table order and
//!    failures are not swallowed
//! 4. **Explicit time**: polls and observer delivery advance only through
//!    [`ForumArticle::tick`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hsuforum_article::{ArticleConfig, Collaborators, ForumArticle, Gesture};
//!
//! let config = ArticleConfig::from_json(config_json)?;
//! let mut article = ForumArticle::new(config, page, Box::new(transport), |io| Collaborators {
//!     dom: Box::new(MyDom::new(io.clone())),
//!     router: Box::new(HistoryRouter::parse(location)?),
//!     form: Box::new(MyForms::new(io.clone())),
//!     live_log: Box::new(PageLiveLog::new(live_log_selector, "hsuforum-livelog")),
//!     prompt: Box::new(BrowserPrompt),
//! })?;
//!
//! let outcome = article.dispatch(Gesture::Click, link)?;
//! article.tick(Duration::from_millis(500))?;
//! ```

mod article;
mod bus;
mod collaborators;
mod commands;
mod config;
mod editor;
mod errors;
mod events;
mod io;
mod livelog;
mod observer;
mod router;

pub use article::{ForumArticle, GestureOutcome};
pub use bus::{DomHandler, EventBus, RouterHandler, Subscriber};
pub use collaborators::{Collaborators, DomUpdater, FormController, LiveLog, Prompt, Route, UrlRouter};
pub use commands::{Binding, Command, CommandRouter, Delegation, Gesture, Scope, Target};
pub use config::{ArticleConfig, CompiledSelectors, Selectors, Strings, DEFAULT_POLL_INTERVAL_MS};
pub use editor::{EditorRelocator, MountState, HIDE_CLASS};
pub use errors::{ArticleError, ArticleResult, ConfigError, TransportError};
pub use events::{CanceledPayload, DeletedPayload, EventKind, ForumEvent, PostPayload};
pub use io::{DeletePostRequest, Io, RequestId, ServerRequest, Transport};
pub use livelog::PageLiveLog;
pub use observer::{ContentObserver, ObserverBackend};
pub use router::HistoryRouter;

// Re-export the page model for convenience
pub use hsuforum_dom::{Node, NodeId, Page, Selector};
