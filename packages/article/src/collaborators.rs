//! # Collaborators
//!
//! Narrow interfaces to the parts of the page the controller drives but does
//! not implement: markup rendering, URL routing, the form lifecycle, the
//! accessibility log and the confirmation prompt.
//!
//! Handlers receive the page explicitly and report failures as
//! [`ArticleError`](crate::ArticleError); the event bus does not catch them.

use crate::errors::ArticleResult;
use crate::events::ForumEvent;
use hsuforum_dom::{NodeId, Page};

/// Replaces and inserts discussion markup
///
/// Every handler must tolerate being invoked repeatedly with overlapping data.
pub trait DomUpdater {
    fn handle_update_discussion(&mut self, page: &mut Page, event: &ForumEvent) -> ArticleResult<()>;

    fn handle_notification(&mut self, page: &mut Page, event: &ForumEvent) -> ArticleResult<()>;

    fn handle_discussion_created(&mut self, page: &mut Page, event: &ForumEvent) -> ArticleResult<()>;

    fn handle_discussion_deleted(&mut self, page: &mut Page, event: &ForumEvent) -> ArticleResult<()>;

    fn handle_view_rating(&mut self, page: &mut Page, target: NodeId) -> ArticleResult<()>;
}

/// In-page navigation the router asks the controller to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ViewDiscussion {
        discussion_id: u64,
        post_id: Option<u64>,
    },
}

/// Keeps the browser-visible location in step with the page
pub trait UrlRouter {
    /// A link inside the posts container was clicked. Returning a route
    /// suppresses the link's default navigation.
    fn handle_route(&mut self, page: &Page, target: NodeId) -> ArticleResult<Option<Route>>;

    fn handle_view_discussion(&mut self, event: &ForumEvent) -> ArticleResult<()>;

    fn handle_add_discussion_route(&mut self, page: &Page, target: NodeId) -> ArticleResult<()>;
}

/// Shows, hides and submits post forms
///
/// Events returned here are fired on the bus immediately, in order.
/// Events produced once an asynchronous submission completes enter the bus
/// through [`ForumArticle::fire`](crate::ForumArticle::fire).
pub trait FormController {
    fn handle_form_paste(&mut self, page: &mut Page, target: NodeId) -> ArticleResult<()>;

    fn handle_cancel_form(&mut self, page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>>;

    fn handle_form_submit(&mut self, page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>>;
}

/// Screen-reader announced status log
pub trait LiveLog {
    fn log_text(&mut self, page: &mut Page, message: &str) -> ArticleResult<()>;
}

/// Blocking yes/no question to the user
pub trait Prompt {
    fn confirm(&self, message: &str) -> bool;
}

/// Everything the controller wires together at construction
pub struct Collaborators {
    pub dom: Box<dyn DomUpdater>,
    pub router: Box<dyn UrlRouter>,
    pub form: Box<dyn FormController>,
    pub live_log: Box<dyn LiveLog>,
    pub prompt: Box<dyn Prompt>,
}
