//! # History Router
//!
//! [`UrlRouter`] that keeps a push-state history of forum URLs so the
//! browser-visible location follows in-page navigation.
//!
//! Discussion URLs have the shape `discuss.php?d=<discussion>#p<post>`;
//! links of that shape inside the posts container are turned into
//! [`Route::ViewDiscussion`] instead of full page loads.

use crate::collaborators::{Route, UrlRouter};
use crate::errors::ArticleResult;
use crate::events::ForumEvent;
use hsuforum_dom::{NodeId, Page};
use url::Url;

const DISCUSSION_PAGE: &str = "discuss.php";

#[derive(Debug, Clone)]
pub struct HistoryRouter {
    history: Vec<Url>,
}

impl HistoryRouter {
    pub fn new(location: Url) -> Self {
        Self {
            history: vec![location],
        }
    }

    pub fn parse(location: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(location)?))
    }

    /// Current location
    pub fn location(&self) -> &Url {
        // `history` always holds the initial location
        &self.history[self.history.len() - 1]
    }

    /// Every location visited, oldest first
    pub fn history(&self) -> &[Url] {
        &self.history
    }

    /// Route for a discussion link, resolved against the current location
    pub fn route_for(&self, href: &str) -> Option<Route> {
        let url = self.location().join(href).ok()?;
        parse_discussion_url(&url)
    }

    pub fn discussion_url(&self, discussion_id: u64, post_id: Option<u64>) -> Result<Url, url::ParseError> {
        let mut url = self.location().join(DISCUSSION_PAGE)?;
        url.set_query(Some(&format!("d={discussion_id}")));
        url.set_fragment(post_id.map(|post_id| format!("p{post_id}")).as_deref());
        Ok(url)
    }

    /// Returns false when `url` is already the current location
    fn push(&mut self, url: Url) -> bool {
        if *self.location() == url {
            return false;
        }
        tracing::debug!(%url, "pushing history entry");
        self.history.push(url);
        true
    }
}

fn parse_discussion_url(url: &Url) -> Option<Route> {
    let page = url.path_segments()?.last()?;
    if page != DISCUSSION_PAGE {
        return None;
    }

    let discussion_id = url
        .query_pairs()
        .find(|(key, _)| key == "d")
        .and_then(|(_, value)| value.parse().ok())?;
    let post_id = url
        .fragment()
        .and_then(|fragment| fragment.strip_prefix('p'))
        .and_then(|id| id.parse().ok());

    Some(Route::ViewDiscussion {
        discussion_id,
        post_id,
    })
}

impl UrlRouter for HistoryRouter {
    fn handle_route(&mut self, page: &Page, target: NodeId) -> ArticleResult<Option<Route>> {
        let Some(href) = page.attribute(target, "href") else {
            return Ok(None);
        };
        let Some(route) = self.route_for(href) else {
            return Ok(None);
        };

        let Route::ViewDiscussion {
            discussion_id,
            post_id,
        } = route;
        let url = self.discussion_url(discussion_id, post_id)?;
        self.push(url);
        Ok(Some(route))
    }

    fn handle_view_discussion(&mut self, event: &ForumEvent) -> ArticleResult<()> {
        let Some(discussion_id) = event.discussion_id() else {
            return Ok(());
        };
        // A deleted post can no longer be linked to.
        let post_id = match event {
            ForumEvent::PostDeleted(_) => None,
            _ => event.post_id(),
        };

        let url = self.discussion_url(discussion_id, post_id)?;
        self.push(url);
        Ok(())
    }

    fn handle_add_discussion_route(&mut self, page: &Page, target: NodeId) -> ArticleResult<()> {
        let Some(action) = page.attribute(target, "action") else {
            tracing::debug!(%target, "add discussion form has no action");
            return Ok(());
        };
        let url = self.location().join(action)?;
        self.push(url);
        Ok(())
    }
}
