//! Accessibility live region backed by the page

use crate::collaborators::LiveLog;
use crate::errors::ArticleResult;
use hsuforum_dom::{Node, NodeId, Page, Selector};

/// Appends each message as a paragraph of a polite live region
#[derive(Debug, Clone)]
pub struct PageLiveLog {
    region: Selector,
    region_id: String,
}

impl PageLiveLog {
    /// `region` locates the live region; when absent it is created under the
    /// page root with `region_id`
    pub fn new(region: Selector, region_id: impl Into<String>) -> Self {
        Self {
            region,
            region_id: region_id.into(),
        }
    }

    fn region(&self, page: &mut Page) -> ArticleResult<NodeId> {
        if let Some(region) = page.query(&self.region) {
            return Ok(region);
        }

        tracing::debug!(id = %self.region_id, "creating live log region");
        let root = page.root();
        Ok(page.append(
            root,
            Node::element("div")
                .with_id(self.region_id.as_str())
                .with_class("accesshide")
                .with_attr("role", "log")
                .with_attr("aria-live", "polite"),
        )?)
    }
}

impl LiveLog for PageLiveLog {
    fn log_text(&mut self, page: &mut Page, message: &str) -> ArticleResult<()> {
        let region = self.region(page)?;
        page.append(region, Node::element("p").with_content(message))?;
        Ok(())
    }
}
