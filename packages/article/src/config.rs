//! # Article Configuration
//!
//! Page-supplied settings for the controller, in the JSON shape the page
//! passes on initialisation:
//!
//! ```json
//! {
//!   "contextId": 42,
//!   "sesskey": "abc123",
//!   "pollIntervalMs": 500,
//!   "strings": { "loadingeditor": "Loading editor..." },
//!   "selectors": { "container": ".mod-hsuforum-posts-container" }
//! }
//! ```
//!
//! Everything except `contextId` has a default.

use crate::errors::ConfigError;
use hsuforum_dom::{Selector, SelectorError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleConfig {
    /// Context id sent with every server call
    pub context_id: u64,

    /// Session key sent with state-changing calls
    #[serde(default)]
    pub sesskey: String,

    /// How often to check whether the advanced editor has loaded
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for the editor after this many checks (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_poll_limit: Option<u32>,

    #[serde(default)]
    pub strings: Strings,

    #[serde(default)]
    pub selectors: Selectors,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ArticleConfig {
    pub fn new(context_id: u64) -> Self {
        Self {
            context_id,
            sesskey: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            editor_poll_limit: None,
            strings: Strings::default(),
            selectors: Selectors::default(),
        }
    }

    pub fn with_sesskey(mut self, sesskey: impl Into<String>) -> Self {
        self.sesskey = sesskey.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Localised UI strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strings {
    #[serde(rename = "loadingeditor")]
    pub loading_editor: String,

    #[serde(rename = "hideadvancededitor")]
    pub hide_advanced_editor: String,

    #[serde(rename = "useadvancededitor")]
    pub use_advanced_editor: String,

    #[serde(rename = "deletesure")]
    pub delete_sure: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            loading_editor: "Loading editor...".to_string(),
            hide_advanced_editor: "Hide advanced editor".to_string(),
            use_advanced_editor: "Use advanced editor".to_string(),
            delete_sure: "Are you sure you want to delete this post?".to_string(),
        }
    }
}

/// Selectors for every page element the controller touches.
///
/// `discussion_by_id` and `post_by_id` are templates; `%d` is replaced with
/// the id before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selectors {
    pub container: String,
    pub container_links: String,
    pub search_page: String,
    pub add_discussion: String,
    pub link_cancel: String,
    pub rate_popup: String,
    pub form: String,
    pub textarea: String,
    pub use_advanced: String,
    pub post_unread: String,
    pub discussion_by_id: String,
    pub post_by_id: String,
    pub editor_container: String,
    pub editor_editable: String,
    pub editor_field: String,
    pub editor_wrapper: String,
    pub live_log: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: ".mod-hsuforum-posts-container".to_string(),
            container_links: ".mod-hsuforum-posts-container a".to_string(),
            search_page: "#page-mod-hsuforum-search".to_string(),
            add_discussion: "#newdiscussionform".to_string(),
            link_cancel: "a.hsuforum-cancel".to_string(),
            rate_popup: ".forum-post-rating a".to_string(),
            form: "form.hsuforum-form".to_string(),
            textarea: ".hsuforum-textarea".to_string(),
            use_advanced: ".hsuforum-use-advanced".to_string(),
            post_unread: ".hsuforum-post-unread".to_string(),
            discussion_by_id: r#".hsuforum-thread[data-discussionid="%d"]"#.to_string(),
            post_by_id: r#".hsuforum-post-target[data-postid="%d"]"#.to_string(),
            editor_container: "#hiddenadvancededitorcont".to_string(),
            editor_editable: "#hiddenadvancededitoreditable".to_string(),
            editor_field: "#hiddenadvancededitor".to_string(),
            editor_wrapper: ".editor_atto".to_string(),
            live_log: "#hsuforum-livelog".to_string(),
        }
    }
}

impl Selectors {
    /// Parse every selector up-front so bad configuration fails at startup
    pub fn compile(&self) -> Result<CompiledSelectors, ConfigError> {
        let parse = |name: &'static str, input: &str| {
            Selector::parse(input).map_err(|source| ConfigError::Selector { name, source })
        };

        // Templates are checked with a sample id.
        parse("discussionById", &self.discussion_by_id.replace("%d", "0"))?;
        parse("postById", &self.post_by_id.replace("%d", "0"))?;

        Ok(CompiledSelectors {
            container: parse("container", &self.container)?,
            container_links: parse("containerLinks", &self.container_links)?,
            search_page: parse("searchPage", &self.search_page)?,
            add_discussion: parse("addDiscussion", &self.add_discussion)?,
            link_cancel: parse("linkCancel", &self.link_cancel)?,
            rate_popup: parse("ratePopup", &self.rate_popup)?,
            form: parse("form", &self.form)?,
            textarea: parse("textarea", &self.textarea)?,
            use_advanced: parse("useAdvanced", &self.use_advanced)?,
            post_unread: parse("postUnread", &self.post_unread)?,
            editor_container: parse("editorContainer", &self.editor_container)?,
            editor_editable: parse("editorEditable", &self.editor_editable)?,
            editor_field: parse("editorField", &self.editor_field)?,
            editor_wrapper: parse("editorWrapper", &self.editor_wrapper)?,
            live_log: parse("liveLog", &self.live_log)?,
            discussion_by_id: self.discussion_by_id.clone(),
            post_by_id: self.post_by_id.clone(),
        })
    }
}

/// Parsed form of [`Selectors`]
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub container: Selector,
    pub container_links: Selector,
    pub search_page: Selector,
    pub add_discussion: Selector,
    pub link_cancel: Selector,
    pub rate_popup: Selector,
    pub form: Selector,
    pub textarea: Selector,
    pub use_advanced: Selector,
    pub post_unread: Selector,
    pub editor_container: Selector,
    pub editor_editable: Selector,
    pub editor_field: Selector,
    pub editor_wrapper: Selector,
    pub live_log: Selector,
    discussion_by_id: String,
    post_by_id: String,
}

impl CompiledSelectors {
    pub fn discussion_by_id(&self, discussion_id: u64) -> Result<Selector, SelectorError> {
        Selector::parse(&self.discussion_by_id.replace("%d", &discussion_id.to_string()))
    }

    pub fn post_by_id(&self, post_id: u64) -> Result<Selector, SelectorError> {
        Selector::parse(&self.post_by_id.replace("%d", &post_id.to_string()))
    }
}
