//! Shared fixtures: a forum page and recording collaborators

#![allow(dead_code)]

use hsuforum_article::{
    ArticleConfig, ArticleError, ArticleResult, Collaborators, DomUpdater, FormController,
    ForumArticle, ForumEvent, LiveLog, Node, NodeId, Page, Prompt, RequestId, Route,
    ServerRequest, Transport, TransportError, UrlRouter,
};
use std::cell::RefCell;
use std::rc::Rc;

pub type Calls = Rc<RefCell<Vec<String>>>;
pub type Sent = Rc<RefCell<Vec<ServerRequest>>>;

pub const CONTEXT_ID: u64 = 42;
pub const SESSKEY: &str = "s3ss";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

// -------------------------------------------------------------------------
// Page fixture
// -------------------------------------------------------------------------

pub struct PostForm {
    pub form: NodeId,
    pub widget: NodeId,
    pub control: NodeId,
    pub cancel: NodeId,
}

pub struct ForumPage {
    pub page: Page,
    pub container: NodeId,
    pub discussion: NodeId,
    /// Post 10, the discussion's first post
    pub root_post: NodeId,
    /// Post 11, a reply
    pub reply: NodeId,
    pub rating: NodeId,
    pub link: NodeId,
    pub forms: Vec<PostForm>,
    pub editor_container: NodeId,
    pub editable: NodeId,
    /// Hidden backing field that travels with the editor
    pub field: NodeId,
    pub wrapper: Option<NodeId>,
}

impl ForumPage {
    /// Simulate the rich editor finishing its load
    pub fn load_editor(page: &mut Page, editor_container: NodeId, editable: NodeId) -> NodeId {
        let wrapper = page
            .append(editor_container, Node::element("div").with_class("editor_atto"))
            .unwrap();
        page.append_child(wrapper, editable).unwrap();
        wrapper
    }
}

/// A discussion with posts 10 (root) and 11 (reply) and one reply form per
/// entry of `drafts`
pub fn forum_page(drafts: &[&str], editor_loaded: bool) -> ForumPage {
    let mut page = Page::new();
    let root = page.root();

    let container = page
        .append(root, Node::element("div").with_class("mod-hsuforum-posts-container"))
        .unwrap();
    let discussion = page
        .append(
            container,
            Node::element("article")
                .with_class("hsuforum-thread")
                .with_attr("data-discussionid", "1"),
        )
        .unwrap();

    let root_parent = page.append(discussion, Node::element("div")).unwrap();
    let root_post = page
        .append(
            root_parent,
            Node::element("div")
                .with_class("hsuforum-post-target")
                .with_attr("data-postid", "10")
                .with_attr("data-isdiscussion", ""),
        )
        .unwrap();
    let reply_parent = page.append(discussion, Node::element("div")).unwrap();
    let reply = page
        .append(
            reply_parent,
            Node::element("div")
                .with_class("hsuforum-post-target")
                .with_attr("data-postid", "11"),
        )
        .unwrap();

    let rating_wrapper = page
        .append(reply_parent, Node::element("div").with_class("forum-post-rating"))
        .unwrap();
    let rating = page
        .append(rating_wrapper, Node::element("a").with_attr("href", "rate.php"))
        .unwrap();
    let link = page
        .append(
            discussion,
            Node::element("a").with_attr("href", "discuss.php?d=1#p11"),
        )
        .unwrap();

    let mut forms = Vec::new();
    for draft in drafts {
        let form = page
            .append(discussion, Node::element("form").with_class("hsuforum-form"))
            .unwrap();
        let widget = page
            .append(
                form,
                Node::element("div")
                    .with_class("hsuforum-textarea")
                    .with_content(*draft),
            )
            .unwrap();
        let control = page
            .append(
                form,
                Node::element("a")
                    .with_class("hsuforum-use-advanced")
                    .with_class("hideadvancededitor")
                    .with_attr("href", "#")
                    .with_attr("aria-pressed", "false")
                    .with_content("Use advanced editor"),
            )
            .unwrap();
        let cancel = page
            .append(
                form,
                Node::element("a")
                    .with_class("hsuforum-cancel")
                    .with_attr("href", "#"),
            )
            .unwrap();
        forms.push(PostForm {
            form,
            widget,
            control,
            cancel,
        });
    }

    let editor_container = page
        .append(
            root,
            Node::element("div")
                .with_id("hiddenadvancededitorcont")
                .hidden(),
        )
        .unwrap();
    let editable = page
        .append(
            editor_container,
            Node::element("div").with_id("hiddenadvancededitoreditable"),
        )
        .unwrap();
    let field = page
        .append(
            editor_container,
            Node::element("textarea").with_id("hiddenadvancededitor"),
        )
        .unwrap();

    let wrapper = editor_loaded
        .then(|| ForumPage::load_editor(&mut page, editor_container, editable));

    ForumPage {
        page,
        container,
        discussion,
        root_post,
        reply,
        rating,
        link,
        forms,
        editor_container,
        editable,
        field,
        wrapper,
    }
}

// -------------------------------------------------------------------------
// Recording collaborators
// -------------------------------------------------------------------------

pub struct RecordingDom {
    pub calls: Calls,
    pub fail_on: Option<&'static str>,
}

impl RecordingDom {
    fn record(&self, handler: &'static str, event: &ForumEvent) -> ArticleResult<()> {
        self.calls
            .borrow_mut()
            .push(format!("dom.{handler}:{}", event.kind()));
        if self.fail_on == Some(handler) {
            return Err(ArticleError::Transport(TransportError::Rejected(
                handler.to_string(),
            )));
        }
        Ok(())
    }
}

impl DomUpdater for RecordingDom {
    fn handle_update_discussion(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("update_discussion", event)
    }

    fn handle_notification(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("notification", event)
    }

    fn handle_discussion_created(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("discussion_created", event)
    }

    fn handle_discussion_deleted(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("discussion_deleted", event)
    }

    fn handle_view_rating(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<()> {
        self.calls.borrow_mut().push(format!("dom.view_rating:{target}"));
        Ok(())
    }
}

pub struct RecordingRouter {
    pub calls: Calls,
}

impl UrlRouter for RecordingRouter {
    fn handle_route(&mut self, _page: &Page, target: NodeId) -> ArticleResult<Option<Route>> {
        self.calls.borrow_mut().push(format!("router.route:{target}"));
        Ok(None)
    }

    fn handle_view_discussion(&mut self, event: &ForumEvent) -> ArticleResult<()> {
        self.calls
            .borrow_mut()
            .push(format!("router.view_discussion:{}", event.kind()));
        Ok(())
    }

    fn handle_add_discussion_route(&mut self, _page: &Page, target: NodeId) -> ArticleResult<()> {
        self.calls
            .borrow_mut()
            .push(format!("router.add_discussion:{target}"));
        Ok(())
    }
}

pub struct RecordingForm {
    pub calls: Calls,
    pub submit_events: Vec<ForumEvent>,
    pub cancel_events: Vec<ForumEvent>,
}

impl FormController for RecordingForm {
    fn handle_form_paste(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<()> {
        self.calls.borrow_mut().push(format!("form.paste:{target}"));
        Ok(())
    }

    fn handle_cancel_form(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>> {
        self.calls.borrow_mut().push(format!("form.cancel:{target}"));
        Ok(self.cancel_events.clone())
    }

    fn handle_form_submit(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>> {
        self.calls.borrow_mut().push(format!("form.submit:{target}"));
        Ok(self.submit_events.clone())
    }
}

pub struct RecordingLiveLog {
    pub calls: Calls,
}

impl LiveLog for RecordingLiveLog {
    fn log_text(&mut self, _page: &mut Page, message: &str) -> ArticleResult<()> {
        self.calls.borrow_mut().push(format!("livelog:{message}"));
        Ok(())
    }
}

pub struct ScriptedPrompt {
    pub calls: Calls,
    pub answer: bool,
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> bool {
        self.calls.borrow_mut().push(format!("prompt:{message}"));
        self.answer
    }
}

pub struct Outbox(pub Sent);

impl Transport for Outbox {
    fn send(&self, request: ServerRequest) -> Result<RequestId, TransportError> {
        let mut sent = self.0.borrow_mut();
        sent.push(request);
        Ok(RequestId(sent.len() as u64))
    }
}

// -------------------------------------------------------------------------
// Harness
// -------------------------------------------------------------------------

pub struct Options {
    pub config: ArticleConfig,
    pub confirm: bool,
    pub fail_on: Option<&'static str>,
    pub submit_events: Vec<ForumEvent>,
    pub cancel_events: Vec<ForumEvent>,
    pub router: Option<Box<dyn UrlRouter>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: ArticleConfig::new(CONTEXT_ID).with_sesskey(SESSKEY),
            confirm: true,
            fail_on: None,
            submit_events: Vec::new(),
            cancel_events: Vec::new(),
            router: None,
        }
    }
}

pub struct Harness {
    pub article: ForumArticle,
    pub calls: Calls,
    pub sent: Sent,
}

impl Harness {
    pub fn new(page: Page) -> anyhow::Result<Self> {
        Self::with_options(page, Options::default())
    }

    pub fn with_options(page: Page, options: Options) -> anyhow::Result<Self> {
        init_tracing();
        let calls: Calls = Rc::default();
        let sent: Sent = Rc::default();

        let router = match options.router {
            Some(router) => router,
            None => Box::new(RecordingRouter {
                calls: calls.clone(),
            }),
        };
        let wired = calls.clone();
        let article = ForumArticle::new(
            options.config,
            page,
            Box::new(Outbox(sent.clone())),
            move |_io| Collaborators {
                dom: Box::new(RecordingDom {
                    calls: wired.clone(),
                    fail_on: options.fail_on,
                }),
                router,
                form: Box::new(RecordingForm {
                    calls: wired.clone(),
                    submit_events: options.submit_events,
                    cancel_events: options.cancel_events,
                }),
                live_log: Box::new(RecordingLiveLog {
                    calls: wired.clone(),
                }),
                prompt: Box::new(ScriptedPrompt {
                    calls: wired,
                    answer: options.confirm,
                }),
            },
        )?;

        Ok(Self {
            article,
            calls,
            sent,
        })
    }

    /// Drain the recorded collaborator calls
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}
