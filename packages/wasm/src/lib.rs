use hsuforum_article::{
    ArticleConfig, ArticleError, ArticleResult, Collaborators, DomUpdater, FormController, ForumArticle,
    ForumEvent, Gesture, HistoryRouter, PageLiveLog, Prompt, RequestId, ServerRequest, Transport,
    TransportError,
};
use hsuforum_dom::{NodeId, Page};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = window, js_name = confirm)]
    fn window_confirm(message: &str) -> bool;
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Request waiting to be picked up by the host's network layer
#[derive(Debug, Serialize)]
struct QueuedRequest {
    id: u32,
    request: ServerRequest,
}

#[derive(Debug, Default)]
struct Outbox {
    next_id: u32,
    queued: Vec<QueuedRequest>,
}

/// Queues requests for the host to send
struct QueueTransport(Rc<RefCell<Outbox>>);

impl Transport for QueueTransport {
    fn send(&self, request: ServerRequest) -> Result<RequestId, TransportError> {
        let mut outbox = self.0.borrow_mut();
        outbox.next_id += 1;
        let id = outbox.next_id;
        outbox.queued.push(QueuedRequest { id, request });
        Ok(RequestId(u64::from(id)))
    }
}

type CallLog = Rc<RefCell<Vec<Value>>>;

/// Hands markup updates to the host as JSON call records
struct HostDom(CallLog);

impl HostDom {
    fn record(&self, handler: &str, event: &ForumEvent) -> ArticleResult<()> {
        let event = serde_json::to_value(event).map_err(ArticleError::EventEncoding)?;
        self.0
            .borrow_mut()
            .push(json!({ "target": "dom", "handler": handler, "event": event }));
        Ok(())
    }
}

impl DomUpdater for HostDom {
    fn handle_update_discussion(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("updateDiscussion", event)
    }

    fn handle_notification(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("notification", event)
    }

    fn handle_discussion_created(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("discussionCreated", event)
    }

    fn handle_discussion_deleted(&mut self, _page: &mut Page, event: &ForumEvent) -> ArticleResult<()> {
        self.record("discussionDeleted", event)
    }

    fn handle_view_rating(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<()> {
        self.0
            .borrow_mut()
            .push(json!({ "target": "dom", "handler": "viewRating", "node": target }));
        Ok(())
    }
}

/// Hands form work to the host; completions come back through `fire`
struct HostForms(CallLog);

impl HostForms {
    fn record(&self, handler: &str, node: NodeId) {
        self.0
            .borrow_mut()
            .push(json!({ "target": "form", "handler": handler, "node": node }));
    }
}

impl FormController for HostForms {
    fn handle_form_paste(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<()> {
        self.record("paste", target);
        Ok(())
    }

    fn handle_cancel_form(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>> {
        self.record("cancel", target);
        Ok(Vec::new())
    }

    fn handle_form_submit(&mut self, _page: &mut Page, target: NodeId) -> ArticleResult<Vec<ForumEvent>> {
        self.record("submit", target);
        Ok(Vec::new())
    }
}

struct BrowserPrompt;

impl Prompt for BrowserPrompt {
    fn confirm(&self, message: &str) -> bool {
        window_confirm(message)
    }
}

fn node(id: u32) -> NodeId {
    NodeId(id as usize)
}

fn request_id(id: RequestId) -> Result<u32, JsValue> {
    u32::try_from(id.0).map_err(|_| JsValue::from_str(&format!("Request id out of range: {}", id)))
}

fn article_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("Article error: {}", e))
}

/// Forum page controller bound to a JSON page snapshot
#[wasm_bindgen]
pub struct ForumArticleHandle {
    article: ForumArticle,
    outbox: Rc<RefCell<Outbox>>,
    calls: CallLog,
}

#[wasm_bindgen]
impl ForumArticleHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, page_json: &str, location: &str) -> Result<ForumArticleHandle, JsValue> {
        let config = ArticleConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?;
        let page = Page::from_json(page_json)
            .map_err(|e| JsValue::from_str(&format!("Page error: {}", e)))?;
        let router = HistoryRouter::parse(location)
            .map_err(|e| JsValue::from_str(&format!("Location error: {}", e)))?;
        let live_log = config
            .selectors
            .compile()
            .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?
            .live_log;
        let live_log_id = config
            .selectors
            .live_log
            .trim_start_matches('#')
            .to_string();

        let outbox = Rc::new(RefCell::new(Outbox::default()));
        let calls = CallLog::default();
        let wired = calls.clone();
        let article = ForumArticle::new(config, page, Box::new(QueueTransport(outbox.clone())), |_io| {
            Collaborators {
                dom: Box::new(HostDom(wired.clone())),
                router: Box::new(router),
                form: Box::new(HostForms(wired)),
                live_log: Box::new(PageLiveLog::new(live_log, live_log_id)),
                prompt: Box::new(BrowserPrompt),
            }
        })
        .map_err(article_error)?;

        Ok(ForumArticleHandle {
            article,
            outbox,
            calls,
        })
    }

    #[wasm_bindgen(js_name = confirmDeletePost)]
    pub fn confirm_delete_post(&mut self, post_id: u32) -> Result<Option<u32>, JsValue> {
        self.article
            .confirm_delete_post(u64::from(post_id))
            .map_err(article_error)?
            .map(request_id)
            .transpose()
    }

    #[wasm_bindgen(js_name = deletePost)]
    pub fn delete_post(&mut self, post_id: u32) -> Result<Option<u32>, JsValue> {
        self.article
            .delete_post(u64::from(post_id))
            .map_err(article_error)?
            .map(request_id)
            .transpose()
    }

    #[wasm_bindgen(js_name = viewDiscussion)]
    pub fn view_discussion(&mut self, discussion_id: u32, post_id: Option<u32>) -> Result<(), JsValue> {
        self.article
            .view_discussion(u64::from(discussion_id), post_id.map(u64::from))
            .map_err(article_error)
    }

    #[wasm_bindgen(js_name = toggleAdvancedEditor)]
    pub fn toggle_advanced_editor(
        &mut self,
        control: Option<u32>,
        force_hide: bool,
        keep: Option<u32>,
    ) -> Result<(), JsValue> {
        self.article
            .toggle_advanced_editor(control.map(node), force_hide, keep.map(node))
            .map_err(article_error)
    }

    #[wasm_bindgen(js_name = restoreEditor)]
    pub fn restore_editor(&mut self) -> Result<(), JsValue> {
        self.article
            .restore_to_original_position()
            .map_err(article_error)
    }

    /// Returns true when the native default action must be prevented
    pub fn dispatch(&mut self, gesture: &str, target: u32) -> Result<bool, JsValue> {
        let gesture: Gesture = serde_json::from_value(Value::String(gesture.to_string()))
            .map_err(|e| JsValue::from_str(&format!("Unknown gesture `{}`: {}", gesture, e)))?;
        let outcome = self
            .article
            .dispatch(gesture, node(target))
            .map_err(article_error)?;
        Ok(outcome.default_prevented)
    }

    pub fn tick(&mut self, elapsed_ms: u32) -> Result<(), JsValue> {
        self.article
            .tick(Duration::from_millis(u64::from(elapsed_ms)))
            .map_err(article_error)
    }

    /// Mirror a user edit into the page model
    #[wasm_bindgen(js_name = setContent)]
    pub fn set_content(&mut self, target: u32, content: &str) -> Result<(), JsValue> {
        self.article
            .page_mut()
            .set_content(node(target), content)
            .map_err(article_error)
    }

    #[wasm_bindgen(js_name = completeRequest)]
    pub fn complete_request(&mut self, id: u32, response_json: &str) -> Result<(), JsValue> {
        let response: Value = serde_json::from_str(response_json)
            .map_err(|e| JsValue::from_str(&format!("Response error: {}", e)))?;
        self.article
            .complete_request(RequestId(u64::from(id)), response)
            .map_err(article_error)
    }

    /// Fire a `{"type": ..., "payload": ...}` event
    pub fn fire(&mut self, event_json: &str) -> Result<(), JsValue> {
        let event: ForumEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Event error: {}", e)))?;
        self.article.fire(event).map_err(article_error)
    }

    /// Queued server requests as JSON, oldest first
    #[wasm_bindgen(js_name = takeRequests)]
    pub fn take_requests(&mut self) -> Result<String, JsValue> {
        let queued = std::mem::take(&mut self.outbox.borrow_mut().queued);
        serde_json::to_string(&queued)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Collaborator calls for the host to perform, as JSON
    #[wasm_bindgen(js_name = takeCalls)]
    pub fn take_calls(&mut self) -> Result<String, JsValue> {
        let calls = std::mem::take(&mut *self.calls.borrow_mut());
        serde_json::to_string(&calls)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Current page snapshot as JSON
    pub fn page(&self) -> Result<String, JsValue> {
        self.article.page().to_json().map_err(article_error)
    }
}
