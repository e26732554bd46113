//! # Forum Article Controller
//!
//! One [`ForumArticle`] drives one forum page. It owns the [`Page`], routes
//! user gestures to collaborators, sequences server calls and fires the
//! resulting domain events through the [`EventBus`].
//!
//! ## Event loop
//!
//! Nothing here blocks or spawns. The host advances time and delivers
//! server responses explicitly:
//!
//! ```text
//! gesture ──▶ dispatch ──▶ collaborator ──▶ events ──▶ fire ──▶ subscribers
//!                │
//!                └─▶ delete_post ──▶ Io::send ──▶ (host) ──▶ complete_request ──▶ fire
//!
//! tick(elapsed) ──▶ editor content sync
//!               └─▶ advanced editor polls (toggle once the editor loads)
//! ```
//!
//! Server responses are matched to their continuation by [`RequestId`];
//! polls are keyed by the control that started them, so repeated clicks on
//! a control that is still waiting for the editor do not stack.

use crate::bus::{DomHandler, EventBus, RouterHandler, Subscriber};
use crate::collaborators::{Collaborators, Route};
use crate::commands::{Command, CommandRouter, Gesture};
use crate::config::{ArticleConfig, CompiledSelectors};
use crate::editor::{EditorRelocator, MountState};
use crate::errors::{ArticleError, ArticleResult};
use crate::events::{DeletedPayload, ForumEvent};
use crate::io::{DeletePostRequest, Io, RequestId, Transport};
use hsuforum_dom::{NodeId, Page};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What the page should do with the native gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureOutcome {
    /// At least one binding matched
    pub handled: bool,
    /// The browser's default action (navigation, form post) is suppressed
    pub default_prevented: bool,
}

/// Work to resume when a server response arrives
#[derive(Debug, Clone, Copy)]
enum Continuation {
    DeletePost { post_id: u64, node: NodeId },
}

/// A control waiting for the advanced editor to load
#[derive(Debug, Clone, Copy)]
struct EditorPoll {
    control: NodeId,
    waited: Duration,
    checks: u32,
}

enum PollState {
    Ready,
    Waiting,
    Expired,
}

/// The forum page controller
pub struct ForumArticle {
    config: ArticleConfig,
    selectors: CompiledSelectors,
    page: Page,
    io: Rc<Io>,
    collaborators: Collaborators,
    relocator: EditorRelocator,
    commands: CommandRouter,
    bus: EventBus,
    pending: HashMap<RequestId, Continuation>,
    polls: Vec<EditorPoll>,
}

impl ForumArticle {
    /// Build the controller and bind it to `page`.
    ///
    /// `wire` receives the shared network client so collaborators that talk
    /// to the server can hold on to it.
    pub fn new(
        config: ArticleConfig,
        page: Page,
        transport: Box<dyn Transport>,
        wire: impl FnOnce(&Rc<Io>) -> Collaborators,
    ) -> ArticleResult<Self> {
        let selectors = config.selectors.compile()?;
        let io = Rc::new(Io::new(config.context_id, transport));
        let collaborators = wire(&io);
        let relocator = EditorRelocator::new(&page, &selectors, &config.strings);

        let mut article = Self {
            config,
            selectors,
            page,
            io,
            collaborators,
            relocator,
            commands: CommandRouter::new(),
            bus: EventBus::new(),
            pending: HashMap::new(),
            polls: Vec::new(),
        };
        article.bind()?;
        Ok(article)
    }

    fn bind(&mut self) -> ArticleResult<()> {
        if self.page.location_hash() == "#unread" {
            let unread = self.page.query(&self.selectors.post_unread);
            if let Some(post) = unread.and_then(|unread| self.page.parent(unread)) {
                self.page.scroll_into_view(post)?;
                self.page.focus(post)?;
            }
        }

        if self.page.query(&self.selectors.search_page).is_some() {
            info!("Not binding event handlers on search page");
            return Ok(());
        }
        if self.page.query(&self.selectors.container).is_none() {
            error!(container = %self.selectors.container, "Failed to bind event handlers");
            return Ok(());
        }

        self.commands = CommandRouter::forum_defaults(&self.page, &self.selectors);
        self.bus = EventBus::forum_defaults();
        debug!(bindings = self.commands.len(), "event handlers bound");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &ArticleConfig {
        &self.config
    }

    pub fn context_id(&self) -> u64 {
        self.config.context_id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Direct page access for the host (user typing, markup updates)
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    pub fn io(&self) -> &Rc<Io> {
        &self.io
    }

    pub fn editor(&self) -> &EditorRelocator {
        &self.relocator
    }

    pub fn editor_state(&self) -> MountState {
        self.relocator.state()
    }

    /// Were gesture bindings and event subscriptions installed?
    pub fn is_bound(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn commands(&self) -> &CommandRouter {
        &self.commands
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Is `control` waiting for the advanced editor to load?
    pub fn is_polling(&self, control: NodeId) -> bool {
        self.polls.iter().any(|poll| poll.control == control)
    }

    pub fn active_polls(&self) -> usize {
        self.polls.len()
    }

    // ---------------------------------------------------------------------
    // Gestures
    // ---------------------------------------------------------------------

    /// Run every command bound to `gesture` on `target`
    pub fn dispatch(&mut self, gesture: Gesture, target: NodeId) -> ArticleResult<GestureOutcome> {
        let mut outcome = GestureOutcome::default();

        for delegation in self.commands.route(&self.page, gesture, target) {
            outcome.handled = true;
            let node = delegation.node;
            debug!(?gesture, command = ?delegation.command, %node, "dispatching");

            match delegation.command {
                Command::FormPaste => {
                    self.collaborators.form.handle_form_paste(&mut self.page, node)?;
                }
                Command::CancelForm => {
                    outcome.default_prevented = true;
                    let events = self.collaborators.form.handle_cancel_form(&mut self.page, node)?;
                    self.fire_all(events)?;
                }
                Command::Route => {
                    if let Some(route) = self.collaborators.router.handle_route(&self.page, node)? {
                        outcome.default_prevented = true;
                        self.execute_route(route)?;
                    }
                }
                Command::ViewRating => {
                    outcome.default_prevented = true;
                    self.collaborators.dom.handle_view_rating(&mut self.page, node)?;
                }
                Command::AdvancedEditor => {
                    if self.advanced_editor_clicked(node)? {
                        outcome.default_prevented = true;
                    }
                }
                Command::FormSubmit => {
                    outcome.default_prevented = true;
                    let events = self.collaborators.form.handle_form_submit(&mut self.page, node)?;
                    self.fire_all(events)?;
                }
                Command::AddDiscussionRoute => {
                    self.collaborators
                        .router
                        .handle_add_discussion_route(&self.page, node)?;
                }
            }
        }

        Ok(outcome)
    }

    fn execute_route(&mut self, route: Route) -> ArticleResult<()> {
        match route {
            Route::ViewDiscussion {
                discussion_id,
                post_id,
            } => self.view_discussion(discussion_id, post_id),
        }
    }

    /// Returns whether the link's default action is suppressed
    fn advanced_editor_clicked(&mut self, control: NodeId) -> ArticleResult<bool> {
        // Without the hidden editor the link works as a plain link.
        if !self.relocator.has_container(&self.page) {
            return Ok(false);
        }

        if self.relocator.is_mount_available(&self.page) {
            self.relocator.toggle(&mut self.page, Some(control), false, None)?;
            return Ok(true);
        }

        if self.is_polling(control) {
            debug!(%control, "already waiting for the advanced editor");
            return Ok(true);
        }

        self.page
            .set_content(control, self.config.strings.loading_editor.as_str())?;
        self.page.set_attribute(control, "aria-disabled", "true")?;
        self.polls.push(EditorPoll {
            control,
            waited: Duration::ZERO,
            checks: 0,
        });
        debug!(%control, "advanced editor not loaded yet, polling");
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Event loop
    // ---------------------------------------------------------------------

    /// Advance the page clock by `elapsed`
    pub fn tick(&mut self, elapsed: Duration) -> ArticleResult<()> {
        self.relocator.sync(&mut self.page)?;
        self.advance_polls(elapsed)
    }

    fn advance_polls(&mut self, elapsed: Duration) -> ArticleResult<()> {
        if self.polls.is_empty() {
            return Ok(());
        }

        let interval = self.config.poll_interval().max(Duration::from_millis(1));
        let available = self.relocator.is_mount_available(&self.page);
        let limit = self.config.editor_poll_limit;

        let mut ready = Vec::new();
        let mut expired = Vec::new();
        for mut poll in std::mem::take(&mut self.polls) {
            poll.waited = poll.waited.saturating_add(elapsed);
            let due = u32::try_from(poll.waited.as_millis() / interval.as_millis())
                .unwrap_or(u32::MAX);

            let state = if due == 0 {
                PollState::Waiting
            } else if available {
                PollState::Ready
            } else {
                poll.checks = poll.checks.saturating_add(due);
                let remainder = poll.waited.as_millis() % interval.as_millis();
                poll.waited = Duration::from_millis(u64::try_from(remainder).unwrap_or(u64::MAX));
                match limit {
                    Some(limit) if poll.checks >= limit => PollState::Expired,
                    _ => PollState::Waiting,
                }
            };

            match state {
                PollState::Ready => ready.push(poll.control),
                PollState::Waiting => self.polls.push(poll),
                PollState::Expired => expired.push(poll),
            }
        }

        // Every poll is settled before the first error is reported.
        let mut errors = Vec::new();
        for poll in expired {
            warn!(control = %poll.control, checks = poll.checks, "gave up waiting for the advanced editor");
            if let Err(e) = self.reset_control(poll.control) {
                errors.push(e);
            }
        }

        for control in ready {
            debug!(%control, "advanced editor loaded");
            if let Err(e) = self.finish_poll(control) {
                warn!(%control, error = %e, "failed to attach the advanced editor");
                if let Err(e) = self.reset_control(control) {
                    warn!(%control, error = %e, "failed to reset the advanced editor control");
                }
                errors.push(e);
            }
        }

        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn finish_poll(&mut self, control: NodeId) -> ArticleResult<()> {
        self.page.remove_attribute(control, "aria-disabled")?;
        self.relocator.toggle(&mut self.page, Some(control), false, None)
    }

    /// Put a control that stopped waiting back to its idle label
    fn reset_control(&mut self, control: NodeId) -> ArticleResult<()> {
        self.page.remove_attribute(control, "aria-disabled")?;
        self.page
            .set_content(control, self.config.strings.use_advanced_editor.as_str())?;
        Ok(())
    }

    /// Resume the work waiting on request `id` with the server's parsed response
    pub fn complete_request(&mut self, id: RequestId, response: Value) -> ArticleResult<()> {
        let continuation = self
            .pending
            .remove(&id)
            .ok_or(ArticleError::UnknownRequest(id))?;

        match continuation {
            Continuation::DeletePost { post_id, node } => {
                let mut payload: DeletedPayload =
                    serde_json::from_value(response).map_err(ArticleError::Response)?;
                payload.post_id.get_or_insert(post_id);

                let event = if self.page.has_attribute(node, "data-isdiscussion") {
                    ForumEvent::DiscussionDeleted(payload)
                } else {
                    ForumEvent::PostDeleted(payload)
                };
                self.fire(event)
            }
        }
    }

    /// Forget request `id`; its response will no longer be handled
    pub fn abandon_request(&mut self, id: RequestId) -> bool {
        self.pending.remove(&id).is_some()
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Deliver `event` to its subscribers in order
    pub fn fire(&mut self, event: ForumEvent) -> ArticleResult<()> {
        let subscribers = self.bus.subscribers(event.kind()).to_vec();
        debug!(event = %event.kind(), subscribers = subscribers.len(), "firing event");

        for subscriber in subscribers {
            match subscriber {
                Subscriber::Dom(handler) => {
                    let dom = &mut self.collaborators.dom;
                    match handler {
                        DomHandler::UpdateDiscussion => {
                            dom.handle_update_discussion(&mut self.page, &event)?
                        }
                        DomHandler::Notification => dom.handle_notification(&mut self.page, &event)?,
                        DomHandler::DiscussionCreated => {
                            dom.handle_discussion_created(&mut self.page, &event)?
                        }
                        DomHandler::DiscussionDeleted => {
                            dom.handle_discussion_deleted(&mut self.page, &event)?
                        }
                    }
                }
                Subscriber::Router(RouterHandler::ViewDiscussion) => {
                    self.collaborators.router.handle_view_discussion(&event)?
                }
                Subscriber::LiveLog => self.handle_live_log(&event)?,
            }
        }
        Ok(())
    }

    fn fire_all(&mut self, events: Vec<ForumEvent>) -> ArticleResult<()> {
        for event in events {
            self.fire(event)?;
        }
        Ok(())
    }

    /// Forward the event's `livelog` message to the accessibility log
    pub fn handle_live_log(&mut self, event: &ForumEvent) -> ArticleResult<()> {
        if let Some(message) = event.livelog() {
            self.collaborators.live_log.log_text(&mut self.page, message)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Page surface
    // ---------------------------------------------------------------------

    /// Move focus to a discussion, or to one of its posts
    #[instrument(skip(self))]
    pub fn view_discussion(&mut self, discussion_id: u64, post_id: Option<u64>) -> ArticleResult<()> {
        let discussion = self.page.query(&self.selectors.discussion_by_id(discussion_id)?);
        let Some(discussion) = discussion else {
            error!("Cannot view discussion because discussion node not found");
            return Ok(());
        };

        let target = match post_id {
            Some(post_id) => match self.post_node(post_id)? {
                Some(post) if !self.page.has_attribute(post, "data-isdiscussion") => {
                    self.page.parent(post).unwrap_or(discussion)
                }
                _ => discussion,
            },
            None => discussion,
        };
        self.page.focus(target)?;
        Ok(())
    }

    /// Ask the user, then delete. Returns the request id when a request was sent.
    pub fn confirm_delete_post(&mut self, post_id: u64) -> ArticleResult<Option<RequestId>> {
        if self.post_node(post_id)?.is_none() {
            return Ok(None);
        }
        if !self.collaborators.prompt.confirm(&self.config.strings.delete_sure) {
            debug!(post_id, "delete declined");
            return Ok(None);
        }
        self.delete_post(post_id)
    }

    /// Send the delete request for a post present on the page
    #[instrument(skip(self))]
    pub fn delete_post(&mut self, post_id: u64) -> ArticleResult<Option<RequestId>> {
        let Some(node) = self.post_node(post_id)? else {
            debug!("post not on page");
            return Ok(None);
        };
        info!("Deleting post");

        let id = self
            .io
            .send(&DeletePostRequest::new(post_id, &self.config.sesskey))?;
        self.pending.insert(id, Continuation::DeletePost { post_id, node });
        Ok(Some(id))
    }

    /// Page-facing editor toggle
    pub fn toggle_advanced_editor(
        &mut self,
        control: Option<NodeId>,
        force_hide: bool,
        keep: Option<NodeId>,
    ) -> ArticleResult<()> {
        self.relocator.toggle(&mut self.page, control, force_hide, keep)
    }

    /// Park the editor back in its hidden container
    pub fn restore_to_original_position(&mut self) -> ArticleResult<()> {
        self.relocator.restore_to_original_position(&mut self.page)
    }

    fn post_node(&self, post_id: u64) -> ArticleResult<Option<NodeId>> {
        Ok(self.page.query(&self.selectors.post_by_id(post_id)?))
    }
}

impl std::fmt::Debug for ForumArticle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumArticle")
            .field("context_id", &self.config.context_id)
            .field("editor", &self.relocator.state())
            .field("pending", &self.pending.len())
            .field("polls", &self.polls.len())
            .finish_non_exhaustive()
    }
}
