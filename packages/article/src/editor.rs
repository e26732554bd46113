//! # Advanced Editor Relocation
//!
//! The page carries one rich editor, parked in a hidden container. Any plain
//! text widget can borrow it through its toggle control; the editor is moved
//! in front of the widget, takes over its content, and syncs edits back
//! until it is released.
//!
//! ## Design
//!
//! ```text
//!            request_attach(c)                 request_attach(c2)
//!   Idle ───────────────────────▶ Attached(c) ─────────────────────▶ Attached(c2)
//!    ▲                                 │        (detach c, then attach c2)
//!    └──────── request_detach ─────────┘
//! ```
//!
//! - At most one widget owns the editor; attaching always detaches every
//!   other owner first
//! - The content observer is disconnected before the editor leaves a widget,
//!   so a widget losing ownership never receives stale content
//! - Detaching copies the editor's content back only when the editor was
//!   actually showing
//!
//! Page markup the relocator expects:
//!
//! ```text
//! #hiddenadvancededitorcont            (hidden container)
//! ├── .editor_atto                     (wrapper, appears once the editor loads)
//! │   └── #hiddenadvancededitoreditable
//! └── #hiddenadvancededitor            (backing field)
//!
//! form
//! ├── .hsuforum-textarea               (plain text widget)
//! └── a.hsuforum-use-advanced          (toggle control)
//! ```

use crate::config::{CompiledSelectors, Strings};
use crate::errors::{ArticleError, ArticleResult};
use crate::observer::{ContentObserver, ObserverBackend};
use hsuforum_dom::{NodeId, Page, Selector};

/// Class carried by a control whose editor is not showing
pub const HIDE_CLASS: &str = "hideadvancededitor";

/// Who owns the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Idle,
    Attached { control: NodeId, widget: NodeId },
}

#[derive(Debug, Clone)]
struct EditorSelectors {
    container: Selector,
    editable: Selector,
    wrapper: Selector,
    field: Selector,
    textarea: Selector,
    toggle: Selector,
}

#[derive(Debug, Clone, Copy)]
struct Mount {
    wrapper: NodeId,
    editable: NodeId,
    field: Option<NodeId>,
}

/// Moves the single rich editor between plain text widgets
#[derive(Debug)]
pub struct EditorRelocator {
    selectors: EditorSelectors,
    hide_label: String,
    show_label: String,
    observer: ContentObserver,
    state: MountState,
    /// The editor's nodes, kept from the first attach on. A re-rendered
    /// discussion can take the editor off the page, where no selector
    /// finds it again.
    mount: Option<Mount>,
}

impl EditorRelocator {
    /// The observer backend is fixed here from the page's capabilities
    pub fn new(page: &Page, selectors: &CompiledSelectors, strings: &Strings) -> Self {
        Self {
            selectors: EditorSelectors {
                container: selectors.editor_container.clone(),
                editable: selectors.editor_editable.clone(),
                wrapper: selectors.editor_wrapper.clone(),
                field: selectors.editor_field.clone(),
                textarea: selectors.textarea.clone(),
                toggle: selectors.use_advanced.clone(),
            },
            hide_label: strings.hide_advanced_editor.clone(),
            show_label: strings.use_advanced_editor.clone(),
            observer: ContentObserver::new(ObserverBackend::detect(page)),
            state: MountState::Idle,
            mount: None,
        }
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn attached_control(&self) -> Option<NodeId> {
        match self.state {
            MountState::Attached { control, .. } => Some(control),
            MountState::Idle => None,
        }
    }

    pub fn attached_widget(&self) -> Option<NodeId> {
        match self.state {
            MountState::Attached { widget, .. } => Some(widget),
            MountState::Idle => None,
        }
    }

    pub fn observer_backend(&self) -> ObserverBackend {
        self.observer.backend()
    }

    pub fn observer_active(&self) -> bool {
        self.observer.is_active()
    }

    /// Is the hidden editor container part of the page?
    pub fn has_container(&self, page: &Page) -> bool {
        page.query(&self.selectors.container).is_some()
    }

    /// Has the rich editor finished loading?
    pub fn is_mount_available(&self, page: &Page) -> bool {
        self.mount(page).is_ok()
    }

    /// Plain text widget paired with a toggle control
    pub fn widget_for(&self, page: &Page, control: NodeId) -> ArticleResult<NodeId> {
        page.previous_sibling(control, &self.selectors.textarea)
            .ok_or(ArticleError::MissingWidget(control))
    }

    fn locate(&self, page: &Page) -> ArticleResult<Mount> {
        if !self.has_container(page) {
            return Err(ArticleError::MissingEditorContainer(
                self.selectors.container.to_string(),
            ));
        }
        let editable = page
            .query(&self.selectors.editable)
            .ok_or(ArticleError::MountUnavailable)?;
        let wrapper = page
            .ancestor(editable, &self.selectors.wrapper)
            .ok_or(ArticleError::MountUnavailable)?;

        Ok(Mount {
            wrapper,
            editable,
            field: page.query(&self.selectors.field),
        })
    }

    fn mount(&self, page: &Page) -> ArticleResult<Mount> {
        match self.mount {
            Some(mount) => Ok(mount),
            None => self.locate(page),
        }
    }

    /// Give the editor to `control`'s widget
    pub fn request_attach(&mut self, page: &mut Page, control: NodeId) -> ArticleResult<()> {
        page.node(control)?;
        if !page.is_connected(control) {
            return Err(ArticleError::DisconnectedControl(control));
        }
        let mount = self.mount(page)?;
        let widget = self.widget_for(page, control)?;

        self.force_detach_all(page, Some(control))?;
        if self.attached_control() == Some(control) {
            return Ok(());
        }

        if let Some(height) = page.node(widget)?.style("height").map(str::to_string) {
            page.set_style(mount.editable, "height", height)?;
        }

        page.hide(widget)?;
        page.show(mount.wrapper)?;
        page.insert_before(widget, mount.wrapper)?;
        if let Some(field) = mount.field {
            page.insert_before(widget, field)?;
        }

        let content = page.content(widget)?.to_string();
        page.set_content(mount.editable, content)?;
        page.focus(mount.editable)?;

        // Installed after the copy so the initial content is not echoed back.
        self.observer.subscribe(page, mount.editable, widget)?;
        self.mount = Some(mount);
        self.state = MountState::Attached { control, widget };
        self.present_control(page, control, true)?;

        tracing::debug!(%control, %widget, "advanced editor attached");
        Ok(())
    }

    /// Release the editor.
    ///
    /// With no `control`, whichever control owns the editor is released
    /// unless it is `keep`. A control that does not own the editor is left
    /// alone.
    pub fn request_detach(
        &mut self,
        page: &mut Page,
        control: Option<NodeId>,
        keep: Option<NodeId>,
    ) -> ArticleResult<()> {
        let MountState::Attached {
            control: owner,
            widget,
        } = self.state
        else {
            return Ok(());
        };
        if control.is_some_and(|control| control != owner) || keep == Some(owner) {
            return Ok(());
        }

        let mount = self.mount(page)?;

        self.observer.unsubscribe(page);
        self.present_control(page, owner, false)?;
        page.show(widget)?;
        if !page.is_hidden(mount.wrapper) {
            let content = page.content(mount.editable)?.to_string();
            page.set_content(widget, content)?;
        }
        page.hide(mount.wrapper)?;
        self.state = MountState::Idle;

        tracing::debug!(control = %owner, %widget, "advanced editor detached");
        Ok(())
    }

    /// Release the editor from every control except `except`
    pub fn force_detach_all(&mut self, page: &mut Page, except: Option<NodeId>) -> ArticleResult<()> {
        for control in page.query_all(&self.selectors.toggle) {
            if Some(control) == except {
                continue;
            }
            if self.attached_control() == Some(control) {
                self.request_detach(page, Some(control), None)?;
            }
        }

        // The owning control may no longer be on the page (re-rendered discussion).
        if let Some(owner) = self.attached_control() {
            if Some(owner) != except {
                tracing::debug!(control = %owner, "releasing editor from disconnected control");
                self.request_detach(page, Some(owner), None)?;
            }
        }
        Ok(())
    }

    /// Park the editor back in its hidden container. Safe to call repeatedly.
    pub fn restore_to_original_position(&mut self, page: &mut Page) -> ArticleResult<()> {
        let Some(container) = page.query(&self.selectors.container) else {
            return Ok(());
        };

        self.force_detach_all(page, None)?;

        let mount = match self.mount(page) {
            Ok(mount) => mount,
            Err(ArticleError::MountUnavailable) => return Ok(()),
            Err(e) => return Err(e),
        };
        if page.parent(mount.wrapper) != Some(container) {
            page.append_child(container, mount.wrapper)?;
        }
        if let Some(field) = mount.field {
            if page.parent(field) != Some(container) {
                page.append_child(container, field)?;
            }
        }
        Ok(())
    }

    /// Page-facing toggle.
    ///
    /// - no control, `force_hide`: release everywhere except `keep`
    /// - control, `force_hide`: release that control
    /// - control: attach when un-pressed, release when pressed
    pub fn toggle(
        &mut self,
        page: &mut Page,
        control: Option<NodeId>,
        force_hide: bool,
        keep: Option<NodeId>,
    ) -> ArticleResult<()> {
        let Some(control) = control else {
            if force_hide {
                return self.force_detach_all(page, keep);
            }
            return Ok(());
        };

        if !self.has_container(page) {
            return Err(ArticleError::MissingEditorContainer(
                self.selectors.container.to_string(),
            ));
        }

        if force_hide || is_pressed(page, control) {
            self.request_detach(page, Some(control), keep)
        } else {
            self.request_attach(page, control)
        }
    }

    /// Deliver pending editor changes to the owning widget
    pub fn sync(&mut self, page: &mut Page) -> ArticleResult<usize> {
        Ok(self.observer.deliver(page)?)
    }

    fn present_control(&self, page: &mut Page, control: NodeId, pressed: bool) -> ArticleResult<()> {
        if pressed {
            page.set_attribute(control, "aria-pressed", "true")?;
            page.set_content(control, self.hide_label.as_str())?;
            page.remove_class(control, HIDE_CLASS)?;
        } else {
            page.set_attribute(control, "aria-pressed", "false")?;
            page.set_content(control, self.show_label.as_str())?;
            page.add_class(control, HIDE_CLASS)?;
        }
        Ok(())
    }
}

fn is_pressed(page: &Page, control: NodeId) -> bool {
    page.attribute(control, "aria-pressed") == Some("true")
}
