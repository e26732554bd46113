//! # Gesture Routing
//!
//! Maps user gestures (click, submit, paste) on page nodes to controller
//! commands.
//!
//! ## Design
//!
//! Bindings are delegated: a binding names a selector and a scope, and a
//! gesture on any node inside the scope is matched by walking from the
//! gesture target up towards the scope root. Nodes added to the page after
//! binding are therefore covered without rebinding. A binding may instead be
//! attached to one fixed node.
//!
//! Bindings are evaluated in registration order and every matching binding
//! produces a [`Delegation`].

use crate::config::CompiledSelectors;
use hsuforum_dom::{NodeId, Page, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Click,
    Submit,
    Paste,
}

/// Controller operation a gesture resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    FormPaste,
    CancelForm,
    Route,
    ViewRating,
    AdvancedEditor,
    FormSubmit,
    AddDiscussionRoute,
}

/// Where a delegated binding listens
#[derive(Debug, Clone)]
pub enum Scope {
    /// The whole page
    Document,
    /// Descendants of the first node matching the selector at dispatch time
    Within(Selector),
}

#[derive(Debug, Clone)]
pub enum Target {
    Delegated { scope: Scope, selector: Selector },
    Node(NodeId),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub gesture: Gesture,
    pub target: Target,
    pub command: Command,
}

/// A matched binding: run `command` against `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delegation {
    pub command: Command,
    pub node: NodeId,
}

/// Ordered table of gesture bindings
#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    bindings: Vec<Binding>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The forum page bindings.
    ///
    /// The add-discussion form is bound directly, so it is only routed when
    /// present at bind time.
    pub fn forum_defaults(page: &Page, selectors: &CompiledSelectors) -> Self {
        let mut router = Self::new();
        router
            .bind(Gesture::Paste, Scope::Document, selectors.textarea.clone(), Command::FormPaste)
            .bind(Gesture::Click, Scope::Document, selectors.link_cancel.clone(), Command::CancelForm)
            .bind(Gesture::Click, Scope::Document, selectors.container_links.clone(), Command::Route)
            .bind(Gesture::Click, Scope::Document, selectors.rate_popup.clone(), Command::ViewRating)
            .bind(
                Gesture::Click,
                Scope::Document,
                selectors.use_advanced.clone(),
                Command::AdvancedEditor,
            )
            .bind(
                Gesture::Submit,
                Scope::Within(selectors.container.clone()),
                selectors.form.clone(),
                Command::FormSubmit,
            );

        if let Some(form) = page.query(&selectors.add_discussion) {
            router.on(Gesture::Submit, form, Command::AddDiscussionRoute);
        }
        router
    }

    /// Add a delegated binding
    pub fn bind(&mut self, gesture: Gesture, scope: Scope, selector: Selector, command: Command) -> &mut Self {
        self.bindings.push(Binding {
            gesture,
            target: Target::Delegated { scope, selector },
            command,
        });
        self
    }

    /// Add a binding on one node
    pub fn on(&mut self, gesture: Gesture, node: NodeId, command: Command) -> &mut Self {
        self.bindings.push(Binding {
            gesture,
            target: Target::Node(node),
            command,
        });
        self
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every binding matching a gesture on `target`, in registration order
    pub fn route(&self, page: &Page, gesture: Gesture, target: NodeId) -> Vec<Delegation> {
        if !page.is_connected(target) {
            return Vec::new();
        }

        self.bindings
            .iter()
            .filter(|binding| binding.gesture == gesture)
            .filter_map(|binding| {
                let node = match &binding.target {
                    Target::Node(node) => page.contains(*node, target).then_some(*node),
                    Target::Delegated { scope, selector } => {
                        closest_within(page, scope, selector, target)
                    }
                }?;
                Some(Delegation {
                    command: binding.command,
                    node,
                })
            })
            .collect()
    }
}

/// Closest node at or above `target` matching `selector` inside `scope`
fn closest_within(page: &Page, scope: &Scope, selector: &Selector, target: NodeId) -> Option<NodeId> {
    let boundary = match scope {
        Scope::Document => None,
        Scope::Within(scope) => {
            let root = page.query(scope)?;
            if root == target || !page.contains(root, target) {
                return None;
            }
            Some(root)
        }
    };

    std::iter::once(target)
        .chain(page.ancestors(target))
        .take_while(|node| Some(*node) != boundary)
        .find(|node| page.matches(*node, selector))
}
