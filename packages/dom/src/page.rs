//! # Page
//!
//! Arena-backed document model for one forum page.
//!
//! ## Design
//!
//! - Nodes live in a `Vec` and are addressed by [`NodeId`]; removing a node
//!   only disconnects it, so ids held by callers stay valid
//! - All mutation goes through `Page`, which reports it to content
//!   observations registered with [`Page::observe`]
//! - Observations accumulate pending notifications; the owner drains them
//!   with [`Page::take_notifications`] on its next turn of the event loop
//!
//! Two observation modes exist, mirroring what a browser offers:
//!
//! - [`ObserverMode::Batched`]: mutation-observer semantics. Character data and
//!   child list changes in the subtree are coalesced into one notification per
//!   delivery.
//! - [`ObserverMode::PerChange`]: character-data event semantics. One
//!   notification per content change, child list changes are not reported.

use crate::{DomError, DomResult, Node, NodeId, Selector};
use serde::{Deserialize, Serialize};

/// What the hosting runtime supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Native batched mutation observation is available
    pub mutation_observer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mutation_observer: true,
        }
    }
}

/// Handle for a registered content observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverMode {
    Batched,
    PerChange,
}

/// Kind of change recorded against a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CharacterData,
    ChildList,
    Attributes,
}

#[derive(Debug, Clone)]
struct Observation {
    id: ObservationId,
    target: NodeId,
    mode: ObserverMode,
    pending: usize,
}

impl Observation {
    fn wants(&self, kind: MutationKind) -> bool {
        match (self.mode, kind) {
            (_, MutationKind::Attributes) => false,
            (ObserverMode::PerChange, MutationKind::ChildList) => false,
            _ => true,
        }
    }
}

/// A forum page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    nodes: Vec<Node>,

    root: NodeId,

    #[serde(default)]
    focused: Option<NodeId>,

    #[serde(default)]
    scrolled_to: Option<NodeId>,

    /// Fragment of the current location, including the leading `#`
    #[serde(default)]
    location_hash: String,

    #[serde(default)]
    capabilities: Capabilities,

    #[serde(skip)]
    observations: Vec<Observation>,

    #[serde(skip)]
    next_observation: u64,
}

impl Page {
    /// Create an empty page holding only a `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::element("body")],
            root: NodeId(0),
            focused: None,
            scrolled_to: None,
            location_hash: String::new(),
            capabilities: Capabilities::default(),
            observations: Vec::new(),
            next_observation: 0,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Restore a page from its JSON snapshot
    pub fn from_json(json: &str) -> DomResult<Self> {
        let page: Page = serde_json::from_str(json)?;
        page.validate()?;
        Ok(page)
    }

    pub fn to_json(&self) -> DomResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that parent and child links agree
    fn validate(&self) -> DomResult<()> {
        self.node(self.root)?;
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            for child in &node.children {
                if self.node(*child)?.parent != Some(id) {
                    return Err(DomError::Snapshot(format!(
                        "{} lists {} as a child but the child disagrees",
                        id, child
                    )));
                }
            }
            if let Some(parent) = node.parent {
                if !self.node(parent)?.children.contains(&id) {
                    return Err(DomError::Snapshot(format!(
                        "{} names {} as parent but is not among its children",
                        id, parent
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Strict ancestors, closest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            page: self,
            next: self.parent(id),
        }
    }

    /// Strict descendants in document order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { page: self, stack }
    }

    /// Is `node` inside `ancestor` (or the same node)?
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Is `node` reachable from the root?
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    /// Insert a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, node: Node) -> DomResult<NodeId> {
        self.node(parent)?;
        let id = self.create(node);
        self.attach(parent, id, None)?;
        Ok(id)
    }

    /// Add a node to the arena without connecting it
    pub fn create(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.attach(parent, child, None)
    }

    /// Move `node` so it immediately precedes `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> DomResult<()> {
        if reference == node {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        self.check_insert(parent, node)?;
        self.detach(node);

        let index = self
            .children(parent)
            .iter()
            .position(|id| *id == reference)
            .ok_or(DomError::Detached(reference))?;
        self.attach(parent, node, Some(index))
    }

    /// Disconnect a node from its parent; the node stays addressable
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        if node == self.root {
            return Err(DomError::HierarchyRequest {
                node,
                parent: self.root,
            });
        }
        self.detach(node);
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, node: NodeId) -> DomResult<()> {
        self.node(parent)?;
        self.node(node)?;
        if node == self.root || self.contains(node, parent) {
            return Err(DomError::HierarchyRequest { node, parent });
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node.0).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.retain(|child| *child != node);
        }
        self.record(parent, MutationKind::ChildList);
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, index: Option<usize>) -> DomResult<()> {
        let children = &mut self.node_mut(parent)?.children;
        match index {
            Some(index) if index <= children.len() => children.insert(index, node),
            _ => children.push(node),
        }
        self.node_mut(node)?.parent = Some(parent);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Node state
    // ---------------------------------------------------------------------

    pub fn content(&self, id: NodeId) -> DomResult<&str> {
        Ok(self.node(id)?.content.as_str())
    }

    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> DomResult<()> {
        self.node_mut(id)?.content = content.into();
        self.record(id, MutationKind::CharacterData);
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|node| node.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let name = name.into();
        let value = value.into();
        let node = self.node_mut(id)?;
        if name == "id" {
            node.id = Some(value);
        } else {
            node.attributes.insert(name, value);
        }
        self.record(id, MutationKind::Attributes);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let node = self.node_mut(id)?;
        let removed = if name == "id" {
            node.id.take().is_some()
        } else {
            node.attributes.remove(name).is_some()
        };
        if removed {
            self.record(id, MutationKind::Attributes);
        }
        Ok(removed)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|node| node.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let node = self.node_mut(id)?;
        if !node.has_class(class) {
            node.classes.push(class.to_string());
            self.record(id, MutationKind::Attributes);
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let node = self.node_mut(id)?;
        let before = node.classes.len();
        node.classes.retain(|c| c != class);
        if node.classes.len() != before {
            self.record(id, MutationKind::Attributes);
        }
        Ok(())
    }

    pub fn set_style(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        self.node_mut(id)?.styles.insert(name.into(), value.into());
        self.record(id, MutationKind::Attributes);
        Ok(())
    }

    pub fn show(&mut self, id: NodeId) -> DomResult<()> {
        self.set_hidden(id, false)
    }

    pub fn hide(&mut self, id: NodeId) -> DomResult<()> {
        self.set_hidden(id, true)
    }

    fn set_hidden(&mut self, id: NodeId, hidden: bool) -> DomResult<()> {
        let node = self.node_mut(id)?;
        if node.hidden != hidden {
            node.hidden = hidden;
            self.record(id, MutationKind::Attributes);
        }
        Ok(())
    }

    /// Computed `display: none` of the node itself
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.get(id).map_or(true, |node| node.hidden)
    }

    pub fn focus(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        self.focused = Some(id);
        Ok(())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn scroll_into_view(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        self.scrolled_to = Some(id);
        Ok(())
    }

    pub fn scrolled_to(&self) -> Option<NodeId> {
        self.scrolled_to
    }

    pub fn location_hash(&self) -> &str {
        &self.location_hash
    }

    pub fn set_location_hash(&mut self, hash: impl Into<String>) {
        self.location_hash = hash.into();
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        selector.matches(self, id)
    }

    /// First connected node matching `selector`, in document order
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|id| selector.matches(self, *id))
    }

    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// First strict descendant of `scope` matching `selector`
    pub fn query_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope).find(|id| selector.matches(self, *id))
    }

    /// Closest strict ancestor matching `selector`
    pub fn ancestor(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.ancestors(id).find(|ancestor| selector.matches(self, *ancestor))
    }

    /// Closest preceding sibling matching `selector`
    pub fn previous_sibling(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|sibling| selector.matches(self, *sibling))
    }

    // ---------------------------------------------------------------------
    // Content observation
    // ---------------------------------------------------------------------

    /// Watch the subtree rooted at `target`
    pub fn observe(&mut self, target: NodeId, mode: ObserverMode) -> DomResult<ObservationId> {
        self.node(target)?;
        let id = ObservationId(self.next_observation);
        self.next_observation += 1;
        self.observations.push(Observation {
            id,
            target,
            mode,
            pending: 0,
        });
        tracing::trace!(?id, %target, ?mode, "observation registered");
        Ok(id)
    }

    /// Drop an observation; pending notifications are discarded
    pub fn disconnect(&mut self, id: ObservationId) -> bool {
        let before = self.observations.len();
        self.observations.retain(|observation| observation.id != id);
        before != self.observations.len()
    }

    /// Number of callbacks due for `id`, resetting the pending count
    pub fn take_notifications(&mut self, id: ObservationId) -> usize {
        let Some(observation) = self.observations.iter_mut().find(|o| o.id == id) else {
            return 0;
        };
        let pending = std::mem::take(&mut observation.pending);
        match observation.mode {
            ObserverMode::Batched => pending.min(1),
            ObserverMode::PerChange => pending,
        }
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    fn record(&mut self, node: NodeId, kind: MutationKind) {
        for index in 0..self.observations.len() {
            let observation = &self.observations[index];
            if observation.wants(kind) && self.contains(observation.target, node) {
                self.observations[index].pending += 1;
            }
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    page: &'a Page,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.page.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    page: &'a Page,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.page.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(input: &str) -> Selector {
        Selector::parse(input).unwrap()
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut page = Page::new();
        let root = page.root();
        let first = page.append(root, Node::element("div").with_id("first")).unwrap();
        let second = page.append(root, Node::element("div").with_id("second")).unwrap();

        page.insert_before(first, second).unwrap();

        assert_eq!(page.children(root), &[second, first]);
        assert_eq!(page.parent(second), Some(root));
    }

    #[test]
    fn test_cannot_insert_into_own_subtree() {
        let mut page = Page::new();
        let outer = page.append(page.root(), Node::element("div")).unwrap();
        let inner = page.append(outer, Node::element("div")).unwrap();

        assert_eq!(
            page.append_child(inner, outer),
            Err(DomError::HierarchyRequest {
                node: outer,
                parent: inner
            })
        );
    }

    #[test]
    fn test_removed_nodes_are_not_queried() {
        let mut page = Page::new();
        let node = page
            .append(page.root(), Node::element("div").with_class("hsuforum-post-unread"))
            .unwrap();

        assert_eq!(page.query(&sel(".hsuforum-post-unread")), Some(node));
        page.remove(node).unwrap();
        assert_eq!(page.query(&sel(".hsuforum-post-unread")), None);
        assert!(page.get(node).is_some());
    }

    #[test]
    fn test_previous_sibling_skips_non_matching() {
        let mut page = Page::new();
        let form = page.append(page.root(), Node::element("form")).unwrap();
        let textarea = page
            .append(form, Node::element("div").with_class("hsuforum-textarea"))
            .unwrap();
        page.append(form, Node::element("span")).unwrap();
        let link = page
            .append(form, Node::element("a").with_class("hsuforum-use-advanced"))
            .unwrap();

        assert_eq!(page.previous_sibling(link, &sel(".hsuforum-textarea")), Some(textarea));
        assert_eq!(page.previous_sibling(textarea, &sel(".hsuforum-textarea")), None);
    }

    #[test]
    fn test_batched_observation_coalesces() {
        let mut page = Page::new();
        let editable = page.append(page.root(), Node::element("div")).unwrap();
        let id = page.observe(editable, ObserverMode::Batched).unwrap();

        page.set_content(editable, "a").unwrap();
        page.set_content(editable, "ab").unwrap();
        page.append(editable, Node::element("br")).unwrap();

        assert_eq!(page.take_notifications(id), 1);
        assert_eq!(page.take_notifications(id), 0);
    }

    #[test]
    fn test_per_change_observation_counts_character_data_only() {
        let mut page = Page::new();
        let editable = page.append(page.root(), Node::element("div")).unwrap();
        let id = page.observe(editable, ObserverMode::PerChange).unwrap();

        page.set_content(editable, "a").unwrap();
        page.set_content(editable, "ab").unwrap();
        page.append(editable, Node::element("br")).unwrap();
        page.set_attribute(editable, "aria-label", "editor").unwrap();

        assert_eq!(page.take_notifications(id), 2);
    }

    #[test]
    fn test_changes_outside_target_are_ignored() {
        let mut page = Page::new();
        let editable = page.append(page.root(), Node::element("div")).unwrap();
        let widget = page.append(page.root(), Node::element("div")).unwrap();
        let id = page.observe(editable, ObserverMode::Batched).unwrap();

        page.set_content(widget, "plain").unwrap();
        assert_eq!(page.take_notifications(id), 0);

        assert!(page.disconnect(id));
        assert!(!page.disconnect(id));
        assert_eq!(page.observation_count(), 0);
    }

    #[test]
    fn test_snapshot_round_trip_keeps_structure() {
        let mut page = Page::new();
        let thread = page
            .append(page.root(), Node::element("article").with_attr("data-discussionid", "3"))
            .unwrap();
        page.append(thread, Node::element("p").with_content("hello")).unwrap();
        page.set_location_hash("#unread");

        let restored = Page::from_json(&page.to_json().unwrap()).unwrap();
        assert_eq!(restored.children(thread).len(), 1);
        assert_eq!(restored.location_hash(), "#unread");
    }
}
