//! # hsuforum DOM
//!
//! In-memory page model used by the forum article controller.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Page: arena of Nodes                        │
//! │  - tree moves (append / insert before)      │
//! │  - visibility, focus, attributes, content   │
//! │  - content observations (batched/per-change)│
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ Selector: delegated matching and lookups    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use hsuforum_dom::{Node, Page, Selector};
//!
//! let mut page = Page::new();
//! let form = page.append(page.root(), Node::element("form")).unwrap();
//! page.append(form, Node::element("div").with_class("hsuforum-textarea")).unwrap();
//!
//! let textarea = Selector::parse(".hsuforum-textarea").unwrap();
//! assert!(page.query(&textarea).is_some());
//! ```

mod error;
mod node;
mod page;
mod selector;
mod tokenizer;

pub use error::{DomError, DomResult, SelectorError};
pub use node::{Node, NodeId};
pub use page::{
    Ancestors, Capabilities, Descendants, MutationKind, ObservationId, ObserverMode, Page,
};
pub use selector::Selector;
pub use tokenizer::{tokenize, Token};
