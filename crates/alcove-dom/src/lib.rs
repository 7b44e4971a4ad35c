//! Alcove DOM - Host document model
//!
//! Arena-based DOM tree standing in for the uncontrolled host page,
//! with the shadow-root and scoped-wrapper isolation boundaries the
//! widget engine builds on.

mod document;
mod isolate;
mod node;
mod query;
mod shadow;
mod styles;
mod tree;

pub use document::{ContainerTarget, HostDocument};
pub use isolate::{erect_boundary, DomContext, IsolationRequest};
pub use node::{ElementData, Node, NodeData};
pub use query::{query_all_within, query_within, SimpleSelector};
pub use shadow::{ShadowMode, ShadowRootData};
pub use styles::{StyleRegistry, STYLE_TAG_ATTR};
pub use tree::DomTree;

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

/// DOM error
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("node is not an element")]
    NotAnElement,

    #[error("node is already attached to a parent")]
    AlreadyAttached,

    #[error("shadow roots are not supported by this document")]
    ShadowUnsupported,
}
