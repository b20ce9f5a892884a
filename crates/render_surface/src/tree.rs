//! Document body and scoped mounting
//!
//! [`DocumentTree`] is the host document's body: the list of top-level
//! elements currently attached to it. Exports mount a temporary off-screen
//! clone here so it can be rasterized, and must detach it again on every exit
//! path. [`MountGuard`] ties the attachment to a scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

use crate::Element;

/// Identifier of an element mounted in a [`DocumentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The host document body
#[derive(Debug, Default)]
pub struct DocumentTree {
    /// Mounted elements in mount order
    nodes: Vec<(NodeId, Element)>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an element to the body and return its id
    pub fn mount(&mut self, element: Element) -> NodeId {
        let id = NodeId::new();
        self.nodes.push((id, element));
        id
    }

    /// Detach an element, returning it if it was mounted
    pub fn unmount(&mut self, id: NodeId) -> Option<Element> {
        let index = self.nodes.iter().position(|(node, _)| *node == id)?;
        Some(self.nodes.remove(index).1)
    }

    /// Attach an element for the lifetime of the returned guard
    pub fn mount_scoped(&mut self, element: Element) -> MountGuard<'_> {
        let id = self.mount(element);
        tracing::trace!("Mounted scoped node {}", id);
        MountGuard { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes
            .iter()
            .find(|(node, _)| *node == id)
            .map(|(_, element)| element)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of mounted top-level elements
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A mounted element that is detached when the guard is dropped
pub struct MountGuard<'a> {
    tree: &'a mut DocumentTree,
    id: NodeId,
}

impl MountGuard<'_> {
    /// Id of the mounted element
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Deref for MountGuard<'_> {
    type Target = DocumentTree;

    fn deref(&self) -> &DocumentTree {
        self.tree
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        if self.tree.unmount(self.id).is_some() {
            tracing::trace!("Unmounted scoped node {}", self.id);
        }
    }
}
