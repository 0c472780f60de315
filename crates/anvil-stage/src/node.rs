//! Node data

use anvil_core::{BehaviorId, NodeId};

/// A hierarchical entity with a name, ordered children, and ordered behaviors.
///
/// The structural behavior is held apart from the other behaviors; it is
/// created with the node and lives exactly as long as it does.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) transform: BehaviorId,
    pub(crate) behaviors: Vec<BehaviorId>,
    pub(crate) removable: bool,
    /// Set on the root node of a template instantiation
    pub(crate) template: Option<String>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The structural behavior
    pub fn transform(&self) -> BehaviorId {
        self.transform
    }

    /// Non-structural behaviors in order
    pub fn behaviors(&self) -> &[BehaviorId] {
        &self.behaviors
    }

    /// All behaviors, structural first
    pub fn all_behaviors(&self) -> impl Iterator<Item = BehaviorId> + '_ {
        std::iter::once(self.transform).chain(self.behaviors.iter().copied())
    }

    /// Whether the host allows deleting this node outright rather than clearing it
    pub fn removable(&self) -> bool {
        self.removable
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }
}
