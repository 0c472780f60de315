//! Owned, read-only copies of a subtree

use crate::behavior::SerializedField;
use crate::stage::Stage;
use anvil_core::{AnvilError, BehaviorId, NodeId, Result};

/// A behavior as it was when the snapshot was taken
#[derive(Clone, Debug, PartialEq)]
pub struct BehaviorSnapshot {
    pub id: BehaviorId,
    pub type_name: String,
    pub fields: Vec<SerializedField>,
}

/// A node and its whole subtree, detached from the stage.
///
/// Ids are kept so that reference fields can still be matched against the
/// entities they originally named.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub transform: BehaviorSnapshot,
    pub behaviors: Vec<BehaviorSnapshot>,
    pub children: Vec<NodeSnapshot>,
}

impl Stage {
    /// Copy the subtree rooted at `root`
    pub fn snapshot(&self, root: NodeId) -> Result<NodeSnapshot> {
        let node = self
            .node(root)
            .ok_or_else(|| AnvilError::NodeNotFound(root.to_string()))?;

        let transform = self.snapshot_behavior(node.transform())?;
        let behaviors = node
            .behaviors()
            .iter()
            .map(|b| self.snapshot_behavior(*b))
            .collect::<Result<Vec<_>>>()?;
        let children = node
            .children()
            .iter()
            .map(|c| self.snapshot(*c))
            .collect::<Result<Vec<_>>>()?;

        Ok(NodeSnapshot {
            id: root,
            name: node.name().to_string(),
            transform,
            behaviors,
            children,
        })
    }

    fn snapshot_behavior(&self, id: BehaviorId) -> Result<BehaviorSnapshot> {
        let behavior = self
            .behavior(id)
            .ok_or_else(|| AnvilError::BehaviorNotFound(id.to_string()))?;
        Ok(BehaviorSnapshot {
            id,
            type_name: behavior.type_name().to_string(),
            fields: behavior.fields().to_vec(),
        })
    }
}
