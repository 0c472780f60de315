//! Stage - arena of live node trees

use crate::behavior::{transform_fields, Behavior, SerializedField, TRANSFORM_TYPE};
use crate::node::Node;
use anvil_core::{AnvilError, BehaviorId, NodeId, Result, Transform, Vec3};
use std::collections::HashMap;

/// Owns the nodes and behaviors of one editing session.
///
/// Several independent trees can live on one stage; a reference field on one
/// tree may point at a node of another.
#[derive(Debug, Default)]
pub struct Stage {
    nodes: HashMap<NodeId, Node>,
    behaviors: HashMap<BehaviorId, Behavior>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parentless node with an identity transform
    pub fn create_root(&mut self, name: impl Into<String>) -> NodeId {
        self.insert_node(name.into(), None)
    }

    /// Create a node appended as the last child of `parent`
    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(AnvilError::NodeNotFound(parent.to_string()));
        }
        let id = self.insert_node(name.into(), Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    fn insert_node(&mut self, name: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new();
        let transform = BehaviorId::new();
        self.behaviors.insert(
            transform,
            Behavior {
                id: transform,
                type_name: TRANSFORM_TYPE.to_string(),
                owner: id,
                fields: transform_fields(&Transform::IDENTITY),
            },
        );
        self.nodes.insert(
            id,
            Node {
                id,
                name,
                parent,
                children: Vec::new(),
                transform,
                behaviors: Vec::new(),
                removable: true,
                template: None,
            },
        );
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&Behavior> {
        self.behaviors.get(&id)
    }

    fn node_or_err(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| AnvilError::NodeNotFound(id.to_string()))
    }

    fn node_mut_or_err(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| AnvilError::NodeNotFound(id.to_string()))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_behavior(&self, id: BehaviorId) -> bool {
        self.behaviors.contains_key(&id)
    }

    pub fn set_removable(&mut self, id: NodeId, removable: bool) -> Result<()> {
        self.node_mut_or_err(id)?.removable = removable;
        Ok(())
    }

    /// Mark `id` as the root of an instantiation of `template`
    pub fn set_template(&mut self, id: NodeId, template: Option<String>) -> Result<()> {
        self.node_mut_or_err(id)?.template = template;
        Ok(())
    }

    /// Template name if `id` is the root of a template instantiation
    pub fn template_of(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.template())
    }

    /// Append a behavior of `type_name` to `node`
    pub fn add_behavior(
        &mut self,
        node: NodeId,
        type_name: impl Into<String>,
        fields: Vec<SerializedField>,
    ) -> Result<BehaviorId> {
        let type_name = type_name.into();
        if type_name == TRANSFORM_TYPE {
            return Err(AnvilError::StructuralBehavior("added".to_string()));
        }
        let id = BehaviorId::new();
        self.node_mut_or_err(node)?.behaviors.push(id);
        self.behaviors.insert(
            id,
            Behavior {
                id,
                type_name,
                owner: node,
                fields,
            },
        );
        Ok(id)
    }

    /// Destroy a non-structural behavior
    pub fn destroy_behavior(&mut self, id: BehaviorId) -> Result<()> {
        let behavior = self
            .behaviors
            .get(&id)
            .ok_or_else(|| AnvilError::BehaviorNotFound(id.to_string()))?;
        if behavior.is_structural() {
            return Err(AnvilError::StructuralBehavior("destroyed".to_string()));
        }
        let owner = behavior.owner;
        if let Some(node) = self.nodes.get_mut(&owner) {
            node.behaviors.retain(|b| *b != id);
        }
        self.behaviors.remove(&id);
        Ok(())
    }

    /// Destroy a node together with its descendants and all their behaviors
    pub fn destroy_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node_or_err(id)?.parent;
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }

        for node_id in self.descendants(id) {
            if let Some(node) = self.nodes.remove(&node_id) {
                for behavior in node.all_behaviors() {
                    self.behaviors.remove(&behavior);
                }
            }
        }
        Ok(())
    }

    /// Ordered serialized fields of a behavior
    pub fn fields(&self, id: BehaviorId) -> Result<&[SerializedField]> {
        self.behaviors
            .get(&id)
            .map(|b| b.fields.as_slice())
            .ok_or_else(|| AnvilError::BehaviorNotFound(id.to_string()))
    }

    pub fn fields_mut(&mut self, id: BehaviorId) -> Result<&mut Vec<SerializedField>> {
        self.behaviors
            .get_mut(&id)
            .map(|b| &mut b.fields)
            .ok_or_else(|| AnvilError::BehaviorNotFound(id.to_string()))
    }

    /// Placement stored in a node's structural behavior
    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        let node = self.nodes.get(&id)?;
        let fields = &self.behaviors.get(&node.transform)?.fields;
        let get = |name: &str, fallback: Vec3| {
            fields
                .iter()
                .find(|f| f.name == name)
                .and_then(|f| f.value.as_vector())
                .unwrap_or(fallback)
        };
        Some(Transform {
            position: get("position", Vec3::ZERO),
            rotation: get("rotation", Vec3::ZERO),
            scale: get("scale", Vec3::ONE),
        })
    }

    pub fn set_transform(&mut self, id: NodeId, transform: &Transform) -> Result<()> {
        let behavior = self.node_or_err(id)?.transform;
        let fields = self.fields_mut(behavior)?;
        crate::behavior::copy_editable_fields(&transform_fields(transform), fields);
        Ok(())
    }

    /// First child of `parent` named `name`
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).map(|n| n.name == name).unwrap_or(false))
    }

    /// `root` and every node below it, in pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Slash-separated names from the root down to `id`
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|n| self.nodes.get(&n)) {
            parts.push(node.name.as_str());
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }
}
