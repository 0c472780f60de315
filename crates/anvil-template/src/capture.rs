//! Capture a live tree as a template file

use crate::format::{
    BehaviorDef, BehaviorKey, FieldDef, NodeDef, TemplateFile, TemplateMeta, ValueDef,
};
use anvil_core::{AnvilError, BehaviorId, NodeId, Result};
use anvil_stage::{EntityRef, FieldValue, SerializedField, Stage};
use std::collections::HashMap;
use tracing::warn;

/// Convert the tree under `root` into a `TemplateFile`.
///
/// Nodes are keyed by their pre-order index. References into the captured
/// tree become key references, asset references are kept, and references to
/// anything else cannot be stored and are written as null.
pub fn capture(stage: &Stage, root: NodeId, meta: TemplateMeta) -> Result<TemplateFile> {
    let order = stage.descendants(root);
    if order.is_empty() {
        return Err(AnvilError::NodeNotFound(root.to_string()));
    }

    let mut node_keys: HashMap<NodeId, String> = HashMap::new();
    let mut behavior_keys: HashMap<BehaviorId, BehaviorKey> = HashMap::new();
    for (index, id) in order.iter().enumerate() {
        let key = index.to_string();
        if let Some(node) = stage.node(*id) {
            for (slot, behavior) in node.all_behaviors().enumerate() {
                behavior_keys.insert(
                    behavior,
                    BehaviorKey {
                        node: key.clone(),
                        slot,
                    },
                );
            }
        }
        node_keys.insert(*id, key);
    }

    let mut file = TemplateFile::new(meta);
    for id in &order {
        let node = stage
            .node(*id)
            .ok_or_else(|| AnvilError::NodeNotFound(id.to_string()))?;

        let mut behaviors = Vec::new();
        for behavior_id in node.all_behaviors() {
            let behavior = stage
                .behavior(behavior_id)
                .ok_or_else(|| AnvilError::BehaviorNotFound(behavior_id.to_string()))?;
            behaviors.push(BehaviorDef {
                type_name: behavior.type_name().to_string(),
                fields: convert_fields(stage, *id, behavior.fields(), &node_keys, &behavior_keys),
            });
        }

        file.nodes.push(NodeDef {
            key: node_keys[id].clone(),
            name: node.name().to_string(),
            parent: if *id == root {
                None
            } else {
                node.parent().and_then(|p| node_keys.get(&p).cloned())
            },
            behaviors,
        });
    }

    Ok(file)
}

fn convert_fields(
    stage: &Stage,
    owner: NodeId,
    fields: &[SerializedField],
    node_keys: &HashMap<NodeId, String>,
    behavior_keys: &HashMap<BehaviorId, BehaviorKey>,
) -> Vec<FieldDef> {
    fields
        .iter()
        .map(|field| FieldDef {
            name: field.name.clone(),
            editable: field.editable,
            value: match &field.value {
                FieldValue::Bool(b) => ValueDef::Bool(*b),
                FieldValue::Int(i) => ValueDef::Int(*i),
                FieldValue::Float(f) => ValueDef::Float(*f),
                FieldValue::String(s) => ValueDef::String(s.clone()),
                FieldValue::Vector(v) => ValueDef::Vector(v.to_array()),
                FieldValue::Nested(children) => ValueDef::Nested(convert_fields(
                    stage,
                    owner,
                    children,
                    node_keys,
                    behavior_keys,
                )),
                FieldValue::Reference(None) => ValueDef::Null,
                FieldValue::Reference(Some(target)) => {
                    let stored = match target {
                        EntityRef::Node(id) => node_keys.get(id).cloned().map(ValueDef::Node),
                        EntityRef::Behavior(id) => {
                            behavior_keys.get(id).cloned().map(ValueDef::Behavior)
                        }
                        EntityRef::Asset(path) => Some(ValueDef::Asset(path.clone())),
                    };
                    stored.unwrap_or_else(|| {
                        warn!(
                            node = %stage.path(owner),
                            field = %field.name,
                            referenced = ?target,
                            "reference leaves the captured tree; storing null"
                        );
                        ValueDef::Null
                    })
                }
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instantiate::instantiate_file;
    use anvil_core::{Transform, Vec3};

    fn reference(target: EntityRef) -> FieldValue {
        FieldValue::Reference(Some(target))
    }

    #[test]
    fn test_capture_keys_internal_references() {
        let mut stage = Stage::new();
        let root = stage.create_root("Avatar");
        let head = stage.create_child(root, "Head").unwrap();
        let blink = stage.add_behavior(head, "Blink", Vec::new()).unwrap();
        let fields = vec![
            SerializedField::new("target", reference(EntityRef::Node(head))),
            SerializedField::new("driver", reference(EntityRef::Behavior(blink))),
            SerializedField::new("material", reference(EntityRef::Asset("materials/skin".into()))),
        ];
        stage.add_behavior(root, "LookAt", fields).unwrap();

        let file = capture(&stage, root, TemplateMeta::new("Avatar")).unwrap();

        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.nodes[0].parent, None);
        assert_eq!(file.nodes[1].parent.as_deref(), Some("0"));
        assert_eq!(file.nodes[0].behaviors[0].type_name, "Transform");

        let look_at = &file.nodes[0].behaviors[1];
        assert_eq!(look_at.fields[0].value, ValueDef::Node("1".into()));
        assert_eq!(
            look_at.fields[1].value,
            ValueDef::Behavior(BehaviorKey {
                node: "1".into(),
                slot: 1
            })
        );
        assert_eq!(look_at.fields[2].value, ValueDef::Asset("materials/skin".into()));
    }

    #[test]
    fn test_capture_drops_outside_references() {
        let mut stage = Stage::new();
        let scene = stage.create_root("Scene");
        let root = stage.create_root("Avatar");
        let target = SerializedField::new("target", reference(EntityRef::Node(scene)));
        stage.add_behavior(root, "Follow", vec![target]).unwrap();

        let file = capture(&stage, root, TemplateMeta::new("Avatar")).unwrap();
        assert_eq!(file.nodes[0].behaviors[1].fields[0].value, ValueDef::Null);
    }

    #[test]
    fn test_capture_then_instantiate_preserves_shape() {
        let mut stage = Stage::new();
        let root = stage.create_root("Avatar");
        let head = stage.create_child(root, "Head").unwrap();
        stage
            .set_transform(head, &Transform::from_position(Vec3::new(0.0, 1.6, 0.0)))
            .unwrap();
        let target = SerializedField::new("target", reference(EntityRef::Node(head)));
        stage.add_behavior(root, "LookAt", vec![target]).unwrap();

        let file = capture(&stage, root, TemplateMeta::new("Avatar")).unwrap();
        let copy = instantiate_file(&file, &mut stage, "Avatar", true).unwrap();

        let copy_head = stage.find_child(copy, "Head").unwrap();
        assert_ne!(copy_head, head);
        assert_eq!(stage.transform(copy_head).unwrap().position, Vec3::new(0.0, 1.6, 0.0));
        let look_at = stage.node(copy).unwrap().behaviors()[0];
        assert_eq!(
            stage.fields(look_at).unwrap()[0].value,
            FieldValue::Reference(Some(EntityRef::Node(copy_head)))
        );
    }
}
