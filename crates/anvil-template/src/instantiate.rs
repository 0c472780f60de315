//! Materialize a stored template as a live tree

use crate::format::{FieldDef, TemplateFile, ValueDef};
use anvil_core::{AnvilError, BehaviorId, NodeId, Result, Vec3};
use anvil_stage::{
    copy_editable_fields, EntityRef, FieldValue, SerializedField, Stage, TRANSFORM_TYPE,
};
use std::collections::HashMap;

/// Node and behavior ids created for each key of a file
struct KeyTable {
    nodes: HashMap<String, NodeId>,
    /// Behavior slots per node key; slot 0 is the structural behavior
    slots: HashMap<String, Vec<BehaviorId>>,
}

/// Instantiate `file` on `stage` and return the new root.
///
/// The root is marked as an instance of `template`. Every created node gets
/// `removable`, which tells later edits whether the node may be deleted
/// outright or only cleared.
pub fn instantiate_file(
    file: &TemplateFile,
    stage: &mut Stage,
    template: &str,
    removable: bool,
) -> Result<NodeId> {
    let mut keys = KeyTable {
        nodes: HashMap::new(),
        slots: HashMap::new(),
    };
    let mut root = None;

    // First pass: create nodes and empty behaviors
    for def in &file.nodes {
        if keys.nodes.contains_key(&def.key) {
            return Err(AnvilError::TemplateFormat(format!(
                "duplicate node key '{}' in template '{}'",
                def.key, file.template.name
            )));
        }

        let id = match &def.parent {
            None => {
                if root.is_some() {
                    return Err(AnvilError::TemplateFormat(format!(
                        "template '{}' has more than one root node",
                        file.template.name
                    )));
                }
                let id = stage.create_root(def.name.clone());
                root = Some(id);
                id
            }
            Some(parent_key) => {
                let parent = keys.nodes.get(parent_key).copied().ok_or_else(|| {
                    AnvilError::TemplateFormat(format!(
                        "node '{}' names parent '{}' which does not precede it",
                        def.key, parent_key
                    ))
                })?;
                stage.create_child(parent, def.name.clone())?
            }
        };
        stage.set_removable(id, removable)?;

        let transform = stage
            .node(id)
            .map(|n| n.transform())
            .ok_or_else(|| AnvilError::NodeNotFound(id.to_string()))?;
        let mut slots = vec![transform];
        for behavior in def.behaviors.iter().filter(|b| b.type_name != TRANSFORM_TYPE) {
            slots.push(stage.add_behavior(id, behavior.type_name.clone(), Vec::new())?);
        }

        keys.nodes.insert(def.key.clone(), id);
        keys.slots.insert(def.key.clone(), slots);
    }

    let root = root.ok_or_else(|| {
        AnvilError::TemplateFormat(format!("template '{}' has no root node", file.template.name))
    })?;

    // Second pass: fill fields now that every key resolves
    for def in &file.nodes {
        let slots = &keys.slots[&def.key];
        let mut next_slot = 1;
        for behavior in &def.behaviors {
            let fields = convert_fields(&behavior.fields, &keys)?;
            if behavior.type_name == TRANSFORM_TYPE {
                copy_editable_fields(&fields, stage.fields_mut(slots[0])?);
            } else {
                *stage.fields_mut(slots[next_slot])? = fields;
                next_slot += 1;
            }
        }
    }

    stage.set_template(root, Some(template.to_string()))?;
    Ok(root)
}

fn convert_fields(defs: &[FieldDef], keys: &KeyTable) -> Result<Vec<SerializedField>> {
    defs.iter()
        .map(|def| {
            Ok(SerializedField {
                name: def.name.clone(),
                editable: def.editable,
                value: convert_value(&def.value, keys)?,
            })
        })
        .collect()
}

fn convert_value(value: &ValueDef, keys: &KeyTable) -> Result<FieldValue> {
    Ok(match value {
        ValueDef::Bool(b) => FieldValue::Bool(*b),
        ValueDef::Int(i) => FieldValue::Int(*i),
        ValueDef::Float(f) => FieldValue::Float(*f),
        ValueDef::String(s) => FieldValue::String(s.clone()),
        ValueDef::Vector(v) => FieldValue::Vector(Vec3::from_array(*v)),
        ValueDef::Nested(children) => FieldValue::Nested(convert_fields(children, keys)?),
        ValueDef::Node(key) => {
            let id = keys.nodes.get(key).copied().ok_or_else(|| {
                AnvilError::TemplateFormat(format!("reference to unknown node key '{}'", key))
            })?;
            FieldValue::Reference(Some(EntityRef::Node(id)))
        }
        ValueDef::Behavior(key) => {
            let id = keys
                .slots
                .get(&key.node)
                .and_then(|slots| slots.get(key.slot))
                .copied()
                .ok_or_else(|| {
                    AnvilError::TemplateFormat(format!(
                        "reference to unknown behavior slot {} of node '{}'",
                        key.slot, key.node
                    ))
                })?;
            FieldValue::Reference(Some(EntityRef::Behavior(id)))
        }
        ValueDef::Asset(path) => FieldValue::Reference(Some(EntityRef::Asset(path.clone()))),
        ValueDef::Null => FieldValue::Reference(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVATAR: &str = r#"
[template]
name = "Avatar"

[[nodes]]
key = "0"
name = "Avatar"

[[nodes.behaviors]]
type = "Transform"
fields = [{ name = "position", value = { vector = [0.0, 2.0, 0.0] } }]

[[nodes.behaviors]]
type = "LookAt"
fields = [
    { name = "target", value = { node = "1" } },
    { name = "driver", value = { behavior = { node = "1", slot = 1 } } },
]

[[nodes]]
key = "1"
name = "Head"
parent = "0"

[[nodes.behaviors]]
type = "Blink"
fields = [{ name = "rate", value = { float = 0.25 } }]
"#;

    #[test]
    fn test_instantiate_resolves_keys() {
        let file: TemplateFile = toml::from_str(AVATAR).unwrap();
        let mut stage = Stage::new();
        let root = instantiate_file(&file, &mut stage, "Avatar", false).unwrap();

        assert_eq!(stage.template_of(root), Some("Avatar"));
        assert_eq!(stage.transform(root).unwrap().position, Vec3::new(0.0, 2.0, 0.0));

        let head = stage.find_child(root, "Head").unwrap();
        assert!(!stage.node(head).unwrap().removable());
        assert_eq!(stage.template_of(head), None);

        let look_at = stage.node(root).unwrap().behaviors()[0];
        let blink = stage.node(head).unwrap().behaviors()[0];
        let fields = stage.fields(look_at).unwrap();
        assert_eq!(fields[0].value, FieldValue::Reference(Some(EntityRef::Node(head))));
        assert_eq!(fields[1].value, FieldValue::Reference(Some(EntityRef::Behavior(blink))));
    }

    #[test]
    fn test_instantiate_twice_gives_fresh_ids() {
        let file: TemplateFile = toml::from_str(AVATAR).unwrap();
        let mut stage = Stage::new();
        let a = instantiate_file(&file, &mut stage, "Avatar", false).unwrap();
        let b = instantiate_file(&file, &mut stage, "Avatar", false).unwrap();
        assert_ne!(a, b);
        let head_a = stage.find_child(a, "Head").unwrap();
        let head_b = stage.find_child(b, "Head").unwrap();
        assert_ne!(head_a, head_b);
    }

    #[test]
    fn test_parent_must_precede_child() {
        let toml_str = r#"
[template]
name = "Broken"

[[nodes]]
key = "1"
name = "Head"
parent = "0"

[[nodes]]
key = "0"
name = "Avatar"
"#;
        let file: TemplateFile = toml::from_str(toml_str).unwrap();
        let mut stage = Stage::new();
        assert!(matches!(
            instantiate_file(&file, &mut stage, "Broken", false),
            Err(AnvilError::TemplateFormat(_))
        ));
    }

    #[test]
    fn test_empty_template_is_rejected() {
        let file: TemplateFile = toml::from_str("[template]\nname = \"Empty\"\n").unwrap();
        let mut stage = Stage::new();
        assert!(instantiate_file(&file, &mut stage, "Empty", false).is_err());
    }
}
