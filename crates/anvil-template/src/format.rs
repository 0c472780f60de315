//! Template file format definitions

use serde::{Deserialize, Serialize};

/// Root structure of a `.template.toml` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub template: TemplateMeta,
    /// Nodes in pre-order: a parent always precedes its children
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

/// Template header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub name: String,
    /// Name of the base template when this template is a variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// `sha256:` hash of the base template's text at the time the variant was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TemplateMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            base_hash: None,
            description: None,
        }
    }
}

/// One node of a stored tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Key unique within the file, used by `parent` and reference values
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Behaviors in order; a leading `Transform` entry holds the node's placement
    #[serde(default)]
    pub behaviors: Vec<BehaviorDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub editable: bool,
    pub value: ValueDef,
}

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

/// Stored field value.
///
/// References inside the file use node keys; `asset` names an external resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDef {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector([f32; 3]),
    Nested(Vec<FieldDef>),
    Node(String),
    Behavior(BehaviorKey),
    Asset(String),
    Null,
}

/// Locates a behavior inside a file: slot 0 is the node's `Transform`,
/// slot `n` is its `n`th other behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorKey {
    pub node: String,
    pub slot: usize,
}

impl TemplateFile {
    pub fn new(meta: TemplateMeta) -> Self {
        Self {
            template: meta,
            nodes: Vec::new(),
        }
    }

    pub fn behavior_count(&self) -> usize {
        self.nodes.iter().map(|n| n.behaviors.len()).sum()
    }

    pub fn root(&self) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.parent.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_deserialization() {
        let toml_str = r#"
[template]
name = "Avatar"

[[nodes]]
key = "0"
name = "Avatar"

[[nodes.behaviors]]
type = "Transform"
fields = [
    { name = "position", value = { vector = [0.0, 1.0, 0.0] } },
]

[[nodes.behaviors]]
type = "Blink"
fields = [
    { name = "enabled", value = { bool = true } },
    { name = "target", value = { node = "1" } },
    { name = "material", value = { asset = "materials/skin" } },
    { name = "version", editable = false, value = { int = 3 } },
    { name = "unset", value = "null" },
]

[[nodes]]
key = "1"
name = "Head"
parent = "0"
"#;

        let file: TemplateFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.template.name, "Avatar");
        assert_eq!(file.template.base, None);
        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.root().map(|n| n.name.as_str()), Some("Avatar"));

        let blink = &file.nodes[0].behaviors[1];
        assert_eq!(blink.type_name, "Blink");
        assert_eq!(blink.fields[1].value, ValueDef::Node("1".into()));
        assert!(!blink.fields[3].editable);
        assert!(blink.fields[0].editable);
        assert_eq!(blink.fields[4].value, ValueDef::Null);
        assert_eq!(file.behavior_count(), 2);
    }

    #[test]
    fn test_template_serialization() {
        let mut file = TemplateFile::new(TemplateMeta {
            base: Some("Avatar".into()),
            ..TemplateMeta::new("Avatar Variant")
        });
        file.nodes.push(NodeDef {
            key: "0".into(),
            name: "Avatar".into(),
            parent: None,
            behaviors: vec![BehaviorDef {
                type_name: "Blink".into(),
                fields: vec![FieldDef {
                    name: "eyes".into(),
                    editable: true,
                    value: ValueDef::Behavior(BehaviorKey {
                        node: "0".into(),
                        slot: 0,
                    }),
                }],
            }],
        });

        let toml_str = toml::to_string_pretty(&file).unwrap();
        assert!(toml_str.contains("Avatar Variant"));
        assert!(toml_str.contains("base = \"Avatar\""));

        let back: TemplateFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, file);
    }
}
