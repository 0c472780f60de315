//! Behaviors and their serialized fields

use anvil_core::{BehaviorId, NodeId, Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Type tag of the structural behavior every node carries
pub const TRANSFORM_TYPE: &str = "Transform";

/// Target of a reference field
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Node(NodeId),
    Behavior(BehaviorId),
    /// A shared resource outside every node tree, named by its asset key
    Asset(String),
}

impl EntityRef {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            EntityRef::Node(id) => Some(*id),
            _ => None,
        }
    }
}

/// The value held by a serialized field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector(Vec3),
    Nested(Vec<SerializedField>),
    /// `None` is a null reference
    Reference(Option<EntityRef>),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            FieldValue::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

/// A named, ordered slot of serialized data on a behavior.
///
/// Non-editable fields are never written after the behavior is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedField {
    pub name: String,
    pub editable: bool,
    pub value: FieldValue,
}

impl SerializedField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            editable: true,
            value,
        }
    }

    pub fn locked(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            editable: false,
            value,
        }
    }

    /// Call `visit` on every editable reference slot in this field, descending
    /// into nested values. Non-editable fields and their nested children are skipped.
    pub fn visit_references_mut(&mut self, visit: &mut impl FnMut(&mut Option<EntityRef>)) {
        if !self.editable {
            return;
        }
        match &mut self.value {
            FieldValue::Reference(target) => visit(target),
            FieldValue::Nested(children) => {
                for child in children.iter_mut() {
                    child.visit_references_mut(visit);
                }
            }
            _ => {}
        }
    }
}

/// A typed, ordered collection of serialized fields attached to one node
#[derive(Clone, Debug)]
pub struct Behavior {
    pub(crate) id: BehaviorId,
    pub(crate) type_name: String,
    pub(crate) owner: NodeId,
    pub(crate) fields: Vec<SerializedField>,
}

impl Behavior {
    pub fn id(&self) -> BehaviorId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn fields(&self) -> &[SerializedField] {
        &self.fields
    }

    pub fn is_structural(&self) -> bool {
        self.type_name == TRANSFORM_TYPE
    }
}

/// Field list of a structural behavior holding `transform`
pub fn transform_fields(transform: &Transform) -> Vec<SerializedField> {
    vec![
        SerializedField::new("position", FieldValue::Vector(transform.position)),
        SerializedField::new("rotation", FieldValue::Vector(transform.rotation)),
        SerializedField::new("scale", FieldValue::Vector(transform.scale)),
    ]
}

/// Copy every editable field of `src` into `dst`, matching by name.
///
/// A field present on both sides is overwritten only when the destination slot
/// is editable too. A field `dst` lacks is appended. Returns how many slots were
/// written.
pub fn copy_editable_fields(src: &[SerializedField], dst: &mut Vec<SerializedField>) -> usize {
    let mut written = 0;
    for field in src.iter().filter(|f| f.editable) {
        match dst.iter_mut().find(|d| d.name == field.name) {
            Some(slot) if slot.editable => {
                slot.value = field.value.clone();
                written += 1;
            }
            Some(_) => {}
            None => {
                dst.push(field.clone());
                written += 1;
            }
        }
    }
    written
}
