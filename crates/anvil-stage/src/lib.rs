//! Anvil Stage - live node trees
//!
//! A `Stage` owns every node and behavior of an editing session: the edited
//! reference graph, freshly instantiated templates, and any unrelated scene
//! nodes that reference fields may point at.

mod behavior;
mod node;
mod snapshot;
mod stage;

pub use behavior::{
    copy_editable_fields, transform_fields, Behavior, EntityRef, FieldValue, SerializedField,
    TRANSFORM_TYPE,
};
pub use node::Node;
pub use snapshot::{BehaviorSnapshot, NodeSnapshot};
pub use stage::Stage;
