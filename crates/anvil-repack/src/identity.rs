//! Identity map from reference entities to their rebased counterparts

use anvil_stage::EntityRef;
use bimap::BiMap;

/// Records which reference-graph entity produced which target-tree entity
/// during one repack. Both directions are injective.
#[derive(Debug, Default)]
pub struct IdentityMap {
    map: BiMap<EntityRef, EntityRef>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `source` with `target`.
    ///
    /// # Panics
    ///
    /// If either side is already recorded. The reconciler visits every
    /// reference entity exactly once, so a repeat means the traversal is broken.
    pub fn record(&mut self, source: EntityRef, target: EntityRef) {
        if let Err((source, target)) = self.map.insert_no_overwrite(source, target) {
            panic!(
                "identity map invariant violated: {:?} -> {:?} conflicts with {:?} / {:?}",
                source,
                target,
                self.map.get_by_left(&source),
                self.map.get_by_right(&target),
            );
        }
    }

    pub fn lookup(&self, source: &EntityRef) -> Option<&EntityRef> {
        self.map.get_by_left(source)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_core::{BehaviorId, NodeId};

    #[test]
    fn test_record_and_lookup() {
        let mut map = IdentityMap::new();
        let src = EntityRef::Node(NodeId::from_raw(1));
        let dst = EntityRef::Node(NodeId::from_raw(2));
        map.record(src.clone(), dst.clone());

        assert_eq!(map.lookup(&src), Some(&dst));
        assert_eq!(map.lookup(&dst), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    #[should_panic(expected = "identity map invariant violated")]
    fn test_double_record_panics() {
        let mut map = IdentityMap::new();
        let src = EntityRef::Behavior(BehaviorId::from_raw(1));
        map.record(src.clone(), EntityRef::Behavior(BehaviorId::from_raw(2)));
        map.record(src, EntityRef::Behavior(BehaviorId::from_raw(3)));
    }

    #[test]
    #[should_panic(expected = "identity map invariant violated")]
    fn test_shared_target_panics() {
        let mut map = IdentityMap::new();
        let dst = EntityRef::Node(NodeId::from_raw(10));
        map.record(EntityRef::Node(NodeId::from_raw(1)), dst.clone());
        map.record(EntityRef::Node(NodeId::from_raw(2)), dst);
    }
}
