//! Tree reconciliation: pair reference nodes with target nodes by name

use crate::identity::IdentityMap;
use crate::matcher::match_behaviors;
use crate::report::RepackReport;
use anvil_core::{AnvilError, NodeId, Result};
use anvil_stage::{copy_editable_fields, EntityRef, NodeSnapshot, Stage};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Make the subtree under `target` mirror `reference`, recording every pairing
/// in `map`.
///
/// Children pair by name, first match wins. Sibling names are not required to
/// be unique: a second reference child with a repeated name takes the next
/// unclaimed target child of that name, or becomes a new node when none is left.
/// Target children that no reference child claims are pruned.
pub(crate) fn reconcile(
    stage: &mut Stage,
    reference: &NodeSnapshot,
    target: NodeId,
    map: &mut IdentityMap,
    report: &mut RepackReport,
) -> Result<()> {
    map.record(EntityRef::Node(reference.id), EntityRef::Node(target));
    match_behaviors(stage, reference, target, map, report)?;

    let current = stage
        .node(target)
        .ok_or_else(|| AnvilError::NodeNotFound(target.to_string()))?
        .children()
        .to_vec();

    let mut unclaimed: HashMap<String, VecDeque<NodeId>> = HashMap::new();
    for child in &current {
        if let Some(node) = stage.node(*child) {
            unclaimed.entry(node.name().to_string()).or_default().push_back(*child);
        }
    }

    let mut claimed = HashSet::new();
    let mut seen_names = HashSet::new();
    for child in &reference.children {
        if !seen_names.insert(child.name.as_str()) {
            warn!(
                parent = %stage.path(target),
                name = %child.name,
                "duplicate sibling name; pairing first match"
            );
        }

        let paired = unclaimed.get_mut(&child.name).and_then(|queue| queue.pop_front());
        let target_child = match paired {
            Some(existing) => {
                report.nodes_matched += 1;
                existing
            }
            None => {
                let created = stage.create_child(target, child.name.clone())?;
                let transform = stage
                    .node(created)
                    .map(|n| n.transform())
                    .ok_or_else(|| AnvilError::NodeNotFound(created.to_string()))?;
                copy_editable_fields(&child.transform.fields, stage.fields_mut(transform)?);
                debug!(node = %stage.path(created), "created node");
                report.nodes_created += 1;
                created
            }
        };
        claimed.insert(target_child);
        reconcile(stage, child, target_child, map, report)?;
    }

    for orphan in current.into_iter().filter(|c| !claimed.contains(c)) {
        prune(stage, orphan, report)?;
    }

    Ok(())
}

/// Strip an orphaned base node.
///
/// A removable node is deleted with its subtree. Otherwise every behavior but
/// the structural one is destroyed and the same pruning repeats on each child,
/// leaving the node itself in place.
pub(crate) fn prune(stage: &mut Stage, node: NodeId, report: &mut RepackReport) -> Result<()> {
    let data = stage
        .node(node)
        .ok_or_else(|| AnvilError::NodeNotFound(node.to_string()))?;

    if data.removable() {
        debug!(node = %stage.path(node), "removed orphaned node");
        stage.destroy_node(node)?;
        report.nodes_removed += 1;
        return Ok(());
    }

    let behaviors = data.behaviors().to_vec();
    let children = data.children().to_vec();
    for behavior in behaviors {
        stage.destroy_behavior(behavior)?;
        report.behaviors_destroyed += 1;
    }
    debug!(node = %stage.path(node), "cleared orphaned node");
    report.nodes_cleared += 1;

    for child in children {
        prune(stage, child, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_core::{Transform, Vec3};
    use anvil_stage::{FieldValue, SerializedField};

    fn run(stage: &mut Stage, reference: NodeId, target: NodeId) -> (IdentityMap, RepackReport) {
        let snapshot = stage.snapshot(reference).unwrap();
        let mut map = IdentityMap::new();
        let mut report = RepackReport::default();
        reconcile(stage, &snapshot, target, &mut map, &mut report).unwrap();
        (map, report)
    }

    fn child_names(stage: &Stage, node: NodeId) -> Vec<String> {
        stage
            .node(node)
            .unwrap()
            .children()
            .iter()
            .map(|c| stage.node(*c).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_children_pair_by_name() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let ref_head = stage.create_child(reference, "Head").unwrap();
        let target = stage.create_root("t");
        let tgt_head = stage.create_child(target, "Head").unwrap();

        let (map, report) = run(&mut stage, reference, target);

        assert_eq!(
            map.lookup(&EntityRef::Node(ref_head)),
            Some(&EntityRef::Node(tgt_head))
        );
        assert_eq!(report.nodes_matched, 1);
        assert_eq!(report.nodes_created, 0);
    }

    #[test]
    fn test_new_children_are_created_with_placement() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let hat = stage.create_child(reference, "Hat").unwrap();
        let placed = Transform::from_position(Vec3::new(0.0, 2.0, 0.1));
        stage.set_transform(hat, &placed).unwrap();
        stage.create_child(hat, "Brim").unwrap();
        let target = stage.create_root("t");

        let (_, report) = run(&mut stage, reference, target);

        let new_hat = stage.find_child(target, "Hat").unwrap();
        assert_eq!(stage.transform(new_hat), Some(placed));
        assert!(stage.node(new_hat).unwrap().removable());
        assert!(stage.find_child(new_hat, "Brim").is_some());
        assert_eq!(report.nodes_created, 2);
    }

    #[test]
    fn test_orphans_are_cleared_not_deleted() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let target = stage.create_root("t");
        let tail = stage.create_child(target, "Tail").unwrap();
        let tip = stage.create_child(tail, "Tip").unwrap();
        stage.set_removable(tail, false).unwrap();
        stage.set_removable(tip, false).unwrap();
        stage.add_behavior(tail, "Physics", Vec::new()).unwrap();
        stage.add_behavior(tip, "Collider", Vec::new()).unwrap();

        let (_, report) = run(&mut stage, reference, target);

        assert!(stage.contains_node(tail));
        assert!(stage.contains_node(tip));
        assert!(stage.node(tail).unwrap().behaviors().is_empty());
        assert!(stage.node(tip).unwrap().behaviors().is_empty());
        assert!(stage.behavior(stage.node(tip).unwrap().transform()).is_some());
        assert_eq!(report.nodes_cleared, 2);
        assert_eq!(report.behaviors_destroyed, 2);
    }

    #[test]
    fn test_removable_orphans_are_deleted() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let target = stage.create_root("t");
        let tail = stage.create_child(target, "Tail").unwrap();
        stage.create_child(tail, "Tip").unwrap();

        let (_, report) = run(&mut stage, reference, target);

        assert!(!stage.contains_node(tail));
        assert!(stage.node(target).unwrap().children().is_empty());
        assert_eq!(report.nodes_removed, 1);
    }

    #[test]
    fn test_duplicate_names_first_match_wins() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let first = stage.create_child(reference, "Bone").unwrap();
        let second = stage.create_child(reference, "Bone").unwrap();
        stage
            .add_behavior(second, "Marker", vec![SerializedField::new("id", FieldValue::Int(2))])
            .unwrap();
        let target = stage.create_root("t");
        let existing = stage.create_child(target, "Bone").unwrap();

        let (map, report) = run(&mut stage, reference, target);

        assert_eq!(
            map.lookup(&EntityRef::Node(first)),
            Some(&EntityRef::Node(existing))
        );
        let created = map
            .lookup(&EntityRef::Node(second))
            .and_then(|r| r.as_node())
            .unwrap();
        assert_ne!(created, existing);
        assert_eq!(child_names(&stage, target), vec!["Bone", "Bone"]);
        assert_eq!(stage.node(created).unwrap().behaviors().len(), 1);
        assert_eq!(report.nodes_matched, 1);
        assert_eq!(report.nodes_created, 1);
    }

    #[test]
    fn test_new_children_append_after_existing() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        stage.create_child(reference, "New").unwrap();
        stage.create_child(reference, "Old").unwrap();
        let target = stage.create_root("t");
        stage.create_child(target, "Old").unwrap();

        run(&mut stage, reference, target);

        assert_eq!(child_names(&stage, target), vec!["Old", "New"]);
    }

    #[test]
    fn test_cleared_orphan_still_deletes_removable_children() {
        let mut stage = Stage::new();
        let reference = stage.create_root("r");
        let target = stage.create_root("t");
        let tail = stage.create_child(target, "Tail").unwrap();
        stage.set_removable(tail, false).unwrap();
        let physics = stage.add_behavior(tail, "Physics", Vec::new()).unwrap();
        let added = stage.create_child(tail, "Ribbon").unwrap();
        let bow = stage.create_child(added, "Bow").unwrap();
        let tip = stage.create_child(tail, "Tip").unwrap();
        stage.set_removable(tip, false).unwrap();

        let (_, report) = run(&mut stage, reference, target);

        assert!(stage.contains_node(tail));
        assert!(!stage.contains_behavior(physics));
        assert!(!stage.contains_node(added));
        assert!(!stage.contains_node(bow));
        assert!(stage.contains_node(tip));
        assert_eq!(child_names(&stage, tail), vec!["Tip"]);
        assert_eq!(report.nodes_cleared, 2);
        assert_eq!(report.nodes_removed, 1);
    }
}
