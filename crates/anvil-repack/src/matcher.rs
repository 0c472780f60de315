//! Behavior matching between a reference node and its target counterpart
//!
//! Non-structural behaviors are paired with a single forward scan: each
//! reference behavior takes the first target behavior of the same type at or
//! after the checkpoint left by the previous match. This is O(n) and correct
//! whenever same-typed behaviors keep their relative order. If an edit swapped
//! two behaviors of one type, their field values land on each other's slots;
//! that case is accepted rather than paying for a full bipartite matching.

use crate::identity::IdentityMap;
use crate::report::RepackReport;
use anvil_core::{AnvilError, NodeId, Result};
use anvil_stage::{copy_editable_fields, EntityRef, NodeSnapshot, Stage};
use tracing::debug;

/// Reconcile the behaviors of `target` with those of `reference`, in place
pub(crate) fn match_behaviors(
    stage: &mut Stage,
    reference: &NodeSnapshot,
    target: NodeId,
    map: &mut IdentityMap,
    report: &mut RepackReport,
) -> Result<()> {
    let node = stage
        .node(target)
        .ok_or_else(|| AnvilError::NodeNotFound(target.to_string()))?;
    let transform = node.transform();
    let existing = node.behaviors().to_vec();

    // Structural behaviors pair by position
    copy_editable_fields(&reference.transform.fields, stage.fields_mut(transform)?);
    map.record(
        EntityRef::Behavior(reference.transform.id),
        EntityRef::Behavior(transform),
    );

    let mut matched = vec![false; existing.len()];
    let mut checkpoint = 0;

    for behavior in &reference.behaviors {
        let found = (checkpoint..existing.len()).find(|&i| {
            stage
                .behavior(existing[i])
                .map(|b| b.type_name() == behavior.type_name)
                .unwrap_or(false)
        });

        let target_behavior = match found {
            Some(i) => {
                copy_editable_fields(&behavior.fields, stage.fields_mut(existing[i])?);
                checkpoint = i + 1;
                matched[i] = true;
                report.behaviors_updated += 1;
                existing[i]
            }
            None => {
                // Locked fields are never written, not even on construction
                let added = stage.add_behavior(target, behavior.type_name.clone(), Vec::new())?;
                copy_editable_fields(&behavior.fields, stage.fields_mut(added)?);
                debug!(
                    node = %stage.path(target),
                    behavior = %behavior.type_name,
                    "added behavior"
                );
                report.behaviors_added += 1;
                added
            }
        };
        map.record(
            EntityRef::Behavior(behavior.id),
            EntityRef::Behavior(target_behavior),
        );
    }

    for (id, _) in existing.iter().zip(&matched).filter(|(_, m)| !**m) {
        debug!(
            node = %stage.path(target),
            behavior = stage.behavior(*id).map(|b| b.type_name()).unwrap_or("?"),
            "destroyed unmatched behavior"
        );
        stage.destroy_behavior(*id)?;
        report.behaviors_destroyed += 1;
    }

    Ok(())
}
