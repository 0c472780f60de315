//! Anvil Repack - rebase an edited tree onto a different base template
//!
//! Given a live, edited tree (the reference graph) and the root of an
//! instantiated base template, `repack` builds a new variant of that base
//! carrying the reference graph's edits:
//!
//! 1. The base template is instantiated into a fresh target tree.
//! 2. The reference tree is walked alongside the target, pairing nodes by
//!    name and behaviors by type, copying field values, creating what is
//!    missing, and pruning what the reference graph does not have.
//! 3. Every reference field in the target is redirected from reference-graph
//!    entities to their rebased counterparts; anything else is left alone.
//! 4. The finished tree is saved as a new variant of the base.
//!
//! Only step 4 touches storage, so a failure before it leaves every stored
//! template unchanged. A failed repack also destroys the tree it instantiated.

mod identity;
mod matcher;
mod reconcile;
mod report;
mod rewrite;

pub use identity::IdentityMap;
pub use report::RepackReport;

use anvil_core::{AnvilError, NodeId, Result};
use anvil_template::{TemplateId, TemplateStore};
use anvil_stage::Stage;
use tracing::{info, warn};

/// Result of a successful repack
#[derive(Debug, Clone)]
pub struct RepackOutcome {
    /// Live root of the repacked tree, now an instance of `template`
    pub root: NodeId,
    /// Name of the saved variant
    pub template: TemplateId,
    pub report: RepackReport,
}

/// Rebase the edits in `reference_root` onto the template that `base_root`
/// is an instance of, and save the result as a new variant.
///
/// Fails with [`AnvilError::NotATemplateRoot`] when `base_root` is not the
/// root of an instantiation of a template held by `store`. On any later
/// failure the freshly instantiated tree is removed from `stage`.
pub fn repack<S>(
    stage: &mut Stage,
    store: &mut S,
    reference_root: NodeId,
    base_root: NodeId,
) -> Result<RepackOutcome>
where
    S: TemplateStore + ?Sized,
{
    if !store.is_template_root(stage, base_root) {
        return Err(AnvilError::NotATemplateRoot(stage.path(base_root)));
    }
    let base = stage
        .template_of(base_root)
        .map(TemplateId::new)
        .ok_or_else(|| AnvilError::NotATemplateRoot(base_root.to_string()))?;

    info!(reference = %stage.path(reference_root), base = %base, "repacking");

    let target = store.instantiate(stage, &base)?;
    let finished = repack_in_place(stage, reference_root, target)
        .and_then(|report| Ok((store.save_as_variant(stage, target, &base)?, report)));
    let (template, report) = match finished {
        Ok(done) => done,
        Err(err) => {
            warn!(base = %base, error = %err, "repack failed; discarding unfinished tree");
            stage.destroy_node(target)?;
            return Err(err);
        }
    };
    stage.set_template(target, Some(template.to_string()))?;

    Ok(RepackOutcome {
        root: target,
        template,
        report,
    })
}

/// Make the tree under `target_root` carry the edits of `reference_root`
/// without touching storage. The reference tree is only read.
pub fn repack_in_place(
    stage: &mut Stage,
    reference_root: NodeId,
    target_root: NodeId,
) -> Result<RepackReport> {
    let reference = stage.snapshot(reference_root)?;
    if !stage.contains_node(target_root) {
        return Err(AnvilError::NodeNotFound(target_root.to_string()));
    }

    let mut map = IdentityMap::new();
    let mut report = RepackReport::default();
    reconcile::reconcile(stage, &reference, target_root, &mut map, &mut report)?;
    rewrite::rewrite(stage, target_root, &map, &mut report)?;

    info!(
        nodes_matched = report.nodes_matched,
        nodes_created = report.nodes_created,
        nodes_cleared = report.nodes_cleared,
        nodes_removed = report.nodes_removed,
        behaviors_added = report.behaviors_added,
        behaviors_destroyed = report.behaviors_destroyed,
        references_rewritten = report.references_rewritten,
        "repack finished"
    );
    Ok(report)
}
