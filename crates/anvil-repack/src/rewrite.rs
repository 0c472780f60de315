//! Reference rewriting over a finished target tree

use crate::identity::IdentityMap;
use crate::report::RepackReport;
use anvil_core::{NodeId, Result};
use anvil_stage::Stage;

/// Redirect every editable reference field under `root` whose target has a
/// rebased counterpart in `map`.
///
/// Must run after reconciliation has finished for the whole tree. Targets
/// with no entry (shared assets, scene nodes outside the reference graph, or
/// entities that already belong to the target tree) are left as they are.
pub(crate) fn rewrite(
    stage: &mut Stage,
    root: NodeId,
    map: &IdentityMap,
    report: &mut RepackReport,
) -> Result<()> {
    for node in stage.descendants(root) {
        let behaviors: Vec<_> = match stage.node(node) {
            Some(n) => n.all_behaviors().collect(),
            None => continue,
        };
        for behavior in behaviors {
            for field in stage.fields_mut(behavior)?.iter_mut() {
                field.visit_references_mut(&mut |slot| {
                    let Some(current) = slot.as_ref() else {
                        return;
                    };
                    match map.lookup(current) {
                        Some(rebased) => {
                            *slot = Some(rebased.clone());
                            report.references_rewritten += 1;
                        }
                        None => report.references_preserved += 1,
                    }
                });
            }
        }
    }
    Ok(())
}
