//! UPDATE trigger generation.

use super::procedure::Procedure;
use super::{DUPLICATE_KEY, PlanContext, integrity_message};
use crate::status::RowStatus;

/// Generate the INSTEAD OF UPDATE body.
///
/// A key change is recorded as a delete of the old identity followed by an
/// insert of the new one; referencing rows block it since updates do not
/// cascade across the shadow boundary. Any other update is a single
/// UPSERT tagged as updated.
pub(crate) fn build_update(ctx: &PlanContext<'_>) -> String {
    let changing = ctx
        .primary_key
        .iter()
        .map(|k| format!("CHANGING.{}", k))
        .collect::<Vec<_>>()
        .join(" OR ");

    let mut proc = Procedure::for_each_row();
    proc.open(&format!("IF ({})", changing));
    proc.line(&ctx.duplicate_key_declaration("NEW"));
    proc.raise_if("VARIABLES.X", DUPLICATE_KEY);
    for (dependent, fk) in &ctx.dependents {
        proc.raise_if(
            &ctx.dependent_rows_exist(dependent, fk),
            &integrity_message(&dependent.name, "updates"),
        );
    }
    proc.line(&ctx.shadow_write("UPSERT", "OLD", RowStatus::Deleted));
    proc.line(&ctx.shadow_write("UPSERT", "NEW", RowStatus::Inserted));
    proc.otherwise();
    proc.line(&ctx.shadow_write("UPSERT", "NEW", RowStatus::Updated));
    proc.finish()
}
