//! DELETE trigger generation.

use super::procedure::Procedure;
use super::{PlanContext, integrity_message};
use crate::status::RowStatus;

/// Generate the INSTEAD OF DELETE body: a soft delete in the shadow table,
/// refused while referencing rows exist.
pub(crate) fn build_delete(ctx: &PlanContext<'_>) -> String {
    let mut proc = Procedure::for_each_row();
    for (dependent, fk) in &ctx.dependents {
        proc.raise_if(
            &ctx.dependent_rows_exist(dependent, fk),
            &integrity_message(&dependent.name, "deletes"),
        );
    }
    proc.line(&ctx.shadow_write("UPSERT", "OLD", RowStatus::Deleted));
    proc.finish()
}
