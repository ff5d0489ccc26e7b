//! INSERT trigger generation.

use super::procedure::Procedure;
use super::{DUPLICATE_KEY, PlanContext};
use crate::status::RowStatus;

/// Generate the INSTEAD OF INSERT body.
///
/// Key uniqueness is checked against the base table because the shadow
/// table's own primary key cannot see base rows.
pub(crate) fn build_insert(ctx: &PlanContext<'_>) -> String {
    let mut proc = Procedure::for_each_row();
    proc.line(&ctx.duplicate_key_declaration("NEW"));
    proc.open("IF (VARIABLES.X)");
    proc.line(&format!("RAISE SQLEXCEPTION '{}';", DUPLICATE_KEY));
    proc.otherwise();
    proc.line(&ctx.shadow_write("INSERT", "NEW", RowStatus::Inserted));
    proc.finish()
}
