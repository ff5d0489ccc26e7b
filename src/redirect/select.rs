//! Read path: union of unshadowed base rows and live shadow rows.

use super::PlanContext;
use crate::status::{ROW_STATUS_COLUMN, RowStatus};

/// Generate the view's SELECT transformation.
///
/// The first branch anti-joins the base table against the shadow table so
/// that only rows without a shadow record survive; the second branch adds
/// every shadow row that is not logically deleted.
pub(crate) fn build_select(ctx: &PlanContext<'_>) -> String {
    format!(
        "SELECT {} FROM {} AS o LEFT OUTER JOIN {} AS m ON ({}) WHERE m.{} IS NULL \n UNION ALL \nSELECT {} FROM {} WHERE {} <> {}",
        ctx.column_list(Some("o")),
        ctx.base,
        ctx.shadow,
        ctx.key_predicate(Some("o"), "m"),
        ROW_STATUS_COLUMN,
        ctx.column_list(None),
        ctx.shadow,
        ROW_STATUS_COLUMN,
        RowStatus::Deleted,
    )
}
