//! # redirect-layer
//!
//! Copy-on-write write support for read-only SQL sources.
//!
//! Given the metadata of a base table, generates an updatable view over it
//! plus INSTEAD OF triggers that send every write to a `<Table>_REDIRECTED`
//! shadow table. Shadow rows carry a status (`1` inserted, `2` updated,
//! `3` deleted) and the view's SELECT merges them with the base rows.
//!
//! ## Quick Example
//!
//! ```
//! use redirect_layer::prelude::*;
//!
//! let schema = redirect_layer::parse_schema(
//!     "schema internal\ntable Person {\n  id integer primary_key\n  name string\n}\n",
//! )?;
//!
//! let builder = RedirectionSchemaBuilder::new("redirected");
//! let layer = builder.build_redirection_layer(&schema, "Person", "base")?;
//! assert!(layer.plan.select_transformation.starts_with("SELECT o.id, o.name FROM internal.Person"));
//! # Ok::<(), RedirectError>(())
//! ```
//!
//! Generation is pure: identical input always yields identical text.

pub mod config;
pub mod error;
pub mod parser;
pub mod redirect;
pub mod schema;
pub mod status;
pub mod types;

pub mod prelude {
    pub use crate::config::RedirectConfig;
    pub use crate::error::*;
    pub use crate::parser::parse_schema;
    pub use crate::redirect::ddl::{schema_ddl, shadow_table_ddl, view_ddl};
    pub use crate::redirect::{RedirectedTable, RedirectionPlan, RedirectionSchemaBuilder};
    pub use crate::schema::{Column, ForeignKey, Schema, Table};
    pub use crate::status::{ROW_STATUS_COLUMN, RowStatus};
    pub use crate::types::ColumnType;
}

/// Parse a schema file into a validated schema.
///
/// # Example
///
/// ```
/// let schema = redirect_layer::parse_schema("schema s\ntable t {\n  id integer primary_key\n}\n").unwrap();
/// assert_eq!(schema.tables[0].name, "t");
/// ```
pub fn parse_schema(input: &str) -> Result<schema::Schema, error::RedirectError> {
    parser::parse_schema(input)
}
