//! Redirection layer generation.
//!
//! For a base table `T` that cannot be written to, the layer consists of a
//! view named `T` plus INSTEAD OF triggers. Writes land in a shadow table
//! `T_REDIRECTED` in the redirected schema, tagged with a [`RowStatus`];
//! reads union untouched base rows with live shadow rows.
//!
//! ```
//! use redirect_layer::prelude::*;
//!
//! let mut schema = Schema::new("internal");
//! schema.add_table(
//!     Table::new("Person")
//!         .column(Column::new("id", ColumnType::Integer).not_null())
//!         .primary_key(["id"]),
//! );
//!
//! let builder = RedirectionSchemaBuilder::new("redirected");
//! let layer = builder.build_redirection_layer(&schema, "Person", "base").unwrap();
//! assert_eq!(layer.shadow.name, "Person_REDIRECTED");
//! ```

pub mod ddl;
mod delete;
mod insert;
pub(crate) mod procedure;
mod select;
mod update;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RedirectConfig;
use crate::error::{RedirectError, RedirectResult};
use crate::schema::{Column, ForeignKey, Schema, Table};
use crate::status::{ROW_STATUS_COLUMN, RowStatus};
use crate::types::ColumnType;

/// Suffix of every shadow table name.
pub const REDIRECTED_SUFFIX: &str = "_REDIRECTED";

/// Generated SQL attached to a redirected view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectionPlan {
    pub select_transformation: String,
    pub insert_plan: String,
    pub update_plan: String,
    pub delete_plan: String,
}

/// Virtual table produced for one base table.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectedTable {
    /// Schema the view lives in (the base schema alias).
    pub schema: String,
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub plan: RedirectionPlan,
    pub redirected_schema: String,
    pub shadow: Table,
}

/// Builds redirection layers targeting one redirected schema.
///
/// Holds no mutable state; a single builder can serve any number of
/// tables, from any number of threads.
#[derive(Debug, Clone)]
pub struct RedirectionSchemaBuilder {
    redirected_schema: String,
}

/// Everything the per-statement generators need about one table.
pub(crate) struct PlanContext<'a> {
    pub table: &'a Table,
    pub primary_key: &'a [String],
    /// Qualified base relation, e.g. `internal.Person`.
    pub base: String,
    /// Qualified shadow relation, e.g. `redirected.Person_REDIRECTED`.
    pub shadow: String,
    /// Schema of the base relations, e.g. `internal`.
    pub source_schema: &'a str,
    /// Schema holding the views of referencing tables.
    pub view_schema: &'a str,
    pub dependents: Vec<(&'a Table, &'a ForeignKey)>,
}

impl RedirectionSchemaBuilder {
    pub fn new(redirected_schema: impl Into<String>) -> Self {
        Self {
            redirected_schema: redirected_schema.into(),
        }
    }

    pub fn from_config(config: &RedirectConfig) -> Self {
        Self::new(config.redirected_schema.clone())
    }

    pub fn redirected_schema(&self) -> &str {
        &self.redirected_schema
    }

    /// Generate the redirection layer for `table_name`.
    ///
    /// Fails with [`RedirectError::MissingPrimaryKey`] before producing any
    /// text when the table has no primary key, and with the matching key
    /// error when the table or any table referencing it has keys naming
    /// missing columns or unresolved foreign keys.
    pub fn build_redirection_layer(
        &self,
        schema: &Schema,
        table_name: &str,
        base_schema_alias: &str,
    ) -> RedirectResult<RedirectedTable> {
        let table = schema
            .table(table_name)
            .ok_or_else(|| RedirectError::UnknownTable(table_name.to_string()))?;

        let primary_key = match &table.primary_key {
            Some(pk) if !pk.is_empty() => pk.as_slice(),
            _ => return Err(RedirectError::missing_primary_key(&table.name)),
        };

        let dependents = schema.referencing(&table.name);
        schema.validate_table(table)?;
        for (dependent, _) in &dependents {
            schema.validate_table(dependent)?;
        }

        let ctx = PlanContext {
            table,
            primary_key,
            base: format!("{}.{}", schema.name, table.name),
            shadow: format!("{}.{}", self.redirected_schema, shadow_table_name(&table.name)),
            source_schema: &schema.name,
            view_schema: base_schema_alias,
            dependents,
        };

        let plan = RedirectionPlan {
            select_transformation: select::build_select(&ctx),
            insert_plan: insert::build_insert(&ctx),
            update_plan: update::build_update(&ctx),
            delete_plan: delete::build_delete(&ctx),
        };

        debug!(
            table = %table.name,
            dependents = ctx.dependents.len(),
            "generated redirection plan"
        );

        Ok(RedirectedTable {
            schema: base_schema_alias.to_string(),
            name: table.name.clone(),
            columns: table.columns.clone(),
            primary_key: primary_key.to_vec(),
            plan,
            redirected_schema: self.redirected_schema.clone(),
            shadow: shadow_table(table, primary_key),
        })
    }

    /// Generate layers for every table, in schema order.
    ///
    /// The first table that cannot be redirected aborts the whole build.
    pub fn build_schema(
        &self,
        schema: &Schema,
        base_schema_alias: &str,
    ) -> RedirectResult<Vec<RedirectedTable>> {
        let mut layers = Vec::with_capacity(schema.tables.len());
        for table in &schema.tables {
            match self.build_redirection_layer(schema, &table.name, base_schema_alias) {
                Ok(layer) => layers.push(layer),
                Err(e) => {
                    warn!(schema = %schema.name, table = %table.name, error = %e, "redirection aborted");
                    return Err(e);
                }
            }
        }
        info!(
            schema = %schema.name,
            redirected = %self.redirected_schema,
            tables = layers.len(),
            "built redirection schema"
        );
        Ok(layers)
    }

    /// Try every table without stopping at the first failure.
    pub fn check_schema<'s>(
        &self,
        schema: &'s Schema,
        base_schema_alias: &str,
    ) -> Vec<(&'s Table, RedirectResult<RedirectedTable>)> {
        schema
            .tables
            .iter()
            .map(|t| (t, self.build_redirection_layer(schema, &t.name, base_schema_alias)))
            .collect()
    }
}

pub fn shadow_table_name(table: &str) -> String {
    format!("{}{}", table, REDIRECTED_SUFFIX)
}

/// Shadow table: source columns, a status column, same primary key.
fn shadow_table(table: &Table, primary_key: &[String]) -> Table {
    let mut shadow = Table::new(shadow_table_name(&table.name)).primary_key(primary_key.iter().cloned());
    for col in &table.columns {
        let mut col = col.clone();
        if primary_key.iter().any(|k| k.eq_ignore_ascii_case(&col.name)) {
            col.nullable = false;
        }
        shadow = shadow.column(col);
    }
    shadow.column(Column::new(ROW_STATUS_COLUMN, ColumnType::Integer).not_null())
}

impl PlanContext<'_> {
    /// `a, b, c` or `o.a, o.b, o.c`.
    pub fn column_list(&self, prefix: Option<&str>) -> String {
        self.table
            .column_names()
            .map(|c| qualify(prefix, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `a, b, ROW__STATUS`.
    pub fn shadow_column_list(&self) -> String {
        format!("{}, {}", self.column_list(None), ROW_STATUS_COLUMN)
    }

    /// Primary key equality, e.g. `o.id = m.id` or `id = NEW.id`.
    pub fn key_predicate(&self, left: Option<&str>, right: &str) -> String {
        self.primary_key
            .iter()
            .map(|k| format!("{} = {}", qualify(left, k), qualify(Some(right), k)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// `INSERT`/`UPSERT` of one row image into the shadow table.
    pub fn shadow_write(&self, verb: &str, image: &str, status: RowStatus) -> String {
        format!(
            "{} INTO {} ({}) VALUES ({}, {});",
            verb,
            self.shadow,
            self.shadow_column_list(),
            self.column_list(Some(image)),
            status
        )
    }

    /// Condition true when the base table already holds `image`'s key.
    pub fn duplicate_key_declaration(&self, image: &str) -> String {
        format!(
            "DECLARE boolean VARIABLES.X = (SELECT true FROM {} WHERE {});",
            self.base,
            self.key_predicate(None, image)
        )
    }

    /// Condition true when `dependent` still has rows pointing at `OLD`.
    ///
    /// Dependents with a primary key are read through their view so that
    /// soft-deleted rows do not count; others never get a view and are
    /// read from the base relation.
    pub fn dependent_rows_exist(&self, dependent: &Table, fk: &ForeignKey) -> String {
        let relation_schema = match &dependent.primary_key {
            Some(pk) if !pk.is_empty() => self.view_schema,
            _ => self.source_schema,
        };
        let predicate = fk
            .columns
            .iter()
            .zip(&fk.referenced_columns)
            .map(|(local, target)| format!("{} = OLD.{}", local, target))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(
            "(SELECT COUNT(*) > 0 FROM {}.{} WHERE {})",
            relation_schema, dependent.name, predicate
        )
    }
}

fn qualify(prefix: Option<&str>, column: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, column),
        None => column.to_string(),
    }
}

pub(crate) const DUPLICATE_KEY: &str = "duplicate key";

pub(crate) fn integrity_message(dependent: &str, operation: &str) -> String {
    format!(
        "referential integrity check failed on {} table, cascade {} are not supported",
        dependent, operation
    )
}
