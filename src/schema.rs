//! Source schema descriptors.
//!
//! Immutable description of the tables a redirection layer is generated
//! for. Tables keep insertion order so everything derived from a schema
//! is deterministic.
//!
//! ```
//! use redirect_layer::schema::{Column, ForeignKey, Schema, Table};
//! use redirect_layer::types::ColumnType;
//!
//! let mut schema = Schema::new("internal");
//! schema.add_table(
//!     Table::new("Person")
//!         .column(Column::new("id", ColumnType::Integer).not_null())
//!         .column(Column::new("name", ColumnType::String))
//!         .primary_key(["id"]),
//! );
//! schema.add_table(
//!     Table::new("address")
//!         .column(Column::new("id", ColumnType::Integer).not_null())
//!         .column(Column::new("pid", ColumnType::Integer))
//!         .primary_key(["id"])
//!         .foreign_key(ForeignKey::new(["pid"], "Person", ["id"])),
//! );
//! assert!(schema.validate().is_ok());
//! assert_eq!(schema.referencing("Person").len(), 1);
//! ```

use serde::Serialize;

use crate::error::{RedirectError, RedirectResult};
use crate::types::ColumnType;

/// A named, ordered collection of tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

/// A table definition.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Option<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A column definition.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
}

/// An outgoing reference from this table's columns to another table.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Empty until resolved against the referenced table's primary key.
    pub referenced_columns: Vec<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Look up a table; identifiers compare case-insensitively.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Every foreign key, from any table, that points at `table`.
    pub fn referencing(&self, table: &str) -> Vec<(&Table, &ForeignKey)> {
        self.tables
            .iter()
            .flat_map(|t| t.foreign_keys.iter().map(move |fk| (t, fk)))
            .filter(|(_, fk)| fk.referenced_table.eq_ignore_ascii_case(table))
            .collect()
    }

    /// Fill in omitted referenced columns with the target's primary key.
    pub fn resolve_foreign_keys(&mut self) -> RedirectResult<()> {
        let mut resolved = Vec::new();
        for (ti, table) in self.tables.iter().enumerate() {
            for (fi, fk) in table.foreign_keys.iter().enumerate() {
                if !fk.referenced_columns.is_empty() {
                    continue;
                }
                let target = self.table(&fk.referenced_table).ok_or_else(|| {
                    RedirectError::InvalidForeignKey {
                        table: table.name.clone(),
                        message: format!("referenced table {} does not exist", fk.referenced_table),
                    }
                })?;
                let pk = target.primary_key.clone().ok_or_else(|| {
                    RedirectError::InvalidForeignKey {
                        table: table.name.clone(),
                        message: format!(
                            "{} has no primary key to reference implicitly",
                            target.name
                        ),
                    }
                })?;
                resolved.push((ti, fi, pk));
            }
        }
        for (ti, fi, pk) in resolved {
            self.tables[ti].foreign_keys[fi].referenced_columns = pk;
        }
        Ok(())
    }

    /// Check that every key names real columns and tables.
    ///
    /// A missing primary key is not an error here; it only prevents that
    /// table from being redirected.
    pub fn validate(&self) -> RedirectResult<()> {
        self.tables.iter().try_for_each(|t| self.validate_table(t))
    }

    /// Check one table's primary key and outgoing foreign keys.
    pub fn validate_table(&self, table: &Table) -> RedirectResult<()> {
        if let Some(pk) = &table.primary_key {
            if pk.is_empty() {
                return Err(RedirectError::InvalidPrimaryKey {
                    table: table.name.clone(),
                    message: "key has no columns".to_string(),
                });
            }
            for name in pk {
                let col = table.require_column(name)?;
                if !col.data_type.can_be_primary_key() {
                    return Err(RedirectError::InvalidPrimaryKey {
                        table: table.name.clone(),
                        message: format!(
                            "column {} of type {} cannot identify a row",
                            col.name, col.data_type
                        ),
                    });
                }
            }
        }

        for fk in &table.foreign_keys {
            let target = self.table(&fk.referenced_table).ok_or_else(|| {
                RedirectError::InvalidForeignKey {
                    table: table.name.clone(),
                    message: format!("referenced table {} does not exist", fk.referenced_table),
                }
            })?;
            if fk.columns.is_empty() || fk.columns.len() != fk.referenced_columns.len() {
                return Err(RedirectError::InvalidForeignKey {
                    table: table.name.clone(),
                    message: format!(
                        "{} local column(s) for {} referenced column(s)",
                        fk.columns.len(),
                        fk.referenced_columns.len()
                    ),
                });
            }
            for name in &fk.columns {
                table.require_column(name)?;
            }
            for name in &fk.referenced_columns {
                target.require_column(name)?;
            }
        }
        Ok(())
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        self.columns.push(col);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> RedirectResult<&Column> {
        self.find_column(name)
            .ok_or_else(|| RedirectError::unknown_column(&self.name, name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl Column {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl ForeignKey {
    pub fn new<I, S, J, T>(columns: I, referenced_table: impl Into<String>, referenced_columns: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
        }
    }
}
