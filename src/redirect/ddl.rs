//! DDL rendering of generated layers.

use super::RedirectedTable;
use crate::schema::{Column, Table};

/// Generate CREATE FOREIGN TABLE for the shadow table.
pub fn shadow_table_ddl(layer: &RedirectedTable) -> String {
    let shadow: &Table = &layer.shadow;
    let mut sql = format!("CREATE FOREIGN TABLE {} (\n", shadow.name);
    sql.push_str(&column_block(&shadow.columns, shadow.primary_key.as_deref()));
    sql.push_str("\n);");
    sql
}

/// Generate CREATE VIEW plus its three INSTEAD OF triggers.
pub fn view_ddl(layer: &RedirectedTable) -> String {
    let mut sql = format!("CREATE VIEW {} (\n", layer.name);
    sql.push_str(&column_block(&layer.columns, Some(layer.primary_key.as_slice())));
    sql.push_str("\n) OPTIONS (UPDATABLE 'TRUE')\nAS\n");
    sql.push_str(&layer.plan.select_transformation);
    sql.push_str(";\n");

    let triggers = [
        ("INSERT", &layer.plan.insert_plan),
        ("UPDATE", &layer.plan.update_plan),
        ("DELETE", &layer.plan.delete_plan),
    ];
    for (event, body) in triggers {
        sql.push_str(&format!(
            "\nCREATE TRIGGER ON {} INSTEAD OF {} AS\n{};\n",
            layer.name, event, body
        ));
    }
    sql.truncate(sql.trim_end().len());
    sql
}

/// Render both schemas: shadow tables first, then the views over them.
pub fn schema_ddl(layers: &[RedirectedTable], redirected_schema: &str, base_schema_alias: &str) -> String {
    let mut sections = vec![format!("SET SCHEMA {};", redirected_schema)];
    sections.extend(layers.iter().map(shadow_table_ddl));
    sections.push(format!("SET SCHEMA {};", base_schema_alias));
    sections.extend(layers.iter().map(view_ddl));
    sections.join("\n\n")
}

fn column_block(columns: &[Column], primary_key: Option<&[String]>) -> String {
    let mut defs: Vec<String> = columns
        .iter()
        .map(|col| {
            let is_key = primary_key
                .is_some_and(|pk| pk.iter().any(|k| k.eq_ignore_ascii_case(&col.name)));
            let mut line = format!("    {} {}", col.name, col.data_type.ddl_name());
            if !col.nullable || is_key {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();
    if let Some(pk) = primary_key {
        defs.push(format!("    PRIMARY KEY({})", pk.join(", ")));
    }
    defs.join(",\n")
}
