//! Schema file parser using nom.
//!
//! ## Grammar
//! ```text
//! file        = "schema" IDENT { table_def }*
//! table_def   = "table" IDENT "{" { body_line }* "}"
//! body_line   = column_def | pk_clause | fk_clause
//! column_def  = IDENT TYPE { constraint }*
//! constraint  = "primary_key" | "not_null" | "nullable" | reference
//! pk_clause   = "primary" "key" "(" IDENT { "," IDENT }* ")"
//! fk_clause   = "foreign" "key" "(" IDENT { "," IDENT }* ")" reference
//! reference   = "references" IDENT [ "(" IDENT { "," IDENT }* ")" ]
//! ```
//!
//! One statement per line. `#` and `--` start comments. A reference without
//! a column list targets the referenced table's primary key.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, space0, space1},
    combinator::{all_consuming, map, opt, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use crate::error::{RedirectError, RedirectResult};
use crate::schema::{Column, ForeignKey, Schema, Table};
use crate::types::ColumnType;

#[derive(Debug, Clone)]
enum ColumnConstraint<'a> {
    PrimaryKey,
    NotNull,
    Nullable,
    References(&'a str, Option<Vec<&'a str>>),
}

#[derive(Debug)]
enum BodyLine<'a> {
    PrimaryKey(Vec<&'a str>),
    ForeignKey(Vec<&'a str>, &'a str, Option<Vec<&'a str>>),
    Column(&'a str, &'a str, Vec<ColumnConstraint<'a>>),
}

/// Table being assembled, with the line it started on.
struct OpenTable {
    line: usize,
    table: Table,
    column_pk: Vec<String>,
    table_pk: Option<Vec<String>>,
}

/// Parse a schema file into a validated [`Schema`].
pub fn parse_schema(input: &str) -> RedirectResult<Schema> {
    let mut name: Option<String> = None;
    let mut tables: Vec<Table> = Vec::new();
    let mut open: Option<OpenTable> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(current) = open.as_mut() {
            if line == "}" {
                let finished = open.take().map(close_table).transpose()?;
                if let Some(table) = finished {
                    if tables.iter().any(|t| t.name.eq_ignore_ascii_case(&table.name)) {
                        return Err(RedirectError::parse(
                            line_no,
                            format!("duplicate table {}", table.name),
                        ));
                    }
                    tables.push(table);
                }
                continue;
            }
            apply_body_line(current, line, line_no)?;
            continue;
        }

        if let Ok((_, schema_name)) = schema_header(line) {
            if name.is_some() {
                return Err(RedirectError::parse(line_no, "schema declared twice"));
            }
            name = Some(schema_name.to_string());
        } else if let Ok((_, table_name)) = table_header(line) {
            if name.is_none() {
                return Err(RedirectError::parse(
                    line_no,
                    "`schema <name>` must precede the first table",
                ));
            }
            open = Some(OpenTable {
                line: line_no,
                table: Table::new(table_name),
                column_pk: Vec::new(),
                table_pk: None,
            });
        } else {
            return Err(RedirectError::parse(
                line_no,
                format!("unknown statement: {}", line),
            ));
        }
    }

    if let Some(unclosed) = open {
        return Err(RedirectError::parse(
            unclosed.line,
            format!("table {} is missing its closing brace", unclosed.table.name),
        ));
    }

    let name = name.ok_or_else(|| RedirectError::parse(1, "missing `schema <name>` declaration"))?;
    let mut schema = Schema { name, tables };
    schema.resolve_foreign_keys()?;
    schema.validate()?;
    Ok(schema)
}

fn strip_comment(line: &str) -> &str {
    let cut = [line.find('#'), line.find("--")]
        .into_iter()
        .flatten()
        .min();
    match cut {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn apply_body_line(current: &mut OpenTable, line: &str, line_no: usize) -> RedirectResult<()> {
    let (_, parsed) = body_line(line)
        .map_err(|_| RedirectError::parse(line_no, format!("invalid table body line: {}", line)))?;

    match parsed {
        BodyLine::PrimaryKey(cols) => {
            if current.table_pk.is_some() {
                return Err(RedirectError::parse(line_no, "primary key declared twice"));
            }
            current.table_pk = Some(owned(cols));
        }
        BodyLine::ForeignKey(cols, target, target_cols) => {
            let fk = ForeignKey::new(cols, target, target_cols.unwrap_or_default());
            current.table.foreign_keys.push(fk);
        }
        BodyLine::Column(name, type_name, constraints) => {
            let data_type: ColumnType = type_name
                .parse()
                .map_err(|e: crate::types::UnknownType| RedirectError::parse(line_no, e.to_string()))?;
            let mut col = Column::new(name, data_type);
            for constraint in constraints {
                match constraint {
                    ColumnConstraint::PrimaryKey => {
                        col.nullable = false;
                        current.column_pk.push(name.to_string());
                    }
                    ColumnConstraint::NotNull => col.nullable = false,
                    ColumnConstraint::Nullable => col.nullable = true,
                    ColumnConstraint::References(target, target_cols) => {
                        current.table.foreign_keys.push(ForeignKey::new(
                            [name],
                            target,
                            target_cols.unwrap_or_default(),
                        ));
                    }
                }
            }
            current.table.columns.push(col);
        }
    }
    Ok(())
}

fn close_table(open: OpenTable) -> RedirectResult<Table> {
    let OpenTable {
        line,
        mut table,
        column_pk,
        table_pk,
    } = open;
    table.primary_key = match (column_pk.is_empty(), table_pk) {
        (true, None) => None,
        (false, None) => Some(column_pk),
        (true, Some(pk)) => Some(pk),
        (false, Some(_)) => {
            return Err(RedirectError::parse(
                line,
                format!(
                    "table {} declares its primary key both inline and as a clause",
                    table.name
                ),
            ));
        }
    };
    Ok(table)
}

fn owned(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn ident_list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        pair(char('('), space0),
        separated_list1(tuple((space0, char(','), space0)), ident),
        pair(space0, char(')')),
    )(input)
}

fn reference(input: &str) -> IResult<&str, (&str, Option<Vec<&str>>)> {
    preceded(
        pair(tag_no_case("references"), space1),
        pair(ident, opt(preceded(space0, ident_list))),
    )(input)
}

fn schema_header(input: &str) -> IResult<&str, &str> {
    all_consuming(preceded(pair(tag_no_case("schema"), space1), ident))(input)
}

fn table_header(input: &str) -> IResult<&str, &str> {
    all_consuming(delimited(
        pair(tag_no_case("table"), space1),
        ident,
        pair(space0, char('{')),
    ))(input)
}

fn column_constraint(input: &str) -> IResult<&str, ColumnConstraint<'_>> {
    alt((
        map(reference, |(t, cols)| ColumnConstraint::References(t, cols)),
        value(ColumnConstraint::PrimaryKey, tag_no_case("primary_key")),
        value(ColumnConstraint::NotNull, tag_no_case("not_null")),
        value(ColumnConstraint::Nullable, tag_no_case("nullable")),
    ))(input)
}

fn primary_key_clause(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        tuple((tag_no_case("primary"), space1, tag_no_case("key"), space0)),
        ident_list,
    )(input)
}

fn foreign_key_clause(input: &str) -> IResult<&str, (Vec<&str>, (&str, Option<Vec<&str>>))> {
    pair(
        preceded(
            tuple((tag_no_case("foreign"), space1, tag_no_case("key"), space0)),
            ident_list,
        ),
        preceded(space1, reference),
    )(input)
}

fn column_def(input: &str) -> IResult<&str, (&str, &str, Vec<ColumnConstraint<'_>>)> {
    tuple((
        ident,
        preceded(space1, ident),
        many0(preceded(space1, column_constraint)),
    ))(input)
}

fn body_line(input: &str) -> IResult<&str, BodyLine<'_>> {
    all_consuming(alt((
        map(primary_key_clause, BodyLine::PrimaryKey),
        map(foreign_key_clause, |(cols, (target, target_cols))| {
            BodyLine::ForeignKey(cols, target, target_cols)
        }),
        map(column_def, |(name, ty, constraints)| {
            BodyLine::Column(name, ty, constraints)
        }),
    )))(input)
}
