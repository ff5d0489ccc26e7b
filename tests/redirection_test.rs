use pretty_assertions::assert_eq;
use redirect_layer::prelude::*;

const PEOPLE: &str = r#"
schema internal

table Person {
  id integer primary_key
  name string
  dob date
}

table address {
  id integer primary_key
  street string
  pid integer references Person(id)
}
"#;

fn person_layer() -> RedirectedTable {
    let schema = parse_schema(PEOPLE).expect("fixture parses");
    RedirectionSchemaBuilder::new("redirected")
        .build_redirection_layer(&schema, "Person", "base")
        .expect("Person has a primary key")
}

fn lines(lines: &[&str]) -> String {
    lines.join("\n")
}

#[test]
fn test_select_transformation() {
    assert_eq!(
        person_layer().plan.select_transformation,
        "SELECT o.id, o.name, o.dob FROM internal.Person AS o LEFT OUTER JOIN redirected.Person_REDIRECTED AS m ON (o.id = m.id) WHERE m.ROW__STATUS IS NULL \n UNION ALL \nSELECT id, name, dob FROM redirected.Person_REDIRECTED WHERE ROW__STATUS <> 3"
    );
}

#[test]
fn test_insert_plan() {
    assert_eq!(
        person_layer().plan.insert_plan,
        lines(&[
            "FOR EACH ROW",
            "BEGIN ATOMIC",
            "    DECLARE boolean VARIABLES.X = (SELECT true FROM internal.Person WHERE id = NEW.id);",
            "    IF (VARIABLES.X)",
            "    BEGIN",
            "        RAISE SQLEXCEPTION 'duplicate key';",
            "    END",
            "    ELSE",
            "    BEGIN",
            "        INSERT INTO redirected.Person_REDIRECTED (id, name, dob, ROW__STATUS) VALUES (NEW.id, NEW.name, NEW.dob, 1);",
            "    END",
            "END",
        ])
    );
}

#[test]
fn test_update_plan() {
    assert_eq!(
        person_layer().plan.update_plan,
        lines(&[
            "FOR EACH ROW",
            "BEGIN ATOMIC",
            "    IF (CHANGING.id)",
            "    BEGIN",
            "        DECLARE boolean VARIABLES.X = (SELECT true FROM internal.Person WHERE id = NEW.id);",
            "        IF (VARIABLES.X)",
            "        BEGIN",
            "            RAISE SQLEXCEPTION 'duplicate key';",
            "        END",
            "        IF ((SELECT COUNT(*) > 0 FROM base.address WHERE pid = OLD.id))",
            "        BEGIN",
            "            RAISE SQLEXCEPTION 'referential integrity check failed on address table, cascade updates are not supported';",
            "        END",
            "        UPSERT INTO redirected.Person_REDIRECTED (id, name, dob, ROW__STATUS) VALUES (OLD.id, OLD.name, OLD.dob, 3);",
            "        UPSERT INTO redirected.Person_REDIRECTED (id, name, dob, ROW__STATUS) VALUES (NEW.id, NEW.name, NEW.dob, 1);",
            "    END",
            "    ELSE",
            "    BEGIN",
            "        UPSERT INTO redirected.Person_REDIRECTED (id, name, dob, ROW__STATUS) VALUES (NEW.id, NEW.name, NEW.dob, 2);",
            "    END",
            "END",
        ])
    );
}

#[test]
fn test_delete_plan() {
    assert_eq!(
        person_layer().plan.delete_plan,
        lines(&[
            "FOR EACH ROW",
            "BEGIN ATOMIC",
            "    IF ((SELECT COUNT(*) > 0 FROM base.address WHERE pid = OLD.id))",
            "    BEGIN",
            "        RAISE SQLEXCEPTION 'referential integrity check failed on address table, cascade deletes are not supported';",
            "    END",
            "    UPSERT INTO redirected.Person_REDIRECTED (id, name, dob, ROW__STATUS) VALUES (OLD.id, OLD.name, OLD.dob, 3);",
            "END",
        ])
    );
}

#[test]
fn test_delete_never_removes_rows() {
    let layer = person_layer();
    for plan in [&layer.plan.insert_plan, &layer.plan.update_plan, &layer.plan.delete_plan] {
        assert!(!plan.contains("DELETE FROM"));
    }
}

#[test]
fn test_unreferenced_table_has_no_integrity_checks() {
    let schema = parse_schema(PEOPLE).unwrap();
    let layer = RedirectionSchemaBuilder::new("redirected")
        .build_redirection_layer(&schema, "address", "base")
        .unwrap();
    assert_eq!(
        layer.plan.delete_plan,
        lines(&[
            "FOR EACH ROW",
            "BEGIN ATOMIC",
            "    UPSERT INTO redirected.address_REDIRECTED (id, street, pid, ROW__STATUS) VALUES (OLD.id, OLD.street, OLD.pid, 3);",
            "END",
        ])
    );
    assert!(!layer.plan.update_plan.contains("COUNT(*)"));
}

#[test]
fn test_missing_primary_key_produces_nothing() {
    let schema = parse_schema("schema internal\ntable log {\n  msg string\n}\n").unwrap();
    let builder = RedirectionSchemaBuilder::new("redirected");
    let err = builder.build_redirection_layer(&schema, "log", "base").unwrap_err();
    assert_eq!(err.to_string(), "no primary key defined on table log");
    assert!(builder.build_schema(&schema, "base").is_err());
}

#[test]
fn test_generation_is_deterministic() {
    let schema = parse_schema(PEOPLE).unwrap();
    let builder = RedirectionSchemaBuilder::new("redirected");
    let first = builder.build_schema(&schema, "base").unwrap();
    let second = builder.build_schema(&schema, "base").unwrap();
    let plans = |layers: &[RedirectedTable]| layers.iter().map(|l| l.plan.clone()).collect::<Vec<_>>();
    assert_eq!(plans(&first), plans(&second));
    assert_eq!(
        schema_ddl(&first, "redirected", "base"),
        schema_ddl(&second, "redirected", "base")
    );
}

#[test]
fn test_composite_key() {
    let schema = parse_schema(
        r#"
schema sales
table orders {
  region string
  num long
  total bigdecimal
  primary key (region, num)
}
table lines {
  region string
  num long
  pos integer
  primary key (region, num, pos)
  foreign key (region, num) references orders (region, num)
}
"#,
    )
    .unwrap();
    let layer = RedirectionSchemaBuilder::new("shadow")
        .build_redirection_layer(&schema, "orders", "v")
        .unwrap();

    assert!(layer.plan.select_transformation.contains(
        "LEFT OUTER JOIN shadow.orders_REDIRECTED AS m ON (o.region = m.region AND o.num = m.num)"
    ));
    assert!(layer.plan.insert_plan.contains(
        "(SELECT true FROM sales.orders WHERE region = NEW.region AND num = NEW.num)"
    ));
    assert!(layer.plan.update_plan.contains("IF (CHANGING.region OR CHANGING.num)"));
    assert!(layer.plan.delete_plan.contains(
        "IF ((SELECT COUNT(*) > 0 FROM v.lines WHERE region = OLD.region AND num = OLD.num))"
    ));
}

#[test]
fn test_self_reference_is_checked() {
    let schema = parse_schema(
        "schema hr\ntable employee {\n  id integer primary_key\n  manager integer references employee\n}\n",
    )
    .unwrap();
    let layer = RedirectionSchemaBuilder::new("redirected")
        .build_redirection_layer(&schema, "employee", "base")
        .unwrap();
    assert!(layer.plan.delete_plan.contains(
        "IF ((SELECT COUNT(*) > 0 FROM base.employee WHERE manager = OLD.id))"
    ));
}

#[test]
fn test_builder_from_config() {
    let config = RedirectConfig::builder()
        .redirected_schema("shadow")
        .base_schema_alias("views")
        .build()
        .unwrap();
    let schema = parse_schema(PEOPLE).unwrap();
    let builder = RedirectionSchemaBuilder::from_config(&config);
    assert_eq!(builder.redirected_schema(), "shadow");
    let layers = builder
        .build_schema(&schema, &config.base_schema_alias)
        .unwrap();
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|l| l.schema == "views" && l.redirected_schema == "shadow"));
    assert!(layers[0].plan.select_transformation.contains("shadow.Person_REDIRECTED"));
}

#[test]
fn test_plan_serializes_to_json() {
    let json = serde_json::to_value(person_layer()).unwrap();
    assert_eq!(json["name"], "Person");
    assert_eq!(json["shadow"]["name"], "Person_REDIRECTED");
    assert!(json["plan"]["select_transformation"].as_str().unwrap().starts_with("SELECT"));
}

fn person_with(dependent: Table) -> Schema {
    let mut schema = Schema::new("internal");
    schema.add_table(
        Table::new("Person")
            .column(Column::new("id", ColumnType::Integer).not_null())
            .column(Column::new("name", ColumnType::String))
            .primary_key(["id"]),
    );
    schema.add_table(dependent);
    schema
}

#[test]
fn test_unresolved_foreign_key_is_rejected() {
    let schema = person_with(
        Table::new("address")
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("pid", ColumnType::Integer))
            .primary_key(["id"])
            .foreign_key(ForeignKey::new(["pid"], "Person", Vec::<String>::new())),
    );
    let err = RedirectionSchemaBuilder::new("redirected")
        .build_redirection_layer(&schema, "Person", "base")
        .unwrap_err();
    assert!(matches!(err, RedirectError::InvalidForeignKey { table, .. } if table == "address"));
}

#[test]
fn test_mismatched_foreign_key_is_rejected() {
    let schema = person_with(
        Table::new("address")
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("pid", ColumnType::Integer))
            .primary_key(["id"])
            .foreign_key(ForeignKey::new(["pid", "id"], "Person", ["id"])),
    );
    let builder = RedirectionSchemaBuilder::new("redirected");
    assert!(matches!(
        builder.build_redirection_layer(&schema, "Person", "base"),
        Err(RedirectError::InvalidForeignKey { .. })
    ));
    assert!(matches!(
        builder.build_redirection_layer(&schema, "address", "base"),
        Err(RedirectError::InvalidForeignKey { .. })
    ));
}

#[test]
fn test_unknown_primary_key_column_is_rejected() {
    let mut schema = Schema::new("internal");
    schema.add_table(
        Table::new("T")
            .column(Column::new("a", ColumnType::Integer))
            .primary_key(["ghost"]),
    );
    let err = RedirectionSchemaBuilder::new("redirected")
        .build_redirection_layer(&schema, "T", "base")
        .unwrap_err();
    assert!(matches!(
        err,
        RedirectError::UnknownColumn { table, column } if table == "T" && column == "ghost"
    ));
}

#[test]
fn test_dependent_without_primary_key_is_read_from_base() {
    let schema = person_with(
        Table::new("note")
            .column(Column::new("body", ColumnType::String))
            .column(Column::new("pid", ColumnType::Integer))
            .foreign_key(ForeignKey::new(["pid"], "Person", ["id"])),
    );
    let builder = RedirectionSchemaBuilder::new("redirected");
    assert!(matches!(
        builder.build_redirection_layer(&schema, "note", "base"),
        Err(RedirectError::MissingPrimaryKey { .. })
    ));

    let layer = builder
        .build_redirection_layer(&schema, "Person", "base")
        .unwrap();
    let check = "IF ((SELECT COUNT(*) > 0 FROM internal.note WHERE pid = OLD.id))";
    assert!(layer.plan.delete_plan.contains(check));
    assert!(layer.plan.update_plan.contains(check));
    assert!(!layer.plan.delete_plan.contains("base.note"));
}

#[test]
fn test_check_schema_reports_every_table() {
    let schema = person_with(
        Table::new("note")
            .column(Column::new("pid", ColumnType::Integer))
            .foreign_key(ForeignKey::new(["pid"], "Person", ["id"])),
    );
    let report = RedirectionSchemaBuilder::new("redirected").check_schema(&schema, "base");
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].0.name, "Person");
    assert!(report[0].1.is_ok());
    assert_eq!(report[1].0.name, "note");
    assert!(matches!(report[1].1, Err(RedirectError::MissingPrimaryKey { .. })));
}
