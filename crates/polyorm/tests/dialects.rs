use chrono::NaiveDate;
use polyorm::dialect::{Dialect, DialectConfig, GuidFormat, QuoteMode};
use polyorm::{
    CompositeIndex, DialectKind, FieldDefinition, FieldType, ForeignKey, ModelDefinition, Record,
    ReferentialAction, Value,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn person() -> ModelDefinition {
    ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
        .field(FieldDefinition::new("Name", FieldType::String))
        .field(FieldDefinition::new("Age", FieldType::Int32).nullable())
        .field(FieldDefinition::new("Active", FieldType::Bool))
        .build()
        .unwrap()
}

fn ann() -> Record {
    Record::new()
        .with("Id", 1)
        .with("Name", "Ann")
        .with("Age", Value::Null)
        .with("Active", true)
}

fn dialect(kind: DialectKind) -> std::sync::Arc<dyn Dialect> {
    kind.create(None)
}

#[test]
fn create_table_sqlite() {
    assert_eq!(
        dialect(DialectKind::Sqlite)
            .create_table_statement(&person())
            .unwrap(),
        "CREATE TABLE \"Person\" \n(\n  \"Id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n  \"Name\" VARCHAR(255) NULL,\n  \"Age\" INTEGER NULL,\n  \"Active\" INTEGER NOT NULL\n);"
    );
}

#[test]
fn create_table_mysql() {
    assert_eq!(
        dialect(DialectKind::MySql)
            .create_table_statement(&person())
            .unwrap(),
        "CREATE TABLE `Person` \n(\n  `Id` INT PRIMARY KEY AUTO_INCREMENT,\n  `Name` VARCHAR(255) NULL,\n  `Age` INT NULL,\n  `Active` TINYINT(1) NOT NULL\n);"
    );
}

#[test]
fn create_table_postgres_uses_serial() {
    let sql = dialect(DialectKind::Postgres)
        .create_table_statement(&person())
        .unwrap();
    assert!(sql.contains("\"Id\" SERIAL PRIMARY KEY,"), "{sql}");
    assert!(sql.contains("\"Active\" BOOLEAN NOT NULL"), "{sql}");
}

#[test]
fn create_table_sqlserver_uses_identity() {
    let sql = dialect(DialectKind::SqlServer)
        .create_table_statement(&person())
        .unwrap();
    assert!(sql.starts_with("CREATE TABLE [Person] \n(\n  [Id] INT PRIMARY KEY IDENTITY(1,1),"));
    assert!(sql.contains("[Active] BIT NOT NULL"), "{sql}");
}

#[test]
fn create_table_firebird_quotes_only_reserved() {
    assert_eq!(
        dialect(DialectKind::Firebird)
            .create_table_statement(&person())
            .unwrap(),
        "CREATE TABLE Person \n(\n  Id INTEGER NOT NULL PRIMARY KEY,\n  Name VARCHAR(255),\n  Age INTEGER,\n  \"Active\" SMALLINT NOT NULL\n);"
    );
}

#[test]
fn foreign_key_constraint() {
    let line = ModelDefinition::builder("OrderLine")
        .field(FieldDefinition::new("Id", FieldType::Int32))
        .field(
            FieldDefinition::new("OrderId", FieldType::Int32)
                .references(ForeignKey::new("Order").on_delete(ReferentialAction::Cascade)),
        )
        .build()
        .unwrap();
    assert_eq!(
        dialect(DialectKind::Firebird)
            .create_table_statement(&line)
            .unwrap(),
        "CREATE TABLE OrderLine \n(\n  Id INTEGER NOT NULL PRIMARY KEY,\n  OrderId INTEGER NOT NULL,\n\n  CONSTRAINT FK_OrderLine_Order_OrderId FOREIGN KEY (OrderId) REFERENCES \"Order\" (Id) ON DELETE CASCADE\n);"
    );
}

#[test]
fn composite_key_constraint_and_row_filter() {
    let membership = ModelDefinition::builder("Membership")
        .field(FieldDefinition::new("UserId", FieldType::Int32))
        .field(FieldDefinition::new("GroupId", FieldType::Int32))
        .field(FieldDefinition::new("Role", FieldType::String))
        .composite_key(["UserId", "GroupId"])
        .build()
        .unwrap();
    let d = dialect(DialectKind::Sqlite);
    assert_eq!(
        d.create_table_statement(&membership).unwrap(),
        "CREATE TABLE \"Membership\" \n(\n  \"UserId\" INTEGER NOT NULL,\n  \"GroupId\" INTEGER NOT NULL,\n  \"Role\" VARCHAR(255) NULL,\n\n  PRIMARY KEY (\"UserId\", \"GroupId\")\n);"
    );

    let row = Record::new()
        .with("UserId", 1)
        .with("GroupId", 2)
        .with("Role", "admin");
    assert_eq!(
        d.delete_row_statement(&membership, &row).unwrap(),
        "DELETE FROM \"Membership\" WHERE \"UserId\" = 1 AND \"GroupId\" = 2"
    );
    assert_eq!(
        d.update_row_statement(&membership, &row, &[]).unwrap(),
        "UPDATE \"Membership\" SET \"Role\" = 'admin' WHERE \"UserId\" = 1 AND \"GroupId\" = 2"
    );
}

#[test]
fn index_statements() {
    let model = ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32))
        .field(FieldDefinition::new("Name", FieldType::String).indexed())
        .field(FieldDefinition::new("Email", FieldType::String).unique())
        .field(FieldDefinition::new("Age", FieldType::Int32))
        .composite_index(CompositeIndex::new(["Name", "Age DESC"]).unique())
        .build()
        .unwrap();
    assert_eq!(
        dialect(DialectKind::Sqlite).create_index_statements(&model),
        [
            "CREATE INDEX \"idx_person_name\" ON \"Person\" (\"Name\" ASC);",
            "CREATE UNIQUE INDEX \"uidx_person_email\" ON \"Person\" (\"Email\" ASC);",
            "CREATE UNIQUE INDEX \"uidx_person_name_age\" ON \"Person\" (\"Name\" ASC, \"Age\" DESC);",
        ]
    );
}

#[test]
fn composite_index_with_unknown_field_is_rejected() {
    let err = ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32))
        .composite_index(CompositeIndex::new(["Nope"]))
        .build()
        .unwrap_err();
    assert!(err.is_definition());
}

#[test]
fn reserved_words_are_quoted() {
    let order = ModelDefinition::builder("Order")
        .field(FieldDefinition::new("Id", FieldType::Int32))
        .field(FieldDefinition::new("Key", FieldType::String))
        .field(FieldDefinition::new("Name", FieldType::String))
        .build()
        .unwrap();

    let fb = dialect(DialectKind::Firebird);
    assert_eq!(fb.quoted_table_name(&order), "\"Order\"");
    assert_eq!(fb.quoted_column_name("Key"), "\"Key\"");
    assert_eq!(fb.quoted_column_name("Name"), "Name");

    let sqlite = DialectKind::Sqlite.create(Some(
        DialectConfig::default().with_quote_mode(QuoteMode::Reserved),
    ));
    assert_eq!(sqlite.quoted_table_name(&order), "\"Order\"");
    assert_eq!(sqlite.quoted_column_name("Name"), "Name");
    assert_eq!(sqlite.quoted_column_name("First Name"), "\"First Name\"");

    let mssql = dialect(DialectKind::SqlServer);
    assert_eq!(mssql.quoted_column_name("we]ird"), "[we]]ird]");
}

#[test]
fn schema_qualified_table() {
    let model = ModelDefinition::builder("Person")
        .schema("sales")
        .field(FieldDefinition::new("Id", FieldType::Int32))
        .build()
        .unwrap();
    assert!(model.is_in_schema());
    assert_eq!(
        dialect(DialectKind::Postgres).quoted_table_name(&model),
        "\"sales\".\"Person\""
    );
}

#[test]
fn literal_formats() {
    let guid = Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
    let v = Value::Guid(guid);
    assert_eq!(
        dialect(DialectKind::Postgres).quoted_value(&v, None).unwrap(),
        "'6f9619ff-8b86-d011-b42d-00c04fc964ff'::uuid"
    );
    assert_eq!(
        dialect(DialectKind::SqlServer).quoted_value(&v, None).unwrap(),
        "CAST('6f9619ff-8b86-d011-b42d-00c04fc964ff' AS UNIQUEIDENTIFIER)"
    );
    assert_eq!(
        dialect(DialectKind::Firebird).quoted_value(&v, None).unwrap(),
        "x'6F9619FF8B86D011B42D00C04FC964FF'"
    );
    let binary = DialectKind::Sqlite.create(Some(
        DialectConfig::default().with_guid_format(GuidFormat::Binary),
    ));
    assert_eq!(
        binary.quoted_value(&v, None).unwrap(),
        "X'6F9619FF8B86D011B42D00C04FC964FF'"
    );

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let sqlite = dialect(DialectKind::Sqlite);
    assert_eq!(
        sqlite
            .quoted_value(&Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()), None)
            .unwrap(),
        "'2024-01-02'"
    );
    assert_eq!(
        sqlite
            .quoted_value(
                &Value::DateTime(day.and_hms_milli_opt(13, 4, 5, 60).unwrap()),
                None
            )
            .unwrap(),
        "'2024-01-02 13:04:05.060'"
    );

    assert_eq!(
        dialect(DialectKind::Postgres)
            .quoted_value(&Value::Bool(false), None)
            .unwrap(),
        "false"
    );
    assert_eq!(
        dialect(DialectKind::MySql)
            .quoted_value(&Value::Bool(true), None)
            .unwrap(),
        "1"
    );
    assert_eq!(sqlite.quoted_value(&Value::Null, None).unwrap(), "NULL");
    assert_eq!(
        sqlite.quoted_value(&Value::from("O'Brien"), None).unwrap(),
        "'O''Brien'"
    );
    assert_eq!(
        dialect(DialectKind::MySql)
            .quoted_value(&Value::from("a\\b"), None)
            .unwrap(),
        "'a\\\\b'"
    );

    let unicode = DialectKind::SqlServer.create(Some(DialectConfig::default().with_unicode(true)));
    assert_eq!(unicode.quoted_value(&Value::from("x"), None).unwrap(), "N'x'");
}

#[test]
fn decimal_literals_never_lose_digits() {
    let price = FieldDefinition::new("Price", FieldType::Decimal).precision(10, 2);
    let sqlite = dialect(DialectKind::Sqlite);
    let fits: Decimal = "12.50".parse().unwrap();
    assert_eq!(
        sqlite.field_value(&price, &Value::Decimal(fits)).unwrap(),
        "12.50"
    );
    let too_precise: Decimal = "12.505".parse().unwrap();
    let err = sqlite
        .field_value(&price, &Value::Decimal(too_precise))
        .unwrap_err();
    assert!(matches!(err, polyorm::OrmError::Literal(_)));

    let wide = FieldDefinition::new("Total", FieldType::Decimal).precision(30, 2);
    assert!(
        dialect(DialectKind::Firebird)
            .column_type(&wide)
            .unwrap_err()
            .is_not_supported()
    );
    assert_eq!(sqlite.column_type(&wide).unwrap(), "DECIMAL(30,2)");
}

#[test]
fn string_types_honour_length_and_unicode() {
    let short = FieldDefinition::new("Code", FieldType::String).length(10);
    let long = FieldDefinition::new("Body", FieldType::String).length(100_000);
    let mssql = dialect(DialectKind::SqlServer);
    assert_eq!(mssql.column_type(&short).unwrap(), "VARCHAR(10)");

    let unicode = DialectKind::SqlServer.create(Some(DialectConfig::default().with_unicode(true)));
    assert_eq!(unicode.column_type(&short).unwrap(), "NVARCHAR(10)");

    let sized = DialectKind::MySql.create(Some(
        DialectConfig::default().with_default_string_length(80),
    ));
    assert_eq!(
        sized
            .column_type(&FieldDefinition::new("Name", FieldType::String))
            .unwrap(),
        "VARCHAR(80)"
    );
    assert_ne!(
        mssql.column_type(&long).unwrap(),
        mssql.column_type(&short).unwrap()
    );
}

#[test]
fn row_dml_skips_generated_and_computed_fields() {
    let model = ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
        .field(FieldDefinition::new("Name", FieldType::String))
        .field(FieldDefinition::new("Age", FieldType::Int32).nullable())
        .field(FieldDefinition::new("Active", FieldType::Bool))
        .field(FieldDefinition::new("Label", FieldType::String).computed())
        .build()
        .unwrap();
    let d = dialect(DialectKind::Sqlite);
    let mut row = ann().with("Label", "ignored");

    assert_eq!(
        d.insert_row_statement(&model, &mut row, &[], None).unwrap(),
        "INSERT INTO \"Person\" (\"Name\",\"Age\",\"Active\") VALUES ('Ann',NULL,1)"
    );
    assert_eq!(
        d.insert_row_statement(&model, &mut row, &["Name".to_string()], None)
            .unwrap(),
        "INSERT INTO \"Person\" (\"Name\") VALUES ('Ann')"
    );
    assert_eq!(
        d.update_row_statement(&model, &row, &["Age".to_string()]).unwrap(),
        "UPDATE \"Person\" SET \"Age\" = NULL WHERE \"Id\" = 1"
    );
    assert_eq!(
        d.delete_row_statement(&model, &row).unwrap(),
        "DELETE FROM \"Person\" WHERE \"Id\" = 1"
    );
}

#[test]
fn insert_without_columns_uses_defaults() {
    let model = ModelDefinition::builder("Counter")
        .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
        .build()
        .unwrap();
    let mut row = Record::new();
    assert_eq!(
        dialect(DialectKind::Sqlite)
            .insert_row_statement(&model, &mut row, &[], None)
            .unwrap(),
        "INSERT INTO \"Counter\" DEFAULT VALUES"
    );
    assert_eq!(
        dialect(DialectKind::MySql)
            .insert_row_statement(&model, &mut row, &[], None)
            .unwrap(),
        "INSERT INTO `Counter` () VALUES ()"
    );
}

#[test]
fn exists_statements() {
    let model = person();
    assert_eq!(
        dialect(DialectKind::SqlServer).exists_statement(&model, "[Age] > 1"),
        "SELECT CASE WHEN EXISTS(SELECT 1 FROM [Person] WHERE [Age] > 1) THEN 1 ELSE 0 END"
    );
    assert_eq!(
        dialect(DialectKind::Firebird).exists_statement(&model, ""),
        "SELECT 1 FROM RDB$DATABASE WHERE EXISTS(SELECT 1 FROM Person)"
    );
}

#[test]
fn procedures() {
    let proc = ModelDefinition::builder("GetPeople")
        .field(FieldDefinition::new("MinAge", FieldType::Int32))
        .build()
        .unwrap();
    let args = Record::new().with("MinAge", 5);

    assert_eq!(
        dialect(DialectKind::Postgres)
            .execute_procedure_statement(&proc, &args)
            .unwrap(),
        "CALL \"GetPeople\"(5)"
    );
    assert_eq!(
        dialect(DialectKind::SqlServer)
            .execute_procedure_statement(&proc, &args)
            .unwrap(),
        "EXEC [GetPeople] 5"
    );
    assert_eq!(
        dialect(DialectKind::Firebird)
            .execute_procedure_statement(&proc, &args)
            .unwrap(),
        "EXECUTE PROCEDURE GetPeople(5)"
    );
    assert_eq!(
        dialect(DialectKind::Postgres)
            .select_from_procedure_statement(&proc, &args, &person(), "\"Age\" > 1")
            .unwrap(),
        "SELECT \"Id\", \"Name\", \"Age\", \"Active\" FROM \"GetPeople\"(5) WHERE \"Age\" > 1"
    );
    assert!(
        dialect(DialectKind::Sqlite)
            .execute_procedure_statement(&proc, &args)
            .unwrap_err()
            .is_not_supported()
    );
}

#[test]
fn column_alterations() {
    let model = person();
    let age = model.field("Age").unwrap();
    assert_eq!(
        dialect(DialectKind::MySql)
            .alter_column_statement(&model, age)
            .unwrap(),
        "ALTER TABLE `Person` MODIFY COLUMN `Age` INT NULL;"
    );
    assert_eq!(
        dialect(DialectKind::SqlServer)
            .alter_column_statement(&model, age)
            .unwrap(),
        "ALTER TABLE [Person] ALTER COLUMN [Age] INT NULL;"
    );
    assert!(
        dialect(DialectKind::Sqlite)
            .alter_column_statement(&model, age)
            .unwrap_err()
            .is_not_supported()
    );
    assert_eq!(
        dialect(DialectKind::Sqlite)
            .add_column_statement(&model, age)
            .unwrap(),
        "ALTER TABLE \"Person\" ADD COLUMN \"Age\" INTEGER NULL;"
    );
    assert_eq!(
        dialect(DialectKind::SqlServer)
            .change_column_name_statement(&model, age, "Years")
            .unwrap(),
        "EXEC sp_rename 'Person.Years', 'Age', 'COLUMN';"
    );
}

#[test]
fn naming_strategy_swap_affects_ddl_and_dml_alike() {
    let model = person();
    let base = dialect(DialectKind::Sqlite);
    let upper = base.with_config(
        base.config()
            .clone()
            .with_naming_strategy(polyorm::naming::UpperCaseNamingStrategy),
    );
    let ddl = upper.create_table_statement(&model).unwrap();
    assert!(ddl.starts_with("CREATE TABLE \"PERSON\""));
    assert!(ddl.contains("\"NAME\" VARCHAR(255) NULL"));
    assert_eq!(
        upper.delete_row_statement(&model, &ann()).unwrap(),
        "DELETE FROM \"PERSON\" WHERE \"ID\" = 1"
    );
    // The original instance is unchanged.
    assert_eq!(base.quoted_table_name(&model), "\"Person\"");
}
