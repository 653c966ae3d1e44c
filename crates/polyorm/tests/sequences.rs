use polyorm::{
    Command, DialectKind, DuplicateSequencePolicy, FieldDefinition, FieldType, ModelDefinition,
    OrmError, OrmResult, Params, Record, RowValues, Value, create_table,
};

/// Records every statement and answers scalars with a fixed value.
#[derive(Default)]
struct FakeCommand {
    next: i64,
    executed: Vec<String>,
    queried: Vec<String>,
    fail_with: Option<&'static str>,
}

impl FakeCommand {
    fn returning(next: i64) -> Self {
        Self {
            next,
            ..Self::default()
        }
    }

    fn failing_generators(message: &'static str) -> Self {
        Self {
            fail_with: Some(message),
            ..Self::default()
        }
    }
}

impl Command for FakeCommand {
    fn execute(&mut self, sql: &str, _params: &Params) -> OrmResult<u64> {
        self.executed.push(sql.to_string());
        match self.fail_with {
            Some(message) if sql.starts_with("CREATE GENERATOR") => {
                Err(OrmError::command(message))
            }
            _ => Ok(0),
        }
    }

    fn scalar(&mut self, sql: &str, _params: &Params) -> OrmResult<Value> {
        self.queried.push(sql.to_string());
        Ok(Value::Int(self.next))
    }
}

fn person() -> ModelDefinition {
    ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
        .field(FieldDefinition::new("Name", FieldType::String))
        .field(FieldDefinition::new("Age", FieldType::Int32).nullable())
        .field(FieldDefinition::new("Active", FieldType::Bool))
        .build()
        .unwrap()
}

fn sequenced() -> ModelDefinition {
    ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int64).sequence("person_seq"))
        .field(FieldDefinition::new("Name", FieldType::String))
        .build()
        .unwrap()
}

fn ann() -> Record {
    Record::new()
        .with("Name", "Ann")
        .with("Age", Value::Null)
        .with("Active", true)
}

#[test]
fn firebird_insert_fetches_generator_value() {
    let dialect = DialectKind::Firebird.create(None);
    let mut cmd = FakeCommand::returning(42);
    let mut row = ann();

    let sql = dialect
        .insert_row_statement(&person(), &mut row, &[], Some(&mut cmd))
        .unwrap();

    assert_eq!(
        sql,
        "INSERT INTO Person (Id,Name,Age,\"Active\") VALUES (42,'Ann',NULL,1)"
    );
    assert_eq!(cmd.queried, ["SELECT GEN_ID(Person_Id_GEN, 1) FROM RDB$DATABASE"]);
    assert_eq!(row.get_value("Id"), Value::Int(42));
    assert_eq!(dialect.last_insert_id(&mut cmd).unwrap(), 42);
}

#[test]
fn firebird_insert_without_command_leaves_key_out() {
    let dialect = DialectKind::Firebird.create(None);
    let mut row = ann();
    let sql = dialect
        .insert_row_statement(&person(), &mut row, &[], None)
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO Person (Name,Age,\"Active\") VALUES ('Ann',NULL,1)"
    );
    assert_eq!(row.get_value("Id"), Value::Null);
}

#[test]
fn postgres_explicit_sequence() {
    let dialect = DialectKind::Postgres.create(None);
    let model = sequenced();
    assert_eq!(
        dialect.create_sequence_statements(&model),
        ["CREATE SEQUENCE \"person_seq\";"]
    );

    let mut cmd = FakeCommand::returning(7);
    let mut row = Record::new().with("Name", "Ann");
    let sql = dialect
        .insert_row_statement(&model, &mut row, &[], Some(&mut cmd))
        .unwrap();
    assert_eq!(cmd.queried, ["SELECT nextval('\"person_seq\"')"]);
    assert_eq!(sql, "INSERT INTO \"Person\" (\"Id\",\"Name\") VALUES (7,'Ann')");
}

#[test]
fn sqlserver_sequence_statements() {
    let dialect = DialectKind::SqlServer.create(None);
    let model = sequenced();
    assert_eq!(
        dialect.create_sequence_statements(&model),
        ["CREATE SEQUENCE [person_seq] AS BIGINT START WITH 1 INCREMENT BY 1;"]
    );
    assert_eq!(
        dialect.next_sequence_value_sql("person_seq").unwrap(),
        "SELECT NEXT VALUE FOR [person_seq]"
    );
}

#[test]
fn mysql_and_sqlite_ignore_explicit_sequences() {
    for kind in [DialectKind::MySql, DialectKind::Sqlite] {
        let dialect = kind.create(None);
        let model = sequenced();
        assert!(dialect.create_sequence_statements(&model).is_empty());

        let mut cmd = FakeCommand::returning(7);
        let mut row = Record::new().with("Name", "Ann");
        let sql = dialect
            .insert_row_statement(&model, &mut row, &[], Some(&mut cmd))
            .unwrap();
        assert!(cmd.queried.is_empty(), "{kind}");
        assert!(!sql.contains("Id"), "{sql}");
        assert!(dialect.next_sequence_value_sql("person_seq").is_err());
    }
}

#[test]
fn explicit_sequence_without_sequences_becomes_identity() {
    let model = sequenced();
    let id = model.field("Id").unwrap();
    assert_eq!(
        DialectKind::MySql.create(None).column_definition(id).unwrap(),
        "`Id` BIGINT PRIMARY KEY AUTO_INCREMENT"
    );
    assert_eq!(
        DialectKind::Sqlite.create(None).column_definition(id).unwrap(),
        "\"Id\" INTEGER PRIMARY KEY AUTOINCREMENT"
    );
}

#[test]
fn sequence_backed_key_defaults_to_next_value() {
    let model = ModelDefinition::builder("Person")
        .field(
            FieldDefinition::new("Id", FieldType::Int32)
                .auto_increment()
                .sequence("person_seq"),
        )
        .field(FieldDefinition::new("Name", FieldType::String))
        .build()
        .unwrap();
    let id = model.field("Id").unwrap();

    let pg = DialectKind::Postgres.create(None);
    assert_eq!(
        pg.column_definition(id).unwrap(),
        "\"Id\" INTEGER PRIMARY KEY DEFAULT nextval('\"person_seq\"')"
    );
    let mut row = Record::new().with("Name", "Ann");
    assert_eq!(
        pg.insert_row_statement(&model, &mut row, &[], None).unwrap(),
        "INSERT INTO \"Person\" (\"Name\") VALUES ('Ann')"
    );

    let mssql = DialectKind::SqlServer.create(None);
    assert_eq!(
        mssql.column_definition(id).unwrap(),
        "[Id] INT PRIMARY KEY DEFAULT (NEXT VALUE FOR [person_seq])"
    );
}

#[test]
fn sequence_default_yields_to_explicit_default() {
    let field = FieldDefinition::new("Code", FieldType::Int64)
        .sequence("code_seq")
        .default_value("0");
    assert_eq!(
        DialectKind::Postgres.create(None).column_definition(&field).unwrap(),
        "\"Code\" BIGINT NOT NULL DEFAULT 0"
    );
}

#[test]
fn sqlite_last_insert_id_queries_connection() {
    let dialect = DialectKind::Sqlite.create(None);
    let mut cmd = FakeCommand::returning(5);
    assert_eq!(dialect.last_insert_id(&mut cmd).unwrap(), 5);
    assert_eq!(cmd.queried, ["SELECT last_insert_rowid()"]);
}

#[test]
fn create_table_tolerates_existing_generator() {
    let dialect = DialectKind::Firebird.create(None);
    let mut cmd = FakeCommand::failing_generators("Generator PERSON_ID_GEN already exists");

    create_table(&mut cmd, dialect.as_ref(), &person()).unwrap();

    assert_eq!(cmd.executed.len(), 2);
    assert_eq!(cmd.executed[0], "CREATE GENERATOR Person_Id_GEN;");
    assert!(cmd.executed[1].starts_with("CREATE TABLE Person"));
}

#[test]
fn create_table_fails_on_existing_generator_when_strict() {
    let base = DialectKind::Firebird.create(None);
    let strict = base.with_config(
        base.config()
            .clone()
            .with_duplicate_sequence_policy(DuplicateSequencePolicy::Fail),
    );
    let mut cmd = FakeCommand::failing_generators("Generator PERSON_ID_GEN already exists");

    let err = create_table(&mut cmd, strict.as_ref(), &person()).unwrap_err();
    assert!(matches!(err, OrmError::Command(_)));
    assert_eq!(cmd.executed.len(), 1);
}

#[test]
fn create_table_propagates_other_generator_errors() {
    let dialect = DialectKind::Firebird.create(None);
    let mut cmd = FakeCommand::failing_generators("connection reset");
    assert!(create_table(&mut cmd, dialect.as_ref(), &person()).is_err());
}

#[test]
fn create_table_runs_indexes_after_table() {
    let model = ModelDefinition::builder("Person")
        .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
        .field(FieldDefinition::new("Name", FieldType::String).indexed())
        .build()
        .unwrap();
    let dialect = DialectKind::Sqlite.create(None);
    let mut cmd = FakeCommand::default();
    create_table(&mut cmd, dialect.as_ref(), &model).unwrap();
    assert_eq!(cmd.executed.len(), 2);
    assert!(cmd.executed[0].starts_with("CREATE TABLE \"Person\""));
    assert_eq!(
        cmd.executed[1],
        "CREATE INDEX \"idx_person_name\" ON \"Person\" (\"Name\" ASC);"
    );
}
