use polyorm::{DialectKind, FieldType, OrmError, SchemaFile};

const SHOP: &str = r#"
[dialect]
kind = "firebird"
naming = "upper_case"

[[models]]
name = "Customer"

[[models.fields]]
name = "Id"
type = "int32"
auto_increment = true

[[models.fields]]
name = "Email"
type = "string"
length = 120
nullable = false
unique = true

[[models]]
name = "Order"
alias = "Orders"

[[models.fields]]
name = "Id"
type = "int64"
sequence = "ORDERS_SEQ"

[[models.fields]]
name = "CustomerId"
type = "int32"
references = { table = "Customer", on_delete = "cascade" }

[[models.fields]]
name = "Status"
type = "enum"
enum = { name = "OrderStatus", variants = ["Open", "Paid", "Shipped"] }

[[models.fields]]
name = "PlacedAt"
type = "timestamp"

[[models.indexes]]
fields = ["CustomerId", "PlacedAt DESC"]
"#;

#[test]
fn loads_models_in_file_order() {
    let file = SchemaFile::from_toml_str(SHOP).unwrap();
    let models = file.definitions().unwrap();
    let names: Vec<_> = models.iter().map(|m| m.model_name()).collect();
    assert_eq!(names, ["Customer", "Orders"]);

    let order = &models[1];
    assert_eq!(order.primary_key().unwrap().name, "Id");
    assert_eq!(order.field("PlacedAt").unwrap().field_type, FieldType::DateTime);
    match &order.field("Status").unwrap().field_type {
        FieldType::Enum(e) => {
            assert_eq!(e.name, "OrderStatus");
            assert_eq!(e.variant(1), Some("Paid"));
            assert!(!e.store_as_int);
        }
        other => panic!("unexpected type {other}"),
    }
    assert_eq!(order.composite_indexes.len(), 1);
}

#[test]
fn dialect_section_configures_ddl() {
    let file = SchemaFile::from_toml_str(SHOP).unwrap();
    let settings = file.dialect.clone().unwrap();
    let dialect = settings.into_dialect(DialectKind::Sqlite);
    assert_eq!(dialect.kind(), DialectKind::Firebird);

    let models = file.definitions().unwrap();
    let customer = dialect.create_table_statement(&models[0]).unwrap();
    assert_eq!(
        customer,
        "CREATE TABLE CUSTOMER \n(\n  ID INTEGER NOT NULL PRIMARY KEY,\n  EMAIL VARCHAR(120) NOT NULL\n);"
    );
    assert_eq!(
        dialect.create_index_statements(&models[0]),
        ["CREATE UNIQUE INDEX uidx_customer_email ON CUSTOMER (EMAIL ASC);"]
    );

    let orders = dialect.create_table_statement(&models[1]).unwrap();
    assert!(
        orders.contains(
            "CONSTRAINT FK_ORDERS_CUSTOMER_CUSTOMERID FOREIGN KEY (CUSTOMERID) REFERENCES CUSTOMER (ID) ON DELETE CASCADE"
        ),
        "{orders}"
    );
    assert_eq!(
        dialect.create_sequence_statements(&models[1]),
        ["CREATE GENERATOR ORDERS_SEQ;"]
    );
}

#[test]
fn json_schema() {
    let file = SchemaFile::from_json_str(
        r#"{
            "models": [{
                "name": "Tag",
                "fields": [
                    {"name": "Id", "type": "guid", "primary_key": true},
                    {"name": "Label", "type": "string"}
                ]
            }]
        }"#,
    )
    .unwrap();
    assert!(file.dialect.is_none());
    let models = file.definitions().unwrap();
    let tag = &models[0];
    assert!(tag.field("Id").unwrap().is_primary_key);
    assert!(tag.field("Label").unwrap().is_nullable);
}

#[test]
fn composite_key_from_file() {
    let file = SchemaFile::from_toml_str(
        r#"
[[models]]
name = "Membership"
composite_key = ["UserId", "GroupId"]
fields = [
    { name = "UserId", type = "int32" },
    { name = "GroupId", type = "int32" },
]
"#,
    )
    .unwrap();
    let models = file.definitions().unwrap();
    let keys: Vec<_> = models[0]
        .primary_keys()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(keys, ["UserId", "GroupId"]);
}

#[test]
fn invalid_models_are_reported() {
    let unknown_type = SchemaFile::from_toml_str(
        "[[models]]\nname = \"X\"\nfields = [{ name = \"Id\", type = \"money\" }]",
    )
    .unwrap_err();
    assert!(matches!(unknown_type, OrmError::Config(_)));

    let unknown_key = SchemaFile::from_toml_str(
        "[[models]]\nname = \"X\"\nfields = [{ name = \"Id\", type = \"int32\", colour = \"red\" }]",
    )
    .unwrap_err();
    assert!(matches!(unknown_key, OrmError::Config(_)));

    let duplicate = SchemaFile::from_toml_str(
        "[[models]]\nname = \"X\"\nfields = [{ name = \"A\", type = \"int32\" }, { name = \"A\", type = \"int32\" }]",
    )
    .unwrap();
    assert!(duplicate.definitions().unwrap_err().is_definition());

    let bad_dialect = SchemaFile::from_toml_str("[dialect]\ndefault_string_length = 0");
    assert!(bad_dialect.is_err());
}

#[test]
fn load_picks_format_from_extension() {
    let dir = std::env::temp_dir().join(format!("polyorm-schema-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let toml_path = dir.join("shop.toml");
    std::fs::write(&toml_path, SHOP).unwrap();
    assert_eq!(SchemaFile::load(&toml_path).unwrap().models.len(), 2);

    let json_path = dir.join("tags.JSON");
    std::fs::write(
        &json_path,
        r#"{"models":[{"name":"Tag","fields":[{"name":"Id","type":"int32"}]}]}"#,
    )
    .unwrap();
    assert_eq!(SchemaFile::load(&json_path).unwrap().models.len(), 1);

    let missing = SchemaFile::load(dir.join("missing.toml")).unwrap_err();
    assert!(matches!(missing, OrmError::Config(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}
