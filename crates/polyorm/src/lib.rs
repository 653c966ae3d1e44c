//! # polyorm
//!
//! Model-definition-first SQL generation for Firebird, MySQL, PostgreSQL,
//! SQL Server and SQLite.
//!
//! ## Features
//!
//! - **Validated models**: `ModelDefinition` built in code or loaded from a schema file
//! - **Dialect providers**: quoting, literals, type names, DDL and DML per database
//! - **Expression compiler**: predicates and projections compiled into SQL clauses
//! - **No connections**: statements that need a round trip go through a `Command`
//!
//! ## Query descriptor
//!
//! ```ignore
//! use polyorm::{DialectKind, SqlExpression, col, fields};
//!
//! let dialect = DialectKind::Sqlite.create(None);
//! let mut q = SqlExpression::new(dialect, person.into());
//! q.filter(col("Age").is_null())?
//!     .order_by(fields(["Name"]))?
//!     .limit(10, 100);
//!
//! // SELECT "Id", "Name", "Age"
//! // FROM "Person"
//! // WHERE "Age" IS NULL
//! // ORDER BY "Name" ASC
//! // LIMIT 10,100
//! let sql = q.to_select_statement();
//! ```

#[macro_use]
mod trace;

pub mod command;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod model;
pub mod naming;
pub mod schema_file;
pub mod settings;
pub mod value;
pub mod visitor;

pub use command::{Command, Params, create_table, drop_table};
pub use dialect::{
    Dialect, DialectConfig, DialectKind, DuplicateSequencePolicy, GuidFormat, QuoteMode,
    create_dialect,
};
pub use error::{OrmError, OrmResult};
pub use expr::{Expr, IntoExpr, call, col, eval, fields, list, lit, sql};
pub use model::{
    CompositeIndex, Entity, EnumType, FieldDefinition, FieldType, ForeignKey, ModelDefinition,
    Record, ReferentialAction, RowValues, model_definition,
};
pub use naming::NamingStrategy;
pub use schema_file::SchemaFile;
pub use settings::DialectSettings;
pub use value::{EnumValue, Value};
pub use visitor::SqlExpression;
