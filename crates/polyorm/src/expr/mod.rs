//! Typed expression tree compiled by [`SqlExpression`](crate::visitor::SqlExpression).
//!
//! Predicates, projections and orderings are built from [`Expr`] nodes:
//!
//! ```ignore
//! use polyorm::expr::{col, eval};
//!
//! let adults = col("Age").ge(18).and(col("Name").starts_with("a"));
//! let recent = col("CreatedAt").gt(eval(|| Ok(chrono::Utc::now().into())));
//! ```
//!
//! Subtrees whose operands are all plain values ([`Expr::Value`],
//! [`Expr::Deferred`]) are evaluated client-side and emitted as a single
//! literal; anything touching a column is translated to SQL.

pub mod sql;

use crate::error::OrmResult;
use crate::value::{EnumValue, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use std::ops;
use std::sync::Arc;
use uuid::Uuid;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Coalesce,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// Infix SQL operator, for operators rendered infix in every dialect.
    pub fn sql_operator(&self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Coalesce => "COALESCE",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// String methods with a SQL translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMethod {
    Trim,
    TrimStart,
    TrimEnd,
    ToUpper,
    ToLower,
    StartsWith,
    EndsWith,
    /// Substring match on a column, membership test on a collection.
    Contains,
    /// Zero-based start, optional length.
    Substring,
}

/// Zero-argument closure evaluated when the expression is compiled.
#[derive(Clone)]
pub struct Deferred(Arc<dyn Fn() -> OrmResult<Value> + Send + Sync>);

impl Deferred {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> OrmResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self) -> OrmResult<Value> {
        (self.0)()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// Named function with no SQL translation; only evaluable over plain values.
#[derive(Clone)]
pub struct ClientFn {
    pub name: String,
    f: Arc<dyn Fn(&[Value]) -> OrmResult<Value> + Send + Sync>,
}

impl ClientFn {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> OrmResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn call(&self, args: &[Value]) -> OrmResult<Value> {
        (self.f)(args)
    }
}

impl fmt::Debug for ClientFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientFn({})", self.name)
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Count,
    Min,
    Max,
    Avg,
}

impl Aggregate {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Count => "COUNT",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Avg => "AVG",
        }
    }
}

/// SQL-only helpers with no client-side meaning. See [`sql`].
#[derive(Debug, Clone)]
pub enum SqlFn {
    /// `target IN (values)`
    In { target: Box<Expr>, values: Box<Expr> },
    /// `expr DESC` inside an ordering.
    Desc(Box<Expr>),
    /// `expr AS alias`
    As { expr: Box<Expr>, alias: String },
    Aggregate { func: Aggregate, expr: Box<Expr> },
    /// `COUNT(*)`
    CountAll,
}

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Field reference by source name.
    Column(String),
    /// Plain value.
    Value(Value),
    /// Captured closure, evaluated at compile time.
    Deferred(Deferred),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Type conversion. Without a conversion function the operand passes
    /// through; with one it must evaluate client-side.
    Convert {
        operand: Box<Expr>,
        conversion: Option<ClientFn>,
    },
    Method {
        method: StringMethod,
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Arbitrary function, evaluated client-side.
    Call { func: ClientFn, args: Vec<Expr> },
    Sql(SqlFn),
    /// Projection of several expressions.
    List(Vec<Expr>),
}

/// Conversion into an [`Expr`]; plain values become [`Expr::Value`].
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

macro_rules! impl_into_expr_via_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoExpr for $t {
                fn into_expr(self) -> Expr {
                    Expr::Value(Value::from(self))
                }
            }
        )*
    };
}

impl_into_expr_via_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    Decimal,
    &str,
    String,
    &String,
    Uuid,
    NaiveDateTime,
    NaiveDate,
    NaiveTime,
    EnumValue,
);

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}

impl<T: Into<Value>> IntoExpr for Vec<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}

/// Reference a field.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A plain value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

/// A closure evaluated when the expression is compiled.
pub fn eval<F>(f: F) -> Expr
where
    F: Fn() -> OrmResult<Value> + Send + Sync + 'static,
{
    Expr::Deferred(Deferred::new(f))
}

/// Apply a client-side function to the given arguments.
pub fn call<F, I>(name: impl Into<String>, f: F, args: I) -> Expr
where
    F: Fn(&[Value]) -> OrmResult<Value> + Send + Sync + 'static,
    I: IntoIterator,
    I::Item: IntoExpr,
{
    Expr::Call {
        func: ClientFn::new(name, f),
        args: args.into_iter().map(IntoExpr::into_expr).collect(),
    }
}

/// Projection over several expressions.
pub fn list<I>(items: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    Expr::List(items.into_iter().map(IntoExpr::into_expr).collect())
}

/// Projection over several fields.
pub fn fields<I, S>(names: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Expr::List(names.into_iter().map(col).collect())
}

impl Expr {
    pub fn binary(op: BinaryOp, left: impl IntoExpr, right: impl IntoExpr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left.into_expr()),
            right: Box::new(right.into_expr()),
        }
    }

    fn method(self, method: StringMethod, args: Vec<Expr>) -> Self {
        Expr::Method {
            method,
            target: Box::new(self),
            args,
        }
    }

    pub fn eq(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Eq, self, rhs)
    }

    pub fn ne(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Ne, self, rhs)
    }

    pub fn gt(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Gt, self, rhs)
    }

    pub fn ge(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Ge, self, rhs)
    }

    pub fn lt(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs)
    }

    pub fn le(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Le, self, rhs)
    }

    pub fn and(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::And, self, rhs)
    }

    pub fn or(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Or, self, rhs)
    }

    /// `COALESCE(self, rhs)`
    pub fn coalesce(self, rhs: impl IntoExpr) -> Self {
        Self::binary(BinaryOp::Coalesce, self, rhs)
    }

    pub fn is_null(self) -> Self {
        self.eq(Value::Null)
    }

    pub fn is_not_null(self) -> Self {
        self.ne(Value::Null)
    }

    pub fn trim(self) -> Self {
        self.method(StringMethod::Trim, Vec::new())
    }

    pub fn trim_start(self) -> Self {
        self.method(StringMethod::TrimStart, Vec::new())
    }

    pub fn trim_end(self) -> Self {
        self.method(StringMethod::TrimEnd, Vec::new())
    }

    pub fn to_upper(self) -> Self {
        self.method(StringMethod::ToUpper, Vec::new())
    }

    pub fn to_lower(self) -> Self {
        self.method(StringMethod::ToLower, Vec::new())
    }

    /// Case-insensitive prefix match.
    pub fn starts_with(self, prefix: impl IntoExpr) -> Self {
        self.method(StringMethod::StartsWith, vec![prefix.into_expr()])
    }

    /// Case-insensitive suffix match.
    pub fn ends_with(self, suffix: impl IntoExpr) -> Self {
        self.method(StringMethod::EndsWith, vec![suffix.into_expr()])
    }

    /// Case-insensitive substring match on a column, or membership when
    /// `self` is a collection value.
    pub fn contains(self, needle: impl IntoExpr) -> Self {
        self.method(StringMethod::Contains, vec![needle.into_expr()])
    }

    /// Substring from a zero-based `start` to the end.
    pub fn substring(self, start: i64) -> Self {
        self.method(StringMethod::Substring, vec![lit(start)])
    }

    pub fn substring_len(self, start: i64, len: i64) -> Self {
        self.method(StringMethod::Substring, vec![lit(start), lit(len)])
    }

    /// Plain conversion, transparent in SQL.
    pub fn convert(self) -> Self {
        Expr::Convert {
            operand: Box::new(self),
            conversion: None,
        }
    }

    /// Conversion through a custom function, evaluated client-side.
    pub fn convert_with<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> OrmResult<Value> + Send + Sync + 'static,
    {
        Expr::Convert {
            operand: Box::new(self),
            conversion: Some(ClientFn::new(name, f)),
        }
    }

    /// `self IN (values)`
    pub fn in_list(self, values: impl IntoExpr) -> Self {
        sql::in_list(self, values)
    }

    pub fn desc(self) -> Self {
        sql::desc(self)
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        sql::alias(self, alias)
    }

    /// Whether this is a bare field reference.
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Expr::Column(name) => Some(name),
            _ => None,
        }
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self),
        }
    }
}

macro_rules! impl_binary_operator {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl<R: IntoExpr> ops::$trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    Expr::binary(BinaryOp::$op, self, rhs)
                }
            }
        )*
    };
}

impl_binary_operator!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Mod,
    BitAnd::bitand => BitAnd,
    BitOr::bitor => BitOr,
    BitXor::bitxor => BitXor,
    Shl::shl => Shl,
    Shr::shr => Shr,
);
