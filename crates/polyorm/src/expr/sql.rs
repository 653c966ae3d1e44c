//! SQL-only helpers: `IN`, `DESC`, `AS` and aggregates.

use super::{Aggregate, Expr, IntoExpr, SqlFn};

/// `target IN (values)`; `values` should evaluate to a collection.
pub fn in_list(target: impl IntoExpr, values: impl IntoExpr) -> Expr {
    Expr::Sql(SqlFn::In {
        target: Box::new(target.into_expr()),
        values: Box::new(values.into_expr()),
    })
}

pub fn desc(expr: impl IntoExpr) -> Expr {
    Expr::Sql(SqlFn::Desc(Box::new(expr.into_expr())))
}

pub fn alias(expr: impl IntoExpr, alias: impl Into<String>) -> Expr {
    Expr::Sql(SqlFn::As {
        expr: Box::new(expr.into_expr()),
        alias: alias.into(),
    })
}

fn aggregate(func: Aggregate, expr: impl IntoExpr) -> Expr {
    Expr::Sql(SqlFn::Aggregate {
        func,
        expr: Box::new(expr.into_expr()),
    })
}

pub fn sum(expr: impl IntoExpr) -> Expr {
    aggregate(Aggregate::Sum, expr)
}

pub fn count(expr: impl IntoExpr) -> Expr {
    aggregate(Aggregate::Count, expr)
}

pub fn min(expr: impl IntoExpr) -> Expr {
    aggregate(Aggregate::Min, expr)
}

pub fn max(expr: impl IntoExpr) -> Expr {
    aggregate(Aggregate::Max, expr)
}

pub fn avg(expr: impl IntoExpr) -> Expr {
    aggregate(Aggregate::Avg, expr)
}

/// `COUNT(*)`
pub fn count_all() -> Expr {
    Expr::Sql(SqlFn::CountAll)
}
