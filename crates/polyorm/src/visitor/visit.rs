//! Expression-tree translation.
//!
//! Each node is visited into a [`Partial`]: either a plain value still eligible
//! for client-side evaluation, or SQL text. Values are turned into literals
//! (or bound parameters) only when they meet SQL.

use super::SqlExpression;
use crate::error::{OrmError, OrmResult};
use crate::expr::{BinaryOp, Expr, SqlFn, StringMethod, UnaryOp};
use crate::model::{FieldDefinition, FieldType};
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Intermediate result of visiting a node.
#[derive(Debug, Clone)]
pub(crate) enum Partial {
    /// Not yet rendered; may still be folded client-side.
    Value(Value),
    /// Rendered SQL.
    Sql(String),
    /// Rendered column reference with its declared type.
    Column { sql: String, field_type: FieldType },
}

impl Partial {
    fn field_type(&self) -> Option<&FieldType> {
        match self {
            Partial::Column { field_type, .. } => Some(field_type),
            _ => None,
        }
    }

    fn is_text(&self) -> bool {
        match self {
            Partial::Value(v) => matches!(v, Value::Text(_)),
            Partial::Column { field_type, .. } => matches!(field_type, FieldType::String),
            Partial::Sql(_) => false,
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\{(\d+)\}").expect("invalid built-in placeholder regex"))
}

/// Whether `sql` is one parenthesized group, ignoring parentheses inside
/// quoted literals and identifiers.
pub(crate) fn is_wrapped(sql: &str) -> bool {
    if !(sql.starts_with('(') && sql.ends_with(')')) {
        return false;
    }
    let last = sql.len() - 1;
    let mut depth = 0usize;
    let mut closing: Option<char> = None;
    for (i, c) in sql.char_indices() {
        if let Some(q) = closing {
            if c == q {
                closing = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => closing = Some(c),
            '[' => closing = Some(']'),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

pub(crate) fn strip_outer_parens(sql: String) -> String {
    if is_wrapped(&sql) {
        sql[1..sql.len() - 1].to_string()
    } else {
        sql
    }
}

fn wrap(sql: String) -> String {
    if is_wrapped(&sql) {
        sql
    } else {
        format!("({sql})")
    }
}

/// Convert a value to the representation a typed column stores.
fn coerce(value: &Value, hint: Option<&FieldType>) -> Value {
    match (hint, value) {
        (Some(FieldType::Enum(e)), Value::Int(i)) if !e.store_as_int => e
            .variant(*i)
            .map(|v| Value::Text(v.to_string()))
            .unwrap_or_else(|| value.clone()),
        (Some(FieldType::Enum(e)), Value::Text(s)) if e.store_as_int => {
            e.ordinal(s).map(Value::Int).unwrap_or_else(|| value.clone())
        }
        (Some(FieldType::Enum(e)), Value::Enum(v)) if e.store_as_int => Value::Int(v.ordinal),
        (Some(t), Value::Enum(v)) if t.is_integer() => Value::Int(v.ordinal),
        (_, Value::Enum(v)) => Value::Text(v.variant.clone()),
        (Some(FieldType::Bool), Value::Int(i)) => Value::Bool(*i != 0),
        _ => value.clone(),
    }
}

fn not_translatable(what: impl std::fmt::Display) -> OrmError {
    OrmError::not_supported(format!("{what} cannot be translated to SQL"))
}

impl SqlExpression {
    /// Compile a predicate for WHERE / HAVING.
    pub(crate) fn compile_predicate(&mut self, expr: &Expr) -> OrmResult<String> {
        let partial = self.visit(expr)?;
        let sql = self.condition_sql(partial)?;
        Ok(strip_outer_parens(sql))
    }

    /// Compile a projection, grouping or ordering term.
    pub(crate) fn compile_projection(&mut self, expr: &Expr) -> OrmResult<String> {
        let partial = self.visit(expr)?;
        let sql = self.operand_sql(partial, None)?;
        Ok(strip_outer_parens(sql))
    }

    /// Substitute `{n}` placeholders with literals of `args[n]`.
    pub(crate) fn format_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<String> {
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(sql) {
            let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = index
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .ok_or_else(|| {
                    OrmError::validation(format!(
                        "placeholder {} has no argument ({} given)",
                        whole.as_str(),
                        args.len()
                    ))
                })?;
            out.push_str(&sql[last..whole.start()]);
            out.push_str(&self.literal(value, None)?);
            last = whole.end();
        }
        out.push_str(&sql[last..]);
        Ok(out)
    }

    pub(crate) fn visit(&mut self, expr: &Expr) -> OrmResult<Partial> {
        match expr {
            Expr::Column(name) => {
                let field = self.field(name)?.clone();
                Ok(Partial::Column {
                    sql: self.column_sql(&field),
                    field_type: field.field_type,
                })
            }
            Expr::Value(v) => Ok(Partial::Value(v.clone())),
            Expr::Deferred(d) => Ok(Partial::Value(d.evaluate()?)),
            Expr::Binary { op, left, right } => self.visit_binary(*op, left, right),
            Expr::Unary { op, operand } => self.visit_unary(*op, operand),
            Expr::Convert {
                operand,
                conversion,
            } => {
                let partial = self.visit(operand)?;
                match (conversion, partial) {
                    (None, partial) => Ok(partial),
                    (Some(f), Partial::Value(v)) => {
                        Ok(Partial::Value(f.call(std::slice::from_ref(&v))?))
                    }
                    (Some(f), _) => Err(not_translatable(format!(
                        "conversion `{}` of a column",
                        f.name
                    ))),
                }
            }
            Expr::Method {
                method,
                target,
                args,
            } => self.visit_method(*method, target, args),
            Expr::Call { func, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    match self.visit(arg)? {
                        Partial::Value(v) => values.push(v),
                        _ => return Err(not_translatable(format!("method `{}`", func.name))),
                    }
                }
                Ok(Partial::Value(func.call(&values)?))
            }
            Expr::Sql(f) => self.visit_sql_fn(f),
            Expr::List(items) => {
                let mut partials = Vec::with_capacity(items.len());
                for item in items {
                    partials.push(self.visit(item)?);
                }
                if partials.iter().all(|p| matches!(p, Partial::Value(_))) {
                    let values = partials
                        .into_iter()
                        .filter_map(|p| match p {
                            Partial::Value(v) => Some(v),
                            _ => None,
                        })
                        .collect();
                    return Ok(Partial::Value(Value::List(values)));
                }
                let mut rendered = Vec::with_capacity(partials.len());
                for p in partials {
                    rendered.push(self.operand_sql(p, None)?);
                }
                Ok(Partial::Sql(rendered.join(",")))
            }
        }
    }

    fn field(&self, name: &str) -> OrmResult<&FieldDefinition> {
        self.model.field(name).ok_or_else(|| {
            OrmError::validation(format!("{} has no field `{name}`", self.model.name))
        })
    }

    pub(crate) fn column_sql(&self, field: &FieldDefinition) -> String {
        let column = self.dialect.quoted_column_name(field.field_name());
        if self.prefix_field_with_table_name {
            format!("{}.{column}", self.dialect.quoted_table_name(&self.model))
        } else {
            column
        }
    }

    /// Inline literal, or a bound parameter in parameterized mode.
    pub(crate) fn literal(&mut self, value: &Value, hint: Option<&FieldType>) -> OrmResult<String> {
        if !self.parameterized || value.is_null() {
            return self.dialect.quoted_value(value, hint);
        }
        if let Value::List(items) = value {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(self.literal(item, hint)?);
            }
            return Ok(rendered.join(","));
        }
        let name = self.dialect.param_placeholder(self.param_counter);
        self.param_counter += 1;
        self.params.push(name.clone(), coerce(value, hint));
        Ok(name)
    }

    /// SQL for an operand; values become literals typed by `hint`.
    fn operand_sql(&mut self, partial: Partial, hint: Option<&FieldType>) -> OrmResult<String> {
        match partial {
            Partial::Sql(sql) | Partial::Column { sql, .. } => Ok(sql),
            Partial::Value(v) => self.literal(&v, hint),
        }
    }

    /// SQL usable as a boolean condition. A bare boolean column renders
    /// exactly as its comparison with `true`.
    fn condition_sql(&mut self, partial: Partial) -> OrmResult<String> {
        match partial {
            Partial::Value(Value::Bool(b)) => Ok(if b { "1=1" } else { "1=0" }.to_string()),
            Partial::Value(Value::Null) => Ok("1=0".to_string()),
            Partial::Column {
                sql,
                field_type: FieldType::Bool,
            } => {
                let truth = self.literal(&Value::Bool(true), Some(&FieldType::Bool))?;
                Ok(format!("{sql} = {truth}"))
            }
            other => self.operand_sql(other, None),
        }
    }

    /// Render both operands, each typed by the other side's column.
    fn operand_pair(&mut self, left: Partial, right: Partial) -> OrmResult<(String, String)> {
        let left_hint = right.field_type().cloned();
        let right_hint = left.field_type().cloned();
        let l = self.operand_sql(left, left_hint.as_ref())?;
        let r = self.operand_sql(right, right_hint.as_ref())?;
        Ok((l, r))
    }

    fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> OrmResult<Partial> {
        let l = self.visit(left)?;
        let r = self.visit(right)?;

        if let (Partial::Value(a), Partial::Value(b)) = (&l, &r) {
            return Ok(Partial::Value(a.binary(op, b)?));
        }

        let sql = match op {
            BinaryOp::And | BinaryOp::Or => {
                let ls = self.condition_sql(l)?;
                let rs = self.condition_sql(r)?;
                format!("({ls} {} {rs})", op.sql_operator())
            }
            BinaryOp::Eq | BinaryOp::Ne
                if matches!(l, Partial::Value(Value::Null))
                    || matches!(r, Partial::Value(Value::Null)) =>
            {
                let operand = if matches!(l, Partial::Value(Value::Null)) {
                    r
                } else {
                    l
                };
                let sql = self.operand_sql(operand, None)?;
                let test = if op == BinaryOp::Eq {
                    "IS NULL"
                } else {
                    "IS NOT NULL"
                };
                format!("({sql} {test})")
            }
            BinaryOp::Add if l.is_text() || r.is_text() => {
                let (ls, rs) = self.operand_pair(l, r)?;
                self.dialect.concat(&ls, &rs)
            }
            BinaryOp::Mod => {
                let (ls, rs) = self.operand_pair(l, r)?;
                self.dialect.modulo(&ls, &rs)
            }
            BinaryOp::Coalesce => {
                let (ls, rs) = self.operand_pair(l, r)?;
                self.dialect.coalesce(&ls, &rs)
            }
            op if op.is_bitwise() => {
                let (ls, rs) = self.operand_pair(l, r)?;
                self.dialect.bitwise(op, &ls, &rs)
            }
            op => {
                let (ls, rs) = self.operand_pair(l, r)?;
                format!("({ls} {} {rs})", op.sql_operator())
            }
        };
        Ok(Partial::Sql(sql))
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Expr) -> OrmResult<Partial> {
        let partial = self.visit(operand)?;
        if let Partial::Value(v) = &partial {
            return Ok(Partial::Value(v.unary(op)?));
        }
        let sql = match op {
            UnaryOp::Not => format!("NOT {}", wrap(self.condition_sql(partial)?)),
            UnaryOp::Neg => match partial {
                Partial::Column { sql, .. } => format!("-{sql}"),
                other => format!("-{}", wrap(self.operand_sql(other, None)?)),
            },
        };
        Ok(Partial::Sql(sql))
    }

    fn visit_method(
        &mut self,
        method: StringMethod,
        target: &Expr,
        args: &[Expr],
    ) -> OrmResult<Partial> {
        let target = self.visit(target)?;
        let mut values = Vec::with_capacity(args.len());
        let mut sql_args = Vec::new();
        for arg in args {
            match self.visit(arg)? {
                Partial::Value(v) => values.push(v),
                other => sql_args.push(other),
            }
        }

        match target {
            Partial::Value(collection @ Value::List(_)) if method == StringMethod::Contains => {
                match (values.pop(), sql_args.pop()) {
                    (Some(item), None) => {
                        let found = collection
                            .flatten()
                            .iter()
                            .any(|v| v.binary(BinaryOp::Eq, &item).ok() == Some(Value::Bool(true)));
                        Ok(Partial::Value(Value::Bool(found)))
                    }
                    (None, Some(item)) => {
                        let hint = item.field_type().cloned();
                        let item_sql = self.operand_sql(item, None)?;
                        Ok(Partial::Sql(self.in_list_sql(&item_sql, &collection, hint.as_ref())?))
                    }
                    _ => Err(OrmError::validation("contains takes exactly one argument")),
                }
            }
            Partial::Value(v) => {
                if !sql_args.is_empty() {
                    return Err(not_translatable(format!(
                        "{method:?} on a constant with a column argument"
                    )));
                }
                Ok(Partial::Value(evaluate_string_method(method, &v, &values)?))
            }
            column => {
                if !sql_args.is_empty() {
                    return Err(not_translatable(format!(
                        "{method:?} with a column argument"
                    )));
                }
                let sql = self.operand_sql(column, None)?;
                self.string_method_sql(method, &sql, &values).map(Partial::Sql)
            }
        }
    }

    fn string_method_sql(
        &mut self,
        method: StringMethod,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<String> {
        let pattern = |prefix: &str, suffix: &str| -> OrmResult<Value> {
            let text = args
                .first()
                .map(Value::to_text)
                .ok_or_else(|| OrmError::validation(format!("{method:?} takes one argument")))?;
            Ok(Value::Text(format!("{prefix}{}{suffix}", text.to_uppercase())))
        };

        Ok(match method {
            StringMethod::Trim => self.dialect.trim(sql),
            StringMethod::TrimStart => self.dialect.ltrim(sql),
            StringMethod::TrimEnd => self.dialect.rtrim(sql),
            StringMethod::ToUpper => self.dialect.upper(sql),
            StringMethod::ToLower => self.dialect.lower(sql),
            StringMethod::StartsWith | StringMethod::EndsWith | StringMethod::Contains => {
                let value = match method {
                    StringMethod::StartsWith => pattern("", "%")?,
                    StringMethod::EndsWith => pattern("%", "")?,
                    _ => pattern("%", "%")?,
                };
                format!("{} LIKE {}", self.dialect.upper(sql), self.literal(&value, None)?)
            }
            StringMethod::Substring => {
                let start = args.first().and_then(Value::as_i64).ok_or_else(|| {
                    OrmError::validation("substring start must be an integer")
                })?;
                let len = match args.get(1) {
                    Some(v) => Some(v.as_i64().ok_or_else(|| {
                        OrmError::validation("substring length must be an integer")
                    })?),
                    None => None,
                };
                self.dialect.substring(sql, start + 1, len)
            }
        })
    }

    fn in_list_sql(
        &mut self,
        target: &str,
        values: &Value,
        hint: Option<&FieldType>,
    ) -> OrmResult<String> {
        let items = values.flatten();
        if items.is_empty() {
            return Ok(format!("{target} IN (NULL)"));
        }
        let mut rendered = Vec::with_capacity(items.len());
        for item in &items {
            let item = coerce(item, hint);
            rendered.push(self.literal(&item, hint)?);
        }
        Ok(format!("{target} IN ({})", rendered.join(",")))
    }

    fn visit_sql_fn(&mut self, f: &SqlFn) -> OrmResult<Partial> {
        let sql = match f {
            SqlFn::In { target, values } => {
                let target = self.visit(target)?;
                let hint = target.field_type().cloned();
                let target_sql = self.operand_sql(target, None)?;
                match self.visit(values)? {
                    Partial::Value(list) => self.in_list_sql(&target_sql, &list, hint.as_ref())?,
                    other => {
                        let list = self.operand_sql(other, None)?;
                        format!("{target_sql} IN ({list})")
                    }
                }
            }
            SqlFn::Desc(expr) => {
                let partial = self.visit(expr)?;
                format!("{} DESC", self.operand_sql(partial, None)?)
            }
            SqlFn::As { expr, alias } => {
                let partial = self.visit(expr)?;
                format!(
                    "{} AS {}",
                    self.operand_sql(partial, None)?,
                    self.dialect.quote_name(alias)
                )
            }
            SqlFn::Aggregate { func, expr } => {
                let partial = self.visit(expr)?;
                format!("{}({})", func.as_sql(), self.operand_sql(partial, None)?)
            }
            SqlFn::CountAll => "COUNT(*)".to_string(),
        };
        Ok(Partial::Sql(sql))
    }
}

/// Client-side string method over a plain value.
fn evaluate_string_method(method: StringMethod, target: &Value, args: &[Value]) -> OrmResult<Value> {
    if target.is_null() {
        return Err(OrmError::evaluation(format!("{method:?} on a null value")));
    }
    let text = target.to_text();
    let arg_text = || {
        args.first()
            .map(Value::to_text)
            .ok_or_else(|| OrmError::evaluation(format!("{method:?} takes one argument")))
    };

    Ok(match method {
        StringMethod::Trim => Value::Text(text.trim().to_string()),
        StringMethod::TrimStart => Value::Text(text.trim_start().to_string()),
        StringMethod::TrimEnd => Value::Text(text.trim_end().to_string()),
        StringMethod::ToUpper => Value::Text(text.to_uppercase()),
        StringMethod::ToLower => Value::Text(text.to_lowercase()),
        StringMethod::StartsWith => Value::Bool(text.starts_with(&arg_text()?)),
        StringMethod::EndsWith => Value::Bool(text.ends_with(&arg_text()?)),
        StringMethod::Contains => Value::Bool(text.contains(&arg_text()?)),
        StringMethod::Substring => {
            let start = args
                .first()
                .and_then(Value::as_i64)
                .and_then(|s| usize::try_from(s).ok())
                .ok_or_else(|| OrmError::evaluation("substring start must be a non-negative integer"))?;
            let chars = text.chars().skip(start);
            let sub: String = match args.get(1).and_then(Value::as_i64) {
                Some(len) => chars.take(usize::try_from(len).unwrap_or(0)).collect(),
                None => chars.collect(),
            };
            Value::Text(sub)
        }
    })
}
