//! Query descriptor and expression compiler.
//!
//! [`SqlExpression`] accumulates clause fragments for one model and assembles
//! them into statements. Every fluent method compiles its expression right
//! away, so translation errors surface at the call that introduced them and
//! leave the descriptor unchanged.
//!
//! ```ignore
//! use polyorm::expr::{col, fields};
//!
//! let mut q = SqlExpression::for_entity::<Person>(dialect)?;
//! q.filter(col("Age").ge(18))?
//!     .order_by(fields(["Name", "Age"]))?
//!     .limit(10, 100);
//! let sql = q.to_select_statement();
//! ```

mod statement;
mod visit;

use crate::command::Params;
use crate::dialect::{Dialect, LimitStyle};
use crate::error::{OrmError, OrmResult};
use crate::expr::{Expr, IntoExpr, SqlFn};
use crate::model::{Entity, ModelDefinition, model_definition};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Clause owning a group of bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Clause {
    Select,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Update,
    Insert,
}

/// Query descriptor for one model.
#[derive(Debug, Clone)]
pub struct SqlExpression {
    dialect: Arc<dyn Dialect>,
    model: Arc<ModelDefinition>,
    select_expression: String,
    custom_select: bool,
    distinct: bool,
    predicate: Option<Expr>,
    where_expression: String,
    group_by: String,
    having_expression: String,
    order_by_properties: Vec<String>,
    skip: Option<usize>,
    rows: Option<usize>,
    update_fields: Vec<String>,
    insert_fields: Vec<String>,
    params: Params,
    clause_params: HashMap<Clause, Vec<String>>,
    param_counter: usize,
    parameterized: bool,
    prefix_field_with_table_name: bool,
}

impl SqlExpression {
    pub fn new(dialect: Arc<dyn Dialect>, model: Arc<ModelDefinition>) -> Self {
        let parameterized = dialect.config().parameterized;
        let mut expr = Self {
            dialect,
            model,
            select_expression: String::new(),
            custom_select: false,
            distinct: false,
            predicate: None,
            where_expression: String::new(),
            group_by: String::new(),
            having_expression: String::new(),
            order_by_properties: Vec::new(),
            skip: None,
            rows: None,
            update_fields: Vec::new(),
            insert_fields: Vec::new(),
            params: Params::new(),
            clause_params: HashMap::new(),
            param_counter: 0,
            parameterized,
            prefix_field_with_table_name: false,
        };
        expr.select_expression = expr.default_select();
        expr
    }

    /// Descriptor for an entity type, using its cached definition.
    pub fn for_entity<T: Entity>(dialect: Arc<dyn Dialect>) -> OrmResult<Self> {
        Ok(Self::new(dialect, model_definition::<T>()?))
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }

    fn default_select(&self) -> String {
        let columns = self
            .model
            .fields()
            .map(|f| self.column_sql(f))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {columns} \nFROM {}",
            self.dialect.quoted_table_name(&self.model)
        )
    }

    /// Run `compile` as the new content of `clause`. On success the clause's
    /// previous parameters are dropped (or kept, when `replace` is false); on
    /// failure every parameter it registered is rolled back.
    fn compile_clause<T>(
        &mut self,
        clause: Clause,
        replace: bool,
        compile: impl FnOnce(&mut Self) -> OrmResult<T>,
    ) -> OrmResult<T> {
        let start = self.params.len();
        let counter = self.param_counter;
        match compile(self) {
            Ok(out) => {
                let added = self.params.names_from(start);
                if replace {
                    if let Some(previous) = self.clause_params.remove(&clause) {
                        self.params.remove_all(&previous);
                    }
                }
                self.clause_params.entry(clause).or_default().extend(added);
                Ok(out)
            }
            Err(err) => {
                self.params.truncate(start);
                self.param_counter = counter;
                Err(err)
            }
        }
    }

    fn clear_clause(&mut self, clause: Clause) {
        if let Some(previous) = self.clause_params.remove(&clause) {
            self.params.remove_all(&previous);
        }
    }

    // ==================== projection ====================

    /// `SELECT <expr> FROM table`
    pub fn select(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        let expr = expr.into_expr();
        let fields = self.compile_clause(Clause::Select, true, |q| q.compile_projection(&expr))?;
        self.select_expression = format!(
            "SELECT {fields} \nFROM {}",
            self.dialect.quoted_table_name(&self.model)
        );
        self.custom_select = true;
        self.distinct = false;
        Ok(self)
    }

    /// `SELECT DISTINCT <expr> FROM table`
    pub fn select_distinct(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        let expr = expr.into_expr();
        let fields = self.compile_clause(Clause::Select, true, |q| q.compile_projection(&expr))?;
        self.select_expression = format!(
            "SELECT DISTINCT {fields} \nFROM {}",
            self.dialect.quoted_table_name(&self.model)
        );
        self.custom_select = true;
        self.distinct = true;
        Ok(self)
    }

    /// Raw select list; empty restores every column.
    pub fn select_raw(&mut self, fields: &str) -> &mut Self {
        self.clear_clause(Clause::Select);
        self.custom_select = !fields.trim().is_empty();
        self.distinct = fields
            .trim_start()
            .get(..9)
            .is_some_and(|head| head.eq_ignore_ascii_case("DISTINCT "));
        self.select_expression = if fields.trim().is_empty() {
            self.default_select()
        } else {
            format!(
                "SELECT {} \nFROM {}",
                fields.trim(),
                self.dialect.quoted_table_name(&self.model)
            )
        };
        self
    }

    // ==================== filtering ====================

    /// Replace the filter.
    pub fn filter(&mut self, predicate: impl IntoExpr) -> OrmResult<&mut Self> {
        let predicate = predicate.into_expr();
        let sql = self.compile_clause(Clause::Where, true, |q| q.compile_predicate(&predicate))?;
        self.predicate = Some(predicate);
        self.where_expression = sql;
        Ok(self)
    }

    /// Remove the filter.
    pub fn clear_filter(&mut self) -> &mut Self {
        self.clear_clause(Clause::Where);
        self.predicate = None;
        self.where_expression.clear();
        self
    }

    /// AND `predicate` onto the current filter. A raw filter set by
    /// [`where_raw`](Self::where_raw) is replaced.
    pub fn and(&mut self, predicate: impl IntoExpr) -> OrmResult<&mut Self> {
        let predicate = predicate.into_expr();
        let combined = match &self.predicate {
            Some(current) => current.clone().and(predicate),
            None => predicate,
        };
        self.filter(combined)
    }

    /// OR `predicate` onto the current filter. A raw filter set by
    /// [`where_raw`](Self::where_raw) is replaced.
    pub fn or(&mut self, predicate: impl IntoExpr) -> OrmResult<&mut Self> {
        let predicate = predicate.into_expr();
        let combined = match &self.predicate {
            Some(current) => current.clone().or(predicate),
            None => predicate,
        };
        self.filter(combined)
    }

    /// Raw filter with `{0}`, `{1}`... replaced by literals of `args`.
    pub fn where_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<&mut Self> {
        let sql = self.compile_clause(Clause::Where, true, |q| q.format_raw(sql, args))?;
        self.predicate = None;
        self.where_expression = sql;
        Ok(self)
    }

    // ==================== grouping ====================

    pub fn group_by(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        let expr = expr.into_expr();
        let sql = self.compile_clause(Clause::GroupBy, true, |q| q.compile_projection(&expr))?;
        self.group_by = format!("GROUP BY {sql}");
        Ok(self)
    }

    pub fn group_by_raw(&mut self, sql: &str) -> &mut Self {
        self.clear_clause(Clause::GroupBy);
        self.group_by = if sql.trim().is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", sql.trim())
        };
        self
    }

    pub fn having(&mut self, predicate: impl IntoExpr) -> OrmResult<&mut Self> {
        let predicate = predicate.into_expr();
        let sql = self.compile_clause(Clause::Having, true, |q| q.compile_predicate(&predicate))?;
        self.having_expression = sql;
        Ok(self)
    }

    pub fn having_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<&mut Self> {
        let sql = self.compile_clause(Clause::Having, true, |q| q.format_raw(sql, args))?;
        self.having_expression = sql;
        Ok(self)
    }

    // ==================== ordering ====================

    fn compile_ordering(&mut self, expr: &Expr, direction: &str) -> OrmResult<Vec<String>> {
        let items = match expr {
            Expr::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let mut properties = Vec::with_capacity(items.len());
        for item in items {
            let sql = self.compile_projection(item)?;
            if matches!(item, Expr::Sql(SqlFn::Desc(_))) {
                properties.push(sql);
            } else {
                properties.push(format!("{sql} {direction}"));
            }
        }
        Ok(properties)
    }

    fn set_ordering(&mut self, expr: Expr, direction: &str) -> OrmResult<&mut Self> {
        let properties =
            self.compile_clause(Clause::OrderBy, true, |q| q.compile_ordering(&expr, direction))?;
        self.order_by_properties = properties;
        Ok(self)
    }

    fn append_ordering(&mut self, expr: Expr, direction: &str) -> OrmResult<&mut Self> {
        let properties =
            self.compile_clause(Clause::OrderBy, false, |q| q.compile_ordering(&expr, direction))?;
        self.order_by_properties.extend(properties);
        Ok(self)
    }

    /// Replace the ordering with ascending `expr` (a field list sorts by each).
    pub fn order_by(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        self.set_ordering(expr.into_expr(), "ASC")
    }

    pub fn order_by_desc(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        self.set_ordering(expr.into_expr(), "DESC")
    }

    /// Append an ascending sort key.
    pub fn then_by(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        self.append_ordering(expr.into_expr(), "ASC")
    }

    pub fn then_by_desc(&mut self, expr: impl IntoExpr) -> OrmResult<&mut Self> {
        self.append_ordering(expr.into_expr(), "DESC")
    }

    /// Raw ordering; empty clears it.
    pub fn order_by_raw(&mut self, sql: &str) -> &mut Self {
        self.clear_clause(Clause::OrderBy);
        self.order_by_properties.clear();
        if !sql.trim().is_empty() {
            self.order_by_properties.push(sql.trim().to_string());
        }
        self
    }

    // ==================== paging ====================

    pub fn limit(&mut self, skip: usize, rows: usize) -> &mut Self {
        self.skip = Some(skip);
        self.rows = Some(rows);
        self
    }

    pub fn limit_rows(&mut self, rows: usize) -> &mut Self {
        self.skip = None;
        self.rows = Some(rows);
        self
    }

    pub fn clear_limit(&mut self) -> &mut Self {
        self.skip = None;
        self.rows = None;
        self
    }

    // ==================== field lists ====================

    fn field_names(&self, expr: &Expr) -> OrmResult<Vec<String>> {
        let items = match expr {
            Expr::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        items
            .iter()
            .map(|item| {
                let name = item.as_column().ok_or_else(|| {
                    OrmError::not_supported("field lists may only contain columns")
                })?;
                self.model
                    .field(name)
                    .map(|f| f.name.clone())
                    .ok_or_else(|| {
                        OrmError::validation(format!("{} has no field `{name}`", self.model.name))
                    })
            })
            .collect()
    }

    /// Restrict `UPDATE` statements to the given fields.
    pub fn update_only(&mut self, fields: impl IntoExpr) -> OrmResult<&mut Self> {
        self.update_fields = self.field_names(&fields.into_expr())?;
        Ok(self)
    }

    pub fn update_all(&mut self) -> &mut Self {
        self.update_fields.clear();
        self
    }

    /// Restrict `INSERT` statements to the given fields.
    pub fn insert_only(&mut self, fields: impl IntoExpr) -> OrmResult<&mut Self> {
        self.insert_fields = self.field_names(&fields.into_expr())?;
        Ok(self)
    }

    pub fn insert_all(&mut self) -> &mut Self {
        self.insert_fields.clear();
        self
    }

    // ==================== modes ====================

    /// Compile values to bound parameters. Affects clauses compiled afterwards.
    pub fn parameterized(&mut self, on: bool) -> &mut Self {
        self.parameterized = on;
        self
    }

    /// Qualify column references with the table name. Affects clauses
    /// compiled afterwards and the default select list.
    pub fn prefix_field_with_table_name(&mut self, on: bool) -> &mut Self {
        self.prefix_field_with_table_name = on;
        if !self.custom_select {
            self.select_expression = self.default_select();
        }
        self
    }

    // ==================== accessors ====================

    pub fn select_expression(&self) -> &str {
        &self.select_expression
    }

    /// Current filter without the `WHERE` keyword.
    pub fn where_expression(&self) -> &str {
        &self.where_expression
    }

    pub fn predicate(&self) -> Option<&Expr> {
        self.predicate.as_ref()
    }

    pub fn group_by_expression(&self) -> &str {
        &self.group_by
    }

    pub fn having_expression(&self) -> &str {
        &self.having_expression
    }

    /// `ORDER BY a ASC,b DESC`, or empty.
    pub fn order_by_expression(&self) -> String {
        if self.order_by_properties.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.order_by_properties.join(","))
        }
    }

    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn rows(&self) -> Option<usize> {
        self.rows
    }

    /// Paging clause. OFFSET/FETCH dialects need an ORDER BY; a DISTINCT
    /// projection orders by its first column since `(SELECT NULL)` is not in
    /// the select list.
    pub fn limit_expression(&self) -> String {
        let has_order_by = !self.order_by_properties.is_empty();
        let offset_fetch = self.dialect.rules().limit_style == LimitStyle::OffsetFetch;
        if self.distinct && !has_order_by && offset_fetch {
            let paging = self.dialect.limit_expression(self.skip, self.rows, true);
            if !paging.is_empty() {
                return format!("ORDER BY 1 {paging}");
            }
            return paging;
        }
        self.dialect
            .limit_expression(self.skip, self.rows, has_order_by)
    }

    pub fn update_fields(&self) -> &[String] {
        &self.update_fields
    }

    pub fn insert_fields(&self) -> &[String] {
        &self.insert_fields
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_parameterized(&self) -> bool {
        self.parameterized
    }
}
