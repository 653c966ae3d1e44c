//! Statement assembly from the descriptor's clause fragments.

use super::{Clause, SqlExpression};
use crate::dialect::where_suffix;
use crate::error::{OrmError, OrmResult};
use crate::model::{FieldDefinition, RowValues};
use crate::value::Value;

fn selected(field: &FieldDefinition, allow: &[String]) -> bool {
    allow.is_empty() || allow.iter().any(|name| *name == field.name)
}

impl SqlExpression {
    /// Append each non-empty clause on its own line, in SQL order.
    fn push_clauses(&self, sql: &mut String, with_ordering: bool) {
        if !self.where_expression.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&self.where_expression);
        }
        if !self.group_by.is_empty() {
            sql.push('\n');
            sql.push_str(&self.group_by);
        }
        if !self.having_expression.is_empty() {
            sql.push_str("\nHAVING ");
            sql.push_str(&self.having_expression);
        }
        if with_ordering {
            let order_by = self.order_by_expression();
            if !order_by.is_empty() {
                sql.push('\n');
                sql.push_str(&order_by);
            }
            let limit = self.limit_expression();
            if !limit.is_empty() {
                sql.push('\n');
                sql.push_str(&limit);
            }
        }
    }

    /// `SELECT ... FROM ... [WHERE] [GROUP BY] [HAVING] [ORDER BY] [paging]`
    pub fn to_select_statement(&self) -> String {
        let mut sql = self.select_expression.clone();
        self.push_clauses(&mut sql, true);
        trace_sql!(kind = "select", sql = %sql);
        sql
    }

    /// `SELECT COUNT(*)` over the same filter and grouping, without ordering
    /// or paging.
    pub fn to_count_statement(&self) -> String {
        let mut sql = format!(
            "SELECT COUNT(*) \nFROM {}",
            self.dialect.quoted_table_name(&self.model)
        );
        self.push_clauses(&mut sql, false);
        trace_sql!(kind = "count", sql = %sql);
        sql
    }

    /// Whether any row matches the current filter.
    pub fn to_exists_statement(&self) -> String {
        let sql = self
            .dialect
            .exists_statement(&self.model, &self.where_expression);
        trace_sql!(kind = "exists", sql = %sql);
        sql
    }

    /// Render a value for `field`, bound or inline.
    fn field_literal(&mut self, field: &FieldDefinition, value: &Value) -> OrmResult<String> {
        if self.parameterized && !value.is_null() {
            self.literal(value, Some(&field.field_type))
        } else {
            self.dialect.field_value(field, value)
        }
    }

    /// `UPDATE t SET ... [WHERE filter]` with values from `row`.
    ///
    /// Key, computed and auto-increment fields are never assigned; with
    /// [`update_only`](Self::update_only) only the listed fields are.
    pub fn to_update_statement(&mut self, row: &dyn RowValues) -> OrmResult<String> {
        let model = self.model.clone();
        let update_fields = self.update_fields.clone();
        let assignments = self.compile_clause(Clause::Update, true, |q| {
            let mut assignments = Vec::new();
            for field in model.fields() {
                if model.is_key_field(field)
                    || field.is_computed
                    || field.auto_increment
                    || !selected(field, &update_fields)
                {
                    continue;
                }
                let value = q.field_literal(field, &row.get_value(&field.name))?;
                assignments.push(format!(
                    "{} = {value}",
                    q.dialect.quoted_column_name(field.field_name())
                ));
            }
            Ok(assignments)
        })?;

        if assignments.is_empty() {
            return Err(OrmError::validation(format!(
                "no updatable fields selected for {}",
                self.model.name
            )));
        }

        let sql = format!(
            "UPDATE {} SET {}{}",
            self.dialect.quoted_table_name(&self.model),
            assignments.join(", "),
            where_suffix(&self.where_expression)
        );
        trace_sql!(kind = "update", sql = %sql);
        Ok(sql)
    }

    /// `DELETE FROM t [WHERE filter]`
    pub fn to_delete_row_statement(&self) -> String {
        let sql = format!(
            "DELETE FROM {}{}",
            self.dialect.quoted_table_name(&self.model),
            where_suffix(&self.where_expression)
        );
        trace_sql!(kind = "delete", sql = %sql);
        sql
    }

    /// `INSERT INTO t (...) SELECT ... WHERE NOT EXISTS (SELECT 1 FROM t WHERE filter)`
    ///
    /// Computed and generated fields are skipped; with
    /// [`insert_only`](Self::insert_only) only the listed fields are inserted.
    pub fn to_insert_where_not_exists_statement(
        &mut self,
        row: &dyn RowValues,
    ) -> OrmResult<String> {
        let model = self.model.clone();
        let insert_fields = self.insert_fields.clone();
        let (columns, values) = self.compile_clause(Clause::Insert, true, |q| {
            let mut columns = Vec::new();
            let mut values = Vec::new();
            for field in model.fields() {
                if field.is_computed || field.is_generated() || !selected(field, &insert_fields) {
                    continue;
                }
                values.push(q.field_literal(field, &row.get_value(&field.name))?);
                columns.push(q.dialect.quoted_column_name(field.field_name()));
            }
            Ok((columns, values))
        })?;

        if columns.is_empty() {
            return Err(OrmError::validation(format!(
                "no insertable fields selected for {}",
                self.model.name
            )));
        }

        let table = self.dialect.quoted_table_name(&self.model);
        let source = self
            .dialect
            .rules()
            .dual_table
            .map(|dual| format!(" FROM {dual}"))
            .unwrap_or_default();
        let sql = format!(
            "INSERT INTO {table} ({}) SELECT {}{source} WHERE NOT EXISTS (SELECT 1 FROM {table}{})",
            columns.join(","),
            values.join(","),
            where_suffix(&self.where_expression)
        );
        trace_sql!(kind = "insert", sql = %sql);
        Ok(sql)
    }
}
