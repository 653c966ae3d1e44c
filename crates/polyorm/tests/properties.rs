//! Property-based tests for literal escaping and predicate folding.

use polyorm::dialect::literal::quote_string;
use polyorm::{
    DialectKind, Expr, FieldDefinition, FieldType, ModelDefinition, SqlExpression, col, lit,
};
use proptest::prelude::*;
use std::sync::Arc;

fn person() -> Arc<ModelDefinition> {
    Arc::new(
        ModelDefinition::builder("Person")
            .field(FieldDefinition::new("Id", FieldType::Int32).auto_increment())
            .field(FieldDefinition::new("Age", FieldType::Int32))
            .build()
            .unwrap(),
    )
}

fn compare(op: usize, left: Expr, right: Expr) -> Expr {
    match op {
        0 => left.eq(right),
        1 => left.ne(right),
        2 => left.gt(right),
        3 => left.ge(right),
        4 => left.lt(right),
        _ => left.le(right),
    }
}

fn holds(op: usize, a: i32, b: i32) -> bool {
    match op {
        0 => a == b,
        1 => a != b,
        2 => a > b,
        3 => a >= b,
        4 => a < b,
        _ => a <= b,
    }
}

const OPERATORS: [&str; 6] = ["=", "<>", ">", ">=", "<", "<="];

fn unquote(quoted: &str, close: char) -> String {
    let inner = &quoted[close.len_utf8()..quoted.len() - close.len_utf8()];
    inner.replace(&format!("{close}{close}"), &close.to_string())
}

proptest! {
    #[test]
    fn prop_quote_string_round_trips(s in ".*") {
        let quoted = quote_string(&s);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
        prop_assert_eq!(quoted.matches('\'').count(), s.matches('\'').count() * 2 + 2);
        prop_assert_eq!(unquote(&quoted, '\''), s);
    }

    #[test]
    fn prop_escaped_names_round_trip(name in "[a-zA-Z_\\]\"` ]{1,20}") {
        for kind in DialectKind::ALL {
            let dialect = kind.create(None);
            let rules = dialect.rules();
            let escaped = dialect.escape_name(&name);
            prop_assert!(escaped.starts_with(rules.open_quote));
            prop_assert!(escaped.ends_with(rules.close_quote));
            prop_assert_eq!(unquote(&escaped, rules.close_quote), name.clone());
        }
    }

    #[test]
    fn prop_constant_comparisons_fold(a in any::<i32>(), b in any::<i32>(), op in 0usize..6) {
        let mut q = SqlExpression::new(DialectKind::Sqlite.create(None), person());
        q.filter(compare(op, lit(a), lit(b))).unwrap();
        let expected = if holds(op, a, b) { "1=1" } else { "1=0" };
        prop_assert_eq!(q.where_expression(), expected);
    }

    #[test]
    fn prop_folded_conjunctions_match_rust(
        a in any::<i16>(),
        b in any::<i16>(),
        c in any::<i16>(),
        op1 in 0usize..6,
        op2 in 0usize..6,
        either in any::<bool>(),
    ) {
        let (a, b, c) = (i32::from(a), i32::from(b), i32::from(c));
        let left = compare(op1, lit(a), lit(b));
        let right = compare(op2, lit(b), lit(c));
        let (predicate, expected) = if either {
            (left.or(right), holds(op1, a, b) || holds(op2, b, c))
        } else {
            (left.and(right), holds(op1, a, b) && holds(op2, b, c))
        };

        let mut q = SqlExpression::new(DialectKind::Postgres.create(None), person());
        q.filter(predicate).unwrap();
        prop_assert_eq!(q.where_expression(), if expected { "1=1" } else { "1=0" });
    }

    #[test]
    fn prop_column_comparison_keeps_operand(n in any::<i32>(), op in 0usize..6) {
        let mut q = SqlExpression::new(DialectKind::Sqlite.create(None), person());
        q.filter(compare(op, col("Age"), lit(n))).unwrap();
        let expected = format!("\"Age\" {} {n}", OPERATORS[op]);
        prop_assert_eq!(q.where_expression(), expected.as_str());
    }

    #[test]
    fn prop_parameterized_filter_binds_every_value(values in prop::collection::vec(any::<i32>(), 1..8)) {
        let dialect = DialectKind::SqlServer.create(None);
        let dialect = dialect.with_config(dialect.config().clone().with_parameterized(true));
        let mut q = SqlExpression::new(dialect, person());

        let mut predicate = col("Age").eq(values[0]);
        for v in &values[1..] {
            predicate = predicate.or(col("Age").eq(*v));
        }
        q.filter(predicate).unwrap();

        prop_assert_eq!(q.params().len(), values.len());
        for i in 0..values.len() {
            let placeholder = format!("@{i}");
            prop_assert!(q.where_expression().contains(&placeholder));
        }
        let next_placeholder = format!("@{}", values.len());
        prop_assert!(!q.where_expression().contains(&next_placeholder));
    }
}
