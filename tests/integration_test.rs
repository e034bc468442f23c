use std::sync::Arc;
use std::thread;
use vibeql::backend::{Arithmetic, Backend, SqlStandard};
use vibeql::config::RewriteConfig;
use vibeql::expression::{int32, string, table, Expr};
use vibeql::parse::parse;
use vibeql::registry::OperatorRegistry;
use vibeql::schema::{Table, TableSchema};
use vibeql::types::{Literal, TypeName};
use vibeql::Error;

fn orders_schema() -> TableSchema {
    TableSchema::builder()
        .column("id", TypeName::Int64, false)
        .column("amount", TypeName::Int32, false)
        .column("price", TypeName::Float64, true)
        .column("customer", TypeName::String, false)
        .column("paid", TypeName::Bool, false)
        .build()
        .unwrap()
}

fn orders() -> Expr {
    table(&Table::new("orders", orders_schema()))
}

#[test]
fn test_column_arithmetic_to_sql() {
    let registry = OperatorRegistry::standard().unwrap();
    let amount = orders().column("amount").unwrap();
    let expr = registry.add(&amount, int32(5)).unwrap();

    let backend = SqlStandard::new();
    assert_eq!(backend.compile(&expr).unwrap(), "amount + 5");
}

#[test]
fn test_missing_column_fails_at_construction() {
    let err = orders().column("discount").unwrap_err();
    assert_eq!(
        err,
        Error::Schema {
            table: "orders".to_string(),
            missing: vec!["discount".to_string()],
        }
    );

    let err = orders().project(&["id", "tax", "discount"]).unwrap_err();
    assert!(matches!(err, Error::Schema { ref missing, .. } if missing.len() == 2));
}

#[test]
fn test_constant_folding() {
    let registry = OperatorRegistry::standard().unwrap();
    let expr = registry.pow(int32(2), int32(3)).unwrap();
    assert_eq!(Arithmetic::new().compile(&expr).unwrap(), Literal::Int(8));

    let expr = registry.truediv(int32(7), int32(2)).unwrap();
    assert_eq!(Arithmetic::new().execute(&expr).unwrap(), Literal::Float(3.5));
}

#[test]
fn test_reflected_operand_order() {
    let registry = OperatorRegistry::standard().unwrap();

    let expr = registry.sub(5, int32(3)).unwrap();
    assert_eq!(Arithmetic::new().compile(&expr).unwrap(), Literal::Int(2));

    let amount = orders().column("amount").unwrap();
    let expr = registry.sub(5, &amount).unwrap();
    assert_eq!(SqlStandard::new().compile(&expr).unwrap(), "5 - amount");
}

#[test]
fn test_dispatch_rejects_incompatible_operands() {
    let registry = OperatorRegistry::standard().unwrap();
    let customer = orders().column("customer").unwrap();
    assert!(matches!(
        registry.add(&customer, int32(1)),
        Err(Error::UnsupportedOperation { .. })
    ));
    assert!(matches!(
        registry.and(int32(1), string("x")),
        Err(Error::UnsupportedOperation { .. })
    ));
}

#[test]
fn test_compile_is_idempotent() {
    let registry = OperatorRegistry::standard().unwrap();
    let source = orders();
    let expr = parse("(amount + 1) * 2 >= price AND NOT paid", &registry, Some(&source)).unwrap();

    let backend = SqlStandard::new();
    let first = backend.compile(&expr).unwrap();
    let second = backend.compile(&expr).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "(amount + 1) * 2 >= price AND NOT paid");

    let fixpoint = backend.compiler().rewrite(&expr).unwrap();
    let again = backend.compiler().rewrite(&fixpoint.expr).unwrap();
    assert_eq!(again.expr, fixpoint.expr);
    assert_eq!(again.passes, 1);
}

#[test]
fn test_iteration_ceiling() {
    let registry = OperatorRegistry::standard().unwrap();
    let expr = registry
        .add(registry.mul(int32(2), int32(3)).unwrap(), int32(1))
        .unwrap();

    let backend = Arithmetic::with_config(RewriteConfig::default().with_max_iterations(1));
    assert!(matches!(
        backend.compile(&expr),
        Err(Error::NonTerminatingRewrite { iterations: 1, .. })
    ));
    assert_eq!(Arithmetic::new().compile(&expr).unwrap(), Literal::Int(7));
}

#[test]
fn test_shared_backend_across_threads() {
    let registry = Arc::new(OperatorRegistry::standard().unwrap());
    let backend = SqlStandard::new();
    let source = orders();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let backend = &backend;
                let source = &source;
                scope.spawn(move || {
                    let amount = source.column("amount").unwrap();
                    let expr = registry.gt(&amount, int32(i)).unwrap();
                    backend.compile(&expr).unwrap()
                })
            })
            .collect();

        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results,
            vec!["amount > 0", "amount > 1", "amount > 2", "amount > 3"]
        );
    });
}

#[test]
fn test_schema_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.schema");

    let schema = orders_schema();
    std::fs::write(&path, schema.to_bytes().unwrap()).unwrap();
    let loaded = TableSchema::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(loaded, schema);

    let source = table(&Table::new("orders", loaded));
    let registry = OperatorRegistry::standard().unwrap();
    let expr = parse("price * 2", &registry, Some(&source)).unwrap();
    assert_eq!(SqlStandard::new().compile(&expr).unwrap(), "price * 2");
}

#[test]
fn test_projection_and_alias() {
    let source = orders();
    let projection = source.project(&["id", "customer"]).unwrap();
    assert_eq!(projection.projected_names(), Some(vec!["id", "customer"]));
    assert_eq!(SqlStandard::new().compile(&projection).unwrap(), "id, customer");

    let aliased = source.column("amount").unwrap().with_alias("qty").unwrap();
    assert_eq!(SqlStandard::new().compile(&aliased).unwrap(), "amount AS qty");
}

#[test]
fn test_parse_and_fold() {
    let registry = OperatorRegistry::standard().unwrap();
    let backend = Arithmetic::new();

    let cases = [
        ("1 + 2 * 3", Literal::Int(7)),
        ("(1 + 2) * 3", Literal::Int(9)),
        ("2 ** 3 ** 2", Literal::Int(512)),
        ("-7 // 2", Literal::Int(-4)),
        ("-7 % 3", Literal::Int(2)),
        ("1 < 2 AND NOT FALSE", Literal::Boolean(true)),
        ("1 IS NOT DISTINCT FROM NULL", Literal::Boolean(false)),
        ("1 = NULL", Literal::Null),
        ("FALSE AND NULL", Literal::Boolean(false)),
    ];
    for (input, expected) in cases {
        let expr = parse(input, &registry, None).unwrap();
        assert_eq!(backend.compile(&expr).unwrap(), expected, "{}", input);
    }
}

#[test]
fn test_unfoldable_tree_is_unresolved() {
    let registry = OperatorRegistry::standard().unwrap();
    let source = orders();
    let expr = parse("amount + 1", &registry, Some(&source)).unwrap();
    assert!(matches!(
        Arithmetic::new().compile(&expr),
        Err(Error::UnresolvedExpression { .. })
    ));

    let expr = parse("1 // 0", &registry, None).unwrap();
    assert!(matches!(
        Arithmetic::new().compile(&expr),
        Err(Error::UnresolvedExpression { ref operation, .. }) if operation == "FloorDivide"
    ));
}

#[test]
fn test_deep_chain() {
    let registry = OperatorRegistry::standard().unwrap();
    let mut expr = int32(1);
    for _ in 0..100_000 {
        expr = registry.add(expr, int32(1)).unwrap();
    }
    assert_eq!(expr.node_count(), 200_001);
    assert_eq!(Arithmetic::new().compile(&expr).unwrap(), Literal::Int(100_001));

    let mut expr = orders().column("amount").unwrap();
    for _ in 0..100_000 {
        expr = registry.add(expr, int32(1)).unwrap();
    }
    assert!(matches!(
        Arithmetic::new().compile(&expr),
        Err(Error::UnresolvedExpression { .. })
    ));
}

#[test]
fn test_negative_literals_round_trip_through_sql() {
    let registry = OperatorRegistry::standard().unwrap();
    let source = orders();
    let backend = SqlStandard::new();

    let expr = registry.sub(source.column("id").unwrap(), -3).unwrap();
    let sql = backend.compile(&expr).unwrap();
    assert_eq!(sql, "id - (-3)");
    let reparsed = parse(&sql, &registry, Some(&source)).unwrap();
    assert_eq!(backend.compile(&reparsed).unwrap(), sql);

    let expr = registry.pow(int32(-2), int32(2)).unwrap();
    let sql = backend.compile(&expr).unwrap();
    assert_eq!(sql, "(-2) ** 2");
    let reparsed = parse(&sql, &registry, None).unwrap();
    assert_eq!(Arithmetic::new().compile(&reparsed).unwrap(), Literal::Int(4));
}
