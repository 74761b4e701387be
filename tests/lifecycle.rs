//! End-to-end tests for the interception / side-table / execution trio,
//! driven the way an integration module would drive them.

use std::sync::Arc;

use serde_json::json;

use tracetap::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A database-style integration: hook `Conn::query`, remember the host on
/// the connection handle, tag it onto every query span.
#[test]
fn test_database_integration_round_trip() {
    init_tracing();

    let store = Arc::new(EntitySideStore::new());
    let registry = Arc::new(HookRegistry::new(Tracer::new()));

    // Connection established: the integration stashes the host on the
    // handle the runtime gave it.
    let conn = store.allocate_handle(17);
    store.put(conn, "db.host", json!("db-primary:5432"));

    let store_pre = store.clone();
    registry
        .register(
            Target::method("Conn", "query"),
            Some(callback(move |ctx| {
                let host = store_pre.get(conn, "db.host", Value::Null);
                let span = ctx.span();
                span.set_tag("db.type", "postgres");
                if let Some(host) = host.as_str() {
                    span.set_tag("db.host", host);
                }
                ctx.set_data(ctx.args().first().cloned().unwrap_or(Value::Null));
                Ok(())
            })),
            Some(callback(|ctx| {
                if let Some(query) = ctx.data().cloned() {
                    if let Some(q) = query.as_str() {
                        ctx.span().set_tag("db.statement", q);
                    }
                }
                Ok(())
            })),
            HookOptions::default(),
        )
        .unwrap();

    // A successful query.
    let result = registry
        .dispatch(
            &Target::method("Conn", "query"),
            None,
            vec![json!("SELECT * FROM users")],
            |_, _| Ok(json!([{"id": 1}])),
        )
        .unwrap();
    assert_eq!(result, json!([{"id": 1}]));

    // A failing query: the error reaches the caller untouched and the span
    // is tagged.
    let thrown = ThrownError::new("PDOException", "syntax error at or near \"FORM\"");
    let thrown_clone = thrown.clone();
    let err = registry
        .dispatch(
            &Target::method("Conn", "query"),
            None,
            vec![json!("SELECT * FORM users")],
            move |_, _| Err(thrown_clone),
        )
        .unwrap_err();
    assert_eq!(err, thrown);

    let spans = registry.tracer().finished();
    assert_eq!(spans.len(), 2);

    assert_eq!(spans[0].name, "Conn::query");
    assert!(!spans[0].error);
    assert_eq!(
        spans[0].tags.get("db.statement").map(String::as_str),
        Some("SELECT * FROM users")
    );
    assert_eq!(
        spans[0].tags.get("db.host").map(String::as_str),
        Some("db-primary:5432")
    );

    assert!(spans[1].error);
    assert_eq!(
        spans[1].tags.get("error.kind").map(String::as_str),
        Some("PDOException")
    );

    // Connection closed: its side-table entries die with the handle.
    store.release_handle(conn);
    assert_eq!(store.get(conn, "db.host", json!("gone")), json!("gone"));
}

/// The explicit execution path: a caller holding a scope wraps a call and
/// enriches the span from the result.
#[test]
fn test_executor_with_shared_tracer() {
    init_tracing();

    let tracer = Tracer::new();
    let scope = tracer.start_span("cache.get");

    let result = execute_function(
        scope,
        |args| Ok(json!({"hit": true, "key": args[0]})),
        &vec![json!("user:42")],
        Some(|value: &Value, span: &mut Span| {
            let hit = value["hit"].as_bool().unwrap_or(false);
            span.set_tag("cache.hit", hit.to_string());
        }),
    )
    .unwrap();

    assert_eq!(result["key"], json!("user:42"));
    let spans = tracer.finished();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].tags.get("cache.hit").map(String::as_str), Some("true"));
}

/// Deferred activation across a simulated autoload: the integration
/// registers against a class that is declared later.
#[test]
fn test_deferred_activation_through_file_load() {
    init_tracing();

    let registry = Arc::new(HookRegistry::new(Tracer::new()));
    let target = Target::method("LazyLoaded", "handle");

    registry
        .register(
            target.clone(),
            Some(callback(|ctx| {
                ctx.span().set_tag("component", "lazy");
                Ok(())
            })),
            None,
            HookOptions::default(),
        )
        .unwrap();
    assert_eq!(registry.pending_count(), 1);

    // Loading the defining file declares the class.
    let reg = registry.clone();
    let t = target.clone();
    registry
        .dispatch_file("src/LazyLoaded.php", move || {
            reg.mark_defined(&t);
            Ok(Value::Null)
        })
        .unwrap();
    assert_eq!(registry.pending_count(), 0);
    assert_eq!(registry.active_count(&target), 1);

    registry
        .dispatch(&target, None, vec![], |_, _| Ok(Value::Null))
        .unwrap();
    let spans = registry.tracer().finished();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "LazyLoaded::handle");
}

/// Nested invocations of different targets: inner spans close before the
/// outer invocation's post phase runs.
#[test]
fn test_nested_targets_close_inner_first() {
    init_tracing();

    let registry = Arc::new(HookRegistry::new(Tracer::new()));
    for name in ["outer", "inner"] {
        registry
            .register(
                Target::function(name),
                Some(callback(|ctx| {
                    ctx.span();
                    Ok(())
                })),
                None,
                HookOptions::default(),
            )
            .unwrap();
    }

    let reg = registry.clone();
    registry
        .dispatch(&Target::function("outer"), None, vec![], move |_, _| {
            reg.dispatch(&Target::function("inner"), None, vec![], |_, _| {
                Ok(Value::Null)
            })
        })
        .unwrap();

    let spans = registry.tracer().finished();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].name, "inner");
    assert_eq!(spans[1].name, "outer");
}

/// Object side storage stays isolated per instance and propagates on
/// request, the pattern used when one runtime object is derived from
/// another (statement from connection).
#[test]
fn test_object_metadata_propagation() {
    init_tracing();

    let store = EntitySideStore::new();
    let conn: ObjectRef = Arc::new("connection");
    let stmt: ObjectRef = Arc::new("statement");

    store.put(&conn, "db.host", json!("db-replica:5432"));
    store.propagate(&conn, &stmt, "db.host");

    assert_eq!(
        store.get(&stmt, "db.host", Value::Null),
        json!("db-replica:5432")
    );
    assert_eq!(
        store.get(&conn, "db.host", Value::Null),
        json!("db-replica:5432")
    );

    // A third object never observes either entry.
    let other: ObjectRef = Arc::new("other");
    assert_eq!(store.get(&other, "db.host", Value::Null), Value::Null);
}
