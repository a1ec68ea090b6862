use mock_odoo::MockServer;
use odoo_rpc::{Connection, Domain, DomainOperator, Error, Protocol, SearchOptions};
use serde_json::{Value, json};
use std::sync::Arc;

fn connect(server: &Arc<MockServer>) -> Connection {
    Connection::with_transport(
        "http://odoo.test",
        "db",
        "admin",
        "secret",
        Protocol::JsonRpc,
        server.clone(),
    )
}

fn last_execute_kw_args(server: &MockServer) -> Value {
    let (service, method, args) = server.last_request().rpc_params();
    assert_eq!(service, "object");
    assert_eq!(method, "execute_kw");
    Value::Array(args)
}

#[tokio::test]
async fn read_prefixes_authentication_arguments() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("read", json!([{"id": 7, "name": "Desk"}]));
    let conn = connect(&server);
    let products = conn.model("product.product");

    let records = products
        .read(&[7], Some(&["name".to_string()]))
        .await
        .unwrap();
    assert_eq!(records, vec![json!({"id": 7, "name": "Desk"})]);

    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "product.product",
            "read",
            [7],
            {"fields": ["name"]},
        ])
    );
}

#[tokio::test]
async fn search_sends_the_domain_and_options() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("search", json!([3, 9]));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let domain = Domain::condition("is_company", DomainOperator::Eq, true);
    let options = SearchOptions {
        order: Some("name asc".to_string()),
        offset: None,
        limit: Some(80),
    };
    let ids = partners.search(&domain, &options).await.unwrap();
    assert_eq!(ids, vec![3, 9]);

    // Unset options stay out of the kwargs entirely.
    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "res.partner",
            "search",
            [[["is_company", "=", true]]],
            {"order": "name asc", "limit": 80},
        ])
    );
}

#[tokio::test]
async fn search_read_combines_fields_and_options() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("search_read", json!([{"name": "Azure"}]));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let domain = Domain::condition("active", DomainOperator::Eq, true);
    let options = SearchOptions {
        order: None,
        offset: Some(10),
        limit: Some(5),
    };
    partners
        .search_read(&domain, Some(&["name".to_string()]), &options)
        .await
        .unwrap();

    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "res.partner",
            "search_read",
            [[["active", "=", true]]],
            {"fields": ["name"], "offset": 10, "limit": 5},
        ])
    );
}

#[tokio::test]
async fn search_count_sends_only_the_domain() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("search_count", json!(42));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let count = partners.search_count(&Domain::new()).await.unwrap();
    assert_eq!(count, 42);

    assert_eq!(
        last_execute_kw_args(&server),
        json!(["db", 5, "secret", "res.partner", "search_count", [[]]])
    );
}

#[tokio::test]
async fn get_fields_requests_metadata() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub(
        "fields_get",
        json!({"name": {"type": "char", "string": "Name"}}),
    );
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let fields = partners
        .get_fields(Some(&["type".to_string(), "string".to_string()]))
        .await
        .unwrap();
    assert_eq!(fields.get("name"), Some(&json!({"type": "char", "string": "Name"})));

    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "res.partner",
            "fields_get",
            [],
            {"attributes": ["type", "string"]},
        ])
    );
}

#[tokio::test]
async fn create_returns_the_new_identifier() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("create", json!(101));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let id = partners
        .create(json!({"name": "Azure Interior"}))
        .await
        .unwrap();
    assert_eq!(id, 101);

    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "res.partner",
            "create",
            [{"name": "Azure Interior"}],
        ])
    );
}

#[tokio::test]
async fn update_wraps_the_identifier_in_a_list() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("write", json!(true));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let ack = partners
        .update(7, json!({"name": "Renamed"}))
        .await
        .unwrap();
    assert_eq!(ack, json!(true));

    assert_eq!(
        last_execute_kw_args(&server),
        json!([
            "db",
            5,
            "secret",
            "res.partner",
            "write",
            [[7], {"name": "Renamed"}],
        ])
    );
}

#[tokio::test]
async fn delete_wraps_the_identifier_in_a_list() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("unlink", json!(true));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    partners.delete(7).await.unwrap();

    assert_eq!(
        last_execute_kw_args(&server),
        json!(["db", 5, "secret", "res.partner", "unlink", [[7]]])
    );
}

#[tokio::test]
async fn call_is_a_generic_escape_hatch() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("action_archive", json!(true));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    partners
        .call("action_archive", vec![json!([1, 2])])
        .await
        .unwrap();

    assert_eq!(
        last_execute_kw_args(&server),
        json!(["db", 5, "secret", "res.partner", "action_archive", [1, 2]])
    );
}

#[tokio::test]
async fn malformed_domain_never_reaches_the_wire() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    let dangling = Domain::new().or().filter("a", DomainOperator::Eq, 1);
    match partners.search_count(&dangling).await {
        Err(Error::Domain(_)) => {}
        other => panic!("expected a domain error, got {other:?}"),
    }
    // Rejected before authentication, let alone the search itself.
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn unexpected_result_shape_is_a_protocol_error() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("search_count", json!("not a number"));
    let conn = connect(&server);
    let partners = conn.model("res.partner");

    match partners.search_count(&Domain::new()).await {
        Err(Error::Protocol { .. }) => {}
        other => panic!("expected a protocol error, got {other:?}"),
    }
}
