use mock_odoo::MockServer;
use odoo_rpc::{Connection, Error, Protocol};
use serde_json::{Value, json};
use std::sync::Arc;

fn connect(server: &Arc<MockServer>, protocol: Protocol) -> Connection {
    Connection::with_transport(
        "http://odoo.test",
        "db",
        "admin",
        "secret",
        protocol,
        server.clone(),
    )
}

#[tokio::test]
async fn version_is_fetched_without_authentication() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    let conn = connect(&server, Protocol::JsonRpc);

    let version = conn.version().await.unwrap();

    assert_eq!(version.server_version, "19.0");
    assert_eq!(version.protocol_version, 1);
    assert_eq!(server.calls_to("authenticate"), 0);
    assert!(conn.session().is_none());

    let request = server.last_request();
    assert_eq!(request.url, "http://odoo.test/jsonrpc");
    assert!(request.headers.contains(&(
        "Content-Type".to_string(),
        "application/json; charset=utf-8".to_string(),
    )));
}

#[tokio::test]
async fn call_round_trips_the_json_envelope() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub("search", json!([1, 2, 3]));
    let conn = connect(&server, Protocol::JsonRpc);

    let domain = json!([["name", "=", "Mitchell"]]);
    let result = conn
        .call("object", "search", vec![domain.clone()])
        .await
        .unwrap();
    assert_eq!(result, json!([1, 2, 3]));

    assert_eq!(
        server.last_request().json(),
        json!({
            "id": 1,
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": "object",
                "method": "search",
                "args": [domain],
            },
        })
    );
}

#[tokio::test]
async fn request_ids_are_monotonic_per_connection() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    let conn = connect(&server, Protocol::JsonRpc);

    conn.version().await.unwrap();
    conn.version().await.unwrap();

    let ids: Vec<Value> = server
        .requests()
        .iter()
        .map(|request| request.json()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn server_fault_becomes_a_remote_error() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.stub_fault("version", 100, "Odoo Server Error");
    let conn = connect(&server, Protocol::JsonRpc);

    match conn.version().await {
        Err(Error::Remote { code, message, .. }) => {
            assert_eq!(code, 100);
            assert_eq!(message, "Odoo Server Error");
        }
        other => panic!("expected a remote fault, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_becomes_a_protocol_error() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.set_raw_response("<html>502 Bad Gateway</html>");
    let conn = connect(&server, Protocol::JsonRpc);

    match conn.version().await {
        Err(Error::Protocol { protocol, .. }) => assert_eq!(protocol, "jsonrpc"),
        other => panic!("expected a protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_becomes_a_transport_error() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.set_transport_error("connection refused");
    let conn = connect(&server, Protocol::JsonRpc);

    match conn.version().await {
        Err(Error::Transport(cause)) => {
            assert!(cause.to_string().contains("connection refused"));
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn xmlrpc_routes_by_service_and_speaks_xml() {
    let server = Arc::new(MockServer::new("db", "admin", "secret", 5));
    server.set_raw_response(
        "<?xml version=\"1.0\"?><methodResponse><params><param>\
         <value><int>42</int></value>\
         </param></params></methodResponse>",
    );
    let conn = connect(&server, Protocol::XmlRpc);

    let result = conn.call("common", "ping", vec![json!("x")]).await.unwrap();
    assert_eq!(result, json!(42));

    let request = server.last_request();
    assert_eq!(request.url, "http://odoo.test/xmlrpc/2/common");
    assert!(request.headers.contains(&(
        "Content-Type".to_string(),
        "text/xml; charset=utf-8".to_string(),
    )));
    assert!(request.body.starts_with("<?xml"));
    assert!(request.body.contains("<methodName>ping</methodName>"));
}
