//! Tests for the client facade

use super::*;
use crate::error::Error;
use crate::pagination::PageSize;
use crate::partition::Threshold;
use crate::request::{Params, RequestOptions};
use crate::sqlview::SqlViewOptions;
use crate::types::Method;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_for(server: &MockServer) -> Api {
    Api::new(server.uri(), "admin", "district").unwrap()
}

// ============================================================================
// Base URL Tests
// ============================================================================

#[test_case("play.dhis2.org/demo", "https://play.dhis2.org/demo" ; "https added")]
#[test_case("play.dhis2.org/demo/", "https://play.dhis2.org/demo" ; "trailing slash")]
#[test_case("  play.dhis2.org  ", "https://play.dhis2.org" ; "whitespace")]
#[test_case("localhost:8080", "http://localhost:8080" ; "localhost http")]
#[test_case("127.0.0.1:8080/dhis", "http://127.0.0.1:8080/dhis" ; "loopback ip")]
#[test_case("[::1]:8080", "http://[::1]:8080" ; "ipv6 loopback")]
#[test_case("http://example.org", "http://example.org" ; "explicit http kept")]
#[test_case("https://localhost", "https://localhost" ; "explicit https kept")]
#[test_case("https://example.org/dhis?x=1#frag", "https://example.org/dhis" ; "query dropped")]
#[test_case("localhost.example.org", "https://localhost.example.org" ; "not loopback")]
fn test_normalize_base_url(server: &str, expected: &str) {
    assert_eq!(normalize_base_url(server).unwrap(), expected);
}

#[test_case("play.dhis2.org/demo/api" ; "api suffix")]
#[test_case("https://play.dhis2.org/api/29" ; "versioned api")]
#[test_case("" ; "empty")]
#[test_case("   " ; "blank")]
#[test_case("http://" ; "no host")]
fn test_normalize_base_url_rejected(server: &str) {
    assert!(normalize_base_url(server).unwrap_err().is_client_error());
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_api_urls() {
    let api = Api::new("play.dhis2.org/demo", "admin", "district").unwrap();
    assert_eq!(api.base_url(), "https://play.dhis2.org/demo");
    assert_eq!(api.api_url(), "https://play.dhis2.org/demo/api");
    assert_eq!(api.api_version(), None);
    assert_eq!(api.username(), "admin");

    let api = Api::builder("play.dhis2.org/demo", "admin", "district")
        .api_version(30)
        .build()
        .unwrap();
    assert_eq!(api.api_url(), "https://play.dhis2.org/demo/api/30");
}

#[test_case(24 ; "below minimum")]
#[test_case(0 ; "zero")]
fn test_api_version_rejected(version: u32) {
    let err = Api::builder("play.dhis2.org/demo", "admin", "district")
        .api_version(version)
        .build()
        .unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn test_api_setters() {
    let mut api = Api::new("localhost:8080", "admin", "district").unwrap();

    api.set_api_version(Some(MIN_API_VERSION)).unwrap();
    assert_eq!(api.api_url(), "http://localhost:8080/api/25");
    assert!(api.set_api_version(Some(2)).unwrap_err().is_client_error());
    assert_eq!(api.api_version(), Some(25));
    api.set_api_version(None).unwrap();

    api.set_base_url("dhis.example.org").unwrap();
    assert_eq!(api.api_url(), "https://dhis.example.org/api");
    assert!(api.set_base_url("dhis.example.org/api").is_err());
    assert_eq!(api.base_url(), "https://dhis.example.org");
}

#[test]
fn test_api_display() {
    let api = Api::builder("play.dhis2.org/demo", "admin", "district")
        .api_version(29)
        .build()
        .unwrap();
    assert_eq!(
        api.to_string(),
        "DHIS2 Base URL: 'https://play.dhis2.org/demo'\n\
         API URL: 'https://play.dhis2.org/demo/api/29'\n\
         Username: 'admin'"
    );
    assert!(!format!("{api:?}").contains("district"));
}

#[test]
fn test_api_from_auth_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dish.json");
    std::fs::write(
        &path,
        r#"{"dhis": {"baseurl": "localhost:8080", "username": "admin", "password": "district"}}"#,
    )
    .unwrap();

    let api = Api::from_auth_file(Some(&path))
        .unwrap()
        .api_version(30)
        .build()
        .unwrap();
    assert_eq!(api.api_url(), "http://localhost:8080/api/30");
    assert_eq!(api.username(), "admin");

    let missing = dir.path().join("missing.json");
    assert!(Api::from_auth_file(Some(&missing)).unwrap_err().is_client_error());
}

// ============================================================================
// Verb Tests
// ============================================================================

#[tokio::test]
async fn test_get_appends_file_type_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dataElements.json"))
        .and(query_param("fields", "id,name"))
        .and(basic_auth("admin", "district"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dataElements": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let params = Params::new().with("fields", "id,name");
    let body = api.get_json("dataElements", Some(&params)).await.unwrap();
    assert_eq!(body, json!({"dataElements": []}));
}

#[tokio::test]
async fn test_get_as_other_file_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/29/organisationUnits.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id,name\n"))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::builder(server.uri(), "admin", "district")
        .api_version(29)
        .build()
        .unwrap();
    let response = api
        .get_as("organisationUnits", "CSV", None)
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "id,name\n");
}

#[tokio::test]
async fn test_writes_have_no_suffix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .and(query_param("importStrategy", "CREATE"))
        .and(body_json(json!({"dataElements": [{"id": "a"}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/dataElements/abc"))
        .and(body_json(json!({"name": "x"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/dataElements/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/dataElements/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let params = Params::new().with("importStrategy", "CREATE");
    api.post(
        "metadata",
        Some(json!({"dataElements": [{"id": "a"}]})),
        Some(&params),
    )
    .await
    .unwrap();
    api.put("dataElements/abc", Some(json!({"name": "x"})), None)
        .await
        .unwrap();
    api.patch("dataElements/abc", Some(json!({"name": "y"})), None)
        .await
        .unwrap();
    api.delete("dataElements/abc", None).await.unwrap();
}

#[tokio::test]
async fn test_non_success_maps_to_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dataElements/nope.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"not found\"}"))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api.get("dataElements/nope", None).await.unwrap_err();

    match err {
        Error::Request {
            code,
            url,
            description,
        } => {
            assert_eq!(code, 404);
            assert!(url.ends_with("/api/dataElements/nope.json"));
            assert_eq!(description, "{\"message\":\"not found\"}");
        }
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_happens_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    assert!(api.get(" ", None).await.unwrap_err().is_client_error());
    assert!(api
        .get_as("dataElements", "txt", None)
        .await
        .unwrap_err()
        .is_client_error());
    assert!(api
        .request(
            Method::POST,
            "metadata",
            RequestOptions::new().json(json!([1, 2]))
        )
        .await
        .unwrap_err()
        .is_client_error());
}

#[tokio::test]
async fn test_request_timeout_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/slow.json"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api
        .request(
            Method::GET,
            "slow",
            RequestOptions::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_unreadable_error_body_still_maps_to_request_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // Declared length is never delivered; the connection closes early
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
    });

    let api = Api::new(format!("127.0.0.1:{port}"), "admin", "district").unwrap();
    let err = api.get("dataElements", None).await.unwrap_err();
    match err {
        Error::Request {
            code, description, ..
        } => {
            assert_eq!(code, 500);
            assert_eq!(description, "");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_api_has_no_default_timeout() {
    let api = Api::new("play.dhis2.org/demo", "admin", "district").unwrap();
    assert_eq!(api.http().config().timeout, None);

    let api = Api::builder("play.dhis2.org/demo", "admin", "district")
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap();
    assert_eq!(api.http().config().timeout, Some(Duration::from_secs(120)));
}

#[tokio::test]
async fn test_user_agent_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me.json"))
        .and(header("user-agent", "my-script/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::builder(server.uri(), "admin", "district")
        .user_agent("my-script/1.0")
        .build()
        .unwrap();
    api.get("me", None).await.unwrap();
}

// ============================================================================
// Info Tests
// ============================================================================

#[tokio::test]
async fn test_info_is_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "2.30-SNAPSHOT",
            "revision": "abc123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    assert_eq!(api.version().await.unwrap(), "2.30-SNAPSHOT");
    assert_eq!(api.revision().await.unwrap(), "abc123");
    assert_eq!(api.version_int().await.unwrap(), Some(30));
    assert_eq!(api.info().await.unwrap()["revision"], "abc123");
}

#[tokio::test]
async fn test_info_missing_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    assert!(matches!(
        api.version().await.unwrap_err(),
        Error::Decode { .. }
    ));
}

// ============================================================================
// Paging Tests
// ============================================================================

#[tokio::test]
async fn test_get_paged_params_and_order() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits.json"))
            .and(query_param("page", page.to_string()))
            .and(query_param("pageSize", "2"))
            .and(query_param("totalPages", "true"))
            .and(query_param("fields", "id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pager": {"page": page, "pageCount": 2, "total": 3, "pageSize": 2},
                "organisationUnits": [{"id": format!("ou{page}")}],
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let api = api_for(&server).await;
    let pages: Vec<_> = api
        .get_paged(
            "organisationUnits",
            Some(Params::new().with("fields", "id")),
            PageSize::new(2).unwrap(),
        )
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1]["organisationUnits"][0]["id"], "ou2");
}

#[tokio::test]
async fn test_get_paged_rejects_paging_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api
        .get_paged_merged(
            "dataElements",
            Some(Params::from([("paging", "false")])),
            PageSize::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

// ============================================================================
// Partitioned POST Tests
// ============================================================================

#[tokio::test]
async fn test_post_partitioned_sends_chunks_in_order() {
    let server = MockServer::start().await;
    for chunk in [json!([1, 2, 3]), json!([4, 5, 6]), json!([7, 8])] {
        Mock::given(method("POST"))
            .and(path("/api/metadata"))
            .and(query_param("preheatCache", "false"))
            .and(body_json(json!({ "dataElements": chunk })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    let api = api_for(&server).await;
    let payload = json!({"dataElements": [1, 2, 3, 4, 5, 6, 7, 8]});
    let responses: Vec<_> = api
        .post_partitioned(
            "metadata",
            payload,
            Some(Params::new().with("preheatCache", "false")),
            Threshold::new(3).unwrap(),
        )
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(responses.len(), 3);

    let received = server.received_requests().await.unwrap();
    let bodies: Vec<serde_json::Value> = received
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec![
            json!({"dataElements": [1, 2, 3]}),
            json!({"dataElements": [4, 5, 6]}),
            json!({"dataElements": [7, 8]}),
        ]
    );
}

#[tokio::test]
async fn test_post_partitioned_fail_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"dataElements": [1, 2]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"dataElements": [3, 4]})))
        .respond_with(ResponseTemplate::new(413).set_body_string("Request Entity Too Large"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"dataElements": [5]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let mut responses = api
        .post_partitioned(
            "metadata",
            json!({"dataElements": [1, 2, 3, 4, 5]}),
            None,
            Threshold::new(2).unwrap(),
        )
        .unwrap();

    assert!(responses.try_next().await.unwrap().is_some());
    let err = responses.try_next().await.unwrap_err();
    assert_eq!(err.status(), Some(413));
    assert!(responses.try_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_partitioned_invalid_payload_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    for payload in [
        json!({}),
        json!({"a": [1], "b": [2]}),
        json!({"dataElements": []}),
        json!([1, 2]),
    ] {
        let err = api
            .post_partitioned("metadata", payload, None, Threshold::default())
            .err()
            .unwrap();
        assert!(err.is_client_error());
    }

    let err = api
        .post_partitioned("", json!({"a": [1]}), None, Threshold::default())
        .err()
        .unwrap();
    assert!(err.is_client_error());
}

// ============================================================================
// SQL View Tests
// ============================================================================

async fn mount_sqlview_type(server: &MockServer, uid: &str, view_type: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/sqlViews/{uid}.json")))
        .and(query_param("fields", "type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "type": view_type })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sqlview_query_with_vars() {
    let server = MockServer::start().await;
    mount_sqlview_type(&server, "dI68mLkP1wN", "QUERY").await;
    Mock::given(method("GET"))
        .and(path("/api/sqlViews/dI68mLkP1wN/data.csv"))
        .and(query_param("var", "valueType:INTEGER"))
        .and(query_param("var", "aggregationType:SUM"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "uid,name\nabc,ANC 1st visit\ndef,ANC 2nd visit\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let options = SqlViewOptions::new()
        .var("valueType", "INTEGER")
        .var("aggregationType", "SUM");
    let rows = api.get_sqlview_rows("dI68mLkP1wN", options).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["uid"], "abc");
    assert_eq!(rows[1]["name"], "ANC 2nd visit");
}

#[tokio::test]
async fn test_sqlview_query_execute_is_rejected() {
    let server = MockServer::start().await;
    mount_sqlview_type(&server, "dI68mLkP1wN", "QUERY").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let options = SqlViewOptions::new().var("a", "b").execute(true);
    let err = api.get_sqlview("dI68mLkP1wN", options).await.err().unwrap();
    assert!(err.is_client_error());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_sqlview_view_execute_then_read() {
    let server = MockServer::start().await;
    mount_sqlview_type(&server, "qMYMT0iUGkG", "MATERIALIZED_VIEW").await;
    Mock::given(method("POST"))
        .and(path("/api/sqlViews/qMYMT0iUGkG/execute"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sqlViews/qMYMT0iUGkG/data.csv"))
        .and(query_param("criteria", "level:2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ou;level\nImspTQPwCqd;2\n"))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let options = SqlViewOptions::new().criteria("level", "2").execute(true);
    let rows = api.get_sqlview_rows("qMYMT0iUGkG", options).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["ou"], "ImspTQPwCqd");

    let received = server.received_requests().await.unwrap();
    let order: Vec<(String, String)> = received
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("GET".to_string(), "/api/sqlViews/qMYMT0iUGkG.json".to_string()),
            ("POST".to_string(), "/api/sqlViews/qMYMT0iUGkG/execute".to_string()),
            ("GET".to_string(), "/api/sqlViews/qMYMT0iUGkG/data.csv".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_sqlview_execute_failure_skips_read() {
    let server = MockServer::start().await;
    mount_sqlview_type(&server, "qMYMT0iUGkG", "VIEW").await;
    Mock::given(method("POST"))
        .and(path("/api/sqlViews/qMYMT0iUGkG/execute"))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sqlViews/qMYMT0iUGkG/data.csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api
        .get_sqlview("qMYMT0iUGkG", SqlViewOptions::new().execute(true))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_sqlview_lazy_rows() {
    let server = MockServer::start().await;
    mount_sqlview_type(&server, "qMYMT0iUGkG", "VIEW").await;
    Mock::given(method("GET"))
        .and(path("/api/sqlViews/qMYMT0iUGkG/data.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n3,4\n"))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let mut rows = api
        .get_sqlview("qMYMT0iUGkG", SqlViewOptions::new())
        .await
        .unwrap();

    let first = rows.try_next().await.unwrap().unwrap();
    assert_eq!(first["a"], "1");
    let second = rows.try_next().await.unwrap().unwrap();
    assert_eq!(second["b"], "4");
    assert!(rows.try_next().await.unwrap().is_none());
    assert!(rows.is_released());
}
