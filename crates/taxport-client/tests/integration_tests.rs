//! Integration tests for taxport-client.
//!
//! Uses wiremock to mock HTTP responses from a Specify server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use taxport_client::{Error, RequestMethod, Scope, SpecifySession};
use taxport_core::{Filter, Record, RecordExt, ResourceStore, record_from};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

/// Mount the login context handed out before authentication.
async fn mount_login_context(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/context/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=initial-token; Path=/")
                .set_body_json(json!({
                    "collections": { "KUFishvoucher": 4, "KUFishtissue": 5 }
                })),
        )
        .mount(server)
        .await;
}

/// Mount a successful login to collection 4 and its domain hierarchy.
async fn mount_login(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/context/login/"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("set-cookie", "csrftoken=session-token; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/context/user.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "sp7demofish",
            "resource_uri": "/api/specify/specifyuser/1/"
        })))
        .mount(server)
        .await;

    for (endpoint, body) in [
        (
            "/api/specify/collection/4/",
            json!({ "id": 4, "discipline": "/api/specify/discipline/3/" }),
        ),
        (
            "/api/specify/discipline/3/",
            json!({
                "id": 3,
                "division": "/api/specify/division/2/",
                "taxontreedef": "/api/specify/taxontreedef/1/"
            }),
        ),
        (
            "/api/specify/division/2/",
            json!({ "id": 2, "institution": "/api/specify/institution/1/" }),
        ),
    ] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

async fn logged_in(server: &MockServer) -> SpecifySession {
    mount_login_context(server).await;
    mount_login(server).await;
    let mut session = SpecifySession::connect(server.uri()).await.unwrap();
    session.login("sp7demofish", "sp7demofish", 4).await.unwrap();
    session
}

// =============================================================================
// REQUEST METHOD TESTS
// =============================================================================

#[test]
fn test_request_method_parse() {
    assert_eq!("GET".parse::<RequestMethod>().unwrap(), RequestMethod::Get);
    assert_eq!("post".parse::<RequestMethod>().unwrap(), RequestMethod::Post);
    assert_eq!(RequestMethod::Delete.to_string(), "DELETE");
}

#[test]
fn test_request_method_rejects_unknown() {
    match "PATCH".parse::<RequestMethod>() {
        Err(Error::InvalidMethod(m)) => assert_eq!(m, "PATCH"),
        other => panic!("Expected InvalidMethod, got: {:?}", other),
    }
}

// =============================================================================
// CONNECT / LOGIN TESTS
// =============================================================================

#[tokio::test]
async fn test_connect_reads_collections() {
    let server = MockServer::start().await;
    mount_login_context(&server).await;

    let session = SpecifySession::connect(server.uri()).await.unwrap();

    assert_eq!(session.collection_id("KUFishvoucher"), Some(4));
    assert_eq!(session.collection_id("Unknown"), None);
    assert_eq!(session.collections().len(), 2);
    assert!(session.specify_user().is_none());
}

#[tokio::test]
async fn test_connect_requires_csrf_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/context/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "collections": {} })))
        .mount(&server)
        .await;

    let result = SpecifySession::connect(server.uri()).await;

    assert!(matches!(result, Err(Error::MissingCsrfToken)));
}

#[tokio::test]
async fn test_login_resolves_hierarchy() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;

    assert_eq!(session.domain_id(Scope::Collection), Some(4));
    assert_eq!(session.domain_id(Scope::Discipline), Some(3));
    assert_eq!(session.domain_id(Scope::Division), Some(2));
    assert_eq!(session.domain_id(Scope::Institution), Some(1));
    assert_eq!(
        session.specify_user().unwrap().resource_uri().unwrap(),
        "/api/specify/specifyuser/1/"
    );
}

#[tokio::test]
async fn test_login_sends_credentials() {
    let server = MockServer::start().await;
    mount_login_context(&server).await;
    Mock::given(method("PUT"))
        .and(path("/context/login/"))
        .and(header("X-CSRFToken", "initial-token"))
        .and(body_json(json!({
            "username": "manager",
            "password": "wrong",
            "collection": 4
        })))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad password"))
        .mount(&server)
        .await;

    let mut session = SpecifySession::connect(server.uri()).await.unwrap();
    let result = session.login("manager", "wrong", 4).await;

    match result {
        Err(Error::InvalidCredentials(body)) => assert_eq!(body, "bad password"),
        other => panic!("Expected InvalidCredentials, got: {:?}", other),
    }
    assert!(session.specify_user().is_none());
}

#[tokio::test]
async fn test_login_bad_request() {
    let server = MockServer::start().await;
    mount_login_context(&server).await;
    Mock::given(method("PUT"))
        .and(path("/context/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("collection required"))
        .mount(&server)
        .await;

    let mut session = SpecifySession::connect(server.uri()).await.unwrap();
    let result = session.login("manager", "secret", 99).await;

    assert!(matches!(result, Err(Error::BadRequest(_))));
}

#[tokio::test]
async fn test_login_failed_hierarchy_leaves_session_logged_out() {
    let server = MockServer::start().await;
    mount_login_context(&server).await;
    Mock::given(method("PUT"))
        .and(path("/context/login/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/context/user.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "resource_uri": "/api/specify/specifyuser/1/"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/specify/collection/4/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut session = SpecifySession::connect(server.uri()).await.unwrap();
    let result = session.login("manager", "secret", 4).await;

    match result {
        Err(Error::UnexpectedStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("Expected UnexpectedStatus, got: {:?}", other),
    }
    assert!(session.specify_user().is_none());
    assert_eq!(session.domain_id(Scope::Collection), None);
    assert!(matches!(
        session.fetch_resource("taxon", 1).await,
        Err(Error::NotLoggedIn)
    ));
}

#[tokio::test]
async fn test_logout_forgets_user() {
    let server = MockServer::start().await;
    let mut session = logged_in(&server).await;

    session.logout().await.unwrap();

    assert!(session.specify_user().is_none());
    assert_eq!(session.domain_id(Scope::Collection), None);
    assert!(matches!(session.logout().await, Err(Error::NotLoggedIn)));
}

// =============================================================================
// RESOURCE TESTS
// =============================================================================

#[tokio::test]
async fn test_fetch_requires_login() {
    let server = MockServer::start().await;
    mount_login_context(&server).await;

    let session = SpecifySession::connect(server.uri()).await.unwrap();
    let result = session.fetch_resource("taxon", 1).await;

    assert!(matches!(result, Err(Error::NotLoggedIn)));
}

#[tokio::test]
async fn test_fetch_resource_sends_session_token() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/specify/taxon/5/"))
        .and(header("X-CSRFToken", "session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Felis",
            "resource_uri": "/api/specify/taxon/5/"
        })))
        .mount(&server)
        .await;

    let taxon = session.fetch_resource("Taxon", 5).await.unwrap();

    assert_eq!(taxon.id().unwrap(), 5);
    assert_eq!(taxon.str_field("name"), Some("Felis"));
}

#[tokio::test]
async fn test_fetch_resource_no_permission() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/specify/agent/9/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let result = session.fetch_resource("agent", 9).await;

    assert!(matches!(result, Err(Error::NoPermission(_))));
}

#[tokio::test]
async fn test_fetch_collection_passes_filter() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/specify/taxon/"))
        .and(query_param("name", "Felis catus"))
        .and(query_param("definitionitem", "7"))
        .and(query_param("parent__name", "Felidae"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": 11, "name": "Felis catus", "resource_uri": "/api/specify/taxon/11/" }
            ],
            "meta": { "limit": 20, "offset": 0, "total_count": 1 }
        })))
        .mount(&server)
        .await;

    let filter = Filter::new()
        .eq("name", "Felis catus")
        .eq("definitionitem", 7)
        .eq("parent__name", "Felidae");
    let taxa = session.fetch_collection("taxon", &filter).await.unwrap();

    assert_eq!(taxa.len(), 1);
    assert_eq!(taxa[0].id().unwrap(), 11);
}

#[tokio::test]
async fn test_create_resource() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/specify/recordset/"))
        .and(body_json(json!({ "name": "Imported Species", "dbtableid": 4 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 30,
            "name": "Imported Species",
            "dbtableid": 4,
            "resource_uri": "/api/specify/recordset/30/"
        })))
        .mount(&server)
        .await;

    let data = record_from(json!({ "name": "Imported Species", "dbtableid": 4 }));
    let created = session.create_resource("recordset", &data).await.unwrap();

    assert_eq!(created.resource_uri().unwrap(), "/api/specify/recordset/30/");
}

#[tokio::test]
async fn test_create_resource_unexpected_status() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/specify/taxon/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = session.create_resource("taxon", &Record::new()).await;

    match result {
        Err(Error::UnexpectedStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("Expected UnexpectedStatus, got: {:?}", other),
    }
}

async fn mount_taxon_for_update(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/specify/taxon/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "catus",
            "author": null,
            "version": 3,
            "resource_uri": "/api/specify/taxon/12/"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_update_resource_merges_current_record() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    mount_taxon_for_update(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/specify/taxon/12/"))
        .and(body_json(json!({
            "id": 12,
            "name": "catus",
            "author": "Linnaeus, 1758",
            "version": 3,
            "resource_uri": "/api/specify/taxon/12/"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "catus",
            "author": "Linnaeus, 1758",
            "version": 4,
            "resource_uri": "/api/specify/taxon/12/"
        })))
        .mount(&server)
        .await;

    let fields = record_from(json!({ "author": "Linnaeus, 1758" }));
    let updated = session.update_resource("taxon", 12, fields).await.unwrap();

    assert_eq!(updated.str_field("author"), Some("Linnaeus, 1758"));
    assert_eq!(updated.required_i64("version").unwrap(), 4);
}

#[tokio::test]
async fn test_update_resource_version_conflict() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    mount_taxon_for_update(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/specify/taxon/12/"))
        .respond_with(ResponseTemplate::new(409).set_body_string("stale"))
        .mount(&server)
        .await;

    let result = session.update_resource("taxon", 12, Record::new()).await;

    assert!(matches!(result, Err(Error::VersionMismatch(_))));
}

#[tokio::test]
async fn test_update_resource_missing_version() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    mount_taxon_for_update(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/specify/taxon/12/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("version required"))
        .mount(&server)
        .await;

    let result = session.update_resource("taxon", 12, Record::new()).await;

    assert!(matches!(result, Err(Error::MissingVersion(_))));
}

// =============================================================================
// RESOURCESTORE TESTS
// =============================================================================

#[tokio::test]
async fn test_store_wraps_session_errors() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/specify/taxon/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = ResourceStore::fetch_collection(&session, "taxon", &Filter::new()).await;

    match result {
        Err(taxport_core::Error::Store(inner)) => {
            assert!(inner.to_string().starts_with("No permission"));
        }
        other => panic!("Expected Store error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_send_request_raw() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/specify/recordset/30/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resp = session
        .send_request(RequestMethod::Delete, "/api/specify/recordset/30/", None)
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn test_connection_refused() {
    let result = SpecifySession::connect("http://127.0.0.1:1").await;

    match result {
        Err(Error::Http(_)) => {}
        other => panic!("Expected Http error, got: {:?}", other),
    }
}
