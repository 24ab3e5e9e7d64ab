//! End-to-end behaviour of the `/contacts/` routes, driven in-process through the router.

use std::sync::Arc;

use api_rest::{router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use contacts_core::repositories::{FileContactRepository, InMemoryContactRepository};
use contacts_core::{ContactRepository, ContactSchema, NonEmptyText};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const KEY: &str = "test-key";

struct TestApp {
    app: Router,
    repository: Arc<dyn ContactRepository>,
}

impl TestApp {
    fn with_repository(repository: Arc<dyn ContactRepository>, api_key: Option<&str>) -> Self {
        let state = AppState::new(
            Arc::new(ContactSchema::builtin()),
            Arc::clone(&repository),
            api_key.map(|k| NonEmptyText::new(k).unwrap()),
        );
        Self {
            app: router(state),
            repository,
        }
    }

    fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryContactRepository::new()), Some(KEY))
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, name: &str, email: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/contacts/",
                Some(KEY),
                Some(json!({"name": name, "email": email})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    fn stored(&self) -> usize {
        self.repository.list().unwrap().len()
    }
}

#[tokio::test]
async fn test_authenticated_create_returns_201_with_id() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/contacts/",
            Some(KEY),
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "name": "Alice", "email": "a@x.com"}));
}

#[tokio::test]
async fn test_unauthenticated_create_is_401_and_stores_nothing() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/contacts/",
            None,
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["detail"],
        "Authentication credentials were not provided."
    );
    assert_eq!(app.stored(), 0);
}

#[tokio::test]
async fn test_wrong_key_is_403_and_stores_nothing() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            Method::POST,
            "/contacts/",
            Some("not-the-key"),
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.stored(), 0);
}

#[tokio::test]
async fn test_permission_check_runs_before_body_parsing() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/contacts/")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_writes_refused_when_server_has_no_key() {
    let app = TestApp::with_repository(Arc::new(InMemoryContactRepository::new()), None);
    let (status, _) = app
        .send(
            Method::POST,
            "/contacts/",
            Some(KEY),
            Some(json!({"name": "Alice", "email": "a@x.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::GET, "/contacts/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_anonymous_reads_succeed() {
    let app = TestApp::new();
    let created = app.create("Alice", "a@x.com").await;

    let (status, body) = app.send(Method::GET, "/contacts/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created.clone()]));

    let (status, body) = app.send(Method::GET, "/contacts/1/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, _) = app
        .send(Method::GET, "/contacts/1/", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_then_retrieve_round_trips() {
    let app = TestApp::new();
    let payload = json!({"name": "Bob", "email": "bob@example.org"});
    let (_, created) = app
        .send(Method::POST, "/contacts/", Some(KEY), Some(payload.clone()))
        .await;

    let id = created["id"].as_u64().unwrap();
    let (status, fetched) = app
        .send(Method::GET, &format!("/contacts/{id}/"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let mut expected = payload;
    expected["id"] = json!(id);
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn test_create_ignores_client_supplied_id_and_unknown_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/contacts/",
            Some(KEY),
            Some(json!({"id": 99, "name": "Alice", "email": "a@x.com", "age": 30})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "name": "Alice", "email": "a@x.com"}));
}

#[tokio::test]
async fn test_invalid_payload_is_400_with_field_errors() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/contacts/",
            Some(KEY),
            Some(json!({"email": "not-an-email"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "email": ["Enter a valid email address."],
            "name": ["This field is required."],
        })
    );
    assert_eq!(app.stored(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/contacts/")
                .header("x-api-key", KEY)
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("JSON parse error"));
}

#[tokio::test]
async fn test_non_object_payload_is_400() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, "/contacts/", Some(KEY), Some(json!(["Alice"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_retrieve_missing_or_malformed_id_is_404() {
    let app = TestApp::new();
    for uri in ["/contacts/1/", "/contacts/0/", "/contacts/abc/"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({"detail": "Not found."}));
    }
}

#[tokio::test]
async fn test_put_replaces_and_requires_all_fields() {
    let app = TestApp::new();
    app.create("Alice", "a@x.com").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/contacts/1/",
            Some(KEY),
            Some(json!({"name": "Alicia"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"email": ["This field is required."]}));

    let (status, body) = app
        .send(
            Method::PUT,
            "/contacts/1/",
            Some(KEY),
            Some(json!({"name": "Alicia", "email": "alicia@x.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": 1, "name": "Alicia", "email": "alicia@x.com"})
    );
}

#[tokio::test]
async fn test_patch_changes_only_submitted_fields() {
    let app = TestApp::new();
    app.create("Alice", "a@x.com").await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/contacts/1/",
            Some(KEY),
            Some(json!({"email": "alice@new.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": 1, "name": "Alice", "email": "alice@new.com"})
    );

    let (_, fetched) = app.send(Method::GET, "/contacts/1/", None, None).await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn test_update_of_missing_contact_is_404_even_with_bad_payload() {
    let app = TestApp::new();
    for method in [Method::PUT, Method::PATCH] {
        let (status, _) = app
            .send(
                method.clone(),
                "/contacts/5/",
                Some(KEY),
                Some(json!({"email": "broken"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn test_unauthenticated_mutations_leave_contact_untouched() {
    let app = TestApp::new();
    let created = app.create("Alice", "a@x.com").await;

    let attempts = [
        (Method::PUT, Some(json!({"name": "Eve", "email": "eve@x.com"}))),
        (Method::PATCH, Some(json!({"name": "Eve"}))),
        (Method::DELETE, None),
    ];
    for (method, body) in attempts {
        let (status, _) = app.send(method.clone(), "/contacts/1/", None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method}");
    }

    let (_, fetched) = app.send(Method::GET, "/contacts/1/", None, None).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_delete_is_204_then_404() {
    let app = TestApp::new();
    app.create("Alice", "a@x.com").await;

    let (status, body) = app
        .send(Method::DELETE, "/contacts/1/", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app
        .send(Method::DELETE, "/contacts/1/", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::GET, "/contacts/1/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_is_ordered_and_paginates_on_request() {
    let app = TestApp::new();
    for (name, email) in [("A", "a@x.com"), ("B", "b@x.com"), ("C", "c@x.com")] {
        app.create(name, email).await;
    }

    let (_, body) = app.send(Method::GET, "/contacts/", None, None).await;
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [1, 2, 3]);

    let (status, page) = app
        .send(Method::GET, "/contacts/?limit=1&offset=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 3);
    assert_eq!(
        page["results"],
        json!([{"id": 2, "name": "B", "email": "b@x.com"}])
    );

    let (status, body) = app
        .send(Method::GET, "/contacts/?limit=zero", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["limit"], json!(["A valid integer is required."]));
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let app = TestApp::new();
    let (status, _) = app
        .send(Method::DELETE, "/contacts/", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_file_store_persists_across_routers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let repo = Arc::new(FileContactRepository::open(temp_dir.path()).unwrap());
        let app = TestApp::with_repository(repo, Some(KEY));
        app.create("Alice", "a@x.com").await;
    }

    let repo = Arc::new(FileContactRepository::open(temp_dir.path()).unwrap());
    let app = TestApp::with_repository(repo, Some(KEY));
    let (status, body) = app.send(Method::GET, "/contacts/1/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "Alice", "email": "a@x.com"}));
}
