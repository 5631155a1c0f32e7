#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use quill_api::auth::{AppState, AppStateInner, Authenticator};
use quill_api::password::hash_password;
use quill_db::Database;
use quill_types::{NoteId, UserId};

pub const SECRET: &str = "integration-test-secret";

pub const INITIAL_NOTES: [(&str, bool); 6] = [
    ("HTML is easy", false),
    ("Browser can execute only JavaScript", true),
    ("GET and POST are the most important methods of HTTP protocol", true),
    ("CSS selectors are specific", false),
    ("The borrow checker is your friend", true),
    ("Tokens expire after an hour", false),
];

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub user_id: UserId,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub www_authenticate: Option<String>,
    pub body: Value,
}

/// Fresh in-memory store with "testuser" and the initial notes.
pub fn setup() -> TestApp {
    let db = Database::open_in_memory().unwrap();
    let user_id = add_user(&db, "testuser", "Test User", "testpassword");

    for (content, important) in INITIAL_NOTES {
        db.insert_note(&NoteId::new().to_string(), content, important, &user_id.to_string())
            .unwrap()
            .unwrap();
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: Authenticator::new(SECRET, Duration::hours(1)),
    });
    let router = quill_api::router(state.clone());

    TestApp {
        state,
        router,
        user_id,
    }
}

pub fn add_user(db: &Database, username: &str, name: &str, password: &str) -> UserId {
    let id = UserId::new();
    let hash = hash_password(password).unwrap();
    assert!(db.create_user(&id.to_string(), username, name, &hash).unwrap());
    id
}

impl TestApp {
    pub fn note_count(&self) -> usize {
        self.state.db.count_notes().unwrap()
    }

    pub fn contents(&self) -> Vec<String> {
        self.state
            .db
            .list_notes()
            .unwrap()
            .into_iter()
            .map(|n| n.content)
            .collect()
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();

        let status = response.status();
        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let content_type = header_text(header::CONTENT_TYPE);
        let www_authenticate = header_text(header::WWW_AUTHENTICATE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            content_type,
            www_authenticate,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(req.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut req = Request::delete(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["token"].as_str().unwrap().to_string()
    }
}
