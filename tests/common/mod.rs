#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use fluentpath::{clock::ManualClock, db::Db, models::Careers, router, AppConfig, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const CAREER: &str = "business-english";

/// One career, three modules. "Meetings" requires "Foundations"; "Coming soon"
/// has no lessons; the third Foundations lesson is a draft.
pub const FIXTURE: &str = r#"
[
  {
    "slug": "business-english",
    "title": "Business English",
    "description": "English for the workplace",
    "modules": [
      {
        "title": "Foundations",
        "order_index": 1,
        "lessons": [
          {
            "title": "Greetings",
            "position": 1,
            "duration_minutes": 10,
            "content": "Hello and welcome.",
            "assets": [
              { "media_type": "audio", "url": "https://cdn.example.com/greetings.mp3", "size_bytes": 48000, "duration_seconds": 30 }
            ]
          },
          { "title": "Small talk", "position": 2, "duration_minutes": 15, "content": "The weather is lovely." },
          { "title": "Draft lesson", "position": 3, "is_published": false, "content": "Not ready." }
        ],
        "assessments": [
          {
            "title": "Foundations check",
            "questions": [
              { "prompt": "Past tense of go?", "options": ["go", "went", "gone"], "correct_answer": "went" },
              { "prompt": "Translate: llevo dos años trabajando aquí", "kind": "text", "correct_answer": "I have been working here for two years" },
              { "prompt": "Pick b", "options": ["a", "b"], "correct_answer": "b" },
              { "prompt": "We meet ___ Monday", "options": ["in", "on", "at"], "correct_answer": "on" }
            ]
          }
        ]
      },
      {
        "title": "Meetings",
        "order_index": 2,
        "prerequisites": ["Foundations"],
        "lessons": [
          { "title": "Opening a meeting", "position": 1, "duration_minutes": 20, "content": "Let's get started." }
        ],
        "assessments": [
          {
            "title": "Meetings quiz",
            "passing_score": 80,
            "questions": [
              { "prompt": "Formal opener?", "options": ["Hey", "Good morning, everyone"], "correct_answer": "Good morning, everyone" }
            ]
          }
        ]
      },
      { "title": "Coming soon", "order_index": 3 }
    ]
  }
]
"#;

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("fluentpath_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite:{}", path.display());
    Db::new(&url).await.expect("failed to create test database")
}

pub async fn seed(db: &Db) {
    let careers: Careers = serde_json::from_str(FIXTURE).expect("fixture should parse");
    for career in careers {
        db.load_career(career).await.expect("fixture should import");
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub db: Db,
    pub clock: ManualClock,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn test_app() -> TestApp {
    test_app_with(AppConfig::default()).await
}

pub async fn test_app_with(config: AppConfig) -> TestApp {
    let db = create_test_db().await;
    seed(&db).await;
    let clock = ManualClock::new(start_time());
    let state = AppState::new(db.clone(), config, Arc::new(clock.clone()));
    TestApp {
        router: router(state),
        db,
        clock,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(req.body(body).expect("request build should succeed"))
            .await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::GET, uri, Some(token), None).await
    }

    /// Register a user and return its session token.
    pub async fn register(&self, email: &str) -> String {
        let resp = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "correct horse",
                    "display_name": "Student",
                })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "register failed: {}", resp.body);
        resp.body["token"]
            .as_str()
            .expect("token in body")
            .to_string()
    }

    /// Module listing of the fixture career.
    pub async fn modules(&self, token: &str) -> Vec<Value> {
        let resp = self
            .get(&format!("/api/careers/{CAREER}/modules"), token)
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.body.as_array().expect("array of modules").clone()
    }

    /// Id of a module of the fixture career by title.
    pub async fn module_id(&self, token: &str, title: &str) -> i64 {
        self.modules(token)
            .await
            .iter()
            .find(|m| m["title"] == title)
            .and_then(|m| m["id"].as_i64())
            .unwrap_or_else(|| panic!("no module titled {title}"))
    }

    /// Published lesson ids of a module, in order.
    pub async fn lesson_ids(&self, token: &str, module_id: i64) -> Vec<i64> {
        let resp = self
            .get(&format!("/api/careers/{CAREER}/modules/{module_id}"), token)
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.body["lessons"]
            .as_array()
            .expect("lessons")
            .iter()
            .map(|l| l["id"].as_i64().expect("lesson id"))
            .collect()
    }

    pub async fn complete(&self, token: &str, module_id: i64, lesson_id: i64) -> TestResponse {
        self.call(
            Method::POST,
            &format!("/api/careers/{CAREER}/modules/{module_id}/lessons/{lesson_id}/complete"),
            Some(token),
            Some(serde_json::json!({ "time_spent_seconds": 120 })),
        )
        .await
    }
}
