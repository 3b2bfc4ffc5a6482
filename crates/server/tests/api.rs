use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tally_server::{router, AppState, ServerConfig};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "tally-test-boundary";

struct TestApp {
    dir: TempDir,
    app: Router,
}

impl TestApp {
    async fn spawn() -> Self {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig {
            database_path: dir.path().join("tally.db"),
            upload_dir: dir.path().join("tmp"),
            ..ServerConfig::default()
        };
        let state = AppState::build(&config).await.unwrap();
        let app = router(state, config.max_upload_bytes);
        Self { dir, app }
    }

    fn upload_dir_entries(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("tmp")).unwrap().count()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn import(&self, field: &str, csv: &str) -> (StatusCode, Value) {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"statement.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        self.send(
            Request::post("/transactions/import")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn import_creates_transactions_and_cleans_up() {
    let app = TestApp::spawn().await;
    let csv = "title,type,value,category\n\
               Groceries,outcome,150.00,Food\n\
               Salary,income,3000.00,\n";

    let (status, body) = app.import("file", csv).await;

    assert_eq!(status, StatusCode::CREATED);
    let created = body.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["title"], "Groceries");
    assert_eq!(created[0]["type"], "outcome");
    assert_eq!(created[0]["category"]["title"], "Food");
    assert!(created[1]["category"].is_null());
    assert_eq!(app.upload_dir_entries(), 0);

    let (_, categories) = app.get("/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 1);

    let (_, listing) = app.get("/transactions").await;
    assert_eq!(listing["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(listing["balance"]["total"], "2850.00");
}

#[tokio::test]
async fn import_twice_reuses_categories() {
    let app = TestApp::spawn().await;
    let csv = "title,type,value,category\nLunch,outcome,12.00,Food\nDinner,outcome,30.00,Food\n";

    let (_, first) = app.import("file", csv).await;
    let (_, second) = app.import("file", csv).await;

    assert_eq!(first[0]["category"], second[1]["category"]);
    let (_, categories) = app.get("/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn import_skips_unparseable_rows() {
    let app = TestApp::spawn().await;
    let csv = "title,type,value,category\n\
               Groceries,outcome,150.00,Food\n\
               Refund,outcome,-5.00,Food\n\
               Gift,present,10.00,Misc\n";

    let (status, body) = app.import("file", csv).await;

    assert_eq!(status, StatusCode::CREATED);
    let created = body.as_array().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["title"], "Groceries");
    assert_eq!(app.upload_dir_entries(), 0);

    let (_, categories) = app.get("/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn import_without_file_field_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, _) = app.import("attachment", "title,type,value,category\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_and_delete_transaction() {
    let app = TestApp::spawn().await;

    let (status, income) = app
        .post_json(
            "/transactions",
            json!({ "title": "Salary", "type": "income", "value": 100, "category": "Work" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(income["category"]["title"], "Work");

    let (status, body) = app
        .post_json(
            "/transactions",
            json!({ "title": "TV", "type": "outcome", "value": 250 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds available balance"));

    let id = income["id"].as_i64().unwrap();
    let delete = |id: i64| {
        Request::delete(format!("/transactions/{id}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = app.send(delete(id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(delete(id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_outcomes_cannot_overdraw() {
    let app = Arc::new(TestApp::spawn().await);
    let (status, _) = app
        .post_json(
            "/transactions",
            json!({ "title": "Salary", "type": "income", "value": 100 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let (status, _) = app
                    .post_json(
                        "/transactions",
                        json!({ "title": format!("Spend {i}"), "type": "outcome", "value": 100 }),
                    )
                    .await;
                status
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => accepted += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(accepted, 1);

    let (_, listing) = app.get("/transactions").await;
    assert_eq!(listing["balance"]["outcome"], "100.00");
    assert_eq!(listing["balance"]["total"], "0.00");
}
