//! Integration tests for the plane spotter service.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use reqwest::{redirect, Client};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::enroll_credential;
use crate::badges::BadgeCatalog;
use crate::config::{Config, FlightApiConfig, LogFormat};
use crate::db::{init_database, Repository};
use crate::flights::testing::StaticSource;
use crate::flights::{FlightFetcher, DEMO_BOX};
use crate::models::EnrollRequest;
use crate::{create_router, AppState};

const TEST_COST: u32 = 4;

const VIEWER: (&str, &str) = ("alice", "alice-password");
const ADMIN: (&str, &str) = ("root", "root-password");

fn test_config(temp_dir: &TempDir, local_mode: bool) -> Config {
    Config {
        db_path: temp_dir.path().join("test.sqlite"),
        static_dir: temp_dir.path().join("static"),
        badge_dir: temp_dir.path().join("static/badges"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
        local_mode,
        flight_api: FlightApiConfig::default(),
        admin_seed: None,
        bcrypt_cost: TEST_COST,
    }
}

async fn enroll(repo: &Repository, realm: &str, (username, password): (&str, &str)) {
    let request = EnrollRequest {
        realm: realm.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    };
    enroll_credential(repo, &request, TEST_COST)
        .await
        .expect("Failed to enroll");
}

/// Build application state over a temp database and a canned flight source.
async fn test_state(temp_dir: &TempDir, source: Arc<StaticSource>, local_mode: bool) -> AppState {
    let config = test_config(temp_dir, local_mode);
    let pool = init_database(&config.db_path).await.expect("Failed to init DB");
    let repo = Arc::new(Repository::new(pool));

    enroll(&repo, "survey", VIEWER).await;
    enroll(&repo, "admin", ADMIN).await;

    AppState {
        repo,
        fetcher: FlightFetcher::new(source),
        catalog: Arc::new(BadgeCatalog::builtin()),
        config: Arc::new(config),
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    source: Arc<StaticSource>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_options(StaticSource::default(), false).await
    }

    async fn with_options(source: StaticSource, local_mode: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = Arc::new(source);
        let state = test_state(&temp_dir, source.clone(), local_mode).await;

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        TestFixture {
            client,
            base_url,
            source,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, (username, password): (&str, &str)) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .basic_auth(username, Some(password))
    }

    fn post(&self, path: &str, (username, password): (&str, &str)) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .basic_auth(username, Some(password))
    }
}

fn detail(model: Option<&str>, airline: &str) -> Value {
    json!({
        "aircraft": {
            "model": {"text": model},
            "images": {"medium": [{"src": "https://img.example/medium.jpg"}]}
        },
        "airline": {"name": airline},
        "airport": {
            "origin": {"name": "Zurich Airport"},
            "destination": {"name": "Frankfurt Airport"}
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_root_greeting() {
    let temp_dir = TempDir::new().unwrap();
    let state = test_state(&temp_dir, Arc::new(StaticSource::default()), false).await;

    let response = create_router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Hello, world!");
}

#[tokio::test]
async fn test_missing_credentials_challenge() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/survey"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers()["www-authenticate"],
        "Basic realm=\"survey\", charset=\"UTF-8\""
    );

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_wrong_password_and_wrong_realm_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .get("/survey/api/badges", ("alice", "not-her-password"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // survey credentials do not open the admin console
    let resp = fixture.get("/admin", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers()["www-authenticate"],
        "Basic realm=\"admin\", charset=\"UTF-8\""
    );
}

#[tokio::test]
async fn test_survey_index_lists_nearest_first() {
    let source = StaticSource::default()
        .with_flight("far", 30000.0, 48.0, 9.1, detail(Some("Airbus A320"), "Swiss"))
        .with_flight(
            "near",
            1500.0,
            47.61,
            9.1,
            detail(Some("Eurocopter EC135"), "DRF Luftrettung Ambulanz"),
        )
        .with_flight("nameless", 5000.0, 47.6, 9.1, detail(None, "Swiss"));
    let fixture = TestFixture::with_options(source, false).await;

    let resp = fixture.get("/survey", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();

    let near = html.find("data-flight-id=\"near\"").expect("near flight listed");
    let far = html.find("data-flight-id=\"far\"").expect("far flight listed");
    assert!(near < far);
    assert!(!html.contains("data-flight-id=\"nameless\""));
    assert!(html.contains("action=\"/survey/badges/rescue-helicopter\""));
    assert!(html.contains("Zurich Airport"));
    assert!(!html.contains("add_user"));

    // no coordinates given, so the demo region is queried
    let bounds = fixture.source.requested_bounds.lock().unwrap().clone();
    assert_eq!(bounds, vec![DEMO_BOX.to_bounds()]);
}

#[tokio::test]
async fn test_flight_api_uses_viewer_position() {
    let source = StaticSource::default().with_flight(
        "jumbo",
        35000.0,
        47.6,
        8.5,
        detail(Some("Boeing 777-300ER"), "Swiss"),
    );
    let fixture = TestFixture::with_options(source, false).await;

    let resp = fixture
        .get("/survey/api/flights?lat=47.5&lon=8.5", VIEWER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let flights = body["data"].as_array().unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["badge"], "jumbo-plane");
    assert_eq!(flights[0]["altitude"], 10668);
    assert_eq!(flights[0]["distance"], 0.1);

    let bounds = fixture.source.requested_bounds.lock().unwrap().clone();
    assert_eq!(bounds, vec!["47.75,47.25,8.25,8.75".to_string()]);
}

#[tokio::test]
async fn test_badge_award_is_idempotent() {
    let fixture = TestFixture::new().await;

    for _ in 0..2 {
        let resp = fixture
            .post("/survey/api/badges/glider", VIEWER)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = fixture.get("/survey/api/badges", VIEWER).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["badges"], json!(["glider"]));
}

#[tokio::test]
async fn test_unknown_badge_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post("/survey/api/badges/concorde", VIEWER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .post("/survey/badges/concorde", VIEWER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(resp.text().await.unwrap().contains("<title>404 Not Found</title>"));
}

#[tokio::test]
async fn test_collect_badge_redirects_to_page() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post("/survey/badges/zeppelin", VIEWER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["location"], "/survey");

    let resp = fixture.get("/survey/api/badges", VIEWER).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["badges"], json!(["zeppelin"]));
}

#[tokio::test]
async fn test_admin_enrolls_user() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get("/admin/add_user", ADMIN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("action=\"/admin/POST_USER\""));

    let form = [
        ("realm", "survey"),
        ("username", "bob"),
        ("password", "bob-password"),
    ];
    let resp = fixture
        .post("/admin/POST_USER", ADMIN)
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["location"], "/admin");

    // the new user can sign in to the viewer
    let resp = fixture
        .get("/survey/api/badges", ("bob", "bob-password"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // and shows up in the admin listing
    let resp = fixture.get("/admin", ADMIN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("<td>bob</td>"));
    assert!(!html.contains("bob-password"));
}

#[tokio::test]
async fn test_admin_duplicate_username_conflict() {
    let fixture = TestFixture::new().await;

    // alice already exists in the survey realm
    let form = [
        ("realm", "admin"),
        ("username", "alice"),
        ("password", "another-password"),
    ];
    let resp = fixture
        .post("/admin/POST_USER", ADMIN)
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("Username already is taken!"));

    // the first password still works
    let resp = fixture.get("/survey/api/badges", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_admin_routes_absent_from_survey() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get("/survey/add_user", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .post("/survey/POST_USER", VIEWER)
        .form(&[("realm", "survey"), ("username", "eve"), ("password", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_upload_and_download_in_local_mode() {
    let fixture = TestFixture::with_options(StaticSource::default(), true).await;

    let resp = fixture.get("/admin/upload", ADMIN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("name=\"starting_data\""));

    let records = json!([
        {"identification": {"id": "2f1c"}, "aircraft": {"model": {"text": "Airbus A320"}}},
        {"aircraft": {"model": {"text": "Zeppelin NT"}}}
    ]);
    let part = reqwest::multipart::Part::bytes(serde_json::to_vec(&records).unwrap())
        .file_name("data.json")
        .mime_str("application/json")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("starting_data", part);

    let resp = fixture
        .post("/admin/upload_file", ADMIN)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("Stored 2 flight records"));

    let resp = fixture.get("/admin/download", ADMIN).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"data.json\""
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, records);
}

#[tokio::test]
async fn test_uploaded_batch_can_be_discarded() {
    let fixture = TestFixture::with_options(StaticSource::default(), true).await;

    let form = reqwest::multipart::Form::new().text(
        "starting_data",
        r#"[{"aircraft": {"model": {"text": "Airbus A320"}}}]"#,
    );
    let resp = fixture
        .post("/survey/upload_file", VIEWER)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let html = resp.text().await.unwrap();
    let start = html.find("/survey/upload/").expect("undo form present");
    let end = html[start..].find("/delete").unwrap() + start;
    let undo_path = format!("{}/delete", &html[start..end]);

    let resp = fixture.post(&undo_path, VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("Removed 1 flight records"));

    let resp = fixture.get("/survey/download", VIEWER).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));

    // a second undo finds nothing left
    let resp = fixture.post(&undo_path, VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_upload_rejects_malformed_json() {
    let fixture = TestFixture::with_options(StaticSource::default(), true).await;

    let form = reqwest::multipart::Form::new().text("starting_data", "{not json");
    let resp = fixture
        .post("/survey/upload_file", VIEWER)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_upload_and_download_disabled_outside_local_mode() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get("/survey/download", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture.get("/survey/upload", VIEWER).send().await.unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["location"], "/survey");

    let form = reqwest::multipart::Form::new().text("starting_data", "[]");
    let resp = fixture
        .post("/survey/upload_file", VIEWER)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
