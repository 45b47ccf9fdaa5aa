//! HTTP API tests against a server bound to an ephemeral port

mod common;

use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use case_rag::server::{router, AppState};

use common::{acme_case, fake_engine, temp_config};

struct TestServer {
    base: String,
    client: Client,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let config = temp_config(&dir);
        let state = AppState::new(config.clone(), fake_engine(&config)).unwrap();
        let app = router(state, &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn ask(&self, question: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/api/ask"))
            .json(&json!({ "question": question }))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn upload(&self, filename: &str, data: Vec<u8>) -> (StatusCode, Value) {
        let part = multipart::Part::bytes(data).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn health_and_readiness_before_upload() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let resp = server.client.get(server.url("/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = server.client.get(server.url("/api/document")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn asking_before_upload_is_not_indexed() {
    let server = TestServer::start().await;

    let (status, body) = server.ask("What was Q3 revenue growth?").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "not_indexed");
}

#[tokio::test]
async fn blank_question_is_a_warning() {
    let server = TestServer::start().await;

    let (status, body) = server.ask("   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "warning");
    assert_eq!(body["error"]["message"], "Please enter a question.");
}

#[tokio::test]
async fn non_pdf_upload_is_unsupported() {
    let server = TestServer::start().await;

    let (status, body) = server.upload("notes.docx", b"PK\x03\x04".to_vec()).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["type"], "unsupported_type");
}

#[tokio::test]
async fn corrupt_pdf_upload_is_load_error() {
    let server = TestServer::start().await;

    let (status, body) = server.upload("broken.pdf", b"%PDF-1.4 garbage".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "load_error");

    let resp = server.client.get(server.url("/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn upload_then_ask() {
    let server = TestServer::start().await;

    let (status, body) = server.upload("Acme Case.pdf", acme_case()).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["pages"], 3);
    assert!(body["chunks"].as_u64().unwrap() >= 1);

    let resp = server.client.get(server.url("/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, body) = server.ask("By how much did revenue grow in Q3?").await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert!(body["answer"].as_str().unwrap().contains("12%"));
    assert!(!body["sources"].as_array().unwrap().is_empty());

    let resp = server.client.get(server.url("/api/document")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["document"]["total_pages"], 3);
}

#[tokio::test]
async fn info_describes_providers() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/api/info")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let info: Value = resp.json().await.unwrap();
    assert_eq!(info["name"], "case-rag");
    assert_eq!(info["embeddings"]["model"], "bag-of-words-v1");
    assert_eq!(info["retrieval"]["top_k"], 4);
}
