//! Mock structured (PostgREST-style) backend
//!
//! - GET  /rest/v1/{table}      - table selects
//! - POST /rest/v1/rpc/{name}   - RPC calls

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_PRIMARY_API_KEY: &str = "test-primary-key";

pub struct MockPrimaryServer {
    server: MockServer,
}

impl MockPrimaryServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    pub async fn mock_table(&self, table: &str, rows: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", table)))
            .and(header("apikey", TEST_PRIMARY_API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_rpc(&self, function: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/rest/v1/rpc/{}", function)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Every request fails as if the project were paused
    pub async fn mock_unavailable(&self) {
        Mock::given(path_regex(r"^/rest/v1/.*"))
            .respond_with(ResponseTemplate::new(503).set_body_string("project paused"))
            .mount(&self.server)
            .await;
    }

    /// Products, categories and banners tables
    pub async fn mock_catalog_tables(&self) {
        self.mock_table(
            "products",
            json!([
                {
                    "id": "P001",
                    "name": "Açaí 500ml (primary)",
                    "price": 19.0,
                    "stock": 4,
                    "category_name": "Açaí",
                    "active": true
                }
            ]),
        )
        .await;
        self.mock_table("categories", json!([{ "id": "C1", "name": "Açaí", "sort_order": 1 }]))
            .await;
        self.mock_table("banners", json!([])).await;
    }
}
