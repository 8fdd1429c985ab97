//! Mock legacy action endpoint
//!
//! One URL, operation picked by the `action` query parameter:
//! - GET  ?action=getCatalogData
//! - GET  ?action=validateCoupon&codigo=..&subtotal=..
//! - GET  ?action=getProductWithAdditions&productId=..
//! - GET  ?action=validateReferralCode&codigo=..
//! - POST ?action=calculateDelivery

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Path the legacy endpoint is mounted at
pub const EXEC_PATH: &str = "/macros/exec";

pub struct MockLegacyServer {
    server: MockServer,
}

impl MockLegacyServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as `LEGACY_API_URL`
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), EXEC_PATH)
    }

    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for one action
    pub async fn calls_for(&self, action: &str) -> usize {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.url.query_pairs().any(|(k, v)| k == "action" && v == action))
            .count()
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }

    // =========================================================================
    // getCatalogData
    // =========================================================================

    pub async fn mock_catalog(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "getCatalogData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Catalog answered only `times` times; later calls fall through
    pub async fn mock_catalog_times(&self, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "getCatalogData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_catalog_delayed(&self, body: Value, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "getCatalogData"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_catalog_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "getCatalogData"))
            .respond_with(ResponseTemplate::new(status).set_body_string("cold start"))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn mock_coupon(&self, code: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "validateCoupon"))
            .and(query_param("codigo", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_additions(&self, product_id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "getProductWithAdditions"))
            .and(query_param("productId", product_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_referral(&self, code: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "validateReferralCode"))
            .and(query_param("codigo", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delivery(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path(EXEC_PATH))
            .and(query_param("action", "calculateDelivery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}

/// Canned legacy payloads
pub struct LegacyTestData;

impl LegacyTestData {
    pub fn catalog() -> Value {
        json!({
            "success": true,
            "produtos": [
                {
                    "ID_Produto": "P001",
                    "Nome_Produto": "Açaí 500ml",
                    "Preco_Venda": "18,50",
                    "Estoque_Atual": 12,
                    "Categoria": "Açaí",
                    "Ativo": "SIM",
                    "Tem_Adicionais": "SIM"
                },
                {
                    "ID_Produto": "P002",
                    "Nome_Produto": "Suco de Laranja",
                    "Preco_Venda": 7.0,
                    "Estoque_Atual": 0,
                    "Categoria": "Bebidas",
                    "Ativo": "SIM"
                }
            ],
            "categorias": [
                { "ID_Categoria": "C2", "Nome_Categoria": "Bebidas", "Ordem": 2 },
                { "ID_Categoria": "C1", "Nome_Categoria": "Açaí", "Ordem": 1 }
            ],
            "banners": [
                { "ID_Banner": "B1", "Titulo": "Promo", "Ativo": true, "Ordem": 1 }
            ]
        })
    }

    /// Catalog with a single renamed product, to tell refreshes apart
    pub fn catalog_v2() -> Value {
        json!({
            "success": true,
            "produtos": [
                { "ID_Produto": "P001", "Nome_Produto": "Açaí 700ml", "Preco_Venda": 24 }
            ]
        })
    }

    pub fn coupon_valid(code: &str) -> Value {
        json!({
            "success": true,
            "valido": true,
            "cupom": {
                "Codigo": code,
                "Tipo_Desconto": "percentual",
                "Valor_Desconto": 10,
                "Valor_Minimo": "30,00"
            },
            "mensagem": "Cupom aplicado"
        })
    }

    pub fn coupon_invalid() -> Value {
        json!({ "success": true, "valido": false, "mensagem": "Cupom inválido ou expirado" })
    }

    pub fn additions(product_id: &str) -> Value {
        json!({
            "success": true,
            "produto": { "ID_Produto": product_id, "Nome_Produto": "Açaí 500ml", "Preco_Venda": 18.5 },
            "adicionais": [{
                "ID_Grupo": "G1",
                "Nome_Grupo": "Frutas",
                "Obrigatorio": "SIM",
                "Max_Selecao": 3,
                "Opcoes": [
                    { "ID_Opcao": "O1", "Nome_Opcao": "Banana", "Preco_Adicional": "2,00" },
                    { "ID_Opcao": "O2", "Nome_Opcao": "Morango", "Preco_Adicional": 3, "Disponivel": "NAO" }
                ]
            }]
        })
    }

    pub fn product_missing() -> Value {
        json!({ "success": true, "produto": null, "mensagem": "Produto não encontrado" })
    }

    pub fn referral_valid() -> Value {
        json!({ "success": true, "valido": true, "indicador": "Ana", "desconto_percentual": 5 })
    }

    pub fn delivery(fee: f64) -> Value {
        json!({ "success": true, "taxa": fee, "prazo_minutos": 40, "disponivel": true })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "success": false, "error": message })
    }
}
