use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use orderdesk_cache::MemoryCache;
use orderdesk_common::{Currency, CurrencyPair, OrderId};
use orderdesk_fx::MockRateClient;
use orderdesk_server::{build_state, router, ServerConfig};
use orderdesk_store::Repositories;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    repos: Repositories,
    rates: Arc<MockRateClient>,
}

impl TestApp {
    fn new() -> Self {
        let repos = Repositories::in_memory();
        let rates = Arc::new(
            MockRateClient::new()
                .with_rate(CurrencyPair::new(Currency::Brl, Currency::Usd), dec!(0.2))
                .with_rate(CurrencyPair::new(Currency::Usd, Currency::Brl), dec!(5)),
        );
        let state = build_state(
            &ServerConfig::default(),
            repos.clone(),
            Arc::new(MemoryCache::new()),
            rates.clone(),
        );

        Self {
            router: router(state),
            repos,
            rates,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn register(&self, email: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/users",
                None,
                Some(json!({"name": "Cliente", "email": email, "password": "senha123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": email, "password": "senha123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["token_type"], "Bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn session(&self, email: &str) -> (i64, String) {
        let id = self.register(email).await;
        (id, self.login(email).await)
    }

    async fn create_order(&self, token: &str, value: Value, currency: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/orders",
                Some(token),
                Some(json!({"description": "Pedido", "value": value, "currency": currency})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn show_converts_brl_to_usd() {
    let app = TestApp::new();
    let (user_id, token) = app.session("conv@example.com").await;

    let id = app.create_order(&token, json!(150.50), "BRL").await;
    let (status, body) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["value"], "150.50");
    assert_eq!(body["currency"], "BRL");

    let conversion = &body["converted_value"];
    assert_eq!(conversion["from_currency"], "BRL");
    assert_eq!(conversion["to_currency"], "USD");
    assert_eq!(conversion["original_amount"], 150.5);
    assert_eq!(conversion["converted_amount"], 30.1);
    assert_eq!(conversion["rate_used"], 0.2);
    assert!(conversion.get("error").is_none());
}

#[tokio::test]
async fn repeated_show_fetches_rate_once() {
    let app = TestApp::new();
    let (_, token) = app.session("once@example.com").await;
    let first = app.create_order(&token, json!(10), "USD").await;
    let second = app.create_order(&token, json!(20), "USD").await;

    for id in [first, second, first] {
        let (status, _) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.rates.calls(), 1);
}

#[tokio::test]
async fn show_degrades_when_rates_unavailable() {
    let app = TestApp::new();
    let (_, token) = app.session("down@example.com").await;
    let id = app.create_order(&token, json!("99.90"), "BRL").await;
    app.rates.set_failing(true);

    let (status, body) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    let conversion = &body["converted_value"];
    assert_eq!(conversion["rate_used"], 1.0);
    assert_eq!(conversion["converted_amount"], 99.9);
    assert_eq!(conversion["to_currency"], "USD");
    assert!(conversion["error"].is_string());
}

#[tokio::test]
async fn list_only_contains_callers_orders() {
    let app = TestApp::new();
    let (alice, alice_token) = app.session("alice@example.com").await;
    let (_, bob_token) = app.session("bob@example.com").await;

    for _ in 0..3 {
        app.create_order(&alice_token, json!(1), "BRL").await;
    }
    app.create_order(&bob_token, json!(2), "USD").await;

    let (status, body) = app.send(Method::GET, "/orders", Some(&alice_token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["per_page"], 10);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert!(data.iter().all(|o| o["user_id"] == alice));
}

#[tokio::test]
async fn list_paginates() {
    let app = TestApp::new();
    let (_, token) = app.session("pages@example.com").await;
    for i in 1..=12 {
        app.create_order(&token, json!(i), "BRL").await;
    }

    let (_, body) = app.send(Method::GET, "/orders?page=2", Some(&token), None).await;
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["last_page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.send(Method::GET, "/orders?page=abc", Some(&token), None).await;
    assert_eq!(body["current_page"], 1);
}

#[tokio::test]
async fn orders_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Não autenticado."}));

    let (status, _) = app.send(Method::GET, "/orders", Some("1|forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/orders",
            Some("garbage"),
            Some(json!({"description": "x", "value": 1, "currency": "BRL"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_order_validation() {
    let app = TestApp::new();
    let (_, token) = app.session("invalid@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&token),
            Some(json!({
                "description": "a".repeat(256),
                "value": 0,
                "currency": "EUR",
                "user_id": 9999,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Dados inválidos.");
    for field in ["description", "value", "currency", "user_id"] {
        assert!(body["details"][field].is_array(), "missing error for {field}");
    }

    let (status, body) = app.send(Method::POST, "/orders", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["value"][0], "O campo valor é obrigatório.");
}

#[tokio::test]
async fn owner_is_always_the_caller() {
    let app = TestApp::new();
    let (other, _) = app.session("other@example.com").await;
    let (me, token) = app.session("me@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&token),
            Some(json!({"description": "x", "value": 5, "currency": "USD", "user_id": other})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], me);
}

#[tokio::test]
async fn missing_order_is_404() {
    let app = TestApp::new();

    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(json!({"value": 3}))),
        (Method::DELETE, None),
    ] {
        let (status, response) = app.send(method, "/orders/424242", None, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response, json!({"error": "Pedido não encontrado."}));
    }
}

#[tokio::test]
async fn delete_soft_deletes() {
    let app = TestApp::new();
    let (_, token) = app.session("soft@example.com").await;
    let id = app.create_order(&token, json!(10), "BRL").await;

    // warm the single-order cache
    app.send(Method::GET, &format!("/orders/{id}"), None, None).await;

    let (status, body) = app.send(Method::DELETE, &format!("/orders/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pedido excluído com sucesso");

    let (status, _) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &format!("/orders/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let row = app
        .repos
        .orders
        .find_including_deleted(OrderId::new(id))
        .await
        .unwrap()
        .unwrap();
    assert!(row.deleted_at.is_some());
}

#[tokio::test]
async fn deleted_order_leaves_fresh_listing() {
    let app = TestApp::new();
    let (_, token) = app.session("fresh@example.com").await;
    let id = app.create_order(&token, json!(10), "BRL").await;
    app.send(Method::DELETE, &format!("/orders/{id}"), None, None).await;

    let (_, body) = app.send(Method::GET, "/orders", Some(&token), None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn update_invalidates_cached_order() {
    let app = TestApp::new();
    let (_, token) = app.session("update@example.com").await;
    let id = app.create_order(&token, json!(100), "USD").await;

    let (_, before) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;
    assert_eq!(before["value"], "100.00");

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/orders/{id}"),
            None,
            Some(json!({"value": 150, "currency": "BRL"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["value"], "150.00");
    assert_eq!(updated["description"], "Pedido");

    let (_, after) = app.send(Method::GET, &format!("/orders/{id}"), None, None).await;
    assert_eq!(after["value"], "150.00");
    assert_eq!(after["currency"], "BRL");
    assert_eq!(after["converted_value"]["converted_amount"], 30.0);
}

#[tokio::test]
async fn update_rejects_invalid_fields() {
    let app = TestApp::new();
    let (_, token) = app.session("badupdate@example.com").await;
    let id = app.create_order(&token, json!(100), "USD").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/orders/{id}"),
            None,
            Some(json!({"currency": "GBP", "user_id": 31337})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["currency"].is_array());
    assert!(body["details"]["user_id"].is_array());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register("creds@example.com").await;

    for (email, password) in [
        ("creds@example.com", "wrong-password"),
        ("nobody@example.com", "senha123"),
    ] {
        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({
                "error": "Credenciais inválidas.",
                "details": {"email": ["Credenciais inválidas."]},
            })
        );
    }
}

#[tokio::test]
async fn me_and_logout() {
    let app = TestApp::new();
    let (id, token) = app.session("session@example.com").await;
    assert!(token.starts_with(&format!("{}|", 1)));

    let (status, body) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert!(body.get("password_hash").is_none());

    let (status, body) = app.send(Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout realizado com sucesso.");

    let (status, _) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn routes_are_mounted_under_api() {
    let app = TestApp::new();
    let id = app.register("prefix@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "prefix@example.com", "password": "senha123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = app.send(Method::GET, "/api/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_crud() {
    let app = TestApp::new();
    let (_, token) = app.session("admin@example.com").await;
    let id = app.register("joao@example.com").await;

    let (status, body) = app.send(Method::GET, &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "joao@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{id}"),
            None,
            Some(json!({"name": "João da Silva", "password": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "João da Silva");

    let (_, body) = app.send(Method::GET, &format!("/users/{id}"), None, None).await;
    assert_eq!(body["name"], "João da Silva");

    // an empty password keeps the old one
    app.login("joao@example.com").await;

    let (status, body) = app.send(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, body) = app.send(Method::DELETE, &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Usuário excluído com sucesso");

    let (status, body) = app.send(Method::GET, &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuário não encontrado");
}

#[tokio::test]
async fn user_validation() {
    let app = TestApp::new();
    let first = app.register("taken@example.com").await;
    let second = app.register("free@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({"name": "", "email": "taken@example.com", "password": "123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["name"][0], "O campo nome é obrigatório.");
    assert_eq!(body["details"]["email"][0], "O email informado já está em uso.");
    assert_eq!(
        body["details"]["password"][0],
        "O campo senha deve ter no mínimo 6 caracteres."
    );

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/users/{second}"),
            None,
            Some(json!({"email": "taken@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/users/{first}"),
            None,
            Some(json!({"email": "taken@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_revokes_their_tokens() {
    let app = TestApp::new();
    let (id, token) = app.session("leaving@example.com").await;

    app.send(Method::DELETE, &format!("/users/{id}"), None, None).await;

    let (status, _) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_user_evicts_their_cached_orders() {
    let app = TestApp::new();
    let (id, token) = app.session("gone@example.com").await;
    let order_id = app.create_order(&token, json!(10), "BRL").await;

    let (status, _) = app
        .send(Method::GET, &format!("/orders/{order_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::DELETE, &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app
        .repos
        .orders
        .find_including_deleted(OrderId::new(order_id))
        .await
        .unwrap()
        .is_none());

    let (status, body) = app
        .send(Method::GET, &format!("/orders/{order_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Pedido não encontrado.");
}

#[tokio::test]
async fn show_degrades_on_absurd_rate() {
    let app = TestApp::new();
    app.rates.set_rate(
        CurrencyPair::new(Currency::Brl, Currency::Usd),
        dec!(1000000000000000000000),
    );
    let (_, token) = app.session("huge@example.com").await;
    let order_id = app.create_order(&token, json!("99999999.99"), "BRL").await;

    let (status, body) = app
        .send(Method::GET, &format!("/orders/{order_id}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted_value"]["rate_used"], 1.0);
    assert!(body["converted_value"]["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_422() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_reports_cache_counters() {
    let app = TestApp::new();
    let (_, token) = app.session("status@example.com").await;
    let id = app.create_order(&token, json!(1), "BRL").await;
    app.send(Method::GET, &format!("/orders/{id}"), None, None).await;
    app.send(Method::GET, &format!("/orders/{id}"), None, None).await;

    let (status, body) = app.send(Method::GET, "/status", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["cache"]["backend"], "memory");
    assert_eq!(body["cache"]["query_hits"], 1);
    assert_eq!(body["cache"]["rate_misses"], 1);
    assert_eq!(body["cache"]["rate_hits"], 1);
}
