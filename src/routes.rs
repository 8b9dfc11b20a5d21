// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/google", post(handlers::auth::google));

    // Etapas do funil + perfil (protegidas pelo middleware)
    let funnel_routes = Router::new()
        .route("/calculator", post(handlers::funnel::calculate))
        .route("/subscription", post(handlers::funnel::subscription))
        .route("/payment", post(handlers::funnel::payment))
        .route("/signature", post(handlers::funnel::signature))
        .route("/user/profile", get(handlers::profile::get_profile))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", funnel_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{common::clock::FixedClock, config::AppConfig, db::MemoryFunnelStore};

    fn test_app() -> Router {
        let state = AppState::assemble(
            &AppConfig::for_tests(),
            Arc::new(MemoryFunnelStore::new()),
            Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())),
        )
        .unwrap();
        app(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn registered(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ana@example.com", "password": "segredo123", "name": "Ana" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    fn quote_body() -> Value {
        json!({
            "phone": "+34600111222",
            "mainBirthDate": "1995-03-10",
            "hasCopay": false,
            "additionalInsured": [
                { "id": "a", "birthDate": "1985-03-10" },
                { "id": "b", "birthDate": "" }
            ]
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn funnel_routes_require_a_token() {
        let app = test_app();
        let (status, _) = call(&app, Method::GET, "/api/user/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::POST, "/api/calculator", Some("lixo"), Some(quote_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn happy_path_reaches_the_portal() {
        let app = test_app();
        let token = registered(&app).await;

        let (status, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["routing"]["path"], "/calculator");

        let (status, body) = call(&app, Method::POST, "/api/calculator", Some(&token), Some(quote_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPrice"], 153);
        assert_eq!(body["insuredCount"], 2);

        let (_, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(body["routing"]["path"], "/subscription");
        assert_eq!(body["routing"]["progress"], 25);

        let (status, body) =
            call(&app, Method::POST, "/api/subscription", Some(&token), Some(json!({ "isSmoker": false }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "continue");

        let payment = json!({
            "paymentFrequency": "monthly",
            "paymentMethod": "card",
            "cardData": { "cardNumber": "4242 4242 4242 4242", "expiryDate": "08/29", "cvv": "123" }
        });
        let (status, body) = call(&app, Method::POST, "/api/payment", Some(&token), Some(payment)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["finalPrice"], 13);

        let (_, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(body["routing"]["path"], "/signature");
        assert_eq!(body["currentLead"]["paymentInfo"]["last4"], "4242");
        assert!(!body.to_string().contains("4242424242424242"));

        let signature = json!({ "signatureCode": "1234", "signatureData": "data:image/png;base64,AAAA" });
        let (status, body) = call(&app, Method::POST, "/api/signature", Some(&token), Some(signature)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (_, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(body["routing"]["path"], "/portal");
        assert_eq!(body["routing"]["progress"], 100);
        assert_eq!(body["user"]["hasActivePolicy"], true);
    }

    #[tokio::test]
    async fn smoker_lands_on_the_rejection_page() {
        let app = test_app();
        let token = registered(&app).await;
        call(&app, Method::POST, "/api/calculator", Some(&token), Some(quote_body())).await;

        let (_, body) =
            call(&app, Method::POST, "/api/subscription", Some(&token), Some(json!({ "isSmoker": true }))).await;
        assert_eq!(body["status"], "ko");

        let (_, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(body["routing"]["path"], "/ko");
        assert_eq!(body["user"]["isKO"], true);

        let (status, _) = call(&app, Method::POST, "/api/calculator", Some(&token), Some(quote_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn errors_are_translated_by_accept_language() {
        let app = test_app();
        let token = registered(&app).await;

        let request = |lang: &'static str| {
            Request::builder()
                .method(Method::POST)
                .uri("/api/subscription")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT_LANGUAGE, lang)
                .body(Body::from(json!({ "isSmoker": false }).to_string()))
                .unwrap()
        };

        let mut messages = Vec::new();
        for lang in ["pt-BR,pt;q=0.9", "en-US", "fr-FR"] {
            let response = app.clone().oneshot(request(lang)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            messages.push(body["error"].as_str().unwrap().to_string());
        }
        // Idioma sem catálogo cai no espanhol, diferente de pt e en
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[2], messages[0]);
        assert_ne!(messages[2], messages[1]);
    }

    #[tokio::test]
    async fn wrong_signature_code_is_a_bad_request() {
        let app = test_app();
        let token = registered(&app).await;
        call(&app, Method::POST, "/api/calculator", Some(&token), Some(quote_body())).await;
        call(&app, Method::POST, "/api/subscription", Some(&token), Some(json!({ "isSmoker": false }))).await;
        let payment = json!({
            "paymentFrequency": "annual",
            "paymentMethod": "sepa",
            "sepaData": { "iban": "ES9121000418450200051332" }
        });
        let (status, body) = call(&app, Method::POST, "/api/payment", Some(&token), Some(payment)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["finalPrice"], 153);

        let signature = json!({ "signatureCode": "0000", "signatureData": "rabisco" });
        let (status, _) = call(&app, Method::POST, "/api/signature", Some(&token), Some(signature)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, Method::GET, "/api/user/profile", Some(&token), None).await;
        assert_eq!(body["routing"]["path"], "/signature");
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict_and_login_works() {
        let app = test_app();
        registered(&app).await;

        let payload = json!({ "email": "ana@example.com", "password": "segredo123", "name": "Ana" });
        let (status, _) = call(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let login = json!({ "email": "ana@example.com", "password": "segredo123" });
        let (status, body) = call(&app, Method::POST, "/api/auth/login", None, Some(login)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        let bad = json!({ "email": "ana@example.com", "password": "errada" });
        let (status, _) = call(&app, Method::POST, "/api/auth/login", None, Some(bad)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
