// src/handlers/funnel.rs
//
// As quatro etapas do funil. Todas exigem sessão (`auth_guard`).

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedAccount, i18n::Locale},
    models::funnel::{
        CalculateQuotePayload, CalculateQuoteResponse, PaymentPayload, PaymentResponse, SignaturePayload,
        SignatureResponse, UnderwritingPayload, UnderwritingResponse,
    },
};

#[utoipa::path(
    post,
    path = "/api/calculator",
    tag = "Funnel",
    request_body = CalculateQuotePayload,
    responses(
        (status = 200, description = "Preço calculado e lead criado", body = CalculateQuoteResponse),
        (status = 400, description = "Datas, idades ou estado da conta inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn calculate(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAccount(session): AuthenticatedAccount,
    Json(payload): Json<CalculateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let quote = app_state
        .funnel_service
        .calculate_quote(session, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    post,
    path = "/api/subscription",
    tag = "Funnel",
    request_body = UnderwritingPayload,
    responses(
        (status = 200, description = "Resposta registrada (ko ou continue)", body = UnderwritingResponse),
        (status = 404, description = "Nenhum lead ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAccount(session): AuthenticatedAccount,
    Json(payload): Json<UnderwritingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = app_state
        .funnel_service
        .submit_underwriting(session, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(answer)))
}

#[utoipa::path(
    post,
    path = "/api/payment",
    tag = "Funnel",
    request_body = PaymentPayload,
    responses(
        (status = 200, description = "Pagamento aceito", body = PaymentResponse),
        (status = 400, description = "Dados de pagamento inválidos ou etapa errada")
    ),
    security(("api_jwt" = []))
)]
pub async fn payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAccount(session): AuthenticatedAccount,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = app_state
        .funnel_service
        .submit_payment(session, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(receipt)))
}

#[utoipa::path(
    post,
    path = "/api/signature",
    tag = "Funnel",
    request_body = SignaturePayload,
    responses(
        (status = 200, description = "Contrato assinado, apólice ativa", body = SignatureResponse),
        (status = 400, description = "Código incorreto ou assinatura vazia")
    ),
    security(("api_jwt" = []))
)]
pub async fn signature(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAccount(session): AuthenticatedAccount,
    Json(payload): Json<SignaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let signed = app_state
        .funnel_service
        .submit_signature(session, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(signed)))
}
