// src/handlers/profile.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedAccount, i18n::Locale},
    models::funnel::ProfileResponse,
};

// GET /api/user/profile
// Devolve a conta, o lead mais recente e para onde o cliente deve ir.
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Perfil e decisão de roteamento", body = ProfileResponse),
        (status = 401, description = "Sessão inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAccount(session): AuthenticatedAccount,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .funnel_service
        .get_profile(session)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(profile)))
}
