// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Session,
};

// Sessão autenticada, inserida nos "extensions" pelo `auth_guard`
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount(pub Session);

// O middleware em si: valida o Bearer e confere que a conta ainda existe
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    // Cabeçalho ausente ou malformado dá no mesmo: 401
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| to_api(AppError::InvalidToken))?;
    let session = app_state.auth_service.validate_token(bearer.token()).map_err(to_api)?;

    // Token de uma conta que não existe mais
    let exists = app_state
        .store
        .find_account_by_id(session.account_id)
        .await
        .map_err(to_api)?
        .is_some();
    if !exists {
        tracing::warn!(account_id = %session.account_id, "Token válido para conta inexistente");
        return Err(to_api(AppError::InvalidToken));
    }

    request.extensions_mut().insert(AuthenticatedAccount(session));
    Ok(next.run(request).await)
}

// Extrator para obter a sessão diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .copied()
            .ok_or(ApiError {
                status: StatusCode::UNAUTHORIZED,
                error: "Sessão não autenticada".into(),
                details: None,
            })
    }
}
