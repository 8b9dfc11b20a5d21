// src/middleware/i18n.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};

use crate::{common::i18n::DEFAULT_LANG, config::AppState};

// Idioma da requisição, já resolvido para um catálogo existente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header_str = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok());

        let lang = header_str
            .map(accept_language::parse)
            .unwrap_or_default()
            .into_iter()
            // "pt-BR" -> "pt"
            .map(|tag| tag.split('-').next().unwrap_or(tag.as_str()).to_lowercase())
            .find(|lang| app_state.i18n_store.supports(lang));

        Ok(lang.map(Locale).unwrap_or_default())
    }
}
