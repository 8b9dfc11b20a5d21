// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::lead::{FunnelAction, LeadStatus},
};

// As quatro famílias de erro que o funil expõe para quem chama.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Auth,
    Internal,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Toda falha de colaborador (banco, bcrypt, jwt) é convertida aqui
// antes de chegar na máquina de estados.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("Data de nascimento no futuro")]
    BirthDateInFuture,

    #[error("Idade atuarial fora da faixa aceita: {age}")]
    AgeOutOfRange { age: i32 },

    #[error("Número de segurados adicionais acima do limite: {0}")]
    TooManyInsured(usize),

    #[error("Resposta de subscrição obrigatória")]
    UnderwritingAnswerRequired,

    #[error("Número de cartão inválido")]
    InvalidCardNumber,

    #[error("Validade do cartão inválida")]
    InvalidCardExpiry,

    #[error("CVV inválido")]
    InvalidCardCvv,

    #[error("IBAN inválido")]
    InvalidIban,

    #[error("Dados do meio de pagamento ausentes")]
    MissingPaymentData,

    #[error("Pagamento já processado com dados diferentes")]
    PaymentAlreadyProcessed,

    #[error("Código de assinatura incorreto")]
    WrongSignatureCode,

    #[error("Assinatura vazia")]
    EmptySignature,

    #[error("Transição ilegal: {action:?} a partir de {from:?}")]
    IllegalTransition { from: LeadStatus, action: FunnelAction },

    #[error("Conta recusada na subscrição")]
    AccountRejected,

    #[error("Conta já possui apólice ativa")]
    PolicyAlreadyActive,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta não encontrada")]
    AccountNotFound,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("A conta foi alterada por outra requisição")]
    ConcurrentUpdate,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingField(_)
            | AppError::InvalidDate(_)
            | AppError::BirthDateInFuture
            | AppError::AgeOutOfRange { .. }
            | AppError::TooManyInsured(_)
            | AppError::UnderwritingAnswerRequired
            | AppError::InvalidCardNumber
            | AppError::InvalidCardExpiry
            | AppError::InvalidCardCvv
            | AppError::InvalidIban
            | AppError::MissingPaymentData
            | AppError::PaymentAlreadyProcessed
            | AppError::WrongSignatureCode
            | AppError::EmptySignature
            | AppError::IllegalTransition { .. }
            | AppError::AccountRejected
            | AppError::PolicyAlreadyActive
            | AppError::EmailAlreadyExists => ErrorKind::Validation,

            AppError::AccountNotFound | AppError::LeadNotFound => ErrorKind::NotFound,

            AppError::InvalidCredentials | AppError::InvalidToken => ErrorKind::Auth,

            AppError::ConcurrentUpdate
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::EmailAlreadyExists | AppError::ConcurrentUpdate => StatusCode::CONFLICT,
            other => match other.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    // Chave da mensagem no catálogo de traduções + parâmetros de interpolação
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("invalid_fields", vec![]),
            AppError::MissingField(field) => ("missing_field", vec![("field", field.to_string())]),
            AppError::InvalidDate(raw) => ("invalid_date", vec![("value", raw.clone())]),
            AppError::BirthDateInFuture => ("birth_date_in_future", vec![]),
            AppError::AgeOutOfRange { age } => ("age_out_of_range", vec![("age", age.to_string())]),
            AppError::TooManyInsured(count) => ("too_many_insured", vec![("count", count.to_string())]),
            AppError::UnderwritingAnswerRequired => ("answer_required", vec![]),
            AppError::InvalidCardNumber => ("invalid_card_number", vec![]),
            AppError::InvalidCardExpiry => ("invalid_card_expiry", vec![]),
            AppError::InvalidCardCvv => ("invalid_card_cvv", vec![]),
            AppError::InvalidIban => ("invalid_iban", vec![]),
            AppError::MissingPaymentData => ("missing_payment_data", vec![]),
            AppError::PaymentAlreadyProcessed => ("payment_already_processed", vec![]),
            AppError::WrongSignatureCode => ("wrong_signature_code", vec![]),
            AppError::EmptySignature => ("empty_signature", vec![]),
            AppError::IllegalTransition { from, .. } => {
                ("illegal_transition", vec![("status", from.as_str().to_string())])
            }
            AppError::AccountRejected => ("account_rejected", vec![]),
            AppError::PolicyAlreadyActive => ("policy_already_active", vec![]),
            AppError::EmailAlreadyExists => ("email_already_exists", vec![]),
            AppError::InvalidCredentials => ("invalid_credentials", vec![]),
            AppError::InvalidToken => ("invalid_token", vec![]),
            AppError::AccountNotFound => ("account_not_found", vec![]),
            AppError::LeadNotFound => ("lead_not_found", vec![]),
            AppError::ConcurrentUpdate => ("concurrent_update", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ("internal", vec![]),
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        // O `tracing` loga a mensagem detalhada; o cliente só recebe a genérica.
        if self.kind() == ErrorKind::Internal {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (key, args) = self.message_key();
        let error = store.translate(&locale.0, key, &args);

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            AppError::MissingField(field) => Some(json!({ "field": field })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Retorna todos os detalhes da validação, campo a campo.
fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| Value::String(m.to_string()))
                    .unwrap_or_else(|| Value::String(e.code.to_string()))
            })
            .collect();
        details.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(details)
}

// O erro já traduzido, pronto para virar resposta.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
