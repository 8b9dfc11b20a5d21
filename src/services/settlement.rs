// src/services/settlement.rs
//
// Colaboradores simulados de cobrança e assinatura eletrônica.
// Não há integração real com gateway nem com provedor de assinatura.

use uuid::Uuid;

use crate::{common::error::AppError, models::lead::PaymentMethodSummary};

pub trait PaymentGateway: Send + Sync {
    /// Aceita ou recusa a cobrança; nenhum valor é liquidado de fato.
    fn charge(&self, lead_id: Uuid, method: &PaymentMethodSummary, amount: i64) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

impl PaymentGateway for SimulatedGateway {
    fn charge(&self, lead_id: Uuid, method: &PaymentMethodSummary, amount: i64) -> Result<(), AppError> {
        let kind = match method {
            PaymentMethodSummary::Card { .. } => "card",
            PaymentMethodSummary::Sepa { .. } => "sepa",
        };
        tracing::info!(%lead_id, kind, amount, "cobrança simulada aprovada");
        Ok(())
    }
}

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, code: &str) -> bool;
}

/// Aceita apenas o código fixo de demonstração.
#[derive(Debug, Clone)]
pub struct DemoCodeVerifier {
    code: String,
}

impl DemoCodeVerifier {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl SignatureVerifier for DemoCodeVerifier {
    fn verify(&self, code: &str) -> bool {
        code.trim() == self.code
    }
}
