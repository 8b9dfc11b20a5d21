// src/models/funnel.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{
    account::AccountView,
    lead::{Lead, PaymentFrequency},
};

// =============================================================================
//  1. CALCULADORA
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInsuredPayload {
    #[serde(default)]
    #[schema(example = "insured-1")]
    pub id: Option<String>,
    // Linhas vazias do formulário chegam sem data e são descartadas
    #[serde(default)]
    #[schema(example = "1985-09-30")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateQuotePayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "O telefone é obrigatório."))]
    #[schema(example = "+34600111222")]
    pub phone: String,

    #[serde(default)]
    #[schema(example = "1995-04-12")]
    pub main_birth_date: Option<String>,

    #[serde(default)]
    pub has_copay: bool,

    #[serde(default)]
    pub additional_insured: Vec<AdditionalInsuredPayload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateQuoteResponse {
    pub lead_id: Uuid,
    #[schema(example = 153)]
    pub total_price: i64,
    #[schema(example = 2)]
    pub insured_count: usize,
}

// =============================================================================
//  2. SUBSCRIÇÃO (pergunta de risco)
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnderwritingPayload {
    #[serde(default)]
    #[schema(example = false)]
    pub is_smoker: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnderwritingStatus {
    Ko,
    Continue,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnderwritingResponse {
    pub status: UnderwritingStatus,
}

// =============================================================================
//  3. PAGAMENTO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodKind {
    Card,
    Sepa,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardDataPayload {
    #[serde(default)]
    #[schema(example = "4242424242424242")]
    pub card_number: String,
    #[serde(default)]
    #[schema(example = "08/29")]
    pub expiry_date: String,
    #[serde(default)]
    #[schema(example = "123")]
    pub cvv: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SepaDataPayload {
    #[serde(default)]
    #[schema(example = "ES9121000418450200051332")]
    pub iban: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub payment_frequency: PaymentFrequency,
    pub payment_method: PaymentMethodKind,
    #[serde(default)]
    pub card_data: Option<CardDataPayload>,
    #[serde(default)]
    pub sepa_data: Option<SepaDataPayload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[schema(example = "success")]
    pub status: &'static str,
    #[schema(example = 13)]
    pub final_price: i64,
}

// =============================================================================
//  4. ASSINATURA
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    #[serde(default)]
    #[schema(example = "1234")]
    pub signature_code: String,
    #[serde(default)]
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub signature_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignatureResponse {
    #[schema(example = "success")]
    pub status: &'static str,
}

// =============================================================================
//  5. PERFIL + ROTEAMENTO
// =============================================================================

// Para onde o cliente deve ser levado no funil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FunnelRoute {
    Rejection,
    Portal,
    Underwriting,
    Payment,
    Signature,
    Calculator,
}

impl FunnelRoute {
    pub fn path(&self) -> &'static str {
        match self {
            FunnelRoute::Rejection => "/ko",
            FunnelRoute::Portal => "/portal",
            FunnelRoute::Underwriting => "/subscription",
            FunnelRoute::Payment => "/payment",
            FunnelRoute::Signature => "/signature",
            FunnelRoute::Calculator => "/calculator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub route: FunnelRoute,
    #[schema(example = "/payment")]
    pub path: &'static str,
    #[schema(example = 50)]
    pub progress: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: AccountView,
    pub current_lead: Option<Lead>,
    pub routing: RoutingDecision,
}
