// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// Estados do lead. `ko` e `signed` são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Calculated,
    Subscription,
    Payment,
    Ko,
    Signed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Calculated => "calculated",
            LeadStatus::Subscription => "subscription",
            LeadStatus::Payment => "payment",
            LeadStatus::Ko => "ko",
            LeadStatus::Signed => "signed",
        }
    }

    /// Percentual de avanço no funil exibido no painel do cliente.
    pub fn progress_percent(&self) -> u8 {
        match self {
            LeadStatus::Calculated => 25,
            LeadStatus::Subscription => 50,
            LeadStatus::Payment => 75,
            LeadStatus::Signed => 100,
            LeadStatus::Ko => 0,
        }
    }
}

// Os gatilhos do funil, usados nas mensagens de transição ilegal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelAction {
    Underwriting,
    Payment,
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Monthly,
    Annual,
}

// --- Sub-registros estruturados ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsuredPerson {
    // Identificador opcional vindo do formulário (segurados adicionais)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[schema(value_type = String, example = "1995-04-12")]
    pub birth_date: NaiveDate,
    /// Sempre recalculada a partir de `birth_date`, nunca aceita do cliente.
    #[schema(example = 30)]
    pub actuarial_age: i32,
}

// Resumo mascarado do meio de pagamento: nunca guardamos o número completo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentMethodSummary {
    #[serde(rename_all = "camelCase")]
    Card {
        #[schema(example = "4242")]
        last4: String,
        #[schema(example = "08/29")]
        expiry: String,
    },
    #[serde(rename_all = "camelCase")]
    Sepa {
        #[schema(example = "3000")]
        last4: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub frequency: PaymentFrequency,
    #[serde(flatten)]
    pub method: PaymentMethodSummary,
    #[schema(example = 13)]
    pub final_price: i64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signed_at: DateTime<Utc>,
    // Desenho da assinatura (data URL enviada pelo canvas)
    pub signature: String,
    // Código aceito pelo verificador no momento da assinatura
    #[serde(default)]
    #[schema(example = "1234")]
    pub verified_code: String,
}

// --- Lead ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "+34600111222")]
    pub phone: String,
    pub main_insured: InsuredPerson,
    pub additional_insured: Vec<InsuredPerson>,
    pub has_copay: bool,
    /// Preço anual, já com desconto e arredondado.
    #[schema(example = 153)]
    pub total_price: i64,
    pub status: LeadStatus,
    pub payment_info: Option<PaymentInfo>,
    pub signature_info: Option<SignatureInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn insured_count(&self) -> usize {
        1 + self.additional_insured.len()
    }
}
