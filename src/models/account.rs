// src/models/account.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::lead::LeadStatus;

// Representa uma conta vinda do banco de dados.
//
// Os flags `has_active_lead` / `has_active_policy` / `is_ko` são um cache
// desnormalizado do status do lead: só mudam via `sync_with`, e o roteamento
// sempre confere o lead antes de confiar neles.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub phone: Option<String>,
    pub has_active_lead: bool,
    pub has_active_policy: bool,
    pub is_ko: bool,
    pub current_lead_id: Option<Uuid>,

    // Controle de concorrência otimista entre processos
    #[serde(skip_serializing)]
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: &str, name: &str, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            phone: None,
            has_active_lead: false,
            has_active_policy: false,
            is_ko: false,
            current_lead_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recalcula o cache de flags a partir do status autoritativo do lead.
    /// No máximo um dos três flags fica ligado.
    pub fn sync_with(&mut self, lead_id: Uuid, status: LeadStatus, now: DateTime<Utc>) {
        self.has_active_lead = false;
        self.has_active_policy = false;
        self.is_ko = false;

        match status {
            LeadStatus::Calculated | LeadStatus::Subscription | LeadStatus::Payment => {
                self.has_active_lead = true;
                self.current_lead_id = Some(lead_id);
            }
            LeadStatus::Signed => {
                self.has_active_policy = true;
                self.current_lead_id = Some(lead_id);
            }
            LeadStatus::Ko => {
                self.is_ko = true;
                self.current_lead_id = None;
            }
        }
        self.updated_at = now;
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            has_active_lead: self.has_active_lead,
            has_active_policy: self.has_active_policy,
            is_ko: self.is_ko,
            lead_id: self.current_lead_id,
        }
    }
}

// O que o cliente enxerga da conta (sem hash nem versão)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    #[schema(example = "test@example.com")]
    pub email: String,
    #[schema(example = "Usuario de Prueba")]
    pub name: String,
    pub phone: Option<String>,
    pub has_active_lead: bool,
    pub has_active_policy: bool,
    #[serde(rename = "isKO")]
    pub is_ko: bool,
    pub lead_id: Option<Uuid>,
}
