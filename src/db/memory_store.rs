// src/db/memory_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::FunnelStore,
    models::{account::Account, lead::Lead},
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    leads: HashMap<Uuid, Lead>,
    // Ordem de criação dos leads por conta; o último é o mais recente
    leads_by_owner: HashMap<Uuid, Vec<Uuid>>,
}

/// Store em memória: usado sem DATABASE_URL e em todos os testes.
/// Um único lock cobre as duas "tabelas", então `save_funnel` é atômico.
#[derive(Default)]
pub struct MemoryFunnelStore {
    tables: RwLock<Tables>,
}

impl MemoryFunnelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FunnelStore for MemoryFunnelStore {
    async fn create_account(&self, account: &Account) -> Result<Account, AppError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|existing| existing.email == account.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|account| account.email == email).cloned())
    }

    async fn find_lead(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.tables.read().await.leads.get(&id).cloned())
    }

    async fn latest_lead_for_account(&self, account_id: Uuid) -> Result<Option<Lead>, AppError> {
        let tables = self.tables.read().await;
        let latest = tables
            .leads_by_owner
            .get(&account_id)
            .and_then(|ids| ids.last())
            .and_then(|id| tables.leads.get(id))
            .cloned();
        Ok(latest)
    }

    async fn save_funnel(&self, account: &Account, lead: &Lead) -> Result<Account, AppError> {
        let mut tables = self.tables.write().await;

        let stored_version = tables
            .accounts
            .get(&account.id)
            .map(|stored| stored.version)
            .ok_or(AppError::AccountNotFound)?;
        if stored_version != account.version {
            return Err(AppError::ConcurrentUpdate);
        }

        if !tables.leads.contains_key(&lead.id) {
            tables.leads_by_owner.entry(lead.owner_id).or_default().push(lead.id);
        }
        tables.leads.insert(lead.id, lead.clone());

        let mut updated = account.clone();
        updated.version += 1;
        tables.accounts.insert(updated.id, updated.clone());

        Ok(updated)
    }
}
