// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::FunnelStore, AccountRepository, LeadRepository},
    models::{account::Account, lead::Lead},
};

#[derive(Clone)]
pub struct PgFunnelStore {
    pool: PgPool,
    accounts: AccountRepository,
    leads: LeadRepository,
}

impl PgFunnelStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            accounts: AccountRepository::new(),
            leads: LeadRepository::new(),
        }
    }
}

#[async_trait]
impl FunnelStore for PgFunnelStore {
    async fn create_account(&self, account: &Account) -> Result<Account, AppError> {
        self.accounts.create(&self.pool, account).await
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        self.accounts.find_by_id(&self.pool, id).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.accounts.find_by_email(&self.pool, email).await
    }

    async fn find_lead(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        self.leads.find_by_id(&self.pool, id).await
    }

    async fn latest_lead_for_account(&self, account_id: Uuid) -> Result<Option<Lead>, AppError> {
        self.leads.latest_for_owner(&self.pool, account_id).await
    }

    async fn save_funnel(&self, account: &Account, lead: &Lead) -> Result<Account, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // O lead primeiro: a conta aponta para ele (FK current_lead_id)
        self.leads.upsert(&mut *tx, lead).await?;

        // Se a versão mudou, o tx sofre rollback automático ao sair do escopo (drop)
        let updated = self
            .accounts
            .update_funnel_flags(&mut *tx, account)
            .await?
            .ok_or(AppError::ConcurrentUpdate)?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(updated)
    }
}
