// src/db/account_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::account::Account};

// O repositório de contas, responsável pelas interações com a tabela 'accounts'
#[derive(Clone, Default)]
pub struct AccountRepository;

impl AccountRepository {
    pub fn new() -> Self {
        Self
    }

    // Busca uma conta pelo seu e-mail
    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(account)
    }

    // Busca uma conta pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(account)
    }

    // Cria uma nova conta no banco de dados
    pub async fn create<'e, E>(&self, executor: E, account: &Account) -> Result<Account, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, name, password_hash, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.phone)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            AppError::DatabaseError(e)
        })
    }

    /// Atualiza telefone + cache de flags, só se a versão ainda for a lida.
    pub async fn update_funnel_flags<'e, E>(&self, executor: E, account: &Account) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET phone = $2,
                has_active_lead = $3,
                has_active_policy = $4,
                is_ko = $5,
                current_lead_id = $6,
                updated_at = $7,
                version = version + 1
            WHERE id = $1 AND version = $8
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.phone)
        .bind(account.has_active_lead)
        .bind(account.has_active_policy)
        .bind(account.is_ko)
        .bind(account.current_lead_id)
        .bind(account.updated_at)
        .bind(account.version)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }
}
