// src/db/store.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{account::Account, lead::Lead},
};

/// Persistência de contas e leads. As implementações traduzem falhas de
/// baixo nível em `AppError` antes de devolvê-las.
#[async_trait]
pub trait FunnelStore: Send + Sync {
    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create_account(&self, account: &Account) -> Result<Account, AppError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_lead(&self, id: Uuid) -> Result<Option<Lead>, AppError>;

    async fn latest_lead_for_account(&self, account_id: Uuid) -> Result<Option<Lead>, AppError>;

    /// Grava o lead e os flags da conta numa única unidade atômica.
    ///
    /// `account.version` deve ser a versão lida; se outra escrita passou na
    /// frente, nada é gravado e o erro é `ConcurrentUpdate`. Devolve a conta
    /// com a versão nova.
    async fn save_funnel(&self, account: &Account, lead: &Lead) -> Result<Account, AppError>;
}
