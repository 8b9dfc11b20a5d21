// src/services/auth.rs
//
// Provedor de identidade: registro, login, OAuth simulado e emissão/validação
// de JWT. Para o resto do sistema ele só entrega um `Session`.

use std::sync::Arc;

use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::{clock::Clock, error::AppError},
    db::FunnelStore,
    models::{
        account::Account,
        auth::{Claims, Session},
    },
};

// Conta fixa devolvida pelo "login com Google" simulado
pub const GOOGLE_DEMO_EMAIL: &str = "usuario@gmail.com";
const GOOGLE_DEMO_NAME: &str = "Usuario Google";
const GOOGLE_DEMO_PASSWORD: &str = "google-oauth-temp";

pub const SEED_EMAIL: &str = "test@example.com";
const SEED_NAME: &str = "Usuario de Prueba";
const SEED_PASSWORD: &str = "password123";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn FunnelStore>,
    clock: Arc<dyn Clock>,
    jwt_secret: String,
    token_ttl_days: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn FunnelStore>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        token_ttl_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self { store, clock, jwt_secret, token_ttl_days, bcrypt_cost }
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<(String, Account), AppError> {
        let email = normalize_email(email);
        if self.store.find_account_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let hashed_password = self.hash_password(password).await?;
        let account = Account::new(&email, name.trim(), hashed_password, self.clock.now());
        let account = self.store.create_account(&account).await?;

        tracing::info!(account_id = %account.id, "✅ Conta criada");
        let token = self.create_token(&account)?;
        Ok((token, account))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Account), AppError> {
        let account = self
            .store
            .find_account_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = account.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&account)?;
        Ok((token, account))
    }

    /// OAuth simulado: sempre a mesma conta de demonstração, criada na primeira vez.
    pub async fn google_sign_in(&self) -> Result<(String, Account), AppError> {
        let account = self
            .find_or_create(GOOGLE_DEMO_EMAIL, GOOGLE_DEMO_NAME, GOOGLE_DEMO_PASSWORD)
            .await?;
        let token = self.create_token(&account)?;
        Ok((token, account))
    }

    /// Garante a conta de teste (`test@example.com`) no arranque.
    pub async fn seed_demo_account(&self) -> Result<Account, AppError> {
        self.find_or_create(SEED_EMAIL, SEED_NAME, SEED_PASSWORD).await
    }

    pub fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        // A expiração é conferida com o mesmo relógio que emitiu o token
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let now = self.clock.now().timestamp();
        if (token_data.claims.exp as i64) <= now {
            return Err(AppError::InvalidToken);
        }

        Ok(Session { account_id: token_data.claims.sub })
    }

    fn create_token(&self, account: &Account) -> Result<String, AppError> {
        let now = self.clock.now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: account.id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    async fn find_or_create(&self, email: &str, name: &str, password: &str) -> Result<Account, AppError> {
        if let Some(account) = self.store.find_account_by_email(email).await? {
            return Ok(account);
        }
        let hashed_password = self.hash_password(password).await?;
        let account = Account::new(email, name, hashed_password, self.clock.now());
        match self.store.create_account(&account).await {
            Ok(created) => Ok(created),
            // Outra requisição criou a mesma conta no meio do caminho
            Err(AppError::EmailAlreadyExists) => self
                .store
                .find_account_by_email(email)
                .await?
                .ok_or(AppError::AccountNotFound),
            Err(e) => Err(e),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
