// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::{
        clock::{Clock, SystemClock},
        i18n::I18nStore,
    },
    db::{FunnelStore, MemoryFunnelStore, PgFunnelStore},
    services::{
        settlement::{DemoCodeVerifier, SimulatedGateway},
        AuthService, FunnelService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SIGNATURE_CODE: &str = "1234";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Sem DATABASE_URL o servidor sobe com o store em memória
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub signature_code: String,
    pub token_ttl_days: i64,
    pub seed_demo_account: bool,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            signature_code: env::var("SIGNATURE_CODE").unwrap_or_else(|_| DEFAULT_SIGNATURE_CODE.to_string()),
            token_ttl_days: parse_var("TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?,
            seed_demo_account: parse_var("SEED_DEMO_ACCOUNT", true)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            jwt_secret: "segredo-de-teste".into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            signature_code: DEFAULT_SIGNATURE_CODE.into(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            seed_demo_account: false,
            bcrypt_cost: 4,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FunnelStore>,
    pub auth_service: AuthService,
    pub funnel_service: FunnelService,
    pub i18n_store: I18nStore,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn FunnelStore> = match &config.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgFunnelStore::new(db_pool))
            }
            None => {
                tracing::warn!("DATABASE_URL ausente: usando store em memória (dados somem ao reiniciar)");
                Arc::new(MemoryFunnelStore::new())
            }
        };

        Self::assemble(config, store, Arc::new(SystemClock))
    }

    // --- Monta o gráfico de dependências ---
    pub fn assemble(config: &AppConfig, store: Arc<dyn FunnelStore>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;

        let auth_service = AuthService::new(
            store.clone(),
            clock.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_days,
            config.bcrypt_cost,
        );
        let funnel_service = FunnelService::new(
            store.clone(),
            clock,
            Arc::new(SimulatedGateway),
            Arc::new(DemoCodeVerifier::new(config.signature_code.clone())),
        );

        Ok(Self {
            store,
            auth_service,
            funnel_service,
            i18n_store,
        })
    }
}
