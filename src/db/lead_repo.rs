// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{InsuredPerson, Lead, LeadStatus, PaymentInfo, SignatureInfo},
};

// Linha crua da tabela 'leads': os sub-registros vêm como JSONB tipado
#[derive(Debug, FromRow)]
struct LeadRow {
    id: Uuid,
    owner_id: Uuid,
    phone: String,
    main_insured: Json<InsuredPerson>,
    additional_insured: Json<Vec<InsuredPerson>>,
    has_copay: bool,
    total_price: i64,
    status: LeadStatus,
    payment_info: Option<Json<PaymentInfo>>,
    signature_info: Option<Json<SignatureInfo>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            owner_id: row.owner_id,
            phone: row.phone,
            main_insured: row.main_insured.0,
            additional_insured: row.additional_insured.0,
            has_copay: row.has_copay,
            total_price: row.total_price,
            status: row.status,
            payment_info: row.payment_info.map(|json| json.0),
            signature_info: row.signature_info.map(|json| json.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const LEAD_COLUMNS: &str = r#"
    id, owner_id, phone, main_insured, additional_insured, has_copay,
    total_price, status, payment_info, signature_info, created_at, updated_at
"#;

#[derive(Clone, Default)]
pub struct LeadRepository;

impl LeadRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS);
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(Lead::from))
    }

    // Lead mais recente da conta (o "atual" do funil)
    pub async fn latest_for_owner<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM leads WHERE owner_id = $1 ORDER BY created_at DESC, seq DESC LIMIT 1",
            LEAD_COLUMNS
        );
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(owner_id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(Lead::from))
    }

    /// Insere o lead ou atualiza a parte mutável (status, pagamento, assinatura).
    pub async fn upsert<'e, E>(&self, executor: E, lead: &Lead) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, owner_id, phone, main_insured, additional_insured, has_copay,
                total_price, status, payment_info, signature_info, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                payment_info = EXCLUDED.payment_info,
                signature_info = EXCLUDED.signature_info,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(lead.id)
        .bind(lead.owner_id)
        .bind(&lead.phone)
        .bind(Json(&lead.main_insured))
        .bind(Json(&lead.additional_insured))
        .bind(lead.has_copay)
        .bind(lead.total_price)
        .bind(lead.status)
        .bind(lead.payment_info.as_ref().map(Json))
        .bind(lead.signature_info.as_ref().map(Json))
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
