// src/services/funnel_service.rs

use std::sync::Arc;

use crate::{
    common::{clock::Clock, error::AppError},
    db::FunnelStore,
    models::{
        account::Account,
        auth::Session,
        funnel::{
            CalculateQuotePayload, CalculateQuoteResponse, PaymentPayload, PaymentResponse,
            ProfileResponse, SignaturePayload, SignatureResponse, UnderwritingPayload,
            UnderwritingResponse, UnderwritingStatus,
        },
        lead::{Lead, LeadStatus},
    },
    services::{
        locks::AccountLocks,
        payment::PaymentSubmission,
        quote_machine::{self, PaymentStep, QuoteInput, Transition},
        routing::derive_routing_state,
        settlement::{PaymentGateway, SignatureVerifier},
    },
};

/// Orquestra o funil: trava a conta, lê conta + lead, aplica a transição pura
/// e grava o resultado de uma vez.
#[derive(Clone)]
pub struct FunnelService {
    store: Arc<dyn FunnelStore>,
    locks: AccountLocks,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl FunnelService {
    pub fn new(
        store: Arc<dyn FunnelStore>,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            clock,
            gateway,
            verifier,
        }
    }

    // --- CALCULADORA ---

    pub async fn calculate_quote(
        &self,
        session: Session,
        payload: CalculateQuotePayload,
    ) -> Result<CalculateQuoteResponse, AppError> {
        let input = QuoteInput::try_from(payload)?;

        let _guard = self.locks.acquire(session.account_id).await;
        let account = self.load_account(session).await?;
        let latest = self.store.latest_lead_for_account(account.id).await?;

        let transition = quote_machine::open_quote(
            &account,
            latest.as_ref(),
            input,
            self.clock.today(),
            self.clock.now(),
        )?;
        let lead = self.commit(None, transition).await?.lead;

        Ok(CalculateQuoteResponse {
            lead_id: lead.id,
            total_price: lead.total_price,
            insured_count: lead.insured_count(),
        })
    }

    // --- SUBSCRIÇÃO ---

    pub async fn submit_underwriting(
        &self,
        session: Session,
        payload: UnderwritingPayload,
    ) -> Result<UnderwritingResponse, AppError> {
        let _guard = self.locks.acquire(session.account_id).await;
        let account = self.load_account(session).await?;
        let lead = self.current_lead(&account).await?;

        let (transition, status) =
            quote_machine::answer_underwriting(&account, lead.as_ref(), payload.is_smoker, self.clock.now())?;
        let lead = self.commit(Some(LeadStatus::Calculated), transition).await?.lead;

        if status == UnderwritingStatus::Ko {
            tracing::warn!(account_id = %account.id, lead_id = %lead.id, "❌ Conta recusada na subscrição");
        }

        Ok(UnderwritingResponse { status })
    }

    // --- PAGAMENTO ---

    pub async fn submit_payment(&self, session: Session, payload: PaymentPayload) -> Result<PaymentResponse, AppError> {
        let submission = PaymentSubmission::try_from(payload)?;

        let _guard = self.locks.acquire(session.account_id).await;
        let account = self.load_account(session).await?;
        let lead = self.current_lead(&account).await?;

        let step = quote_machine::take_payment(&account, lead.as_ref(), &submission, self.clock.now())?;

        let final_price = match step {
            PaymentStep::Replay { final_price } => {
                tracing::info!(account_id = %account.id, "Pagamento repetido, nada a cobrar");
                final_price
            }
            PaymentStep::Charge { transition, final_price } => {
                // Grava antes de cobrar: uma falha de escrita não deixa cobrança órfã
                let saved = self.commit(Some(LeadStatus::Subscription), transition).await?;

                if let Err(e) = self.charge(&saved.lead, final_price) {
                    if let Some(previous) = lead.as_ref() {
                        self.revert_payment(&account, previous, &saved).await;
                    }
                    return Err(e);
                }
                final_price
            }
        };

        Ok(PaymentResponse { status: "success", final_price })
    }

    // --- ASSINATURA ---

    pub async fn submit_signature(
        &self,
        session: Session,
        payload: SignaturePayload,
    ) -> Result<SignatureResponse, AppError> {
        let _guard = self.locks.acquire(session.account_id).await;
        let account = self.load_account(session).await?;
        let lead = self.current_lead(&account).await?;

        let transition = quote_machine::sign_contract(
            &account,
            lead.as_ref(),
            &payload.signature_code,
            &payload.signature_data,
            self.verifier.as_ref(),
            self.clock.now(),
        )?;
        self.commit(Some(LeadStatus::Payment), transition).await?;

        Ok(SignatureResponse { status: "success" })
    }

    // --- PERFIL ---

    pub async fn get_profile(&self, session: Session) -> Result<ProfileResponse, AppError> {
        // Conta e lead lidos sob o mesmo lock das transições
        let _guard = self.locks.acquire(session.account_id).await;
        let account = self.load_account(session).await?;
        let current_lead = self.store.latest_lead_for_account(account.id).await?;
        let routing = derive_routing_state(&account, current_lead.as_ref());

        Ok(ProfileResponse {
            user: account.view(),
            current_lead,
            routing,
        })
    }

    async fn load_account(&self, session: Session) -> Result<Account, AppError> {
        self.store
            .find_account_by_id(session.account_id)
            .await?
            .ok_or(AppError::AccountNotFound)
    }

    async fn current_lead(&self, account: &Account) -> Result<Option<Lead>, AppError> {
        match account.current_lead_id {
            Some(id) => self.store.find_lead(id).await,
            None => Ok(None),
        }
    }

    // Devolve o par gravado, com a versão nova da conta
    async fn commit(&self, from: Option<LeadStatus>, transition: Transition) -> Result<Transition, AppError> {
        let account = self.store.save_funnel(&transition.account, &transition.lead).await?;
        tracing::info!(
            account_id = %account.id,
            lead_id = %transition.lead.id,
            from = from.map(|s| s.as_str()).unwrap_or("-"),
            to = transition.lead.status.as_str(),
            "transição do funil"
        );
        Ok(Transition { account, lead: transition.lead })
    }

    fn charge(&self, lead: &Lead, amount: i64) -> Result<(), AppError> {
        match &lead.payment_info {
            Some(info) => self.gateway.charge(lead.id, &info.method, amount),
            None => Err(AppError::MissingPaymentData),
        }
    }

    // Cobrança recusada depois da gravação: volta conta e lead ao estado lido
    async fn revert_payment(&self, account: &Account, previous: &Lead, saved: &Transition) {
        let mut restored = account.clone();
        restored.version = saved.account.version;

        match self.store.save_funnel(&restored, previous).await {
            Ok(_) => tracing::warn!(account_id = %account.id, lead_id = %previous.id, "Cobrança recusada, pagamento desfeito"),
            Err(e) => tracing::error!(
                account_id = %account.id,
                lead_id = %previous.id,
                "Cobrança recusada e pagamento não pôde ser desfeito: {}",
                e
            ),
        }
    }
}
