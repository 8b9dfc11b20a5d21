// src/services/quote_machine.rs
//
// Fonte única das transições legais do funil:
//   (nenhum) -> calculated -> subscription -> payment -> signed
//                        \-> ko
// Cada função recebe o estado atual por referência e devolve o estado novo
// (conta + lead). Em qualquer falha de guarda nada é alterado: quem chama
// só persiste o `Transition` retornado.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        account::Account,
        funnel::{CalculateQuotePayload, FunnelRoute, UnderwritingStatus},
        lead::{FunnelAction, InsuredPerson, Lead, LeadStatus, PaymentInfo, SignatureInfo},
    },
    services::{
        age::{actuarial_age, is_insurable, parse_birth_date},
        payment::PaymentSubmission,
        pricing::{installment, quote_price, MAX_INSURED},
        routing::derive_routing_state,
        settlement::SignatureVerifier,
    },
};

/// Novo estado da dupla conta + lead, a ser gravado de uma vez.
#[derive(Debug, Clone)]
pub struct Transition {
    pub account: Account,
    pub lead: Lead,
}

// --- Entrada da calculadora, já higienizada ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalInsuredInput {
    pub client_ref: Option<String>,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteInput {
    pub phone: String,
    pub main_birth_date: NaiveDate,
    pub has_copay: bool,
    pub additional_insured: Vec<AdditionalInsuredInput>,
}

impl TryFrom<CalculateQuotePayload> for QuoteInput {
    type Error = AppError;

    fn try_from(payload: CalculateQuotePayload) -> Result<Self, Self::Error> {
        let phone = payload.phone.trim().to_string();
        if phone.is_empty() {
            return Err(AppError::MissingField("phone"));
        }

        let main_birth_date = match payload.main_birth_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_birth_date(raw)?,
            _ => return Err(AppError::MissingField("mainBirthDate")),
        };

        // Linhas sem data de nascimento são ignoradas
        let additional_insured = payload
            .additional_insured
            .into_iter()
            .filter_map(|row| {
                let raw = row.birth_date?;
                let raw = raw.trim().to_string();
                (!raw.is_empty()).then_some((row.id, raw))
            })
            .map(|(client_ref, raw)| {
                parse_birth_date(&raw).map(|birth_date| AdditionalInsuredInput { client_ref, birth_date })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if additional_insured.len() > MAX_INSURED - 1 {
            return Err(AppError::TooManyInsured(additional_insured.len()));
        }

        Ok(Self {
            phone,
            main_birth_date,
            has_copay: payload.has_copay,
            additional_insured,
        })
    }
}

fn insured(client_ref: Option<String>, birth_date: NaiveDate, today: NaiveDate) -> Result<InsuredPerson, AppError> {
    let actuarial_age = actuarial_age(birth_date, today)?;
    if !is_insurable(actuarial_age) {
        return Err(AppError::AgeOutOfRange { age: actuarial_age });
    }
    Ok(InsuredPerson { client_ref, birth_date, actuarial_age })
}

// O lead precisa existir e pertencer à conta
fn owned_lead<'a>(account: &Account, lead: Option<&'a Lead>) -> Result<&'a Lead, AppError> {
    match lead {
        Some(lead) if lead.owner_id == account.id => Ok(lead),
        _ => Err(AppError::LeadNotFound),
    }
}

fn require_status(lead: &Lead, expected: LeadStatus, action: FunnelAction) -> Result<(), AppError> {
    if lead.status != expected {
        return Err(AppError::IllegalTransition { from: lead.status, action });
    }
    Ok(())
}

fn advance(account: &Account, lead: &Lead, status: LeadStatus, now: DateTime<Utc>) -> Transition {
    let mut lead = lead.clone();
    lead.status = status;
    lead.updated_at = now;

    let mut account = account.clone();
    account.sync_with(lead.id, status, now);

    Transition { account, lead }
}

// =============================================================================
//  (nenhum) -> calculated
// =============================================================================

/// Cria um lead novo com o preço calculado. `latest` é o lead mais recente da
/// conta, usado para bloquear contas recusadas, já com apólice ou com um
/// pagamento aceito aguardando assinatura.
pub fn open_quote(
    account: &Account,
    latest: Option<&Lead>,
    input: QuoteInput,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    match derive_routing_state(account, latest).route {
        FunnelRoute::Rejection => return Err(AppError::AccountRejected),
        FunnelRoute::Portal => return Err(AppError::PolicyAlreadyActive),
        // Lead já pago: só resta assinar
        FunnelRoute::Signature => return Err(AppError::PaymentAlreadyProcessed),
        _ => {}
    }

    let main_insured = insured(None, input.main_birth_date, today)?;
    let additional_insured = input
        .additional_insured
        .into_iter()
        .map(|extra| insured(extra.client_ref, extra.birth_date, today))
        .collect::<Result<Vec<_>, _>>()?;

    let ages: Vec<i32> = std::iter::once(main_insured.actuarial_age)
        .chain(additional_insured.iter().map(|person| person.actuarial_age))
        .collect();
    let total_price = quote_price(input.has_copay, &ages)?;

    let lead = Lead {
        id: Uuid::new_v4(),
        owner_id: account.id,
        phone: input.phone.clone(),
        main_insured,
        additional_insured,
        has_copay: input.has_copay,
        total_price,
        status: LeadStatus::Calculated,
        payment_info: None,
        signature_info: None,
        created_at: now,
        updated_at: now,
    };

    let mut account = account.clone();
    account.phone = Some(input.phone);
    account.sync_with(lead.id, LeadStatus::Calculated, now);

    Ok(Transition { account, lead })
}

// =============================================================================
//  calculated -> subscription | ko
// =============================================================================

pub fn answer_underwriting(
    account: &Account,
    lead: Option<&Lead>,
    is_smoker: Option<bool>,
    now: DateTime<Utc>,
) -> Result<(Transition, UnderwritingStatus), AppError> {
    let is_smoker = is_smoker.ok_or(AppError::UnderwritingAnswerRequired)?;
    let lead = owned_lead(account, lead)?;
    require_status(lead, LeadStatus::Calculated, FunnelAction::Underwriting)?;

    if is_smoker {
        Ok((advance(account, lead, LeadStatus::Ko, now), UnderwritingStatus::Ko))
    } else {
        Ok((advance(account, lead, LeadStatus::Subscription, now), UnderwritingStatus::Continue))
    }
}

// =============================================================================
//  subscription -> payment
// =============================================================================

#[derive(Debug, Clone)]
pub enum PaymentStep {
    /// Primeira submissão válida: cobrar e gravar.
    Charge { transition: Transition, final_price: i64 },
    /// Mesma submissão repetida depois do sucesso: nada a cobrar de novo.
    Replay { final_price: i64 },
}

pub fn take_payment(
    account: &Account,
    lead: Option<&Lead>,
    submission: &PaymentSubmission,
    now: DateTime<Utc>,
) -> Result<PaymentStep, AppError> {
    let lead = owned_lead(account, lead)?;
    let method = submission.validate()?;

    if lead.status == LeadStatus::Payment {
        return match &lead.payment_info {
            Some(info) if info.frequency == submission.frequency && info.method == method => {
                Ok(PaymentStep::Replay { final_price: info.final_price })
            }
            _ => Err(AppError::PaymentAlreadyProcessed),
        };
    }
    require_status(lead, LeadStatus::Subscription, FunnelAction::Payment)?;

    let final_price = installment(lead.total_price, submission.frequency);

    let mut transition = advance(account, lead, LeadStatus::Payment, now);
    transition.lead.payment_info = Some(PaymentInfo {
        frequency: submission.frequency,
        method,
        final_price,
        processed_at: now,
    });

    Ok(PaymentStep::Charge { transition, final_price })
}

// =============================================================================
//  payment -> signed
// =============================================================================

pub fn sign_contract(
    account: &Account,
    lead: Option<&Lead>,
    code: &str,
    signature: &str,
    verifier: &dyn SignatureVerifier,
    now: DateTime<Utc>,
) -> Result<Transition, AppError> {
    if !verifier.verify(code) {
        return Err(AppError::WrongSignatureCode);
    }
    let lead = owned_lead(account, lead)?;
    if signature.trim().is_empty() {
        return Err(AppError::EmptySignature);
    }
    require_status(lead, LeadStatus::Payment, FunnelAction::Signature)?;

    let mut transition = advance(account, lead, LeadStatus::Signed, now);
    transition.lead.signature_info = Some(SignatureInfo {
        signed_at: now,
        signature: signature.to_string(),
        verified_code: code.trim().to_string(),
    });

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            funnel::AdditionalInsuredPayload,
            lead::{PaymentFrequency, PaymentMethodSummary},
        },
        services::{payment::PaymentMethodData, settlement::DemoCodeVerifier},
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn now() -> DateTime<Utc> {
        today().and_hms_opt(10, 0, 0).unwrap().and_utc()
    }

    fn account() -> Account {
        Account::new("ana@example.com", "Ana", "hash".into(), now())
    }

    // Datas escolhidas para cair exatamente na idade atuarial pedida em 2025-03-10
    fn born_aged(age: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025 - age, 3, 10).unwrap()
    }

    fn input(ages: &[i32], has_copay: bool) -> QuoteInput {
        QuoteInput {
            phone: "+34600111222".into(),
            main_birth_date: born_aged(ages[0]),
            has_copay,
            additional_insured: ages[1..]
                .iter()
                .map(|age| AdditionalInsuredInput { client_ref: None, birth_date: born_aged(*age) })
                .collect(),
        }
    }

    fn card_payment(frequency: PaymentFrequency) -> PaymentSubmission {
        PaymentSubmission {
            frequency,
            method: PaymentMethodData::Card {
                number: "4242424242421881".into(),
                expiry: "08/29".into(),
                cvv: "123".into(),
            },
        }
    }

    fn calculated(ages: &[i32]) -> Transition {
        open_quote(&account(), None, input(ages, false), today(), now()).unwrap()
    }

    fn subscribed(ages: &[i32]) -> Transition {
        let t = calculated(ages);
        answer_underwriting(&t.account, Some(&t.lead), Some(false), now()).unwrap().0
    }

    fn paid(ages: &[i32]) -> Transition {
        let t = subscribed(ages);
        match take_payment(&t.account, Some(&t.lead), &card_payment(PaymentFrequency::Monthly), now()).unwrap() {
            PaymentStep::Charge { transition, .. } => transition,
            other => panic!("esperava cobrança, veio {:?}", other),
        }
    }

    #[test]
    fn open_quote_prices_and_marks_the_account() {
        let t = open_quote(&account(), None, input(&[30, 40], false), today(), now()).unwrap();
        assert_eq!(t.lead.status, LeadStatus::Calculated);
        assert_eq!(t.lead.total_price, 153);
        assert_eq!(t.lead.main_insured.actuarial_age, 30);
        assert!(t.account.has_active_lead);
        assert_eq!(t.account.current_lead_id, Some(t.lead.id));
        assert_eq!(t.account.phone.as_deref(), Some("+34600111222"));
    }

    #[test]
    fn open_quote_rejects_out_of_range_ages() {
        let err = open_quote(&account(), None, input(&[30, 66], false), today(), now()).unwrap_err();
        assert!(matches!(err, AppError::AgeOutOfRange { age: 66 }));
        let err = open_quote(&account(), None, input(&[17], true), today(), now()).unwrap_err();
        assert!(matches!(err, AppError::AgeOutOfRange { age: 17 }));
    }

    #[test]
    fn payload_drops_blank_rows_and_requires_phone_and_birth_date() {
        let payload = CalculateQuotePayload {
            phone: "600111222".into(),
            main_birth_date: Some("1995-03-10".into()),
            has_copay: true,
            additional_insured: vec![
                AdditionalInsuredPayload { id: Some("a".into()), birth_date: Some("1985-03-10".into()) },
                AdditionalInsuredPayload { id: Some("b".into()), birth_date: Some("  ".into()) },
                AdditionalInsuredPayload { id: None, birth_date: None },
            ],
        };
        let parsed = QuoteInput::try_from(payload.clone()).unwrap();
        assert_eq!(parsed.additional_insured.len(), 1);
        assert_eq!(parsed.additional_insured[0].client_ref.as_deref(), Some("a"));

        let no_phone = CalculateQuotePayload { phone: " ".into(), ..payload.clone() };
        assert!(matches!(QuoteInput::try_from(no_phone), Err(AppError::MissingField("phone"))));

        let no_birth = CalculateQuotePayload { main_birth_date: None, ..payload };
        assert!(matches!(QuoteInput::try_from(no_birth), Err(AppError::MissingField("mainBirthDate"))));
    }

    #[test]
    fn payload_with_three_additional_insured_is_rejected() {
        let row = AdditionalInsuredPayload { id: None, birth_date: Some("1990-01-01".into()) };
        let payload = CalculateQuotePayload {
            phone: "600111222".into(),
            main_birth_date: Some("1995-03-10".into()),
            has_copay: false,
            additional_insured: vec![row.clone(), row.clone(), row],
        };
        assert!(matches!(QuoteInput::try_from(payload), Err(AppError::TooManyInsured(3))));
    }

    #[test]
    fn smoker_goes_to_terminal_ko() {
        let t = calculated(&[30]);
        let (ko, status) = answer_underwriting(&t.account, Some(&t.lead), Some(true), now()).unwrap();
        assert_eq!(status, UnderwritingStatus::Ko);
        assert_eq!(ko.lead.status, LeadStatus::Ko);
        assert!(ko.account.is_ko);
        assert!(!ko.account.has_active_lead);
        assert_eq!(ko.account.current_lead_id, None);

        // Nenhuma transição posterior é aceita
        let again = answer_underwriting(&ko.account, Some(&ko.lead), Some(false), now()).unwrap_err();
        assert!(matches!(again, AppError::IllegalTransition { from: LeadStatus::Ko, .. }));
        let pay = take_payment(&ko.account, Some(&ko.lead), &card_payment(PaymentFrequency::Annual), now()).unwrap_err();
        assert!(matches!(pay, AppError::IllegalTransition { .. }));
        let fresh = open_quote(&ko.account, Some(&ko.lead), input(&[30], false), today(), now()).unwrap_err();
        assert!(matches!(fresh, AppError::AccountRejected));
    }

    #[test]
    fn non_smoker_continues_to_subscription() {
        let t = calculated(&[30]);
        let (next, status) = answer_underwriting(&t.account, Some(&t.lead), Some(false), now()).unwrap();
        assert_eq!(status, UnderwritingStatus::Continue);
        assert_eq!(next.lead.status, LeadStatus::Subscription);
        assert!(next.account.has_active_lead);
    }

    #[test]
    fn missing_answer_or_lead_is_reported() {
        let t = calculated(&[30]);
        let err = answer_underwriting(&t.account, Some(&t.lead), None, now()).unwrap_err();
        assert!(matches!(err, AppError::UnderwritingAnswerRequired));
        let err = answer_underwriting(&t.account, None, Some(false), now()).unwrap_err();
        assert!(matches!(err, AppError::LeadNotFound));
    }

    #[test]
    fn lead_of_another_account_is_not_found() {
        let t = calculated(&[30]);
        let stranger = account();
        let err = answer_underwriting(&stranger, Some(&t.lead), Some(false), now()).unwrap_err();
        assert!(matches!(err, AppError::LeadNotFound));
    }

    #[test]
    fn payment_requires_subscription_stage() {
        let t = calculated(&[30]);
        let err = take_payment(&t.account, Some(&t.lead), &card_payment(PaymentFrequency::Annual), now()).unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition { from: LeadStatus::Calculated, action: FunnelAction::Payment }));
    }

    #[test]
    fn monthly_payment_stores_masked_summary() {
        let t = subscribed(&[30, 40]);
        let step = take_payment(&t.account, Some(&t.lead), &card_payment(PaymentFrequency::Monthly), now()).unwrap();
        let PaymentStep::Charge { transition, final_price } = step else {
            panic!("esperava cobrança");
        };
        assert_eq!(final_price, 13);
        assert_eq!(transition.lead.status, LeadStatus::Payment);
        let info = transition.lead.payment_info.expect("pagamento gravado");
        assert_eq!(info.method, PaymentMethodSummary::Card { last4: "1881".into(), expiry: "08/29".into() });
    }

    #[test]
    fn invalid_payment_leaves_the_lead_untouched() {
        let t = subscribed(&[30]);
        let bad = PaymentSubmission {
            frequency: PaymentFrequency::Annual,
            method: PaymentMethodData::Sepa { iban: "ES12".into() },
        };
        let before = t.lead.clone();
        assert!(matches!(take_payment(&t.account, Some(&t.lead), &bad, now()), Err(AppError::InvalidIban)));
        assert_eq!(t.lead, before);
    }

    #[test]
    fn identical_payment_after_success_is_a_replay() {
        let t = paid(&[30, 40]);
        let step = take_payment(&t.account, Some(&t.lead), &card_payment(PaymentFrequency::Monthly), now()).unwrap();
        assert!(matches!(step, PaymentStep::Replay { final_price: 13 }));

        let different = take_payment(&t.account, Some(&t.lead), &card_payment(PaymentFrequency::Annual), now()).unwrap_err();
        assert!(matches!(different, AppError::PaymentAlreadyProcessed));
    }

    #[test]
    fn signature_with_demo_code_activates_the_policy() {
        let t = paid(&[30]);
        let verifier = DemoCodeVerifier::new("1234");
        let signed = sign_contract(&t.account, Some(&t.lead), "1234", "data:image/png;base64,AAA", &verifier, now()).unwrap();
        assert_eq!(signed.lead.status, LeadStatus::Signed);
        let info = signed.lead.signature_info.as_ref().expect("assinatura gravada");
        assert_eq!(info.verified_code, "1234");
        assert_eq!(info.signed_at, now());
        assert!(signed.account.has_active_policy);
        assert!(!signed.account.has_active_lead);
    }

    #[test]
    fn wrong_code_fails_without_changing_status() {
        let t = paid(&[30]);
        let verifier = DemoCodeVerifier::new("1234");
        let err = sign_contract(&t.account, Some(&t.lead), "9999", "rabisco", &verifier, now()).unwrap_err();
        assert!(matches!(err, AppError::WrongSignatureCode));
        assert_eq!(t.lead.status, LeadStatus::Payment);

        let err = sign_contract(&t.account, Some(&t.lead), "1234", "   ", &verifier, now()).unwrap_err();
        assert!(matches!(err, AppError::EmptySignature));
    }

    #[test]
    fn signing_before_payment_is_illegal() {
        let t = subscribed(&[30]);
        let verifier = DemoCodeVerifier::new("1234");
        let err = sign_contract(&t.account, Some(&t.lead), "1234", "rabisco", &verifier, now()).unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition { from: LeadStatus::Subscription, .. }));
    }

    #[test]
    fn signed_account_cannot_open_a_new_quote() {
        let t = paid(&[30]);
        let verifier = DemoCodeVerifier::new("1234");
        let signed = sign_contract(&t.account, Some(&t.lead), "1234", "rabisco", &verifier, now()).unwrap();
        let err = open_quote(&signed.account, Some(&signed.lead), input(&[30], false), today(), now()).unwrap_err();
        assert!(matches!(err, AppError::PolicyAlreadyActive));
    }

    #[test]
    fn paid_lead_cannot_be_replaced_by_a_new_quote() {
        let t = paid(&[30]);
        let err = open_quote(&t.account, Some(&t.lead), input(&[30], false), today(), now()).unwrap_err();
        assert!(matches!(err, AppError::PaymentAlreadyProcessed));

        // Antes do pagamento a recotação continua liberada
        let s = subscribed(&[30]);
        assert!(open_quote(&s.account, Some(&s.lead), input(&[40], false), today(), now()).is_ok());
    }

    #[test]
    fn recalculation_repoints_the_account_to_a_new_lead() {
        let first = calculated(&[30]);
        let second = open_quote(&first.account, Some(&first.lead), input(&[40], true), today(), now()).unwrap();
        assert_ne!(first.lead.id, second.lead.id);
        assert_eq!(second.account.current_lead_id, Some(second.lead.id));
        assert_eq!(second.lead.total_price, 60);
    }
}
