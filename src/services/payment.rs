// src/services/payment.rs

use crate::{
    common::error::AppError,
    models::{
        funnel::{PaymentMethodKind, PaymentPayload},
        lead::{PaymentFrequency, PaymentMethodSummary},
    },
};

// Dados sensíveis só vivem durante a requisição; nada aqui é persistido
// além do resumo mascarado.
#[derive(Clone, PartialEq, Eq)]
pub enum PaymentMethodData {
    Card { number: String, expiry: String, cvv: String },
    Sepa { iban: String },
}

// Debug manual para não vazar número de cartão/IBAN em logs
impl std::fmt::Debug for PaymentMethodData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethodData::Card { .. } => f.write_str("Card { .. }"),
            PaymentMethodData::Sepa { .. } => f.write_str("Sepa { .. }"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSubmission {
    pub frequency: PaymentFrequency,
    pub method: PaymentMethodData,
}

impl TryFrom<PaymentPayload> for PaymentSubmission {
    type Error = AppError;

    fn try_from(payload: PaymentPayload) -> Result<Self, Self::Error> {
        let method = match payload.payment_method {
            PaymentMethodKind::Card => {
                let card = payload.card_data.ok_or(AppError::MissingPaymentData)?;
                PaymentMethodData::Card {
                    number: card.card_number,
                    expiry: card.expiry_date,
                    cvv: card.cvv,
                }
            }
            PaymentMethodKind::Sepa => {
                let sepa = payload.sepa_data.ok_or(AppError::MissingPaymentData)?;
                PaymentMethodData::Sepa { iban: sepa.iban }
            }
        };

        Ok(Self { frequency: payload.payment_frequency, method })
    }
}

impl PaymentSubmission {
    /// Valida o meio de pagamento e devolve o resumo que pode ser guardado
    /// (apenas os 4 últimos dígitos).
    pub fn validate(&self) -> Result<PaymentMethodSummary, AppError> {
        match &self.method {
            PaymentMethodData::Card { number, expiry, cvv } => {
                let digits = strip_separators(number);
                if digits.len() != 16 || !all_digits(&digits) {
                    return Err(AppError::InvalidCardNumber);
                }
                let expiry = expiry.trim();
                if !is_valid_expiry(expiry) {
                    return Err(AppError::InvalidCardExpiry);
                }
                let cvv = cvv.trim();
                if cvv.len() != 3 || !all_digits(cvv) {
                    return Err(AppError::InvalidCardCvv);
                }
                Ok(PaymentMethodSummary::Card {
                    last4: last4(&digits),
                    expiry: expiry.to_string(),
                })
            }
            PaymentMethodData::Sepa { iban } => {
                let iban = strip_separators(iban).to_ascii_uppercase();
                if !(15..=34).contains(&iban.len()) || !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(AppError::InvalidIban);
                }
                Ok(PaymentMethodSummary::Sepa { last4: last4(&iban) })
            }
        }
    }
}

fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

fn all_digits(raw: &str) -> bool {
    raw.chars().all(|c| c.is_ascii_digit())
}

fn last4(raw: &str) -> String {
    raw.chars().skip(raw.chars().count().saturating_sub(4)).collect()
}

// MM/AA com mês entre 01 e 12
fn is_valid_expiry(raw: &str) -> bool {
    let Some((month, year)) = raw.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 || !all_digits(month) || !all_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}
