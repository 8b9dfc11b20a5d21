// src/services/pricing.rs

use crate::{common::error::AppError, models::lead::PaymentFrequency, services::age::is_insurable};

/// Máximo de pessoas numa apólice: o titular + 2 adicionais.
pub const MAX_INSURED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    From18To25,
    From26To35,
    From36To45,
    From46To55,
    From56To65,
}

impl AgeBracket {
    pub fn for_age(age: i32) -> Option<Self> {
        match age {
            18..=25 => Some(AgeBracket::From18To25),
            26..=35 => Some(AgeBracket::From26To35),
            36..=45 => Some(AgeBracket::From36To45),
            46..=55 => Some(AgeBracket::From46To55),
            56..=65 => Some(AgeBracket::From56To65),
            _ => None,
        }
    }

    // Tabela anual por (copago, faixa)
    pub fn annual_rate(&self, has_copay: bool) -> i64 {
        match (has_copay, self) {
            (true, AgeBracket::From18To25) => 30,
            (true, AgeBracket::From26To35) => 40,
            (true, AgeBracket::From36To45) => 60,
            (true, AgeBracket::From46To55) => 80,
            (true, AgeBracket::From56To65) => 120,
            (false, AgeBracket::From18To25) => 50,
            (false, AgeBracket::From26To35) => 70,
            (false, AgeBracket::From36To45) => 100,
            (false, AgeBracket::From46To55) => 140,
            (false, AgeBracket::From56To65) => 200,
        }
    }
}

pub fn base_price(age: i32, has_copay: bool) -> Result<i64, AppError> {
    AgeBracket::for_age(age)
        .map(|bracket| bracket.annual_rate(has_copay))
        .ok_or(AppError::AgeOutOfRange { age })
}

/// Desconto familiar em pontos percentuais a pagar (100 = sem desconto).
pub fn household_factor_percent(insured_count: usize) -> Result<i64, AppError> {
    match insured_count {
        1 => Ok(100),
        2 => Ok(90),
        3 => Ok(80),
        0 => Err(AppError::MissingField("mainBirthDate")),
        n => Err(AppError::TooManyInsured(n - 1)),
    }
}

/// Preço anual total para o titular (primeira idade) e os adicionais.
///
/// Valida todas as idades antes de somar, aplica o desconto familiar sobre a
/// soma e arredonda uma única vez (meio para cima).
pub fn quote_price(has_copay: bool, ages: &[i32]) -> Result<i64, AppError> {
    if let Some(&age) = ages.iter().find(|age| !is_insurable(**age)) {
        return Err(AppError::AgeOutOfRange { age });
    }

    let factor = household_factor_percent(ages.len())?;

    let mut sum = 0;
    for age in ages {
        sum += base_price(*age, has_copay)?;
    }

    Ok(round_half_up(sum * factor, 100))
}

/// Valor cobrado por parcela conforme a periodicidade escolhida.
pub fn installment(annual_price: i64, frequency: PaymentFrequency) -> i64 {
    match frequency {
        PaymentFrequency::Monthly => round_half_up(annual_price, 12),
        PaymentFrequency::Annual => annual_price,
    }
}

// Divisão inteira com arredondamento meio-para-cima (valores não negativos)
fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator) / (2 * denominator)
}
