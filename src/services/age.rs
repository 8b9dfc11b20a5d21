// src/services/age.rs

use chrono::{Datelike, Duration, NaiveDate};

use crate::common::error::AppError;

pub const MIN_INSURABLE_AGE: i32 = 18;
pub const MAX_INSURABLE_AGE: i32 = 65;

/// Idade atuarial: diferença de anos civis, arredondada para o aniversário
/// mais próximo. Se o aniversário do ano seguinte estiver estritamente mais
/// perto que o deste ano, soma um; em caso de empate vale o deste ano.
pub fn actuarial_age(birth_date: NaiveDate, today: NaiveDate) -> Result<i32, AppError> {
    if birth_date > today {
        return Err(AppError::BirthDateInFuture);
    }

    let age = today.year() - birth_date.year();

    let this_year = anniversary(birth_date, today.year())?;
    let next_year = anniversary(birth_date, today.year() + 1)?;

    let diff_this_year = (today - this_year).num_days().abs();
    let diff_next_year = (today - next_year).num_days().abs();

    if diff_this_year <= diff_next_year {
        Ok(age)
    } else {
        Ok(age + 1)
    }
}

pub fn is_insurable(age: i32) -> bool {
    (MIN_INSURABLE_AGE..=MAX_INSURABLE_AGE).contains(&age)
}

// Aniversário no ano pedido. 29/02 em ano não bissexto vira 01/03
// (o dia excedente rola para o mês seguinte).
fn anniversary(birth_date: NaiveDate, year: i32) -> Result<NaiveDate, AppError> {
    if let Some(date) = NaiveDate::from_ymd_opt(year, birth_date.month(), birth_date.day()) {
        return Ok(date);
    }

    NaiveDate::from_ymd_opt(year, birth_date.month(), 1)
        .and_then(|first| first.checked_add_signed(Duration::days(i64::from(birth_date.day0()))))
        .ok_or_else(|| AppError::InvalidDate(birth_date.to_string()))
}

/// Lê uma data no formato AAAA-MM-DD.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn on_the_birthday_is_the_raw_difference() {
        assert_eq!(actuarial_age(date(1990, 6, 15), date(2020, 6, 15)).unwrap(), 30);
    }

    #[test]
    fn rounds_up_when_next_birthday_is_closer() {
        // Aniversário em 01/02: em 31/12 o próximo está a 32 dias, o último a 334
        assert_eq!(actuarial_age(date(1990, 2, 1), date(2020, 12, 31)).unwrap(), 31);
    }

    #[test]
    fn keeps_raw_difference_before_this_years_birthday() {
        // Em 10/01/2020 compara-se o aniversário deste ano (30) com o do próximo (31);
        // o do ano passado nunca entra na conta
        assert_eq!(actuarial_age(date(1990, 6, 1), date(2020, 1, 10)).unwrap(), 30);
        assert_eq!(actuarial_age(date(1990, 12, 1), date(2020, 1, 10)).unwrap(), 30);
    }

    #[test]
    fn tie_keeps_this_years_anniversary() {
        // 2020 é bissexto: 2020-01-01 -> 2020-07-02 = 183 dias = 2020-07-02 -> 2021-01-01
        assert_eq!(actuarial_age(date(2000, 1, 1), date(2020, 7, 1)).unwrap(), 20);
        assert_eq!(actuarial_age(date(2000, 1, 1), date(2020, 7, 2)).unwrap(), 20);
        // Um dia depois o próximo passa a estar estritamente mais perto
        assert_eq!(actuarial_age(date(2000, 1, 1), date(2020, 7, 3)).unwrap(), 21);
    }

    #[test]
    fn leap_day_birth_rolls_to_march_first_in_common_years() {
        assert_eq!(anniversary(date(2000, 2, 29), 2021).unwrap(), date(2021, 3, 1));
        assert_eq!(anniversary(date(2000, 2, 29), 2024).unwrap(), date(2024, 2, 29));
        assert_eq!(actuarial_age(date(2000, 2, 29), date(2021, 3, 1)).unwrap(), 21);
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let err = actuarial_age(date(2030, 1, 1), date(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, AppError::BirthDateInFuture));
    }

    #[test]
    fn insurable_bounds_are_inclusive() {
        assert!(!is_insurable(17));
        assert!(is_insurable(18));
        assert!(is_insurable(65));
        assert!(!is_insurable(66));
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_birth_date(" 1995-04-12 ").unwrap(), date(1995, 4, 12));
        assert!(matches!(parse_birth_date("12/04/1995"), Err(AppError::InvalidDate(_))));
    }
}
