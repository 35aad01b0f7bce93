//! Валидаторы полей, применяемые перед каждой записью.

use chrono_tz::Tz;
use regex::Regex;
use sea_orm::prelude::DateTimeUtc;

use crate::errors::AppError;

pub const NAME_MAX_LEN: usize = 32;
pub const PHONE_LEN: usize = 11;
pub const TIMEZONE_MAX_LEN: usize = 32;

lazy_static::lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^7[0-9]{10}$").unwrap();
}

pub fn ensure_max_len(field: &'static str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max {
        return Err(AppError::validation(
            field,
            format!("ensure this value has at most {} characters (it has {})", max, len),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    ensure_max_len("name", name, NAME_MAX_LEN)
}

pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    if phone.chars().count() != PHONE_LEN {
        return Err(AppError::validation(
            "phone",
            format!("must be exactly {} characters", PHONE_LEN),
        ));
    }
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::validation("phone", "must be in form 7XXXXXXXXXX"));
    }
    Ok(())
}

/// Устаревшие POSIX-зоны (`EST5EDT`, `W-SU`) и фиксированные смещения `Etc/*`
/// в список общеупотребимых зон не входят.
fn is_legacy_zone(name: &str) -> bool {
    match name {
        "UTC" | "GMT" => false,
        _ => !name.contains('/') || name.starts_with("Etc/"),
    }
}

pub fn validate_timezone(name: &str) -> Result<Tz, AppError> {
    ensure_max_len("timezone", name, TIMEZONE_MAX_LEN)?;
    let unrecognized =
        || AppError::validation("timezone", format!("{} is not a recognized timezone", name));
    if is_legacy_zone(name) {
        return Err(unrecognized());
    }
    name.parse::<Tz>().map_err(|_| unrecognized())
}

/// Отклоняет моменты раньше `now`
pub fn ensure_not_past(
    field: &'static str,
    value: DateTimeUtc,
    now: DateTimeUtc,
) -> Result<(), AppError> {
    if value < now {
        return Err(AppError::validation(
            field,
            format!("ensure this value is greater than or equal to {}", now),
        ));
    }
    Ok(())
}
