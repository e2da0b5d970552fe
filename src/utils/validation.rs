use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

pub const NATIONAL_ID_LENGTH: usize = 12;
const MIN_PASSWORD_LENGTH: usize = 8;

pub fn validate_email(email: &str) -> AppResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email address".to_string()))
    }
}

/// Ten-digit mobile number starting with 6-9.
pub fn validate_phone(phone: &str) -> AppResult<()> {
    let valid = phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && phone.starts_with(['6', '7', '8', '9']);

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Phone number must be a 10-digit mobile number".to_string(),
        ))
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    let strong = password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if strong {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Password must be at least {} characters and contain upper and lower case letters, a digit and a symbol",
            MIN_PASSWORD_LENGTH
        )))
    }
}

pub fn validate_registration(name: &str, email: &str, phone: &str, password: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    validate_email(email)?;
    validate_phone(phone)?;
    validate_password(password)
}

pub fn validate_passenger(
    full_name: &str,
    birthdate: NaiveDate,
    national_id: &str,
    today: NaiveDate,
) -> AppResult<()> {
    if full_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Passenger full name is required".to_string(),
        ));
    }

    if birthdate > today {
        return Err(AppError::BadRequest(format!(
            "Passenger {} has a birthdate in the future",
            full_name.trim()
        )));
    }

    if national_id.len() != NATIONAL_ID_LENGTH || !national_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Passenger {} needs a {}-digit ID number",
            full_name.trim(),
            NATIONAL_ID_LENGTH
        )));
    }

    Ok(())
}
