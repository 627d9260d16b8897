// src/common/phone.rs

use validator::ValidationError;

/// Validador para `#[validate(custom(...))]`: número local com exatamente 10 dígitos.
pub fn validate_local_phone(value: &str) -> Result<(), ValidationError> {
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_phone");
        err.message = Some("O telefone deve ter exatamente 10 dígitos.".into());
        Err(err)
    }
}

/// Normaliza para o formato internacional sem `+` exigido pela Cloud API.
///
/// Remove separadores e, se sobrar um número local de 10 dígitos, prefixa o código
/// do país. Números que já têm código de país passam intactos, então aplicar duas
/// vezes dá o mesmo resultado.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'))
        .collect();

    if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
        format!("{country_code}{digits}")
    } else {
        digits
    }
}
