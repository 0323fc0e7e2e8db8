//! Validaciones de entrada compartidas por los borradores y parches.
use crate::error::DomainError;

pub fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(field, "must not be empty"));
    }
    Ok(())
}

/// Chequeo superficial de forma: `local@dominio.tld`, sin espacios.
pub fn require_email(field: &str, value: &str) -> Result<(), DomainError> {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(DomainError::invalid(field, "must contain @"));
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return Err(DomainError::invalid(field, "is not a valid address"));
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(DomainError::invalid(field, "is not a valid address")),
    }
}

pub fn require_amount(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::invalid(field, "must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(require_email("email", "jane@x.com").is_ok());
        assert!(require_email("email", "jane.x.com").is_err());
        assert!(require_email("email", "@x.com").is_err());
        assert!(require_email("email", "jane@x").is_err());
        assert!(require_email("email", "ja ne@x.com").is_err());
        assert!(require_email("email", "jane@@x.com").is_err());
    }

    #[test]
    fn amounts_and_text() {
        assert!(require_amount("sp", 0.0).is_ok());
        assert!(require_amount("sp", -1.0).is_err());
        assert!(require_amount("sp", f64::NAN).is_err());
        assert!(require_text("name", "   ").is_err());
    }
}
