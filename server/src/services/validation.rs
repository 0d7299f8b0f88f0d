//! Request field validation.
//!
//! Payload fields arrive as raw JSON values so that type mismatches are
//! reported per field rather than rejecting the whole body.

use std::str::FromStr;

use orderdesk_common::{round_half_up, Currency, UserId, ValidationErrors};
use rust_decimal::Decimal;
use serde_json::Value;

/// Largest value a `NUMERIC(10, 2)` column holds.
pub const MAX_ORDER_VALUE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

pub const MAX_STRING_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Collects errors while extracting typed fields.
pub struct FieldValidator {
    errors: ValidationErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self {
            errors: ValidationErrors::new(),
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }

    /// Present-ness check shared by every field: `Ok(None)` when the field
    /// is absent and optional, `Err(())` when a required field is missing.
    fn presence<'a>(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&'a Value>,
        required: bool,
    ) -> Result<Option<&'a Value>, ()> {
        match value {
            None | Some(Value::Null) if required => {
                self.error(field, format!("O campo {} é obrigatório.", label));
                Err(())
            }
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.error(field, format!("O campo {} é obrigatório.", label));
                Err(())
            }
            Some(v) => Ok(Some(v)),
        }
    }

    /// A string of at most `max` characters.
    pub fn string(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&Value>,
        required: bool,
        max: usize,
    ) -> Option<String> {
        let value = self.presence(field, label, value, required).ok()??;

        let Value::String(s) = value else {
            self.error(field, format!("O campo {} deve ser uma string.", label));
            return None;
        };

        if s.chars().count() > max {
            self.error(
                field,
                format!("O campo {} deve ter no máximo {} caracteres.", label, max),
            );
            return None;
        }

        Some(s.clone())
    }

    /// A string of at least `min` characters.
    pub fn secret(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&Value>,
        required: bool,
        min: usize,
    ) -> Option<String> {
        let value = self.presence(field, label, value, required).ok()??;

        let Value::String(s) = value else {
            self.error(field, format!("O campo {} deve ser uma string.", label));
            return None;
        };

        if s.chars().count() < min {
            self.error(
                field,
                format!("O campo {} deve ter no mínimo {} caracteres.", label, min),
            );
            return None;
        }

        Some(s.clone())
    }

    /// A syntactically valid email address.
    pub fn email(&mut self, field: &str, value: Option<&Value>, required: bool) -> Option<String> {
        let email = self.string(field, field, value, required, MAX_STRING_LEN)?;
        let email = email.trim().to_string();

        if !is_valid_email(&email) {
            self.error(field, "O campo email deve ser um endereço válido.");
            return None;
        }

        Some(email)
    }

    /// A positive amount with at most two decimal places after rounding.
    pub fn amount(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&Value>,
        required: bool,
    ) -> Option<Decimal> {
        let value = self.presence(field, label, value, required).ok()??;

        let parsed = match value {
            Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        };

        let Some(amount) = parsed else {
            self.error(field, format!("O campo {} deve ser numérico.", label));
            return None;
        };

        let amount = round_half_up(amount, 2);
        if amount < Decimal::new(1, 2) {
            self.error(field, format!("O campo {} deve ser no mínimo 0.01.", label));
            return None;
        }
        if amount > MAX_ORDER_VALUE {
            self.error(
                field,
                format!("O campo {} deve ser no máximo {}.", label, MAX_ORDER_VALUE),
            );
            return None;
        }

        let mut amount = amount;
        amount.rescale(2);
        Some(amount)
    }

    /// One of the supported currency codes.
    pub fn currency(&mut self, field: &str, value: Option<&Value>, required: bool) -> Option<Currency> {
        let value = self.presence(field, "moeda", value, required).ok()??;

        match value.as_str().map(Currency::from_str) {
            Some(Ok(currency)) => Some(currency),
            _ => {
                self.error(field, "A moeda deve ser BRL ou USD.");
                None
            }
        }
    }

    /// A user id; existence is checked by the caller.
    pub fn user_id(&mut self, field: &str, value: Option<&Value>, required: bool) -> Option<UserId> {
        let value = self.presence(field, "usuário", value, required).ok()??;

        let id = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match id {
            Some(id) if id > 0 => Some(UserId::new(id)),
            _ => {
                self.error(field, "O campo usuário deve ser um inteiro.");
                None
            }
        }
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Loose address check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_max_order_value() {
        assert_eq!(MAX_ORDER_VALUE, dec!(99999999.99));
    }

    #[test]
    fn test_required_and_type_checks() {
        let mut v = FieldValidator::new();

        assert_eq!(v.string("description", "descrição", None, true, 255), None);
        assert_eq!(
            v.string("name", "nome", Some(&json!(42)), true, 255),
            None
        );
        assert_eq!(v.string("note", "nota", None, false, 255), None);

        let errors = v.finish().unwrap_err();
        assert_eq!(
            errors.get("description").unwrap(),
            ["O campo descrição é obrigatório.".to_string()]
        );
        assert_eq!(
            errors.get("name").unwrap(),
            ["O campo nome deve ser uma string.".to_string()]
        );
        assert!(!errors.has("note"));
    }

    #[test]
    fn test_string_length_counts_chars() {
        let mut v = FieldValidator::new();
        let ok = "ç".repeat(255);
        let too_long = "a".repeat(256);

        assert_eq!(v.string("d", "d", Some(&json!(ok)), true, 255), Some(ok));
        assert_eq!(v.string("e", "e", Some(&json!(too_long)), true, 255), None);
        assert!(v.has_error("e"));
        assert!(!v.has_error("d"));
    }

    #[test]
    fn test_amount_parsing() {
        let mut v = FieldValidator::new();

        assert_eq!(v.amount("a", "valor", Some(&json!(150.5)), true), Some(dec!(150.50)));
        assert_eq!(v.amount("b", "valor", Some(&json!("0.01")), true), Some(dec!(0.01)));
        assert_eq!(v.amount("c", "valor", Some(&json!(10.005)), true), Some(dec!(10.01)));
        assert_eq!(v.amount("d", "valor", Some(&json!(0)), true), None);
        assert_eq!(v.amount("e", "valor", Some(&json!(-5)), true), None);
        assert_eq!(v.amount("f", "valor", Some(&json!("abc")), true), None);
        assert_eq!(v.amount("g", "valor", Some(&json!(true)), true), None);
        assert_eq!(v.amount("h", "valor", Some(&json!(100000000)), true), None);

        let errors = v.finish().unwrap_err();
        assert!(!errors.has("a") && !errors.has("b") && !errors.has("c"));
        for field in ["d", "e", "f", "g", "h"] {
            assert!(errors.has(field), "{field} should fail");
        }
    }

    #[test]
    fn test_currency() {
        let mut v = FieldValidator::new();
        assert_eq!(v.currency("currency", Some(&json!("BRL")), true), Some(Currency::Brl));
        assert_eq!(v.currency("currency", Some(&json!("EUR")), true), None);
        assert_eq!(v.currency("other", Some(&json!(1)), true), None);
        assert!(v.has_error("currency"));
        assert!(v.has_error("other"));
    }

    #[test]
    fn test_user_id() {
        let mut v = FieldValidator::new();
        assert_eq!(v.user_id("user_id", Some(&json!(3)), true), Some(UserId::new(3)));
        assert_eq!(v.user_id("user_id", Some(&json!("7")), true), Some(UserId::new(7)));
        assert_eq!(v.user_id("bad", Some(&json!(1.5)), true), None);
        assert!(v.has_error("bad"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("joao@example.com"));
        assert!(!is_valid_email("joao"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("joao@localhost"));
        assert!(!is_valid_email("jo ao@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn test_secret_min_length() {
        let mut v = FieldValidator::new();
        assert_eq!(v.secret("password", "senha", Some(&json!("12345")), true, 6), None);
        assert_eq!(
            v.errors.get("password").unwrap(),
            ["O campo senha deve ter no mínimo 6 caracteres.".to_string()]
        );
    }
}
