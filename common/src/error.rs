//! Field-level validation errors.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Validation failures keyed by field name, in the `{field: [messages]}` shape
/// returned to API clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Errors with a single message for a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("value", "O campo valor é obrigatório.");
        errors.add("value", "O campo valor deve ser maior que zero.");
        errors.add("currency", "Moeda inválida.");

        assert_eq!(errors.get("value").unwrap().len(), 2);
        assert!(errors.has("currency"));
        assert!(errors.clone().into_result().is_err());
    }

    #[test]
    fn test_serializes_as_field_map() {
        let errors = ValidationErrors::single("email", "Credenciais inválidas.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "Credenciais inválidas.");
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
