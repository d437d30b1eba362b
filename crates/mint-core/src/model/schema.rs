//! Esquema de request: campo → validador.
//!
//! La validación es pura sobre el input y no corta en el primer problema:
//! acumula cada campo inválido para que el llamador reporte todo junto.
//! El request validado es inmutable; corregirlo exige iniciar otro flujo.

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{FieldIssue, ValidationError};

type FieldValidator = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Esquema declarativo de un request de flujo.
pub struct RequestSchema {
    fields: IndexMap<String, FieldValidator>,
}

impl RequestSchema {
    pub fn new() -> Self {
        RequestSchema { fields: IndexMap::new() }
    }

    /// Declara un campo obligatorio con su validador.
    pub fn field<F>(mut self, name: &str, validator: F) -> Self
        where F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static
    {
        self.fields.insert(name.to_string(), Box::new(validator));
        self
    }

    /// Aplica el esquema campo a campo. Toda falla se acumula.
    pub fn validate(&self, flow: &str, raw: &Value) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let object = match raw.as_object() {
            Some(obj) => obj,
            None => {
                return Err(ValidationError { flow: flow.to_string(),
                                             issues: vec![FieldIssue { field: "$".into(),
                                                                       message: "request must be an object".into() }] });
            }
        };

        for (name, validator) in &self.fields {
            match object.get(name) {
                None => issues.push(FieldIssue { field: name.clone(),
                                                 message: "missing field".into() }),
                Some(value) => {
                    if let Err(message) = validator(value) {
                        issues.push(FieldIssue { field: name.clone(), message });
                    }
                }
            }
        }

        for name in object.keys() {
            if !self.fields.contains_key(name) {
                issues.push(FieldIssue { field: name.clone(),
                                         message: "unknown field".into() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { flow: flow.to_string(), issues })
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

impl Default for RequestSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Validadores de campo reutilizables.
pub mod validators {
    use serde_json::Value;

    use mint_domain::{Address, Amount, TxHash};

    pub fn address(value: &Value) -> Result<(), String> {
        let s = value.as_str().ok_or("expected a string address")?;
        s.parse::<Address>().map(|_| ()).map_err(|e| e.to_string())
    }

    pub fn tx_hash(value: &Value) -> Result<(), String> {
        let s = value.as_str().ok_or("expected a string hash")?;
        s.parse::<TxHash>().map(|_| ()).map_err(|e| e.to_string())
    }

    /// Monto en unidades base serializado como string decimal.
    pub fn amount(value: &Value) -> Result<(), String> {
        let s = value.as_str().ok_or("expected a base-unit amount string")?;
        Amount::parse_base_units(s).map(|_| ()).map_err(|e| e.to_string())
    }

    /// Monto estrictamente positivo.
    pub fn positive_amount(value: &Value) -> Result<(), String> {
        let s = value.as_str().ok_or("expected a base-unit amount string")?;
        let parsed = Amount::parse_base_units(s).map_err(|e| e.to_string())?;
        if parsed.is_zero() {
            return Err("amount must be positive".into());
        }
        Ok(())
    }

    pub fn branch_id(value: &Value) -> Result<(), String> {
        value.as_u64().map(|_| ()).ok_or_else(|| "expected a branch id".into())
    }

    pub fn unsigned(value: &Value) -> Result<(), String> {
        value.as_u64().map(|_| ()).ok_or_else(|| "expected an unsigned integer".into())
    }

    /// `null` o el validador interno.
    pub fn nullable<F>(inner: F) -> impl Fn(&Value) -> Result<(), String>
        where F: Fn(&Value) -> Result<(), String>
    {
        move |value| {
            if value.is_null() {
                Ok(())
            } else {
                inner(value)
            }
        }
    }

    /// Lista no vacía cuyos elementos pasan el validador interno.
    pub fn non_empty_array<F>(inner: F) -> impl Fn(&Value) -> Result<(), String>
        where F: Fn(&Value) -> Result<(), String>
    {
        move |value| {
            let items = value.as_array().ok_or("expected an array")?;
            if items.is_empty() {
                return Err("array must not be empty".into());
            }
            for (i, item) in items.iter().enumerate() {
                inner(item).map_err(|e| format!("[{}] {}", i, e))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> RequestSchema {
        RequestSchema::new().field("owner", validators::address)
                            .field("collAmount", validators::positive_amount)
                            .field("delegate", validators::nullable(validators::address))
    }

    #[test]
    fn collects_every_issue_instead_of_short_circuiting() {
        let raw = json!({
            "owner": "not-an-address",
            "collAmount": "0",
        });
        let err = schema().validate("openBorrowPosition", &raw).unwrap_err();
        // owner inválido + collAmount en cero + delegate ausente
        assert_eq!(err.issues.len(), 3);
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["owner", "collAmount", "delegate"]);
    }

    #[test]
    fn accepts_valid_request() {
        let raw = json!({
            "owner": "0x00000000000000000000000000000000000000aa",
            "collAmount": "10000000000000000000",
            "delegate": null,
        });
        assert!(schema().validate("openBorrowPosition", &raw).is_ok());
    }

    #[test]
    fn non_ascii_address_is_an_issue_not_a_panic() {
        let raw = json!({
            "owner": format!("0xa\u{00e9}{}", "0".repeat(37)),
            "collAmount": "1",
            "delegate": null,
        });
        let err = schema().validate("openBorrowPosition", &raw).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "owner");
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = json!({
            "owner": "0x00000000000000000000000000000000000000aa",
            "collAmount": "1",
            "delegate": null,
            "extra": 1,
        });
        let err = schema().validate("openBorrowPosition", &raw).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "extra");
    }

    #[test]
    fn non_object_request_fails() {
        let err = schema().validate("openBorrowPosition", &json!([1, 2])).unwrap_err();
        assert_eq!(err.issues[0].field, "$");
    }
}
