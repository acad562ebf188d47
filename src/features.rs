/// Customer attributes sent to the scoring service.
///
/// Operators type the values as text (web form inputs, CLI flags). Before a
/// request is issued every field is coerced to its numeric kind: seven
/// integer fields plus `total_spent`, the single decimal. Coercion failures
/// are collected per field so the form can show all of them at once.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field names in submission order.
pub const FIELD_NAMES: [&str; 8] = [
    "customer_id",
    "days_since_last_contact",
    "total_contacts",
    "total_spent",
    "emails_sent",
    "emails_opened",
    "website_visits",
    "customer_age_days",
];

/// Request payload for `POST /api/score`.
///
/// Serializes with integers unquoted and `total_spent` as a JSON float
/// (`5000.0`), which is what the service's schema expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatures {
    pub customer_id: u64,
    pub days_since_last_contact: u64,
    pub total_contacts: u64,
    pub total_spent: f64,
    pub emails_sent: u64,
    pub emails_opened: u64,
    pub website_visits: u64,
    pub customer_age_days: u64,
}

/// A field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw form values
// ---------------------------------------------------------------------------

/// Untyped form input: field name → text as typed.
///
/// Deserializes from a flat JSON object of strings, which is what the
/// dashboard page posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFormValues(BTreeMap<String, String>);

impl RawFormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Prefilled values shown when the dashboard form first renders.
    pub fn sample() -> Self {
        Self::new()
            .with("customer_id", "12345")
            .with("days_since_last_contact", "15")
            .with("total_contacts", "25")
            .with("total_spent", "5000")
            .with("emails_sent", "50")
            .with("emails_opened", "35")
            .with("website_visits", "120")
            .with("customer_age_days", "365")
    }
}

impl CustomerFeatures {
    /// Coerce raw text into a typed payload.
    ///
    /// Returns every field error found, in [`FIELD_NAMES`] order, rather than
    /// stopping at the first one. Extra keys in `raw` are ignored.
    pub fn from_raw(raw: &RawFormValues) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut int = |field: &'static str, min: u64| -> u64 {
            match parse_integer(field, raw.get(field), min) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(e);
                    0
                }
            }
        };

        let customer_id = int("customer_id", 1);
        let days_since_last_contact = int("days_since_last_contact", 0);
        let total_contacts = int("total_contacts", 0);
        let emails_sent = int("emails_sent", 0);
        let emails_opened = int("emails_opened", 0);
        let website_visits = int("website_visits", 0);
        let customer_age_days = int("customer_age_days", 0);

        let total_spent = match parse_decimal("total_spent", raw.get("total_spent")) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                0.0
            }
        };

        if !errors.is_empty() {
            errors.sort_by_key(|e| field_position(e.field));
            return Err(errors);
        }

        Ok(Self {
            customer_id,
            days_since_last_contact,
            total_contacts,
            total_spent,
            emails_sent,
            emails_opened,
            website_visits,
            customer_age_days,
        })
    }

    /// Email open rate as the service computes it (`opened / (sent + 1)`).
    pub fn email_open_rate(&self) -> f64 {
        self.emails_opened as f64 / (self.emails_sent as f64 + 1.0)
    }
}

fn field_position(field: &str) -> usize {
    FIELD_NAMES
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_NAMES.len())
}

fn parse_integer(field: &'static str, value: Option<&str>, min: u64) -> Result<u64, FieldError> {
    let text = required(field, value)?;
    let parsed: i64 = text
        .parse()
        .map_err(|_| FieldError::new(field, format!("'{text}' is not a whole number")))?;
    if parsed < min as i64 {
        let message = if min == 0 {
            "must be zero or greater".to_string()
        } else {
            format!("must be at least {min}")
        };
        return Err(FieldError::new(field, message));
    }
    Ok(parsed as u64)
}

fn parse_decimal(field: &'static str, value: Option<&str>) -> Result<f64, FieldError> {
    let text = required(field, value)?;
    let parsed: f64 = text
        .parse()
        .map_err(|_| FieldError::new(field, format!("'{text}' is not a number")))?;
    if !parsed.is_finite() {
        return Err(FieldError::new(field, format!("'{text}' is not a number")));
    }
    if parsed < 0.0 {
        return Err(FieldError::new(field, "must be zero or greater"));
    }
    Ok(parsed)
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, FieldError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(FieldError::new(field, "is required")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_values_coerce_to_typed_payload() {
        let features = CustomerFeatures::from_raw(&RawFormValues::sample()).unwrap();
        assert_eq!(features.customer_id, 12345);
        assert_eq!(features.total_spent, 5000.0);
        assert_eq!(features.customer_age_days, 365);
    }

    #[test]
    fn payload_json_keeps_numeric_kinds() {
        let features = CustomerFeatures::from_raw(&RawFormValues::sample()).unwrap();
        let json = serde_json::to_value(&features).unwrap();
        assert!(json["customer_id"].is_u64());
        assert!(json["total_spent"].is_f64());
        let text = serde_json::to_string(&features).unwrap();
        assert!(text.contains("\"total_spent\":5000.0"));
        assert!(text.contains("\"customer_id\":12345"));
    }

    #[test]
    fn decimal_field_accepts_fractions() {
        let raw = RawFormValues::sample().with("total_spent", "1234.56");
        let features = CustomerFeatures::from_raw(&raw).unwrap();
        assert!((features.total_spent - 1234.56).abs() < f64::EPSILON);
    }

    #[test]
    fn integer_fields_reject_fractions_and_text() {
        let raw = RawFormValues::sample()
            .with("total_contacts", "2.5")
            .with("website_visits", "lots");
        let errors = CustomerFeatures::from_raw(&raw).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["total_contacts", "website_visits"]);
    }

    #[test]
    fn missing_and_blank_fields_are_required() {
        let mut raw = RawFormValues::sample().with("emails_sent", "   ");
        raw.0.remove("customer_age_days");
        let errors = CustomerFeatures::from_raw(&raw).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "emails_sent");
        assert_eq!(errors[0].message, "is required");
        assert_eq!(errors[1].field, "customer_age_days");
    }

    #[test]
    fn sign_constraints_enforced() {
        let raw = RawFormValues::sample()
            .with("customer_id", "0")
            .with("days_since_last_contact", "-3")
            .with("total_spent", "-1");
        let errors = CustomerFeatures::from_raw(&raw).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["customer_id", "days_since_last_contact", "total_spent"]
        );
        assert_eq!(errors[0].message, "must be at least 1");
    }

    #[test]
    fn opened_above_sent_is_not_rejected() {
        let raw = RawFormValues::sample()
            .with("emails_sent", "1")
            .with("emails_opened", "9");
        assert!(CustomerFeatures::from_raw(&raw).is_ok());
    }

    #[test]
    fn raw_values_deserialize_from_string_map() {
        let raw: RawFormValues =
            serde_json::from_str(r#"{"customer_id":"7","total_spent":"9.5"}"#).unwrap();
        assert_eq!(raw.get("customer_id"), Some("7"));
        assert_eq!(raw.get("total_spent"), Some("9.5"));
    }

    #[test]
    fn email_open_rate_matches_service_formula() {
        let features = CustomerFeatures::from_raw(&RawFormValues::sample()).unwrap();
        assert!((features.email_open_rate() - 35.0 / 51.0).abs() < 1e-12);
    }
}
