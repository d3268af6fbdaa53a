//! Sales quotation payload.
//!
//! Field names follow the upstream document schema. Fields the gateway does
//! not know about are carried through untouched.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const MAX_CODE_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesQuotation {
    pub card_code: String,
    #[serde(deserialize_with = "deserialize_doc_date")]
    pub doc_date: NaiveDate,
    pub document_lines: Vec<QuotationLine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuotationLine {
    pub item_code: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts `2024-03-01` as well as `2024-03-01T00:00:00`.
fn deserialize_doc_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(&raw).map(|dt| dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("DocDate '{}' is not a valid date", raw)))
}

fn check_code(field: &str, value: &str, errors: &mut Vec<String>) {
    let len = value.trim().chars().count();
    if len == 0 || value.chars().count() > MAX_CODE_LEN {
        errors.push(format!(
            "{} must be between 1 and {} characters",
            field, MAX_CODE_LEN
        ));
    }
}

impl SalesQuotation {
    /// All rule violations, in field order.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_code("CardCode", &self.card_code, &mut errors);

        if self.document_lines.is_empty() {
            errors.push("At least one document line is required".to_string());
        }
        for (i, line) in self.document_lines.iter().enumerate() {
            let mut line_errors = Vec::new();
            check_code("ItemCode", &line.item_code, &mut line_errors);
            if !(line.quantity.is_finite() && line.quantity > 0.0) {
                line_errors.push("Quantity must be greater than 0".to_string());
            }
            if !(line.price.is_finite() && line.price >= 0.0) {
                line_errors.push("Price must be greater than or equal to 0".to_string());
            }
            errors.extend(
                line_errors
                    .into_iter()
                    .map(|e| format!("DocumentLines[{}]: {}", i, e)),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> SalesQuotation {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> Value {
        json!({
            "CardCode": "C20000",
            "DocDate": "2024-03-01",
            "DocumentLines": [
                { "ItemCode": "A00001", "Quantity": 2, "Price": 10.5 }
            ]
        })
    }

    #[test]
    fn test_valid_quotation_passes() {
        assert!(parse(valid()).validate().is_ok());
    }

    #[test]
    fn test_datetime_doc_date_is_accepted() {
        let mut value = valid();
        value["DocDate"] = json!("2024-03-01T00:00:00");
        let quotation = parse(value);
        assert_eq!(quotation.doc_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_collects_every_violation() {
        let quotation = parse(json!({
            "CardCode": "",
            "DocDate": "2024-03-01",
            "DocumentLines": [
                { "ItemCode": "A1", "Quantity": 0, "Price": -1 }
            ]
        }));
        let errors = quotation.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("CardCode"));
        assert!(errors[1].contains("Quantity"));
        assert!(errors[2].contains("Price"));
    }

    #[test]
    fn test_empty_lines_and_long_codes_rejected() {
        let mut value = valid();
        value["DocumentLines"] = json!([]);
        value["CardCode"] = json!("C".repeat(51));
        let errors = parse(value).validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_fields_round_trip_to_upstream() {
        let mut value = valid();
        value["Comments"] = json!("rush order");
        value["DocumentLines"][0]["WarehouseCode"] = json!("01");

        let out = serde_json::to_value(parse(value)).unwrap();
        assert_eq!(out["Comments"], "rush order");
        assert_eq!(out["DocumentLines"][0]["WarehouseCode"], "01");
        assert_eq!(out["DocDate"], "2024-03-01");
    }
}
