//! Property records as delivered by the upstream property API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FetchError;

/// Query parameters for one page of properties.
///
/// Fixed at process start; the API credential lives with the fetching
/// adapter rather than here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyQuery {
    pub postal_code: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PropertyQuery {
    fn default() -> Self {
        Self {
            postal_code: "03110".to_string(),
            page: 1,
            page_size: 20,
        }
    }
}

/// One property as returned by the API.
///
/// Only the fields the pipeline reads are modelled; everything else in the
/// upstream object is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub identifier: Identifier,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    /// Upstream sends a number, but strings are tolerated and checked later
    #[serde(rename = "Id")]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub locality: String,
    pub postal1: String,
}

impl RawRecord {
    /// Create a record from its identifier and address parts
    pub fn new(
        id: impl Into<Value>,
        line1: impl Into<String>,
        locality: impl Into<String>,
        postal1: impl Into<String>,
    ) -> Self {
        Self {
            identifier: Identifier { id: id.into() },
            address: Address {
                line1: line1.into(),
                locality: locality.into(),
                postal1: postal1.into(),
            },
        }
    }

    /// Identifier rendered as text, before any integer coercion
    pub fn identifier_text(&self) -> String {
        match &self.identifier.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Response body shape of the address endpoint
#[derive(Debug, Deserialize)]
struct PropertyResponse {
    #[serde(default)]
    property: Option<Vec<RawRecord>>,
}

#[derive(Serialize)]
struct PropertyBody<'a> {
    property: &'a [RawRecord],
}

/// A fetched page: the verbatim body plus the parsed records.
#[derive(Debug, Clone)]
pub struct PropertyPage {
    /// Response body exactly as received
    pub raw: String,

    /// Records in upstream order
    pub records: Vec<RawRecord>,
}

impl PropertyPage {
    /// Parse a response body.
    ///
    /// A body without a `property` array is an empty page, not an error.
    pub fn parse(body: impl Into<String>) -> Result<Self, FetchError> {
        let raw = body.into();
        let response: PropertyResponse = serde_json::from_str(&raw)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        Ok(Self {
            raw,
            records: response.property.unwrap_or_default(),
        })
    }

    /// Build a page from records, rendering a body in the upstream shape
    pub fn from_records(records: Vec<RawRecord>) -> Result<Self, serde_json::Error> {
        let raw = serde_json::to_string_pretty(&PropertyBody {
            property: &records,
        })?;
        Ok(Self { raw, records })
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": { "version": "1.0.0", "code": 0, "msg": "SuccessWithResult", "total": 2 },
        "property": [
            {
                "identifier": { "Id": 184713191, "fips": "33011", "apn": "00012-000001" },
                "address": {
                    "country": "US",
                    "line1": "4 BIRCH DR",
                    "line2": "BEDFORD, NH 03110",
                    "locality": "Bedford",
                    "postal1": "03110"
                }
            },
            {
                "identifier": { "Id": "184713192" },
                "address": { "line1": "6 BIRCH DR", "locality": "Bedford", "postal1": "03110" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_keeps_order_and_raw_body() {
        let page = PropertyPage::parse(SAMPLE).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].address.line1, "4 BIRCH DR");
        assert_eq!(page.records[1].address.line1, "6 BIRCH DR");
        assert_eq!(page.raw, SAMPLE);
    }

    #[test]
    fn test_identifier_text_handles_numbers_and_strings() {
        let page = PropertyPage::parse(SAMPLE).unwrap();
        assert_eq!(page.records[0].identifier_text(), "184713191");
        assert_eq!(page.records[1].identifier_text(), "184713192");
    }

    #[test]
    fn test_missing_property_array_is_empty_page() {
        let page = PropertyPage::parse(r#"{"status": {"msg": "SuccessWithoutResult"}}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = PropertyPage::parse("<html>gateway error</html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_record_without_address_is_malformed() {
        let err = PropertyPage::parse(r#"{"property": [{"identifier": {"Id": 1}}]}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_from_records_renders_parseable_body() {
        let records = vec![RawRecord::new(101, "1 MAIN ST", "Bedford", "03110")];
        let page = PropertyPage::from_records(records.clone()).unwrap();
        let reparsed = PropertyPage::parse(page.raw).unwrap();
        assert_eq!(reparsed.records, records);
    }
}
