use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validations::{validate_custom_code, validate_payload};

/// Request body for creating a link. `encryptedUrl` is accepted as an alias
/// of `payload`.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkDto {
    #[serde(default, alias = "encryptedUrl")]
    #[validate(custom(function = "validate_payload"))]
    pub payload: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_custom_code"))]
    pub custom_code: Option<String>,
}

/// The value stored under a code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub payload: String,
}

/// Result of a successful allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedLink {
    pub code: String,
    /// Absolute expiry in epoch milliseconds
    pub expires_at: i64,
}

/// Listing returned to administrators
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyListing {
    pub count: usize,
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_accepts_encrypted_url_alias() {
        let dto: CreateLinkDto =
            serde_json::from_str(r#"{"encryptedUrl":"abc","customCode":"MINE"}"#).unwrap();
        assert_eq!(dto.payload.as_deref(), Some("abc"));
        assert_eq!(dto.custom_code.as_deref(), Some("MINE"));
    }

    #[test]
    fn test_create_dto_tolerates_missing_fields() {
        let dto: CreateLinkDto = serde_json::from_str("{}").unwrap();
        assert!(dto.payload.is_none());
        assert!(dto.custom_code.is_none());
    }

    #[test]
    fn test_allocated_link_serializes_camel_case() {
        let link = AllocatedLink {
            code: "A12345".to_string(),
            expires_at: 1_000,
        };
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["code"], "A12345");
        assert_eq!(value["expiresAt"], 1_000);
    }
}
