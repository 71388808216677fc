use validator::ValidationError;

use crate::store::is_rate_key;

/// Longest custom code accepted
const MAX_CUSTOM_CODE_LEN: usize = 128;

/// Validates that a payload is present and not blank
pub fn validate_payload(payload: &str) -> Result<(), ValidationError> {
    if payload.trim().is_empty() {
        let mut err = ValidationError::new("payload_blank");
        err.message = Some("Missing payload".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a caller supplied code. The code is stored verbatim, so only
/// values that could never be resolved through a URL path are refused:
/// - at most 128 characters
/// - no `/` and no control characters
///
/// Codes in the rate-limit key namespace are refused as well.
pub fn validate_custom_code(code: &str) -> Result<(), ValidationError> {
    if code.chars().count() > MAX_CUSTOM_CODE_LEN {
        let mut err = ValidationError::new("custom_code_length");
        err.message = Some("Custom code must be at most 128 characters".into());
        return Err(err);
    }

    if code.chars().any(|c| c == '/' || c.is_control()) {
        let mut err = ValidationError::new("custom_code_charset");
        err.message = Some("Custom code cannot contain '/' or control characters".into());
        return Err(err);
    }

    if is_rate_key(code) {
        let mut err = ValidationError::new("custom_code_reserved");
        err.message = Some("Custom code uses a reserved prefix".into());
        return Err(err);
    }

    Ok(())
}
